pub mod aiservice;

pub use aiservice::{build_synthesis_prompt, AiServiceSynthesizer};
