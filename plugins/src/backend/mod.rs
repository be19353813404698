pub mod aiservice;

pub use aiservice::{extract_textish, AiServiceClient, AiServiceError, AiServiceErrorKind};
