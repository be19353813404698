pub mod content;
pub mod shell;
pub mod unavailable;

pub use content::{strip_code_fence, AiContentCapability};
pub use shell::{ShellCapability, ShellOutput};
pub use unavailable::UnavailableCapability;
