pub mod capability;
pub mod renderer;

pub use capability::*;
pub use renderer::*;
