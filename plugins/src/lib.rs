pub mod backend;
pub mod capability;
pub mod executor;
pub mod factory;
pub mod services;
pub mod synthesis;
