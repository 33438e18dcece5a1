pub mod error;
pub mod models;
pub mod registry;
pub mod services;

pub use error::{Result, SupervisorError};
pub use registry::ComponentRegistry;
