pub mod config;
pub mod error;
pub mod tools;
pub mod vacuum;

pub use error::{AgentError, Result};
