// Core modules
pub mod api;
pub mod config;
pub mod error;
pub mod execution;
pub mod models;
pub mod nlp;
pub mod pipeline;
pub mod strategy;

// Re-export commonly used types
pub use error::PipelineError;
pub use models::*;
pub use strategy::signals::{aggregate, SignalConfig};

// Error handling
pub type Result<T> = std::result::Result<T, PipelineError>;
