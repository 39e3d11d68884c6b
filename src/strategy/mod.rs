// Signal generation module
pub mod signals;

pub use signals::{aggregate, EmptyBatchPolicy, SignalConfig};
