use thiserror::Error;

/// Errors surfaced by the signal pipeline and its collaborators
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Caller handed us something we cannot work with (empty batch, bad thresholds, ...)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Not enough market data to evaluate a price window.
    /// Recoverable: the trader treats it as "no action".
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// A collaborator (social API, classifier, market data, broker) failed
    #[error("{service} error: {message}")]
    ExternalService {
        service: &'static str,
        message: String,
    },
}

impl PipelineError {
    pub fn external(service: &'static str, message: impl Into<String>) -> Self {
        Self::ExternalService {
            service,
            message: message.into(),
        }
    }

    /// True for the outcomes callers should treat as "do nothing" rather than a failure
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::InsufficientData(_))
    }
}
