use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SdkError {
    /// Build an `InvalidArgument` error that names the offending option.
    pub fn invalid_option(option: &str, reason: impl AsRef<str>) -> Self {
        SdkError::InvalidArgument {
            message: format!("`{option}` {}", reason.as_ref()),
        }
    }

    /// Format error details for better debugging visibility
    pub fn format_details(&self) -> String {
        match self {
            SdkError::InvalidArgument { message } => format!("invalid argument: {}", message),
            SdkError::Transport(te) => format!("transport error: {}", te.sanitized_message()),
            SdkError::Io(err) => format!("io error ({:?}): {}", err.kind(), err),
        }
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("network: {0}")]
    Network(String),
    #[error("body read error: {0}")]
    BodyRead(String),
    #[error("stream closed")]
    StreamClosed,
    #[error("other: {0}")]
    Other(String),
}

impl TransportError {
    /// Short message that is safe to log; body read errors may echo upstream payloads.
    pub fn sanitized_message(&self) -> String {
        match self {
            TransportError::BodyRead(_) => "body read error".to_string(),
            _ => self.to_string(),
        }
    }
}
