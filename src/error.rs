//! Errors raised inside a single poll cycle.
//!
//! None of these terminate the process. The poll loop catches every one of
//! them, logs it, and announces each distinct `Display` text to the chat once.
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CycleError {
    /// DNS, connect, TLS or timeout failure while talking to the review API.
    #[error("request to the review API failed: {0}")]
    Transport(String),
    #[error("review API status code expected 200, but got {code}")]
    UnexpectedStatus { code: u16 },
    /// The decoded payload is not the shape the validator expects.
    #[error("unexpected response shape: {0}")]
    Shape(String),
    #[error("key \"{0}\" is missing")]
    MissingField(&'static str),
    #[error("unknown homework status {0}")]
    UnknownStatus(String),
    #[error("failed to deliver chat message: {0}")]
    Delivery(String),
}

impl CycleError {
    /// Short machine-friendly tag used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            CycleError::Transport(_) => "transport",
            CycleError::UnexpectedStatus { .. } => "unexpected_status",
            CycleError::Shape(_) => "shape",
            CycleError::MissingField(_) => "missing_field",
            CycleError::UnknownStatus(_) => "unknown_status",
            CycleError::Delivery(_) => "delivery",
        }
    }
}
