use thiserror::Error;

/// Caller-visible validation failures; no computation runs when one is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("{field} must be a number, got {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("{0} must be > 0")]
    NotPositive(&'static str),

    #[error("{0} must be >= 0")]
    Negative(&'static str),

    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
    },

    #[error("Unknown state code: {0}")]
    UnknownState(String),

    #[error("Unknown intent: {0}")]
    UnknownIntent(String),
}
