/// Errors raised by widget drawing routines.
/// Precondition violations are returned to the caller; missing system facts never reach here.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WidgetError {
    #[error("clock radius must be positive, got {0}")]
    InvalidRadius(f64),

    #[error("month must be within 1..=12, got {year}-{month}")]
    InvalidMonth { year: i32, month: u32 },

    #[error("malformed color '{0}'")]
    MalformedColor(String),

    #[error("malformed font spec '{0}'")]
    MalformedFontSpec(String),

    #[error("invalid time format '{0}'")]
    InvalidFormat(String),

    #[error("failed to load font {path}: {reason}")]
    FontLoad { path: String, reason: String },

    #[error("drawing backend: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, WidgetError>;
