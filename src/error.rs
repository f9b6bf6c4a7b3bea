use std::fmt;

/// Typed domain errors surfaced to the transport layer.
///
/// Resource shortfalls are deliberately absent: an under-stocked feed
/// dispensation completes with a PARTIAL status instead of erroring.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Referenced entity does not exist.
    NotFound { entity: &'static str, id: String },
    /// Malformed or constraint-violating input.
    Validation(String),
    /// Health action or operation not valid from the current state.
    InvalidAction(String),
    /// Adapter target system is not supported.
    UnsupportedTarget(String),
}

impl EngineError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        EngineError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        EngineError::Validation(msg.into())
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::NotFound { entity, id } => {
                write!(f, "{} '{}' not found", entity, id)
            }
            EngineError::Validation(msg) => write!(f, "validation failed: {}", msg),
            EngineError::InvalidAction(msg) => write!(f, "invalid action: {}", msg),
            EngineError::UnsupportedTarget(target) => {
                write!(f, "unsupported external system '{}'", target)
            }
        }
    }
}

impl std::error::Error for EngineError {}

pub type EngineResult<T> = Result<T, EngineError>;
