use thiserror::Error;

/// Errors raised by grid construction, field parameters and the models
/// built on top of them.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FieldError {
    #[error("Invalid argument '{name}': {reason}")]
    InvalidArgument { name: &'static str, reason: String },
}

impl FieldError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        FieldError::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }
}

pub type FieldResult<T> = Result<T, FieldError>;

/// Reject NaN and infinities for a named scalar input.
pub(crate) fn ensure_finite(name: &'static str, value: f64) -> FieldResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(FieldError::invalid(name, format!("must be finite, got {}", value)))
    }
}

/// Reject anything that is not a finite, strictly positive number.
pub(crate) fn ensure_positive(name: &'static str, value: f64) -> FieldResult<()> {
    ensure_finite(name, value)?;
    if value <= 0.0 {
        return Err(FieldError::invalid(
            name,
            format!("must be positive, got {}", value),
        ));
    }
    Ok(())
}
