//! Error types shared by every trisect crate

use thiserror::Error;

/// Error type for decomposition and stretching operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A caller-supplied parameter is out of range or non-finite
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A numeric stage produced a non-finite value or broke an internal
    /// invariant (mask sum, frame agreement)
    #[error("Computation error: {0}")]
    Computation(String),

    /// The input does not satisfy a component's entry condition
    #[error("Precondition violated: {0}")]
    Precondition(String),

    /// Sample rate conversion backend failure
    #[error("Resampling error: {0}")]
    Resample(String),
}

/// Result type for trisect operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidParameter(msg.into())
    }
}

/// Fail with [`Error::InvalidParameter`] unless `value` is finite and > 0.
pub fn ensure_positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidParameter(format!(
            "{} must be finite and positive, got {}",
            name, value
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_the_category() {
        let e = Error::Precondition("input shorter than 2048 samples".into());
        assert_eq!(
            e.to_string(),
            "Precondition violated: input shorter than 2048 samples"
        );
    }

    #[test]
    fn test_ensure_positive() {
        assert!(ensure_positive("ratio", 1.5).is_ok());
        assert!(matches!(
            ensure_positive("ratio", 0.0),
            Err(Error::InvalidParameter(_))
        ));
        assert!(ensure_positive("ratio", -2.0).is_err());
        assert!(ensure_positive("ratio", f64::NAN).is_err());
        assert!(ensure_positive("ratio", f64::INFINITY).is_err());
    }
}
