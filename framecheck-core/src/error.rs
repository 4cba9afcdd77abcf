//! Error types for the framecheck libraries.
//!
//! Every fallible operation reports synchronously through [`Error`]; nothing
//! is retried and nothing is left partially applied.

use thiserror::Error;

use crate::format::VideoFormat;

/// Main error type for the framecheck libraries.
#[derive(Error, Debug)]
pub enum Error {
    /// Container format errors (Y4M header or frame structure).
    #[error("Container error: {0}")]
    Container(#[from] ContainerError),

    /// I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid parameter or violated precondition.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The format descriptor cannot describe the requested geometry.
    #[error("Invalid format {format}: {reason}")]
    InvalidFormat {
        format: VideoFormat,
        reason: &'static str,
    },

    /// Unsupported feature or format.
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// No conversion path between the two formats.
    #[error("Unsupported conversion ({src} -> {dst})")]
    UnsupportedConversion { src: VideoFormat, dst: VideoFormat },

    /// Resource exhausted (memory).
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Buffer too small for operation.
    #[error("Buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall { needed: usize, available: usize },
}

/// Container format errors.
#[derive(Error, Debug)]
pub enum ContainerError {
    /// Stream does not start with the expected signature.
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    /// Missing required header parameter.
    #[error("Missing required header parameter: {0}")]
    MissingParameter(char),

    /// Header parameter could not be parsed.
    #[error("Invalid header parameter {tag}: {value:?}")]
    InvalidParameter { tag: char, value: String },

    /// Colorspace token with no registry format.
    #[error("Unsupported colorspace: {0}")]
    UnsupportedColorspace(String),

    /// Frame marker missing or malformed.
    #[error("Invalid frame marker: {0:?}")]
    InvalidFrameMarker(String),

    /// Header line longer than the reader accepts.
    #[error("Header exceeds {limit} bytes")]
    HeaderTooLong { limit: usize },

    /// Frame payload larger than the reader accepts.
    #[error("Frame of {size} bytes exceeds the {limit} byte limit")]
    FrameTooLarge { size: usize, limit: usize },
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an invalid parameter error.
    pub fn invalid_param(msg: impl Into<String>) -> Self {
        Error::InvalidParameter(msg.into())
    }

    /// Create an unsupported error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Error::Unsupported(msg.into())
    }

    /// Check if this error came from the underlying reader or writer.
    #[must_use]
    pub fn is_io(&self) -> bool {
        matches!(self, Error::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidParameter("test parameter".into());
        assert_eq!(err.to_string(), "Invalid parameter: test parameter");
    }

    #[test]
    fn test_conversion_error_names_both_formats() {
        let err = Error::UnsupportedConversion {
            src: VideoFormat::Yuy2,
            dst: VideoFormat::I420,
        };
        assert_eq!(err.to_string(), "Unsupported conversion (YUY2 -> I420)");
    }

    #[test]
    fn test_container_error_conversion() {
        let err: Error = ContainerError::MissingParameter('W').into();
        assert!(matches!(
            err,
            Error::Container(ContainerError::MissingParameter('W'))
        ));
    }

    #[test]
    fn test_is_io() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof").into();
        assert!(err.is_io());
        assert!(!Error::unsupported("x").is_io());
    }
}
