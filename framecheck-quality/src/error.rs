//! Quality metric error types.

use framecheck_core::VideoFormat;
use thiserror::Error;

/// Quality metric errors.
#[derive(Debug, Error)]
pub enum QualityError {
    /// Dimension mismatch between the compared images.
    #[error("Dimension mismatch: image {image}, reference {reference}")]
    DimensionMismatch { image: String, reference: String },

    /// The images use different chroma subsampling.
    #[error("Chroma mismatch: image {image}, reference {reference}")]
    ChromaMismatch {
        image: VideoFormat,
        reference: VideoFormat,
    },

    /// Compared components of one image do not share a bit depth, or the two
    /// images use different depths.
    #[error("Bit depth mismatch: image {image} ({image_depth} bits), reference {reference} ({reference_depth} bits)")]
    BitDepthMismatch {
        image: VideoFormat,
        image_depth: u8,
        reference: VideoFormat,
        reference_depth: u8,
    },

    /// Alpha channels cannot be paired.
    #[error("Alpha mismatch: image {image}, reference {reference}")]
    AlphaMismatch {
        image: VideoFormat,
        reference: VideoFormat,
    },

    /// Metric not defined for the format.
    #[error("Metric {metric} is not supported for {format}")]
    UnsupportedMetric {
        metric: &'static str,
        format: VideoFormat,
    },

    /// Unknown metric name.
    #[error("Unknown quality metric: {0:?}")]
    UnknownMetric(String),
}

impl From<QualityError> for framecheck_core::Error {
    fn from(e: QualityError) -> Self {
        match e {
            QualityError::DimensionMismatch { .. } => framecheck_core::Error::InvalidParameter(e.to_string()),
            _ => framecheck_core::Error::Unsupported(e.to_string()),
        }
    }
}

/// Result type for quality metrics.
pub type Result<T> = std::result::Result<T, QualityError>;
