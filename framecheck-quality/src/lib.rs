//! Objective video quality metrics for framecheck.
//!
//! This crate compares decoded frames against reference frames:
//!
//! - **PSNR** (Peak Signal-to-Noise Ratio) over every common component
//! - **Y-PSNR**, the same restricted to luma
//!
//! # Example
//!
//! ```no_run
//! use framecheck_core::{Image, VideoFormat};
//! use framecheck_quality::{compare, QualityMetric};
//!
//! let decoded = Image::allocate(VideoFormat::Nv12, 1920, 1080)?;
//! let reference = Image::allocate(VideoFormat::I420, 1920, 1080)?;
//!
//! let score = compare(&decoded.view(), &reference.view(), QualityMetric::YPsnr)?;
//! println!("{score:.2} dB");
//! # Ok::<(), framecheck_core::Error>(())
//! ```

use std::fmt;
use std::str::FromStr;

use framecheck_core::ImageView;

pub mod error;
pub mod psnr;

pub use error::{QualityError, Result};
pub use psnr::{psnr, y_psnr, Psnr, PsnrConfig, PsnrResult};

/// Quality metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QualityMetric {
    /// PSNR over all common components.
    Psnr,
    /// PSNR over luma only.
    YPsnr,
}

impl QualityMetric {
    /// Every supported metric.
    pub const ALL: [QualityMetric; 2] = [QualityMetric::Psnr, QualityMetric::YPsnr];

    /// Metric name as used on the command line and in reports.
    pub fn name(self) -> &'static str {
        match self {
            QualityMetric::Psnr => "psnr",
            QualityMetric::YPsnr => "y_psnr",
        }
    }

    fn psnr_config(self) -> PsnrConfig {
        PsnrConfig::default().with_luma_only(self == QualityMetric::YPsnr)
    }
}

impl fmt::Display for QualityMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for QualityMetric {
    type Err = QualityError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| QualityError::UnknownMetric(s.to_string()))
    }
}

/// Score `image` against `reference` with `metric`.
pub fn compare(image: &ImageView<'_>, reference: &ImageView<'_>, metric: QualityMetric) -> Result<f64> {
    let result = Psnr::new(metric.psnr_config()).calculate(image, reference)?;
    Ok(result.psnr)
}

/// Running statistics over a sequence of per-frame scores.
#[derive(Debug, Clone, Default)]
pub struct SequenceScore {
    scores: Vec<f64>,
}

impl SequenceScore {
    /// Create an empty score sheet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one frame's score.
    pub fn add(&mut self, score: f64) {
        self.scores.push(score);
    }

    /// Number of recorded frames.
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Check whether no frame was recorded.
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Average of the finite scores. Lossless frames are left out.
    pub fn average(&self) -> Option<f64> {
        let finite: Vec<f64> = self.scores.iter().copied().filter(|s| s.is_finite()).collect();
        if finite.is_empty() {
            None
        } else {
            Some(finite.iter().sum::<f64>() / finite.len() as f64)
        }
    }

    /// Lowest score (worst frame).
    pub fn min(&self) -> Option<f64> {
        self.scores
            .iter()
            .copied()
            .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
    }
}
