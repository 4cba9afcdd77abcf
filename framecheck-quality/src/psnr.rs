//! Peak Signal-to-Noise Ratio (PSNR) metric.
//!
//! Squared errors are accumulated as integers over every compared sample
//! of every compared component, then turned into a single score:
//!
//! ```text
//! PSNR = 20·log10(MAX) − 10·log10(SE / N)
//! ```
//!
//! where `MAX = 2^depth − 1`. Identical images score `+∞`.
//!
//! Typical PSNR values:
//! - Excellent: > 40 dB
//! - Good: 30-40 dB
//! - Acceptable: 20-30 dB
//! - Poor: < 20 dB

use framecheck_core::ImageView;
use rayon::prelude::*;

use crate::error::{QualityError, Result};

/// PSNR result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PsnrResult {
    /// PSNR (dB).
    pub psnr: f64,
    /// MSE (Mean Squared Error).
    pub mse: f64,
    /// Sum of squared errors.
    pub squared_error: u64,
    /// Number of compared samples.
    pub samples: u64,
}

impl PsnrResult {
    fn from_error(squared_error: u64, samples: u64, max_value: u32) -> Self {
        let mse = if samples == 0 { 0.0 } else { squared_error as f64 / samples as f64 };
        let psnr = if squared_error == 0 {
            f64::INFINITY
        } else {
            20.0 * (max_value as f64).log10() - 10.0 * mse.log10()
        };
        Self {
            psnr,
            mse,
            squared_error,
            samples,
        }
    }

    /// Check if quality is excellent (> 40 dB).
    pub fn is_excellent(&self) -> bool {
        self.psnr > 40.0
    }

    /// Check if quality is good (30-40 dB).
    pub fn is_good(&self) -> bool {
        self.psnr >= 30.0 && self.psnr <= 40.0
    }

    /// Check if quality is acceptable (20-30 dB).
    pub fn is_acceptable(&self) -> bool {
        self.psnr >= 20.0 && self.psnr < 30.0
    }
}

/// PSNR calculator configuration.
#[derive(Debug, Clone, Default)]
pub struct PsnrConfig {
    /// Compare the luma component only (Y-PSNR). YUV formats only.
    pub luma_only: bool,
}

impl PsnrConfig {
    /// Configuration for Y-PSNR.
    pub fn luma() -> Self {
        Self { luma_only: true }
    }

    /// Set luma-only comparison.
    pub fn with_luma_only(mut self, luma_only: bool) -> Self {
        self.luma_only = luma_only;
        self
    }
}

/// PSNR calculator.
#[derive(Debug, Clone, Default)]
pub struct Psnr {
    config: PsnrConfig,
}

impl Psnr {
    /// Create a new PSNR calculator.
    pub fn new(config: PsnrConfig) -> Self {
        Self { config }
    }

    /// Calculate PSNR of `image` against `reference`.
    ///
    /// Both images must have the same size and chroma subsampling. The
    /// compared components (the common non-alpha ones, or luma only) must
    /// share one bit depth.
    ///
    /// When exactly one image carries alpha, that alpha is scored against
    /// the fully opaque value the other image implies. When both carry
    /// alpha, it is compared like any other component.
    pub fn calculate(&self, image: &ImageView<'_>, reference: &ImageView<'_>) -> Result<PsnrResult> {
        let (info, ref_info) = (image.info(), reference.info());
        validate(image, reference)?;

        let mut num_components = info.num_components().min(ref_info.num_components());
        if self.config.luma_only {
            if !info.format.is_yuv() {
                return Err(QualityError::UnsupportedMetric {
                    metric: "Y-PSNR",
                    format: info.format,
                });
            }
            num_components = 1;
        }

        let bit_depth = common_bit_depth(image, reference, num_components)?;
        let max_value = (1u32 << bit_depth) - 1;

        let mut squared_error = 0u64;
        let mut samples = 0u64;
        for component in 0..num_components {
            let (w, h) = image.component_size(component);
            squared_error += component_error(w, h, |x, y| {
                (image.sample(component, x, y), reference.sample(component, x, y))
            });
            samples += w as u64 * h as u64;
        }

        if !self.config.luma_only {
            if let Some(alpha) = lone_alpha(image, reference)? {
                let component = alpha.info().num_components() - 1;
                let (w, h) = alpha.component_size(component);
                squared_error += component_error(w, h, |x, y| (alpha.sample(component, x, y), max_value));
                samples += w as u64 * h as u64;
            }
        }

        let result = PsnrResult::from_error(squared_error, samples, max_value);
        tracing::trace!(
            image = %info.format,
            reference = %ref_info.format,
            components = num_components,
            psnr = result.psnr,
            "Computed PSNR"
        );
        Ok(result)
    }
}

/// Squared error over a `w`×`h` grid, rows summed in parallel.
fn component_error<F>(w: u32, h: u32, pair: F) -> u64
where
    F: Fn(u32, u32) -> (u32, u32) + Sync,
{
    (0..h)
        .into_par_iter()
        .map(|y| {
            (0..w)
                .map(|x| {
                    let (a, b) = pair(x, y);
                    let diff = a as i64 - b as i64;
                    (diff * diff) as u64
                })
                .sum::<u64>()
        })
        .sum()
}

fn validate(image: &ImageView<'_>, reference: &ImageView<'_>) -> Result<()> {
    if image.width() != reference.width() || image.height() != reference.height() {
        return Err(QualityError::DimensionMismatch {
            image: format!("{}x{}", image.width(), image.height()),
            reference: format!("{}x{}", reference.width(), reference.height()),
        });
    }

    let (info, ref_info) = (image.info(), reference.info());
    if info.chroma != ref_info.chroma
        || info.chroma_w_shift != ref_info.chroma_w_shift
        || info.chroma_h_shift != ref_info.chroma_h_shift
    {
        return Err(QualityError::ChromaMismatch {
            image: info.format,
            reference: ref_info.format,
        });
    }
    Ok(())
}

fn common_bit_depth(image: &ImageView<'_>, reference: &ImageView<'_>, num_components: usize) -> Result<u8> {
    let mismatch = |image_depth, reference_depth| QualityError::BitDepthMismatch {
        image: image.format(),
        image_depth,
        reference: reference.format(),
        reference_depth,
    };

    let (info, ref_info) = (image.info(), reference.info());
    let depth = info.component(0).bit_depth;
    let ref_depth = ref_info.component(0).bit_depth;
    for component in 1..num_components {
        let d = info.component(component).bit_depth;
        let rd = ref_info.component(component).bit_depth;
        if d != depth {
            return Err(mismatch(d, ref_depth));
        }
        if rd != ref_depth {
            return Err(mismatch(depth, rd));
        }
    }
    if depth != ref_depth {
        return Err(mismatch(depth, ref_depth));
    }
    Ok(depth)
}

/// The image whose alpha has no counterpart, if any.
fn lone_alpha<'v, 'a>(
    image: &'v ImageView<'a>,
    reference: &'v ImageView<'a>,
) -> Result<Option<&'v ImageView<'a>>> {
    let (format, ref_format) = (image.format(), reference.format());
    if !format.has_alpha() && !ref_format.has_alpha() {
        return Ok(None);
    }

    let (n, ref_n) = (image.info().num_components(), reference.info().num_components());
    match (n, ref_n) {
        (4, 3) => Ok(Some(image)),
        (3, 4) => Ok(Some(reference)),
        (4, 4) => Ok(None),
        _ => Err(QualityError::AlphaMismatch {
            image: format,
            reference: ref_format,
        }),
    }
}

/// Calculate PSNR over all components.
pub fn psnr(image: &ImageView<'_>, reference: &ImageView<'_>) -> Result<f64> {
    Ok(Psnr::default().calculate(image, reference)?.psnr)
}

/// Calculate PSNR over the luma component only.
pub fn y_psnr(image: &ImageView<'_>, reference: &ImageView<'_>) -> Result<f64> {
    Ok(Psnr::new(PsnrConfig::luma()).calculate(image, reference)?.psnr)
}

#[cfg(test)]
mod tests {
    use framecheck_core::{Image, VideoFormat};

    use super::*;

    fn create_test_image(format: VideoFormat, width: u32, height: u32, values: &[u32]) -> Image {
        let mut image = Image::allocate(format, width, height).unwrap();
        for (c, &v) in values.iter().enumerate() {
            image.fill_component(c, v);
        }
        image
    }

    #[test]
    fn test_identical_images() {
        let image = create_test_image(VideoFormat::I420, 16, 16, &[0, 0, 0]);
        let result = psnr(&image.view(), &image.view()).unwrap();
        assert!(result.is_infinite());
    }

    #[test]
    fn test_luma_offset_of_two() {
        let image = create_test_image(VideoFormat::I420, 8, 8, &[100, 128, 128]);
        let reference = create_test_image(VideoFormat::I420, 8, 8, &[102, 128, 128]);

        let luma = Psnr::new(PsnrConfig::luma())
            .calculate(&image.view(), &reference.view())
            .unwrap();
        assert_eq!(luma.squared_error, 256);
        assert_eq!(luma.samples, 64);
        assert!((luma.mse - 4.0).abs() < 1e-12);
        assert!((luma.psnr - 42.110_203_695_399_48).abs() < 1e-9);

        // Chroma samples are identical and dilute the error.
        let full = Psnr::default().calculate(&image.view(), &reference.view()).unwrap();
        assert_eq!(full.samples, 96);
        assert!(full.psnr > luma.psnr);
    }

    #[test]
    fn test_dimension_mismatch() {
        let a = create_test_image(VideoFormat::I420, 64, 64, &[128]);
        let b = create_test_image(VideoFormat::I420, 32, 32, &[128]);
        let result = psnr(&a.view(), &b.view());
        assert!(matches!(result, Err(QualityError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_bit_depth_mismatch() {
        let a = create_test_image(VideoFormat::I420, 16, 16, &[]);
        let b = create_test_image(VideoFormat::I420P10, 16, 16, &[]);
        assert!(matches!(
            psnr(&a.view(), &b.view()),
            Err(QualityError::BitDepthMismatch { .. })
        ));
    }

    #[test]
    fn test_y_psnr_rejects_rgb() {
        let a = create_test_image(VideoFormat::Bgrx, 16, 16, &[]);
        assert!(matches!(
            y_psnr(&a.view(), &a.view()),
            Err(QualityError::UnsupportedMetric { .. })
        ));
        assert!(psnr(&a.view(), &a.view()).unwrap().is_infinite());
    }

    #[test]
    fn test_lone_alpha_scored_against_opaque() {
        let opaque = create_test_image(VideoFormat::Bgra, 4, 4, &[10, 20, 30, 255]);
        let plain = create_test_image(VideoFormat::Bgrx, 4, 4, &[10, 20, 30]);
        assert!(psnr(&opaque.view(), &plain.view()).unwrap().is_infinite());
        assert!(psnr(&plain.view(), &opaque.view()).unwrap().is_infinite());

        let translucent = create_test_image(VideoFormat::Bgra, 4, 4, &[10, 20, 30, 0]);
        let a = Psnr::default().calculate(&translucent.view(), &plain.view()).unwrap();
        let b = Psnr::default().calculate(&plain.view(), &translucent.view()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.samples, 4 * 16);
        assert_eq!(a.squared_error, 16 * 255 * 255);
    }

    #[test]
    fn test_result_helpers() {
        let result = PsnrResult::from_error(256, 64, 255);
        assert!(result.is_excellent());
        assert!(!result.is_good());
    }
}
