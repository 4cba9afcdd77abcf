//! Quality metrics integration tests.
//!
//! Tests for PSNR and Y-PSNR across formats, bit depths and alpha layouts.

use framecheck_core::{Image, Rect, VideoFormat};
use framecheck_quality::{compare, psnr, y_psnr, Psnr, PsnrConfig, QualityError, QualityMetric};

/// Create an image with every component set to one value.
fn create_uniform_image(format: VideoFormat, width: u32, height: u32, values: &[u32]) -> Image {
    let mut image = Image::allocate(format, width, height).unwrap();
    for (c, &v) in values.iter().enumerate() {
        image.fill_component(c, v);
    }
    image
}

/// Create an image with a gradient in every component.
fn create_gradient_image(format: VideoFormat, width: u32, height: u32) -> Image {
    let mut image = Image::allocate(format, width, height).unwrap();
    let mut view = image.view_mut();
    for c in 0..view.info().num_components() {
        let max = view.info().component(c).max_value();
        let (w, h) = view.component_size(c);
        for y in 0..h {
            for x in 0..w {
                view.put_sample(c, x, y, ((x + y) * 13 + c as u32 * 40) % (max + 1));
            }
        }
    }
    drop(view);
    image
}

/// Perturb every sample of `component` by a deterministic amount.
fn add_noise(image: &Image, component: usize, level: u32) -> Image {
    let mut noisy = image.clone();
    let mut view = noisy.view_mut();
    let max = view.info().component(component).max_value();
    let (w, h) = view.component_size(component);
    for y in 0..h {
        for x in 0..w {
            let v = view.sample(component, x, y);
            let delta = (x * 7 + y * 3) % (level + 1);
            view.put_sample(component, x, y, (v + delta).min(max));
        }
    }
    drop(view);
    noisy
}

// === Identity ===

/// Identical all-zero I420 frames score +infinity.
#[test]
fn test_psnr_identical_zero_frames() {
    let image = Image::allocate(VideoFormat::I420, 16, 16).unwrap();
    let score = compare(&image.view(), &image.view(), QualityMetric::Psnr).expect("PSNR should succeed");
    assert!(score.is_infinite() && score > 0.0);
}

/// Every YUV format scores +infinity against itself.
#[test]
fn test_psnr_self_comparison_all_formats() {
    for format in VideoFormat::ALL {
        let image = create_gradient_image(format, 33, 17);
        assert!(psnr(&image.view(), &image.view()).unwrap().is_infinite(), "{format}");
        if format.is_yuv() {
            assert!(y_psnr(&image.view(), &image.view()).unwrap().is_infinite(), "{format}");
        }
    }
}

// === Known values ===

/// Y=100 vs Y=102 on 8x8 I420 gives luma MSE 4, about 42.1 dB.
#[test]
fn test_y_psnr_known_value() {
    let image = create_uniform_image(VideoFormat::I420, 8, 8, &[100, 128, 128]);
    let reference = create_uniform_image(VideoFormat::I420, 8, 8, &[102, 128, 128]);

    let result = Psnr::new(PsnrConfig::luma())
        .calculate(&image.view(), &reference.view())
        .unwrap();
    assert!((result.mse - 4.0).abs() < 1e-12);
    assert!((result.psnr - 42.11).abs() < 0.01, "got {}", result.psnr);
}

/// Full PSNR pools the identical chroma samples with the luma error.
#[test]
fn test_psnr_pools_all_components() {
    let image = create_uniform_image(VideoFormat::I420, 8, 8, &[100, 128, 128]);
    let reference = create_uniform_image(VideoFormat::I420, 8, 8, &[102, 128, 128]);

    let result = Psnr::default().calculate(&image.view(), &reference.view()).unwrap();
    assert_eq!(result.samples, 64 + 16 + 16);
    assert_eq!(result.squared_error, 256);
    assert!((result.psnr - 43.871).abs() < 0.001, "got {}", result.psnr);
}

/// Odd sizes round the chroma dimensions up.
#[test]
fn test_psnr_odd_dimensions_count_partial_chroma() {
    let a = create_uniform_image(VideoFormat::I420, 9, 7, &[0, 0, 0]);
    let b = create_uniform_image(VideoFormat::I420, 9, 7, &[0, 1, 0]);
    let result = Psnr::default().calculate(&a.view(), &b.view()).unwrap();
    assert_eq!(result.samples, 63 + 2 * 5 * 4);
    assert_eq!(result.squared_error, 20);
}

/// 10-bit content uses 1023 as the peak value.
#[test]
fn test_psnr_high_bit_depth_peak() {
    let a = create_uniform_image(VideoFormat::I420P10, 16, 16, &[500, 512, 512]);
    let b = create_uniform_image(VideoFormat::I420P10, 16, 16, &[502, 512, 512]);
    let score = y_psnr(&a.view(), &b.view()).unwrap();
    let expected = 20.0 * 1023f64.log10() - 10.0 * 4f64.log10();
    assert!((score - expected).abs() < 1e-9);
}

// === Properties ===

/// PSNR is symmetric in its arguments.
#[test]
fn test_psnr_symmetric() {
    let reference = create_gradient_image(VideoFormat::I420, 64, 48);
    let distorted = add_noise(&reference, 0, 9);
    let distorted = add_noise(&distorted, 2, 4);

    for metric in QualityMetric::ALL {
        let ab = compare(&distorted.view(), &reference.view(), metric).unwrap();
        let ba = compare(&reference.view(), &distorted.view(), metric).unwrap();
        assert_eq!(ab, ba, "{metric}");
        assert!(ab.is_finite());
    }
}

/// More noise, lower score.
#[test]
fn test_psnr_decreases_with_noise() {
    let reference = create_gradient_image(VideoFormat::Nv12, 64, 64);
    let light = add_noise(&reference, 0, 2);
    let heavy = add_noise(&reference, 0, 30);

    let light_score = psnr(&light.view(), &reference.view()).unwrap();
    let heavy_score = psnr(&heavy.view(), &reference.view()).unwrap();
    assert!(light_score > heavy_score);
}

/// NV12 and I420 holding the same samples compare as identical.
#[test]
fn test_psnr_across_layouts() {
    let nv12 = create_uniform_image(VideoFormat::Nv12, 20, 10, &[50, 60, 70]);
    let i420 = create_uniform_image(VideoFormat::I420, 20, 10, &[50, 60, 70]);
    assert!(psnr(&nv12.view(), &i420.view()).unwrap().is_infinite());
}

/// A crop compares like a standalone image of the same content.
#[test]
fn test_psnr_on_subimages() {
    let a = create_gradient_image(VideoFormat::I420, 64, 64);
    let b = add_noise(&a, 0, 5);
    let rect = Rect::new(16, 16, 32, 32);
    let score = psnr(&a.view().subimage(rect).unwrap(), &b.view().subimage(rect).unwrap()).unwrap();
    assert!(score.is_finite());
}

// === Alpha ===

/// An alpha-less image is treated as fully opaque.
#[test]
fn test_psnr_alpha_vs_opaque() {
    let with_alpha = create_uniform_image(VideoFormat::Argb, 8, 8, &[1, 2, 3, 255]);
    let without = create_uniform_image(VideoFormat::Xrgb, 8, 8, &[1, 2, 3]);
    assert!(psnr(&with_alpha.view(), &without.view()).unwrap().is_infinite());

    let half = create_uniform_image(VideoFormat::Argb, 8, 8, &[1, 2, 3, 128]);
    let ab = psnr(&half.view(), &without.view()).unwrap();
    let ba = psnr(&without.view(), &half.view()).unwrap();
    assert_eq!(ab, ba);
    assert!(ab.is_finite());
}

/// Y-PSNR never looks at alpha.
#[test]
fn test_y_psnr_ignores_alpha() {
    let a = create_uniform_image(VideoFormat::Ayuv, 8, 8, &[10, 20, 30, 0]);
    let b = create_uniform_image(VideoFormat::Ayuv, 8, 8, &[10, 20, 30, 255]);
    assert!(y_psnr(&a.view(), &b.view()).unwrap().is_infinite());
    assert!(psnr(&a.view(), &b.view()).unwrap().is_finite());
}

// === Errors ===

/// Size mismatch fails.
#[test]
fn test_psnr_dimension_mismatch() {
    let a = Image::allocate(VideoFormat::I420, 64, 64).unwrap();
    let b = Image::allocate(VideoFormat::I420, 32, 32).unwrap();
    let result = psnr(&a.view(), &b.view());
    assert!(matches!(result, Err(QualityError::DimensionMismatch { .. })));
}

/// Different subsampling fails.
#[test]
fn test_psnr_chroma_mismatch() {
    let a = Image::allocate(VideoFormat::I420, 16, 16).unwrap();
    let b = Image::allocate(VideoFormat::I422, 16, 16).unwrap();
    let result = psnr(&a.view(), &b.view());
    assert!(matches!(result, Err(QualityError::ChromaMismatch { .. })));
}

/// Different bit depths fail.
#[test]
fn test_psnr_bit_depth_mismatch() {
    let a = Image::allocate(VideoFormat::I444P12, 16, 16).unwrap();
    let b = Image::allocate(VideoFormat::I444P16, 16, 16).unwrap();
    let result = compare(&a.view(), &b.view(), QualityMetric::YPsnr);
    assert!(matches!(result, Err(QualityError::BitDepthMismatch { .. })));
}
