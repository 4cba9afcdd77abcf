//! Format conversion between images of the same size and chroma family.
//!
//! Supported pairs are a same-format copy (any format), NV12 to I420/YV12,
//! I420/YV12 to NV12 and I420 to/from YV12. Everything else is reported as
//! [`Error::UnsupportedConversion`], never approximated.

use bitflags::bitflags;

use crate::error::{Error, Result};
use crate::format::{ComponentInfo, FormatInfo, VideoFormat};
use crate::image::{round_up, Field, ImageView, ImageViewMut};
use crate::simd::{detect_simd, stream_copy, AlignedBuf, SimdCapabilities};

/// Minimum size of the bounce buffer used for USWC copies.
const MIN_CACHE_SIZE: usize = 4096;

bitflags! {
    /// Options for [`Converter::convert`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ConvertFlags: u32 {
        /// Convert the top field (even lines) only.
        const TOP_FIELD = 0x0001;
        /// Convert the bottom field (odd lines) only.
        const BOTTOM_FIELD = 0x0002;
        /// The source lives in uncacheable write-combining memory.
        const FROM_USWC = 0x0004;
    }
}

impl Default for ConvertFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// Image converter.
///
/// Holds the detected SIMD capabilities and the aligned bounce buffer
/// reused by USWC copies.
#[derive(Debug)]
pub struct Converter {
    caps: SimdCapabilities,
    cache: AlignedBuf,
}

impl Default for Converter {
    fn default() -> Self {
        Self::new()
    }
}

impl Converter {
    /// Create a converter using the capabilities of the running CPU.
    pub fn new() -> Self {
        Self::with_capabilities(detect_simd())
    }

    /// Create a converter restricted to `caps`.
    pub fn with_capabilities(caps: SimdCapabilities) -> Self {
        Self {
            caps,
            cache: AlignedBuf::new(),
        }
    }

    /// Capabilities the converter dispatches on.
    pub fn capabilities(&self) -> &SimdCapabilities {
        &self.caps
    }

    /// Convert `src` into `dst`.
    ///
    /// With [`ConvertFlags::TOP_FIELD`] and/or [`ConvertFlags::BOTTOM_FIELD`]
    /// only the selected fields are converted; the other lines of `dst` are
    /// left untouched. Field conversion fails if either image cannot be
    /// split into fields (see [`ImageView::field`]).
    ///
    /// # Panics
    ///
    /// Panics if the images differ in size or chroma type.
    pub fn convert(
        &mut self,
        dst: &mut ImageViewMut<'_>,
        src: &ImageView<'_>,
        flags: ConvertFlags,
    ) -> Result<()> {
        assert_eq!(
            (dst.width(), dst.height()),
            (src.width(), src.height()),
            "only images with the same size can be converted"
        );
        assert_eq!(
            dst.info().chroma,
            src.info().chroma,
            "only images with the same chroma type can be converted"
        );

        let fields = flags & (ConvertFlags::TOP_FIELD | ConvertFlags::BOTTOM_FIELD);
        if fields.is_empty() {
            return self.convert_frame(dst, src, flags);
        }

        for (flag, field) in [
            (ConvertFlags::TOP_FIELD, Field::Top),
            (ConvertFlags::BOTTOM_FIELD, Field::Bottom),
        ] {
            if fields.contains(flag) {
                let src = src.field(field)?;
                let mut dst = dst.field_mut(field)?;
                self.convert_frame(&mut dst, &src, flags)?;
            }
        }
        Ok(())
    }

    fn convert_frame(
        &mut self,
        dst: &mut ImageViewMut<'_>,
        src: &ImageView<'_>,
        flags: ConvertFlags,
    ) -> Result<()> {
        use VideoFormat::{Nv12, Yv12, I420};

        let (sf, df) = (src.format(), dst.format());
        let supported = sf == df
            || matches!((sf, df), (Nv12, I420 | Yv12) | (I420 | Yv12, Nv12) | (I420, Yv12) | (Yv12, I420));
        if !supported {
            tracing::error!(src = %sf, dst = %df, "Unsupported conversion");
            return Err(Error::UnsupportedConversion { src: sf, dst: df });
        }

        tracing::trace!(
            src = %sf,
            dst = %df,
            width = src.width(),
            height = src.height(),
            ?flags,
            "Converting image"
        );

        if flags.contains(ConvertFlags::FROM_USWC)
            && matches!(df, I420 | Yv12)
            && matches!(sf, Nv12 | I420 | Yv12)
        {
            self.copy_from_uswc(dst, src);
            return Ok(());
        }

        if sf == df {
            copy_planes(dst, src);
        } else {
            for component in 0..src.info().num_components() {
                copy_component(dst, src, component);
            }
        }
        Ok(())
    }

    /// Copy through the bounce buffer so the source is read with streaming
    /// loads only, one block of rows at a time.
    fn copy_from_uswc(&mut self, dst: &mut ImageViewMut<'_>, src: &ImageView<'_>) {
        let caps = self.caps;
        let info = src.info();
        self.cache.reserve(MIN_CACHE_SIZE.max(round_up(dst.width() as usize, 16)));

        for plane in 0..src.num_planes() {
            let (bytes, rows) = plane_extent(info, src.width(), src.height(), plane);
            let line = round_up(bytes, 16);
            self.cache.reserve(line);
            let cache = self.cache.as_mut_slice();
            let step = cache.len() / line;

            let pitch = src.pitch(plane);
            let mut y = 0;
            while y < rows {
                let block = step.min(rows - y);
                for i in 0..block {
                    let start = (y + i) * pitch;
                    let row = &src.plane(plane)[start..start + bytes];
                    stream_copy(&caps, &mut cache[i * line..], row);
                }

                for (component, comp) in info.components().iter().enumerate() {
                    if comp.plane as usize != plane {
                        continue;
                    }
                    let (w, h) = src.component_size(component);
                    let dc = *dst.info().component(component);
                    for i in 0..block.min((h as usize).saturating_sub(y)) {
                        let at = i * line + comp.pixel_offset as usize;
                        let from = &cache[at..(i + 1) * line];
                        let to = dst.component_row_mut(component, (y + i) as u32);
                        copy_samples(to, &dc, from, comp, w);
                    }
                }
                y += block;
            }
        }
    }
}

/// Convert `src` into `dst` with a one-off [`Converter`].
///
/// # Panics
///
/// Panics if the images differ in size or chroma type.
pub fn convert(dst: &mut ImageViewMut<'_>, src: &ImageView<'_>, flags: ConvertFlags) -> Result<()> {
    Converter::new().convert(dst, src, flags)
}

/// Visible bytes per row and visible rows of `plane`.
fn plane_extent(info: &FormatInfo, width: u32, height: u32, plane: usize) -> (usize, usize) {
    let mut bytes = 0;
    let mut rows = 0;
    for (i, comp) in info.components().iter().enumerate() {
        if comp.plane as usize != plane {
            continue;
        }
        let (w, h) = info.component_size(i, width, height);
        bytes = bytes.max(w as usize * comp.pixel_stride as usize);
        rows = rows.max(h as usize);
    }
    (bytes, rows)
}

fn copy_planes(dst: &mut ImageViewMut<'_>, src: &ImageView<'_>) {
    let info = src.info();
    for plane in 0..src.num_planes() {
        let (bytes, rows) = plane_extent(info, src.width(), src.height(), plane);
        let (sp, dp) = (src.pitch(plane), dst.pitch(plane));
        let from = src.plane(plane);
        let to = dst.plane_mut(plane);
        for y in 0..rows {
            to[y * dp..y * dp + bytes].copy_from_slice(&from[y * sp..y * sp + bytes]);
        }
    }
}

fn copy_component(dst: &mut ImageViewMut<'_>, src: &ImageView<'_>, component: usize) {
    let (w, h) = src.component_size(component);
    let sc = src.info().component(component);
    let dc = dst.info().component(component);
    for y in 0..h {
        copy_samples(dst.component_row_mut(component, y), dc, src.component_row(component, y), sc, w);
    }
}

/// Copy `width` samples between two rows that start at their component's
/// first sample.
fn copy_samples(to: &mut [u8], dc: &ComponentInfo, from: &[u8], sc: &ComponentInfo, width: u32) {
    let bps = sc.bytes_per_sample();
    debug_assert_eq!(bps, dc.bytes_per_sample());

    if sc.is_contiguous() && dc.is_contiguous() {
        let n = width as usize * bps;
        to[..n].copy_from_slice(&from[..n]);
        return;
    }

    let (ss, ds) = (sc.pixel_stride as usize, dc.pixel_stride as usize);
    for x in 0..width as usize {
        to[x * ds..x * ds + bps].copy_from_slice(&from[x * ss..x * ss + bps]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::Image;

    fn pattern(format: VideoFormat, width: u32, height: u32) -> Image {
        let mut image = Image::allocate(format, width, height).unwrap();
        let mut view = image.view_mut();
        for c in 0..view.info().num_components() {
            let (w, h) = view.component_size(c);
            for y in 0..h {
                for x in 0..w {
                    view.put_sample(c, x, y, (x * 3 + y * 7 + c as u32 * 50) & 0xff);
                }
            }
        }
        image
    }

    fn assert_same_samples(a: &ImageView<'_>, b: &ImageView<'_>) {
        for c in 0..a.info().num_components() {
            let (w, h) = a.component_size(c);
            for y in 0..h {
                for x in 0..w {
                    assert_eq!(a.sample(c, x, y), b.sample(c, x, y), "component {c} at ({x}, {y})");
                }
            }
        }
    }

    #[test]
    fn test_nv12_i420_nv12_round_trip() {
        let src = pattern(VideoFormat::Nv12, 37, 21);
        let mut planar = Image::allocate(VideoFormat::I420, 37, 21).unwrap();
        let mut back = Image::allocate(VideoFormat::Nv12, 37, 21).unwrap();

        let mut converter = Converter::new();
        converter.convert(&mut planar.view_mut(), &src.view(), ConvertFlags::empty()).unwrap();
        assert_same_samples(&src.view(), &planar.view());

        converter.convert(&mut back.view_mut(), &planar.view(), ConvertFlags::empty()).unwrap();
        assert_same_samples(&src.view(), &back.view());
    }

    #[test]
    fn test_i420_yv12_swap() {
        let src = pattern(VideoFormat::I420, 32, 16);
        let mut dst = Image::allocate(VideoFormat::Yv12, 32, 16).unwrap();
        convert(&mut dst.view_mut(), &src.view(), ConvertFlags::empty()).unwrap();
        assert_same_samples(&src.view(), &dst.view());
        assert_eq!(dst.view().plane(2)[0], src.view().plane(1)[0]);
    }

    #[test]
    fn test_same_format_copy_high_bit_depth() {
        let mut src = Image::allocate(VideoFormat::I420P10, 18, 10).unwrap();
        src.fill_component(0, 1000);
        src.fill_component(1, 3);
        src.fill_component(2, 513);
        let mut dst = Image::allocate(VideoFormat::I420P10, 18, 10).unwrap();
        convert(&mut dst.view_mut(), &src.view(), ConvertFlags::empty()).unwrap();
        assert_same_samples(&src.view(), &dst.view());
    }

    #[test]
    fn test_uswc_paths_match_plain_copy() {
        for sf in [VideoFormat::Nv12, VideoFormat::I420, VideoFormat::Yv12] {
            for df in [VideoFormat::I420, VideoFormat::Yv12] {
                let src = pattern(sf, 100, 70);
                let mut fast = Image::allocate(df, 100, 70).unwrap();
                let mut scalar = Image::allocate(df, 100, 70).unwrap();

                Converter::new()
                    .convert(&mut fast.view_mut(), &src.view(), ConvertFlags::FROM_USWC)
                    .unwrap();
                Converter::with_capabilities(SimdCapabilities::scalar())
                    .convert(&mut scalar.view_mut(), &src.view(), ConvertFlags::FROM_USWC)
                    .unwrap();

                assert_same_samples(&src.view(), &fast.view());
                assert_same_samples(&src.view(), &scalar.view());
            }
        }
    }

    #[test]
    fn test_uswc_large_frame_uses_several_blocks() {
        let src = pattern(VideoFormat::Nv12, 1920, 64);
        let mut dst = Image::allocate(VideoFormat::I420, 1920, 64).unwrap();
        convert(&mut dst.view_mut(), &src.view(), ConvertFlags::FROM_USWC).unwrap();
        assert_same_samples(&src.view(), &dst.view());
    }

    #[test]
    fn test_field_conversion_touches_selected_lines_only() {
        let src = pattern(VideoFormat::Nv12, 16, 16);
        let mut dst = Image::allocate(VideoFormat::I420, 16, 16).unwrap();
        dst.fill_component(0, 255);
        convert(&mut dst.view_mut(), &src.view(), ConvertFlags::TOP_FIELD).unwrap();

        let (s, d) = (src.view(), dst.view());
        for y in 0..16 {
            if y % 2 == 0 {
                assert_eq!(d.sample(0, 3, y), s.sample(0, 3, y));
            } else {
                assert_eq!(d.sample(0, 3, y), 255);
            }
        }

        convert(&mut dst.view_mut(), &src.view(), ConvertFlags::BOTTOM_FIELD).unwrap();
        assert_same_samples(
            &src.view().field(Field::Bottom).unwrap(),
            &dst.view().field(Field::Bottom).unwrap(),
        );
    }

    #[test]
    fn test_both_fields_equal_progressive() {
        let src = pattern(VideoFormat::Nv12, 24, 12);
        let mut interlaced = Image::allocate(VideoFormat::I420, 24, 12).unwrap();
        convert(
            &mut interlaced.view_mut(),
            &src.view(),
            ConvertFlags::TOP_FIELD | ConvertFlags::BOTTOM_FIELD,
        )
        .unwrap();
        assert_eq!(interlaced.view().sample(0, 5, 7), src.view().sample(0, 5, 7));
        assert_same_samples(
            &src.view().field(Field::Top).unwrap(),
            &interlaced.view().field(Field::Top).unwrap(),
        );
    }

    #[test]
    fn test_field_conversion_of_exact_size_planes_fails() {
        let y = vec![7u8; 16 * 6];
        let uv = vec![9u8; 16 * 3];
        let src = ImageView::from_planes(VideoFormat::Nv12, 16, 6, &[&y, &uv], &[16, 16]).unwrap();
        let mut dst = Image::allocate(VideoFormat::I420, 16, 6).unwrap();

        convert(&mut dst.view_mut(), &src, ConvertFlags::TOP_FIELD).unwrap();
        let err = convert(&mut dst.view_mut(), &src, ConvertFlags::BOTTOM_FIELD).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
    }

    #[test]
    fn test_unsupported_pair_names_formats() {
        let src = Image::allocate(VideoFormat::Yuy2, 16, 16).unwrap();
        let mut dst = Image::allocate(VideoFormat::Uyvy, 16, 16).unwrap();
        let err = convert(&mut dst.view_mut(), &src.view(), ConvertFlags::empty()).unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedConversion {
                src: VideoFormat::Yuy2,
                dst: VideoFormat::Uyvy
            }
        ));
        assert_eq!(err.to_string(), "Unsupported conversion (YUY2 -> UYVY)");
    }

    #[test]
    #[should_panic(expected = "same size")]
    fn test_size_mismatch_panics() {
        let src = Image::allocate(VideoFormat::I420, 16, 16).unwrap();
        let mut dst = Image::allocate(VideoFormat::I420, 32, 16).unwrap();
        let _ = convert(&mut dst.view_mut(), &src.view(), ConvertFlags::empty());
    }

    #[test]
    #[should_panic(expected = "same chroma type")]
    fn test_chroma_mismatch_panics() {
        let src = Image::allocate(VideoFormat::I420, 16, 16).unwrap();
        let mut dst = Image::allocate(VideoFormat::I444, 16, 16).unwrap();
        let _ = convert(&mut dst.view_mut(), &src.view(), ConvertFlags::empty());
    }
}
