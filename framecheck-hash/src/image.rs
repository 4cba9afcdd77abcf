//! Frame hashing.

use framecheck_core::{Error, ImageView, Result};

use crate::context::HashContext;

/// Compute the hash of a YUV image into `ctx`.
///
/// The context is reset, fed with the Y, U and V components in that order
/// (each row top to bottom, true dimensions only), and finalized. Alpha is
/// never hashed.
///
/// Grayscale images hash their luma followed by two synthetic 4:2:0 chroma
/// planes holding mid-gray (`1 << (depth - 1)`). This keeps checksums equal
/// to those of the same picture decoded to I420 with neutral chroma, which
/// existing reference files rely on.
///
/// Samples are hashed as stored, 16-bit ones as their little-endian bytes.
/// Bits above the component depth are not masked, so two images that read
/// back the same through [`ImageView::sample`] can still hash differently
/// when one carries stray high bits.
pub fn hash_image(view: &ImageView<'_>, ctx: &mut HashContext) -> Result<()> {
    let info = view.info();
    if !info.format.is_yuv() {
        tracing::error!(format = %info.format, "Unsupported image format for hashing");
        return Err(Error::unsupported(format!(
            "unsupported image format ({})",
            info.name
        )));
    }

    ctx.init();
    hash_component(view, 0, ctx);
    if info.num_components() > 1 {
        hash_component(view, 1, ctx);
        hash_component(view, 2, ctx);
    } else {
        hash_neutral_chroma(view, ctx);
    }
    ctx.finalize();

    tracing::trace!(
        format = %info.format,
        width = view.width(),
        height = view.height(),
        value = %ctx.hex(),
        "Hashed image"
    );
    Ok(())
}

/// Feed row `y` of `component` into `ctx` without resetting or finalizing.
///
/// Rows of contiguous components are fed in one piece; interleaved
/// components are fed one sample at a time.
pub fn hash_component_row(view: &ImageView<'_>, component: usize, y: u32, ctx: &mut HashContext) {
    let comp = view.info().component(component);
    let (w, _) = view.component_size(component);
    let row = view.component_row(component, y);
    let bps = comp.bytes_per_sample();

    if comp.is_contiguous() {
        ctx.update(&row[..w as usize * bps]);
    } else {
        let stride = comp.pixel_stride as usize;
        for x in 0..w as usize {
            ctx.update(&row[x * stride..x * stride + bps]);
        }
    }
}

fn hash_component(view: &ImageView<'_>, component: usize, ctx: &mut HashContext) {
    let (_, h) = view.component_size(component);
    for y in 0..h {
        hash_component_row(view, component, y, ctx);
    }
}

fn hash_neutral_chroma(view: &ImageView<'_>, ctx: &mut HashContext) {
    let comp = view.info().component(0);
    let (w, h) = (view.width().div_ceil(2), view.height().div_ceil(2));
    let gray = 1u16 << (comp.bit_depth - 1);

    let row: Vec<u8> = if comp.bytes_per_sample() == 1 {
        vec![gray as u8; w as usize]
    } else {
        gray.to_le_bytes().repeat(w as usize)
    };
    for _ in 0..2 * h {
        ctx.update(&row);
    }
}
