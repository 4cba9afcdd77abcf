//! Video frame buffer abstractions.
//!
//! [`Image`] owns one contiguous buffer laid out by [`ImageLayout`].
//! [`ImageView`] and [`ImageViewMut`] borrow pixel memory, either from an
//! [`Image`] or from a decoder that hands its own surface over for the
//! duration of a call. Cropped and field views are derived from a parent
//! view and share its memory; the borrow checker keeps the parent alive for
//! as long as any derived view exists.

use std::fmt;

use byteorder::{BigEndian, ByteOrder as _, LittleEndian};

use crate::error::{Error, Result};
use crate::format::{self, ByteOrder, ComponentInfo, FormatInfo, VideoFormat, MAX_PLANES};

/// Width and height are padded to this many pixels when allocating.
pub const DIMENSION_ALIGNMENT: u32 = 16;

/// Round `v` up to a multiple of `a`, which must be a power of two.
pub(crate) fn round_up(v: usize, a: usize) -> usize {
    (v + a - 1) & !(a - 1)
}

/// A rectangular region of an image, in luma pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    /// Create a new rectangle.
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// One field of an interlaced frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Even lines.
    Top,
    /// Odd lines.
    Bottom,
}

/// Memory layout of an image: per-plane pitches, offsets and row counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageLayout {
    /// Pixel format.
    pub format: VideoFormat,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Number of planes.
    pub num_planes: usize,
    /// Bytes per row, per plane.
    pub pitches: [usize; MAX_PLANES],
    /// Byte offset of each plane from the start of the buffer.
    pub offsets: [usize; MAX_PLANES],
    /// Allocated rows, per plane.
    pub heights: [usize; MAX_PLANES],
    /// Total buffer size in bytes.
    pub data_size: usize,
}

impl ImageLayout {
    /// Compute the layout of a `width`×`height` image of `format`.
    ///
    /// Dimensions are padded to [`DIMENSION_ALIGNMENT`] before the chroma
    /// shifts are applied, so every plane row is a whole number of pixels.
    pub fn new(format: VideoFormat, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::invalid_param(format!(
                "image dimensions must be non-zero, got {width}x{height}"
            )));
        }

        let info = format.info();
        let awidth = round_up(width as usize, DIMENSION_ALIGNMENT as usize);
        let aheight = round_up(height as usize, DIMENSION_ALIGNMENT as usize);

        let mut pitches = [0usize; MAX_PLANES];
        let mut heights = [0usize; MAX_PLANES];
        for (i, comp) in info.components().iter().enumerate() {
            let plane = comp.plane as usize;
            let (ws, hs) = if i > 0 {
                (info.chroma_w_shift, info.chroma_h_shift)
            } else {
                (0, 0)
            };

            let pitch = (comp.pixel_stride as usize * awidth) >> ws;
            if pitches[plane] != 0 && pitches[plane] != pitch {
                return Err(Error::InvalidFormat {
                    format,
                    reason: "components sharing a plane disagree on pitch",
                });
            }
            pitches[plane] = pitch;

            let rows = aheight >> hs;
            if heights[plane] != 0 && heights[plane] != rows {
                return Err(Error::InvalidFormat {
                    format,
                    reason: "components sharing a plane disagree on height",
                });
            }
            heights[plane] = rows;
        }

        let num_planes = info.num_planes as usize;
        let mut offsets = [0usize; MAX_PLANES];
        let mut data_size = 0usize;
        for plane in 0..num_planes {
            if pitches[plane] == 0 || heights[plane] == 0 {
                return Err(Error::InvalidFormat {
                    format,
                    reason: "plane has no components",
                });
            }
            offsets[plane] = data_size;
            data_size = pitches[plane]
                .checked_mul(heights[plane])
                .and_then(|size| size.checked_add(data_size))
                .ok_or_else(|| {
                    Error::ResourceExhausted(format!("{width}x{height} {format} overflows"))
                })?;
        }

        Ok(Self {
            format,
            width,
            height,
            num_planes,
            pitches,
            offsets,
            heights,
            data_size,
        })
    }

    /// Size in bytes of `plane`.
    pub fn plane_size(&self, plane: usize) -> usize {
        self.pitches[plane] * self.heights[plane]
    }
}

/// A frame buffer owning its pixel memory.
///
/// `Image::default()` is an empty image; [`Image::release`] returns an image
/// to that state.
#[derive(Clone, Default)]
pub struct Image {
    layout: Option<ImageLayout>,
    data: Vec<u8>,
}

impl Image {
    /// Allocate a zero-filled image.
    ///
    /// Either the whole buffer is allocated or an error is returned; no
    /// partially built image is ever observable.
    pub fn allocate(format: VideoFormat, width: u32, height: u32) -> Result<Self> {
        let layout = ImageLayout::new(format, width, height)?;

        let mut data = Vec::new();
        data.try_reserve_exact(layout.data_size).map_err(|e| {
            Error::ResourceExhausted(format!(
                "{} bytes for {width}x{height} {format}: {e}",
                layout.data_size
            ))
        })?;
        data.resize(layout.data_size, 0);

        tracing::debug!(
            %format,
            width,
            height,
            size = layout.data_size,
            "Allocated image"
        );

        Ok(Self {
            layout: Some(layout),
            data,
        })
    }

    /// Free the pixel buffer. Calling this more than once is harmless.
    pub fn release(&mut self) {
        self.layout = None;
        self.data = Vec::new();
    }

    /// Check whether the image holds no buffer.
    pub fn is_empty(&self) -> bool {
        self.layout.is_none()
    }

    /// Layout of the buffer, if allocated.
    pub fn layout(&self) -> Option<&ImageLayout> {
        self.layout.as_ref()
    }

    /// Pixel format, if allocated.
    pub fn format(&self) -> Option<VideoFormat> {
        self.layout.map(|l| l.format)
    }

    /// Width in pixels, zero when empty.
    pub fn width(&self) -> u32 {
        self.layout.map_or(0, |l| l.width)
    }

    /// Height in pixels, zero when empty.
    pub fn height(&self) -> u32 {
        self.layout.map_or(0, |l| l.height)
    }

    /// The whole pixel buffer, padding included.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Set every sample of `component` to `value`.
    pub fn fill_component(&mut self, component: usize, value: u32) {
        self.view_mut().fill_component(component, value);
    }

    /// Borrow the image.
    ///
    /// # Panics
    ///
    /// Panics if the image has been released.
    pub fn view(&self) -> ImageView<'_> {
        let layout = self.layout.expect("view of a released image");
        let mut planes: [&[u8]; MAX_PLANES] = [&[]; MAX_PLANES];
        for (plane, slot) in planes.iter_mut().enumerate().take(layout.num_planes) {
            let start = layout.offsets[plane];
            *slot = &self.data[start..start + layout.plane_size(plane)];
        }
        ImageView {
            info: layout.format.info(),
            width: layout.width,
            height: layout.height,
            planes,
            pitches: layout.pitches,
        }
    }

    /// Mutably borrow the image.
    ///
    /// # Panics
    ///
    /// Panics if the image has been released.
    pub fn view_mut(&mut self) -> ImageViewMut<'_> {
        let layout = self.layout.expect("view of a released image");
        let mut planes: [&mut [u8]; MAX_PLANES] = Default::default();
        let mut rest: &mut [u8] = &mut self.data;
        let mut consumed = 0;
        for (plane, slot) in planes.iter_mut().enumerate().take(layout.num_planes) {
            let (_, tail) = std::mem::take(&mut rest).split_at_mut(layout.offsets[plane] - consumed);
            let (bytes, tail) = tail.split_at_mut(layout.plane_size(plane));
            *slot = bytes;
            rest = tail;
            consumed = layout.offsets[plane] + layout.plane_size(plane);
        }
        ImageViewMut {
            info: layout.format.info(),
            width: layout.width,
            height: layout.height,
            planes,
            pitches: layout.pitches,
        }
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.layout {
            Some(layout) => f
                .debug_struct("Image")
                .field("format", &layout.format)
                .field("width", &layout.width)
                .field("height", &layout.height)
                .field("data_size", &layout.data_size)
                .finish(),
            None => f.write_str("Image(released)"),
        }
    }
}

/// Bytes covered by one row of `comp` that is `width` samples wide.
fn row_span(comp: &ComponentInfo, width: u32) -> usize {
    if width == 0 {
        return 0;
    }
    (width as usize - 1) * comp.pixel_stride as usize + comp.bytes_per_sample()
}

fn sample_offset(comp: &ComponentInfo, pitch: usize, x: u32, y: u32) -> usize {
    y as usize * pitch + x as usize * comp.pixel_stride as usize + comp.pixel_offset as usize
}

fn read_sample(info: &FormatInfo, comp: &ComponentInfo, bytes: &[u8], at: usize) -> u32 {
    if comp.bit_depth <= 8 {
        return bytes[at] as u32;
    }
    let raw = match info.wire.byte_order {
        ByteOrder::Lsb => LittleEndian::read_u16(&bytes[at..at + 2]),
        ByteOrder::Msb => BigEndian::read_u16(&bytes[at..at + 2]),
    };
    raw as u32 & comp.max_value()
}

fn write_sample(info: &FormatInfo, comp: &ComponentInfo, bytes: &mut [u8], at: usize, value: u32) {
    let value = value & comp.max_value();
    if comp.bit_depth <= 8 {
        bytes[at] = value as u8;
        return;
    }
    match info.wire.byte_order {
        ByteOrder::Lsb => LittleEndian::write_u16(&mut bytes[at..at + 2], value as u16),
        ByteOrder::Msb => BigEndian::write_u16(&mut bytes[at..at + 2], value as u16),
    }
}

/// Check that caller-supplied planes cover the geometry of `format`.
fn validate_planes(
    info: &FormatInfo,
    width: u32,
    height: u32,
    lens: &[usize],
    pitches: &[usize],
) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(Error::invalid_param(format!(
            "image dimensions must be non-zero, got {width}x{height}"
        )));
    }
    let num_planes = info.num_planes as usize;
    if lens.len() < num_planes || pitches.len() < num_planes {
        return Err(Error::invalid_param(format!(
            "{} needs {num_planes} planes, got {}",
            info.name,
            lens.len().min(pitches.len())
        )));
    }

    let mut rows = [0usize; MAX_PLANES];
    let mut spans = [0usize; MAX_PLANES];
    for (i, comp) in info.components().iter().enumerate() {
        let plane = comp.plane as usize;
        let (w, h) = info.component_size(i, width, height);
        rows[plane] = rows[plane].max(h as usize);
        let span = (row_span(comp, w) + comp.pixel_offset as usize).max(w as usize * comp.pixel_stride as usize);
        spans[plane] = spans[plane].max(span);
    }

    for plane in 0..num_planes {
        if pitches[plane] < spans[plane] {
            return Err(Error::invalid_param(format!(
                "plane {plane} pitch {} is shorter than a row ({} bytes)",
                pitches[plane], spans[plane]
            )));
        }
        let needed = (rows[plane] - 1) * pitches[plane] + spans[plane];
        if lens[plane] < needed {
            return Err(Error::BufferTooSmall {
                needed,
                available: lens[plane],
            });
        }
    }
    Ok(())
}

/// Check that field planes (already offset, pitches doubled) cover every
/// row of a field taken from a `width`×`height` parent.
fn check_field(
    info: &FormatInfo,
    width: u32,
    height: u32,
    lens: &[usize; MAX_PLANES],
    pitches: &[usize; MAX_PLANES],
    field: Field,
) -> Result<()> {
    if height < 2 {
        return Err(Error::invalid_param(format!(
            "{field:?} field of a {width}x{height} image has no rows"
        )));
    }
    validate_planes(info, width, height / 2, lens, pitches).map_err(|e| {
        Error::invalid_param(format!(
            "{field:?} field of {width}x{height} {} exceeds the parent planes: {e}",
            info.name
        ))
    })
}

/// Compute per-plane byte offsets of `rect` within a parent view.
fn subimage_offsets(
    info: &FormatInfo,
    parent_width: u32,
    parent_height: u32,
    pitches: &[usize; MAX_PLANES],
    rect: &Rect,
) -> Result<[usize; MAX_PLANES]> {
    if rect.width == 0 || rect.height == 0 {
        return Err(Error::invalid_param("subimage rectangle is empty"));
    }
    let fits_x = rect.x.checked_add(rect.width).is_some_and(|r| r <= parent_width);
    let fits_y = rect.y.checked_add(rect.height).is_some_and(|b| b <= parent_height);
    if !fits_x || !fits_y {
        return Err(Error::invalid_param(format!(
            "subimage {rect:?} exceeds {parent_width}x{parent_height}"
        )));
    }

    // A crop starting between two chroma samples would read the neighbour's
    // chroma, so the origin must sit on the chroma grid.
    if info.num_components() > 1 && info.format.is_yuv() {
        let mx = (1u32 << info.chroma_w_shift) - 1;
        let my = (1u32 << info.chroma_h_shift) - 1;
        if rect.x & mx != 0 || rect.y & my != 0 {
            return Err(Error::invalid_param(format!(
                "subimage origin ({}, {}) is not aligned to the {} chroma grid",
                rect.x, rect.y, info.name
            )));
        }
    }

    let pixel_pitches = format::pixel_pitches(info.format)?;
    let mut offsets = [0usize; MAX_PLANES];
    offsets[0] = rect.y as usize * pitches[0] + rect.x as usize * pixel_pitches[0] as usize;
    for plane in 1..info.num_planes as usize {
        offsets[plane] = ((rect.y as usize * pitches[plane]) >> info.chroma_h_shift)
            + ((rect.x as usize * pixel_pitches[plane] as usize) >> info.chroma_w_shift);
    }
    Ok(offsets)
}

/// A borrowed, read-only frame buffer.
#[derive(Clone, Copy)]
pub struct ImageView<'a> {
    info: &'static FormatInfo,
    width: u32,
    height: u32,
    planes: [&'a [u8]; MAX_PLANES],
    pitches: [usize; MAX_PLANES],
}

impl<'a> ImageView<'a> {
    /// Wrap externally owned planes, e.g. a mapped decoder surface.
    ///
    /// Each plane slice starts at the plane's first pixel and must cover
    /// every row the format needs at the given pitch.
    pub fn from_planes(
        format: VideoFormat,
        width: u32,
        height: u32,
        planes: &[&'a [u8]],
        pitches: &[usize],
    ) -> Result<Self> {
        let info = format.info();
        let lens: Vec<usize> = planes.iter().map(|p| p.len()).collect();
        validate_planes(info, width, height, &lens, pitches)?;

        let mut view = Self {
            info,
            width,
            height,
            planes: [&[]; MAX_PLANES],
            pitches: [0; MAX_PLANES],
        };
        for plane in 0..info.num_planes as usize {
            view.planes[plane] = planes[plane];
            view.pitches[plane] = pitches[plane];
        }
        Ok(view)
    }

    /// Pixel format.
    pub fn format(&self) -> VideoFormat {
        self.info.format
    }

    /// Format descriptor.
    pub fn info(&self) -> &'static FormatInfo {
        self.info
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of planes.
    pub fn num_planes(&self) -> usize {
        self.info.num_planes as usize
    }

    /// Plane memory, starting at its first pixel.
    pub fn plane(&self, plane: usize) -> &'a [u8] {
        self.planes[plane]
    }

    /// Bytes per row of `plane`.
    pub fn pitch(&self, plane: usize) -> usize {
        self.pitches[plane]
    }

    /// True (unpadded) dimensions of `component`.
    pub fn component_size(&self, component: usize) -> (u32, u32) {
        self.info.component_size(component, self.width, self.height)
    }

    /// Sample value of `component` at (`x`, `y`), masked to its bit depth.
    pub fn sample(&self, component: usize, x: u32, y: u32) -> u32 {
        let comp = self.info.component(component);
        let plane = comp.plane as usize;
        let at = sample_offset(comp, self.pitches[plane], x, y);
        read_sample(self.info, comp, self.planes[plane], at)
    }

    /// Bytes spanned by row `y` of `component`, from its first sample to the
    /// end of its last one. Interleaved components include the bytes of
    /// their neighbours; step by `pixel_stride` to visit samples.
    pub fn component_row(&self, component: usize, y: u32) -> &'a [u8] {
        let comp = self.info.component(component);
        let plane = comp.plane as usize;
        let (w, _) = self.component_size(component);
        let start = sample_offset(comp, self.pitches[plane], 0, y);
        &self.planes[plane][start..start + row_span(comp, w)]
    }

    /// A view of `rect` sharing this view's memory.
    ///
    /// Fails if the rectangle leaves the image or, for YUV formats, if its
    /// origin does not sit on the chroma grid.
    pub fn subimage(&self, rect: Rect) -> Result<ImageView<'a>> {
        let offsets = subimage_offsets(self.info, self.width, self.height, &self.pitches, &rect)?;
        let mut view = *self;
        view.width = rect.width;
        view.height = rect.height;
        for plane in 0..self.num_planes() {
            view.planes[plane] = &self.planes[plane][offsets[plane]..];
        }
        Ok(view)
    }

    /// A half-height view of one field, sharing this view's memory.
    ///
    /// Fails with [`Error::InvalidParameter`] when the image has fewer than
    /// two rows, or when the parent planes end before the last row of the
    /// field. The latter happens with exact-size 4:2:0 planes whose height
    /// is 2 mod 4: the bottom field needs one chroma row past the parent.
    pub fn field(&self, field: Field) -> Result<ImageView<'a>> {
        let mut view = *self;
        for plane in 0..self.num_planes() {
            if field == Field::Bottom {
                view.planes[plane] = self.planes[plane].get(self.pitches[plane]..).unwrap_or(&[]);
            }
            view.pitches[plane] = self.pitches[plane] * 2;
        }
        let lens = view.planes.map(|p| p.len());
        check_field(self.info, self.width, self.height, &lens, &view.pitches, field)?;
        view.height = self.height / 2;
        Ok(view)
    }
}

impl fmt::Debug for ImageView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageView")
            .field("format", &self.info.format)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("pitches", &&self.pitches[..self.num_planes()])
            .finish()
    }
}

/// A borrowed, writable frame buffer.
pub struct ImageViewMut<'a> {
    info: &'static FormatInfo,
    width: u32,
    height: u32,
    planes: [&'a mut [u8]; MAX_PLANES],
    pitches: [usize; MAX_PLANES],
}

impl<'a> ImageViewMut<'a> {
    /// Wrap externally owned, writable planes.
    pub fn from_planes(
        format: VideoFormat,
        width: u32,
        height: u32,
        planes: impl IntoIterator<Item = &'a mut [u8]>,
        pitches: &[usize],
    ) -> Result<Self> {
        let info = format.info();
        let planes: Vec<&'a mut [u8]> = planes.into_iter().collect();
        let lens: Vec<usize> = planes.iter().map(|p| p.len()).collect();
        validate_planes(info, width, height, &lens, pitches)?;

        let mut slots: [&'a mut [u8]; MAX_PLANES] = Default::default();
        let mut plane_pitches = [0usize; MAX_PLANES];
        for (plane, bytes) in planes.into_iter().take(info.num_planes as usize).enumerate() {
            slots[plane] = bytes;
            plane_pitches[plane] = pitches[plane];
        }
        Ok(Self {
            info,
            width,
            height,
            planes: slots,
            pitches: plane_pitches,
        })
    }

    /// Pixel format.
    pub fn format(&self) -> VideoFormat {
        self.info.format
    }

    /// Format descriptor.
    pub fn info(&self) -> &'static FormatInfo {
        self.info
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of planes.
    pub fn num_planes(&self) -> usize {
        self.info.num_planes as usize
    }

    /// Bytes per row of `plane`.
    pub fn pitch(&self, plane: usize) -> usize {
        self.pitches[plane]
    }

    /// Writable plane memory, starting at its first pixel.
    pub fn plane_mut(&mut self, plane: usize) -> &mut [u8] {
        self.planes[plane]
    }

    /// True (unpadded) dimensions of `component`.
    pub fn component_size(&self, component: usize) -> (u32, u32) {
        self.info.component_size(component, self.width, self.height)
    }

    /// Read-only view of the same memory.
    pub fn as_view(&self) -> ImageView<'_> {
        let mut planes: [&[u8]; MAX_PLANES] = [&[]; MAX_PLANES];
        for (slot, bytes) in planes.iter_mut().zip(self.planes.iter()) {
            *slot = bytes;
        }
        ImageView {
            info: self.info,
            width: self.width,
            height: self.height,
            planes,
            pitches: self.pitches,
        }
    }

    /// Shorter-lived writable view of the same memory.
    pub fn reborrow(&mut self) -> ImageViewMut<'_> {
        let (info, width, height, pitches) = (self.info, self.width, self.height, self.pitches);
        ImageViewMut {
            info,
            width,
            height,
            planes: self.reborrow_planes(),
            pitches,
        }
    }

    fn reborrow_planes(&mut self) -> [&mut [u8]; MAX_PLANES] {
        let mut planes: [&mut [u8]; MAX_PLANES] = Default::default();
        for (slot, bytes) in planes.iter_mut().zip(self.planes.iter_mut()) {
            *slot = &mut bytes[..];
        }
        planes
    }

    /// Sample value of `component` at (`x`, `y`).
    pub fn sample(&self, component: usize, x: u32, y: u32) -> u32 {
        let comp = self.info.component(component);
        let plane = comp.plane as usize;
        let at = sample_offset(comp, self.pitches[plane], x, y);
        read_sample(self.info, comp, self.planes[plane], at)
    }

    /// Store `value`, masked to the component's bit depth.
    pub fn put_sample(&mut self, component: usize, x: u32, y: u32, value: u32) {
        let comp = self.info.component(component);
        let plane = comp.plane as usize;
        let at = sample_offset(comp, self.pitches[plane], x, y);
        write_sample(self.info, comp, self.planes[plane], at, value);
    }

    /// Writable bytes spanned by row `y` of `component`.
    pub fn component_row_mut(&mut self, component: usize, y: u32) -> &mut [u8] {
        let comp = self.info.component(component);
        let plane = comp.plane as usize;
        let (w, _) = self.component_size(component);
        let start = sample_offset(comp, self.pitches[plane], 0, y);
        &mut self.planes[plane][start..start + row_span(comp, w)]
    }

    /// Set every sample of `component` to `value`.
    pub fn fill_component(&mut self, component: usize, value: u32) {
        let (w, h) = self.component_size(component);
        for y in 0..h {
            for x in 0..w {
                self.put_sample(component, x, y, value);
            }
        }
    }

    /// A writable view of `rect`; see [`ImageView::subimage`].
    pub fn subimage_mut(&mut self, rect: Rect) -> Result<ImageViewMut<'_>> {
        let (info, pitches) = (self.info, self.pitches);
        let offsets = subimage_offsets(info, self.width, self.height, &pitches, &rect)?;
        let num_planes = self.num_planes();
        let mut planes = self.reborrow_planes();
        for (plane, bytes) in planes.iter_mut().enumerate().take(num_planes) {
            *bytes = &mut std::mem::take(bytes)[offsets[plane]..];
        }
        Ok(ImageViewMut {
            info,
            width: rect.width,
            height: rect.height,
            planes,
            pitches,
        })
    }

    /// A writable half-height view of one field; see [`ImageView::field`].
    pub fn field_mut(&mut self, field: Field) -> Result<ImageViewMut<'_>> {
        let (info, width, height) = (self.info, self.width, self.height);
        let num_planes = self.num_planes();
        let mut pitches = self.pitches;
        let mut planes = self.reborrow_planes();
        for (plane, bytes) in planes.iter_mut().enumerate().take(num_planes) {
            if field == Field::Bottom {
                let pitch = pitches[plane];
                *bytes = std::mem::take(bytes).get_mut(pitch..).unwrap_or_default();
            }
            pitches[plane] *= 2;
        }
        let lens = planes.each_ref().map(|p| p.len());
        check_field(info, width, height, &lens, &pitches, field)?;
        Ok(ImageViewMut {
            info,
            width,
            height: height / 2,
            planes,
            pitches,
        })
    }
}

impl fmt::Debug for ImageViewMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageViewMut")
            .field("format", &self.info.format)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("pitches", &&self.pitches[..self.num_planes()])
            .finish()
    }
}
