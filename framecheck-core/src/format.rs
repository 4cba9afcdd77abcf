//! Video format registry.
//!
//! Every [`VideoFormat`] maps to one immutable [`FormatInfo`] descriptor held
//! in a static table. Descriptors list their components in a fixed order:
//! Y, U, V, [A] for YUV formats and R, G, B, [A] for RGB formats.
//!
//! The table is built at compile time and never mutated, so lookups are safe
//! from any number of threads without locking.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Maximum number of planes a format may use.
pub const MAX_PLANES: usize = 4;

/// Maximum number of components a format may carry.
pub const MAX_COMPONENTS: usize = 4;

/// Video format identifier.
///
/// Discriminants are stable numeric ids; `0` is reserved for "unknown" and
/// `1` for "encoded" (opaque decoder output), neither of which has a
/// descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum VideoFormat {
    /// Planar YUV 4:2:0, Y plane and interleaved UV plane.
    Nv12 = 2,
    /// Planar YUV 4:2:0, 3 planes Y U V.
    I420,
    /// Planar YUV 4:2:0, 3 planes Y V U.
    Yv12,
    /// 8-bit grayscale.
    Y800,
    /// Packed YUV 4:4:4, 32-bit, A Y U V.
    Ayuv,
    /// Packed YUV 4:2:2, 16-bit, Y0 Cb Y1 Cr.
    Yuy2,
    /// Packed YUV 4:2:2, 16-bit, Cb Y0 Cr Y1.
    Uyvy,
    /// Packed RGB, 32-bit, x R G B.
    Xrgb,
    /// Packed RGB, 32-bit, x B G R.
    Xbgr,
    /// Packed RGB, 32-bit, R G B x.
    Rgbx,
    /// Packed RGB, 32-bit, B G R x.
    Bgrx,
    /// Packed RGB, 32-bit, A R G B.
    Argb,
    /// Packed RGB, 32-bit, A B G R.
    Abgr,
    /// Packed RGB, 32-bit, R G B A.
    Rgba,
    /// Packed RGB, 32-bit, B G R A.
    Bgra,
    /// Planar YUV 4:2:0, 10 bits per sample.
    I420P10,
    /// Planar YUV 4:2:0, 12 bits per sample.
    I420P12,
    /// Planar YUV 4:2:0, 16 bits per sample.
    I420P16,
    /// Planar YUV 4:2:2, 10 bits per sample.
    I422P10,
    /// Planar YUV 4:2:2, 12 bits per sample.
    I422P12,
    /// Planar YUV 4:2:2, 16 bits per sample.
    I422P16,
    /// Planar YUV 4:4:4, 10 bits per sample.
    I444P10,
    /// Planar YUV 4:4:4, 12 bits per sample.
    I444P12,
    /// Planar YUV 4:4:4, 16 bits per sample.
    I444P16,
    /// Planar YUV 4:2:2, 8 bits per sample.
    I422,
    /// Planar YUV 4:4:4, 8 bits per sample.
    I444,
}

impl VideoFormat {
    /// Every format with a descriptor, in table order.
    pub const ALL: [VideoFormat; 26] = [
        Self::Nv12,
        Self::I420,
        Self::Yv12,
        Self::Y800,
        Self::Ayuv,
        Self::Yuy2,
        Self::Uyvy,
        Self::Xrgb,
        Self::Xbgr,
        Self::Rgbx,
        Self::Bgrx,
        Self::Argb,
        Self::Abgr,
        Self::Rgba,
        Self::Bgra,
        Self::I420P10,
        Self::I420P12,
        Self::I420P16,
        Self::I422P10,
        Self::I422P12,
        Self::I422P16,
        Self::I444P10,
        Self::I444P12,
        Self::I444P16,
        Self::I422,
        Self::I444,
    ];

    /// Native-endian 32-bit xRGB.
    #[cfg(target_endian = "little")]
    pub const RGB32: VideoFormat = Self::Bgrx;
    /// Native-endian 32-bit xRGB.
    #[cfg(target_endian = "big")]
    pub const RGB32: VideoFormat = Self::Xrgb;

    /// Native-endian 32-bit ARGB.
    #[cfg(target_endian = "little")]
    pub const ARGB32: VideoFormat = Self::Bgra;
    /// Native-endian 32-bit ARGB.
    #[cfg(target_endian = "big")]
    pub const ARGB32: VideoFormat = Self::Argb;

    /// Numeric identifier of this format.
    pub fn id(self) -> u32 {
        self as u32
    }

    /// Format for a numeric identifier, if one is registered.
    pub fn from_id(id: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.id() == id)
    }

    /// Descriptor for this format.
    pub fn info(self) -> &'static FormatInfo {
        lookup(self)
    }

    /// Registry name, e.g. `"I420"` or `"I420p10"`.
    pub fn name(self) -> &'static str {
        self.info().name
    }

    /// Look a format up by its registry name.
    pub fn from_name(name: &str) -> Option<Self> {
        FORMATS.iter().find(|info| info.name == name).map(|info| info.format)
    }

    /// Look a format up by its wire FourCC.
    pub fn from_fourcc(fourcc: u32) -> Option<Self> {
        if fourcc == 0 {
            return None;
        }
        FORMATS
            .iter()
            .find(|info| info.wire.fourcc == fourcc)
            .map(|info| info.format)
    }

    /// Look a format up by its complete wire description.
    ///
    /// RGB formats sharing a FourCC are told apart by byte order and masks.
    pub fn from_wire_format(wire: &WireFormat) -> Option<Self> {
        FORMATS
            .iter()
            .find(|info| info.wire.matches(wire))
            .map(|info| info.format)
    }

    /// Check whether this is an RGB format.
    pub fn is_rgb(self) -> bool {
        self.info().wire.is_rgb()
    }

    /// Check whether this is a YUV format.
    pub fn is_yuv(self) -> bool {
        !self.is_rgb()
    }

    /// Check whether this is a grayscale format.
    pub fn is_grayscale(self) -> bool {
        self.info().chroma == ChromaType::Yuv400
    }

    /// Check whether chroma is subsampled in either direction.
    pub fn is_subsampled(self) -> bool {
        let info = self.info();
        info.chroma_w_shift > 0 || info.chroma_h_shift > 0
    }

    /// Check whether the format carries an alpha component.
    pub fn has_alpha(self) -> bool {
        self.info().num_components() == MAX_COMPONENTS
    }

    /// Chroma family of this format.
    pub fn chroma_type(self) -> ChromaType {
        self.info().chroma
    }

    fn index(self) -> usize {
        (self as u32 - VideoFormat::Nv12 as u32) as usize
    }
}

impl fmt::Display for VideoFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for VideoFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s).ok_or_else(|| Error::unsupported(format!("unknown video format {s:?}")))
    }
}

/// Chroma family of a format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChromaType {
    /// Luma only.
    Yuv400,
    /// Chroma halved horizontally and vertically.
    Yuv420,
    /// Chroma halved horizontally.
    Yuv422,
    /// Full resolution chroma.
    Yuv444,
    /// 32-bit packed RGB.
    Rgb32,
}

impl fmt::Display for ChromaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yuv400 => write!(f, "YUV 4:0:0"),
            Self::Yuv420 => write!(f, "YUV 4:2:0"),
            Self::Yuv422 => write!(f, "YUV 4:2:2"),
            Self::Yuv444 => write!(f, "YUV 4:4:4"),
            Self::Rgb32 => write!(f, "RGB"),
        }
    }
}

/// Sample channel carried by a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Y,
    U,
    V,
    R,
    G,
    B,
    A,
}

impl ComponentKind {
    /// Check whether this is the alpha channel.
    pub fn is_alpha(self) -> bool {
        self == Self::A
    }
}

/// Byte order of multi-byte samples and of the wire pixel word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    /// Least significant byte first.
    Lsb,
    /// Most significant byte first.
    Msb,
}

/// Layout of one component inside its plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentInfo {
    /// Which channel this is.
    pub kind: ComponentKind,
    /// Plane holding the samples.
    pub plane: u8,
    /// Byte offset of the sample within one pixel.
    pub pixel_offset: u8,
    /// Bytes between two consecutive samples on a row.
    pub pixel_stride: u8,
    /// Significant bits per sample.
    pub bit_depth: u8,
}

impl ComponentInfo {
    const fn new(kind: ComponentKind, plane: u8, pixel_offset: u8, pixel_stride: u8, bit_depth: u8) -> Self {
        Self {
            kind,
            plane,
            pixel_offset,
            pixel_stride,
            bit_depth,
        }
    }

    /// Number of bytes a sample occupies (1 up to 8 bits, 2 beyond).
    pub fn bytes_per_sample(&self) -> usize {
        if self.bit_depth <= 8 {
            1
        } else {
            2
        }
    }

    /// Largest value a sample may hold.
    pub fn max_value(&self) -> u32 {
        (1u32 << self.bit_depth) - 1
    }

    /// Check whether consecutive samples on a row are contiguous bytes.
    pub fn is_contiguous(&self) -> bool {
        self.pixel_stride as usize == self.bytes_per_sample()
    }
}

/// Wire-level description of a format as exchanged with hardware decoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WireFormat {
    /// FourCC tag.
    pub fourcc: u32,
    /// Byte order of the pixel word.
    pub byte_order: ByteOrder,
    /// Bits per pixel, averaged over subsampled planes.
    pub bits_per_pixel: u8,
    /// Colour depth for RGB formats, `0` for YUV formats.
    pub depth: u8,
    /// Red channel mask (RGB only).
    pub red_mask: u32,
    /// Green channel mask (RGB only).
    pub green_mask: u32,
    /// Blue channel mask (RGB only).
    pub blue_mask: u32,
    /// Alpha channel mask (RGB only).
    pub alpha_mask: u32,
}

impl WireFormat {
    const fn yuv(fourcc: u32, bits_per_pixel: u8) -> Self {
        Self {
            fourcc,
            byte_order: ByteOrder::Lsb,
            bits_per_pixel,
            depth: 0,
            red_mask: 0,
            green_mask: 0,
            blue_mask: 0,
            alpha_mask: 0,
        }
    }

    const fn rgb(fourcc: u32, depth: u8, masks: [u32; 4]) -> Self {
        Self {
            fourcc,
            byte_order: ByteOrder::Lsb,
            bits_per_pixel: 32,
            depth,
            red_mask: masks[0],
            green_mask: masks[1],
            blue_mask: masks[2],
            alpha_mask: masks[3],
        }
    }

    /// Check whether this describes an RGB format.
    pub fn is_rgb(&self) -> bool {
        self.depth != 0
    }

    fn matches(&self, other: &WireFormat) -> bool {
        if self.fourcc != other.fourcc {
            return false;
        }
        if !self.is_rgb() {
            return true;
        }
        self.byte_order == other.byte_order
            && self.red_mask == other.red_mask
            && self.green_mask == other.green_mask
            && self.blue_mask == other.blue_mask
            && self.alpha_mask == other.alpha_mask
    }
}

/// Build a FourCC value the way VA-API does (first character in the low byte).
pub const fn fourcc(tag: &[u8; 4]) -> u32 {
    (tag[0] as u32) | (tag[1] as u32) << 8 | (tag[2] as u32) << 16 | (tag[3] as u32) << 24
}

/// Immutable descriptor of a video format.
#[derive(Debug, PartialEq, Eq)]
pub struct FormatInfo {
    /// Registry name.
    pub name: &'static str,
    /// Format this descriptor belongs to.
    pub format: VideoFormat,
    /// Chroma family.
    pub chroma: ChromaType,
    /// Right shift from luma width to chroma width.
    pub chroma_w_shift: u8,
    /// Right shift from luma height to chroma height.
    pub chroma_h_shift: u8,
    /// Wire-level description.
    pub wire: WireFormat,
    /// Number of planes.
    pub num_planes: u8,
    components: &'static [ComponentInfo],
}

impl FormatInfo {
    /// Components in canonical order.
    pub fn components(&self) -> &'static [ComponentInfo] {
        self.components
    }

    /// Number of components.
    pub fn num_components(&self) -> usize {
        self.components.len()
    }

    /// Component at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn component(&self, index: usize) -> &'static ComponentInfo {
        &self.components[index]
    }

    /// Bit depth of the first (luma or red) component.
    pub fn bit_depth(&self) -> u8 {
        self.components[0].bit_depth
    }

    /// Horizontal and vertical right shifts applied to `component`.
    pub fn component_shifts(&self, component: usize) -> (u32, u32) {
        if component == 0 || self.components[component].kind.is_alpha() {
            (0, 0)
        } else {
            (self.chroma_w_shift as u32, self.chroma_h_shift as u32)
        }
    }

    /// True (unpadded) dimensions of `component` for a `width`×`height` image.
    ///
    /// Chroma dimensions round up, so odd sizes keep their last column/row.
    pub fn component_size(&self, component: usize, width: u32, height: u32) -> (u32, u32) {
        let (ws, hs) = self.component_shifts(component);
        (div_round_up_shift(width, ws), div_round_up_shift(height, hs))
    }
}

fn div_round_up_shift(value: u32, shift: u32) -> u32 {
    (value + (1u32 << shift) - 1) >> shift
}

/// Descriptor for `format`.
pub fn lookup(format: VideoFormat) -> &'static FormatInfo {
    &FORMATS[format.index()]
}

/// Descriptor for a numeric format id, or `None` for unknown ids.
pub fn lookup_id(id: u32) -> Option<&'static FormatInfo> {
    VideoFormat::from_id(id).map(lookup)
}

/// Per-plane pixel strides for `format`.
///
/// Fails when components sharing a plane disagree on their (chroma adjusted)
/// stride, which would make the plane geometry ambiguous.
pub fn pixel_pitches(format: VideoFormat) -> Result<[u32; MAX_PLANES]> {
    let info = lookup(format);
    let mut shifted = [0u32; MAX_PLANES];
    let mut pitches = [0u32; MAX_PLANES];

    for (i, comp) in info.components.iter().enumerate() {
        let plane = comp.plane as usize;
        let pitch = (comp.pixel_stride as u32) >> if i > 0 { info.chroma_w_shift } else { 0 };
        if shifted[plane] == 0 {
            shifted[plane] = pitch;
            pitches[plane] = comp.pixel_stride as u32;
        } else if shifted[plane] != pitch {
            return Err(Error::InvalidFormat {
                format,
                reason: "components sharing a plane disagree on pixel stride",
            });
        }
    }
    Ok(pitches)
}

use ComponentKind::{A, B, G, R, U, V, Y};

const fn c(kind: ComponentKind, plane: u8, offset: u8, stride: u8, depth: u8) -> ComponentInfo {
    ComponentInfo::new(kind, plane, offset, stride, depth)
}

const C_NV12: [ComponentInfo; 3] = [c(Y, 0, 0, 1, 8), c(U, 1, 0, 2, 8), c(V, 1, 1, 2, 8)];
const C_I4XX: [ComponentInfo; 3] = [c(Y, 0, 0, 1, 8), c(U, 1, 0, 1, 8), c(V, 2, 0, 1, 8)];
const C_YV12: [ComponentInfo; 3] = [c(Y, 0, 0, 1, 8), c(U, 2, 0, 1, 8), c(V, 1, 0, 1, 8)];
const C_YUY2: [ComponentInfo; 3] = [c(Y, 0, 0, 2, 8), c(U, 0, 1, 4, 8), c(V, 0, 3, 4, 8)];
const C_UYVY: [ComponentInfo; 3] = [c(Y, 0, 1, 2, 8), c(U, 0, 0, 4, 8), c(V, 0, 2, 4, 8)];
const C_AYUV: [ComponentInfo; 4] = [
    c(Y, 0, 1, 4, 8),
    c(U, 0, 2, 4, 8),
    c(V, 0, 3, 4, 8),
    c(A, 0, 0, 4, 8),
];
const C_Y800: [ComponentInfo; 1] = [c(Y, 0, 0, 1, 8)];
const C_XRGB: [ComponentInfo; 3] = [c(R, 0, 1, 4, 8), c(G, 0, 2, 4, 8), c(B, 0, 3, 4, 8)];
const C_XBGR: [ComponentInfo; 3] = [c(R, 0, 3, 4, 8), c(G, 0, 2, 4, 8), c(B, 0, 1, 4, 8)];
const C_RGBX: [ComponentInfo; 3] = [c(R, 0, 0, 4, 8), c(G, 0, 1, 4, 8), c(B, 0, 2, 4, 8)];
const C_BGRX: [ComponentInfo; 3] = [c(R, 0, 2, 4, 8), c(G, 0, 1, 4, 8), c(B, 0, 0, 4, 8)];
const C_ARGB: [ComponentInfo; 4] = [
    c(R, 0, 1, 4, 8),
    c(G, 0, 2, 4, 8),
    c(B, 0, 3, 4, 8),
    c(A, 0, 0, 4, 8),
];
const C_ABGR: [ComponentInfo; 4] = [
    c(R, 0, 3, 4, 8),
    c(G, 0, 2, 4, 8),
    c(B, 0, 1, 4, 8),
    c(A, 0, 0, 4, 8),
];
const C_RGBA: [ComponentInfo; 4] = [
    c(R, 0, 0, 4, 8),
    c(G, 0, 1, 4, 8),
    c(B, 0, 2, 4, 8),
    c(A, 0, 3, 4, 8),
];
const C_BGRA: [ComponentInfo; 4] = [
    c(R, 0, 2, 4, 8),
    c(G, 0, 1, 4, 8),
    c(B, 0, 0, 4, 8),
    c(A, 0, 3, 4, 8),
];
const C_P10: [ComponentInfo; 3] = [c(Y, 0, 0, 2, 10), c(U, 1, 0, 2, 10), c(V, 2, 0, 2, 10)];
const C_P12: [ComponentInfo; 3] = [c(Y, 0, 0, 2, 12), c(U, 1, 0, 2, 12), c(V, 2, 0, 2, 12)];
const C_P16: [ComponentInfo; 3] = [c(Y, 0, 0, 2, 16), c(U, 1, 0, 2, 16), c(V, 2, 0, 2, 16)];

const fn yuv(
    name: &'static str,
    format: VideoFormat,
    chroma: ChromaType,
    tag: &[u8; 4],
    bpp: u8,
    num_planes: u8,
    components: &'static [ComponentInfo],
) -> FormatInfo {
    let (chroma_w_shift, chroma_h_shift) = match chroma {
        ChromaType::Yuv420 => (1, 1),
        ChromaType::Yuv422 => (1, 0),
        _ => (0, 0),
    };
    FormatInfo {
        name,
        format,
        chroma,
        chroma_w_shift,
        chroma_h_shift,
        wire: WireFormat::yuv(fourcc(tag), bpp),
        num_planes,
        components,
    }
}

const fn rgb(
    name: &'static str,
    format: VideoFormat,
    tag: &[u8; 4],
    depth: u8,
    masks: [u32; 4],
    components: &'static [ComponentInfo],
) -> FormatInfo {
    FormatInfo {
        name,
        format,
        chroma: ChromaType::Rgb32,
        chroma_w_shift: 0,
        chroma_h_shift: 0,
        wire: WireFormat::rgb(fourcc(tag), depth, masks),
        num_planes: 1,
        components,
    }
}

use ChromaType::{Yuv400, Yuv420, Yuv422, Yuv444};
use VideoFormat as F;

static FORMATS: [FormatInfo; 26] = [
    yuv("NV12", F::Nv12, Yuv420, b"NV12", 12, 2, &C_NV12),
    yuv("I420", F::I420, Yuv420, b"I420", 12, 3, &C_I4XX),
    yuv("YV12", F::Yv12, Yuv420, b"YV12", 12, 3, &C_YV12),
    yuv("Y800", F::Y800, Yuv400, b"Y800", 8, 1, &C_Y800),
    yuv("AYUV", F::Ayuv, Yuv444, b"AYUV", 32, 1, &C_AYUV),
    yuv("YUY2", F::Yuy2, Yuv422, b"YUY2", 16, 1, &C_YUY2),
    yuv("UYVY", F::Uyvy, Yuv422, b"UYVY", 16, 1, &C_UYVY),
    rgb("xRGB", F::Xrgb, b"BGRX", 24, [0x00ff_0000, 0x0000_ff00, 0x0000_00ff, 0], &C_XRGB),
    rgb("xBGR", F::Xbgr, b"RGBX", 24, [0x0000_00ff, 0x0000_ff00, 0x00ff_0000, 0], &C_XBGR),
    rgb("RGBx", F::Rgbx, b"XBGR", 24, [0xff00_0000, 0x00ff_0000, 0x0000_ff00, 0], &C_RGBX),
    rgb("BGRx", F::Bgrx, b"XRGB", 24, [0x0000_ff00, 0x00ff_0000, 0xff00_0000, 0], &C_BGRX),
    rgb("ARGB", F::Argb, b"BGRA", 32, [0x00ff_0000, 0x0000_ff00, 0x0000_00ff, 0xff00_0000], &C_ARGB),
    rgb("ABGR", F::Abgr, b"RGBA", 32, [0x0000_00ff, 0x0000_ff00, 0x00ff_0000, 0xff00_0000], &C_ABGR),
    rgb("RGBA", F::Rgba, b"ABGR", 32, [0xff00_0000, 0x00ff_0000, 0x0000_ff00, 0x0000_00ff], &C_RGBA),
    rgb("BGRA", F::Bgra, b"ARGB", 32, [0x0000_ff00, 0x00ff_0000, 0xff00_0000, 0x0000_00ff], &C_BGRA),
    yuv("I420p10", F::I420P10, Yuv420, b"P010", 15, 3, &C_P10),
    yuv("I420p12", F::I420P12, Yuv420, b"P012", 18, 3, &C_P12),
    yuv("I420p16", F::I420P16, Yuv420, b"P016", 24, 3, &C_P16),
    yuv("I422p10", F::I422P10, Yuv422, b"P210", 20, 3, &C_P10),
    yuv("I422p12", F::I422P12, Yuv422, b"P212", 24, 3, &C_P12),
    yuv("I422p16", F::I422P16, Yuv422, b"P216", 32, 3, &C_P16),
    yuv("I444p10", F::I444P10, Yuv444, b"P410", 30, 3, &C_P10),
    yuv("I444p12", F::I444P12, Yuv444, b"P412", 36, 3, &C_P12),
    yuv("I444p16", F::I444P16, Yuv444, b"P416", 48, 3, &C_P16),
    yuv("I422", F::I422, Yuv422, b"422H", 16, 3, &C_I4XX),
    yuv("I444", F::I444, Yuv444, b"444P", 24, 3, &C_I4XX),
];
