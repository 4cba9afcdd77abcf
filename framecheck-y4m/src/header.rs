//! Stream header: geometry, timing and the colorspace token.

use std::fmt;

use framecheck_core::format::FormatInfo;
use framecheck_core::{ChromaType, ContainerError, Error, Rational, Result, VideoFormat};

/// Signature opening every stream.
pub const SIGNATURE: &str = "YUV4MPEG2";

/// Marker opening every frame.
pub const FRAME_MARKER: &str = "FRAME";

/// Frame rate written when none is known.
pub const DEFAULT_FRAME_RATE: Rational = Rational::new(60, 1);

/// Pixel aspect ratio written when none is known.
pub const DEFAULT_ASPECT_RATIO: Rational = Rational::new(1, 1);

/// Picture structure of the stream (`I` tag).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interlace {
    #[default]
    Progressive,
    TopFieldFirst,
    BottomFieldFirst,
    Mixed,
}

impl Interlace {
    /// Header character.
    pub fn as_char(self) -> char {
        match self {
            Interlace::Progressive => 'p',
            Interlace::TopFieldFirst => 't',
            Interlace::BottomFieldFirst => 'b',
            Interlace::Mixed => 'm',
        }
    }

    /// Parse a header character. `?` (unknown) reads as progressive.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'p' | '?' => Some(Interlace::Progressive),
            't' => Some(Interlace::TopFieldFirst),
            'b' => Some(Interlace::BottomFieldFirst),
            'm' => Some(Interlace::Mixed),
            _ => None,
        }
    }
}

/// Stream parameters carried by the header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Y4mInfo {
    /// Registry format frames are read into by default.
    pub format: VideoFormat,
    pub width: u32,
    pub height: u32,
    pub frame_rate: Rational,
    pub aspect_ratio: Rational,
    pub interlace: Interlace,
}

impl Y4mInfo {
    /// Progressive stream at 60 fps with square pixels.
    pub fn new(format: VideoFormat, width: u32, height: u32) -> Self {
        Self {
            format,
            width,
            height,
            frame_rate: DEFAULT_FRAME_RATE,
            aspect_ratio: DEFAULT_ASPECT_RATIO,
            interlace: Interlace::Progressive,
        }
    }

    /// Set the frame rate.
    pub fn with_frame_rate(mut self, frame_rate: Rational) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    /// Set the pixel aspect ratio.
    pub fn with_aspect_ratio(mut self, aspect_ratio: Rational) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    /// Set the picture structure.
    pub fn with_interlace(mut self, interlace: Interlace) -> Self {
        self.interlace = interlace;
        self
    }

    /// Replace unknown (zero) ratios with the defaults.
    pub fn resolve_defaults(mut self) -> Self {
        self.frame_rate = self.frame_rate.or(DEFAULT_FRAME_RATE);
        self.aspect_ratio = self.aspect_ratio.or(DEFAULT_ASPECT_RATIO);
        self
    }

    /// Header line for this stream, without the trailing newline.
    pub fn to_header(&self) -> Result<String> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::invalid_param(format!(
                "stream dimensions must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        let colorspace = colorspace(self.format)
            .ok_or_else(|| Error::unsupported(format!("{} cannot be stored in a Y4M stream", self.format)))?;
        Ok(format!(
            "{SIGNATURE} W{} H{} F{} A{} I{} C{}",
            self.width,
            self.height,
            self.frame_rate,
            self.aspect_ratio,
            self.interlace.as_char(),
            colorspace
        ))
    }

    /// Parse a header line (without its newline).
    ///
    /// `W` and `H` are required. A missing `C` tag means 4:2:0, missing
    /// `F`/`A` tags read as unknown (`0:0`). Comments (`X`) and tags this
    /// reader does not know are skipped.
    pub fn parse(line: &str) -> Result<Self> {
        let mut tokens = line.split(' ').filter(|t| !t.is_empty());
        match tokens.next() {
            Some(SIGNATURE) => {}
            other => {
                return Err(ContainerError::InvalidSignature(other.unwrap_or_default().to_string()).into());
            }
        }

        let mut width = None;
        let mut height = None;
        let mut info = Y4mInfo::new(VideoFormat::I420, 0, 0)
            .with_frame_rate(Rational::unknown())
            .with_aspect_ratio(Rational::unknown());

        for token in tokens {
            let mut chars = token.chars();
            let Some(tag) = chars.next() else { continue };
            let value = chars.as_str();
            let invalid = || ContainerError::InvalidParameter {
                tag,
                value: value.to_string(),
            };
            match tag {
                'W' => width = Some(parse_dimension(value).ok_or_else(invalid)?),
                'H' => height = Some(parse_dimension(value).ok_or_else(invalid)?),
                'F' => info.frame_rate = value.parse().map_err(|_| invalid())?,
                'A' => info.aspect_ratio = value.parse().map_err(|_| invalid())?,
                'I' => {
                    let mut c = value.chars();
                    info.interlace = match (c.next(), c.next()) {
                        (Some(c), None) => Interlace::from_char(c).ok_or_else(invalid)?,
                        _ => return Err(invalid().into()),
                    };
                }
                'C' => {
                    info.format = format_for_colorspace(value)
                        .ok_or_else(|| ContainerError::UnsupportedColorspace(value.to_string()))?;
                }
                'X' => {}
                _ => tracing::debug!(token, "Ignoring unknown Y4M header tag"),
            }
        }

        info.width = width.ok_or(ContainerError::MissingParameter('W'))?;
        info.height = height.ok_or(ContainerError::MissingParameter('H'))?;
        Ok(info)
    }
}

impl fmt::Display for Y4mInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}x{} @ {} fps, PAR {}",
            self.format, self.width, self.height, self.frame_rate, self.aspect_ratio
        )
    }
}

fn parse_dimension(value: &str) -> Option<u32> {
    value.parse().ok().filter(|&v| v > 0)
}

/// Colorspace token (`C` tag value) for a YUV format.
///
/// High bit depths carry an `XYSCSS` comment after the token, as other
/// tools write it. Returns `None` for formats a stream cannot carry.
pub fn colorspace(format: VideoFormat) -> Option<String> {
    if !format.is_yuv() {
        return None;
    }
    let info = format.info();
    let family = match info.chroma {
        ChromaType::Yuv400 => "mono",
        ChromaType::Yuv420 => "420",
        ChromaType::Yuv422 => "422",
        ChromaType::Yuv444 if format.has_alpha() => "444alpha",
        ChromaType::Yuv444 => "444",
        _ => return None,
    };
    match info.bit_depth() {
        8 if family == "420" => Some("420jpeg".to_string()),
        8 => Some(family.to_string()),
        depth if matches!(family, "420" | "422" | "444") => {
            Some(format!("{family}p{depth} XYSCSS={family}P{depth}"))
        }
        _ => None,
    }
}

/// Registry format a colorspace token is read into.
///
/// Chroma siting suffixes (`jpeg`, `paldv`, `mpeg2`) are accepted and
/// ignored.
pub fn format_for_colorspace(token: &str) -> Option<VideoFormat> {
    let token = ["jpeg", "paldv", "mpeg2"]
        .iter()
        .find_map(|site| token.strip_suffix(site).filter(|base| *base == "420"))
        .unwrap_or(token);

    match token {
        "mono" => return Some(VideoFormat::Y800),
        "444alpha" => return Some(VideoFormat::Ayuv),
        _ => {}
    }

    let (family, depth) = match token.split_once('p') {
        Some((family, bits)) => (family, bits.parse::<u8>().ok()?),
        None => (token, 8),
    };
    let format = match (family, depth) {
        ("420", 8) => VideoFormat::I420,
        ("420", 10) => VideoFormat::I420P10,
        ("420", 12) => VideoFormat::I420P12,
        ("420", 16) => VideoFormat::I420P16,
        ("422", 8) => VideoFormat::I422,
        ("422", 10) => VideoFormat::I422P10,
        ("422", 12) => VideoFormat::I422P12,
        ("422", 16) => VideoFormat::I422P16,
        ("444", 8) => VideoFormat::I444,
        ("444", 10) => VideoFormat::I444P10,
        ("444", 12) => VideoFormat::I444P12,
        ("444", 16) => VideoFormat::I444P16,
        _ => return None,
    };
    Some(format)
}

/// Check that frames of `file` can be stored in or read from `image`.
///
/// Components are exchanged one by one, so the layouts may differ as long
/// as subsampling, component count and depth agree.
pub(crate) fn check_compatible(file: &FormatInfo, image: &FormatInfo) -> Result<()> {
    if file.chroma != image.chroma
        || file.chroma_w_shift != image.chroma_w_shift
        || file.chroma_h_shift != image.chroma_h_shift
        || file.num_components() != image.num_components()
        || file.bit_depth() != image.bit_depth()
    {
        return Err(Error::invalid_param(format!(
            "{} frames are not compatible with {} stream data",
            image.name, file.name
        )));
    }
    Ok(())
}
