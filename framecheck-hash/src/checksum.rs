//! Per-frame checksum records.

use std::fmt;

use framecheck_core::{ImageView, Result};

use crate::context::{HashContext, HashType};
use crate::image::hash_image;

/// Checksum of one decoded frame, as written to reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameChecksum {
    /// Frame index in decode order.
    pub sequence: u32,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Algorithm
    pub hash_type: HashType,
    /// Lowercase hex value
    pub value: String,
}

impl FrameChecksum {
    /// Hash `view` with `ctx` and capture the result.
    pub fn new(sequence: u32, view: &ImageView<'_>, ctx: &mut HashContext) -> Result<Self> {
        hash_image(view, ctx)?;
        Ok(Self {
            sequence,
            width: view.width(),
            height: view.height(),
            hash_type: ctx.hash_type(),
            value: ctx.hex(),
        })
    }

    /// Check the value against an expected hex string, ignoring case and an
    /// optional `0x` prefix.
    pub fn matches(&self, expected: &str) -> bool {
        let expected = expected.trim();
        let expected = expected.strip_prefix("0x").unwrap_or(expected);
        self.value.eq_ignore_ascii_case(expected)
    }
}

impl fmt::Display for FrameChecksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let size = format!("{}x{}", self.width, self.height);
        write!(f, "{:7} {:>10} 0x{}", self.sequence, size, self.value)
    }
}

#[cfg(test)]
mod tests {
    use framecheck_core::{Image, VideoFormat};

    use super::*;

    #[test]
    fn test_frame_checksum_record() {
        let image = Image::allocate(VideoFormat::I420, 16, 16).unwrap();
        let mut ctx = HashContext::new(HashType::Adler32);
        let checksum = FrameChecksum::new(3, &image.view(), &mut ctx).unwrap();

        assert_eq!(checksum.width, 16);
        assert_eq!(checksum.value.len(), 8);
        assert!(checksum.matches(&format!("0x{}", checksum.value.to_uppercase())));
        assert!(!checksum.matches("deadbeef"));
        assert_eq!(checksum.to_string(), format!("      3      16x16 0x{}", checksum.value));
    }
}
