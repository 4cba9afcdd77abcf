//! Stream writer.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use byteorder::{ByteOrder as _, LittleEndian};
use framecheck_core::format::ByteOrder;
use framecheck_core::{Error, ImageView, Result};

use crate::header::{check_compatible, Y4mInfo, FRAME_MARKER};

/// Writes images as a YUV4MPEG2 stream.
///
/// The header goes out once, either explicitly through
/// [`write_header`](Self::write_header) or with the first frame, which then
/// supplies the format and size.
#[derive(Debug)]
pub struct Y4mWriter<W: Write> {
    writer: W,
    info: Option<Y4mInfo>,
    frames: u64,
    row: Vec<u8>,
}

impl Y4mWriter<BufWriter<File>> {
    /// Create (or truncate) the file at `path`.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), "Created Y4M file");
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> Y4mWriter<W> {
    /// Wrap `writer`. Nothing is written until the header or the first frame.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            info: None,
            frames: 0,
            row: Vec::new(),
        }
    }

    /// Stream parameters, once the header is written.
    pub fn info(&self) -> Option<&Y4mInfo> {
        self.info.as_ref()
    }

    /// Number of frames written so far.
    pub fn frames_written(&self) -> u64 {
        self.frames
    }

    /// Write the stream header.
    ///
    /// Only the first call writes anything; later calls succeed without
    /// touching the stream. Unknown frame rate and aspect ratio fall back
    /// to `60:1` and `1:1`.
    pub fn write_header(&mut self, info: &Y4mInfo) -> Result<()> {
        if self.info.is_some() {
            return Ok(());
        }
        let info = info.resolve_defaults();
        let header = info.to_header()?;
        self.writer.write_all(header.as_bytes())?;
        self.writer.write_all(b"\n")?;
        tracing::debug!(%info, "Wrote Y4M header");
        self.info = Some(info);
        Ok(())
    }

    /// Append one frame.
    ///
    /// `image` must match the stream size and carry the same subsampling,
    /// component count and depth as the stream format; its memory layout
    /// may differ (an NV12 image can be written to a 4:2:0 stream).
    pub fn write_frame(&mut self, image: &ImageView<'_>) -> Result<()> {
        let info = match self.info {
            Some(info) => info,
            None => {
                self.write_header(&Y4mInfo::new(image.format(), image.width(), image.height()))?;
                self.info.ok_or_else(|| Error::invalid_param("header was not committed"))?
            }
        };

        if image.width() != info.width || image.height() != info.height {
            return Err(Error::invalid_param(format!(
                "frame is {}x{}, stream is {}x{}",
                image.width(),
                image.height(),
                info.width,
                info.height
            )));
        }
        check_compatible(info.format.info(), image.info())?;

        self.writer.write_all(FRAME_MARKER.as_bytes())?;
        self.writer.write_all(b"\n")?;
        for component in 0..image.info().num_components() {
            self.write_component(image, component)?;
        }
        self.frames += 1;
        tracing::trace!(frame = self.frames, format = %image.format(), "Wrote Y4M frame");
        Ok(())
    }

    /// Flush buffered data to the underlying writer.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }

    fn write_component(&mut self, image: &ImageView<'_>, component: usize) -> Result<()> {
        let info = image.info();
        let comp = info.component(component);
        let bytes = comp.bytes_per_sample();
        let (w, h) = image.component_size(component);
        let row_len = w as usize * bytes;

        // Stream samples are little-endian.
        if comp.is_contiguous() && (bytes == 1 || info.wire.byte_order == ByteOrder::Lsb) {
            for y in 0..h {
                self.writer.write_all(&image.component_row(component, y)[..row_len])?;
            }
            return Ok(());
        }

        self.row.resize(row_len, 0);
        for y in 0..h {
            for x in 0..w {
                let value = image.sample(component, x, y);
                let at = x as usize * bytes;
                if bytes == 1 {
                    self.row[at] = value as u8;
                } else {
                    LittleEndian::write_u16(&mut self.row[at..at + 2], value as u16);
                }
            }
            self.writer.write_all(&self.row)?;
        }
        Ok(())
    }
}
