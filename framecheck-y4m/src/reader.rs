//! Stream reader.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use byteorder::{ByteOrder as _, LittleEndian};
use framecheck_core::format::ByteOrder;
use framecheck_core::{ContainerError, Error, Image, ImageLayout, ImageViewMut, Result};

use crate::header::{check_compatible, Y4mInfo, FRAME_MARKER};

/// Longest header or frame line accepted.
pub const MAX_LINE_LENGTH: usize = 1024;

/// Maximum frame buffer size (256 MiB).
///
/// Streams whose header describes a larger frame are rejected before
/// anything is allocated.
pub const MAX_FRAME_SIZE: usize = 256 * 1024 * 1024;

/// Reads images from a YUV4MPEG2 stream.
#[derive(Debug)]
pub struct Y4mReader<R: BufRead> {
    reader: R,
    info: Y4mInfo,
    frames: u64,
    line: Vec<u8>,
    row: Vec<u8>,
}

impl Y4mReader<BufReader<File>> {
    /// Open the file at `path` and parse its header.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), "Opened Y4M file");
        Self::new(BufReader::new(file))
    }
}

impl<R: BufRead> Y4mReader<R> {
    /// Parse the stream header from `reader`.
    ///
    /// Fails with [`ContainerError::FrameTooLarge`] when one frame of the
    /// stream would need more than [`MAX_FRAME_SIZE`] bytes.
    pub fn new(mut reader: R) -> Result<Self> {
        let mut line = Vec::new();
        if !read_line(&mut reader, &mut line)? {
            return Err(ContainerError::InvalidSignature(String::new()).into());
        }
        let header = std::str::from_utf8(&line)
            .map_err(|_| ContainerError::InvalidSignature(String::from_utf8_lossy(&line).into_owned()))?;
        let info = Y4mInfo::parse(header)?;
        let size = ImageLayout::new(info.format, info.width, info.height)?.data_size;
        if size > MAX_FRAME_SIZE {
            return Err(ContainerError::FrameTooLarge {
                size,
                limit: MAX_FRAME_SIZE,
            }
            .into());
        }
        tracing::debug!(%info, "Parsed Y4M header");

        Ok(Self {
            reader,
            info,
            frames: 0,
            line,
            row: Vec::new(),
        })
    }

    /// Stream parameters from the header.
    pub fn info(&self) -> &Y4mInfo {
        &self.info
    }

    /// Number of frames read so far.
    pub fn frames_read(&self) -> u64 {
        self.frames
    }

    /// Read the next frame into a newly allocated image of the stream format.
    ///
    /// Returns `Ok(None)` at the end of the stream.
    pub fn read_frame(&mut self) -> Result<Option<Image>> {
        if !self.read_marker()? {
            return Ok(None);
        }
        let mut image = Image::allocate(self.info.format, self.info.width, self.info.height)?;
        self.read_payload(&mut image.view_mut())?;
        Ok(Some(image))
    }

    /// Read the next frame into `image`.
    ///
    /// `image` may use any layout with the stream's size, subsampling,
    /// component count and depth, e.g. NV12 for a 4:2:0 stream. Returns
    /// `false` at the end of the stream. A frame cut short by the end of
    /// the stream fails with an I/O error.
    pub fn read_frame_into(&mut self, image: &mut ImageViewMut<'_>) -> Result<bool> {
        if image.width() != self.info.width || image.height() != self.info.height {
            return Err(Error::invalid_param(format!(
                "frame is {}x{}, stream is {}x{}",
                image.width(),
                image.height(),
                self.info.width,
                self.info.height
            )));
        }
        check_compatible(self.info.format.info(), image.info())?;

        if !self.read_marker()? {
            return Ok(false);
        }
        self.read_payload(image)?;
        Ok(true)
    }

    /// Consume the next frame marker line. Returns `false` at the end of the stream.
    fn read_marker(&mut self) -> Result<bool> {
        if !read_line(&mut self.reader, &mut self.line)? {
            return Ok(false);
        }
        let marker = &self.line[..];
        let valid = marker.starts_with(FRAME_MARKER.as_bytes())
            && matches!(marker.get(FRAME_MARKER.len()), None | Some(b' '));
        if !valid {
            return Err(ContainerError::InvalidFrameMarker(String::from_utf8_lossy(marker).into_owned()).into());
        }
        Ok(true)
    }

    fn read_payload(&mut self, image: &mut ImageViewMut<'_>) -> Result<()> {
        for component in 0..image.info().num_components() {
            self.read_component(image, component)?;
        }
        self.frames += 1;
        tracing::trace!(frame = self.frames, format = %image.format(), "Read Y4M frame");
        Ok(())
    }

    fn read_component(&mut self, image: &mut ImageViewMut<'_>, component: usize) -> Result<()> {
        let info = image.info();
        let comp = info.component(component);
        let bytes = comp.bytes_per_sample();
        let (w, h) = image.component_size(component);
        let row_len = w as usize * bytes;

        if comp.is_contiguous() && (bytes == 1 || info.wire.byte_order == ByteOrder::Lsb) {
            for y in 0..h {
                self.reader.read_exact(&mut image.component_row_mut(component, y)[..row_len])?;
            }
            return Ok(());
        }

        self.row.resize(row_len, 0);
        for y in 0..h {
            self.reader.read_exact(&mut self.row)?;
            for x in 0..w {
                let at = x as usize * bytes;
                let value = if bytes == 1 {
                    self.row[at] as u32
                } else {
                    LittleEndian::read_u16(&self.row[at..at + 2]) as u32
                };
                image.put_sample(component, x, y, value);
            }
        }
        Ok(())
    }
}

impl<R: BufRead> Iterator for Y4mReader<R> {
    type Item = Result<Image>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_frame().transpose()
    }
}

/// Read one newline-terminated line into `line`, without the newline.
///
/// Returns `false` on a clean end of stream.
fn read_line<R: BufRead>(reader: &mut R, line: &mut Vec<u8>) -> Result<bool> {
    line.clear();
    let n = reader.by_ref().take(MAX_LINE_LENGTH as u64).read_until(b'\n', line)?;
    if n == 0 {
        return Ok(false);
    }
    if line.last() != Some(&b'\n') {
        if n == MAX_LINE_LENGTH {
            return Err(ContainerError::HeaderTooLong { limit: MAX_LINE_LENGTH }.into());
        }
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "line is not newline-terminated",
        )));
    }
    line.pop();
    Ok(true)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use framecheck_core::{Rational, VideoFormat};

    use super::*;

    fn stream(header: &str, frames: &[&[u8]]) -> Cursor<Vec<u8>> {
        let mut data = format!("{header}\n").into_bytes();
        for frame in frames {
            data.extend_from_slice(b"FRAME\n");
            data.extend_from_slice(frame);
        }
        Cursor::new(data)
    }

    #[test]
    fn test_read_single_frame() {
        let payload: Vec<u8> = (0..6).collect();
        let mut reader = Y4mReader::new(stream("YUV4MPEG2 W2 H2 F25:1 C420jpeg", &[&payload])).unwrap();
        assert_eq!(reader.info().frame_rate, Rational::new(25, 1));

        let image = reader.read_frame().unwrap().unwrap();
        assert_eq!(image.format(), Some(VideoFormat::I420));
        let view = image.view();
        assert_eq!(view.sample(0, 1, 1), 3);
        assert_eq!(view.sample(1, 0, 0), 4);
        assert_eq!(view.sample(2, 0, 0), 5);

        assert!(reader.read_frame().unwrap().is_none());
        assert_eq!(reader.frames_read(), 1);
    }

    #[test]
    fn test_frame_parameters_ignored() {
        let mut data = b"YUV4MPEG2 W1 H1 Cmono\nFRAME Ixyz\n\x07".to_vec();
        data.extend_from_slice(b"FRAME\n\x09");
        let frames: Vec<_> = Y4mReader::new(Cursor::new(data))
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].view().sample(0, 0, 0), 9);
    }

    #[test]
    fn test_read_high_bit_depth() {
        let header = "YUV4MPEG2 W1 H1 C444p12 XYSCSS=444P12";
        let mut reader = Y4mReader::new(stream(header, &[b"\xff\x0f\x00\x08\x01\x00"])).unwrap();
        let image = reader.read_frame().unwrap().unwrap();
        let view = image.view();
        assert_eq!(image.format(), Some(VideoFormat::I444P12));
        assert_eq!(view.sample(0, 0, 0), 0xfff);
        assert_eq!(view.sample(1, 0, 0), 0x800);
        assert_eq!(view.sample(2, 0, 0), 1);
    }

    #[test]
    fn test_read_into_interleaved_layout() {
        let payload = [10, 11, 12, 13, 20, 30];
        let mut reader = Y4mReader::new(stream("YUV4MPEG2 W2 H2", &[&payload])).unwrap();
        let mut nv12 = Image::allocate(VideoFormat::Nv12, 2, 2).unwrap();
        assert!(reader.read_frame_into(&mut nv12.view_mut()).unwrap());

        let view = nv12.view();
        assert_eq!(view.plane(0)[..2], [10, 11]);
        assert_eq!(view.plane(1)[..2], [20, 30]);
    }

    #[test]
    fn test_incompatible_target() {
        let mut reader = Y4mReader::new(stream("YUV4MPEG2 W2 H2", &[&[0; 6]])).unwrap();
        let mut i422 = Image::allocate(VideoFormat::I422, 2, 2).unwrap();
        assert!(reader.read_frame_into(&mut i422.view_mut()).is_err());
        let mut small = Image::allocate(VideoFormat::I420, 2, 1).unwrap();
        assert!(reader.read_frame_into(&mut small.view_mut()).is_err());
        // Nothing was consumed.
        assert!(reader.read_frame().unwrap().is_some());
    }

    #[test]
    fn test_truncated_frame() {
        let mut reader = Y4mReader::new(stream("YUV4MPEG2 W2 H2", &[&[0; 5]])).unwrap();
        assert!(reader.read_frame().unwrap_err().is_io());
    }

    #[test]
    fn test_bad_frame_marker() {
        let data = b"YUV4MPEG2 W1 H1 Cmono\nFRAMES\n\x00".to_vec();
        let mut reader = Y4mReader::new(Cursor::new(data)).unwrap();
        assert!(matches!(
            reader.read_frame(),
            Err(Error::Container(ContainerError::InvalidFrameMarker(_)))
        ));
    }

    #[test]
    fn test_header_only_stream() {
        let mut reader = Y4mReader::new(stream("YUV4MPEG2 W64 H64 C422", &[])).unwrap();
        assert!(reader.read_frame().unwrap().is_none());
        assert_eq!(reader.frames_read(), 0);
    }

    #[test]
    fn test_frame_size_limit() {
        // Exactly at the limit: accepted, and nothing is allocated without a frame.
        let mut reader = Y4mReader::new(stream("YUV4MPEG2 W16384 H16384 Cmono", &[])).unwrap();
        assert!(reader.read_frame().unwrap().is_none());

        let err = Y4mReader::new(stream("YUV4MPEG2 W16384 H16384 C444p16", &[])).unwrap_err();
        match err {
            Error::Container(ContainerError::FrameTooLarge { size, limit }) => {
                assert_eq!(limit, MAX_FRAME_SIZE);
                assert_eq!(size, 16384 * 16384 * 6);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_bad_frame_marker_before_payload() {
        let data = b"YUV4MPEG2 W16384 H16384 Cmono\nJUNK\n".to_vec();
        let mut reader = Y4mReader::new(Cursor::new(data)).unwrap();
        assert!(matches!(
            reader.read_frame(),
            Err(Error::Container(ContainerError::InvalidFrameMarker(_)))
        ));
        assert_eq!(reader.frames_read(), 0);
    }

    #[test]
    fn test_bad_headers() {
        assert!(matches!(
            Y4mReader::new(Cursor::new(Vec::new())),
            Err(Error::Container(ContainerError::InvalidSignature(_)))
        ));
        let long = format!("YUV4MPEG2 W1 H1 X{}\n", "a".repeat(MAX_LINE_LENGTH));
        assert!(matches!(
            Y4mReader::new(Cursor::new(long.into_bytes())),
            Err(Error::Container(ContainerError::HeaderTooLong { .. }))
        ));
        assert!(Y4mReader::new(Cursor::new(b"YUV4MPEG2 W1 H1".to_vec()))
            .unwrap_err()
            .is_io());
    }
}
