//! # Framecheck Y4M
//!
//! Reading and writing raw video as YUV4MPEG2 streams.
//!
//! A stream is one ASCII header line followed by frames, each a `FRAME`
//! line and the samples of every component in Y, U, V, alpha order at
//! their true (unpadded) size. Samples deeper than 8 bits take two
//! little-endian bytes.
//!
//! ## Example
//!
//! ```no_run
//! use framecheck_core::{Image, VideoFormat};
//! use framecheck_y4m::{Y4mReader, Y4mWriter};
//!
//! let image = Image::allocate(VideoFormat::I420, 320, 240)?;
//! let mut writer = Y4mWriter::create("out.y4m")?;
//! writer.write_frame(&image.view())?;
//! writer.flush()?;
//!
//! let mut reader = Y4mReader::open("out.y4m")?;
//! while let Some(frame) = reader.read_frame()? {
//!     println!("{}x{}", frame.width(), frame.height());
//! }
//! # Ok::<(), framecheck_core::Error>(())
//! ```

pub mod header;
pub mod reader;
pub mod writer;

pub use header::{colorspace, format_for_colorspace, Interlace, Y4mInfo};
pub use reader::{Y4mReader, MAX_FRAME_SIZE};
pub use writer::Y4mWriter;
