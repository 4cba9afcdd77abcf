//! # Framecheck Hash
//!
//! Bit-reproducible checksums of decoded video frames.
//!
//! ## Example
//!
//! ```no_run
//! use framecheck_core::{Image, VideoFormat};
//! use framecheck_hash::{hash_image, HashContext, HashType};
//!
//! let image = Image::allocate(VideoFormat::I420, 1920, 1080)?;
//! let mut ctx = HashContext::new(HashType::Md5);
//! hash_image(&image.view(), &mut ctx)?;
//! println!("{}", ctx.hex());
//! # Ok::<(), framecheck_core::Error>(())
//! ```

pub mod adler32;
pub mod checksum;
pub mod context;
pub mod image;

pub use checksum::FrameChecksum;
pub use context::{hash_hex, HashContext, HashState, HashType, Strategy, MAX_VALUE_LENGTH};
pub use image::{hash_component_row, hash_image};
