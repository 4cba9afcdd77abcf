//! # Framecheck Core
//!
//! Core types for the framecheck video verification libraries.
//!
//! This crate provides the building blocks shared by the hashing, quality
//! and container crates:
//! - Error handling types
//! - The video format registry
//! - Frame buffers: owned images and borrowed, cropped or field views
//! - Conversion between related YUV layouts
//! - Runtime SIMD capability detection

pub mod convert;
pub mod error;
pub mod format;
pub mod image;
pub mod rational;
pub mod simd;

pub use convert::{convert, ConvertFlags, Converter};
pub use error::{ContainerError, Error, Result};
pub use format::{ChromaType, ComponentInfo, ComponentKind, FormatInfo, VideoFormat};
pub use image::{Field, Image, ImageLayout, ImageView, ImageViewMut, Rect};
pub use rational::Rational;
pub use simd::{detect_simd, SimdCapabilities};
