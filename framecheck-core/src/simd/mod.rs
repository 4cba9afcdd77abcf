//! SIMD capability detection and accelerated memory copies.
//!
//! Capabilities are detected once per owning object ([`crate::convert::Converter`],
//! hash contexts) rather than in a process-wide table, so tests can force
//! the scalar path by passing [`SimdCapabilities::scalar`].

mod detect;

#[cfg(target_arch = "x86_64")]
mod x86_64;

pub use detect::{detect_simd, SimdCapabilities};

/// Alignment of [`AlignedBuf`] storage.
pub const BUFFER_ALIGNMENT: usize = 16;

/// Copy `src` into the front of `dst`, using streaming loads when `caps`
/// allows it.
///
/// # Panics
///
/// Panics if `dst` is shorter than `src`.
pub fn stream_copy(caps: &SimdCapabilities, dst: &mut [u8], src: &[u8]) {
    assert!(
        dst.len() >= src.len(),
        "stream_copy destination too small ({} < {})",
        dst.len(),
        src.len()
    );

    #[cfg(target_arch = "x86_64")]
    if caps.sse41 {
        // SAFETY: SSE4.1 was detected and dst covers src.
        unsafe { x86_64::stream_copy_sse41(dst, src) };
        return;
    }

    let _ = caps;
    dst[..src.len()].copy_from_slice(src);
}

/// A growable byte buffer whose contents start on a 16-byte boundary.
#[derive(Debug, Default)]
pub struct AlignedBuf {
    storage: Vec<u8>,
    offset: usize,
    len: usize,
}

impl AlignedBuf {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure at least `len` aligned bytes are available.
    pub fn reserve(&mut self, len: usize) {
        if len <= self.len {
            return;
        }
        self.storage = vec![0; len + BUFFER_ALIGNMENT - 1];
        self.offset = self.storage.as_ptr().align_offset(BUFFER_ALIGNMENT);
        self.len = len;
    }

    /// Usable length in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check whether no storage has been reserved yet.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The aligned bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.storage[self.offset..self.offset + self.len]
    }

    /// The aligned bytes, writable.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.storage[self.offset..self.offset + self.len]
    }
}
