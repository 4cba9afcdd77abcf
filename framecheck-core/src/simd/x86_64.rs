//! x86_64 copy kernels.
//!
//! Functions here are unsafe because they require the CPU to support the
//! instruction set named in their `target_feature` attribute. Use
//! [`detect_simd`](super::detect_simd) before calling them.

use std::arch::x86_64::*;

/// Copy `src` into the front of `dst` using SSE4.1 streaming loads.
///
/// Streaming loads read uncacheable speculative write-combining (USWC)
/// memory, such as mapped GPU surfaces, an order of magnitude faster than
/// ordinary loads. Leading bytes up to the first 16-byte boundary of `src`
/// and the trailing partial vector are copied with scalar code.
///
/// # Safety
///
/// * The CPU must support SSE4.1. Use `detect_simd().sse41` to check.
/// * `dst` must be at least as long as `src`.
#[target_feature(enable = "sse4.1")]
pub unsafe fn stream_copy_sse41(dst: &mut [u8], src: &[u8]) {
    let len = src.len();
    debug_assert!(dst.len() >= len);

    let head = src.as_ptr().align_offset(16).min(len);
    dst[..head].copy_from_slice(&src[..head]);

    let mut i = head;
    while i + 64 <= len {
        let s = src.as_ptr().add(i) as *const __m128i;
        let d = dst.as_mut_ptr().add(i) as *mut __m128i;
        let x0 = _mm_stream_load_si128(s);
        let x1 = _mm_stream_load_si128(s.add(1));
        let x2 = _mm_stream_load_si128(s.add(2));
        let x3 = _mm_stream_load_si128(s.add(3));
        _mm_storeu_si128(d, x0);
        _mm_storeu_si128(d.add(1), x1);
        _mm_storeu_si128(d.add(2), x2);
        _mm_storeu_si128(d.add(3), x3);
        i += 64;
    }
    while i + 16 <= len {
        let x = _mm_stream_load_si128(src.as_ptr().add(i) as *const __m128i);
        _mm_storeu_si128(dst.as_mut_ptr().add(i) as *mut __m128i, x);
        i += 16;
    }

    dst[i..len].copy_from_slice(&src[i..]);
}
