//! Adler-32 checksum kernels.
//!
//! All kernels take and return the packed `s2 << 16 | s1` state and produce
//! identical results for identical input; they differ only in speed.

/// Largest prime smaller than 65536.
pub const BASE: u32 = 65521;

/// Largest n such that 255n(n+1)/2 + (n+1)(BASE-1) fits in 32 bits, i.e. the
/// number of bytes that can be summed before the modulo must be taken.
pub const NMAX: usize = 5552;

/// Initial state. Reference checksums were produced with a zero seed rather
/// than the textbook 1.
pub const SEED: u32 = 0;

/// Reference kernel, one modulo per byte.
pub fn update_scalar(adler: u32, buf: &[u8]) -> u32 {
    let (mut s1, mut s2) = (adler & 0xffff, adler >> 16);
    for &b in buf {
        s1 = (s1 + b as u32) % BASE;
        s2 = (s2 + s1) % BASE;
    }
    s2 << 16 | s1
}

/// Deferred-modulo kernel, 16 bytes per inner iteration.
pub fn update_chunked(adler: u32, buf: &[u8]) -> u32 {
    let (mut s1, mut s2) = (adler & 0xffff, adler >> 16);
    for chunk in buf.chunks(NMAX) {
        let mut blocks = chunk.chunks_exact(16);
        for block in &mut blocks {
            for &b in block {
                s1 += b as u32;
                s2 += s1;
            }
        }
        for &b in blocks.remainder() {
            s1 += b as u32;
            s2 += s1;
        }
        s1 %= BASE;
        s2 %= BASE;
    }
    s2 << 16 | s1
}

#[cfg(target_arch = "x86_64")]
pub(crate) mod x86_64 {
    use std::arch::x86_64::*;

    use super::{update_chunked, BASE, NMAX};

    const BLOCK_SIZE: usize = 32;

    /// SSSE3 kernel processing 32-byte blocks.
    ///
    /// Within one block, `s2` grows by `32·s1` plus the byte sum weighted
    /// 32..1; both sums are computed with `maddubs`/`madd` and the running
    /// `s1` contribution is accumulated in `v_ps` and shifted in at the end
    /// of each `NMAX` run.
    ///
    /// # Safety
    ///
    /// The CPU must support SSSE3. Use `detect_simd().ssse3` to check.
    #[target_feature(enable = "ssse3")]
    pub unsafe fn update_ssse3(adler: u32, buf: &[u8]) -> u32 {
        let (mut s1, mut s2) = (adler & 0xffff, adler >> 16);

        let mut blocks = buf.len() / BLOCK_SIZE;
        let tail = &buf[blocks * BLOCK_SIZE..];
        let mut ptr = buf.as_ptr();

        let tap1 = _mm_setr_epi8(32, 31, 30, 29, 28, 27, 26, 25, 24, 23, 22, 21, 20, 19, 18, 17);
        let tap2 = _mm_setr_epi8(16, 15, 14, 13, 12, 11, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1);
        let zero = _mm_setzero_si128();
        let ones = _mm_set1_epi16(1);

        while blocks > 0 {
            let mut n = (NMAX / BLOCK_SIZE).min(blocks);
            blocks -= n;

            let mut v_ps = _mm_set_epi32(0, 0, 0, (s1 * n as u32) as i32);
            let mut v_s2 = _mm_set_epi32(0, 0, 0, s2 as i32);
            let mut v_s1 = _mm_setzero_si128();

            while n > 0 {
                let bytes1 = _mm_loadu_si128(ptr as *const __m128i);
                let bytes2 = _mm_loadu_si128(ptr.add(16) as *const __m128i);

                v_ps = _mm_add_epi32(v_ps, v_s1);

                v_s1 = _mm_add_epi32(v_s1, _mm_sad_epu8(bytes1, zero));
                let mad1 = _mm_maddubs_epi16(bytes1, tap1);
                v_s2 = _mm_add_epi32(v_s2, _mm_madd_epi16(mad1, ones));

                v_s1 = _mm_add_epi32(v_s1, _mm_sad_epu8(bytes2, zero));
                let mad2 = _mm_maddubs_epi16(bytes2, tap2);
                v_s2 = _mm_add_epi32(v_s2, _mm_madd_epi16(mad2, ones));

                ptr = ptr.add(BLOCK_SIZE);
                n -= 1;
            }

            v_s2 = _mm_add_epi32(v_s2, _mm_slli_epi32::<5>(v_ps));

            // Horizontal sums: A B C D -> B A D C, then -> C D A B.
            v_s1 = _mm_add_epi32(v_s1, _mm_shuffle_epi32::<0b10_11_00_01>(v_s1));
            v_s1 = _mm_add_epi32(v_s1, _mm_shuffle_epi32::<0b01_00_11_10>(v_s1));
            s1 += _mm_cvtsi128_si32(v_s1) as u32;

            v_s2 = _mm_add_epi32(v_s2, _mm_shuffle_epi32::<0b10_11_00_01>(v_s2));
            v_s2 = _mm_add_epi32(v_s2, _mm_shuffle_epi32::<0b01_00_11_10>(v_s2));
            s2 = _mm_cvtsi128_si32(v_s2) as u32;

            s1 %= BASE;
            s2 %= BASE;
        }

        update_chunked(s2 << 16 | s1, tail)
    }
}
