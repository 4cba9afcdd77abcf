//! Runtime SIMD feature detection.

/// SIMD capabilities of the current CPU.
///
/// Only the x86_64 features the accelerated kernels use are probed; other
/// architectures always report scalar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimdCapabilities {
    /// SSSE3 support (byte shuffles, multiply-add of unsigned bytes).
    pub ssse3: bool,
    /// SSE4.1 support (streaming loads from write-combining memory).
    pub sse41: bool,
}

impl SimdCapabilities {
    /// Capabilities with every feature disabled.
    pub fn scalar() -> Self {
        Self::default()
    }

    /// Check if any SIMD acceleration is available.
    pub fn has_simd(&self) -> bool {
        self.ssse3 || self.sse41
    }

    /// Best available SIMD level as a string.
    pub fn best_level(&self) -> &'static str {
        if self.sse41 {
            "SSE4.1"
        } else if self.ssse3 {
            "SSSE3"
        } else {
            "Scalar"
        }
    }
}

/// Detect SIMD capabilities at runtime.
#[cfg(target_arch = "x86_64")]
pub fn detect_simd() -> SimdCapabilities {
    let caps = SimdCapabilities {
        ssse3: is_x86_feature_detected!("ssse3"),
        sse41: is_x86_feature_detected!("sse4.1"),
    };
    tracing::debug!(level = caps.best_level(), "Detected SIMD capabilities");
    caps
}

/// Fallback for other architectures.
#[cfg(not(target_arch = "x86_64"))]
pub fn detect_simd() -> SimdCapabilities {
    SimdCapabilities::default()
}
