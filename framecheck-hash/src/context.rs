//! Incremental hash contexts.

use std::fmt;
use std::str::FromStr;

use framecheck_core::simd::{detect_simd, SimdCapabilities};
use framecheck_core::{Error, Result};

use crate::adler32;

/// Longest hash value produced by any algorithm.
pub const MAX_VALUE_LENGTH: usize = 16;

/// Hash algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashType {
    /// Adler-32 with a zero seed, 4 bytes.
    Adler32,
    /// MD5, 16 bytes.
    Md5,
}

impl HashType {
    /// Every supported algorithm.
    pub const ALL: [HashType; 2] = [HashType::Adler32, HashType::Md5];

    /// Algorithm name as used on the command line and in reports.
    pub fn name(self) -> &'static str {
        match self {
            HashType::Adler32 => "adler32",
            HashType::Md5 => "md5",
        }
    }

    /// Length of the finalized value in bytes.
    pub fn value_length(self) -> usize {
        match self {
            HashType::Adler32 => 4,
            HashType::Md5 => 16,
        }
    }
}

impl fmt::Display for HashType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| Error::unsupported(format!("unknown hash type {s:?}")))
    }
}

/// Implementation used for Adler-32 updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// One modulo per byte.
    Scalar,
    /// Modulo deferred over 5552-byte runs.
    Chunked,
    /// SSSE3 vector kernel (x86_64 only).
    Ssse3,
}

impl Strategy {
    /// Every strategy, fastest last.
    pub const ALL: [Strategy; 3] = [Strategy::Scalar, Strategy::Chunked, Strategy::Ssse3];

    /// Fastest strategy `caps` allows.
    pub fn best(caps: &SimdCapabilities) -> Self {
        if cfg!(target_arch = "x86_64") && caps.ssse3 {
            Strategy::Ssse3
        } else {
            Strategy::Chunked
        }
    }

    /// Check whether the strategy can run with `caps`.
    pub fn is_supported(self, caps: &SimdCapabilities) -> bool {
        match self {
            Strategy::Scalar | Strategy::Chunked => true,
            Strategy::Ssse3 => cfg!(target_arch = "x86_64") && caps.ssse3,
        }
    }
}

/// Lifecycle of a [`HashContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashState {
    /// Seeded, no data yet.
    Ready,
    /// At least one non-empty update since the last reset.
    Accumulating,
    /// Value computed; updates are ignored until [`HashContext::init`].
    Finalized,
}

#[derive(Clone)]
enum Accumulator {
    Adler32(u32),
    Md5(md5::Context),
}

impl Accumulator {
    fn new(hash_type: HashType) -> Self {
        match hash_type {
            HashType::Adler32 => Accumulator::Adler32(adler32::SEED),
            HashType::Md5 => Accumulator::Md5(md5::Context::new()),
        }
    }
}

/// An incremental hash over a byte stream.
///
/// The update strategy is resolved once when the context is created, so a
/// context behaves identically for its whole lifetime.
#[derive(Clone)]
pub struct HashContext {
    hash_type: HashType,
    strategy: Strategy,
    state: HashState,
    acc: Accumulator,
    value: [u8; MAX_VALUE_LENGTH],
}

impl HashContext {
    /// Create a context using the fastest strategy of the running CPU.
    pub fn new(hash_type: HashType) -> Self {
        let strategy = Strategy::best(&detect_simd());
        tracing::debug!(%hash_type, ?strategy, "Created hash context");
        Self::build(hash_type, strategy)
    }

    /// Create a context forced to `strategy`.
    ///
    /// Fails if the running CPU cannot execute it.
    pub fn with_strategy(hash_type: HashType, strategy: Strategy) -> Result<Self> {
        if !strategy.is_supported(&detect_simd()) {
            return Err(Error::unsupported(format!(
                "{strategy:?} strategy is not available on this CPU"
            )));
        }
        Ok(Self::build(hash_type, strategy))
    }

    fn build(hash_type: HashType, strategy: Strategy) -> Self {
        Self {
            hash_type,
            strategy,
            state: HashState::Ready,
            acc: Accumulator::new(hash_type),
            value: [0; MAX_VALUE_LENGTH],
        }
    }

    /// Algorithm of this context.
    pub fn hash_type(&self) -> HashType {
        self.hash_type
    }

    /// Resolved update strategy.
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Current lifecycle state.
    pub fn state(&self) -> HashState {
        self.state
    }

    /// Reset to the algorithm's seed.
    pub fn init(&mut self) {
        self.acc = Accumulator::new(self.hash_type);
        self.state = HashState::Ready;
    }

    /// Feed `buf`. Empty input is a no-op.
    pub fn update(&mut self, buf: &[u8]) {
        if buf.is_empty() {
            return;
        }
        if self.state == HashState::Finalized {
            tracing::warn!(hash_type = %self.hash_type, "Update after finalize ignored");
            return;
        }

        match &mut self.acc {
            Accumulator::Adler32(adler) => *adler = update_adler32(self.strategy, *adler, buf),
            Accumulator::Md5(ctx) => ctx.consume(buf),
        }
        self.state = HashState::Accumulating;
    }

    /// Compute the value. Finalizing twice keeps the first value.
    pub fn finalize(&mut self) {
        if self.state == HashState::Finalized {
            return;
        }
        match &mut self.acc {
            Accumulator::Adler32(adler) => self.value[..4].copy_from_slice(&adler.to_be_bytes()),
            Accumulator::Md5(ctx) => {
                let digest = std::mem::replace(ctx, md5::Context::new()).compute();
                self.value.copy_from_slice(&digest.0);
            }
        }
        self.state = HashState::Finalized;
    }

    /// Last finalized value, `value_length()` bytes long.
    pub fn value(&self) -> &[u8] {
        &self.value[..self.hash_type.value_length()]
    }

    /// Last finalized value as lowercase hex.
    pub fn hex(&self) -> String {
        hex::encode(self.value())
    }
}

impl fmt::Debug for HashContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashContext")
            .field("hash_type", &self.hash_type)
            .field("strategy", &self.strategy)
            .field("state", &self.state)
            .finish()
    }
}

fn update_adler32(strategy: Strategy, adler: u32, buf: &[u8]) -> u32 {
    match strategy {
        Strategy::Scalar => adler32::update_scalar(adler, buf),
        Strategy::Chunked => adler32::update_chunked(adler, buf),
        #[cfg(target_arch = "x86_64")]
        // SAFETY: contexts only carry Ssse3 after the CPU reported support.
        Strategy::Ssse3 => unsafe { adler32::x86_64::update_ssse3(adler, buf) },
        #[cfg(not(target_arch = "x86_64"))]
        Strategy::Ssse3 => adler32::update_chunked(adler, buf),
    }
}

/// Hash `buf` in one go and return the hex value.
pub fn hash_hex(hash_type: HashType, buf: &[u8]) -> String {
    let mut ctx = HashContext::new(hash_type);
    ctx.update(buf);
    ctx.finalize();
    ctx.hex()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for t in HashType::ALL {
            assert_eq!(t.to_string().parse::<HashType>().unwrap(), t);
        }
        assert!("sha1".parse::<HashType>().is_err());
    }

    #[test]
    fn test_adler32_known_value() {
        assert_eq!(hash_hex(HashType::Adler32, b"Wikipedia"), "11dd0397");
    }

    #[test]
    fn test_md5_known_values() {
        assert_eq!(hash_hex(HashType::Md5, b""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(
            hash_hex(HashType::Md5, b"The quick brown fox jumps over the lazy dog"),
            "9e107d9d372bb6826bd81d3542a419d6"
        );
    }

    #[test]
    fn test_state_machine() {
        let mut ctx = HashContext::new(HashType::Adler32);
        assert_eq!(ctx.state(), HashState::Ready);
        ctx.update(&[]);
        assert_eq!(ctx.state(), HashState::Ready);
        ctx.update(b"Wiki");
        assert_eq!(ctx.state(), HashState::Accumulating);
        ctx.update(b"pedia");
        ctx.finalize();
        assert_eq!(ctx.state(), HashState::Finalized);
        assert_eq!(ctx.hex(), "11dd0397");

        ctx.update(b"ignored");
        ctx.finalize();
        assert_eq!(ctx.hex(), "11dd0397");

        ctx.init();
        assert_eq!(ctx.state(), HashState::Ready);
        ctx.finalize();
        assert_eq!(ctx.value(), &[0, 0, 0, 0]);
    }

    #[test]
    fn test_md5_reinit_restarts() {
        let mut ctx = HashContext::new(HashType::Md5);
        ctx.update(b"abc");
        ctx.finalize();
        let first = ctx.hex();
        ctx.init();
        ctx.update(b"abc");
        ctx.finalize();
        assert_eq!(ctx.hex(), first);
        assert_eq!(first, "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn test_value_length() {
        assert_eq!(HashContext::new(HashType::Adler32).value().len(), 4);
        assert_eq!(HashContext::new(HashType::Md5).value().len(), 16);
    }

    #[test]
    fn test_portable_strategies_always_available() {
        assert!(HashContext::with_strategy(HashType::Adler32, Strategy::Scalar).is_ok());
        assert!(HashContext::with_strategy(HashType::Adler32, Strategy::Chunked).is_ok());
    }
}
