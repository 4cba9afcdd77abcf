#![no_main]

//! Fuzz target for hash strategy equivalence.
//!
//! Feeds the same bytes, split at arbitrary points, through every strategy
//! the CPU supports and checks that all of them agree.

use arbitrary::Arbitrary;
use framecheck_core::detect_simd;
use framecheck_hash::{HashContext, HashType, Strategy};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct HashInput {
    data: Vec<u8>,
    splits: Vec<u16>,
    md5: bool,
}

fuzz_target!(|input: HashInput| {
    let hash_type = if input.md5 { HashType::Md5 } else { HashType::Adler32 };
    let caps = detect_simd();

    let mut expected: Option<Vec<u8>> = None;
    for strategy in Strategy::ALL {
        if !strategy.is_supported(&caps) {
            continue;
        }
        let Ok(mut ctx) = HashContext::with_strategy(hash_type, strategy) else {
            continue;
        };

        let mut rest = &input.data[..];
        for &split in input.splits.iter().take(16) {
            let (head, tail) = rest.split_at((split as usize).min(rest.len()));
            ctx.update(head);
            rest = tail;
        }
        ctx.update(rest);
        ctx.finalize();

        match &expected {
            Some(value) => assert_eq!(value.as_slice(), ctx.value(), "{strategy:?}"),
            None => expected = Some(ctx.value().to_vec()),
        }
    }
});
