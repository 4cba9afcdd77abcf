#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Cursor;
use framecheck_y4m::Y4mReader;

fuzz_target!(|data: &[u8]| {
    // Parse the header - we don't care about errors, just panics
    let Ok(mut reader) = Y4mReader::new(Cursor::new(data)) else {
        return;
    };

    for _ in 0..4 {
        match reader.read_frame() {
            Ok(Some(_)) => {}
            Ok(None) | Err(_) => break,
        }
    }
});
