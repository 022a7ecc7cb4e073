#![no_main]

use libfuzzer_sys::fuzz_target;
use pullbuf_decoder::BufferedSource;
use pullbuf_tests::ChunkedSource;

fn lines(data: &[u8], chunk: usize) -> Vec<String> {
    let mut src = BufferedSource::new(ChunkedSource::new(data, chunk));
    let mut out = Vec::new();
    while let Some(line) = src.read_utf8_line().unwrap() {
        out.push(line);
    }
    out
}

// Fuzz target: read_utf8_line is independent of pull granularity.
//
// Catches bugs in:
// - "\r\n" split across two pulls
// - Multi-byte UTF-8 split across two pulls
// - Unterminated final line handling
fuzz_target!(|data: &[u8]| {
    let whole = lines(data, data.len().max(1));
    assert_eq!(lines(data, 1), whole);
    assert_eq!(lines(data, 3), whole);
});
