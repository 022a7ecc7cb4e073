#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pullbuf_decoder::BufferedSource;
use pullbuf_tests::ChunkedSource;

#[derive(Arbitrary, Debug)]
struct Input {
    data: Vec<u8>,
    pattern: Vec<u8>,
    chunk: u8,
    from: u16,
    to: u16,
}

// Fuzz target: index_of_bytes_in against a naive scan.
//
// Catches bugs in:
// - Matches straddling a pull boundary
// - Resume offsets after a refill skipping a candidate start
// - Bounds where the match starts before `to` but ends after it
fuzz_target!(|input: Input| {
    if input.pattern.is_empty() || input.from > input.to {
        return;
    }
    let (from, to) = (usize::from(input.from), usize::from(input.to));
    let chunk = usize::from(input.chunk).max(1);

    let expected = (from..to.min(input.data.len()))
        .find(|&start| input.data[start..].starts_with(&input.pattern));

    let mut src = BufferedSource::new(ChunkedSource::new(input.data.clone(), chunk));
    let found = src.index_of_bytes_in(&input.pattern, from, to).unwrap();
    assert_eq!(found, expected);
});
