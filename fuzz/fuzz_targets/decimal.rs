#![no_main]

use libfuzzer_sys::fuzz_target;
use pullbuf_decoder::BufferedSource;
use pullbuf_tests::ChunkedSource;

// Fuzz target: read_decimal_long agrees with str::parse on the greedy
// numeral prefix, and consumes nothing on failure.
fuzz_target!(|data: &[u8]| {
    let end = data
        .iter()
        .enumerate()
        .position(|(i, &b)| !(b.is_ascii_digit() || (i == 0 && b == b'-')))
        .unwrap_or(data.len());
    let prefix = std::str::from_utf8(&data[..end]).unwrap();

    let mut src = BufferedSource::new(ChunkedSource::new(data, 2));
    match src.read_decimal_long() {
        Ok(value) => {
            assert_eq!(prefix.parse::<i64>().ok(), Some(value));
            assert_eq!(src.read_byte_array().unwrap(), &data[end..]);
        }
        Err(_) => {
            assert!(prefix.parse::<i64>().is_err());
            assert_eq!(src.read_byte_array().unwrap(), data);
        }
    }
});
