#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pullbuf_decoder::{BufferedSource, SegmentedBuffer};
use pullbuf_tests::ChunkedSource;

#[derive(Arbitrary, Debug)]
enum Op {
    Request(u16),
    Require(u16),
    Skip(u16),
    ReadByte,
    ReadIntLe,
    ReadLong,
    ReadExact(u16),
    ReadLine,
    ReadLineStrict(u8),
    CodePoint,
    Decimal,
    Hex,
    IndexOf(u8),
    IndexOfBytes(Vec<u8>),
    RangeEquals(u16, Vec<u8>),
    Peek(u16),
    ReadToBuffer(u16),
}

#[derive(Arbitrary, Debug)]
struct Input {
    data: Vec<u8>,
    chunk: u8,
    ops: Vec<Op>,
}

/// Absolute offset of the next unread byte.
fn cursor(src: &BufferedSource<ChunkedSource>, total: usize) -> usize {
    total - src.get_ref().remaining() - src.buffer().len()
}

// Fuzz target: arbitrary operation sequences.
//
// After every operation the buffered bytes must be exactly the input
// from the cursor onwards, and fixed-width reads must advance the cursor
// by their width.
fuzz_target!(|input: Input| {
    let chunk = usize::from(input.chunk).max(1);
    let data = &input.data;
    let mut src = BufferedSource::new(ChunkedSource::new(data.clone(), chunk));

    for op in input.ops {
        let at = cursor(&src, data.len());
        let rest = &data[at..];
        let label = format!("{op:?}");
        let advanced = match op {
            Op::Request(n) => {
                assert_eq!(src.request(usize::from(n)).unwrap(), rest.len() >= usize::from(n));
                Some(0)
            }
            Op::Require(n) => {
                let ok = src.require(usize::from(n)).is_ok();
                assert_eq!(ok, rest.len() >= usize::from(n));
                Some(0)
            }
            Op::Skip(n) => src.skip(usize::from(n)).ok().map(|()| usize::from(n)),
            Op::ReadByte => src.read_byte().ok().map(|b| {
                assert_eq!(b, rest[0]);
                1
            }),
            Op::ReadIntLe => src.read_int_le().ok().map(|_| 4),
            Op::ReadLong => src.read_long().ok().map(|_| 8),
            Op::ReadExact(n) => src.read_byte_array_exact(usize::from(n)).ok().map(|bytes| {
                assert_eq!(bytes, &rest[..bytes.len()]);
                bytes.len()
            }),
            Op::ReadLine => {
                let _ = src.read_utf8_line().unwrap();
                None
            }
            Op::ReadLineStrict(limit) => {
                let _ = src.read_utf8_line_strict_limit(usize::from(limit));
                None
            }
            Op::CodePoint => {
                let _ = src.read_utf8_code_point();
                None
            }
            Op::Decimal => {
                let _ = src.read_decimal_long();
                None
            }
            Op::Hex => {
                let _ = src.read_hexadecimal_unsigned_long();
                None
            }
            Op::IndexOf(b) => {
                assert_eq!(src.index_of(b).unwrap(), rest.iter().position(|&x| x == b));
                Some(0)
            }
            Op::IndexOfBytes(pattern) => {
                if let Ok(found) = src.index_of_bytes(&pattern) {
                    let expected = (0..rest.len()).find(|&i| rest[i..].starts_with(&pattern));
                    assert_eq!(found, expected);
                }
                Some(0)
            }
            Op::RangeEquals(offset, bytes) => {
                let offset = usize::from(offset);
                let expected = rest
                    .get(offset..offset + bytes.len())
                    .is_some_and(|slice| slice == bytes.as_slice());
                assert_eq!(src.range_equals(offset, &bytes).unwrap(), expected);
                Some(0)
            }
            Op::Peek(n) => {
                if let Ok(bytes) = src.peek().read_byte_array_exact(usize::from(n)) {
                    assert_eq!(bytes, &rest[..bytes.len()]);
                }
                Some(0)
            }
            Op::ReadToBuffer(n) => {
                let mut sink = SegmentedBuffer::new();
                let moved = src.read_to_buffer(&mut sink, usize::from(n)).unwrap().unwrap_or(0);
                assert_eq!(sink.snapshot(0, moved).unwrap(), &rest[..moved]);
                Some(moved)
            }
        };

        let now = cursor(&src, data.len());
        if let Some(width) = advanced {
            assert_eq!(now, at + width, "{label}");
        }
        assert!(now >= at);
        let buffered = src.buffer().len();
        assert_eq!(src.buffer().snapshot(0, buffered).unwrap(), &data[now..now + buffered]);
    }

    src.close().unwrap();
});
