//! Fill-engine guarantees, peek cursors, the `std::io` adapter, and close
//! semantics, exercised through the public API only.

use std::io::{self, BufRead, Read};

use pullbuf_decoder::{BufferedSource, SegmentPool, SegmentedBuffer, SourceConfig, SourceError, WriterSink};
use pullbuf_tests::{ChunkedSource, random_bytes};
use pullbuf_wire::SEGMENT_SIZE;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ── Fill engine ───────────────────────────────────────────────────────────────

#[test]
fn request_then_exhausted_on_short_source() {
    init_logging();
    let mut src = BufferedSource::new(ChunkedSource::new(vec![7u8; 10], 3));
    assert!(!src.request(100).unwrap());
    assert!(!src.exhausted().unwrap());
    src.skip(10).unwrap();
    assert!(src.exhausted().unwrap());
}

#[test]
fn require_postcondition_holds_for_every_count() {
    for chunk in [1, 4, 9] {
        let mut src = BufferedSource::new(ChunkedSource::new(vec![0u8; 64], chunk));
        for n in 0..=64 {
            src.require(n).unwrap();
            assert!(src.buffer().len() >= n, "chunk={chunk} n={n}");
        }
        assert!(src.require(65).unwrap_err().is_end_of_input());
    }
}

#[test]
fn pulls_only_on_demand() {
    let chunked = ChunkedSource::new(vec![1u8; 100], 10);
    let counters = chunked.counters();
    let mut src = BufferedSource::new(chunked);
    assert_eq!(counters.pulls(), 0);
    src.read_byte().unwrap();
    assert_eq!(counters.pulls(), 1);
    src.read_byte_array_exact(9).unwrap();
    assert_eq!(counters.pulls(), 1);
    src.read_byte().unwrap();
    assert_eq!(counters.pulls(), 2);
}

// ── Peek ──────────────────────────────────────────────────────────────────────

#[test]
fn peek_then_read_sees_same_bytes() {
    let data = random_bytes(5000, b"0123456789", 1);
    let mut src = BufferedSource::new(ChunkedSource::new(data.clone(), 333));
    let peeked = src.peek().read_byte_array_exact(4000).unwrap();
    assert_eq!(peeked, &data[..4000]);
    assert_eq!(src.read_byte_array().unwrap(), data);
}

#[test]
fn peek_to_sniff_a_header() {
    let mut src = BufferedSource::new(ChunkedSource::new(&b"\x89PNG\r\n\x1a\nrest"[..], 2));
    let is_png = src.peek().range_equals(0, b"\x89PNG").unwrap();
    assert!(is_png);
    assert_eq!(src.read_int().unwrap(), 0x8950_4e47_u32 as i32);
}

// ── std::io adapter ───────────────────────────────────────────────────────────

#[test]
fn reader_interleaves_with_source_reads() {
    let mut src = BufferedSource::new(ChunkedSource::new(&b"header\nline one\nline two\n"[..], 4));
    assert_eq!(src.read_utf8_line().unwrap().as_deref(), Some("header"));
    let lines: Vec<String> = src.reader().lines().collect::<io::Result<_>>().unwrap();
    assert_eq!(lines, ["line one", "line two"]);
    assert!(src.exhausted().unwrap());
}

#[test]
fn reader_read_to_end_across_segments() {
    let data = random_bytes(3 * SEGMENT_SIZE + 5, b"ab", 9);
    let mut src = BufferedSource::new(ChunkedSource::new(data.clone(), 1000));
    let mut out = Vec::new();
    src.reader().read_to_end(&mut out).unwrap();
    assert_eq!(out, data);
}

#[test]
fn reader_transfer_to_counts_bytes() {
    let mut src = BufferedSource::new(ChunkedSource::new(vec![3u8; 20_000], 4096));
    let mut out = Vec::new();
    assert_eq!(src.reader().transfer_to(&mut out).unwrap(), 20_000);
    assert_eq!(out.len(), 20_000);
}

#[test]
fn read_all_into_writer_sink() {
    let data = random_bytes(2 * SEGMENT_SIZE + 100, b"xyz", 4);
    let mut src = BufferedSource::new(ChunkedSource::new(data.clone(), 700));
    let mut sink = WriterSink::new(Vec::new());
    assert_eq!(src.read_all(&mut sink).unwrap(), data.len() as u64);
    assert_eq!(sink.into_inner(), data);
}

#[test]
fn read_all_into_buffer_sink() {
    let mut src = BufferedSource::new(ChunkedSource::new(&b"moved"[..], 2));
    let mut sink = SegmentedBuffer::new();
    assert_eq!(src.read_all(&mut sink).unwrap(), 5);
    assert_eq!(sink.snapshot(0, 5).unwrap(), b"moved");
}

// ── Close ─────────────────────────────────────────────────────────────────────

#[test]
fn close_twice_then_everything_fails() {
    let chunked = ChunkedSource::new(&b"abc"[..], 1);
    let counters = chunked.counters();
    let mut src = BufferedSource::new(chunked);
    src.request(2).unwrap();
    src.close().unwrap();
    src.close().unwrap();
    assert_eq!(counters.closes(), 1);

    assert!(matches!(src.read_byte(), Err(SourceError::Closed)));
    assert!(matches!(src.read_utf8_line(), Err(SourceError::Closed)));
    assert!(matches!(src.index_of(b'a'), Err(SourceError::Closed)));
    assert!(matches!(src.read_decimal_long(), Err(SourceError::Closed)));
    assert!(matches!(src.peek().read_byte(), Err(SourceError::Closed)));
    let err = src.reader().read(&mut [0u8; 1]).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::Other);
}

#[test]
fn close_returns_segments_to_shared_pool() {
    let pool = SegmentPool::default();
    let config = SourceConfig::new().with_pool(pool.clone());
    let mut src = BufferedSource::with_config(ChunkedSource::new(vec![0u8; 100], 100), config);
    src.request(1).unwrap();
    assert_eq!(pool.pooled_bytes(), 0);
    src.close().unwrap();
    assert_eq!(pool.pooled_bytes(), SEGMENT_SIZE);
}
