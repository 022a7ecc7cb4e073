use bytes::Bytes;
use log::trace;
use pullbuf_wire::{PullSource, SegmentedBuffer, Sink};

use crate::error::SourceError;
use crate::source::BufferedSource;

/// Bulk reads, skipping, and range comparison.
impl<S: PullSource> BufferedSource<S> {
  /// Consume everything up to end of input.
  ///
  /// # Errors
  ///
  /// [`SourceError::Closed`] after close, or any pull failure.
  pub fn read_byte_array(&mut self) -> Result<Vec<u8>, SourceError> {
    self.fill_all()?;
    Ok(self.buffer.read_vec(self.buffer.len())?)
  }

  /// Consume exactly `byte_count` bytes.
  ///
  /// # Errors
  ///
  /// [`SourceError::EndOfInput`] if fewer bytes remain; nothing is consumed.
  pub fn read_byte_array_exact(&mut self, byte_count: usize) -> Result<Vec<u8>, SourceError> {
    self.require(byte_count)?;
    Ok(self.buffer.read_vec(byte_count)?)
  }

  /// Consume everything up to end of input as an immutable byte string.
  ///
  /// # Errors
  ///
  /// See [`read_byte_array`](Self::read_byte_array).
  pub fn read_byte_string(&mut self) -> Result<Bytes, SourceError> {
    self.read_byte_array().map(Bytes::from)
  }

  /// # Errors
  ///
  /// See [`read_byte_array_exact`](Self::read_byte_array_exact).
  pub fn read_byte_string_exact(&mut self, byte_count: usize) -> Result<Bytes, SourceError> {
    self.read_byte_array_exact(byte_count).map(Bytes::from)
  }

  /// Copy up to `dst.len()` bytes into `dst`.
  ///
  /// # Errors
  ///
  /// See [`read_at`](Self::read_at).
  pub fn read(&mut self, dst: &mut [u8]) -> Result<Option<usize>, SourceError> {
    let len = dst.len();
    self.read_at(dst, 0, len)
  }

  /// Copy up to `byte_count` bytes into `dst[offset..offset + byte_count]`.
  ///
  /// Pulls at most one chunk, and only when nothing is buffered. Returns
  /// the number of bytes copied, which may be fewer than asked for, or
  /// `None` at end of input.
  ///
  /// # Errors
  ///
  /// [`SourceError::InvalidArgument`] if the range does not fit in `dst`;
  /// [`SourceError::Closed`] after close; any pull failure.
  pub fn read_at(
    &mut self,
    dst: &mut [u8],
    offset: usize,
    byte_count: usize,
  ) -> Result<Option<usize>, SourceError> {
    let end = offset
      .checked_add(byte_count)
      .filter(|&end| end <= dst.len())
      .ok_or_else(|| {
        SourceError::invalid_argument(format!(
          "size={} offset={offset} byte_count={byte_count}",
          dst.len()
        ))
      })?;
    if !self.fill_if_empty(byte_count)? {
      return Ok(None);
    }
    Ok(Some(self.buffer.read(&mut dst[offset..end])))
  }

  /// Move up to `byte_count` bytes into `sink` without copying whole
  /// segments.
  ///
  /// Same pulling rules as [`read_at`](Self::read_at).
  ///
  /// # Errors
  ///
  /// [`SourceError::Closed`] after close, or any pull failure.
  pub fn read_to_buffer(
    &mut self,
    sink: &mut SegmentedBuffer,
    byte_count: usize,
  ) -> Result<Option<usize>, SourceError> {
    if !self.fill_if_empty(byte_count)? {
      return Ok(None);
    }
    let n = byte_count.min(self.buffer.len());
    self.buffer.transfer_to(sink, n)?;
    Ok(Some(n))
  }

  /// Fill `dst` completely.
  ///
  /// # Errors
  ///
  /// [`SourceError::EndOfInput`] if the source ends first. The bytes that
  /// were available have been copied to the front of `dst` by then.
  pub fn read_fully(&mut self, dst: &mut [u8]) -> Result<(), SourceError> {
    if let Err(e) = self.require(dst.len()) {
      if e.is_end_of_input() {
        self.buffer.read(dst);
      }
      return Err(e);
    }
    Ok(self.buffer.read_exact(dst)?)
  }

  /// Move exactly `byte_count` bytes into `sink`.
  ///
  /// # Errors
  ///
  /// [`SourceError::EndOfInput`] if the source ends first. Everything
  /// that was buffered has been moved to `sink` by then.
  pub fn read_fully_into(&mut self, sink: &mut SegmentedBuffer, byte_count: usize) -> Result<(), SourceError> {
    if let Err(e) = self.require(byte_count) {
      if e.is_end_of_input() {
        let available = self.buffer.len();
        self.buffer.transfer_to(sink, available)?;
      }
      return Err(e);
    }
    Ok(self.buffer.transfer_to(sink, byte_count)?)
  }

  /// Drain everything to `sink`, returning the number of bytes moved.
  ///
  /// Segments are emitted as soon as they are full; the partial tail is
  /// emitted once the source ends.
  ///
  /// # Errors
  ///
  /// [`SourceError::Closed`] after close, any pull failure, or any sink
  /// failure.
  pub fn read_all<K: Sink>(&mut self, sink: &mut K) -> Result<u64, SourceError> {
    self.check_open()?;
    let mut total: u64 = 0;
    while self.pull_chunk()? {
      let complete = self.buffer.complete_segment_byte_count();
      if complete > 0 {
        sink.write(&mut self.buffer, complete)?;
        total += complete as u64;
      }
    }
    let rest = self.buffer.len();
    if rest > 0 {
      sink.write(&mut self.buffer, rest)?;
      total += rest as u64;
    }
    trace!("read_all moved {total} bytes");
    Ok(total)
  }

  /// Discard exactly `byte_count` bytes, pulling as needed.
  ///
  /// # Errors
  ///
  /// [`SourceError::EndOfInput`] if the source ends first; `requested`
  /// is the count still outstanding. Bytes up to that point are gone.
  pub fn skip(&mut self, byte_count: usize) -> Result<(), SourceError> {
    self.check_open()?;
    let mut remaining = byte_count;
    while remaining > 0 {
      if self.buffer.is_empty() && !self.pull_chunk()? {
        return Err(SourceError::EndOfInput {
          requested: remaining,
          available: 0,
        });
      }
      remaining -= self.buffer.discard(remaining);
    }
    Ok(())
  }

  /// Whether the bytes at `offset` equal `bytes`.
  ///
  /// # Errors
  ///
  /// See [`range_equals_at`](Self::range_equals_at).
  pub fn range_equals(&mut self, offset: usize, bytes: &[u8]) -> Result<bool, SourceError> {
    self.range_equals_at(offset, bytes, 0, bytes.len())
  }

  /// Whether the `byte_count` bytes at `offset` equal
  /// `bytes[bytes_offset..bytes_offset + byte_count]`.
  ///
  /// Short data and out-of-range arguments yield `false`. Pulls only as
  /// far as the comparison gets.
  ///
  /// # Errors
  ///
  /// [`SourceError::Closed`] after close, or any pull failure.
  pub fn range_equals_at(
    &mut self,
    offset: usize,
    bytes: &[u8],
    bytes_offset: usize,
    byte_count: usize,
  ) -> Result<bool, SourceError> {
    self.check_open()?;
    let Some(expected) = bytes_offset
      .checked_add(byte_count)
      .and_then(|end| bytes.get(bytes_offset..end))
    else {
      return Ok(false);
    };
    let mut matched = 0;
    while matched < expected.len() {
      let Some(at) = offset.checked_add(matched).filter(|&at| at < usize::MAX) else {
        return Ok(false);
      };
      if !self.request(at + 1)? {
        return Ok(false);
      }
      let n = (self.buffer.len() - at).min(expected.len() - matched);
      if !self.buffer.range_equals(at, &expected[matched..matched + n]) {
        return Ok(false);
      }
      matched += n;
    }
    Ok(true)
  }

  /// Pull one chunk when the buffer is empty. `false` means end of input.
  fn fill_if_empty(&mut self, byte_count: usize) -> Result<bool, SourceError> {
    self.check_open()?;
    if self.buffer.is_empty() && byte_count > 0 {
      return self.pull_chunk();
    }
    Ok(true)
  }
}

#[cfg(test)]
mod tests {
  use std::io;

  use pullbuf_wire::{SEGMENT_SIZE, WriterSink};

  use super::*;
  use crate::testing::Scripted;

  #[test]
  fn byte_arrays() {
    let mut src = BufferedSource::new(Scripted::new(b"0123456789", 3));
    assert_eq!(src.read_byte_array_exact(4).unwrap(), b"0123");
    assert_eq!(src.read_byte_string_exact(2).unwrap(), Bytes::from_static(b"45"));
    assert!(src.read_byte_array_exact(5).unwrap_err().is_end_of_input());
    assert_eq!(src.read_byte_string().unwrap(), Bytes::from_static(b"6789"));
    assert!(src.read_byte_array().unwrap().is_empty());
  }

  #[test]
  fn read_returns_what_is_available_after_one_pull() {
    let scripted = Scripted::new(b"abcdefgh", 3);
    let counters = scripted.counters();
    let mut src = BufferedSource::new(scripted);
    let mut dst = [0u8; 8];

    assert_eq!(src.read(&mut dst).unwrap(), Some(3));
    assert_eq!(&dst[..3], b"abc");
    assert_eq!(counters.pulls.get(), 1);

    assert_eq!(src.read_at(&mut dst, 5, 3).unwrap(), Some(3));
    assert_eq!(&dst[5..], b"def");
    assert_eq!(src.read(&mut dst).unwrap(), Some(2));
    assert_eq!(src.read(&mut dst).unwrap(), None);
  }

  #[test]
  fn read_at_checks_range_before_pulling() {
    let scripted = Scripted::new(b"abc", 3);
    let counters = scripted.counters();
    let mut src = BufferedSource::new(scripted);
    let mut dst = [0u8; 4];
    assert!(matches!(
      src.read_at(&mut dst, 2, 3),
      Err(SourceError::InvalidArgument { .. })
    ));
    assert!(matches!(
      src.read_at(&mut dst, usize::MAX, 2),
      Err(SourceError::InvalidArgument { .. })
    ));
    assert_eq!(counters.pulls.get(), 0);
    assert_eq!(src.read_at(&mut dst, 4, 0).unwrap(), Some(0));
    assert_eq!(counters.pulls.get(), 0);
  }

  #[test]
  fn read_to_buffer_moves_at_most_count() {
    let mut src = BufferedSource::new(Scripted::new(b"abcdef", 4));
    let mut sink = SegmentedBuffer::new();
    assert_eq!(src.read_to_buffer(&mut sink, 2).unwrap(), Some(2));
    assert_eq!(src.read_to_buffer(&mut sink, 10).unwrap(), Some(2));
    assert_eq!(src.read_to_buffer(&mut sink, 10).unwrap(), Some(2));
    assert_eq!(src.read_to_buffer(&mut sink, 10).unwrap(), None);
    assert_eq!(sink.snapshot(0, 6).unwrap(), b"abcdef");
  }

  #[test]
  fn read_fully_delivers_partial_data_before_failing() {
    let mut src = BufferedSource::new(Scripted::new(b"xyz", 2));
    let mut dst = [0u8; 5];
    let err = src.read_fully(&mut dst).unwrap_err();
    assert!(matches!(
      err,
      SourceError::EndOfInput {
        requested: 5,
        available: 3
      }
    ));
    assert_eq!(&dst[..3], b"xyz");
    assert!(src.buffer().is_empty());
  }

  #[test]
  fn read_fully_into_delivers_partial_data_before_failing() {
    let mut src = BufferedSource::new(Scripted::new(b"hello", 2));
    let mut sink = SegmentedBuffer::new();
    src.read_fully_into(&mut sink, 2).unwrap();
    assert!(src.read_fully_into(&mut sink, 10).unwrap_err().is_end_of_input());
    assert_eq!(sink.snapshot(0, sink.len()).unwrap(), b"hello");
  }

  #[test]
  fn read_all_drains_to_sink() {
    let data: Vec<u8> = (0..3 * SEGMENT_SIZE + 17).map(|i| (i % 251) as u8).collect();
    let mut src = BufferedSource::new(Scripted::new(&data, 1000));
    let mut sink = WriterSink::new(Vec::new());
    assert_eq!(src.read_all(&mut sink).unwrap(), data.len() as u64);
    assert_eq!(sink.into_inner(), data);
    assert!(src.exhausted().unwrap());
  }

  #[test]
  fn read_all_reports_sink_failure() {
    struct Broken;
    impl io::Write for Broken {
      fn write(&mut self, _: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))
      }
      fn flush(&mut self) -> io::Result<()> {
        Ok(())
      }
    }
    let mut src = BufferedSource::new(Scripted::new(b"abc", 3));
    let mut sink = WriterSink::new(Broken);
    assert!(matches!(
      src.read_all(&mut sink),
      Err(SourceError::Io(ref e)) if e.kind() == io::ErrorKind::BrokenPipe
    ));
  }

  #[test]
  fn skip_pulls_as_needed() {
    let mut src = BufferedSource::new(Scripted::new(b"0123456789", 3));
    src.skip(7).unwrap();
    assert_eq!(src.read_utf8().unwrap(), "789");
  }

  #[test]
  fn skip_past_end_reports_outstanding_count() {
    let mut src = BufferedSource::new(Scripted::new(b"0123", 3));
    assert!(matches!(
      src.skip(10),
      Err(SourceError::EndOfInput {
        requested: 6,
        available: 0
      })
    ));
  }

  #[test]
  fn range_equals_never_fails_on_short_data() {
    let mut src = BufferedSource::new(Scripted::new(b"GET /index", 2));
    assert!(src.range_equals(0, b"GET ").unwrap());
    assert!(src.range_equals(4, b"/index").unwrap());
    assert!(!src.range_equals(4, b"/index.html").unwrap());
    assert!(!src.range_equals(0, b"PUT").unwrap());
    assert!(src.range_equals_at(5, b"xxindexyy", 2, 5).unwrap());
    assert!(!src.range_equals_at(0, b"GET", 2, 5).unwrap());
    assert!(src.range_equals(3, b"").unwrap());
    // Comparison never consumes.
    assert_eq!(src.read_utf8().unwrap(), "GET /index");
  }

  #[test]
  fn range_equals_stops_pulling_at_first_mismatch() {
    let scripted = Scripted::new(b"abcdefghij", 1);
    let counters = scripted.counters();
    let mut src = BufferedSource::new(scripted);
    assert!(!src.range_equals(0, b"abX-long-tail").unwrap());
    assert_eq!(counters.pulls.get(), 3);
  }

  #[test]
  fn range_equals_over_many_pulls() {
    let data: Vec<u8> = (0..3 * SEGMENT_SIZE + 11).map(|i| (i % 199) as u8).collect();
    let mut src = BufferedSource::new(Scripted::new(&data, 1000));
    assert!(src.range_equals(5, &data[5..]).unwrap());
    let mut altered = data.clone();
    altered[2 * SEGMENT_SIZE] ^= 1;
    assert!(!src.range_equals(0, &altered).unwrap());
    assert!(!src.range_equals(1, &data).unwrap());
  }

  #[test]
  fn structural_ops_after_close() {
    let mut src = BufferedSource::new(Scripted::new(b"abc", 3));
    src.close().unwrap();
    let mut dst = [0u8; 2];
    assert!(matches!(src.read(&mut dst), Err(SourceError::Closed)));
    assert!(matches!(src.skip(1), Err(SourceError::Closed)));
    assert!(matches!(src.range_equals(0, b"a"), Err(SourceError::Closed)));
    assert!(matches!(src.read_byte_array(), Err(SourceError::Closed)));
  }
}
