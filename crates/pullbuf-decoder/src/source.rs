use log::{debug, trace, warn};
use pullbuf_wire::{PullSource, SegmentedBuffer};

use crate::config::SourceConfig;
use crate::error::SourceError;

/// Buffered, pull-based decoding front end over a [`PullSource`].
///
/// The source is pulled only when buffered data cannot satisfy the current
/// operation, one chunk at a time. Every decode, search, and structural
/// operation is defined in terms of two primitives implemented here:
/// [`request`](Self::request) and a single-chunk pull.
///
/// ```text
///   caller ──▶ read_int / index_of / read_utf8_line / ...
///                 │
///                 ▼
///            request(n) ──▶ buffer.len() >= n ? ──yes──▶ decode from buffer
///                 │                  │
///                 │                  no
///                 │                  ▼
///                 └──────── source.pull(buffer, chunk_size) ──▶ END? ──▶ false
/// ```
///
/// Offsets taken and returned by the search operations are relative to the
/// current read position: offset 0 is the next unread byte.
///
/// # Lifecycle
///
/// [`close`](Self::close) is idempotent. Once closed, every operation other
/// than `close` and [`is_open`](Self::is_open) fails with
/// [`SourceError::Closed`]. Dropping a source without closing it drops the
/// wrapped source without calling [`PullSource::close`].
#[derive(Debug)]
pub struct BufferedSource<S: PullSource> {
  pub(crate) source: S,
  pub(crate) buffer: SegmentedBuffer,
  pub(crate) closed: bool,
  pub(crate) config: SourceConfig,
}

impl<S: PullSource> BufferedSource<S> {
  /// Wrap `source` with the default configuration.
  #[must_use]
  pub fn new(source: S) -> Self {
    Self::with_config(source, SourceConfig::default())
  }

  #[must_use]
  pub fn with_config(source: S, config: SourceConfig) -> Self {
    Self {
      source,
      buffer: SegmentedBuffer::with_pool(config.pool.clone()),
      closed: false,
      config,
    }
  }

  /// Bytes pulled from the source but not yet consumed.
  #[must_use]
  pub fn buffer(&self) -> &SegmentedBuffer {
    &self.buffer
  }

  #[must_use]
  pub fn config(&self) -> &SourceConfig {
    &self.config
  }

  #[must_use]
  pub fn get_ref(&self) -> &S {
    &self.source
  }

  // ── Fill engine ───────────────────────────────────────────────────────

  /// Pull until at least `byte_count` bytes are buffered.
  ///
  /// Returns `Ok(false)` if the source ends first; end of input is not an
  /// error here. The last pull may overshoot; surplus bytes stay buffered.
  ///
  /// # Errors
  ///
  /// [`SourceError::Closed`] after close, or any pull failure.
  pub fn request(&mut self, byte_count: usize) -> Result<bool, SourceError> {
    self.check_open()?;
    while self.buffer.len() < byte_count {
      if !self.pull_chunk()? {
        return Ok(false);
      }
    }
    Ok(true)
  }

  /// Pull until at least `byte_count` bytes are buffered, failing if the
  /// source ends first.
  ///
  /// # Errors
  ///
  /// [`SourceError::EndOfInput`] if the source ends before `byte_count`
  /// bytes accumulate, plus everything [`request`](Self::request) returns.
  pub fn require(&mut self, byte_count: usize) -> Result<(), SourceError> {
    if self.request(byte_count)? {
      Ok(())
    } else {
      Err(SourceError::EndOfInput {
        requested: byte_count,
        available: self.buffer.len(),
      })
    }
  }

  /// Whether no bytes remain, now or ever.
  ///
  /// Pulls once when the buffer is empty to tell "nothing yet" apart from
  /// "nothing ever".
  ///
  /// # Errors
  ///
  /// [`SourceError::Closed`] after close, or any pull failure.
  pub fn exhausted(&mut self) -> Result<bool, SourceError> {
    self.check_open()?;
    Ok(self.buffer.is_empty() && !self.pull_chunk()?)
  }

  /// Pull one chunk into the buffer. Returns `false` at end of input.
  pub(crate) fn pull_chunk(&mut self) -> Result<bool, SourceError> {
    let chunk = self.config.effective_chunk_size();
    match self
      .source
      .pull(&mut self.buffer, chunk)
      .map_err(SourceError::from_pull)?
    {
      Some(appended) => {
        trace!("pulled {appended} bytes, {} buffered", self.buffer.len());
        Ok(true)
      }
      None => {
        debug!("end of input with {} bytes buffered", self.buffer.len());
        Ok(false)
      }
    }
  }

  /// Pull until the source ends.
  pub(crate) fn fill_all(&mut self) -> Result<(), SourceError> {
    self.check_open()?;
    while self.pull_chunk()? {}
    Ok(())
  }

  /// The buffered byte at `offset`; callers must have requested it.
  pub(crate) fn buffered_byte(&self, offset: usize) -> Result<u8, SourceError> {
    self.buffer.get(offset).ok_or(SourceError::EndOfInput {
      requested: offset + 1,
      available: self.buffer.len(),
    })
  }

  // ── Lifecycle ─────────────────────────────────────────────────────────

  #[must_use]
  pub fn is_open(&self) -> bool {
    !self.closed
  }

  /// Close the source. Later calls do nothing.
  ///
  /// The buffered bytes are released to the pool first; the wrapped source
  /// is closed afterwards, exactly once.
  ///
  /// # Errors
  ///
  /// The wrapped source's close failure, reported after the release.
  pub fn close(&mut self) -> Result<(), SourceError> {
    if self.closed {
      return Ok(());
    }
    self.closed = true;
    debug!("closing buffered source, releasing {} bytes", self.buffer.len());
    self.buffer.clear();
    self.source.close().map_err(|e| {
      warn!("failed to close pull source: {e}");
      SourceError::from_pull(e)
    })
  }

  pub(crate) fn check_open(&self) -> Result<(), SourceError> {
    if self.closed {
      return Err(SourceError::Closed);
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use std::io;

  use pullbuf_wire::{SEGMENT_SIZE, SegmentPool};

  use super::*;
  use crate::testing::{Failing, Scripted};

  #[test]
  fn request_pulls_only_what_is_needed() {
    let scripted = Scripted::new(b"abcdefghij", 3);
    let counters = scripted.counters();
    let mut source = BufferedSource::new(scripted);

    assert!(source.request(4).unwrap());
    assert_eq!(counters.pulls.get(), 2);
    assert_eq!(source.buffer().len(), 6); // overshoot stays buffered

    assert!(source.request(6).unwrap());
    assert_eq!(counters.pulls.get(), 2);
  }

  #[test]
  fn request_beyond_end_is_false_not_error() {
    let mut source = BufferedSource::new(Scripted::new(b"0123456789", 4));
    assert!(!source.request(100).unwrap());
    assert_eq!(source.buffer().len(), 10);
    assert!(!source.exhausted().unwrap());
  }

  #[test]
  fn exhausted_after_consuming_everything() {
    let mut source = BufferedSource::new(Scripted::new(b"0123456789", 4));
    assert!(!source.request(100).unwrap());
    source.skip(10).unwrap();
    assert!(source.exhausted().unwrap());
  }

  #[test]
  fn exhausted_distinguishes_not_yet_from_never() {
    let mut empty = BufferedSource::new(Scripted::new(b"", 1));
    assert!(empty.exhausted().unwrap());

    let scripted = Scripted::new(b"x", 1);
    let counters = scripted.counters();
    let mut one = BufferedSource::new(scripted);
    assert!(!one.exhausted().unwrap());
    assert_eq!(counters.pulls.get(), 1);
    assert_eq!(one.buffer().len(), 1);
  }

  #[test]
  fn require_guarantees_buffered_bytes() {
    let mut source = BufferedSource::new(Scripted::new(vec![0u8; 100], 7));
    for n in [0, 1, 7, 8, 50, 100] {
      source.require(n).unwrap();
      assert!(source.buffer().len() >= n);
    }
  }

  #[test]
  fn require_short_source_is_end_of_input_and_keeps_bytes() {
    let mut source = BufferedSource::new(Scripted::new(b"abc", 2));
    let err = source.require(5).unwrap_err();
    assert!(matches!(
      err,
      SourceError::EndOfInput {
        requested: 5,
        available: 3
      }
    ));
    assert_eq!(source.buffer().len(), 3);
  }

  #[test]
  fn pull_failures_propagate_unchanged() {
    let mut source = BufferedSource::new(Failing(io::ErrorKind::TimedOut));
    match source.request(1).unwrap_err() {
      SourceError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::TimedOut),
      other => panic!("expected Io, got {other:?}"),
    }
  }

  #[test]
  fn chunk_size_bounds_each_pull() {
    let config = SourceConfig::new().with_chunk_size(5);
    let mut source = BufferedSource::with_config(Scripted::new(vec![1u8; 64], 64), config);
    assert!(source.request(1).unwrap());
    assert_eq!(source.buffer().len(), 5);
  }

  #[test]
  fn close_is_idempotent_and_closes_source_once() {
    let scripted = Scripted::new(b"abc", 3);
    let counters = scripted.counters();
    let mut source = BufferedSource::new(scripted);
    source.request(1).unwrap();

    source.close().unwrap();
    source.close().unwrap();
    assert_eq!(counters.closes.get(), 1);
    assert!(!source.is_open());
    assert!(source.buffer().is_empty());
  }

  #[test]
  fn operations_after_close_fail() {
    let mut source = BufferedSource::new(Scripted::new(b"abc", 3));
    source.close().unwrap();
    assert!(matches!(source.request(1), Err(SourceError::Closed)));
    assert!(matches!(source.require(0), Err(SourceError::Closed)));
    assert!(matches!(source.exhausted(), Err(SourceError::Closed)));
  }

  #[test]
  fn close_releases_buffer_before_reporting_failure() {
    let pool = SegmentPool::default();
    let scripted = Scripted::new(vec![9u8; 10], 10).failing_close();
    let counters = scripted.counters();
    let mut source =
      BufferedSource::with_config(scripted, SourceConfig::new().with_pool(pool.clone()));
    source.request(10).unwrap();

    let err = source.close().unwrap_err();
    assert!(matches!(err, SourceError::Io(ref e) if e.kind() == io::ErrorKind::BrokenPipe));
    assert_eq!(pool.pooled_bytes(), SEGMENT_SIZE);
    assert!(!source.is_open());

    // Already closed: the failure is not reported twice.
    source.close().unwrap();
    assert_eq!(counters.closes.get(), 1);
  }
}
