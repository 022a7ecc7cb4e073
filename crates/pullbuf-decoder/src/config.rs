use pullbuf_wire::{SEGMENT_SIZE, SegmentPool};

/// Configuration for a [`BufferedSource`](crate::BufferedSource).
///
/// ```text
/// ┌────────────┬─────────────────────────┬──────────────────────────────────┐
/// │ Field      │ Default                 │ Purpose                          │
/// ├────────────┼─────────────────────────┼──────────────────────────────────┤
/// │ chunk_size │ SEGMENT_SIZE (8192)     │ Max bytes requested per pull     │
/// │ pool       │ SegmentPool::default()  │ Where buffer segments come from  │
/// │            │                         │ and are released to              │
/// └────────────┴─────────────────────────┴──────────────────────────────────┘
/// ```
///
/// The chunk size is fixed for the lifetime of a source. Larger chunks
/// amortise per-pull overhead; smaller chunks bound how far a single pull
/// can overshoot a request. A chunk size of zero is treated as one.
#[derive(Clone, Debug)]
pub struct SourceConfig {
  pub chunk_size: usize,
  pub pool: SegmentPool,
}

impl SourceConfig {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  #[must_use]
  pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
    self.chunk_size = chunk_size;
    self
  }

  /// Share `pool` with other sources instead of using a private one.
  #[must_use]
  pub fn with_pool(mut self, pool: SegmentPool) -> Self {
    self.pool = pool;
    self
  }

  /// The pull granularity actually used.
  #[must_use]
  pub fn effective_chunk_size(&self) -> usize {
    self.chunk_size.max(1)
  }
}

impl Default for SourceConfig {
  fn default() -> Self {
    Self {
      chunk_size: SEGMENT_SIZE,
      pool: SegmentPool::default(),
    }
  }
}
