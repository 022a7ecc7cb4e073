use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Capacity of a single segment in bytes.
///
/// Also the default pull granularity of the decoder: one pull asks the
/// source for at most one segment's worth of bytes.
pub const SEGMENT_SIZE: usize = 8192;

/// Default upper bound on the bytes a [`SegmentPool`] keeps for reuse.
pub const DEFAULT_POOL_BYTES: usize = 64 * 1024;

/// A fixed-capacity run of bytes inside a [`SegmentedBuffer`].
///
/// ```text
///   0          pos            limit            SEGMENT_SIZE
///   ├──────────┼───────────────┼────────────────┤
///   │ consumed │   readable    │    writable    │
///   └──────────┴───────────────┴────────────────┘
/// ```
///
/// [`SegmentedBuffer`]: crate::SegmentedBuffer
pub struct Segment {
    data: Box<[u8]>,
    pub(crate) pos: usize,
    pub(crate) limit: usize,
}

impl Segment {
    fn new() -> Self {
        Self {
            data: vec![0u8; SEGMENT_SIZE].into_boxed_slice(),
            pos: 0,
            limit: 0,
        }
    }

    /// Number of readable bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.limit - self.pos
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pos == self.limit
    }

    /// Number of bytes that can still be appended.
    #[must_use]
    pub fn remaining_capacity(&self) -> usize {
        self.data.len() - self.limit
    }

    /// The readable bytes, `pos..limit`.
    #[must_use]
    pub fn readable(&self) -> &[u8] {
        &self.data[self.pos..self.limit]
    }

    pub(crate) fn writable(&mut self) -> &mut [u8] {
        &mut self.data[self.limit..]
    }

    fn reset(&mut self) {
        self.pos = 0;
        self.limit = 0;
    }
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Segment")
            .field("pos", &self.pos)
            .field("limit", &self.limit)
            .finish()
    }
}

/// Recycling pool for segments.
///
/// Buffers acquire a segment whenever their tail fills up and release it
/// once every byte in it has been consumed. The pool is an explicit handle
/// rather than process-wide state: clones share one free list, and each
/// buffer holds the handle it was built with.
///
/// ```text
///   acquire() ──▶ free list non-empty? ──yes──▶ pop recycled segment
///                        │
///                        no ──▶ allocate SEGMENT_SIZE bytes
///
///   release(s) ──▶ pooled + SEGMENT_SIZE <= max_bytes? ──yes──▶ push
///                        │
///                        no ──▶ drop
/// ```
#[derive(Clone)]
pub struct SegmentPool {
    inner: Arc<Mutex<PoolState>>,
}

struct PoolState {
    free: Vec<Segment>,
    max_bytes: usize,
}

impl SegmentPool {
    /// Create a pool that retains at most `max_bytes` of idle segments.
    ///
    /// A `max_bytes` below [`SEGMENT_SIZE`] disables recycling entirely.
    #[must_use]
    pub fn new(max_bytes: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(PoolState {
                free: Vec::new(),
                max_bytes,
            })),
        }
    }

    /// Take a segment from the free list, allocating when it is empty.
    ///
    /// The returned segment is always empty (`pos == limit == 0`).
    #[must_use]
    pub fn acquire(&self) -> Segment {
        self.lock().free.pop().unwrap_or_else(Segment::new)
    }

    /// Return a segment for reuse. Its contents are discarded.
    pub fn release(&self, mut segment: Segment) {
        segment.reset();
        let mut state = self.lock();
        if (state.free.len() + 1) * SEGMENT_SIZE <= state.max_bytes {
            state.free.push(segment);
        }
    }

    /// Bytes currently held on the free list.
    #[must_use]
    pub fn pooled_bytes(&self) -> usize {
        self.lock().free.len() * SEGMENT_SIZE
    }

    // A panic while holding the lock leaves the free list consistent
    // (push/pop are the only mutations), so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SegmentPool {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_BYTES)
    }
}

impl fmt::Debug for SegmentPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("SegmentPool")
            .field("pooled_bytes", &(state.free.len() * SEGMENT_SIZE))
            .field("max_bytes", &state.max_bytes)
            .finish()
    }
}
