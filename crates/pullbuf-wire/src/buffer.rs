use std::collections::VecDeque;
use std::fmt;
use std::io::{self, Write};

use crate::error::WireError;
use crate::segment::{SEGMENT_SIZE, Segment, SegmentPool};

/// Ordered byte queue built from pooled [`Segment`]s.
///
/// Bytes are appended at the tail and consumed from the head. Offsets in
/// the scanning methods are absolute positions from the current head, so
/// offset 0 is always the next unconsumed byte.
///
/// ```text
///   head                                              tail
///   ┌────────────┐   ┌────────────────┐   ┌──────────────┐
///   │ ....XXXXXX │ ─▶│ XXXXXXXXXXXXXX │ ─▶│ XXXXX....... │
///   └────────────┘   └────────────────┘   └──────────────┘
///    consumed│readable                       readable│writable
/// ```
///
/// Segments are returned to the pool as soon as they are fully consumed,
/// and every remaining segment is returned on [`clear`](Self::clear) or
/// drop.
pub struct SegmentedBuffer {
    segments: VecDeque<Segment>,
    len: usize,
    pool: SegmentPool,
}

impl SegmentedBuffer {
    /// Create an empty buffer with its own default pool.
    #[must_use]
    pub fn new() -> Self {
        Self::with_pool(SegmentPool::default())
    }

    /// Create an empty buffer that acquires and releases segments
    /// through `pool`.
    #[must_use]
    pub fn with_pool(pool: SegmentPool) -> Self {
        Self {
            segments: VecDeque::new(),
            len: 0,
            pool,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn pool(&self) -> &SegmentPool {
        &self.pool
    }

    // ── Appending ─────────────────────────────────────────────────────────

    /// Append `bytes` at the tail.
    pub fn write(&mut self, mut bytes: &[u8]) {
        while !bytes.is_empty() {
            let index = self.tail_index();
            let segment = &mut self.segments[index];
            let n = segment.remaining_capacity().min(bytes.len());
            segment.writable()[..n].copy_from_slice(&bytes[..n]);
            segment.limit += n;
            self.len += n;
            bytes = &bytes[n..];
        }
    }

    /// Let `fill` write directly into the tail segment.
    ///
    /// `fill` receives between 1 and `max` bytes of writable space (less
    /// than `max` when the tail segment is partially used) and returns how
    /// many bytes it wrote. Used by sources that read into the buffer
    /// without an intermediate copy.
    ///
    /// # Errors
    ///
    /// Propagates whatever error `fill` returns; nothing is appended in
    /// that case.
    pub fn write_with<F>(&mut self, max: usize, fill: F) -> io::Result<usize>
    where
        F: FnOnce(&mut [u8]) -> io::Result<usize>,
    {
        if max == 0 {
            return Ok(0);
        }
        let index = self.tail_index();
        let segment = &mut self.segments[index];
        let window = segment.remaining_capacity().min(max);
        let result = fill(&mut segment.writable()[..window]);
        let written = match &result {
            &Ok(n) => {
                debug_assert!(n <= window, "fill reported {n} bytes for a {window}-byte window");
                n.min(window)
            }
            Err(_) => 0,
        };
        segment.limit += written;
        self.len += written;
        if segment.is_empty() {
            // A freshly acquired tail that received nothing goes straight back.
            if let Some(unused) = self.segments.pop_back() {
                self.pool.release(unused);
            }
        }
        result.map(|_| written)
    }

    // ── Consuming ─────────────────────────────────────────────────────────

    /// Copy up to `dst.len()` bytes into `dst` and consume them.
    ///
    /// # Returns
    ///
    /// The number of bytes copied, which is less than `dst.len()` only
    /// when the buffer runs dry.
    pub fn read(&mut self, dst: &mut [u8]) -> usize {
        let mut copied = 0;
        while copied < dst.len() {
            let Some(segment) = self.segments.front() else {
                break;
            };
            let data = segment.readable();
            let n = data.len().min(dst.len() - copied);
            dst[copied..copied + n].copy_from_slice(&data[..n]);
            copied += n;
            self.consume_front(n);
        }
        copied
    }

    /// Fill `dst` completely and consume those bytes.
    ///
    /// # Errors
    ///
    /// [`WireError::UnexpectedEof`] if fewer than `dst.len()` bytes are
    /// buffered. Nothing is consumed in that case.
    pub fn read_exact(&mut self, dst: &mut [u8]) -> Result<(), WireError> {
        self.check_available(dst.len())?;
        self.read(dst);
        Ok(())
    }

    /// Consume `byte_count` bytes into a new vector.
    ///
    /// # Errors
    ///
    /// [`WireError::UnexpectedEof`] if fewer bytes are buffered.
    pub fn read_vec(&mut self, byte_count: usize) -> Result<Vec<u8>, WireError> {
        self.check_available(byte_count)?;
        let mut out = vec![0u8; byte_count];
        self.read(&mut out);
        Ok(out)
    }

    /// Discard exactly `byte_count` bytes.
    ///
    /// # Errors
    ///
    /// [`WireError::UnexpectedEof`] if fewer bytes are buffered. Nothing is
    /// discarded in that case.
    pub fn skip(&mut self, byte_count: usize) -> Result<(), WireError> {
        self.check_available(byte_count)?;
        self.consume_front(byte_count);
        Ok(())
    }

    /// Discard up to `byte_count` bytes, returning how many were discarded.
    pub fn discard(&mut self, byte_count: usize) -> usize {
        let n = byte_count.min(self.len);
        self.consume_front(n);
        n
    }

    /// Release every segment back to the pool.
    pub fn clear(&mut self) {
        self.len = 0;
        while let Some(segment) = self.segments.pop_front() {
            self.pool.release(segment);
        }
    }

    /// Drain the whole buffer into `out`.
    ///
    /// Each segment is released only after it was written, so a failing
    /// writer leaves the unwritten bytes buffered.
    ///
    /// # Errors
    ///
    /// Any error returned by `out`.
    pub fn write_to<W: Write + ?Sized>(&mut self, out: &mut W) -> io::Result<usize> {
        let mut written = 0;
        while let Some(segment) = self.segments.front() {
            let data = segment.readable();
            out.write_all(data)?;
            let n = data.len();
            written += n;
            self.consume_front(n);
        }
        Ok(written)
    }

    /// Move `byte_count` bytes from the head of this buffer to the tail of
    /// `dst`.
    ///
    /// Whole head segments are handed over without copying; a partial
    /// head segment is copied.
    ///
    /// # Errors
    ///
    /// [`WireError::UnexpectedEof`] if fewer bytes are buffered.
    pub fn transfer_to(&mut self, dst: &mut SegmentedBuffer, byte_count: usize) -> Result<(), WireError> {
        self.check_available(byte_count)?;
        let mut remaining = byte_count;
        while remaining > 0 {
            let Some(head) = self.segments.front() else {
                break;
            };
            let head_len = head.len();
            if head_len <= remaining {
                if let Some(segment) = self.segments.pop_front() {
                    self.len -= head_len;
                    dst.len += head_len;
                    dst.segments.push_back(segment);
                }
                remaining -= head_len;
            } else {
                dst.write(&head.readable()[..remaining]);
                self.consume_front(remaining);
                remaining = 0;
            }
        }
        Ok(())
    }

    // ── Inspecting ────────────────────────────────────────────────────────

    /// The byte at `offset`, or `None` past the end.
    #[must_use]
    pub fn get(&self, offset: usize) -> Option<u8> {
        let (index, pos) = self.locate(offset)?;
        Some(self.segments[index].readable()[pos])
    }

    /// The readable bytes of the head segment; empty when the buffer is.
    #[must_use]
    pub fn head_slice(&self) -> &[u8] {
        match self.segments.front() {
            Some(segment) => segment.readable(),
            None => &[],
        }
    }

    /// Bytes held in segments that cannot accept more writes.
    ///
    /// A partially filled tail segment is excluded so that emitting this
    /// many bytes to a sink never splits a segment still being filled.
    #[must_use]
    pub fn complete_segment_byte_count(&self) -> usize {
        let open_tail = self
            .segments
            .back()
            .filter(|tail| tail.limit < SEGMENT_SIZE)
            .map_or(0, Segment::len);
        self.len - open_tail
    }

    /// Offset of the first byte in `from..to` for which `matches` holds.
    ///
    /// `to` is clamped to the buffered length.
    pub fn position<P>(&self, from: usize, to: usize, mut matches: P) -> Option<usize>
    where
        P: FnMut(u8) -> bool,
    {
        let to = to.min(self.len);
        if from >= to {
            return None;
        }
        let mut offset = from;
        for chunk in self.chunks_from(from) {
            let window = &chunk[..chunk.len().min(to - offset)];
            if let Some(i) = window.iter().position(|&b| matches(b)) {
                return Some(offset + i);
            }
            offset += window.len();
            if offset >= to {
                break;
            }
        }
        None
    }

    /// Offset of the first `byte` in `from..to`.
    #[must_use]
    pub fn index_of(&self, byte: u8, from: usize, to: usize) -> Option<usize> {
        self.position(from, to, |b| b == byte)
    }

    /// Offset of the first occurrence of `pattern` that starts in
    /// `from..to` and lies entirely within the buffered bytes.
    ///
    /// The segments are walked once from `from`. A candidate that runs
    /// past the end of its segment is compared by stepping into the
    /// following segments.
    #[must_use]
    pub fn index_of_bytes(&self, pattern: &[u8], from: usize, to: usize) -> Option<usize> {
        let (&first, rest) = pattern.split_first()?;
        let to = to.min((self.len + 1).checked_sub(pattern.len())?);
        if from >= to {
            return None;
        }
        let (mut index, mut pos) = self.locate(from)?;
        let mut offset = from;
        while offset < to {
            let Some(segment) = self.segments.get(index) else {
                break;
            };
            let data = segment.readable();
            let end = data.len().min(pos + (to - offset));
            let mut at = pos;
            while let Some(hit) = data[at..end].iter().position(|&b| b == first) {
                at += hit;
                if self.continues_with(index, at + 1, rest) {
                    return Some(offset + (at - pos));
                }
                at += 1;
            }
            offset += end - pos;
            index += 1;
            pos = 0;
        }
        None
    }

    /// Whether the bytes at `offset..offset + bytes.len()` equal `bytes`.
    ///
    /// Returns `false` when the range extends past the buffered bytes.
    #[must_use]
    pub fn range_equals(&self, offset: usize, bytes: &[u8]) -> bool {
        if offset.checked_add(bytes.len()).is_none_or(|end| end > self.len) {
            return false;
        }
        let mut rest = bytes;
        for chunk in self.chunks_from(offset) {
            if rest.is_empty() {
                break;
            }
            let n = chunk.len().min(rest.len());
            if chunk[..n] != rest[..n] {
                return false;
            }
            rest = &rest[n..];
        }
        rest.is_empty()
    }

    /// Copy `byte_count` bytes starting at `offset` into `dst` without
    /// consuming them.
    ///
    /// # Errors
    ///
    /// [`WireError::UnexpectedEof`] if the range extends past the buffered
    /// bytes.
    pub fn copy_to(&self, dst: &mut SegmentedBuffer, offset: usize, byte_count: usize) -> Result<(), WireError> {
        self.check_range(offset, byte_count)?;
        let mut remaining = byte_count;
        for chunk in self.chunks_from(offset) {
            if remaining == 0 {
                break;
            }
            let n = chunk.len().min(remaining);
            dst.write(&chunk[..n]);
            remaining -= n;
        }
        Ok(())
    }

    /// Copy `byte_count` bytes starting at `offset` into a vector without
    /// consuming them.
    ///
    /// # Errors
    ///
    /// [`WireError::UnexpectedEof`] if the range extends past the buffered
    /// bytes.
    pub fn snapshot(&self, offset: usize, byte_count: usize) -> Result<Vec<u8>, WireError> {
        self.check_range(offset, byte_count)?;
        let mut out = Vec::with_capacity(byte_count);
        for chunk in self.chunks_from(offset) {
            let n = chunk.len().min(byte_count - out.len());
            out.extend_from_slice(&chunk[..n]);
            if out.len() == byte_count {
                break;
            }
        }
        Ok(out)
    }

    // ── Internals ─────────────────────────────────────────────────────────

    /// Readable slices starting at absolute `offset`. The first slice
    /// begins exactly at `offset`; empty segments are skipped.
    fn chunks_from(&self, offset: usize) -> impl Iterator<Item = &[u8]> {
        let (start, skip) = self.locate(offset).unwrap_or((self.segments.len(), 0));
        self.segments
            .range(start..)
            .enumerate()
            .filter_map(move |(i, segment)| {
                let data = segment.readable();
                let chunk = if i == 0 { &data[skip..] } else { data };
                (!chunk.is_empty()).then_some(chunk)
            })
    }

    /// Segment index and in-segment position of absolute `offset`, or
    /// `None` past the end.
    ///
    /// Walks from whichever end of the queue is nearer.
    fn locate(&self, offset: usize) -> Option<(usize, usize)> {
        if offset >= self.len {
            return None;
        }
        if offset < self.len / 2 {
            let mut skip = offset;
            for (index, segment) in self.segments.iter().enumerate() {
                if skip < segment.len() {
                    return Some((index, skip));
                }
                skip -= segment.len();
            }
        } else {
            let mut end = self.len;
            for (index, segment) in self.segments.iter().enumerate().rev() {
                let start = end - segment.len();
                if offset >= start {
                    return Some((index, offset - start));
                }
                end = start;
            }
        }
        None
    }

    /// Whether the bytes from `pos` in segment `index` onward begin with
    /// `expected`.
    fn continues_with(&self, mut index: usize, mut pos: usize, mut expected: &[u8]) -> bool {
        while !expected.is_empty() {
            let Some(segment) = self.segments.get(index) else {
                return false;
            };
            let data = &segment.readable()[pos..];
            let n = data.len().min(expected.len());
            if data[..n] != expected[..n] {
                return false;
            }
            expected = &expected[n..];
            index += 1;
            pos = 0;
        }
        true
    }

    /// Index of a tail segment with free space, acquiring one if needed.
    fn tail_index(&mut self) -> usize {
        if self
            .segments
            .back()
            .is_none_or(|tail| tail.remaining_capacity() == 0)
        {
            let segment = self.pool.acquire();
            self.segments.push_back(segment);
        }
        self.segments.len() - 1
    }

    /// Advance the head by `n` bytes, releasing drained segments.
    /// Callers guarantee `n <= self.len`.
    fn consume_front(&mut self, mut n: usize) {
        debug_assert!(n <= self.len);
        while let Some(segment) = self.segments.front_mut() {
            let k = n.min(segment.len());
            segment.pos += k;
            n -= k;
            self.len -= k;
            if !segment.is_empty() {
                break;
            }
            if let Some(drained) = self.segments.pop_front() {
                self.pool.release(drained);
            }
            if n == 0 && self.segments.front().is_some_and(|s| !s.is_empty()) {
                break;
            }
        }
    }

    fn check_available(&self, requested: usize) -> Result<(), WireError> {
        if requested > self.len {
            return Err(WireError::UnexpectedEof {
                requested,
                available: self.len,
            });
        }
        Ok(())
    }

    fn check_range(&self, offset: usize, byte_count: usize) -> Result<(), WireError> {
        match offset.checked_add(byte_count) {
            Some(end) if end <= self.len => Ok(()),
            _ => Err(WireError::UnexpectedEof {
                requested: byte_count,
                available: self.len.saturating_sub(offset),
            }),
        }
    }
}

impl Default for SegmentedBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SegmentedBuffer {
    fn drop(&mut self) {
        self.clear();
    }
}

impl fmt::Debug for SegmentedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SegmentedBuffer")
            .field("len", &self.len)
            .field("segments", &self.segments.len())
            .finish_non_exhaustive()
    }
}
