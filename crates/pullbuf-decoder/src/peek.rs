use std::io;

use pullbuf_wire::{PullSource, SegmentedBuffer};

use crate::error::SourceError;
use crate::source::BufferedSource;

/// Pull source that reads ahead of a parent [`BufferedSource`] without
/// consuming from it.
///
/// Created by [`BufferedSource::peek`]. Each pull asks the parent to buffer
/// one more byte past `pos`, then copies from the parent's buffer starting at
/// `pos`:
///
/// ```text
///   parent.buffer:  [ consumed by peek cursor | not yet seen by peek ]
///                   0                         pos                    len
/// ```
///
/// Bytes pulled on the cursor's behalf land in the parent's buffer, so the
/// parent reads them later without pulling again.
#[derive(Debug)]
pub struct PeekSource<'a, S: PullSource> {
  upstream: &'a mut BufferedSource<S>,
  pos: usize,
  closed: bool,
}

impl<S: PullSource> PullSource for PeekSource<'_, S> {
  fn pull(&mut self, sink: &mut SegmentedBuffer, max: usize) -> io::Result<Option<usize>> {
    if self.closed {
      return Err(SourceError::Closed.into());
    }
    if max == 0 {
      return Ok(Some(0));
    }
    if !self.upstream.request(self.pos + 1)? {
      return Ok(None);
    }
    let count = max.min(self.upstream.buffer.len() - self.pos);
    self.upstream.buffer.copy_to(sink, self.pos, count)?;
    self.pos += count;
    Ok(Some(count))
  }

  /// Closing a peek cursor leaves the parent open.
  fn close(&mut self) -> io::Result<()> {
    self.closed = true;
    Ok(())
  }
}

impl<S: PullSource> BufferedSource<S> {
  /// A cursor that reads ahead from the current position without
  /// consuming.
  ///
  /// The cursor borrows this source mutably, so the source cannot be read
  /// while the cursor is alive. Cursors nest: peeking a cursor reads ahead
  /// of that cursor.
  #[must_use]
  pub fn peek(&mut self) -> BufferedSource<PeekSource<'_, S>> {
    let config = self.config.clone();
    BufferedSource::with_config(
      PeekSource {
        upstream: self,
        pos: 0,
        closed: false,
      },
      config,
    )
  }
}
