use std::io::{self, BufRead, Read, Write};

use pullbuf_wire::PullSource;

use crate::error::SourceError;
use crate::source::BufferedSource;

/// Largest count [`SourceReader::available`] reports (`i32::MAX`).
const MAX_AVAILABLE: usize = 0x7fff_ffff;

/// Blocking [`std::io`] view of a [`BufferedSource`].
///
/// Reads through the reader and reads on the source share one cursor.
/// Errors are reported as [`io::Error`]; a closed source yields
/// [`io::ErrorKind::Other`] wrapping [`SourceError::Closed`].
#[derive(Debug)]
pub struct SourceReader<'a, S: PullSource> {
  source: &'a mut BufferedSource<S>,
}

impl<S: PullSource> SourceReader<'_, S> {
  /// The next byte, or `None` at end of input.
  ///
  /// # Errors
  ///
  /// A closed source, or any pull failure.
  pub fn read_byte(&mut self) -> io::Result<Option<u8>> {
    if self.source.exhausted()? {
      return Ok(None);
    }
    Ok(Some(self.source.read_byte()?))
  }

  /// Bytes that can be read without pulling.
  ///
  /// This says nothing about how much the stream holds in total.
  ///
  /// # Errors
  ///
  /// A closed source.
  pub fn available(&self) -> io::Result<usize> {
    self.source.check_open()?;
    Ok(self.source.buffer.len().min(MAX_AVAILABLE))
  }

  /// Copy everything up to end of input into `out`.
  ///
  /// # Errors
  ///
  /// A closed source, any pull failure, or any write failure.
  pub fn transfer_to<W: Write + ?Sized>(&mut self, out: &mut W) -> io::Result<u64> {
    self.source.check_open()?;
    let mut total: u64 = 0;
    loop {
      total += self.source.buffer.write_to(out)? as u64;
      if !self.source.pull_chunk()? {
        return Ok(total);
      }
    }
  }

  /// Close the underlying source.
  ///
  /// # Errors
  ///
  /// The wrapped source's close failure.
  pub fn close(&mut self) -> io::Result<()> {
    Ok(self.source.close()?)
  }

  fn fill_if_empty(&mut self) -> Result<(), SourceError> {
    self.source.check_open()?;
    if self.source.buffer.is_empty() {
      self.source.pull_chunk()?;
    }
    Ok(())
  }
}

impl<S: PullSource> Read for SourceReader<'_, S> {
  /// Pulls at most once, and only when nothing is buffered. Returns 0 at
  /// end of input.
  fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
    if buf.is_empty() {
      self.source.check_open()?;
      return Ok(0);
    }
    self.fill_if_empty()?;
    Ok(self.source.buffer.read(buf))
  }
}

impl<S: PullSource> BufRead for SourceReader<'_, S> {
  fn fill_buf(&mut self) -> io::Result<&[u8]> {
    self.fill_if_empty()?;
    Ok(self.source.buffer.head_slice())
  }

  fn consume(&mut self, amt: usize) {
    self.source.buffer.discard(amt);
  }
}

impl<S: PullSource> BufferedSource<S> {
  /// A [`std::io::Read`] + [`std::io::BufRead`] view sharing this source's
  /// cursor.
  #[must_use]
  pub fn reader(&mut self) -> SourceReader<'_, S> {
    SourceReader { source: self }
  }
}
