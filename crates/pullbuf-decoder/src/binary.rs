use pullbuf_wire::PullSource;

use crate::error::SourceError;
use crate::source::BufferedSource;

/// Fixed-width integers, big-endian unless suffixed `_le`.
impl<S: PullSource> BufferedSource<S> {
  /// # Errors
  ///
  /// [`SourceError::EndOfInput`] if the stream is empty.
  pub fn read_byte(&mut self) -> Result<u8, SourceError> {
    let [b] = self.read_array()?;
    Ok(b)
  }

  /// # Errors
  ///
  /// [`SourceError::EndOfInput`] if fewer than 2 bytes remain; nothing is
  /// consumed in that case.
  pub fn read_short(&mut self) -> Result<i16, SourceError> {
    self.read_array().map(i16::from_be_bytes)
  }

  /// # Errors
  ///
  /// See [`read_short`](Self::read_short).
  pub fn read_short_le(&mut self) -> Result<i16, SourceError> {
    self.read_array().map(i16::from_le_bytes)
  }

  /// # Errors
  ///
  /// [`SourceError::EndOfInput`] if fewer than 4 bytes remain; nothing is
  /// consumed in that case.
  pub fn read_int(&mut self) -> Result<i32, SourceError> {
    self.read_array().map(i32::from_be_bytes)
  }

  /// # Errors
  ///
  /// See [`read_int`](Self::read_int).
  pub fn read_int_le(&mut self) -> Result<i32, SourceError> {
    self.read_array().map(i32::from_le_bytes)
  }

  /// # Errors
  ///
  /// [`SourceError::EndOfInput`] if fewer than 8 bytes remain; nothing is
  /// consumed in that case.
  pub fn read_long(&mut self) -> Result<i64, SourceError> {
    self.read_array().map(i64::from_be_bytes)
  }

  /// # Errors
  ///
  /// See [`read_long`](Self::read_long).
  pub fn read_long_le(&mut self) -> Result<i64, SourceError> {
    self.read_array().map(i64::from_le_bytes)
  }

  fn read_array<const N: usize>(&mut self) -> Result<[u8; N], SourceError> {
    self.require(N)?;
    let mut out = [0u8; N];
    self.buffer.read_exact(&mut out)?;
    Ok(out)
  }
}
