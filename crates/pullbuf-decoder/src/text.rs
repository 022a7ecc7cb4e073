use pullbuf_wire::PullSource;

use crate::error::SourceError;
use crate::source::BufferedSource;

/// Bytes of buffered content quoted in a [`SourceError::LineNotFound`].
const LINE_PREVIEW_BYTES: usize = 32;

/// Decode `bytes` as UTF-8, replacing each malformed sequence with U+FFFD.
fn decode_lossy(bytes: Vec<u8>) -> String {
  match String::from_utf8(bytes) {
    Ok(text) => text,
    Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
  }
}

/// UTF-8 text decoding.
///
/// Malformed input never fails: invalid bytes, overlong forms, and encoded
/// surrogates decode as U+FFFD REPLACEMENT CHARACTER.
impl<S: PullSource> BufferedSource<S> {
  /// Decode everything up to end of input.
  ///
  /// # Errors
  ///
  /// [`SourceError::Closed`] after close, or any pull failure.
  pub fn read_utf8(&mut self) -> Result<String, SourceError> {
    self.fill_all()?;
    self.take_utf8(self.buffer.len())
  }

  /// Decode exactly `byte_count` bytes.
  ///
  /// A multi-byte sequence cut off at the end of the span decodes as
  /// U+FFFD; its remaining bytes stay unread.
  ///
  /// # Errors
  ///
  /// [`SourceError::EndOfInput`] if fewer bytes remain.
  pub fn read_utf8_exact(&mut self, byte_count: usize) -> Result<String, SourceError> {
    self.require(byte_count)?;
    self.take_utf8(byte_count)
  }

  /// Read the next line, without its `\n` or `\r\n` terminator.
  ///
  /// At end of input a non-empty unterminated remainder is returned as the
  /// last line; after that (or when nothing remains) the result is
  /// `None`, so lines can be read with `while let Some(line) = ...`.
  ///
  /// # Errors
  ///
  /// [`SourceError::Closed`] after close, or any pull failure.
  pub fn read_utf8_line(&mut self) -> Result<Option<String>, SourceError> {
    match self.index_of(b'\n')? {
      Some(newline) => self.take_line(newline).map(Some),
      None if self.buffer.is_empty() => Ok(None),
      None => self.take_utf8(self.buffer.len()).map(Some),
    }
  }

  /// Read the next line, requiring a terminator.
  ///
  /// # Errors
  ///
  /// See [`read_utf8_line_strict_limit`](Self::read_utf8_line_strict_limit).
  pub fn read_utf8_line_strict(&mut self) -> Result<String, SourceError> {
    self.read_utf8_line_strict_limit(usize::MAX)
  }

  /// Read the next line, requiring a terminator within `limit` bytes.
  ///
  /// The line content (excluding the terminator) may be at most `limit`
  /// bytes. `usize::MAX` means unbounded.
  ///
  /// # Errors
  ///
  /// [`SourceError::LineNotFound`] if no terminator appears within the
  /// limit or before end of input. Nothing is consumed in that case.
  pub fn read_utf8_line_strict_limit(&mut self, limit: usize) -> Result<String, SourceError> {
    let scan_length = limit.saturating_add(1);
    if let Some(newline) = self.index_of_in(b'\n', 0, scan_length)? {
      return self.take_line(newline);
    }
    // A line of exactly `limit` bytes followed by "\r\n".
    if scan_length < usize::MAX
      && self.request(scan_length)?
      && self.buffered_byte(scan_length - 1)? == b'\r'
      && self.request(scan_length + 1)?
      && self.buffered_byte(scan_length)? == b'\n'
    {
      return self.take_line(scan_length);
    }
    let preview = self
      .buffer
      .snapshot(0, self.buffer.len().min(LINE_PREVIEW_BYTES))?;
    Err(SourceError::LineNotFound {
      limit: self.buffer.len().min(limit),
      content: hex::encode(preview),
    })
  }

  /// Decode one Unicode scalar value.
  ///
  /// The lead byte declares the sequence length:
  ///
  /// | Lead byte   | Length | Smallest value |
  /// |-------------|--------|----------------|
  /// | `0xxxxxxx`  | 1      | U+0000         |
  /// | `110xxxxx`  | 2      | U+0080         |
  /// | `1110xxxx`  | 3      | U+0800         |
  /// | `11110xxx`  | 4      | U+10000        |
  ///
  /// Any other lead byte yields U+FFFD and consumes one byte. A bad
  /// continuation byte, an overlong form, a surrogate, or a value above
  /// U+10FFFF yields U+FFFD and consumes the declared length.
  ///
  /// # Errors
  ///
  /// [`SourceError::EndOfInput`] if the stream is empty, or ends before
  /// the declared length is available.
  pub fn read_utf8_code_point(&mut self) -> Result<char, SourceError> {
    self.require(1)?;
    let lead = self.buffered_byte(0)?;
    let (width, min, bits) = match lead {
      b if b & 0x80 == 0 => (1, 0, u32::from(b)),
      b if b & 0xe0 == 0xc0 => (2, 0x80, u32::from(b & 0x1f)),
      b if b & 0xf0 == 0xe0 => (3, 0x800, u32::from(b & 0x0f)),
      b if b & 0xf8 == 0xf0 => (4, 0x1_0000, u32::from(b & 0x07)),
      _ => {
        self.buffer.skip(1)?;
        return Ok(char::REPLACEMENT_CHARACTER);
      }
    };
    self.require(width)?;

    let mut code_point = bits;
    let mut well_formed = true;
    for i in 1..width {
      let b = self.buffered_byte(i)?;
      if b & 0xc0 != 0x80 {
        well_formed = false;
        break;
      }
      code_point = (code_point << 6) | u32::from(b & 0x3f);
    }
    self.buffer.skip(width)?;

    if !well_formed || code_point < min {
      return Ok(char::REPLACEMENT_CHARACTER);
    }
    // from_u32 rejects surrogates and values above U+10FFFF.
    Ok(char::from_u32(code_point).unwrap_or(char::REPLACEMENT_CHARACTER))
  }

  /// Consume the line ending at `newline`, stripping `\n` or `\r\n`.
  fn take_line(&mut self, newline: usize) -> Result<String, SourceError> {
    if newline > 0 && self.buffered_byte(newline - 1)? == b'\r' {
      let line = self.take_utf8(newline - 1)?;
      self.buffer.skip(2)?;
      Ok(line)
    } else {
      let line = self.take_utf8(newline)?;
      self.buffer.skip(1)?;
      Ok(line)
    }
  }

  fn take_utf8(&mut self, byte_count: usize) -> Result<String, SourceError> {
    Ok(decode_lossy(self.buffer.read_vec(byte_count)?))
  }
}
