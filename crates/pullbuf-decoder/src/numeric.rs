use pullbuf_wire::PullSource;

use crate::error::SourceError;
use crate::source::BufferedSource;

/// ASCII numerals.
///
/// Both readers consume greedily: every leading byte that can belong to the
/// numeral is taken, and the first byte that cannot is left unread.
impl<S: PullSource> BufferedSource<S> {
  /// Read a signed decimal numeral such as `-42`.
  ///
  /// An optional leading `-` is followed by one or more digits. The value
  /// is accumulated negatively so `i64::MIN` round-trips.
  ///
  /// # Errors
  ///
  /// - [`SourceError::EndOfInput`] if the stream is empty.
  /// - [`SourceError::MalformedNumber`] if no digit follows the optional
  ///   sign, or the value does not fit in `i64`. Nothing is consumed.
  pub fn read_decimal_long(&mut self) -> Result<i64, SourceError> {
    self.require(1)?;

    let len = self.numeral_len(|at, b| b.is_ascii_digit() || (at == 0 && b == b'-'))?;
    if len == 0 {
      let b = self.buffered_byte(0)?;
      return Err(SourceError::malformed_number(format!(
        "expected a digit or '-' but was {b:#04x}"
      )));
    }

    let negative = self.buffered_byte(0)? == b'-';
    let digits = self.buffer.snapshot(usize::from(negative), len - usize::from(negative))?;
    if digits.is_empty() {
      return Err(SourceError::malformed_number("expected a digit after '-'"));
    }

    let mut value: i64 = 0;
    for &d in &digits {
      value = value
        .checked_mul(10)
        .and_then(|v| v.checked_sub(i64::from(d - b'0')))
        .ok_or_else(|| self.too_large(len))?;
    }
    if !negative {
      value = value.checked_neg().ok_or_else(|| self.too_large(len))?;
    }

    self.buffer.skip(len)?;
    Ok(value)
  }

  /// Read an unsigned hexadecimal numeral such as `7fE0`, either case.
  ///
  /// Digits beyond the sixteenth shift the leading ones out; the result
  /// keeps the low 64 bits.
  ///
  /// # Errors
  ///
  /// - [`SourceError::EndOfInput`] if the stream is empty.
  /// - [`SourceError::MalformedNumber`] if the first byte is not a hex
  ///   digit. Nothing is consumed.
  pub fn read_hexadecimal_unsigned_long(&mut self) -> Result<u64, SourceError> {
    self.require(1)?;

    let len = self.numeral_len(|_, b| b.is_ascii_hexdigit())?;
    if len == 0 {
      let b = self.buffered_byte(0)?;
      return Err(SourceError::malformed_number(format!(
        "expected leading [0-9a-fA-F] character but was {b:#04x}"
      )));
    }

    let value = self
      .buffer
      .snapshot(0, len)?
      .iter()
      .filter_map(|&b| char::from(b).to_digit(16))
      .fold(0u64, |value, digit| (value << 4) | u64::from(digit));
    self.buffer.skip(len)?;
    Ok(value)
  }

  /// Length of the leading run of bytes accepted by `accept`, pulling until
  /// a byte is rejected or the input ends.
  ///
  /// Each pass scans only the bytes the previous pull appended.
  fn numeral_len<F>(&mut self, mut accept: F) -> Result<usize, SourceError>
  where
    F: FnMut(usize, u8) -> bool,
  {
    let mut len = 0;
    loop {
      let mut at = len;
      let rejected = self.buffer.position(len, usize::MAX, |b| {
        let accepted = accept(at, b);
        at += 1;
        !accepted
      });
      if let Some(end) = rejected {
        return Ok(end);
      }
      len = self.buffer.len();
      if !self.pull_chunk()? {
        return Ok(len);
      }
    }
  }

  fn too_large(&self, len: usize) -> SourceError {
    let text = self
      .buffer
      .snapshot(0, len)
      .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
      .unwrap_or_default();
    SourceError::malformed_number(format!("number too large: {text}"))
  }
}
