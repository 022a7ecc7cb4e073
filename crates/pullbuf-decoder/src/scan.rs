use pullbuf_wire::PullSource;

use crate::error::SourceError;
use crate::source::BufferedSource;

/// Membership table for [`BufferedSource::index_of_element`].
struct ByteSet([bool; 256]);

impl ByteSet {
  fn new(targets: &[u8]) -> Self {
    let mut table = [false; 256];
    for &b in targets {
      table[usize::from(b)] = true;
    }
    Self(table)
  }

  fn contains(&self, b: u8) -> bool {
    self.0[usize::from(b)]
  }
}

fn check_bounds(from: usize, to: usize) -> Result<(), SourceError> {
  if from > to {
    return Err(SourceError::invalid_argument(format!("from={from} to={to}")));
  }
  Ok(())
}

/// Pattern search.
///
/// Each search scans what is already buffered, then pulls one chunk at a
/// time and resumes where the previous pass stopped, so bytes examined in
/// an earlier pass are not examined again:
///
/// ```text
///   pass 1:  [from ............ len₀)
///   pull  ─▶                         [len₀ ........ len₁)
///   pass 2:                    [len₀ - (n-1) ....... len₁)
///                               └─ room for a match of length n
///                                  that straddles the refill
/// ```
///
/// All results are offsets from the current read position.
impl<S: PullSource> BufferedSource<S> {
  /// Offset of the first `byte`, pulling until found or end of input.
  ///
  /// # Errors
  ///
  /// [`SourceError::Closed`] after close, or any pull failure.
  pub fn index_of(&mut self, byte: u8) -> Result<Option<usize>, SourceError> {
    self.index_of_in(byte, 0, usize::MAX)
  }

  /// Offset of the first `byte` at or after `from`.
  ///
  /// # Errors
  ///
  /// See [`index_of`](Self::index_of).
  pub fn index_of_from(&mut self, byte: u8, from: usize) -> Result<Option<usize>, SourceError> {
    self.index_of_in(byte, from, usize::MAX)
  }

  /// Offset of the first `byte` in `from..to`.
  ///
  /// Pulls no further than needed to cover `to`.
  ///
  /// # Errors
  ///
  /// [`SourceError::InvalidArgument`] if `from > to`, checked before any
  /// pull; [`SourceError::Closed`] after close; any pull failure.
  pub fn index_of_in(&mut self, byte: u8, from: usize, to: usize) -> Result<Option<usize>, SourceError> {
    check_bounds(from, to)?;
    self.check_open()?;

    let mut from = from;
    while from < to {
      if let Some(found) = self.buffer.index_of(byte, from, to) {
        return Ok(Some(found));
      }
      let scanned = self.buffer.len();
      if scanned >= to || !self.pull_chunk()? {
        return Ok(None);
      }
      from = from.max(scanned);
    }
    Ok(None)
  }

  /// Offset of the first occurrence of `pattern`.
  ///
  /// # Errors
  ///
  /// See [`index_of_bytes_in`](Self::index_of_bytes_in).
  pub fn index_of_bytes(&mut self, pattern: &[u8]) -> Result<Option<usize>, SourceError> {
    self.index_of_bytes_in(pattern, 0, usize::MAX)
  }

  /// Offset of the first occurrence of `pattern` starting at or after
  /// `from`.
  ///
  /// # Errors
  ///
  /// See [`index_of_bytes_in`](Self::index_of_bytes_in).
  pub fn index_of_bytes_from(&mut self, pattern: &[u8], from: usize) -> Result<Option<usize>, SourceError> {
    self.index_of_bytes_in(pattern, from, usize::MAX)
  }

  /// Offset of the first occurrence of `pattern` whose first byte lies in
  /// `from..to`.
  ///
  /// The match itself may extend past `to`.
  ///
  /// # Errors
  ///
  /// [`SourceError::InvalidArgument`] if `pattern` is empty or
  /// `from > to`; [`SourceError::Closed`] after close; any pull failure.
  pub fn index_of_bytes_in(
    &mut self,
    pattern: &[u8],
    from: usize,
    to: usize,
  ) -> Result<Option<usize>, SourceError> {
    if pattern.is_empty() {
      return Err(SourceError::invalid_argument("pattern is empty"));
    }
    check_bounds(from, to)?;
    self.check_open()?;

    let mut from = from;
    loop {
      if let Some(found) = self.buffer.index_of_bytes(pattern, from, to) {
        return Ok(Some(found));
      }
      // Every start below this has now been ruled out.
      let next_start = (self.buffer.len() + 1).saturating_sub(pattern.len());
      if next_start >= to || !self.pull_chunk()? {
        return Ok(None);
      }
      from = from.max(next_start);
    }
  }

  /// Offset of the first byte that is any of `targets`.
  ///
  /// # Errors
  ///
  /// [`SourceError::Closed`] after close, or any pull failure.
  pub fn index_of_element(&mut self, targets: &[u8]) -> Result<Option<usize>, SourceError> {
    self.index_of_element_from(targets, 0)
  }

  /// Offset of the first byte at or after `from` that is any of `targets`.
  ///
  /// Ties are impossible: the leftmost position wins regardless of which
  /// target matched. An empty `targets` drains the source and returns
  /// `None`.
  ///
  /// # Errors
  ///
  /// [`SourceError::Closed`] after close, or any pull failure.
  pub fn index_of_element_from(&mut self, targets: &[u8], from: usize) -> Result<Option<usize>, SourceError> {
    self.check_open()?;
    let set = ByteSet::new(targets);

    let mut from = from;
    loop {
      if let Some(found) = self.buffer.position(from, usize::MAX, |b| set.contains(b)) {
        return Ok(Some(found));
      }
      let scanned = self.buffer.len();
      if !self.pull_chunk()? {
        return Ok(None);
      }
      from = from.max(scanned);
    }
  }
}
