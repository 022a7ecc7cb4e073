use std::collections::HashSet;

use bytes::Bytes;
use pullbuf_wire::PullSource;

use crate::error::SourceError;
use crate::source::BufferedSource;

/// An ordered set of byte strings for [`BufferedSource::select`].
///
/// When several options are prefixes of the input, the one listed first
/// wins. List a longer option before its own prefix (`"ab"` before `"a"`)
/// to prefer the longer match.
#[derive(Debug, Clone)]
pub struct Options {
  entries: Vec<Bytes>,
}

impl Options {
  /// Build from byte strings in priority order.
  ///
  /// # Errors
  ///
  /// [`SourceError::InvalidArgument`] if the same byte string appears
  /// twice.
  pub fn new<I, B>(options: I) -> Result<Self, SourceError>
  where
    I: IntoIterator<Item = B>,
    B: AsRef<[u8]>,
  {
    let entries: Vec<Bytes> = options
      .into_iter()
      .map(|option| Bytes::copy_from_slice(option.as_ref()))
      .collect();
    let mut seen = HashSet::with_capacity(entries.len());
    for entry in &entries {
      if !seen.insert(entry) {
        return Err(SourceError::invalid_argument(format!(
          "duplicate option: {}",
          hex::encode(entry)
        )));
      }
    }
    Ok(Self { entries })
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// The byte string at `index`.
  #[must_use]
  pub fn get(&self, index: usize) -> Option<&Bytes> {
    self.entries.get(index)
  }

  /// Length of the longest option. A select never requests more bytes
  /// than this.
  #[must_use]
  pub fn max_len(&self) -> usize {
    self.entries.iter().map(Bytes::len).max().unwrap_or(0)
  }
}

/// [`Options`] that map each match back to a value.
#[derive(Debug, Clone)]
pub struct TypedOptions<T> {
  values: Vec<T>,
  options: Options,
}

impl<T> TypedOptions<T> {
  /// Build from `values`, encoding each with `encode`. Priority follows the
  /// order of `values`.
  ///
  /// # Errors
  ///
  /// [`SourceError::InvalidArgument`] if two values encode to the same
  /// bytes.
  pub fn new<F, B>(values: Vec<T>, encode: F) -> Result<Self, SourceError>
  where
    F: Fn(&T) -> B,
    B: AsRef<[u8]>,
  {
    let options = Options::new(values.iter().map(encode))?;
    Ok(Self { values, options })
  }

  #[must_use]
  pub fn options(&self) -> &Options {
    &self.options
  }

  #[must_use]
  pub fn values(&self) -> &[T] {
    &self.values
  }
}

impl<S: PullSource> BufferedSource<S> {
  /// Consume the first option that is a prefix of the input and return its
  /// index.
  ///
  /// Pulls only as far as the comparisons need. On a miss nothing is
  /// consumed and `None` is returned.
  ///
  /// # Errors
  ///
  /// [`SourceError::Closed`] after close, or any pull failure.
  pub fn select(&mut self, options: &Options) -> Result<Option<usize>, SourceError> {
    self.check_open()?;
    for (index, option) in options.entries.iter().enumerate() {
      if self.range_equals(0, option)? {
        self.buffer.skip(option.len())?;
        return Ok(Some(index));
      }
    }
    Ok(None)
  }

  /// Like [`select`](Self::select), returning the matched value.
  ///
  /// # Errors
  ///
  /// See [`select`](Self::select).
  pub fn select_typed<'o, T>(&mut self, options: &'o TypedOptions<T>) -> Result<Option<&'o T>, SourceError> {
    Ok(self.select(&options.options)?.and_then(|index| options.values.get(index)))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::Scripted;

  fn options(list: &[&str]) -> Options {
    Options::new(list.iter().map(|s| s.as_bytes())).unwrap()
  }

  #[test]
  fn first_listed_prefix_wins() {
    let mut src = BufferedSource::new(Scripted::new(b"abc", 1));
    assert_eq!(src.select(&options(&["a", "ab"])).unwrap(), Some(0));
    assert_eq!(src.read_utf8().unwrap(), "bc");

    let mut src = BufferedSource::new(Scripted::new(b"abc", 1));
    assert_eq!(src.select(&options(&["ab", "a"])).unwrap(), Some(0));
    assert_eq!(src.read_utf8().unwrap(), "c");
  }

  #[test]
  fn longer_option_falls_back_to_its_prefix() {
    let mut src = BufferedSource::new(Scripted::new(b"ax", 1));
    assert_eq!(src.select(&options(&["ab", "a"])).unwrap(), Some(1));
    assert_eq!(src.read_utf8().unwrap(), "x");
  }

  #[test]
  fn match_straddling_pulls() {
    let scripted = Scripted::new(b"GET /path", 2);
    let counters = scripted.counters();
    let mut src = BufferedSource::new(scripted);
    let methods = options(&["PUT ", "POST ", "GET "]);
    assert_eq!(src.select(&methods).unwrap(), Some(2));
    assert_eq!(counters.pulls.get(), 2);
    assert_eq!(src.read_utf8().unwrap(), "/path");
  }

  #[test]
  fn miss_consumes_nothing() {
    let mut src = BufferedSource::new(Scripted::new(b"HEAD /", 3));
    assert_eq!(src.select(&options(&["GET", "HEADER"])).unwrap(), None);
    assert_eq!(src.read_utf8().unwrap(), "HEAD /");
  }

  #[test]
  fn option_longer_than_input() {
    let mut src = BufferedSource::new(Scripted::new(b"ab", 1));
    assert_eq!(src.select(&options(&["abc"])).unwrap(), None);
    assert_eq!(src.buffer().len(), 2);
  }

  #[test]
  fn empty_option_matches_without_consuming() {
    let mut src = BufferedSource::new(Scripted::new(b"z", 1));
    assert_eq!(src.select(&options(&["y", ""])).unwrap(), Some(1));
    assert_eq!(src.read_byte().unwrap(), b'z');
    assert_eq!(src.select(&options(&[])).unwrap(), None);
  }

  #[test]
  fn duplicates_are_rejected() {
    let err = Options::new([b"a".as_slice(), b"b".as_slice(), b"a".as_slice()]).unwrap_err();
    assert_eq!(err.to_string(), "invalid argument: duplicate option: 61");
    let ok = options(&["", "ab", "abc"]);
    assert_eq!((ok.len(), ok.max_len()), (3, 3));
    assert_eq!(ok.get(1).map(|b| &b[..]), Some(&b"ab"[..]));
  }

  #[test]
  fn typed_select_returns_value() {
    #[derive(Debug, PartialEq)]
    enum Method {
      Get,
      Post,
    }
    let methods = TypedOptions::new(vec![Method::Get, Method::Post], |m| match m {
      Method::Get => "GET ",
      Method::Post => "POST ",
    })
    .unwrap();
    let mut src = BufferedSource::new(Scripted::new(b"POST /a GET /b", 4));
    assert_eq!(src.select_typed(&methods).unwrap(), Some(&Method::Post));
    src.skip(3).unwrap();
    assert_eq!(src.select_typed(&methods).unwrap(), Some(&Method::Get));
    assert_eq!(src.select_typed(&methods).unwrap(), None);
  }

  #[test]
  fn select_through_peek_leaves_parent_unread() {
    let mut src = BufferedSource::new(Scripted::new(b"GET /", 1));
    assert_eq!(src.peek().select(&options(&["GET"])).unwrap(), Some(0));
    assert_eq!(src.read_utf8().unwrap(), "GET /");
  }

  #[test]
  fn select_after_close_fails() {
    let mut src = BufferedSource::new(Scripted::new(b"a", 1));
    src.close().unwrap();
    assert!(matches!(src.select(&options(&["a"])), Err(SourceError::Closed)));
  }
}
