use std::io;

use pullbuf_wire::WireError;

/// Errors surfaced by [`BufferedSource`](crate::BufferedSource) operations.
///
/// ```text
///   SourceError
///   ├── InvalidArgument     ← bad range or empty pattern; checked before any pull
///   ├── EndOfInput          ← source ended before the request was satisfied
///   ├── LineNotFound        ← strict line read found no '\n' within the limit
///   ├── MalformedNumber     ← no digits, or a decimal outside i64
///   ├── Closed              ← operation after close()
///   ├── Wire(WireError)     ← segmented buffer refused an exact-count operation
///   └── Io(std::io::Error)  ← pull source or sink failure, passed through as-is
/// ```
///
/// `EndOfInput` and `LineNotFound` form the end-of-input family; use
/// [`is_end_of_input`](Self::is_end_of_input) to test for either.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
  /// An argument was out of range. Nothing was pulled or consumed.
  #[error("invalid argument: {reason}")]
  InvalidArgument { reason: String },

  /// The source reached end of input before `requested` bytes were
  /// buffered. Bytes already pulled stay buffered.
  #[error("unexpected end of input: requested {requested} bytes, {available} available")]
  EndOfInput { requested: usize, available: usize },

  /// No line terminator within `limit` bytes. `content` is the hex of up
  /// to the first 32 buffered bytes.
  #[error("\\n not found: limit={limit} content={content}…")]
  LineNotFound { limit: usize, content: String },

  /// ASCII numeral could not be decoded.
  #[error("malformed number: {reason}")]
  MalformedNumber { reason: String },

  /// The source was closed.
  #[error("closed")]
  Closed,

  #[error(transparent)]
  Wire(#[from] WireError),

  #[error(transparent)]
  Io(#[from] io::Error),
}

impl SourceError {
  /// Whether this error means the stream ended too early.
  #[must_use]
  pub fn is_end_of_input(&self) -> bool {
    matches!(
      self,
      Self::EndOfInput { .. } | Self::LineNotFound { .. } | Self::Wire(WireError::UnexpectedEof { .. })
    )
  }

  pub(crate) fn invalid_argument(reason: impl Into<String>) -> Self {
    Self::InvalidArgument {
      reason: reason.into(),
    }
  }

  pub(crate) fn malformed_number(reason: impl Into<String>) -> Self {
    Self::MalformedNumber {
      reason: reason.into(),
    }
  }

  /// Convert an error returned by a pull source.
  ///
  /// A peek cursor's source reports its parent's failures through
  /// `io::Error`; those are unwrapped back into the original variant so a
  /// closed parent still reads as [`SourceError::Closed`]. Every other I/O
  /// error is kept unchanged.
  pub(crate) fn from_pull(err: io::Error) -> Self {
    if !err.get_ref().is_some_and(|inner| inner.is::<SourceError>()) {
      return Self::Io(err);
    }
    let kind = err.kind();
    match err.into_inner().map(|inner| inner.downcast::<SourceError>()) {
      Some(Ok(original)) => *original,
      Some(Err(other)) => Self::Io(io::Error::new(kind, other)),
      None => Self::Io(io::Error::from(kind)),
    }
  }

  fn io_kind(&self) -> io::ErrorKind {
    match self {
      Self::InvalidArgument { .. } => io::ErrorKind::InvalidInput,
      Self::EndOfInput { .. } | Self::LineNotFound { .. } => io::ErrorKind::UnexpectedEof,
      Self::MalformedNumber { .. } => io::ErrorKind::InvalidData,
      Self::Closed => io::ErrorKind::Other,
      Self::Wire(WireError::UnexpectedEof { .. }) => io::ErrorKind::UnexpectedEof,
      Self::Wire(WireError::Io(e)) | Self::Io(e) => e.kind(),
    }
  }
}

impl From<SourceError> for io::Error {
  fn from(err: SourceError) -> Self {
    match err {
      SourceError::Io(e) | SourceError::Wire(WireError::Io(e)) => e,
      other => io::Error::new(other.io_kind(), other),
    }
  }
}
