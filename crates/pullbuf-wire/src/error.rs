use std::io;

/// Errors raised by the segmented buffer and its adapters.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// An exact-count operation asked for more bytes than are buffered.
    #[error("unexpected end of buffer: requested {requested} bytes, {available} available")]
    UnexpectedEof { requested: usize, available: usize },

    /// I/O error from a reader or writer adapter.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<WireError> for io::Error {
    fn from(err: WireError) -> Self {
        match err {
            WireError::Io(e) => e,
            eof @ WireError::UnexpectedEof { .. } => io::Error::new(io::ErrorKind::UnexpectedEof, eof),
        }
    }
}
