use std::io::{self, Read};

use log::trace;

use crate::buffer::SegmentedBuffer;

/// A one-shot producer of bytes.
///
/// Each call to [`pull`](Self::pull) appends bytes to the tail of `sink`
/// and may block the calling thread for as long as the underlying transport
/// needs. Timeouts and cancellation are the implementation's business.
///
/// | Return value     | Meaning                                        |
/// |------------------|------------------------------------------------|
/// | `Ok(Some(n))`    | `n` bytes appended (`n >= 1` when `max >= 1`)  |
/// | `Ok(None)`       | end of input: no more bytes, ever              |
/// | `Err(e)`         | transport failure, propagated unchanged        |
pub trait PullSource {
    /// Append at most `max` bytes to `sink`.
    ///
    /// # Errors
    ///
    /// Any I/O failure of the underlying transport.
    fn pull(&mut self, sink: &mut SegmentedBuffer, max: usize) -> io::Result<Option<usize>>;

    /// Release the underlying transport.
    ///
    /// # Errors
    ///
    /// Any failure reported while releasing the transport.
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<S: PullSource + ?Sized> PullSource for &mut S {
    fn pull(&mut self, sink: &mut SegmentedBuffer, max: usize) -> io::Result<Option<usize>> {
        (**self).pull(sink, max)
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

impl<S: PullSource + ?Sized> PullSource for Box<S> {
    fn pull(&mut self, sink: &mut SegmentedBuffer, max: usize) -> io::Result<Option<usize>> {
        (**self).pull(sink, max)
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

/// An in-memory buffer is a source that drains itself.
impl PullSource for SegmentedBuffer {
    fn pull(&mut self, sink: &mut SegmentedBuffer, max: usize) -> io::Result<Option<usize>> {
        if self.is_empty() {
            return Ok(None);
        }
        let n = max.min(self.len());
        self.transfer_to(sink, n)?;
        Ok(Some(n))
    }
}

/// Adapts any [`std::io::Read`] into a [`PullSource`].
///
/// Bytes are read straight into the sink's tail segment. A read of zero
/// bytes is end of input; `Interrupted` reads are retried.
#[derive(Debug)]
pub struct ReaderSource<R> {
    reader: R,
}

impl<R: Read> ReaderSource<R> {
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    #[must_use]
    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> PullSource for ReaderSource<R> {
    fn pull(&mut self, sink: &mut SegmentedBuffer, max: usize) -> io::Result<Option<usize>> {
        if max == 0 {
            return Ok(Some(0));
        }
        loop {
            match sink.write_with(max, |window| self.reader.read(window)) {
                Ok(0) => return Ok(None),
                Ok(n) => return Ok(Some(n)),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                    trace!("reader interrupted, retrying pull");
                }
                Err(e) => return Err(e),
            }
        }
    }
}
