use std::io::{self, Write};

use crate::buffer::SegmentedBuffer;
use crate::error::WireError;

/// The write-side mirror of [`PullSource`](crate::PullSource): accepts
/// bytes taken from the head of a [`SegmentedBuffer`].
pub trait Sink {
    /// Remove exactly `byte_count` bytes from the head of `source` and
    /// accept them.
    ///
    /// # Errors
    ///
    /// [`io::ErrorKind::UnexpectedEof`] if `source` holds fewer than
    /// `byte_count` bytes, or any failure of the underlying transport.
    fn write(&mut self, source: &mut SegmentedBuffer, byte_count: usize) -> io::Result<()>;

    /// Push buffered bytes to the final destination.
    ///
    /// # Errors
    ///
    /// Any failure of the underlying transport.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Flush and release the underlying transport.
    ///
    /// # Errors
    ///
    /// Any failure of the underlying transport.
    fn close(&mut self) -> io::Result<()> {
        self.flush()
    }
}

impl<K: Sink + ?Sized> Sink for &mut K {
    fn write(&mut self, source: &mut SegmentedBuffer, byte_count: usize) -> io::Result<()> {
        (**self).write(source, byte_count)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

/// An in-memory buffer accepts bytes by taking over their segments.
impl Sink for SegmentedBuffer {
    fn write(&mut self, source: &mut SegmentedBuffer, byte_count: usize) -> io::Result<()> {
        source.transfer_to(self, byte_count).map_err(io::Error::from)
    }
}

/// Adapts any [`std::io::Write`] into a [`Sink`].
#[derive(Debug)]
pub struct WriterSink<W> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    #[must_use]
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Sink for WriterSink<W> {
    fn write(&mut self, source: &mut SegmentedBuffer, byte_count: usize) -> io::Result<()> {
        if byte_count > source.len() {
            return Err(WireError::UnexpectedEof {
                requested: byte_count,
                available: source.len(),
            }
            .into());
        }
        let mut remaining = byte_count;
        while remaining > 0 {
            let head = source.head_slice();
            let n = head.len().min(remaining);
            self.writer.write_all(&head[..n])?;
            source.discard(n);
            remaining -= n;
        }
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SEGMENT_SIZE;

    #[test]
    fn writer_sink_takes_exact_count() {
        let mut source = SegmentedBuffer::new();
        source.write(&vec![b'x'; SEGMENT_SIZE + 4]);
        let mut sink = WriterSink::new(Vec::new());
        sink.write(&mut source, SEGMENT_SIZE + 1).unwrap();
        assert_eq!(sink.get_ref().len(), SEGMENT_SIZE + 1);
        assert_eq!(source.len(), 3);
    }

    #[test]
    fn writer_sink_rejects_overdraw() {
        let mut source = SegmentedBuffer::new();
        source.write(b"ab");
        let mut sink = WriterSink::new(Vec::new());
        let err = sink.write(&mut source, 3).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        assert_eq!(source.len(), 2);
        assert!(sink.into_inner().is_empty());
    }

    #[test]
    fn buffer_sink_moves_bytes() {
        let mut source = SegmentedBuffer::new();
        source.write(b"hello");
        let mut sink = SegmentedBuffer::new();
        Sink::write(&mut sink, &mut source, 5).unwrap();
        assert!(source.is_empty());
        assert_eq!(sink.read_vec(5).unwrap(), b"hello");
    }
}
