//! Scripted pull source for unit tests.

use std::cell::Cell;
use std::io;
use std::rc::Rc;

use pullbuf_wire::{PullSource, SegmentedBuffer};

/// Counters shared between a [`Scripted`] source and the test that built it.
#[derive(Clone, Default)]
pub(crate) struct Counters {
  pub pulls: Rc<Cell<usize>>,
  pub closes: Rc<Cell<usize>>,
}

/// Hands out `data` in slices of at most `step` bytes per pull, then END.
pub(crate) struct Scripted {
  data: Vec<u8>,
  pos: usize,
  step: usize,
  counters: Counters,
  fail_close: bool,
}

impl Scripted {
  pub fn new(data: impl AsRef<[u8]>, step: usize) -> Self {
    Self {
      data: data.as_ref().to_vec(),
      pos: 0,
      step,
      counters: Counters::default(),
      fail_close: false,
    }
  }

  pub fn failing_close(mut self) -> Self {
    self.fail_close = true;
    self
  }

  pub fn counters(&self) -> Counters {
    self.counters.clone()
  }
}

impl PullSource for Scripted {
  fn pull(&mut self, sink: &mut SegmentedBuffer, max: usize) -> io::Result<Option<usize>> {
    self.counters.pulls.set(self.counters.pulls.get() + 1);
    if self.pos == self.data.len() {
      return Ok(None);
    }
    let n = max.min(self.step).min(self.data.len() - self.pos);
    sink.write(&self.data[self.pos..self.pos + n]);
    self.pos += n;
    Ok(Some(n))
  }

  fn close(&mut self) -> io::Result<()> {
    self.counters.closes.set(self.counters.closes.get() + 1);
    if self.fail_close {
      return Err(io::Error::new(io::ErrorKind::BrokenPipe, "close failed"));
    }
    Ok(())
  }
}

/// Fails every pull with the given error kind.
pub(crate) struct Failing(pub io::ErrorKind);

impl PullSource for Failing {
  fn pull(&mut self, _: &mut SegmentedBuffer, _: usize) -> io::Result<Option<usize>> {
    Err(io::Error::new(self.0, "pull failed"))
  }
}
