//! Pull sources with scripted behaviour for the integration tests and
//! benchmarks.
//!
//! | Source          | Behaviour                                               |
//! |-----------------|---------------------------------------------------------|
//! | `ChunkedSource` | hands out fixed data at most `chunk` bytes per pull     |
//! | `FailingSource` | hands out a prefix, then fails every pull               |

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use pullbuf_wire::{PullSource, SegmentedBuffer};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Pull and close counts, shared with the test that built the source.
#[derive(Clone, Debug, Default)]
pub struct Counters {
    pulls: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
}

impl Counters {
    #[must_use]
    pub fn pulls(&self) -> usize {
        self.pulls.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::Relaxed)
    }
}

/// Serves `data` in pieces of at most `chunk` bytes, then end of input.
#[derive(Debug)]
pub struct ChunkedSource {
    data: Vec<u8>,
    pos: usize,
    chunk: usize,
    counters: Counters,
}

impl ChunkedSource {
    /// # Panics
    ///
    /// Panics if `chunk` is zero.
    pub fn new(data: impl Into<Vec<u8>>, chunk: usize) -> Self {
        assert!(chunk > 0, "chunk must be positive");
        Self {
            data: data.into(),
            pos: 0,
            chunk,
            counters: Counters::default(),
        }
    }

    #[must_use]
    pub fn counters(&self) -> Counters {
        self.counters.clone()
    }

    /// Bytes not yet handed out.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
}

impl PullSource for ChunkedSource {
    fn pull(&mut self, sink: &mut SegmentedBuffer, max: usize) -> io::Result<Option<usize>> {
        self.counters.pulls.fetch_add(1, Ordering::Relaxed);
        if self.pos == self.data.len() {
            return Ok(None);
        }
        let n = max.min(self.chunk).min(self.data.len() - self.pos);
        sink.write(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(Some(n))
    }

    fn close(&mut self) -> io::Result<()> {
        self.counters.closes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Serves `prefix`, then fails every pull with `kind`.
#[derive(Debug)]
pub struct FailingSource {
    prefix: Vec<u8>,
    pos: usize,
    kind: io::ErrorKind,
}

impl FailingSource {
    pub fn new(prefix: impl Into<Vec<u8>>, kind: io::ErrorKind) -> Self {
        Self {
            prefix: prefix.into(),
            pos: 0,
            kind,
        }
    }
}

impl PullSource for FailingSource {
    fn pull(&mut self, sink: &mut SegmentedBuffer, max: usize) -> io::Result<Option<usize>> {
        if self.pos == self.prefix.len() {
            return Err(io::Error::new(self.kind, "scripted failure"));
        }
        let n = max.min(self.prefix.len() - self.pos);
        sink.write(&self.prefix[self.pos..self.pos + n]);
        self.pos += n;
        Ok(Some(n))
    }
}

/// Reproducible random bytes drawn from `alphabet`.
#[must_use]
pub fn random_bytes(len: usize, alphabet: &[u8], seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| alphabet[rng.random_range(0..alphabet.len())]).collect()
}

/// Map arbitrary bytes onto `alphabet`, so that generated inputs repeat
/// often enough to contain matches.
#[must_use]
pub fn over_alphabet(raw: &[u8], alphabet: &[u8]) -> Vec<u8> {
    raw.iter().map(|&b| alphabet[usize::from(b) % alphabet.len()]).collect()
}
