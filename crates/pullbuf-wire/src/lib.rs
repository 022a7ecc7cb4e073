#![warn(clippy::pedantic)]

pub mod buffer;
pub mod error;
pub mod segment;
pub mod sink;
pub mod source;

pub use buffer::SegmentedBuffer;
pub use error::WireError;
pub use segment::{SEGMENT_SIZE, Segment, SegmentPool};
pub use sink::{Sink, WriterSink};
pub use source::{PullSource, ReaderSource};
