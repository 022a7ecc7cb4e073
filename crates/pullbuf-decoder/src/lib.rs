#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod peek;
pub mod reader;
pub mod select;
pub mod source;

mod binary;
mod numeric;
mod scan;
mod structural;
mod text;

#[cfg(test)]
mod testing;

pub use config::SourceConfig;
pub use error::SourceError;
pub use peek::PeekSource;
pub use reader::SourceReader;
pub use select::{Options, TypedOptions};
pub use source::BufferedSource;

pub use pullbuf_wire::{PullSource, ReaderSource, SegmentPool, SegmentedBuffer, Sink, WriterSink};
