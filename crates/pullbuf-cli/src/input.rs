/// Opening the command input as a `BufferedSource`.
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use anyhow::{Context, Result};
use log::debug;
use pullbuf_decoder::{BufferedSource, ReaderSource, SourceConfig};

/// A buffered source over a file or stdin.
pub type Input = BufferedSource<ReaderSource<Box<dyn Read>>>;

/// Open `file`, or stdin when it is `None` or `-`.
///
/// # Errors
///
/// Returns an error if the file cannot be opened.
pub fn open(file: Option<&Path>, config: SourceConfig) -> Result<Input> {
    let reader: Box<dyn Read> = match file {
        Some(path) if path != Path::new("-") => {
            debug!("reading {}", path.display());
            Box::new(File::open(path).with_context(|| format!("cannot open {}", path.display()))?)
        }
        _ => {
            debug!("reading stdin");
            Box::new(io::stdin().lock())
        }
    };
    Ok(BufferedSource::with_config(ReaderSource::new(reader), config))
}

/// Label for `file` in error messages.
pub fn name(file: Option<&Path>) -> String {
    match file {
        Some(path) if path != Path::new("-") => path.display().to_string(),
        _ => "<stdin>".to_string(),
    }
}
