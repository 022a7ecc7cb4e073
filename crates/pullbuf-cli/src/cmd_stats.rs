/// Implementation of `pullbuf stats`.
///
/// Decodes the input one code point at a time and reports:
///
/// ```text
/// Bytes:        1024
/// Lines:        32
/// Code points:  1003
/// Malformed:    0
/// ```
///
/// `Lines` counts `\n` bytes. `Malformed` counts code points decoded as
/// U+FFFD from invalid UTF-8, including a truncated sequence at the end of
/// the input. With `--json` the same report is printed as one JSON object.
use std::io::{self, Write};

use anyhow::{Context, Result};
use pullbuf_decoder::{BufferedSource, PullSource, SourceConfig};
use serde::Serialize;

use crate::StatsArgs;
use crate::input;

/// Counts gathered in a single pass over the input.
#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub bytes: u64,
    pub lines: u64,
    pub code_points: u64,
    pub malformed: u64,
}

/// Run the `pullbuf stats` command.
///
/// # Errors
///
/// Returns an error if the input cannot be read.
pub fn run(args: &StatsArgs, config: SourceConfig) -> Result<()> {
    let file = args.file.as_deref();
    let mut source = input::open(file, config)?;
    let stats = collect(&mut source).with_context(|| format!("failed reading {}", input::name(file)))?;
    source.close()?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.json {
        serde_json::to_writer(&mut out, &stats)?;
        writeln!(out)?;
    } else {
        writeln!(out, "Bytes:        {}", stats.bytes)?;
        writeln!(out, "Lines:        {}", stats.lines)?;
        writeln!(out, "Code points:  {}", stats.code_points)?;
        writeln!(out, "Malformed:    {}", stats.malformed)?;
    }
    Ok(())
}

/// U+FFFD as it appears in well-formed input.
const ENCODED_REPLACEMENT: &[u8] = b"\xef\xbf\xbd";

/// Consume `source` to end of input, counting as it goes.
pub fn collect<S: PullSource>(source: &mut BufferedSource<S>) -> Result<Stats> {
    let mut stats = Stats::default();
    while !source.exhausted()? {
        // A code point never spans more than 4 bytes, so once 4 are
        // buffered (or the input ends) decoding pulls nothing more.
        source.request(4)?;
        let before = source.buffer().len();
        let literal_replacement = source.buffer().range_equals(0, ENCODED_REPLACEMENT);
        match source.read_utf8_code_point() {
            Ok(c) => {
                stats.bytes += (before - source.buffer().len()) as u64;
                stats.code_points += 1;
                if c == '\n' {
                    stats.lines += 1;
                } else if c == char::REPLACEMENT_CHARACTER && !literal_replacement {
                    stats.malformed += 1;
                }
            }
            Err(e) if e.is_end_of_input() => {
                // Truncated sequence at the end of the input.
                stats.bytes += before as u64;
                stats.code_points += 1;
                stats.malformed += 1;
                source.skip(before)?;
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(stats)
}
