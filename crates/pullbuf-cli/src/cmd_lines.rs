/// Implementation of `pullbuf lines`.
///
/// Lines end at `\n` or `\r\n`; the terminator is not printed. Without
/// `--strict-limit` a final unterminated line is printed like any other.
/// With it, every line must be terminated within the limit and the command
/// fails at the first line that is not:
///
/// ```text
/// $ printf 'ok\ntoo long\n' | pullbuf lines --strict-limit 4
/// ok
/// error: line 2 of <stdin>: \n not found: limit=4 content=746f6f206c6f6e670a…
/// ```
use std::io::{self, Write};

use anyhow::{Context, Result};
use pullbuf_decoder::{BufferedSource, PullSource, SourceConfig};

use crate::LinesArgs;
use crate::input;

/// Run the `pullbuf lines` command.
///
/// # Errors
///
/// Returns an error if the input cannot be read, a strict line is missing
/// its terminator, or stdout is closed.
pub fn run(args: &LinesArgs, config: SourceConfig) -> Result<()> {
    let file = args.file.as_deref();
    let mut source = input::open(file, config)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    print_lines(&mut source, args.strict_limit, args.number, &mut out)
        .with_context(|| format!("failed reading {}", input::name(file)))?;
    source.close()?;
    Ok(())
}

/// Print every line of `source` to `out`, returning the line count.
pub fn print_lines<S: PullSource, W: Write>(
    source: &mut BufferedSource<S>,
    strict_limit: Option<usize>,
    number: bool,
    out: &mut W,
) -> Result<usize> {
    let mut count = 0;
    loop {
        let line = match strict_limit {
            Some(limit) => {
                if source.exhausted()? {
                    break;
                }
                source
                    .read_utf8_line_strict_limit(limit)
                    .with_context(|| format!("line {}", count + 1))?
            }
            None => match source.read_utf8_line()? {
                Some(line) => line,
                None => break,
            },
        };
        count += 1;
        if number {
            writeln!(out, "{count:>6}\t{line}")?;
        } else {
            writeln!(out, "{line}")?;
        }
    }
    Ok(count)
}
