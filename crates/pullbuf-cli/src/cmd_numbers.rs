/// Implementation of `pullbuf numbers`.
///
/// Reads ASCII integers separated by spaces, tabs, newlines, or commas and
/// prints each one in decimal on its own line. With `--hex` the numerals
/// are unsigned hexadecimal (`ff`, `7FE0`) instead of signed decimal.
///
/// ```text
/// $ echo '1, -2, 30' | pullbuf numbers
/// 1
/// -2
/// 30
/// ```
use std::io::{self, Write};

use anyhow::{Context, Result};
use pullbuf_decoder::{BufferedSource, PullSource, SourceConfig};

use crate::NumbersArgs;
use crate::input;

const SEPARATORS: &[u8] = b" \t\r\n,";

/// Run the `pullbuf numbers` command.
///
/// # Errors
///
/// Returns an error if the input cannot be read or holds a malformed or
/// out-of-range numeral.
pub fn run(args: &NumbersArgs, config: SourceConfig) -> Result<()> {
    let file = args.file.as_deref();
    let mut source = input::open(file, config)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    print_numbers(&mut source, args.hex, &mut out)
        .with_context(|| format!("failed reading {}", input::name(file)))?;
    source.close()?;
    Ok(())
}

/// Decode every numeral in `source`, returning how many were printed.
pub fn print_numbers<S: PullSource, W: Write>(
    source: &mut BufferedSource<S>,
    hex: bool,
    out: &mut W,
) -> Result<usize> {
    let mut count = 0;
    while !source.exhausted()? {
        if source.buffer().get(0).is_some_and(|b| SEPARATORS.contains(&b)) {
            source.skip(1)?;
            continue;
        }
        count += 1;
        if hex {
            let value = source
                .read_hexadecimal_unsigned_long()
                .with_context(|| format!("numeral {count}"))?;
            writeln!(out, "{value}")?;
        } else {
            let value = source
                .read_decimal_long()
                .with_context(|| format!("numeral {count}"))?;
            writeln!(out, "{value}")?;
        }
    }
    Ok(count)
}
