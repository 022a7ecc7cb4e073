/// Implementation of `pullbuf find`.
///
/// Prints the absolute offset of the first match (or of every match with
/// `--all`), one per line. The search runs over windows of one chunk;
/// a window without a match is discarded except for its last
/// `pattern.len() - 1` bytes, so memory use stays bounded by about two
/// chunks plus the pattern length whatever the input size.
///
/// ```text
/// $ printf 'abcXYZdefXYZ' | pullbuf find XYZ --all
/// 3
/// 9
/// ```
///
/// Exits with code 1 when the pattern does not occur.
use std::io::{self, Write};

use anyhow::{Context, Result, bail};
use log::debug;
use pullbuf_decoder::{BufferedSource, PullSource, SourceConfig};

use crate::FindArgs;
use crate::input;

/// Run the `pullbuf find` command.
///
/// # Errors
///
/// Returns an error if the pattern is empty or not valid hex, the input
/// cannot be read, or the pattern is not found.
pub fn run(args: &FindArgs, config: SourceConfig) -> Result<()> {
    let pattern = if args.hex {
        hex::decode(&args.pattern).with_context(|| format!("invalid hex pattern {:?}", args.pattern))?
    } else {
        args.pattern.as_bytes().to_vec()
    };
    if pattern.is_empty() {
        bail!("pattern is empty");
    }

    let file = args.file.as_deref();
    let mut source = input::open(file, config)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let found = find_offsets(&mut source, &pattern, args.all, &mut out)
        .with_context(|| format!("failed reading {}", input::name(file)))?;
    source.close()?;

    if found == 0 {
        bail!("pattern not found in {}", input::name(file));
    }
    Ok(())
}

/// Write the offset of each match to `out`, returning the match count.
pub fn find_offsets<S: PullSource, W: Write>(
    source: &mut BufferedSource<S>,
    pattern: &[u8],
    all: bool,
    out: &mut W,
) -> Result<usize> {
    let window = source.config().effective_chunk_size().max(pattern.len());
    let mut base: u64 = 0;
    let mut found = 0;
    loop {
        let Some(offset) = source.index_of_bytes_in(pattern, 0, window)? else {
            // No match starts inside the window.
            let discarded = window.min(source.buffer().len());
            source.skip(discarded)?;
            base += discarded as u64;
            if source.exhausted()? {
                break;
            }
            continue;
        };
        found += 1;
        let absolute = base + offset as u64;
        writeln!(out, "{absolute}")?;
        if !all {
            break;
        }
        // Resume one byte past the match start so overlapping matches count.
        source.skip(offset + 1)?;
        base = absolute + 1;
    }
    debug!("{found} matches");
    Ok(found)
}
