use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::config::OutputFormat;
use crate::errors::{ExtractError, ExtractResult};
use crate::results::ResultSet;

/// Serializes `numbers` into any writer
pub fn write_to<W: Write>(
    numbers: &ResultSet,
    writer: &mut W,
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Lines => {
            for number in numbers {
                writeln!(writer, "{}", number)?;
            }
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *writer, numbers)?;
            writeln!(writer)?;
        }
    }
    writer.flush()
}

/// Writes results to `destination`, or standard output when it is `None`.
///
/// A file is written to a temporary sibling first and renamed over the
/// destination once complete, so a failed write never leaves a partial file.
pub fn write_results(
    numbers: &ResultSet,
    destination: Option<&Path>,
    format: OutputFormat,
) -> ExtractResult<()> {
    match destination {
        Some(path) => write_file(numbers, path, format),
        None => {
            let stdout = io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            write_to(numbers, &mut writer, format)?;
            debug!("Wrote {} numbers to stdout", numbers.len());
            Ok(())
        }
    }
}

fn write_file(numbers: &ResultSet, path: &Path, format: OutputFormat) -> ExtractResult<()> {
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    if !parent.is_dir() {
        fs::create_dir_all(parent).map_err(|e| ExtractError::output_write(path, e))?;
    }

    let temp = NamedTempFile::new_in(parent).map_err(|e| ExtractError::output_write(path, e))?;
    {
        let mut writer = BufWriter::new(temp.as_file());
        write_to(numbers, &mut writer, format).map_err(|e| ExtractError::output_write(path, e))?;
    }
    temp.persist(path)
        .map_err(|e| ExtractError::output_write(path, e.error))?;

    info!("Wrote {} numbers to {}", numbers.len(), path.display());
    Ok(())
}
