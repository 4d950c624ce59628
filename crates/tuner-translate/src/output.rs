//! Output file handling: backups, resume line counting, durable appends.

use crate::error::TranslateResult;
use chrono::{DateTime, Local};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// `<output>.backup_<YYYYmmdd_HHMMSS>`, with a numeric suffix if that name is taken.
pub fn backup_path(output: &Path, now: DateTime<Local>) -> PathBuf {
    let file_name = output.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let base = format!("{}.backup_{}", file_name, now.format("%Y%m%d_%H%M%S"));

    let mut candidate = output.with_file_name(&base);
    let mut n = 1;
    while candidate.exists() {
        candidate = output.with_file_name(format!("{base}_{n}"));
        n += 1;
    }
    candidate
}

/// Move an existing output aside so a fresh run never destroys it.
pub fn backup_existing(output: &Path) -> TranslateResult<PathBuf> {
    let backup = backup_path(output, Local::now());
    std::fs::rename(output, &backup)?;
    warn!(output = %output.display(), backup = %backup.display(), "output exists, moved to backup");
    Ok(backup)
}

/// Count the complete lines of an existing output.
///
/// A trailing unterminated line (left by a crash mid-write) is truncated first.
pub fn complete_lines(output: &Path) -> TranslateResult<usize> {
    let bytes = std::fs::read(output)?;
    let complete_len = bytes.iter().rposition(|&b| b == b'\n').map_or(0, |i| i + 1);

    if complete_len < bytes.len() {
        warn!(
            output = %output.display(),
            dropped_bytes = bytes.len() - complete_len,
            "truncating partial trailing line"
        );
        let file = OpenOptions::new().write(true).open(output)?;
        file.set_len(complete_len as u64)?;
        file.sync_data()?;
    }

    Ok(bytes[..complete_len].iter().filter(|&&b| b == b'\n').count())
}

/// Line-oriented output that reaches the disk after every batch.
pub struct OutputWriter {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl OutputWriter {
    /// Create (or truncate) `path`.
    pub fn create(path: &Path) -> TranslateResult<Self> {
        let file = File::create(path)?;
        Ok(Self { path: path.to_path_buf(), writer: BufWriter::new(file) })
    }

    /// Open `path` for appending after the lines already in it.
    pub fn append(path: &Path) -> TranslateResult<Self> {
        let file = OpenOptions::new().append(true).open(path)?;
        info!(output = %path.display(), "appending to existing output");
        Ok(Self { path: path.to_path_buf(), writer: BufWriter::new(file) })
    }

    /// Write one line per entry, then flush and sync.
    pub fn write_batch(&mut self, lines: &[String]) -> TranslateResult<()> {
        for line in lines {
            self.writer.write_all(line.as_bytes())?;
            self.writer.write_all(b"\n")?;
        }
        self.writer.flush()?;
        self.writer.get_ref().sync_data()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
