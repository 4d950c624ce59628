//! Sidecar manifest that ties a resumable output to its input and translator.

use crate::error::{TranslateError, TranslateResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeManifest {
    pub translator_id: String,
    pub input: PathBuf,
    pub input_sha256: String,
    pub batch_size: usize,
    pub created_at: DateTime<Utc>,
}

/// `<output>.manifest.json`
pub fn manifest_path(output: &Path) -> PathBuf {
    let mut name = output.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".manifest.json");
    output.with_file_name(name)
}

pub fn sha256_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

impl ResumeManifest {
    pub fn new(translator_id: &str, input: &Path, input_sha256: String, batch_size: usize) -> Self {
        Self {
            translator_id: translator_id.to_string(),
            input: input.to_path_buf(),
            input_sha256,
            batch_size,
            created_at: Utc::now(),
        }
    }

    /// Load the manifest next to `output`, if there is one.
    pub fn load_for(output: &Path) -> TranslateResult<Option<Self>> {
        let path = manifest_path(output);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    pub fn write_for(&self, output: &Path) -> TranslateResult<()> {
        std::fs::write(manifest_path(output), serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Check that resuming `output` with `current` continues the same job.
    ///
    /// A different translator or input is fatal. A different batch size only
    /// changes where batch boundaries fall, so it is reported and allowed.
    pub fn verify(&self, current: &Self, output: &Path) -> TranslateResult<()> {
        let mismatch = |reason: String| TranslateError::ResumeMismatch { output: output.to_path_buf(), reason };

        if self.translator_id != current.translator_id {
            return Err(mismatch(format!(
                "output was produced by translator '{}', not '{}'",
                self.translator_id, current.translator_id
            )));
        }
        if self.input_sha256 != current.input_sha256 {
            return Err(mismatch(format!("input {} changed since the output was started", current.input.display())));
        }
        if self.batch_size != current.batch_size {
            warn!(
                previous = self.batch_size,
                current = current.batch_size,
                "resuming with a different batch size"
            );
        }
        Ok(())
    }
}
