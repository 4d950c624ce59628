//! Result of translating one batch.

const ERROR_PREFIX: &str = "[ERROR: ";

/// Placeholder written in place of a line whose batch failed.
pub fn error_marker(line: &str) -> String {
    format!("{ERROR_PREFIX}{line}]")
}

/// Whether `line` is an error placeholder.
pub fn is_error_marker(line: &str) -> bool {
    line.starts_with(ERROR_PREFIX) && line.ends_with(']')
}

/// Output lines for one batch: all translations or all placeholders, never a mix.
///
/// Either way there is exactly one line per input line of the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    Translated(Vec<String>),
    Failed { placeholders: Vec<String>, reason: String },
}

impl BatchOutcome {
    /// Placeholders for every line of `batch`.
    pub fn failed(batch: &[String], reason: impl Into<String>) -> Self {
        Self::Failed { placeholders: batch.iter().map(|line| error_marker(line)).collect(), reason: reason.into() }
    }

    pub fn lines(&self) -> &[String] {
        match self {
            Self::Translated(lines) => lines,
            Self::Failed { placeholders, .. } => placeholders,
        }
    }

    pub fn len(&self) -> usize {
        self.lines().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines().is_empty()
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            Self::Translated(_) => None,
            Self::Failed { reason, .. } => Some(reason),
        }
    }
}
