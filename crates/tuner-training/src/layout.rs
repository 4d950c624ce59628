use crate::config::TrainingConfig;
use crate::error::TrainingResult;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

/// Filesystem layout of one training run.
///
/// Runs live under `<runs_dir>/<name>_<YYYYmmdd_HHMMSS>/`, where `name` is the
/// configured experiment name or `tuner_<src>2<tgt>`.
#[derive(Debug, Clone)]
pub struct RunLayout {
    root: PathBuf,
}

impl RunLayout {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Layout for a fresh run of `config` started at `started_at`.
    #[must_use]
    pub fn for_config(config: &TrainingConfig, started_at: DateTime<Local>) -> Self {
        let name = config.experiment.name.clone().unwrap_or_else(|| format!("tuner_{}", config.data.direction()));
        let stamp = started_at.format("%Y%m%d_%H%M%S");
        Self::new(config.experiment.runs_dir.join(format!("{name}_{stamp}")))
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn best_model_dir(&self) -> PathBuf {
        self.root.join("best_model")
    }

    #[must_use]
    pub fn final_model_dir(&self) -> PathBuf {
        self.root.join("final_model")
    }

    #[must_use]
    pub fn record_path(&self) -> PathBuf {
        self.root.join("training_record.json")
    }

    #[must_use]
    pub fn tracking_dir(&self) -> PathBuf {
        self.root.join("tracking")
    }

    pub fn ensure_dirs(&self) -> TrainingResult<()> {
        std::fs::create_dir_all(&self.root)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_default_run_name() {
        let mut config = TrainingConfig::default();
        config.experiment.runs_dir = PathBuf::from("runs");
        config.model.display_name = Some("ignored-here".to_string());
        let started = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();

        let layout = RunLayout::for_config(&config, started);
        assert_eq!(layout.root(), Path::new("runs").join("tuner_es2agr_20240309_140507"));
        assert!(layout.best_model_dir().ends_with("best_model"));
        assert!(layout.final_model_dir().ends_with("final_model"));
    }

    #[test]
    fn test_named_run_and_dirs() {
        let temp = TempDir::new().unwrap();
        let mut config = TrainingConfig::default();
        config.experiment.runs_dir = temp.path().to_path_buf();
        config.experiment.name = Some("baseline".to_string());
        let started = Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();

        let layout = RunLayout::for_config(&config, started);
        layout.ensure_dirs().unwrap();
        assert!(layout.root().is_dir());
        assert!(layout.root().to_string_lossy().contains("baseline_20240102_030405"));
        assert_eq!(layout.record_path().file_name().unwrap(), "training_record.json");
    }
}
