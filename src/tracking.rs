//! Experiment tracking
//!
//! Tracking is strictly best-effort: trackers report failures as strings and
//! the training pipeline logs them without aborting. [`FileTracker`] appends
//! finished runs to a `runs.json` ledger under its base directory.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sink for training run metadata
pub trait ExperimentTracker {
    fn start_run(&mut self, name: &str) -> std::result::Result<(), String>;
    fn log_params(&mut self, params: &[(String, String)]) -> std::result::Result<(), String>;
    fn log_metric(&mut self, name: &str, value: f64) -> std::result::Result<(), String>;
    fn log_artifact(&mut self, path: &Path) -> std::result::Result<(), String>;
    fn finish_run(&mut self) -> std::result::Result<(), String>;
}

/// One recorded training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedRun {
    pub run_id: String,
    pub name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub params: Vec<(String, String)>,
    pub metrics: Vec<(String, f64)>,
    pub artifacts: Vec<String>,
}

/// File-backed tracker writing to `<base_dir>/runs.json`
#[derive(Debug)]
pub struct FileTracker {
    base_dir: PathBuf,
    current: Option<TrackedRun>,
}

impl FileTracker {
    pub fn new(base_dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self {
            base_dir,
            current: None,
        })
    }

    fn runs_path(&self) -> PathBuf {
        self.base_dir.join("runs.json")
    }

    fn current_mut(&mut self) -> std::result::Result<&mut TrackedRun, String> {
        self.current
            .as_mut()
            .ok_or_else(|| "no active run".to_string())
    }
}

impl ExperimentTracker for FileTracker {
    fn start_run(&mut self, name: &str) -> std::result::Result<(), String> {
        if self.current.is_some() {
            return Err("a run is already active".to_string());
        }
        let started_at = Utc::now();
        let run_id = format!("{}-{}", name, started_at.format("%Y%m%d%H%M%S%3f"));
        self.current = Some(TrackedRun {
            run_id,
            name: name.to_string(),
            started_at,
            finished_at: None,
            params: Vec::new(),
            metrics: Vec::new(),
            artifacts: Vec::new(),
        });
        Ok(())
    }

    fn log_params(&mut self, params: &[(String, String)]) -> std::result::Result<(), String> {
        self.current_mut()?.params.extend_from_slice(params);
        Ok(())
    }

    fn log_metric(&mut self, name: &str, value: f64) -> std::result::Result<(), String> {
        self.current_mut()?.metrics.push((name.to_string(), value));
        Ok(())
    }

    fn log_artifact(&mut self, path: &Path) -> std::result::Result<(), String> {
        self.current_mut()?
            .artifacts
            .push(path.display().to_string());
        Ok(())
    }

    fn finish_run(&mut self) -> std::result::Result<(), String> {
        let mut run = self.current.take().ok_or("no active run")?;
        run.finished_at = Some(Utc::now());

        let runs_path = self.runs_path();
        let mut runs: Vec<TrackedRun> = if runs_path.exists() {
            let raw = std::fs::read_to_string(&runs_path).map_err(|e| e.to_string())?;
            serde_json::from_str(&raw).map_err(|e| e.to_string())?
        } else {
            Vec::new()
        };
        runs.push(run);

        let json = serde_json::to_string_pretty(&runs).map_err(|e| e.to_string())?;
        std::fs::write(&runs_path, json).map_err(|e| e.to_string())?;
        Ok(())
    }
}
