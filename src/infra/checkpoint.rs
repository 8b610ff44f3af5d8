// ============================================================
// Layer 6 — Project Directory
// ============================================================
// The project directory (out/L<layers>-D<width>-<arch>) is where
// the trainer writes its checkpoints:
//
//   out/L24-D2048-x070/
//     rwkv-init.pth        ← freshly initialised weights
//     rwkv-0.pth           ← after miniepoch 0
//     rwkv-10.pth          ← ...saved every epoch_save miniepochs
//     rwkv-final.pth       ← ignored when resuming
//     launch_config.json   ← written by us before each launch
//
// Resuming is the trainer's job: with load_model = "0" it picks
// the highest-numbered checkpoint itself. We only look so the
// operator can see in the log where the run will continue from.
//
// Reference: Rust Book §9 (Recoverable Errors with Result)

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::domain::{run_config::TrainingRunConfig, trainer_args::TrainerCommand};

pub const SNAPSHOT_FILE: &str = "launch_config.json";

/// A checkpoint the trainer can resume from.
/// `Init` sorts below every numbered epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ResumePoint {
    Init,
    Epoch(u32),
}

impl ResumePoint {
    /// Parse a trainer checkpoint file name. `rwkv-final.pth` is not a resume point.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let stem = name.strip_prefix("rwkv-")?.strip_suffix(".pth")?;
        match stem {
            "init" => Some(ResumePoint::Init),
            "final" => None,
            n => n.parse().ok().map(ResumePoint::Epoch),
        }
    }

    pub fn file_name(&self) -> String {
        match self {
            ResumePoint::Init => "rwkv-init.pth".to_string(),
            ResumePoint::Epoch(n) => format!("rwkv-{n}.pth"),
        }
    }

    /// The epoch the trainer will start counting from.
    pub fn next_epoch(&self) -> u32 {
        match self {
            ResumePoint::Init => 0,
            ResumePoint::Epoch(n) => n + 1,
        }
    }
}

#[derive(Serialize)]
struct LaunchSnapshot<'a> {
    proj_dir: &'a Path,
    config:   &'a TrainingRunConfig,
    command:  &'a TrainerCommand,
}

/// Handle on one run's project directory.
pub struct ProjectDir {
    dir: PathBuf,
}

impl ProjectDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Where the trainer writes checkpoints for this run.
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Create the directory (and parents) if missing.
    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create project dir '{}'", self.dir.display()))
    }

    /// Highest checkpoint in the directory, if any.
    /// A missing directory simply has no checkpoints.
    pub fn latest_checkpoint(&self) -> Result<Option<ResumePoint>> {
        if !self.dir.exists() {
            return Ok(None);
        }

        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("Cannot list project dir '{}'", self.dir.display()))?;

        let mut latest = None;
        for entry in entries {
            let entry = entry.with_context(|| {
                format!("Cannot read entry in project dir '{}'", self.dir.display())
            })?;
            let name = entry.file_name();
            let Some(point) = name.to_str().and_then(ResumePoint::from_file_name) else {
                continue;
            };
            latest = latest.max(Some(point));
        }
        Ok(latest)
    }

    /// Record exactly what was launched, next to the checkpoints it produces.
    pub fn save_snapshot(&self, cfg: &TrainingRunConfig, command: &TrainerCommand) -> Result<PathBuf> {
        let path = self.dir.join(SNAPSHOT_FILE);
        let snapshot = LaunchSnapshot { proj_dir: &self.dir, config: cfg, command };

        let json = serde_json::to_string_pretty(&snapshot)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write launch snapshot to '{}'", path.display()))?;

        tracing::debug!("Saved launch snapshot to '{}'", path.display());
        Ok(path)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trainer_args::TrainerProgram;

    #[test]
    fn test_parse_file_names() {
        assert_eq!(ResumePoint::from_file_name("rwkv-init.pth"), Some(ResumePoint::Init));
        assert_eq!(ResumePoint::from_file_name("rwkv-42.pth"), Some(ResumePoint::Epoch(42)));
        assert_eq!(ResumePoint::from_file_name("rwkv-final.pth"), None);
        assert_eq!(ResumePoint::from_file_name("rwkv-42.pth.tmp"), None);
        assert_eq!(ResumePoint::from_file_name("train_log.txt"), None);
    }

    #[test]
    fn test_init_sorts_first() {
        assert!(ResumePoint::Init < ResumePoint::Epoch(0));
        assert_eq!(ResumePoint::Init.next_epoch(), 0);
        assert_eq!(ResumePoint::Epoch(9).next_epoch(), 10);
    }

    #[test]
    fn test_latest_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let proj = ProjectDir::new(dir.path());
        assert_eq!(proj.latest_checkpoint().unwrap(), None);

        for name in ["rwkv-init.pth", "rwkv-2.pth", "rwkv-10.pth", "rwkv-final.pth", "notes.md"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        // Numeric, not lexical: 10 beats 2
        assert_eq!(proj.latest_checkpoint().unwrap(), Some(ResumePoint::Epoch(10)));
    }

    #[test]
    fn test_missing_dir_has_no_checkpoints() {
        let dir = tempfile::tempdir().unwrap();
        let proj = ProjectDir::new(dir.path().join("out/L1-D1-x070"));
        assert_eq!(proj.latest_checkpoint().unwrap(), None);
    }

    #[test]
    fn test_unlistable_dir_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("not-a-dir");
        std::fs::write(&file, b"").unwrap();

        let err = ProjectDir::new(&file).latest_checkpoint().unwrap_err();
        assert!(format!("{err:#}").contains("not-a-dir"), "got {err:#}");
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let proj = ProjectDir::new(dir.path().join("out/L24-D2048-x070"));
        proj.ensure().unwrap();

        let cfg = TrainingRunConfig::default();
        let cmd = TrainerCommand::resolve(&TrainerProgram::default(), &cfg);
        let path = proj.save_snapshot(&cfg, &cmd).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(json["config"]["n_layer"], 24);
        assert_eq!(json["command"]["program"], "python");
        assert_eq!(json["command"]["args"][1], "--load_model");
    }
}
