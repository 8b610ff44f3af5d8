// ============================================================
// Layer 6 — Launch Profile
// ============================================================
// Optional TOML file layered over the compiled defaults.
//
// Lookup order (first hit wins):
//   1. --config <path>            (must exist)
//   2. $RWKV_LAUNCH_CONFIG        (must exist)
//   3. ./rwkv-launch.toml         (used only if present)
//   4. no file → stock defaults
//
// Example profile:
//
//   [run]
//   n_layer   = 12
//   n_embd    = 768
//   data_file = "data/novels"
//
//   [trainer]
//   program     = "python3"
//   working_dir = "/opt/RWKV-LM/RWKV-v7"
//
// Any key left out keeps its default; unknown keys are rejected
// so a typo never silently falls back to the stock value.
//
// Reference: toml crate documentation

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::{
    run_config::{RunOverrides, TrainingRunConfig},
    trainer_args::TrainerProgram,
};

pub const DEFAULT_PROFILE_NAME: &str = "rwkv-launch.toml";
/// Environment variable naming a profile when `--config` is absent.
pub const PROFILE_ENV_VAR: &str = "RWKV_LAUNCH_CONFIG";

/// Run config plus the program that will execute it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LaunchProfile {
    pub run:     TrainingRunConfig,
    pub trainer: TrainerProgram,
}

impl LaunchProfile {
    /// Find and load the profile, or fall back to defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let env_value = std::env::var(PROFILE_ENV_VAR).ok();
        let cwd = std::env::current_dir().context("Cannot determine current directory")?;

        match locate(explicit, env_value.as_deref(), &cwd) {
            Some(path) => Self::from_path(&path),
            None => {
                tracing::debug!("No launch profile found, using stock defaults");
                Ok(Self::default())
            }
        }
    }

    /// Read and parse one profile file; both failures name the path.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read launch profile '{}'", path.display()))?;

        let profile = Self::from_toml_str(&raw)
            .with_context(|| format!("Invalid launch profile '{}'", path.display()))?;

        tracing::info!("Loaded launch profile '{}'", path.display());
        Ok(profile)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Layer per-invocation overrides on top of this profile.
    pub fn with_overrides(mut self, run: &RunOverrides, program: Option<&str>) -> Self {
        self.run = self.run.apply(run);
        if let Some(p) = program {
            self.trainer.program = p.to_string();
        }
        self
    }
}

/// Decide which profile file to read, if any.
pub fn locate(explicit: Option<&Path>, env_value: Option<&str>, cwd: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(v) = env_value.filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(v));
    }
    let fallback = cwd.join(DEFAULT_PROFILE_NAME);
    fallback.exists().then_some(fallback)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_profile_keeps_defaults() {
        let profile = LaunchProfile::from_toml_str(
            r#"
            [run]
            n_layer   = 12
            n_embd    = 768
            data_file = "data/novels"

            [trainer]
            program = "python3"
            "#,
        )
        .unwrap();

        assert_eq!(profile.run.n_layer, 12);
        assert_eq!(profile.run.data_file, "data/novels");
        assert_eq!(profile.run.ctx_len, TrainingRunConfig::default().ctx_len);
        assert_eq!(profile.run.proj_dir(), "out/L12-D768-x070");
        assert_eq!(profile.trainer.program, "python3");
        assert_eq!(profile.trainer.script.as_deref(), Some("train.py"));
    }

    #[test]
    fn test_empty_profile_is_default() {
        assert_eq!(LaunchProfile::from_toml_str("").unwrap(), LaunchProfile::default());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = LaunchProfile::from_toml_str("[run]\nn_layers = 12\n");
        assert!(err.is_err());
    }

    #[test]
    fn test_proj_dir_is_not_settable() {
        // The output directory is derived, never configured
        let err = LaunchProfile::from_toml_str("[run]\nproj_dir = \"elsewhere\"\n");
        assert!(err.is_err());
    }

    #[test]
    fn test_overrides_beat_profile() {
        let profile = LaunchProfile::from_toml_str("[run]\nn_layer = 12\n").unwrap();
        let over = RunOverrides { n_layer: Some(6), ..Default::default() };

        let resolved = profile.with_overrides(&over, Some("/usr/bin/python3"));
        assert_eq!(resolved.run.n_layer, 6);
        assert_eq!(resolved.trainer.program, "/usr/bin/python3");
    }

    #[test]
    fn test_locate_order() {
        let dir = tempfile::tempdir().unwrap();
        let explicit = Path::new("custom.toml");

        // Nothing on disk and nothing set
        assert_eq!(locate(None, None, dir.path()), None);
        assert_eq!(locate(None, Some(""), dir.path()), None);

        // Default file in cwd is picked up once it exists
        std::fs::write(dir.path().join(DEFAULT_PROFILE_NAME), "").unwrap();
        assert_eq!(
            locate(None, None, dir.path()),
            Some(dir.path().join(DEFAULT_PROFILE_NAME))
        );

        // Env var beats the cwd file, explicit beats both
        assert_eq!(
            locate(None, Some("from-env.toml"), dir.path()),
            Some(PathBuf::from("from-env.toml"))
        );
        assert_eq!(
            locate(Some(explicit), Some("from-env.toml"), dir.path()),
            Some(PathBuf::from("custom.toml"))
        );
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = LaunchProfile::from_path(&dir.path().join("nope.toml")).unwrap_err();
        assert!(err.to_string().contains("Cannot read launch profile"));
    }
}
