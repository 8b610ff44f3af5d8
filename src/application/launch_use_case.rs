// ============================================================
// Layer 2 — LaunchUseCase
// ============================================================
// Runs one training launch in order:
//
//   Step 1: Resolve the trainer command         (Layer 3 - domain)
//   Step 2: Dry run? hand the command back      (no side effects)
//   Step 3: Create the project directory        (Layer 6 - infra)
//   Step 4: Write launch_config.json            (Layer 6 - infra)
//   Step 5: Log where the trainer will resume   (Layer 6 - infra)
//   Step 6: Launch and wait                     (Layer 6 - infra)
//
// The trainer's exit code is returned untouched; nothing here
// validates hyperparameters or retries a failed run.
//
// Reference: Rust Book §10 (Generic Types and Traits)

use anyhow::Result;

use crate::application::trainer_relative;
use crate::domain::{trainer_args::TrainerCommand, traits::TrainerLauncher};
use crate::infra::{checkpoint::ProjectDir, profile::LaunchProfile};

/// How a launch ended.
#[derive(Debug, Clone, PartialEq)]
pub enum LaunchOutcome {
    /// Nothing was started; this is what would have run
    DryRun(TrainerCommand),
    /// The trainer ran and exited with this code
    Finished { exit_code: i32 },
}

/// One launch of the external trainer, generic over how it is started.
pub struct LaunchUseCase<L: TrainerLauncher> {
    profile:  LaunchProfile,
    launcher: L,
}

impl<L: TrainerLauncher> LaunchUseCase<L> {
    pub fn new(profile: LaunchProfile, launcher: L) -> Self {
        Self { profile, launcher }
    }

    /// The exact command a launch would run.
    pub fn command(&self) -> TrainerCommand {
        TrainerCommand::resolve(&self.profile.trainer, &self.profile.run)
    }

    /// Run every step above. With `dry_run` only step 1 happens.
    pub fn execute(&self, dry_run: bool) -> Result<LaunchOutcome> {
        let cfg = &self.profile.run;

        // ── Step 1: Resolve ──────────────────────────────────────────────────
        let command = self.command();
        tracing::info!(
            "Run L{} D{} {} ctx_len={} → {}",
            cfg.n_layer,
            cfg.n_embd,
            cfg.arch,
            cfg.ctx_len,
            cfg.proj_dir(),
        );
        tracing::debug!("Trainer command: {}", command.display_line());

        // ── Step 2: Dry run ──────────────────────────────────────────────────
        if dry_run {
            return Ok(LaunchOutcome::DryRun(command));
        }

        // ── Steps 3-4: Prepare the project directory ─────────────────────────
        let proj = ProjectDir::new(trainer_relative(&self.profile.trainer, &cfg.proj_dir()));
        proj.ensure()?;
        proj.save_snapshot(cfg, &command)?;

        // ── Step 5: Report the resume point ──────────────────────────────────
        match proj.latest_checkpoint()? {
            Some(point) => tracing::info!(
                "Trainer will resume from {} (epoch {})",
                point.file_name(),
                point.next_epoch(),
            ),
            None => tracing::warn!(
                "No rwkv-*.pth in '{}'; the trainer expects an initial checkpoint there",
                proj.path().display(),
            ),
        }

        // ── Step 6: Launch ───────────────────────────────────────────────────
        tracing::info!("Launching: {}", command.display_line());
        let exit_code = self.launcher.launch(&command)?;

        Ok(LaunchOutcome::Finished { exit_code })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use crate::domain::trainer_args::TrainerProgram;
    use crate::infra::checkpoint::SNAPSHOT_FILE;

    /// Records every command instead of running it.
    struct Recorder {
        code: i32,
        seen: RefCell<Vec<TrainerCommand>>,
    }

    impl Recorder {
        fn returning(code: i32) -> Self {
            Self { code, seen: RefCell::new(Vec::new()) }
        }
    }

    impl TrainerLauncher for &Recorder {
        fn launch(&self, command: &TrainerCommand) -> Result<i32> {
            self.seen.borrow_mut().push(command.clone());
            Ok(self.code)
        }
    }

    fn profile_in(dir: &std::path::Path) -> LaunchProfile {
        LaunchProfile {
            trainer: TrainerProgram {
                working_dir: Some(dir.to_path_buf()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = Recorder::returning(0);
        let use_case = LaunchUseCase::new(profile_in(dir.path()), &recorder);

        let outcome = use_case.execute(true).unwrap();
        match outcome {
            LaunchOutcome::DryRun(cmd) => assert_eq!(cmd, use_case.command()),
            other => panic!("expected dry run, got {other:?}"),
        }
        assert!(recorder.seen.borrow().is_empty());
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_launches_once_and_writes_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = Recorder::returning(0);
        let use_case = LaunchUseCase::new(profile_in(dir.path()), &recorder);

        let outcome = use_case.execute(false).unwrap();
        assert_eq!(outcome, LaunchOutcome::Finished { exit_code: 0 });

        let seen = recorder.seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].program, "python");
        assert!(seen[0].args.contains(&"out/L24-D2048-x070".to_string()));

        let proj = dir.path().join("out/L24-D2048-x070");
        assert!(proj.join(SNAPSHOT_FILE).is_file());
    }

    #[test]
    fn test_propagates_trainer_failure() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = Recorder::returning(42);
        let use_case = LaunchUseCase::new(profile_in(dir.path()), &recorder);

        assert_eq!(
            use_case.execute(false).unwrap(),
            LaunchOutcome::Finished { exit_code: 42 }
        );
    }

    #[test]
    fn test_existing_checkpoints_are_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let proj = dir.path().join("out/L24-D2048-x070");
        std::fs::create_dir_all(&proj).unwrap();
        std::fs::write(proj.join("rwkv-7.pth"), b"weights").unwrap();

        let recorder = Recorder::returning(0);
        LaunchUseCase::new(profile_in(dir.path()), &recorder)
            .execute(false)
            .unwrap();

        assert_eq!(std::fs::read(proj.join("rwkv-7.pth")).unwrap(), b"weights");
    }
}
