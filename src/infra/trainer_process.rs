// ============================================================
// Layer 6 — Trainer Process
// ============================================================
// Starts exactly one external trainer process and waits for it.
//
// stdin/stdout/stderr are inherited, so the trainer's progress
// bar and logs go straight to the operator's terminal.
//
// Exit code mapping:
//   normal exit with code N    → N
//   killed by signal S (Unix)  → 128 + S, like a shell reports it
//   anything else              → 1
//
// Reference: std::process::Command, std::os::unix::process::ExitStatusExt

use std::process::{Command, ExitStatus};

use anyhow::{Context, Result};

use crate::domain::{trainer_args::TrainerCommand, traits::TrainerLauncher};

/// Launches the trainer as a real child process.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLauncher;

impl TrainerLauncher for SystemLauncher {
    fn launch(&self, command: &TrainerCommand) -> Result<i32> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args);
        if let Some(dir) = &command.working_dir {
            cmd.current_dir(dir);
        }

        tracing::debug!("Spawning '{}' with {} args", command.program, command.args.len());

        let status = cmd
            .status()
            .with_context(|| format!("Failed to start trainer '{}'", command.program))?;

        let code = exit_code(status);
        if code == 0 {
            tracing::info!("Trainer exited cleanly");
        } else {
            tracing::warn!("Trainer exited with code {}", code);
        }
        Ok(code)
    }
}

/// Map a child's status to the code this process should exit with.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = status.signal() {
            return 128 + sig;
        }
    }

    1
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> TrainerCommand {
        TrainerCommand {
            program:     "sh".to_string(),
            args:        vec!["-c".to_string(), script.to_string()],
            working_dir: None,
        }
    }

    #[test]
    fn test_propagates_exit_code() {
        assert_eq!(SystemLauncher.launch(&sh("exit 0")).unwrap(), 0);
        assert_eq!(SystemLauncher.launch(&sh("exit 3")).unwrap(), 3);
    }

    #[test]
    fn test_signal_maps_above_128() {
        // SIGKILL = 9
        assert_eq!(SystemLauncher.launch(&sh("kill -9 $$")).unwrap(), 137);
    }

    #[test]
    fn test_runs_in_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut cmd = sh("touch marker");
        cmd.working_dir = Some(dir.path().to_path_buf());

        assert_eq!(SystemLauncher.launch(&cmd).unwrap(), 0);
        assert!(dir.path().join("marker").exists());
    }

    #[test]
    fn test_missing_program_is_error() {
        let cmd = TrainerCommand {
            program:     "definitely-not-a-trainer-binary".to_string(),
            args:        Vec::new(),
            working_dir: None,
        };
        let err = SystemLauncher.launch(&cmd).unwrap_err();
        assert!(err.to_string().contains("Failed to start trainer"));
    }
}
