// ============================================================
// Layer 3 — Core Traits
// ============================================================
// The application layer talks to the outside world through
// these traits so the launch workflow can be tested without
// actually starting a trainer.

use anyhow::Result;

use crate::domain::trainer_args::TrainerCommand;

// ─── TrainerLauncher ──────────────────────────────────────────────────────────
/// Anything that can run a resolved trainer command to completion.
///
/// Implementations:
///   - SystemLauncher → spawns a real child process
///   - test recorders → capture the command and return a canned code
pub trait TrainerLauncher {
    /// Run `command`, wait for it, and return its exit code.
    /// `Err` means the process could not be started at all.
    fn launch(&self, command: &TrainerCommand) -> Result<i32>;
}
