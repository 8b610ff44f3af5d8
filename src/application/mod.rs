// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Workflow coordination only:
//   - No argument-list construction here (that's Layer 3)
//   - No printing here (that's Layer 1)
//   - No direct process or file access (that's Layer 6)

// Resolve config, prepare the project dir, run the trainer
pub mod launch_use_case;

// Compute a magic prime for a dataset
pub mod prime_use_case;

// Check a configured magic prime against the dataset
pub mod check_use_case;

use std::path::PathBuf;

use crate::domain::trainer_args::TrainerProgram;

/// Resolve a path the trainer will see relative to its working directory.
pub(crate) fn trainer_relative(trainer: &TrainerProgram, path: &str) -> PathBuf {
    match &trainer.working_dir {
        Some(dir) => dir.join(path),
        None => PathBuf::from(path),
    }
}
