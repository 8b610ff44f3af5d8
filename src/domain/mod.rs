// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types that describe a training run and the
// command line handed to the external trainer.
//
// Rules for this layer:
//   - NO process spawning
//   - NO file I/O
//   - Only structs, enums, pure functions and traits
//
// Everything here is deterministic: the same run config
// always yields the same argument list.

// The flat record of every hyperparameter for one run
pub mod run_config;

// Turns a run config into the trainer's command line
pub mod trainer_args;

// Magic prime search and consistency checks
pub mod magic_prime;

// Seams that infra implements
pub mod traits;
