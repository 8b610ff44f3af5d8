// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the operating system:
//
//   trainer_process.rs — spawns the external trainer and maps
//                        its exit status to a process exit code
//
//   profile.rs         — loads the TOML launch profile and
//                        layers it under CLI overrides
//
//   binidx.rs          — reads token counts from a binidx
//                        dataset (.idx header, .bin length)
//
//   checkpoint.rs      — prepares the project directory, finds
//                        the checkpoint the trainer will resume
//                        from, and writes the launch snapshot

/// Child process spawning
pub mod trainer_process;

/// TOML launch profiles
pub mod profile;

/// binidx dataset metadata
pub mod binidx;

/// Project directory and checkpoint files
pub mod checkpoint;
