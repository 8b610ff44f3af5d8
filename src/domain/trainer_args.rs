// ============================================================
// Layer 3 — Trainer Command Line
// ============================================================
// Turns a TrainingRunConfig into the exact argument list the
// external trainer expects.
//
// The trainer's CLI is not ours: flag names, their order and
// the textual form of each value are an external contract.
//
//   --load_model 0 --wandb Test --proj_dir out/L24-D2048-x070 ...
//
// Value rendering:
//   integers             → decimal
//   grad_cp              → 1 / 0
//   enable_progress_bar  → True / False
//   floats below 1e-3    → scientific (6e-4, 1e-18)
//   other floats         → plain decimal (0.9, 0.001)

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::run_config::TrainingRunConfig;

/// Every flag the trainer receives, in emission order.
pub const TRAINER_FLAGS: [&str; 37] = [
    "--load_model",
    "--wandb",
    "--proj_dir",
    "--my_testing",
    "--ctx_len",
    "--my_pile_stage",
    "--load_partial",
    "--epoch_count",
    "--epoch_begin",
    "--data_file",
    "--my_exit_tokens",
    "--magic_prime",
    "--num_nodes",
    "--micro_bsz",
    "--n_layer",
    "--n_embd",
    "--pre_ffn",
    "--head_qk",
    "--lr_init",
    "--lr_final",
    "--warmup_steps",
    "--beta1",
    "--beta2",
    "--adam_eps",
    "--my_pile_edecay",
    "--data_type",
    "--vocab_size",
    "--weight_decay",
    "--epoch_save",
    "--head_size_a",
    "--accelerator",
    "--devices",
    "--precision",
    "--strategy",
    "--grad_cp",
    "--enable_progress_bar",
    "--ds_bucket_mb",
];

/// The `(flag, value)` pairs for a run, one per entry of [`TRAINER_FLAGS`].
pub fn flag_pairs(cfg: &TrainingRunConfig) -> Vec<(&'static str, String)> {
    let values = [
        cfg.load_model.clone(),
        cfg.wandb.clone(),
        cfg.proj_dir(),
        cfg.arch.clone(),
        cfg.ctx_len.to_string(),
        cfg.my_pile_stage.to_string(),
        cfg.load_partial.to_string(),
        cfg.epoch_count.to_string(),
        cfg.epoch_begin.to_string(),
        cfg.data_file.clone(),
        cfg.my_exit_tokens.to_string(),
        cfg.magic_prime.to_string(),
        cfg.num_nodes.to_string(),
        cfg.micro_bsz.to_string(),
        cfg.n_layer.to_string(),
        cfg.n_embd.to_string(),
        cfg.pre_ffn.to_string(),
        cfg.head_qk.to_string(),
        render_float(cfg.lr_init),
        render_float(cfg.lr_final),
        cfg.warmup_steps.to_string(),
        render_float(cfg.beta1),
        render_float(cfg.beta2),
        render_float(cfg.adam_eps),
        cfg.my_pile_edecay.to_string(),
        cfg.data_type.clone(),
        cfg.vocab_size.to_string(),
        render_float(cfg.weight_decay),
        cfg.epoch_save.to_string(),
        cfg.head_size_a.to_string(),
        cfg.accelerator.clone(),
        cfg.devices.to_string(),
        cfg.precision.clone(),
        cfg.strategy.clone(),
        (if cfg.grad_cp { "1" } else { "0" }).to_string(),
        (if cfg.enable_progress_bar { "True" } else { "False" }).to_string(),
        cfg.ds_bucket_mb.to_string(),
    ];

    TRAINER_FLAGS.into_iter().zip(values).collect()
}

/// Flattened `["--flag", "value", ...]` list for the trainer.
pub fn trainer_args(cfg: &TrainingRunConfig) -> Vec<String> {
    flag_pairs(cfg)
        .into_iter()
        .flat_map(|(flag, value)| [flag.to_string(), value])
        .collect()
}

fn render_float(v: f64) -> String {
    if v != 0.0 && v.abs() < 1e-3 {
        format!("{v:e}")
    } else {
        format!("{v}")
    }
}

// ─── Trainer Program ─────────────────────────────────────────────────────────
/// Which executable runs the trainer, read from the `[trainer]` profile table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrainerProgram {
    /// Interpreter or binary to execute
    pub program:     String,
    /// Script passed before the flags; `None` when `program` is the trainer itself
    pub script:      Option<String>,
    /// Directory the trainer runs in; inherits ours when unset
    pub working_dir: Option<PathBuf>,
}

impl Default for TrainerProgram {
    fn default() -> Self {
        Self {
            program:     "python".to_string(),
            script:      Some("train.py".to_string()),
            working_dir: None,
        }
    }
}

/// A fully resolved trainer invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainerCommand {
    pub program:     String,
    /// Script (if any) followed by every `--flag value` pair
    pub args:        Vec<String>,
    pub working_dir: Option<PathBuf>,
}

impl TrainerCommand {
    /// Pure: the same profile always yields the same command.
    pub fn resolve(trainer: &TrainerProgram, cfg: &TrainingRunConfig) -> Self {
        let mut args = Vec::with_capacity(TRAINER_FLAGS.len() * 2 + 1);
        if let Some(script) = &trainer.script {
            args.push(script.clone());
        }
        args.extend(trainer_args(cfg));

        Self {
            program:     trainer.program.clone(),
            args,
            working_dir: trainer.working_dir.clone(),
        }
    }

    /// Single shell-quoted line, safe to paste into a terminal.
    pub fn display_line(&self) -> String {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|s| shell_quote(s))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn shell_quote(s: &str) -> String {
    let plain = !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./=:,+@%".contains(c));
    if plain {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}
