// ============================================================
// Layer 3 — Training Run Configuration
// ============================================================
// One flat record holding every value the trainer needs.
// Built once at start-up, never mutated afterwards, and
// dropped once the trainer process has been started.
//
// The defaults are the literal constants of the stock run:
//   24 layers, 2048 wide, x070 architecture, minipile data.
//
// The output directory is NOT a field. It is derived from
// layer count, embedding width and architecture tag so a
// later resume always lands in the same directory:
//
//   n_layer = 24, n_embd = 2048, arch = "x070"
//       → out/L24-D2048-x070
//
// Reference: serde.rs (Container attributes: default, deny_unknown_fields)

use serde::{Deserialize, Serialize};

/// Fixed prefix of every project directory.
pub const PROJ_DIR_PREFIX: &str = "out/L";

/// Every hyperparameter of a single training run.
///
/// `#[serde(default)]` lets a profile file set only the
/// fields it cares about; everything else keeps the stock value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrainingRunConfig {
    // ── Model shape ──────────────────────────────────────────────────────────
    /// Architecture tag, passed as `--my_testing`
    pub arch:         String,
    /// Number of blocks
    pub n_layer:      u32,
    /// Embedding width
    pub n_embd:       u32,
    /// Tokens per training window
    pub ctx_len:      u32,
    /// Attention head size
    pub head_size_a:  u32,
    /// 0 disables; kept for older architectures
    pub pre_ffn:      u32,
    pub head_qk:      u32,
    pub vocab_size:   u32,

    // ── Data ─────────────────────────────────────────────────────────────────
    /// Dataset prefix; the trainer appends `.bin` / `.idx`
    pub data_file:      String,
    /// Always "binidx" for the stock trainer
    pub data_type:      String,
    /// Total token budget before the trainer exits
    pub my_exit_tokens: u64,
    /// Opaque shuffling constant, see `domain::magic_prime`
    pub magic_prime:    u64,
    /// Pile schedule stage; 3 means full training
    pub my_pile_stage:  u32,
    pub my_pile_edecay: u32,

    // ── Optimisation schedule ────────────────────────────────────────────────
    /// Per-device batch size
    pub micro_bsz:    u32,
    /// Learning rate after warmup, decaying towards `lr_final`
    pub lr_init:      f64,
    pub lr_final:     f64,
    /// Linear warmup length in steps
    pub warmup_steps: u32,
    pub beta1:        f64,
    pub beta2:        f64,
    /// Adam epsilon; the stock run uses 1e-18
    pub adam_eps:     f64,
    pub weight_decay: f64,
    /// Gradient checkpointing
    pub grad_cp:      bool,

    // ── Checkpointing ────────────────────────────────────────────────────────
    /// "0" lets the trainer pick the newest checkpoint in the project dir
    pub load_model:   String,
    pub load_partial: u32,
    /// Save a checkpoint every N miniepochs
    pub epoch_save:   u32,
    /// Large enough that `my_exit_tokens` ends the run first
    pub epoch_count:  u32,
    pub epoch_begin:  u32,

    // ── Distributed topology ─────────────────────────────────────────────────
    /// Machines in the job
    pub num_nodes:    u32,
    /// Accelerators per node
    pub devices:      u32,
    pub accelerator:  String,
    /// e.g. "bf16"
    pub precision:    String,
    /// e.g. "deepspeed_stage_2"
    pub strategy:     String,
    /// DeepSpeed bucket size in MB
    pub ds_bucket_mb: u32,

    // ── Reporting ────────────────────────────────────────────────────────────
    /// Experiment-tracking project name
    pub wandb:               String,
    pub enable_progress_bar: bool,
}

impl Default for TrainingRunConfig {
    fn default() -> Self {
        Self {
            arch:        "x070".to_string(),
            n_layer:     24,
            n_embd:      2048,
            ctx_len:     512,
            head_size_a: 64,
            pre_ffn:     0,
            head_qk:     0,
            vocab_size:  65536,

            data_file:      "data/minipile".to_string(),
            data_type:      "binidx".to_string(),
            my_exit_tokens: 1_498_226_207,
            magic_prime:    2_926_181,
            my_pile_stage:  3,
            my_pile_edecay: 0,

            micro_bsz:    16,
            lr_init:      6e-4,
            lr_final:     6e-5,
            warmup_steps: 10,
            beta1:        0.9,
            beta2:        0.99,
            adam_eps:     1e-18,
            weight_decay: 0.001,
            grad_cp:      true,

            load_model:   "0".to_string(),
            load_partial: 0,
            epoch_save:   10,
            epoch_count:  999_999,
            epoch_begin:  0,

            num_nodes:    1,
            devices:      1,
            accelerator:  "gpu".to_string(),
            precision:    "bf16".to_string(),
            strategy:     "deepspeed_stage_2".to_string(),
            ds_bucket_mb: 2,

            wandb:               "Test".to_string(),
            enable_progress_bar: true,
        }
    }
}

impl TrainingRunConfig {
    /// The project/output directory: prefix, layer count,
    /// embedding width and architecture tag, in that order.
    pub fn proj_dir(&self) -> String {
        format!("{PROJ_DIR_PREFIX}{}-D{}-{}", self.n_layer, self.n_embd, self.arch)
    }

    /// Return a copy with every `Some` override substituted.
    pub fn apply(&self, o: &RunOverrides) -> Self {
        let mut cfg = self.clone();

        if let Some(v) = &o.arch           { cfg.arch = v.clone(); }
        if let Some(v) = o.n_layer         { cfg.n_layer = v; }
        if let Some(v) = o.n_embd          { cfg.n_embd = v; }
        if let Some(v) = o.ctx_len         { cfg.ctx_len = v; }
        if let Some(v) = &o.data_file      { cfg.data_file = v.clone(); }
        if let Some(v) = o.my_exit_tokens  { cfg.my_exit_tokens = v; }
        if let Some(v) = o.magic_prime     { cfg.magic_prime = v; }
        if let Some(v) = o.micro_bsz       { cfg.micro_bsz = v; }
        if let Some(v) = o.lr_init         { cfg.lr_init = v; }
        if let Some(v) = o.lr_final        { cfg.lr_final = v; }
        if let Some(v) = o.epoch_save      { cfg.epoch_save = v; }
        if let Some(v) = o.num_nodes       { cfg.num_nodes = v; }
        if let Some(v) = o.devices         { cfg.devices = v; }
        if let Some(v) = o.ds_bucket_mb    { cfg.ds_bucket_mb = v; }
        if let Some(v) = o.grad_cp         { cfg.grad_cp = v; }
        if let Some(v) = &o.wandb          { cfg.wandb = v.clone(); }

        cfg
    }
}

/// Values an operator may override per invocation.
/// `None` means "keep whatever the profile or defaults say".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOverrides {
    pub arch:           Option<String>,
    pub n_layer:        Option<u32>,
    pub n_embd:         Option<u32>,
    pub ctx_len:        Option<u32>,
    pub data_file:      Option<String>,
    pub my_exit_tokens: Option<u64>,
    pub magic_prime:    Option<u64>,
    pub micro_bsz:      Option<u32>,
    pub lr_init:        Option<f64>,
    pub lr_final:       Option<f64>,
    pub epoch_save:     Option<u32>,
    pub num_nodes:      Option<u32>,
    pub devices:        Option<u32>,
    pub ds_bucket_mb:   Option<u32>,
    pub grad_cp:        Option<bool>,
    pub wandb:          Option<String>,
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_proj_dir() {
        let cfg = TrainingRunConfig::default();
        assert_eq!(cfg.proj_dir(), "out/L24-D2048-x070");
    }

    #[test]
    fn test_proj_dir_tracks_shape() {
        let cfg = TrainingRunConfig {
            n_layer: 12,
            n_embd:  768,
            arch:    "x060".to_string(),
            ..Default::default()
        };
        assert_eq!(cfg.proj_dir(), "out/L12-D768-x060");
    }

    #[test]
    fn test_apply_overrides_leaves_original() {
        let base = TrainingRunConfig::default();
        let over = RunOverrides {
            n_layer: Some(32),
            wandb:   Some("big".to_string()),
            grad_cp: Some(false),
            ..Default::default()
        };

        let cfg = base.apply(&over);
        assert_eq!(cfg.n_layer, 32);
        assert_eq!(cfg.wandb, "big");
        assert!(!cfg.grad_cp);
        assert_eq!(cfg.n_embd, base.n_embd);

        // Base record is never mutated
        assert_eq!(base.n_layer, 24);
        assert_eq!(cfg.proj_dir(), "out/L32-D2048-x070");
    }

    #[test]
    fn test_empty_overrides_is_identity() {
        let base = TrainingRunConfig::default();
        assert_eq!(base.apply(&RunOverrides::default()), base);
    }
}
