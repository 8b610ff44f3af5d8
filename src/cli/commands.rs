// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Four subcommands:
//
//   launch  — run the trainer (or --dry-run to print the command)
//   show    — print the resolved run config as JSON
//   prime   — compute a magic prime for a dataset
//   check   — compare the configured magic prime with the dataset
//
// `launch`, `show` and `check` share ProfileArgs: a profile file
// plus a handful of per-invocation overrides. Precedence is
//
//   stock defaults  <  TOML profile  <  command-line flags
//
// Reference: clap derive tutorial (Args, Subcommand, ArgGroup)

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{ArgGroup, Args, Subcommand};

use crate::application::prime_use_case::TokenSource;
use crate::domain::run_config::RunOverrides;
use crate::infra::profile::LaunchProfile;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the external trainer with the resolved run config
    Launch(LaunchArgs),

    /// Print the resolved run config and project directory as JSON
    Show(ProfileArgs),

    /// Compute the magic prime for a token count or binidx dataset
    Prime(PrimeArgs),

    /// Check the configured magic prime against the dataset (advisory)
    Check(ProfileArgs),
}

#[derive(Args, Debug)]
pub struct LaunchArgs {
    #[command(flatten)]
    pub profile: ProfileArgs,

    /// Print the trainer command instead of running it
    #[arg(long)]
    pub dry_run: bool,
}

/// Profile location and per-run overrides.
#[derive(Args, Debug, Default)]
pub struct ProfileArgs {
    /// TOML launch profile (defaults to $RWKV_LAUNCH_CONFIG, then ./rwkv-launch.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Program that runs the trainer, e.g. python3 or a venv interpreter
    #[arg(long)]
    pub program: Option<String>,

    /// Architecture tag (passed as --my_testing)
    #[arg(long)]
    pub arch: Option<String>,

    /// Number of blocks
    #[arg(long)]
    pub n_layer: Option<u32>,

    /// Embedding width
    #[arg(long)]
    pub n_embd: Option<u32>,

    /// Tokens per training window
    #[arg(long)]
    pub ctx_len: Option<u32>,

    /// binidx dataset prefix
    #[arg(long)]
    pub data_file: Option<String>,

    /// Token budget; the trainer stops after this many tokens
    #[arg(long)]
    pub my_exit_tokens: Option<u64>,

    /// Shuffling prime for the dataset (see the `prime` subcommand)
    #[arg(long)]
    pub magic_prime: Option<u64>,

    /// Per-device batch size
    #[arg(long)]
    pub micro_bsz: Option<u32>,

    /// Initial learning rate
    #[arg(long)]
    pub lr_init: Option<f64>,

    /// Final learning rate
    #[arg(long)]
    pub lr_final: Option<f64>,

    /// Save a checkpoint every N miniepochs
    #[arg(long)]
    pub epoch_save: Option<u32>,

    /// Machines in the job
    #[arg(long)]
    pub num_nodes: Option<u32>,

    /// Accelerators per node
    #[arg(long)]
    pub devices: Option<u32>,

    /// DeepSpeed bucket size in MB
    #[arg(long)]
    pub ds_bucket_mb: Option<u32>,

    /// Gradient checkpointing (true/false)
    #[arg(long)]
    pub grad_cp: Option<bool>,

    /// Experiment-tracking project name
    #[arg(long)]
    pub wandb: Option<String>,
}

impl ProfileArgs {
    /// Load the profile file and apply these overrides on top.
    pub fn resolve(&self) -> Result<LaunchProfile> {
        let profile = LaunchProfile::load(self.config.as_deref())?;
        let overrides = RunOverrides::from(self);
        Ok(profile.with_overrides(&overrides, self.program.as_deref()))
    }
}

/// The application layer never sees clap types.
impl From<&ProfileArgs> for RunOverrides {
    fn from(a: &ProfileArgs) -> Self {
        RunOverrides {
            arch:           a.arch.clone(),
            n_layer:        a.n_layer,
            n_embd:         a.n_embd,
            ctx_len:        a.ctx_len,
            data_file:      a.data_file.clone(),
            my_exit_tokens: a.my_exit_tokens,
            magic_prime:    a.magic_prime,
            micro_bsz:      a.micro_bsz,
            lr_init:        a.lr_init,
            lr_final:       a.lr_final,
            epoch_save:     a.epoch_save,
            num_nodes:      a.num_nodes,
            devices:        a.devices,
            ds_bucket_mb:   a.ds_bucket_mb,
            grad_cp:        a.grad_cp,
            wandb:          a.wandb.clone(),
        }
    }
}

/// Exactly one of `--tokens` / `--data` is required.
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("source").required(true).args(["tokens", "data"])))]
pub struct PrimeArgs {
    /// Total token count of the dataset
    #[arg(long)]
    pub tokens: Option<u64>,

    /// binidx dataset prefix to size (reads <prefix>.idx and <prefix>.bin)
    #[arg(long)]
    pub data: Option<String>,

    /// Context length the run will train with
    #[arg(long, default_value_t = 512)]
    pub ctx_len: u32,
}

impl PrimeArgs {
    /// The token source clap guaranteed; errors if built by hand without one.
    pub fn source(&self) -> Result<TokenSource> {
        match (self.tokens, &self.data) {
            (Some(n), None) => Ok(TokenSource::Count(n)),
            (None, Some(prefix)) => Ok(TokenSource::Dataset(prefix.clone())),
            _ => bail!("pass exactly one of --tokens or --data"),
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn prime_args(tokens: Option<u64>, data: Option<&str>) -> PrimeArgs {
        PrimeArgs { tokens, data: data.map(str::to_string), ctx_len: 512 }
    }

    #[test]
    fn test_source_from_tokens_or_data() {
        assert_eq!(prime_args(Some(10), None).source().unwrap(), TokenSource::Count(10));
        assert_eq!(
            prime_args(None, Some("data/x")).source().unwrap(),
            TokenSource::Dataset("data/x".to_string()),
        );
    }

    #[test]
    fn test_source_rejects_none_or_both() {
        let err = prime_args(None, None).source().unwrap_err();
        assert!(err.to_string().contains("exactly one"));
        assert!(prime_args(Some(10), Some("data/x")).source().is_err());
    }
}
