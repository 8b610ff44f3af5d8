// ============================================================
// Layer 2 — CheckUseCase
// ============================================================
// Advisory only. Compares the configured magic prime with the
// dataset the trainer will read, without launching anything.
//
// Token count:
//   <data_file>.idx present → size from the binidx files
//   otherwise               → the configured my_exit_tokens

use anyhow::{Context, Result};

use crate::application::trainer_relative;
use crate::domain::magic_prime::{check_magic_prime, MagicPrimeReport};
use crate::infra::{binidx, profile::LaunchProfile};

/// Where the token count used for the check came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenOrigin {
    /// Sized from `<data_file>.idx` / `.bin`
    Dataset,
    /// Dataset missing; the configured `my_exit_tokens` was used
    ExitTokens,
}

/// A magic-prime report plus where its token count came from.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult {
    pub report: MagicPrimeReport,
    pub origin: TokenOrigin,
    /// Set when the dataset size and my_exit_tokens disagree
    pub exit_tokens_mismatch: Option<u64>,
}

/// Compares a profile's magic prime with the dataset it names.
pub struct CheckUseCase {
    profile: LaunchProfile,
}

impl CheckUseCase {
    pub fn new(profile: LaunchProfile) -> Self {
        Self { profile }
    }

    /// Size the dataset (or fall back to my_exit_tokens) and run every check.
    /// Issues are logged as warnings and never turn into an `Err`.
    pub fn execute(&self) -> Result<CheckResult> {
        let cfg = &self.profile.run;
        let data_path = trainer_relative(&self.profile.trainer, &cfg.data_file);
        let prefix = data_path.to_string_lossy();

        let (data_tokens, origin) = if binidx::exists(&prefix) {
            let summary = binidx::read_summary(&prefix)
                .with_context(|| format!("Cannot size dataset '{prefix}'"))?;
            (summary.data_tokens(), TokenOrigin::Dataset)
        } else {
            tracing::warn!(
                "Dataset '{}' not found, checking against my_exit_tokens instead",
                prefix
            );
            (cfg.my_exit_tokens, TokenOrigin::ExitTokens)
        };

        let report = check_magic_prime(cfg.magic_prime, data_tokens, cfg.ctx_len);
        for issue in &report.issues {
            tracing::warn!("{}", issue);
        }

        let exit_tokens_mismatch = (origin == TokenOrigin::Dataset
            && cfg.my_exit_tokens != data_tokens)
            .then_some(cfg.my_exit_tokens);

        Ok(CheckResult { report, origin, exit_tokens_mismatch })
    }
}
