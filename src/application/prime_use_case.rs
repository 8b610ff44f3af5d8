// ============================================================
// Layer 2 — PrimeUseCase
// ============================================================
// Works out the magic prime for a dataset so the operator can
// paste it into a launch profile:
//
//   token count (given, or read from <prefix>.idx / .bin)
//       │
//       ▼
//   magic_prime(tokens, ctx_len)
//       │
//       ▼
//   --my_exit_tokens N --magic_prime P --ctx_len L

use anyhow::{bail, Context, Result};

use crate::domain::magic_prime::magic_prime;
use crate::infra::binidx;

/// Where the token count comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenSource {
    /// Token count given directly
    Count(u64),
    /// binidx prefix, without `.bin` / `.idx`
    Dataset(String),
}

/// The prime together with the inputs it was computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimeResult {
    pub data_tokens: u64,
    pub ctx_len:     u32,
    pub magic_prime: u64,
}

/// Computes the magic prime for one token source and context length.
pub struct PrimeUseCase {
    source:  TokenSource,
    ctx_len: u32,
}

impl PrimeUseCase {
    pub fn new(source: TokenSource, ctx_len: u32) -> Self {
        Self { source, ctx_len }
    }

    /// Fails when the dataset cannot be read or is too small for any prime.
    pub fn execute(&self) -> Result<PrimeResult> {
        let data_tokens = match &self.source {
            TokenSource::Count(n) => *n,
            TokenSource::Dataset(prefix) => {
                let summary = binidx::read_summary(prefix)
                    .with_context(|| format!("Cannot size dataset '{prefix}'"))?;
                tracing::info!(
                    "Dataset '{}': {} tokens, {} sequences, {} documents",
                    prefix,
                    summary.data_tokens(),
                    summary.sequences,
                    summary.documents.saturating_sub(1),
                );
                summary.data_tokens()
            }
        };

        let Some(prime) = magic_prime(data_tokens, self.ctx_len) else {
            bail!(
                "{} tokens is fewer than three windows of ctx_len {}; no magic prime exists",
                data_tokens,
                self.ctx_len,
            );
        };

        Ok(PrimeResult { data_tokens, ctx_len: self.ctx_len, magic_prime: prime })
    }
}
