// ============================================================
// Layer 3 — Magic Prime
// ============================================================
// The trainer walks the dataset in ctx_len-sized chunks using
// a multiplicative permutation modulo a prime. That prime must:
//
//   1. be prime
//   2. satisfy p % 3 == 2
//   3. sit just below the chunk count: 0.9 < p / chunks <= 1
//
// where chunks = data_tokens / ctx_len (integer division).
//
// Launching never checks any of this. These helpers exist for
// the `prime` and `check` subcommands only.
//
// Reference: Rabin (1980), probabilistic primality testing

/// 6k ± 1 trial division below 2^32, deterministic Miller-Rabin above.
pub fn is_prime(n: u64) -> bool {
    if n <= 1 {
        return false;
    }
    if n <= 3 {
        return true;
    }
    if n % 2 == 0 || n % 3 == 0 {
        return false;
    }
    if n >= 1 << 32 {
        return miller_rabin(n);
    }
    let mut i = 5u64;
    // `i <= n / i` rather than `i * i <= n`: no overflow near u64::MAX
    while i <= n / i {
        if n % i == 0 || n % (i + 2) == 0 {
            return false;
        }
        i += 6;
    }
    true
}

/// These witnesses decide primality for every n < 2^64.
const MR_WITNESSES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

/// Expects odd n > 37.
fn miller_rabin(n: u64) -> bool {
    let d = (n - 1) >> (n - 1).trailing_zeros();
    let s = (n - 1).trailing_zeros();

    'witness: for a in MR_WITNESSES {
        let mut x = pow_mod(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..s {
            x = mul_mod(x, x, n);
            if x == n - 1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

fn mul_mod(a: u64, b: u64, m: u64) -> u64 {
    (u128::from(a) * u128::from(b) % u128::from(m)) as u64
}

fn pow_mod(mut base: u64, mut exp: u64, m: u64) -> u64 {
    let mut acc = 1u64;
    base %= m;
    while exp > 0 {
        if exp & 1 == 1 {
            acc = mul_mod(acc, base, m);
        }
        base = mul_mod(base, base, m);
        exp >>= 1;
    }
    acc
}

/// Largest prime `p ≡ 2 (mod 3)` not exceeding `data_tokens / ctx_len - 1`.
///
/// Returns `None` when the dataset holds fewer than three context windows.
pub fn magic_prime(data_tokens: u64, ctx_len: u32) -> Option<u64> {
    let ctx = u64::from(ctx_len);
    if ctx == 0 || data_tokens < ctx * 3 {
        return None;
    }

    let n_chunk = data_tokens / ctx - 1;
    // n_chunk >= 2 here, so this never underflows
    let start = n_chunk - ((n_chunk - 2) % 3);

    let mut p = start;
    while p > 0 {
        if is_prime(p) {
            return Some(p);
        }
        p = p.checked_sub(3)?;
    }
    None
}

/// A trainer constraint the configured prime breaks.
#[derive(Debug, Clone, PartialEq)]
pub enum PrimeIssue {
    NotPrime,
    WrongResidue { residue: u64 },
    RatioOutOfRange { ratio: f64 },
    ZeroContext,
}

impl std::fmt::Display for PrimeIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrimeIssue::NotPrime => write!(f, "magic_prime is not prime"),
            PrimeIssue::WrongResidue { residue } => {
                write!(f, "magic_prime % 3 is {residue}, expected 2")
            }
            PrimeIssue::RatioOutOfRange { ratio } => write!(
                f,
                "magic_prime / (data_tokens / ctx_len) is {ratio:.6}, expected in (0.9, 1]"
            ),
            PrimeIssue::ZeroContext => write!(f, "ctx_len is 0"),
        }
    }
}

/// Outcome of checking a configured prime against a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct MagicPrimeReport {
    pub magic_prime: u64,
    pub data_tokens: u64,
    pub ctx_len:     u32,
    /// What `magic_prime()` would pick for this dataset
    pub suggested:   Option<u64>,
    pub issues:      Vec<PrimeIssue>,
}

impl MagicPrimeReport {
    pub fn is_consistent(&self) -> bool {
        self.issues.is_empty()
    }
}

pub fn check_magic_prime(prime: u64, data_tokens: u64, ctx_len: u32) -> MagicPrimeReport {
    let mut issues = Vec::new();

    if !is_prime(prime) {
        issues.push(PrimeIssue::NotPrime);
    }
    if prime % 3 != 2 {
        issues.push(PrimeIssue::WrongResidue { residue: prime % 3 });
    }

    if ctx_len == 0 {
        issues.push(PrimeIssue::ZeroContext);
    } else {
        let slots = data_tokens / u64::from(ctx_len);
        let ratio = if slots == 0 { f64::INFINITY } else { prime as f64 / slots as f64 };
        if !(ratio > 0.9 && ratio <= 1.0) {
            issues.push(PrimeIssue::RatioOutOfRange { ratio });
        }
    }

    MagicPrimeReport {
        magic_prime: prime,
        data_tokens,
        ctx_len,
        suggested: magic_prime(data_tokens, ctx_len),
        issues,
    }
}

/// The flag fragment to paste into a run profile.
pub fn exit_flags_line(data_tokens: u64, prime: u64, ctx_len: u32) -> String {
    format!("--my_exit_tokens {data_tokens} --magic_prime {prime} --ctx_len {ctx_len}")
}
