//! Strength checks for secrets read from the environment.
//!
//! Both binaries sign session JWTs with secrets from their environment; these
//! checks refuse to start with a placeholder or low-entropy value.

use std::collections::HashMap;

/// Minimum length for a JWT signing secret.
pub const MIN_SIGNING_SECRET_LENGTH: usize = 32;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Why a secret was rejected.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum WeakSecret {
    #[error("appears to be a placeholder (contains '{0}')")]
    Placeholder(&'static str),
    #[error(
        "entropy too low ({0:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
    )]
    LowEntropy(f64),
    #[error("must be at least {MIN_SIGNING_SECRET_LENGTH} characters (got {0})")]
    TooShort(usize),
}

/// Calculate Shannon entropy in bits per character.
#[must_use]
pub fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Reject placeholder-looking or low-entropy secrets.
///
/// # Errors
///
/// Returns the first rule the secret breaks.
pub fn check_secret_strength(secret: &str) -> Result<(), WeakSecret> {
    let lower = secret.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(WeakSecret::Placeholder(*pattern));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(WeakSecret::LowEntropy(entropy));
    }

    Ok(())
}

/// [`check_secret_strength`] plus the minimum signing-key length.
///
/// # Errors
///
/// Returns the first rule the secret breaks.
pub fn check_signing_secret(secret: &str) -> Result<(), WeakSecret> {
    let len = secret.chars().count();
    if len < MIN_SIGNING_SECRET_LENGTH {
        return Err(WeakSecret::TooShort(len));
    }
    check_secret_strength(secret)
}
