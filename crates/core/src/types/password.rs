//! Password policy shared by customer and admin accounts.

use core::fmt;

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// A single rule a candidate password failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordViolation {
    Empty,
    TooShort,
    MissingUppercase,
    MissingLowercase,
    MissingDigit,
    MissingSpecial,
}

impl fmt::Display for PasswordViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::Empty => "Password can't be empty",
            Self::TooShort => "Password must be at least 8 characters long",
            Self::MissingUppercase => "Password must contain an uppercase letter",
            Self::MissingLowercase => "Password must contain a lowercase letter",
            Self::MissingDigit => "Password must contain a number",
            Self::MissingSpecial => "Password must contain a special character",
        };
        f.write_str(msg)
    }
}

/// Check a password against the policy and return every rule it breaks.
///
/// An empty result means the password is acceptable. Special characters are
/// any ASCII punctuation or non-ASCII symbol that is not alphanumeric or
/// whitespace.
#[must_use]
pub fn check_password_policy(password: &str) -> Vec<PasswordViolation> {
    if password.is_empty() {
        return vec![PasswordViolation::Empty];
    }

    let mut violations = Vec::new();
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        violations.push(PasswordViolation::TooShort);
    }
    if !password.chars().any(char::is_uppercase) {
        violations.push(PasswordViolation::MissingUppercase);
    }
    if !password.chars().any(char::is_lowercase) {
        violations.push(PasswordViolation::MissingLowercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        violations.push(PasswordViolation::MissingDigit);
    }
    if !password
        .chars()
        .any(|c| !c.is_alphanumeric() && !c.is_whitespace())
    {
        violations.push(PasswordViolation::MissingSpecial);
    }
    violations
}
