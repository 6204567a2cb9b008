//! Failed-login bookkeeping per client IP and target email.

use chrono::{DateTime, Duration, Utc};

/// Failures allowed before the pair is locked out.
pub const MAX_FAILED_ATTEMPTS: i32 = 5;

/// Lockout length once the threshold is reached.
pub const LOCKOUT: Duration = Duration::minutes(15);

/// Records untouched for this long are discarded, blocked or not.
pub const ATTEMPT_RETENTION: Duration = Duration::hours(24);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginAttempt {
    pub ip: String,
    pub email: String,
    pub attempts: i32,
    pub last_attempt_at: DateTime<Utc>,
    pub blocked_until: Option<DateTime<Utc>>,
}

impl LoginAttempt {
    #[must_use]
    pub fn is_blocked(&self, now: DateTime<Utc>) -> bool {
        self.blocked_until.is_some_and(|until| until > now)
    }

    /// Whether the failure count has reached the lockout threshold.
    #[must_use]
    pub const fn reached_threshold(&self) -> bool {
        self.attempts >= MAX_FAILED_ATTEMPTS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempt(attempts: i32, now: DateTime<Utc>) -> LoginAttempt {
        LoginAttempt {
            ip: "10.0.0.1".to_owned(),
            email: "asha@example.com".to_owned(),
            attempts,
            last_attempt_at: now,
            blocked_until: None,
        }
    }

    #[test]
    fn test_block_expires() {
        let now = Utc::now();
        let mut record = attempt(5, now);
        record.blocked_until = Some(now + LOCKOUT);
        assert!(record.is_blocked(now + Duration::minutes(14)));
        assert!(!record.is_blocked(now + Duration::minutes(16)));
    }

    #[test]
    fn test_threshold() {
        let now = Utc::now();
        assert!(!attempt(4, now).reached_threshold());
        assert!(attempt(5, now).reached_threshold());
        assert!(!attempt(5, now).is_blocked(now));
    }
}
