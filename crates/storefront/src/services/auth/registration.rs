//! OTP-gated signup.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use amazon_clone_core::{Email, PhoneNumber, User, check_password_policy};

use super::{AuthError, hash_password};
use crate::db::RepositoryError;
use crate::models::PendingRegistration;
use crate::models::registration::OTP_TTL;
use crate::services::email::{OtpMailer, generate_otp};
use crate::store::{PendingRegistrationStore, UserStore};

/// Signup form as submitted by the client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

/// Fields that passed validation.
struct ValidSignup {
    name: String,
    number: PhoneNumber,
    email: Email,
}

impl RegistrationInput {
    /// Check every field, collecting all messages rather than stopping at the first.
    fn validate(&self) -> Result<ValidSignup, AuthError> {
        let mut errors = Vec::new();

        let name = self.name.trim();
        if name.is_empty() {
            errors.push("Name can't be empty".to_owned());
        }

        let number = PhoneNumber::parse(&self.number)
            .map_err(|e| errors.push(e.to_string()))
            .ok();

        errors.extend(
            check_password_policy(&self.password)
                .iter()
                .map(ToString::to_string),
        );

        if self.confirm_password.is_empty() {
            errors.push("Confirm Password can't be empty".to_owned());
        }

        let email = Email::parse(&self.email)
            .map_err(|e| errors.push(e.to_string()))
            .ok();

        match (number, email) {
            (Some(number), Some(email)) if errors.is_empty() => Ok(ValidSignup {
                name: name.to_owned(),
                number,
                email,
            }),
            _ => Err(AuthError::Validation(errors)),
        }
    }
}

/// Orchestrates signup and OTP confirmation.
pub struct RegistrationService<'a, U, P, M> {
    users: &'a U,
    pending: &'a P,
    mailer: &'a M,
}

impl<'a, U, P, M> RegistrationService<'a, U, P, M>
where
    U: UserStore,
    P: PendingRegistrationStore,
    M: OtpMailer,
{
    #[must_use]
    pub const fn new(users: &'a U, pending: &'a P, mailer: &'a M) -> Self {
        Self {
            users,
            pending,
            mailer,
        }
    }

    /// Park a validated signup and mail its OTP. No user is created here.
    ///
    /// Returns the normalized email the OTP was sent to. A failed send is
    /// logged and does not discard the pending record.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` for malformed fields or mismatched
    /// passwords, and `AuthError::Duplicate` if the email or number belongs to
    /// a confirmed account.
    #[tracing::instrument(skip(self, input), fields(email = %input.email.trim()))]
    pub async fn register(
        &self,
        input: RegistrationInput,
        now: DateTime<Utc>,
    ) -> Result<Email, AuthError> {
        let signup = input.validate()?;

        if self.users.email_exists(&signup.email).await? {
            return Err(AuthError::Duplicate("Email already registered"));
        }
        if self.users.number_exists(&signup.number).await? {
            return Err(AuthError::Duplicate("Number already registered"));
        }
        if input.password != input.confirm_password {
            return Err(AuthError::Validation(vec!["Passwords don't match".to_owned()]));
        }

        let pending = PendingRegistration {
            email: signup.email,
            name: signup.name,
            number: signup.number,
            password_hash: hash_password(&input.password)?,
            otp: generate_otp(),
            otp_expires_at: now + OTP_TTL,
            created_at: now,
        };
        self.pending.upsert(&pending).await?;

        if let Err(e) = self
            .mailer
            .send_otp(pending.email.as_str(), &pending.name, &pending.otp)
            .await
        {
            tracing::error!(error = %e, email = %pending.email, "Failed to send OTP email");
        }

        tracing::info!(email = %pending.email, "Registration pending OTP confirmation");
        Ok(pending.email)
    }

    /// Confirm a signup. A wrong or late code discards the pending record.
    ///
    /// The code is checked against the stored record in the same step that
    /// consumes it, so a signup superseded meanwhile can never be confirmed.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidOrExpiredOtp` if nothing matches in time.
    #[tracing::instrument(skip(self, otp))]
    pub async fn verify_otp(
        &self,
        email: &str,
        otp: &str,
        now: DateTime<Utc>,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidOrExpiredOtp)?;

        let promoted = self
            .pending
            .promote(&email, otp.trim(), now)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::Duplicate("Email already registered"),
                other => AuthError::Repository(other),
            })?;

        let Some(user) = promoted else {
            self.pending.delete(&email).await?;
            tracing::info!(email = %email, "Discarded pending registration after failed OTP");
            return Err(AuthError::InvalidOrExpiredOtp);
        };

        tracing::info!(user_id = %user.id, "Account confirmed");
        Ok(user)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::services::testing::{MemoryStore, RecordingMailer};

    fn input(email: &str, number: &str) -> RegistrationInput {
        RegistrationInput {
            name: "Asha Rao".to_owned(),
            number: number.to_owned(),
            email: email.to_owned(),
            password: "Secur3!pass".to_owned(),
            confirm_password: "Secur3!pass".to_owned(),
        }
    }

    #[tokio::test]
    async fn test_register_creates_pending_not_user() {
        let store = MemoryStore::default();
        let mailer = RecordingMailer::default();
        let service = RegistrationService::new(&store, &store, &mailer);

        let email = service
            .register(input("Asha@Example.com", "9876543210"), Utc::now())
            .await
            .unwrap();

        assert_eq!(email.as_str(), "asha@example.com");
        assert_eq!(store.user_count(), 0);
        let pending = store.pending("asha@example.com").unwrap();
        assert_eq!(pending.otp.len(), 6);
        assert_ne!(pending.password_hash, "Secur3!pass");
        assert_eq!(mailer.sent(), vec![("asha@example.com".to_owned(), pending.otp)]);
    }

    #[tokio::test]
    async fn test_register_collects_validation_errors() {
        let store = MemoryStore::default();
        let mailer = RecordingMailer::default();
        let service = RegistrationService::new(&store, &store, &mailer);

        let bad = RegistrationInput {
            name: "  ".to_owned(),
            number: "12ab".to_owned(),
            email: "not-an-email".to_owned(),
            password: "short".to_owned(),
            confirm_password: String::new(),
        };
        let Err(AuthError::Validation(errors)) = service.register(bad, Utc::now()).await else {
            panic!("expected validation error");
        };

        assert!(errors.contains(&"Name can't be empty".to_owned()));
        assert!(errors.contains(&"Number must only consist of digits".to_owned()));
        assert!(errors.contains(&"Confirm Password can't be empty".to_owned()));
        assert!(errors.contains(&"Email format is invalid".to_owned()));
        assert!(errors.iter().any(|e| e.contains("at least 8 characters")));
        assert!(store.pending("not-an-email").is_none());
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates_and_mismatch() {
        let store = MemoryStore::default();
        store.insert_user("asha@example.com", "9876543210", "Secur3!pass", true);
        let mailer = RecordingMailer::default();
        let service = RegistrationService::new(&store, &store, &mailer);

        let dup_email = service
            .register(input("asha@example.com", "9000000000"), Utc::now())
            .await;
        assert!(matches!(dup_email, Err(AuthError::Duplicate("Email already registered"))));

        let dup_number = service
            .register(input("new@example.com", "9876543210"), Utc::now())
            .await;
        assert!(matches!(dup_number, Err(AuthError::Duplicate("Number already registered"))));

        let mut mismatch = input("new@example.com", "9000000000");
        mismatch.confirm_password = "Different1!".to_owned();
        let Err(AuthError::Validation(errors)) = service.register(mismatch, Utc::now()).await
        else {
            panic!("expected mismatch");
        };
        assert_eq!(errors, vec!["Passwords don't match".to_owned()]);
    }

    #[tokio::test]
    async fn test_second_registration_supersedes_first() {
        let store = MemoryStore::default();
        let mailer = RecordingMailer::default();
        let service = RegistrationService::new(&store, &store, &mailer);
        let now = Utc::now();

        service
            .register(input("asha@example.com", "9876543210"), now)
            .await
            .unwrap();
        store.set_pending_otp("asha@example.com", "111111");
        service
            .register(input("asha@example.com", "9876543210"), now)
            .await
            .unwrap();
        let second = store.pending("asha@example.com").unwrap().otp;

        assert_eq!(store.pending_count(), 1);
        assert_ne!(second, "111111");

        let stale = service.verify_otp("asha@example.com", "111111", now).await;
        assert!(matches!(stale, Err(AuthError::InvalidOrExpiredOtp)));
    }

    #[tokio::test]
    async fn test_mail_failure_keeps_pending_record() {
        let store = MemoryStore::default();
        let mailer = RecordingMailer::failing();
        let service = RegistrationService::new(&store, &store, &mailer);

        service
            .register(input("asha@example.com", "9876543210"), Utc::now())
            .await
            .unwrap();
        assert!(store.pending("asha@example.com").is_some());
    }

    #[tokio::test]
    async fn test_verify_otp_promotes_pending() {
        let store = MemoryStore::default();
        let mailer = RecordingMailer::default();
        let service = RegistrationService::new(&store, &store, &mailer);
        let now = Utc::now();

        service
            .register(input("asha@example.com", "9876543210"), now)
            .await
            .unwrap();
        let otp = store.pending("asha@example.com").unwrap().otp;

        let user = service
            .verify_otp("asha@example.com", &otp, now + Duration::minutes(2))
            .await
            .unwrap();

        assert!(user.is_verified);
        assert_eq!(user.name, "Asha Rao");
        assert_eq!(store.user_count(), 1);
        assert!(store.pending("asha@example.com").is_none());
    }

    #[tokio::test]
    async fn test_wrong_otp_deletes_pending_and_creates_nothing() {
        let store = MemoryStore::default();
        let mailer = RecordingMailer::default();
        let service = RegistrationService::new(&store, &store, &mailer);
        let now = Utc::now();

        service
            .register(input("asha@example.com", "9876543210"), now)
            .await
            .unwrap();
        store.set_pending_otp("asha@example.com", "482913");

        for _ in 0..2 {
            let result = service.verify_otp("asha@example.com", "000000", now).await;
            assert!(matches!(result, Err(AuthError::InvalidOrExpiredOtp)));
        }
        assert!(store.pending("asha@example.com").is_none());
        assert_eq!(store.user_count(), 0);

        let late = service.verify_otp("asha@example.com", "482913", now).await;
        assert!(matches!(late, Err(AuthError::InvalidOrExpiredOtp)));
    }

    #[tokio::test]
    async fn test_expired_otp_is_rejected() {
        let store = MemoryStore::default();
        let mailer = RecordingMailer::default();
        let service = RegistrationService::new(&store, &store, &mailer);
        let now = Utc::now();

        service
            .register(input("asha@example.com", "9876543210"), now)
            .await
            .unwrap();
        let otp = store.pending("asha@example.com").unwrap().otp;

        let result = service
            .verify_otp("asha@example.com", &otp, now + Duration::minutes(6))
            .await;
        assert!(matches!(result, Err(AuthError::InvalidOrExpiredOtp)));
        assert_eq!(store.user_count(), 0);
        assert!(store.pending("asha@example.com").is_none());
    }

    #[tokio::test]
    async fn test_superseded_code_never_confirms_old_details() {
        let store = MemoryStore::default();
        let mailer = RecordingMailer::default();
        let service = RegistrationService::new(&store, &store, &mailer);
        let now = Utc::now();
        let email = Email::parse("asha@example.com").unwrap();

        service
            .register(input("asha@example.com", "9876543210"), now)
            .await
            .unwrap();
        store.set_pending_otp("asha@example.com", "111111");

        let mut resubmitted = input("asha@example.com", "9000000000");
        resubmitted.name = "Asha R".to_owned();
        service.register(resubmitted, now).await.unwrap();
        store.set_pending_otp("asha@example.com", "222222");

        // The old code must not consume the newer record.
        let stale = store.promote(&email, "111111", now).await.unwrap();
        assert!(stale.is_none());
        assert_eq!(store.user_count(), 0);
        assert!(store.pending("asha@example.com").is_some());

        let user = service
            .verify_otp("asha@example.com", "222222", now)
            .await
            .unwrap();
        assert_eq!(user.name, "Asha R");
        assert_eq!(user.number.as_str(), "9000000000");
        assert!(store.pending("asha@example.com").is_none());
    }

    #[tokio::test]
    async fn test_failed_verify_discards_record_past_retention() {
        let store = MemoryStore::default();
        let mailer = RecordingMailer::default();
        let service = RegistrationService::new(&store, &store, &mailer);
        let registered_at = Utc::now() - Duration::minutes(20);

        service
            .register(input("asha@example.com", "9876543210"), registered_at)
            .await
            .unwrap();
        let otp = store.pending("asha@example.com").unwrap().otp;

        let result = service.verify_otp("asha@example.com", &otp, Utc::now()).await;
        assert!(matches!(result, Err(AuthError::InvalidOrExpiredOtp)));
        assert!(store.pending("asha@example.com").is_none());
        assert_eq!(store.user_count(), 0);
    }
}
