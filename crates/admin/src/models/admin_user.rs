//! Admin account domain types.
//!
//! Admin accounts live in `admin.admin_user`, separate from storefront
//! customers. Password hashes never leave [`StoredAdmin`].

use chrono::{DateTime, Utc};
use serde::Serialize;

use amazon_clone_core::{AdminId, Email};

// Re-export AdminRole from core for convenience
pub use amazon_clone_core::AdminRole;

/// An admin account (domain type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminAccount {
    pub id: AdminId,
    pub name: String,
    pub email: Email,
    pub role: AdminRole,
    /// Inactive admins cannot log in and their tokens stop working.
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The short form returned by login and registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminSummary {
    pub id: AdminId,
    pub name: String,
    pub email: Email,
    pub role: AdminRole,
}

impl From<&AdminAccount> for AdminSummary {
    fn from(admin: &AdminAccount) -> Self {
        Self {
            id: admin.id,
            name: admin.name.clone(),
            email: admin.email.clone(),
            role: admin.role,
        }
    }
}

/// An admin together with their password hash.
#[derive(Debug, Clone)]
pub struct StoredAdmin {
    pub admin: AdminAccount,
    pub password_hash: String,
}

/// Everything needed to insert an admin.
#[derive(Debug, Clone)]
pub struct NewAdmin {
    pub name: String,
    pub email: Email,
    pub password_hash: String,
    pub role: AdminRole,
}

/// Fields an admin may change on their own profile.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<Email>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_omits_status_fields() {
        let now = Utc::now();
        let admin = AdminAccount {
            id: AdminId::new(4),
            name: "Ops".to_owned(),
            email: Email::parse("ops@amazon-clone.test").unwrap(),
            role: AdminRole::SuperAdmin,
            is_active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(AdminSummary::from(&admin)).unwrap();
        assert_eq!(json["id"], 4);
        assert_eq!(json["role"], "superadmin");
        assert!(json.get("isActive").is_none());

        let full = serde_json::to_value(&admin).unwrap();
        assert_eq!(full["isActive"], true);
    }
}
