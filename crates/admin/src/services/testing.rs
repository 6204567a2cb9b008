//! In-memory admin store for service tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use amazon_clone_core::{AdminId, Email};

use super::auth::hash_password;
use crate::db::RepositoryError;
use crate::models::{AdminAccount, AdminRole, NewAdmin, ProfileUpdate, StoredAdmin};
use crate::store::AdminStore;

#[derive(Default)]
struct State {
    admins: Vec<StoredAdmin>,
    tokens: Vec<(AdminId, Uuid)>,
}

#[derive(Default)]
pub struct MemoryAdminStore {
    state: Mutex<State>,
}

impl MemoryAdminStore {
    fn with<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
        f(&mut self.state.lock().unwrap())
    }

    pub fn insert(&self, email: &str, password: &str, role: AdminRole, active: bool) -> AdminId {
        let hash = hash_password(password).unwrap();
        self.with(|s| {
            let id = AdminId::new(i32::try_from(s.admins.len()).unwrap() + 1);
            let now = Utc::now();
            s.admins.push(StoredAdmin {
                admin: AdminAccount {
                    id,
                    name: "Store Ops".to_owned(),
                    email: Email::parse(email).unwrap(),
                    role,
                    is_active: active,
                    last_login_at: None,
                    created_at: now,
                    updated_at: now,
                },
                password_hash: hash,
            });
            id
        })
    }

    pub fn set_active(&self, id: AdminId, active: bool) {
        self.with(|s| {
            if let Some(stored) = s.admins.iter_mut().find(|a| a.admin.id == id) {
                stored.admin.is_active = active;
            }
        });
    }

    pub fn token_ids(&self, id: AdminId) -> Vec<Uuid> {
        self.with(|s| {
            s.tokens
                .iter()
                .filter(|(owner, _)| *owner == id)
                .map(|(_, jti)| *jti)
                .collect()
        })
    }
}

impl AdminStore for MemoryAdminStore {
    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<StoredAdmin>, RepositoryError> {
        Ok(self.with(|s| s.admins.iter().find(|a| a.admin.email == *email).cloned()))
    }

    async fn find_by_id(&self, id: AdminId) -> Result<Option<AdminAccount>, RepositoryError> {
        Ok(self.with(|s| {
            s.admins
                .iter()
                .find(|a| a.admin.id == id)
                .map(|a| a.admin.clone())
        }))
    }

    async fn password_hash(&self, id: AdminId) -> Result<Option<String>, RepositoryError> {
        Ok(self.with(|s| {
            s.admins
                .iter()
                .find(|a| a.admin.id == id)
                .map(|a| a.password_hash.clone())
        }))
    }

    async fn create(&self, new: &NewAdmin) -> Result<AdminAccount, RepositoryError> {
        self.with(|s| {
            if s.admins.iter().any(|a| a.admin.email == new.email) {
                return Err(RepositoryError::Conflict(
                    "Admin with this email already exists".to_owned(),
                ));
            }
            let now = Utc::now();
            let admin = AdminAccount {
                id: AdminId::new(i32::try_from(s.admins.len()).unwrap() + 1),
                name: new.name.clone(),
                email: new.email.clone(),
                role: new.role,
                is_active: true,
                last_login_at: None,
                created_at: now,
                updated_at: now,
            };
            s.admins.push(StoredAdmin {
                admin: admin.clone(),
                password_hash: new.password_hash.clone(),
            });
            Ok(admin)
        })
    }

    async fn update_profile(
        &self,
        id: AdminId,
        update: &ProfileUpdate,
    ) -> Result<Option<AdminAccount>, RepositoryError> {
        self.with(|s| {
            if let Some(email) = &update.email
                && s.admins
                    .iter()
                    .any(|a| a.admin.id != id && a.admin.email == *email)
            {
                return Err(RepositoryError::Conflict(
                    "Admin with this email already exists".to_owned(),
                ));
            }
            let Some(stored) = s.admins.iter_mut().find(|a| a.admin.id == id) else {
                return Ok(None);
            };
            if let Some(name) = &update.name {
                stored.admin.name.clone_from(name);
            }
            if let Some(email) = &update.email {
                stored.admin.email = email.clone();
            }
            stored.admin.updated_at = Utc::now();
            Ok(Some(stored.admin.clone()))
        })
    }

    async fn set_password_hash(&self, id: AdminId, hash: &str) -> Result<(), RepositoryError> {
        self.with(|s| {
            if let Some(stored) = s.admins.iter_mut().find(|a| a.admin.id == id) {
                hash.clone_into(&mut stored.password_hash);
            }
        });
        Ok(())
    }

    async fn record_login(&self, id: AdminId, at: DateTime<Utc>) -> Result<(), RepositoryError> {
        self.with(|s| {
            if let Some(stored) = s.admins.iter_mut().find(|a| a.admin.id == id) {
                stored.admin.last_login_at = Some(at);
            }
        });
        Ok(())
    }

    async fn add_token(
        &self,
        id: AdminId,
        jti: Uuid,
        _expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        self.with(|s| s.tokens.push((id, jti)));
        Ok(())
    }

    async fn has_token(&self, id: AdminId, jti: Uuid) -> Result<bool, RepositoryError> {
        Ok(self.with(|s| s.tokens.contains(&(id, jti))))
    }

    async fn remove_token(&self, id: AdminId, jti: Uuid) -> Result<(), RepositoryError> {
        self.with(|s| s.tokens.retain(|t| *t != (id, jti)));
        Ok(())
    }

    async fn remove_other_tokens(&self, id: AdminId, keep: Uuid) -> Result<u64, RepositoryError> {
        Ok(self.with(|s| {
            let before = s.tokens.len();
            s.tokens
                .retain(|(owner, jti)| *owner != id || *jti == keep);
            (before - s.tokens.len()) as u64
        }))
    }
}
