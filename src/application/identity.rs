use anyhow::{Context, anyhow};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{UserId, UserProfile};
use crate::storage::{Mutation, Store, paths};

use super::AppError;

pub const MIN_PASSWORD_LEN: usize = 6;

/// A signed-in session. The token is what clients keep between calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub uid: UserId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Credential {
    uid: UserId,
    email: String,
    password_hash: String,
}

/// Email/password accounts and sessions, stored alongside user data.
pub struct IdentityService {
    store: Arc<dyn Store>,
}

impl IdentityService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Create an account with an empty profile and sign it in.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Session, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidInput("name is required".to_string()));
        }
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::InvalidInput(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let credential_path = paths::credential(&email_key(&email));
        if self.store.read(&credential_path).await?.is_some() {
            return Err(AppError::EmailTaken(email));
        }

        let uid = Uuid::new_v4().to_string();
        let credential = Credential {
            uid: uid.clone(),
            email: email.clone(),
            password_hash: hash_password(password)?,
        };
        let profile = UserProfile::new(uid.clone(), name, email.clone());
        let session = new_session(uid.clone());

        self.store
            .commit(vec![
                Mutation::set(credential_path, encode(&credential)?),
                Mutation::set(paths::profile(&uid), encode(&profile)?),
                Mutation::set(paths::session(&session.token), encode(&session)?),
            ])
            .await?;

        tracing::info!(uid = %uid, "account registered");
        Ok(session)
    }

    /// Check an email and password and open a new session.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Session, AppError> {
        let email = normalize_email(email).map_err(|_| AppError::InvalidCredentials)?;
        let stored = self
            .store
            .read(&paths::credential(&email_key(&email)))
            .await?
            .ok_or(AppError::InvalidCredentials)?;
        let credential: Credential =
            serde_json::from_value(stored).context("Stored credential has invalid fields")?;

        if !verify_password(password, &credential.password_hash)? {
            tracing::warn!("failed sign-in attempt");
            return Err(AppError::InvalidCredentials);
        }

        let session = new_session(credential.uid);
        self.store
            .write(&paths::session(&session.token), encode(&session)?)
            .await?;

        tracing::info!(uid = %session.uid, "signed in");
        Ok(session)
    }

    /// The user a session token belongs to.
    pub async fn resolve(&self, token: &str) -> Result<UserId, AppError> {
        if !paths::is_valid_key(token) {
            return Err(AppError::NotAuthenticated);
        }
        let stored = self
            .store
            .read(&paths::session(token))
            .await?
            .ok_or(AppError::NotAuthenticated)?;
        let session: Session =
            serde_json::from_value(stored).context("Stored session has invalid fields")?;
        Ok(session.uid)
    }

    /// Sign out. Ending an unknown session is not an error.
    pub async fn end_session(&self, token: &str) -> Result<(), AppError> {
        if paths::is_valid_key(token) {
            self.store.write(&paths::session(token), Value::Null).await?;
        }
        Ok(())
    }
}

fn new_session(uid: UserId) -> Session {
    Session {
        token: Uuid::new_v4().simple().to_string(),
        uid,
        created_at: Utc::now(),
    }
}

/// Trim and lowercase an email, rejecting anything that cannot be one.
pub fn normalize_email(email: &str) -> Result<String, AppError> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.contains('@')
        }
        None => false,
    };
    if !valid || !paths::is_valid_key(&email_key(&email)) {
        return Err(AppError::InvalidInput(format!("'{email}' is not a valid email")));
    }
    Ok(email)
}

/// Store key for an email: dots are not allowed in keys.
fn email_key(email: &str) -> String {
    email.replace('.', ",")
}

fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("hash error: {e}"))?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, stored_hash: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| anyhow!("bad stored hash: {e}"))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

fn encode<T: Serialize>(value: &T) -> Result<Value, AppError> {
    Ok(serde_json::to_value(value).context("Failed to encode record")?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(
            normalize_email("  Asha@Example.COM ").unwrap(),
            "asha@example.com"
        );
        assert!(normalize_email("no-at-sign").is_err());
        assert!(normalize_email("@example.com").is_err());
        assert!(normalize_email("asha@localhost").is_err());
        assert!(normalize_email("a/b@example.com").is_err());
    }

    #[test]
    fn test_email_key_has_no_dots() {
        assert_eq!(email_key("a.b@example.com"), "a,b@example,com");
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("hunter22").unwrap();
        assert!(verify_password("hunter22", &hash).unwrap());
        assert!(!verify_password("hunter23", &hash).unwrap());
    }
}
