//! Credential Store: `passwords.json`, a map of profile name to argon2 PHC hash.
//!
//! Independent of profile documents: registering writes the credential first and
//! the default profile second, with no atomicity between the two. A crash in
//! between leaves a credential without a document, which reads as defaults.

use std::collections::BTreeMap;

use anyhow::anyhow;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::rngs::OsRng;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::profile::service::create_profile_if_absent;
use crate::storage::keys::{ProfileName, PASSWORDS_KEY};
use crate::storage::{read_json, write_json, DocumentStore, JsonRead, StoreError};

pub type PasswordTable = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Existing profile, password verified.
    Verified,
    /// Unknown profile name; a credential record and default profile were created.
    Registered,
}

/// A missing table is empty. An unreadable one is an error: registration writes
/// the table back, so reading it as empty would erase every other credential.
pub async fn load_password_table(store: &dyn DocumentStore) -> Result<PasswordTable, StoreError> {
    match read_json::<PasswordTable>(store, PASSWORDS_KEY).await? {
        JsonRead::Found(table) => Ok(table),
        JsonRead::Absent => Ok(PasswordTable::new()),
        JsonRead::Unreadable => Err(StoreError::Unreadable(PASSWORDS_KEY.to_string())),
    }
}

/// Verifies `password` for an existing profile or registers a new one.
pub async fn authenticate(
    store: &dyn DocumentStore,
    profile: &ProfileName,
    password: &str,
) -> Result<LoginOutcome, AppError> {
    let mut table = load_password_table(store).await?;

    if let Some(hash) = table.get(profile.as_str()) {
        if verify_password(hash.clone(), password.to_string()).await? {
            return Ok(LoginOutcome::Verified);
        }
        warn!("Incorrect password for profile '{profile}'");
        return Err(AppError::IncorrectPassword);
    }

    let hash = hash_password(password.to_string()).await?;
    table.insert(profile.as_str().to_string(), hash);
    write_json(store, PASSWORDS_KEY, &table).await?;
    create_profile_if_absent(store, profile).await?;

    info!("Registered new profile '{profile}'");
    Ok(LoginOutcome::Registered)
}

/// argon2id with a random salt, computed on the blocking pool.
pub async fn hash_password(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| anyhow!("password hashing failed: {e}"))
    })
    .await
    .map_err(|e| anyhow!("password hashing task failed: {e}"))?
    .map_err(AppError::Internal)
}

/// A stored value that is not a PHC string never verifies.
pub async fn verify_password(hash: String, password: String) -> Result<bool, AppError> {
    let verified = tokio::task::spawn_blocking(move || match PasswordHash::new(&hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!("Stored password hash is not a recognised PHC string: {e}");
            false
        }
    })
    .await
    .map_err(|e| anyhow!("password verification task failed: {e}"))?;
    Ok(verified)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStore;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn name(raw: &str) -> ProfileName {
        ProfileName::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn test_hash_then_verify() {
        let hash = hash_password("hunter2".into()).await.unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(hash.clone(), "hunter2".into()).await.unwrap());
        assert!(!verify_password(hash, "hunter3".into()).await.unwrap());
    }

    #[tokio::test]
    async fn test_foreign_hash_format_never_verifies() {
        let legacy = "pbkdf2:sha256:600000$salt$abcdef".to_string();
        assert!(!verify_password(legacy, "anything".into()).await.unwrap());
    }

    #[tokio::test]
    async fn test_first_login_registers_then_verifies() {
        let store = MemoryStore::new();
        let alice = name("alice");

        assert_eq!(
            authenticate(&store, &alice, "s3cret").await.unwrap(),
            LoginOutcome::Registered
        );
        assert!(store.exists("alice/profile.json").await.unwrap());
        assert!(load_password_table(&store).await.unwrap().contains_key("alice"));

        assert_eq!(
            authenticate(&store, &alice, "s3cret").await.unwrap(),
            LoginOutcome::Verified
        );
        assert!(matches!(
            authenticate(&store, &alice, "wrong").await,
            Err(AppError::IncorrectPassword)
        ));
    }

    /// Delegates to a `MemoryStore`, failing the next `get` when armed.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail_next_get: AtomicBool,
    }

    #[async_trait]
    impl DocumentStore for FlakyStore {
        async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
            if self.fail_next_get.swap(false, Ordering::SeqCst) {
                return Err(StoreError::S3("connection reset".to_string()));
            }
            self.inner.get(key).await
        }

        async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), StoreError> {
            self.inner.put(key, body, content_type).await
        }

        async fn exists(&self, key: &str) -> Result<bool, StoreError> {
            self.inner.exists(key).await
        }

        async fn delete(&self, key: &str) -> Result<(), StoreError> {
            self.inner.delete(key).await
        }
    }

    #[tokio::test]
    async fn test_failed_table_read_does_not_register_over_existing_credentials() {
        let store = FlakyStore::default();
        authenticate(&store, &name("alice"), "s3cret").await.unwrap();

        store.fail_next_get.store(true, Ordering::SeqCst);
        let err = authenticate(&store, &name("mallory"), "x").await.unwrap_err();
        assert!(matches!(err, AppError::Storage(StoreError::Unreadable(_))));

        let table = load_password_table(&store).await.unwrap();
        assert!(table.contains_key("alice"));
        assert!(!table.contains_key("mallory"));
        assert_eq!(
            authenticate(&store, &name("alice"), "s3cret").await.unwrap(),
            LoginOutcome::Verified
        );
        assert!(matches!(
            authenticate(&store, &name("alice"), "other").await,
            Err(AppError::IncorrectPassword)
        ));
    }

    #[tokio::test]
    async fn test_malformed_table_is_left_untouched() {
        let store = MemoryStore::new();
        let corrupt = Bytes::from_static(b"{\"alice\": 5}");
        store
            .put(PASSWORDS_KEY, corrupt.clone(), "application/json")
            .await
            .unwrap();

        assert!(matches!(
            authenticate(&store, &name("bob"), "b").await,
            Err(AppError::Storage(StoreError::Unreadable(_)))
        ));
        assert_eq!(store.get(PASSWORDS_KEY).await.unwrap(), Some(corrupt));
        assert!(!store.exists("bob/profile.json").await.unwrap());
    }

    #[tokio::test]
    async fn test_registration_keeps_other_credentials() {
        let store = MemoryStore::new();
        authenticate(&store, &name("alice"), "a").await.unwrap();
        authenticate(&store, &name("bob"), "b").await.unwrap();

        let table = load_password_table(&store).await.unwrap();
        assert_eq!(table.len(), 2);
    }
}
