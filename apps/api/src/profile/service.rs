//! Read-modify-write operations on a profile document.
//!
//! Each operation loads the normalized document, applies one change and writes
//! it back. There is no locking: two concurrent writers to the same profile race
//! and the last write wins.

use bytes::Bytes;
use serde_json::Value;
use tracing::info;

use crate::errors::AppError;
use crate::profile::merge::{encode, normalize};
use crate::profile::models::{Item, ItemKind, Particulars, Profile};
use crate::storage::keys::{self, ProfileName};
use crate::storage::{read_json, DocumentStore, StoreError, JSON_CONTENT_TYPE};

/// Loads a profile. Missing, unreadable or malformed documents yield defaults.
pub async fn load_profile(
    store: &dyn DocumentStore,
    profile: &ProfileName,
) -> Result<Profile, StoreError> {
    let raw = read_json::<Value>(store, &keys::profile_document(profile))
        .await?
        .into_option();
    Ok(normalize(raw))
}

pub async fn save_profile(
    store: &dyn DocumentStore,
    profile: &ProfileName,
    data: &Profile,
) -> Result<(), StoreError> {
    let body = encode(data)?;
    store
        .put(&keys::profile_document(profile), Bytes::from(body), JSON_CONTENT_TYPE)
        .await
}

/// Writes a default document unless one already exists. Returns whether it wrote.
pub async fn create_profile_if_absent(
    store: &dyn DocumentStore,
    profile: &ProfileName,
) -> Result<bool, StoreError> {
    if store.exists(&keys::profile_document(profile)).await? {
        return Ok(false);
    }
    save_profile(store, profile, &Profile::default()).await?;
    info!("Created default profile document for '{profile}'");
    Ok(true)
}

pub async fn replace_particulars(
    store: &dyn DocumentStore,
    profile: &ProfileName,
    particulars: Particulars,
) -> Result<(), AppError> {
    let mut data = load_profile(store, profile).await?;
    data.particulars = particulars;
    save_profile(store, profile, &data).await?;
    Ok(())
}

pub async fn set_custom_prompt(
    store: &dyn DocumentStore,
    profile: &ProfileName,
    prompt: String,
) -> Result<(), AppError> {
    let mut data = load_profile(store, profile).await?;
    data.ai_custom_prompt = prompt;
    save_profile(store, profile, &data).await?;
    Ok(())
}

/// Appends `item` with a newly assigned id and returns the stored item.
pub async fn append_item(
    store: &dyn DocumentStore,
    profile: &ProfileName,
    kind: ItemKind,
    item: Item,
) -> Result<Item, AppError> {
    if item.is_empty() {
        return Err(AppError::Validation(format!("Missing {} data", kind.key())));
    }

    let mut data = load_profile(store, profile).await?;
    let stored = data.append_item(kind, item);
    save_profile(store, profile, &data).await?;
    Ok(stored)
}

pub async fn update_item(
    store: &dyn DocumentStore,
    profile: &ProfileName,
    kind: ItemKind,
    id: &str,
    item: Item,
) -> Result<(), AppError> {
    let mut data = load_profile(store, profile).await?;
    if !data.update_item(kind, id, item) {
        return Err(AppError::NotFound("Item not found".to_string()));
    }
    save_profile(store, profile, &data).await?;
    Ok(())
}

pub async fn delete_item(
    store: &dyn DocumentStore,
    profile: &ProfileName,
    kind: ItemKind,
    id: &str,
) -> Result<(), AppError> {
    let mut data = load_profile(store, profile).await?;
    if !data.remove_item(kind, id) {
        return Err(AppError::NotFound("Item not found".to_string()));
    }
    save_profile(store, profile, &data).await?;
    Ok(())
}
