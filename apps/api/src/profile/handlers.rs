//! Axum route handlers for the Profile API.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::AuthedProfile;
use crate::errors::AppError;
use crate::profile::merge::particulars_from_value;
use crate::profile::models::{Item, ItemKind, Profile};
use crate::profile::service;
use crate::routes::success;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ParticularsRequest {
    pub particulars: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct CustomPromptRequest {
    pub ai_custom_prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ItemRequest {
    pub item: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct NewItemResponse {
    pub status: &'static str,
    #[serde(rename = "newItem")]
    pub new_item: Item,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub profile_name: String,
    pub profile: Profile,
}

fn parse_kind(raw: &str) -> Result<ItemKind, AppError> {
    ItemKind::from_key(raw).ok_or_else(|| AppError::Validation("Invalid item type".to_string()))
}

fn require_object(value: Option<Value>, what: &str) -> Result<Item, AppError> {
    match value {
        Some(Value::Object(map)) if !map.is_empty() => Ok(map),
        _ => Err(AppError::Validation(format!("Missing {what} data"))),
    }
}

/// GET /api/v1/profile
pub async fn handle_get_profile(
    State(state): State<AppState>,
    AuthedProfile(profile): AuthedProfile,
) -> Result<Json<ProfileResponse>, AppError> {
    let data = service::load_profile(state.store.as_ref(), &profile).await?;
    Ok(Json(ProfileResponse {
        profile_name: profile.to_string(),
        profile: data,
    }))
}

/// PUT /api/v1/profile/particulars
pub async fn handle_update_particulars(
    State(state): State<AppState>,
    AuthedProfile(profile): AuthedProfile,
    Json(req): Json<ParticularsRequest>,
) -> Result<Json<Value>, AppError> {
    let fields = require_object(req.particulars, "particulars")?;
    let particulars = particulars_from_value(Value::Object(fields));
    service::replace_particulars(state.store.as_ref(), &profile, particulars).await?;
    Ok(success("Particulars updated successfully."))
}

/// PUT /api/v1/profile/custom-prompt
pub async fn handle_update_custom_prompt(
    State(state): State<AppState>,
    AuthedProfile(profile): AuthedProfile,
    Json(req): Json<CustomPromptRequest>,
) -> Result<Json<Value>, AppError> {
    let prompt = req
        .ai_custom_prompt
        .ok_or_else(|| AppError::Validation("Missing custom prompt data".to_string()))?;
    service::set_custom_prompt(state.store.as_ref(), &profile, prompt).await?;
    Ok(success("Custom AI instructions updated."))
}

/// POST /api/v1/profile/:kind
pub async fn handle_add_item(
    State(state): State<AppState>,
    AuthedProfile(profile): AuthedProfile,
    Path(kind): Path<String>,
    Json(req): Json<ItemRequest>,
) -> Result<Json<NewItemResponse>, AppError> {
    let kind = parse_kind(&kind)?;
    let item = require_object(req.item, kind.key())?;
    let new_item = service::append_item(state.store.as_ref(), &profile, kind, item).await?;
    Ok(Json(NewItemResponse {
        status: "success",
        new_item,
    }))
}

/// PUT /api/v1/profile/:kind/:id
pub async fn handle_update_item(
    State(state): State<AppState>,
    AuthedProfile(profile): AuthedProfile,
    Path((kind, id)): Path<(String, String)>,
    Json(req): Json<ItemRequest>,
) -> Result<Json<Value>, AppError> {
    let kind = parse_kind(&kind)?;
    let item = require_object(req.item, kind.key())?;
    service::update_item(state.store.as_ref(), &profile, kind, &id, item).await?;
    Ok(success("Item updated."))
}

/// DELETE /api/v1/profile/:kind/:id
pub async fn handle_delete_item(
    State(state): State<AppState>,
    AuthedProfile(profile): AuthedProfile,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    let kind = parse_kind(&kind)?;
    service::delete_item(state.store.as_ref(), &profile, kind, &id).await?;
    Ok(success("Item deleted."))
}
