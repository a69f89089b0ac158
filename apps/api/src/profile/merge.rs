//! Profile Merge Engine.
//!
//! Stored documents drift: older releases wrote a bare experience array, some
//! documents lack keys, some carry keys this version has never heard of. Every
//! read goes through [`normalize`], which fills the document against the default
//! structure, and every write goes through [`encode`], which serializes the
//! complete [`Profile`]. Known keys are coerced to their expected shape; unknown
//! keys pass through untouched.

use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::warn;
use uuid::Uuid;

use crate::profile::models::{Item, ItemKind, Particulars, Profile, ITEM_ID_KEY};
use crate::storage::{to_indented_json, StoreError};

/// Builds a complete profile from whatever was stored.
///
/// - absent or non-object input yields the default profile;
/// - a top-level array is read as the `experiences` list (legacy layout);
/// - an object is merged over the defaults, `particulars` one level deep;
/// - items without a usable unique `id` get a fresh one.
pub fn normalize(raw: Option<Value>) -> Profile {
    let mut profile = Profile::default();

    match raw {
        Some(Value::Object(document)) => merge_document(&mut profile, document),
        Some(Value::Array(items)) => {
            profile.experiences = collect_items(ItemKind::Experiences, items);
        }
        Some(Value::Null) | None => {}
        Some(other) => warn!("Ignoring profile document of unexpected type: {other}"),
    }

    backfill_ids(&mut profile);
    profile
}

/// Serializes a complete profile as a four-space indented JSON document.
pub fn encode(profile: &Profile) -> Result<Vec<u8>, StoreError> {
    to_indented_json(profile)
}

fn merge_document(profile: &mut Profile, document: Map<String, Value>) {
    for (key, value) in document {
        if let Some(kind) = ItemKind::from_key(&key) {
            match value {
                Value::Array(items) => *profile.items_mut(kind) = collect_items(kind, items),
                Value::Null => {}
                other => warn!("Profile key '{key}' is not a list, using default: {other}"),
            }
            continue;
        }

        match key.as_str() {
            "particulars" => profile.particulars = particulars_from_value(value),
            "ai_custom_prompt" => match value {
                Value::String(text) => profile.ai_custom_prompt = text,
                Value::Null => {}
                other => warn!("ai_custom_prompt is not a string, using default: {other}"),
            },
            _ => {
                profile.extra.insert(key, value);
            }
        }
    }
}

/// Fills particulars against the defaults. Also used for the particulars-replace
/// operation, so a client that sends a subset of fields still gets a complete
/// section.
pub fn particulars_from_value(value: Value) -> Particulars {
    let mut particulars = Particulars::default();
    let fields = match value {
        Value::Object(fields) => fields,
        Value::Null => return particulars,
        other => {
            warn!("particulars is not an object, using default: {other}");
            return particulars;
        }
    };

    for (key, value) in fields {
        match key.as_str() {
            "name" => particulars.name = scalar_text(value, particulars.name),
            "email" => particulars.email = scalar_text(value, particulars.email),
            "country" => particulars.country = scalar_text(value, particulars.country),
            "languages" => particulars.languages = string_list(value),
            _ => {
                particulars.extra.insert(key, value);
            }
        }
    }
    particulars
}

fn scalar_text(value: Value, default: String) -> String {
    match value {
        Value::String(text) => text,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => default,
    }
}

/// Accepts a list of strings or a single comma-separated string.
fn string_list(value: Value) -> Vec<String> {
    match value {
        Value::Array(entries) => entries
            .into_iter()
            .filter_map(|entry| match entry {
                Value::String(text) => Some(text),
                _ => None,
            })
            .collect(),
        Value::String(text) => text
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn collect_items(kind: ItemKind, entries: Vec<Value>) -> Vec<Item> {
    entries
        .into_iter()
        .filter_map(|entry| match entry {
            Value::Object(item) => Some(item),
            other => {
                warn!("Dropping non-object entry from '{}': {other}", kind.key());
                None
            }
        })
        .collect()
}

fn backfill_ids(profile: &mut Profile) {
    for kind in ItemKind::ALL {
        let mut seen = HashSet::new();
        for item in profile.items_mut(kind).iter_mut() {
            let usable = match item.get(ITEM_ID_KEY) {
                Some(Value::String(id)) if !id.is_empty() => seen.insert(id.clone()),
                _ => false,
            };
            if !usable {
                let id = Uuid::new_v4().to_string();
                seen.insert(id.clone());
                item.insert(ITEM_ID_KEY.to_string(), Value::String(id));
            }
        }
    }
}
