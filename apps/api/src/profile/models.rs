use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

/// An experience, education, project or award entry.
///
/// Items are open-ended: the front-end decides which fields exist, so the only
/// key the server relies on is `id`. Key order is preserved.
pub type Item = Map<String, Value>;

pub const ITEM_ID_KEY: &str = "id";

/// The four item lists of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Experiences,
    Education,
    Projects,
    Awards,
}

impl ItemKind {
    pub const ALL: [ItemKind; 4] = [
        ItemKind::Experiences,
        ItemKind::Education,
        ItemKind::Projects,
        ItemKind::Awards,
    ];

    /// The document key, which is also the URL segment.
    pub fn key(self) -> &'static str {
        match self {
            ItemKind::Experiences => "experiences",
            ItemKind::Education => "education",
            ItemKind::Projects => "projects",
            ItemKind::Awards => "awards",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }
}

/// Contact and identity section. Unknown sub-keys (e.g. the `links` list written by
/// older releases) are carried in `extra` and written back untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Particulars {
    pub name: String,
    pub email: String,
    pub country: String,
    pub languages: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A user's complete career-data document.
///
/// Always complete: every top-level key exists whatever the stored document
/// looked like. Build one from stored JSON with [`super::merge::normalize`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Profile {
    pub particulars: Particulars,
    pub experiences: Vec<Item>,
    pub education: Vec<Item>,
    pub projects: Vec<Item>,
    pub awards: Vec<Item>,
    pub ai_custom_prompt: String,
    /// Top-level keys this version does not know about.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Profile {
    pub fn items_mut(&mut self, kind: ItemKind) -> &mut Vec<Item> {
        match kind {
            ItemKind::Experiences => &mut self.experiences,
            ItemKind::Education => &mut self.education,
            ItemKind::Projects => &mut self.projects,
            ItemKind::Awards => &mut self.awards,
        }
    }

    /// Appends `item` under a freshly generated id, replacing any id the caller sent.
    /// Returns the stored item.
    pub fn append_item(&mut self, kind: ItemKind, mut item: Item) -> Item {
        let list = self.items_mut(kind);
        let id = loop {
            let candidate = Uuid::new_v4().to_string();
            if !list.iter().any(|existing| item_id(existing) == Some(candidate.as_str())) {
                break candidate;
            }
        };
        item.insert(ITEM_ID_KEY.to_string(), Value::String(id));
        list.push(item.clone());
        item
    }

    /// Replaces the item with `id` in place. The stored id is kept whatever the
    /// replacement carries. Returns `false` if no item has that id.
    pub fn update_item(&mut self, kind: ItemKind, id: &str, mut item: Item) -> bool {
        let list = self.items_mut(kind);
        match list.iter().position(|existing| item_id(existing) == Some(id)) {
            Some(index) => {
                item.insert(ITEM_ID_KEY.to_string(), Value::String(id.to_string()));
                list[index] = item;
                true
            }
            None => false,
        }
    }

    /// Removes the item with `id`. Returns `false` (list untouched) if absent.
    pub fn remove_item(&mut self, kind: ItemKind, id: &str) -> bool {
        let list = self.items_mut(kind);
        let before = list.len();
        list.retain(|existing| item_id(existing) != Some(id));
        list.len() < before
    }
}

pub fn item_id(item: &Item) -> Option<&str> {
    item.get(ITEM_ID_KEY).and_then(Value::as_str)
}
