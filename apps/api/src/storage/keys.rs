//! Persisted layout.
//!
//! ```text
//! passwords.json                    profile name -> password hash
//! {profile}/profile.json            profile document
//! {profile}/resumes.json            resume metadata index
//! {profile}/{generated}.html        generated resume bodies
//! ```

use std::fmt;

use serde::Serialize;

use super::{validate_key, StoreError};

pub const PASSWORDS_KEY: &str = "passwords.json";

const PROFILE_DOCUMENT: &str = "profile.json";
const RESUME_INDEX: &str = "resumes.json";
const MAX_PROFILE_NAME_LEN: usize = 64;

/// Top-level keys a profile directory must not shadow.
const RESERVED_TOP_LEVEL: [&str; 1] = [PASSWORDS_KEY];

/// A profile name that is safe to use as a storage key component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ProfileName(String);

impl ProfileName {
    /// Rejects names containing path separators, parent-directory sequences,
    /// control characters or a leading dot, empty or overlong names, and names
    /// of reserved top-level keys.
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        let name = raw.trim();
        let invalid = name.is_empty()
            || name.len() > MAX_PROFILE_NAME_LEN
            || name.starts_with('.')
            || name.contains("..")
            || name.contains('/')
            || name.contains('\\')
            || name.chars().any(char::is_control)
            || RESERVED_TOP_LEVEL
                .iter()
                .any(|reserved| name.eq_ignore_ascii_case(reserved));

        if invalid {
            return Err(StoreError::InvalidProfileName(raw.to_string()));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProfileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn profile_document(profile: &ProfileName) -> String {
    format!("{profile}/{PROFILE_DOCUMENT}")
}

pub fn resume_index(profile: &ProfileName) -> String {
    format!("{profile}/{RESUME_INDEX}")
}

/// Key of a generated resume body. The filename comes from a stored record, so
/// it is validated like any other key.
pub fn resume_body(profile: &ProfileName, filename: &str) -> Result<String, StoreError> {
    if filename.contains('/') || filename == PROFILE_DOCUMENT || filename == RESUME_INDEX {
        return Err(StoreError::InvalidKey(filename.to_string()));
    }
    let key = format!("{profile}/{filename}");
    validate_key(&key)?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_name_accepts_plain_names() {
        assert_eq!(ProfileName::parse("alice").unwrap().as_str(), "alice");
        assert_eq!(ProfileName::parse("  Bob Smith ").unwrap().as_str(), "Bob Smith");
        assert_eq!(ProfileName::parse("user.name-1").unwrap().as_str(), "user.name-1");
    }

    #[test]
    fn test_profile_name_rejects_traversal() {
        for raw in ["../etc", "..", "a/b", "a\\b", "x..y", ".hidden", "", "   ", "tab\there"] {
            assert!(
                matches!(ProfileName::parse(raw), Err(StoreError::InvalidProfileName(_))),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_profile_name_rejects_reserved_keys() {
        for raw in ["passwords.json", "Passwords.JSON", " passwords.json "] {
            assert!(
                matches!(ProfileName::parse(raw), Err(StoreError::InvalidProfileName(_))),
                "{raw:?} should be rejected"
            );
        }
        assert!(ProfileName::parse("passwords").is_ok());
    }

    #[test]
    fn test_profile_name_rejects_overlong() {
        let raw = "a".repeat(MAX_PROFILE_NAME_LEN + 1);
        assert!(ProfileName::parse(&raw).is_err());
    }

    #[test]
    fn test_layout_keys() {
        let alice = ProfileName::parse("alice").unwrap();
        assert_eq!(profile_document(&alice), "alice/profile.json");
        assert_eq!(resume_index(&alice), "alice/resumes.json");
        assert_eq!(
            resume_body(&alice, "cv.html").unwrap(),
            "alice/cv.html"
        );
    }

    #[test]
    fn test_resume_body_rejects_reserved_and_nested_names() {
        let alice = ProfileName::parse("alice").unwrap();
        assert!(resume_body(&alice, "profile.json").is_err());
        assert!(resume_body(&alice, "resumes.json").is_err());
        assert!(resume_body(&alice, "../bob/cv.html").is_err());
        assert!(resume_body(&alice, "..").is_err());
    }
}
