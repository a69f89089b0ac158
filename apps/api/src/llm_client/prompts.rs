// Placeholder substitution shared by every prompt template.
//
// Syntax: `{name}` where name is `[A-Za-z_][A-Za-z0-9_]*`; `{{` and `}}` are
// literal braces. Any other brace is copied through, so CSS or JSON fragments in a
// template need no escaping. Substituted values are never re-scanned.

use std::collections::HashMap;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromptError {
    #[error(
        "The prompt refers to an unknown placeholder `{{{0}}}`. \
        If your custom instructions need literal braces, write `{{{{` and `}}}}`."
    )]
    MissingContextKey(String),
}

/// Values available to a template, by placeholder name.
pub type PromptContext = HashMap<&'static str, String>;

/// Substitutes every `{name}` in `template` from `context`.
pub fn render_template(template: &str, context: &PromptContext) -> Result<String, PromptError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") || tail.starts_with("}}") {
            out.push_str(&tail[..1]);
            rest = &tail[2..];
            continue;
        }

        if tail.starts_with('{') {
            if let Some(name) = placeholder_name(&tail[1..]) {
                let value = context
                    .get(name)
                    .ok_or_else(|| PromptError::MissingContextKey(name.to_string()))?;
                out.push_str(value);
                rest = &tail[name.len() + 2..];
                continue;
            }
        }

        out.push_str(&tail[..1]);
        rest = &tail[1..];
    }

    out.push_str(rest);
    Ok(out)
}

/// Returns the identifier if `s` starts with `identifier}`.
fn placeholder_name(s: &str) -> Option<&str> {
    let end = s.find('}')?;
    let name = &s[..end];
    let mut chars = name.chars();
    let first = chars.next()?;
    let valid = (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    valid.then_some(name)
}
