//! Name, slug and description derivation for configured entries
//!
//! Every function here is pure: the same input always produces the same
//! output, which keeps repeated seed runs stable with respect to slugs.

use crate::types::{NewPermission, NewRole};
use deunicode::deunicode;

/// Canonical (name, slug, description) triple resolved from configuration
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DerivedPermission {
    pub name: String,
    pub slug: String,
    pub description: String,
}

impl DerivedPermission {
    /// Derive from an identifier with optional slug/description overrides
    pub fn from_identifier(
        identifier: &str,
        slug: Option<&str>,
        description: Option<&str>,
    ) -> Self {
        let name = title_case(identifier);
        let slug = slug.map(str::to_string).unwrap_or_else(|| slugify(identifier));
        let description = description
            .map(str::to_string)
            .unwrap_or_else(|| default_description(&name));

        Self {
            name,
            slug,
            description,
        }
    }

    pub fn to_new_permission(&self) -> NewPermission {
        NewPermission::new(&self.slug, &self.name).with_description(&self.description)
    }
}

/// Default permission description, e.g. "Ability to Read User permission."
pub fn default_description(name: &str) -> String {
    format!("Ability to {} permission.", name)
}

/// Upper-case the first character of every whitespace-separated word
///
/// Characters after the first one in a word are left untouched, so
/// `"read USER"` becomes `"Read USER"`.
pub fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut at_word_start = true;

    for ch in value.chars() {
        if ch.is_whitespace() {
            at_word_start = true;
            out.push(ch);
        } else if at_word_start {
            out.extend(ch.to_uppercase());
            at_word_start = false;
        } else {
            out.push(ch);
        }
    }

    out
}

/// URL-safe slug: lowercase ASCII alphanumerics joined by single dashes
///
/// Input is transliterated to ASCII first, so `"Créer"` slugs to `"creer"`.
pub fn slugify(value: &str) -> String {
    let ascii = deunicode(value);
    let mut out = String::with_capacity(ascii.len());
    let mut pending_dash = false;

    for ch in ascii.chars() {
        if ch == '@' {
            push_segment(&mut out, "at", pending_dash);
            pending_dash = true;
        } else if ch.is_ascii_alphanumeric() {
            let mut buf = [0u8; 1];
            push_segment(&mut out, ch.to_ascii_lowercase().encode_utf8(&mut buf), pending_dash);
            pending_dash = false;
        } else if ch.is_whitespace() || ch == '-' || ch == '_' {
            pending_dash = true;
        }
        // anything else is dropped without splitting the word
    }

    out
}

fn push_segment(out: &mut String, segment: &str, dash: bool) {
    if dash && !out.is_empty() {
        out.push('-');
    }
    out.push_str(segment);
}

/// Display name derived from a slug: separators become spaces, first letter
/// upper-cased (`"manage-users"` -> `"Manage users"`)
pub fn humanize(slug: &str) -> String {
    let spaced = slug.replace(['-', '_'], " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Role display name: the configured one, or the title-cased slug
pub fn role_display_name(slug: &str, configured: Option<&str>) -> String {
    match configured {
        Some(name) => name.to_string(),
        None => title_case(&slug.replace(['-', '_'], " ")),
    }
}

/// Role attributes for a configured slug
pub fn new_role(slug: &str, name: Option<&str>, description: Option<&str>) -> NewRole {
    NewRole::new(slug, role_display_name(slug, name)).with_description_opt(description)
}
