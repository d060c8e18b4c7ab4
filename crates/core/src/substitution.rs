//! Placeholder substitution.
//!
//! Substitution walks the segments of a parsed [`Template`] exactly once. Replacement values are
//! copied into the output as-is and are never scanned for placeholders, so a value such as
//! `"{{patient_name}}"` typed into a clinical note stays literal text.

use crate::constants::UNRESOLVED_MARKER_PREFIX;
use crate::template::{is_valid_token_name, Segment, Template};
use crate::{RenderError, RenderResult};
use std::collections::{BTreeMap, BTreeSet};

/// Mapping from placeholder name to replacement text for one substitution call.
///
/// Keys are case-sensitive and unique; iteration order is by key.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldSet {
    fields: BTreeMap<String, String>,
}

impl FieldSet {
    /// Creates an empty field set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field.
    ///
    /// # Errors
    ///
    /// Returns `RenderError::InvalidInput` if `key` is not a valid placeholder name and
    /// `RenderError::DuplicateField` if the key is already present.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> RenderResult<()> {
        let key = key.into();
        if !is_valid_token_name(&key) {
            return Err(RenderError::InvalidInput(format!(
                "invalid placeholder name {:?}",
                key
            )));
        }
        if self.fields.contains_key(&key) {
            return Err(RenderError::DuplicateField(key));
        }
        self.fields.insert(key, value.into());
        Ok(())
    }

    /// Looks up the replacement text for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Returns the subset of fields that `template` declares.
    pub fn project(&self, template: &Template) -> FieldSet {
        let fields = self
            .fields
            .iter()
            .filter(|(key, _)| template.declares(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        FieldSet { fields }
    }

    /// Tokens of `template` that have no field, in name order.
    pub fn missing_for(&self, template: &Template) -> Vec<String> {
        template
            .tokens()
            .iter()
            .filter(|token| !self.fields.contains_key(*token))
            .cloned()
            .collect()
    }

    /// Checks that every token of `template` has a field.
    ///
    /// # Errors
    ///
    /// Returns `RenderError::UnresolvedPlaceholder` listing every token without a field.
    pub fn ensure_closed(&self, template: &Template) -> RenderResult<()> {
        let missing = self.missing_for(template);
        if missing.is_empty() {
            return Ok(());
        }
        Err(RenderError::UnresolvedPlaceholder {
            template: template.name().to_string(),
            tokens: missing,
        })
    }
}

/// Result of one substitution pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Substitution {
    /// The rendered text, with markers in place of unresolved tokens.
    pub output: String,
    /// Tokens that had no field and were replaced by a diagnostic marker.
    pub unresolved: Vec<String>,
}

/// The marker left in the output for a token without a field.
pub fn unresolved_marker(token: &str) -> String {
    format!("{}{}]]", UNRESOLVED_MARKER_PREFIX, token)
}

/// Replaces every placeholder in `template` with its field from `fields`.
///
/// Missing fields never fail the call: each one is logged as a warning, replaced by
/// [`unresolved_marker`], and reported in [`Substitution::unresolved`].
pub fn substitute(template: &Template, fields: &FieldSet) -> Substitution {
    let mut output = String::new();
    let mut unresolved = BTreeSet::new();

    for segment in template.segments() {
        match segment {
            Segment::Literal(text) => output.push_str(text),
            Segment::Token(token) => match fields.get(token) {
                Some(value) => output.push_str(value),
                None => {
                    output.push_str(&unresolved_marker(token));
                    unresolved.insert(token.clone());
                }
            },
        }
    }

    for token in &unresolved {
        tracing::warn!(
            template = template.name(),
            token = token.as_str(),
            "unresolved placeholder"
        );
    }

    Substitution {
        output,
        unresolved: unresolved.into_iter().collect(),
    }
}

/// Substitutes `fields` into `template`, enforcing closure when `strict` is set.
///
/// # Errors
///
/// In strict mode, returns `RenderError::UnresolvedPlaceholder` before any output is produced if
/// `fields` is not closed for `template`.
pub fn render_template(template: &Template, fields: &FieldSet, strict: bool) -> RenderResult<String> {
    if strict {
        fields.ensure_closed(template)?;
    }
    Ok(substitute(template, fields).output)
}
