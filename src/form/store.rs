use std::collections::BTreeMap;

use serde::Serialize;

use super::fields;
use super::kind::FormKind;
use super::skills::SkillSet;

/// Field name → message. Empty means nothing to show.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for `field`, replacing any earlier one.
    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    pub fn remove(&mut self, field: &str) -> Option<String> {
        self.0.remove(field)
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Everything the user has entered on one screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormSnapshot {
    pub values: BTreeMap<String, String>,
    pub skills: SkillSet,
    pub accepted_terms: bool,
}

impl FormSnapshot {
    /// A blank snapshot with every field of `kind` at its default.
    pub fn blank(kind: FormKind) -> Self {
        let values = kind
            .field_names()
            .iter()
            .map(|name| (name.to_string(), kind.default_value(name).to_string()))
            .collect();
        Self {
            values,
            skills: SkillSet::new(),
            accepted_terms: false,
        }
    }

    /// Current value of a field; unknown fields read as empty.
    pub fn get(&self, field: &str) -> &str {
        self.values.get(field).map(String::as_str).unwrap_or("")
    }

    /// Set a raw value without the store's input transforms.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.values.insert(field.into(), value.into());
    }
}

/// Holds the active snapshot and its field errors.
#[derive(Debug, Clone)]
pub struct FormStore {
    snapshot: FormSnapshot,
    errors: FieldErrors,
}

impl FormStore {
    pub fn new(kind: FormKind) -> Self {
        Self {
            snapshot: FormSnapshot::blank(kind),
            errors: FieldErrors::new(),
        }
    }

    pub fn snapshot(&self) -> &FormSnapshot {
        &self.snapshot
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Set a field (after its input transform) and clear its error, if any.
    /// Returns `false` and changes nothing when the form has no such text field.
    pub fn update_field(&mut self, name: &str, value: &str) -> bool {
        let Some(slot) = self.snapshot.values.get_mut(name) else {
            return false;
        };
        *slot = transform_input(name, value);
        self.errors.remove(name);
        true
    }

    /// Drop all input and errors, re-seeding the field set for `kind`.
    pub fn reset(&mut self, kind: FormKind) {
        self.snapshot = FormSnapshot::blank(kind);
        self.errors = FieldErrors::new();
    }

    /// Add a skill; a successful add clears the skills error.
    pub fn add_skill(&mut self, skill: &str) -> bool {
        let added = self.snapshot.skills.add(skill);
        if added {
            self.errors.remove(fields::SKILLS);
        }
        added
    }

    pub fn remove_skill(&mut self, skill: &str) -> bool {
        self.snapshot.skills.remove(skill)
    }

    pub fn set_terms_accepted(&mut self, accepted: bool) {
        self.snapshot.accepted_terms = accepted;
        self.errors.remove(fields::TERMS);
    }

    pub fn set_error(&mut self, field: &str, message: &str) {
        self.errors.insert(field, message);
    }

    pub fn clear_error(&mut self, field: &str) -> bool {
        self.errors.remove(field).is_some()
    }

    /// Replace the whole error map, as a validate-and-submit does.
    pub fn replace_errors(&mut self, errors: FieldErrors) {
        self.errors = errors;
    }
}

/// Per-field input transforms the screens apply while typing.
fn transform_input(name: &str, value: &str) -> String {
    match name {
        fields::GST_NUMBER => value.to_uppercase(),
        fields::MOBILE_NUMBER => value.chars().take(10).collect(),
        fields::AADHAR_NUMBER => value.chars().take(12).collect(),
        _ => value.to_string(),
    }
}
