//! Bounded, duplicate-free skill list.

use serde::Serialize;

/// Maximum number of skills a profile may carry.
pub const MAX_SKILLS: usize = 9;

/// Maximum length of a single skill, in characters.
pub const MAX_SKILL_LEN: usize = 20;

/// Ordered skill list. Never holds duplicates (case-sensitive) or more than
/// [`MAX_SKILLS`] entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SkillSet(Vec<String>);

impl SkillSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a trimmed skill. Returns `false` (and changes nothing) when the
    /// skill is empty, too long, already present, or the set is full.
    pub fn add(&mut self, skill: &str) -> bool {
        let skill = skill.trim();
        if skill.is_empty()
            || skill.chars().count() > MAX_SKILL_LEN
            || self.is_full()
            || self.contains(skill)
        {
            return false;
        }
        self.0.push(skill.to_string());
        true
    }

    /// Remove every entry equal to `skill`. Returns whether anything was removed.
    pub fn remove(&mut self, skill: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|s| s != skill);
        self.0.len() != before
    }

    pub fn contains(&self, skill: &str) -> bool {
        self.0.iter().any(|s| s == skill)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.0.len() >= MAX_SKILLS
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}
