//! Validation engine — maps a form snapshot to the errors blocking submit.
//!
//! `validate` is pure and deterministic: the same snapshot and kind always
//! yield the same errors, and an empty result means the form may be
//! submitted. Field-level checks live in [`rules`]; the cross-field checks
//! (skills, terms, salary range) are below.

mod rules;

use tracing::debug;

use crate::form::{FieldErrors, FormKind, FormSnapshot, RoleKind, fields};

pub const SKILLS_REQUIRED: &str = "At least one skill is required";
pub const TERMS_REQUIRED: &str = "You must accept the Terms and Conditions";
pub const SALARY_RANGE_INVALID: &str = "Maximum salary should be higher than minimum";

/// Compute every error blocking submission of `snapshot` as `kind`.
pub fn validate(snapshot: &FormSnapshot, kind: impl Into<FormKind>) -> FieldErrors {
    let kind = kind.into();
    let mut errors = FieldErrors::new();

    for rule in rules::field_rules(kind) {
        rule.apply(snapshot, &mut errors);
    }

    match kind {
        FormKind::Registration(RoleKind::Employer) => check_terms(snapshot, &mut errors),
        FormKind::Registration(_) => check_skills(snapshot, &mut errors),
        FormKind::JobPosting => check_salary_range(snapshot, &mut errors),
    }

    debug!(form = %kind, errors = errors.len(), "Validated form");
    errors
}

/// Convenience wrapper: `true` iff `validate` returns no errors.
pub fn is_submit_ready(snapshot: &FormSnapshot, kind: impl Into<FormKind>) -> bool {
    validate(snapshot, kind).is_empty()
}

fn check_skills(snapshot: &FormSnapshot, errors: &mut FieldErrors) {
    if snapshot.skills.is_empty() {
        errors.insert(fields::SKILLS, SKILLS_REQUIRED);
    }
}

fn check_terms(snapshot: &FormSnapshot, errors: &mut FieldErrors) {
    if !snapshot.accepted_terms {
        errors.insert(fields::TERMS, TERMS_REQUIRED);
    }
}

/// Only applies when both bounds are present and parse as integers.
fn check_salary_range(snapshot: &FormSnapshot, errors: &mut FieldErrors) {
    let min = snapshot.get(fields::SALARY_MIN).trim().parse::<i64>();
    let max = snapshot.get(fields::SALARY_MAX).trim().parse::<i64>();

    if let (Ok(min), Ok(max)) = (min, max)
        && min >= max
    {
        errors.insert(fields::SALARY_MAX, SALARY_RANGE_INVALID);
    }
}
