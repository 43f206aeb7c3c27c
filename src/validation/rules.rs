//! Per-form field rule tables.
//!
//! Each form kind has an ordered list of field rules. The first rule that
//! fails for a field wins; later rules for the same field are skipped, so a
//! blank field reports "is required" rather than a format error.

use std::sync::LazyLock;

use regex::Regex;

use crate::form::{FieldErrors, FormKind, FormSnapshot, RoleKind, fields};

/// ASCII digits only.
pub(crate) static MOBILE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{10}$").expect("mobile pattern compiles"));

pub(crate) static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\S+@\S+\.\S+$").expect("email pattern compiles"));

pub(crate) static AADHAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{12}$").expect("aadhar pattern compiles"));

/// 2 digits (state code), 5 letters + 4 digits + 1 letter (PAN), entity
/// number, literal `Z`, checksum character.
pub(crate) static GST_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{2}[A-Z]{5}[0-9]{4}[A-Z][1-9A-Z]Z[0-9A-Z]$").expect("gst pattern compiles")
});

/// What a rule checks on its field.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Check {
    /// Non-empty after trimming.
    Required,
    /// Trimmed value matches the pattern. Blank values are left to `Required`.
    Matches(&'static Regex),
}

/// A single check bound to a field and the message shown when it fails.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FieldRule {
    pub field: &'static str,
    pub check: Check,
    pub message: &'static str,
}

impl FieldRule {
    const fn required(field: &'static str, message: &'static str) -> Self {
        Self {
            field,
            check: Check::Required,
            message,
        }
    }

    fn matches(field: &'static str, pattern: &'static Regex, message: &'static str) -> Self {
        Self {
            field,
            check: Check::Matches(pattern),
            message,
        }
    }

    /// Apply the rule, recording a message unless the field already failed.
    pub fn apply(&self, snapshot: &FormSnapshot, errors: &mut FieldErrors) {
        if errors.contains(self.field) {
            return;
        }

        let value = snapshot.get(self.field).trim();
        let failed = match self.check {
            Check::Required => value.is_empty(),
            Check::Matches(pattern) => !value.is_empty() && !pattern.is_match(value),
        };

        if failed {
            errors.insert(self.field, self.message);
        }
    }
}

fn job_seeker_common() -> Vec<FieldRule> {
    vec![
        FieldRule::required(fields::FULL_NAME, "Full name is required"),
        FieldRule::required(fields::FULL_ADDRESS, "Address is required"),
        FieldRule::required(fields::MOBILE_NUMBER, "Mobile number is required"),
        FieldRule::required(fields::EMAIL, "Email is required"),
        FieldRule::matches(fields::EMAIL, &EMAIL_PATTERN, "Invalid email format"),
        FieldRule::matches(
            fields::MOBILE_NUMBER,
            &MOBILE_PATTERN,
            "Invalid mobile number",
        ),
    ]
}

static FRESHER_RULES: LazyLock<Vec<FieldRule>> = LazyLock::new(|| {
    let mut rules = job_seeker_common();
    rules.extend([
        FieldRule::required(fields::AADHAR_NUMBER, "Aadhar number is required"),
        FieldRule::required(fields::EDUCATION, "Education is required"),
        FieldRule::required(fields::INSTITUTION, "Institution is required"),
        FieldRule::required(fields::AREA_OF_INTEREST, "Area of interest is required"),
        FieldRule::matches(
            fields::AADHAR_NUMBER,
            &AADHAR_PATTERN,
            "Invalid Aadhar number",
        ),
    ]);
    rules
});

static EXPERIENCED_RULES: LazyLock<Vec<FieldRule>> = LazyLock::new(|| {
    let mut rules = job_seeker_common();
    rules.extend([
        FieldRule::required(fields::CURRENT_POSITION, "Current position is required"),
        FieldRule::required(fields::FUNCTION, "Function is required"),
        FieldRule::required(fields::YEARS_OF_EXPERIENCE, "Experience is required"),
        FieldRule::required(fields::EDUCATION, "Education is required"),
        FieldRule::required(fields::LOCATION, "Location is required"),
        FieldRule::required(fields::INDUSTRY_NATURE, "Industry nature is required"),
        FieldRule::required(fields::WORK_TYPE, "Work type is required"),
    ]);
    rules
});

static EMPLOYER_RULES: LazyLock<Vec<FieldRule>> = LazyLock::new(|| {
    vec![
        FieldRule::required(fields::COMPANY_NAME, "Company name is required"),
        FieldRule::required(fields::FULL_ADDRESS, "Full address is required"),
        FieldRule::required(fields::CONTACT_NAME, "Contact name is required"),
        FieldRule::required(fields::MOBILE_NUMBER, "Mobile number is required"),
        FieldRule::matches(
            fields::MOBILE_NUMBER,
            &MOBILE_PATTERN,
            "Please enter a valid 10-digit mobile number",
        ),
        FieldRule::required(fields::GST_NUMBER, "GST number is required"),
        FieldRule::matches(
            fields::GST_NUMBER,
            &GST_PATTERN,
            "Please enter a valid GST number",
        ),
        FieldRule::required(fields::BUSINESS_NATURE, "Nature of business is required"),
    ]
});

static JOB_POSTING_RULES: LazyLock<Vec<FieldRule>> = LazyLock::new(|| {
    vec![
        FieldRule::required(fields::TITLE, "Job title is required"),
        FieldRule::required(fields::LOCATION, "Location is required"),
        FieldRule::required(fields::EMPLOYMENT_TYPE, "Employment type is required"),
        FieldRule::required(fields::EXPERIENCE, "Experience level is required"),
        FieldRule::required(fields::DESCRIPTION, "Job description is required"),
        FieldRule::required(fields::RESPONSIBILITIES, "Responsibilities are required"),
        FieldRule::required(fields::REQUIREMENTS, "Requirements are required"),
        FieldRule::required(fields::SKILLS, "Required skills are needed"),
    ]
});

/// Field rules for a form kind, in evaluation order.
pub(crate) fn field_rules(kind: FormKind) -> &'static [FieldRule] {
    match kind {
        FormKind::Registration(RoleKind::Fresher) => &FRESHER_RULES,
        FormKind::Registration(RoleKind::ExperiencedProfessional) => &EXPERIENCED_RULES,
        FormKind::Registration(RoleKind::Employer) => &EMPLOYER_RULES,
        FormKind::JobPosting => &JOB_POSTING_RULES,
    }
}
