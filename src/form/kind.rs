//! Registrant roles and the form layouts they select.

use serde::{Deserialize, Serialize};

use super::fields;

/// Registrant category. Decides which optional field groups are required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleKind {
    Fresher,
    ExperiencedProfessional,
    Employer,
}

impl RoleKind {
    /// Parse a user-facing label (`fresher`, `experienced`, `employer`).
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "fresher" => Some(Self::Fresher),
            "experienced" | "experienced_professional" | "professional" => {
                Some(Self::ExperiencedProfessional)
            }
            "employer" => Some(Self::Employer),
            _ => None,
        }
    }

    /// Fresher and experienced professionals share the job-seeker screen.
    pub fn is_job_seeker(&self) -> bool {
        matches!(self, Self::Fresher | Self::ExperiencedProfessional)
    }
}

impl std::fmt::Display for RoleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Fresher => "fresher",
            Self::ExperiencedProfessional => "experienced_professional",
            Self::Employer => "employer",
        };
        write!(f, "{s}")
    }
}

/// Which form a session is filling in. Doubles as the validation discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "form", content = "role")]
pub enum FormKind {
    Registration(RoleKind),
    JobPosting,
}

const JOB_SEEKER_FIELDS: &[&str] = &[
    fields::FULL_NAME,
    fields::FULL_ADDRESS,
    fields::MOBILE_NUMBER,
    fields::EMAIL,
    fields::AADHAR_NUMBER,
    fields::EDUCATION,
    fields::INSTITUTION,
    fields::AREA_OF_INTEREST,
    fields::CURRENT_POSITION,
    fields::FUNCTION,
    fields::YEARS_OF_EXPERIENCE,
    fields::LOCATION,
    fields::INDUSTRY_NATURE,
    fields::WORK_TYPE,
];

const EMPLOYER_FIELDS: &[&str] = &[
    fields::COMPANY_NAME,
    fields::FULL_ADDRESS,
    fields::CONTACT_NAME,
    fields::MOBILE_NUMBER,
    fields::GST_NUMBER,
    fields::BUSINESS_NATURE,
];

const JOB_POSTING_FIELDS: &[&str] = &[
    fields::TITLE,
    fields::DEPARTMENT,
    fields::LOCATION,
    fields::EMPLOYMENT_TYPE,
    fields::EXPERIENCE,
    fields::SALARY_MIN,
    fields::SALARY_MAX,
    fields::DESCRIPTION,
    fields::RESPONSIBILITIES,
    fields::REQUIREMENTS,
    fields::BENEFITS,
    fields::SKILLS,
    fields::URGENCY,
    fields::VALID_UNTIL,
];

impl FormKind {
    /// Every text field the form carries, in screen order.
    pub fn field_names(&self) -> &'static [&'static str] {
        match self {
            Self::Registration(RoleKind::Employer) => EMPLOYER_FIELDS,
            Self::Registration(_) => JOB_SEEKER_FIELDS,
            Self::JobPosting => JOB_POSTING_FIELDS,
        }
    }

    /// Initial value for a field after a reset.
    pub fn default_value(&self, field: &str) -> &'static str {
        match (self, field) {
            (Self::JobPosting, fields::URGENCY) => "medium",
            _ => "",
        }
    }

    pub fn role(&self) -> Option<RoleKind> {
        match self {
            Self::Registration(role) => Some(*role),
            Self::JobPosting => None,
        }
    }

    /// Whether the session may switch roles mid-flow.
    pub fn allows_role_switch(&self) -> bool {
        self.role().is_some_and(|role| role.is_job_seeker())
    }
}

impl From<RoleKind> for FormKind {
    fn from(role: RoleKind) -> Self {
        Self::Registration(role)
    }
}

impl std::fmt::Display for FormKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Registration(role) => write!(f, "registration:{role}"),
            Self::JobPosting => write!(f, "job_posting"),
        }
    }
}
