//! Form state store — field values, per-field errors, skills and terms.
//!
//! One store per screen session. The store only records what the user typed;
//! deciding whether that is submit-ready is the validation engine's job.

mod kind;
mod skills;
mod store;

pub use kind::{FormKind, RoleKind};
pub use skills::{MAX_SKILL_LEN, MAX_SKILLS, SkillSet};
pub use store::{FieldErrors, FormSnapshot, FormStore};

/// Field keys used by the registration and job-posting screens.
pub mod fields {
    pub const FULL_NAME: &str = "fullName";
    pub const FULL_ADDRESS: &str = "fullAddress";
    pub const MOBILE_NUMBER: &str = "mobileNumber";
    pub const EMAIL: &str = "email";
    pub const AADHAR_NUMBER: &str = "aadharNumber";
    pub const EDUCATION: &str = "education";
    pub const INSTITUTION: &str = "institution";
    pub const AREA_OF_INTEREST: &str = "areaOfInterest";
    pub const CURRENT_POSITION: &str = "currentPosition";
    pub const FUNCTION: &str = "function";
    pub const YEARS_OF_EXPERIENCE: &str = "yearsOfExperience";
    pub const LOCATION: &str = "location";
    pub const INDUSTRY_NATURE: &str = "industryNature";
    pub const WORK_TYPE: &str = "workType";

    pub const COMPANY_NAME: &str = "companyName";
    pub const CONTACT_NAME: &str = "contactName";
    pub const GST_NUMBER: &str = "gstNumber";
    pub const BUSINESS_NATURE: &str = "businessNature";

    pub const TITLE: &str = "title";
    pub const DEPARTMENT: &str = "department";
    pub const EMPLOYMENT_TYPE: &str = "employmentType";
    pub const EXPERIENCE: &str = "experience";
    pub const SALARY_MIN: &str = "salaryMin";
    pub const SALARY_MAX: &str = "salaryMax";
    pub const DESCRIPTION: &str = "description";
    pub const RESPONSIBILITIES: &str = "responsibilities";
    pub const REQUIREMENTS: &str = "requirements";
    pub const BENEFITS: &str = "benefits";
    /// Free-text skills on job postings; also the error key for a profile's skill set.
    pub const SKILLS: &str = "skills";
    pub const URGENCY: &str = "urgency";
    pub const VALID_UNTIL: &str = "validUntil";

    /// Error-only keys (no backing text field).
    pub const TERMS: &str = "terms";
    pub const OTP: &str = "otp";
}
