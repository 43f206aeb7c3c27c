//! Error types for the signup flow.

use std::time::Duration;

use crate::form::{FieldErrors, FormKind};
use crate::workflow::WorkflowStep;

/// Top-level error type for the crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unknown signup flow: {0} (expected employer, jobseeker or job-posting)")]
    UnknownFlow(String),
}

/// Failures reported by the external verification and payment collaborators.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ServiceError {
    #[error("Service {service} unavailable: {reason}")]
    Unavailable { service: String, reason: String },

    #[error("Service {service} rejected the request: {reason}")]
    Rejected { service: String, reason: String },
}

/// Errors raised by the step sequencer.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Form has {} invalid field(s)", .0.len())]
    Validation(FieldErrors),

    #[error("Cannot {operation} while {step}")]
    InvalidStep {
        operation: &'static str,
        step: WorkflowStep,
    },

    #[error("Another request is already in flight")]
    Busy,

    #[error("Workflow session has been closed")]
    Closed,

    #[error("Request completed after the step was cancelled; result ignored")]
    Superseded,

    #[error("Form {form} has no field named {field}")]
    UnknownField { field: String, form: FormKind },

    #[error("Role cannot be changed for this form")]
    RoleLocked,

    #[error("Verification code was rejected")]
    CodeRejected,

    #[error("Payment was declined")]
    PaymentDeclined,

    #[error("Request timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
