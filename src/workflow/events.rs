use serde::Serialize;

use super::state::WorkflowStep;
use crate::form::FieldErrors;

/// Change notifications broadcast to whoever renders the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowEvent {
    /// The session moved to another step.
    StepChanged {
        from: WorkflowStep,
        to: WorkflowStep,
    },
    /// A request started or finished.
    BusyChanged { busy: bool },
    /// Field errors were recomputed or cleared.
    ErrorsChanged { errors: FieldErrors },
    /// A step-level banner was raised. `None` when dismissed.
    FailureRaised { message: Option<String> },
}
