//! Workflow state machine — which step a session is in and how it may move.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::form::{FormKind, RoleKind};

/// The steps of a registration session.
///
/// Moves forward only: CollectingData → AwaitingVerification →
/// AwaitingConfirmation → Completed, skipping steps the plan does not use.
/// The single way back is AwaitingVerification → CollectingData on cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStep {
    CollectingData,
    AwaitingVerification,
    AwaitingConfirmation,
    Completed,
}

impl WorkflowStep {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: WorkflowStep) -> bool {
        use WorkflowStep::*;
        matches!(
            (self, target),
            (CollectingData, AwaitingVerification)
                | (CollectingData, AwaitingConfirmation)
                | (CollectingData, Completed)
                | (AwaitingVerification, CollectingData)
                | (AwaitingVerification, AwaitingConfirmation)
                | (AwaitingVerification, Completed)
                | (AwaitingConfirmation, Completed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl std::fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::CollectingData => "collecting_data",
            Self::AwaitingVerification => "awaiting_verification",
            Self::AwaitingConfirmation => "awaiting_confirmation",
            Self::Completed => "completed",
        };
        write!(f, "{s}")
    }
}

/// An asynchronous step a plan requires before completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "gate")]
pub enum Gate {
    /// OTP challenge against the form's mobile number.
    Verification,
    /// Subscription charge, amount in whole rupees.
    Payment { plan: String, amount: i64 },
}

impl Gate {
    /// The step a session sits in while this gate is open.
    pub fn step(&self) -> WorkflowStep {
        match self {
            Self::Verification => WorkflowStep::AwaitingVerification,
            Self::Payment { .. } => WorkflowStep::AwaitingConfirmation,
        }
    }

    fn step_rank(&self) -> u8 {
        match self.step() {
            WorkflowStep::CollectingData => 0,
            WorkflowStep::AwaitingVerification => 1,
            WorkflowStep::AwaitingConfirmation => 2,
            WorkflowStep::Completed => 3,
        }
    }
}

/// A form layout plus the ordered gates between submit and completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowPlan {
    kind: FormKind,
    gates: Vec<Gate>,
}

impl WorkflowPlan {
    /// Build a plan. Gates are put in step order and repeated kinds dropped,
    /// since a session can only move forward through them.
    pub fn new(kind: FormKind, mut gates: Vec<Gate>) -> Self {
        gates.sort_by_key(Gate::step_rank);
        gates.dedup_by(|a, b| a.step() == b.step());
        Self { kind, gates }
    }

    /// Employer signup: OTP on the contact's mobile, then done.
    pub fn employer_signup() -> Self {
        Self::new(RoleKind::Employer.into(), vec![Gate::Verification])
    }

    /// Job-seeker signup: subscription payment, then done. Starts as a fresher;
    /// the session may switch role before submitting.
    pub fn job_seeker_signup(payment: Gate) -> Self {
        Self::new(RoleKind::Fresher.into(), vec![payment])
    }

    /// Job posting: submit completes directly.
    pub fn job_posting() -> Self {
        Self::new(FormKind::JobPosting, Vec::new())
    }

    pub fn kind(&self) -> FormKind {
        self.kind
    }

    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    /// Step entered by a successful submit.
    pub fn first_step(&self) -> WorkflowStep {
        self.gates
            .first()
            .map(Gate::step)
            .unwrap_or(WorkflowStep::Completed)
    }

    /// Step that follows the gate occupying `current`.
    pub fn step_after(&self, current: WorkflowStep) -> WorkflowStep {
        self.gates
            .iter()
            .position(|gate| gate.step() == current)
            .and_then(|idx| self.gates.get(idx + 1))
            .map(Gate::step)
            .unwrap_or(WorkflowStep::Completed)
    }

    /// Plan name and amount of the payment gate, if the plan has one.
    pub fn payment(&self) -> Option<(&str, i64)> {
        self.gates.iter().find_map(|gate| match gate {
            Gate::Payment { plan, amount } => Some((plan.as_str(), *amount)),
            Gate::Verification => None,
        })
    }
}

/// An open OTP challenge.
#[derive(Debug)]
pub struct VerificationTicket {
    contact: String,
    code: SecretString,
    resend_count: u32,
    rejected_attempts: u32,
    issued_at: DateTime<Utc>,
}

impl VerificationTicket {
    pub fn new(contact: impl Into<String>) -> Self {
        Self {
            contact: contact.into(),
            code: SecretString::from(""),
            resend_count: 0,
            rejected_attempts: 0,
            issued_at: Utc::now(),
        }
    }

    pub fn contact(&self) -> &str {
        &self.contact
    }

    pub fn code(&self) -> &str {
        self.code.expose_secret()
    }

    pub fn set_code(&mut self, code: &str) {
        self.code = SecretString::from(code);
    }

    pub fn clear_code(&mut self) {
        self.code = SecretString::from("");
    }

    /// Count a resend; the new code restarts the ticket's clock.
    pub fn record_resend(&mut self) {
        self.clear_code();
        self.resend_count += 1;
        self.issued_at = Utc::now();
    }

    pub fn record_rejection(&mut self) {
        self.clear_code();
        self.rejected_attempts += 1;
    }

    pub fn view(&self) -> TicketView {
        TicketView {
            contact: self.contact.clone(),
            code_entered: !self.code().is_empty(),
            resend_count: self.resend_count,
            rejected_attempts: self.rejected_attempts,
            issued_at: self.issued_at,
        }
    }
}

/// Renderable ticket summary. Never carries the code itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketView {
    pub contact: String,
    pub code_entered: bool,
    pub resend_count: u32,
    pub rejected_attempts: u32,
    pub issued_at: DateTime<Utc>,
}
