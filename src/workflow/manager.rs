//! RegistrationWorkflow — owns one session's form, step and open gate, and
//! talks to the verification and payment services on its behalf.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, MutexGuard, broadcast};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::events::WorkflowEvent;
use super::state::{TicketView, VerificationTicket, WorkflowPlan, WorkflowStep};
use crate::config::WorkflowConfig;
use crate::error::{ServiceError, WorkflowError};
use crate::form::{FieldErrors, FormKind, FormSnapshot, FormStore, RoleKind, fields};
use crate::services::{PaymentService, VerificationService};
use crate::validation;

/// Default broadcast channel capacity.
const DEFAULT_EVENT_CAPACITY: usize = 64;

const OTP_LEN: usize = 6;

pub const OTP_REQUIRED: &str = "Please enter OTP";
pub const OTP_LENGTH: &str = "OTP must be 6 digits";
pub const OTP_INVALID: &str = "Invalid OTP. Please try again";
pub const REQUEST_FAILED: &str = "Something went wrong. Please try again.";
pub const PAYMENT_DECLINED: &str = "Payment was declined. Please try again";

/// Mutable session state. Only touched under the workflow's lock.
struct Session {
    kind: FormKind,
    step: WorkflowStep,
    form: FormStore,
    ticket: Option<VerificationTicket>,
    in_flight: bool,
    /// Bumped by cancel and teardown; completions from older generations are dropped.
    generation: u64,
    closed: bool,
    failure: Option<String>,
    completed_at: Option<DateTime<Utc>>,
}

impl Session {
    fn new(kind: FormKind) -> Self {
        Self {
            kind,
            step: WorkflowStep::CollectingData,
            form: FormStore::new(kind),
            ticket: None,
            in_flight: false,
            generation: 0,
            closed: false,
            failure: None,
            completed_at: None,
        }
    }

    /// Gate for every operation: open session, no request in flight, right step.
    fn ensure(
        &self,
        operation: &'static str,
        expected: WorkflowStep,
    ) -> Result<(), WorkflowError> {
        if self.closed {
            return Err(WorkflowError::Closed);
        }
        if self.in_flight {
            return Err(WorkflowError::Busy);
        }
        if self.step != expected {
            return Err(WorkflowError::InvalidStep {
                operation,
                step: self.step,
            });
        }
        Ok(())
    }
}

/// Plan and amount shown on the payment confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChargeView {
    pub plan: String,
    pub amount: i64,
}

/// Everything a front end needs to render the session.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowView {
    pub session_id: Uuid,
    pub kind: FormKind,
    pub step: WorkflowStep,
    pub busy: bool,
    pub closed: bool,
    pub form: FormSnapshot,
    pub errors: FieldErrors,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket: Option<TicketView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charge: Option<ChargeView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Drives a single signup session through its plan.
///
/// All operations take `&self`, so a front end can share the workflow behind
/// an `Arc` and keep rendering while a request is out.
pub struct RegistrationWorkflow {
    id: Uuid,
    plan: WorkflowPlan,
    request_timeout: Duration,
    verifier: Arc<dyn VerificationService>,
    payments: Arc<dyn PaymentService>,
    session: Mutex<Session>,
    events: broadcast::Sender<WorkflowEvent>,
}

impl RegistrationWorkflow {
    pub fn new(
        plan: WorkflowPlan,
        verifier: Arc<dyn VerificationService>,
        payments: Arc<dyn PaymentService>,
        config: &WorkflowConfig,
    ) -> Self {
        let (events, _rx) = broadcast::channel(DEFAULT_EVENT_CAPACITY);
        let id = Uuid::new_v4();
        info!(
            session_id = %id,
            form = %plan.kind(),
            gates = plan.gates().len(),
            "Workflow session started"
        );
        Self {
            id,
            session: Mutex::new(Session::new(plan.kind())),
            plan,
            request_timeout: config.request_timeout,
            verifier,
            payments,
            events,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn plan(&self) -> &WorkflowPlan {
        &self.plan
    }

    /// Subscribe to change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.events.subscribe()
    }

    pub async fn step(&self) -> WorkflowStep {
        self.session.lock().await.step
    }

    pub async fn is_busy(&self) -> bool {
        self.session.lock().await.in_flight
    }

    pub async fn view(&self) -> WorkflowView {
        let session = self.session.lock().await;
        WorkflowView {
            session_id: self.id,
            kind: session.kind,
            step: session.step,
            busy: session.in_flight,
            closed: session.closed,
            form: session.form.snapshot().clone(),
            errors: session.form.errors().clone(),
            failure: session.failure.clone(),
            ticket: session.ticket.as_ref().map(VerificationTicket::view),
            charge: self.plan.payment().map(|(plan, amount)| ChargeView {
                plan: plan.to_string(),
                amount,
            }),
            completed_at: session.completed_at,
        }
    }

    // ── Form edits ──────────────────────────────────────────────────

    /// Fails with `UnknownField` for keys the current form does not carry,
    /// e.g. `skills` on a job-seeker form, whose skills go through `add_skill`.
    pub async fn update_field(&self, name: &str, value: &str) -> Result<(), WorkflowError> {
        let mut session = self.session.lock().await;
        session.ensure("update a field", WorkflowStep::CollectingData)?;

        let had_error = session.form.errors().contains(name);
        if !session.form.update_field(name, value) {
            return Err(WorkflowError::UnknownField {
                field: name.to_string(),
                form: session.kind,
            });
        }
        if had_error {
            self.emit_errors(&session);
        }
        Ok(())
    }

    /// Returns `false` when the skill was rejected (blank, too long, duplicate, or list full).
    pub async fn add_skill(&self, skill: &str) -> Result<bool, WorkflowError> {
        self.edit("add a skill", |form| form.add_skill(skill)).await
    }

    pub async fn remove_skill(&self, skill: &str) -> Result<bool, WorkflowError> {
        self.edit("remove a skill", |form| form.remove_skill(skill))
            .await
    }

    pub async fn set_terms_accepted(&self, accepted: bool) -> Result<(), WorkflowError> {
        self.edit("change terms", |form| form.set_terms_accepted(accepted))
            .await
    }

    /// Switch between job-seeker roles. Clears everything entered so far.
    pub async fn select_role(&self, role: RoleKind) -> Result<(), WorkflowError> {
        let mut session = self.session.lock().await;
        session.ensure("select a role", WorkflowStep::CollectingData)?;

        if !session.kind.allows_role_switch() || !role.is_job_seeker() {
            return Err(WorkflowError::RoleLocked);
        }

        let kind = FormKind::from(role);
        if session.kind == kind {
            return Ok(());
        }

        info!(session_id = %self.id, from = %session.kind, to = %kind, "Role changed; form reset");
        session.kind = kind;
        session.form.reset(kind);
        session.failure = None;
        self.emit_errors(&session);
        Ok(())
    }

    pub async fn dismiss_failure(&self) -> Result<(), WorkflowError> {
        let mut session = self.session.lock().await;
        if session.closed {
            return Err(WorkflowError::Closed);
        }
        if session.failure.take().is_some() {
            self.emit(WorkflowEvent::FailureRaised { message: None });
        }
        Ok(())
    }

    // ── Step operations ─────────────────────────────────────────────

    /// Validate the form and, if clean, open the plan's first gate.
    ///
    /// For a verification gate the OTP is sent before the step changes; a
    /// failed send leaves the session in `CollectingData` with a banner.
    pub async fn submit(&self) -> Result<WorkflowStep, WorkflowError> {
        let (generation, contact) = {
            let mut session = self.session.lock().await;
            session.ensure("submit", WorkflowStep::CollectingData)?;

            let errors = validation::validate(session.form.snapshot(), session.kind);
            session.form.replace_errors(errors.clone());
            self.emit_errors(&session);
            if !errors.is_empty() {
                info!(
                    session_id = %self.id,
                    form = %session.kind,
                    errors = errors.len(),
                    "Submit blocked by validation"
                );
                return Err(WorkflowError::Validation(errors));
            }

            let next = self.plan.first_step();
            if next != WorkflowStep::AwaitingVerification {
                self.transition(&mut session, next)?;
                return Ok(next);
            }

            let contact = session
                .form
                .snapshot()
                .get(fields::MOBILE_NUMBER)
                .trim()
                .to_string();
            (self.begin(&mut session), contact)
        };

        let outcome = self.bounded(self.verifier.send_code(&contact)).await;

        let mut session = self.finish(generation).await?;
        match outcome {
            Ok(()) => {
                session.ticket = Some(VerificationTicket::new(contact));
                self.transition(&mut session, WorkflowStep::AwaitingVerification)?;
                Ok(WorkflowStep::AwaitingVerification)
            }
            Err(e) => Err(self.fail(&mut session, "submit", e)),
        }
    }

    /// Check an entered OTP. A wrong code stays on the verification step.
    pub async fn verify(&self, code: &str) -> Result<WorkflowStep, WorkflowError> {
        let code = code.trim();
        let (generation, contact) = {
            let mut session = self.session.lock().await;
            session.ensure("verify", WorkflowStep::AwaitingVerification)?;

            if let Some(message) = otp_format_error(code) {
                session.form.set_error(fields::OTP, message);
                self.emit_errors(&session);
                let mut errors = FieldErrors::new();
                errors.insert(fields::OTP, message);
                return Err(WorkflowError::Validation(errors));
            }

            let Some(ticket) = session.ticket.as_mut() else {
                return Err(WorkflowError::InvalidStep {
                    operation: "verify",
                    step: session.step,
                });
            };
            ticket.set_code(code);
            let contact = ticket.contact().to_string();

            if session.form.clear_error(fields::OTP) {
                self.emit_errors(&session);
            }
            (self.begin(&mut session), contact)
        };

        let outcome = self.bounded(self.verifier.check_code(&contact, code)).await;

        let mut session = self.finish(generation).await?;
        match outcome {
            Ok(true) => {
                session.ticket = None;
                let next = self.plan.step_after(WorkflowStep::AwaitingVerification);
                self.transition(&mut session, next)?;
                Ok(next)
            }
            Ok(false) => {
                if let Some(ticket) = session.ticket.as_mut() {
                    ticket.record_rejection();
                }
                session.form.set_error(fields::OTP, OTP_INVALID);
                self.emit_errors(&session);
                warn!(session_id = %self.id, contact = %contact, "OTP rejected");
                Err(WorkflowError::CodeRejected)
            }
            Err(e) => Err(self.fail(&mut session, "verify", e)),
        }
    }

    /// Send a fresh OTP to the same contact.
    pub async fn resend(&self) -> Result<(), WorkflowError> {
        let (generation, contact) = {
            let mut session = self.session.lock().await;
            session.ensure("resend", WorkflowStep::AwaitingVerification)?;

            let Some(ticket) = session.ticket.as_mut() else {
                return Err(WorkflowError::InvalidStep {
                    operation: "resend",
                    step: session.step,
                });
            };
            let contact = ticket.contact().to_string();

            if session.form.clear_error(fields::OTP) {
                self.emit_errors(&session);
            }
            (self.begin(&mut session), contact)
        };

        let outcome = self.bounded(self.verifier.send_code(&contact)).await;

        // The ticket only changes once a new code is actually out.
        let mut session = self.finish(generation).await?;
        match outcome {
            Ok(()) => {
                if let Some(ticket) = session.ticket.as_mut() {
                    ticket.record_resend();
                }
                info!(session_id = %self.id, contact = %contact, "OTP resent");
                Ok(())
            }
            Err(e) => Err(self.fail(&mut session, "resend", e)),
        }
    }

    /// Issue the plan's charge. A declined charge stays on the confirmation step.
    pub async fn confirm(&self) -> Result<WorkflowStep, WorkflowError> {
        let (generation, plan, amount) = {
            let mut session = self.session.lock().await;
            session.ensure("confirm", WorkflowStep::AwaitingConfirmation)?;

            let Some((plan, amount)) = self.plan.payment() else {
                return Err(WorkflowError::InvalidStep {
                    operation: "confirm",
                    step: session.step,
                });
            };
            (self.begin(&mut session), plan.to_string(), amount)
        };

        let outcome = self.bounded(self.payments.charge(&plan, amount)).await;

        let mut session = self.finish(generation).await?;
        match outcome {
            Ok(true) => {
                info!(session_id = %self.id, plan = %plan, amount, "Payment approved");
                let next = self.plan.step_after(WorkflowStep::AwaitingConfirmation);
                self.transition(&mut session, next)?;
                Ok(next)
            }
            Ok(false) => {
                warn!(session_id = %self.id, plan = %plan, amount, "Payment declined");
                self.raise_failure(&mut session, PAYMENT_DECLINED);
                Err(WorkflowError::PaymentDeclined)
            }
            Err(e) => Err(self.fail(&mut session, "confirm", e)),
        }
    }

    /// Leave the verification step, keeping the form. Any request still out
    /// is abandoned; its result is ignored when it lands.
    pub async fn cancel(&self) -> Result<(), WorkflowError> {
        let mut session = self.session.lock().await;
        if session.closed {
            return Err(WorkflowError::Closed);
        }
        if session.step != WorkflowStep::AwaitingVerification {
            return Err(WorkflowError::InvalidStep {
                operation: "cancel",
                step: session.step,
            });
        }

        self.abandon_request(&mut session);
        session.ticket = None;
        if session.form.clear_error(fields::OTP) {
            self.emit_errors(&session);
        }
        self.transition(&mut session, WorkflowStep::CollectingData)?;
        Ok(())
    }

    /// Close the session. Later calls fail with `Closed`.
    pub async fn teardown(&self) {
        let mut session = self.session.lock().await;
        if session.closed {
            return;
        }
        self.abandon_request(&mut session);
        session.closed = true;
        info!(session_id = %self.id, step = %session.step, "Workflow session closed");
    }

    // ── Internals ───────────────────────────────────────────────────

    async fn edit<R>(
        &self,
        operation: &'static str,
        apply: impl FnOnce(&mut FormStore) -> R,
    ) -> Result<R, WorkflowError> {
        let mut session = self.session.lock().await;
        session.ensure(operation, WorkflowStep::CollectingData)?;

        let errors_before = session.form.errors().len();
        let result = apply(&mut session.form);
        if session.form.errors().len() != errors_before {
            self.emit_errors(&session);
        }
        Ok(result)
    }

    /// Mark a request in flight and return the generation it belongs to.
    fn begin(&self, session: &mut Session) -> u64 {
        session.in_flight = true;
        if session.failure.take().is_some() {
            self.emit(WorkflowEvent::FailureRaised { message: None });
        }
        self.emit(WorkflowEvent::BusyChanged { busy: true });
        session.generation
    }

    /// Re-acquire the session after a request. Fails with `Superseded` if the
    /// session was cancelled or closed while the request was out.
    async fn finish(&self, generation: u64) -> Result<MutexGuard<'_, Session>, WorkflowError> {
        let mut session = self.session.lock().await;
        if session.generation != generation {
            debug!(
                session_id = %self.id,
                step = %session.step,
                "Ignoring completion of abandoned request"
            );
            return Err(WorkflowError::Superseded);
        }
        session.in_flight = false;
        self.emit(WorkflowEvent::BusyChanged { busy: false });
        Ok(session)
    }

    fn abandon_request(&self, session: &mut Session) {
        session.generation += 1;
        if session.in_flight {
            session.in_flight = false;
            self.emit(WorkflowEvent::BusyChanged { busy: false });
        }
    }

    async fn bounded<T>(
        &self,
        request: impl Future<Output = Result<T, ServiceError>>,
    ) -> Result<T, WorkflowError> {
        match tokio::time::timeout(self.request_timeout, request).await {
            Ok(result) => result.map_err(WorkflowError::from),
            Err(_) => Err(WorkflowError::Timeout {
                timeout: self.request_timeout,
            }),
        }
    }

    fn fail(
        &self,
        session: &mut Session,
        operation: &'static str,
        error: WorkflowError,
    ) -> WorkflowError {
        warn!(
            session_id = %self.id,
            step = %session.step,
            operation,
            error = %error,
            "Request failed"
        );
        self.raise_failure(session, REQUEST_FAILED);
        error
    }

    fn raise_failure(&self, session: &mut Session, message: &str) {
        session.failure = Some(message.to_string());
        self.emit(WorkflowEvent::FailureRaised {
            message: Some(message.to_string()),
        });
    }

    fn transition(&self, session: &mut Session, to: WorkflowStep) -> Result<(), WorkflowError> {
        let from = session.step;
        if !from.can_transition_to(to) {
            warn!(session_id = %self.id, from = %from, to = %to, "Invalid step transition");
            return Err(WorkflowError::InvalidStep {
                operation: "advance",
                step: from,
            });
        }

        session.step = to;
        if to.is_terminal() {
            session.completed_at = Some(Utc::now());
        }
        info!(session_id = %self.id, from = %from, to = %to, "Workflow step changed");
        self.emit(WorkflowEvent::StepChanged { from, to });
        Ok(())
    }

    fn emit_errors(&self, session: &Session) {
        self.emit(WorkflowEvent::ErrorsChanged {
            errors: session.form.errors().clone(),
        });
    }

    fn emit(&self, event: WorkflowEvent) {
        // Ok if nobody is listening
        let _ = self.events.send(event);
    }
}

/// Local OTP checks run before anything is sent.
fn otp_format_error(code: &str) -> Option<&'static str> {
    if code.is_empty() {
        Some(OTP_REQUIRED)
    } else if code.len() != OTP_LEN || !code.chars().all(|c| c.is_ascii_digit()) {
        Some(OTP_LENGTH)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;
    use crate::workflow::Gate;

    const CODE: &str = "123456";

    #[derive(Default)]
    struct StubVerifier {
        fail_send: bool,
        /// Fail every send after the first.
        fail_resend: bool,
        hold: Option<Arc<Notify>>,
        sends: AtomicUsize,
    }

    #[async_trait]
    impl VerificationService for StubVerifier {
        async fn send_code(&self, _contact: &str) -> Result<(), ServiceError> {
            let previous = self.sends.fetch_add(1, Ordering::SeqCst);
            if self.fail_send || (self.fail_resend && previous > 0) {
                return Err(ServiceError::Unavailable {
                    service: "otp".into(),
                    reason: "gateway down".into(),
                });
            }
            Ok(())
        }

        async fn check_code(&self, _contact: &str, code: &str) -> Result<bool, ServiceError> {
            if let Some(hold) = &self.hold {
                hold.notified().await;
            }
            Ok(code == CODE)
        }
    }

    struct StubPayments {
        approve: bool,
        hang: bool,
    }

    #[async_trait]
    impl PaymentService for StubPayments {
        async fn charge(&self, _plan: &str, _amount: i64) -> Result<bool, ServiceError> {
            if self.hang {
                std::future::pending::<()>().await;
            }
            Ok(self.approve)
        }
    }

    fn approving() -> StubPayments {
        StubPayments {
            approve: true,
            hang: false,
        }
    }

    fn seeker_plan() -> WorkflowPlan {
        WorkflowPlan::job_seeker_signup(Gate::Payment {
            plan: "6-Month Premium Access".into(),
            amount: 499,
        })
    }

    fn build(
        plan: WorkflowPlan,
        verifier: StubVerifier,
        payments: StubPayments,
    ) -> RegistrationWorkflow {
        let config = WorkflowConfig {
            request_timeout: Duration::from_millis(100),
            ..WorkflowConfig::default()
        };
        RegistrationWorkflow::new(plan, Arc::new(verifier), Arc::new(payments), &config)
    }

    async fn fill_employer(workflow: &RegistrationWorkflow) {
        for (field, value) in [
            (fields::COMPANY_NAME, "Acme Staffing"),
            (fields::FULL_ADDRESS, "12 MG Road, Pune"),
            (fields::CONTACT_NAME, "Ravi Kumar"),
            (fields::MOBILE_NUMBER, "9876543210"),
            (fields::GST_NUMBER, "22aaaaa0000a1z5"),
            (fields::BUSINESS_NATURE, "Recruitment"),
        ] {
            workflow.update_field(field, value).await.unwrap();
        }
        workflow.set_terms_accepted(true).await.unwrap();
    }

    async fn fill_fresher(workflow: &RegistrationWorkflow) {
        for (field, value) in [
            (fields::FULL_NAME, "Asha Verma"),
            (fields::FULL_ADDRESS, "4 Lake View, Bhopal"),
            (fields::MOBILE_NUMBER, "9123456780"),
            (fields::EMAIL, "asha@example.in"),
            (fields::AADHAR_NUMBER, "123456789012"),
            (fields::EDUCATION, "B.Tech"),
            (fields::INSTITUTION, "MANIT"),
            (fields::AREA_OF_INTEREST, "Backend"),
        ] {
            workflow.update_field(field, value).await.unwrap();
        }
        assert!(workflow.add_skill("Rust").await.unwrap());
    }

    async fn at_verification(verifier: StubVerifier) -> RegistrationWorkflow {
        let workflow = build(WorkflowPlan::employer_signup(), verifier, approving());
        fill_employer(&workflow).await;
        assert_eq!(
            workflow.submit().await.unwrap(),
            WorkflowStep::AwaitingVerification
        );
        workflow
    }

    async fn wait_until_busy(workflow: &RegistrationWorkflow) {
        while !workflow.is_busy().await {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn invalid_submit_stays_and_reports_errors() {
        let workflow = build(WorkflowPlan::employer_signup(), StubVerifier::default(), approving());
        let err = workflow.submit().await.unwrap_err();

        let WorkflowError::Validation(errors) = &err else {
            panic!("expected validation error, got {err:?}");
        };
        assert!(errors.contains(fields::TERMS));
        assert_eq!(workflow.step().await, WorkflowStep::CollectingData);
        assert_eq!(&workflow.view().await.errors, errors);
    }

    #[tokio::test]
    async fn editing_clears_only_that_error() {
        let workflow = build(WorkflowPlan::employer_signup(), StubVerifier::default(), approving());
        let _ = workflow.submit().await;

        workflow.update_field(fields::COMPANY_NAME, "Acme").await.unwrap();

        let errors = workflow.view().await.errors;
        assert!(!errors.contains(fields::COMPANY_NAME));
        assert!(errors.contains(fields::CONTACT_NAME));
    }

    #[tokio::test]
    async fn skills_text_rejected_on_job_seeker_form() {
        let workflow = build(seeker_plan(), StubVerifier::default(), approving());
        let _ = workflow.submit().await;
        assert!(workflow.view().await.errors.contains(fields::SKILLS));

        let err = workflow.update_field(fields::SKILLS, "Rust").await.unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::UnknownField { ref field, .. } if field == fields::SKILLS
        ));

        let view = workflow.view().await;
        assert!(view.errors.contains(fields::SKILLS));
        assert!(view.form.skills.is_empty());
    }

    #[tokio::test]
    async fn employer_completes_after_one_otp() {
        let workflow = at_verification(StubVerifier::default()).await;
        let ticket = workflow.view().await.ticket.unwrap();
        assert_eq!(ticket.contact, "9876543210");

        assert_eq!(workflow.verify(CODE).await.unwrap(), WorkflowStep::Completed);

        let view = workflow.view().await;
        assert!(view.ticket.is_none());
        assert!(view.completed_at.is_some());
        assert!(!view.busy);
    }

    #[tokio::test]
    async fn otp_format_checked_locally() {
        let workflow = at_verification(StubVerifier::default()).await;

        let err = workflow.verify("  ").await.unwrap_err();
        assert!(matches!(&err, WorkflowError::Validation(e) if e.get(fields::OTP) == Some(OTP_REQUIRED)));

        let err = workflow.verify("12345").await.unwrap_err();
        assert!(matches!(&err, WorkflowError::Validation(e) if e.get(fields::OTP) == Some(OTP_LENGTH)));

        let err = workflow.verify("12345a").await.unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)));
        assert_eq!(workflow.view().await.errors.get(fields::OTP), Some(OTP_LENGTH));
        assert_eq!(workflow.step().await, WorkflowStep::AwaitingVerification);
    }

    #[tokio::test]
    async fn wrong_otp_stays_on_verification() {
        let workflow = at_verification(StubVerifier::default()).await;

        let err = workflow.verify("654321").await.unwrap_err();
        assert!(matches!(err, WorkflowError::CodeRejected));

        let view = workflow.view().await;
        assert_eq!(view.step, WorkflowStep::AwaitingVerification);
        assert_eq!(view.errors.get(fields::OTP), Some(OTP_INVALID));
        assert_eq!(view.ticket.unwrap().rejected_attempts, 1);

        assert_eq!(workflow.verify(CODE).await.unwrap(), WorkflowStep::Completed);
    }

    #[tokio::test]
    async fn resend_clears_otp_error_and_counts() {
        let workflow = at_verification(StubVerifier::default()).await;
        let _ = workflow.verify("1").await;

        workflow.resend().await.unwrap();

        let view = workflow.view().await;
        assert!(!view.errors.contains(fields::OTP));
        assert_eq!(view.ticket.unwrap().resend_count, 1);
        assert_eq!(view.step, WorkflowStep::AwaitingVerification);
    }

    #[tokio::test]
    async fn failed_resend_leaves_ticket_untouched() {
        let verifier = StubVerifier {
            fail_resend: true,
            ..StubVerifier::default()
        };
        let workflow = at_verification(verifier).await;
        let issued_at = workflow.view().await.ticket.unwrap().issued_at;
        let _ = workflow.verify("1").await;

        let err = workflow.resend().await.unwrap_err();
        assert!(matches!(err, WorkflowError::Service(_)));

        let view = workflow.view().await;
        let ticket = view.ticket.unwrap();
        assert_eq!(ticket.resend_count, 0);
        assert_eq!(ticket.issued_at, issued_at);
        assert!(!view.errors.contains(fields::OTP));
        assert_eq!(view.failure.as_deref(), Some(REQUEST_FAILED));
        assert_eq!(view.step, WorkflowStep::AwaitingVerification);
    }

    #[tokio::test]
    async fn failed_send_keeps_collecting_data_with_banner() {
        let verifier = StubVerifier {
            fail_send: true,
            ..StubVerifier::default()
        };
        let workflow = build(WorkflowPlan::employer_signup(), verifier, approving());
        fill_employer(&workflow).await;

        let err = workflow.submit().await.unwrap_err();
        assert!(matches!(err, WorkflowError::Service(_)));

        let view = workflow.view().await;
        assert_eq!(view.step, WorkflowStep::CollectingData);
        assert_eq!(view.failure.as_deref(), Some(REQUEST_FAILED));
        assert!(!view.busy);

        workflow.dismiss_failure().await.unwrap();
        assert!(workflow.view().await.failure.is_none());
    }

    #[tokio::test]
    async fn cancel_returns_to_form_and_keeps_data() {
        let workflow = at_verification(StubVerifier::default()).await;

        workflow.cancel().await.unwrap();

        let view = workflow.view().await;
        assert_eq!(view.step, WorkflowStep::CollectingData);
        assert!(view.ticket.is_none());
        assert_eq!(view.form.get(fields::COMPANY_NAME), "Acme Staffing");
        assert_eq!(view.form.get(fields::GST_NUMBER), "22AAAAA0000A1Z5");
    }

    #[tokio::test]
    async fn cancel_outside_verification_is_invalid() {
        let workflow = build(seeker_plan(), StubVerifier::default(), approving());
        assert!(matches!(
            workflow.cancel().await,
            Err(WorkflowError::InvalidStep {
                operation: "cancel",
                step: WorkflowStep::CollectingData
            })
        ));
    }

    #[tokio::test]
    async fn completion_after_cancel_is_ignored() {
        let hold = Arc::new(Notify::new());
        let verifier = StubVerifier {
            hold: Some(hold.clone()),
            ..StubVerifier::default()
        };
        let workflow = Arc::new(at_verification(verifier).await);

        let pending = {
            let workflow = workflow.clone();
            tokio::spawn(async move { workflow.verify(CODE).await })
        };
        wait_until_busy(&workflow).await;

        workflow.cancel().await.unwrap();
        hold.notify_one();

        let result = pending.await.unwrap();
        assert!(matches!(result, Err(WorkflowError::Superseded)));
        assert_eq!(workflow.step().await, WorkflowStep::CollectingData);
        assert!(!workflow.is_busy().await);
    }

    #[tokio::test]
    async fn second_request_while_busy_is_rejected() {
        let hold = Arc::new(Notify::new());
        let verifier = StubVerifier {
            hold: Some(hold.clone()),
            ..StubVerifier::default()
        };
        let workflow = Arc::new(at_verification(verifier).await);

        let pending = {
            let workflow = workflow.clone();
            tokio::spawn(async move { workflow.verify(CODE).await })
        };
        wait_until_busy(&workflow).await;

        assert!(matches!(workflow.verify(CODE).await, Err(WorkflowError::Busy)));
        assert!(matches!(workflow.resend().await, Err(WorkflowError::Busy)));

        hold.notify_one();
        assert_eq!(pending.await.unwrap().unwrap(), WorkflowStep::Completed);
    }

    #[tokio::test]
    async fn teardown_rejects_later_calls() {
        let workflow = at_verification(StubVerifier::default()).await;
        workflow.teardown().await;

        assert!(matches!(workflow.verify(CODE).await, Err(WorkflowError::Closed)));
        assert!(matches!(workflow.cancel().await, Err(WorkflowError::Closed)));
        assert!(matches!(
            workflow.update_field(fields::EMAIL, "x@y.z").await,
            Err(WorkflowError::Closed)
        ));
        assert!(workflow.view().await.closed);
    }

    #[tokio::test]
    async fn job_seeker_completes_after_payment() {
        let workflow = build(seeker_plan(), StubVerifier::default(), approving());
        fill_fresher(&workflow).await;

        assert_eq!(
            workflow.submit().await.unwrap(),
            WorkflowStep::AwaitingConfirmation
        );
        let charge = workflow.view().await.charge.unwrap();
        assert_eq!(charge.amount, 499);

        assert_eq!(workflow.confirm().await.unwrap(), WorkflowStep::Completed);
    }

    #[tokio::test]
    async fn declined_payment_stays_on_confirmation() {
        let payments = StubPayments {
            approve: false,
            hang: false,
        };
        let workflow = build(seeker_plan(), StubVerifier::default(), payments);
        fill_fresher(&workflow).await;
        workflow.submit().await.unwrap();

        assert!(matches!(
            workflow.confirm().await,
            Err(WorkflowError::PaymentDeclined)
        ));
        let view = workflow.view().await;
        assert_eq!(view.step, WorkflowStep::AwaitingConfirmation);
        assert_eq!(view.failure.as_deref(), Some(PAYMENT_DECLINED));
    }

    #[tokio::test]
    async fn hanging_payment_times_out() {
        let payments = StubPayments {
            approve: true,
            hang: true,
        };
        let workflow = build(seeker_plan(), StubVerifier::default(), payments);
        fill_fresher(&workflow).await;
        workflow.submit().await.unwrap();

        assert!(matches!(
            workflow.confirm().await,
            Err(WorkflowError::Timeout { .. })
        ));
        let view = workflow.view().await;
        assert_eq!(view.step, WorkflowStep::AwaitingConfirmation);
        assert_eq!(view.failure.as_deref(), Some(REQUEST_FAILED));
        assert!(!view.busy);
    }

    #[tokio::test]
    async fn job_posting_completes_on_submit() {
        let workflow = build(WorkflowPlan::job_posting(), StubVerifier::default(), approving());
        for (field, value) in [
            (fields::TITLE, "Warehouse Supervisor"),
            (fields::LOCATION, "Nagpur"),
            (fields::EMPLOYMENT_TYPE, "Full-time"),
            (fields::EXPERIENCE, "Mid Level (3-5 years)"),
            (fields::DESCRIPTION, "Run the night shift."),
            (fields::RESPONSIBILITIES, "Staff rota"),
            (fields::REQUIREMENTS, "Forklift licence"),
            (fields::SKILLS, "Inventory"),
        ] {
            workflow.update_field(field, value).await.unwrap();
        }

        assert_eq!(workflow.submit().await.unwrap(), WorkflowStep::Completed);
        assert!(matches!(
            workflow.update_field(fields::TITLE, "x").await,
            Err(WorkflowError::InvalidStep { .. })
        ));
    }

    #[tokio::test]
    async fn role_switch_resets_form() {
        let workflow = build(seeker_plan(), StubVerifier::default(), approving());
        fill_fresher(&workflow).await;

        workflow
            .select_role(RoleKind::ExperiencedProfessional)
            .await
            .unwrap();

        let view = workflow.view().await;
        assert_eq!(view.kind, FormKind::Registration(RoleKind::ExperiencedProfessional));
        assert_eq!(view.form.get(fields::FULL_NAME), "");
        assert!(view.form.skills.is_empty());

        assert!(matches!(
            workflow.select_role(RoleKind::Employer).await,
            Err(WorkflowError::RoleLocked)
        ));
    }

    #[tokio::test]
    async fn employer_role_is_locked() {
        let workflow = build(WorkflowPlan::employer_signup(), StubVerifier::default(), approving());
        assert!(matches!(
            workflow.select_role(RoleKind::Fresher).await,
            Err(WorkflowError::RoleLocked)
        ));
    }

    #[tokio::test]
    async fn events_follow_the_flow() {
        let workflow = at_verification(StubVerifier::default()).await;
        let mut rx = workflow.subscribe();

        workflow.verify(CODE).await.unwrap();

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert_eq!(events.first(), Some(&WorkflowEvent::BusyChanged { busy: true }));
        assert!(events.contains(&WorkflowEvent::StepChanged {
            from: WorkflowStep::AwaitingVerification,
            to: WorkflowStep::Completed,
        }));
    }

    #[test]
    fn otp_format_rules() {
        assert_eq!(otp_format_error(""), Some(OTP_REQUIRED));
        assert_eq!(otp_format_error("12345"), Some(OTP_LENGTH));
        assert_eq!(otp_format_error("1234567"), Some(OTP_LENGTH));
        assert_eq!(otp_format_error("١٢٣٤٥٦"), Some(OTP_LENGTH));
        assert_eq!(otp_format_error("123456"), None);
    }
}
