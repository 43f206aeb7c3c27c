//! Step sequencer — drives one signup session from data entry to completion.
//!
//! A session starts in `CollectingData`. A successful submit moves it into
//! the first gate of its plan (OTP verification or payment confirmation),
//! and each gate that succeeds hands over to the next until `Completed`.
//! Remote calls go through the service traits in [`crate::services`] and
//! never hold the session lock while they run.

pub mod events;
pub mod manager;
pub mod state;

pub use events::WorkflowEvent;
pub use manager::{ChargeView, RegistrationWorkflow, WorkflowView};
pub use state::{Gate, TicketView, VerificationTicket, WorkflowPlan, WorkflowStep};
