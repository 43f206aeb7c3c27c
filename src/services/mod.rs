//! External collaborators the workflow talks to.
//!
//! Both are opaque services: the workflow only needs the async calls below
//! and treats every one of them as fallible.

mod mock;

use async_trait::async_trait;

use crate::error::ServiceError;

pub use mock::{MockPaymentGateway, MockVerificationService};

/// Sends and checks one-time passwords for a contact (mobile number).
#[async_trait]
pub trait VerificationService: Send + Sync {
    /// Issue a fresh code to `contact`.
    async fn send_code(&self, contact: &str) -> Result<(), ServiceError>;

    /// Returns `Ok(false)` for a wrong or expired code.
    async fn check_code(&self, contact: &str, code: &str) -> Result<bool, ServiceError>;
}

/// Charges a subscription plan.
#[async_trait]
pub trait PaymentService: Send + Sync {
    /// Returns `Ok(false)` when the charge is declined.
    async fn charge(&self, plan: &str, amount: i64) -> Result<bool, ServiceError>;
}
