//! In-process stand-ins for the OTP sender and payment processor.
//!
//! Both answer after a fixed delay. The OTP mock keeps track of the code it
//! sent, so a wrong code is rejected instead of silently accepted.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{PaymentService, VerificationService};
use crate::error::ServiceError;

/// Mock OTP sender. Logs each code at `info` so a developer can finish the flow.
pub struct MockVerificationService {
    latency: Duration,
    fixed_code: Option<String>,
    issued: Mutex<HashMap<String, String>>,
}

impl MockVerificationService {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            fixed_code: None,
            issued: Mutex::new(HashMap::new()),
        }
    }

    /// Always issue `code` instead of a random one.
    pub fn with_fixed_code(mut self, code: impl Into<String>) -> Self {
        self.fixed_code = Some(code.into());
        self
    }

    /// Last code sent to `contact`, if any.
    pub async fn issued_code(&self, contact: &str) -> Option<String> {
        self.issued.lock().await.get(contact).cloned()
    }

    fn next_code(&self) -> String {
        match &self.fixed_code {
            Some(code) => code.clone(),
            None => format!("{:06}", rand::thread_rng().gen_range(0..1_000_000)),
        }
    }
}

#[async_trait]
impl VerificationService for MockVerificationService {
    async fn send_code(&self, contact: &str) -> Result<(), ServiceError> {
        tokio::time::sleep(self.latency).await;
        let code = self.next_code();
        info!(contact = %contact, code = %code, "Mock OTP sent");
        self.issued.lock().await.insert(contact.to_string(), code);
        Ok(())
    }

    async fn check_code(&self, contact: &str, code: &str) -> Result<bool, ServiceError> {
        tokio::time::sleep(self.latency).await;
        let issued = self.issued.lock().await;
        let matched = issued.get(contact).is_some_and(|expected| expected == code);
        debug!(contact = %contact, matched, "Mock OTP checked");
        Ok(matched)
    }
}

/// Mock payment processor. Approves every charge unless built with `declining`.
pub struct MockPaymentGateway {
    latency: Duration,
    approve: bool,
}

impl MockPaymentGateway {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            approve: true,
        }
    }

    pub fn declining(latency: Duration) -> Self {
        Self {
            latency,
            approve: false,
        }
    }
}

#[async_trait]
impl PaymentService for MockPaymentGateway {
    async fn charge(&self, plan: &str, amount: i64) -> Result<bool, ServiceError> {
        tokio::time::sleep(self.latency).await;
        if amount <= 0 {
            return Err(ServiceError::Rejected {
                service: "payment".to_string(),
                reason: format!("invalid amount {amount}"),
            });
        }
        info!(plan = %plan, amount, approved = self.approve, "Mock payment processed");
        Ok(self.approve)
    }
}
