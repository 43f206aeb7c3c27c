//! Configuration types.

use std::time::Duration;

use crate::error::ConfigError;
use crate::workflow::{Gate, WorkflowPlan};

/// Sequencer and mock-service settings.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Upper bound on any single verification or payment request.
    pub request_timeout: Duration,
    /// Simulated latency for the mock collaborators.
    pub mock_latency: Duration,
    /// Fixed code for the mock OTP sender. `None` generates a random one per send.
    pub mock_otp: Option<String>,
    /// Subscription plan charged at the end of job-seeker signup.
    pub plan_name: String,
    /// Plan price in whole rupees.
    pub plan_amount: i64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            mock_latency: Duration::from_millis(2000),
            mock_otp: None,
            plan_name: "6-Month Premium Access".to_string(),
            plan_amount: 499,
        }
    }
}

impl WorkflowConfig {
    /// Build config from environment variables, falling back to defaults
    /// for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let request_timeout = std::env::var("SIGNUP_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        let mock_latency = std::env::var("SIGNUP_MOCK_LATENCY_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.mock_latency);

        let mock_otp = std::env::var("SIGNUP_MOCK_OTP")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let plan_name = std::env::var("SIGNUP_PLAN_NAME")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.plan_name);

        let plan_amount = std::env::var("SIGNUP_PLAN_AMOUNT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.plan_amount);

        Self {
            request_timeout,
            mock_latency,
            mock_otp,
            plan_name,
            plan_amount,
        }
    }

    /// Resolve a flow name (`employer`, `jobseeker`, `job-posting`) into a plan.
    pub fn plan_for(&self, flow: &str) -> Result<WorkflowPlan, ConfigError> {
        match flow.trim().to_ascii_lowercase().as_str() {
            "employer" => Ok(WorkflowPlan::employer_signup()),
            "jobseeker" | "job-seeker" | "seeker" => Ok(WorkflowPlan::job_seeker_signup(
                Gate::Payment {
                    plan: self.plan_name.clone(),
                    amount: self.plan_amount,
                },
            )),
            "job-posting" | "post-job" | "posting" => Ok(WorkflowPlan::job_posting()),
            other => Err(ConfigError::UnknownFlow(other.to_string())),
        }
    }
}
