//! Signup flow — multi-step registration workflows with conditional field
//! validation, OTP verification and subscription payment.

pub mod config;
pub mod error;
pub mod form;
pub mod services;
pub mod validation;
pub mod workflow;
