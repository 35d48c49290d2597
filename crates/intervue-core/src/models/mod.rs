//! Data models for the intervue API.
//!
//! This module contains the wire types exchanged with the backend-for-frontend
//! routes:
//!
//! - `User`: the signed-in account returned by the profile route
//! - `Interview`: generated practice interviews
//! - Payment types: `InitiatePaymentRequest`, `PaymentInitiation`, `PaymentStatus`
//! - Auth payloads: `SignInRequest`, `OtpRequest`, `VerifyOtpRequest`, `AuthResponse`
//! - `VapiStatus`: voice-assistant connectivity check
//!
//! With the `ts` feature enabled, each type also derives `ts_rs::TS` so the
//! web front-end can share the definitions.

pub mod auth;
pub mod interview;
pub mod payment;
pub mod user;
pub mod vapi;

pub use auth::{AuthResponse, OtpRequest, SignInRequest, VerifyOtpRequest};
pub use interview::Interview;
pub use payment::{InitiatePaymentRequest, PaymentInitiation, PaymentState, PaymentStatus};
pub use user::User;
pub use vapi::VapiStatus;
