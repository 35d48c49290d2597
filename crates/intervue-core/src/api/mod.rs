//! REST client for the intervue backend-for-frontend routes.
//!
//! Every call goes through `ApiClient::send`, which runs the registered
//! request interceptors, dispatches with reqwest, turns non-2xx statuses into
//! `ApiError`, then runs the response interceptors.
//!
//! The default pipeline attaches the bearer credential (`BearerAuth`) and
//! tears the session down on any 401 (`SessionTeardown`).

pub mod client;
pub mod error;
pub mod interceptor;
pub mod request;

pub use client::ApiClient;
pub use error::ApiError;
pub use interceptor::{
    BearerAuth, RequestInterceptor, RequestLog, ResponseInterceptor, SessionTeardown,
};
pub use request::{InboundResponse, OutboundRequest};
