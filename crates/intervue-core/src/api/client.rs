//! API client for the intervue backend-for-frontend routes.
//!
//! This module provides the `ApiClient` struct: one request pipeline with
//! ordered interceptor lists, plus typed helpers for each endpoint.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use super::interceptor::{
    BearerAuth, RequestInterceptor, RequestLog, ResponseInterceptor, SessionTeardown,
};
use super::request::{InboundResponse, OutboundRequest};
use super::ApiError;
use crate::auth::AuthContext;
use crate::models::{
    AuthResponse, InitiatePaymentRequest, Interview, OtpRequest, PaymentInitiation,
    PaymentStatus, SignInRequest, User, VapiStatus, VerifyOtpRequest,
};

// ============================================================================
// Constants
// ============================================================================

/// Default HTTP request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Path prefix of the backend-for-frontend routes
const API_PREFIX: &str = "/api";

/// Characters that may not appear in an identifier interpolated into a path
const RESERVED_PATH_CHARS: &[char] = &['/', '?', '#', '%', '\\'];

/// API client for the intervue backend.
/// Clone is cheap - reqwest::Client and the interceptor lists are shared via Arc.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Arc<str>,
    request_interceptors: Arc<Vec<Arc<dyn RequestInterceptor>>>,
    response_interceptors: Arc<Vec<Arc<dyn ResponseInterceptor>>>,
}

impl ApiClient {
    /// Create a client without interceptors.
    ///
    /// `origin` is the site origin, e.g. `https://app.example.com`; requests
    /// go to `<origin>/api<path>`.
    pub fn new(origin: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: Self::base_url_for(origin).into(),
            request_interceptors: Arc::new(Vec::new()),
            response_interceptors: Arc::new(Vec::new()),
        })
    }

    /// Create a client with the standard pipeline: request logging, bearer
    /// credential, and 401 session teardown.
    pub fn with_auth(origin: &str, timeout: Duration, auth: AuthContext) -> Result<Self, ApiError> {
        let log = Arc::new(RequestLog);
        Ok(Self::new(origin, timeout)?
            .with_request_interceptor(Arc::new(BearerAuth::new(auth.tokens().clone())))
            .with_request_interceptor(log.clone())
            .with_response_interceptor(log)
            .with_response_interceptor(Arc::new(SessionTeardown::new(auth))))
    }

    pub fn base_url_for(origin: &str) -> String {
        format!("{}{}", origin.trim_end_matches('/'), API_PREFIX)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Append a request interceptor. Clones made earlier keep their own list.
    pub fn with_request_interceptor(mut self, interceptor: Arc<dyn RequestInterceptor>) -> Self {
        Arc::make_mut(&mut self.request_interceptors).push(interceptor);
        self
    }

    /// Append a response interceptor. Clones made earlier keep their own list.
    pub fn with_response_interceptor(mut self, interceptor: Arc<dyn ResponseInterceptor>) -> Self {
        Arc::make_mut(&mut self.response_interceptors).push(interceptor);
        self
    }

    /// Run one request through the pipeline.
    ///
    /// Response interceptors see every outcome, including transport failures.
    pub async fn send(&self, request: OutboundRequest) -> Result<InboundResponse, ApiError> {
        let request = self
            .request_interceptors
            .iter()
            .fold(request, |req, interceptor| interceptor.on_request(req));

        let outcome = self.dispatch(request).await;

        self.response_interceptors
            .iter()
            .fold(outcome, |outcome, interceptor| interceptor.on_response(outcome))
    }

    async fn dispatch(&self, request: OutboundRequest) -> Result<InboundResponse, ApiError> {
        let url = format!("{}{}", self.base_url, request.path);

        let mut builder = self
            .client
            .request(request.method, &url)
            .header(header::ACCEPT, "application/json")
            .headers(request.headers);
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();

        if status.is_success() {
            let body = response.text().await?;
            Ok(InboundResponse {
                status,
                headers,
                body,
            })
        } else {
            let body = response.text().await.unwrap_or_default();
            debug!(url = %url, status = %status, "Non-success response");
            Err(ApiError::from_status(status, &body))
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(OutboundRequest::get(path)).await?.json()
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send(OutboundRequest::post(path).json(body)?)
            .await?
            .json()
    }

    /// Reject identifiers that would change the shape of the path.
    fn path_segment(id: &str) -> Result<&str, ApiError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(ApiError::InvalidRequest("Empty identifier".to_string()));
        }
        if id.contains(RESERVED_PATH_CHARS) || id.chars().any(char::is_whitespace) {
            return Err(ApiError::InvalidRequest(format!(
                "Identifier contains reserved characters: {}",
                id
            )));
        }
        Ok(id)
    }

    // ===== Authentication =====

    /// Sign in with email and password. The response may carry a token or
    /// ask for OTP verification.
    pub async fn sign_in(&self, request: &SignInRequest) -> Result<AuthResponse, ApiError> {
        self.post("/auth/sign-in", request).await
    }

    /// Ask the backend to email a one-time passcode.
    pub async fn request_otp(&self, request: &OtpRequest) -> Result<AuthResponse, ApiError> {
        self.post("/auth/send-otp", request).await
    }

    pub async fn verify_otp(&self, request: &VerifyOtpRequest) -> Result<AuthResponse, ApiError> {
        self.post("/auth/verify-otp", request).await
    }

    // ===== Data Fetching Methods =====

    /// Fetch the profile of the signed-in user
    pub async fn current_user(&self) -> Result<User, ApiError> {
        self.get("/user/profile").await
    }

    pub async fn interviews(&self) -> Result<Vec<Interview>, ApiError> {
        self.get("/interviews").await
    }

    pub async fn interview(&self, id: &str) -> Result<Interview, ApiError> {
        let id = Self::path_segment(id)?;
        self.get(&format!("/interviews/{}", id)).await
    }

    // ===== Payments =====

    pub async fn initiate_payment(
        &self,
        request: &InitiatePaymentRequest,
    ) -> Result<PaymentInitiation, ApiError> {
        self.post("/payment/initiate", request).await
    }

    pub async fn payment_status(&self, payment_id: &str) -> Result<PaymentStatus, ApiError> {
        let payment_id = Self::path_segment(payment_id)?;
        self.get(&format!("/payment/status/{}", payment_id)).await
    }

    // ===== Voice assistant =====

    /// Check that the backend can reach the voice-assistant platform
    pub async fn vapi_status(&self) -> Result<VapiStatus, ApiError> {
        self.get("/vapi/test").await
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("request_interceptors", &self.request_interceptors.len())
            .field("response_interceptors", &self.response_interceptors.len())
            .finish()
    }
}
