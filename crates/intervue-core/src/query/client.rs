//! Query layer for the intervue API.
//!
//! `QueryClient` issues every read through `query` (enablement gate, cache,
//! retry with backoff) and every write through `mutate` (single attempt,
//! caller-supplied side effects).

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use super::cache::{CachedData, QueryCache};
use super::notify::{Notifier, TracingNotifier};
use super::{QueryKey, QueryState};
use crate::api::{ApiClient, ApiError};
use crate::auth::AuthContext;
use crate::config::Config;
use crate::models::{
    AuthResponse, InitiatePaymentRequest, Interview, OtpRequest, PaymentInitiation,
    PaymentStatus, SignInRequest, User, VapiStatus, VerifyOtpRequest,
};
use crate::retry::RetryPolicy;

/// Clone is cheap - the API client, auth context and cache are shared.
#[derive(Clone)]
pub struct QueryClient {
    api: ApiClient,
    auth: AuthContext,
    retry: RetryPolicy,
    cache: Arc<QueryCache>,
    notifier: Arc<dyn Notifier>,
    stale_after: Duration,
}

impl QueryClient {
    /// Defaults: `RetryPolicy::default()`, logging notifier, and a zero stale
    /// time (every enabled read hits the network).
    pub fn new(api: ApiClient, auth: AuthContext) -> Self {
        Self {
            api,
            auth,
            retry: RetryPolicy::default(),
            cache: Arc::new(QueryCache::new()),
            notifier: Arc::new(TracingNotifier),
            stale_after: Duration::ZERO,
        }
    }

    /// Build the API client and query client described by `config`.
    pub fn from_config(config: &Config, auth: AuthContext) -> Result<Self, ApiError> {
        let api = ApiClient::with_auth(&config.api_origin, config.request_timeout(), auth.clone())?;
        Ok(Self::new(api, auth)
            .with_retry_policy(config.retry_policy())
            .with_stale_time(config.stale_time()))
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_stale_time(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Run a read operation.
    ///
    /// When `enabled` is false nothing is fetched, any cached entry for `key`
    /// is dropped, and the result is `Pending`. Failures are retried per the
    /// retry policy; a 401 empties the whole cache. A result that lands after
    /// the session changed is returned but not cached.
    pub async fn query<T, F, Fut>(&self, key: QueryKey, enabled: bool, fetch: F) -> QueryState<T>
    where
        T: Serialize + DeserializeOwned,
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        if !enabled {
            self.cache.remove(&key);
            debug!(key = %key, "Query disabled");
            return QueryState::Pending;
        }

        if let Some(data) = self.cache.fresh(&key, self.stale_after) {
            return QueryState::Success(data);
        }

        let epoch = self.auth.session().epoch();
        let mut attempts = 0;
        loop {
            attempts += 1;
            match fetch().await {
                Ok(data) => {
                    if self.auth.session().epoch() == epoch {
                        self.cache.insert(key, &data);
                    } else {
                        debug!(key = %key, "Session changed during fetch, not caching");
                    }
                    return QueryState::Success(data);
                }
                Err(e) => {
                    if !self.retry.should_retry(attempts, &e) {
                        if e.is_unauthorized() {
                            self.cache.clear();
                        }
                        warn!(key = %key, attempts, error = %e, "Query failed");
                        return QueryState::Error(e);
                    }
                    let delay = self.retry.delay(attempts);
                    warn!(
                        key = %key,
                        attempt = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Query failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Run a write operation exactly once.
    ///
    /// `on_success` or `on_error` runs once before the result is returned.
    pub async fn mutate<T, Fut, S, E>(
        &self,
        label: &str,
        operation: Fut,
        on_success: S,
        on_error: E,
    ) -> Result<T, ApiError>
    where
        Fut: Future<Output = Result<T, ApiError>>,
        S: FnOnce(&T),
        E: FnOnce(&ApiError),
    {
        match operation.await {
            Ok(data) => {
                debug!(mutation = label, "Mutation succeeded");
                on_success(&data);
                Ok(data)
            }
            Err(e) => {
                warn!(mutation = label, error = %e, "Mutation failed");
                if e.is_unauthorized() {
                    self.cache.clear();
                }
                on_error(&e);
                Err(e)
            }
        }
    }

    /// Last cached value for `key`, however old.
    pub fn cached<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<CachedData<T>> {
        self.cache.get(key)
    }

    pub fn invalidate(&self, key: &QueryKey) -> bool {
        self.cache.remove(key)
    }

    // ===== Reads =====

    /// Profile of the signed-in user. Enabled only while a token is held;
    /// success stores the user in the session unless the session was torn
    /// down or replaced while the request was in flight.
    pub async fn current_user(&self) -> QueryState<User> {
        let api = &self.api;
        let epoch = self.auth.session().epoch();
        let state = self
            .query(QueryKey::current_user(), self.auth.has_token(), move || {
                api.current_user()
            })
            .await;
        if let QueryState::Success(ref user) = state {
            if !self.auth.session().set_user_if_current(epoch, user.clone()) {
                debug!("Session changed while loading profile, discarding user");
            }
        }
        state
    }

    pub async fn interviews(&self) -> QueryState<Vec<Interview>> {
        let api = &self.api;
        self.query(QueryKey::interviews(), self.auth.has_token(), move || {
            api.interviews()
        })
        .await
    }

    pub async fn interview(&self, id: &str) -> QueryState<Interview> {
        let api = &self.api;
        let enabled = self.auth.has_token() && !id.trim().is_empty();
        self.query(QueryKey::interview(id), enabled, move || api.interview(id))
            .await
    }

    pub async fn payment_status(&self, payment_id: &str) -> QueryState<PaymentStatus> {
        let api = &self.api;
        let enabled = self.auth.has_token() && !payment_id.trim().is_empty();
        self.query(QueryKey::payment_status(payment_id), enabled, move || {
            api.payment_status(payment_id)
        })
        .await
    }

    /// Poll a payment until the gateway reports a terminal state, a poll
    /// fails, or `max_polls` polls have been made.
    pub async fn await_payment(
        &self,
        payment_id: &str,
        interval: Duration,
        max_polls: u32,
    ) -> QueryState<PaymentStatus> {
        let key = QueryKey::payment_status(payment_id);
        let mut last = QueryState::Pending;
        for poll in 0..max_polls {
            if poll > 0 {
                tokio::time::sleep(interval).await;
            }
            self.cache.remove(&key);
            last = self.payment_status(payment_id).await;
            let settled = match last {
                QueryState::Success(ref status) => status.status.is_terminal(),
                _ => true,
            };
            if settled {
                return last;
            }
            debug!(payment_id, poll, "Payment not settled yet");
        }
        last
    }

    /// Voice-assistant connectivity. Needs no credential.
    pub async fn vapi_status(&self) -> QueryState<VapiStatus> {
        let api = &self.api;
        self.query(QueryKey::vapi_status(), true, move || api.vapi_status())
            .await
    }

    // ===== Mutations =====

    /// Sign in. A returned token starts the session; a response asking for
    /// OTP leaves the session unauthenticated. A token that cannot be stored
    /// fails the mutation.
    pub async fn sign_in(&self, request: &SignInRequest) -> Result<AuthResponse, ApiError> {
        self.mutate(
            "sign-in",
            async { self.commit_auth(self.api.sign_in(request).await?) },
            |response| self.notify_auth(response, "Signed in successfully"),
            |e| self.notifier.error(&e.user_message()),
        )
        .await
    }

    pub async fn request_otp(&self, request: &OtpRequest) -> Result<AuthResponse, ApiError> {
        self.mutate(
            "send-otp",
            self.api.request_otp(request),
            |response| {
                let message = response
                    .message
                    .as_deref()
                    .unwrap_or("Verification code sent. Check your email.");
                self.notifier.success(message);
            },
            |e| self.notifier.error(&e.user_message()),
        )
        .await
    }

    pub async fn verify_otp(&self, request: &VerifyOtpRequest) -> Result<AuthResponse, ApiError> {
        self.mutate(
            "verify-otp",
            async { self.commit_auth(self.api.verify_otp(request).await?) },
            |response| self.notify_auth(response, "Email verified, you are signed in"),
            |e| self.notifier.error(&e.user_message()),
        )
        .await
    }

    pub async fn initiate_payment(
        &self,
        request: &InitiatePaymentRequest,
    ) -> Result<PaymentInitiation, ApiError> {
        self.mutate(
            "initiate-payment",
            self.api.initiate_payment(request),
            |initiation| {
                self.cache
                    .remove(&QueryKey::payment_status(&initiation.payment_id));
                self.notifier.success("Payment initiated");
            },
            |e| self.notifier.error(&e.user_message()),
        )
        .await
    }

    /// Explicit sign-out: clears the credential, the session and every
    /// cached query.
    pub fn logout(&self) {
        self.auth.logout();
        self.cache.clear();
        self.notifier.success("Signed out");
    }

    fn commit_auth(&self, response: AuthResponse) -> Result<AuthResponse, ApiError> {
        if let Some(token) = response.token() {
            self.auth.login(token, response.user.clone())?;
            // A new identity must not see the previous one's cached data.
            self.cache.clear();
            info!("Authenticated");
        }
        Ok(response)
    }

    fn notify_auth(&self, response: &AuthResponse, success_message: &str) {
        if response.token().is_some() {
            self.notifier.success(success_message);
        } else {
            let message = response
                .message
                .as_deref()
                .unwrap_or("Check your email for a verification code");
            self.notifier.success(message);
        }
    }
}

impl std::fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryClient")
            .field("api", &self.api)
            .field("auth", &self.auth)
            .field("retry", &self.retry)
            .field("cached_queries", &self.cache.len())
            .field("stale_after", &self.stale_after)
            .finish()
    }
}
