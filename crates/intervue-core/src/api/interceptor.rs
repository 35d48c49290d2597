//! Interception points of the client pipeline.
//!
//! Request interceptors run in registration order before dispatch. Response
//! interceptors run in registration order on the outcome of every call,
//! successful or not. Both are plain synchronous transforms.

use reqwest::header::{self, HeaderValue};
use tracing::{debug, warn};

use super::request::{InboundResponse, OutboundRequest};
use super::ApiError;
use crate::auth::{AuthContext, TokenStore};

pub trait RequestInterceptor: Send + Sync {
    fn on_request(&self, request: OutboundRequest) -> OutboundRequest;
}

pub trait ResponseInterceptor: Send + Sync {
    fn on_response(
        &self,
        outcome: Result<InboundResponse, ApiError>,
    ) -> Result<InboundResponse, ApiError>;
}

/// Attaches `Authorization: Bearer <token>` when the token store holds one.
pub struct BearerAuth {
    tokens: TokenStore,
}

impl BearerAuth {
    pub fn new(tokens: TokenStore) -> Self {
        Self { tokens }
    }
}

impl RequestInterceptor for BearerAuth {
    fn on_request(&self, mut request: OutboundRequest) -> OutboundRequest {
        let Some(token) = self.tokens.get_token() else {
            return request;
        };
        match HeaderValue::from_str(&format!("Bearer {}", token)) {
            Ok(mut value) => {
                value.set_sensitive(true);
                request.headers.insert(header::AUTHORIZATION, value);
            }
            Err(e) => {
                warn!(error = %e, "Stored token is not a valid header value, sending without it");
            }
        }
        request
    }
}

/// Clears the session when the backend answers 401, then re-raises the error.
pub struct SessionTeardown {
    auth: AuthContext,
}

impl SessionTeardown {
    pub fn new(auth: AuthContext) -> Self {
        Self { auth }
    }
}

impl ResponseInterceptor for SessionTeardown {
    fn on_response(
        &self,
        outcome: Result<InboundResponse, ApiError>,
    ) -> Result<InboundResponse, ApiError> {
        // Transport failures carry no status and never tear down.
        if let Err(ref e) = outcome {
            if e.is_unauthorized() {
                self.auth.teardown();
            }
        }
        outcome
    }
}

/// Logs method, path and outcome of every call at debug level.
pub struct RequestLog;

impl RequestInterceptor for RequestLog {
    fn on_request(&self, request: OutboundRequest) -> OutboundRequest {
        debug!(
            method = %request.method,
            path = %request.path,
            authenticated = request.headers.contains_key(header::AUTHORIZATION),
            "Dispatching request"
        );
        request
    }
}

impl ResponseInterceptor for RequestLog {
    fn on_response(
        &self,
        outcome: Result<InboundResponse, ApiError>,
    ) -> Result<InboundResponse, ApiError> {
        match outcome {
            Ok(ref response) => debug!(status = %response.status, "Response received"),
            Err(ref e) => debug!(status = ?e.status(), error = %e, "Request failed"),
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use reqwest::StatusCode;

    use crate::auth::MemoryStorage;
    use crate::models::User;

    fn tokens() -> TokenStore {
        TokenStore::new(Arc::new(MemoryStorage::new()))
    }

    fn signed_in() -> AuthContext {
        let auth = AuthContext::new(tokens());
        let user = User {
            id: "u_1".to_string(),
            email: "ada@example.com".to_string(),
            name: None,
            image_url: None,
            credits: None,
            created_at: None,
        };
        auth.login("tok_1", Some(user)).unwrap();
        auth
    }

    fn ok_response() -> InboundResponse {
        InboundResponse {
            status: StatusCode::OK,
            headers: Default::default(),
            body: "{}".to_string(),
        }
    }

    #[test]
    fn test_bearer_attached_when_token_present() {
        let store = tokens();
        store.set_token("tok_abc").unwrap();
        let request = BearerAuth::new(store).on_request(OutboundRequest::get("/user/profile"));
        assert_eq!(
            request.headers.get(header::AUTHORIZATION).unwrap(),
            "Bearer tok_abc"
        );
    }

    #[test]
    fn test_no_header_without_token() {
        let request = BearerAuth::new(tokens()).on_request(OutboundRequest::get("/user/profile"));
        assert!(request.headers.get(header::AUTHORIZATION).is_none());
    }

    #[test]
    fn test_bearer_reads_token_at_dispatch_time() {
        let store = tokens();
        let interceptor = BearerAuth::new(store.clone());
        store.set_token("first").unwrap();
        let first = interceptor.on_request(OutboundRequest::get("/a"));
        store.set_token("second").unwrap();
        let second = interceptor.on_request(OutboundRequest::get("/a"));
        assert_eq!(first.headers[header::AUTHORIZATION], "Bearer first");
        assert_eq!(second.headers[header::AUTHORIZATION], "Bearer second");
    }

    #[test]
    fn test_invalid_token_does_not_abort_request() {
        let store = tokens();
        store.set_token("bad\ntoken").unwrap();
        let request = BearerAuth::new(store).on_request(OutboundRequest::get("/a"));
        assert!(request.headers.get(header::AUTHORIZATION).is_none());
    }

    #[test]
    fn test_401_tears_down_and_reraises() {
        let auth = signed_in();
        let outcome = SessionTeardown::new(auth.clone()).on_response(Err(ApiError::Unauthorized));
        assert!(matches!(outcome, Err(ApiError::Unauthorized)));
        assert_eq!(auth.token(), None);
        assert!(auth.session().is_empty());
    }

    #[test]
    fn test_other_failures_leave_session_alone() {
        let auth = signed_in();
        let before = auth.session().snapshot();
        let teardown = SessionTeardown::new(auth.clone());

        for status in [StatusCode::FORBIDDEN, StatusCode::INTERNAL_SERVER_ERROR] {
            let outcome = teardown.on_response(Err(ApiError::from_status(status, "")));
            assert_eq!(outcome.unwrap_err().status(), Some(status.as_u16()));
        }
        let _ = teardown.on_response(Err(ApiError::InvalidResponse("garbage".to_string())));
        assert!(teardown.on_response(Ok(ok_response())).is_ok());

        assert_eq!(auth.token().as_deref(), Some("tok_1"));
        assert_eq!(auth.session().snapshot(), before);
    }
}
