use crate::api::ApiError;

/// Observable phase of a read operation.
#[derive(Debug)]
pub enum QueryState<T> {
    /// Not resolved. Also the state of a disabled query.
    Pending,
    Success(T),
    Error(ApiError),
}

impl<T> QueryState<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, QueryState::Pending)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, QueryState::Success(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, QueryState::Error(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            QueryState::Success(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            QueryState::Error(e) => Some(e),
            _ => None,
        }
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            QueryState::Success(data) => Some(data),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> QueryState<U> {
        match self {
            QueryState::Pending => QueryState::Pending,
            QueryState::Success(data) => QueryState::Success(f(data)),
            QueryState::Error(e) => QueryState::Error(e),
        }
    }
}

impl<T> From<Result<T, ApiError>> for QueryState<T> {
    fn from(result: Result<T, ApiError>) -> Self {
        match result {
            Ok(data) => QueryState::Success(data),
            Err(e) => QueryState::Error(e),
        }
    }
}
