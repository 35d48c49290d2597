use std::fmt;

/// Stable identity of a read operation: its name plus any identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn current_user() -> Self {
        Self::new(["user", "me"])
    }

    pub fn interviews() -> Self {
        Self::new(["interviews"])
    }

    pub fn interview(id: &str) -> Self {
        Self::new(["interview", id])
    }

    pub fn payment_status(payment_id: &str) -> Self {
        Self::new(["payment-status", payment_id])
    }

    pub fn vapi_status() -> Self {
        Self::new(["vapi", "status"])
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}
