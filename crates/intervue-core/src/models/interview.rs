use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A practice interview generated for the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Interview {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub role: String,
    #[serde(default)]
    pub level: Option<String>,
    /// Interview flavour such as "technical" or "behavioural".
    #[serde(rename = "type", default)]
    pub interview_type: Option<String>,
    #[serde(default)]
    pub techstack: Vec<String>,
    #[serde(default)]
    pub questions: Vec<String>,
    #[serde(default)]
    pub finalized: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Interview {
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// One-line summary used in listings, e.g. `Backend Engineer (senior) - rust, sql`.
    pub fn summary(&self) -> String {
        let mut line = self.role.clone();
        if let Some(ref level) = self.level {
            line.push_str(&format!(" ({})", level));
        }
        if !self.techstack.is_empty() {
            line.push_str(" - ");
            line.push_str(&self.techstack.join(", "));
        }
        line
    }
}
