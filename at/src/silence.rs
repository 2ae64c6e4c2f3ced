//! Silence records and the update rules applied by the CLI

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AlertError;

/// Label matcher attached to a silence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matcher {
    pub name: String,
    pub value: String,
    #[serde(default, rename = "isRegex")]
    pub is_regex: bool,
}

/// A suppression record held by the remote alerting service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Silence {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub matchers: Vec<Matcher>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub comment: String,
}

/// Mutations applied to an existing silence before re-submission.
///
/// An explicit end time overrides a duration; a duration extends the
/// silence's current end.
#[derive(Debug, Clone, Default)]
pub struct SilenceUpdate {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub duration: Option<Duration>,
    pub comment: Option<String>,
}

impl SilenceUpdate {
    /// Apply the mutations, validating the resulting window
    pub fn apply(&self, silence: &Silence) -> Result<Silence, AlertError> {
        let mut updated = silence.clone();

        if let Some(end) = self.end {
            updated.ends_at = end;
        } else if let Some(duration) = self.duration {
            if duration.is_zero() {
                return Err(AlertError::Validation("silence duration must be greater than 0".into()));
            }
            updated.ends_at = updated.ends_at + duration;
        }

        if let Some(start) = self.start {
            updated.starts_at = start;
        }

        if updated.starts_at > updated.ends_at {
            return Err(AlertError::Validation("silence cannot start after it ends".into()));
        }

        if let Some(comment) = &self.comment {
            updated.comment = comment.clone();
        }

        Ok(updated)
    }
}
