//! Task types shared by the repository client and the view-models.

use serde::{Deserialize, Serialize};

/// Backend-assigned task identifier.
pub type TaskId = i64;

/// A titled, optionally described, completable unit of work.
///
/// `description` distinguishes "absent" (`None`) from an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
}

impl Task {
    /// Description text, or `""` when absent.
    pub fn description_or_empty(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }
}

/// Body of `POST /tasks`.
#[derive(Debug, Clone, Serialize)]
pub struct NewTask {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Body of `PATCH /tasks/{id}`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct DescriptionUpdate<'a> {
    pub description: &'a str,
}

/// Returns the trimmed title, or `None` when nothing but whitespace is left.
pub fn normalize_title(title: &str) -> Option<&str> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
