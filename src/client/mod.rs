//! Gateways to the Task Backend API.
//!
//! Two traits describe what the view-models need from the backend:
//! - [`TaskRepository`]: CRUD on tasks
//! - [`SuggestionGateway`]: clarifying questions and description suggestions
//!
//! [`HttpTaskClient`] implements both over HTTP. Every call is a single
//! request/response round trip: no caching, no automatic retry.

mod error;
mod http;

pub use error::{classify_http_status, ClientError, ClientErrorKind, ClientResult};
pub use http::HttpTaskClient;

use async_trait::async_trait;
use std::sync::Arc;

use crate::task::{Task, TaskId};

/// CRUD operations on tasks.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// All tasks, in the order the backend returns them.
    async fn list(&self) -> ClientResult<Vec<Task>>;

    /// A single task by id.
    async fn get(&self, id: TaskId) -> ClientResult<Task>;

    /// Create a task. The title must already be trimmed and non-blank.
    async fn create(&self, title: &str, description: Option<&str>) -> ClientResult<Task>;

    /// Set the completed flag; other fields are untouched.
    async fn set_completed(&self, id: TaskId, completed: bool) -> ClientResult<Task>;

    /// Replace the description in full.
    async fn set_description(&self, id: TaskId, description: &str) -> ClientResult<Task>;

    /// Delete a task, returning its last known state.
    async fn delete(&self, id: TaskId) -> ClientResult<Task>;
}

/// Backend-hosted question/suggestion service.
#[async_trait]
pub trait SuggestionGateway: Send + Sync {
    /// Clarifying questions for a task, in display order.
    async fn fetch_questions(&self, id: TaskId) -> ClientResult<Vec<String>>;

    /// Suggested description from answers index-aligned to the last fetched questions.
    async fn generate_suggestion(&self, id: TaskId, answers: &[String]) -> ClientResult<String>;
}

pub type SharedRepository = Arc<dyn TaskRepository>;
pub type SharedSuggestions = Arc<dyn SuggestionGateway>;
