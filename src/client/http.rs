//! HTTP implementation of the task gateways.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::error::{ClientError, ClientResult};
use super::{SuggestionGateway, TaskRepository};
use crate::config::Config;
use crate::task::{DescriptionUpdate, NewTask, Task, TaskId};

/// Client for the Task Backend API.
#[derive(Debug, Clone)]
pub struct HttpTaskClient {
    client: Client,
    base_url: String,
}

impl HttpTaskClient {
    /// Create a client from configuration.
    pub fn new(config: &Config) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClientError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn tasks_url(&self) -> String {
        format!("{}/tasks", self.base_url)
    }

    fn task_url(&self, id: TaskId) -> String {
        format!("{}/tasks/{}", self.base_url, id)
    }

    /// Send a request and decode a JSON body, mapping failures to one error kind.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> ClientResult<T> {
        let response = request
            .send()
            .await
            .map_err(|e| failed(what, e.into()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| failed(what, e.into()))?;

        if !status.is_success() {
            return Err(failed(what, ClientError::from_status(status.as_u16(), &body)));
        }

        serde_json::from_str(&body).map_err(|e| {
            failed(
                what,
                ClientError::Transport(format!("Failed to parse response: {}, body: {}", e, body)),
            )
        })
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        tracing::debug!("{} {}", method, url);
        self.client.request(method, url)
    }
}

/// Log a failed call once and hand the error back.
fn failed(what: &str, err: ClientError) -> ClientError {
    tracing::warn!("{} failed: {}", what, err);
    err
}

#[async_trait]
impl TaskRepository for HttpTaskClient {
    async fn list(&self) -> ClientResult<Vec<Task>> {
        let request = self.request(Method::GET, self.tasks_url());
        self.execute(request, "list tasks").await
    }

    async fn get(&self, id: TaskId) -> ClientResult<Task> {
        let request = self.request(Method::GET, self.task_url(id));
        self.execute(request, "get task").await
    }

    async fn create(&self, title: &str, description: Option<&str>) -> ClientResult<Task> {
        let body = NewTask {
            title: title.to_string(),
            description: description.map(str::to_string),
        };
        let request = self.request(Method::POST, self.tasks_url()).json(&body);
        self.execute(request, "create task").await
    }

    async fn set_completed(&self, id: TaskId, completed: bool) -> ClientResult<Task> {
        // The flag travels in the query string; the body is an empty object.
        let request = self
            .request(Method::PUT, self.task_url(id))
            .query(&[("completed", completed)])
            .json(&serde_json::json!({}));
        self.execute(request, "set completed").await
    }

    async fn set_description(&self, id: TaskId, description: &str) -> ClientResult<Task> {
        let request = self
            .request(Method::PATCH, self.task_url(id))
            .json(&DescriptionUpdate { description });
        self.execute(request, "set description").await
    }

    async fn delete(&self, id: TaskId) -> ClientResult<Task> {
        let request = self.request(Method::DELETE, self.task_url(id));
        self.execute(request, "delete task").await
    }
}

#[async_trait]
impl SuggestionGateway for HttpTaskClient {
    async fn fetch_questions(&self, id: TaskId) -> ClientResult<Vec<String>> {
        let url = format!("{}/questions", self.task_url(id));
        let response: QuestionsResponse = self
            .execute(self.request(Method::GET, url), "fetch questions")
            .await?;
        Ok(response.questions)
    }

    async fn generate_suggestion(&self, id: TaskId, answers: &[String]) -> ClientResult<String> {
        let url = format!("{}/suggest", self.task_url(id));
        let request = self
            .request(Method::POST, url)
            .json(&SuggestRequest { answers });
        let response: SuggestResponse = self.execute(request, "generate suggestion").await?;
        Ok(response.suggestion)
    }
}

/// `GET /tasks/{id}/questions` response.
#[derive(Debug, Deserialize)]
struct QuestionsResponse {
    #[serde(default)]
    questions: Vec<String>,
}

/// `POST /tasks/{id}/suggest` request.
#[derive(Debug, Serialize)]
struct SuggestRequest<'a> {
    answers: &'a [String],
}

/// `POST /tasks/{id}/suggest` response.
#[derive(Debug, Deserialize)]
struct SuggestResponse {
    suggestion: String,
}
