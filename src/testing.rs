//! In-memory backend used by the view-model unit tests.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::{oneshot, Notify};

use crate::client::{ClientError, ClientResult, SuggestionGateway, TaskRepository};
use crate::task::{Task, TaskId};

struct Gate {
    entered: oneshot::Sender<()>,
    release: Arc<Notify>,
}

#[derive(Default)]
struct FakeState {
    tasks: Vec<Task>,
    next_id: TaskId,
    calls: Vec<String>,
    fail_next: Option<ClientError>,
    questions: Vec<String>,
    suggestion: String,
    gate: Option<Gate>,
}

/// Implements both gateways over a `Vec<Task>`.
#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_tasks(tasks: Vec<Task>) -> Arc<Self> {
        let backend = Self::default();
        {
            let mut state = backend.state.lock().unwrap();
            state.next_id = tasks.iter().map(|t| t.id).max().unwrap_or(0);
            state.tasks = tasks;
        }
        Arc::new(backend)
    }

    pub fn set_questions(&self, questions: &[&str]) {
        self.state.lock().unwrap().questions = questions.iter().map(|q| q.to_string()).collect();
    }

    pub fn set_suggestion(&self, suggestion: &str) {
        self.state.lock().unwrap().suggestion = suggestion.to_string();
    }

    /// Make the next call fail with `error`.
    pub fn fail_next(&self, error: ClientError) {
        self.state.lock().unwrap().fail_next = Some(error);
    }

    /// Hold the next call until the returned `Notify` fires.
    ///
    /// The receiver resolves once that call has reached the backend.
    pub fn hold_next(&self) -> (oneshot::Receiver<()>, Arc<Notify>) {
        let (tx, rx) = oneshot::channel();
        let release = Arc::new(Notify::new());
        self.state.lock().unwrap().gate = Some(Gate {
            entered: tx,
            release: Arc::clone(&release),
        });
        (rx, release)
    }

    /// Names of the calls received so far, e.g. `"delete 5"`.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn remote_tasks(&self) -> Vec<Task> {
        self.state.lock().unwrap().tasks.clone()
    }

    /// Record the call, wait on a gate if one is armed, then apply a pending failure.
    async fn enter(&self, call: String) -> ClientResult<()> {
        let gate = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(call);
            state.gate.take()
        };
        if let Some(gate) = gate {
            let _ = gate.entered.send(());
            gate.release.notified().await;
        }
        match self.state.lock().unwrap().fail_next.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn not_found(id: TaskId) -> ClientError {
        ClientError::NotFound(format!("task {}", id))
    }

    fn update(&self, id: TaskId, f: impl FnOnce(&mut Task)) -> ClientResult<Task> {
        let mut state = self.state.lock().unwrap();
        let task = state
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| Self::not_found(id))?;
        f(task);
        Ok(task.clone())
    }
}

#[async_trait]
impl TaskRepository for FakeBackend {
    async fn list(&self) -> ClientResult<Vec<Task>> {
        self.enter("list".to_string()).await?;
        Ok(self.remote_tasks())
    }

    async fn get(&self, id: TaskId) -> ClientResult<Task> {
        self.enter(format!("get {}", id)).await?;
        self.remote_tasks()
            .into_iter()
            .find(|t| t.id == id)
            .ok_or_else(|| Self::not_found(id))
    }

    async fn create(&self, title: &str, description: Option<&str>) -> ClientResult<Task> {
        self.enter(format!("create {}", title)).await?;
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let task = Task {
            id: state.next_id,
            title: title.to_string(),
            description: description.map(str::to_string),
            completed: false,
        };
        state.tasks.push(task.clone());
        Ok(task)
    }

    async fn set_completed(&self, id: TaskId, completed: bool) -> ClientResult<Task> {
        self.enter(format!("set_completed {} {}", id, completed)).await?;
        self.update(id, |t| t.completed = completed)
    }

    async fn set_description(&self, id: TaskId, description: &str) -> ClientResult<Task> {
        self.enter(format!("set_description {}", id)).await?;
        self.update(id, |t| t.description = Some(description.to_string()))
    }

    async fn delete(&self, id: TaskId) -> ClientResult<Task> {
        self.enter(format!("delete {}", id)).await?;
        let mut state = self.state.lock().unwrap();
        let index = state
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| Self::not_found(id))?;
        Ok(state.tasks.remove(index))
    }
}

#[async_trait]
impl SuggestionGateway for FakeBackend {
    async fn fetch_questions(&self, id: TaskId) -> ClientResult<Vec<String>> {
        self.enter(format!("fetch_questions {}", id)).await?;
        Ok(self.state.lock().unwrap().questions.clone())
    }

    async fn generate_suggestion(&self, id: TaskId, answers: &[String]) -> ClientResult<String> {
        self.enter(format!("generate_suggestion {} {:?}", id, answers))
            .await?;
        Ok(self.state.lock().unwrap().suggestion.clone())
    }
}

pub fn task(id: TaskId, title: &str) -> Task {
    Task {
        id,
        title: title.to_string(),
        description: None,
        completed: false,
    }
}
