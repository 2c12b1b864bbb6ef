//! In-process mock of the Task Backend API.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Path, RawQuery, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use task_drafter::{Config, HttpTaskClient, Task, TaskId};

#[derive(Default)]
pub struct MockState {
    pub tasks: Vec<Task>,
    pub next_id: TaskId,
    /// One line per request: method, path, raw query and body.
    pub requests: Vec<String>,
    pub questions: Vec<String>,
    /// Status to answer the next request with instead of handling it.
    pub fail_next: Option<StatusCode>,
}

pub type Shared = Arc<Mutex<MockState>>;

pub struct MockBackend {
    pub addr: SocketAddr,
    pub state: Shared,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(MockState {
            questions: vec!["Where to?".to_string(), "How long?".to_string()],
            ..Default::default()
        }));

        let app = Router::new()
            .route("/tasks", get(list_tasks).post(create_task))
            .route(
                "/tasks/:id",
                get(get_task)
                    .put(set_completed)
                    .patch(set_description)
                    .delete(delete_task),
            )
            .route("/tasks/:id/questions", get(questions))
            .route("/tasks/:id/suggest", post(suggest))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });

        Self { addr, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn client(&self) -> HttpTaskClient {
        let config = Config {
            api_url: self.url(),
            request_timeout: Duration::from_secs(5),
        };
        HttpTaskClient::new(&config).unwrap()
    }

    pub fn requests(&self) -> Vec<String> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn fail_next(&self, status: StatusCode) {
        self.state.lock().unwrap().fail_next = Some(status);
    }

    pub fn seed(&self, title: &str, description: Option<&str>) -> Task {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let task = Task {
            id: state.next_id,
            title: title.to_string(),
            description: description.map(str::to_string),
            completed: false,
        };
        state.tasks.push(task.clone());
        task
    }
}

type Reply = Result<Json<Value>, (StatusCode, Json<Value>)>;

/// FastAPI-style rendering: absent descriptions become `null`.
fn render(task: &Task) -> Value {
    json!({
        "id": task.id,
        "title": task.title,
        "description": task.description,
        "completed": task.completed,
    })
}

fn detail(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "detail": message })))
}

fn not_found() -> (StatusCode, Json<Value>) {
    detail(StatusCode::NOT_FOUND, "Task not found")
}

/// Record the request and apply a pending injected failure.
fn enter(state: &Shared, line: String) -> Result<(), (StatusCode, Json<Value>)> {
    let mut state = state.lock().unwrap();
    state.requests.push(line);
    match state.fail_next.take() {
        Some(status) => Err(detail(status, "injected failure")),
        None => Ok(()),
    }
}

async fn list_tasks(State(state): State<Shared>) -> Reply {
    enter(&state, "GET /tasks".to_string())?;
    let state = state.lock().unwrap();
    Ok(Json(Value::Array(state.tasks.iter().map(render).collect())))
}

async fn get_task(State(state): State<Shared>, Path(id): Path<TaskId>) -> Reply {
    enter(&state, format!("GET /tasks/{}", id))?;
    let state = state.lock().unwrap();
    let task = state.tasks.iter().find(|t| t.id == id).ok_or_else(not_found)?;
    Ok(Json(render(task)))
}

async fn create_task(State(state): State<Shared>, body: String) -> Reply {
    enter(&state, format!("POST /tasks {}", body))?;

    #[derive(Deserialize)]
    struct TaskCreate {
        title: String,
        #[serde(default)]
        description: Option<String>,
    }
    let req: TaskCreate = serde_json::from_str(&body)
        .map_err(|e| detail(StatusCode::UNPROCESSABLE_ENTITY, &e.to_string()))?;
    if req.title.trim().is_empty() {
        return Err(detail(StatusCode::UNPROCESSABLE_ENTITY, "title must not be empty"));
    }

    let mut state = state.lock().unwrap();
    state.next_id += 1;
    let task = Task {
        id: state.next_id,
        title: req.title,
        description: req.description,
        completed: false,
    };
    state.tasks.push(task.clone());
    Ok(Json(render(&task)))
}

async fn set_completed(
    State(state): State<Shared>,
    Path(id): Path<TaskId>,
    RawQuery(query): RawQuery,
    body: String,
) -> Reply {
    let query = query.unwrap_or_default();
    enter(&state, format!("PUT /tasks/{}?{} {}", id, query, body))?;
    let completed = match query.as_str() {
        "completed=true" => true,
        "completed=false" => false,
        _ => return Err(detail(StatusCode::UNPROCESSABLE_ENTITY, "bad completed flag")),
    };

    let mut state = state.lock().unwrap();
    let task = state
        .tasks
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or_else(not_found)?;
    task.completed = completed;
    Ok(Json(render(task)))
}

async fn set_description(
    State(state): State<Shared>,
    Path(id): Path<TaskId>,
    body: String,
) -> Reply {
    enter(&state, format!("PATCH /tasks/{} {}", id, body))?;
    let req: Value = serde_json::from_str(&body)
        .map_err(|e| detail(StatusCode::UNPROCESSABLE_ENTITY, &e.to_string()))?;

    let mut state = state.lock().unwrap();
    let task = state
        .tasks
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or_else(not_found)?;
    task.description = req["description"].as_str().map(str::to_string);
    Ok(Json(render(task)))
}

async fn delete_task(State(state): State<Shared>, Path(id): Path<TaskId>) -> Reply {
    enter(&state, format!("DELETE /tasks/{}", id))?;
    let mut state = state.lock().unwrap();
    let index = state
        .tasks
        .iter()
        .position(|t| t.id == id)
        .ok_or_else(not_found)?;
    let task = state.tasks.remove(index);
    Ok(Json(render(&task)))
}

async fn questions(State(state): State<Shared>, Path(id): Path<TaskId>) -> Reply {
    enter(&state, format!("GET /tasks/{}/questions", id))?;
    let state = state.lock().unwrap();
    if !state.tasks.iter().any(|t| t.id == id) {
        return Err(not_found());
    }
    Ok(Json(json!({ "questions": state.questions })))
}

async fn suggest(State(state): State<Shared>, Path(id): Path<TaskId>, body: String) -> Reply {
    enter(&state, format!("POST /tasks/{}/suggest {}", id, body))?;
    let req: Value = serde_json::from_str(&body)
        .map_err(|e| detail(StatusCode::UNPROCESSABLE_ENTITY, &e.to_string()))?;
    let destination = req["answers"][0].as_str().unwrap_or("somewhere");

    let state = state.lock().unwrap();
    let task = state.tasks.iter().find(|t| t.id == id).ok_or_else(not_found)?;
    let suggestion = if task.title == "Plan trip" {
        format!("A trip to {}.", destination)
    } else {
        format!("{}: {}", task.title, req["answers"])
    };
    Ok(Json(json!({ "suggestion": suggestion })))
}
