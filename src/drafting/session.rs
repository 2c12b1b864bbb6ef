use std::sync::{Mutex, MutexGuard};
use tokio::sync::watch;

use super::DraftPhase;
use crate::client::{SharedRepository, SharedSuggestions};
use crate::error::{ViewError, ViewResult};
use crate::task::{Task, TaskId};

#[derive(Debug)]
struct DraftState {
    phase: DraftPhase,
    task: Option<Task>,
    draft: String,
    questions: Vec<String>,
    /// Always the same length as `questions`.
    answers: Vec<String>,
    last_error: Option<String>,
    closed: bool,
}

/// Point-in-time copy of a session, for rendering.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DraftSnapshot {
    pub task_id: TaskId,
    pub phase: DraftPhase,
    pub task: Option<Task>,
    pub draft: String,
    pub questions: Vec<String>,
    pub answers: Vec<String>,
    pub last_error: Option<String>,
}

/// Holds a session in a request phase. Dropped unsettled, it puts back the
/// phase the request left.
struct Pending<'a> {
    session: &'a DraftingSession,
    previous: DraftPhase,
    settled: bool,
}

impl Drop for Pending<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        {
            let mut state = self.session.lock();
            if state.phase.is_pending() {
                state.phase = self.previous;
            }
        }
        tracing::debug!(
            "Request for task {} dropped before completion",
            self.session.task_id
        );
        self.session.notify();
    }
}

/// Drafting state for one task, owned by the detail view that opened it.
pub struct DraftingSession {
    task_id: TaskId,
    repo: SharedRepository,
    suggestions: SharedSuggestions,
    state: Mutex<DraftState>,
    revision: watch::Sender<u64>,
}

impl DraftingSession {
    /// Create a session for `task_id`. Call [`load`](Self::load) to fetch the task.
    pub fn new(task_id: TaskId, repo: SharedRepository, suggestions: SharedSuggestions) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            task_id,
            repo,
            suggestions,
            state: Mutex::new(DraftState {
                phase: DraftPhase::Unloaded,
                task: None,
                draft: String::new(),
                questions: Vec::new(),
                answers: Vec::new(),
                last_error: None,
                closed: false,
            }),
            revision,
        }
    }

    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    pub fn phase(&self) -> DraftPhase {
        self.lock().phase
    }

    pub fn draft(&self) -> String {
        self.lock().draft.clone()
    }

    pub fn questions(&self) -> Vec<String> {
        self.lock().questions.clone()
    }

    pub fn answers(&self) -> Vec<String> {
        self.lock().answers.clone()
    }

    pub fn task(&self) -> Option<Task> {
        self.lock().task.clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.lock().last_error.clone()
    }

    pub fn snapshot(&self) -> DraftSnapshot {
        let state = self.lock();
        DraftSnapshot {
            task_id: self.task_id,
            phase: state.phase,
            task: state.task.clone(),
            draft: state.draft.clone(),
            questions: state.questions.clone(),
            answers: state.answers.clone(),
            last_error: state.last_error.clone(),
        }
    }

    /// Receiver that changes whenever the session does.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Detach the session from its view. A response still in flight is
    /// discarded on arrival.
    pub fn close(&self) {
        self.lock().closed = true;
        tracing::debug!("Drafting session for task {} closed", self.task_id);
    }

    /// Fetch the task and reset the draft to its description.
    pub async fn load(&self) -> ViewResult<Task> {
        let pending = self.begin(
            "load the task",
            &[DraftPhase::Unloaded, DraftPhase::LoadFailed, DraftPhase::Base],
            DraftPhase::Loading,
        )?;

        match self.repo.get(self.task_id).await {
            Ok(task) => {
                let result = task.clone();
                self.finish(pending, move |state| {
                    state.draft = task.description_or_empty().to_string();
                    state.task = Some(task);
                    state.questions.clear();
                    state.answers.clear();
                    state.phase = DraftPhase::Base;
                })?;
                Ok(result)
            }
            Err(e) => {
                tracing::warn!("Failed to load task {}: {}", self.task_id, e);
                self.fail(pending, DraftPhase::LoadFailed, &e.to_string())?;
                Err(e.into())
            }
        }
    }

    /// Replace the local draft text.
    pub fn set_draft(&self, text: impl Into<String>) -> ViewResult<()> {
        self.edit("edit the draft", &[DraftPhase::Base, DraftPhase::Answering], |state| {
            state.draft = text.into();
            Ok(())
        })
    }

    /// Persist `text` as the task's description.
    ///
    /// On failure the draft is left as it was.
    pub async fn save_description(&self, text: &str) -> ViewResult<Task> {
        let pending = self.begin(
            "save the description",
            &[DraftPhase::Base, DraftPhase::Answering],
            DraftPhase::Saving,
        )?;
        let previous = pending.previous;

        match self.repo.set_description(self.task_id, text).await {
            Ok(task) => {
                let result = task.clone();
                self.finish(pending, move |state| {
                    state.task = Some(task);
                    state.draft = text.to_string();
                    state.phase = previous;
                })?;
                tracing::info!("Saved description for task {}", self.task_id);
                Ok(result)
            }
            Err(e) => {
                tracing::warn!("Failed to save description for task {}: {}", self.task_id, e);
                self.fail(pending, previous, &e.to_string())?;
                Err(e.into())
            }
        }
    }

    /// Persist the current draft.
    pub async fn save_draft(&self) -> ViewResult<Task> {
        let draft = self.draft();
        self.save_description(&draft).await
    }

    /// Ask the suggestion service for clarifying questions.
    ///
    /// Replaces any questions and answers already collected. On failure the
    /// session keeps what it had.
    pub async fn fetch_questions(&self) -> ViewResult<Vec<String>> {
        let pending = self.begin(
            "fetch questions",
            &[DraftPhase::Base, DraftPhase::Answering],
            DraftPhase::FetchingQuestions,
        )?;

        match self.suggestions.fetch_questions(self.task_id).await {
            Ok(questions) => {
                tracing::debug!(
                    "Received {} questions for task {}",
                    questions.len(),
                    self.task_id
                );
                let result = questions.clone();
                self.finish(pending, move |state| {
                    state.answers = vec![String::new(); questions.len()];
                    state.questions = questions;
                    state.phase = DraftPhase::Answering;
                })?;
                Ok(result)
            }
            Err(e) => {
                tracing::warn!("Failed to fetch questions for task {}: {}", self.task_id, e);
                let previous = pending.previous;
                self.fail(pending, previous, &e.to_string())?;
                Err(e.into())
            }
        }
    }

    /// Record the answer to the question at `index`.
    pub fn update_answer(&self, index: usize, text: impl Into<String>) -> ViewResult<()> {
        self.edit("answer a question", &[DraftPhase::Answering], |state| {
            let len = state.answers.len();
            match state.answers.get_mut(index) {
                Some(answer) => {
                    *answer = text.into();
                    Ok(())
                }
                None => {
                    tracing::warn!("Answer index {} out of range ({} questions)", index, len);
                    Err(ViewError::AnswerOutOfRange { index, len })
                }
            }
        })
    }

    /// Send the answers to the suggestion service and take its suggestion as
    /// the new draft.
    ///
    /// Success clears questions and answers. Failure keeps them so generation
    /// can be retried without fetching questions again.
    pub async fn generate_description(&self) -> ViewResult<String> {
        let pending = self.begin(
            "generate a description",
            &[DraftPhase::Answering],
            DraftPhase::Generating,
        )?;
        let answers = self.answers();

        match self
            .suggestions
            .generate_suggestion(self.task_id, &answers)
            .await
        {
            Ok(suggestion) => {
                let result = suggestion.clone();
                self.finish(pending, move |state| {
                    state.draft = suggestion;
                    state.questions.clear();
                    state.answers.clear();
                    state.phase = DraftPhase::Base;
                })?;
                tracing::info!("Generated description for task {}", self.task_id);
                Ok(result)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to generate description for task {}: {}",
                    self.task_id,
                    e
                );
                self.fail(pending, DraftPhase::Answering, &e.to_string())?;
                Err(e.into())
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, DraftState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check(
        &self,
        state: &DraftState,
        action: &'static str,
        allowed: &[DraftPhase],
    ) -> ViewResult<()> {
        if state.closed {
            return Err(ViewError::Closed);
        }
        if state.phase.is_pending() {
            tracing::warn!(
                "Cannot {} for task {}: {} is in flight",
                action,
                self.task_id,
                state.phase
            );
            return Err(ViewError::Busy(self.task_id));
        }
        if !allowed.contains(&state.phase) {
            return Err(ViewError::InvalidPhase {
                action,
                phase: state.phase,
            });
        }
        Ok(())
    }

    /// Enter a request phase. The guard remembers the phase left behind.
    fn begin(
        &self,
        action: &'static str,
        allowed: &[DraftPhase],
        request: DraftPhase,
    ) -> ViewResult<Pending<'_>> {
        let previous = {
            let mut state = self.lock();
            self.check(&state, action, allowed)?;
            let previous = state.phase;
            state.phase = request;
            state.last_error = None;
            previous
        };
        self.notify();
        Ok(Pending {
            session: self,
            previous,
            settled: false,
        })
    }

    /// Apply a synchronous edit.
    fn edit(
        &self,
        action: &'static str,
        allowed: &[DraftPhase],
        f: impl FnOnce(&mut DraftState) -> ViewResult<()>,
    ) -> ViewResult<()> {
        {
            let mut state = self.lock();
            self.check(&state, action, allowed)?;
            f(&mut state)?;
        }
        self.notify();
        Ok(())
    }

    /// Apply a response unless the session was closed while it was in flight.
    fn finish(
        &self,
        mut pending: Pending<'_>,
        f: impl FnOnce(&mut DraftState),
    ) -> ViewResult<()> {
        pending.settled = true;
        {
            let mut state = self.lock();
            if state.closed {
                tracing::debug!("Discarding response for closed session {}", self.task_id);
                return Err(ViewError::Closed);
            }
            f(&mut state);
        }
        self.notify();
        Ok(())
    }

    /// Leave the pending phase for `phase` and record the error message.
    fn fail(&self, pending: Pending<'_>, phase: DraftPhase, message: &str) -> ViewResult<()> {
        self.finish(pending, |state| {
            state.phase = phase;
            state.last_error = Some(message.to_string());
        })
    }

    fn notify(&self) {
        self.revision.send_modify(|r| *r += 1);
    }
}
