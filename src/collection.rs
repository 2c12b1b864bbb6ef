//! Task list view-model.
//!
//! Holds the ordered tasks shown on the list screen. Every mutation is applied
//! only after the corresponding backend call succeeds:
//! - create appends at the end
//! - set-completed replaces in place, keeping position
//! - delete filters the id out
//!
//! A second request against an id whose first request has not resolved is
//! rejected with [`ViewError::Busy`]. Requests on different ids run
//! independently.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::watch;

use crate::client::SharedRepository;
use crate::error::{ViewError, ViewResult};
use crate::task::{normalize_title, Task, TaskId};

#[derive(Debug, Default)]
struct CollectionState {
    tasks: Vec<Task>,
    in_flight: HashSet<TaskId>,
    closed: bool,
}

/// Owned task list plus a change counter views can watch.
pub struct TaskCollection {
    repo: SharedRepository,
    state: Mutex<CollectionState>,
    revision: watch::Sender<u64>,
}

/// Marks an id busy until dropped.
struct InFlight<'a> {
    state: &'a Mutex<CollectionState>,
    id: TaskId,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        lock(self.state).in_flight.remove(&self.id);
    }
}

fn lock(state: &Mutex<CollectionState>) -> MutexGuard<'_, CollectionState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl TaskCollection {
    pub fn new(repo: SharedRepository) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            repo,
            state: Mutex::new(CollectionState::default()),
            revision,
        }
    }

    /// Snapshot of the current list.
    pub fn tasks(&self) -> Vec<Task> {
        lock(&self.state).tasks.clone()
    }

    pub fn get(&self, id: TaskId) -> Option<Task> {
        lock(&self.state).tasks.iter().find(|t| t.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        lock(&self.state).tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a request against `id` is outstanding.
    pub fn is_pending(&self, id: TaskId) -> bool {
        lock(&self.state).in_flight.contains(&id)
    }

    /// Receiver that changes whenever the list does.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Detach the view-model. Responses that arrive later are discarded.
    pub fn close(&self) {
        lock(&self.state).closed = true;
        tracing::debug!("Task list closed");
    }

    /// Replace the list with the backend's.
    pub async fn refresh(&self) -> ViewResult<()> {
        self.ensure_open()?;
        let tasks = self.repo.list().await?;
        self.commit(|state| {
            tracing::debug!("Loaded {} tasks", tasks.len());
            state.tasks = tasks;
        })
    }

    /// Create a task from a title typed by the user.
    ///
    /// Returns `Ok(None)` without contacting the backend when the title is
    /// blank after trimming.
    pub async fn add_task(
        &self,
        title: &str,
        description: Option<&str>,
    ) -> ViewResult<Option<Task>> {
        let Some(title) = normalize_title(title) else {
            tracing::debug!("Ignoring blank task title");
            return Ok(None);
        };
        self.ensure_open()?;

        let created = self.repo.create(title, description).await?;
        let result = created.clone();
        self.commit(move |state| {
            match state.tasks.iter_mut().find(|t| t.id == created.id) {
                // A concurrent refresh may already have picked it up.
                Some(existing) => *existing = created,
                None => state.tasks.push(created),
            }
        })?;
        Ok(Some(result))
    }

    /// Flip the completed flag of a task in the list.
    pub async fn toggle_complete(&self, id: TaskId) -> ViewResult<Task> {
        let completed = self
            .get(id)
            .map(|t| t.completed)
            .ok_or(ViewError::UnknownTask(id))?;
        self.set_completed(id, !completed).await
    }

    /// Set the completed flag of a task.
    pub async fn set_completed(&self, id: TaskId, completed: bool) -> ViewResult<Task> {
        let _guard = self.begin(id)?;
        let updated = self.repo.set_completed(id, completed).await?;
        let result = updated.clone();
        self.commit(move |state| replace_in_place(&mut state.tasks, updated))?;
        Ok(result)
    }

    /// Delete a task, locally held or not.
    pub async fn delete_task(&self, id: TaskId) -> ViewResult<Task> {
        let _guard = self.begin(id)?;
        let deleted = self.repo.delete(id).await?;
        self.commit(|state| state.tasks.retain(|t| t.id != id))?;
        Ok(deleted)
    }

    fn ensure_open(&self) -> ViewResult<()> {
        if lock(&self.state).closed {
            Err(ViewError::Closed)
        } else {
            Ok(())
        }
    }

    fn begin(&self, id: TaskId) -> ViewResult<InFlight<'_>> {
        let mut state = lock(&self.state);
        if state.closed {
            return Err(ViewError::Closed);
        }
        if !state.in_flight.insert(id) {
            tracing::warn!("Ignoring request for task {}: one is already in flight", id);
            return Err(ViewError::Busy(id));
        }
        Ok(InFlight {
            state: &self.state,
            id,
        })
    }

    /// Apply a mutation unless the view was closed meanwhile, then notify.
    fn commit(&self, f: impl FnOnce(&mut CollectionState)) -> ViewResult<()> {
        {
            let mut state = lock(&self.state);
            if state.closed {
                tracing::debug!("Discarding response for closed task list");
                return Err(ViewError::Closed);
            }
            f(&mut state);
        }
        self.revision.send_modify(|r| *r += 1);
        Ok(())
    }
}

fn replace_in_place(tasks: &mut [Task], updated: Task) {
    match tasks.iter_mut().find(|t| t.id == updated.id) {
        Some(slot) => *slot = updated,
        None => tracing::debug!("Task {} no longer in the list, dropping update", updated.id),
    }
}
