//! Errors surfaced by the view-models.

use thiserror::Error;

use crate::client::ClientError;
use crate::drafting::DraftPhase;
use crate::task::TaskId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("A request for task {0} is already in flight")]
    Busy(TaskId),

    #[error("Task {0} is not in the list")]
    UnknownTask(TaskId),

    #[error("Cannot {action} while the session is {phase}")]
    InvalidPhase {
        action: &'static str,
        phase: DraftPhase,
    },

    #[error("Answer index {index} is out of range for {len} questions")]
    AnswerOutOfRange { index: usize, len: usize },

    #[error("View was closed; response discarded")]
    Closed,
}

impl ViewError {
    /// The underlying gateway error, if this failure came from the backend.
    pub fn client_error(&self) -> Option<&ClientError> {
        match self {
            Self::Client(e) => Some(e),
            _ => None,
        }
    }
}

pub type ViewResult<T> = Result<T, ViewError>;
