//! Description drafting workflow.
//!
//! A [`DraftingSession`] turns a short task title into a fuller description:
//!
//! ```text
//!   Unloaded ──load──▶ Loading ──ok──▶ Base ◀──────────────ok── Generating
//!                        │               │  ▲                     ▲
//!                       err        fetch │  │ err                 │ generate
//!                        ▼               ▼  │                     │
//!                    LoadFailed    FetchingQuestions ──ok──▶ Answering ◀─┐
//!                                                               │        │
//!                                                               └answer──┘
//! ```
//!
//! `Saving` can be entered from `Base` or `Answering` and returns to the phase
//! it came from. Only one request may be in flight per session; any other
//! call made meanwhile is rejected with [`ViewError::Busy`](crate::ViewError::Busy).

mod session;

pub use session::{DraftSnapshot, DraftingSession};

use serde::Serialize;

/// Where a drafting session is in its workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftPhase {
    /// Created, task not fetched yet.
    Unloaded,
    Loading,
    /// The task could not be fetched; `load` may be retried.
    LoadFailed,
    /// Draft editable, no questions outstanding.
    Base,
    Saving,
    FetchingQuestions,
    /// Questions fetched; answers being collected.
    Answering,
    Generating,
}

impl DraftPhase {
    /// Whether a backend request is outstanding in this phase.
    pub fn is_pending(self) -> bool {
        matches!(
            self,
            Self::Loading | Self::Saving | Self::FetchingQuestions | Self::Generating
        )
    }
}

impl std::fmt::Display for DraftPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unloaded => write!(f, "unloaded"),
            Self::Loading => write!(f, "loading"),
            Self::LoadFailed => write!(f, "load failed"),
            Self::Base => write!(f, "idle"),
            Self::Saving => write!(f, "saving"),
            Self::FetchingQuestions => write!(f, "fetching questions"),
            Self::Answering => write!(f, "answering"),
            Self::Generating => write!(f, "generating"),
        }
    }
}
