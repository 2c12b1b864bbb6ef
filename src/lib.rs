//! # Task Drafter
//!
//! Client for a task list backend, with a guided workflow that turns a short
//! task title into a fuller description.
//!
//! ## Architecture
//!
//! ```text
//!   list view ──▶ TaskCollection ──┐
//!                                  ├──▶ TaskRepository ──┐
//!   detail view ─▶ DraftingSession ┤                     ├──▶ HttpTaskClient ──▶ Task Backend API
//!                                  └──▶ SuggestionGateway┘
//! ```
//!
//! View-models hold plain owned state, expose it through snapshots, and bump a
//! `watch` counter on every change so any front end can re-render.
//!
//! ## Modules
//! - `client`: gateway traits and their HTTP implementation
//! - `collection`: task list view-model
//! - `drafting`: description drafting state machine
//! - `config`: environment and file configuration

pub mod client;
pub mod collection;
pub mod config;
pub mod drafting;
pub mod error;
pub mod task;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{ClientError, HttpTaskClient, SuggestionGateway, TaskRepository};
pub use collection::TaskCollection;
pub use config::Config;
pub use drafting::{DraftPhase, DraftSnapshot, DraftingSession};
pub use error::{ViewError, ViewResult};
pub use task::{Task, TaskId};
