//! DI "Interfaces"

use crate::core::sessions::Session;
use crate::core::tasks::{TaskError, TaskStatus};
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("Empty message")]
    EmptyMessage,

    #[error("Server is busy, please try again")]
    Busy,

    #[error("Chat workers are not running")]
    Closed,
}

pub trait ChatService: Send + Sync {
    /// Creates a pending task for `prompt` and queues it for a worker.
    ///
    /// Returns `Err` without creating a task when the prompt is blank or the queue is full.
    fn submit(&self, prompt: String) -> Result<Uuid, SubmitError>;

    /// Current state of a task.
    fn poll(&self, task_id: Uuid) -> TaskStatus;
}

/// Shared store of chat tasks.
///
/// A task moves from pending to done exactly once; eviction may remove it in either state.
pub trait TaskRegistry: Send + Sync {
    /// Inserts a new pending task under a fresh identifier.
    fn create(&self) -> Uuid;

    /// Stores the result of a pending task.
    ///
    /// Returns `Err` if the task does not exist (never created or already evicted) or was
    /// already completed; the stored result is left untouched.
    fn complete(&self, task_id: Uuid, result: String) -> Result<(), TaskError>;

    fn status(&self, task_id: Uuid) -> TaskStatus;

    /// Removes every task whose last state change is older than the configured TTL.
    fn evict_expired(&self, now: DateTime<Utc>) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub trait SessionStore: Send + Sync {
    /// Starts a session for an authenticated user and returns its cookie token.
    fn create(&self, username: String) -> Uuid;

    /// Looks up a live session. Expired sessions are treated as missing.
    fn get(&self, token: Uuid) -> Option<Session>;

    fn remove(&self, token: Uuid);

    fn evict_expired(&self, now: DateTime<Utc>) -> usize;
}
