//! In-memory chat task registry.

use crate::config::Settings;
use crate::core::traits::TaskRegistry;
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use di::{Ref, inject, injectable};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Unknown,
    Pending,
    Done(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaskError {
    #[error("task {0} does not exist")]
    NotFound(Uuid),

    #[error("task {0} was already completed")]
    AlreadyCompleted(Uuid),
}

#[derive(Debug)]
struct TaskEntry {
    result: Option<String>,
    /// Creation time while pending, completion time once done.
    touched_at: DateTime<Utc>,
}

pub struct InMemoryTaskRegistry {
    tasks: DashMap<Uuid, TaskEntry>,
    ttl: TimeDelta,
}

#[injectable(TaskRegistry)]
impl InMemoryTaskRegistry {
    #[inject]
    pub fn from_settings(settings: Ref<Settings>) -> InMemoryTaskRegistry {
        InMemoryTaskRegistry::new(settings.task_ttl)
    }
}

impl InMemoryTaskRegistry {
    pub fn new(ttl: Duration) -> InMemoryTaskRegistry {
        InMemoryTaskRegistry {
            tasks: DashMap::new(),
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
        }
    }
}

impl TaskRegistry for InMemoryTaskRegistry {
    fn create(&self) -> Uuid {
        loop {
            let task_id = Uuid::new_v4();
            if let Entry::Vacant(slot) = self.tasks.entry(task_id) {
                slot.insert(TaskEntry {
                    result: None,
                    touched_at: Utc::now(),
                });
                return task_id;
            }
        }
    }

    fn complete(&self, task_id: Uuid, result: String) -> Result<(), TaskError> {
        let mut entry = self
            .tasks
            .get_mut(&task_id)
            .ok_or(TaskError::NotFound(task_id))?;

        if entry.result.is_some() {
            return Err(TaskError::AlreadyCompleted(task_id));
        }

        entry.result = Some(result);
        entry.touched_at = Utc::now();
        Ok(())
    }

    fn status(&self, task_id: Uuid) -> TaskStatus {
        match self.tasks.get(&task_id) {
            None => TaskStatus::Unknown,
            Some(entry) => match &entry.result {
                None => TaskStatus::Pending,
                Some(result) => TaskStatus::Done(result.clone()),
            },
        }
    }

    fn evict_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.tasks.len();
        self.tasks
            .retain(|_, entry| now.signed_duration_since(entry.touched_at) < self.ttl);
        before.saturating_sub(self.tasks.len())
    }

    fn len(&self) -> usize {
        self.tasks.len()
    }
}
