//! Implementations for the service the app needs.
//!

use crate::core::tasks::TaskStatus;
use crate::core::traits::{ChatService, SubmitError, TaskRegistry};
use crate::core::worker::{ChatJob, ChatQueue};
use di::{Ref, injectable};
use log::{info, warn};
use uuid::Uuid;

#[injectable(ChatService)]
pub struct QueuedChatService {
    registry: Ref<dyn TaskRegistry>,
    queue: Ref<ChatQueue>,
}

impl ChatService for QueuedChatService {
    fn submit(&self, prompt: String) -> Result<Uuid, SubmitError> {
        if prompt.trim().is_empty() {
            return Err(SubmitError::EmptyMessage);
        }

        // A rejected submission must not leave a task behind.
        let permit = self.queue.reserve().inspect_err(|e| warn!("chat rejected: {e}"))?;
        let task_id = self.registry.create();
        permit.send(ChatJob { task_id, prompt });

        info!("chat task {task_id} queued");
        Ok(task_id)
    }

    fn poll(&self, task_id: Uuid) -> TaskStatus {
        self.registry.status(task_id)
    }
}
