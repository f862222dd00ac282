//! Background chat workers.
//!

use crate::core::traits::{SessionStore, SubmitError, TaskRegistry};
use crate::infrastructure::traits::LanguageModel;
use chrono::Utc;
use di::Ref;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Semaphore, mpsc};
use tokio::time::{Instant, MissedTickBehavior};
use uuid::Uuid;

#[derive(Debug)]
pub struct ChatJob {
    pub task_id: Uuid,
    pub prompt: String,
}

/// Sending half of the bounded chat job queue.
#[derive(Clone)]
pub struct ChatQueue {
    sender: mpsc::Sender<ChatJob>,
}

impl ChatQueue {
    pub fn new(capacity: usize) -> (ChatQueue, mpsc::Receiver<ChatJob>) {
        let (sender, receiver) = mpsc::channel::<ChatJob>(capacity);

        (ChatQueue { sender }, receiver)
    }

    /// Claims a queue slot without waiting.
    pub fn reserve(&self) -> Result<mpsc::Permit<'_, ChatJob>, SubmitError> {
        self.sender.try_reserve().map_err(|e| match e {
            mpsc::error::TrySendError::Full(()) => SubmitError::Busy,
            mpsc::error::TrySendError::Closed(()) => SubmitError::Closed,
        })
    }
}

/// Drains the job queue, running at most `workers` jobs at a time.
///
/// While every worker is busy the queue is not drained, so new submissions are rejected once it
/// fills up. Returns when all queue senders are dropped.
pub async fn background_task(
    mut job_queue: mpsc::Receiver<ChatJob>,
    registry: Ref<dyn TaskRegistry>,
    model: Ref<dyn LanguageModel>,
    workers: usize,
) {
    let limiter = Arc::new(Semaphore::new(workers));
    info!("chat dispatcher started with {workers} workers");

    loop {
        match job_queue.recv().await {
            None => {
                info!("chat queue closed, dispatcher stopping");
                return;
            }
            Some(job) => {
                let Ok(permit) = limiter.clone().acquire_owned().await else {
                    return;
                };
                let registry = registry.clone();
                let model = model.clone();

                tokio::spawn(async move {
                    run_job(job, &*registry, &*model).await;
                    drop(permit);
                });
            }
        }
    }
}

pub async fn run_job(job: ChatJob, registry: &dyn TaskRegistry, model: &dyn LanguageModel) {
    let started = Instant::now();
    let response = model.generate(&job.prompt).await;

    match registry.complete(job.task_id, response) {
        Ok(()) => info!(
            "chat task {} done in {:.2} seconds",
            job.task_id,
            started.elapsed().as_secs_f32()
        ),
        Err(e) => warn!("discarding chat response: {e}"),
    }
}

/// Periodically drops expired tasks and sessions. Runs until aborted.
pub async fn eviction_task(
    registry: Ref<dyn TaskRegistry>,
    sessions: Ref<dyn SessionStore>,
    period: Duration,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let now = Utc::now();
        let tasks = registry.evict_expired(now);
        let expired_sessions = sessions.evict_expired(now);
        if tasks > 0 || expired_sessions > 0 {
            debug!("evicted {tasks} tasks and {expired_sessions} sessions");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sessions::InMemorySessionStore;
    use crate::core::tasks::{InMemoryTaskRegistry, TaskStatus};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct EchoModel;

    #[async_trait]
    impl LanguageModel for EchoModel {
        async fn generate(&self, prompt: &str) -> String {
            format!("echo: {prompt}")
        }
    }

    #[derive(Default)]
    struct SlowModel {
        running: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl LanguageModel for SlowModel {
        async fn generate(&self, _prompt: &str) -> String {
            let now_running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now_running, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.running.fetch_sub(1, Ordering::SeqCst);
            "slow".to_string()
        }
    }

    async fn wait_until_done(registry: &dyn TaskRegistry, task_id: Uuid) -> String {
        for _ in 0..200 {
            if let TaskStatus::Done(result) = registry.status(task_id) {
                return result;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("task {task_id} never completed");
    }

    #[test]
    fn test_reserve_rejects_when_full() {
        let (queue, _receiver) = ChatQueue::new(1);

        queue.reserve().unwrap().send(ChatJob {
            task_id: Uuid::new_v4(),
            prompt: "first".to_string(),
        });

        assert_eq!(queue.reserve().err(), Some(SubmitError::Busy));
    }

    #[test]
    fn test_reserve_rejects_when_closed() {
        let (queue, receiver) = ChatQueue::new(1);
        drop(receiver);

        assert_eq!(queue.reserve().err(), Some(SubmitError::Closed));
    }

    #[tokio::test]
    async fn test_run_job_completes_task() {
        let registry = InMemoryTaskRegistry::new(Duration::from_secs(60));
        let task_id = registry.create();

        run_job(
            ChatJob {
                task_id,
                prompt: "hello".to_string(),
            },
            &registry,
            &EchoModel,
        )
        .await;

        assert_eq!(
            registry.status(task_id),
            TaskStatus::Done("echo: hello".to_string())
        );
    }

    #[tokio::test]
    async fn test_run_job_tolerates_evicted_task() {
        let registry = InMemoryTaskRegistry::new(Duration::from_secs(60));
        let task_id = Uuid::new_v4();

        run_job(
            ChatJob {
                task_id,
                prompt: "hello".to_string(),
            },
            &registry,
            &EchoModel,
        )
        .await;

        assert_eq!(registry.status(task_id), TaskStatus::Unknown);
    }

    #[tokio::test]
    async fn test_background_task_processes_queue() {
        let registry: Ref<dyn TaskRegistry> =
            Ref::new(InMemoryTaskRegistry::new(Duration::from_secs(60)));
        let (queue, receiver) = ChatQueue::new(4);
        let dispatcher = tokio::spawn(background_task(
            receiver,
            registry.clone(),
            Ref::new(EchoModel),
            2,
        ));

        let task_id = registry.create();
        queue.reserve().unwrap().send(ChatJob {
            task_id,
            prompt: "ping".to_string(),
        });

        assert_eq!(wait_until_done(&*registry, task_id).await, "echo: ping");

        drop(queue);
        dispatcher.await.unwrap();
    }

    #[tokio::test]
    async fn test_background_task_bounds_concurrency() {
        let registry: Ref<dyn TaskRegistry> =
            Ref::new(InMemoryTaskRegistry::new(Duration::from_secs(60)));
        let model = Ref::new(SlowModel::default());
        let (queue, receiver) = ChatQueue::new(16);
        tokio::spawn(background_task(
            receiver,
            registry.clone(),
            model.clone(),
            2,
        ));

        let mut task_ids = Vec::new();
        for i in 0..6 {
            let task_id = registry.create();
            queue.reserve().unwrap().send(ChatJob {
                task_id,
                prompt: format!("job {i}"),
            });
            task_ids.push(task_id);
        }

        for task_id in task_ids {
            assert_eq!(wait_until_done(&*registry, task_id).await, "slow");
        }
        assert!(model.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_eviction_task_sweeps() {
        let registry: Ref<dyn TaskRegistry> = Ref::new(InMemoryTaskRegistry::new(Duration::ZERO));
        let sessions: Ref<dyn SessionStore> =
            Ref::new(InMemorySessionStore::new(Duration::from_secs(60)));
        registry.create();
        registry.create();

        let sweeper = tokio::spawn(eviction_task(
            registry.clone(),
            sessions,
            Duration::from_millis(10),
        ));

        for _ in 0..100 {
            if registry.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        sweeper.abort();

        assert!(registry.is_empty());
    }
}
