//! Scheduler 実装
//!
//! - **InlineScheduler**: 非同期実行基盤がない環境向け。その場で send する
//! - **QueueScheduler**: DeliveryQueue に積み、worker に任せる

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::app::NotificationSender;
use crate::domain::{AhemError, DeferredId, TaskId};
use crate::ports::{DeliveryQueue, IdGenerator, QueuedSend, Scheduler, SchedulerMode};

/// InlineScheduler は dispatch の中で send を実行する
///
/// eta は無視され、task_id は記録されません。
/// send の失敗はそのまま dispatch に返ります。
pub struct InlineScheduler {
    sender: Arc<NotificationSender>,
}

impl InlineScheduler {
    pub fn new(sender: Arc<NotificationSender>) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl Scheduler for InlineScheduler {
    async fn schedule(
        &self,
        deferred_id: DeferredId,
        eta: Option<DateTime<Utc>>,
    ) -> Result<Option<TaskId>, AhemError> {
        if let Some(eta) = eta {
            warn!(%deferred_id, %eta, "inline scheduler ignores eta; sending now");
        }
        self.sender.send_notification(deferred_id).await?;
        Ok(None)
    }

    fn mode(&self) -> SchedulerMode {
        SchedulerMode::Inline
    }
}

/// QueueScheduler は send を DeliveryQueue に積む
pub struct QueueScheduler {
    queue: Arc<dyn DeliveryQueue>,
    ids: Arc<dyn IdGenerator>,
}

impl QueueScheduler {
    pub fn new(queue: Arc<dyn DeliveryQueue>, ids: Arc<dyn IdGenerator>) -> Self {
        Self { queue, ids }
    }
}

#[async_trait]
impl Scheduler for QueueScheduler {
    async fn schedule(
        &self,
        deferred_id: DeferredId,
        eta: Option<DateTime<Utc>>,
    ) -> Result<Option<TaskId>, AhemError> {
        let task_id = self.ids.generate_task_id();
        self.queue
            .push(QueuedSend {
                task_id,
                deferred_id,
                eta,
            })
            .await?;
        debug!(%deferred_id, %task_id, eta = ?eta, "send queued");
        Ok(Some(task_id))
    }

    fn mode(&self) -> SchedulerMode {
        SchedulerMode::Queue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::InMemoryDeliveryQueue;
    use crate::ports::{SystemClock, UlidGenerator};
    use std::time::Duration;
    use ulid::Ulid;

    #[tokio::test]
    async fn queue_scheduler_pushes_and_returns_task_id() {
        let queue = Arc::new(InMemoryDeliveryQueue::new());
        let scheduler = QueueScheduler::new(queue.clone(), Arc::new(UlidGenerator::new(SystemClock)));
        let deferred_id = DeferredId::from_ulid(Ulid::new());

        let task_id = scheduler.schedule(deferred_id, None).await.unwrap();

        let popped = queue.pop(Duration::from_millis(50)).await.unwrap().unwrap();
        assert_eq!(Some(popped.task_id), task_id);
        assert_eq!(popped.deferred_id, deferred_id);
        assert_eq!(scheduler.mode(), SchedulerMode::Queue);
    }

    #[tokio::test]
    async fn queue_scheduler_forwards_eta() {
        let queue = Arc::new(InMemoryDeliveryQueue::new());
        let scheduler = QueueScheduler::new(queue.clone(), Arc::new(UlidGenerator::new(SystemClock)));
        let eta = Utc::now() + chrono::Duration::hours(1);

        scheduler
            .schedule(DeferredId::from_ulid(Ulid::new()), Some(eta))
            .await
            .unwrap();

        assert_eq!(queue.pop(Duration::from_millis(20)).await.unwrap(), None);
        assert_eq!(queue.len().await.unwrap(), 1);
    }
}
