//! DeliveryQueue port - 送信タスクの配送キュー
//!
//! キューに流すのは `QueuedSend`（task_id + deferred_id + eta）だけです。
//! 送信内容そのものは DeferredStore が正本。

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{AhemError, DeferredId, TaskId};

/// キューに積まれる 1 件の送信予定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedSend {
    pub task_id: TaskId,
    pub deferred_id: DeferredId,
    /// これより前には pop されない
    pub eta: Option<DateTime<Utc>>,
}

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("queue operation failed: {0}")]
    OperationFailed(String),
}

impl From<QueueError> for AhemError {
    fn from(err: QueueError) -> Self {
        AhemError::Queue(err.to_string())
    }
}

/// DeliveryQueue は送信予定を worker に渡すためのキュー
///
/// # 設計原則
/// - eta を過ぎたものだけが pop の対象
/// - blocking pop（timeout 付き）
/// - 順序保証は eta 単位のみ（同じ eta 同士は push 順）
#[async_trait]
pub trait DeliveryQueue: Send + Sync {
    async fn push(&self, item: QueuedSend) -> Result<(), QueueError>;

    async fn pop(&self, timeout: Duration) -> Result<Option<QueuedSend>, QueueError>;

    /// まだ pop されていない件数（eta 未到来を含む）
    async fn len(&self) -> Result<usize, QueueError>;
}
