//! DeferredNotification - 1 件の配送予定の記録

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::context::Context;
use super::ids::{DeferredId, TaskId, UserBackendId};

/// DeferredNotification は dispatch 時に (user, backend) ごとに 1 件作られる
///
/// # 状態
/// - 作成直後: `task_id` / `ran_at` ともに None
/// - queue 経由: `attach_task()` で task_id が付く
/// - send 後: `mark_ran()` で ran_at が付く（成功・失敗を区別しない）
///
/// `notification` は名前の文字列で、登録済みかどうかは保証しません。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeferredNotification {
    pub id: DeferredId,
    pub notification: String,
    pub user_backend_id: UserBackendId,
    /// dispatch 時点の context のコピー
    pub context: Context,
    pub task_id: Option<TaskId>,
    pub ran_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl DeferredNotification {
    pub fn new(
        id: DeferredId,
        notification: impl Into<String>,
        user_backend_id: UserBackendId,
        context: Context,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            notification: notification.into(),
            user_backend_id,
            context,
            task_id: None,
            ran_at: None,
            created_at: now,
        }
    }

    pub fn attach_task(&mut self, task_id: TaskId) {
        self.task_id = Some(task_id);
    }

    pub fn mark_ran(&mut self, at: DateTime<Utc>) {
        self.ran_at = Some(at);
    }

    pub fn has_run(&self) -> bool {
        self.ran_at.is_some()
    }
}
