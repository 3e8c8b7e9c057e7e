//! DeferredStore port - DeferredNotification の永続化
//!
//! # 更新はフィールド単位
//! dispatch（task_id の付与）と worker（ran_at の記録）は並行に走るので、
//! レコード全体の上書きはせず、それぞれのフィールドだけを更新します。
//! このサブシステムはレコードを削除しません。

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{AhemError, DeferredId, DeferredNotification, TaskId};

#[async_trait]
pub trait DeferredStore: Send + Sync {
    async fn create(&self, deferred: DeferredNotification) -> Result<(), AhemError>;

    async fn get(&self, id: DeferredId) -> Result<Option<DeferredNotification>, AhemError>;

    /// queue に積んだ task の ID を記録（存在しなければ DeferredNotFound）
    async fn set_task_id(&self, id: DeferredId, task_id: TaskId) -> Result<(), AhemError>;

    /// send を試みた時刻を記録（存在しなければ DeferredNotFound）
    async fn set_ran_at(&self, id: DeferredId, ran_at: DateTime<Utc>) -> Result<(), AhemError>;

    /// 作成順
    async fn list(&self) -> Result<Vec<DeferredNotification>, AhemError>;
}
