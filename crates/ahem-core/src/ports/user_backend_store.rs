//! UserBackendStore port - opt-in 記録の永続化

use async_trait::async_trait;

use crate::domain::{AhemError, UserBackendId, UserBackendRegistry, UserId};

/// UserBackendStore は (user, backend) ごとの opt-in を保持
///
/// # 前提
/// - 有効な（`removed_at` のない）エントリは (user_id, backend) につき高々 1 件
/// - `find` / `list_for_user` は有効なエントリだけを返す
/// - `get` は opt-out 済みのエントリも返す（deferred からの参照用）
/// - `save` は id が既存なら更新、なければ作成
#[async_trait]
pub trait UserBackendStore: Send + Sync {
    async fn find(
        &self,
        user_id: UserId,
        backend: &str,
    ) -> Result<Option<UserBackendRegistry>, AhemError>;

    async fn get(&self, id: UserBackendId) -> Result<Option<UserBackendRegistry>, AhemError>;

    async fn save(&self, entry: UserBackendRegistry) -> Result<(), AhemError>;

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<UserBackendRegistry>, AhemError>;
}
