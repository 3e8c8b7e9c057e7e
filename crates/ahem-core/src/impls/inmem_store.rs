//! InMemoryStore - 開発用・テスト用の永続化層
//!
//! UserDirectory / UserBackendStore / DeferredStore を 1 つの構造体で実装します。
//! 本番では host アプリケーションの DB に置き換える前提です。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::domain::{
    AhemError, DeferredId, DeferredNotification, TaskId, User, UserBackendId,
    UserBackendRegistry, UserFilter, UserId,
};
use crate::ports::{DeferredStore, UserBackendStore, UserDirectory};

#[derive(Default)]
struct StoreState {
    /// 挿入順を保つ
    users: Vec<User>,

    user_backends: HashMap<UserBackendId, UserBackendRegistry>,

    deferred: HashMap<DeferredId, DeferredNotification>,

    /// deferred の作成順
    deferred_order: Vec<DeferredId>,
}

/// InMemoryStore は Mutex で守られた HashMap/Vec
///
/// # ロック
/// - 各メソッド内でロックを取り、await を跨いで保持しない
/// - ストアを跨いだトランザクションはない
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// ユーザーを追加する（同じ id があれば置き換え）
    pub async fn insert_user(&self, user: User) {
        let mut state = self.state.lock().await;
        match state.users.iter_mut().find(|u| u.id == user.id) {
            Some(existing) => *existing = user,
            None => state.users.push(user),
        }
    }
}

#[async_trait]
impl UserDirectory for InMemoryStore {
    async fn find(&self, filter: &UserFilter) -> Result<Vec<User>, AhemError> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .iter()
            .filter(|user| filter.matches(user))
            .cloned()
            .collect())
    }

    async fn get(&self, id: UserId) -> Result<Option<User>, AhemError> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }
}

#[async_trait]
impl UserBackendStore for InMemoryStore {
    async fn find(
        &self,
        user_id: UserId,
        backend: &str,
    ) -> Result<Option<UserBackendRegistry>, AhemError> {
        let state = self.state.lock().await;
        Ok(state
            .user_backends
            .values()
            .find(|entry| entry.is_active() && entry.user_id == user_id && entry.backend == backend)
            .cloned())
    }

    async fn get(&self, id: UserBackendId) -> Result<Option<UserBackendRegistry>, AhemError> {
        let state = self.state.lock().await;
        Ok(state.user_backends.get(&id).cloned())
    }

    async fn save(&self, entry: UserBackendRegistry) -> Result<(), AhemError> {
        let mut state = self.state.lock().await;
        let conflict = entry.is_active()
            && state.user_backends.values().any(|existing| {
                existing.id != entry.id
                    && existing.is_active()
                    && existing.user_id == entry.user_id
                    && existing.backend == entry.backend
            });
        if conflict {
            return Err(AhemError::Store(format!(
                "user {} already has an entry for backend '{}'",
                entry.user_id, entry.backend
            )));
        }
        state.user_backends.insert(entry.id, entry);
        Ok(())
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<UserBackendRegistry>, AhemError> {
        let state = self.state.lock().await;
        let mut entries: Vec<_> = state
            .user_backends
            .values()
            .filter(|entry| entry.is_active() && entry.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.backend.cmp(&b.backend));
        Ok(entries)
    }
}

#[async_trait]
impl DeferredStore for InMemoryStore {
    async fn create(&self, deferred: DeferredNotification) -> Result<(), AhemError> {
        let mut state = self.state.lock().await;
        if state.deferred.contains_key(&deferred.id) {
            return Err(AhemError::Store(format!(
                "deferred notification {} already exists",
                deferred.id
            )));
        }
        state.deferred_order.push(deferred.id);
        state.deferred.insert(deferred.id, deferred);
        Ok(())
    }

    async fn get(&self, id: DeferredId) -> Result<Option<DeferredNotification>, AhemError> {
        let state = self.state.lock().await;
        Ok(state.deferred.get(&id).cloned())
    }

    async fn set_task_id(&self, id: DeferredId, task_id: TaskId) -> Result<(), AhemError> {
        let mut state = self.state.lock().await;
        let record = state
            .deferred
            .get_mut(&id)
            .ok_or(AhemError::DeferredNotFound(id))?;
        record.attach_task(task_id);
        Ok(())
    }

    async fn set_ran_at(&self, id: DeferredId, ran_at: DateTime<Utc>) -> Result<(), AhemError> {
        let mut state = self.state.lock().await;
        let record = state
            .deferred
            .get_mut(&id)
            .ok_or(AhemError::DeferredNotFound(id))?;
        record.mark_ran(ran_at);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<DeferredNotification>, AhemError> {
        let state = self.state.lock().await;
        Ok(state
            .deferred_order
            .iter()
            .filter_map(|id| state.deferred.get(id).cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Context;
    use chrono::TimeZone;
    use serde_json::Map;
    use ulid::Ulid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn entry(user_id: UserId, backend: &str) -> UserBackendRegistry {
        UserBackendRegistry::new(
            UserBackendId::from_ulid(Ulid::new()),
            user_id,
            backend,
            Map::new(),
            now(),
        )
    }

    #[tokio::test]
    async fn find_user_backend_by_user_and_name() {
        let store = InMemoryStore::new();
        let user_id = UserId::from_ulid(Ulid::new());
        let email = entry(user_id, "email");
        store.save(email.clone()).await.unwrap();

        let found = UserBackendStore::find(&store, user_id, "email").await.unwrap();
        assert_eq!(found, Some(email));
        assert!(UserBackendStore::find(&store, user_id, "sms").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn second_entry_for_same_pair_is_rejected() {
        let store = InMemoryStore::new();
        let user_id = UserId::from_ulid(Ulid::new());
        store.save(entry(user_id, "email")).await.unwrap();

        let err = store.save(entry(user_id, "email")).await.unwrap_err();
        assert!(matches!(err, AhemError::Store(_)));
    }

    #[tokio::test]
    async fn deactivated_entry_is_hidden_from_find_but_not_get() {
        let store = InMemoryStore::new();
        let user_id = UserId::from_ulid(Ulid::new());
        let mut email = entry(user_id, "email");
        store.save(email.clone()).await.unwrap();

        email.deactivate(now());
        store.save(email.clone()).await.unwrap();

        assert!(UserBackendStore::find(&store, user_id, "email").await.unwrap().is_none());
        assert!(store.list_for_user(user_id).await.unwrap().is_empty());
        let loaded = UserBackendStore::get(&store, email.id).await.unwrap().unwrap();
        assert!(!loaded.is_active());

        // 無効化済みのエントリは新しい opt-in を妨げない
        store.save(entry(user_id, "email")).await.unwrap();
        assert!(UserBackendStore::find(&store, user_id, "email").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn deferred_field_updates() {
        let store = InMemoryStore::new();
        let id = DeferredId::from_ulid(Ulid::new());
        let deferred = DeferredNotification::new(
            id,
            "n",
            UserBackendId::from_ulid(Ulid::new()),
            Context::new(),
            now(),
        );
        store.create(deferred).await.unwrap();

        let task_id = TaskId::from_ulid(Ulid::new());
        store.set_task_id(id, task_id).await.unwrap();
        store.set_ran_at(id, now()).await.unwrap();

        let loaded = DeferredStore::get(&store, id).await.unwrap().unwrap();
        assert_eq!(loaded.task_id, Some(task_id));
        assert_eq!(loaded.ran_at, Some(now()));
    }

    #[tokio::test]
    async fn updating_unknown_deferred_fails() {
        let store = InMemoryStore::new();
        let id = DeferredId::from_ulid(Ulid::new());

        let err = store.set_ran_at(id, now()).await.unwrap_err();
        assert!(matches!(err, AhemError::DeferredNotFound(missing) if missing == id));
    }

    #[tokio::test]
    async fn list_keeps_creation_order() {
        let store = InMemoryStore::new();
        let mut ids = Vec::new();
        for _ in 0..3 {
            let id = DeferredId::from_ulid(Ulid::new());
            ids.push(id);
            store
                .create(DeferredNotification::new(
                    id,
                    "n",
                    UserBackendId::from_ulid(Ulid::new()),
                    Context::new(),
                    now(),
                ))
                .await
                .unwrap();
        }

        let listed: Vec<_> = store.list().await.unwrap().into_iter().map(|d| d.id).collect();
        assert_eq!(listed, ids);
    }
}
