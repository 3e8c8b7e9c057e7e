//! Subscriptions - ユーザーの opt-in / opt-out
//!
//! backend の `required_settings` はここで検証します。
//! send 時には再検証しません（opt-in 後に adapter の要件が変わった場合は
//! adapter 自身がエラーを返す）。

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use super::registry::BackendRegistry;
use crate::domain::{AhemError, UserBackendRegistry, UserId};
use crate::ports::{Clock, IdGenerator, UserBackendStore, UserDirectory};

pub struct Subscriptions {
    backends: Arc<BackendRegistry>,
    users: Arc<dyn UserDirectory>,
    user_backends: Arc<dyn UserBackendStore>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl Subscriptions {
    pub fn new(
        backends: Arc<BackendRegistry>,
        users: Arc<dyn UserDirectory>,
        user_backends: Arc<dyn UserBackendStore>,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            backends,
            users,
            user_backends,
            ids,
            clock,
        }
    }

    /// user を backend に opt-in させる
    ///
    /// 既存のエントリがあれば settings を置き換える（id は変わらない）。
    pub async fn opt_in(
        &self,
        user_id: UserId,
        backend: &str,
        settings: Value,
    ) -> Result<UserBackendRegistry, AhemError> {
        let adapter = self.backends.get(backend)?;
        if self.users.get(user_id).await?.is_none() {
            return Err(AhemError::UserNotFound(user_id));
        }

        let Value::Object(settings) = settings else {
            return Err(AhemError::InvalidSettings(backend.to_string()));
        };

        let missing: Vec<String> = adapter
            .required_settings()
            .iter()
            .filter(|key| !settings.contains_key(key.as_str()))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(AhemError::MissingSettings {
                backend: backend.to_string(),
                missing,
            });
        }

        let now = self.clock.now();
        let entry = match self.user_backends.find(user_id, backend).await? {
            Some(mut existing) => {
                existing.replace_settings(settings, now);
                existing
            }
            None => UserBackendRegistry::new(
                self.ids.generate_user_backend_id(),
                user_id,
                backend,
                settings,
                now,
            ),
        };
        self.user_backends.save(entry.clone()).await?;

        info!(%user_id, backend, user_backend_id = %entry.id, "user opted in");
        Ok(entry)
    }

    /// opt-in を取り消す。有効なエントリがあれば true
    ///
    /// エントリは無効化するだけで削除しません。すでに作られた
    /// DeferredNotification は送信時にスキップされます。
    pub async fn opt_out(&self, user_id: UserId, backend: &str) -> Result<bool, AhemError> {
        let Some(mut entry) = self.user_backends.find(user_id, backend).await? else {
            return Ok(false);
        };
        entry.deactivate(self.clock.now());
        self.user_backends.save(entry).await?;
        info!(%user_id, backend, "user opted out");
        Ok(true)
    }

    pub async fn channels(&self, user_id: UserId) -> Result<Vec<UserBackendRegistry>, AhemError> {
        self.user_backends.list_for_user(user_id).await
    }
}
