//! UserBackendRegistry - ユーザーがどの配送チャネルを opt-in しているか

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ids::{UserBackendId, UserId};

/// (user, backend) ごとの opt-in 記録と backend 固有の設定
///
/// identity は (user_id, backend)。有効なエントリは同じ組に高々 1 つで、
/// 再 opt-in は settings の置き換えになります。
///
/// opt-out は `removed_at` を立てるだけで行は残します。
/// 既存の DeferredNotification が参照し続けるためです。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserBackendRegistry {
    pub id: UserBackendId,
    pub user_id: UserId,
    pub backend: String,
    pub settings: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub removed_at: Option<DateTime<Utc>>,
}

impl UserBackendRegistry {
    pub fn new(
        id: UserBackendId,
        user_id: UserId,
        backend: impl Into<String>,
        settings: Map<String, Value>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            backend: backend.into(),
            settings,
            created_at: now,
            updated_at: now,
            removed_at: None,
        }
    }

    pub fn replace_settings(&mut self, settings: Map<String, Value>, now: DateTime<Utc>) {
        self.settings = settings;
        self.updated_at = now;
    }

    pub fn deactivate(&mut self, now: DateTime<Utc>) {
        self.removed_at = Some(now);
        self.updated_at = now;
    }

    pub fn is_active(&self) -> bool {
        self.removed_at.is_none()
    }
}
