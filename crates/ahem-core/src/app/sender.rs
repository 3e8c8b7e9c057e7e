//! NotificationSender - deferred 1 件を backend adapter で送る
//!
//! # フロー
//! 1. DeferredNotification → UserBackendRegistry → User を読む
//! 2. backend と notification を名前で解決（どちらも消えていればエラー）
//! 3. adapter の send_notification を呼ぶ
//! 4. 成否にかかわらず ran_at を記録し、adapter のエラーはその後で返す
//!
//! opt-out 済みのエントリを指す deferred は adapter を呼ばずに ran_at だけ記録します。
//!
//! ran_at は「送信を試みた時刻」であって成功の印ではありません。
//! 同じ ID で 2 回呼べば 2 回送ります（二重送信ガードなし）。

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::registry::{BackendRegistry, NotificationRegistry};
use crate::domain::{AhemError, DeferredId};
use crate::ports::{Clock, DeferredStore, UserBackendStore, UserDirectory};

pub struct NotificationSender {
    notifications: Arc<NotificationRegistry>,
    backends: Arc<BackendRegistry>,
    users: Arc<dyn UserDirectory>,
    user_backends: Arc<dyn UserBackendStore>,
    deferred: Arc<dyn DeferredStore>,
    clock: Arc<dyn Clock>,
}

impl NotificationSender {
    pub fn new(
        notifications: Arc<NotificationRegistry>,
        backends: Arc<BackendRegistry>,
        users: Arc<dyn UserDirectory>,
        user_backends: Arc<dyn UserBackendStore>,
        deferred: Arc<dyn DeferredStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            notifications,
            backends,
            users,
            user_backends,
            deferred,
            clock,
        }
    }

    pub async fn send_notification(&self, deferred_id: DeferredId) -> Result<(), AhemError> {
        let deferred = self
            .deferred
            .get(deferred_id)
            .await?
            .ok_or(AhemError::DeferredNotFound(deferred_id))?;
        let entry = self
            .user_backends
            .get(deferred.user_backend_id)
            .await?
            .ok_or(AhemError::UserBackendNotFound(deferred.user_backend_id))?;

        if !entry.is_active() {
            self.deferred.set_ran_at(deferred_id, self.clock.now()).await?;
            info!(
                %deferred_id,
                backend = %entry.backend,
                user_id = %entry.user_id,
                "user opted out of backend; send skipped"
            );
            return Ok(());
        }
        let user = self
            .users
            .get(entry.user_id)
            .await?
            .ok_or(AhemError::UserNotFound(entry.user_id))?;

        let backend = self.backends.get(&entry.backend)?;
        let notification = self.notifications.get(&deferred.notification)?;

        let result = backend
            .send_notification(&user, &notification, &deferred.context, &entry.settings)
            .await;

        let stamped = self.deferred.set_ran_at(deferred_id, self.clock.now()).await;

        match result {
            Ok(()) => {
                stamped?;
                debug!(
                    %deferred_id,
                    notification = notification.name(),
                    backend = %entry.backend,
                    user_id = %user.id,
                    "notification sent"
                );
                Ok(())
            }
            Err(source) => {
                if let Err(e) = stamped {
                    error!(%deferred_id, error = %e, "failed to record ran_at after send failure");
                }
                warn!(
                    %deferred_id,
                    notification = notification.name(),
                    backend = %entry.backend,
                    user_id = %user.id,
                    error = %source,
                    "backend send failed"
                );
                Err(AhemError::SendFailed {
                    backend: entry.backend,
                    source,
                })
            }
        }
    }
}
