//! Dispatcher - notification を (user, backend) ごとの deferred に展開する
//!
//! # フロー
//! 1. notification を名前で解決（未登録なら何も作らずにエラー）
//! 2. Scope で受信者を解決
//! 3. (user, 要求された backend) ごとに opt-in を確認。なければ黙ってスキップ
//! 4. DeferredNotification を作成（scheduler の状態に関係なく先に作る）
//! 5. Scheduler に渡す。task_id が返ればレコードに記録
//!
//! ループ全体はトランザクションではありません。途中で失敗すると、
//! それまでに作ったレコードと積んだ task は残ります。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info};

use super::registry::NotificationRegistry;
use crate::domain::{AhemError, Context, DeferredId, DeferredNotification, Notification, User};
use crate::ports::{Clock, DeferredStore, IdGenerator, Scheduler, UserBackendStore, UserDirectory};

/// DispatchRequest は dispatch_to_users の引数
///
/// `backends` は明示的に渡す（notification の backend 一覧は自動では使わない）。
/// `extra` は受け取るだけで、コアのロジックでは使いません。
#[derive(Debug, Clone, Default)]
pub struct DispatchRequest {
    pub notification: String,
    pub eta: Option<DateTime<Utc>>,
    pub context: Context,
    pub backends: Vec<String>,
    pub extra: Context,
}

impl DispatchRequest {
    pub fn new<I, S>(notification: impl Into<String>, backends: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            notification: notification.into(),
            backends: backends.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_eta(mut self, eta: DateTime<Utc>) -> Self {
        self.eta = Some(eta);
        self
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    pub fn with_context_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// DispatchReport は 1 回の dispatch の結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub recipients: usize,
    /// 作成した deferred（作成順）
    pub created: Vec<DeferredId>,
    /// queue に積んだ件数
    pub queued: usize,
    /// inline で送った件数
    pub sent_inline: usize,
    /// opt-in がなくスキップした (user, backend) の数
    pub skipped: usize,
}

pub struct Dispatcher {
    notifications: Arc<NotificationRegistry>,
    users: Arc<dyn UserDirectory>,
    user_backends: Arc<dyn UserBackendStore>,
    deferred: Arc<dyn DeferredStore>,
    scheduler: Arc<dyn Scheduler>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl Dispatcher {
    pub fn new(
        notifications: Arc<NotificationRegistry>,
        users: Arc<dyn UserDirectory>,
        user_backends: Arc<dyn UserBackendStore>,
        deferred: Arc<dyn DeferredStore>,
        scheduler: Arc<dyn Scheduler>,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            notifications,
            users,
            user_backends,
            deferred,
            scheduler,
            ids,
            clock,
        }
    }

    /// notification の Scope を context で評価し、受信者を読み出す
    pub async fn get_users(
        &self,
        notification: &Notification,
        context: &Context,
    ) -> Result<Vec<User>, AhemError> {
        let filter = notification.user_filter(context)?;
        self.users.find(&filter).await
    }

    pub async fn dispatch_to_users(
        &self,
        request: DispatchRequest,
    ) -> Result<DispatchReport, AhemError> {
        let notification = self.notifications.get(&request.notification)?;

        if !request.extra.is_empty() {
            let keys: Vec<&str> = request.extra.keys().map(String::as_str).collect();
            debug!(notification = notification.name(), ?keys, "extra dispatch arguments ignored");
        }

        for backend in &request.backends {
            if !notification.supports_backend(backend) {
                debug!(
                    notification = notification.name(),
                    backend = %backend,
                    "backend is not declared by the notification"
                );
            }
        }

        let users = self.get_users(&notification, &request.context).await?;

        let mut report = DispatchReport {
            recipients: users.len(),
            ..DispatchReport::default()
        };

        for user in &users {
            for backend in &request.backends {
                let Some(entry) = self.user_backends.find(user.id, backend).await? else {
                    debug!(
                        notification = notification.name(),
                        user_id = %user.id,
                        backend = %backend,
                        "user has not opted into backend; skipping"
                    );
                    report.skipped += 1;
                    continue;
                };

                let deferred = DeferredNotification::new(
                    self.ids.generate_deferred_id(),
                    notification.name(),
                    entry.id,
                    request.context.clone(),
                    self.clock.now(),
                );
                let deferred_id = deferred.id;
                self.deferred.create(deferred).await?;
                report.created.push(deferred_id);

                match self.scheduler.schedule(deferred_id, request.eta).await? {
                    Some(task_id) => {
                        self.deferred.set_task_id(deferred_id, task_id).await?;
                        report.queued += 1;
                    }
                    None => report.sent_inline += 1,
                }
            }
        }

        info!(
            notification = notification.name(),
            scheduler = %self.scheduler.mode(),
            recipients = report.recipients,
            created = report.created.len(),
            skipped = report.skipped,
            "dispatch finished"
        );
        Ok(report)
    }
}
