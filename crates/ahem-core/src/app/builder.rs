//! AppBuilder - アプリケーションの構築とワイヤリング
//!
//! # Fail-fast 設計
//! - notification / backend の二重登録は登録時にエラー
//! - expect_notifications() で期待した名前が揃っていなければ build() でエラー
//! - ストアが設定されていなければ build() でエラー
//!
//! Scheduler（inline / queue）はここで 1 度だけ選びます。

use std::sync::Arc;
use std::time::Duration;

use super::dispatch::{DispatchReport, DispatchRequest, Dispatcher};
use super::registry::{BackendRegistry, NotificationRegistry};
use super::sender::NotificationSender;
use super::subscriptions::Subscriptions;
use super::worker::WorkerGroup;
use crate::domain::{AhemError, Context, DeferredId, Notification, User};
use crate::impls::{InMemoryDeliveryQueue, InMemoryStore, InlineScheduler, QueueScheduler};
use crate::observability::DeferredCounts;
use crate::ports::{
    Backend, Clock, DeferredStore, DeliveryQueue, IdGenerator, Scheduler, SchedulerMode,
    SystemClock, UlidGenerator, UserBackendStore, UserDirectory,
};

/// AppBuilder はアプリケーションを構築
///
/// # 使用例
/// ```ignore
/// let store = Arc::new(InMemoryStore::new());
/// let app = AppBuilder::new()
///     .with_memory_store(store)
///     .scheduler(SchedulerMode::Queue)
///     .register_backend(Arc::new(LogBackend::new("email")))?
///     .register_notification(Notification::new("welcome", QuerySetScope::all()))?
///     .expect_notifications(&["welcome"])
///     .build()?;
/// ```
pub struct AppBuilder {
    notifications: NotificationRegistry,
    backends: BackendRegistry,
    expected_notifications: Option<Vec<String>>,
    users: Option<Arc<dyn UserDirectory>>,
    user_backends: Option<Arc<dyn UserBackendStore>>,
    deferred: Option<Arc<dyn DeferredStore>>,
    clock: Arc<dyn Clock>,
    ids: Option<Arc<dyn IdGenerator>>,
    mode: SchedulerMode,
    queue: Option<Arc<dyn DeliveryQueue>>,
}

/// BuildError はアプリケーション構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing notifications: {0:?}. These notifications were expected but not registered.")]
    MissingNotifications(Vec<String>),

    #[error("No {0} configured")]
    MissingStore(&'static str),
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            notifications: NotificationRegistry::new(),
            backends: BackendRegistry::new(),
            expected_notifications: None,
            users: None,
            user_backends: None,
            deferred: None,
            clock: Arc::new(SystemClock),
            ids: None,
            mode: SchedulerMode::Queue,
            queue: None,
        }
    }

    /// 3 つのストアすべてに同じ InMemoryStore を使う
    pub fn with_memory_store(self, store: Arc<InMemoryStore>) -> Self {
        self.with_users(store.clone())
            .with_user_backends(store.clone())
            .with_deferred_store(store)
    }

    pub fn with_users(mut self, users: Arc<dyn UserDirectory>) -> Self {
        self.users = Some(users);
        self
    }

    pub fn with_user_backends(mut self, user_backends: Arc<dyn UserBackendStore>) -> Self {
        self.user_backends = Some(user_backends);
        self
    }

    pub fn with_deferred_store(mut self, deferred: Arc<dyn DeferredStore>) -> Self {
        self.deferred = Some(deferred);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// 省略時は Clock を使う UlidGenerator
    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn scheduler(mut self, mode: SchedulerMode) -> Self {
        self.mode = mode;
        self
    }

    /// queue モードで使う DeliveryQueue（省略時は InMemoryDeliveryQueue）
    pub fn with_queue(mut self, queue: Arc<dyn DeliveryQueue>) -> Self {
        self.queue = Some(queue);
        self
    }

    pub fn register_notification(mut self, notification: Notification) -> Result<Self, AhemError> {
        self.notifications.register(notification)?;
        Ok(self)
    }

    pub fn register_backend(mut self, backend: Arc<dyn Backend>) -> Result<Self, AhemError> {
        self.backends.register(backend)?;
        Ok(self)
    }

    pub fn expect_notifications(mut self, names: &[&str]) -> Self {
        self.expected_notifications = Some(names.iter().map(|n| n.to_string()).collect());
        self
    }

    pub fn build(self) -> Result<App, BuildError> {
        if let Some(expected) = &self.expected_notifications {
            let registered = self.notifications.names();
            let missing: Vec<String> = expected
                .iter()
                .filter(|name| !registered.contains(name))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(BuildError::MissingNotifications(missing));
            }
        }

        let users = self.users.ok_or(BuildError::MissingStore("user directory"))?;
        let user_backends = self
            .user_backends
            .ok_or(BuildError::MissingStore("user backend store"))?;
        let deferred = self
            .deferred
            .ok_or(BuildError::MissingStore("deferred store"))?;

        let clock = self.clock;
        let ids = self
            .ids
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(clock.clone())));
        let notifications = Arc::new(self.notifications);
        let backends = Arc::new(self.backends);

        let sender = Arc::new(NotificationSender::new(
            notifications.clone(),
            backends.clone(),
            users.clone(),
            user_backends.clone(),
            deferred.clone(),
            clock.clone(),
        ));

        let queue: Option<Arc<dyn DeliveryQueue>> = match self.mode {
            SchedulerMode::Inline => None,
            SchedulerMode::Queue => Some(self.queue.unwrap_or_else(|| {
                Arc::new(InMemoryDeliveryQueue::with_clock(clock.clone()))
            })),
        };
        let scheduler: Arc<dyn Scheduler> = match &queue {
            Some(queue) => Arc::new(QueueScheduler::new(queue.clone(), ids.clone())),
            None => Arc::new(InlineScheduler::new(sender.clone())),
        };

        let dispatcher = Dispatcher::new(
            notifications.clone(),
            users.clone(),
            user_backends.clone(),
            deferred.clone(),
            scheduler,
            ids.clone(),
            clock.clone(),
        );
        let subscriptions = Subscriptions::new(backends.clone(), users, user_backends, ids, clock);

        Ok(App {
            notifications,
            backends,
            dispatcher,
            sender,
            subscriptions,
            deferred,
            queue,
            mode: self.mode,
        })
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// App は組み立て済みの dispatch / send / opt-in
pub struct App {
    notifications: Arc<NotificationRegistry>,
    backends: Arc<BackendRegistry>,
    dispatcher: Dispatcher,
    sender: Arc<NotificationSender>,
    subscriptions: Subscriptions,
    deferred: Arc<dyn DeferredStore>,
    queue: Option<Arc<dyn DeliveryQueue>>,
    mode: SchedulerMode,
}

impl App {
    pub async fn dispatch_to_users(
        &self,
        request: DispatchRequest,
    ) -> Result<DispatchReport, AhemError> {
        self.dispatcher.dispatch_to_users(request).await
    }

    /// 名前で notification を引き、context に対する受信者を返す
    pub async fn get_users(
        &self,
        notification: &str,
        context: &Context,
    ) -> Result<Vec<User>, AhemError> {
        let notification = self.notifications.get(notification)?;
        self.dispatcher.get_users(&notification, context).await
    }

    pub async fn send_notification(&self, deferred_id: DeferredId) -> Result<(), AhemError> {
        self.sender.send_notification(deferred_id).await
    }

    pub fn subscriptions(&self) -> &Subscriptions {
        &self.subscriptions
    }

    pub fn notifications(&self) -> &NotificationRegistry {
        &self.notifications
    }

    pub fn backends(&self) -> &BackendRegistry {
        &self.backends
    }

    pub fn scheduler_mode(&self) -> SchedulerMode {
        self.mode
    }

    pub fn queue(&self) -> Option<&Arc<dyn DeliveryQueue>> {
        self.queue.as_ref()
    }

    /// queue モードなら worker を起動する。inline モードでは None
    pub fn spawn_workers(&self, n: usize, poll_timeout: Duration) -> Option<WorkerGroup> {
        let queue = self.queue.clone()?;
        Some(WorkerGroup::spawn(n, queue, self.sender.clone(), poll_timeout))
    }

    pub async fn counts(&self) -> Result<DeferredCounts, AhemError> {
        let records = self.deferred.list().await?;
        Ok(DeferredCounts::from_records(&records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::QuerySetScope;
    use crate::impls::LogBackend;

    fn store() -> Arc<InMemoryStore> {
        Arc::new(InMemoryStore::new())
    }

    #[test]
    fn test_build_success() {
        let app = AppBuilder::new()
            .with_memory_store(store())
            .register_notification(Notification::new("welcome", QuerySetScope::all()))
            .unwrap()
            .expect_notifications(&["welcome"])
            .build();
        assert!(app.is_ok());
    }

    #[test]
    fn test_build_missing_notifications() {
        let app = AppBuilder::new()
            .with_memory_store(store())
            .register_notification(Notification::new("welcome", QuerySetScope::all()))
            .unwrap()
            .expect_notifications(&["welcome", "goodbye"])
            .build();
        assert!(matches!(
            app,
            Err(BuildError::MissingNotifications(missing)) if missing == vec!["goodbye".to_string()]
        ));
    }

    #[test]
    fn test_build_without_store() {
        let app = AppBuilder::new().build();
        assert!(matches!(app, Err(BuildError::MissingStore(_))));
    }

    #[test]
    fn test_duplicate_backend_is_rejected() {
        let result = AppBuilder::new()
            .register_backend(Arc::new(LogBackend::new("email")))
            .unwrap()
            .register_backend(Arc::new(LogBackend::new("email")));
        assert!(matches!(result, Err(AhemError::DuplicateBackend(_))));
    }

    #[test]
    fn test_scheduler_mode_selects_queue() {
        let inline = AppBuilder::new()
            .with_memory_store(store())
            .scheduler(SchedulerMode::Inline)
            .build()
            .unwrap();
        assert_eq!(inline.scheduler_mode(), SchedulerMode::Inline);
        assert!(inline.queue().is_none());

        let queued = AppBuilder::new().with_memory_store(store()).build().unwrap();
        assert_eq!(queued.scheduler_mode(), SchedulerMode::Queue);
        assert!(queued.queue().is_some());
    }
}
