//! LogBackend - tracing に書き出すだけの配送チャネル
//!
//! 外部サービスなしで dispatch → send の流れを確認するための adapter です。

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::info;

use crate::domain::{BackendError, Context, Notification, User};
use crate::ports::Backend;

pub struct LogBackend {
    name: String,
    required_settings: Vec<String>,
}

impl LogBackend {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required_settings: Vec::new(),
        }
    }

    pub fn with_required_settings<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_settings = keys.into_iter().map(Into::into).collect();
        self
    }
}

#[async_trait]
impl Backend for LogBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn required_settings(&self) -> &[String] {
        &self.required_settings
    }

    async fn send_notification(
        &self,
        user: &User,
        notification: &Notification,
        context: &Context,
        settings: &Map<String, Value>,
    ) -> Result<(), BackendError> {
        for key in &self.required_settings {
            if !settings.contains_key(key) {
                return Err(BackendError::MissingSetting(key.clone()));
            }
        }

        info!(
            backend = %self.name,
            notification = notification.name(),
            user_id = %user.id,
            username = %user.username,
            template = notification.template(&self.name).unwrap_or("-"),
            context_keys = context.len(),
            "notification delivered"
        );
        Ok(())
    }
}
