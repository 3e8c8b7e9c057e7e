//! Backend port - 配送チャネル（email, SMS など）の adapter

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::{BackendError, Context, Notification, User};

/// Backend は 1 つの配送チャネル
///
/// - `name()` は BackendRegistry 内で一意
/// - `required_settings()` は opt-in 時に settings に必須のキー
/// - adapter 自体は状態を持たない前提（設定はユーザーごとの settings で渡る）
#[async_trait]
pub trait Backend: Send + Sync {
    fn name(&self) -> &str;

    fn required_settings(&self) -> &[String] {
        &[]
    }

    async fn send_notification(
        &self,
        user: &User,
        notification: &Notification,
        context: &Context,
        settings: &Map<String, Value>,
    ) -> Result<(), BackendError>;
}
