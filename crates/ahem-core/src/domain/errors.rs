//! Errors - エラー型
//!
//! dispatch / send / opt-in の全経路で `AhemError` を返します。
//! backend adapter は自分の失敗を `BackendError` で表し、
//! send パイプラインが `AhemError::SendFailed` に包みます。

use thiserror::Error;

use super::ids::{DeferredId, UserBackendId, UserId};

#[derive(Debug, Error)]
pub enum AhemError {
    #[error("notification not found: {0}")]
    NotificationNotFound(String),

    #[error("backend not found: {0}")]
    BackendNotFound(String),

    #[error("notification '{0}' is already registered")]
    DuplicateNotification(String),

    #[error("backend '{0}' is already registered")]
    DuplicateBackend(String),

    #[error("user not found: {0}")]
    UserNotFound(UserId),

    #[error("user backend entry not found: {0}")]
    UserBackendNotFound(UserBackendId),

    #[error("deferred notification not found: {0}")]
    DeferredNotFound(DeferredId),

    #[error("context key '{0}' is required by the scope but was not supplied")]
    MissingContextKey(String),

    #[error("backend '{backend}' requires settings {missing:?}")]
    MissingSettings {
        backend: String,
        missing: Vec<String>,
    },

    #[error("settings for backend '{0}' must be a JSON object")]
    InvalidSettings(String),

    #[error("send via backend '{backend}' failed: {source}")]
    SendFailed {
        backend: String,
        #[source]
        source: BackendError,
    },

    #[error("scope resolution failed: {0}")]
    Scope(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("queue error: {0}")]
    Queue(String),
}

/// BackendError は adapter が配送に失敗したことを表す
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("setting '{0}' is missing")]
    MissingSetting(String),

    #[error("delivery rejected: {0}")]
    Rejected(String),

    #[error("{0}")]
    Other(String),
}
