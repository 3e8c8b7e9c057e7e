//! ahem-core
//!
//! 名前付き通知を (user, backend) ごとに展開し、遅延送信するためのライブラリ。
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, user, scope, notification, deferred, errors）
//! - **ports**: 抽象化レイヤー（UserDirectory, UserBackendStore, DeferredStore,
//!   DeliveryQueue, Scheduler, Backend, Clock, IdGenerator）
//! - **app**: アプリケーションロジック（builder, dispatch, sender, subscriptions, worker）
//! - **impls**: 開発用の実装（InMemoryStore, InMemoryDeliveryQueue, schedulers, LogBackend）
//! - **config**: 環境変数からの設定
//! - **observability**: 状態別件数

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod observability;
pub mod ports;

pub use app::{App, AppBuilder, BuildError, DispatchReport, DispatchRequest};
pub use config::{AhemConfig, ConfigError};
pub use domain::{AhemError, BackendError};
