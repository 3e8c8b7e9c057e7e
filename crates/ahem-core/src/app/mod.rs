//! App - アプリケーション層
//!
//! ports を組み合わせて dispatch / send / opt-in を実装します。
//!
//! # 主要コンポーネント
//! - **AppBuilder**: 構築とワイヤリング（scheduler の選択もここ）
//! - **Dispatcher**: notification → deferred の展開
//! - **NotificationSender**: deferred 1 件の送信
//! - **Subscriptions**: opt-in / opt-out
//! - **WorkerGroup**: DeliveryQueue を消化する worker

pub mod builder;
pub mod dispatch;
pub mod registry;
pub mod sender;
pub mod subscriptions;
pub mod worker;

pub use self::builder::{App, AppBuilder, BuildError};
pub use self::dispatch::{DispatchReport, DispatchRequest, Dispatcher};
pub use self::registry::{BackendRegistry, NotificationRegistry};
pub use self::sender::NotificationSender;
pub use self::subscriptions::Subscriptions;
pub use self::worker::WorkerGroup;
