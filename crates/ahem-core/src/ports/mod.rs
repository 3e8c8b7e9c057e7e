//! Ports - 抽象化レイヤー
//!
//! 各 trait は外部システム（ユーザー DB, opt-in テーブル, 配送キュー,
//! 配送チャネル）へのインターフェースです。開発用の実装は `impls` にあります。

pub mod backend;
pub mod clock;
pub mod deferred_store;
pub mod delivery_queue;
pub mod id_generator;
pub mod scheduler;
pub mod user_backend_store;
pub mod user_directory;

pub use self::backend::Backend;
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::deferred_store::DeferredStore;
pub use self::delivery_queue::{DeliveryQueue, QueueError, QueuedSend};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::scheduler::{Scheduler, SchedulerMode};
pub use self::user_backend_store::UserBackendStore;
pub use self::user_directory::UserDirectory;
