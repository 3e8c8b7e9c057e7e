//! Impls - ports の開発用・テスト用実装
//!
//! # 含まれる実装
//! - **InMemoryStore**: UserDirectory / UserBackendStore / DeferredStore
//! - **InMemoryDeliveryQueue**: eta 対応の配送キュー
//! - **InlineScheduler / QueueScheduler**: Scheduler の 2 実装
//! - **LogBackend**: tracing に出力する Backend

pub mod backends;
pub mod inmem_delivery;
pub mod inmem_store;
pub mod schedulers;

pub use self::backends::LogBackend;
pub use self::inmem_delivery::InMemoryDeliveryQueue;
pub use self::inmem_store::InMemoryStore;
pub use self::schedulers::{InlineScheduler, QueueScheduler};
