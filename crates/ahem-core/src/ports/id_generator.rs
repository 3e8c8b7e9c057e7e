//! IdGenerator port - ID 生成の抽象化
//!
//! # 実装
//! - **UlidGenerator**: Clock を使った ULID 生成

use crate::domain::ids::{DeferredId, TaskId, UserBackendId};
use crate::ports::Clock;
use ulid::Ulid;

/// IdGenerator は各レコードの ID を生成
///
/// # Thread Safety
/// - `Send + Sync` を要求（dispatch と worker の両方から使う）
pub trait IdGenerator: Send + Sync {
    fn generate_user_backend_id(&self) -> UserBackendId;

    fn generate_deferred_id(&self) -> DeferredId;

    fn generate_task_id(&self) -> TaskId;
}

/// UlidGenerator は ULID ベースの ID 生成器
///
/// timestamp 部分を Clock から取るので、FixedClock を渡せば
/// timestamp が固定された ID になります（ランダム部分は毎回異なる）。
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    fn next(&self) -> Ulid {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        Ulid::from_parts(timestamp_ms, rand::random())
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_user_backend_id(&self) -> UserBackendId {
        UserBackendId::from(self.next())
    }

    fn generate_deferred_id(&self) -> DeferredId {
        DeferredId::from(self.next())
    }

    fn generate_task_id(&self) -> TaskId {
        TaskId::from(self.next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{FixedClock, SystemClock};
    use chrono::{TimeZone, Utc};

    #[test]
    fn ulid_generator_generates_unique_ids() {
        let id_gen = UlidGenerator::new(SystemClock);

        let id1 = id_gen.generate_deferred_id();
        let id2 = id_gen.generate_deferred_id();

        assert_ne!(id1, id2);
    }

    #[test]
    fn ulid_generator_uses_clock_for_timestamp() {
        let fixed_time = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let id_gen = UlidGenerator::new(FixedClock::new(fixed_time));

        let id1 = id_gen.generate_task_id();
        let id2 = id_gen.generate_task_id();

        assert_ne!(id1, id2);
        assert_eq!(id1.as_ulid().timestamp_ms(), fixed_time.timestamp_millis() as u64);
        assert_eq!(id2.as_ulid().timestamp_ms(), fixed_time.timestamp_millis() as u64);
    }
}
