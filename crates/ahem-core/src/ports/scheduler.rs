//! Scheduler port - send の実行方法
//!
//! 起動時に 1 度だけ選ばれ、dispatch に注入されます。
//! - **inline**: その場で send を実行（task_id なし）
//! - **queue**: DeliveryQueue に積んで task_id を返す

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{AhemError, DeferredId, TaskId};

#[async_trait]
pub trait Scheduler: Send + Sync {
    /// 送信を予約する
    ///
    /// queue に積んだ場合は `Some(task_id)`、その場で実行した場合は `None`。
    async fn schedule(
        &self,
        deferred_id: DeferredId,
        eta: Option<DateTime<Utc>>,
    ) -> Result<Option<TaskId>, AhemError>;

    fn mode(&self) -> SchedulerMode;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerMode {
    Inline,
    Queue,
}

impl fmt::Display for SchedulerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerMode::Inline => f.write_str("inline"),
            SchedulerMode::Queue => f.write_str("queue"),
        }
    }
}

impl FromStr for SchedulerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inline" | "sync" => Ok(SchedulerMode::Inline),
            "queue" | "async" => Ok(SchedulerMode::Queue),
            other => Err(format!("unknown scheduler mode '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("inline", SchedulerMode::Inline)]
    #[case("SYNC", SchedulerMode::Inline)]
    #[case("queue", SchedulerMode::Queue)]
    #[case(" async ", SchedulerMode::Queue)]
    fn parses_scheduler_mode(#[case] input: &str, #[case] expected: SchedulerMode) {
        assert_eq!(input.parse::<SchedulerMode>().unwrap(), expected);
    }

    #[test]
    fn rejects_unknown_mode() {
        assert!("celery".parse::<SchedulerMode>().is_err());
    }
}
