use serde::{Deserialize, Serialize};

use crate::domain::DeferredNotification;

/// DeferredNotification の状態別件数
///
/// - `ran`: ran_at あり（成功・失敗は区別できない）
/// - `queued`: task_id あり、ran_at なし
/// - `pending`: どちらもなし
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeferredCounts {
    pub total: usize,
    pub queued: usize,
    pub ran: usize,
    pub pending: usize,
}

impl DeferredCounts {
    pub fn from_records(records: &[DeferredNotification]) -> Self {
        let mut counts = DeferredCounts {
            total: records.len(),
            ..Default::default()
        };
        for record in records {
            match (record.task_id, record.ran_at) {
                (_, Some(_)) => counts.ran += 1,
                (Some(_), None) => counts.queued += 1,
                (None, None) => counts.pending += 1,
            }
        }
        counts
    }

    /// まだ送信を試みていないものがない
    pub fn is_settled(&self) -> bool {
        self.queued == 0 && self.pending == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Context, DeferredId, TaskId, UserBackendId};
    use chrono::Utc;
    use ulid::Ulid;

    fn record(task: bool, ran: bool) -> DeferredNotification {
        let mut d = DeferredNotification::new(
            DeferredId::from_ulid(Ulid::new()),
            "n",
            UserBackendId::from_ulid(Ulid::new()),
            Context::new(),
            Utc::now(),
        );
        if task {
            d.attach_task(TaskId::from_ulid(Ulid::new()));
        }
        if ran {
            d.mark_ran(Utc::now());
        }
        d
    }

    #[test]
    fn counts_by_bookkeeping_state() {
        let records = vec![
            record(false, false),
            record(true, false),
            record(true, true),
            record(false, true),
        ];
        let counts = DeferredCounts::from_records(&records);

        assert_eq!(
            counts,
            DeferredCounts {
                total: 4,
                queued: 1,
                ran: 2,
                pending: 1,
            }
        );
        assert!(!counts.is_settled());
    }
}
