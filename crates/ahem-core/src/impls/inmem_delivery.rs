//! InMemoryDeliveryQueue - 開発用の配送キュー
//!
//! # 実装詳細
//! - eta なし（または到来済み）は `ready`（VecDeque）へ
//! - eta が未来のものは `scheduled`（BinaryHeap, min-heap）へ
//! - pop 時に到来済みの scheduled を ready に昇格
//! - tokio::sync::Notify で push を待機中の pop に通知

use std::collections::{BinaryHeap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, Notify};

use crate::ports::{Clock, DeliveryQueue, QueueError, QueuedSend, SystemClock};

/// eta 待ちのエントリ
///
/// BinaryHeap を min-heap として使うため Ord を逆順にする。
/// 同じ eta 同士は seq（push 順）で並べる。
#[derive(Debug, Clone, PartialEq, Eq)]
struct ScheduledSend {
    eta: DateTime<Utc>,
    seq: u64,
    item: QueuedSend,
}

impl PartialOrd for ScheduledSend {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledSend {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .eta
            .cmp(&self.eta)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Default)]
struct QueueState {
    ready: VecDeque<QueuedSend>,
    scheduled: BinaryHeap<ScheduledSend>,
    next_seq: u64,
}

impl QueueState {
    /// eta が到来したものを ready に移す
    fn promote_due(&mut self, now: DateTime<Utc>) {
        while let Some(entry) = self.scheduled.peek() {
            if entry.eta > now {
                break; // Heap is sorted, so we can stop
            }
            if let Some(entry) = self.scheduled.pop() {
                self.ready.push_back(entry.item);
            }
        }
    }
}

pub struct InMemoryDeliveryQueue {
    state: Arc<Mutex<QueueState>>,
    notify: Arc<Notify>,
    clock: Arc<dyn Clock>,
}

impl InMemoryDeliveryQueue {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// eta の判定に使う Clock を指定する
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState::default())),
            notify: Arc::new(Notify::new()),
            clock,
        }
    }
}

impl Default for InMemoryDeliveryQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeliveryQueue for InMemoryDeliveryQueue {
    async fn push(&self, item: QueuedSend) -> Result<(), QueueError> {
        {
            let mut state = self.state.lock().await;
            match item.eta {
                Some(eta) if eta > self.clock.now() => {
                    let seq = state.next_seq;
                    state.next_seq += 1;
                    state.scheduled.push(ScheduledSend { eta, seq, item });
                }
                _ => state.ready.push_back(item),
            }
        }
        // ロック外で通知（scheduled でも待機中の pop が sleep 時間を計算し直す）
        self.notify.notify_one();
        Ok(())
    }

    async fn pop(&self, timeout: Duration) -> Result<Option<QueuedSend>, QueueError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let next_due = {
                let mut state = self.state.lock().await;
                let now = self.clock.now();
                state.promote_due(now);
                if let Some(item) = state.ready.pop_front() {
                    return Ok(Some(item));
                }
                state
                    .scheduled
                    .peek()
                    .map(|entry| (entry.eta - now).to_std().unwrap_or(Duration::ZERO))
            };

            let now = tokio::time::Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            let mut wait = deadline - now;
            if let Some(due) = next_due {
                wait = wait.min(due);
            }

            tokio::select! {
                _ = self.notify.notified() => {},
                _ = tokio::time::sleep(wait) => {},
            }
        }
    }

    async fn len(&self) -> Result<usize, QueueError> {
        let state = self.state.lock().await;
        Ok(state.ready.len() + state.scheduled.len())
    }
}
