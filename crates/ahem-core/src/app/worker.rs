//! WorkerGroup - DeliveryQueue を消化する worker 群
//!
//! 各 worker は `pop → send_notification` を繰り返すだけです。
//! 失敗はログに残して次へ進みます（リトライはしない）。

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::sender::NotificationSender;
use crate::ports::DeliveryQueue;

/// Worker group handle.
/// - `request_shutdown()` で新しい pop を止める
/// - `shutdown_and_join()` で全 worker の終了を待てる
pub struct WorkerGroup {
    shutdown_tx: watch::Sender<bool>,
    joins: Vec<JoinHandle<()>>,
}

impl WorkerGroup {
    /// Spawn `n` workers.
    pub fn spawn(
        n: usize,
        queue: Arc<dyn DeliveryQueue>,
        sender: Arc<NotificationSender>,
        poll_timeout: Duration,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut joins = Vec::with_capacity(n);
        for worker_id in 0..n {
            let q = Arc::clone(&queue);
            let s = Arc::clone(&sender);
            let mut rx = shutdown_rx.clone();

            let join = tokio::spawn(async move {
                worker_loop(worker_id, q, s, poll_timeout, &mut rx).await;
            });
            joins.push(join);
        }
        info!(workers = n, "worker group started");

        Self { shutdown_tx, joins }
    }

    pub fn len(&self) -> usize {
        self.joins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joins.is_empty()
    }

    /// 実行中の send は中断しない。新しい pop をしなくなるだけ
    pub fn request_shutdown(&self) {
        // receivers may already be dropped
        let _ = self.shutdown_tx.send(true);
    }

    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        for j in self.joins {
            let _ = j.await;
        }
        info!("worker group stopped");
    }
}

async fn worker_loop(
    worker_id: usize,
    queue: Arc<dyn DeliveryQueue>,
    sender: Arc<NotificationSender>,
    poll_timeout: Duration,
    shutdown_rx: &mut watch::Receiver<bool>,
) {
    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        let popped = tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                continue;
            }
            popped = queue.pop(poll_timeout) => popped,
        };

        let item = match popped {
            Ok(Some(item)) => item,
            Ok(None) => continue,
            Err(e) => {
                error!(worker_id, error = %e, "queue pop failed");
                tokio::time::sleep(poll_timeout).await;
                continue;
            }
        };

        match sender.send_notification(item.deferred_id).await {
            Ok(()) => {
                debug!(worker_id, task_id = %item.task_id, deferred_id = %item.deferred_id, "task done");
            }
            Err(e) => {
                error!(
                    worker_id,
                    task_id = %item.task_id,
                    deferred_id = %item.deferred_id,
                    error = %e,
                    "task failed"
                );
            }
        }
    }
    debug!(worker_id, "worker exited");
}
