use std::sync::Arc;

use anyhow::Context as _;
use serde_json::json;
use tokio::time::{Duration, Instant, sleep};
use tracing::info;
use tracing_subscriber::EnvFilter;
use ulid::Ulid;

use ahem_core::domain::{ContextFilterScope, Notification, QuerySetScope, User, UserId};
use ahem_core::impls::{InMemoryStore, LogBackend};
use ahem_core::{AhemConfig, AppBuilder, DispatchRequest};

const SETTLE_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // (A) 設定とログ
    let config = AhemConfig::from_env().context("load configuration")?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .init();
    info!(scheduler = %config.scheduler, workers = config.workers, "starting ahem demo");

    // (B) ストア・backend・notification を登録して App を組む
    let store = Arc::new(InMemoryStore::new());
    let app = AppBuilder::new()
        .with_memory_store(store.clone())
        .scheduler(config.scheduler)
        .register_backend(Arc::new(
            LogBackend::new("email").with_required_settings(["address"]),
        ))?
        .register_backend(Arc::new(
            LogBackend::new("sms").with_required_settings(["phone"]),
        ))?
        .register_notification(
            Notification::new("weekly_digest", QuerySetScope::all())
                .with_backends(["email", "sms"])
                .with_template("default", "ahem/digest.txt")
                .with_template("sms", "ahem/digest_short.txt"),
        )?
        .register_notification(
            Notification::new(
                "password_changed",
                ContextFilterScope::new().field("id", "user_id"),
            )
            .with_backends(["email"]),
        )?
        .expect_notifications(&["weekly_digest", "password_changed"])
        .build()?;

    // (C) ユーザーと opt-in
    let alice = User::new(UserId::from_ulid(Ulid::new()), "alice").with_email("alice@example.com");
    let bob = User::new(UserId::from_ulid(Ulid::new()), "bob").with_staff(true);
    let carol = User::new(UserId::from_ulid(Ulid::new()), "carol");
    for user in [&alice, &bob, &carol] {
        store.insert_user(user.clone()).await;
    }

    let subscriptions = app.subscriptions();
    subscriptions
        .opt_in(alice.id, "email", json!({ "address": "alice@example.com" }))
        .await?;
    subscriptions
        .opt_in(alice.id, "sms", json!({ "phone": "+81-90-0000-0001" }))
        .await?;
    subscriptions
        .opt_in(bob.id, "email", json!({ "address": "bob@example.com" }))
        .await?;
    // carol はどこにも opt-in しない

    // (D) worker を起動（inline モードでは None）
    let workers = app.spawn_workers(config.workers, config.poll_timeout);

    // (E) dispatch
    let report = app
        .dispatch_to_users(
            DispatchRequest::new("weekly_digest", ["email", "sms"])
                .with_context_value("week", 42),
        )
        .await?;
    println!(
        "weekly_digest: recipients={} created={} skipped={}",
        report.recipients,
        report.created.len(),
        report.skipped
    );

    let eta = chrono::Utc::now() + chrono::Duration::seconds(1);
    let report = app
        .dispatch_to_users(
            DispatchRequest::new("password_changed", ["email"])
                .with_eta(eta)
                .with_context_value("user_id", alice.id.as_ulid().to_string()),
        )
        .await?;
    println!(
        "password_changed: recipients={} created={} (eta={eta})",
        report.recipients,
        report.created.len()
    );

    // (F) 全件が送信されるまでポーリング
    let started = Instant::now();
    let counts = loop {
        let counts = app.counts().await?;
        if counts.is_settled() || started.elapsed() >= SETTLE_TIMEOUT {
            break counts;
        }
        sleep(Duration::from_millis(50)).await;
    };
    println!(
        "counts: total={} ran={} queued={} pending={}",
        counts.total, counts.ran, counts.queued, counts.pending
    );

    if let Some(workers) = workers {
        workers.shutdown_and_join().await;
    }
    Ok(())
}
