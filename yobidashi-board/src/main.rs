//! フードコート呼出ディスプレイ
//!
//! Read-only display process. A single-threaded cooperative loop polls the
//! shared queue file on a fixed interval through
//! [`yobidashi_core::feed::ChangeFeed`] and redraws the two panels when the
//! file changed; an unreadable or missing file renders a degraded
//! placeholder and the loop keeps polling. The two processes never
//! communicate except through the file and its modification time.

use anyhow::Result;
use std::io::Write;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use yobidashi_core::audit::AuditLog;
use yobidashi_core::config::Config;
use yobidashi_core::feed::{ChangeFeed, FeedTick, PanelChange, ViewEvent};
use yobidashi_core::store::QueueStore;
use yobidashi_core::{BoardView, QueueError};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let config = Config::from_env();
    let audit = AuditLog::new(&config.log_dir, "display_board");
    let mut feed = ChangeFeed::new(QueueStore::new(&config.queue_path));

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                shutdown.cancel();
            }
        });
    }

    audit.info("ディスプレイボードを起動しました");
    tracing::info!(
        queue = %config.queue_path.display(),
        interval_ms = config.poll_interval_ms,
        "display board started"
    );

    let mut interval = tokio::time::interval(Duration::from_millis(config.poll_interval_ms));

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                audit.info("ディスプレイボードを停止しました");
                tracing::info!("display board shutting down");
                break;
            }

            _ = interval.tick() => {
                match feed.poll() {
                    FeedTick::Unchanged => {}
                    FeedTick::Changed { view, events } => {
                        for event in &events {
                            audit.info(&format_panel_event(event));
                        }
                        audit.info(&format!(
                            "キューを更新 waiting={} calling={}",
                            view.waiting.len(),
                            view.calling.len()
                        ));
                        render(&view);
                    }
                    FeedTick::Unavailable { error } => {
                        let message = degraded_message(&config, &error);
                        tracing::warn!(error = %error, "queue unavailable");
                        audit.warn(&message);
                        render_degraded(&message);
                    }
                }
            }
        }
    }

    Ok(())
}

fn format_panel_event(event: &ViewEvent) -> String {
    let status = if event.status.is_empty() {
        "未設定"
    } else {
        &event.status
    };
    match event.change {
        PanelChange::Entered => {
            format!("{}: {} を表示 status={}", event.panel.label(), event.id, status)
        }
        PanelChange::Left => {
            format!("{}: {} を非表示 status={}", event.panel.label(), event.id, status)
        }
    }
}

fn degraded_message(config: &Config, error: &QueueError) -> String {
    let file = config.queue_path.display();
    match error {
        QueueError::FileMissing { .. } => format!("{file} が見つかりません"),
        _ => format!("{file} の読み込みに失敗しました: {error}"),
    }
}

fn render(view: &BoardView) {
    let mut out = String::new();
    out.push_str("\x1b[2J\x1b[H");

    out.push_str("━━ お待ち番号 ━━\n");
    if view.waiting.is_empty() {
        out.push_str("現在お待ち番号はありません\n");
    } else {
        for order in &view.waiting {
            out.push_str(&format!("・{} ({})\n", order.id, order.status));
        }
    }

    out.push_str("\n━━ 呼び出し番号 ━━\n");
    if view.calling.is_empty() {
        out.push_str("現在呼び出し番号はありません\n");
    } else {
        for order in &view.calling {
            out.push_str(&format!("・{}\n", order.id));
        }
    }

    print_frame(&out);
}

fn render_degraded(message: &str) {
    let mut out = String::new();
    out.push_str("\x1b[2J\x1b[H");
    out.push_str("━━ お待ち番号 ━━\n");
    out.push_str(message);
    out.push_str("\n\n━━ 呼び出し番号 ━━\n");
    out.push_str(message);
    out.push('\n');
    print_frame(&out);
}

fn print_frame(frame: &str) {
    let mut stdout = std::io::stdout();
    let _ = stdout.write_all(frame.as_bytes());
    let _ = stdout.flush();
}
