//! 呼出キュー制御ツール
//!
//! One mutation per invocation over the shared queue file. Every operation
//! prints a human-readable confirmation and appends one audit line; a failed
//! precondition prints an `[ERROR]` line and logs at error level instead of
//! propagating - the process exits cleanly either way, and the queue file is
//! never left partially written.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use yobidashi_core::audit::AuditLog;
use yobidashi_core::config::Config;
use yobidashi_core::registry::OrderRegistry;
use yobidashi_core::store::QueueStore;
use yobidashi_core::{OrderStatus, QueueError};

#[derive(Debug, Parser)]
#[command(name = "yobidashi-control", about = "呼出キュー制御ツール")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// 受付を登録する (ステータス: 受付済み)
    Register {
        /// 任意の注文番号。省略時は自動採番
        #[arg(long = "order-id")]
        order_id: Option<String>,
    },
    /// 調理開始 (ステータスを仕掛中へ)
    Start {
        /// 対象注文ID
        order_id: String,
    },
    /// 調理完了 (ステータスを完了へ)
    Finish {
        /// 対象注文ID
        order_id: String,
    },
    /// お渡し (完了ステータスの注文を削除)
    Handoff {
        /// 対象注文ID。省略時は最古の完了注文
        #[arg(long = "order-id")]
        order_id: Option<String>,
    },
    /// キャンセル (ステータスに関係なく削除)
    Cancel {
        /// キャンセルする注文ID
        order_id: String,
    },
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();
    let audit = AuditLog::new(&config.log_dir, "control_queue");
    let registry = OrderRegistry::new(QueueStore::new(&config.queue_path));

    match execute(&cli.command, &registry) {
        Ok(message) => {
            println!("{message}");
            audit.info(&message);
        }
        Err(err) => {
            // Reported, non-fatal: the caller's caller reads the line, not
            // an exit status.
            let message = format!("[ERROR] {err}");
            println!("{message}");
            audit.error(&message);
        }
    }

    Ok(())
}

fn execute(command: &Commands, registry: &OrderRegistry) -> Result<String, QueueError> {
    match command {
        Commands::Register { order_id } => {
            let order = registry.register(order_id.as_deref())?;
            Ok(format!("[REGISTER] {} を受付済みで追加しました", order.id))
        }
        Commands::Start { order_id } => {
            let order = registry.advance(order_id, OrderStatus::InProgress)?;
            Ok(format!("[START] {} を仕掛中に変更しました", order.id))
        }
        Commands::Finish { order_id } => {
            let order = registry.advance(order_id, OrderStatus::Done)?;
            Ok(format!("[FINISH] {} を完了に変更しました", order.id))
        }
        Commands::Handoff { order_id } => {
            let order = registry.remove(order_id.as_deref(), Some(OrderStatus::Done))?;
            Ok(format!(
                "[HANDOFF] {} をキューから削除しました (お渡し)",
                order.id
            ))
        }
        Commands::Cancel { order_id } => {
            let order = registry.remove(Some(order_id), None)?;
            Ok(format!("[CANCEL] {} をキャンセルしました", order.id))
        }
    }
}
