mod config;
mod error;

use clap::{Parser, Subcommand};
use config::ServeArgs;

mod cmd;

/// Log stream server: HTTP ingestion and query, live WebSocket fan-out.
#[derive(Parser)]
#[command(name = "logcast-server", version, about = "Приём логов, хранение и live-трансляция подписчикам")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Запустить сервер
    Serve(ServeArgs),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "logcast-server starting");

    let result = match cli.command {
        Commands::Serve(args) => cmd::serve::run(args).await,
    };
    if let Err(e) = result {
        tracing::error!(error = %e, "logcast-server failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
