mod cmd;
mod config;
mod execution;

use clap::{Parser, Subcommand};
use std::future::Future;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[clap(author, version, about = "a block builder for the builder API", long_about = None)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Build(cmd::build::Command),
    Config(cmd::config::Command),
}

fn setup_logging() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn run_task(task: impl Future<Output = eyre::Result<()>>) -> eyre::Result<()> {
    setup_logging();

    // impl #[tokio::main]
    tokio::runtime::Builder::new_multi_thread().enable_all().build()?.block_on(task)
}

fn run_task_until_signal(task: impl Future<Output = eyre::Result<()>>) -> eyre::Result<()> {
    run_task(async move {
        tokio::select! {
            task = task => task,
            _ = signal::ctrl_c() => {
                tracing::info!("shutting down...");
                Ok(())
            }
        }
    })
}

fn main() -> eyre::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        // stops its services itself on ctrl-c
        Commands::Build(cmd) => run_task(cmd.execute()),
        Commands::Config(cmd) => run_task_until_signal(cmd.execute()),
    }
}
