#![cfg_attr(not(test), warn(unused_crate_dependencies))]

use clap::Parser;
use eyre::config::HookBuilder;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

mod cli;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    dotenvy::dotenv().ok();

    HookBuilder::default()
        .theme(eyre::config::Theme::new())
        .install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    Cli::parse().run().await
}
