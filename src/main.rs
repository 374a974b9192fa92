//! anf-dual - Azure NetApp Files dual-protocol sample
//!
//! Provisions an account, capacity pool and SMB/NFSv3 volume through Azure
//! Resource Manager and optionally cleans them up again.

use anf_dual::cli::Cli;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Parse command-line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.debug_enabled().await);

    info!("Starting anf-dual");

    // Execute the command
    if let Err(e) = cli.execute().await {
        error!("Error: {}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(debug: bool) {
    let default_filter = if debug { "anf_dual=debug" } else { "anf_dual=warn" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
