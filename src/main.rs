//! Dashboard forwarding proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                   ┌──────────────────────────────────────────────────────┐
//!                   │                  FORWARDING PROXY                    │
//!                   │                                                      │
//!  Widget request   │  ┌─────────┐   ┌──────────┐   ┌──────────────────┐   │
//!  ─────────────────┼─▶│  http   │──▶│ routing  │──▶│ security         │   │
//!  X-Proxy-Target   │  │ server  │   │ target   │   │ allow-list+auth  │   │
//!  X-Proxy-API-Key  │  └────┬────┘   └──────────┘   └────────┬─────────┘   │
//!                   │       │ OPTIONS                         ▼             │
//!                   │       │ (local)                ┌──────────────────┐   │
//!  Widget response  │  ┌────▼────┐                   │ http client      │   │
//!  ◀────────────────┼──│response │◀──────────────────│ deadline+retries │◀──┼── Target API
//!  + CORS           │  │ relay   │                   └──────────────────┘   │
//!                   │  └─────────┘                                          │
//!                   │  config · observability · resilience · lifecycle     │
//!                   └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use dashboard_proxy::lifecycle::startup::{self, StartupOptions};

#[derive(Parser)]
#[command(name = "dashboard-proxy")]
#[command(about = "Forwarding proxy for dashboard widgets", long_about = None)]
struct Cli {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reload the config file when it changes.
    #[arg(short, long, requires = "config")]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    startup::run(StartupOptions {
        config_path: cli.config,
        watch: cli.watch,
    })
    .await?;

    Ok(())
}
