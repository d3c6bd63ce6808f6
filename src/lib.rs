//! # appscript
//!
//! Management commands for web applications. An application registers
//! named subcommands that are exposed through a single command-line entry
//! point; each command declares its own options and receives the
//! application as context.
//!
//! ## Features
//!
//! - Declarative option descriptors mapped onto clap
//! - Request-context scoping around every command run
//! - Built-in `shell`, `runserver`, `clean` and `urls` commands
//! - Closure-backed commands for quick application tasks
//!
//! ## Example
//!
//! ```no_run
//! use appscript::{app::StaticApp, cli::Manager, config::Config, core::ShowUrls};
//!
//! let manager = Manager::new(StaticApp::demo())
//!     .with_default_commands(&Config::default())
//!     .command("urls", ShowUrls::default());
//! manager.run_from(["manage", "urls"])?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod app;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod utils;

use anyhow::Result;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging with appropriate verbosity
pub fn setup_logging(debug: bool) -> Result<()> {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true)
                .compact(),
        )
        .with(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
