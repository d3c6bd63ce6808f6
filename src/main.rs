#![allow(clippy::cargo_common_metadata)]
use anyhow::{Context, Result};
use appscript::{
    app::StaticApp,
    cli::Manager,
    config::Config,
    core::{Clean, ShowUrls},
    setup_logging,
};

fn main() -> Result<()> {
    // Environment overrides for the built-in commands
    let config = Config::from_env().context("Invalid APPSCRIPT_* configuration")?;

    setup_logging(config.debug)?;

    let manager = Manager::new(StaticApp::demo())
        .with_description("Management commands for the demo application")
        .with_default_commands(&config)
        .command("clean", Clean::new(config.clean.pattern.clone()))
        .command("urls", ShowUrls::new(config.route_order()?));

    manager.run().context("Command failed")
}
