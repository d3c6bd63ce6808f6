//! Configuration management for the management commands
//!
//! Centralizes the defaults of the built-in commands, environment
//! overrides and validation.

use crate::{core::RouteOrder, error::ScriptError};
use serde::{Deserialize, Serialize};
use std::{env, str::FromStr};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Enable debug logging
    pub debug: bool,
    /// Development server defaults
    pub server: ServerConfig,
    /// Interactive shell defaults
    pub shell: ShellConfig,
    /// Cleanup defaults
    pub clean: CleanConfig,
    /// Route listing defaults
    pub urls: UrlsConfig,
}

/// Development server defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// When true the command exposes `--no-debug`, otherwise `--debug`
    pub use_debugger: bool,
    /// When true the command exposes `--no-reload`, otherwise `--reload`
    pub use_reloader: bool,
    pub threaded: bool,
    pub processes: u32,
    pub passthrough_errors: bool,
}

/// Interactive shell defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShellConfig {
    /// Text printed when the shell starts
    pub banner: String,
    pub use_ipython: bool,
    pub use_bpython: bool,
}

/// Cleanup defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanConfig {
    /// Substring of file names to delete
    pub pattern: String,
}

/// Route listing defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlsConfig {
    /// Route attribute to order by
    pub order: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            use_debugger: true,
            use_reloader: true,
            threaded: false,
            processes: 1,
            passthrough_errors: false,
        }
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            banner: String::new(),
            use_ipython: true,
            use_bpython: false,
        }
    }
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            pattern: crate::core::clean::DEFAULT_PATTERN.to_string(),
        }
    }
}

impl Default for UrlsConfig {
    fn default() -> Self {
        Self {
            order: RouteOrder::default().as_str().to_string(),
        }
    }
}

impl Config {
    /// Create configuration from `APPSCRIPT_*` environment variables
    pub fn from_env() -> Result<Self, ScriptError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ScriptError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(debug) = parse_var::<Flag, _>(&lookup, "APPSCRIPT_DEBUG")? {
            config.debug = debug.0;
        }

        if let Some(host) = lookup("APPSCRIPT_HOST") {
            config.server.host = host;
        }
        if let Some(port) = parse_var(&lookup, "APPSCRIPT_PORT")? {
            config.server.port = port;
        }
        if let Some(processes) = parse_var(&lookup, "APPSCRIPT_PROCESSES")? {
            config.server.processes = processes;
        }
        if let Some(threaded) = parse_var::<Flag, _>(&lookup, "APPSCRIPT_THREADED")? {
            config.server.threaded = threaded.0;
        }
        if let Some(enabled) = parse_var::<Flag, _>(&lookup, "APPSCRIPT_USE_DEBUGGER")? {
            config.server.use_debugger = enabled.0;
        }
        if let Some(enabled) = parse_var::<Flag, _>(&lookup, "APPSCRIPT_USE_RELOADER")? {
            config.server.use_reloader = enabled.0;
        }

        if let Some(banner) = lookup("APPSCRIPT_BANNER") {
            config.shell.banner = banner;
        }
        if let Some(enabled) = parse_var::<Flag, _>(&lookup, "APPSCRIPT_USE_IPYTHON")? {
            config.shell.use_ipython = enabled.0;
        }
        if let Some(enabled) = parse_var::<Flag, _>(&lookup, "APPSCRIPT_USE_BPYTHON")? {
            config.shell.use_bpython = enabled.0;
        }
        if let Some(pattern) = lookup("APPSCRIPT_CLEAN_PATTERN") {
            config.clean.pattern = pattern;
        }
        if let Some(order) = lookup("APPSCRIPT_URLS_ORDER") {
            config.urls.order = order;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ScriptError> {
        if self.server.port == 0 {
            return Err(ScriptError::config("server port must not be 0"));
        }

        if self.server.processes == 0 {
            return Err(ScriptError::config("server processes must be at least 1"));
        }

        if self.server.threaded && self.server.processes > 1 {
            return Err(ScriptError::config(
                "a threaded server cannot also run multiple processes",
            ));
        }

        if self.clean.pattern.is_empty() {
            return Err(ScriptError::config("clean pattern must not be empty"));
        }

        self.route_order()?;
        Ok(())
    }

    /// Configured route order
    pub fn route_order(&self) -> Result<RouteOrder, ScriptError> {
        self.urls.order.parse()
    }
}

/// Boolean environment value (`1/true/yes/on`, `0/false/no/off`)
struct Flag(bool);

impl FromStr for Flag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Self(true)),
            "0" | "false" | "no" | "off" | "" => Ok(Self(false)),
            other => Err(format!("expected a boolean, got `{other}`")),
        }
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ScriptError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| ScriptError::config(format!("{key}: {e}")))
        })
        .transpose()
}
