//! Built-in management commands
//!
//! Contains the interactive shell, the development server runner, the
//! compiled-file cleaner and the route lister.

pub mod clean;
pub mod server;
pub mod shell;
pub mod show_urls;

pub use clean::Clean;
pub use server::Server;
pub use shell::{BasicRepl, ExternalShell, Shell, ShellContext, ShellLaunch, ShellProvider};
pub use show_urls::{RouteOrder, ShowUrls};
