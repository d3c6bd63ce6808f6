//! Development server command
//!
//! Starts the application's own server. The debug and reload flags are
//! named after the configured default: a command that debugs by default
//! exposes `--no-debug`, one that does not exposes `--debug`.

use crate::{
    app::{Application, ServeOptions},
    cli::{
        args::ParsedArgs,
        command::Command,
        option::{CommandOption, OptionAction, ValueKind},
    },
    config::ServerConfig,
    error::{Result, ScriptError},
};
use std::collections::BTreeMap;
use tracing::{info, instrument};

/// Runs the application's development server
#[derive(Debug, Clone)]
pub struct Server {
    host: String,
    port: u16,
    use_debugger: bool,
    use_reloader: bool,
    threaded: bool,
    processes: u32,
    passthrough_errors: bool,
    server_options: BTreeMap<String, String>,
    extra_options: Vec<CommandOption>,
}

impl Default for Server {
    fn default() -> Self {
        Self::from_config(&ServerConfig::default())
    }
}

impl Server {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            use_debugger: config.use_debugger,
            use_reloader: config.use_reloader,
            threaded: config.threaded,
            processes: config.processes,
            passthrough_errors: config.passthrough_errors,
            server_options: BTreeMap::new(),
            extra_options: Vec::new(),
        }
    }

    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn use_debugger(mut self, enabled: bool) -> Self {
        self.use_debugger = enabled;
        self
    }

    #[must_use]
    pub fn use_reloader(mut self, enabled: bool) -> Self {
        self.use_reloader = enabled;
        self
    }

    #[must_use]
    pub fn threaded(mut self, enabled: bool) -> Self {
        self.threaded = enabled;
        self
    }

    #[must_use]
    pub fn processes(mut self, processes: u32) -> Self {
        self.processes = processes;
        self
    }

    #[must_use]
    pub fn passthrough_errors(mut self, enabled: bool) -> Self {
        self.passthrough_errors = enabled;
        self
    }

    /// Extra option forwarded verbatim to the serve entry point
    #[must_use]
    pub fn server_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.server_options.insert(key.into(), value.into());
        self
    }

    /// Add an option listed after the built-in server flags
    pub fn add_option(&mut self, option: CommandOption) {
        self.extra_options.push(option);
    }

    /// Resolve the parsed arguments into serve options for `app`
    pub fn serve_options(&self, app: &dyn Application, args: &ParsedArgs) -> Result<ServeOptions> {
        let port = args.require_integer("port")?;
        let port = u16::try_from(port)
            .map_err(|_| ScriptError::invalid_argument("port", format!("{port} is not a valid port")))?;

        let processes = args.require_integer("processes")?;
        let processes = u32::try_from(processes)
            .ok()
            .filter(|p| *p >= 1)
            .ok_or_else(|| {
                ScriptError::invalid_argument("processes", format!("{processes} must be at least 1"))
            })?;

        let use_debugger = args.flag("use_debugger")?;

        Ok(ServeOptions {
            host: args.require_string("host")?,
            port,
            debug: app.config().debug.unwrap_or(use_debugger),
            use_debugger,
            use_reloader: args.flag("use_reloader")?,
            threaded: args.flag("threaded")?,
            processes,
            passthrough_errors: args.flag("passthrough_errors")?,
            extra: self.server_options.clone(),
        })
    }
}

impl Command for Server {
    fn doc(&self) -> Option<&str> {
        Some("Runs the development server, i.e. the application's serve entry point.")
    }

    fn options(&self) -> Vec<CommandOption> {
        let mut options = vec![
            CommandOption::new(["-t", "--host"])
                .dest("host")
                .default_value(&self.host),
            CommandOption::new(["-p", "--port"])
                .dest("port")
                .kind(ValueKind::Integer)
                .default_value(self.port),
            CommandOption::new(["--threaded"])
                .dest("threaded")
                .action(OptionAction::StoreTrue)
                .default_value(self.threaded),
            CommandOption::new(["--processes"])
                .dest("processes")
                .kind(ValueKind::Integer)
                .default_value(self.processes),
            CommandOption::new(["--passthrough-errors"])
                .action(OptionAction::StoreTrue)
                .dest("passthrough_errors")
                .default_value(self.passthrough_errors),
        ];

        options.push(if self.use_debugger {
            CommandOption::new(["-d", "--no-debug"])
                .action(OptionAction::StoreFalse)
                .dest("use_debugger")
                .default_value(self.use_debugger)
        } else {
            CommandOption::new(["-d", "--debug"])
                .action(OptionAction::StoreTrue)
                .dest("use_debugger")
                .default_value(self.use_debugger)
        });

        options.push(if self.use_reloader {
            CommandOption::new(["-r", "--no-reload"])
                .action(OptionAction::StoreFalse)
                .dest("use_reloader")
                .default_value(self.use_reloader)
        } else {
            CommandOption::new(["-r", "--reload"])
                .action(OptionAction::StoreTrue)
                .dest("use_reloader")
                .default_value(self.use_reloader)
        });

        options.extend(self.extra_options.iter().cloned());
        options
    }

    // starting a server is not a single request, so no request context here
    #[instrument(skip_all, fields(app = app.name()))]
    fn handle(&self, app: &dyn Application, args: &ParsedArgs) -> Result<()> {
        let options = self.serve_options(app, args)?;
        info!(
            "Starting development server on {}:{} (debug={}, reloader={})",
            options.host, options.port, options.debug, options.use_reloader
        );
        app.serve(&options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{AppConfig, Route};
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct RecordingApp {
        config: AppConfig,
        served: RefCell<Option<ServeOptions>>,
        contexts: Cell<usize>,
    }

    impl Application for RecordingApp {
        fn name(&self) -> &str {
            "recording"
        }

        fn enter_request_context(&self) -> Result<()> {
            self.contexts.set(self.contexts.get() + 1);
            Ok(())
        }

        fn exit_request_context(&self) {}

        fn routes(&self) -> Vec<Route> {
            Vec::new()
        }

        fn config(&self) -> &AppConfig {
            &self.config
        }

        fn serve(&self, options: &ServeOptions) -> Result<()> {
            *self.served.borrow_mut() = Some(options.clone());
            Ok(())
        }
    }

    fn find<'a>(options: &'a [CommandOption], flag: &str) -> Option<&'a CommandOption> {
        options
            .iter()
            .find(|option| option.names().iter().any(|name| name == flag))
    }

    fn run(server: &Server, app: &RecordingApp, argv: &[&str]) -> ServeOptions {
        let matches = server.create_parser("runserver").try_get_matches_from(argv).unwrap();
        server.handle(app, &ParsedArgs::new(matches)).unwrap();
        app.served.borrow().clone().unwrap()
    }

    #[test]
    fn test_debug_default_on_exposes_no_debug() {
        let options = Server::new().use_debugger(true).options();

        let flag = find(&options, "--no-debug").unwrap();
        assert_eq!(flag.get_action(), OptionAction::StoreFalse);
        assert_eq!(flag.get_dest(), "use_debugger");
        assert_eq!(flag.names(), ["-d", "--no-debug"]);
        assert!(find(&options, "--debug").is_none());
    }

    #[test]
    fn test_debug_default_off_exposes_debug() {
        let options = Server::new().use_debugger(false).options();

        let flag = find(&options, "--debug").unwrap();
        assert_eq!(flag.get_action(), OptionAction::StoreTrue);
        assert_eq!(flag.get_dest(), "use_debugger");
        assert!(find(&options, "--no-debug").is_none());
    }

    #[test]
    fn test_reload_flag_follows_default() {
        let options = Server::new().use_reloader(true).options();
        assert_eq!(
            find(&options, "--no-reload").unwrap().get_action(),
            OptionAction::StoreFalse
        );
        assert!(find(&options, "--reload").is_none());

        let options = Server::new().use_reloader(false).options();
        assert_eq!(
            find(&options, "--reload").unwrap().get_action(),
            OptionAction::StoreTrue
        );
        assert!(find(&options, "--no-reload").is_none());
    }

    #[test]
    fn test_defaults_reach_serve() {
        let app = RecordingApp::default();
        let served = run(&Server::new(), &app, &["runserver"]);

        assert_eq!(served.host, "127.0.0.1");
        assert_eq!(served.port, 5000);
        assert!(served.debug);
        assert!(served.use_debugger);
        assert!(served.use_reloader);
        assert!(!served.threaded);
        assert_eq!(served.processes, 1);
        assert!(!served.passthrough_errors);
    }

    #[test]
    fn test_flags_flip_defaults() {
        let app = RecordingApp::default();
        let served = run(
            &Server::new(),
            &app,
            &["runserver", "-t", "0.0.0.0", "-p", "8080", "--threaded", "-d", "-r"],
        );

        assert_eq!(served.host, "0.0.0.0");
        assert_eq!(served.port, 8080);
        assert!(!served.use_debugger);
        assert!(!served.debug);
        assert!(!served.use_reloader);
        assert!(served.threaded);

        let server = Server::new().use_debugger(false).use_reloader(false);
        let served = run(&server, &app, &["runserver", "--debug", "--reload"]);
        assert!(served.use_debugger);
        assert!(served.use_reloader);
    }

    #[test]
    fn test_app_debug_config_overrides_debugger() {
        let app = RecordingApp {
            config: AppConfig {
                debug: Some(false),
                ..AppConfig::default()
            },
            ..RecordingApp::default()
        };
        let served = run(&Server::new(), &app, &["runserver"]);

        assert!(!served.debug);
        assert!(served.use_debugger);
    }

    #[test]
    fn test_handle_skips_request_context() {
        let app = RecordingApp::default();
        run(&Server::new(), &app, &["runserver"]);
        assert_eq!(app.contexts.get(), 0);
    }

    #[test]
    fn test_server_options_forwarded() {
        let app = RecordingApp::default();
        let server = Server::new().server_option("ssl_context", "adhoc");
        let served = run(&server, &app, &["runserver"]);
        assert_eq!(served.extra.get("ssl_context").map(String::as_str), Some("adhoc"));
    }

    #[test]
    fn test_added_option_parsed_after_builtins() {
        let mut server = Server::new();
        server.add_option(CommandOption::new(["--cert"]).dest("cert"));
        server.add_option(CommandOption::new(["-p", "--profile"]).action(OptionAction::StoreTrue));

        let options = server.options();
        assert_eq!(options.last().unwrap().get_dest(), "profile");

        let matches = server
            .create_parser("runserver")
            .try_get_matches_from(["runserver", "--cert", "dev.pem", "-p", "7000"])
            .unwrap();
        let args = ParsedArgs::new(matches);
        assert_eq!(args.require_string("cert").unwrap(), "dev.pem");
        assert_eq!(args.require_integer("port").unwrap(), 7000);
        assert!(!args.contains("profile"));
        assert!(Server::new().options().iter().all(|o| o.get_dest() != "cert"));
    }

    #[test]
    fn test_invalid_port_rejected() {
        let app = RecordingApp::default();
        let server = Server::new();
        let matches = server
            .create_parser("runserver")
            .try_get_matches_from(["runserver", "--port", "70000"])
            .unwrap();
        let result = server.handle(&app, &ParsedArgs::new(matches));
        assert!(matches!(result, Err(ScriptError::InvalidArgument { .. })));
        assert!(app.served.borrow().is_none());
    }
}
