//! The command contract
//!
//! A [`Command`] declares its options, builds a parser from them and runs
//! against the application. The default [`Command::handle`] wraps
//! [`Command::run`] in a request context.

use crate::{
    app::{Application, RequestContext},
    cli::{args::ParsedArgs, option::CommandOption, prompt},
    error::{Result, ScriptError},
};
use std::collections::HashSet;
use tracing::{debug, warn};

/// A named operation exposed through the management entry point
pub trait Command {
    /// Documentation text the description is derived from
    fn doc(&self) -> Option<&str> {
        None
    }

    /// Documentation text with surrounding whitespace removed
    fn description(&self) -> String {
        self.doc().map(str::trim).unwrap_or_default().to_string()
    }

    /// Options exposed on the command line, in declaration order
    fn options(&self) -> Vec<CommandOption> {
        Vec::new()
    }

    /// Build the argument parser for this command
    fn create_parser(&self, prog: &str) -> clap::Command {
        build_parser(prog, &self.description(), self.options())
    }

    /// Run inside a request context bound to `app`.
    ///
    /// The context is released on every exit path, including errors.
    fn handle(&self, app: &dyn Application, args: &ParsedArgs) -> Result<()> {
        let _context = RequestContext::enter(app)?;
        self.run(app, args)
    }

    /// Command body; every concrete command overrides this
    fn run(&self, _app: &dyn Application, _args: &ParsedArgs) -> Result<()> {
        Err(ScriptError::not_implemented(std::any::type_name::<Self>()))
    }

    #[deprecated(note = "use cli::prompt::prompt instead")]
    fn prompt(&self, name: &str, default: Option<&str>) -> Result<String> {
        warn!("Command::prompt is deprecated, use prompt() function instead");
        prompt::prompt(name, default)
    }

    #[deprecated(note = "use cli::prompt::prompt_pass instead")]
    fn prompt_pass(&self, name: &str, default: Option<&str>) -> Result<String> {
        warn!("Command::prompt_pass is deprecated, use prompt_pass() function instead");
        prompt::prompt_pass(name, default)
    }

    #[deprecated(note = "use cli::prompt::prompt_bool instead")]
    fn prompt_bool(&self, name: &str, default: bool) -> Result<bool> {
        warn!("Command::prompt_bool is deprecated, use prompt_bool() function instead");
        prompt::prompt_bool(name, default)
    }

    #[deprecated(note = "use cli::prompt::prompt_choices instead")]
    fn prompt_choices(&self, name: &str, choices: &[&str], default: Option<&str>) -> Result<String> {
        warn!("Command::prompt_choices is deprecated, use prompt_choices() function instead");
        prompt::prompt_choices(name, choices, default)
    }
}

/// Build a parser from option descriptors.
///
/// Options are added in order. An option whose destination, long flag or
/// short flag is already taken by an earlier option is skipped.
pub fn build_parser(prog: &str, description: &str, options: Vec<CommandOption>) -> clap::Command {
    let mut parser = clap::Command::new(prog.to_string());
    if !description.is_empty() {
        parser = parser.about(description.to_string());
    }

    let mut dests = HashSet::new();
    let mut longs = HashSet::new();
    let mut shorts = HashSet::new();
    for option in options {
        let dest = option.get_dest();
        let clashes = dests.contains(&dest)
            || option.long_flags().any(|long| longs.contains(long))
            || option.short_flags().any(|short| shorts.contains(&short));
        if clashes {
            debug!("Skipping option {:?} of {}: name already declared", option.names(), prog);
            continue;
        }

        longs.extend(option.long_flags().map(str::to_string));
        shorts.extend(option.short_flags());
        dests.insert(dest);
        parser = parser.arg(option.to_arg());
    }

    parser
}

type Handler = dyn Fn(&dyn Application, &ParsedArgs) -> Result<()>;

/// A command backed by a closure, with its own option list
pub struct FnCommand {
    doc: Option<String>,
    options: Vec<CommandOption>,
    handler: Box<Handler>,
}

impl FnCommand {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&dyn Application, &ParsedArgs) -> Result<()> + 'static,
    {
        Self {
            doc: None,
            options: Vec::new(),
            handler: Box::new(handler),
        }
    }

    #[must_use]
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    #[must_use]
    pub fn with_option(mut self, option: CommandOption) -> Self {
        self.add_option(option);
        self
    }

    /// Append an option to this instance's list
    pub fn add_option(&mut self, option: CommandOption) {
        self.options.push(option);
    }
}

impl std::fmt::Debug for FnCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnCommand")
            .field("doc", &self.doc)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Command for FnCommand {
    fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    fn options(&self) -> Vec<CommandOption> {
        self.options.clone()
    }

    fn run(&self, app: &dyn Application, args: &ParsedArgs) -> Result<()> {
        (self.handler)(app, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        app::{AppConfig, Route, ServeOptions, StaticApp},
        cli::option::{OptionAction, ValueKind},
    };
    use std::{cell::Cell, io::Write, process::Stdio};

    #[derive(Default)]
    struct CountingApp {
        config: AppConfig,
        entered: Cell<usize>,
        exited: Cell<usize>,
    }

    impl Application for CountingApp {
        fn name(&self) -> &str {
            "counting"
        }

        fn enter_request_context(&self) -> Result<()> {
            self.entered.set(self.entered.get() + 1);
            Ok(())
        }

        fn exit_request_context(&self) {
            self.exited.set(self.exited.get() + 1);
        }

        fn routes(&self) -> Vec<Route> {
            Vec::new()
        }

        fn config(&self) -> &AppConfig {
            &self.config
        }

        fn serve(&self, _options: &ServeOptions) -> Result<()> {
            Ok(())
        }
    }

    struct Documented;

    impl Command for Documented {
        fn doc(&self) -> Option<&str> {
            Some("\n    Says hello to the world.\n   ")
        }
    }

    struct Undocumented;

    impl Command for Undocumented {}

    fn parse(command: &dyn Command, argv: &[&str]) -> std::result::Result<ParsedArgs, clap::Error> {
        command
            .create_parser("test")
            .try_get_matches_from(argv)
            .map(ParsedArgs::new)
    }

    #[test]
    fn test_description_is_trimmed_doc() {
        assert_eq!(Documented.description(), "Says hello to the world.");
        assert_eq!(Undocumented.description(), "");
    }

    #[test]
    fn test_parser_carries_description() {
        let parser = Documented.create_parser("hello");
        assert_eq!(parser.get_name(), "hello");
        assert_eq!(
            parser.get_about().map(ToString::to_string).as_deref(),
            Some("Says hello to the world.")
        );
    }

    #[test]
    fn test_run_without_override_is_not_implemented() {
        let app = CountingApp::default();
        let result = Undocumented.run(&app, &ParsedArgs::default());
        assert!(matches!(result, Err(ScriptError::NotImplemented { .. })));
    }

    #[test]
    fn test_parser_accepts_declared_flags_only() {
        let command = FnCommand::new(|_, _| Ok(()))
            .with_option(CommandOption::new(["-n", "--name"]).default_value("world"))
            .with_option(
                CommandOption::new(["--times"])
                    .kind(ValueKind::Integer)
                    .default_value(1),
            );

        let args = parse(&command, &["test", "-n", "rust", "--times", "3"]).unwrap();
        assert_eq!(args.require_string("name").unwrap(), "rust");
        assert_eq!(args.require_integer("times").unwrap(), 3);

        assert!(parse(&command, &["test", "--loud"]).is_err());
    }

    #[test]
    fn test_parser_keeps_declaration_order() {
        let command = FnCommand::new(|_, _| Ok(()))
            .with_option(CommandOption::new(["--zeta"]))
            .with_option(CommandOption::new(["--alpha"]))
            .with_option(CommandOption::new(["--mid"]));

        let parser = command.create_parser("test");
        let ids: Vec<_> = parser.get_arguments().map(|a| a.get_id().to_string()).collect();
        assert_eq!(ids, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_first_declared_option_wins_on_collision() {
        let command = FnCommand::new(|_, _| Ok(()))
            .with_option(CommandOption::new(["-o", "--order"]).default_value("rule"))
            .with_option(CommandOption::new(["--order"]).default_value("endpoint"))
            .with_option(
                CommandOption::new(["-o", "--output"])
                    .action(OptionAction::StoreTrue),
            );

        let parser = command.create_parser("test");
        assert_eq!(parser.get_arguments().count(), 1);

        let args = parse(&command, &["test"]).unwrap();
        assert_eq!(args.require_string("order").unwrap(), "rule");
        assert!(parse(&command, &["test", "--output"]).is_err());
    }

    #[test]
    fn test_add_option_is_per_instance() {
        let mut first = FnCommand::new(|_, _| Ok(()));
        let second = FnCommand::new(|_, _| Ok(()));
        first.add_option(CommandOption::new(["--extra"]));

        assert_eq!(first.options().len(), 1);
        assert!(second.options().is_empty());
    }

    #[test]
    fn test_handle_balances_context_on_success() {
        let app = CountingApp::default();
        let command = FnCommand::new(|app, _| {
            assert_eq!(app.name(), "counting");
            Ok(())
        });

        command.handle(&app, &ParsedArgs::default()).unwrap();
        assert_eq!(app.entered.get(), 1);
        assert_eq!(app.exited.get(), 1);
    }

    #[test]
    fn test_handle_balances_context_on_error() {
        let app = CountingApp::default();
        let command =
            FnCommand::new(|_, _| Err(ScriptError::invalid_command("refusing to run")));

        let result = command.handle(&app, &ParsedArgs::default());
        assert!(matches!(result, Err(ScriptError::InvalidCommand { .. })));
        assert_eq!(app.entered.get(), 1);
        assert_eq!(app.exited.get(), 1);
    }

    #[test]
    fn test_handle_balances_context_on_panic() {
        let app = CountingApp::default();
        let command = FnCommand::new(|_, _| panic!("command blew up"));

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            command.handle(&app, &ParsedArgs::default())
        }));

        assert!(result.is_err());
        assert_eq!(app.entered.get(), 1);
        assert_eq!(app.exited.get(), 1);
    }

    const PROMPT_CHILD_ENV: &str = "APPSCRIPT_PROMPT_CHILD";

    // the helpers read the process stdin, so the assertions run in a child
    // copy of this test binary with a piped stdin
    #[test]
    #[allow(deprecated)]
    fn test_deprecated_prompt_helpers_read_stdin() {
        if std::env::var_os(PROMPT_CHILD_ENV).is_some() {
            let command = Undocumented;
            assert_eq!(command.prompt("Name", None).unwrap(), "bob");
            assert_eq!(command.prompt_pass("Password", Some("s3cret")).unwrap(), "s3cret");
            assert!(command.prompt_bool("Sure", false).unwrap());
            assert_eq!(
                command.prompt_choices("Color", &["red", "green"], None).unwrap(),
                "green"
            );
            assert!(matches!(
                command.prompt("Extra", None),
                Err(ScriptError::Prompt { .. })
            ));
            return;
        }

        let mut child = std::process::Command::new(std::env::current_exe().unwrap())
            .args([
                "cli::command::tests::test_deprecated_prompt_helpers_read_stdin",
                "--exact",
                "--nocapture",
            ])
            .env(PROMPT_CHILD_ENV, "1")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .unwrap();
        child
            .stdin
            .take()
            .unwrap()
            .write_all(b"bob\n\ny\nGREEN\n")
            .unwrap();
        let output = child.wait_with_output().unwrap();

        assert!(
            output.status.success(),
            "{}",
            String::from_utf8_lossy(&output.stderr)
        );
        let stdout = String::from_utf8(output.stdout).unwrap();
        assert!(stdout.contains("Name: "));
        assert!(stdout.contains("Password: "));
        assert!(stdout.contains("Sure [y/N]: "));
        assert!(stdout.contains("Color - (red, green): "));
        assert!(!stdout.contains("s3cret"));
        assert!(stdout.contains("1 passed"));
    }

    struct DepthRecorder<'a> {
        app: &'a StaticApp,
        seen: Cell<usize>,
    }

    impl Command for DepthRecorder<'_> {
        fn run(&self, _app: &dyn Application, _args: &ParsedArgs) -> Result<()> {
            self.seen.set(self.app.context_depth());
            Ok(())
        }
    }

    #[test]
    fn test_run_executes_inside_context() {
        let app = StaticApp::new("static");
        let recorder = DepthRecorder {
            app: &app,
            seen: Cell::new(0),
        };

        recorder.handle(&app, &ParsedArgs::default()).unwrap();
        assert_eq!(recorder.seen.get(), 1);
        assert_eq!(app.context_depth(), 0);
    }
}
