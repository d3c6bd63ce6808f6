//! Interactive shell command
//!
//! Tries the configured alternate shells in priority order and falls back
//! to a line-based REPL over the shell context.

use crate::{
    app::Application,
    cli::{
        args::ParsedArgs,
        command::Command,
        option::{CommandOption, OptionAction},
    },
    config::ShellConfig,
    error::{Result, ScriptError},
    utils::process::ProcessRunner,
};
use std::{
    collections::BTreeMap,
    io::{self, BufRead, Write},
};
use tracing::{debug, info, instrument};

/// Names made available inside the shell
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellContext {
    vars: BTreeMap<String, String>,
}

impl ShellContext {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Outcome of trying to start an alternate shell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellLaunch {
    /// The shell started; its exit status does not matter
    Launched,
    /// The shell is not installed or could not be started
    Unavailable,
}

/// An alternate interactive shell
pub trait ShellProvider {
    fn name(&self) -> &str;

    /// Start the shell; never fails, reports [`ShellLaunch::Unavailable`] instead
    fn launch(&self, banner: &str, context: &ShellContext) -> ShellLaunch;
}

/// Shell provided by an external program found on `PATH`.
///
/// The context is exported as `APPSCRIPT_<NAME>` environment variables.
#[derive(Debug)]
pub struct ExternalShell {
    program: String,
    args: Vec<String>,
    runner: ProcessRunner,
}

impl ExternalShell {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            runner: ProcessRunner::default(),
        }
    }

    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    fn env_vars(banner: &str, context: &ShellContext) -> Vec<(String, String)> {
        let mut vars: Vec<_> = context
            .iter()
            .map(|(name, value)| {
                (
                    format!("APPSCRIPT_{}", name.to_uppercase().replace('-', "_")),
                    value.to_string(),
                )
            })
            .collect();
        vars.push(("APPSCRIPT_BANNER".to_string(), banner.to_string()));
        vars
    }
}

impl ShellProvider for ExternalShell {
    fn name(&self) -> &str {
        &self.program
    }

    fn launch(&self, banner: &str, context: &ShellContext) -> ShellLaunch {
        if !self.runner.command_exists(&self.program) {
            return ShellLaunch::Unavailable;
        }

        let args: Vec<&str> = self.args.iter().map(String::as_str).collect();
        match self
            .runner
            .run_command_with_env(&self.program, &args, &Self::env_vars(banner, context))
        {
            Ok(()) => ShellLaunch::Launched,
            Err(ScriptError::Process {
                exit_code: None,
                source: Some(_),
                ..
            }) => {
                debug!("{} could not be started", self.program);
                ShellLaunch::Unavailable
            }
            Err(e) => {
                debug!("{} exited unsuccessfully: {}", self.program, e);
                ShellLaunch::Launched
            }
        }
    }
}

/// Baseline line-oriented interpreter over a [`ShellContext`]
#[derive(Debug)]
pub struct BasicRepl<'a> {
    banner: &'a str,
    context: &'a ShellContext,
}

impl<'a> BasicRepl<'a> {
    pub fn new(banner: &'a str, context: &'a ShellContext) -> Self {
        Self { banner, context }
    }

    /// Read commands until EOF, `exit` or `quit`
    pub fn interact<R: BufRead, W: Write>(&self, input: &mut R, output: &mut W) -> Result<()> {
        if !self.banner.is_empty() {
            writeln!(output, "{}", self.banner)?;
        }
        self.list_names(output)?;

        let mut line = String::new();
        loop {
            write!(output, ">>> ")?;
            output.flush()?;

            line.clear();
            if input.read_line(&mut line)? == 0 {
                writeln!(output)?;
                break;
            }

            match line.trim() {
                "" => {}
                "exit" | "quit" => break,
                "help" => self.list_names(output)?,
                name => match self.context.get(name) {
                    Some(value) => writeln!(output, "{value}")?,
                    None => writeln!(output, "unknown name: {name}")?,
                },
            }
        }

        Ok(())
    }

    fn list_names<W: Write>(&self, output: &mut W) -> Result<()> {
        let names: Vec<_> = self.context.names().collect();
        writeln!(output, "Available names: {}", names.join(", "))?;
        Ok(())
    }
}

type ContextFactory = dyn Fn(&dyn Application) -> ShellContext;

/// Runs an interactive shell inside the application context
pub struct Shell {
    banner: String,
    make_context: Box<ContextFactory>,
    use_ipython: bool,
    use_bpython: bool,
    ipython: Box<dyn ShellProvider>,
    bpython: Box<dyn ShellProvider>,
    extra_options: Vec<CommandOption>,
}

impl Default for Shell {
    fn default() -> Self {
        Self::new()
    }
}

impl Shell {
    pub fn new() -> Self {
        Self {
            banner: String::new(),
            make_context: Box::new(|app: &dyn Application| {
                ShellContext::new().with("app", app.name())
            }),
            use_ipython: true,
            use_bpython: false,
            ipython: Box::new(ExternalShell::new("ipython")),
            bpython: Box::new(ExternalShell::new("bpython")),
            extra_options: Vec::new(),
        }
    }

    pub fn from_config(config: &ShellConfig) -> Self {
        Self::new()
            .banner(config.banner.clone())
            .use_ipython(config.use_ipython)
            .use_bpython(config.use_bpython)
    }

    #[must_use]
    pub fn banner(mut self, banner: impl Into<String>) -> Self {
        self.banner = banner.into();
        self
    }

    /// Replace the factory producing the shell namespace
    #[must_use]
    pub fn make_context<F>(mut self, factory: F) -> Self
    where
        F: Fn(&dyn Application) -> ShellContext + 'static,
    {
        self.make_context = Box::new(factory);
        self
    }

    #[must_use]
    pub fn use_ipython(mut self, enabled: bool) -> Self {
        self.use_ipython = enabled;
        self
    }

    #[must_use]
    pub fn use_bpython(mut self, enabled: bool) -> Self {
        self.use_bpython = enabled;
        self
    }

    /// Replace the provider tried when IPython is preferred
    #[must_use]
    pub fn ipython_provider(mut self, provider: impl ShellProvider + 'static) -> Self {
        self.ipython = Box::new(provider);
        self
    }

    /// Replace the provider tried when BPython is requested
    #[must_use]
    pub fn bpython_provider(mut self, provider: impl ShellProvider + 'static) -> Self {
        self.bpython = Box::new(provider);
        self
    }

    /// Add an option listed after the shell flags
    pub fn add_option(&mut self, option: CommandOption) {
        self.extra_options.push(option);
    }

    /// Shell namespace for `app`
    pub fn context(&self, app: &dyn Application) -> ShellContext {
        (self.make_context)(app)
    }

    /// Providers to try, highest priority first
    fn providers(&self, bpython: bool, no_ipython: bool) -> Vec<&dyn ShellProvider> {
        if bpython {
            vec![self.bpython.as_ref()]
        } else if !no_ipython {
            vec![self.ipython.as_ref()]
        } else {
            Vec::new()
        }
    }

    /// Run against explicit streams for the baseline REPL
    pub fn run_with<R: BufRead, W: Write>(
        &self,
        app: &dyn Application,
        bpython: bool,
        no_ipython: bool,
        input: &mut R,
        output: &mut W,
    ) -> Result<()> {
        let context = self.context(app);

        for provider in self.providers(bpython, no_ipython) {
            match provider.launch(&self.banner, &context) {
                ShellLaunch::Launched => {
                    info!("{} shell exited", provider.name());
                    return Ok(());
                }
                ShellLaunch::Unavailable => {
                    debug!("{} shell unavailable, falling back", provider.name());
                }
            }
        }

        BasicRepl::new(&self.banner, &context).interact(input, output)
    }
}

impl Command for Shell {
    fn doc(&self) -> Option<&str> {
        Some("Runs an interactive shell inside the application context.")
    }

    fn options(&self) -> Vec<CommandOption> {
        let mut options = vec![
            CommandOption::new(["--no-ipython"])
                .action(OptionAction::StoreTrue)
                .dest("no_ipython")
                .default_value(!self.use_ipython)
                .help("Do not use the IPython shell"),
            CommandOption::new(["--bpython"])
                .action(OptionAction::StoreTrue)
                .dest("bpython")
                .default_value(!self.use_bpython)
                .help("Use the BPython shell if available"),
        ];
        options.extend(self.extra_options.iter().cloned());
        options
    }

    #[instrument(skip_all, fields(app = app.name()))]
    fn run(&self, app: &dyn Application, args: &ParsedArgs) -> Result<()> {
        let bpython = args.flag("bpython")?;
        let no_ipython = args.flag("no_ipython")?;
        self.run_with(
            app,
            bpython,
            no_ipython,
            &mut io::stdin().lock(),
            &mut io::stdout().lock(),
        )
    }
}
