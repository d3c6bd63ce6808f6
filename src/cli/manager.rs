//! Command registry and dispatch
//!
//! The [`Manager`] owns the application and the registered commands. It
//! turns argv into a subcommand name plus that command's parsed arguments
//! and calls the command's `handle`.

use crate::{
    app::Application,
    cli::{args::ParsedArgs, command::Command},
    config::Config,
    core::{Server, Shell},
    error::{Result, ScriptError},
};
use std::ffi::OsString;
use tracing::{debug, instrument};

/// A resolved command line: which command to run and with what
#[derive(Debug, Clone)]
pub struct Invocation {
    pub name: String,
    pub args: ParsedArgs,
}

/// Registry of named commands bound to one application
pub struct Manager<A: Application> {
    app: A,
    prog: String,
    description: Option<String>,
    commands: Vec<(String, Box<dyn Command>)>,
}

impl<A: Application> Manager<A> {
    pub fn new(app: A) -> Self {
        Self {
            app,
            prog: "manage".to_string(),
            description: None,
            commands: Vec::new(),
        }
    }

    /// Program name shown in usage messages
    #[must_use]
    pub fn with_prog(mut self, prog: impl Into<String>) -> Self {
        self.prog = prog.into();
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Register `shell` and `runserver` unless those names are taken
    #[must_use]
    pub fn with_default_commands(mut self, config: &Config) -> Self {
        if self.get("shell").is_none() {
            self.add_command("shell", Shell::from_config(&config.shell));
        }
        if self.get("runserver").is_none() {
            self.add_command("runserver", Server::from_config(&config.server));
        }
        self
    }

    /// Register `command` under `name`, replacing any earlier registration
    pub fn add_command(&mut self, name: impl Into<String>, command: impl Command + 'static) {
        let name = name.into();
        let command: Box<dyn Command> = Box::new(command);
        match self.commands.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => {
                debug!("Replacing command {}", name);
                slot.1 = command;
            }
            None => self.commands.push((name, command)),
        }
    }

    /// Builder form of [`Manager::add_command`]
    #[must_use]
    pub fn command(mut self, name: impl Into<String>, command: impl Command + 'static) -> Self {
        self.add_command(name, command);
        self
    }

    /// Look up a registered command
    pub fn get(&self, name: &str) -> Option<&dyn Command> {
        self.commands
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, command)| command.as_ref())
    }

    /// Registered command names in registration order
    pub fn command_names(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().map(|(name, _)| name.as_str())
    }

    pub fn app(&self) -> &A {
        &self.app
    }

    /// Root parser with one subcommand per registered command
    pub fn create_parser(&self) -> clap::Command {
        let mut parser = clap::Command::new(self.prog.clone())
            .subcommand_required(true)
            .arg_required_else_help(true);
        if let Some(description) = &self.description {
            parser = parser.about(description.clone());
        }
        for (name, command) in &self.commands {
            parser = parser.subcommand(command.create_parser(name));
        }
        parser
    }

    /// Resolve `argv` (program name first) into an [`Invocation`]
    pub fn parse_from<I, T>(&self, argv: I) -> Result<Invocation>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = self.create_parser().try_get_matches_from(argv)?;
        let (name, sub_matches) = matches
            .subcommand()
            .ok_or_else(|| ScriptError::invalid_command("no command given"))?;

        Ok(Invocation {
            name: name.to_string(),
            args: ParsedArgs::new(sub_matches.clone()),
        })
    }

    /// Run the command named by `invocation`
    #[instrument(skip_all, fields(command = %invocation.name))]
    pub fn dispatch(&self, invocation: &Invocation) -> Result<()> {
        let command = self
            .get(&invocation.name)
            .ok_or_else(|| ScriptError::invalid_command(format!("unknown command `{}`", invocation.name)))?;
        debug!("Dispatching {}", invocation.name);
        command.handle(&self.app, &invocation.args)
    }

    /// Parse `argv` and dispatch
    pub fn run_from<I, T>(&self, argv: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let invocation = self.parse_from(argv)?;
        self.dispatch(&invocation)
    }

    /// Parse the process arguments and dispatch.
    ///
    /// Usage errors (including `--help`) print clap's message and exit the
    /// process with clap's status code.
    pub fn run(&self) -> Result<()> {
        let invocation = match self.parse_from(std::env::args_os()) {
            Ok(invocation) => invocation,
            Err(ScriptError::Usage(e)) => e.exit(),
            Err(e) => return Err(e),
        };
        self.dispatch(&invocation)
    }
}
