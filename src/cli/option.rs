//! Declarative option descriptors
//!
//! A [`CommandOption`] holds everything needed to add one argument to a
//! command's parser. It performs no validation of its own; clap reports
//! inconsistent descriptors when the parser is built.

use clap::{
    Arg, ArgAction,
    builder::{PossibleValuesParser, ValueParser},
};

/// What happens when the option is encountered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptionAction {
    /// Store the given value
    #[default]
    Store,
    /// Store `true`
    StoreTrue,
    /// Store `false`
    StoreFalse,
    /// Count occurrences
    Count,
    /// Collect every occurrence
    Append,
}

/// Type the command-line value is converted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueKind {
    #[default]
    String,
    Integer,
    Float,
}

/// Number of values consumed by one occurrence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nargs {
    /// Zero or one value
    Optional,
    /// Any number of values
    ZeroOrMore,
    /// At least one value
    OneOrMore,
    /// Exactly `n` values
    Exactly(usize),
}

/// Descriptor for one positional argument or flag
#[derive(Debug, Clone, Default)]
pub struct CommandOption {
    names: Vec<String>,
    action: OptionAction,
    nargs: Option<Nargs>,
    default: Option<String>,
    kind: ValueKind,
    choices: Vec<String>,
    required: bool,
    help: Option<String>,
    dest: Option<String>,
    metavar: Option<String>,
}

impl CommandOption {
    /// Create an option from a positional name or a set of flags,
    /// e.g. `["name"]` or `["-f", "--foo"]`
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn action(mut self, action: OptionAction) -> Self {
        self.action = action;
        self
    }

    #[must_use]
    pub fn nargs(mut self, nargs: Nargs) -> Self {
        self.nargs = Some(nargs);
        self
    }

    /// Value produced when the option is absent
    #[must_use]
    pub fn default_value(mut self, value: impl ToString) -> Self {
        self.default = Some(value.to_string());
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: ValueKind) -> Self {
        self.kind = kind;
        self
    }

    /// Restrict the accepted values; choices are matched as strings
    #[must_use]
    pub fn choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    #[must_use]
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    #[must_use]
    pub fn dest(mut self, dest: impl Into<String>) -> Self {
        self.dest = Some(dest.into());
        self
    }

    #[must_use]
    pub fn metavar(mut self, metavar: impl Into<String>) -> Self {
        self.metavar = Some(metavar.into());
        self
    }

    /// Names and flags as declared
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn get_action(&self) -> OptionAction {
        self.action
    }

    pub fn get_default(&self) -> Option<&str> {
        self.default.as_deref()
    }

    pub fn get_help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Whether this descriptor names a positional argument
    pub fn is_positional(&self) -> bool {
        self.names
            .first()
            .is_some_and(|name| !name.starts_with('-'))
    }

    /// Long flags without their leading dashes
    pub fn long_flags(&self) -> impl Iterator<Item = &str> {
        self.names.iter().filter_map(|name| name.strip_prefix("--"))
    }

    /// Single-character short flags
    pub fn short_flags(&self) -> impl Iterator<Item = char> {
        self.names.iter().filter_map(|name| {
            let rest = name.strip_prefix('-')?;
            let mut chars = rest.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c != '-' => Some(c),
                _ => None,
            }
        })
    }

    /// Attribute name the parsed value is stored under.
    ///
    /// Falls back to the first long flag (`--no-debug` → `no_debug`), then
    /// the first short flag, then the positional name.
    pub fn get_dest(&self) -> String {
        if let Some(dest) = &self.dest {
            return dest.clone();
        }
        if let Some(long) = self.long_flags().next() {
            return long.replace('-', "_");
        }
        if let Some(short) = self.short_flags().next() {
            return short.to_string();
        }
        self.names
            .first()
            .map(|name| name.trim_start_matches('-').replace('-', "_"))
            .unwrap_or_default()
    }

    /// Convert into a clap argument
    pub fn to_arg(&self) -> Arg {
        let mut arg = Arg::new(self.get_dest());

        if !self.is_positional() {
            let mut longs = self.long_flags();
            if let Some(long) = longs.next() {
                arg = arg.long(long.to_string());
            }
            for alias in longs {
                arg = arg.visible_alias(alias.to_string());
            }
            let mut shorts = self.short_flags();
            if let Some(short) = shorts.next() {
                arg = arg.short(short);
            }
            for alias in shorts {
                arg = arg.visible_short_alias(alias);
            }
        }

        arg = match self.action {
            OptionAction::Store => arg.action(ArgAction::Set),
            OptionAction::StoreTrue => arg.action(ArgAction::SetTrue),
            OptionAction::StoreFalse => arg.action(ArgAction::SetFalse),
            OptionAction::Count => arg.action(ArgAction::Count),
            OptionAction::Append => arg.action(ArgAction::Append),
        };

        if self.takes_value() {
            arg = arg.value_parser(self.value_parser());
            if let Some(nargs) = self.nargs {
                arg = match nargs {
                    Nargs::Optional => arg.num_args(0..=1),
                    Nargs::ZeroOrMore => arg.num_args(0..),
                    Nargs::OneOrMore => arg.num_args(1..),
                    Nargs::Exactly(n) => arg.num_args(n),
                };
            }
            if let Some(metavar) = &self.metavar {
                arg = arg.value_name(metavar.clone());
            }
        }

        if let Some(default) = &self.default {
            arg = arg.default_value(default.clone());
        }
        if self.required {
            arg = arg.required(true);
        }
        if let Some(help) = &self.help {
            arg = arg.help(help.clone());
        }

        arg
    }

    fn takes_value(&self) -> bool {
        matches!(self.action, OptionAction::Store | OptionAction::Append)
    }

    fn value_parser(&self) -> ValueParser {
        if !self.choices.is_empty() {
            return PossibleValuesParser::new(self.choices.clone()).into();
        }
        match self.kind {
            ValueKind::String => ValueParser::string(),
            ValueKind::Integer => clap::value_parser!(i64).into(),
            ValueKind::Float => clap::value_parser!(f64).into(),
        }
    }
}
