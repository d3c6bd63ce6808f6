//! Parsed command arguments
//!
//! [`ParsedArgs`] is the per-invocation namespace handed to a command:
//! typed lookups by destination name over clap's matches.

use crate::error::{Result, ScriptError};
use clap::ArgMatches;

/// Values parsed for one command invocation, keyed by option destination
#[derive(Debug, Clone, Default)]
pub struct ParsedArgs {
    matches: ArgMatches,
}

impl ParsedArgs {
    /// Wrap the matches produced by a command's parser
    pub fn new(matches: ArgMatches) -> Self {
        Self { matches }
    }

    /// Whether the parser knows `dest` and produced a value for it
    pub fn contains(&self, dest: &str) -> bool {
        self.matches
            .try_contains_id(dest)
            .unwrap_or(false)
    }

    /// Boolean flag value; errors when the destination is missing
    pub fn flag(&self, dest: &str) -> Result<bool> {
        self.get::<bool>(dest)?
            .ok_or_else(|| ScriptError::missing_argument(dest))
    }

    /// Single string value, if any
    pub fn string(&self, dest: &str) -> Result<Option<String>> {
        self.get::<String>(dest)
    }

    /// Single string value; errors when absent
    pub fn require_string(&self, dest: &str) -> Result<String> {
        self.string(dest)?
            .ok_or_else(|| ScriptError::missing_argument(dest))
    }

    /// Single integer value, if any
    pub fn integer(&self, dest: &str) -> Result<Option<i64>> {
        self.get::<i64>(dest)
    }

    /// Single integer value; errors when absent
    pub fn require_integer(&self, dest: &str) -> Result<i64> {
        self.integer(dest)?
            .ok_or_else(|| ScriptError::missing_argument(dest))
    }

    /// Single float value, if any
    pub fn float(&self, dest: &str) -> Result<Option<f64>> {
        self.get::<f64>(dest)
    }

    /// Number of occurrences of a counting flag
    pub fn count(&self, dest: &str) -> Result<u8> {
        Ok(self.get::<u8>(dest)?.unwrap_or(0))
    }

    /// All string values of an appending or multi-value option
    pub fn strings(&self, dest: &str) -> Result<Vec<String>> {
        let values = self
            .matches
            .try_get_many::<String>(dest)
            .map_err(|e| ScriptError::invalid_argument(dest, e.to_string()))?;
        Ok(values.map(|v| v.cloned().collect()).unwrap_or_default())
    }

    fn get<T>(&self, dest: &str) -> Result<Option<T>>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.matches
            .try_get_one::<T>(dest)
            .map(|value| value.cloned())
            .map_err(|e| ScriptError::invalid_argument(dest, e.to_string()))
    }
}

impl From<ArgMatches> for ParsedArgs {
    fn from(matches: ArgMatches) -> Self {
        Self::new(matches)
    }
}
