//! Process execution utilities
//!
//! Runs external programs attached to the current terminal, used to start
//! alternate interactive shells.

use crate::error::{Result, ScriptError};
use std::process::{Command, Stdio};
use tracing::{debug, info, instrument};

/// Utility for running external processes
#[derive(Debug)]
pub struct ProcessRunner {
    debug: bool,
}

impl ProcessRunner {
    /// Create a new process runner
    #[must_use]
    pub const fn new(debug: bool) -> Self {
        Self { debug }
    }

    /// Run a command with arguments and environment variables, inheriting
    /// stdin/stdout/stderr
    #[instrument(skip(self, env_vars))]
    pub fn run_command_with_env(
        &self,
        command: &str,
        args: &[&str],
        env_vars: &[(String, String)],
    ) -> Result<()> {
        let cmd_str = format!("{} {}", command, args.join(" "));

        if self.debug {
            debug!("Running command: {}", cmd_str);
            if !env_vars.is_empty() {
                debug!("Environment variables: {:?}", env_vars);
            }
        } else {
            info!("+ {}", cmd_str);
        }

        let mut cmd = Command::new(command);
        cmd.args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        for (key, value) in env_vars {
            cmd.env(key, value);
        }

        let status = cmd.status().map_err(|e| ScriptError::Process {
            command: cmd_str.clone(),
            exit_code: None,
            source: Some(Box::new(e)),
        })?;

        if !status.success() {
            return Err(ScriptError::process(cmd_str, status.code()));
        }

        debug!("Command completed successfully");
        Ok(())
    }

    /// Check if a command exists in PATH
    #[instrument(skip(self))]
    pub fn command_exists(&self, command: &str) -> bool {
        match which::which(command) {
            Ok(path) => {
                debug!("Command '{}' found at {}", command, path.display());
                true
            }
            Err(e) => {
                debug!("Command '{}' not found: {}", command, e);
                false
            }
        }
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_runner_creation() {
        let runner = ProcessRunner::new(true);
        assert!(runner.debug);

        let runner = ProcessRunner::default();
        assert!(!runner.debug);
    }

    #[cfg(unix)]
    #[test]
    fn test_run_command_with_env() {
        let runner = ProcessRunner::new(false);
        let env_vars = vec![("APPSCRIPT_TEST".to_string(), "1".to_string())];

        let result = runner.run_command_with_env("sh", &["-c", "test \"$APPSCRIPT_TEST\" = 1"], &env_vars);
        assert!(result.is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_command_exists() {
        let runner = ProcessRunner::new(false);

        assert!(runner.command_exists("sh"));
        assert!(!runner.command_exists("nonexistent_command_12345"));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_failing_command() {
        let runner = ProcessRunner::new(false);
        let result = runner.run_command_with_env("false", &[], &[]);

        if let Err(ScriptError::Process {
            command, exit_code, ..
        }) = result
        {
            assert_eq!(command, "false ");
            assert_eq!(exit_code, Some(1));
        } else {
            panic!("Expected ProcessError");
        }
    }

    #[test]
    fn test_missing_command_fails_to_spawn() {
        let runner = ProcessRunner::new(false);
        let result = runner.run_command_with_env("nonexistent_command_12345", &[], &[]);
        assert!(matches!(result, Err(ScriptError::Process { exit_code: None, .. })));
    }
}
