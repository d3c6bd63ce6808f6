//! Compiled-file cleanup command

use crate::{
    app::Application,
    cli::{args::ParsedArgs, command::Command, option::CommandOption},
    error::{Result, ScriptError},
};
use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument};
use walkdir::WalkDir;

/// Default substring identifying files to remove
pub const DEFAULT_PATTERN: &str = ".pyc";

#[derive(Debug, Clone)]
pub struct Clean {
    pattern: String,
    extra_options: Vec<CommandOption>,
}

impl Default for Clean {
    fn default() -> Self {
        Self::new(DEFAULT_PATTERN)
    }
}

impl Clean {
    /// Remove files whose name contains `pattern`
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            extra_options: Vec::new(),
        }
    }

    pub fn add_option(&mut self, option: CommandOption) {
        self.extra_options.push(option);
    }

    /// Delete every matching file below `root`, printing each path to `out`.
    ///
    /// Stops at the first walk or delete failure.
    #[instrument(skip(self, out))]
    pub fn clean_dir<W: Write>(&self, root: &Path, out: &mut W) -> Result<Vec<PathBuf>> {
        let mut removed = Vec::new();

        for entry in WalkDir::new(root) {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(root).to_path_buf();
                ScriptError::file_system("walk", path, io::Error::from(e))
            })?;

            if !entry.file_type().is_file() {
                continue;
            }
            if !entry.file_name().to_string_lossy().contains(&self.pattern) {
                continue;
            }

            let path = entry.into_path();
            writeln!(out, "Removing {}", path.display())?;
            fs::remove_file(&path).map_err(|e| ScriptError::file_system("remove", &path, e))?;
            debug!("Removed {}", path.display());
            removed.push(path);
        }

        info!("Removed {} file(s)", removed.len());
        Ok(removed)
    }
}

impl Command for Clean {
    fn doc(&self) -> Option<&str> {
        Some("Remove *.pyc files recursively starting at current directory")
    }

    fn options(&self) -> Vec<CommandOption> {
        self.extra_options.clone()
    }

    fn run(&self, _app: &dyn Application, _args: &ParsedArgs) -> Result<()> {
        self.clean_dir(Path::new("."), &mut io::stdout().lock())?;
        Ok(())
    }
}
