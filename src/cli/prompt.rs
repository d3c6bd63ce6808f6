//! Interactive prompt helpers
//!
//! Each helper comes in two forms: one bound to the process's stdin/stdout
//! and a `*_with` variant taking an explicit reader and writer.

use crate::error::{Result, ScriptError};
use std::io::{self, BufRead, IsTerminal, Write};

/// Ask for a free-form value; empty input yields `default`
pub fn prompt(name: &str, default: Option<&str>) -> Result<String> {
    prompt_with(&mut io::stdin().lock(), &mut io::stdout().lock(), name, default)
}

/// Ask for a secret value without echoing it; the default is never shown.
///
/// Falls back to reading a plain line when stdin is not a terminal.
pub fn prompt_pass(name: &str, default: Option<&str>) -> Result<String> {
    if !io::stdin().is_terminal() {
        return prompt_pass_with(&mut io::stdin().lock(), &mut io::stdout().lock(), name, default);
    }

    loop {
        let answer = rpassword::prompt_password(format!("{name}: ")).map_err(|e| {
            ScriptError::Prompt {
                message: format!("cannot read {name} from the terminal"),
                source: Some(e),
            }
        })?;
        if !answer.is_empty() {
            return Ok(answer);
        }
        if let Some(default) = default {
            return Ok(default.to_string());
        }
    }
}

/// Ask a yes/no question
pub fn prompt_bool(name: &str, default: bool) -> Result<bool> {
    prompt_bool_with(&mut io::stdin().lock(), &mut io::stdout().lock(), name, default)
}

/// Ask for one value out of `choices`
pub fn prompt_choices(name: &str, choices: &[&str], default: Option<&str>) -> Result<String> {
    prompt_choices_with(
        &mut io::stdin().lock(),
        &mut io::stdout().lock(),
        name,
        choices,
        default,
    )
}

pub fn prompt_with<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    name: &str,
    default: Option<&str>,
) -> Result<String> {
    loop {
        match default {
            Some(default) => write!(output, "{name} [{default}]: ")?,
            None => write!(output, "{name}: ")?,
        }
        output.flush()?;

        let answer = read_answer(input, name)?;
        if !answer.is_empty() {
            return Ok(answer);
        }
        if let Some(default) = default {
            return Ok(default.to_string());
        }
    }
}

pub fn prompt_pass_with<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    name: &str,
    default: Option<&str>,
) -> Result<String> {
    loop {
        write!(output, "{name}: ")?;
        output.flush()?;

        let answer = read_answer(input, name)?;
        if !answer.is_empty() {
            return Ok(answer);
        }
        if let Some(default) = default {
            return Ok(default.to_string());
        }
    }
}

pub fn prompt_bool_with<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    name: &str,
    default: bool,
) -> Result<bool> {
    let hint = if default { "Y/n" } else { "y/N" };
    loop {
        write!(output, "{name} [{hint}]: ")?;
        output.flush()?;

        let answer = read_answer(input, name)?.to_lowercase();
        match answer.as_str() {
            "" => return Ok(default),
            "y" | "yes" | "true" | "1" | "on" => return Ok(true),
            "n" | "no" | "false" | "0" | "off" => return Ok(false),
            _ => writeln!(output, "Please answer yes or no.")?,
        }
    }
}

pub fn prompt_choices_with<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    name: &str,
    choices: &[&str],
    default: Option<&str>,
) -> Result<String> {
    let listed = choices.join(", ");
    loop {
        let answer = prompt_with(input, output, &format!("{name} - ({listed})"), default)?;
        if let Some(choice) = choices.iter().find(|c| c.eq_ignore_ascii_case(&answer)) {
            return Ok((*choice).to_string());
        }
        writeln!(output, "Please choose one of: {listed}")?;
    }
}

/// Read one trimmed line; EOF is an error since no answer can follow
fn read_answer<R: BufRead>(input: &mut R, name: &str) -> Result<String> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(ScriptError::prompt(format!("no input while asking for {name}")));
    }
    Ok(line.trim().to_string())
}
