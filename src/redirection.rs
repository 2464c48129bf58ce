use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;

use tracing::debug;

use crate::error::ShellError;
use crate::streams::OutputStream;

/// Represents a redirection target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirection {
    pub file: String,
    pub append: bool,
}

impl Redirection {
    /// Creates or truncates the target, or opens it for append.
    pub fn open(&self) -> Result<File, ShellError> {
        let mut options = OpenOptions::new();
        options.create(true);
        if self.append {
            options.append(true);
        } else {
            options.write(true).truncate(true);
        }
        options.open(&self.file).map_err(|source| ShellError::Redirect {
            path: PathBuf::from(&self.file),
            source,
        })
    }
}

/// A parsed command with arguments and redirections.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ParsedCommand {
    pub args: Vec<String>,
    pub redirect_stdout: Option<Redirection>,
    pub redirect_stderr: Option<Redirection>,
}

/// Parses tokens into a ParsedCommand, extracting redirection operators.
///
/// An operator without a following target is kept as an ordinary argument.
/// When the same stream is redirected twice the last one wins.
pub fn parse_command(tokens: Vec<String>) -> ParsedCommand {
    let mut parsed = ParsedCommand::default();
    let mut tokens = tokens.into_iter();

    while let Some(token) = tokens.next() {
        let slot = match token.as_str() {
            ">>" | "1>>" => Some((&mut parsed.redirect_stdout, true)),
            ">" | "1>" => Some((&mut parsed.redirect_stdout, false)),
            "2>>" => Some((&mut parsed.redirect_stderr, true)),
            "2>" => Some((&mut parsed.redirect_stderr, false)),
            _ => None,
        };
        let Some((target, append)) = slot else {
            parsed.args.push(token);
            continue;
        };
        match tokens.next() {
            Some(file) => *target = Some(Redirection { file, append }),
            None => parsed.args.push(token),
        }
    }

    parsed
}

impl ParsedCommand {
    /// Opens the redirection targets on top of the given streams.
    ///
    /// A target that cannot be opened is reported on `stderr` (the stream in
    /// effect before any redirection) and the base stream is kept.
    pub fn resolve_streams(
        &self,
        stdout: OutputStream,
        stderr: OutputStream,
    ) -> (OutputStream, OutputStream) {
        let mut report: Box<dyn Write + Send> = match stderr.try_clone() {
            Ok(stream) => stream.into_writer(),
            Err(_) => Box::new(io::stderr()),
        };
        let stdout = open_or(self.redirect_stdout.as_ref(), stdout, &mut report);
        let stderr = open_or(self.redirect_stderr.as_ref(), stderr, &mut report);
        (stdout, stderr)
    }
}

fn open_or(
    redirection: Option<&Redirection>,
    fallback: OutputStream,
    report: &mut dyn Write,
) -> OutputStream {
    let Some(redirection) = redirection else {
        return fallback;
    };
    match redirection.open() {
        Ok(file) => {
            debug!(file = %redirection.file, append = redirection.append, "redirecting");
            OutputStream::File(file)
        }
        Err(e) => {
            let _ = writeln!(report, "{e}");
            fallback
        }
    }
}
