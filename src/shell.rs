use std::io;

use anyhow::Context as _;
use rustyline::config::{BellStyle, CompletionType};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;
use tracing::debug;

use crate::commands::EXIT;
use crate::completion::ShellCompleter;
use crate::config::Config;
use crate::error::ShellError;
use crate::executor::{execute, Flow};
use crate::history::History;
use crate::pipeline::split_pipeline;
use crate::redirection::parse_command;
use crate::streams::Streams;
use crate::tokenize::tokenize;

/// An interactive session: owns the history and evaluates lines.
pub struct Shell {
    config: Config,
    history: History,
}

impl Shell {
    /// Creates a session, loading history from the configured file if it
    /// exists.
    pub fn new(config: Config) -> Self {
        let mut history = History::new();
        if let Some(path) = &config.histfile {
            match history.read_from(path) {
                Err(ShellError::History { source, .. })
                    if source.kind() == io::ErrorKind::NotFound => {}
                Err(e) => eprintln!("{e}"),
                Ok(()) => debug!(entries = history.entries().len(), "loaded history"),
            }
        }
        Self { config, history }
    }

    /// Reads and evaluates lines until `exit` or end of input, then saves
    /// the history.
    pub fn run(&mut self) -> anyhow::Result<()> {
        let editor_config = rustyline::Config::builder()
            .completion_type(CompletionType::List)
            .bell_style(BellStyle::None)
            .auto_add_history(false)
            .build();
        let mut rl: Editor<ShellCompleter, DefaultHistory> =
            Editor::with_config(editor_config).context("failed to start line editor")?;
        rl.set_helper(Some(ShellCompleter::new(
            self.config.resolver.clone(),
            &self.config.prompt,
        )));
        for entry in self.history.entries() {
            let _ = rl.add_history_entry(entry.as_str());
        }

        let result = loop {
            match rl.readline(&self.config.prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if !trimmed.is_empty() {
                        let _ = rl.add_history_entry(trimmed);
                    }
                    if self.eval(&line, Streams::inherit()) == Flow::Exit {
                        break Ok(());
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break Ok(()),
                Err(e) => break Err::<(), _>(e).context("failed to read input"),
            }
        };

        self.save_history();
        result
    }

    /// Evaluates one input line against the given streams.
    ///
    /// Redirections are taken from the last pipeline segment only and apply
    /// to the pipeline's final stdout and shared stderr.
    pub fn eval(&mut self, line: &str, streams: Streams) -> Flow {
        let line = line.trim();
        if line.is_empty() {
            return Flow::Continue;
        }
        self.history.push(line);

        let tokens = tokenize(line);
        debug!(?tokens, "parsed");
        match tokens.first() {
            None => return Flow::Continue,
            Some(first) if first == EXIT => return Flow::Exit,
            Some(_) => {}
        }

        let mut segments = split_pipeline(tokens);
        let Some(last) = segments.pop() else {
            return Flow::Continue;
        };
        let parsed = parse_command(last);
        // `> file` or `a | > file`: no stage runs and no file is opened.
        if parsed.args.is_empty() {
            return Flow::Continue;
        }

        let Streams {
            stdin,
            stdout,
            stderr,
        } = streams;
        let (stdout, stderr) = parsed.resolve_streams(stdout, stderr);
        segments.push(parsed.args);

        execute(
            &segments,
            &mut self.history,
            &self.config.resolver,
            Streams {
                stdin,
                stdout,
                stderr,
            },
        )
    }

    /// Overwrites the configured history file with the whole history.
    pub fn save_history(&self) {
        let Some(path) = &self.config.histfile else {
            return;
        };
        if let Err(e) = self.history.write_to(path) {
            eprintln!("{e}");
        }
    }
}
