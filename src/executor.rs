//! Runs parsed command lines.
//!
//! A single command runs on the calling thread. A pipeline of N stages gets
//! N-1 OS pipes; external stages are spawned as processes and builtin stages
//! run on scoped threads, so a builtin writing into a pipe never waits on a
//! stage that has not started yet.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{self, Child};
use std::thread;

use bytes::Bytes;
use os_pipe::{PipeReader, PipeWriter};
use tracing::{debug, warn};

use crate::commands::{Builtin, Command, Context};
use crate::error::{ShellError, ShellResult};
use crate::history::History;
use crate::path::PathResolver;
use crate::streams::{InputStream, OutputStream, Streams};

/// What the session should do after a command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Executes one command with the given streams.
///
/// Errors are reported on the command's stderr; only `exit` changes the flow.
pub fn run_command(
    args: &[String],
    history: &mut History,
    resolver: &PathResolver,
    streams: Streams,
) -> Flow {
    let Some(name) = args.first() else {
        return Flow::Continue;
    };
    let Streams {
        stdin,
        stdout,
        stderr,
    } = streams;

    match Command::classify(name) {
        Command::Exit => return Flow::Exit,
        Command::Builtin(builtin) => {
            let mut ctx = Context { history, resolver };
            let result = (builtin.run)(args, &mut ctx);
            emit(result, &mut stdout.into_writer(), &mut stderr.into_writer());
        }
        Command::External(name) => {
            let mut report = stderr.try_clone().map(OutputStream::into_writer);
            let result = resolve_external(name, resolver).and_then(|path| {
                let mut child = spawn(&path, args, stdin, stdout, stderr)?;
                child.wait()?;
                Ok(())
            });
            if let (Err(e), Ok(report)) = (result, report.as_mut()) {
                let _ = writeln!(report, "{e}");
            }
        }
    }
    Flow::Continue
}

/// Executes a pipeline, feeding each stage's stdout into the next stage's
/// stdin. `streams.stdin` feeds the first stage, `streams.stdout` receives
/// the last stage's output and every stage shares `streams.stderr`.
///
/// A single segment runs through [`run_command`] without any pipes. Longer
/// pipelines resolve every stage before anything starts: an unknown command
/// or a misplaced `exit` aborts the whole pipeline. Builtins inside a
/// pipeline see a copy of the history, so their changes are not kept.
/// Returns once every stage has finished.
pub fn execute(
    segments: &[Vec<String>],
    history: &mut History,
    resolver: &PathResolver,
    streams: Streams,
) -> Flow {
    match segments {
        [] => Flow::Continue,
        [single] => run_command(single, history, resolver, streams),
        _ => {
            let report = streams.stderr.try_clone();
            if let Err(e) = run_pipeline(segments, history, resolver, streams) {
                match report {
                    Ok(report) => {
                        let _ = writeln!(report.into_writer(), "{e}");
                    }
                    Err(_) => eprintln!("{e}"),
                }
            }
            Flow::Continue
        }
    }
}

enum Stage<'a> {
    Inline(&'static Builtin, &'a [String]),
    External(PathBuf, &'a [String]),
}

impl<'a> Stage<'a> {
    fn resolve(args: &'a [String], resolver: &PathResolver) -> ShellResult<Self> {
        match Command::classify(&args[0]) {
            Command::Builtin(builtin) => Ok(Stage::Inline(builtin, args)),
            Command::Exit => Err(ShellError::ExitInPipeline),
            Command::External(name) => {
                resolve_external(name, resolver).map(|path| Stage::External(path, args))
            }
        }
    }
}

fn run_pipeline(
    segments: &[Vec<String>],
    history: &History,
    resolver: &PathResolver,
    streams: Streams,
) -> ShellResult<()> {
    let stages = segments
        .iter()
        .filter(|segment| !segment.is_empty())
        .map(|segment| Stage::resolve(segment, resolver))
        .collect::<ShellResult<Vec<_>>>()?;
    let last = stages.len().saturating_sub(1);

    // Pipe i connects stage i to stage i + 1. Each end is taken exactly once
    // by the stage that uses it; whatever is left is dropped by us.
    let mut readers: Vec<Option<PipeReader>> = Vec::with_capacity(last);
    let mut writers: Vec<Option<PipeWriter>> = Vec::with_capacity(last);
    for _ in 0..last {
        let (reader, writer) = os_pipe::pipe().map_err(ShellError::Pipe)?;
        readers.push(Some(reader));
        writers.push(Some(writer));
    }

    let Streams {
        stdin,
        stdout,
        stderr,
    } = streams;
    let mut stdin = Some(stdin);
    let mut stdout = Some(stdout);

    thread::scope(|scope| {
        let mut tasks = Vec::new();
        let mut children: Vec<Child> = Vec::new();
        let mut outcome = Ok(());

        for (i, stage) in stages.into_iter().enumerate() {
            let input = match i.checked_sub(1) {
                None => stdin.take(),
                Some(prev) => readers[prev].take().map(InputStream::Pipe),
            }
            .unwrap_or(InputStream::Null);
            let output = match writers.get_mut(i) {
                Some(writer) => writer.take().map(OutputStream::Pipe),
                None => stdout.take(),
            }
            .unwrap_or(OutputStream::Null);
            let errors = match stderr.try_clone() {
                Ok(errors) => errors,
                Err(e) => {
                    outcome = Err(ShellError::Pipe(e));
                    break;
                }
            };

            match stage {
                Stage::Inline(builtin, args) => {
                    debug!(stage = i, command = builtin.name, "starting builtin");
                    let mut history = history.clone();
                    tasks.push(scope.spawn(move || {
                        // Held until the builtin returns, then closed with
                        // the output so both neighbours see the stage end.
                        let _input = input;
                        let mut ctx = Context {
                            history: &mut history,
                            resolver,
                        };
                        let result = (builtin.run)(args, &mut ctx);
                        emit(result, &mut output.into_writer(), &mut errors.into_writer());
                    }));
                }
                Stage::External(path, args) => match spawn(&path, args, input, output, errors) {
                    Ok(child) => {
                        debug!(stage = i, pid = child.id(), path = %path.display(), "spawned");
                        children.push(child);
                    }
                    Err(e) => {
                        outcome = Err(e);
                        break;
                    }
                },
            }
        }

        // After a failed start, closing the unused ends lets the stages that
        // did start run into end-of-stream instead of blocking.
        readers.clear();
        writers.clear();
        drop(stdin.take());
        drop(stdout.take());

        for task in tasks {
            if task.join().is_err() {
                warn!("builtin stage panicked");
            }
        }
        for mut child in children {
            if let Err(e) = child.wait() {
                warn!(pid = child.id(), error = %e, "failed to wait for stage");
            }
        }
        outcome
    })
}

fn resolve_external(name: &str, resolver: &PathResolver) -> ShellResult<PathBuf> {
    resolver
        .find(name)
        .ok_or_else(|| ShellError::CommandNotFound(name.to_string()))
}

/// Spawns an external command. The streams are moved into the child, so the
/// parent's copies are closed as soon as this returns.
fn spawn(
    path: &Path,
    args: &[String],
    stdin: InputStream,
    stdout: OutputStream,
    stderr: OutputStream,
) -> ShellResult<Child> {
    let mut command = process::Command::new(path);
    command
        .args(&args[1..])
        .stdin(stdin.into_stdio())
        .stdout(stdout.into_stdio())
        .stderr(stderr.into_stdio());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.arg0(&args[0]);
    }
    command.spawn().map_err(|source| ShellError::Spawn {
        name: args[0].clone(),
        source,
    })
}

/// Writes a builtin's result: output to `stdout`, error message to `stderr`.
fn emit(result: ShellResult<Bytes>, stdout: &mut dyn Write, stderr: &mut dyn Write) {
    let written = match result {
        Ok(output) => stdout.write_all(&output).and_then(|_| stdout.flush()),
        Err(e) => writeln!(stderr, "{e}").and_then(|_| stderr.flush()),
    };
    match written {
        Err(e) if e.kind() != io::ErrorKind::BrokenPipe => {
            debug!(error = %e, "builtin output failed");
        }
        _ => {}
    }
}
