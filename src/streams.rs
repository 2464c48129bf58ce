//! Stream endpoints handed to pipeline stages.
//!
//! Each value owns at most one file descriptor. Moving it into a stage makes
//! that stage the one party responsible for closing it: a spawned process
//! closes its copy on exit, a builtin task drops its writer when it returns.

use std::fs::File;
use std::io::{self, Write};
use std::process::Stdio;

use os_pipe::{PipeReader, PipeWriter};

#[derive(Debug)]
pub enum InputStream {
    Inherit,
    Null,
    Pipe(PipeReader),
}

impl InputStream {
    pub fn into_stdio(self) -> Stdio {
        match self {
            InputStream::Inherit => Stdio::inherit(),
            InputStream::Null => Stdio::null(),
            InputStream::Pipe(r) => Stdio::from(r),
        }
    }
}

#[derive(Debug)]
pub enum OutputStream {
    Stdout,
    Stderr,
    Null,
    Pipe(PipeWriter),
    File(File),
}

impl OutputStream {
    pub fn try_clone(&self) -> io::Result<OutputStream> {
        Ok(match self {
            OutputStream::Stdout => OutputStream::Stdout,
            OutputStream::Stderr => OutputStream::Stderr,
            OutputStream::Null => OutputStream::Null,
            OutputStream::Pipe(w) => OutputStream::Pipe(w.try_clone()?),
            OutputStream::File(f) => OutputStream::File(f.try_clone()?),
        })
    }

    pub fn into_stdio(self) -> Stdio {
        match self {
            OutputStream::Stdout => Stdio::from(io::stdout()),
            OutputStream::Stderr => Stdio::from(io::stderr()),
            OutputStream::Null => Stdio::null(),
            OutputStream::Pipe(w) => Stdio::from(w),
            OutputStream::File(f) => Stdio::from(f),
        }
    }

    pub fn into_writer(self) -> Box<dyn Write + Send> {
        match self {
            OutputStream::Stdout => Box::new(io::stdout()),
            OutputStream::Stderr => Box::new(io::stderr()),
            OutputStream::Null => Box::new(io::sink()),
            OutputStream::Pipe(w) => Box::new(w),
            OutputStream::File(f) => Box::new(f),
        }
    }
}

/// The three standard streams of one command or pipeline.
#[derive(Debug)]
pub struct Streams {
    pub stdin: InputStream,
    pub stdout: OutputStream,
    pub stderr: OutputStream,
}

impl Streams {
    pub fn inherit() -> Self {
        Self {
            stdin: InputStream::Inherit,
            stdout: OutputStream::Stdout,
            stderr: OutputStream::Stderr,
        }
    }
}
