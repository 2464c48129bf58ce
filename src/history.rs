use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::ShellError;

/// Accepted command lines, oldest first.
///
/// `appended` marks how many entries have already been written out by
/// `history -a` (or came from a file), so the next append only writes the
/// rest.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<String>,
    appended: usize,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.entries.push(line.into());
    }

    /// Appends every non-blank line of `path` and moves the checkpoint to
    /// the end.
    pub fn read_from(&mut self, path: &Path) -> Result<(), ShellError> {
        let data = fs::read_to_string(path).map_err(|source| ShellError::History {
            path: path.to_path_buf(),
            source,
        })?;
        self.entries.extend(
            data.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(String::from),
        );
        self.appended = self.entries.len();
        Ok(())
    }

    /// Overwrites `path` with all entries.
    pub fn write_to(&self, path: &Path) -> Result<(), ShellError> {
        fs::write(path, render_lines(&self.entries)).map_err(|source| ShellError::History {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Appends the entries added since the last checkpoint to `path`.
    pub fn append_to(&mut self, path: &Path) -> Result<(), ShellError> {
        let pending = render_lines(&self.entries[self.appended..]);
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut f| f.write_all(&pending))
            .map_err(|source| ShellError::History {
                path: path.to_path_buf(),
                source,
            })?;
        self.appended = self.entries.len();
        Ok(())
    }

    /// Renders the listing printed by `history`, numbered from 1.
    ///
    /// With a limit smaller than the history, only the last `limit` entries
    /// are shown, keeping their original numbers.
    pub fn render(&self, limit: Option<usize>) -> Bytes {
        let skip = match limit {
            Some(n) if n > 0 && n < self.entries.len() => self.entries.len() - n,
            _ => 0,
        };
        let mut out = BytesMut::new();
        for (i, line) in self.entries.iter().enumerate().skip(skip) {
            out.put_slice(format!("    {}  {}\n", i + 1, line).as_bytes());
        }
        out.freeze()
    }
}

fn render_lines(lines: &[String]) -> Bytes {
    let mut out = BytesMut::new();
    for line in lines {
        out.put_slice(line.as_bytes());
        out.put_u8(b'\n');
    }
    out.freeze()
}
