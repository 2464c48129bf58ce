use std::collections::BTreeSet;
use std::env;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

/// Ordered list of directories searched for executables.
#[derive(Debug, Clone, Default)]
pub struct PathResolver {
    dirs: Vec<PathBuf>,
}

impl PathResolver {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    /// Builds a resolver from a PATH-style list, skipping empty entries.
    pub fn from_path_list(list: &OsStr) -> Self {
        Self::new(
            env::split_paths(list)
                .filter(|dir| !dir.as_os_str().is_empty())
                .collect(),
        )
    }

    pub fn from_env() -> Self {
        env::var_os("PATH")
            .map(|list| Self::from_path_list(&list))
            .unwrap_or_default()
    }

    /// Finds the full path of a command, first match in search order wins.
    pub fn find(&self, command: &str) -> Option<PathBuf> {
        if command.is_empty() {
            return None;
        }
        if command.contains('/') {
            let path = PathBuf::from(command);
            return is_executable(&path).then_some(path);
        }
        self.dirs
            .iter()
            .map(|dir| dir.join(command))
            .find(|full| is_executable(full))
    }

    /// Returns the distinct executable names that start with `prefix`.
    pub fn executables_with_prefix(&self, prefix: &str) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        for dir in &self.dirs {
            let Ok(entries) = fs::read_dir(dir) else {
                continue;
            };
            for name in entries
                .flatten()
                .filter_map(|e| e.file_name().into_string().ok())
            {
                if name.starts_with(prefix)
                    && !names.contains(&name)
                    && is_executable(&dir.join(&name))
                {
                    names.insert(name);
                }
            }
        }
        names
    }
}

fn is_executable(path: &Path) -> bool {
    #[cfg(unix)]
    use std::os::unix::fs::PermissionsExt;

    fs::metadata(path).is_ok_and(|m| {
        m.is_file() && {
            #[cfg(unix)]
            {
                m.permissions().mode() & 0o111 != 0
            }
            #[cfg(not(unix))]
            {
                true
            }
        }
    })
}
