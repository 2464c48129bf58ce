use std::env;
use std::path::PathBuf;

use crate::path::PathResolver;

pub const PROMPT: &str = "$ ";

/// Session settings taken from the environment at start-up.
#[derive(Debug, Clone)]
pub struct Config {
    pub prompt: String,
    pub histfile: Option<PathBuf>,
    pub resolver: PathResolver,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            prompt: PROMPT.to_string(),
            histfile: env::var_os("HISTFILE")
                .filter(|f| !f.is_empty())
                .map(PathBuf::from),
            resolver: PathResolver::from_env(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prompt: PROMPT.to_string(),
            histfile: None,
            resolver: PathResolver::default(),
        }
    }
}
