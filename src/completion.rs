use std::cell::RefCell;
use std::collections::BTreeSet;
use std::io::{self, Write};

use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::Helper;
use tracing::debug;

use crate::commands::builtin_names;
use crate::path::PathResolver;

/// What to do in response to one completion request.
#[derive(Debug, PartialEq, Eq)]
pub enum Proposal {
    /// Not a completable position.
    Nothing,
    /// No progress possible; ring the bell.
    Bell,
    /// Insert this text at the cursor.
    Insert(String),
    /// Show every candidate and re-prompt.
    List(Vec<String>),
}

/// Completes the first word of the line from builtins and PATH executables.
///
/// A repeated request on a prefix that cannot be extended rings the bell
/// the first time and lists the candidates the second time.
#[derive(Debug)]
pub struct CompletionEngine {
    resolver: PathResolver,
    last_input: String,
    tab_count: u32,
}

impl CompletionEngine {
    pub fn new(resolver: PathResolver) -> Self {
        Self {
            resolver,
            last_input: String::new(),
            tab_count: 0,
        }
    }

    pub fn complete(&mut self, input: &str) -> Proposal {
        if input.is_empty() || input.contains([' ', '\t']) {
            return Proposal::Nothing;
        }

        if input != self.last_input {
            self.last_input = input.to_string();
            self.tab_count = 0;
        }
        self.tab_count += 1;

        let candidates = self.candidates(input);
        debug!(input, count = candidates.len(), tab = self.tab_count, "completing");

        match candidates.len() {
            0 => Proposal::Bell,
            1 => {
                self.tab_count = 0;
                Proposal::Insert(format!("{} ", &candidates[0][input.len()..]))
            }
            _ => {
                let common = longest_common_prefix(&candidates);
                if common.len() > input.len() {
                    let delta = common[input.len()..].to_string();
                    self.last_input = common;
                    self.tab_count = 0;
                    Proposal::Insert(delta)
                } else if self.tab_count == 1 {
                    Proposal::Bell
                } else {
                    self.tab_count = 0;
                    Proposal::List(candidates)
                }
            }
        }
    }

    /// Sorted, distinct builtin and executable names starting with `prefix`.
    fn candidates(&self, prefix: &str) -> Vec<String> {
        let mut names: BTreeSet<String> = self.resolver.executables_with_prefix(prefix);
        names.extend(
            builtin_names()
                .filter(|b| b.starts_with(prefix))
                .map(String::from),
        );
        names.into_iter().collect()
    }
}

/// Longest string that is a prefix of every entry.
pub fn longest_common_prefix(strs: &[String]) -> String {
    let Some((first, rest)) = strs.split_first() else {
        return String::new();
    };
    let mut prefix = first.clone();
    for s in rest {
        while !s.starts_with(prefix.as_str()) {
            prefix.pop();
        }
    }
    prefix
}

/// The text printed for [`Proposal::List`]: the candidates on a fresh line,
/// then the prompt and current input again.
pub fn render_listing(candidates: &[String], prompt: &str, input: &str) -> String {
    format!("\n{}\n{}{}", candidates.join("  "), prompt, input)
}

/// Shell completer for tab completion.
pub struct ShellCompleter {
    engine: RefCell<CompletionEngine>,
    prompt: String,
}

impl ShellCompleter {
    pub fn new(resolver: PathResolver, prompt: &str) -> Self {
        Self {
            engine: RefCell::new(CompletionEngine::new(resolver)),
            prompt: prompt.to_string(),
        }
    }
}

fn ring_bell() {
    let mut stderr = io::stderr();
    let _ = stderr.write_all(b"\x07").and_then(|_| stderr.flush());
}

impl Completer for ShellCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> Result<(usize, Vec<Self::Candidate>), ReadlineError> {
        let input = &line[..pos];
        match self.engine.borrow_mut().complete(input) {
            Proposal::Nothing => {}
            Proposal::Bell => ring_bell(),
            Proposal::Insert(text) => {
                return Ok((
                    pos,
                    vec![Pair {
                        display: format!("{input}{text}"),
                        replacement: text,
                    }],
                ));
            }
            Proposal::List(candidates) => {
                let mut stdout = io::stdout();
                stdout.write_all(render_listing(&candidates, &self.prompt, input).as_bytes())?;
                stdout.flush()?;
            }
        }
        Ok((pos, Vec::new()))
    }
}

impl Helper for ShellCompleter {}
impl Hinter for ShellCompleter {
    type Hint = String;
}
impl Highlighter for ShellCompleter {}
impl Validator for ShellCompleter {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::tests::touch;
    use rustyline::history::DefaultHistory;

    fn strings(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn engine_with(executables: &[&str]) -> (tempfile::TempDir, CompletionEngine) {
        let dir = tempfile::tempdir().unwrap();
        for name in executables {
            touch(dir.path(), name, 0o755);
        }
        let resolver = PathResolver::new(vec![dir.path().to_path_buf()]);
        (dir, CompletionEngine::new(resolver))
    }

    #[test]
    fn test_longest_common_prefix() {
        assert_eq!(longest_common_prefix(&strings(&["foobar", "foobaz", "fooqux"])), "foo");
        assert_eq!(longest_common_prefix(&strings(&["abc", "xyz"])), "");
        assert_eq!(longest_common_prefix(&strings(&["same", "same"])), "same");
        assert_eq!(longest_common_prefix(&strings(&["ab", "abc"])), "ab");
        assert_eq!(longest_common_prefix(&strings(&["solo"])), "solo");
        assert_eq!(longest_common_prefix(&[]), "");
    }

    #[test]
    fn test_lcp_is_a_prefix_of_every_candidate() {
        let sets = [
            strings(&["xyz_foo", "xyz_foo_bar", "xyz_baz"]),
            strings(&["a", "b"]),
            strings(&["ünï", "ünö"]),
        ];
        for set in sets {
            let common = longest_common_prefix(&set);
            assert!(set.iter().all(|s| s.starts_with(&common)), "{set:?}");
            if let Some(next) = set[0][common.len()..].chars().next() {
                let longer = format!("{common}{next}");
                assert!(!set.iter().all(|s| s.starts_with(&longer)), "{set:?}");
            }
        }
    }

    #[test]
    fn test_empty_or_multi_word_input() {
        let (_dir, mut engine) = engine_with(&["tool"]);
        assert_eq!(engine.complete(""), Proposal::Nothing);
        assert_eq!(engine.complete("echo to"), Proposal::Nothing);
    }

    #[test]
    fn test_no_candidates_rings_bell() {
        let (_dir, mut engine) = engine_with(&["tool"]);
        assert_eq!(engine.complete("zzz"), Proposal::Bell);
        assert_eq!(engine.complete("zzz"), Proposal::Bell);
    }

    #[test]
    fn test_single_builtin_candidate() {
        let (_dir, mut engine) = engine_with(&[]);
        assert_eq!(engine.complete("ech"), Proposal::Insert("o ".to_string()));
        assert_eq!(engine.complete("hist"), Proposal::Insert("ory ".to_string()));
    }

    #[test]
    fn test_single_executable_candidate() {
        let (_dir, mut engine) = engine_with(&["custom_tool", "other"]);
        assert_eq!(engine.complete("custom"), Proposal::Insert("_tool ".to_string()));
    }

    #[test]
    fn test_executable_duplicating_builtin_is_listed_once() {
        let (_dir, mut engine) = engine_with(&["echo"]);
        assert_eq!(engine.complete("ec"), Proposal::Insert("ho ".to_string()));
    }

    #[test]
    fn test_bell_then_list() {
        let (_dir, mut engine) = engine_with(&["xyz_bar", "xyz_baz", "xyz_qux"]);
        assert_eq!(engine.complete("xyz_"), Proposal::Bell);
        assert_eq!(
            engine.complete("xyz_"),
            Proposal::List(strings(&["xyz_bar", "xyz_baz", "xyz_qux"]))
        );
        assert_eq!(engine.complete("xyz_"), Proposal::Bell);
    }

    #[test]
    fn test_partial_completions_converge() {
        let (_dir, mut engine) = engine_with(&["xyz_foo", "xyz_foo_bar", "xyz_foo_bar_baz"]);
        assert_eq!(engine.complete("xy"), Proposal::Insert("z_foo".to_string()));
        assert_eq!(engine.complete("xyz_foo"), Proposal::Bell);
        assert_eq!(
            engine.complete("xyz_foo"),
            Proposal::List(strings(&["xyz_foo", "xyz_foo_bar", "xyz_foo_bar_baz"]))
        );
        assert_eq!(engine.complete("xyz_foo_"), Proposal::Insert("bar".to_string()));
        assert_eq!(engine.complete("xyz_foo_bar_"), Proposal::Insert("baz ".to_string()));
    }

    #[test]
    fn test_new_prefix_resets_count() {
        let (_dir, mut engine) = engine_with(&["xyz_bar", "xyz_baz"]);
        assert_eq!(engine.complete("xyz_ba"), Proposal::Bell);
        assert_eq!(engine.complete("xyz_b"), Proposal::Insert("a".to_string()));
        assert_eq!(engine.complete("xyz_ba"), Proposal::Bell);
    }

    #[test]
    fn test_render_listing() {
        assert_eq!(
            render_listing(&strings(&["xyz_bar", "xyz_baz"]), "$ ", "xyz_"),
            "\nxyz_bar  xyz_baz\n$ xyz_"
        );
    }

    #[test]
    fn test_completer_returns_insertion_at_cursor() {
        let (dir, _) = engine_with(&[]);
        let completer = ShellCompleter::new(PathResolver::new(vec![dir.path().to_path_buf()]), "$ ");
        let history = DefaultHistory::new();
        let ctx = rustyline::Context::new(&history);

        let (start, pairs) = completer.complete("ech", 3, &ctx).unwrap();
        assert_eq!(start, 3);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].replacement, "o ");
        assert_eq!(pairs[0].display, "echo ");

        let (start, pairs) = completer.complete("echo to", 7, &ctx).unwrap();
        assert_eq!(start, 7);
        assert!(pairs.is_empty());
    }
}
