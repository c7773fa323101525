//! Concrete line-reader collaborator (SPEC_FULL.md §4.H.1): a `rustyline`
//! backed adapter satisfying the `read_line`/`add_history`/`complete`
//! contract from §6, so the REPL driver never touches a terminal directly.

use std::borrow::Cow;
use std::collections::BTreeSet;

use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

use crate::builtins::BUILTIN_NAMES;
use crate::path;

/// Completion candidates: `BuiltinSet` names unioned with the distinct
/// executable names reachable via `PATH`, per §6.
struct ShellHelper;

impl Completer for ShellHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let start = line[..pos]
            .rfind(char::is_whitespace)
            .map(|i| i + 1)
            .unwrap_or(0);
        let prefix = &line[start..pos];

        let mut names: BTreeSet<String> = BUILTIN_NAMES.iter().map(|s| s.to_string()).collect();
        let path_var = std::env::var("PATH").unwrap_or_default();
        names.extend(path::executable_names(&path_var));

        let candidates = names
            .into_iter()
            .filter(|name| name.starts_with(prefix))
            .map(|name| Pair { display: name.clone(), replacement: name })
            .collect();

        Ok((start, candidates))
    }
}

impl Hinter for ShellHelper {
    type Hint = String;
}

impl Highlighter for ShellHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Cow::Borrowed(line)
    }
}

impl Validator for ShellHelper {}

impl Helper for ShellHelper {}

/// The line-reader collaborator: owns the `rustyline` editor and its
/// in-memory history (never persisted to disk, per §6).
pub struct LineReader {
    editor: Editor<ShellHelper, rustyline::history::DefaultHistory>,
}

impl LineReader {
    pub fn new() -> rustyline::Result<Self> {
        let mut editor = Editor::new()?;
        editor.set_helper(Some(ShellHelper));
        Ok(LineReader { editor })
    }

    /// Read one line, prompting with `prompt`. `None` signals EOF (Ctrl-D)
    /// or interruption (Ctrl-C), both of which the REPL driver treats as a
    /// request to exit gracefully.
    pub fn read_line(&mut self, prompt: &str) -> Option<String> {
        match self.editor.readline(prompt) {
            Ok(line) => Some(line),
            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => None,
            Err(_) => None,
        }
    }

    pub fn add_history(&mut self, line: &str) {
        let _ = self.editor.add_history_entry(line);
    }
}
