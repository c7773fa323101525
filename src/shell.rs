//! REPL Driver (SPEC_FULL.md §4.H): the main loop tying the tokenizer,
//! splitter, redirection extractor, and executors together, and the one
//! piece of state (history, cwd via the OS, environment) that survives
//! across iterations.

use log::{debug, warn};

use crate::error::{ShellError, SyntaxError};
use crate::exec::{self, RunOutcome};
use crate::lexer::tokenize;
use crate::line_reader::LineReader;
use crate::pipeline::{self, Stage};
use crate::redirect::extract_redirections;
use crate::splitter::split_pipeline;
use crate::token::Token;

const PROMPT: &str = "$ ";

/// Owns the shell's in-memory, per-session state.
pub struct Shell {
    history: Vec<String>,
}

impl Shell {
    pub fn new() -> Self {
        Shell { history: Vec::new() }
    }

    /// Run the REPL until EOF or `exit`, returning the process exit code.
    pub fn run(&mut self) -> i32 {
        let mut reader = match LineReader::new() {
            Ok(reader) => reader,
            Err(e) => {
                eprintln!("poshell: failed to start line editor: {e}");
                return 1;
            }
        };

        loop {
            let Some(line) = reader.read_line(PROMPT) else {
                return 0;
            };

            if line.trim().is_empty() {
                continue;
            }

            self.history.push(line.clone());
            reader.add_history(&line);

            match self.run_line(&line) {
                Ok(Some(code)) => return code,
                Ok(None) => continue,
                Err(e) => {
                    eprintln!("poshell: {e}");
                }
            }
        }
    }

    /// Run one line. `Ok(Some(code))` means the shell should exit with
    /// `code`; `Ok(None)` means continue the loop.
    fn run_line(&mut self, line: &str) -> Result<Option<i32>, ShellError> {
        let tokens = tokenize(line).map_err(|e| ShellError::Syntax(SyntaxError::Lex(e)))?;
        let stages_tokens =
            split_pipeline(tokens).map_err(|e| ShellError::Syntax(SyntaxError::Split(e)))?;

        if stages_tokens.is_empty() {
            return Ok(None);
        }

        if stages_tokens.len() == 1 {
            return self.run_single_stage(stages_tokens.into_iter().next().unwrap());
        }

        self.run_pipeline_stages(stages_tokens).map(|_| None)
    }

    fn run_single_stage(&mut self, tokens: Vec<Token>) -> Result<Option<i32>, ShellError> {
        let (argv, plan) =
            extract_redirections(tokens).map_err(|e| ShellError::Syntax(SyntaxError::Redirect(e)))?;
        let mut argv = argv.into_iter().map(String::from);
        let Some(name) = argv.next() else {
            return Ok(None);
        };
        let args: Vec<String> = argv.collect();

        debug!("running single command: {name} {args:?}");
        match exec::run_single(&name, &args, &plan, &self.history)? {
            RunOutcome::Ran(_) => Ok(None),
            RunOutcome::Exit(code) => Ok(Some(code)),
        }
    }

    fn run_pipeline_stages(&mut self, stages_tokens: Vec<Vec<Token>>) -> Result<i32, ShellError> {
        let mut stages = Vec::with_capacity(stages_tokens.len());
        for tokens in stages_tokens {
            let (argv, plan) = extract_redirections(tokens)
                .map_err(|e| ShellError::Syntax(SyntaxError::Redirect(e)))?;
            let mut argv = argv.into_iter().map(String::from);
            let Some(name) = argv.next() else {
                warn!("empty pipeline stage slipped past the splitter");
                continue;
            };
            stages.push(Stage { name, args: argv.collect(), plan });
        }

        pipeline::run_pipeline(&stages, &self.history)
    }
}

impl Default for Shell {
    fn default() -> Self {
        Self::new()
    }
}
