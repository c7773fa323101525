//! Redirection Extractor: scans a command's unquoted tokens for `>`, `>>`,
//! `1>`, `1>>`, `2>`, `2>>`, removing each operator and its target from argv
//! and recording the result in a [`RedirectionPlan`], per SPEC_FULL.md §4.D.

use thiserror::Error;

use crate::token::Token;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RedirectError {
    #[error("syntax error after {0}")]
    MissingTarget(String),
}

/// Where a stream should go, set by one of `>`/`>>`/`2>`/`2>>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub path: String,
    pub append: bool,
}

impl Target {
    /// Open the target file per SPEC_FULL.md §6:
    /// `O_WRONLY|O_CREAT|O_TRUNC` or `O_WRONLY|O_CREAT|O_APPEND`, mode 0644
    /// modulo umask.
    pub fn open(&self) -> std::io::Result<std::fs::File> {
        use std::os::unix::fs::OpenOptionsExt;
        std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .append(self.append)
            .truncate(!self.append)
            .mode(0o644)
            .open(&self.path)
    }
}

/// Up to three optional targets; absence means "inherit from the shell".
/// `stdin_target` is unused by the extractor (stdin redirection is out of
/// scope per SPEC_FULL.md §1) but kept so the executor has a single plan
/// type to apply regardless of which streams are actually in play.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectionPlan {
    pub stdin_target: Option<Target>,
    pub stdout_target: Option<Target>,
    pub stderr_target: Option<Target>,
}

impl RedirectionPlan {
    pub fn is_empty(&self) -> bool {
        self.stdin_target.is_none() && self.stdout_target.is_none() && self.stderr_target.is_none()
    }
}

fn operator_kind(token: &Token) -> Option<(bool, bool)> {
    // Returns (is_stderr, append) for a recognized, unquoted operator.
    if token.quoted {
        return None;
    }
    match token.text.as_str() {
        ">" | "1>" => Some((false, false)),
        ">>" | "1>>" => Some((false, true)),
        "2>" => Some((true, false)),
        "2>>" => Some((true, true)),
        _ => None,
    }
}

/// Strip redirection operators out of `tokens`, returning the remaining
/// argv tokens and the accumulated plan. Later operators for the same
/// stream win over earlier ones (last-wins, per the data-model invariant).
pub fn extract_redirections(
    tokens: Vec<Token>,
) -> Result<(Vec<Token>, RedirectionPlan), RedirectError> {
    let mut argv = Vec::with_capacity(tokens.len());
    let mut plan = RedirectionPlan::default();

    let mut iter = tokens.into_iter();
    while let Some(token) = iter.next() {
        match operator_kind(&token) {
            Some((is_stderr, append)) => {
                let target_token = iter
                    .next()
                    .ok_or_else(|| RedirectError::MissingTarget(token.text.clone()))?;
                let target = Target {
                    path: target_token.text,
                    append,
                };
                if is_stderr {
                    plan.stderr_target = Some(target);
                } else {
                    plan.stdout_target = Some(target);
                }
            }
            None => argv.push(token),
        }
    }

    Ok((argv, plan))
}
