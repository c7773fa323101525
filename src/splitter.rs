//! Pipeline Splitter: partitions a token sequence on unquoted `|` into an
//! ordered list of non-empty command token sequences, per SPEC_FULL.md §4.C.

use thiserror::Error;

use crate::token::Token;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SplitError {
    #[error("null command in pipeline")]
    EmptyStage,
}

/// Split `tokens` on unquoted `|` tokens into one non-empty chunk per stage.
pub fn split_pipeline(tokens: Vec<Token>) -> Result<Vec<Vec<Token>>, SplitError> {
    let mut stages = Vec::new();
    let mut current = Vec::new();

    for token in tokens {
        if token.is_operator("|") {
            if current.is_empty() {
                return Err(SplitError::EmptyStage);
            }
            stages.push(std::mem::take(&mut current));
        } else {
            current.push(token);
        }
    }

    if current.is_empty() {
        if stages.is_empty() {
            // No `|` at all and nothing accumulated: caller passed an empty
            // token vector (blank line); that's not a pipeline at all, so
            // return no stages rather than erroring.
            return Ok(stages);
        }
        return Err(SplitError::EmptyStage);
    }
    stages.push(current);

    Ok(stages)
}
