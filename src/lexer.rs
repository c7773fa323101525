//! Tokenizer: a three-state character machine (`Default`, `InSingle`,
//! `InDouble`) that turns one raw input line into an ordered [`Token`]
//! sequence, per SPEC_FULL.md §4.B.

use thiserror::Error;

use crate::token::Token;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LexError {
    #[error("unmatched '")]
    UnmatchedSingleQuote,
    #[error("unmatched \"")]
    UnmatchedDoubleQuote,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Default,
    InSingle,
    InDouble,
}

/// Tokenize one line of input. See SPEC_FULL.md §4.B for the full
/// transition table; this is a direct transcription of it.
pub fn tokenize(line: &str) -> Result<Vec<Token>, LexError> {
    let mut tokens = Vec::new();
    let mut buf = String::new();
    let mut quoted = false;
    let mut open = false; // has the current token buffer been "started"?
    let mut state = State::Default;
    let mut chars = line.chars().peekable();

    let flush = |tokens: &mut Vec<Token>, buf: &mut String, quoted: &mut bool, open: &mut bool| {
        if *open {
            tokens.push(Token::new(std::mem::take(buf), *quoted));
        }
        *quoted = false;
        *open = false;
    };

    while let Some(c) = chars.next() {
        match state {
            State::Default => match c {
                c if c.is_whitespace() => {
                    flush(&mut tokens, &mut buf, &mut quoted, &mut open);
                }
                '|' => {
                    flush(&mut tokens, &mut buf, &mut quoted, &mut open);
                    tokens.push(Token::new("|".to_string(), false));
                }
                '\'' => {
                    state = State::InSingle;
                    open = true;
                    quoted = true;
                }
                '"' => {
                    state = State::InDouble;
                    open = true;
                    quoted = true;
                }
                '\\' => {
                    open = true;
                    if let Some(next) = chars.next() {
                        buf.push(next);
                    }
                    // A trailing lone backslash at end-of-input is ignored
                    // (SPEC_FULL.md §9 Open Question 2).
                }
                other => {
                    open = true;
                    buf.push(other);
                }
            },
            State::InSingle => match c {
                '\'' => state = State::Default,
                other => buf.push(other),
            },
            State::InDouble => match c {
                '"' => state = State::Default,
                '\\' => match chars.peek() {
                    Some(&next) if next == '\\' || next == '"' || next == '$' => {
                        buf.push(next);
                        chars.next();
                    }
                    _ => buf.push('\\'),
                },
                other => buf.push(other),
            },
        }
    }

    match state {
        State::Default => {
            flush(&mut tokens, &mut buf, &mut quoted, &mut open);
            Ok(tokens)
        }
        State::InSingle => Err(LexError::UnmatchedSingleQuote),
        State::InDouble => Err(LexError::UnmatchedDoubleQuote),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn splits_on_whitespace() {
        let tokens = tokenize("echo hello world").unwrap();
        assert_eq!(texts(&tokens), vec!["echo", "hello", "world"]);
    }

    #[test]
    fn double_quotes_preserve_internal_whitespace() {
        let tokens = tokenize(r#"echo "hello   world""#).unwrap();
        assert_eq!(texts(&tokens), vec!["echo", "hello   world"]);
        assert!(tokens[1].quoted);
    }

    #[test]
    fn single_quotes_are_fully_literal() {
        let tokens = tokenize(r"echo 'a\nb'").unwrap();
        assert_eq!(texts(&tokens), vec!["echo", r"a\nb"]);
    }

    #[test]
    fn double_quote_escape_exceptions() {
        let tokens = tokenize(r#"echo "a\"b\\c\$d\qe""#).unwrap();
        // \" -> ", \\ -> \, \$ -> $, but \q is literal backslash-q.
        assert_eq!(texts(&tokens), vec!["echo", r#"a"b\c$d\qe"#]);
    }

    #[test]
    fn unquoted_backslash_is_literal_next_char() {
        let tokens = tokenize(r"echo foo\ bar").unwrap();
        assert_eq!(texts(&tokens), vec!["echo", "foo bar"]);
    }

    #[test]
    fn trailing_lone_backslash_is_ignored() {
        let tokens = tokenize(r"echo foo\").unwrap();
        assert_eq!(texts(&tokens), vec!["echo", "foo"]);
    }

    #[test]
    fn unquoted_pipe_is_its_own_token() {
        let tokens = tokenize("echo hi|wc -c").unwrap();
        assert_eq!(texts(&tokens), vec!["echo", "hi", "|", "wc", "-c"]);
    }

    #[test]
    fn quoted_pipe_is_not_an_operator() {
        let tokens = tokenize("echo '|'").unwrap();
        assert!(tokens[1].is_operator("|") == false);
        assert_eq!(tokens[1].text, "|");
    }

    #[test]
    fn unmatched_single_quote_errors() {
        assert_eq!(tokenize("echo 'oops").unwrap_err(), LexError::UnmatchedSingleQuote);
    }

    #[test]
    fn unmatched_double_quote_errors() {
        assert_eq!(tokenize(r#"cat "unclosed"#).unwrap_err(), LexError::UnmatchedDoubleQuote);
    }

    #[test]
    fn empty_line_yields_no_tokens() {
        assert_eq!(tokenize("   ").unwrap(), vec![]);
    }

    #[test]
    fn adjacent_quote_forms_concatenate_into_one_token() {
        let tokens = tokenize(r#"echo 'foo'"bar""#).unwrap();
        assert_eq!(texts(&tokens), vec!["echo", "foobar"]);
    }
}
