//! An interactive POSIX-style shell: tokenizer, pipeline splitter,
//! redirection extractor, built-in dispatcher, and a fork/pipe/exec based
//! executor, fronted by a `rustyline`-backed REPL driver.

extern crate libc;

mod builtins;
mod error;
mod exec;
mod lexer;
mod line_reader;
mod os_common;
mod path;
mod pipeline;
mod posix;
mod redirect;
mod shell;
mod splitter;
mod token;

pub use error::{ShellError, SyntaxError};
pub use shell::Shell;
