//! Built-in Dispatcher: `exit`, `echo`, `pwd`, `cd`, `type`, `history`, per
//! SPEC_FULL.md §4.E. Each builtin is a pure function of
//! `(argv, stdout, stderr, shell-state)`; `stdin`/`stdout`/`stderr` are
//! whatever the OS file descriptors 0/1/2 currently point at, since by the
//! time a builtin runs, the executor (single-command or pipeline) has
//! already wired up redirection at the fd level -- the builtin never needs
//! to know whether it's writing to a terminal, a file, or a pipe.

use std::io::Write;
use std::path::PathBuf;

use crate::error::ShellError;
use crate::path;

/// The fixed, ordered set of builtin names. Used by the dispatcher and by
/// `type`/completion introspection.
pub const BUILTIN_NAMES: &[&str] = &["exit", "echo", "type", "pwd", "cd", "history"];

pub fn is_builtin(name: &str) -> bool {
    BUILTIN_NAMES.contains(&name)
}

/// What happened after a builtin ran. Only `exit`, when run directly in the
/// REPL process (never inside a forked pipeline stage), produces `Exit`;
/// everywhere else a builtin just reports a status like any other command.
pub enum Outcome {
    Continue(i32),
    Exit(i32),
}

/// Mutable shell state a builtin may need: the command history (for
/// `history`) and `cd`'s target environment lookups. `cd` and `exit` are the
/// only builtins that ever see this by mutable reference in practice (the
/// others only read `std::env`), but all of them take it for a uniform
/// signature.
pub struct ShellState<'a> {
    pub history: &'a [String],
}

/// Dispatch `name(args)`. `name` must satisfy [`is_builtin`].
pub fn run(
    name: &str,
    args: &[String],
    state: &ShellState<'_>,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> Result<Outcome, ShellError> {
    match name {
        "exit" => exit(args, stderr),
        "echo" => echo(args, stdout),
        "pwd" => pwd(stdout),
        "cd" => cd(args, stderr),
        "type" => r#type(args, stdout, stderr),
        "history" => history(args, state, stdout, stderr),
        other => unreachable!("{other} is not a builtin"),
    }
}

fn exit(args: &[String], stderr: &mut dyn Write) -> Result<Outcome, ShellError> {
    match args.first() {
        None => Ok(Outcome::Exit(0)),
        Some(code_str) => match code_str.parse::<i32>() {
            Ok(code) => Ok(Outcome::Exit(code)),
            Err(_) => {
                let _ = writeln!(stderr, "exit: {code_str}: numeric argument required");
                Ok(Outcome::Continue(1))
            }
        },
    }
}

fn echo(args: &[String], stdout: &mut dyn Write) -> Result<Outcome, ShellError> {
    let line = args.join(" ");
    writeln!(stdout, "{line}").map_err(|e| ShellError::os("echo", e))?;
    Ok(Outcome::Continue(0))
}

fn pwd(stdout: &mut dyn Write) -> Result<Outcome, ShellError> {
    let cwd = std::env::current_dir().map_err(|e| ShellError::os("pwd", e))?;
    writeln!(stdout, "{}", cwd.display()).map_err(|e| ShellError::os("pwd", e))?;
    Ok(Outcome::Continue(0))
}

fn cd(args: &[String], stderr: &mut dyn Write) -> Result<Outcome, ShellError> {
    let target: PathBuf = match args.first().map(String::as_str) {
        None | Some("~") => match std::env::var("HOME") {
            Ok(home) => PathBuf::from(home),
            Err(_) => {
                let _ = writeln!(stderr, "cd: HOME not set");
                return Ok(Outcome::Continue(1));
            }
        },
        Some(arg) => {
            if let Some(rest) = arg.strip_prefix("~/") {
                match std::env::var("HOME") {
                    Ok(home) => PathBuf::from(home).join(rest),
                    Err(_) => {
                        let _ = writeln!(stderr, "cd: HOME not set");
                        return Ok(Outcome::Continue(1));
                    }
                }
            } else {
                PathBuf::from(arg)
            }
        }
    };

    match std::env::set_current_dir(&target) {
        Ok(()) => Ok(Outcome::Continue(0)),
        Err(e) => {
            let arg_display = args.first().map(String::as_str).unwrap_or("~");
            let _ = writeln!(stderr, "cd: {arg_display}: {e}");
            Ok(Outcome::Continue(1))
        }
    }
}

fn r#type(
    args: &[String],
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> Result<Outcome, ShellError> {
    let Some(name) = args.first() else {
        let _ = writeln!(stderr, "usage: type name");
        return Ok(Outcome::Continue(1));
    };

    if is_builtin(name) {
        writeln!(stdout, "{name} is a shell builtin").map_err(|e| ShellError::os("type", e))?;
        return Ok(Outcome::Continue(0));
    }

    let path_var = std::env::var("PATH").unwrap_or_default();
    match path::resolve(name, &path_var) {
        Some(resolved) => {
            writeln!(stdout, "{name} is {}", resolved.display())
                .map_err(|e| ShellError::os("type", e))?;
            Ok(Outcome::Continue(0))
        }
        None => {
            writeln!(stdout, "{name}: not found").map_err(|e| ShellError::os("type", e))?;
            Ok(Outcome::Continue(1))
        }
    }
}

fn history(
    args: &[String],
    state: &ShellState<'_>,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> Result<Outcome, ShellError> {
    let limit = match args.first() {
        None => state.history.len(),
        Some(n) => match n.parse::<usize>() {
            Ok(n) => n,
            Err(_) => {
                let _ = writeln!(stderr, "history: {n}: numeric argument required");
                return Ok(Outcome::Continue(1));
            }
        },
    };

    let start = state.history.len().saturating_sub(limit);
    for (offset, line) in state.history[start..].iter().enumerate() {
        writeln!(stdout, "{:>5}  {}", start + offset + 1, line)
            .map_err(|e| ShellError::os("history", e))?;
    }
    Ok(Outcome::Continue(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(history: &[String]) -> ShellState<'_> {
        ShellState { history }
    }

    #[test]
    fn echo_joins_with_single_spaces() {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let args = vec!["hello".to_string(), "world".to_string()];
        run("echo", &args, &state(&[]), &mut out, &mut err).unwrap();
        assert_eq!(out, b"hello world\n");
    }

    #[test]
    fn type_reports_builtins() {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let args = vec!["echo".to_string()];
        run("type", &args, &state(&[]), &mut out, &mut err).unwrap();
        assert_eq!(out, b"echo is a shell builtin\n");
    }

    #[test]
    fn type_reports_not_found() {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let args = vec!["definitely_not_a_real_command_xyz".to_string()];
        // Force an empty PATH so this is deterministic.
        let saved = std::env::var("PATH").ok();
        unsafe { std::env::remove_var("PATH") };
        run("type", &args, &state(&[]), &mut out, &mut err).unwrap();
        if let Some(p) = saved {
            unsafe { std::env::set_var("PATH", p) };
        }
        assert_eq!(out, b"definitely_not_a_real_command_xyz: not found\n");
    }

    #[test]
    fn history_prints_one_indexed() {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let hist = vec!["echo a".to_string(), "echo b".to_string()];
        run("history", &[], &state(&hist), &mut out, &mut err).unwrap();
        assert_eq!(out, b"    1  echo a\n    2  echo b\n");
    }

    #[test]
    fn history_with_limit_prints_last_n() {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let hist = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        run("history", &["1".to_string()], &state(&hist), &mut out, &mut err).unwrap();
        assert_eq!(out, b"    3  c\n");
    }

    #[test]
    fn exit_with_no_args_is_code_zero() {
        let mut err = Vec::new();
        match run("exit", &[], &state(&[]), &mut Vec::new(), &mut err).unwrap() {
            Outcome::Exit(code) => assert_eq!(code, 0),
            Outcome::Continue(_) => panic!("expected Exit"),
        }
    }

    #[test]
    fn exit_with_non_integer_reports_usage_and_continues() {
        let mut err = Vec::new();
        let args = vec!["banana".to_string()];
        match run("exit", &args, &state(&[]), &mut Vec::new(), &mut err).unwrap() {
            Outcome::Continue(1) => {}
            _ => panic!("expected Continue(1)"),
        }
        assert!(!err.is_empty());
    }
}
