//! External Executor (SPEC_FULL.md §4.F) and the single-command dispatch
//! that decides, for one unpiped stage, whether to run a builtin in-process
//! or fork-and-exec an external program.

use std::io::{self, Write};
use std::os::unix::io::AsRawFd;

use crate::builtins::{self, Outcome, ShellState};
use crate::error::ShellError;
use crate::os_common::ExitStatus;
use crate::path;
use crate::posix;
use crate::redirect::RedirectionPlan;

/// Applies `plan` to *this* process's real stdout/stderr (fd 1 / fd 2),
/// opening any target files, and restores the original descriptors when
/// dropped. Used to let an in-process builtin honor redirection without
/// forking, per SPEC_FULL.md §4.E ("Other built-ins may execute in-process
/// in the single-command case").
struct RedirectGuard {
    saved_stdout: Option<i32>,
    saved_stderr: Option<i32>,
}

impl RedirectGuard {
    fn apply(plan: &RedirectionPlan) -> Result<Self, ShellError> {
        let mut guard = RedirectGuard { saved_stdout: None, saved_stderr: None };

        if let Some(target) = &plan.stdout_target {
            guard.saved_stdout =
                Some(posix::dup(1).map_err(|e| ShellError::os("dup stdout", e))?);
            let file = target.open().map_err(|e| ShellError::os(&target.path, e))?;
            posix::dup2(file.as_raw_fd(), 1).map_err(|e| ShellError::os("redirect stdout", e))?;
        }
        if let Some(target) = &plan.stderr_target {
            guard.saved_stderr =
                Some(posix::dup(2).map_err(|e| ShellError::os("dup stderr", e))?);
            let file = target.open().map_err(|e| ShellError::os(&target.path, e))?;
            posix::dup2(file.as_raw_fd(), 2).map_err(|e| ShellError::os("redirect stderr", e))?;
        }
        Ok(guard)
    }
}

impl Drop for RedirectGuard {
    fn drop(&mut self) {
        if let Some(saved) = self.saved_stdout.take() {
            let _ = posix::dup2(saved, 1);
            unsafe { libc::close(saved) };
        }
        if let Some(saved) = self.saved_stderr.take() {
            let _ = posix::dup2(saved, 2);
            unsafe { libc::close(saved) };
        }
    }
}

/// Open all of `plan`'s targets and `dup2` them onto fd 0/1/2 in the
/// current process. Meant to run inside an already-forked child, right
/// before exec or before running a builtin that will immediately exit --
/// there is nothing to restore.
pub(crate) fn apply_redirection_in_child(plan: &RedirectionPlan) -> io::Result<()> {
    if let Some(target) = &plan.stdin_target {
        let file = target.open()?;
        posix::dup2(file.as_raw_fd(), 0)?;
    }
    if let Some(target) = &plan.stdout_target {
        let file = target.open()?;
        posix::dup2(file.as_raw_fd(), 1)?;
    }
    if let Some(target) = &plan.stderr_target {
        let file = target.open()?;
        posix::dup2(file.as_raw_fd(), 2)?;
    }
    Ok(())
}

/// Result of running a single, unpiped line.
pub enum RunOutcome {
    /// The command (builtin or external) ran; carries its exit code.
    Ran(i32),
    /// `exit` was invoked directly in the REPL process.
    Exit(i32),
}

/// Run one unpiped command: `name` plus `args`, with `plan` applied.
/// Builtins run in-process (so `cd`/`exit` can mutate shell state);
/// everything else is forked and exec'd per §4.F.
pub fn run_single(
    name: &str,
    args: &[String],
    plan: &RedirectionPlan,
    history: &[String],
) -> Result<RunOutcome, ShellError> {
    if builtins::is_builtin(name) {
        let _guard = RedirectGuard::apply(plan)?;
        let state = ShellState { history };
        let mut stdout = io::stdout();
        let mut stderr = io::stderr();
        return match builtins::run(name, args, &state, &mut stdout, &mut stderr)? {
            Outcome::Continue(code) => Ok(RunOutcome::Ran(code)),
            Outcome::Exit(code) => Ok(RunOutcome::Exit(code)),
        };
    }

    run_external(name, args, plan).map(RunOutcome::Ran)
}

/// Fork, apply redirection, resolve and exec `name`, and wait for it.
/// This is the External Executor of SPEC_FULL.md §4.F, usable both for a
/// single unpiped command and (via [`crate::pipeline`]) as one stage of a
/// larger pipeline.
pub fn run_external(name: &str, args: &[String], plan: &RedirectionPlan) -> Result<i32, ShellError> {
    let path_var = std::env::var("PATH").unwrap_or_default();
    let resolved = if name.contains('/') {
        Some(name.to_string())
    } else {
        path::resolve(name, &path_var).map(|p| p.to_string_lossy().into_owned())
    };

    let Some(resolved) = resolved else {
        eprintln!("{name}: command not found");
        return Ok(127);
    };

    let mut argv = Vec::with_capacity(args.len() + 1);
    argv.push(name.to_string());
    argv.extend(args.iter().cloned());

    // Safety: between fork() and _exit()/execvp() only async-signal-safe
    // work happens in the child -- fd juggling and execvp, nothing that
    // allocates on a shared heap lock or touches Rust runtime state.
    let pid = unsafe { posix::fork() }.map_err(|e| ShellError::os("fork", e))?;
    if pid == 0 {
        if apply_redirection_in_child(plan).is_err() {
            posix::exit_now(1);
        }
        if let Err(e) = posix::execvp(&resolved, &argv) {
            eprintln!("{name}: {e}");
            posix::exit_now(1);
        }
        unreachable!("execvp only returns on error");
    }

    let (_, status) = posix::waitpid(pid, 0).map_err(|e| ShellError::os("waitpid", e))?;
    Ok(exit_code(status))
}

pub(crate) fn exit_code(status: ExitStatus) -> i32 {
    status.code()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redirect::{RedirectionPlan, Target};
    use std::fs;

    #[test]
    fn runs_external_and_waits() {
        let status = run_external("true", &[], &RedirectionPlan::default()).unwrap();
        assert_eq!(status, 0);
    }

    #[test]
    fn reports_nonzero_exit() {
        let status = run_external("false", &[], &RedirectionPlan::default()).unwrap();
        assert_eq!(status, 1);
    }

    #[test]
    fn unknown_command_is_127() {
        let status =
            run_external("definitely_missing_xyz", &[], &RedirectionPlan::default()).unwrap();
        assert_eq!(status, 127);
    }

    #[test]
    fn resolved_but_non_executable_file_is_exec_failure_not_127() {
        // A `/`-containing path bypasses the resolver (§4.A), so this exists
        // and is found, but lacks the execute bit -- EACCES from execvp, not
        // a resolution failure, per §4.F/§7.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noexec");
        fs::write(&path, "not a real program\n").unwrap();

        let status = run_external(path.to_str().unwrap(), &[], &RedirectionPlan::default()).unwrap();
        assert_eq!(status, 1);
    }

    #[test]
    fn external_stdout_redirection_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.txt");
        let mut plan = RedirectionPlan::default();
        plan.stdout_target = Some(Target { path: out.to_str().unwrap().into(), append: false });

        let status =
            run_external("echo", &["hi".to_string()], &plan).unwrap();
        assert_eq!(status, 0);
        assert_eq!(fs::read_to_string(&out).unwrap(), "hi\n");
    }

    #[test]
    fn builtin_echo_runs_in_process() {
        let outcome = run_single("echo", &["hi".to_string()], &RedirectionPlan::default(), &[]).unwrap();
        match outcome {
            RunOutcome::Ran(code) => assert_eq!(code, 0),
            RunOutcome::Exit(_) => panic!("echo should not exit the shell"),
        }
    }

    #[test]
    fn builtin_exit_reports_exit_outcome() {
        let outcome =
            run_single("exit", &["3".to_string()], &RedirectionPlan::default(), &[]).unwrap();
        match outcome {
            RunOutcome::Exit(code) => assert_eq!(code, 3),
            RunOutcome::Ran(_) => panic!("expected Exit"),
        }
    }
}
