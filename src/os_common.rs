//! Process exit status, shared by every layer that waits on a child.

/// How a child process ended.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum ExitStatus {
    /// Exited normally with the given status code.
    Exited(u32),
    /// Terminated by the given signal number.
    Signaled(u8),
    /// Any other encoding produced by `waitpid(2)`.
    Other(i32),
}

impl ExitStatus {
    /// True for a normal exit with status 0.
    pub fn success(&self) -> bool {
        matches!(self, ExitStatus::Exited(0))
    }

    /// The process's exit code as reported to a POSIX parent, or 128+signal
    /// for a signal death, matching common shell convention.
    pub fn code(&self) -> i32 {
        match *self {
            ExitStatus::Exited(code) => code as i32,
            ExitStatus::Signaled(sig) => 128 + sig as i32,
            ExitStatus::Other(raw) => raw,
        }
    }
}
