//! Thin, checked wrappers around the POSIX calls the executor needs:
//! `fork`, `pipe`, `dup2`, `execvp`, `waitpid`, `kill`. Everything here
//! returns `std::io::Result` and translates `-1` returns into
//! `Error::last_os_error()`, the same convention `std::fs`/`std::net` use.

use std::ffi::{CString, OsStr};
use std::fs::File;
use std::io::{Error, Result};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::io::{FromRawFd, RawFd};
use std::ptr;

use crate::os_common::ExitStatus;

fn check_err<T: Ord + Default>(num: T) -> Result<T> {
    if num < T::default() {
        return Err(Error::last_os_error());
    }
    Ok(num)
}

/// Create an anonymous pipe, returning `(read_end, write_end)`.
pub fn pipe() -> Result<(File, File)> {
    let mut fds = [0 as libc::c_int; 2];
    check_err(unsafe { libc::pipe(fds.as_mut_ptr()) })?;
    Ok(unsafe { (File::from_raw_fd(fds[0]), File::from_raw_fd(fds[1])) })
}

/// Fork the process. Returns `0` in the child, the child's pid in the parent.
///
/// # Safety
/// Only async-signal-safe operations are permitted between `fork` returning
/// in the child and the child calling `execvp` or `_exit`.
pub unsafe fn fork() -> Result<u32> {
    check_err(libc::fork()).map(|pid| pid as u32)
}

fn os_to_cstring(s: &OsStr) -> Result<CString> {
    let bytes = s.as_bytes();
    if bytes.iter().any(|&b| b == 0) {
        return Err(Error::from_raw_os_error(libc::EINVAL));
    }
    // Unix paths and argv entries are already NUL-free byte strings.
    Ok(CString::new(bytes).expect("no interior NUL checked above"))
}

/// Replace the running process image, searching `PATH` the way the shell
/// (not the kernel) normally does -- i.e. this calls `execvp(3)`, which does
/// its own `PATH` search, so `args[0]` may be a bare name.
pub fn execvp<S1, S2>(cmd: S1, args: &[S2]) -> Result<()>
where
    S1: AsRef<OsStr>,
    S2: AsRef<OsStr>,
{
    let args_cstring: Vec<CString> = args
        .iter()
        .map(|a| os_to_cstring(a.as_ref()))
        .collect::<Result<_>>()?;
    let mut argv: Vec<*const libc::c_char> =
        args_cstring.iter().map(|s| s.as_ptr()).collect();
    argv.push(ptr::null());

    let cmd_cstring = os_to_cstring(cmd.as_ref())?;
    check_err(unsafe { libc::execvp(cmd_cstring.as_ptr(), argv.as_ptr()) })?;
    Ok(())
}

/// `_exit(2)`: terminate immediately, skipping atexit handlers and unwinding.
/// Used in a forked child after a failed `execvp`, so the parent's buffers
/// (and Rust's normal `exit` machinery) are never touched by the child.
pub fn exit_now(status: u8) -> ! {
    unsafe { libc::_exit(status as libc::c_int) }
}

/// `waitpid(2)`, decoding the raw status into [`ExitStatus`].
pub fn waitpid(pid: u32, flags: i32) -> Result<(u32, ExitStatus)> {
    let mut status: libc::c_int = 0;
    let got = check_err(unsafe {
        libc::waitpid(pid as libc::pid_t, &mut status, flags)
    })?;
    Ok((got as u32, decode_exit_status(status)))
}

fn decode_exit_status(status: libc::c_int) -> ExitStatus {
    unsafe {
        if libc::WIFEXITED(status) {
            ExitStatus::Exited(libc::WEXITSTATUS(status) as u32)
        } else if libc::WIFSIGNALED(status) {
            ExitStatus::Signaled(libc::WTERMSIG(status) as u8)
        } else {
            ExitStatus::Other(status)
        }
    }
}

pub const SIGTERM: u8 = libc::SIGTERM as u8;

pub fn kill(pid: u32, signal: u8) -> Result<()> {
    check_err(unsafe { libc::kill(pid as libc::c_int, signal as libc::c_int) })?;
    Ok(())
}

/// Duplicate `oldfd` onto `newfd`, closing whatever `newfd` used to be.
pub fn dup2(oldfd: RawFd, newfd: RawFd) -> Result<()> {
    check_err(unsafe { libc::dup2(oldfd, newfd) })?;
    Ok(())
}

/// Duplicate `fd` onto the lowest unused descriptor. Used to save a
/// standard stream before temporarily redirecting it, so it can be
/// restored afterward.
pub fn dup(fd: RawFd) -> Result<RawFd> {
    check_err(unsafe { libc::dup(fd) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    #[test]
    fn pipe_round_trips_bytes() {
        let (mut read_end, mut write_end) = pipe().unwrap();
        write_end.write_all(b"hello").unwrap();
        drop(write_end);
        let mut buf = String::new();
        read_end.read_to_string(&mut buf).unwrap();
        assert_eq!(buf, "hello");
    }

    #[test]
    fn fork_wait_reports_exit_code() {
        let pid = unsafe { fork() }.unwrap();
        if pid == 0 {
            exit_now(7);
        }
        let (got_pid, status) = waitpid(pid, 0).unwrap();
        assert_eq!(got_pid, pid);
        assert_eq!(status, ExitStatus::Exited(7));
    }
}
