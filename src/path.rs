//! Path Resolver: given a bare command name, searches a colon-separated
//! `PATH` for the first directory entry that exists and is executable, per
//! SPEC_FULL.md §4.A.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

fn is_executable(path: &Path) -> bool {
    fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// Resolve `name` against `path_var` (the raw `PATH` value). If `name`
/// contains a `/`, the resolver is bypassed and `name` is returned verbatim
/// -- the caller (the executor) is responsible for that check, mirroring
/// SPEC_FULL.md's "bypassed entirely" wording; this function only handles
/// the bare-name, directory-search case.
pub fn resolve(name: &str, path_var: &str) -> Option<PathBuf> {
    path_var
        .split(':')
        .filter(|dir| !dir.is_empty())
        .map(|dir| Path::new(dir).join(name))
        .find(|candidate| is_executable(candidate))
}

/// The distinct basenames of every executable file reachable via
/// `path_var`, for the line-reader collaborator's completion source
/// (SPEC_FULL.md §6).
pub fn executable_names(path_var: &str) -> Vec<String> {
    let mut names = Vec::new();
    for dir in path_var.split(':').filter(|d| !d.is_empty()) {
        let Ok(entries) = fs::read_dir(dir) else {
            continue;
        };
        for entry in entries.flatten() {
            if is_executable(&entry.path()) {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
    }
    names
}
