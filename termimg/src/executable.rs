// ABOUTME: PATH lookup for helper programs such as ImageMagick's convert or a fuzzy finder
// ABOUTME: A candidate counts only when it is a regular file with an execute bit

use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// First executable called `name` on `$PATH`.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    find_executable_in(name, env::var_os("PATH")?.as_os_str())
}

/// First executable called `name` in the directories of a PATH-style list.
pub fn find_executable_in(name: &str, path: &OsStr) -> Option<PathBuf> {
    env::split_paths(path)
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
pub fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
pub fn is_executable(path: &Path) -> bool {
    path.is_file()
}
