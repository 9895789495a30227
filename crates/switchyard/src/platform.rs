//! Platform seams the controller calls into: base temp-dir resolution and
//! the global keep-temp override.

use std::env;
use std::path::PathBuf;

/// Environment flag that forces every scoped temp directory to be kept,
/// regardless of `--tmp_dirKeep`.
pub const KEEP_TMP_ENV: &str = "SWITCHYARD_TMP_DIRKEEP";

/// Resolves the default base directory for `--tmp_dir`.
pub fn find_tmp_dir() -> PathBuf {
    env::temp_dir()
}

/// Returns true when the keep-temp override is active.
pub fn keep_tmp() -> bool {
    env::var_os(KEEP_TMP_ENV).is_some_and(|v| !v.is_empty())
}
