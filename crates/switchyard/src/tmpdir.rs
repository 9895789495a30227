//! Per-invocation scoped temporary directories.
//!
//! Commands that opt into the `--tmp_dir` family get a uniquely named
//! working directory under the chosen base, created before the command
//! runs and removed afterwards (on the failure path too) unless
//! retention was requested. The directory name embeds the script name, the
//! command name and, under a recognized cluster scheduler, the job id and
//! array index, so leftover directories on shared filesystems can be traced
//! back to the run that made them.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Cluster-scheduler job identity, resolved once from the environment.
///
/// `LSB_JOBID` (LSF) is consulted before `JOB_ID` (UGE/GridEngine). The
/// array index comes from `LSB_JOBINDEX` and defaults to `"0"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobContext {
    /// The scheduler job id, if running under a scheduler.
    pub id: Option<String>,
    /// The job-array index.
    pub index: String,
}

impl JobContext {
    /// Reads the scheduler variables from the process environment.
    pub fn from_env() -> Self {
        let id = ["LSB_JOBID", "JOB_ID"]
            .iter()
            .find_map(|key| env::var(key).ok());
        let index = env::var("LSB_JOBINDEX").unwrap_or_else(|_| "0".to_string());
        Self { id, index }
    }
}

/// The deterministic directory-name prefix for one command invocation.
pub fn proposed_name(script: &str, command: &str, job: &JobContext) -> String {
    match &job.id {
        Some(id) => format!("tmp-{script}-{command}-{id}-{}", job.index),
        None => format!("tmp-{script}-{command}"),
    }
}

/// A uniquely named working directory owned by one command execution.
///
/// Created as `<base>/<prefix>-<random>` and removed when the guard drops
/// unless [`keep`](Self::keep) was called first. Dropping covers every exit
/// path out of the command: success, error return and unwind alike.
#[derive(Debug)]
pub struct ScopedTempDir {
    path: PathBuf,
    keep: bool,
}

impl ScopedTempDir {
    /// Creates the directory and points `TMPDIR` at it, so subprocess
    /// tooling launched by the command shares the same scope.
    pub fn create(base: &Path, prefix: &str) -> std::io::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("{prefix}-"))
            .tempdir_in(base)?;
        let path = dir.keep();
        log::debug!("using tempDir: {}", path.display());
        env::set_var("TMPDIR", &path);
        Ok(Self { path, keep: false })
    }

    /// The directory's path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Leaves the directory in place when the guard drops.
    pub fn keep(&mut self) {
        self.keep = true;
    }
}

impl Drop for ScopedTempDir {
    fn drop(&mut self) {
        if self.keep {
            log::info!("keeping tmp_dir at {}", self.path.display());
        } else if let Err(err) = fs::remove_dir_all(&self.path) {
            log::warn!("could not remove {}: {err}", self.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    /// Restores `TMPDIR` to its prior value when dropped, so a test that
    /// creates a `ScopedTempDir` (which publishes `TMPDIR` and removes the
    /// directory it points at) does not leave a dangling `TMPDIR` behind for
    /// the next `#[serial]` test's `tempfile::tempdir()` call.
    struct TmpdirEnvGuard(Option<std::ffi::OsString>);

    impl TmpdirEnvGuard {
        fn new() -> Self {
            Self(env::var_os("TMPDIR"))
        }
    }

    impl Drop for TmpdirEnvGuard {
        fn drop(&mut self) {
            match &self.0 {
                Some(value) => env::set_var("TMPDIR", value),
                None => env::remove_var("TMPDIR"),
            }
        }
    }

    fn clear_job_env() {
        for key in ["LSB_JOBID", "JOB_ID", "LSB_JOBINDEX"] {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_job_context_without_scheduler() {
        clear_job_env();
        let job = JobContext::from_env();
        assert_eq!(job.id, None);
        assert_eq!(job.index, "0");
    }

    #[test]
    #[serial]
    fn test_job_context_lsf_wins_over_uger() {
        clear_job_env();
        env::set_var("JOB_ID", "900");
        env::set_var("LSB_JOBID", "1234");
        env::set_var("LSB_JOBINDEX", "7");

        let job = JobContext::from_env();
        assert_eq!(job.id.as_deref(), Some("1234"));
        assert_eq!(job.index, "7");
        clear_job_env();
    }

    #[test]
    fn test_proposed_name_plain_and_with_job() {
        let plain = JobContext {
            id: None,
            index: "0".into(),
        };
        assert_eq!(proposed_name("tool", "align", &plain), "tmp-tool-align");

        let job = JobContext {
            id: Some("1234".into()),
            index: "7".into(),
        };
        assert_eq!(
            proposed_name("tool", "align", &job),
            "tmp-tool-align-1234-7"
        );
    }

    #[test]
    #[serial]
    fn test_scoped_dir_removed_on_drop() {
        let _tmpdir = TmpdirEnvGuard::new();
        let base = tempfile::tempdir().unwrap();
        let created;
        {
            let scoped = ScopedTempDir::create(base.path(), "tmp-tool-align").unwrap();
            created = scoped.path().to_path_buf();
            assert!(created.is_dir());
            assert!(created
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("tmp-tool-align-"));
            assert_eq!(env::var("TMPDIR").unwrap(), created.display().to_string());
        }
        assert!(!created.exists());
    }

    #[test]
    #[serial]
    fn test_scoped_dir_kept_on_request() {
        let _tmpdir = TmpdirEnvGuard::new();
        let base = tempfile::tempdir().unwrap();
        let created;
        {
            let mut scoped = ScopedTempDir::create(base.path(), "tmp-tool-align").unwrap();
            scoped.keep();
            created = scoped.path().to_path_buf();
        }
        assert!(created.is_dir());
        fs::remove_dir_all(&created).unwrap();
    }

    #[test]
    #[serial]
    fn test_scoped_dir_removed_when_command_unwinds() {
        let _tmpdir = TmpdirEnvGuard::new();
        let base = tempfile::tempdir().unwrap();
        let created = std::cell::RefCell::new(PathBuf::new());

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let scoped = ScopedTempDir::create(base.path(), "tmp-tool-align").unwrap();
            *created.borrow_mut() = scoped.path().to_path_buf();
            panic!("command blew up");
        }));

        assert!(result.is_err());
        assert!(!created.borrow().exists());
    }
}
