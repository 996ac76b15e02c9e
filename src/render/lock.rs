use std::{
    fs::OpenOptions,
    io::Write as _,
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

use anyhow::Context as _;

use crate::error::{MatvizError, MatvizResult};

/// Exclusive marker held while a render is in flight; removed on drop.
#[derive(Debug)]
pub struct RenderLock {
    path: PathBuf,
}

impl RenderLock {
    /// Create the lock file, failing with [`MatvizError::Busy`] when another holder exists.
    ///
    /// A lock file older than `stale_after` is assumed to belong to a crashed run and is
    /// replaced.
    pub fn acquire(path: &Path, stale_after: Duration) -> MatvizResult<Self> {
        let mut retried = false;
        loop {
            let err = match Self::try_create(path) {
                Ok(lock) => return Ok(lock),
                Err(e) => e,
            };
            if err.kind() != std::io::ErrorKind::AlreadyExists {
                return Err(anyhow::Error::new(err)
                    .context(format!("create lock '{}'", path.display()))
                    .into());
            }

            let age = match lock_age(path) {
                Ok(age) => age,
                // Released between our create attempt and the stat.
                Err(e) if e.kind() == std::io::ErrorKind::NotFound && !retried => {
                    retried = true;
                    continue;
                }
                Err(_) => None,
            };
            if !age.is_some_and(|age| age > stale_after) {
                return Err(MatvizError::busy(format!(
                    "another render is in progress (lock file '{}'); remove it if no render is running",
                    path.display()
                )));
            }

            tracing::warn!(path = %path.display(), "replacing stale render lock");
            std::fs::remove_file(path)
                .with_context(|| format!("remove stale lock '{}'", path.display()))?;
            return Ok(Self::try_create(path)
                .with_context(|| format!("create lock '{}'", path.display()))?);
        }
    }

    fn try_create(path: &Path) -> std::io::Result<Self> {
        let mut f = OpenOptions::new().write(true).create_new(true).open(path)?;
        writeln!(f, "{}", std::process::id())?;
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RenderLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Age of the lock file, `None` when the clock or filesystem cannot tell.
fn lock_age(path: &Path) -> std::io::Result<Option<Duration>> {
    let modified = std::fs::metadata(path)?.modified().ok();
    Ok(modified.and_then(|t| SystemTime::now().duration_since(t).ok()))
}
