//! Per-address login attempt counters.
//!
//! Each client address gets one file, `login_attempts_<addr>`, holding a JSON
//! array of unix timestamps. Attempts older than the window are ignored on
//! every check and dropped on every write.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};
use wgpanel_core::fsutil::{self, FileLock};

pub const MAX_ATTEMPTS: usize = 5;
pub const WINDOW_SECS: i64 = 900;

#[derive(Debug, Error)]
pub enum RateLimitError {
    #[error("attempt file io: {0}")]
    Io(#[from] io::Error),

    #[error("attempt file encode: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct RateLimiter {
    dir: PathBuf,
    max_attempts: usize,
    window_secs: i64,
}

fn sanitize(addr: &str) -> String {
    addr.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == ':' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

impl RateLimiter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            max_attempts: MAX_ATTEMPTS,
            window_secs: WINDOW_SECS,
        }
    }

    pub fn path_for(&self, addr: &str) -> PathBuf {
        self.dir.join(format!("login_attempts_{}", sanitize(addr)))
    }

    fn read(path: &Path) -> io::Result<Vec<i64>> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Ok(serde_json::from_str(&contents).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "discarding unreadable attempt file");
                Vec::new()
            })),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    fn live(&self, attempts: Vec<i64>, now: i64) -> Vec<i64> {
        attempts
            .into_iter()
            .filter(|&ts| now - ts < self.window_secs)
            .collect()
    }

    /// Attempts from `addr` still inside the window at `now`.
    pub fn attempts_at(&self, addr: &str, now: i64) -> Result<usize, RateLimitError> {
        Ok(self.live(Self::read(&self.path_for(addr))?, now).len())
    }

    pub fn is_limited_at(&self, addr: &str, now: i64) -> Result<bool, RateLimitError> {
        Ok(self.attempts_at(addr, now)? >= self.max_attempts)
    }

    /// Count this attempt unless `addr` is already at the limit. The check and
    /// the write happen under one lock, so concurrent callers cannot all slip
    /// in below the limit. Returns `false` when the attempt is refused.
    pub fn reserve_at(&self, addr: &str, now: i64) -> Result<bool, RateLimitError> {
        let path = self.path_for(addr);
        let _lock = FileLock::acquire(&path)?;

        let mut attempts = self.live(Self::read(&path)?, now);
        if attempts.len() >= self.max_attempts {
            debug!(addr, count = attempts.len(), "attempt refused");
            return Ok(false);
        }
        attempts.push(now);
        self.write(&path, &attempts)?;
        debug!(addr, count = attempts.len(), "reserved login attempt");
        Ok(true)
    }

    pub fn record_at(&self, addr: &str, now: i64) -> Result<(), RateLimitError> {
        let path = self.path_for(addr);
        let _lock = FileLock::acquire(&path)?;

        let mut attempts = self.live(Self::read(&path)?, now);
        attempts.push(now);
        self.write(&path, &attempts)?;
        debug!(addr, count = attempts.len(), "recorded login attempt");
        Ok(())
    }

    fn write(&self, path: &Path, attempts: &[i64]) -> Result<(), RateLimitError> {
        let json = serde_json::to_vec(attempts)?;
        fsutil::write_atomic(path, &json)?;
        Ok(())
    }

    pub fn clear(&self, addr: &str) -> Result<(), RateLimitError> {
        let path = self.path_for(addr);
        let _lock = FileLock::acquire(&path)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
