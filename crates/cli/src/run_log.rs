//! Per-run log file.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;
use tracing::Dispatch;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

/// File name pattern, `chrono` format syntax.
pub const LOG_FILE_FORMAT: &str = "transfer_log_%Y-%m-%d-%Hh-%Mm-%Ss.txt";

/// A timestamped log file plus stderr, exposed as a `Dispatch`.
///
/// Nothing is installed globally. Callers drive their work under
/// [`RunLog::dispatch`] and call [`RunLog::close`] when done.
pub struct RunLog {
    path: PathBuf,
    file: Arc<File>,
    dispatch: Dispatch,
}

impl RunLog {
    /// Create the log file in `dir` and build the subscriber.
    ///
    /// # Arguments
    /// * `dir` - Directory for the log file, created if missing
    /// * `level` - `EnvFilter` directive; falls back to `info` when invalid
    pub fn open(dir: &Path, level: &str) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create log directory {}", dir.display()))?;
        let name: String = Local::now().format(LOG_FILE_FORMAT).to_string();
        let path: PathBuf = dir.join(name);
        let file = Arc::new(
            File::create(&path)
                .with_context(|| format!("failed to create log file {}", path.display()))?,
        );

        let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_writer(Arc::clone(&file))
                    .with_ansi(false),
            )
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false));

        Ok(Self {
            path,
            file,
            dispatch: Dispatch::new(subscriber),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    /// Flush and sync the log file.
    pub fn close(self) -> Result<()> {
        let mut file: &File = &self.file;
        file.flush().context("failed to flush log file")?;
        file.sync_all().context("failed to sync log file")?;
        Ok(())
    }
}
