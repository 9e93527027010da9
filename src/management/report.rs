use std::path::{Path, PathBuf};

use chrono::Local;
use thiserror::Error;
use tracing::debug;

use crate::{analysis::Report, utils};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("report file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid report json: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Stores analysis reports as pretty-printed JSON files.
pub struct ReportManager {
    dir: PathBuf,
}

impl ReportManager {
    /// Manager writing to `<local data dir>/sporlyze/reports`.
    pub fn new() -> Self {
        Self::with_dir(Self::default_dir())
    }

    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn default_dir() -> PathBuf {
        let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("sporlyze/reports");
        path
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes the report under a timestamped file name and returns its path.
    pub async fn save(&self, report: &Report) -> Result<PathBuf, ReportError> {
        let path = self.dir.join(utils::report_file_name(Local::now().naive_local()));
        Self::save_to(&path, report).await?;
        Ok(path)
    }

    /// Writes the report to an explicit path, creating parent directories.
    pub async fn save_to(path: &Path, report: &Report) -> Result<(), ReportError> {
        let io_err = |source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            async_fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let json = report.to_json()?;
        async_fs::write(path, json).await.map_err(io_err)?;
        debug!(path = %path.display(), "Report written");
        Ok(())
    }

    pub async fn load(path: &Path) -> Result<Report, ReportError> {
        let content = async_fs::read_to_string(path)
            .await
            .map_err(|source| ReportError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl Default for ReportManager {
    fn default() -> Self {
        Self::new()
    }
}
