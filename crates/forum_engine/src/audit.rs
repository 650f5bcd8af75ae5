use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use forum_logging::forum_warn;

use crate::persist::{ensure_output_dir, PersistError};

const CELL_DIVIDER: &str = "<div class='dropdown-divider'></div>\n";

/// Receives the markup of every comment cell before it is normalized.
pub trait CommentAudit: Send + Sync {
    fn record(&self, cell_html: &str);
}

/// Appends comment cells to one HTML file, each followed by a divider.
#[derive(Debug)]
pub struct FileCommentAudit {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileCommentAudit {
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, PersistError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            ensure_output_dir(parent)?;
        }
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, cell_html: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(cell_html.as_bytes())?;
        file.write_all(b"\n")?;
        file.write_all(CELL_DIVIDER.as_bytes())
    }
}

impl CommentAudit for FileCommentAudit {
    fn record(&self, cell_html: &str) {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(err) = self.append(cell_html) {
            forum_warn!("Failed to append comment audit to {:?}: {}", self.path, err);
        }
    }
}
