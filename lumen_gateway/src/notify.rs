//! Notifiers. Sending is best effort: failures are logged, never returned.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use lumen_traits::Notifier;

/// Writes alerts to the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, title: &str, body: &str) {
        tracing::error!(title, body, "alert");
    }
}

/// Appends one JSON line per alert to a file and also logs it.
#[derive(Debug, Clone)]
pub struct AlertFileNotifier {
    path: PathBuf,
}

impl AlertFileNotifier {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, title: &str, body: &str) -> std::io::Result<()> {
        crate::util::ensure_parent(&self.path)?;
        let line = serde_json::json!({
            "ts": Utc::now().to_rfc3339(),
            "title": title,
            "body": body,
        });
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")
    }
}

impl Notifier for AlertFileNotifier {
    fn send(&self, title: &str, body: &str) {
        LogNotifier.send(title, body);
        if let Err(e) = self.append(title, body) {
            tracing::warn!(path = %self.path.display(), error = %e, "could not write alert file");
        }
    }
}
