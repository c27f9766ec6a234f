//! Diagnostic snapshot persistence for capture-tagged faults.
//!
//! Writing a snapshot is best-effort: any failure here is logged and
//! swallowed so the fault that triggered the capture is never masked by a
//! diagnostics error.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::warn;

use crate::interaction::Frame;

/// Writes fault snapshots into a per-day directory under a logs root.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    root: PathBuf,
}

impl SnapshotWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persist `frame` labelled with the fault description and a
    /// seconds-resolution timestamp. Returns the written path, or `None` if
    /// the write failed (already logged).
    pub fn save(&self, frame: &Frame, label: &str, at: DateTime<Local>) -> Option<PathBuf> {
        match self.try_save(frame, label, at) {
            Ok(path) => {
                warn!(path = %path.display(), "snapshot saved");
                Some(path)
            }
            Err(err) => {
                warn!(label, error = %err, "snapshot write failed, discarding");
                None
            }
        }
    }

    fn try_save(
        &self,
        frame: &Frame,
        label: &str,
        at: DateTime<Local>,
    ) -> std::result::Result<PathBuf, SnapshotError> {
        let dir = self.root.join(at.format("%Y-%m-%d").to_string());
        std::fs::create_dir_all(&dir)?;

        let name = format!("{}---{}.jpg", sanitize_label(label), at.format("%H-%M-%S"));
        let path = dir.join(name);

        // JPEG has no alpha channel; flatten four-channel frames first.
        if frame.color().has_alpha() {
            frame.to_rgb8().save(&path)?;
        } else {
            frame.save(&path)?;
        }

        Ok(path)
    }
}

#[derive(Debug, thiserror::Error)]
enum SnapshotError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Encode(#[from] image::ImageError),
}

/// Fault messages end up in filenames; keep a conservative character set.
fn sanitize_label(label: &str) -> String {
    let cleaned: String = label
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "fault".to_string()
    } else {
        cleaned.chars().take(120).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_path_separators() {
        assert_eq!(sanitize_label("a/b\\c: d"), "a_b_c__d");
    }

    #[test]
    fn sanitize_empty_label_falls_back() {
        assert_eq!(sanitize_label(""), "fault");
    }

    #[test]
    fn sanitize_truncates_long_labels() {
        let long = "x".repeat(500);
        assert_eq!(sanitize_label(&long).len(), 120);
    }
}
