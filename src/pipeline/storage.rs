//! Filesystem helpers for the pipeline
//!
//! Every temp file lives inside a [`TempUpload`]; dropping the guard deletes
//! the file, so cleanup happens on success, on error and when the request
//! future is cancelled.
//!
//! Derivatives are written under a hidden per-request staging name and only
//! renamed onto their public name by [`commit_derivatives`]. Cleanup after a
//! failure removes staged files only.

use bytes::Bytes;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::UploadError;
use crate::metrics::UploadMetrics;
use crate::transcode::TransformProfile;

/// Owns one temp copy of an upload and deletes it on drop
#[derive(Debug)]
pub struct TempUpload {
    path: PathBuf,
}

impl TempUpload {
    /// Write `data` to `temp_dir/file_name`, creating `temp_dir` if needed.
    ///
    /// The guard is created on the blocking thread before the write starts,
    /// so a partial file is removed too, even if the caller stops waiting.
    pub async fn write(temp_dir: &Path, file_name: &str, data: Bytes) -> Result<Self, UploadError> {
        ensure_dir(temp_dir).await?;

        let path = temp_dir.join(file_name);
        let guard = tokio::task::spawn_blocking(move || {
            let guard = TempUpload { path };
            std::fs::write(&guard.path, &data)
                .map_err(|e| UploadError::io("writing temp file", e))?;
            Ok::<_, UploadError>(guard)
        })
        .await
        .map_err(|e| UploadError::WorkerFailed(e.to_string()))??;

        tracing::debug!(path = %guard.path.display(), "Temp file written");
        Ok(guard)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempUpload {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Temp file removed"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                UploadMetrics::global().temp_cleanup_failures.inc();
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to remove temp file"
                );
            }
        }
    }
}

/// `create_dir_all`; existing directories are left untouched
pub async fn ensure_dir(path: &Path) -> Result<(), UploadError> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| UploadError::io("creating directory", e))
}

/// Delete a file, treating "already gone" as success.
///
/// Returns whether a file was actually removed.
pub fn remove_if_exists(path: &Path) -> io::Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Base name a request renders its derivatives under before they are
/// published. Hidden and request-unique, so it can never collide with a
/// published asset or another request's outputs.
pub fn staging_base_name(request_id: &str) -> String {
    format!(".staging_{}", request_id)
}

/// Every file `profile` writes for `base_name`: main first, then thumbnail
fn derivative_names(base_name: &str, profile: &TransformProfile) -> Vec<String> {
    let mut names = vec![profile.output_filename(base_name)];
    if let Some(thumbnail) = profile.thumbnail {
        names.push(thumbnail.output_filename(base_name));
    }
    names
}

/// Remove the staged derivatives of a failed or abandoned transcode.
/// Failures are logged, never returned.
pub fn remove_derivatives(dest_dir: &Path, staging_base: &str, profile: &TransformProfile) {
    for name in derivative_names(staging_base, profile) {
        let path = dest_dir.join(name);
        if let Err(e) = remove_if_exists(&path) {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Failed to remove staged derivative"
            );
        }
    }
}

/// Publish staged derivatives by renaming them onto `base_name`.
///
/// The thumbnail moves before the main image, so a published main image
/// always has its thumbnail. On error the remaining staged files are
/// removed; already published files stay.
pub fn commit_derivatives(
    dest_dir: &Path,
    staging_base: &str,
    base_name: &str,
    profile: &TransformProfile,
) -> Result<(), UploadError> {
    let staged = derivative_names(staging_base, profile);
    let published = derivative_names(base_name, profile);

    for (from, to) in staged.iter().zip(&published).rev() {
        if let Err(e) = std::fs::rename(dest_dir.join(from), dest_dir.join(to)) {
            remove_derivatives(dest_dir, staging_base, profile);
            return Err(UploadError::io("publishing derivative", e));
        }
    }
    Ok(())
}

/// Name of the thumbnail stored next to `file_name`: `{stem}{suffix}.{ext}`
pub fn thumbnail_name(file_name: &str, suffix: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}{}.{}", stem, suffix, ext),
        _ => format!("{}{}", file_name, suffix),
    }
}
