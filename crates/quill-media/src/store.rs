use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use uuid::Uuid;

use crate::probe::MediaProbe;

/// One allow-list for every upload, matching the upload form's accept set.
pub const ALLOWED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "mp4", "mov"];

pub const MAX_IMAGE_SIZE: usize = 8 * 1024 * 1024;
pub const MAX_VIDEO_SIZE: usize = 8 * 1024 * 1024;
pub const MAX_VIDEO_DURATION_SECS: f64 = 1200.0;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("File type not allowed: {0}")]
    DisallowedExtension(String),
    #[error("Image must be {} bytes or less", MAX_IMAGE_SIZE)]
    ImageTooLarge,
    #[error("Video must be {} bytes or less", MAX_VIDEO_SIZE)]
    VideoTooLarge,
    #[error("Video must be {} seconds or less", MAX_VIDEO_DURATION_SECS)]
    VideoTooLong,
    #[error("Media probe failed: {0}")]
    Probe(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Manages on-disk storage for uploaded media.
///
/// Files are stored flat under `dir` as `{uuid}_{sanitized original name}`;
/// the returned reference is that file name.
pub struct MediaStore {
    dir: PathBuf,
    probe: Arc<dyn MediaProbe>,
}

impl MediaStore {
    pub async fn new(dir: PathBuf, probe: Arc<dyn MediaProbe>) -> Result<Self, MediaError> {
        fs::create_dir_all(&dir).await?;
        info!("Media storage directory: {}", dir.display());
        Ok(Self { dir, probe })
    }

    pub fn file_path(&self, reference: &str) -> PathBuf {
        self.dir.join(reference)
    }

    /// Validate and persist an image. Returns the stored reference.
    pub async fn store_image(&self, filename: &str, data: &[u8]) -> Result<String, MediaError> {
        check_extension(filename)?;
        if data.len() > MAX_IMAGE_SIZE {
            return Err(MediaError::ImageTooLarge);
        }
        self.write(filename, data).await
    }

    /// Validate and persist a video, including the duration ceiling. The file
    /// must hit disk before it can be probed; an overlong video is removed
    /// again before the rejection is returned.
    pub async fn store_video(&self, filename: &str, data: &[u8]) -> Result<String, MediaError> {
        check_extension(filename)?;
        if data.len() > MAX_VIDEO_SIZE {
            return Err(MediaError::VideoTooLarge);
        }
        let reference = self.write(filename, data).await?;

        let probe = self.probe.clone();
        let path = self.file_path(&reference);
        let duration = tokio::task::spawn_blocking(move || probe.duration_secs(&path))
            .await
            .map_err(|e| MediaError::Probe(format!("probe task failed: {}", e)))
            .and_then(|r| r);

        match duration {
            Ok(secs) if secs <= MAX_VIDEO_DURATION_SECS => Ok(reference),
            Ok(_) => {
                self.discard(&reference).await;
                Err(MediaError::VideoTooLong)
            }
            Err(e) => {
                self.discard(&reference).await;
                Err(e)
            }
        }
    }

    /// Delete a stored file. Already-missing files are not an error.
    pub async fn delete(&self, reference: &str) -> Result<(), MediaError> {
        let path = self.file_path(reference);
        match fs::remove_file(&path).await {
            Ok(()) => {
                info!("Deleted media file {}", reference);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Media file {} already gone", reference);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Remove a rejected file without masking the rejection itself.
    async fn discard(&self, reference: &str) {
        if let Err(e) = self.delete(reference).await {
            warn!("Failed to discard rejected upload {}: {}", reference, e);
        }
    }

    async fn write(&self, filename: &str, data: &[u8]) -> Result<String, MediaError> {
        let reference = format!("{}_{}", Uuid::new_v4(), sanitize_filename(filename));
        let path = self.file_path(&reference);
        let mut file = fs::File::create(&path).await?;
        file.write_all(data).await?;
        file.flush().await?;
        Ok(reference)
    }
}

fn check_extension(filename: &str) -> Result<(), MediaError> {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());
    match ext {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(MediaError::DisallowedExtension(filename.to_string())),
    }
}

/// Keep only characters that are safe in a flat file name; anything that
/// could traverse directories is dropped.
fn sanitize_filename(filename: &str) -> String {
    let cleaned: String = filename
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    if cleaned.trim_matches('.').is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}
