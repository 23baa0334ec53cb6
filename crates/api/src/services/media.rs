//! Local storage for uploaded recipe images.
//!
//! Files live under the configured media root at the paths produced by
//! [`recipe_box_core::recipe_image_path`] and are served read-only under the
//! media URL prefix.

use std::io::{self, Cursor};
use std::path::PathBuf;

use image::{ImageFormat, ImageReader};
use thiserror::Error;

use recipe_box_core::recipe_image_path;

use crate::config::MediaConfig;

/// Errors that can occur while storing media.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The upload is not a recognized image.
    #[error("upload a valid image; the file you uploaded was either not an image or a corrupted image")]
    UnsupportedImage,

    /// Filesystem error.
    #[error("media storage error: {0}")]
    Io(#[from] io::Error),
}

/// Image formats accepted for upload.
const ACCEPTED_FORMATS: [ImageFormat; 5] = [
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Gif,
    ImageFormat::WebP,
    ImageFormat::Bmp,
];

/// Decode `bytes` as an image and return its format.
///
/// The format is guessed from the leading bytes and the whole image is
/// decoded, so a valid signature followed by garbage is rejected.
///
/// # Errors
///
/// Returns `MediaError::UnsupportedImage` if the format is not accepted or
/// the data does not decode.
pub fn validate_image(bytes: &[u8]) -> Result<ImageFormat, MediaError> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    let format = reader
        .format()
        .filter(|format| ACCEPTED_FORMATS.contains(format))
        .ok_or(MediaError::UnsupportedImage)?;

    reader.decode().map_err(|e| {
        tracing::debug!(?format, error = %e, "Rejected image upload");
        MediaError::UnsupportedImage
    })?;

    Ok(format)
}

/// Media directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
    url: String,
}

impl MediaStore {
    /// Create a store rooted at `root`, served under the URL prefix `url`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            url: url.into(),
        }
    }

    /// Create a store from configuration.
    #[must_use]
    pub fn from_config(config: &MediaConfig) -> Self {
        Self::new(config.root.clone(), config.url.clone())
    }

    /// Store an uploaded recipe image and return its path relative to the
    /// media root.
    ///
    /// Only the final component of `original_filename` is used, so client
    /// supplied directories never reach the generated path.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::UnsupportedImage` if `bytes` is not a decodable
    /// image in an accepted format, or `MediaError::Io` if the file cannot be
    /// written.
    pub async fn save_recipe_image(
        &self,
        original_filename: &str,
        bytes: &[u8],
    ) -> Result<String, MediaError> {
        let owned = bytes.to_vec();
        let format = tokio::task::spawn_blocking(move || validate_image(&owned))
            .await
            .map_err(io::Error::other)??;

        let relative = recipe_image_path(basename(original_filename));
        let path = self.root.join(&relative);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;

        tracing::debug!(path = %relative, ?format, size = bytes.len(), "Stored image");
        Ok(relative)
    }

    /// Remove a stored file. A file that is already gone is not an error.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::Io` for any other filesystem error.
    pub async fn delete(&self, relative: &str) -> Result<(), MediaError> {
        match tokio::fs::remove_file(self.root.join(relative)).await {
            Ok(()) => {
                tracing::debug!(path = %relative, "Removed image");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Public URL of a stored file.
    #[must_use]
    pub fn url_for(&self, relative: &str) -> String {
        format!("{}/{relative}", self.url)
    }
}

/// Final path component, accepting both `/` and `\` separators.
fn basename(filename: &str) -> &str {
    filename.rsplit(['/', '\\']).next().unwrap_or(filename)
}
