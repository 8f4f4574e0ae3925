//! Thumbnail storage on the local filesystem.
//!
//! Pictures live flat in one directory. Writes go through a temporary file
//! in that same directory and are renamed into place, so a reader never sees
//! a partially written thumbnail and a failed write leaves nothing behind.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::{DynamicImage, ImageError, ImageFormat};
use kh_core::{Error, Result};

use crate::policy::extension_of;

/// Bounding box (in pixels) every stored picture fits into.
pub const THUMBNAIL_SIZE: u32 = 125;

/// Dimensions of a stored thumbnail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
}

/// Handle on the profile picture storage directory.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the storage directory if it does not exist yet.
    pub fn ensure_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    /// Absolute location of a stored file.
    ///
    /// Only the last path component of `filename` is used, so a stored name
    /// can never point outside the directory. Returns `None` for names with
    /// no usable component (`""`, `".."`).
    pub fn path_for(&self, filename: &str) -> Option<PathBuf> {
        Path::new(filename)
            .file_name()
            .map(|name| self.dir.join(name))
    }

    /// Decode `image_bytes`, shrink it into the thumbnail box and write it to
    /// `target`.
    ///
    /// The output format follows `target`'s extension. Images already inside
    /// the box keep their size.
    pub fn store_thumbnail(&self, image_bytes: &[u8], target: &Path) -> Result<Thumbnail> {
        let format = target
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(extension_of)
            .and_then(ImageFormat::from_extension)
            .ok_or_else(|| {
                Error::Image(format!("no image encoder for {}", target.display()))
            })?;

        let img = image::load_from_memory(image_bytes).map_err(map_image_err)?;
        let img = shrink_to_fit(img);
        let thumb = Thumbnail {
            width: img.width(),
            height: img.height(),
        };

        // JPEG has no alpha channel.
        let img = if format == ImageFormat::Jpeg {
            DynamicImage::ImageRgb8(img.to_rgb8())
        } else {
            img
        };

        let mut encoded = Cursor::new(Vec::new());
        img.write_to(&mut encoded, format).map_err(map_image_err)?;

        let dir = target.parent().unwrap_or(self.dir.as_path());
        let mut tmp = tempfile::Builder::new()
            .prefix(".upload-")
            .tempfile_in(dir)?;
        tmp.write_all(encoded.get_ref())?;
        tmp.as_file().sync_all()?;
        tmp.persist(target).map_err(|e| Error::Io { source: e.error })?;

        tracing::debug!(
            path = %target.display(),
            width = thumb.width,
            height = thumb.height,
            "Stored thumbnail"
        );
        Ok(thumb)
    }

    /// Delete `path`. Returns `Ok(false)` when nothing was there.
    pub fn remove_if_exists(&self, path: &Path) -> Result<bool> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

fn shrink_to_fit(img: DynamicImage) -> DynamicImage {
    if img.width() <= THUMBNAIL_SIZE && img.height() <= THUMBNAIL_SIZE {
        return img;
    }
    img.resize(THUMBNAIL_SIZE, THUMBNAIL_SIZE, FilterType::Lanczos3)
}

fn map_image_err(e: ImageError) -> Error {
    match e {
        ImageError::IoError(source) => Error::Io { source },
        other => Error::Image(other.to_string()),
    }
}
