//! Loading of gallery images from disk.
//!
//! The core only ever sees fully-decoded images: everything in the image
//! directory is read and decoded up front, in sorted filename order, and
//! any failure aborts startup with a contextual error.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, ensure};
use image::GenericImageView;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp"];

/// A decoded image plus its aspect ratio, ready for texture upload.
pub struct GalleryImage {
    pub image: image::DynamicImage,
    pub aspect: f32,
}

/// Read and decode every image file in `dir`, ordered by filename.
pub fn load_gallery_images(dir: &Path) -> anyhow::Result<Vec<GalleryImage>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("cannot read image directory {}", dir.display()))?;
    let mut paths: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        })
        .collect();
    paths.sort();
    ensure!(
        !paths.is_empty(),
        "no images found in {}; the gallery needs at least one",
        dir.display()
    );

    paths
        .iter()
        .map(|path| {
            let bytes =
                fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
            let image = image::load_from_memory(&bytes)
                .with_context(|| format!("cannot decode {}", path.display()))?;
            let (width, height) = image.dimensions();
            log::info!("loaded {} ({width}x{height})", path.display());
            Ok(GalleryImage {
                aspect: width as f32 / height.max(1) as f32,
                image,
            })
        })
        .collect()
}
