//! Decoded rasters the compositor consumes: the screenshot itself and wallpapers.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Context;
use image::{RgbaImage, imageops};
use tracing::debug;

use crate::error::{Error, Result};
use crate::processing::resize::resize_rgba;

/// The decoded screenshot, plus a one-entry cache of its last resampled size.
#[derive(Debug)]
pub struct SourceImage {
    image: Arc<RgbaImage>,
    scaled: Mutex<Option<Arc<RgbaImage>>>,
}

impl SourceImage {
    pub fn new(image: RgbaImage) -> Self {
        Self {
            image: Arc::new(image),
            scaled: Mutex::new(None),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Source resampled to `width` x `height`, reusing the previous result when the size
    /// did not change between renders.
    pub fn scaled(&self, width: u32, height: u32) -> Result<Arc<RgbaImage>> {
        if self.image.dimensions() == (width, height) {
            return Ok(Arc::clone(&self.image));
        }
        let mut cached = self.scaled.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(hit) = cached.as_ref().filter(|img| img.dimensions() == (width, height)) {
            return Ok(Arc::clone(hit));
        }
        let resized = resize_rgba(&self.image, width, height)
            .map_err(|err| Error::asset("scaled source image", err))?;
        let resized = Arc::new(resized);
        *cached = Some(Arc::clone(&resized));
        Ok(resized)
    }
}

/// Decode a screenshot from disk with EXIF orientation applied.
pub fn load_source_image(path: &Path) -> Result<SourceImage> {
    decode_oriented(path)
        .map(SourceImage::new)
        .map_err(|err| Error::asset(format!("source image {}", path.display()), err))
}

pub async fn load_source_image_async(path: PathBuf) -> Result<SourceImage> {
    tokio::task::spawn_blocking(move || load_source_image(&path)).await?
}

fn decode_oriented(path: &Path) -> anyhow::Result<RgbaImage> {
    let decoded = image::ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .with_context(|| format!("decoding {}", path.display()))?
        .to_rgba8();
    let orientation = exif_orientation(path).unwrap_or(1);
    Ok(apply_orientation(decoded, orientation))
}

fn exif_orientation(path: &Path) -> Option<u32> {
    let mut reader = BufReader::new(File::open(path).ok()?);
    let exif = exif::Reader::new().read_from_container(&mut reader).ok()?;
    let value = exif
        .get_field(exif::Tag::Orientation, exif::In::PRIMARY)?
        .value
        .get_uint(0)?;
    debug!(orientation = value, path = %path.display(), "exif orientation");
    Some(value)
}

/// EXIF orientations 2..=8 mapped onto flips and quarter turns.
pub fn apply_orientation(image: RgbaImage, orientation: u32) -> RgbaImage {
    match orientation {
        2 => imageops::flip_horizontal(&image),
        3 => imageops::rotate180(&image),
        4 => imageops::flip_vertical(&image),
        5 => imageops::flip_horizontal(&imageops::rotate90(&image)),
        6 => imageops::rotate90(&image),
        7 => imageops::flip_horizontal(&imageops::rotate270(&image)),
        8 => imageops::rotate270(&image),
        _ => image,
    }
}

/// Supplies decoded wallpaper rasters for the wallpaper background.
pub trait WallpaperProvider: Send + Sync {
    fn load(&self, path: &Path) -> Result<Arc<RgbaImage>>;
}

/// Decodes wallpapers from the filesystem and keeps the most recent one around, since
/// consecutive renders almost always reuse it.
#[derive(Debug, Default)]
pub struct FileWallpaperProvider {
    last: Mutex<Option<(PathBuf, Arc<RgbaImage>)>>,
}

impl FileWallpaperProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WallpaperProvider for FileWallpaperProvider {
    fn load(&self, path: &Path) -> Result<Arc<RgbaImage>> {
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((_, image)) = last.as_ref().filter(|(cached, _)| cached == path) {
            return Ok(Arc::clone(image));
        }
        let image = decode_oriented(path)
            .map(Arc::new)
            .map_err(|err| Error::asset(format!("wallpaper {}", path.display()), err))?;
        debug!(
            path = %path.display(),
            width = image.width(),
            height = image.height(),
            "wallpaper decoded"
        );
        *last = Some((path.to_path_buf(), Arc::clone(&image)));
        Ok(image)
    }
}
