// src/puzzle/image.rs

use super::error::{PuzzleError, PuzzleResult};
use crate::render::RasterImage;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

/// Liefert dekodierte Rasterbilder zu einer URL.
pub trait ImageLoader {
    fn decode(&self, url: &str) -> PuzzleResult<RasterImage>;
}

/// Liest Bilder aus dem Dateisystem; nur die Abmessungen werden dekodiert.
#[derive(Debug, Clone, Default)]
pub struct FsImageLoader {
    root: Option<PathBuf>,
}

impl FsImageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Relative Pfade werden unterhalb von `root` aufgelöst.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    fn resolve(&self, url: &str) -> PathBuf {
        let path = PathBuf::from(url.strip_prefix("file://").unwrap_or(url));
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path,
        }
    }
}

impl ImageLoader for FsImageLoader {
    fn decode(&self, url: &str) -> PuzzleResult<RasterImage> {
        let path = self.resolve(url);
        let (width, height) =
            image::image_dimensions(&path).map_err(|e| PuzzleError::ImageDecode {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        checked(url, width, height)
    }
}

/// Bilder mit fest hinterlegten Abmessungen, ohne Dateizugriff.
#[derive(Debug, Clone, Default)]
pub struct StaticImageLoader {
    images: HashMap<String, (u32, u32)>,
    fallback: Option<(u32, u32)>,
}

impl StaticImageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, url: impl Into<String>, width: u32, height: u32) -> Self {
        self.images.insert(url.into(), (width, height));
        self
    }

    /// Jede unbekannte URL liefert diese Größe.
    pub fn with_fallback(mut self, width: u32, height: u32) -> Self {
        self.fallback = Some((width, height));
        self
    }
}

impl ImageLoader for StaticImageLoader {
    fn decode(&self, url: &str) -> PuzzleResult<RasterImage> {
        let (width, height) = self
            .images
            .get(url)
            .copied()
            .or(self.fallback)
            .ok_or_else(|| PuzzleError::ImageDecode {
                url: url.to_string(),
                reason: "unknown image".to_string(),
            })?;
        checked(url, width, height)
    }
}

fn checked(url: &str, width: u32, height: u32) -> PuzzleResult<RasterImage> {
    if width == 0 || height == 0 {
        return Err(PuzzleError::ImageDecode {
            url: url.to_string(),
            reason: format!("empty image {width}x{height}"),
        });
    }
    debug!("Decoded '{}' ({}x{})", url, width, height);
    Ok(RasterImage::new(url, width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_loader_lookup_and_fallback() {
        let loader = StaticImageLoader::new().with_image("a.png", 40, 30);
        let img = loader.decode("a.png").unwrap();
        assert_eq!((img.width, img.height), (40, 30));
        assert!(matches!(
            loader.decode("b.png"),
            Err(PuzzleError::ImageDecode { .. })
        ));
        let loader = loader.with_fallback(10, 10);
        assert_eq!(loader.decode("b.png").unwrap().url, "b.png");
    }

    #[test]
    fn test_empty_image_is_rejected() {
        let loader = StaticImageLoader::new().with_image("empty.png", 0, 10);
        assert!(loader.decode("empty.png").is_err());
    }

    #[test]
    fn test_fs_loader_reports_missing_file() {
        let loader = FsImageLoader::new().with_root("/nonexistent-dir");
        let err = loader.decode("file://nope.png").unwrap_err();
        assert!(err.to_string().contains("nope.png"));
    }
}
