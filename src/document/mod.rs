//! Turning an input file into page rasters.
//!
//! Paged formats (PDF, multi-page TIFF) are decoded one page at a time; a page
//! that fails is skipped and reported as a [`PageWarning`] while the remaining
//! pages keep loading. Single images fail as a whole.

mod pdf_pages;
mod tiff_pages;

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::Rect;

/// Immutable pixel buffer of one page. Cloning shares the pixels.
#[derive(Debug, Clone)]
pub struct PageRaster {
    index: usize,
    dpi: f32,
    image: Arc<DynamicImage>,
}

impl PageRaster {
    pub fn new(index: usize, dpi: f32, image: DynamicImage) -> Self {
        Self {
            index,
            dpi,
            image: Arc::new(image),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn dpi(&self) -> f32 {
        self.dpi
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn channels(&self) -> u8 {
        self.image.color().channel_count()
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// Full page extent in document space.
    pub fn bounds(&self) -> Rect {
        Rect {
            x_min: 0.0,
            y_min: 0.0,
            x_max: self.width() as f64,
            y_max: self.height() as f64,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Render resolution for paged vector formats.
    pub dpi: f32,
    /// Cap on the longer raster edge of a rendered page; the DPI is lowered to fit.
    pub max_dimension: u32,
    /// Largest decoded page buffer accepted, in bytes.
    pub memory_ceiling: u64,
    /// Nominal resolution reported for raster inputs.
    pub image_dpi: f32,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            dpi: 150.0,
            max_dimension: 4096,
            memory_ceiling: 512 * 1024 * 1024,
            image_dpi: 72.0,
        }
    }
}

impl LoaderConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.dpi.is_finite() && self.dpi > 0.0) {
            return Err(Error::invalid(format!("dpi must be positive, got {}", self.dpi)));
        }
        if !(self.image_dpi.is_finite() && self.image_dpi > 0.0) {
            return Err(Error::invalid(format!(
                "image_dpi must be positive, got {}",
                self.image_dpi
            )));
        }
        if self.max_dimension == 0 {
            return Err(Error::invalid("max_dimension must be non-zero"));
        }
        if self.memory_ceiling == 0 {
            return Err(Error::invalid("memory_ceiling must be non-zero"));
        }
        Ok(())
    }

    /// Reject a page whose decoded buffer would not fit under the ceiling.
    pub(crate) fn check_budget(
        &self,
        page: usize,
        width: u32,
        height: u32,
        bytes_per_pixel: u64,
    ) -> Result<()> {
        let required = width as u64 * height as u64 * bytes_per_pixel;
        if required > self.memory_ceiling {
            return Err(Error::ResourceExhausted {
                page,
                required,
                ceiling: self.memory_ceiling,
            });
        }
        Ok(())
    }
}

/// Render DPI for a page of `width_pt × height_pt` points, lowered so the
/// longer raster edge stays within `max_dimension`.
pub fn capped_dpi(dpi: f32, max_dimension: u32, width_pt: f32, height_pt: f32) -> f32 {
    let longer = width_pt.max(height_pt);
    if longer <= 0.0 {
        return dpi;
    }
    dpi.min(max_dimension as f32 * 72.0 / longer)
}

/// A page that was skipped while the rest of the document loaded.
#[derive(Debug)]
pub struct PageWarning {
    pub page: usize,
    pub error: Error,
}

#[derive(Debug)]
pub struct LoadedDocument {
    pub name: String,
    pub pages: Vec<PageRaster>,
    pub warnings: Vec<PageWarning>,
}

impl LoadedDocument {
    pub fn page(&self, index: usize) -> Option<&PageRaster> {
        self.pages.iter().find(|p| p.index() == index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Tiff,
    Image(ImageFormat),
}

impl DocumentKind {
    /// Sniff the content first and fall back to the file extension.
    pub fn detect(bytes: &[u8], path: Option<&Path>) -> Result<Self> {
        if bytes.starts_with(b"%PDF") {
            return Ok(DocumentKind::Pdf);
        }
        if bytes.starts_with(b"II*\0") || bytes.starts_with(b"MM\0*") {
            return Ok(DocumentKind::Tiff);
        }
        if let Ok(format) = image::guess_format(bytes) {
            return Ok(DocumentKind::Image(format));
        }

        let Some(path) = path else {
            return Err(Error::UnsupportedFormat("unrecognized content".to_string()));
        };
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => Ok(DocumentKind::Pdf),
            "tif" | "tiff" => Ok(DocumentKind::Tiff),
            _ => ImageFormat::from_path(path)
                .map(DocumentKind::Image)
                .map_err(|_| Error::UnsupportedFormat(format!("{}", path.display()))),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DocumentLoader {
    config: LoaderConfig,
}

impl DocumentLoader {
    pub fn new(config: LoaderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<LoadedDocument> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.load_from(name, &bytes, Some(path))
    }

    /// Load from an in-memory buffer, dispatching on content only.
    pub fn load_bytes(&self, name: impl Into<String>, bytes: &[u8]) -> Result<LoadedDocument> {
        self.load_from(name.into(), bytes, None)
    }

    fn load_from(&self, name: String, bytes: &[u8], path: Option<&Path>) -> Result<LoadedDocument> {
        let kind = DocumentKind::detect(bytes, path)?;
        debug!("{name}: detected {kind:?}");

        let (pages, warnings) = match kind {
            DocumentKind::Image(format) => (vec![self.load_image(bytes, format)?], Vec::new()),
            DocumentKind::Tiff => finish_paged(tiff_pages::load_pages(bytes, &self.config))?,
            DocumentKind::Pdf => finish_paged(pdf_pages::load_pages(bytes, &self.config))?,
        };

        for w in &warnings {
            warn!("{name}: skipped page {}: {}", w.page, w.error);
        }
        info!(
            "{name}: loaded {} page(s), {} skipped",
            pages.len(),
            warnings.len()
        );

        Ok(LoadedDocument {
            name,
            pages,
            warnings,
        })
    }

    fn load_image(&self, bytes: &[u8], format: ImageFormat) -> Result<PageRaster> {
        let reader = ImageReader::with_format(Cursor::new(bytes), format);
        let decoder = reader.into_decoder().map_err(|e| classify_image_error(0, e))?;
        let (width, height) = decoder.dimensions();
        let bpp = decoder.color_type().bytes_per_pixel() as u64;
        self.config.check_budget(0, width, height, bpp)?;

        let image = DynamicImage::from_decoder(decoder).map_err(|e| classify_image_error(0, e))?;
        Ok(PageRaster::new(0, self.config.image_dpi, image))
    }
}

/// A paged document only fails when no page survived; the first page
/// error is returned in that case.
fn finish_paged(
    result: Result<(Vec<PageRaster>, Vec<PageWarning>)>,
) -> Result<(Vec<PageRaster>, Vec<PageWarning>)> {
    let (pages, mut warnings) = result?;
    if pages.is_empty() {
        if warnings.is_empty() {
            return Err(Error::corrupt(0, "document has no pages"));
        }
        return Err(warnings.remove(0).error);
    }
    Ok((pages, warnings))
}

fn classify_image_error(page: usize, err: image::ImageError) -> Error {
    match err {
        image::ImageError::Unsupported(e) => Error::UnsupportedFormat(e.to_string()),
        image::ImageError::IoError(e) => Error::Io(e),
        other => Error::corrupt(page, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capped_dpi_limits_longer_edge() {
        // US letter at 300 dpi would be 3300 px tall.
        let dpi = capped_dpi(300.0, 2048, 612.0, 792.0);
        assert!((792.0 * dpi / 72.0 - 2048.0).abs() < 0.5);
        assert_eq!(capped_dpi(72.0, 4096, 612.0, 792.0), 72.0);
    }

    #[test]
    fn detect_by_magic_bytes() {
        assert_eq!(DocumentKind::detect(b"%PDF-1.7\n", None).unwrap(), DocumentKind::Pdf);
        assert_eq!(DocumentKind::detect(b"II*\0\x08\0\0\0", None).unwrap(), DocumentKind::Tiff);
        assert!(matches!(
            DocumentKind::detect(b"hello world", None),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn detect_falls_back_to_extension() {
        let kind = DocumentKind::detect(b"", Some(Path::new("scan.JPG"))).unwrap();
        assert_eq!(kind, DocumentKind::Image(ImageFormat::Jpeg));
    }

    #[test]
    fn budget_rejects_oversized_page() {
        let config = LoaderConfig {
            memory_ceiling: 1000,
            ..Default::default()
        };
        assert!(config.check_budget(0, 10, 10, 3).is_ok());
        assert!(matches!(
            config.check_budget(4, 100, 100, 1),
            Err(Error::ResourceExhausted { page: 4, .. })
        ));
    }
}
