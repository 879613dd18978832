pub mod config;
pub mod contours;
pub mod dedup;
pub mod preprocessing;
pub mod shapes;

use std::path::PathBuf;

use log::debug;
use uuid::Uuid;

pub use config::{DetectionConfig, Polarity, ShapeFilter, ThresholdMode};

use crate::core::sections::Section;
use crate::core::view;
use crate::document::PageRaster;
use crate::error::{Error, Result};
use crate::models::{Point, Rect, SymbolCandidate};

/// Where intermediate masks are written when debugging a run.
#[derive(Clone, Debug)]
pub struct DebugConfig {
    pub output_dir: PathBuf,
}

impl DebugConfig {
    /// The directory must be empty or not exist yet.
    pub fn new(output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            if std::fs::read_dir(&output_dir)?.next().is_some() {
                return Err(Error::invalid(format!(
                    "debug directory is not empty: {}",
                    output_dir.display()
                )));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }
        Ok(Self { output_dir })
    }
}

/// Runs preprocess → segment → filter → suppress on one region of a page.
///
/// The engine holds no per-run state, so one instance can serve many
/// sections concurrently.
#[derive(Debug, Clone, Default)]
pub struct DetectionEngine {
    debug: Option<DebugConfig>,
}

impl DetectionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_debug(mut self, debug: DebugConfig) -> Self {
        self.debug = Some(debug);
        self
    }

    /// Detect symbols inside a document-space rectangle of `raster`.
    pub fn detect(
        &self,
        raster: &PageRaster,
        rect: &Rect,
        config: &DetectionConfig,
    ) -> Result<Vec<SymbolCandidate>> {
        let label = format!("p{}_{:.0}_{:.0}", raster.index(), rect.x_min, rect.y_min);
        self.run(raster, rect, config, Uuid::nil(), &label)
    }

    /// Detect symbols inside a stored section; candidates carry the section id.
    pub fn detect_section(
        &self,
        raster: &PageRaster,
        section: &Section,
        config: &DetectionConfig,
    ) -> Result<Vec<SymbolCandidate>> {
        if section.page != raster.index() {
            return Err(Error::invalid(format!(
                "section '{}' is on page {}, raster is page {}",
                section.name,
                section.page,
                raster.index()
            )));
        }
        let label = format!("p{}_{}", raster.index(), sanitize(&section.name));
        self.run(raster, &section.rect, config, section.id, &label)
    }

    fn run(
        &self,
        raster: &PageRaster,
        rect: &Rect,
        config: &DetectionConfig,
        section_id: Uuid,
        label: &str,
    ) -> Result<Vec<SymbolCandidate>> {
        config.validate()?;
        let clamped = view::clamp_to_raster(rect, raster)?;
        let roi = clamped
            .pixel_bounds(raster.width(), raster.height())
            .ok_or_else(|| Error::degenerate(format!("{label}: region covers no pixel")))?;

        let region = raster.image().crop_imm(roi.x, roi.y, roi.width, roi.height);
        let mask = preprocessing::foreground_mask(&region, config);
        if let Some(debug) = &self.debug {
            let path = debug.output_dir.join(format!("{label}.png"));
            mask.save(&path)?;
            debug!("{label}: saved mask to {}", path.display());
        }

        let traced = contours::find_contours(&mask);
        let traced_count = traced.len();
        let filtered = shapes::filter_candidates(traced, config);
        let filtered_count = filtered.len();

        let mut kept = dedup::suppress_overlaps(filtered, config.overlap_fraction);
        kept.sort_by(|a, b| dedup::scan_order(&a.contour, &b.contour));

        debug!(
            "{label}: {traced_count} contour(s), {filtered_count} after filters, {} candidate(s)",
            kept.len()
        );

        Ok(kept
            .into_iter()
            .map(|k| {
                let c = k.contour;
                SymbolCandidate {
                    section_id,
                    bbox: c.bounding_box().translate(roi.x, roi.y),
                    area: c.area,
                    perimeter: c.perimeter,
                    solidity: c.solidity(),
                    circularity: c.circularity(),
                    aspect_ratio: c.aspect_ratio(),
                    extent: c.extent(),
                    centroid: Point::new(c.centroid.x + roi.x as f64, c.centroid.y + roi.y as f64),
                    shape: c.shape(),
                    merged: k.merged,
                }
            })
            .collect())
    }
}

/// Detect with a default engine.
pub fn detect(
    raster: &PageRaster,
    rect: &Rect,
    config: &DetectionConfig,
) -> Result<Vec<SymbolCandidate>> {
    DetectionEngine::new().detect(raster, rect, config)
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}
