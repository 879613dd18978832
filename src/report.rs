//! Merging per-section detections into one document report.
//!
//! Field names here are what exporters read; keep them stable.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::Serialize;
use time::OffsetDateTime;

use crate::core::sections::Section;
use crate::error::Result;
use crate::models::{ShapeClass, SymbolCandidate};

/// Detection output for one section, as handed to [`aggregate`].
#[derive(Debug, Clone)]
pub struct SectionResult {
    pub section: Section,
    pub candidates: Vec<SymbolCandidate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SectionStats {
    pub by_shape: BTreeMap<ShapeClass, usize>,
    pub mean_area: f64,
    pub total_area: f64,
}

impl SectionStats {
    fn from_candidates(candidates: &[SymbolCandidate]) -> Self {
        let mut by_shape = BTreeMap::new();
        let mut total_area = 0.0;
        for c in candidates {
            *by_shape.entry(c.shape).or_insert(0) += 1;
            total_area += c.area;
        }
        let mean_area = if candidates.is_empty() {
            0.0
        } else {
            total_area / candidates.len() as f64
        };
        Self {
            by_shape,
            mean_area,
            total_area,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    pub section: Section,
    pub count: usize,
    pub candidates: Vec<SymbolCandidate>,
    pub stats: SectionStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportWarning {
    /// Nothing passed the filters; the parameters may need tuning.
    EmptySection { section: String, page: usize },
    /// The section could not be processed at all.
    SkippedSection { section: String, page: usize, reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub document: String,
    pub entries: Vec<ReportEntry>,
    pub total: usize,
    pub warnings: Vec<ReportWarning>,
    /// Set when the run was stopped early; `entries` holds what finished.
    pub cancelled: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub generated_at: OffsetDateTime,
}

/// Assemble a report. Entry order follows `results`; no detection happens here.
pub fn aggregate(document: &str, results: Vec<SectionResult>) -> Report {
    let mut warnings = Vec::new();
    let entries: Vec<ReportEntry> = results
        .into_iter()
        .map(|r| {
            if r.candidates.is_empty() {
                warnings.push(ReportWarning::EmptySection {
                    section: r.section.name.clone(),
                    page: r.section.page,
                });
            }
            ReportEntry {
                count: r.candidates.len(),
                stats: SectionStats::from_candidates(&r.candidates),
                section: r.section,
                candidates: r.candidates,
            }
        })
        .collect();

    Report {
        document: document.to_string(),
        total: entries.iter().map(|e| e.count).sum(),
        entries,
        warnings,
        cancelled: false,
        generated_at: OffsetDateTime::now_utc(),
    }
}

impl Report {
    pub fn entry(&self, section_name: &str) -> Option<&ReportEntry> {
        self.entries.iter().find(|e| e.section.name == section_name)
    }

    pub fn entries_for_page(&self, page: usize) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter().filter(move |e| e.section.page == page)
    }

    /// Pages that contributed at least one entry, ascending.
    pub fn pages(&self) -> Vec<usize> {
        let mut pages: Vec<usize> = self.entries.iter().map(|e| e.section.page).collect();
        pages.sort_unstable();
        pages.dedup();
        pages
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Symbol counts for {}", self.document)?;
        for entry in &self.entries {
            writeln!(
                f,
                "  [page {}] {}: {} symbol(s)",
                entry.section.page, entry.section.name, entry.count
            )?;
            for (shape, n) in &entry.stats.by_shape {
                writeln!(f, "      {:<10} {n}", shape.as_str())?;
            }
        }
        for warning in &self.warnings {
            match warning {
                ReportWarning::EmptySection { section, page } => writeln!(
                    f,
                    "  note: nothing found in '{section}' (page {page}); try other parameters"
                )?,
                ReportWarning::SkippedSection { section, page, reason } => {
                    writeln!(f, "  warning: skipped '{section}' (page {page}): {reason}")?
                }
            }
        }
        if self.cancelled {
            writeln!(f, "  run cancelled; counts are partial")?;
        }
        write!(f, "Total: {} symbol(s) in {} section(s)", self.total, self.entries.len())
    }
}
