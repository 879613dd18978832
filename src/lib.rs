pub mod core;
pub mod detection;
pub mod document;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod report;

pub use crate::core::{
    ClearScope, Section, SectionStore, Session, SessionRecord, SharedSectionStore, ViewState,
    ZoomLimits,
};
pub use crate::detection::{
    DebugConfig, DetectionConfig, DetectionEngine, Polarity, ShapeFilter, ThresholdMode,
};
pub use crate::document::{DocumentLoader, LoadedDocument, LoaderConfig, PageRaster, PageWarning};
pub use crate::error::{Error, Result};
pub use crate::models::{BoundingBox, Point, Rect, ShapeClass, SymbolCandidate};
pub use crate::pipeline::{CancellationToken, DetectionRun, RunOutcome};
pub use crate::report::{Report, ReportEntry, ReportWarning, SectionResult, SectionStats};
