#![allow(dead_code)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from countfire for tests
pub use countfire::{
    CancellationToken, DetectionConfig, DetectionEngine, DetectionRun, DocumentLoader, Error,
    LoaderConfig, PageRaster, Point, Rect, Section, SectionStore, ShapeFilter, ThresholdMode,
    ViewState,
};
