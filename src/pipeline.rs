use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::core::sections::Section;
use crate::detection::{DetectionConfig, DetectionEngine};
use crate::document::{LoadedDocument, PageRaster};
use crate::error::{Error, Result};
use crate::report::{self, Report, ReportWarning, SectionResult};

/// Shared stop flag for a [`DetectionRun`].
///
/// Cancelling stops sections that have not started yet; a section already
/// being processed runs to completion.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub report: Report,
    pub cancelled: bool,
}

/// What happened to one section of the run.
enum SectionOutcome {
    Done(SectionResult),
    Skipped { section: Section, reason: String },
    NotStarted,
}

/// Called on a worker thread each time a section finishes.
pub type ProgressFn = dyn Fn(&Section, usize) + Send + Sync;

/// One detection pass over a fixed snapshot of sections.
///
/// Sections are processed in parallel; the report keeps the snapshot order.
pub struct DetectionRun {
    document: String,
    pages: Vec<PageRaster>,
    sections: Vec<Section>,
    config: DetectionConfig,
    engine: DetectionEngine,
    threads: Option<usize>,
    progress: Option<Arc<ProgressFn>>,
}

impl DetectionRun {
    pub fn new(
        document: impl Into<String>,
        pages: Vec<PageRaster>,
        sections: Vec<Section>,
        config: DetectionConfig,
    ) -> Self {
        Self {
            document: document.into(),
            pages,
            sections,
            config,
            engine: DetectionEngine::new(),
            threads: None,
            progress: None,
        }
    }

    pub fn for_document(
        document: &LoadedDocument,
        sections: Vec<Section>,
        config: DetectionConfig,
    ) -> Self {
        Self::new(document.name.clone(), document.pages.clone(), sections, config)
    }

    pub fn with_engine(mut self, engine: DetectionEngine) -> Self {
        self.engine = engine;
        self
    }

    /// Cap the worker count; `None` uses rayon's default.
    pub fn with_threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }

    /// Report each finished section with its candidate count.
    pub fn with_progress(
        mut self,
        progress: impl Fn(&Section, usize) + Send + Sync + 'static,
    ) -> Self {
        self.progress = Some(Arc::new(progress));
        self
    }

    pub fn execute(&self, token: &CancellationToken) -> Result<RunOutcome> {
        self.config.validate()?;
        info!(
            "{}: detecting in {} section(s) over {} page(s)",
            self.document,
            self.sections.len(),
            self.pages.len()
        );

        let outcomes = match self.threads {
            Some(0) => return Err(Error::invalid("thread count must be positive")),
            Some(n) => rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| Error::invalid(format!("cannot start worker pool: {e}")))?
                .install(|| self.process_all(token)),
            None => self.process_all(token),
        };

        let mut results = Vec::new();
        let mut skipped = Vec::new();
        let mut cancelled = false;
        for outcome in outcomes {
            match outcome? {
                SectionOutcome::Done(result) => results.push(result),
                SectionOutcome::Skipped { section, reason } => {
                    warn!("skipped section '{}' on page {}: {reason}", section.name, section.page);
                    skipped.push(ReportWarning::SkippedSection {
                        section: section.name,
                        page: section.page,
                        reason,
                    });
                }
                SectionOutcome::NotStarted => cancelled = true,
            }
        }

        let mut report = report::aggregate(&self.document, results);
        report.warnings.extend(skipped);
        report.cancelled = cancelled;
        info!(
            "{}: {} symbol(s) in {} section(s){}",
            self.document,
            report.total,
            report.entries.len(),
            if cancelled { " (cancelled)" } else { "" }
        );

        Ok(RunOutcome { report, cancelled })
    }

    fn process_all(&self, token: &CancellationToken) -> Vec<Result<SectionOutcome>> {
        self.sections
            .par_iter()
            .map(|section| self.process(section, token))
            .collect()
    }

    fn process(&self, section: &Section, token: &CancellationToken) -> Result<SectionOutcome> {
        if token.is_cancelled() {
            return Ok(SectionOutcome::NotStarted);
        }
        let Some(raster) = self.pages.iter().find(|p| p.index() == section.page) else {
            return Ok(SectionOutcome::Skipped {
                section: section.clone(),
                reason: format!("page {} is not in the document", section.page),
            });
        };

        match self.engine.detect_section(raster, section, &self.config) {
            Ok(candidates) => {
                debug!("section '{}': {} candidate(s)", section.name, candidates.len());
                if let Some(progress) = &self.progress {
                    progress(section, candidates.len());
                }
                Ok(SectionOutcome::Done(SectionResult {
                    section: section.clone(),
                    candidates,
                }))
            }
            Err(Error::DegenerateRegion(reason)) => Ok(SectionOutcome::Skipped {
                section: section.clone(),
                reason,
            }),
            Err(e) => Err(e),
        }
    }
}
