use std::sync::{Arc, PoisonError, RwLock};

use log::debug;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::core::view::{self, ViewState};
use crate::document::PageRaster;
use crate::error::{Error, Result};
use crate::models::Rect;

/// Smallest side, in document pixels, a section may have.
pub const DEFAULT_MIN_EXTENT: f64 = 1.0;

/// A named region of interest, always in document space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: Uuid,
    pub name: String,
    pub page: usize,
    pub rect: Rect,
    /// Creation sequence number; lower is older.
    pub order: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearScope {
    Page(usize),
    All,
}

#[derive(Debug, Clone)]
pub struct SectionStore {
    sections: Vec<Section>,
    next_order: u64,
    min_extent: f64,
}

impl Default for SectionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SectionStore {
    pub fn new() -> Self {
        Self {
            sections: Vec::new(),
            next_order: 0,
            min_extent: DEFAULT_MIN_EXTENT,
        }
    }

    pub fn with_min_extent(mut self, min_extent: f64) -> Result<Self> {
        if !(min_extent.is_finite() && min_extent > 0.0) {
            return Err(Error::invalid(format!("min_extent must be positive, got {min_extent}")));
        }
        self.min_extent = min_extent;
        Ok(self)
    }

    /// Commit a rectangle drawn in view space on `raster`'s page.
    ///
    /// The rectangle is translated with the current view, clamped to the
    /// page and stored in document space. Nothing is stored on error.
    pub fn add(
        &mut self,
        name: &str,
        view_rect: &Rect,
        page: usize,
        state: &ViewState,
        raster: &PageRaster,
    ) -> Result<Section> {
        if raster.index() != page {
            return Err(Error::invalid(format!(
                "raster is page {}, section targets page {page}",
                raster.index()
            )));
        }
        let rect = view::rect_to_document(view_rect, state)?;
        self.insert(name, rect, raster, None, None)
    }

    /// Commit a rectangle that is already in document space.
    pub fn add_document_rect(
        &mut self,
        name: &str,
        rect: &Rect,
        raster: &PageRaster,
    ) -> Result<Section> {
        self.insert(name, *rect, raster, None, None)
    }

    pub(crate) fn insert(
        &mut self,
        name: &str,
        rect: Rect,
        raster: &PageRaster,
        id: Option<Uuid>,
        created_at: Option<OffsetDateTime>,
    ) -> Result<Section> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::invalid("section name is empty"));
        }
        if rect.is_degenerate(self.min_extent) {
            return Err(Error::degenerate(format!("section '{name}' has no usable area: {rect:?}")));
        }
        let rect = view::clamp_to_raster(&rect, raster)?;
        if rect.is_degenerate(self.min_extent) {
            return Err(Error::degenerate(format!(
                "section '{name}' is too small after clamping to the page: {rect:?}"
            )));
        }
        if self.sections.iter().any(|s| s.name == name) {
            return Err(Error::DuplicateName(name.to_string()));
        }

        let section = Section {
            id: id.unwrap_or_else(Uuid::new_v4),
            name: name.to_string(),
            page: raster.index(),
            rect,
            order: self.next_order,
            created_at: created_at.unwrap_or_else(OffsetDateTime::now_utc),
        };
        self.next_order += 1;
        debug!("section '{}' on page {}: {:?}", section.name, section.page, section.rect);
        self.sections.push(section.clone());
        Ok(section)
    }

    /// Remove and return the most recently added section.
    pub fn undo(&mut self) -> Option<Section> {
        self.sections.pop()
    }

    pub fn remove(&mut self, name: &str) -> Option<Section> {
        let index = self.sections.iter().position(|s| s.name == name)?;
        Some(self.sections.remove(index))
    }

    /// Returns how many sections were removed.
    pub fn clear(&mut self, scope: ClearScope) -> usize {
        let before = self.sections.len();
        match scope {
            ClearScope::All => self.sections.clear(),
            ClearScope::Page(page) => self.sections.retain(|s| s.page != page),
        }
        before - self.sections.len()
    }

    /// Sections of one page, oldest first.
    pub fn list(&self, page: usize) -> Vec<Section> {
        self.sections.iter().filter(|s| s.page == page).cloned().collect()
    }

    /// Every section, oldest first.
    pub fn all(&self) -> &[Section] {
        &self.sections
    }

    pub fn get(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Pages that have at least one section, ascending.
    pub fn pages(&self) -> Vec<usize> {
        let mut pages: Vec<usize> = self.sections.iter().map(|s| s.page).collect();
        pages.sort_unstable();
        pages.dedup();
        pages
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Store shared between the input side and detection runs. Writers are
/// exclusive; a run works on an owned [`snapshot`](Self::snapshot).
#[derive(Debug, Clone, Default)]
pub struct SharedSectionStore {
    inner: Arc<RwLock<SectionStore>>,
}

impl SharedSectionStore {
    pub fn new(store: SectionStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    pub fn add(
        &self,
        name: &str,
        view_rect: &Rect,
        page: usize,
        state: &ViewState,
        raster: &PageRaster,
    ) -> Result<Section> {
        self.write(|store| store.add(name, view_rect, page, state, raster))
    }

    pub fn undo(&self) -> Option<Section> {
        self.write(SectionStore::undo)
    }

    pub fn clear(&self, scope: ClearScope) -> usize {
        self.write(|store| store.clear(scope))
    }

    pub fn list(&self, page: usize) -> Vec<Section> {
        self.read(|store| store.list(page))
    }

    pub fn snapshot(&self) -> Vec<Section> {
        self.read(|store| store.all().to_vec())
    }

    /// Run `f` with exclusive access.
    pub fn write<T>(&self, f: impl FnOnce(&mut SectionStore) -> T) -> T {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    pub fn read<T>(&self, f: impl FnOnce(&SectionStore) -> T) -> T {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }
}
