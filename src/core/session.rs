//! Flat record list for saving and resuming a set of sections.

use std::path::Path;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::core::sections::{Section, SectionStore};
use crate::detection::DetectionConfig;
use crate::document::PageRaster;
use crate::error::{Error, Result};
use crate::models::Rect;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    pub page: usize,
    pub rect: Rect,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub created_at: Option<OffsetDateTime>,
}

impl From<&Section> for SessionRecord {
    fn from(section: &Section) -> Self {
        Self {
            id: section.id,
            name: section.name.clone(),
            page: section.page,
            rect: section.rect,
            created_at: Some(section.created_at),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub document: Option<String>,
    #[serde(default)]
    pub records: Vec<SessionRecord>,
    #[serde(default)]
    pub config: DetectionConfig,
}

impl Session {
    pub fn from_store(
        document: Option<String>,
        store: &SectionStore,
        config: DetectionConfig,
    ) -> Self {
        Self {
            document,
            records: store.to_records(),
            config,
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }
}

impl SectionStore {
    pub fn to_records(&self) -> Vec<SessionRecord> {
        self.all().iter().map(SessionRecord::from).collect()
    }

    /// Rebuild a store from saved records, validating each against the page
    /// it names. Record order becomes creation order.
    pub fn restore(records: &[SessionRecord], pages: &[PageRaster]) -> Result<Self> {
        let mut store = SectionStore::new();
        for record in records {
            let raster = pages.iter().find(|p| p.index() == record.page).ok_or_else(|| {
                Error::invalid(format!(
                    "section '{}' refers to page {} which is not loaded",
                    record.name, record.page
                ))
            })?;
            store.insert(&record.name, record.rect, raster, Some(record.id), record.created_at)?;
        }
        Ok(store)
    }
}
