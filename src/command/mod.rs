mod history;

pub use history::HistoryStack;

use crate::raster::Raster;

/// One restorable snapshot of the annotation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    /// What the edit that replaced this snapshot was, e.g. "Pencil"
    description: String,
    raster: Raster,
}

impl HistoryEntry {
    pub fn new(description: impl Into<String>, raster: Raster) -> Self {
        Self {
            description: description.into(),
            raster,
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    pub fn into_raster(self) -> Raster {
        self.raster
    }

    pub fn memory_size(&self) -> usize {
        self.raster.memory_size()
    }
}
