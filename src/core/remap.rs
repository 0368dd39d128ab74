//! Kurzlebige Id-Übersetzungstabellen aus dem Katalog-Merge.

use std::collections::HashMap;

/// Alt→Neu-Zuordnung für Section- und Shape-Ids.
///
/// Wird beim Zusammenführen zweier Kataloge erzeugt und anschließend durch
/// Netzwerk- und Tile-Fixups gereicht; nicht enthaltene Ids bleiben
/// unverändert (Identität).
#[derive(Debug, Clone, Default)]
pub struct RemapTable {
    pub sections: HashMap<u32, u32>,
    pub shapes: HashMap<u32, u32>,
}

impl RemapTable {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty() && self.shapes.is_empty()
    }

    /// Übersetzt eine Section-Id; Identität ohne Eintrag.
    pub fn map_section(&self, id: u32) -> u32 {
        self.sections.get(&id).copied().unwrap_or(id)
    }

    /// Übersetzt eine Shape-Id; Identität ohne Eintrag.
    pub fn map_shape(&self, id: u32) -> u32 {
        self.shapes.get(&id).copied().unwrap_or(id)
    }
}
