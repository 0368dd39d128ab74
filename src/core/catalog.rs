//! Section-/Shape-Katalog: injizierter Nachschlagedienst für Gleis-Geometrie.
//!
//! Globale Einträge sind zwischen Routen geteilt und unveränderlich;
//! routen-lokale Einträge beginnen bei [`LOCAL_ID_BASE`] und dürfen beim
//! Routen-Merge übernommen oder beim Laden neu durchnummeriert werden.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::remap::RemapTable;

/// Erste Id des routen-lokalen Nummernkreises.
pub const LOCAL_ID_BASE: u32 = 40_000;

/// Geometrie einer einzelnen Section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SectionGeometry {
    Straight { length: f32 },
    Curve { radius: f32, angle_rad: f32 },
}

impl SectionGeometry {
    /// Bogenlänge in Metern.
    pub fn length(&self) -> f32 {
        match *self {
            Self::Straight { length } => length,
            Self::Curve { radius, angle_rad } => radius * angle_rad.abs(),
        }
    }

    /// Richtungsänderung über die Section, Radiant.
    pub fn heading_change(&self) -> f32 {
        match *self {
            Self::Straight { .. } => 0.0,
            Self::Curve { angle_rad, .. } => angle_rad,
        }
    }
}

/// Katalog-Eintrag einer Section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionDef {
    pub geometry: SectionGeometry,
    /// Straßen- statt Schienen-Section
    pub road: bool,
}

/// Katalog-Eintrag eines Shapes: Kette von Section-Ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeDef {
    pub section_ids: Vec<u32>,
    pub road: bool,
}

/// Netzwerk-Bindung eines platzierbaren Katalog-Eintrags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NetworkConstraint {
    /// Frei platzierbar, keine Netzwerk-Registrierung
    #[default]
    Free,
    Rail,
    Road,
    /// Schiene und Straße zulässig; das näher liegende Netz gewinnt
    Dual,
}

/// Der Katalog selbst: globale plus routen-lokale Einträge.
#[derive(Debug, Clone, Default)]
pub struct SectionCatalog {
    global_sections: BTreeMap<u32, SectionDef>,
    global_shapes: BTreeMap<u32, ShapeDef>,
    local_sections: BTreeMap<u32, SectionDef>,
    local_shapes: BTreeMap<u32, ShapeDef>,
    next_local_section: u32,
    next_local_shape: u32,
    out_of_sync: bool,
}

impl SectionCatalog {
    pub fn new() -> Self {
        Self {
            next_local_section: LOCAL_ID_BASE,
            next_local_shape: LOCAL_ID_BASE,
            ..Default::default()
        }
    }

    /// Katalog mit vorbefüllten globalen Einträgen.
    pub fn with_globals(
        sections: impl IntoIterator<Item = (u32, SectionDef)>,
        shapes: impl IntoIterator<Item = (u32, ShapeDef)>,
    ) -> Self {
        let mut catalog = Self::new();
        catalog.global_sections.extend(sections);
        catalog.global_shapes.extend(shapes);
        catalog
    }

    /// Schlägt eine Section nach (global, dann lokal).
    pub fn section(&self, id: u32) -> Option<&SectionDef> {
        self.global_sections
            .get(&id)
            .or_else(|| self.local_sections.get(&id))
    }

    /// Schlägt ein Shape nach (global, dann lokal).
    pub fn shape(&self, id: u32) -> Option<&ShapeDef> {
        self.global_shapes
            .get(&id)
            .or_else(|| self.local_shapes.get(&id))
    }

    /// Klassifiziert ein Shape als Straße (`false` = Schiene/unbekannt).
    pub fn is_road_shape(&self, id: u32) -> bool {
        self.shape(id).map(|s| s.road).unwrap_or(false)
    }

    pub fn local_section_count(&self) -> usize {
        self.local_sections.len()
    }

    /// Legt eine routen-lokale Section an und vergibt die nächste Id.
    pub fn add_local_section(&mut self, def: SectionDef) -> u32 {
        let id = self.next_local_section;
        self.next_local_section += 1;
        self.local_sections.insert(id, def);
        id
    }

    /// Legt ein routen-lokales Shape an und vergibt die nächste Id.
    pub fn add_local_shape(&mut self, def: ShapeDef) -> u32 {
        let id = self.next_local_shape;
        self.next_local_shape += 1;
        self.local_shapes.insert(id, def);
        id
    }

    /// Markiert den lokalen Nummernkreis als inkonsistent (Lade-Befund).
    pub fn mark_out_of_sync(&mut self) {
        self.out_of_sync = true;
    }

    pub fn is_out_of_sync(&self) -> bool {
        self.out_of_sync
    }

    /// Übernimmt die lokalen Einträge eines zweiten Katalogs.
    ///
    /// Jeder fremde lokale Eintrag bekommt eine frische eigene Id; das
    /// Ergebnis ist die Alt→Neu-Tabelle für die nachgelagerten Fixups.
    /// Shapes referenzieren bereits umgeschriebene Section-Ids. Die
    /// Reihenfolge ist über die sortierten Quell-Ids deterministisch.
    pub fn adopt_local_from(&mut self, other: &SectionCatalog) -> RemapTable {
        let mut remap = RemapTable::default();
        for (&old_id, def) in &other.local_sections {
            let new_id = self.add_local_section(*def);
            if new_id != old_id {
                remap.sections.insert(old_id, new_id);
            }
        }
        for (&old_id, def) in &other.local_shapes {
            let mut def = def.clone();
            for sid in &mut def.section_ids {
                *sid = remap.map_section(*sid);
            }
            let new_id = self.add_local_shape(def);
            if new_id != old_id {
                remap.shapes.insert(old_id, new_id);
            }
        }
        remap
    }

    /// Nummeriert den lokalen Bestand kompakt ab [`LOCAL_ID_BASE`] neu.
    ///
    /// Reparatur-Pfad für inkonsistente Kataloge; setzt das
    /// Out-of-sync-Flag zurück und liefert die Alt→Neu-Tabelle.
    pub fn renumber_local(&mut self) -> RemapTable {
        let mut remap = RemapTable::default();
        let old_sections = std::mem::take(&mut self.local_sections);
        let old_shapes = std::mem::take(&mut self.local_shapes);
        self.next_local_section = LOCAL_ID_BASE;
        self.next_local_shape = LOCAL_ID_BASE;
        for (old_id, def) in old_sections {
            let new_id = self.add_local_section(def);
            if new_id != old_id {
                remap.sections.insert(old_id, new_id);
            }
        }
        for (old_id, mut def) in old_shapes {
            for sid in &mut def.section_ids {
                *sid = remap.map_section(*sid);
            }
            let new_id = self.add_local_shape(def);
            if new_id != old_id {
                remap.shapes.insert(old_id, new_id);
            }
        }
        self.out_of_sync = false;
        log::info!(
            "Katalog neu nummeriert: {} lokale Sections, {} lokale Shapes",
            self.local_sections.len(),
            self.local_shapes.len()
        );
        remap
    }
}

/// 2D-Endpunkt-Versatz einer Section bei Start-Heading 0 (entlang +Z).
pub fn section_end_offset(geometry: &SectionGeometry) -> Vec2 {
    match *geometry {
        SectionGeometry::Straight { length } => Vec2::new(0.0, length),
        SectionGeometry::Curve { radius, angle_rad } => {
            let half = angle_rad * 0.5;
            let chord = 2.0 * radius * half.abs().sin();
            Vec2::new(half.sin() * chord, half.cos() * chord)
        }
    }
}
