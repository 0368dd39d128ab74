//! Platzierte Welt-Objekte: Pose, Anker, Art-Variante und Zustands-Flags.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::core::coords::TileCoord;
use crate::core::remap::RemapTable;

/// Geschlossene Art-Variante eines Welt-Objekts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorldObjectKind {
    /// Statisches Objekt ohne Netzwerk-Bezug
    Static,
    /// Gleis-/Straßen-Segment aus einem Katalog-Shape
    Track { shape_id: u32 },
    /// Dynamisches Segment aus einzelnen Sections
    DynTrack { section_ids: Vec<u32> },
    /// Gruppe: Verweise auf Mitglieds-Objekte
    Group { members: Vec<(TileCoord, u32)> },
    /// Mess-Lineal, nie persistiert ins Netzwerk
    Ruler,
    /// Interaktives Objekt mit Item-Referenzen
    Interactive { item_ids: Vec<u32>, road: bool },
}

impl WorldObjectKind {
    pub fn is_track_segment(&self) -> bool {
        matches!(self, Self::Track { .. } | Self::DynTrack { .. })
    }

    pub fn is_interactive(&self) -> bool {
        matches!(self, Self::Interactive { .. })
    }
}

/// Ein platziertes Objekt innerhalb eines Tiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldObject {
    /// Tile-lokale UID; 0 bis zur Platzierung
    pub uid: u32,
    pub tile: TileCoord,
    /// Lokale Position im Tile
    pub position: Vec3,
    pub rotation: Quat,
    /// Anker: ursprüngliche Position relativ zum aktuellen Heimat-Tile
    pub first_position: Vec3,
    /// Versatz des Segment-Endpunkts relativ zur Position (nur Segmente)
    pub end_offset: Vec3,
    pub kind: WorldObjectKind,
    /// Segment ist im Track-Netzwerk registriert
    pub in_network: bool,
    pub loaded: bool,
    pub modified: bool,
}

impl WorldObject {
    /// Neues, noch nicht platziertes Objekt (UID vergibt das Tile).
    pub fn new(position: Vec3, rotation: Quat, kind: WorldObjectKind) -> Self {
        Self {
            uid: 0,
            tile: TileCoord::default(),
            position,
            rotation,
            first_position: position,
            end_offset: Vec3::ZERO,
            kind,
            in_network: false,
            loaded: false,
            modified: false,
        }
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.modified = true;
    }

    pub fn set_modified(&mut self) {
        self.modified = true;
    }

    /// Dreht das Objekt um seine lokale X-Achse (Steigung nachführen).
    pub fn rotate_elevation(&mut self, angle_rad: f32) {
        self.rotation *= Quat::from_rotation_x(angle_rad);
        self.modified = true;
    }

    /// Schreibt Section-/Shape-Referenzen gemäß Remap-Tabelle um.
    ///
    /// Liefert `true`, wenn sich mindestens eine Referenz geändert hat.
    pub fn apply_remap(&mut self, remap: &RemapTable) -> bool {
        let mut changed = false;
        match &mut self.kind {
            WorldObjectKind::Track { shape_id } => {
                let new_id = remap.map_shape(*shape_id);
                if new_id != *shape_id {
                    *shape_id = new_id;
                    changed = true;
                }
            }
            WorldObjectKind::DynTrack { section_ids } => {
                for sid in section_ids {
                    let new_id = remap.map_section(*sid);
                    if new_id != *sid {
                        *sid = new_id;
                        changed = true;
                    }
                }
            }
            _ => {}
        }
        if changed {
            self.modified = true;
        }
        changed
    }

    /// Versetzt Item-Referenzen beim Netzwerk-Merge.
    pub fn add_item_id_offset(&mut self, track_offset: u32, road_offset: u32) {
        if let WorldObjectKind::Interactive { item_ids, road } = &mut self.kind {
            let offset = if *road { road_offset } else { track_offset };
            for id in item_ids {
                *id += offset;
            }
        }
    }

    /// Markiert ein Segment nach dem Entfernen aus dem Netzwerk.
    pub fn removed_from_network(&mut self) {
        self.in_network = false;
        self.modified = true;
    }
}
