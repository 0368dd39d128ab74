//! Ein Tile der Welt: Objekt-Liste, Lade-Zustand, UID-Vergabe.

use serde::{Deserialize, Serialize};

use crate::core::coords::TileCoord;
use crate::core::remap::RemapTable;
use crate::core::world_object::WorldObject;

/// Lade-Zustand eines Tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TileLoadState {
    #[default]
    Unloaded,
    /// Kein Terrain-Backing vorhanden
    NotGenerated,
    Loaded,
}

/// Ein Tile mit seinen platzierten Objekten.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tile {
    pub coord: TileCoord,
    objects: Vec<WorldObject>,
    pub state: TileLoadState,
    pub modified: bool,
    hidden_objects: u32,
    /// Nächste freie UID; pro Tile vergeben, beginnt bei 1
    next_uid: u32,
}

impl Tile {
    pub fn new(coord: TileCoord) -> Self {
        Self {
            coord,
            objects: Vec::new(),
            state: TileLoadState::Unloaded,
            modified: false,
            hidden_objects: 0,
            next_uid: 1,
        }
    }

    /// Frisch angelegtes, sofort beschreibbares Tile.
    pub fn init_new(coord: TileCoord) -> Self {
        let mut tile = Self::new(coord);
        tile.state = TileLoadState::Loaded;
        tile.modified = true;
        tile
    }

    /// Platziert ein Objekt und vergibt die nächste UID.
    pub fn place_object(&mut self, mut obj: WorldObject) -> u32 {
        let uid = self.next_uid;
        self.next_uid += 1;
        obj.uid = uid;
        obj.tile = self.coord;
        obj.loaded = true;
        obj.modified = true;
        self.objects.push(obj);
        self.modified = true;
        uid
    }

    /// Entfernt ein Objekt endgültig (z. B. beim Tile-Wechsel).
    pub fn remove_object(&mut self, uid: u32) -> Option<WorldObject> {
        let idx = self.objects.iter().position(|o| o.uid == uid)?;
        self.modified = true;
        Some(self.objects.remove(idx))
    }

    /// Soft-Delete: Objekt bleibt erhalten, zählt aber als versteckt.
    pub fn hide_object(&mut self, uid: u32) -> bool {
        let Some(obj) = self.objects.iter_mut().find(|o| o.uid == uid && o.loaded) else {
            return false;
        };
        obj.loaded = false;
        obj.modified = true;
        self.hidden_objects += 1;
        self.modified = true;
        true
    }

    pub fn object(&self, uid: u32) -> Option<&WorldObject> {
        self.objects.iter().find(|o| o.uid == uid)
    }

    pub fn object_mut(&mut self, uid: u32) -> Option<&mut WorldObject> {
        self.objects.iter_mut().find(|o| o.uid == uid)
    }

    pub fn objects(&self) -> &[WorldObject] {
        &self.objects
    }

    pub fn objects_mut(&mut self) -> &mut [WorldObject] {
        &mut self.objects
    }

    /// Zieht alle Objekte heraus (Merge-Durchlauf der Sekundär-Route).
    pub fn take_objects(&mut self) -> Vec<WorldObject> {
        std::mem::take(&mut self.objects)
    }

    /// Anzahl sichtbarer Objekte.
    pub fn object_count(&self) -> usize {
        self.objects.iter().filter(|o| o.loaded).count()
    }

    pub fn hidden_object_count(&self) -> u32 {
        self.hidden_objects
    }

    /// Schreibt Section-/Shape-Referenzen aller Objekte um; liefert die
    /// Anzahl geänderter Objekte.
    pub fn update_track_section_info(&mut self, remap: &RemapTable) -> u32 {
        let mut changed = 0;
        for obj in &mut self.objects {
            if obj.apply_remap(remap) {
                changed += 1;
            }
        }
        if changed > 0 {
            self.modified = true;
        }
        changed
    }

    pub fn mark_saved(&mut self) {
        self.modified = false;
        for obj in &mut self.objects {
            obj.modified = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::world_object::WorldObjectKind;
    use glam::{Quat, Vec3};

    fn static_obj() -> WorldObject {
        WorldObject::new(Vec3::ZERO, Quat::IDENTITY, WorldObjectKind::Static)
    }

    #[test]
    fn uids_are_sequential_per_tile() {
        let mut tile = Tile::init_new(TileCoord::new(0, 0));
        assert_eq!(tile.place_object(static_obj()), 1);
        assert_eq!(tile.place_object(static_obj()), 2);
        tile.remove_object(1);
        // UIDs werden nie wiederverwendet
        assert_eq!(tile.place_object(static_obj()), 3);
    }

    #[test]
    fn hide_counts_and_keeps_object() {
        let mut tile = Tile::init_new(TileCoord::new(1, 1));
        let uid = tile.place_object(static_obj());
        assert!(tile.hide_object(uid));
        assert!(!tile.hide_object(uid));
        assert_eq!(tile.hidden_object_count(), 1);
        assert_eq!(tile.object_count(), 0);
        assert!(tile.object(uid).is_some());
    }

    #[test]
    fn init_new_is_loaded_and_modified() {
        let tile = Tile::init_new(TileCoord::new(-3, 4));
        assert_eq!(tile.state, TileLoadState::Loaded);
        assert!(tile.modified);
        let fresh = Tile::new(TileCoord::new(0, 0));
        assert_eq!(fresh.state, TileLoadState::Unloaded);
        assert!(!fresh.modified);
    }

    #[test]
    fn mark_saved_clears_flags() {
        let mut tile = Tile::init_new(TileCoord::new(0, 0));
        let uid = tile.place_object(static_obj());
        tile.mark_saved();
        assert!(!tile.modified);
        assert!(!tile.object(uid).map(|o| o.modified).unwrap_or(true));
    }
}
