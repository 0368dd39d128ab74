//! Spärliches, lazy befülltes Tile-Raster der Welt.

use glam::Vec3;
use indexmap::IndexMap;

use crate::collab::terrain::TerrainProvider;
use crate::core::coords::{self, TileCoord, TILE_SIZE};
use crate::core::tile::{Tile, TileLoadState};

/// Das Welt-Raster: Tiles entstehen beim ersten Zugriff.
///
/// `IndexMap` hält die Einfüge-Reihenfolge stabil, damit Iterationen über
/// geladene Tiles reproduzierbar bleiben.
#[derive(Debug, Default)]
pub struct WorldGrid {
    tiles: IndexMap<TileCoord, Tile>,
}

impl WorldGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Liefert das Tile, bei Bedarf angelegt.
    ///
    /// Ohne `allow_load` kommt das Tile in seinem aktuellen Zustand zurück
    /// (neu angelegte Tiles sind `Unloaded`). Mit `allow_load` wird ein
    /// ungeladenes Tile gegen das Terrain aufgelöst: mit Backing wird es
    /// beschreibbar, ohne bleibt es `NotGenerated` und die Anfrage liefert
    /// `None`.
    pub fn request_tile(
        &mut self,
        coord: TileCoord,
        allow_load: bool,
        terrain: &dyn TerrainProvider,
    ) -> Option<&mut Tile> {
        let tile = self
            .tiles
            .entry(coord)
            .or_insert_with(|| Tile::new(coord));
        if tile.state == TileLoadState::Loaded || !allow_load {
            return Some(tile);
        }
        if terrain.is_loaded(coord) {
            tile.state = TileLoadState::Loaded;
            Some(tile)
        } else {
            tile.state = TileLoadState::NotGenerated;
            log::debug!("Tile {coord} hat kein Terrain-Backing");
            None
        }
    }

    /// Legt ein Tile direkt beschreibbar an (Merge-Pfad).
    pub fn init_tile(&mut self, coord: TileCoord) -> &mut Tile {
        let tile = self
            .tiles
            .entry(coord)
            .or_insert_with(|| Tile::new(coord));
        if tile.state != TileLoadState::Loaded {
            tile.state = TileLoadState::Loaded;
            tile.modified = true;
        }
        tile
    }

    pub fn tile(&self, coord: TileCoord) -> Option<&Tile> {
        self.tiles.get(&coord)
    }

    pub fn tile_mut(&mut self, coord: TileCoord) -> Option<&mut Tile> {
        self.tiles.get_mut(&coord)
    }

    pub fn object(&self, tile: TileCoord, uid: u32) -> Option<&crate::core::WorldObject> {
        self.tiles.get(&tile)?.object(uid)
    }

    pub fn object_mut(
        &mut self,
        tile: TileCoord,
        uid: u32,
    ) -> Option<&mut crate::core::WorldObject> {
        self.tiles.get_mut(&tile)?.object_mut(uid)
    }

    /// Zieht ein Objekt in sein (nach Normalisierung) korrektes Heimat-Tile.
    ///
    /// Bleibt das Tile gleich, passiert nichts und die bisherige Adresse
    /// kommt zurück. Sonst wird das Objekt entnommen, der Anker um
    /// `-(Δtile × Kantenlänge)` nachgeführt und im Ziel-Tile mit frischer
    /// UID eingefügt. Ist das Ziel-Tile nicht beschreibbar, bleibt das
    /// Objekt unverändert im Quell-Tile und die Antwort ist `None`.
    pub fn move_object_across_tiles(
        &mut self,
        tile: TileCoord,
        uid: u32,
        terrain: &dyn TerrainProvider,
    ) -> Option<(TileCoord, u32)> {
        let obj = self.tiles.get(&tile)?.object(uid)?;
        let (dest, local) = coords::normalize(tile, obj.position);
        if dest == tile {
            return Some((tile, uid));
        }
        if self.request_tile(dest, true, terrain).is_none() {
            log::warn!("Ziel-Tile {dest} nicht beschreibbar, Objekt bleibt in {tile}");
            return None;
        }
        let mut obj = self.tiles.get_mut(&tile)?.remove_object(uid)?;
        let dx = (dest.x - tile.x) as f32;
        let dz = (dest.z - tile.z) as f32;
        obj.position = local;
        obj.first_position.x -= dx * TILE_SIZE;
        obj.first_position.z -= dz * TILE_SIZE;
        let dest_tile = self
            .tiles
            .get_mut(&dest)
            .expect("Ziel-Tile wurde soeben angefordert");
        let new_uid = dest_tile.place_object(obj);
        log::debug!("Objekt {tile}/{uid} nach {dest}/{new_uid} umgezogen");
        Some((dest, new_uid))
    }

    /// Platziert ein bereits normalisiertes Objekt in seinem Tile.
    pub fn place_object(
        &mut self,
        coord: TileCoord,
        obj: crate::core::WorldObject,
        terrain: &dyn TerrainProvider,
    ) -> Option<(TileCoord, u32)> {
        debug_assert!(coords::in_range(obj.position));
        let tile = self.request_tile(coord, true, terrain)?;
        let uid = tile.place_object(obj);
        Some((coord, uid))
    }

    /// Besucht alle geladenen Tiles in stabiler Reihenfolge.
    pub fn for_each_loaded_tile(&self, mut f: impl FnMut(&Tile)) {
        for tile in self.tiles.values() {
            if tile.state == TileLoadState::Loaded {
                f(tile);
            }
        }
    }

    pub fn for_each_loaded_tile_mut(&mut self, mut f: impl FnMut(&mut Tile)) {
        for tile in self.tiles.values_mut() {
            if tile.state == TileLoadState::Loaded {
                f(tile);
            }
        }
    }

    /// Koordinaten aller ungespeicherten Tiles.
    pub fn unsaved_tiles(&self) -> Vec<TileCoord> {
        self.tiles
            .values()
            .filter(|t| t.modified)
            .map(|t| t.coord)
            .collect()
    }

    pub fn loaded_tile_count(&self) -> usize {
        self.tiles
            .values()
            .filter(|t| t.state == TileLoadState::Loaded)
            .count()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Entnimmt alle Tiles (Merge-Durchlauf über die Sekundär-Route).
    pub fn take_all_tiles(&mut self) -> Vec<Tile> {
        std::mem::take(&mut self.tiles).into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::terrain::MemoryTerrain;
    use crate::core::world_object::{WorldObject, WorldObjectKind};
    use approx::assert_abs_diff_eq;
    use glam::Quat;

    fn obj_at(pos: Vec3) -> WorldObject {
        WorldObject::new(pos, Quat::IDENTITY, WorldObjectKind::Static)
    }

    #[test]
    fn request_without_backing_is_not_generated() {
        let mut grid = WorldGrid::new();
        let terrain = MemoryTerrain::new();
        assert!(grid
            .request_tile(TileCoord::new(2, 2), true, &terrain)
            .is_none());
        assert_eq!(
            grid.tile(TileCoord::new(2, 2)).map(|t| t.state),
            Some(TileLoadState::NotGenerated)
        );
    }

    #[test]
    fn request_without_load_returns_tile_in_current_state() {
        let mut grid = WorldGrid::new();
        let terrain = MemoryTerrain::new();
        // Erste Anfrage legt das Tile an, der Zustand bleibt Unloaded
        let tile = grid
            .request_tile(TileCoord::new(3, 3), false, &terrain)
            .expect("Tile erwartet");
        assert_eq!(tile.state, TileLoadState::Unloaded);
        // Zweite Anfrage liefert das vorhandene Tile unverändert
        assert!(grid
            .request_tile(TileCoord::new(3, 3), false, &terrain)
            .is_some());
        assert_eq!(grid.len(), 1);
    }

    #[test]
    fn move_within_tile_is_a_noop() {
        let mut grid = WorldGrid::new();
        let terrain = MemoryTerrain::with_tiles([TileCoord::new(0, 0)]);
        let (tile, uid) = grid
            .place_object(TileCoord::new(0, 0), obj_at(Vec3::new(10.0, 0.0, 10.0)), &terrain)
            .expect("platziert");
        assert_eq!(
            grid.move_object_across_tiles(tile, uid, &terrain),
            Some((tile, uid))
        );
    }

    #[test]
    fn move_across_edge_rehomes_and_adjusts_anchor() {
        let mut grid = WorldGrid::new();
        let terrain = MemoryTerrain::with_tiles([TileCoord::new(0, 0), TileCoord::new(1, 0)]);
        let (tile, uid) = grid
            .place_object(TileCoord::new(0, 0), obj_at(Vec3::new(1000.0, 0.0, 0.0)), &terrain)
            .expect("platziert");
        // 40 m über die Kante schieben
        grid.object_mut(tile, uid).expect("Objekt").position.x = 1040.0;
        let (dest, new_uid) = grid
            .move_object_across_tiles(tile, uid, &terrain)
            .expect("umgezogen");
        assert_eq!(dest, TileCoord::new(1, 0));
        let obj = grid.object(dest, new_uid).expect("Objekt im Ziel-Tile");
        assert_abs_diff_eq!(obj.position.x, -1008.0);
        assert_abs_diff_eq!(obj.first_position.x, 1000.0 - TILE_SIZE);
        assert!(grid.object(tile, uid).is_none());
    }

    #[test]
    fn move_to_unwritable_tile_leaves_object_in_place() {
        let mut grid = WorldGrid::new();
        let terrain = MemoryTerrain::with_tiles([TileCoord::new(0, 0)]);
        let (tile, uid) = grid
            .place_object(TileCoord::new(0, 0), obj_at(Vec3::new(0.0, 0.0, 0.0)), &terrain)
            .expect("platziert");
        grid.object_mut(tile, uid).expect("Objekt").position.z = 2000.0;
        assert!(grid.move_object_across_tiles(tile, uid, &terrain).is_none());
        assert!(grid.object(tile, uid).is_some());
    }

    #[test]
    fn loaded_iteration_order_is_insertion_order() {
        let mut grid = WorldGrid::new();
        let coords = [TileCoord::new(5, 5), TileCoord::new(-1, 2), TileCoord::new(0, 0)];
        for c in coords {
            grid.init_tile(c);
        }
        let mut seen = Vec::new();
        grid.for_each_loaded_tile(|t| seen.push(t.coord));
        assert_eq!(seen, coords);
    }
}
