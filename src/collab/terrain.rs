//! Terrain-Kollaborateur: schmale Schnittstelle, kein Format-Wissen im Kern.

use std::collections::{HashMap, HashSet};

use glam::Vec3;

use crate::core::coords::{TileCoord, TILE_SIZE};

/// Opakes Höhen-Patch eines Tiles; Inhalt ist Sache des Providers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TerrainPatch(pub Vec<u8>);

/// Zugriff auf das Terrain einer Route.
///
/// Der Kern fragt nur Existenz und Patches ab; Parsen und Persistieren von
/// Terrain-Formaten passiert ausschließlich beim Host.
pub trait TerrainProvider {
    /// Hat das Tile Terrain-Backing?
    fn is_loaded(&self, coord: TileCoord) -> bool;

    /// Legt ein leeres Terrain-Tile an; `false` bei Fehlschlag.
    fn save_empty(&mut self, coord: TileCoord) -> bool;

    /// Lädt ein Tile neu; `false`, wenn es weiterhin fehlt.
    fn reload(&mut self, coord: TileCoord) -> bool;

    /// Exportiert das Höhen-Patch eines Tiles.
    fn export_patch(&self, coord: TileCoord) -> Option<TerrainPatch>;

    /// Übernimmt ein Höhen-Patch in ein vorhandenes Tile.
    fn import_patch(&mut self, coord: TileCoord, patch: &TerrainPatch) -> bool;

    /// Füllt das Ziel-Tile mit Terrain-Daten einer zweiten Quelle.
    ///
    /// `offset` ist die Merge-Verschiebung der Quelle (x/y addiert,
    /// z subtrahiert); das Quell-Tile ergibt sich durch Rückrechnung.
    /// `false`, wenn Quelle oder Ziel kein Backing haben.
    fn stitch_from(
        &mut self,
        source: &dyn TerrainProvider,
        target: TileCoord,
        offset: Vec3,
    ) -> bool {
        let source_tile = TileCoord::new(
            target.x - (offset.x / TILE_SIZE).round() as i32,
            target.z + (offset.z / TILE_SIZE).round() as i32,
        );
        let Some(patch) = source.export_patch(source_tile) else {
            return false;
        };
        self.import_patch(target, &patch)
    }
}

/// In-Memory-Provider für Tests und Hosts ohne eigenen Terrain-Speicher.
#[derive(Debug, Default)]
pub struct MemoryTerrain {
    tiles: HashMap<TileCoord, TerrainPatch>,
    /// Tiles, deren Anlage absichtlich fehlschlägt (Fehlerpfad-Tests)
    failing: HashSet<TileCoord>,
}

impl MemoryTerrain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider mit vorbefüllten Tiles.
    pub fn with_tiles(coords: impl IntoIterator<Item = TileCoord>) -> Self {
        let mut terrain = Self::new();
        for coord in coords {
            terrain.tiles.insert(coord, TerrainPatch::default());
        }
        terrain
    }

    pub fn insert(&mut self, coord: TileCoord, patch: TerrainPatch) {
        self.tiles.insert(coord, patch);
    }

    /// Lässt `save_empty`/`reload` für dieses Tile fehlschlagen.
    pub fn fail_at(&mut self, coord: TileCoord) {
        self.failing.insert(coord);
    }

    pub fn patch(&self, coord: TileCoord) -> Option<&TerrainPatch> {
        self.tiles.get(&coord)
    }
}

impl TerrainProvider for MemoryTerrain {
    fn is_loaded(&self, coord: TileCoord) -> bool {
        self.tiles.contains_key(&coord)
    }

    fn save_empty(&mut self, coord: TileCoord) -> bool {
        if self.failing.contains(&coord) {
            log::warn!("Terrain-Tile {coord} konnte nicht angelegt werden");
            return false;
        }
        self.tiles.entry(coord).or_default();
        true
    }

    fn reload(&mut self, coord: TileCoord) -> bool {
        self.tiles.contains_key(&coord)
    }

    fn export_patch(&self, coord: TileCoord) -> Option<TerrainPatch> {
        self.tiles.get(&coord).cloned()
    }

    fn import_patch(&mut self, coord: TileCoord, patch: &TerrainPatch) -> bool {
        match self.tiles.get_mut(&coord) {
            Some(existing) => {
                *existing = patch.clone();
                true
            }
            None => false,
        }
    }
}
