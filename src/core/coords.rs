//! Tile-Koordinaten und der Koordinaten-Normalisierer.
//!
//! Die Welt ist ein 2D-Raster quadratischer Tiles mit Kantenlänge
//! [`TILE_SIZE`]; lokale Positionen innerhalb eines Tiles liegen auf x und z
//! im Bereich `[-HALF_TILE, HALF_TILE]`. Alle Funktionen hier sind rein —
//! kein Zugriff auf Grid oder Netzwerk.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Kantenlänge eines Tiles in Metern.
pub const TILE_SIZE: f32 = 2048.0;
/// Halbe Kantenlänge; lokale Offsets bleiben in `[-HALF_TILE, HALF_TILE]`.
pub const HALF_TILE: f32 = 1024.0;

/// Strukturierter Tile-Schlüssel (x/z-Index im Welt-Raster).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct TileCoord {
    pub x: i32,
    pub z: i32,
}

impl TileCoord {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Nachbar-Tile mit Index-Versatz.
    pub fn offset(self, dx: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.z + dz)
    }
}

impl std::fmt::Display for TileCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// Normalisiert eine (Tile, lokale Position)-Kombination.
///
/// Wickelt x und z in `[-HALF_TILE, HALF_TILE]` und passt den Tile-Index
/// entsprechend an; y bleibt unberührt. Idempotent für bereits gültige
/// Eingaben. Aufrufer müssen nicht-endliche Werte vorher abfangen.
pub fn normalize(tile: TileCoord, pos: Vec3) -> (TileCoord, Vec3) {
    debug_assert!(pos.is_finite(), "normalize: Position muss endlich sein");
    let mut tile = tile;
    let mut pos = pos;
    while pos.x > HALF_TILE {
        pos.x -= TILE_SIZE;
        tile.x += 1;
    }
    while pos.x < -HALF_TILE {
        pos.x += TILE_SIZE;
        tile.x -= 1;
    }
    while pos.z > HALF_TILE {
        pos.z -= TILE_SIZE;
        tile.z += 1;
    }
    while pos.z < -HALF_TILE {
        pos.z += TILE_SIZE;
        tile.z -= 1;
    }
    (tile, pos)
}

/// Liegt die lokale Position bereits im gültigen Bereich?
pub fn in_range(pos: Vec3) -> bool {
    pos.x >= -HALF_TILE && pos.x <= HALF_TILE && pos.z >= -HALF_TILE && pos.z <= HALF_TILE
}

/// Globale XZ-Koordinate einer (Tile, lokale Position)-Kombination.
pub fn world_xz(tile: TileCoord, pos: Vec3) -> Vec2 {
    Vec2::new(
        tile.x as f32 * TILE_SIZE + pos.x,
        tile.z as f32 * TILE_SIZE + pos.z,
    )
}

/// Globale 3D-Koordinate einer (Tile, lokale Position)-Kombination.
pub fn world_pos(tile: TileCoord, pos: Vec3) -> Vec3 {
    Vec3::new(
        tile.x as f32 * TILE_SIZE + pos.x,
        pos.y,
        tile.z as f32 * TILE_SIZE + pos.z,
    )
}

/// Zerlegt eine globale Koordinate in (Tile, lokale Position).
pub fn split_world_pos(world: Vec3) -> (TileCoord, Vec3) {
    normalize(TileCoord::new(0, 0), world)
}
