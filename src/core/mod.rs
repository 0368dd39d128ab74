//! Domänen-Typen: Koordinaten, Tiles, Welt-Objekte, Track-Netzwerk.

pub mod catalog;
pub mod coords;
pub mod remap;
pub mod spatial;
pub mod tile;
pub mod track_item;
pub mod track_network;
pub mod world_grid;
pub mod world_object;

pub use catalog::{NetworkConstraint, SectionCatalog, SectionDef, SectionGeometry, ShapeDef};
pub use coords::{TileCoord, HALF_TILE, TILE_SIZE};
pub use remap::RemapTable;
pub use tile::{Tile, TileLoadState};
pub use track_item::{TrackItem, TrackItemKind};
pub use track_network::{
    NetworkKind, NetworkPosition, TrackNetwork, TrackNode, TrackNodeKind, UidUpdate, VectorSection,
};
pub use world_grid::WorldGrid;
pub use world_object::{WorldObject, WorldObjectKind};
