//! Strecken-Editor-Kern als Library.
//! Tile-Welt, Track-Datenbanken, Routen-Merge und Platzierung — ohne
//! Rendering, Datei-Syntax oder UI; diese Schichten liefert der Host.

pub mod collab;
pub mod core;
pub mod route;
pub mod session;
pub mod shared;

pub use crate::core::{
    NetworkConstraint, NetworkKind, RemapTable, SectionCatalog, SectionDef, SectionGeometry,
    ShapeDef, Tile, TileCoord, TileLoadState, TrackItem, TrackItemKind, TrackNetwork, TrackNode,
    TrackNodeKind, VectorSection, WorldGrid, WorldObject, WorldObjectKind, HALF_TILE, TILE_SIZE,
};
pub use collab::{MemoryTerrain, MemoryUndo, NoUndo, TerrainPatch, TerrainProvider, UndoRecorder};
pub use route::{
    AutoPlaceMode, CatalogEntry, CatalogEntryKind, CatalogRecovery, MergeProgress, MergeReport,
    Route, UnsavedInfo,
};
pub use session::{SessionRequest, SessionResponse};
pub use shared::EditorOptions;
