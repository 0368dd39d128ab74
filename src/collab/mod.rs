//! Kollaborateur-Schnittstellen: Terrain und Undo.

pub mod terrain;
pub mod undo;

pub use terrain::{MemoryTerrain, TerrainPatch, TerrainProvider};
pub use undo::{MemoryUndo, NoUndo, UndoEntry, UndoRecorder};
