//! Undo-Kollaborateur: Aufzeichnung von Schritten vor der Mutation.

use crate::core::coords::TileCoord;
use crate::core::track_network::TrackNetwork;
use crate::core::world_object::WorldObject;

/// Nimmt Undo-Schritte entgegen.
///
/// Jeder Schritt wird synchron VOR der Mutation aufgezeichnet, die er
/// beschreibt. `state_begin`/`state_end` klammern zusammengesetzte
/// Operationen zu einem einzigen rückgängig machbaren Schritt.
pub trait UndoRecorder {
    fn state_begin(&mut self) {}
    fn state_end(&mut self) {}

    /// Voll-Snapshot eines Track-Netzwerks vor einer Graph-Mutation.
    fn push_track_network_snapshot(&mut self, network: &TrackNetwork, is_road: bool);

    /// Platzierung: (Tile, UID) des neuen Objekts.
    fn push_object_placed(&mut self, tile: TileCoord, uid: u32);

    /// Entfernung/Verstecken: Kopie des alten Objekt-Zustands.
    fn push_object_removed(&mut self, obj: &WorldObject);

    fn clear(&mut self);
}

/// Verwirft alle Schritte (Batch-Importe, Tests ohne Undo-Interesse).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoUndo;

impl UndoRecorder for NoUndo {
    fn push_track_network_snapshot(&mut self, _network: &TrackNetwork, _is_road: bool) {}
    fn push_object_placed(&mut self, _tile: TileCoord, _uid: u32) {}
    fn push_object_removed(&mut self, _obj: &WorldObject) {}
    fn clear(&mut self) {}
}

/// Ein aufgezeichneter Undo-Schritt.
#[derive(Debug, Clone)]
pub enum UndoEntry {
    /// Beginn einer zusammengesetzten Operation
    StateBegin,
    StateEnd,
    TrackNetworkSnapshot {
        network: Box<TrackNetwork>,
        is_road: bool,
    },
    ObjectPlaced {
        tile: TileCoord,
        uid: u32,
    },
    ObjectRemoved(Box<WorldObject>),
}

/// Begrenzter In-Memory-Rekorder.
///
/// Läuft der Puffer voll, fällt der älteste Schritt heraus.
#[derive(Debug, Default)]
pub struct MemoryUndo {
    entries: Vec<UndoEntry>,
    max_entries: usize,
}

impl MemoryUndo {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[UndoEntry] {
        &self.entries
    }

    /// Nimmt den jüngsten Schritt heraus.
    pub fn pop(&mut self) -> Option<UndoEntry> {
        self.entries.pop()
    }

    fn push(&mut self, entry: UndoEntry) {
        if self.max_entries > 0 && self.entries.len() >= self.max_entries {
            self.entries.remove(0);
        }
        self.entries.push(entry);
    }
}

impl UndoRecorder for MemoryUndo {
    fn state_begin(&mut self) {
        self.push(UndoEntry::StateBegin);
    }

    fn state_end(&mut self) {
        self.push(UndoEntry::StateEnd);
    }

    fn push_track_network_snapshot(&mut self, network: &TrackNetwork, is_road: bool) {
        self.push(UndoEntry::TrackNetworkSnapshot {
            network: Box::new(network.clone()),
            is_road,
        });
    }

    fn push_object_placed(&mut self, tile: TileCoord, uid: u32) {
        self.push(UndoEntry::ObjectPlaced { tile, uid });
    }

    fn push_object_removed(&mut self, obj: &WorldObject) {
        self.push(UndoEntry::ObjectRemoved(Box::new(obj.clone())));
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}
