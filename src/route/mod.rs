//! Die Route: Tile-Welt, Track-Datenbanken, Katalog und Operationen.

pub mod merge;
pub mod placement;

use std::path::Path;

use anyhow::{bail, Context};

use crate::collab::undo::UndoRecorder;
use crate::core::catalog::SectionCatalog;
use crate::core::coords::TileCoord;
use crate::core::track_network::{NamedPlaces, NetworkKind, TrackNetwork};
use crate::core::world_grid::WorldGrid;
use crate::core::world_object::WorldObjectKind;
use crate::shared::options::EditorOptions;

pub use merge::{MergeProgress, MergeReport};
pub use placement::{AutoPlaceMode, CatalogEntry, CatalogEntryKind};

/// Vom Bediener gewählte Reaktion auf einen inkonsistenten Katalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogRecovery {
    /// Lokalen Nummernkreis reparieren und alle Referenzen umschreiben
    Fix,
    /// Weiterarbeiten, aber Schreiben sperren
    DisableWrites,
    /// Befund ignorieren
    Ignore,
    /// Laden abbrechen
    Abort,
}

/// Übersicht über ungespeicherte Änderungen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnsavedInfo {
    pub tiles: Vec<TileCoord>,
    pub hidden_objects: u32,
}

impl UnsavedInfo {
    pub fn is_clean(&self) -> bool {
        self.tiles.is_empty()
    }
}

/// Eine geladene Route.
#[derive(Debug)]
pub struct Route {
    pub name: String,
    pub grid: WorldGrid,
    pub track_db: TrackNetwork,
    pub road_db: TrackNetwork,
    pub catalog: SectionCatalog,
    pub places: NamedPlaces,
    pub options: EditorOptions,
    loaded: bool,
    write_enabled: bool,
    /// (Tile, UID) der letzten Serien-Platzierung
    auto_place_last: Vec<(TileCoord, u32)>,
}

impl Route {
    /// Leere Route ohne Verzeichnis-Bezug (Neuanlage, Tests).
    pub fn new(name: impl Into<String>, catalog: SectionCatalog, options: EditorOptions) -> Self {
        Self {
            name: name.into(),
            grid: WorldGrid::new(),
            track_db: TrackNetwork::new(NetworkKind::Rail),
            road_db: TrackNetwork::new(NetworkKind::Road),
            catalog,
            places: NamedPlaces::default(),
            options,
            loaded: true,
            write_enabled: true,
            auto_place_last: Vec::new(),
        }
    }

    /// Validiert die Verzeichnis-Struktur und legt die Route an.
    ///
    /// Schlägt vor jeder Mutation fehl: fehlen `routes/<name>` oder
    /// `global`, kommt ein Fehler zurück und es existiert keine halb
    /// geladene Route.
    pub fn load(
        root: &Path,
        name: &str,
        catalog: SectionCatalog,
        options: EditorOptions,
    ) -> anyhow::Result<Self> {
        let route_dir = root.join("routes").join(name);
        if !route_dir.is_dir() {
            bail!("Routen-Verzeichnis fehlt: {}", route_dir.display());
        }
        let global_dir = root.join("global");
        if !global_dir.is_dir() {
            bail!("Global-Verzeichnis fehlt: {}", global_dir.display());
        }
        std::fs::read_dir(&route_dir)
            .with_context(|| format!("Routen-Verzeichnis nicht lesbar: {}", route_dir.display()))?;
        log::info!("Route '{}' geladen aus {}", name, route_dir.display());
        Ok(Self::new(name, catalog, options))
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn is_write_enabled(&self) -> bool {
        self.write_enabled
    }

    /// Wendet die Bediener-Entscheidung auf einen inkonsistenten Katalog an.
    ///
    /// Liefert `true`, wenn mit der Route weitergearbeitet werden darf.
    /// Bei konsistentem Katalog passiert nichts.
    pub fn resolve_catalog_sync(&mut self, recovery: CatalogRecovery) -> bool {
        if !self.catalog.is_out_of_sync() {
            return true;
        }
        match recovery {
            CatalogRecovery::Fix => {
                let remap = self.catalog.renumber_local();
                let mut rewritten = 0;
                self.grid.for_each_loaded_tile_mut(|tile| {
                    rewritten += tile.update_track_section_info(&remap);
                });
                log::info!("Katalog repariert, {rewritten} Objekte umgeschrieben");
                true
            }
            CatalogRecovery::DisableWrites => {
                self.write_enabled = false;
                log::warn!("Katalog inkonsistent, Schreiben gesperrt");
                true
            }
            CatalogRecovery::Ignore => {
                log::warn!("Katalog inkonsistent, Befund ignoriert");
                true
            }
            CatalogRecovery::Abort => {
                self.loaded = false;
                log::error!("Katalog inkonsistent, Laden abgebrochen");
                false
            }
        }
    }

    /// Konsistenz-Prüfung beider Track-Datenbanken; Summe aller Befunde.
    pub fn check_databases(&self) -> u32 {
        self.track_db.check_database(&self.catalog) + self.road_db.check_database(&self.catalog)
    }

    /// Löscht ein Objekt (Soft-Delete) samt Netzwerk-Abmeldung.
    ///
    /// Gruppen werden rekursiv aufgelöst; jedes versteckte Objekt wird
    /// vorher für Undo aufgezeichnet. Mit `leave_track_shape_after_delete`
    /// bleibt die Graph-Geometrie eines Segments stehen.
    pub fn delete_object(
        &mut self,
        tile: TileCoord,
        uid: u32,
        undo: &mut dyn UndoRecorder,
    ) -> bool {
        if !self.write_enabled {
            log::warn!("Löschen verweigert, Schreiben ist gesperrt");
            return false;
        }
        let Some(obj) = self.grid.object(tile, uid) else {
            return false;
        };
        let kind = obj.kind.clone();
        undo.state_begin();
        let deleted = self.delete_object_inner(tile, uid, &kind, undo);
        undo.state_end();
        if deleted {
            self.rebuild_places();
        }
        deleted
    }

    fn delete_object_inner(
        &mut self,
        tile: TileCoord,
        uid: u32,
        kind: &WorldObjectKind,
        undo: &mut dyn UndoRecorder,
    ) -> bool {
        if let WorldObjectKind::Group { members } = kind {
            let mut any = false;
            for &(m_tile, m_uid) in members {
                if let Some(member) = self.grid.object(m_tile, m_uid) {
                    let m_kind = member.kind.clone();
                    any |= self.delete_object_inner(m_tile, m_uid, &m_kind, undo);
                }
            }
            // Die Gruppe selbst verschwindet mit
            if let Some(obj) = self.grid.object(tile, uid) {
                undo.push_object_removed(obj);
            }
            if let Some(t) = self.grid.tile_mut(tile) {
                any |= t.hide_object(uid);
            }
            return any;
        }

        if kind.is_track_segment() && !self.options.leave_track_shape_after_delete {
            undo.push_track_network_snapshot(&self.track_db, false);
            undo.push_track_network_snapshot(&self.road_db, true);
            self.remove_track_from_networks(tile, uid);
        }
        let Some(obj) = self.grid.object(tile, uid) else {
            return false;
        };
        undo.push_object_removed(obj);
        self.grid
            .tile_mut(tile)
            .map(|t| t.hide_object(uid))
            .unwrap_or(false)
    }

    /// Meldet ein Segment aus beiden Netzwerken ab.
    ///
    /// `true`, wenn sich mindestens ein Graph geändert hat; das Objekt wird
    /// dann als "nicht im Netzwerk" markiert.
    pub fn remove_track_from_networks(&mut self, tile: TileCoord, uid: u32) -> bool {
        let changed = self.track_db.delete_tree(tile, uid) | self.road_db.delete_tree(tile, uid);
        if changed {
            if let Some(obj) = self.grid.object_mut(tile, uid) {
                obj.removed_from_network();
            }
        }
        changed
    }

    /// Baut das Stations-/Siding-Verzeichnis aus beiden Netzwerken neu auf.
    pub fn rebuild_places(&mut self) {
        let mut places = self.track_db.named_places();
        let road_places = self.road_db.named_places();
        for (name, refs) in road_places.stations {
            places.stations.entry(name).or_default().extend(refs);
        }
        for (name, refs) in road_places.sidings {
            places.sidings.entry(name).or_default().extend(refs);
        }
        self.places = places;
    }

    /// Verknüpft die Items eines Signal-Objekts mit der nächsten
    /// Schienen-Position.
    pub fn link_signal(&mut self, tile: TileCoord, uid: u32) -> bool {
        let Some(obj) = self.grid.object(tile, uid) else {
            return false;
        };
        let WorldObjectKind::Interactive { item_ids, road: false } = &obj.kind else {
            return false;
        };
        let item_ids = item_ids.clone();
        let position = obj.position;
        let Some(hit) = self.track_db.find_nearest_position(tile, position) else {
            log::warn!("Signal {tile}/{uid}: keine Schienen-Position in Reichweite");
            return false;
        };
        let mut linked = false;
        for item_id in item_ids {
            linked |= self
                .track_db
                .relink_item(item_id, hit.node_id, hit.distance_along);
        }
        if linked {
            if let Some(obj) = self.grid.object_mut(tile, uid) {
                obj.set_modified();
            }
        }
        linked
    }

    /// Ungespeicherte Tiles und versteckte Objekte.
    pub fn unsaved_info(&self) -> UnsavedInfo {
        let mut hidden = 0;
        self.grid
            .for_each_loaded_tile(|t| hidden += t.hidden_object_count());
        UnsavedInfo {
            tiles: self.grid.unsaved_tiles(),
            hidden_objects: hidden,
        }
    }

    /// Setzt alle Modified-Flags zurück (nach erfolgreichem Speichern).
    pub fn mark_all_saved(&mut self) {
        self.grid.for_each_loaded_tile_mut(|t| t.mark_saved());
    }
}
