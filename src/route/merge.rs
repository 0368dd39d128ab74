//! Routen-Merge: zweite Route samt Graphen, Objekten und Terrain anhängen.

use std::collections::BTreeSet;

use glam::Vec3;

use crate::collab::terrain::TerrainProvider;
use crate::core::coords::{self, TileCoord};
use crate::core::track_network::UidUpdate;
use crate::route::Route;

/// Fortschritts-Checkpoint eines Merges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeProgress {
    pub current: u32,
    /// Steht vor dem ersten Checkpoint fest und ändert sich nicht mehr
    pub total: u32,
}

/// Zusammenfassung eines Routen-Merges.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeReport {
    pub merged_objects: u32,
    pub merged_track_nodes: u32,
    pub merged_road_nodes: u32,
    /// Objekte, deren Section-/Shape-Referenzen umgeschrieben wurden
    pub remapped_shape_refs: u32,
    pub touched_tiles: u32,
    /// Sections, deren Besitzer-Referenz nachgezogen wurde
    pub track_uid_updates: u32,
    /// Tiles, deren Terrain-Übernahme fehlschlug
    pub terrain_skipped: Vec<TileCoord>,
}

impl MergeReport {
    /// Merge abgeschlossen, aber mit ausgelassenen Terrain-Tiles.
    pub fn is_partial(&self) -> bool {
        !self.terrain_skipped.is_empty()
    }
}

impl Route {
    /// Hängt `secondary` um `offset` verschoben an diese Route an.
    ///
    /// Ablauf: Katalog-Übernahme, Graph-Merge beider Netzwerke,
    /// Objekt-Durchlauf mit Re-Homing und frischen UIDs, Besitzer-Fixup,
    /// Orts-Verzeichnis, Terrain-Übernahme. Graph- und Tile-Fixup bilden
    /// eine Phase ohne Checkpoint dazwischen; Terrain-Fehler werden
    /// geloggt, übersprungen und im Report ausgewiesen. Der
    /// Fortschritts-Zähler erreicht `total` genau einmal.
    pub fn merge_route(
        &mut self,
        mut secondary: Route,
        offset: Vec3,
        terrain: &mut dyn TerrainProvider,
        secondary_terrain: &dyn TerrainProvider,
        mut progress: impl FnMut(MergeProgress),
    ) -> MergeReport {
        let mut report = MergeReport {
            merged_track_nodes: secondary.track_db.node_count() as u32,
            merged_road_nodes: secondary.road_db.node_count() as u32,
            ..Default::default()
        };

        // Trockener Vorlauf: Objekt- und Ziel-Tile-Zahl für `total`
        let mut object_count = 0u32;
        let mut dry_touched: BTreeSet<TileCoord> = BTreeSet::new();
        secondary.grid.for_each_loaded_tile(|tile| {
            for obj in tile.objects() {
                object_count += 1;
                let world = translate(coords::world_pos(tile.coord, obj.position), offset);
                dry_touched.insert(coords::split_world_pos(world).0);
            }
        });
        let total = object_count + dry_touched.len() as u32;
        let mut current = 0u32;
        log::info!(
            "Merge '{}' → '{}': {} Objekte, {} Ziel-Tiles",
            secondary.name,
            self.name,
            object_count,
            dry_touched.len()
        );

        // Katalog zuerst: die Remap-Tabelle speist Graph- und Objekt-Fixups
        let remap = self.catalog.adopt_local_from(&secondary.catalog);
        let track_off = self.track_db.merge_from(&secondary.track_db, offset, &remap);
        let road_off = self.road_db.merge_from(&secondary.road_db, offset, &remap);

        // Objekt-Durchlauf: verschieben, neu verorten, frische UIDs vergeben
        let mut touched: BTreeSet<TileCoord> = BTreeSet::new();
        let mut uid_updates: Vec<UidUpdate> = Vec::new();
        for mut sec_tile in secondary.grid.take_all_tiles() {
            let old_tile = sec_tile.coord;
            for mut obj in sec_tile.take_objects() {
                let old_uid = obj.uid;
                let was_segment = obj.kind.is_track_segment();
                obj.add_item_id_offset(track_off.item_id_offset, road_off.item_id_offset);
                if obj.apply_remap(&remap) {
                    report.remapped_shape_refs += 1;
                }
                let world = translate(coords::world_pos(old_tile, obj.position), offset);
                let (dest, local) = coords::split_world_pos(world);
                obj.position = local;
                obj.first_position = local;
                obj.set_modified();
                let new_uid = self.grid.init_tile(dest).place_object(obj);
                touched.insert(dest);
                if was_segment {
                    uid_updates.push(UidUpdate {
                        old_tile,
                        old_uid,
                        new_tile: dest,
                        new_uid,
                    });
                }
                report.merged_objects += 1;
                current += 1;
                progress(MergeProgress { current, total });
            }
        }

        // Besitzer-Referenzen nur in den frisch gemergten Knoten nachziehen
        report.track_uid_updates = self
            .track_db
            .update_uids(&uid_updates, track_off.node_id_offset)
            + self
                .road_db
                .update_uids(&uid_updates, road_off.node_id_offset);
        report.touched_tiles = touched.len() as u32;
        self.rebuild_places();

        // Terrain-Übernahme pro Ziel-Tile; Fehler werden übersprungen
        for &tile in &touched {
            if !terrain.is_loaded(tile) && !(terrain.save_empty(tile) && terrain.reload(tile)) {
                log::warn!("Terrain-Tile {tile} nicht anlegbar, übersprungen");
                report.terrain_skipped.push(tile);
                current += 1;
                progress(MergeProgress { current, total });
                continue;
            }
            if !terrain.stitch_from(secondary_terrain, tile, offset) {
                log::warn!("Terrain für Tile {tile} nicht übernommen");
                report.terrain_skipped.push(tile);
            }
            current += 1;
            progress(MergeProgress { current, total });
        }
        // Leerer Merge: der Abschluss-Checkpoint kommt trotzdem genau einmal
        if total == 0 {
            progress(MergeProgress { current, total });
        }
        debug_assert_eq!(current, total);

        if report.is_partial() {
            log::warn!(
                "Merge unvollständig: {} Terrain-Tiles ausgelassen",
                report.terrain_skipped.len()
            );
        } else {
            log::info!(
                "Merge abgeschlossen: {} Objekte, {} Tiles",
                report.merged_objects,
                report.touched_tiles
            );
        }
        report
    }
}

/// Merge-Verschiebung: x und y addieren, z subtrahieren.
fn translate(world: Vec3, offset: Vec3) -> Vec3 {
    Vec3::new(world.x + offset.x, world.y + offset.y, world.z - offset.z)
}
