//! Platzierungs-Engine: Klassifikation, Snapping, Drag, Serien-Platzierung.

use glam::{Quat, Vec3};

use crate::collab::terrain::TerrainProvider;
use crate::collab::undo::UndoRecorder;
use crate::core::catalog::NetworkConstraint;
use crate::core::coords::{self, TileCoord};
use crate::core::track_item::TrackItemKind;
use crate::core::track_network::{tangent_to_rotation, NetworkPosition, TrackPlacement};
use crate::core::world_object::{WorldObject, WorldObjectKind};
use crate::route::Route;

/// Platzierbarer Katalog-Eintrag (Bibliotheks-Auswahl des Hosts).
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub name: String,
    pub kind: CatalogEntryKind,
}

/// Klassifikation eines Katalog-Eintrags.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogEntryKind {
    /// Frei platzierbares Objekt
    Static,
    /// Gleis-/Straßen-Segment aus einem Katalog-Shape
    Track { shape_id: u32 },
    /// Dynamisches Segment aus einzelnen Sections
    DynTrack { section_ids: Vec<u32> },
    /// Interaktives Objekt mit Netzwerk-Bindung
    Interactive {
        item: TrackItemKind,
        constraint: NetworkConstraint,
    },
    /// Mess-Lineal
    Ruler,
}

/// Richtung einer Serien-Platzierung relativ zur Treffer-Distanz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoPlaceMode {
    /// Gesamten Knoten belegen
    Full,
    /// Von der Treffer-Distanz zum Knoten-Ende
    Forward,
    /// Von der Treffer-Distanz zum Knoten-Anfang
    Backward,
}

impl Route {
    /// Platziert einen Katalog-Eintrag in der Welt.
    ///
    /// Segmente durchlaufen `find_position` und können dabei die maßgebliche
    /// Tile-Koordinate wechseln; das Ziel-Tile wird danach neu aufgelöst.
    /// Interaktive Einträge verlangen eine Netzwerk-Position innerhalb des
    /// Snap-Radius. Jede erfolgreiche Platzierung wird für Undo
    /// aufgezeichnet; `elevation_rad` dreht das Objekt nach dem Einfügen um
    /// seine lokale X-Achse.
    pub fn place_object(
        &mut self,
        tile: TileCoord,
        pos: Vec3,
        rotation: Quat,
        entry: &CatalogEntry,
        elevation_rad: Option<f32>,
        terrain: &dyn TerrainProvider,
        undo: &mut dyn UndoRecorder,
    ) -> Option<(TileCoord, u32)> {
        if !self.is_write_enabled() {
            log::warn!("Platzierung verweigert, Schreiben ist gesperrt");
            return None;
        }
        if !pos.is_finite() {
            log::warn!("Platzierung verweigert, Position ist nicht endlich");
            return None;
        }
        let (tile, pos) = coords::normalize(tile, pos);

        let placed = match &entry.kind {
            CatalogEntryKind::Static => {
                self.place_free(tile, pos, rotation, WorldObjectKind::Static, terrain)
            }
            CatalogEntryKind::Ruler => {
                self.place_free(tile, pos, rotation, WorldObjectKind::Ruler, terrain)
            }
            CatalogEntryKind::Track { shape_id } => {
                self.place_segment(tile, pos, rotation, *shape_id, None, terrain, undo)
            }
            CatalogEntryKind::DynTrack { section_ids } => {
                self.place_segment(tile, pos, rotation, 0, Some(section_ids.clone()), terrain, undo)
            }
            CatalogEntryKind::Interactive { item, constraint } => {
                self.place_interactive(tile, pos, rotation, item, *constraint, terrain)
            }
        }?;

        undo.push_object_placed(placed.0, placed.1);
        if let Some(angle) = elevation_rad {
            if let Some(obj) = self.grid.object_mut(placed.0, placed.1) {
                obj.rotate_elevation(angle);
            }
        }
        Some(placed)
    }

    /// Freie Platzierung, optional an das Ziel-Netzwerk angelehnt.
    fn place_free(
        &mut self,
        tile: TileCoord,
        pos: Vec3,
        rotation: Quat,
        kind: WorldObjectKind,
        terrain: &dyn TerrainProvider,
    ) -> Option<(TileCoord, u32)> {
        let mut tile = tile;
        let mut pos = pos;
        let mut rotation = rotation;
        if self.options.stick_to_target {
            if let Some(hit) = self.constrained_hit(self.options.placement_target, tile, pos) {
                if hit.distance <= self.options.snap_radius {
                    rotation = tangent_to_rotation(hit.tangent);
                    if !self.options.snap_rotation_only {
                        let (snap_tile, snap_pos) = coords::split_world_pos(hit.world);
                        tile = snap_tile;
                        pos = snap_pos;
                    }
                }
            }
        }
        self.grid
            .place_object(tile, WorldObject::new(pos, rotation, kind), terrain)
    }

    /// Segment-Platzierung mit Netzwerk-Registrierung.
    fn place_segment(
        &mut self,
        tile: TileCoord,
        pos: Vec3,
        rotation: Quat,
        shape_id: u32,
        section_ids: Option<Vec<u32>>,
        terrain: &dyn TerrainProvider,
        undo: &mut dyn UndoRecorder,
    ) -> Option<(TileCoord, u32)> {
        let road = shape_id != 0 && self.catalog.is_road_shape(shape_id);
        let db = if road { &self.road_db } else { &self.track_db };
        let placement = match &section_ids {
            Some(ids) => db.find_position_sections(&self.catalog, tile, pos, rotation, ids),
            None => db.find_position(&self.catalog, tile, pos, rotation, shape_id),
        };
        let Some(placement) = placement else {
            log::warn!("Segment-Platzierung ohne gültige Position verworfen");
            return None;
        };
        // Ziel-Tile nach möglichem Kanten-Wechsel neu auflösen
        if self.grid.request_tile(placement.tile, true, terrain).is_none() {
            log::warn!("Ziel-Tile {} nicht beschreibbar", placement.tile);
            return None;
        }

        let db = if road {
            &mut self.road_db
        } else {
            &mut self.track_db
        };
        undo.push_track_network_snapshot(db, road);

        let kind = match section_ids {
            Some(ids) => WorldObjectKind::DynTrack { section_ids: ids },
            None => WorldObjectKind::Track { shape_id },
        };
        let mut obj = WorldObject::new(placement.position, placement.rotation, kind);
        obj.end_offset = placement.end_offset;
        obj.in_network = true;
        let dest = placement.tile;
        let (dest, uid) = self.grid.place_object(dest, obj, terrain)?;
        db.attach_track(placement, dest, uid);
        Some((dest, uid))
    }

    /// Interaktive Platzierung: Item auf dem nächstliegenden Netzwerk.
    fn place_interactive(
        &mut self,
        tile: TileCoord,
        pos: Vec3,
        rotation: Quat,
        item: &TrackItemKind,
        constraint: NetworkConstraint,
        terrain: &dyn TerrainProvider,
    ) -> Option<(TileCoord, u32)> {
        if constraint == NetworkConstraint::Free {
            return self.place_free(
                tile,
                pos,
                rotation,
                WorldObjectKind::Interactive {
                    item_ids: Vec::new(),
                    road: false,
                },
                terrain,
            );
        }
        let hit = self.constrained_hit(constraint, tile, pos)?;
        if hit.distance > self.options.snap_radius {
            log::warn!(
                "Interaktive Platzierung verworfen: Netzwerk {:.1} m entfernt",
                hit.distance
            );
            return None;
        }
        let road = match constraint {
            NetworkConstraint::Road => true,
            NetworkConstraint::Rail => false,
            // Dual: das getroffene Netz entscheidet
            _ => self.dual_hit_is_road(tile, pos),
        };
        let (mut dest, mut dest_pos) = coords::split_world_pos(hit.world);
        let mut rotation = rotation;
        if self.options.snap_rotation_only {
            dest = tile;
            dest_pos = pos;
        } else {
            rotation = tangent_to_rotation(hit.tangent);
        }
        let db = if road {
            &mut self.road_db
        } else {
            &mut self.track_db
        };
        let item_id = db.insert_item(hit.node_id, hit.distance_along, item.clone())?;
        self.grid.place_object(
            dest,
            WorldObject::new(
                dest_pos,
                rotation,
                WorldObjectKind::Interactive {
                    item_ids: vec![item_id],
                    road,
                },
            ),
            terrain,
        )
    }

    /// Nächste Netzwerk-Position gemäß Bindung; bei `Dual` gewinnt die
    /// Straße nur bei echt kleinerem Abstand.
    fn constrained_hit(
        &self,
        constraint: NetworkConstraint,
        tile: TileCoord,
        pos: Vec3,
    ) -> Option<NetworkPosition> {
        match constraint {
            NetworkConstraint::Free => None,
            NetworkConstraint::Rail => self.track_db.find_nearest_position(tile, pos),
            NetworkConstraint::Road => self.road_db.find_nearest_position(tile, pos),
            NetworkConstraint::Dual => {
                let rail = self.track_db.find_nearest_position(tile, pos);
                let road = self.road_db.find_nearest_position(tile, pos);
                match (rail, road) {
                    (Some(r), Some(o)) if o.distance < r.distance => Some(o),
                    (Some(r), _) => Some(r),
                    (None, o) => o,
                }
            }
        }
    }

    fn dual_hit_is_road(&self, tile: TileCoord, pos: Vec3) -> bool {
        let rail = self.track_db.find_nearest_position(tile, pos);
        let road = self.road_db.find_nearest_position(tile, pos);
        matches!((rail, road), (Some(r), Some(o)) if o.distance < r.distance)
            || matches!((rail, road), (None, Some(_)))
    }

    /// Verschiebt ein Objekt.
    ///
    /// Netzwerk-registrierte Segmente behalten ihre Pose (Antwort ist die
    /// unveränderte Adresse); nicht registrierte Segmente werden über
    /// `find_position` neu verortet; statische Objekte ziehen bei
    /// Kanten-Überschreitung in ihr neues Heimat-Tile um.
    pub fn drag_object(
        &mut self,
        tile: TileCoord,
        uid: u32,
        new_pos: Vec3,
        terrain: &dyn TerrainProvider,
    ) -> Option<(TileCoord, u32)> {
        if !new_pos.is_finite() {
            return None;
        }
        let obj = self.grid.object(tile, uid)?;
        let kind = obj.kind.clone();
        match kind {
            WorldObjectKind::Track { .. } | WorldObjectKind::DynTrack { .. } if obj.in_network => {
                log::debug!("Segment {tile}/{uid} ist registriert, Drag ignoriert");
                Some((tile, uid))
            }
            WorldObjectKind::Track { .. } | WorldObjectKind::DynTrack { .. } => {
                let rotation = obj.rotation;
                let placement = self.segment_placement(&kind, tile, new_pos, rotation)?;
                let obj = self.grid.object_mut(tile, uid)?;
                obj.set_position(placement.position);
                obj.rotation = placement.rotation;
                obj.end_offset = placement.end_offset;
                let addr = self.grid.move_object_across_tiles(tile, uid, terrain)?;
                let local = self.grid.object(addr.0, addr.1)?.position;
                let placement = self.segment_placement(&kind, addr.0, local, rotation)?;
                self.track_db.attach_track(placement, addr.0, addr.1);
                if let Some(obj) = self.grid.object_mut(addr.0, addr.1) {
                    obj.in_network = true;
                }
                Some(addr)
            }
            WorldObjectKind::Group { .. }
            | WorldObjectKind::Ruler
            | WorldObjectKind::Interactive { .. } => {
                // Adresse bleibt stabil, sonst brechen Member-/Item-Verweise
                let (same_tile, local) = coords::normalize(tile, new_pos);
                if same_tile != tile {
                    log::debug!("Drag über Tile-Grenze für {tile}/{uid} verworfen");
                    return Some((tile, uid));
                }
                self.grid.object_mut(tile, uid)?.set_position(local);
                Some((tile, uid))
            }
            _ => {
                self.grid.object_mut(tile, uid)?.set_position(new_pos);
                self.grid.move_object_across_tiles(tile, uid, terrain)
            }
        }
    }

    /// Neuverortung eines nicht registrierten Segments beim Drag:
    /// Shape-Segmente über den Katalog, dynamische über ihre Section-Liste.
    fn segment_placement(
        &self,
        kind: &WorldObjectKind,
        tile: TileCoord,
        pos: Vec3,
        rotation: Quat,
    ) -> Option<TrackPlacement> {
        match kind {
            WorldObjectKind::Track { shape_id } => {
                self.track_db
                    .find_position(&self.catalog, tile, pos, rotation, *shape_id)
            }
            WorldObjectKind::DynTrack { section_ids } => self.track_db.find_position_sections(
                &self.catalog,
                tile,
                pos,
                rotation,
                section_ids,
            ),
            _ => None,
        }
    }

    /// Platziert eine Objekt-Serie entlang des getroffenen Vector-Knotens.
    ///
    /// Schrittweite und Offsets kommen aus den Optionen; die Serie endet am
    /// Knoten-Ende. Alle Platzierungen bilden einen Undo-Schritt, und die
    /// Serie wird für `auto_placement_delete_last` gemerkt.
    pub fn auto_place_series(
        &mut self,
        entry: &CatalogEntry,
        tile: TileCoord,
        pos: Vec3,
        mode: AutoPlaceMode,
        terrain: &dyn TerrainProvider,
        undo: &mut dyn UndoRecorder,
    ) -> usize {
        if !self.is_write_enabled() {
            return 0;
        }
        let kind = match &entry.kind {
            CatalogEntryKind::Static => WorldObjectKind::Static,
            CatalogEntryKind::Ruler => WorldObjectKind::Ruler,
            _ => {
                log::warn!("Serien-Platzierung nur für freie Objekte");
                return 0;
            }
        };
        let db = match self.options.placement_target {
            NetworkConstraint::Road => &self.road_db,
            _ => &self.track_db,
        };
        let Some(hit) = db.find_nearest_position(tile, pos) else {
            log::warn!("Serien-Platzierung ohne Netzwerk-Treffer");
            return 0;
        };
        let length = db.node_length(hit.node_id);
        let step = self.options.auto_place_step.max(0.1);
        let mut distances = Vec::new();
        match mode {
            AutoPlaceMode::Full => {
                let mut d = 0.0;
                while d < length {
                    distances.push(d);
                    d += step;
                }
            }
            AutoPlaceMode::Forward => {
                let mut d = hit.distance_along;
                while d < length {
                    distances.push(d);
                    d += step;
                }
            }
            AutoPlaceMode::Backward => {
                let mut d = hit.distance_along;
                while d > 0.0 {
                    distances.push(d);
                    d -= step;
                }
            }
        }

        let node_id = hit.node_id;
        let two_point = self.options.auto_place_two_point_rot;
        let trans_off = Vec3::from(self.options.auto_place_translation_offset);
        let [yaw_off_deg, pitch_off_deg] = self.options.auto_place_rotation_offset_deg;

        self.auto_place_last.clear();
        undo.state_begin();
        let mut placed = 0;
        for d in distances {
            let Some(draw) = (match self.options.placement_target {
                NetworkConstraint::Road => self.road_db.draw_position(node_id, d),
                _ => self.track_db.draw_position(node_id, d),
            }) else {
                continue;
            };
            let (yaw, pitch) = if two_point {
                let ahead = match self.options.placement_target {
                    NetworkConstraint::Road => self.road_db.draw_position(node_id, d + 1.0),
                    _ => self.track_db.draw_position(node_id, d + 1.0),
                };
                match ahead {
                    Some(next) => {
                        let dir = next.world - draw.world;
                        let len = dir.length().max(f32::EPSILON);
                        (
                            dir.x.atan2(dir.z),
                            -(dir.y / len).clamp(-1.0, 1.0).asin(),
                        )
                    }
                    None => (draw.yaw, -draw.grade),
                }
            } else {
                (draw.yaw, -draw.grade)
            };
            let rotation = Quat::from_rotation_y(yaw + yaw_off_deg.to_radians())
                * Quat::from_rotation_x(pitch + pitch_off_deg.to_radians());
            let world = draw.world + rotation * trans_off;
            let (obj_tile, obj_pos) = coords::split_world_pos(world);
            if let Some(addr) = self.grid.place_object(
                obj_tile,
                WorldObject::new(obj_pos, rotation, kind.clone()),
                terrain,
            ) {
                undo.push_object_placed(addr.0, addr.1);
                self.auto_place_last.push(addr);
                placed += 1;
            }
        }
        undo.state_end();
        log::info!("Serien-Platzierung: {placed} Objekte auf Knoten {node_id}");
        placed
    }

    /// Versteckt genau die Objekte der letzten Serien-Platzierung.
    pub fn auto_placement_delete_last(&mut self, undo: &mut dyn UndoRecorder) -> usize {
        let batch = std::mem::take(&mut self.auto_place_last);
        if batch.is_empty() {
            return 0;
        }
        undo.state_begin();
        let mut removed = 0;
        for (tile, uid) in batch {
            if let Some(obj) = self.grid.object(tile, uid) {
                undo.push_object_removed(obj);
            }
            if self
                .grid
                .tile_mut(tile)
                .map(|t| t.hide_object(uid))
                .unwrap_or(false)
            {
                removed += 1;
            }
        }
        undo.state_end();
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::terrain::MemoryTerrain;
    use crate::collab::undo::NoUndo;
    use crate::core::catalog::{SectionCatalog, SectionDef, SectionGeometry, ShapeDef};
    use crate::core::track_network::{TrackNode, TrackNodeKind, VectorSection};
    use crate::shared::options::EditorOptions;
    use approx::assert_abs_diff_eq;

    fn catalog() -> SectionCatalog {
        SectionCatalog::with_globals(
            [(
                1,
                SectionDef {
                    geometry: SectionGeometry::Straight { length: 10.0 },
                    road: false,
                },
            )],
            [(
                100,
                ShapeDef {
                    section_ids: vec![1],
                    road: false,
                },
            )],
        )
    }

    fn route_with_rail(from: Vec3, to: Vec3) -> Route {
        let mut route = Route::new("test", catalog(), EditorOptions::default());
        let length = from.distance(to);
        route.track_db.add_node(TrackNode {
            id: 1,
            kind: TrackNodeKind::Vector {
                sections: vec![VectorSection {
                    section_id: 1,
                    shape_id: 100,
                    owner_tile: TileCoord::new(0, 0),
                    owner_uid: 99,
                    points: vec![from, to],
                    length,
                }],
                item_ids: Vec::new(),
            },
            pins: Vec::new(),
        });
        route
    }

    fn static_entry() -> CatalogEntry {
        CatalogEntry {
            name: "Baum".into(),
            kind: CatalogEntryKind::Static,
        }
    }

    #[test]
    fn place_static_normalizes_across_edge() {
        let mut route = Route::new("test", catalog(), EditorOptions::default());
        let terrain = MemoryTerrain::with_tiles([TileCoord::new(1, 0)]);
        let (tile, uid) = route
            .place_object(
                TileCoord::new(0, 0),
                Vec3::new(1040.0, 0.0, 0.0),
                Quat::IDENTITY,
                &static_entry(),
                None,
                &terrain,
                &mut NoUndo,
            )
            .expect("platziert");
        assert_eq!(tile, TileCoord::new(1, 0));
        let obj = route.grid.object(tile, uid).expect("Objekt");
        assert_abs_diff_eq!(obj.position.x, -1008.0);
    }

    #[test]
    fn place_rejects_non_finite_position() {
        let mut route = Route::new("test", catalog(), EditorOptions::default());
        let terrain = MemoryTerrain::with_tiles([TileCoord::new(0, 0)]);
        assert!(route
            .place_object(
                TileCoord::new(0, 0),
                Vec3::new(f32::NAN, 0.0, 0.0),
                Quat::IDENTITY,
                &static_entry(),
                None,
                &terrain,
                &mut NoUndo,
            )
            .is_none());
    }

    #[test]
    fn place_track_segment_registers_in_network() {
        let mut route = Route::new("test", catalog(), EditorOptions::default());
        let terrain = MemoryTerrain::with_tiles([TileCoord::new(0, 0)]);
        let entry = CatalogEntry {
            name: "Gleis 10m".into(),
            kind: CatalogEntryKind::Track { shape_id: 100 },
        };
        let (tile, uid) = route
            .place_object(
                TileCoord::new(0, 0),
                Vec3::new(5.0, 0.0, 5.0),
                Quat::IDENTITY,
                &entry,
                None,
                &terrain,
                &mut NoUndo,
            )
            .expect("platziert");
        assert!(route.track_db.has_track(tile, uid));
        let obj = route.grid.object(tile, uid).expect("Objekt");
        assert!(obj.in_network);
        assert_abs_diff_eq!(obj.end_offset.z, 10.0, epsilon = 1e-3);
    }

    #[test]
    fn place_track_fails_on_unwritable_tile() {
        let mut route = Route::new("test", catalog(), EditorOptions::default());
        let terrain = MemoryTerrain::new();
        let entry = CatalogEntry {
            name: "Gleis 10m".into(),
            kind: CatalogEntryKind::Track { shape_id: 100 },
        };
        assert!(route
            .place_object(
                TileCoord::new(0, 0),
                Vec3::ZERO,
                Quat::IDENTITY,
                &entry,
                None,
                &terrain,
                &mut NoUndo,
            )
            .is_none());
    }

    #[test]
    fn interactive_requires_network_within_snap_radius() {
        let mut route = route_with_rail(Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 100.0));
        let terrain = MemoryTerrain::with_tiles([TileCoord::new(0, 0)]);
        let entry = CatalogEntry {
            name: "Signal".into(),
            kind: CatalogEntryKind::Interactive {
                item: TrackItemKind::Signal {
                    signal_type: "Hp".into(),
                    flags: 0,
                    direction: true,
                },
                constraint: NetworkConstraint::Rail,
            },
        };
        // Innerhalb des Snap-Radius: Item entsteht auf dem Knoten
        let (tile, uid) = route
            .place_object(
                TileCoord::new(0, 0),
                Vec3::new(5.0, 0.0, 40.0),
                Quat::IDENTITY,
                &entry,
                None,
                &terrain,
                &mut NoUndo,
            )
            .expect("platziert");
        assert_eq!(route.track_db.item_count(), 1);
        let obj = route.grid.object(tile, uid).expect("Objekt");
        assert_abs_diff_eq!(obj.position.x, 0.0, epsilon = 1e-3);

        // Weit weg: verworfen, kein Item
        assert!(route
            .place_object(
                TileCoord::new(0, 0),
                Vec3::new(500.0, 0.0, 40.0),
                Quat::IDENTITY,
                &entry,
                None,
                &terrain,
                &mut NoUndo,
            )
            .is_none());
        assert_eq!(route.track_db.item_count(), 1);
    }

    #[test]
    fn drag_keeps_registered_segment_pose() {
        let mut route = Route::new("test", catalog(), EditorOptions::default());
        let terrain = MemoryTerrain::with_tiles([TileCoord::new(0, 0)]);
        let entry = CatalogEntry {
            name: "Gleis 10m".into(),
            kind: CatalogEntryKind::Track { shape_id: 100 },
        };
        let (tile, uid) = route
            .place_object(
                TileCoord::new(0, 0),
                Vec3::new(5.0, 0.0, 5.0),
                Quat::IDENTITY,
                &entry,
                None,
                &terrain,
                &mut NoUndo,
            )
            .expect("platziert");
        let before = route.grid.object(tile, uid).expect("Objekt").position;
        let addr = route
            .drag_object(tile, uid, Vec3::new(50.0, 0.0, 50.0), &terrain)
            .expect("Adresse");
        assert_eq!(addr, (tile, uid));
        assert_eq!(route.grid.object(tile, uid).expect("Objekt").position, before);
    }

    #[test]
    fn drag_unregistered_dyntrack_resnaps_into_network() {
        let mut route = Route::new("test", catalog(), EditorOptions::default());
        let terrain = MemoryTerrain::with_tiles([TileCoord::new(0, 0)]);
        let entry = CatalogEntry {
            name: "Gleisstück".into(),
            kind: CatalogEntryKind::DynTrack {
                section_ids: vec![1],
            },
        };
        let (tile, uid) = route
            .place_object(
                TileCoord::new(0, 0),
                Vec3::new(5.0, 0.0, 5.0),
                Quat::IDENTITY,
                &entry,
                None,
                &terrain,
                &mut NoUndo,
            )
            .expect("platziert");
        // Abmelden: das Segment ist danach nicht mehr registriert
        assert!(route.remove_track_from_networks(tile, uid));
        assert!(!route.grid.object(tile, uid).expect("Objekt").in_network);

        let (d_tile, d_uid) = route
            .drag_object(tile, uid, Vec3::new(50.0, 0.0, 50.0), &terrain)
            .expect("verschoben");
        assert!(route.track_db.has_track(d_tile, d_uid));
        let obj = route.grid.object(d_tile, d_uid).expect("Objekt");
        assert!(obj.in_network);
        assert_abs_diff_eq!(obj.position.x, 50.0, epsilon = 1e-3);
        assert_abs_diff_eq!(obj.end_offset.z, 10.0, epsilon = 1e-3);
    }

    #[test]
    fn drag_static_rehomes_across_edge() {
        let mut route = Route::new("test", catalog(), EditorOptions::default());
        let terrain = MemoryTerrain::with_tiles([TileCoord::new(0, 0), TileCoord::new(1, 0)]);
        let (tile, uid) = route
            .place_object(
                TileCoord::new(0, 0),
                Vec3::new(1000.0, 0.0, 0.0),
                Quat::IDENTITY,
                &static_entry(),
                None,
                &terrain,
                &mut NoUndo,
            )
            .expect("platziert");
        let (dest, new_uid) = route
            .drag_object(tile, uid, Vec3::new(1040.0, 0.0, 0.0), &terrain)
            .expect("umgezogen");
        assert_eq!(dest, TileCoord::new(1, 0));
        let obj = route.grid.object(dest, new_uid).expect("Objekt");
        assert_abs_diff_eq!(obj.position.x, -1008.0);
        // Anker um eine Tile-Kante nachgeführt
        assert_abs_diff_eq!(obj.first_position.x, 1000.0 - coords::TILE_SIZE);
    }

    #[test]
    fn auto_place_full_fills_node_and_batch_delete_undoes_it() {
        let mut route = route_with_rail(Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 100.0));
        let terrain = MemoryTerrain::with_tiles([TileCoord::new(0, 0)]);
        let placed = route.auto_place_series(
            &static_entry(),
            TileCoord::new(0, 0),
            Vec3::new(2.0, 0.0, 50.0),
            AutoPlaceMode::Full,
            &terrain,
            &mut NoUndo,
        );
        // Knoten-Länge 100, Schritt 10: Distanzen 0..90
        assert_eq!(placed, 10);
        let tile = route.grid.tile(TileCoord::new(0, 0)).expect("Tile");
        assert_eq!(tile.object_count(), 10);

        let removed = route.auto_placement_delete_last(&mut NoUndo);
        assert_eq!(removed, 10);
        let tile = route.grid.tile(TileCoord::new(0, 0)).expect("Tile");
        assert_eq!(tile.object_count(), 0);
        // Zweiter Aufruf: nichts mehr zu löschen
        assert_eq!(route.auto_placement_delete_last(&mut NoUndo), 0);
    }

    #[test]
    fn auto_place_forward_starts_at_hit_distance() {
        let mut route = route_with_rail(Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 100.0));
        let terrain = MemoryTerrain::with_tiles([TileCoord::new(0, 0)]);
        let placed = route.auto_place_series(
            &static_entry(),
            TileCoord::new(0, 0),
            Vec3::new(2.0, 0.0, 75.0),
            AutoPlaceMode::Forward,
            &terrain,
            &mut NoUndo,
        );
        // 75, 85, 95
        assert_eq!(placed, 3);
    }

    #[test]
    fn stick_to_target_snaps_static_placement() {
        let mut route = route_with_rail(Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 100.0));
        route.options.stick_to_target = true;
        route.options.placement_target = NetworkConstraint::Rail;
        let terrain = MemoryTerrain::with_tiles([TileCoord::new(0, 0)]);
        let (tile, uid) = route
            .place_object(
                TileCoord::new(0, 0),
                Vec3::new(4.0, 0.0, 30.0),
                Quat::IDENTITY,
                &static_entry(),
                None,
                &terrain,
                &mut NoUndo,
            )
            .expect("platziert");
        let obj = route.grid.object(tile, uid).expect("Objekt");
        assert_abs_diff_eq!(obj.position.x, 0.0, epsilon = 1e-3);
        assert_abs_diff_eq!(obj.position.z, 30.0, epsilon = 1e-3);
    }
}
