//! Track-Netzwerk-Datenbank: Knoten, Vector-Sections, interaktive Items.
//!
//! Zwei unabhängige Instanzen pro Route (Schiene und Straße). Der Graph
//! besteht aus Knoten (Enden, Weichen, Vector-Knoten); Vector-Knoten tragen
//! die eigentlichen Sections mit Polyline-Stützpunkten in Weltkoordinaten.

use std::collections::BTreeMap;

use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::core::catalog::{SectionCatalog, SectionGeometry};
use crate::core::coords::{self, TileCoord};
use crate::core::remap::RemapTable;
use crate::core::spatial::SectionPointIndex;
use crate::core::track_item::{TrackItem, TrackItemKind};

/// Suchradius für Nearest-Position-Abfragen in Metern.
const NEAREST_SEARCH_RADIUS: f32 = 500.0;
/// Zwei Kandidaten innerhalb dieses Abstands gelten als gleich weit entfernt;
/// dann gewinnt die kleinere Node-Id (deterministischer Tie-Break).
const NEAREST_TIE_EPSILON: f32 = 1e-3;
/// Radius, in dem ein neues Segment an ein bestehendes Knoten-Ende andockt.
const ENDPOINT_SNAP_RADIUS: f32 = 2.0;

/// Schienen- oder Straßen-Netzwerk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkKind {
    Rail,
    Road,
}

/// Verweis auf einen Nachbar-Knoten; `forward` = Anschluss am Knoten-Ende.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackPin {
    pub node_id: u32,
    pub forward: bool,
}

/// Eine Vector-Section: Kante im Netzwerk mit Shape-Referenz und Polyline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorSection {
    /// Section-Id im Katalog
    pub section_id: u32,
    /// Shape-Id des erzeugenden Welt-Objekts
    pub shape_id: u32,
    /// Besitzendes Welt-Objekt: Tile + UID
    pub owner_tile: TileCoord,
    pub owner_uid: u32,
    /// Stützpunkte in Weltkoordinaten (mindestens Start und Ende)
    pub points: Vec<Vec3>,
    /// Bogenlänge der Section in Metern
    pub length: f32,
}

/// Knoten-Art.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TrackNodeKind {
    /// Strecken-Ende
    End,
    /// Weiche mit Shape-Referenz
    Junction { shape_id: u32 },
    /// Vector-Knoten: Kette von Sections zwischen zwei Nachbarn
    Vector {
        sections: Vec<VectorSection>,
        item_ids: Vec<u32>,
    },
}

/// Ein Knoten des Track-Netzwerks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackNode {
    pub id: u32,
    pub kind: TrackNodeKind,
    pub pins: Vec<TrackPin>,
}

impl TrackNode {
    /// Sections eines Vector-Knotens; leer für Enden und Weichen.
    pub fn sections(&self) -> &[VectorSection] {
        match &self.kind {
            TrackNodeKind::Vector { sections, .. } => sections,
            _ => &[],
        }
    }

    /// Gesamtlänge aller Sections des Knotens.
    pub fn length(&self) -> f32 {
        self.sections().iter().map(|s| s.length).sum()
    }
}

/// Projektion einer Anfrage auf die Gleisachse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetworkPosition {
    /// Vector-Knoten des Treffers
    pub node_id: u32,
    /// Ordinal der getroffenen Section im Knoten
    pub section_ord: u32,
    /// Distanz entlang des gesamten Knotens in Metern
    pub distance_along: f32,
    /// Senkrechter Abstand der Anfrage zur Achse (XZ-Ebene)
    pub distance: f32,
    /// Projizierter Punkt in Weltkoordinaten
    pub world: Vec3,
    /// Tangente der Achse am projizierten Punkt
    pub tangent: Vec3,
}

/// Abtast-Position entlang eines Vector-Knotens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawPosition {
    pub world: Vec3,
    pub tangent: Vec3,
    /// Gleis-Richtung um die Y-Achse, Radiant
    pub yaw: f32,
    /// Steigungswinkel, Radiant
    pub grade: f32,
}

/// Vorbereitete Segment-Registrierung aus `find_position`.
///
/// Enthält die endgültige (ggf. über eine Tile-Grenze verschobene) Pose;
/// der Aufrufer platziert damit zuerst das Welt-Objekt und ruft dann
/// `attach_track` mit der vergebenen UID auf.
#[derive(Debug, Clone)]
pub struct TrackPlacement {
    pub tile: TileCoord,
    pub position: Vec3,
    pub rotation: Quat,
    /// Versatz des Segment-Endpunkts relativ zum Startpunkt
    pub end_offset: Vec3,
    sections: Vec<VectorSection>,
    connect_to: Option<TrackPin>,
}

/// Korrespondenz (altes Tile, alte UID) → (neues Tile, neue UID) aus dem Merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UidUpdate {
    pub old_tile: TileCoord,
    pub old_uid: u32,
    pub new_tile: TileCoord,
    pub new_uid: u32,
}

/// Id-Offsets eines Graph-Merges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkMergeOffsets {
    pub node_id_offset: u32,
    pub item_id_offset: u32,
}

/// Verweis auf ein benanntes Platz-Item (Station/Siding).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaceRef {
    pub item_id: u32,
    pub node_id: u32,
    pub distance_along: f32,
}

/// Stations-/Siding-Verzeichnis, aus Plattform- und Siding-Items abgeleitet.
#[derive(Debug, Clone, Default)]
pub struct NamedPlaces {
    pub stations: BTreeMap<String, Vec<PlaceRef>>,
    pub sidings: BTreeMap<String, Vec<PlaceRef>>,
}

impl NamedPlaces {
    pub fn is_empty(&self) -> bool {
        self.stations.is_empty() && self.sidings.is_empty()
    }
}

/// Die Track-Datenbank eines Netzwerks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackNetwork {
    kind: NetworkKind,
    nodes: BTreeMap<u32, TrackNode>,
    items: BTreeMap<u32, TrackItem>,
    /// Wird nach Deserialisierung/Mutation neu aufgebaut
    #[serde(skip)]
    index: SectionPointIndex,
}

impl TrackNetwork {
    /// Erstellt ein leeres Netzwerk.
    pub fn new(kind: NetworkKind) -> Self {
        Self {
            kind,
            nodes: BTreeMap::new(),
            items: BTreeMap::new(),
            index: SectionPointIndex::empty(),
        }
    }

    pub fn kind(&self) -> NetworkKind {
        self.kind
    }

    pub fn node(&self, id: u32) -> Option<&TrackNode> {
        self.nodes.get(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &TrackNode> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn item(&self, id: u32) -> Option<&TrackItem> {
        self.items.get(&id)
    }

    pub fn item_mut(&mut self, id: u32) -> Option<&mut TrackItem> {
        self.items.get_mut(&id)
    }

    pub fn items(&self) -> impl Iterator<Item = &TrackItem> {
        self.items.values()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Höchste vergebene Knoten-Id; `None` für ein leeres Netzwerk.
    pub fn max_node_id(&self) -> Option<u32> {
        self.nodes.keys().next_back().copied()
    }

    /// Höchste vergebene Item-Id; `None` ohne Items.
    pub fn max_item_id(&self) -> Option<u32> {
        self.items.keys().next_back().copied()
    }

    /// Nächste freie Knoten-Id.
    pub fn next_node_id(&self) -> u32 {
        self.max_node_id().map(|m| m + 1).unwrap_or(1)
    }

    /// Fügt einen fertigen Knoten ein (Aufbau/Tests) und pflegt den Index.
    pub fn add_node(&mut self, node: TrackNode) {
        self.nodes.insert(node.id, node);
        self.rebuild_spatial_index();
    }

    /// Baut den Spatial-Index aus allen Section-Stützpunkten neu auf.
    pub fn rebuild_spatial_index(&mut self) {
        let mut entries = Vec::new();
        for (&id, node) in &self.nodes {
            for (s_ord, section) in node.sections().iter().enumerate() {
                for (p_ord, point) in section.points.iter().enumerate() {
                    entries.push((
                        (id, s_ord as u32, p_ord as u32),
                        Vec2::new(point.x, point.z),
                    ));
                }
            }
        }
        self.index = SectionPointIndex::from_points(&entries);
    }

    // ── Abfragen ────────────────────────────────────────────────────

    /// Findet die nächste zulässige Position auf dem Netzwerk.
    ///
    /// Kandidaten werden über den Spatial-Index eingesammelt und auf die
    /// Polyline-Segmente projiziert. Liegen zwei Treffer innerhalb von
    /// `NEAREST_TIE_EPSILON` gleich weit entfernt, gewinnt die kleinere
    /// Node-Id, dann das kleinere Section-Ordinal — reproduzierbare
    /// Auto-Platzierung verlangt einen deterministischen Tie-Break.
    /// `None`, wenn das Netzwerk leer ist oder kein Kandidat existiert.
    pub fn find_nearest_position(&self, tile: TileCoord, pos: Vec3) -> Option<NetworkPosition> {
        let query2 = coords::world_xz(tile, pos);
        let mut candidates = self.index.within_radius(query2, NEAREST_SEARCH_RADIUS);
        if candidates.is_empty() {
            candidates.extend(self.index.nearest(query2));
        }

        // Pro (Node, Section) nur einmal projizieren
        let mut seen: Vec<(u32, u32)> = Vec::new();
        let mut best: Option<NetworkPosition> = None;
        for cand in candidates {
            let key = (cand.node_id, cand.section_ord);
            if seen.contains(&key) {
                continue;
            }
            seen.push(key);
            let Some(node) = self.nodes.get(&cand.node_id) else {
                continue;
            };
            let Some(hit) = project_on_node(node, cand.section_ord, query2) else {
                continue;
            };
            best = Some(match best {
                None => hit,
                Some(cur) => {
                    let tie = (hit.distance - cur.distance).abs() <= NEAREST_TIE_EPSILON;
                    let better = if tie {
                        (hit.node_id, hit.section_ord) < (cur.node_id, cur.section_ord)
                    } else {
                        hit.distance < cur.distance
                    };
                    if better { hit } else { cur }
                }
            });
        }
        best
    }

    /// Projektion plus Pose: liefert zusätzlich Tile, lokale Position und
    /// an der Tangente ausgerichtete Orientierung des Treffers.
    pub fn snap_pose(
        &self,
        tile: TileCoord,
        pos: Vec3,
    ) -> Option<(NetworkPosition, TileCoord, Vec3, Quat)> {
        let hit = self.find_nearest_position(tile, pos)?;
        let (snap_tile, snap_pos) = coords::split_world_pos(hit.world);
        let rotation = tangent_to_rotation(hit.tangent);
        Some((hit, snap_tile, snap_pos, rotation))
    }

    /// Füllt `out` mit den Stützpunkten einer Section (Weltkoordinaten).
    pub fn section_points(&self, node_id: u32, section_ord: u32, out: &mut Vec<Vec3>) -> bool {
        out.clear();
        let Some(node) = self.nodes.get(&node_id) else {
            return false;
        };
        let Some(section) = node.sections().get(section_ord as usize) else {
            return false;
        };
        out.extend_from_slice(&section.points);
        true
    }

    /// Gesamtlänge eines Vector-Knotens in Metern.
    pub fn node_length(&self, node_id: u32) -> f32 {
        self.nodes.get(&node_id).map(|n| n.length()).unwrap_or(0.0)
    }

    /// Abtast-Position bei `distance` Metern entlang eines Vector-Knotens.
    ///
    /// Distanzen außerhalb [0, Länge] werden geklemmt; `None` nur für
    /// unbekannte Knoten oder Knoten ohne Sections.
    pub fn draw_position(&self, node_id: u32, distance: f32) -> Option<DrawPosition> {
        let node = self.nodes.get(&node_id)?;
        let mut remaining = distance.max(0.0);
        let sections = node.sections();
        if sections.is_empty() {
            return None;
        }
        for (i, section) in sections.iter().enumerate() {
            let last = i == sections.len() - 1;
            if remaining <= section.length || last {
                return sample_section(section, remaining.min(section.length));
            }
            remaining -= section.length;
        }
        None
    }

    /// Ist ein Segment des Welt-Objekts (Tile, UID) im Netzwerk registriert?
    pub fn has_track(&self, tile: TileCoord, uid: u32) -> bool {
        self.nodes.values().any(|n| {
            n.sections()
                .iter()
                .any(|s| s.owner_tile == tile && s.owner_uid == uid)
        })
    }

    // ── Segment-Registrierung ───────────────────────────────────────

    /// Berechnet die Registrierung eines Gleis-Segments ohne zu mutieren.
    ///
    /// Der Startpunkt dockt an ein bestehendes Knoten-Ende an, wenn eines
    /// innerhalb von `ENDPOINT_SNAP_RADIUS` liegt; dadurch kann sich die
    /// maßgebliche Tile-Koordinate verschieben. Der Aufrufer muss das
    /// Ziel-Tile nach diesem Schritt neu auflösen.
    pub fn find_position(
        &self,
        catalog: &SectionCatalog,
        tile: TileCoord,
        pos: Vec3,
        rotation: Quat,
        shape_id: u32,
    ) -> Option<TrackPlacement> {
        let shape = catalog.shape(shape_id)?;
        self.build_placement(catalog, tile, pos, rotation, shape_id, &shape.section_ids)
    }

    /// Wie `find_position`, aber für dynamische Segmente aus einzelnen
    /// Sections ohne Katalog-Shape (Shape-Id 0).
    pub fn find_position_sections(
        &self,
        catalog: &SectionCatalog,
        tile: TileCoord,
        pos: Vec3,
        rotation: Quat,
        section_ids: &[u32],
    ) -> Option<TrackPlacement> {
        self.build_placement(catalog, tile, pos, rotation, 0, section_ids)
    }

    fn build_placement(
        &self,
        catalog: &SectionCatalog,
        tile: TileCoord,
        pos: Vec3,
        rotation: Quat,
        shape_id: u32,
        section_ids: &[u32],
    ) -> Option<TrackPlacement> {
        let mut start = coords::world_pos(tile, pos);
        let mut connect_to = None;

        if let Some((pin, endpoint)) = self.nearest_free_endpoint(start) {
            if endpoint.distance(start) <= ENDPOINT_SNAP_RADIUS {
                start = endpoint;
                connect_to = Some(pin);
            }
        }

        let forward = rotation * Vec3::Z;
        let mut heading = forward.x.atan2(forward.z);
        let mut cursor = start;
        let mut sections = Vec::with_capacity(section_ids.len());
        for &sid in section_ids {
            let def = catalog.section(sid)?;
            let (points, end, new_heading) = sample_geometry(cursor, heading, &def.geometry);
            sections.push(VectorSection {
                section_id: sid,
                shape_id,
                owner_tile: TileCoord::new(0, 0),
                owner_uid: 0,
                points,
                length: def.geometry.length(),
            });
            cursor = end;
            heading = new_heading;
        }
        if sections.is_empty() {
            return None;
        }

        let (final_tile, final_pos) = coords::split_world_pos(start);
        Some(TrackPlacement {
            tile: final_tile,
            position: final_pos,
            rotation,
            end_offset: cursor - start,
            sections,
            connect_to,
        })
    }

    /// Registriert die vorbereitete Platzierung unter dem Besitzer (Tile, UID).
    ///
    /// Invariante: jedes Gleis-Segment-Objekt hat zu jedem Zeitpunkt genau
    /// eine Section-Zuordnung — eine bestehende Registrierung desselben
    /// Besitzers wird zuerst entfernt.
    pub fn attach_track(
        &mut self,
        mut placement: TrackPlacement,
        owner_tile: TileCoord,
        owner_uid: u32,
    ) -> u32 {
        self.remove_track(owner_tile, owner_uid);
        let id = self.next_node_id();
        for section in &mut placement.sections {
            section.owner_tile = owner_tile;
            section.owner_uid = owner_uid;
        }
        let mut pins = Vec::new();
        if let Some(pin) = placement.connect_to {
            pins.push(pin);
            if let Some(neighbor) = self.nodes.get_mut(&pin.node_id) {
                neighbor.pins.push(TrackPin {
                    node_id: id,
                    forward: false,
                });
            }
        }
        self.nodes.insert(
            id,
            TrackNode {
                id,
                kind: TrackNodeKind::Vector {
                    sections: placement.sections,
                    item_ids: Vec::new(),
                },
                pins,
            },
        );
        self.rebuild_spatial_index();
        id
    }

    /// Entfernt alle Vector-Knoten des Besitzers (Tile, UID) aus dem Graphen.
    ///
    /// Liefert `true`, wenn sich der Graph-Zustand geändert hat; Aufrufer
    /// entscheiden damit, ob das Objekt als "nicht im Netzwerk" markiert wird.
    pub fn remove_track(&mut self, tile: TileCoord, uid: u32) -> bool {
        let doomed: Vec<u32> = self
            .nodes
            .values()
            .filter(|n| {
                n.sections()
                    .iter()
                    .any(|s| s.owner_tile == tile && s.owner_uid == uid)
            })
            .map(|n| n.id)
            .collect();
        if doomed.is_empty() {
            return false;
        }
        for id in &doomed {
            if let Some(node) = self.nodes.remove(id) {
                if let TrackNodeKind::Vector { item_ids, .. } = node.kind {
                    for item_id in item_ids {
                        self.items.remove(&item_id);
                    }
                }
            }
        }
        for node in self.nodes.values_mut() {
            node.pins.retain(|p| !doomed.contains(&p.node_id));
        }
        self.rebuild_spatial_index();
        true
    }

    /// Wie `remove_track`, räumt zusätzlich verwaiste End-/Weichen-Knoten ab.
    pub fn delete_tree(&mut self, tile: TileCoord, uid: u32) -> bool {
        if !self.remove_track(tile, uid) {
            return false;
        }
        let orphans: Vec<u32> = self
            .nodes
            .values()
            .filter(|n| n.pins.is_empty() && !matches!(n.kind, TrackNodeKind::Vector { .. }))
            .map(|n| n.id)
            .collect();
        for id in orphans {
            self.nodes.remove(&id);
        }
        true
    }

    // ── Items ───────────────────────────────────────────────────────

    /// Legt ein Item bei `distance_along` auf einem Vector-Knoten an.
    pub fn insert_item(
        &mut self,
        node_id: u32,
        distance_along: f32,
        kind: TrackItemKind,
    ) -> Option<u32> {
        let id = self.max_item_id().map(|m| m + 1).unwrap_or(1);
        let node = self.nodes.get_mut(&node_id)?;
        let TrackNodeKind::Vector { item_ids, .. } = &mut node.kind else {
            return None;
        };
        item_ids.push(id);
        self.items
            .insert(id, TrackItem::new(id, distance_along, kind));
        Some(id)
    }

    /// Entfernt ein Item samt Knoten-Referenz.
    pub fn remove_item(&mut self, item_id: u32) -> bool {
        if self.items.remove(&item_id).is_none() {
            return false;
        }
        for node in self.nodes.values_mut() {
            if let TrackNodeKind::Vector { item_ids, .. } = &mut node.kind {
                item_ids.retain(|&id| id != item_id);
            }
        }
        true
    }

    /// Hängt ein Item an einen anderen Knoten/Position um (Signal-Linking).
    pub fn relink_item(&mut self, item_id: u32, node_id: u32, distance_along: f32) -> bool {
        if !self.items.contains_key(&item_id) || !self.nodes.contains_key(&node_id) {
            return false;
        }
        for node in self.nodes.values_mut() {
            if let TrackNodeKind::Vector { item_ids, .. } = &mut node.kind {
                item_ids.retain(|&id| id != item_id);
            }
        }
        if let Some(node) = self.nodes.get_mut(&node_id) {
            if let TrackNodeKind::Vector { item_ids, .. } = &mut node.kind {
                item_ids.push(item_id);
            }
        }
        if let Some(item) = self.items.get_mut(&item_id) {
            item.distance_along = distance_along;
        }
        true
    }

    // ── Merge ───────────────────────────────────────────────────────

    /// Hängt alle Knoten/Items von `other` an dieses Netzwerk an.
    ///
    /// Jede Id wird um (höchste eigene Id + 1) versetzt — Kollisionen sind
    /// damit konstruktiv ausgeschlossen. Section-/Shape-Referenzen laufen
    /// durch die Remap-Tabelle des Katalogs; die Geometrie wird um `offset`
    /// verschoben. Besitzer-Referenzen (Tile, UID) bleiben zunächst alt und
    /// werden nach dem Objekt-Durchlauf über `update_uids` nachgezogen.
    pub fn merge_from(
        &mut self,
        other: &TrackNetwork,
        offset: Vec3,
        remap: &RemapTable,
    ) -> NetworkMergeOffsets {
        let node_off = self.max_node_id().map(|m| m + 1).unwrap_or(0);
        let item_off = self.max_item_id().map(|m| m + 1).unwrap_or(0);

        for (&old_id, node) in &other.nodes {
            let mut node = node.clone();
            node.id = old_id + node_off;
            for pin in &mut node.pins {
                pin.node_id += node_off;
            }
            if let TrackNodeKind::Vector { sections, item_ids } = &mut node.kind {
                for section in sections {
                    section.section_id = remap.map_section(section.section_id);
                    section.shape_id = remap.map_shape(section.shape_id);
                    for p in &mut section.points {
                        // Vorzeichen-Konvention des Merges: x/y addieren,
                        // z subtrahieren (Links-Händigkeit der Z-Achse,
                        // wie in der Quell-Datenbank beobachtet)
                        p.x += offset.x;
                        p.y += offset.y;
                        p.z -= offset.z;
                    }
                }
                for id in item_ids {
                    *id += item_off;
                }
            }
            if let TrackNodeKind::Junction { shape_id } = &mut node.kind {
                *shape_id = remap.map_shape(*shape_id);
            }
            self.nodes.insert(node.id, node);
        }
        for (&old_id, item) in &other.items {
            let mut item = item.clone();
            item.id = old_id + item_off;
            self.items.insert(item.id, item);
        }
        self.rebuild_spatial_index();
        log::info!(
            "Netzwerk-Merge: {} Knoten, {} Items übernommen (Offsets {}/{})",
            other.node_count(),
            other.item_count(),
            node_off,
            item_off
        );
        NetworkMergeOffsets {
            node_id_offset: node_off,
            item_id_offset: item_off,
        }
    }

    /// Schreibt Besitzer-Referenzen gemäß Korrespondenz-Liste um.
    ///
    /// Nur Knoten ab `first_node_id` (die frisch gemergten) werden
    /// angefasst — Referenzen der Primär-Route auf zufällig gleiche
    /// (Tile, UID)-Paare bleiben unberührt. Liefert die Anzahl
    /// umgeschriebener Sections.
    pub fn update_uids(&mut self, updates: &[UidUpdate], first_node_id: u32) -> u32 {
        let mut rewritten = 0;
        for node in self.nodes.values_mut() {
            if node.id < first_node_id {
                continue;
            }
            if let TrackNodeKind::Vector { sections, .. } = &mut node.kind {
                for section in sections {
                    for u in updates {
                        if section.owner_tile == u.old_tile && section.owner_uid == u.old_uid {
                            section.owner_tile = u.new_tile;
                            section.owner_uid = u.new_uid;
                            rewritten += 1;
                            break;
                        }
                    }
                }
            }
        }
        rewritten
    }

    // ── Konsistenz & Verzeichnisse ──────────────────────────────────

    /// Konsistenz-Prüfung gegen Katalog und interne Referenzen.
    ///
    /// Loggt jedes Problem und liefert die Gesamtzahl; 0 = konsistent.
    pub fn check_database(&self, catalog: &SectionCatalog) -> u32 {
        let mut issues = 0;
        for node in self.nodes.values() {
            for pin in &node.pins {
                if !self.nodes.contains_key(&pin.node_id) {
                    log::warn!(
                        "Knoten {}: Pin auf unbekannten Knoten {}",
                        node.id,
                        pin.node_id
                    );
                    issues += 1;
                }
            }
            if let TrackNodeKind::Vector { sections, item_ids } = &node.kind {
                for section in sections {
                    if catalog.section(section.section_id).is_none() {
                        log::warn!(
                            "Knoten {}: Section-Id {} nicht im Katalog",
                            node.id,
                            section.section_id
                        );
                        issues += 1;
                    }
                }
                let len = node.length();
                for &item_id in item_ids {
                    match self.items.get(&item_id) {
                        None => {
                            log::warn!("Knoten {}: Item {} fehlt", node.id, item_id);
                            issues += 1;
                        }
                        Some(item) if item.distance_along > len + 0.5 => {
                            log::warn!(
                                "Knoten {}: Item {} außerhalb der Knoten-Länge",
                                node.id,
                                item_id
                            );
                            issues += 1;
                        }
                        _ => {}
                    }
                }
            }
        }
        issues
    }

    /// Baut das Stations-/Siding-Verzeichnis aus Plattform-/Siding-Items auf.
    pub fn named_places(&self) -> NamedPlaces {
        let mut places = NamedPlaces::default();
        for node in self.nodes.values() {
            if let TrackNodeKind::Vector { item_ids, .. } = &node.kind {
                for &item_id in item_ids {
                    let Some(item) = self.items.get(&item_id) else {
                        continue;
                    };
                    if let Some((name, is_station)) = item.kind.place_name() {
                        let place = PlaceRef {
                            item_id,
                            node_id: node.id,
                            distance_along: item.distance_along,
                        };
                        let bucket = if is_station {
                            &mut places.stations
                        } else {
                            &mut places.sidings
                        };
                        bucket.entry(name.to_string()).or_default().push(place);
                    }
                }
            }
        }
        places
    }

    /// Nächstes freies Knoten-Ende (erster/letzter Stützpunkt eines
    /// Vector-Knotens mit weniger als zwei Pins).
    fn nearest_free_endpoint(&self, world: Vec3) -> Option<(TrackPin, Vec3)> {
        let mut best: Option<(f32, TrackPin, Vec3)> = None;
        for node in self.nodes.values() {
            if node.pins.len() >= 2 {
                continue;
            }
            let sections = node.sections();
            let (Some(first), Some(last)) = (
                sections.first().and_then(|s| s.points.first()),
                sections.last().and_then(|s| s.points.last()),
            ) else {
                continue;
            };
            for (point, forward) in [(*first, false), (*last, true)] {
                let d = point.distance(world);
                let candidate = (
                    d,
                    TrackPin {
                        node_id: node.id,
                        forward,
                    },
                    point,
                );
                best = Some(match best {
                    None => candidate,
                    Some(cur) if d < cur.0 => candidate,
                    Some(cur) => cur,
                });
            }
        }
        best.map(|(_, pin, point)| (pin, point))
    }
}

// ── Geometrie-Helfer ────────────────────────────────────────────────

/// Projiziert die 2D-Anfrage auf die Polyline einer Section.
fn project_on_node(node: &TrackNode, section_ord: u32, query: Vec2) -> Option<NetworkPosition> {
    let sections = node.sections();
    let section = sections.get(section_ord as usize)?;
    let base: f32 = sections
        .iter()
        .take(section_ord as usize)
        .map(|s| s.length)
        .sum();

    let mut best: Option<(f32, f32, Vec3, Vec3)> = None;
    let mut walked = 0.0_f32;
    for pair in section.points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let a2 = Vec2::new(a.x, a.z);
        let b2 = Vec2::new(b.x, b.z);
        let seg = b2 - a2;
        let seg_len = seg.length();
        if seg_len <= f32::EPSILON {
            continue;
        }
        let t = ((query - a2).dot(seg) / (seg_len * seg_len)).clamp(0.0, 1.0);
        let proj2 = a2 + seg * t;
        let dist = proj2.distance(query);
        let along = walked + t * seg_len;
        let proj = a.lerp(b, t);
        let tangent = (b - a) / seg_len;
        if best.map(|(d, ..)| dist < d).unwrap_or(true) {
            best = Some((dist, along, proj, tangent));
        }
        walked += seg_len;
    }
    // Polyline-Länge auf die nominelle Section-Länge skalieren
    let (dist, along, proj, tangent) = best?;
    let poly_len = walked.max(f32::EPSILON);
    let along = along / poly_len * section.length;
    Some(NetworkPosition {
        node_id: node.id,
        section_ord,
        distance_along: base + along,
        distance: dist,
        world: proj,
        tangent,
    })
}

/// Tastet eine Section bei `distance` Metern ab (linear über die Polyline).
fn sample_section(section: &VectorSection, distance: f32) -> Option<DrawPosition> {
    let poly_len: f32 = section
        .points
        .windows(2)
        .map(|p| p[0].distance(p[1]))
        .sum();
    if poly_len <= f32::EPSILON {
        return None;
    }
    let target = distance / section.length.max(f32::EPSILON) * poly_len;
    let mut walked = 0.0_f32;
    for pair in section.points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let seg_len = a.distance(b);
        if seg_len <= f32::EPSILON {
            continue;
        }
        if walked + seg_len >= target || pair[1] == *section.points.last()? {
            let t = ((target - walked) / seg_len).clamp(0.0, 1.0);
            let world = a.lerp(b, t);
            let tangent = (b - a) / seg_len;
            let yaw = tangent.x.atan2(tangent.z);
            let grade = tangent.y.clamp(-1.0, 1.0).asin();
            return Some(DrawPosition {
                world,
                tangent,
                yaw,
                grade,
            });
        }
        walked += seg_len;
    }
    None
}

/// Baut aus einer Achsen-Tangente die Platzierungs-Rotation (Yaw + Pitch).
pub fn tangent_to_rotation(tangent: Vec3) -> Quat {
    let yaw = tangent.x.atan2(tangent.z);
    let horiz = Vec2::new(tangent.x, tangent.z).length();
    let pitch = -tangent.y.atan2(horiz.max(f32::EPSILON));
    Quat::from_rotation_y(yaw) * Quat::from_rotation_x(pitch)
}

/// Sampelt die Geometrie einer Katalog-Section ab `start` mit `heading`.
///
/// Liefert (Stützpunkte, Endpunkt, neues Heading). Bögen werden über den
/// Mittelpunkt der Sehne mit einem Zwischenpunkt angenähert; die exakte
/// Shape-Geometrie ist Sache des externen Geometrie-Kollaborateurs.
fn sample_geometry(start: Vec3, heading: f32, geometry: &SectionGeometry) -> (Vec<Vec3>, Vec3, f32) {
    match *geometry {
        SectionGeometry::Straight { length } => {
            let dir = Vec3::new(heading.sin(), 0.0, heading.cos());
            let end = start + dir * length;
            (vec![start, end], end, heading)
        }
        SectionGeometry::Curve { radius, angle_rad } => {
            let half = angle_rad * 0.5;
            let chord = 2.0 * radius * half.abs().sin();
            let mid_heading = heading + half;
            let dir = Vec3::new(mid_heading.sin(), 0.0, mid_heading.cos());
            let end = start + dir * chord;
            // Zwischenpunkt auf dem halben Bogen
            let quarter_heading = heading + half * 0.5;
            let half_chord = 2.0 * radius * (half.abs() * 0.5).sin();
            let mid = start
                + Vec3::new(quarter_heading.sin(), 0.0, quarter_heading.cos()) * half_chord;
            (vec![start, mid, end], end, heading + angle_rad)
        }
    }
}
