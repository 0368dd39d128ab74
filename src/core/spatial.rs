//! Spatial-Index (KD-Tree) über die Stützpunkte aller Vector-Sections.

use glam::Vec2;
use kiddo::{KdTree, SquaredEuclidean};

/// Adresse eines Stützpunkts: (Vector-Node, Section-Ordinal, Punkt-Ordinal).
pub type PointKey = (u32, u32, u32);

/// Ergebnis einer Distanzabfrage gegen den Section-Punkt-Index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionPointMatch {
    /// Id des Vector-Nodes
    pub node_id: u32,
    /// Ordinal der Section innerhalb des Nodes
    pub section_ord: u32,
    /// Ordinal des Stützpunkts innerhalb der Section
    pub point_ord: u32,
    /// Euklidische Distanz zum Suchpunkt (XZ-Ebene)
    pub distance: f32,
}

/// Read-only Spatial-Index über den Stützpunkten eines Track-Netzwerks.
#[derive(Debug, Clone)]
pub struct SectionPointIndex {
    tree: KdTree<f64, 2>,
    keys: Vec<PointKey>,
}

impl Default for SectionPointIndex {
    fn default() -> Self {
        Self::empty()
    }
}

impl SectionPointIndex {
    /// Erstellt einen leeren Index.
    pub fn empty() -> Self {
        Self {
            tree: (&Vec::<[f64; 2]>::new()).into(),
            keys: Vec::new(),
        }
    }

    /// Baut einen neuen Index aus (Schlüssel, Weltposition)-Paaren.
    ///
    /// Die Einträge müssen aufsteigend nach Schlüssel sortiert übergeben
    /// werden, damit Tie-Breaks deterministisch bleiben.
    pub fn from_points(entries: &[(PointKey, Vec2)]) -> Self {
        let positions: Vec<[f64; 2]> = entries
            .iter()
            .map(|(_, p)| [p.x as f64, p.y as f64])
            .collect();
        let tree: KdTree<f64, 2> = (&positions).into();
        Self {
            tree,
            keys: entries.iter().map(|(k, _)| *k).collect(),
        }
    }

    /// Anzahl indexierter Stützpunkte.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// `true`, wenn keine Punkte im Index liegen.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Findet den nächsten Stützpunkt zur Weltposition.
    pub fn nearest(&self, query: Vec2) -> Option<SectionPointMatch> {
        if self.is_empty() {
            return None;
        }
        let result = self
            .tree
            .nearest_one::<SquaredEuclidean>(&[query.x as f64, query.y as f64]);
        let key = *self.keys.get(result.item as usize)?;
        Some(SectionPointMatch {
            node_id: key.0,
            section_ord: key.1,
            point_ord: key.2,
            distance: (result.distance as f32).sqrt(),
        })
    }

    /// Findet alle Stützpunkte innerhalb eines Radius, sortiert nach
    /// (Distanz, Node-Id, Section, Punkt) — deterministische Reihenfolge.
    pub fn within_radius(&self, query: Vec2, radius: f32) -> Vec<SectionPointMatch> {
        if self.is_empty() || radius.is_sign_negative() {
            return Vec::new();
        }
        let mut results: Vec<SectionPointMatch> = self
            .tree
            .within::<SquaredEuclidean>(&[query.x as f64, query.y as f64], (radius * radius) as f64)
            .into_iter()
            .filter_map(|entry| {
                let key = *self.keys.get(entry.item as usize)?;
                Some(SectionPointMatch {
                    node_id: key.0,
                    section_ord: key.1,
                    point_ord: key.2,
                    distance: (entry.distance as f32).sqrt(),
                })
            })
            .collect();
        results.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then(a.node_id.cmp(&b.node_id))
                .then(a.section_ord.cmp(&b.section_ord))
                .then(a.point_ord.cmp(&b.point_ord))
        });
        results
    }
}
