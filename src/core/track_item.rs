//! Interaktive Items auf dem Track-Netzwerk.

use serde::{Deserialize, Serialize};

/// Typisierte Nutzlast eines Items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TrackItemKind {
    Platform {
        platform_name: String,
        station_name: String,
        min_waiting_time_s: u32,
        passengers_waiting: u32,
    },
    Siding {
        name: String,
    },
    Signal {
        signal_type: String,
        flags: u32,
        /// `true` = in Knoten-Richtung
        direction: bool,
    },
    Speedpost {
        speed_kmh: f32,
        warning: bool,
    },
    Pickup {
        content: f32,
        kind_flags: u32,
    },
    Carspawner,
}

impl TrackItemKind {
    /// Name für das Orts-Verzeichnis; `true` = Station, `false` = Siding.
    pub fn place_name(&self) -> Option<(&str, bool)> {
        match self {
            Self::Platform { station_name, .. } => Some((station_name.as_str(), true)),
            Self::Siding { name } => Some((name.as_str(), false)),
            _ => None,
        }
    }
}

/// Ein Item an einer Distanz entlang seines Vector-Knotens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackItem {
    pub id: u32,
    /// Distanz vom Knoten-Anfang in Metern
    pub distance_along: f32,
    pub kind: TrackItemKind,
}

impl TrackItem {
    pub fn new(id: u32, distance_along: f32, kind: TrackItemKind) -> Self {
        Self {
            id,
            distance_along,
            kind,
        }
    }

    /// Verschiebt das Item entlang des Knotens.
    pub fn add_to_track_pos(&mut self, delta: f32) {
        self.distance_along += delta;
    }

    /// Spiegelt die Position beim Umdrehen des Knotens.
    pub fn flip_track_pos(&mut self, node_length: f32) {
        self.distance_along = (node_length - self.distance_along).max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn platform_reports_station_place() {
        let kind = TrackItemKind::Platform {
            platform_name: "Gleis 1".into(),
            station_name: "Hauptbahnhof".into(),
            min_waiting_time_s: 30,
            passengers_waiting: 0,
        };
        assert_eq!(kind.place_name(), Some(("Hauptbahnhof", true)));
    }

    #[test]
    fn siding_reports_siding_place_signal_none() {
        let siding = TrackItemKind::Siding {
            name: "Abstellgleis Ost".into(),
        };
        assert_eq!(siding.place_name(), Some(("Abstellgleis Ost", false)));
        let signal = TrackItemKind::Signal {
            signal_type: "Hp".into(),
            flags: 0,
            direction: true,
        };
        assert!(signal.place_name().is_none());
    }

    #[test]
    fn flip_mirrors_distance() {
        let mut item = TrackItem::new(1, 30.0, TrackItemKind::Carspawner);
        item.flip_track_pos(100.0);
        assert_abs_diff_eq!(item.distance_along, 70.0);
        item.add_to_track_pos(5.0);
        assert_abs_diff_eq!(item.distance_along, 75.0);
    }
}
