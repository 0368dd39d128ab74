//! Zentrale Konfiguration für den Strecken-Editor-Kern.
//!
//! `EditorOptions` enthält alle zur Laufzeit änderbaren Werte.
//! Die `const`-Werte bleiben als Fallback/Default erhalten.

use serde::{Deserialize, Serialize};

use crate::core::catalog::NetworkConstraint;

// ── Platzierung ─────────────────────────────────────────────────────

/// Snap-Radius (Meter): Platzierung innerhalb dieses Radius rastet auf dem Netzwerk ein.
pub const SNAP_RADIUS: f32 = 15.0;
/// Abstand aufeinanderfolgender Objekte bei Serien-Platzierung (Meter).
pub const AUTO_PLACE_STEP: f32 = 10.0;

// ── Undo ────────────────────────────────────────────────────────────

/// Maximale Schritt-Anzahl des eingebauten Undo-Rekorders.
pub const UNDO_DEPTH: usize = 100;

/// Alle zur Laufzeit änderbaren Editor-Optionen.
/// Wird als `rail_route_engine.toml` neben der Binary gespeichert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorOptions {
    // ── Snapping ────────────────────────────────────────────────
    /// Snap-Radius (Meter) für Netzwerk-Platzierung
    pub snap_radius: f32,
    /// Nur Rotation übernehmen, Position nicht verschieben
    #[serde(default)]
    pub snap_rotation_only: bool,
    /// Freie Objekte an der nächsten Netzwerk-Position ausrichten
    #[serde(default)]
    pub stick_to_target: bool,
    /// Ziel-Netzwerk für Stick-to-Target-Platzierung
    #[serde(default)]
    pub placement_target: NetworkConstraint,

    // ── Serien-Platzierung ──────────────────────────────────────
    /// Abstand aufeinanderfolgender Objekte (Meter)
    pub auto_place_step: f32,
    /// Tangente aus zwei Abtast-Punkten statt aus der gespeicherten Steigung
    #[serde(default)]
    pub auto_place_two_point_rot: bool,
    /// Zusätzlicher Versatz jedes Serien-Objekts (lokal x/y/z)
    #[serde(default)]
    pub auto_place_translation_offset: [f32; 3],
    /// Zusätzliche Drehung jedes Serien-Objekts (Grad, Yaw/Pitch)
    #[serde(default)]
    pub auto_place_rotation_offset_deg: [f32; 2],

    // ── Löschen ─────────────────────────────────────────────────
    /// Beim Löschen eines Segments die Shape-Geometrie im Graphen belassen
    #[serde(default)]
    pub leave_track_shape_after_delete: bool,

    // ── Undo ────────────────────────────────────────────────────
    /// Maximale Schritt-Anzahl des eingebauten Undo-Rekorders
    #[serde(default = "default_undo_depth")]
    pub undo_depth: usize,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            snap_radius: SNAP_RADIUS,
            snap_rotation_only: false,
            stick_to_target: false,
            placement_target: NetworkConstraint::Free,

            auto_place_step: AUTO_PLACE_STEP,
            auto_place_two_point_rot: false,
            auto_place_translation_offset: [0.0; 3],
            auto_place_rotation_offset_deg: [0.0; 2],

            leave_track_shape_after_delete: false,
            undo_depth: UNDO_DEPTH,
        }
    }
}

/// Serde-Default für `undo_depth` (Abwärtskompatibilität bestehender TOML-Dateien).
fn default_undo_depth() -> usize {
    UNDO_DEPTH
}

impl EditorOptions {
    /// Lädt Optionen aus einer TOML-Datei. Bei Fehler: Standardwerte.
    pub fn load_from_file(path: &std::path::Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(opts) => {
                    log::info!("Optionen geladen aus: {}", path.display());
                    opts
                }
                Err(e) => {
                    log::warn!("Optionen-Datei fehlerhaft, verwende Standardwerte: {}", e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Keine Optionen-Datei gefunden, verwende Standardwerte");
                Self::default()
            }
        }
    }

    /// Speichert Optionen als TOML-Datei.
    pub fn save_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        log::info!("Optionen gespeichert nach: {}", path.display());
        Ok(())
    }

    /// Ermittelt den Pfad zur Optionen-Datei neben der Binary.
    pub fn config_path() -> std::path::PathBuf {
        std::env::current_exe()
            .unwrap_or_else(|_| std::path::PathBuf::from("rail_route_engine"))
            .parent()
            .unwrap_or_else(|| std::path::Path::new("."))
            .join("rail_route_engine.toml")
    }
}
