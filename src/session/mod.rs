//! Sitzungs-Vokabular für kooperatives Editieren.
//!
//! Strukturierte Request-/Response-Blobs, über das `op`-Feld getaggt.
//! Rahmung und Transport sind Sache des Hosts; der Kern liefert nur die
//! Nachrichten-Typen und deren JSON-Kodierung.

use serde::{Deserialize, Serialize};

use crate::core::coords::TileCoord;
use crate::core::tile::Tile;
use crate::core::track_network::TrackNetwork;
use crate::core::world_object::WorldObject;

/// Anfrage eines Sitzungs-Teilnehmers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SessionRequest {
    /// Tile samt Objekten anfordern
    RequestTile { tile: TileCoord },
    /// Objekt-Zustand eines Teilnehmers übernehmen
    UpdateWorldobj {
        tile: TileCoord,
        uid: u32,
        object: Box<WorldObject>,
    },
    /// Schienen-Datenbank anfordern
    RequestTdb,
    /// Straßen-Datenbank anfordern
    RequestRdb,
    /// Section-Katalog-Stand anfordern
    RequestTsection,
    /// Knoten-Id-Block der Schienen-Datenbank reservieren
    IncreaseTdbItrnode { count: u32 },
    /// Item-Id-Block der Schienen-Datenbank reservieren
    IncreaseTdbItritem { count: u32 },
    /// Knoten-Id-Block der Straßen-Datenbank reservieren
    IncreaseRdbItrnode { count: u32 },
    /// Item-Id-Block der Straßen-Datenbank reservieren
    IncreaseRdbItritem { count: u32 },
    /// Item-Änderung in die Schienen-Datenbank übernehmen
    UpdateTritemTdb {
        item_id: u32,
        node_id: u32,
        distance_along: f32,
    },
    /// Route speichern
    Save,
}

/// Antwort an einen Sitzungs-Teilnehmer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SessionResponse {
    TileData { tile: Box<Tile> },
    TdbData { network: Box<TrackNetwork> },
    RdbData { network: Box<TrackNetwork> },
    /// Erste Id eines reservierten Id-Blocks
    IdBlock { first_id: u32, count: u32 },
    Ok,
    Error { message: String },
}

/// Kodiert eine Anfrage als JSON-Zeile.
pub fn encode_request(request: &SessionRequest) -> serde_json::Result<String> {
    serde_json::to_string(request)
}

/// Dekodiert eine Anfrage aus einer JSON-Zeile.
pub fn decode_request(text: &str) -> serde_json::Result<SessionRequest> {
    serde_json::from_str(text)
}

/// Kodiert eine Antwort als JSON-Zeile.
pub fn encode_response(response: &SessionResponse) -> serde_json::Result<String> {
    serde_json::to_string(response)
}

/// Dekodiert eine Antwort und baut flüchtige Indizes neu auf.
pub fn decode_response(text: &str) -> serde_json::Result<SessionResponse> {
    let mut response: SessionResponse = serde_json::from_str(text)?;
    match &mut response {
        SessionResponse::TdbData { network } | SessionResponse::RdbData { network } => {
            // Der Spatial-Index wird nicht übertragen
            network.rebuild_spatial_index();
        }
        _ => {}
    }
    Ok(response)
}
