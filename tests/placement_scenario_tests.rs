//! Integrationstests für Platzierung und Drag:
//! - Re-Homing über Tile-Grenzen mit Anker-Nachführung
//! - Serien-Platzierung samt Batch-Löschung
//! - Deterministische Netzwerk-Treffer

use approx::assert_abs_diff_eq;
use glam::{Quat, Vec3};
use rail_route_engine::{
    AutoPlaceMode, CatalogEntry, CatalogEntryKind, EditorOptions, MemoryTerrain, MemoryUndo,
    NoUndo, Route, SectionCatalog, SectionDef, SectionGeometry, ShapeDef, TileCoord, TrackNode,
    TrackNodeKind, VectorSection, WorldObjectKind, TILE_SIZE,
};

/// Logger initialisieren; Wiederholungs-Aufrufe bleiben folgenlos.
fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .is_test(true)
        .try_init();
}

fn catalog() -> SectionCatalog {
    init_logging();
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

fn rail_node(id: u32, from: Vec3, to: Vec3) -> TrackNode {
    TrackNode {
        id,
        kind: TrackNodeKind::Vector {
            sections: vec![VectorSection {
                section_id: 1,
                shape_id: 100,
                owner_tile: TileCoord::new(0, 0),
                owner_uid: 99,
                points: vec![from, to],
                length: from.distance(to),
            }],
            item_ids: Vec::new(),
        },
        pins: Vec::new(),
    }
}

fn static_entry() -> CatalogEntry {
    CatalogEntry {
        name: "Mast".into(),
        kind: CatalogEntryKind::Static,
    }
}

#[test]
fn drag_ueber_die_tile_kante_fuehrt_den_anker_nach() {
    let mut route = Route::new("test", catalog(), EditorOptions::default());
    let terrain = MemoryTerrain::with_tiles([TileCoord::new(0, 0), TileCoord::new(1, 0)]);
    let (tile, uid) = route
        .place_object(
            TileCoord::new(0, 0),
            Vec3::new(1020.0, 0.0, 0.0),
            Quat::IDENTITY,
            &static_entry(),
            None,
            &terrain,
            &mut NoUndo,
        )
        .expect("platziert");
    assert_eq!(tile, TileCoord::new(0, 0));

    // 20 m weiter: über die Kante bei 1024
    let (dest, new_uid) = route
        .drag_object(tile, uid, Vec3::new(1040.0, 0.0, 0.0), &terrain)
        .expect("umgezogen");
    assert_eq!(dest, TileCoord::new(1, 0));
    let obj = route.grid.object(dest, new_uid).expect("Objekt");
    assert_abs_diff_eq!(obj.position.x, -1008.0);
    // Anker relativ zum neuen Heimat-Tile: alte Position minus eine Kante
    assert_abs_diff_eq!(obj.first_position.x, 1020.0 - TILE_SIZE);
    // Welt-Position des Ankers ist damit unverändert
    assert_abs_diff_eq!(
        dest.x as f32 * TILE_SIZE + obj.first_position.x,
        1020.0,
        epsilon = 1e-3
    );
    assert!(route.grid.object(tile, uid).is_none());
}

#[test]
fn serien_platzierung_belegt_den_knoten_und_loescht_als_batch() {
    let mut route = Route::new("test", catalog(), EditorOptions::default());
    route
        .track_db
        .add_node(rail_node(1, Vec3::ZERO, Vec3::new(0.0, 0.0, 100.0)));
    let terrain = MemoryTerrain::with_tiles([TileCoord::new(0, 0)]);
    let mut undo = MemoryUndo::new(100);

    let placed = route.auto_place_series(
        &static_entry(),
        TileCoord::new(0, 0),
        Vec3::new(1.0, 0.0, 10.0),
        AutoPlaceMode::Full,
        &terrain,
        &mut undo,
    );
    // Länge 100, Schritt 10: Distanzen 0, 10, …, 90
    assert_eq!(placed, 10);
    let tile = route.grid.tile(TileCoord::new(0, 0)).expect("Tile");
    assert_eq!(tile.object_count(), 10);
    for (i, obj) in tile.objects().iter().enumerate() {
        assert_abs_diff_eq!(obj.position.z, i as f32 * 10.0, epsilon = 1e-3);
        assert!(matches!(obj.kind, WorldObjectKind::Static));
    }

    // Batch-Löschung versteckt genau die Serie
    assert_eq!(route.auto_placement_delete_last(&mut undo), 10);
    let tile = route.grid.tile(TileCoord::new(0, 0)).expect("Tile");
    assert_eq!(tile.object_count(), 0);
    assert_eq!(tile.hidden_object_count(), 10);
    assert_eq!(route.auto_placement_delete_last(&mut undo), 0);
}

#[test]
fn serien_platzierung_mit_versatz_und_zwei_punkt_rotation() {
    let mut route = Route::new("test", catalog(), EditorOptions::default());
    route.options.auto_place_two_point_rot = true;
    route.options.auto_place_translation_offset = [5.0, 0.0, 0.0];
    route
        .track_db
        .add_node(rail_node(1, Vec3::ZERO, Vec3::new(0.0, 0.0, 100.0)));
    let terrain = MemoryTerrain::with_tiles([TileCoord::new(0, 0)]);

    let placed = route.auto_place_series(
        &static_entry(),
        TileCoord::new(0, 0),
        Vec3::new(1.0, 0.0, 10.0),
        AutoPlaceMode::Full,
        &terrain,
        &mut NoUndo,
    );
    assert_eq!(placed, 10);
    // Gleis läuft entlang +Z (Yaw 0): der lokale x-Versatz bleibt x-Versatz
    let tile = route.grid.tile(TileCoord::new(0, 0)).expect("Tile");
    for obj in tile.objects() {
        assert_abs_diff_eq!(obj.position.x, 5.0, epsilon = 1e-3);
    }
}

#[test]
fn netzwerk_treffer_sind_reproduzierbar_bei_gleichstand() {
    let mut route = Route::new("test", catalog(), EditorOptions::default());
    // Zwei parallele Gleise in identischem Abstand zur Anfrage
    route
        .track_db
        .add_node(rail_node(7, Vec3::new(6.0, 0.0, 0.0), Vec3::new(6.0, 0.0, 100.0)));
    route
        .track_db
        .add_node(rail_node(3, Vec3::new(-6.0, 0.0, 0.0), Vec3::new(-6.0, 0.0, 100.0)));

    let hits: Vec<u32> = (0..10)
        .map(|_| {
            route
                .track_db
                .find_nearest_position(TileCoord::new(0, 0), Vec3::new(0.0, 0.0, 50.0))
                .expect("Treffer erwartet")
                .node_id
        })
        .collect();
    assert!(hits.iter().all(|&id| id == 3));
}

#[test]
fn gleis_platzierung_ueber_der_kante_landet_im_nachbar_tile() {
    let mut route = Route::new("test", catalog(), EditorOptions::default());
    let terrain = MemoryTerrain::with_tiles([TileCoord::new(0, 0), TileCoord::new(1, 0)]);
    let entry = CatalogEntry {
        name: "Gleis 10m".into(),
        kind: CatalogEntryKind::Track { shape_id: 100 },
    };
    let (tile, uid) = route
        .place_object(
            TileCoord::new(0, 0),
            Vec3::new(1030.0, 0.0, 0.0),
            Quat::IDENTITY,
            &entry,
            None,
            &terrain,
            &mut NoUndo,
        )
        .expect("platziert");
    assert_eq!(tile, TileCoord::new(1, 0));
    assert!(route.track_db.has_track(tile, uid));
    let obj = route.grid.object(tile, uid).expect("Objekt");
    assert_abs_diff_eq!(obj.position.x, -1018.0, epsilon = 1e-3);
    assert!(obj.in_network);
}
