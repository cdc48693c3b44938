//! Loader tests over real temporary directory trees.
//!
//! These tests verify:
//! - World directory discovery (and silent skipping of invalid shapes)
//! - Full world loading: rules, three catalogs, characters
//! - Per-document skip-and-continue on malformed JSON
//! - Cooperative cancellation discarding partial results

use gearcalc::{CatalogLoader, Component, WorldLoader};
use std::fs;
use std::path::Path;
use std::sync::atomic::AtomicBool;

fn write_file(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// Lay out one complete world directory under `root/<name>`.
fn write_world(root: &Path, name: &str) {
    let world = format!("{name}/");
    write_file(
        root,
        &format!("{world}rules.json"),
        r#"{
            "name": "Midgard",
            "rarityColors": {"0": [255, 255, 255]},
            "characterStatCategories": {"Offense": ["dmg"]},
            "characterBase": {"hp": "10", "dmg": "0"}
        }"#,
    );
    write_file(
        root,
        &format!("{world}prefixes/flaming.json"),
        r#"{"name": "flaming", "rarity": 2, "stats": {"dmg": "+2"}}"#,
    );
    write_file(
        root,
        &format!("{world}materials/iron.json"),
        r#"{"name": "iron", "rarity": 1, "stats": {"dmg": "1"}, "tags": ["metal"]}"#,
    );
    write_file(
        root,
        &format!("{world}itemBases/sword.json"),
        r#"{
            "name": "sword", "rarity": 1, "stats": {"dmg": "3"},
            "materialRequirements": [["metal"]],
            "defaultMaterials": ["iron"]
        }"#,
    );
    write_file(
        root,
        &format!("{world}characters/brand.json"),
        r#"{
            "name": "Brand",
            "equipped": [{"itemBase": "sword", "prefixes": ["flaming"]}],
            "inventory": []
        }"#,
    );
}

#[test]
fn test_world_loader_loads_complete_world() {
    let dir = tempfile::tempdir().unwrap();
    write_world(dir.path(), "midgard");

    let mut loader = WorldLoader::new(dir.path()).unwrap();
    assert_eq!(loader.total(), 1);
    while loader.load_next() {}
    assert_eq!(loader.failed(), 0);

    let worlds = loader.into_worlds();
    let world = &worlds["midgard"];
    assert_eq!(world.name(), "Midgard");
    assert_eq!(world.file_name(), "midgard");
    assert_eq!(world.prefixes().len(), 1);
    assert_eq!(world.materials().len(), 1);
    assert_eq!(world.item_bases().len(), 1);

    // The character resolved its references and derived its stats:
    // sword 3 + iron 1 + flaming 2.
    let brand = world.get_character("brand").unwrap();
    assert_eq!(brand.name(), "Brand");
    assert_eq!(
        brand.equipped().get(0).unwrap().name(),
        "flaming sword (iron)"
    );
    assert_eq!(
        brand
            .stat_map()
            .get("dmg")
            .unwrap()
            .expression()
            .unwrap()
            .value(),
        6.0
    );
}

#[test]
fn test_invalid_world_directories_are_skipped_silently() {
    let dir = tempfile::tempdir().unwrap();
    write_world(dir.path(), "midgard");

    // Missing rules.json.
    write_file(dir.path(), "broken/prefixes/.keep.json", "{}");
    fs::create_dir_all(dir.path().join("broken/materials")).unwrap();
    fs::create_dir_all(dir.path().join("broken/itemBases")).unwrap();
    fs::create_dir_all(dir.path().join("broken/characters")).unwrap();

    // Missing catalog directories.
    write_file(dir.path(), "thin/rules.json", "{}");

    // Stray file at the root.
    write_file(dir.path(), "readme.json", "{}");

    let loader = WorldLoader::new(dir.path()).unwrap();
    assert_eq!(loader.total(), 1);
    let worlds = loader.run(&AtomicBool::new(false)).unwrap();
    assert!(worlds.contains_key("midgard"));
}

#[test]
fn test_malformed_documents_skip_but_world_loads() {
    let dir = tempfile::tempdir().unwrap();
    write_world(dir.path(), "midgard");
    write_file(dir.path(), "midgard/prefixes/broken.json", "{ not json");
    write_file(
        dir.path(),
        "midgard/characters/ghost.json",
        r#"{"equipped": [], "inventory": []}"#,
    );

    let worlds = WorldLoader::new(dir.path())
        .unwrap()
        .run(&AtomicBool::new(false))
        .unwrap();
    let world = &worlds["midgard"];
    // The broken prefix and the nameless character are gone; the rest
    // loaded.
    assert_eq!(world.prefixes().len(), 1);
    assert!(world.get_character("ghost").is_none());
    assert!(world.get_character("brand").is_some());
}

#[test]
fn test_bad_rules_fall_back_but_catalogs_load() {
    let dir = tempfile::tempdir().unwrap();
    write_world(dir.path(), "midgard");
    write_file(dir.path(), "midgard/rules.json", r#""not an object""#);

    let worlds = WorldLoader::new(dir.path())
        .unwrap()
        .run(&AtomicBool::new(false))
        .unwrap();
    let world = &worlds["midgard"];
    assert_eq!(world.name(), "midgard");
    assert_eq!(world.item_bases().len(), 1);
}

#[test]
fn test_catalog_ids_include_subdirectories() {
    let dir = tempfile::tempdir().unwrap();
    write_file(
        dir.path(),
        "metals/iron.json",
        r#"{"name": "iron", "tags": ["metal"]}"#,
    );
    write_file(dir.path(), "oak.json", r#"{"name": "oak"}"#);

    let catalog = CatalogLoader::<Component>::new(dir.path())
        .unwrap()
        .run(&AtomicBool::new(false))
        .unwrap();
    assert!(catalog.contains_key("metals/iron"));
    assert!(catalog.contains_key("oak"));
}

#[test]
fn test_cancellation_discards_partial_results() {
    let dir = tempfile::tempdir().unwrap();
    write_world(dir.path(), "midgard");

    let loader = WorldLoader::new(dir.path()).unwrap();
    assert!(loader.run(&AtomicBool::new(true)).is_none());
}

#[test]
fn test_loader_rejects_non_directory() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("file.json");
    fs::write(&file, "{}").unwrap();
    assert!(WorldLoader::new(&file).is_err());
    assert!(WorldLoader::new(&dir.path().join("missing")).is_err());
}
