//! End-to-end composition tests over an in-memory world.
//!
//! These tests verify:
//! - Item composition from catalogs (name, rarity, stats)
//! - Material slot defaulting against tag gates
//! - Character stat derivation from equipped items
//! - Rarity band lookup

use gearcalc::{Character, Component, ItemBase, Rgb, World};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

fn component(id: &str, doc: serde_json::Value) -> Arc<Component> {
    Arc::new(Component::from_document(id, &doc).unwrap())
}

fn item_base(id: &str, doc: serde_json::Value) -> Arc<ItemBase> {
    Arc::new(ItemBase::from_document(id, &doc).unwrap())
}

fn stat_value(item: &gearcalc::Item, name: &str) -> f64 {
    item.stat_map()
        .get(name)
        .unwrap()
        .expression()
        .unwrap()
        .value()
}

/// A small fantasy world: a sword base, a flaming prefix, two materials.
fn forge_world() -> World {
    let mut prefixes = BTreeMap::new();
    prefixes.insert(
        "flaming".to_string(),
        component(
            "flaming",
            json!({
                "name": "flaming",
                "rarity": 2,
                "stats": {"dmg": "+2"},
                "tags": ["elemental"],
            }),
        ),
    );

    let mut materials = BTreeMap::new();
    materials.insert(
        "iron".to_string(),
        component(
            "iron",
            json!({"name": "iron", "rarity": 1, "stats": {"dmg": "1"}, "tags": ["metal"]}),
        ),
    );
    materials.insert(
        "oak".to_string(),
        component("oak", json!({"name": "oak", "tags": ["wood", "flammable"]})),
    );

    let mut item_bases = BTreeMap::new();
    item_bases.insert(
        "sword".to_string(),
        item_base(
            "sword",
            json!({"name": "sword", "rarity": 1, "stats": {"dmg": "3"}}),
        ),
    );
    item_bases.insert(
        "torch".to_string(),
        item_base(
            "torch",
            json!({
                "name": "torch",
                "stats": {"light": "4"},
                "materialRequirements": [["flammable"]],
                "defaultMaterials": ["oak"],
            }),
        ),
    );

    World::from_documents(
        "forge",
        &json!({
            "name": "The Forge",
            "rarityColors": {"0": [255, 255, 255], "3": [255, 128, 0]},
            "characterStatCategories": {"Offense": ["dmg"]},
            "characterBase": {"hp": "10", "dmg": "0"},
        }),
        prefixes,
        materials,
        item_bases,
    )
}

/// The canonical composition scenario: a flaming sword.
#[test]
fn test_flaming_sword() {
    let world = forge_world();
    let sword = world.get_item_base("sword").unwrap().clone();
    let flaming = world.get_prefix("flaming").unwrap().clone();

    let item = world.make_custom_item(vec![flaming], vec![], sword);
    assert_eq!(item.name(), "flaming sword");
    assert_eq!(item.rarity(), 3);
    assert_eq!(stat_value(&item, "dmg"), 5.0);
    // Rarity 3 lands in the second band.
    assert_eq!(world.rarity_color(item.rarity()), Rgb::new(255, 128, 0));
}

#[test]
fn test_material_slot_defaults_when_candidate_fails_gate() {
    let world = forge_world();
    let torch = world.get_item_base("torch").unwrap().clone();
    let iron = world.get_material("iron").unwrap().clone();

    // Iron is not flammable; the slot falls back to oak.
    let item = world.make_material_item(vec![iron], torch.clone());
    assert_eq!(item.name(), "torch (oak)");

    // No candidates at all: same result.
    let item = world.make_item(torch);
    assert_eq!(item.name(), "torch (oak)");
}

#[test]
fn test_materials_strengthen_but_prefixes_introduce() {
    let world = forge_world();
    let sword = world.get_item_base("sword").unwrap().clone();
    let flaming = world.get_prefix("flaming").unwrap().clone();
    let iron = world.get_material("iron").unwrap().clone();

    // The sword has no material slots, so the iron candidate is ignored
    // entirely; only the prefix lands.
    let item = world.make_custom_item(vec![flaming], vec![iron], sword);
    assert_eq!(item.materials().len(), 0);
    assert_eq!(stat_value(&item, "dmg"), 5.0);
}

#[test]
fn test_character_derives_stats_from_equipment() {
    let world = forge_world();
    let sword = world.get_item_base("sword").unwrap().clone();
    let flaming = world.get_prefix("flaming").unwrap().clone();

    let mut hero = Character::new("heroes/brand", "Brand", &world);
    assert_eq!(
        hero.stat_map().get("hp").unwrap().expression().unwrap().value(),
        10.0
    );

    hero.equip(&world, world.make_custom_item(vec![flaming], vec![], sword));
    assert_eq!(
        hero.stat_map().get("dmg").unwrap().expression().unwrap().value(),
        5.0
    );

    let handle = world.make_custom_item(
        vec![world.get_prefix("flaming").unwrap().clone()],
        vec![],
        world.get_item_base("sword").unwrap().clone(),
    );
    assert!(hero.unequip(&world, &handle));
    assert_eq!(
        hero.stat_map().get("dmg").unwrap().expression().unwrap().value(),
        0.0
    );
}

#[test]
fn test_display_strings_for_composed_item() {
    let world = forge_world();
    let item = world.make_item(world.get_item_base("torch").unwrap().clone());
    assert_eq!(item.stat_map().to_display_strings(), ["light: 4"]);
}
