//! Item composition.
//!
//! An [`Item`] composes one item base with prefixes and materials into a
//! derived name, summed rarity, and merged stat map. Candidates are
//! validated against the base's tag gates on the way in: prefixes that
//! fail are silently dropped, materials that fail (or are missing) fall
//! back to the slot's default from the world catalog. Every mutation
//! re-runs the relevant filter and both recomputations, so an item is
//! internally consistent after any single change.

use crate::component::{Component, ItemBase};
use crate::stat_map::StatMap;
use crate::world::World;
use std::sync::Arc;
use tracing::warn;

/// A concrete composition of an item base with prefixes and materials.
///
/// The item references its base and components through shared handles
/// (they live in the world's catalogs) but exclusively owns its derived
/// stat map, name, and rarity. Materials are positional: one slot per
/// entry in the base's `defaultMaterials`, `None` when a slot's default
/// is missing from the catalog.
///
/// # Examples
///
/// ```rust
/// use gearcalc::{Component, ItemBase, Item, World};
/// use serde_json::json;
/// use std::collections::BTreeMap;
/// use std::sync::Arc;
///
/// let sword = Arc::new(ItemBase::from_document("sword", &json!({
///     "name": "sword", "rarity": 1, "stats": {"damage": "3"},
/// })).unwrap());
/// let flaming = Arc::new(Component::from_document("flaming", &json!({
///     "name": "flaming", "rarity": 2, "stats": {"damage": "+2"},
///     "tags": ["elemental"],
/// })).unwrap());
///
/// let mut item_bases = BTreeMap::new();
/// item_bases.insert("sword".to_string(), sword.clone());
/// let world = World::with_catalogs("demo", BTreeMap::new(), BTreeMap::new(), item_bases);
///
/// let item = Item::new(&world, vec![flaming], vec![], sword);
/// assert_eq!(item.name(), "flaming sword");
/// assert_eq!(item.rarity(), 3);
/// assert_eq!(item.stat_map().get("damage").unwrap().expression().unwrap().value(), 5.0);
/// ```
#[derive(Debug, PartialEq)]
pub struct Item {
    item_base: Arc<ItemBase>,
    prefixes: Vec<Arc<Component>>,
    materials: Vec<Option<Arc<Component>>>,
    stat_map: StatMap,
    name: String,
    rarity: i32,
}

impl Item {
    /// Compose an item. Candidate prefixes and materials are filtered
    /// against the base's gates; the world supplies slot defaults.
    pub fn new(
        world: &World,
        prefixes: Vec<Arc<Component>>,
        materials: Vec<Arc<Component>>,
        item_base: Arc<ItemBase>,
    ) -> Self {
        let mut item = Self {
            prefixes: filter_prefixes(&item_base, prefixes),
            materials: filter_materials(world, &item_base, &materials),
            item_base,
            stat_map: StatMap::new(),
            name: String::new(),
            rarity: 0,
        };
        item.recalculate_stats();
        item.recalculate_name();
        item
    }

    pub fn item_base(&self) -> &Arc<ItemBase> {
        &self.item_base
    }

    pub fn prefixes(&self) -> &[Arc<Component>] {
        &self.prefixes
    }

    /// Materials by slot; `None` marks a slot whose default was absent
    /// from the catalog.
    pub fn materials(&self) -> &[Option<Arc<Component>>] {
        &self.materials
    }

    pub fn stat_map(&self) -> &StatMap {
        &self.stat_map
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rarity(&self) -> i32 {
        self.rarity
    }

    /// Replace the prefixes. Candidates failing the base's prefix gate
    /// are dropped, preserving candidate order.
    pub fn set_prefixes(&mut self, prefixes: Vec<Arc<Component>>) {
        self.prefixes = filter_prefixes(&self.item_base, prefixes);
        self.recalculate_name();
        self.recalculate_stats();
    }

    /// Replace the materials. Each slot takes its candidate when the
    /// candidate passes the slot's gate, otherwise the world default.
    pub fn set_materials(&mut self, world: &World, materials: Vec<Arc<Component>>) {
        self.materials = filter_materials(world, &self.item_base, &materials);
        self.recalculate_name();
        self.recalculate_stats();
    }

    /// Swap the item base, revalidating the current materials and
    /// prefixes against the new base's gates.
    pub fn set_item_base(&mut self, world: &World, item_base: Arc<ItemBase>) {
        self.item_base = item_base;
        let kept_materials: Vec<Arc<Component>> =
            self.materials.iter().flatten().cloned().collect();
        self.materials = filter_materials(world, &self.item_base, &kept_materials);
        self.prefixes = filter_prefixes(&self.item_base, std::mem::take(&mut self.prefixes));
        self.recalculate_name();
        self.recalculate_stats();
    }

    /// Rebuild the stat map and rarity from scratch.
    ///
    /// Materials are folded in with `add_map` before prefixes merge, so a
    /// prefix cannot retroactively widen what materials touch.
    fn recalculate_stats(&mut self) {
        self.stat_map.clear();
        self.rarity = self.item_base.rarity();
        self.stat_map.merge_map(self.item_base.stat_map());

        for material in self.materials.iter().flatten() {
            self.stat_map.add_map(material.stat_map());
            self.rarity += material.rarity();
        }

        for prefix in &self.prefixes {
            self.stat_map.merge_map(prefix.stat_map());
            self.rarity += prefix.rarity();
        }
    }

    /// Rebuild the display name: prefixes, the base name, then the filled
    /// material slots as `(a, b and c)`.
    fn recalculate_name(&mut self) {
        let mut name = String::new();
        for prefix in &self.prefixes {
            name.push_str(prefix.name());
            name.push(' ');
        }
        name.push_str(self.item_base.name());

        let materials: Vec<&str> = self
            .materials
            .iter()
            .flatten()
            .map(|m| m.name())
            .collect();
        if !materials.is_empty() {
            name.push_str(" (");
            match materials.split_last() {
                Some((last, rest)) if !rest.is_empty() => {
                    name.push_str(&rest.join(", "));
                    name.push_str(" and ");
                    name.push_str(last);
                }
                _ => name.push_str(materials[0]),
            }
            name.push(')');
        }

        self.name = name;
    }
}

/// Keep the candidates that pass the base's prefix gate, in order.
fn filter_prefixes(item_base: &ItemBase, candidates: Vec<Arc<Component>>) -> Vec<Arc<Component>> {
    candidates
        .into_iter()
        .filter(|p| item_base.prefix_reqs().passes(p))
        .collect()
}

/// Fill every material slot: the candidate at the slot's index when it
/// passes the slot's gate, otherwise the world's default for that slot.
fn filter_materials(
    world: &World,
    item_base: &ItemBase,
    candidates: &[Arc<Component>],
) -> Vec<Option<Arc<Component>>> {
    item_base
        .default_materials()
        .iter()
        .enumerate()
        .map(|(slot, default_id)| {
            if let Some(candidate) = candidates.get(slot) {
                if item_base.material_req(slot).passes(candidate) {
                    return Some(candidate.clone());
                }
            }
            let fallback = world.get_material(default_id).cloned();
            if fallback.is_none() {
                warn!(
                    item_base = item_base.id(),
                    slot,
                    material = default_id.as_str(),
                    "default material missing from catalog; slot left empty"
                );
            }
            fallback
        })
        .collect()
}
