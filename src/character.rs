//! Characters: named item carriers with derived stats.
//!
//! A [`Character`] starts from the world's character base stats and folds
//! in the stat map of every equipped item, once per unit of that item's
//! count. Inventory items ride along without affecting stats. After the
//! fold, stat expressions are evaluated so stats can reference one
//! another by name.

use crate::bag::Bag;
use crate::component::Component;
use crate::document::{self, DocObject};
use crate::error::LoadError;
use crate::item::Item;
use crate::stat_map::StatMap;
use crate::world::World;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

/// A named carrier of equipped and inventory items.
#[derive(Debug)]
pub struct Character {
    id: String,
    name: String,
    stat_map: StatMap,
    equipped: Bag<Item>,
    inventory: Bag<Item>,
}

impl Character {
    /// An empty character with no items and the world's base stats.
    pub fn new(id: &str, name: &str, world: &World) -> Self {
        let mut character = Self {
            id: id.to_string(),
            name: name.to_string(),
            stat_map: StatMap::new(),
            equipped: Bag::new(),
            inventory: Bag::new(),
        };
        character.recalculate_stats(world);
        character
    }

    /// Build a character from a document against a world's catalogs.
    ///
    /// Shape: `{name, equipped: [itemSpec...], inventory: [itemSpec...]}`,
    /// all three required. Each item spec is `{quantity, itemBase,
    /// prefixes, materials}`; a spec with quantity below one or any id the
    /// catalogs cannot resolve is dropped with a warning while its
    /// siblings load.
    pub fn from_document(id: &str, doc: &Value, world: &World) -> Result<Self, LoadError> {
        let obj = document::as_object(doc)?;
        let name = document::str_field(obj, "name")?;
        let mut character = Self {
            id: id.to_string(),
            name: name.to_string(),
            stat_map: StatMap::new(),
            equipped: Bag::new(),
            inventory: Bag::new(),
        };
        character.equipped = load_items(id, obj, "equipped", world)?;
        character.inventory = load_items(id, obj, "inventory", world)?;
        character.recalculate_stats(world);
        Ok(character)
    }

    /// The id this character is cataloged under.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The derived stats as of the last recalculation.
    pub fn stat_map(&self) -> &StatMap {
        &self.stat_map
    }

    pub fn equipped(&self) -> &Bag<Item> {
        &self.equipped
    }

    pub fn inventory(&self) -> &Bag<Item> {
        &self.inventory
    }

    /// Equip an item and refresh the derived stats.
    pub fn equip(&mut self, world: &World, item: Item) {
        self.equipped.add(item);
        self.recalculate_stats(world);
    }

    /// Unequip one of the item and refresh the derived stats. Returns
    /// false if the item was not equipped.
    pub fn unequip(&mut self, world: &World, item: &Item) -> bool {
        let removed = self.equipped.remove(item);
        if removed {
            self.recalculate_stats(world);
        }
        removed
    }

    /// Add an item to the inventory. Inventory does not affect stats.
    pub fn store(&mut self, item: Item) {
        self.inventory.add(item);
    }

    /// Remove one of the item from the inventory.
    pub fn discard(&mut self, item: &Item) -> bool {
        self.inventory.remove(item)
    }

    /// Rebuild the derived stat map: the world's character base, then
    /// every equipped item's map folded in once per unit of its count,
    /// then one expression evaluation pass over the result.
    pub fn recalculate_stats(&mut self, world: &World) {
        self.stat_map.clear();
        self.stat_map.merge_map(world.character_base_stats());
        for (item, count) in self.equipped.iter() {
            for _ in 0..count {
                self.stat_map.merge_map(item.stat_map());
            }
        }
        self.stat_map.evaluate_expressions();
    }
}

/// Load one item bag field. Entry-level failures warn and skip; a missing
/// or mistyped field fails the character.
fn load_items(
    character_id: &str,
    obj: &DocObject,
    field: &str,
    world: &World,
) -> Result<Bag<Item>, LoadError> {
    let specs = document::array_field(obj, field)?;
    let mut bag = Bag::new();
    for spec in specs {
        match load_item(spec, world) {
            Ok((item, quantity)) => bag.add_n(item, quantity),
            Err(err) => {
                warn!(character = character_id, field, %err, "skipping item entry");
            }
        }
    }
    Ok(bag)
}

fn load_item(spec: &Value, world: &World) -> Result<(Item, u32), LoadError> {
    let obj = document::as_object(spec)?;

    let quantity = document::opt_int_field(obj, "quantity")?.unwrap_or(1);
    if quantity < 1 {
        return Err(LoadError::field_type("quantity", "a count of at least 1"));
    }

    let base_id = document::str_field(obj, "itemBase")?;
    let item_base = world
        .get_item_base(base_id)
        .cloned()
        .ok_or_else(|| LoadError::UnresolvedId(base_id.to_string()))?;

    let prefixes = match document::opt_array_field(obj, "prefixes")? {
        Some(items) => resolve_components(items, "prefixes", world, World::get_prefix)?,
        None => Vec::new(),
    };
    let materials = match document::opt_array_field(obj, "materials")? {
        Some(items) => resolve_components(items, "materials", world, World::get_material)?,
        None => Vec::new(),
    };

    Ok((
        world.make_custom_item(prefixes, materials, item_base),
        quantity as u32,
    ))
}

fn resolve_components(
    items: &[Value],
    field: &str,
    world: &World,
    lookup: for<'w> fn(&'w World, &str) -> Option<&'w Arc<Component>>,
) -> Result<Vec<Arc<Component>>, LoadError> {
    document::string_array(items, field)?
        .iter()
        .map(|id| {
            lookup(world, id)
                .cloned()
                .ok_or_else(|| LoadError::UnresolvedId(id.clone()))
        })
        .collect()
}
