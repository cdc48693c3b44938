//! The aggregate root for one ruleset: catalogs plus global rules.
//!
//! A [`World`] owns the prefix, material, item-base, and character
//! catalogs for one setting, together with its rules: the character base
//! stats every character starts from, rarity color bands for display, and
//! the ordered stat categories the display layer groups character stats
//! into. Catalog contents are assigned once after loading and never
//! mutated; everything downstream shares them through `Arc` handles.

use crate::character::Character;
use crate::component::{Component, ItemBase};
use crate::document::{self, DocObject};
use crate::error::LoadError;
use crate::item::Item;
use crate::stat_map::StatMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

/// An sRGB color from a rules document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb {
        r: 255,
        g: 255,
        b: 255,
    };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// One rarity color band: items at or above `threshold` (and below the
/// next band's threshold) display in `color`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RarityBand {
    pub threshold: i32,
    pub color: Rgb,
}

/// Catalogs and rules for one ruleset/setting.
///
/// # Examples
///
/// ```rust
/// use gearcalc::World;
/// use std::collections::BTreeMap;
///
/// let world = World::with_catalogs("demo", BTreeMap::new(), BTreeMap::new(), BTreeMap::new());
/// assert_eq!(world.name(), "demo");
/// assert!(world.get_material("iron").is_none());
/// ```
#[derive(Debug)]
pub struct World {
    file_name: String,
    name: String,
    rarity_bands: Vec<RarityBand>,
    character_stat_categories: Vec<(String, Vec<String>)>,
    character_base_stats: StatMap,
    prefixes: BTreeMap<String, Arc<Component>>,
    materials: BTreeMap<String, Arc<Component>>,
    item_bases: BTreeMap<String, Arc<ItemBase>>,
    characters: BTreeMap<String, Character>,
}

impl World {
    /// A world with the given catalogs and default rules: the directory
    /// name as display name, one all-encompassing white rarity band, no
    /// stat categories, empty character base stats.
    pub fn with_catalogs(
        file_name: &str,
        prefixes: BTreeMap<String, Arc<Component>>,
        materials: BTreeMap<String, Arc<Component>>,
        item_bases: BTreeMap<String, Arc<ItemBase>>,
    ) -> Self {
        Self {
            file_name: file_name.to_string(),
            name: file_name.to_string(),
            rarity_bands: vec![RarityBand {
                threshold: i32::MIN,
                color: Rgb::WHITE,
            }],
            character_stat_categories: Vec::new(),
            character_base_stats: StatMap::new(),
            prefixes,
            materials,
            item_bases,
            characters: BTreeMap::new(),
        }
    }

    /// A world from a rules document plus loaded catalogs.
    ///
    /// Rules shape: `{name, rarityColors: {<threshold>: [r, g, b]},`
    /// ` characterStatCategories: {<category>: [prefix...]},`
    /// ` characterBase: {<statSpec>...}}`. A missing or invalid rule falls
    /// back to its default rather than failing the world; invalid ones are
    /// logged.
    pub fn from_documents(
        file_name: &str,
        rules: &Value,
        prefixes: BTreeMap<String, Arc<Component>>,
        materials: BTreeMap<String, Arc<Component>>,
        item_bases: BTreeMap<String, Arc<ItemBase>>,
    ) -> Self {
        let mut world = World::with_catalogs(file_name, prefixes, materials, item_bases);
        match rules.as_object() {
            Some(obj) => world.apply_rules(obj),
            None => warn!(world = file_name, "rules document is not an object"),
        }
        world
    }

    fn apply_rules(&mut self, obj: &DocObject) {
        match document::opt_str_field(obj, "name") {
            Ok(Some(name)) => self.name = name.to_string(),
            Ok(None) => {}
            Err(err) => warn!(world = %self.file_name, %err, "ignoring world name"),
        }

        match parse_rarity_bands(obj) {
            Ok(Some(bands)) if !bands.is_empty() => self.rarity_bands = bands,
            Ok(_) => {}
            Err(err) => warn!(world = %self.file_name, %err, "ignoring rarity colors"),
        }

        match parse_stat_categories(obj) {
            Ok(Some(categories)) => self.character_stat_categories = categories,
            Ok(None) => {}
            Err(err) => warn!(world = %self.file_name, %err, "ignoring stat categories"),
        }

        match parse_character_base(obj) {
            Ok(Some(base)) => self.character_base_stats = base,
            Ok(None) => {}
            Err(err) => warn!(world = %self.file_name, %err, "ignoring character base stats"),
        }
    }

    /// The name of the world directory in the file system.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// The display name from the rules document.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rarity bands, ascending by threshold.
    pub fn rarity_bands(&self) -> &[RarityBand] {
        &self.rarity_bands
    }

    /// The color band for a rarity score: the band with the highest
    /// threshold at or below the score, or the lowest band when the score
    /// is below every threshold.
    pub fn rarity_color(&self, rarity: i32) -> Rgb {
        self.rarity_bands
            .iter()
            .rev()
            .find(|band| rarity >= band.threshold)
            .or_else(|| self.rarity_bands.first())
            .map_or(Rgb::WHITE, |band| band.color)
    }

    /// Ordered display categories mapping a category name to the stat
    /// name prefixes it collects.
    pub fn character_stat_categories(&self) -> &[(String, Vec<String>)] {
        &self.character_stat_categories
    }

    /// The stats every character in this world starts from.
    pub fn character_base_stats(&self) -> &StatMap {
        &self.character_base_stats
    }

    pub fn get_prefix(&self, id: &str) -> Option<&Arc<Component>> {
        self.prefixes.get(id)
    }

    pub fn get_material(&self, id: &str) -> Option<&Arc<Component>> {
        self.materials.get(id)
    }

    pub fn get_item_base(&self, id: &str) -> Option<&Arc<ItemBase>> {
        self.item_bases.get(id)
    }

    pub fn get_character(&self, id: &str) -> Option<&Character> {
        self.characters.get(id)
    }

    pub fn prefixes(&self) -> &BTreeMap<String, Arc<Component>> {
        &self.prefixes
    }

    pub fn materials(&self) -> &BTreeMap<String, Arc<Component>> {
        &self.materials
    }

    pub fn item_bases(&self) -> &BTreeMap<String, Arc<ItemBase>> {
        &self.item_bases
    }

    pub fn characters(&self) -> &BTreeMap<String, Character> {
        &self.characters
    }

    /// Assign the character catalog. Called once, after character loading
    /// (which needs the world's other catalogs) completes.
    pub fn set_characters(&mut self, characters: BTreeMap<String, Character>) {
        self.characters = characters;
    }

    /// Prefixes whose tag sets satisfy the given required tags.
    pub fn prefixes_matching(&self, required: &[String]) -> Vec<Arc<Component>> {
        components_matching(&self.prefixes, required)
    }

    /// Materials whose tag sets satisfy the given required tags.
    pub fn materials_matching(&self, required: &[String]) -> Vec<Arc<Component>> {
        components_matching(&self.materials, required)
    }

    /// An item from a base alone: no prefixes, all material slots on
    /// their defaults.
    pub fn make_item(&self, item_base: Arc<ItemBase>) -> Item {
        Item::new(self, Vec::new(), Vec::new(), item_base)
    }

    /// An item with candidate materials and no prefixes.
    pub fn make_material_item(
        &self,
        materials: Vec<Arc<Component>>,
        item_base: Arc<ItemBase>,
    ) -> Item {
        Item::new(self, Vec::new(), materials, item_base)
    }

    /// The general item factory.
    pub fn make_custom_item(
        &self,
        prefixes: Vec<Arc<Component>>,
        materials: Vec<Arc<Component>>,
        item_base: Arc<ItemBase>,
    ) -> Item {
        Item::new(self, prefixes, materials, item_base)
    }
}

fn components_matching(
    catalog: &BTreeMap<String, Arc<Component>>,
    required: &[String],
) -> Vec<Arc<Component>> {
    catalog
        .values()
        .filter(|c| c.has_tags(required))
        .cloned()
        .collect()
}

fn parse_rarity_bands(obj: &DocObject) -> Result<Option<Vec<RarityBand>>, LoadError> {
    let raw = match document::opt_object_field(obj, "rarityColors")? {
        Some(raw) => raw,
        None => return Ok(None),
    };
    let mut bands = Vec::with_capacity(raw.len());
    for (raw_threshold, raw_color) in raw {
        let threshold: i32 = raw_threshold
            .parse()
            .map_err(|_| LoadError::field_type("rarityColors", "integer thresholds"))?;
        bands.push(RarityBand {
            threshold,
            color: parse_rgb(raw_color)?,
        });
    }
    bands.sort_by_key(|band| band.threshold);
    Ok(Some(bands))
}

fn parse_rgb(value: &Value) -> Result<Rgb, LoadError> {
    let channels = value
        .as_array()
        .ok_or_else(|| LoadError::field_type("rarityColors", "[r, g, b] arrays"))?;
    if channels.len() != 3 {
        return Err(LoadError::field_type("rarityColors", "[r, g, b] arrays"));
    }
    let mut rgb = [0u8; 3];
    for (slot, channel) in rgb.iter_mut().zip(channels) {
        *slot = channel
            .as_u64()
            .filter(|&v| v <= 255)
            .ok_or_else(|| LoadError::field_type("rarityColors", "channels in 0..=255"))?
            as u8;
    }
    Ok(Rgb::new(rgb[0], rgb[1], rgb[2]))
}

fn parse_stat_categories(obj: &DocObject) -> Result<Option<Vec<(String, Vec<String>)>>, LoadError> {
    let raw = match document::opt_object_field(obj, "characterStatCategories")? {
        Some(raw) => raw,
        None => return Ok(None),
    };
    // Document order is presentation order here.
    raw.iter()
        .map(|(category, contents)| match contents {
            Value::Array(items) => Ok((
                category.clone(),
                document::string_array(items, "characterStatCategories")?,
            )),
            _ => Err(LoadError::field_type(
                "characterStatCategories",
                "arrays of stat name prefixes",
            )),
        })
        .collect::<Result<_, _>>()
        .map(Some)
}

fn parse_character_base(obj: &DocObject) -> Result<Option<StatMap>, LoadError> {
    match document::opt_object_field(obj, "characterBase")? {
        Some(raw) => Ok(Some(StatMap::from_document(raw)?)),
        None => Ok(None),
    }
}
