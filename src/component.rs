//! Reusable building blocks: components, item bases, and tag gates.
//!
//! A [`Component`] is a named, tagged, rarity-scored bundle of stats —
//! the shared shape of prefixes and materials. An [`ItemBase`] is a
//! component with composition rules bolted on: which prefixes it accepts,
//! which materials fit each slot, and what each slot falls back to.
//! [`TagRequirement`] is the predicate those gates are written in.
//!
//! All three are constructed once from catalog documents and never mutated
//! afterwards; items and characters share them through `Arc` handles.

use crate::document::{self, DocObject};
use crate::error::LoadError;
use crate::stat_map::StatMap;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

/// Fallback name for a component document without one.
pub const DEFAULT_NAME: &str = "Untitled";

/// A named, tagged, rarity-scored stat bundle.
///
/// # Examples
///
/// ```rust
/// use gearcalc::Component;
/// use serde_json::json;
///
/// let doc = json!({
///     "name": "Flaming",
///     "stats": {"damage": "+2"},
///     "rarity": 2,
///     "tags": ["elemental", "fire"],
/// });
/// let flaming = Component::from_document("prefixes/flaming", &doc).unwrap();
/// assert_eq!(flaming.name(), "Flaming");
/// assert_eq!(flaming.rarity(), 2);
/// assert!(flaming.has_tag("fire"));
/// ```
#[derive(Debug, PartialEq)]
pub struct Component {
    id: String,
    name: String,
    stat_map: StatMap,
    rarity: i32,
    tags: BTreeSet<String>,
}

impl Component {
    /// An empty component: no stats, no tags, rarity 0.
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: DEFAULT_NAME.to_string(),
            stat_map: StatMap::new(),
            rarity: 0,
            tags: BTreeSet::new(),
        }
    }

    /// Build a component from a document.
    ///
    /// Shape: `{name, stats, rarity, tags}`, every field optional with an
    /// empty/zero default. A present field of the wrong type fails the
    /// whole document.
    pub fn from_document(id: &str, doc: &Value) -> Result<Self, LoadError> {
        let obj = document::as_object(doc)?;
        let mut component = Component::new(id);
        component.apply_document(obj)?;
        Ok(component)
    }

    /// Shared field extraction for components and item bases.
    fn apply_document(&mut self, obj: &DocObject) -> Result<(), LoadError> {
        if let Some(name) = document::opt_str_field(obj, "name")? {
            self.name = name.to_string();
        }
        if let Some(stats) = document::opt_object_field(obj, "stats")? {
            self.stat_map = StatMap::from_document(stats)?;
        }
        if let Some(rarity) = document::opt_int_field(obj, "rarity")? {
            self.rarity = rarity as i32;
        }
        if let Some(tags) = document::opt_array_field(obj, "tags")? {
            self.tags = document::string_array(tags, "tags")?.into_iter().collect();
        }
        Ok(())
    }

    /// The id this component is cataloged under (its path within the
    /// catalog directory).
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stat_map(&self) -> &StatMap {
        &self.stat_map
    }

    pub fn rarity(&self) -> i32 {
        self.rarity
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// True if every tag in the list is present.
    pub fn has_tags(&self, tags: &[String]) -> bool {
        tags.iter().all(|t| self.tags.contains(t))
    }
}

/// A predicate over a component's tag set: passes iff every required tag
/// is present. The empty requirement passes everything.
///
/// # Examples
///
/// ```rust
/// use gearcalc::{Component, TagRequirement};
/// use serde_json::json;
///
/// let wood = Component::from_document("materials/oak", &json!({
///     "name": "Oak",
///     "tags": ["wood", "flammable"],
/// }))
/// .unwrap();
///
/// assert!(TagRequirement::empty().passes(&wood));
/// assert!(TagRequirement::new(vec!["flammable".into()]).passes(&wood));
/// assert!(!TagRequirement::new(vec!["metal".into()]).passes(&wood));
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TagRequirement {
    required: Vec<String>,
}

impl TagRequirement {
    pub fn new(required: Vec<String>) -> Self {
        Self { required }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_document(items: &[Value], field: &str) -> Result<Self, LoadError> {
        Ok(Self::new(document::string_array(items, field)?))
    }

    pub fn required_tags(&self) -> &[String] {
        &self.required
    }

    /// Universal containment check; short-circuits on the first missing
    /// tag.
    pub fn passes(&self, component: &Component) -> bool {
        self.required.iter().all(|tag| component.has_tag(tag))
    }
}

impl fmt::Display for TagRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.required.join(", "))
    }
}

/// A component specialized with composition rules for building items.
///
/// `material_reqs` gates one material slot each; `default_materials` names
/// the fallback material id per slot. The slot count is the length of
/// `default_materials`; a slot without a matching requirement entry is
/// ungated.
#[derive(Debug, PartialEq)]
pub struct ItemBase {
    component: Component,
    prefix_reqs: TagRequirement,
    material_reqs: Vec<TagRequirement>,
    default_materials: Vec<String>,
}

impl ItemBase {
    /// Build an item base from a document: the component shape plus
    /// `prefixRequirements` (tag list), `materialRequirements` (one tag
    /// list per slot), and `defaultMaterials` (one material id per slot).
    /// All optional; a missing gate is an empty requirement.
    pub fn from_document(id: &str, doc: &Value) -> Result<Self, LoadError> {
        let obj = document::as_object(doc)?;
        let mut component = Component::new(id);
        component.apply_document(obj)?;

        let prefix_reqs = match document::opt_array_field(obj, "prefixRequirements")? {
            Some(items) => TagRequirement::from_document(items, "prefixRequirements")?,
            None => TagRequirement::empty(),
        };

        let mut material_reqs = Vec::new();
        if let Some(slots) = document::opt_array_field(obj, "materialRequirements")? {
            for slot in slots {
                match slot {
                    Value::Array(items) => {
                        material_reqs
                            .push(TagRequirement::from_document(items, "materialRequirements")?);
                    }
                    _ => {
                        return Err(LoadError::field_type(
                            "materialRequirements",
                            "an array of tag lists",
                        ))
                    }
                }
            }
        }

        let default_materials = match document::opt_array_field(obj, "defaultMaterials")? {
            Some(items) => document::string_array(items, "defaultMaterials")?,
            None => Vec::new(),
        };

        Ok(Self {
            component,
            prefix_reqs,
            material_reqs,
            default_materials,
        })
    }

    pub fn component(&self) -> &Component {
        &self.component
    }

    pub fn id(&self) -> &str {
        self.component.id()
    }

    pub fn name(&self) -> &str {
        self.component.name()
    }

    pub fn stat_map(&self) -> &StatMap {
        self.component.stat_map()
    }

    pub fn rarity(&self) -> i32 {
        self.component.rarity()
    }

    /// The gate every prefix must pass.
    pub fn prefix_reqs(&self) -> &TagRequirement {
        &self.prefix_reqs
    }

    /// The gate for one material slot. Slots without an entry are ungated.
    pub fn material_req(&self, slot: usize) -> &TagRequirement {
        static EMPTY: TagRequirement = TagRequirement {
            required: Vec::new(),
        };
        self.material_reqs.get(slot).unwrap_or(&EMPTY)
    }

    pub fn material_reqs(&self) -> &[TagRequirement] {
        &self.material_reqs
    }

    /// Fallback material ids, one per slot.
    pub fn default_materials(&self) -> &[String] {
        &self.default_materials
    }

    /// How many material slots this base has.
    pub fn material_slots(&self) -> usize {
        self.default_materials.len()
    }
}
