//! # gearcalc - Data-Driven Rules Engine for Tabletop Item Calculators
//!
//! A rules engine for tabletop RPG item and character calculators:
//! - **Data-driven** — worlds, components, and characters are plain JSON
//!   catalogs; no stat name or formula is built in
//! - **Composable** — items are an item base plus tag-gated prefixes and
//!   materials, with name, rarity, and stats derived automatically
//! - **Formula-based** — stat values are infix formulas compiled once and
//!   evaluated against sibling stats by name
//!
//! ## Core Concepts
//!
//! ### Composition Pipeline
//!
//! ```text
//! [ItemBase] + [prefixes] + [materials] → [Item] → [Character stats]
//! ```
//!
//! 1. An **item base** defines the skeleton: base stats, which prefixes it
//!    accepts, and one gated slot per default material
//! 2. **Materials** fill slots and strengthen stats the base already has
//! 3. **Prefixes** merge in freely and may introduce new stats
//! 4. **Characters** fold equipped items into the world's character base
//!    stats, then evaluate every formula
//!
//! ### Key Features
//!
//! - **Tag gates**: prefix and material candidates are validated against
//!   the base's tag requirements, with per-slot catalog defaults
//! - **Stat algebra**: `merge_map` grows a stat map, `add_map` only
//!   strengthens existing keys
//! - **Cross-referencing formulas**: `"strength * 2 + 1"` reads sibling
//!   stats by name at evaluation time
//! - **Incremental loading**: polled, cancellable loaders that skip bad
//!   documents instead of failing the catalog
//!
//! ## Example
//!
//! ```rust
//! use gearcalc::{Component, ItemBase, World};
//! use serde_json::json;
//! use std::collections::BTreeMap;
//! use std::sync::Arc;
//!
//! let sword = Arc::new(ItemBase::from_document("sword", &json!({
//!     "name": "sword", "rarity": 1, "stats": {"damage": "3"},
//! })).unwrap());
//! let flaming = Arc::new(Component::from_document("flaming", &json!({
//!     "name": "flaming", "rarity": 2, "stats": {"damage": "+2"},
//! })).unwrap());
//!
//! let mut item_bases = BTreeMap::new();
//! item_bases.insert("sword".to_string(), sword.clone());
//! let world = World::with_catalogs("demo", BTreeMap::new(), BTreeMap::new(), item_bases);
//!
//! let item = world.make_custom_item(vec![flaming], vec![], sword);
//! assert_eq!(item.name(), "flaming sword");
//! assert_eq!(item.rarity(), 3);
//! ```
//!
//! ## Modules
//!
//! - [`expr`] - Formula compiler and evaluator
//! - [`stat`] / [`stat_map`] - Stat values and the combination algebra
//! - [`range`] - Inclusive integer ranges (dice-style bounds)
//! - [`component`] - Components, item bases, and tag requirements
//! - [`item`] - Item composition
//! - [`bag`] - Insertion-ordered multiset for item collections
//! - [`world`] - Catalogs and world rules
//! - [`character`] - Characters and derived stats
//! - [`loader`] - Incremental catalog and world loading
//! - [`error`] - Error types

pub mod bag;
pub mod character;
pub mod component;
pub mod document;
pub mod error;
pub mod expr;
pub mod item;
pub mod loader;
pub mod range;
pub mod stat;
pub mod stat_map;
pub mod world;

// Re-export main types for convenience
pub use bag::Bag;
pub use character::Character;
pub use component::{Component, ItemBase, TagRequirement};
pub use error::{ExprError, LoadError};
pub use expr::{compile, Expression};
pub use item::Item;
pub use loader::{CatalogLoader, FromDocument, WorldLoader};
pub use range::Range;
pub use stat::Stat;
pub use stat_map::StatMap;
pub use world::{RarityBand, Rgb, World};
