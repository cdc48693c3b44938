//! Ordered, key-unique collections of stats.
//!
//! A [`StatMap`] keys stats by name in natural string order. The two
//! combination operations are deliberately asymmetric:
//!
//! - [`merge_map`](StatMap::merge_map) folds every entry of the other map
//!   in, growing the receiver with new keys;
//! - [`add_map`](StatMap::add_map) merges only keys the receiver already
//!   has — it never grows.
//!
//! Item composition relies on that asymmetry: materials are `add_map`ed
//! against the item's stats (they can strengthen what exists but not
//! introduce anything), while prefixes are `merge_map`ed (they can).

use crate::document::DocObject;
use crate::error::LoadError;
use crate::stat::Stat;
use std::collections::BTreeMap;

/// An ordered map of stat name to [`Stat`].
///
/// # Examples
///
/// ```rust
/// use gearcalc::{Stat, StatMap};
/// use serde_json::json;
///
/// let mut weapon = StatMap::new();
/// weapon.put("damage", Stat::from_document(&json!("3")).unwrap());
///
/// let mut enchant = StatMap::new();
/// enchant.put("damage", Stat::from_document(&json!("+2")).unwrap());
/// enchant.put("glow", Stat::from_document(&json!("1")).unwrap());
///
/// // add_map never grows the receiver...
/// weapon.add_map(&enchant);
/// assert!(weapon.get("glow").is_none());
/// // ...merge_map does.
/// weapon.merge_map(&enchant);
/// assert!(weapon.get("glow").is_some());
/// assert_eq!(weapon.get("damage").unwrap().expression().unwrap().value(), 7.0);
/// ```
#[derive(Debug, Default, PartialEq)]
pub struct StatMap {
    stats: BTreeMap<String, Stat>,
}

impl StatMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from a document object: every entry is a stat name
    /// mapped to a stat-spec (see [`Stat::from_document`]).
    pub fn from_document(obj: &DocObject) -> Result<Self, LoadError> {
        let mut map = StatMap::new();
        for (name, spec) in obj {
            map.stats.insert(name.clone(), Stat::from_document(spec)?);
        }
        Ok(map)
    }

    pub fn clear(&mut self) {
        self.stats.clear();
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Stat> {
        self.stats.get(name)
    }

    /// Iterate in natural key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Stat)> {
        self.stats.iter()
    }

    /// Insert, overwriting any existing stat under the name.
    pub fn put(&mut self, name: &str, stat: Stat) {
        self.stats.insert(name.to_string(), stat);
    }

    /// Merge into the existing stat under the name, or insert a copy.
    pub fn add_put(&mut self, name: &str, stat: &Stat) {
        match self.stats.get_mut(name) {
            Some(existing) => existing.merge(stat),
            None => {
                self.stats.insert(name.to_string(), stat.copy());
            }
        }
    }

    /// Merge the other map's like-named stats into this one. Keys unique
    /// to `other` are ignored; the receiver's key set never changes.
    pub fn add_map(&mut self, other: &StatMap) {
        for (name, stat) in &mut self.stats {
            if let Some(other_stat) = other.stats.get(name) {
                stat.merge(other_stat);
            }
        }
    }

    /// Fold every entry of the other map into this one, growing the
    /// receiver with keys it did not have.
    pub fn merge_map(&mut self, other: &StatMap) {
        for (name, stat) in &other.stats {
            self.add_put(name, stat);
        }
    }

    /// Deep copy.
    pub fn copy(&self) -> Self {
        let mut out = StatMap::new();
        for (name, stat) in &self.stats {
            out.stats.insert(name.clone(), stat.copy());
        }
        out
    }

    /// `name: value` display lines, in key order.
    pub fn to_display_strings(&self) -> Vec<String> {
        self.stats
            .iter()
            .map(|(name, stat)| format!("{}: {}", name, stat))
            .collect()
    }

    /// Evaluate every embedded expression, resolving cross-references
    /// between stats by name.
    ///
    /// Ordering is a single-pass heuristic, not a dependency graph: stats
    /// without expressions are unaffected, constant expressions come
    /// before variable ones, and ties keep key order. Each variable
    /// program is evaluated against a snapshot holding every expression's
    /// current value, updated as evaluation proceeds — so a program that
    /// references a variable-expression stat evaluated later in the order
    /// reads that stat's stale (initially zero) cached value. That is
    /// long-standing observable behavior, kept as is.
    pub fn evaluate_expressions(&mut self) {
        // The stable no-expression < constant < variable sort reduces to
        // this: constants hold their value without a pass of their own, so
        // only variable programs run, in key order among themselves.
        let eval_order: Vec<String> = self
            .stats
            .iter()
            .filter(|(_, stat)| stat.expression().is_some_and(|e| !e.is_constant()))
            .map(|(name, _)| name.clone())
            .collect();

        let mut values: BTreeMap<String, f64> = self
            .stats
            .iter()
            .filter_map(|(name, stat)| stat.expression().map(|e| (name.clone(), e.value())))
            .collect();

        for name in eval_order {
            if let Some(exp) = self.stats.get_mut(&name).and_then(Stat::expression_mut) {
                let result = exp.evaluate(&values);
                values.insert(name, result);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stat(spec: serde_json::Value) -> Stat {
        Stat::from_document(&spec).unwrap()
    }

    #[test]
    fn test_put_overwrites() {
        let mut map = StatMap::new();
        map.put("hp", stat(json!("10")));
        map.put("hp", stat(json!("20")));
        assert_eq!(map.get("hp").unwrap().expression().unwrap().value(), 20.0);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_add_put_merges_or_inserts() {
        let mut map = StatMap::new();
        let bonus = stat(json!("2"));
        map.add_put("hp", &bonus);
        map.add_put("hp", &bonus);
        assert_eq!(map.get("hp").unwrap().expression().unwrap().value(), 4.0);
    }

    #[test]
    fn test_add_map_never_grows() {
        let mut a = StatMap::new();
        a.put("damage", stat(json!("3")));

        let mut b = StatMap::new();
        b.put("damage", stat(json!("1")));
        b.put("armor", stat(json!("5")));

        a.add_map(&b);
        assert_eq!(a.len(), 1);
        assert!(a.get("armor").is_none());
        assert_eq!(a.get("damage").unwrap().expression().unwrap().value(), 4.0);
    }

    #[test]
    fn test_merge_map_grows() {
        let mut a = StatMap::new();
        a.put("damage", stat(json!("3")));

        let mut b = StatMap::new();
        b.put("armor", stat(json!("5")));

        a.merge_map(&b);
        assert_eq!(a.len(), 2);
        assert_eq!(a.get("armor").unwrap().expression().unwrap().value(), 5.0);
    }

    #[test]
    fn test_merge_empty_is_identity() {
        let mut a = StatMap::new();
        a.put("damage", stat(json!({"range": [1, 6], "strings": ["piercing"]})));
        let before = a.copy();
        a.merge_map(&StatMap::new());
        assert_eq!(a, before);
    }

    #[test]
    fn test_merge_map_pointwise() {
        // Folding B then C into A matches folding a pre-combined B+C.
        let mut b = StatMap::new();
        b.put("x", stat(json!("1")));
        b.put("y", stat(json!({"range": [1, 2]})));
        let mut c = StatMap::new();
        c.put("x", stat(json!("2")));
        c.put("y", stat(json!({"range": [3, 4]})));

        let mut separately = StatMap::new();
        separately.merge_map(&b);
        separately.merge_map(&c);

        let mut combined = b.copy();
        combined.merge_map(&c);
        let mut at_once = StatMap::new();
        at_once.merge_map(&combined);

        assert_eq!(separately, at_once);
    }

    #[test]
    fn test_iteration_is_key_ordered() {
        let mut map = StatMap::new();
        map.put("zeta", Stat::new());
        map.put("alpha", Stat::new());
        let names: Vec<&String> = map.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["alpha", "zeta"]);
    }

    #[test]
    fn test_evaluate_resolves_references_to_constants() {
        let mut map = StatMap::new();
        map.put("strength", stat(json!("4")));
        map.put("attack", stat(json!("strength * 2")));
        map.evaluate_expressions();
        assert_eq!(map.get("attack").unwrap().expression().unwrap().value(), 8.0);
    }

    #[test]
    fn test_evaluate_forward_reference_to_constant() {
        // "attack" references "strength" even though strength sorts later;
        // constants are visible regardless of position.
        let mut map = StatMap::new();
        map.put("attack", stat(json!("strength + 1")));
        map.put("strength", stat(json!("2")));
        map.evaluate_expressions();
        assert_eq!(map.get("attack").unwrap().expression().unwrap().value(), 3.0);
    }

    #[test]
    fn test_evaluate_variable_chain_in_key_order() {
        // Both are variable expressions; ties keep key order, so "a"
        // evaluates first and "b" sees its fresh value.
        let mut map = StatMap::new();
        map.put("a", stat(json!("base + 1")));
        map.put("b", stat(json!("a * 2")));
        map.put("base", stat(json!("10")));
        map.evaluate_expressions();
        assert_eq!(map.get("a").unwrap().expression().unwrap().value(), 11.0);
        assert_eq!(map.get("b").unwrap().expression().unwrap().value(), 22.0);
    }

    #[test]
    fn test_variable_chain_reads_stale_value() {
        // The order is a heuristic, not a dependency sort: "early"
        // references "late", but "late" (also a variable expression)
        // evaluates after it, so "early" reads late's initial 0. Pinned
        // deliberately; do not "fix" by switching to a topological order.
        let mut map = StatMap::new();
        map.put("early", stat(json!("late + 1")));
        map.put("late", stat(json!("base + 5")));
        map.put("base", stat(json!("10")));
        map.evaluate_expressions();
        assert_eq!(map.get("early").unwrap().expression().unwrap().value(), 1.0);
        assert_eq!(map.get("late").unwrap().expression().unwrap().value(), 15.0);

        // A second pass sees the now-cached value.
        map.evaluate_expressions();
        assert_eq!(map.get("early").unwrap().expression().unwrap().value(), 16.0);
    }

    #[test]
    fn test_missing_reference_reads_zero() {
        let mut map = StatMap::new();
        map.put("attack", stat(json!("nonsense + 2")));
        map.evaluate_expressions();
        assert_eq!(map.get("attack").unwrap().expression().unwrap().value(), 2.0);
    }

    #[test]
    fn test_from_document() {
        let doc = json!({
            "damage": "3",
            "armor": {"range": [1, 4]},
        });
        let map = StatMap::from_document(doc.as_object().unwrap()).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("damage").unwrap().expression().unwrap().value(), 3.0);
    }

    #[test]
    fn test_display_strings() {
        let mut map = StatMap::new();
        map.put("damage", stat(json!("3")));
        map.put("armor", stat(json!({"range": [1, 4]})));
        assert_eq!(
            map.to_display_strings(),
            ["armor: [1, 4]", "damage: 3"]
        );
    }
}
