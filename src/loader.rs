//! Incremental, cancellable loading of catalogs and worlds from disk.
//!
//! Both loaders expose the same polled surface: construct against a
//! directory, call `load_next` once per unit of work (one file, one
//! world) until `is_finished`, then take the results. `run` drives the
//! same loop to completion with cooperative cancellation, so a caller on
//! another thread can abandon a load in progress; a cancelled run
//! discards its partial results.
//!
//! Per-document failures are not fatal: a file that fails to read, parse,
//! or validate is logged and skipped, and the rest of the catalog loads.

use crate::character::Character;
use crate::component::{Component, ItemBase};
use crate::error::LoadError;
use crate::world::World;
use serde_json::Value;
use std::collections::{BTreeMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::warn;
use walkdir::WalkDir;

const RULES_FILE: &str = "rules.json";
const PREFIXES_DIR: &str = "prefixes";
const MATERIALS_DIR: &str = "materials";
const ITEM_BASES_DIR: &str = "itemBases";
const CHARACTERS_DIR: &str = "characters";

/// A catalog entry built from one JSON document.
pub trait FromDocument: Sized {
    fn from_document(id: &str, doc: &Value) -> Result<Self, LoadError>;
}

impl FromDocument for Component {
    fn from_document(id: &str, doc: &Value) -> Result<Self, LoadError> {
        Component::from_document(id, doc)
    }
}

impl FromDocument for ItemBase {
    fn from_document(id: &str, doc: &Value) -> Result<Self, LoadError> {
        ItemBase::from_document(id, doc)
    }
}

/// Loads one catalog directory into a `BTreeMap<String, Arc<T>>`, one
/// file per `load_next` call.
///
/// Every `.json` file under the directory (recursively) is one entry; its
/// id is its path relative to the catalog root, extension stripped, with
/// `/` separators. Files are visited in path order.
#[derive(Debug)]
pub struct CatalogLoader<T> {
    root: PathBuf,
    pending: VecDeque<PathBuf>,
    total: usize,
    failed: usize,
    catalog: BTreeMap<String, Arc<T>>,
}

impl<T: FromDocument> CatalogLoader<T> {
    pub fn new(root: &Path) -> Result<Self, LoadError> {
        if !root.is_dir() {
            return Err(LoadError::NotADirectory(root.to_path_buf()));
        }
        let pending: VecDeque<PathBuf> = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| {
                entry.file_type().is_file()
                    && entry.path().extension().is_some_and(|ext| ext == "json")
            })
            .map(|entry| entry.into_path())
            .collect();
        Ok(Self {
            root: root.to_path_buf(),
            total: pending.len(),
            pending,
            failed: 0,
            catalog: BTreeMap::new(),
        })
    }

    /// How many files were discovered.
    pub fn total(&self) -> usize {
        self.total
    }

    /// How many files have been processed (loaded or skipped).
    pub fn processed(&self) -> usize {
        self.total - self.pending.len()
    }

    /// How many files were skipped as unreadable or invalid.
    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn is_finished(&self) -> bool {
        self.pending.is_empty()
    }

    /// Process the next file. Returns false when there is nothing left.
    pub fn load_next(&mut self) -> bool {
        let path = match self.pending.pop_front() {
            Some(path) => path,
            None => return false,
        };
        let id = catalog_id(&self.root, &path);
        match read_document(&path).and_then(|doc| T::from_document(&id, &doc)) {
            Ok(entry) => {
                self.catalog.insert(id, Arc::new(entry));
            }
            Err(err) => {
                self.failed += 1;
                warn!(file = %path.display(), %err, "skipping catalog document");
            }
        }
        true
    }

    /// The catalog loaded so far.
    pub fn into_catalog(self) -> BTreeMap<String, Arc<T>> {
        self.catalog
    }

    /// Drive to completion, checking `cancel` between files. A cancelled
    /// run discards the partial catalog.
    pub fn run(mut self, cancel: &AtomicBool) -> Option<BTreeMap<String, Arc<T>>> {
        while !self.is_finished() {
            if cancel.load(Ordering::Relaxed) {
                return None;
            }
            self.load_next();
        }
        Some(self.catalog)
    }
}

/// Loads every world directory under a root, one world per `load_next`
/// call.
///
/// A world directory is one containing `rules.json` plus the four catalog
/// directories (`prefixes/`, `materials/`, `itemBases/`, `characters/`);
/// anything else under the root is skipped without comment. Within a
/// world the three component catalogs load in parallel; characters load
/// last, against the finished catalogs.
#[derive(Debug)]
pub struct WorldLoader {
    pending: VecDeque<PathBuf>,
    total: usize,
    failed: usize,
    worlds: BTreeMap<String, World>,
}

impl WorldLoader {
    pub fn new(root: &Path) -> Result<Self, LoadError> {
        if !root.is_dir() {
            return Err(LoadError::NotADirectory(root.to_path_buf()));
        }
        let mut dirs: Vec<PathBuf> = fs::read_dir(root)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| is_world_dir(path))
            .collect();
        dirs.sort();
        Ok(Self {
            total: dirs.len(),
            pending: dirs.into(),
            failed: 0,
            worlds: BTreeMap::new(),
        })
    }

    /// How many world directories were discovered.
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn processed(&self) -> usize {
        self.total - self.pending.len()
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn is_finished(&self) -> bool {
        self.pending.is_empty()
    }

    /// Load the next world. Returns false when there is nothing left.
    pub fn load_next(&mut self) -> bool {
        let dir = match self.pending.pop_front() {
            Some(dir) => dir,
            None => return false,
        };
        let file_name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match load_world(&dir, &file_name) {
            Ok(world) => {
                self.worlds.insert(file_name, world);
            }
            Err(err) => {
                self.failed += 1;
                warn!(world = %dir.display(), %err, "skipping world");
            }
        }
        true
    }

    /// The worlds loaded so far.
    pub fn into_worlds(self) -> BTreeMap<String, World> {
        self.worlds
    }

    /// Drive to completion, checking `cancel` between worlds. A cancelled
    /// run discards the partial results.
    pub fn run(mut self, cancel: &AtomicBool) -> Option<BTreeMap<String, World>> {
        while !self.is_finished() {
            if cancel.load(Ordering::Relaxed) {
                return None;
            }
            self.load_next();
        }
        Some(self.worlds)
    }
}

fn is_world_dir(path: &Path) -> bool {
    path.is_dir()
        && path.join(RULES_FILE).is_file()
        && [PREFIXES_DIR, MATERIALS_DIR, ITEM_BASES_DIR, CHARACTERS_DIR]
            .iter()
            .all(|dir| path.join(dir).is_dir())
}

fn load_world(dir: &Path, file_name: &str) -> Result<World, LoadError> {
    let rules = read_document(&dir.join(RULES_FILE))?;

    // The three component catalogs are independent of each other and of
    // the rules; only characters need the assembled world.
    let (prefixes, (materials, item_bases)) = rayon::join(
        || load_catalog::<Component>(&dir.join(PREFIXES_DIR)),
        || {
            rayon::join(
                || load_catalog::<Component>(&dir.join(MATERIALS_DIR)),
                || load_catalog::<ItemBase>(&dir.join(ITEM_BASES_DIR)),
            )
        },
    );

    let mut world = World::from_documents(file_name, &rules, prefixes?, materials?, item_bases?);
    world.set_characters(load_characters(&dir.join(CHARACTERS_DIR), &world)?);
    Ok(world)
}

fn load_catalog<T: FromDocument>(dir: &Path) -> Result<BTreeMap<String, Arc<T>>, LoadError> {
    let mut loader = CatalogLoader::<T>::new(dir)?;
    while loader.load_next() {}
    Ok(loader.into_catalog())
}

fn load_characters(dir: &Path, world: &World) -> Result<BTreeMap<String, Character>, LoadError> {
    if !dir.is_dir() {
        return Err(LoadError::NotADirectory(dir.to_path_buf()));
    }
    let mut characters = BTreeMap::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(_) => continue,
        };
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "json") {
            continue;
        }
        let id = catalog_id(dir, path);
        match read_document(path).and_then(|doc| Character::from_document(&id, &doc, world)) {
            Ok(character) => {
                characters.insert(id, character);
            }
            Err(err) => warn!(file = %path.display(), %err, "skipping character document"),
        }
    }
    Ok(characters)
}

fn read_document(path: &Path) -> Result<Value, LoadError> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Catalog id of a file: path relative to the catalog root, extension
/// stripped, `/`-separated regardless of platform.
fn catalog_id(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path).with_extension("");
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    fn write_json(dir: &Path, rel: &str, contents: &str) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let mut file = File::create(path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
    }

    #[test]
    fn test_catalog_ids_are_relative_paths() {
        let root = Path::new("/data/materials");
        assert_eq!(
            catalog_id(root, Path::new("/data/materials/iron.json")),
            "iron"
        );
        assert_eq!(
            catalog_id(root, Path::new("/data/materials/metals/iron.json")),
            "metals/iron"
        );
    }

    #[test]
    fn test_catalog_loader_recurses_and_counts() {
        let dir = tempfile::tempdir().unwrap();
        write_json(dir.path(), "iron.json", r#"{"name": "Iron"}"#);
        write_json(dir.path(), "woods/oak.json", r#"{"name": "Oak"}"#);
        write_json(dir.path(), "notes.txt", "not a document");

        let mut loader = CatalogLoader::<Component>::new(dir.path()).unwrap();
        assert_eq!(loader.total(), 2);
        while loader.load_next() {}
        assert_eq!(loader.failed(), 0);

        let catalog = loader.into_catalog();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog["woods/oak"].name(), "Oak");
    }

    #[test]
    fn test_catalog_loader_skips_bad_documents() {
        let dir = tempfile::tempdir().unwrap();
        write_json(dir.path(), "good.json", r#"{"name": "Good"}"#);
        write_json(dir.path(), "broken.json", "{ not json");
        write_json(dir.path(), "bad_stat.json", r#"{"stats": {"x": "(2 +"}}"#);

        let mut loader = CatalogLoader::<Component>::new(dir.path()).unwrap();
        while loader.load_next() {}
        assert_eq!(loader.failed(), 2);
        let catalog = loader.into_catalog();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.contains_key("good"));
    }

    #[test]
    fn test_catalog_loader_rejects_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(CatalogLoader::<Component>::new(&missing).is_err());
    }

    #[test]
    fn test_run_cancellation_discards_partial_catalog() {
        let dir = tempfile::tempdir().unwrap();
        write_json(dir.path(), "a.json", r#"{"name": "A"}"#);

        let loader = CatalogLoader::<Component>::new(dir.path()).unwrap();
        let cancelled = AtomicBool::new(true);
        assert!(loader.run(&cancelled).is_none());

        let loader = CatalogLoader::<Component>::new(dir.path()).unwrap();
        let live = AtomicBool::new(false);
        assert_eq!(loader.run(&live).unwrap().len(), 1);
    }
}
