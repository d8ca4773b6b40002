//! Hierarchical key-value document addressed by dotted paths
//!
//! A [`Document`] is the in-memory tree behind a config file. Nested maps
//! are sections; `a.b.c` walks two sections and reads key `c`.

mod file;
mod format;

pub use file::{ConfigFile, FileOptions, VERSION_KEY};
pub use format::ConfigFormat;

use crate::error::{Result, StorageError};
use crate::translator::{location_from_map, location_to_map, AnyWorld};
use crate::value::{StorageValue, Value};
use tracing::warn;
use util::Location;

/// Separator between the sections of a path.
pub const PATH_SEPARATOR: char = '.';

#[derive(Debug, Clone)]
pub struct Document {
    root: Vec<(Value, Value)>,
    writes: u64,
}

impl Document {
    pub fn new() -> Self {
        Self {
            root: Vec::new(),
            writes: 0,
        }
    }

    /// Document holding the entries of `value`, or an empty one if it is not a map.
    pub fn from_value(value: Value) -> Self {
        let root = match value {
            Value::Map(entries) => entries,
            _ => Vec::new(),
        };
        Self { root, writes: 0 }
    }

    pub fn to_value(&self) -> Value {
        Value::Map(self.root.clone())
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Number of mutations applied since the document was created.
    pub fn write_count(&self) -> u64 {
        self.writes
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split(PATH_SEPARATOR);
        let first = segments.next()?;
        let mut current = lookup(&self.root, first)?;
        for segment in segments {
            current = lookup(current.as_map()?, segment)?;
        }
        Some(current)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Writes `value` at `path`, creating sections on the way.
    ///
    /// Setting [`Value::Null`] removes the path.
    pub fn set(&mut self, path: &str, value: Value) -> Result<()> {
        let segments = split_path(path)?;
        self.writes += 1;
        if value.is_null() {
            remove_at(&mut self.root, &segments);
            return Ok(());
        }

        insert_at(&mut self.root, &segments, value);
        Ok(())
    }

    pub fn remove(&mut self, path: &str) -> Option<Value> {
        let segments = split_path(path).ok()?;
        let removed = remove_at(&mut self.root, &segments);
        if removed.is_some() {
            self.writes += 1;
        }
        removed
    }

    /// The section at `path`, if the path holds one.
    pub fn get_section(&self, path: &str) -> Option<&Value> {
        self.get(path).filter(|value| value.is_map())
    }

    /// Entries of the section at `path`, empty when there is none.
    pub fn get_map(&self, path: &str) -> Vec<(Value, Value)> {
        self.get_section(path)
            .and_then(Value::as_map)
            .map(<[_]>::to_vec)
            .unwrap_or_default()
    }

    pub fn get_list(&self, path: &str) -> Option<&[Value]> {
        self.get(path).and_then(Value::as_list)
    }

    /// Elements of the list at `path` that convert to `T`. Others are skipped.
    pub fn get_list_of<T: StorageValue>(&self, path: &str) -> Vec<T> {
        self.get_list(path)
            .unwrap_or_default()
            .iter()
            .filter_map(|value| T::from_value(value.clone()).ok())
            .collect()
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    pub fn get_i64(&self, path: &str) -> Option<i64> {
        self.get(path).and_then(Value::as_i64)
    }

    /// Keys of the root section. With `deep`, every nested path as well.
    pub fn keys(&self, deep: bool) -> Vec<String> {
        let mut keys = Vec::new();
        collect_keys(&self.root, "", deep, &mut keys);
        keys
    }

    /// Reads a location stored as a section of coordinates.
    pub fn get_location(&self, path: &str) -> Option<Location> {
        let section = self.get_section(path)?;
        match section.get("world").map(Value::to_string) {
            Some(world) if !world.is_empty() => Some(location_from_map(section, &AnyWorld)),
            _ => {
                warn!(path, "World name was not found");
                None
            }
        }
    }

    pub fn set_location(&mut self, path: &str, location: &Location) -> Result<()> {
        self.set(path, location_to_map(location, &AnyWorld))
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

fn split_path(path: &str) -> Result<Vec<&str>> {
    let segments: Vec<&str> = path.split(PATH_SEPARATOR).collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(StorageError::InvalidPath(format!("'{path}' has an empty section")));
    }
    Ok(segments)
}

fn lookup<'a>(entries: &'a [(Value, Value)], key: &str) -> Option<&'a Value> {
    entries
        .iter()
        .find(|(candidate, _)| key_matches(candidate, key))
        .map(|(_, value)| value)
}

/// Keys read from files are strings, keys written by callers may not be.
fn key_matches(candidate: &Value, key: &str) -> bool {
    match candidate {
        Value::String(candidate) => candidate == key,
        other => other.to_string() == key,
    }
}

/// Inserts below `segments`, replacing any non-section value on the way.
fn insert_at(entries: &mut Vec<(Value, Value)>, segments: &[&str], value: Value) {
    let Some((first, rest)) = segments.split_first() else {
        return;
    };
    let position = entries
        .iter()
        .position(|(candidate, _)| key_matches(candidate, first));
    if rest.is_empty() {
        match position {
            Some(index) => entries[index].1 = value,
            None => entries.push((Value::from(*first), value)),
        }
        return;
    }

    let index = match position {
        Some(index) => index,
        None => {
            entries.push((Value::from(*first), Value::Map(Vec::new())));
            entries.len() - 1
        }
    };
    let slot = &mut entries[index].1;
    if let Value::Map(section) = &mut *slot {
        insert_at(section, rest, value);
    } else {
        let mut section = Vec::new();
        insert_at(&mut section, rest, value);
        *slot = Value::Map(section);
    }
}

fn remove_at(entries: &mut Vec<(Value, Value)>, segments: &[&str]) -> Option<Value> {
    let (first, rest) = segments.split_first()?;
    let index = entries
        .iter()
        .position(|(candidate, _)| key_matches(candidate, first))?;
    if rest.is_empty() {
        return Some(entries.remove(index).1);
    }
    match &mut entries[index].1 {
        Value::Map(section) => remove_at(section, rest),
        _ => None,
    }
}

fn collect_keys(entries: &[(Value, Value)], prefix: &str, deep: bool, keys: &mut Vec<String>) {
    for (key, value) in entries {
        let path = if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{prefix}{PATH_SEPARATOR}{key}")
        };
        keys.push(path.clone());
        if deep {
            if let Value::Map(section) = value {
                collect_keys(section, &path, deep, keys);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_creates_sections() {
        let mut document = Document::new();
        document.set("net.retries", Value::Int(3)).unwrap();

        assert_eq!(document.get("net.retries"), Some(&Value::Int(3)));
        assert!(document.get_section("net").is_some());
        assert!(document.contains("net"));
        assert!(!document.contains("net.timeout"));
    }

    #[test]
    fn test_set_null_removes() {
        let mut document = Document::new();
        document.set("a.b", Value::Int(1)).unwrap();
        document.set("a.b", Value::Null).unwrap();

        assert!(!document.contains("a.b"));
        assert!(document.contains("a"));
        assert_eq!(document.write_count(), 2);
    }

    #[test]
    fn test_set_replaces_scalar_with_section() {
        let mut document = Document::new();
        document.set("a", Value::Int(1)).unwrap();
        document.set("a.b", Value::Int(2)).unwrap();

        assert_eq!(document.get_i64("a.b"), Some(2));
    }

    #[test]
    fn test_invalid_paths() {
        let mut document = Document::new();
        assert!(matches!(document.set("", Value::Int(1)), Err(StorageError::InvalidPath(_))));
        assert!(matches!(document.set("a..b", Value::Int(1)), Err(StorageError::InvalidPath(_))));
        assert_eq!(document.get(""), None);
        assert_eq!(document.write_count(), 0);
    }

    #[test]
    fn test_get_map_and_lists() {
        let mut document = Document::new();
        document.set("users.alice", Value::from("1")).unwrap();
        document
            .set("tags", Value::List(vec![Value::from("x"), Value::Int(2), Value::from("y")]))
            .unwrap();

        assert_eq!(document.get_map("users"), vec![(Value::from("alice"), Value::from("1"))]);
        assert!(document.get_map("missing").is_empty());
        assert_eq!(document.get_list_of::<String>("tags"), vec!["x", "y"]);
        assert!(document.get_list_of::<String>("missing").is_empty());
    }

    #[test]
    fn test_keys() {
        let mut document = Document::new();
        document.set("a.b", Value::Int(1)).unwrap();
        document.set("c", Value::Int(2)).unwrap();

        assert_eq!(document.keys(false), vec!["a", "c"]);
        assert_eq!(document.keys(true), vec!["a", "a.b", "c"]);
    }

    #[test]
    fn test_location_helpers() {
        let mut document = Document::new();
        let spawn = Location::new(Some("world".into()), 10.5, 64.0, -2.0, 180.0, 15.0);
        document.set_location("spawn", &spawn).unwrap();

        assert_eq!(document.get_location("spawn"), Some(spawn));

        document.remove("spawn.world");
        assert_eq!(document.get_location("spawn"), None);
    }
}
