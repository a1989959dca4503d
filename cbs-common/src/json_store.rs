//! Whole-file JSON persistence
//!
//! Every store in CBS is a single JSON document that is loaded in full,
//! mutated in memory and written back in full. Writes go to a sibling
//! `.tmp` file which is then renamed over the target, so a crash mid-write
//! leaves either the old or the new file, never a torn one.
//!
//! Loads never fail hard: a corrupted mapping is salvaged entry by entry
//! up to the first malformed byte, and anything unreadable degrades to an
//! empty mapping.

use crate::Result;
use serde::de::{DeserializeOwned, DeserializeSeed, IgnoredAny, MapAccess, Visitor};
use serde::{Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Serialize `value` as pretty JSON and atomically replace `path`
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut content = serde_json::to_string_pretty(value)?;
    content.push('\n');
    write_atomic(path, content.as_bytes())
}

/// Write `content` to a sibling `.tmp` file, then rename it over `path`
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let temp_path = temp_path_for(path);
    std::fs::write(&temp_path, content)?;
    if let Err(e) = std::fs::rename(&temp_path, path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(e.into());
    }

    debug!("Wrote {}", path.display());
    Ok(())
}

/// Load a JSON object of `key → V`, salvaging what it can
///
/// - missing file → empty map
/// - unreadable file → empty map (warning)
/// - malformed JSON → every complete entry before the first error
pub fn load_map_lenient<V: DeserializeOwned>(path: &Path) -> BTreeMap<String, V> {
    if !path.exists() {
        return BTreeMap::new();
    }

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Error reading {}: {}", path.display(), e);
            return BTreeMap::new();
        }
    };

    match serde_json::from_str::<BTreeMap<String, V>>(&content) {
        Ok(map) => map,
        Err(e) => {
            warn!(
                "JSON parse error in {}: {}. Attempting to recover...",
                path.display(),
                e
            );
            let recovered = salvage_map_prefix::<V>(&content);
            if recovered.is_empty() {
                error!(
                    "Could not recover {}. File may be severely corrupted.",
                    path.display()
                );
            } else {
                info!(
                    "Recovered {} entries from corrupted {}",
                    recovered.len(),
                    path.display()
                );
            }
            recovered
        }
    }
}

/// Load the object stored under `field` of a top-level JSON object as raw
/// values, salvaging what it can
///
/// - missing file, missing field or non-object field → empty map
/// - malformed JSON → every complete entry of `field` before the first error
///
/// Values are left undecoded so callers can drop bad entries one by one.
pub fn load_field_map_lenient(path: &Path, field: &str) -> BTreeMap<String, Value> {
    if !path.exists() {
        return BTreeMap::new();
    }

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Error reading {}: {}", path.display(), e);
            return BTreeMap::new();
        }
    };

    match serde_json::from_str::<Value>(&content) {
        Ok(Value::Object(mut root)) => match root.remove(field) {
            Some(Value::Object(entries)) => entries.into_iter().collect(),
            Some(other) => {
                warn!(
                    "Ignoring `{}` in {}: expected an object, got {}",
                    field,
                    path.display(),
                    other
                );
                BTreeMap::new()
            }
            None => BTreeMap::new(),
        },
        Ok(_) => {
            warn!("Ignoring {}: not a JSON object", path.display());
            BTreeMap::new()
        }
        Err(e) => {
            warn!(
                "JSON parse error in {}: {}. Attempting to recover...",
                path.display(),
                e
            );
            let recovered = salvage_field_prefix(&content, field);
            if recovered.is_empty() {
                error!("Could not recover {}", path.display());
            } else {
                info!(
                    "Recovered {} entries from corrupted {}",
                    recovered.len(),
                    path.display()
                );
            }
            recovered
        }
    }
}

/// Parse as many leading `key: value` pairs of a top-level object as are
/// well-formed
pub fn salvage_map_prefix<V: DeserializeOwned>(content: &str) -> BTreeMap<String, V> {
    let mut recovered = BTreeMap::new();
    let mut deserializer = serde_json::Deserializer::from_str(content);
    // The error (if any) is the corruption itself; entries collected before
    // it are already in `recovered`.
    let _ = (&mut deserializer).deserialize_map(PrefixVisitor { out: &mut recovered });
    recovered
}

/// Like [`salvage_map_prefix`], for the object nested under `field`
pub fn salvage_field_prefix(content: &str, field: &str) -> BTreeMap<String, Value> {
    let mut recovered = BTreeMap::new();
    let mut deserializer = serde_json::Deserializer::from_str(content);
    let _ = (&mut deserializer).deserialize_map(FieldVisitor {
        field,
        out: &mut recovered,
    });
    recovered
}

struct FieldVisitor<'a> {
    field: &'a str,
    out: &'a mut BTreeMap<String, Value>,
}

impl<'de, 'a> Visitor<'de> for FieldVisitor<'a> {
    type Value = ();

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a JSON object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<(), A::Error> {
        while let Some(key) = access.next_key::<String>()? {
            if key == self.field {
                access.next_value_seed(PrefixSeed {
                    out: &mut *self.out,
                })?;
            } else {
                access.next_value::<IgnoredAny>()?;
            }
        }
        Ok(())
    }
}

struct PrefixSeed<'a, V> {
    out: &'a mut BTreeMap<String, V>,
}

impl<'de, 'a, V: DeserializeOwned> DeserializeSeed<'de> for PrefixSeed<'a, V> {
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> std::result::Result<(), D::Error> {
        deserializer.deserialize_map(PrefixVisitor { out: self.out })
    }
}

struct PrefixVisitor<'a, V> {
    out: &'a mut BTreeMap<String, V>,
}

impl<'de, 'a, V: DeserializeOwned> Visitor<'de> for PrefixVisitor<'a, V> {
    type Value = ();

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a JSON object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<(), A::Error> {
        while let Some((key, value)) = access.next_entry::<String, V>()? {
            self.out.insert(key, value);
        }
        Ok(())
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
