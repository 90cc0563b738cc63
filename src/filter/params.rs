//! Parameter storage and collision-free naming.

use std::collections::HashMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::render::is_name_char;
use super::value::FilterValue;

/// Ordered mapping from parameter name to value.
///
/// Serializes as a map in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Params {
    entries: Vec<(String, FilterValue)>,
    /// Position of each name in `entries`.
    index: HashMap<String, usize>,
}

impl PartialEq for Params {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&FilterValue> {
        self.index.get(name).map(|&pos| &self.entries[pos].1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Insert or replace a value, returning the previous one.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<FilterValue>,
    ) -> Option<FilterValue> {
        let name = name.into();
        let value = value.into();
        match self.index.get(&name) {
            Some(&pos) => Some(std::mem::replace(&mut self.entries[pos].1, value)),
            None => {
                self.push(name, value);
                None
            }
        }
    }

    fn push(&mut self, name: String, value: FilterValue) {
        self.index.insert(name.clone(), self.entries.len());
        self.entries.push((name, value));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: Into<FilterValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (name, value) in iter {
            params.insert(name, value);
        }
        params
    }
}

impl Serialize for Params {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

struct ParamsVisitor;

impl<'de> Visitor<'de> for ParamsVisitor {
    type Value = Params;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of parameter names to values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Params, A::Error> {
        let mut params = Params::new();
        while let Some((name, value)) = access.next_entry::<String, FilterValue>()? {
            params.insert(name, value);
        }
        Ok(params)
    }
}

impl<'de> Deserialize<'de> for Params {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ParamsVisitor)
    }
}

/// Occurrence counters plus the values saved under generated names.
///
/// Names are `<field path><occurrence>`, with a 1-based occurrence count per
/// path. A name already taken by another path (`age1` once and `age` eleven
/// times both produce `age11`) advances the count until a free name is found.
/// Characters a placeholder name cannot hold (braces, quotes, whitespace) are
/// replaced with `_`.
#[derive(Debug, Default)]
pub struct ParamStore {
    counters: HashMap<String, usize>,
    params: Params,
}

impl ParamStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment and return the occurrence count of `path`.
    pub fn record_occurrence(&mut self, path: &str) -> usize {
        let count = self.counters.entry(path.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    /// Store `value` under a fresh name derived from `path` and return the name.
    pub fn save(&mut self, path: &str, value: FilterValue) -> String {
        let base: String = path
            .chars()
            .map(|c| if is_name_char(c) { c } else { '_' })
            .collect();
        loop {
            let count = self.record_occurrence(path);
            let name = format!("{base}{count}");
            if self.params.contains(&name) {
                tracing::debug!("Params: {} already taken, advancing count for {}", name, path);
                continue;
            }
            tracing::trace!("Params: saved {}", name);
            self.params.push(name.clone(), value);
            return name;
        }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn into_params(self) -> Params {
        self.params
    }
}
