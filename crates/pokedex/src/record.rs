//! Remote record accessors and the extracted summary
//!
//! Every field goes through a get-or-default accessor on [`RemoteRecord`],
//! so a partial or oddly shaped document still yields a [`Summary`].

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Placeholder for absent scalar fields
pub const NOT_AVAILABLE: &str = "N/A";

/// Integer attribute that may be absent from the remote record.
///
/// Serializes as a JSON number, or as `"N/A"` when absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Value(i64),
    NotAvailable,
}

impl Attribute {
    pub fn value(&self) -> Option<i64> {
        match self {
            Attribute::Value(v) => Some(*v),
            Attribute::NotAvailable => None,
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::Value(v) => write!(f, "{}", v),
            Attribute::NotAvailable => f.write_str(NOT_AVAILABLE),
        }
    }
}

impl Serialize for Attribute {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Attribute::Value(v) => serializer.serialize_i64(*v),
            Attribute::NotAvailable => serializer.serialize_str(NOT_AVAILABLE),
        }
    }
}

impl<'de> Deserialize<'de> for Attribute {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Other(Value),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Int(v) => Attribute::Value(v),
            Raw::Other(_) => Attribute::NotAvailable,
        })
    }
}

/// Fixed-shape lookup result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub name: String,
    pub id: Attribute,
    pub height: Attribute,
    pub weight: Attribute,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub abilities: Vec<String>,
    #[serde(default)]
    pub stats: BTreeMap<String, i64>,
    #[serde(default)]
    pub sprite: Option<String>,
}

/// Untyped document fetched from the remote source
#[derive(Debug, Clone)]
pub struct RemoteRecord(Value);

impl RemoteRecord {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn raw(&self) -> &Value {
        &self.0
    }

    /// `name`, capitalized; `"N/A"` when absent or not a string
    pub fn name(&self) -> String {
        self.0
            .get("name")
            .and_then(Value::as_str)
            .map(capitalize)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }

    /// Top-level integer field; `NotAvailable` when absent or not an integer
    pub fn attribute(&self, field: &str) -> Attribute {
        self.0
            .get(field)
            .and_then(Value::as_i64)
            .map_or(Attribute::NotAvailable, Attribute::Value)
    }

    /// `field[].inner.name`, skipping entries without a string name
    pub fn named_list(&self, field: &str, inner: &str) -> Vec<String> {
        self.0
            .get(field)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.get(inner)?.get("name")?.as_str())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// `stats[].stat.name -> stats[].base_stat`
    pub fn stats(&self) -> BTreeMap<String, i64> {
        self.0
            .get("stats")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| {
                        let name = item.get("stat")?.get("name")?.as_str()?;
                        let base = item.get("base_stat")?.as_i64()?;
                        Some((name.to_string(), base))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// `sprites.front_default`; `None` when absent or null
    pub fn sprite(&self) -> Option<String> {
        self.0
            .get("sprites")
            .and_then(|s| s.get("front_default"))
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    pub fn summarize(&self) -> Summary {
        Summary {
            name: self.name(),
            id: self.attribute("id"),
            height: self.attribute("height"),
            weight: self.attribute("weight"),
            types: self.named_list("types", "type"),
            abilities: self.named_list("abilities", "ability"),
            stats: self.stats(),
            sprite: self.sprite(),
        }
    }
}

/// Upper-case the first character and lower-case the rest
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
