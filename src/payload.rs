//! The decoded form of one Tally XML response.
//!
//! Tally reports have no stable schema: the same tag can appear once in one
//! report and many times in another, so the tree is kept as a tagged variant
//! and every consumer matches on it exhaustively.

use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Key under which the text of a mixed element (text plus children or attributes) is stored.
pub const CONTENT_KEY: &str = "content";

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Text-only element.
    Leaf(String),
    /// Attributes and single-occurrence children, in document order.
    Node(Vec<(String, Payload)>),
    /// Children sharing a tag that occurred more than once under the same parent.
    List(Vec<Payload>),
}

impl Payload {
    pub fn empty_node() -> Self {
        Payload::Node(Vec::new())
    }

    pub fn get(&self, key: &str) -> Option<&Payload> {
        match self {
            Payload::Node(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            Payload::Leaf(_) | Payload::List(_) => None,
        }
    }

    pub fn get_path(&self, path: &[&str]) -> Option<&Payload> {
        path.iter().try_fold(self, |current, key| current.get(key))
    }

    pub fn as_leaf(&self) -> Option<&str> {
        match self {
            Payload::Leaf(text) => Some(text),
            Payload::Node(_) | Payload::List(_) => None,
        }
    }

    pub fn as_node(&self) -> Option<&[(String, Payload)]> {
        match self {
            Payload::Node(entries) => Some(entries),
            Payload::Leaf(_) | Payload::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Payload]> {
        match self {
            Payload::List(items) => Some(items),
            Payload::Leaf(_) | Payload::Node(_) => None,
        }
    }

    /// Text of a leaf, or the `content` text of a mixed element.
    pub fn text(&self) -> Option<&str> {
        match self {
            Payload::Leaf(text) => Some(text),
            Payload::Node(_) => self.get(CONTENT_KEY).and_then(Payload::as_leaf),
            Payload::List(_) => None,
        }
    }

    /// Treats a singleton and a list uniformly: a `List` yields its items, anything else itself.
    pub fn items(&self) -> Vec<&Payload> {
        match self {
            Payload::List(items) => items.iter().collect(),
            Payload::Leaf(_) | Payload::Node(_) => vec![self],
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Payload::Leaf(text) => text.is_empty(),
            Payload::Node(entries) => entries.is_empty(),
            Payload::List(items) => items.is_empty(),
        }
    }

    /// Pretty JSON truncated to `max_chars`, for prompts and diagnostics.
    pub fn excerpt(&self, max_chars: usize) -> String {
        let rendered = serde_json::to_string_pretty(self).unwrap_or_default();
        rendered.chars().take(max_chars).collect()
    }
}

/// Inserts or replaces `key` in a node's entries, keeping the original position on replace.
pub fn upsert(entries: &mut Vec<(String, Payload)>, key: impl Into<String>, value: Payload) {
    let key = key.into();
    match entries.iter_mut().find(|(k, _)| *k == key) {
        Some(slot) => slot.1 = value,
        None => entries.push((key, value)),
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Payload::Leaf(text) => serializer.serialize_str(text),
            Payload::Node(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            Payload::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

struct PayloadVisitor;

impl<'de> Visitor<'de> for PayloadVisitor {
    type Value = Payload;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a string, map or sequence")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Payload, E> {
        Ok(Payload::Leaf(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Payload, E> {
        Ok(Payload::Leaf(v))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Payload, E> {
        Ok(Payload::Leaf(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Payload, E> {
        Ok(Payload::Leaf(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Payload, E> {
        Ok(Payload::Leaf(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Payload, E> {
        Ok(Payload::Leaf(v.to_string()))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Payload, E> {
        Ok(Payload::empty_node())
    }

    fn visit_none<E: de::Error>(self) -> Result<Payload, E> {
        Ok(Payload::empty_node())
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Payload, A::Error> {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Payload::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Payload, A::Error> {
        let mut entries = Vec::new();
        while let Some((key, value)) = map.next_entry::<String, Payload>()? {
            upsert(&mut entries, key, value);
        }
        Ok(Payload::Node(entries))
    }
}

impl<'de> Deserialize<'de> for Payload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Payload, D::Error> {
        deserializer.deserialize_any(PayloadVisitor)
    }
}
