use std::fmt;

use mongodb::bson::{Bson, Document};
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

pub type Stats = Map<String, Value>;

pub trait Entity: Clone {
    fn name(&self) -> &str;

    fn id(&self) -> Option<usize>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseEntity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<usize>,
    pub name: String,
    #[serde(default)]
    pub stats: Stats,
    #[serde(default)]
    pub collections: Vec<CollectionEntity>,
}

impl DatabaseEntity {
    pub fn new(id: Option<usize>, name: impl Into<String>) -> Self {
        Self { id, name: name.into(), stats: Stats::new(), collections: Vec::new() }
    }
}

impl Entity for DatabaseEntity {
    fn name(&self) -> &str {
        &self.name
    }

    fn id(&self) -> Option<usize> {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionEntity {
    pub id: usize,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objects: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

impl CollectionEntity {
    pub fn summary(id: usize, name: impl Into<String>) -> Self {
        Self { id, name: name.into(), objects: None, count: None }
    }

    /// `count` always mirrors the number of documents carried.
    pub fn detail(id: usize, name: impl Into<String>, objects: Vec<Value>) -> Self {
        let count = objects.len() as u64;
        Self { id, name: name.into(), objects: Some(objects), count: Some(count) }
    }

    pub fn is_detailed(&self) -> bool {
        self.objects.is_some()
    }
}

impl Entity for CollectionEntity {
    fn name(&self) -> &str {
        &self.name
    }

    fn id(&self) -> Option<usize> {
        Some(self.id)
    }
}

pub fn document_to_json(document: Document) -> Value {
    Bson::Document(document).into_relaxed_extjson()
}

pub fn stats_from_document(document: Document) -> Stats {
    match document_to_json(document) {
        Value::Object(map) => map,
        _ => Stats::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failed,
}

impl Outcome {
    pub const fn label(self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Failed => "failed",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationResult {
    pub name: String,
    pub outcome: Outcome,
}

impl MutationResult {
    pub fn new(name: impl Into<String>, outcome: Outcome) -> Self {
        Self { name: name.into(), outcome }
    }

    pub fn failed(name: impl Into<String>) -> Self {
        Self::new(name, Outcome::Failed)
    }

    pub fn from_ack(requested: &str, ack: &Document) -> Self {
        let dropped_matches = matches!(ack.get("dropped"), Some(Bson::String(name)) if name == requested);
        let outcome =
            if dropped_matches && ack_ok(ack.get("ok")) { Outcome::Success } else { Outcome::Failed };
        Self::new(requested, outcome)
    }

    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }
}

fn ack_ok(value: Option<&Bson>) -> bool {
    match value {
        Some(Bson::Int32(value)) => *value == 1,
        Some(Bson::Int64(value)) => *value == 1,
        Some(Bson::Double(value)) => *value == 1.0,
        _ => false,
    }
}

impl Serialize for MutationResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.name, &self.outcome)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for MutationResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ResultVisitor;

        impl<'de> Visitor<'de> for ResultVisitor {
            type Value = MutationResult;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a single-entry map of name to outcome")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let (name, outcome) = map
                    .next_entry::<String, Outcome>()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;
                if map.next_key::<String>()?.is_some() {
                    return Err(de::Error::invalid_length(2, &self));
                }
                Ok(MutationResult { name, outcome })
            }
        }

        deserializer.deserialize_map(ResultVisitor)
    }
}
