use super::types::SimTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use uuid::Uuid;

/// Material kinds in the production hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MaterialKind {
    Raw,
    Tube,
    Case,
    Pallet,
}

impl MaterialKind {
    pub fn name(&self) -> &'static str {
        match self {
            MaterialKind::Raw => "Raw",
            MaterialKind::Tube => "Tube",
            MaterialKind::Case => "Case",
            MaterialKind::Pallet => "Pallet",
        }
    }
}

impl std::fmt::Display for MaterialKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MaterialKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(MaterialKind::Raw),
            "tube" => Ok(MaterialKind::Tube),
            "case" => Ok(MaterialKind::Case),
            "pallet" => Ok(MaterialKind::Pallet),
            other => Err(format!("Unknown material kind '{}'", other)),
        }
    }
}

/// Unique, traceable identifier of a material unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MaterialId(Uuid);

impl MaterialId {
    /// Build an id from 16 random bytes. Callers draw the bytes from the run's
    /// seeded generator so ids are reproducible.
    pub fn from_random_bytes(bytes: [u8; 16]) -> Self {
        Self(uuid::Builder::from_random_bytes(bytes).into_uuid())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// First eight hex digits, handy for logs
    pub fn short(&self) -> String {
        let mut text = self.0.simple().to_string();
        text.truncate(8);
        text
    }
}

impl std::fmt::Display for MaterialId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Value stored in a unit's attribute map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl AttributeValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttributeValue::Int(value) => Some(*value),
            _ => None,
        }
    }
}

/// A physical item flowing through the line.
///
/// Units are assembled with the `with_*` methods when created and are never
/// mutated afterwards; a composite unit's defect flag is the OR of its inputs'
/// flags and any defect the creating station introduced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialUnit {
    id: MaterialId,
    kind: MaterialKind,
    created_at: SimTime,
    created_by: String,
    is_defective: bool,
    genealogy: Vec<MaterialId>,
    attributes: BTreeMap<String, AttributeValue>,
}

impl MaterialUnit {
    pub fn new(id: MaterialId, kind: MaterialKind, created_at: SimTime, created_by: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            created_at,
            created_by: created_by.into(),
            is_defective: false,
            genealogy: Vec::new(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_defect(mut self, is_defective: bool) -> Self {
        self.is_defective = is_defective;
        self
    }

    pub fn with_genealogy(mut self, parents: Vec<MaterialId>) -> Self {
        self.genealogy = parents;
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: AttributeValue) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    pub fn id(&self) -> MaterialId {
        self.id
    }

    pub fn kind(&self) -> MaterialKind {
        self.kind
    }

    pub fn created_at(&self) -> SimTime {
        self.created_at
    }

    pub fn created_by(&self) -> &str {
        &self.created_by
    }

    pub fn is_defective(&self) -> bool {
        self.is_defective
    }

    /// Ids of the units consumed to build this one, in consumption order
    pub fn genealogy(&self) -> &[MaterialId] {
        &self.genealogy
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    pub fn attributes(&self) -> &BTreeMap<String, AttributeValue> {
        &self.attributes
    }
}
