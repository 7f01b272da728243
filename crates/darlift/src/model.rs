//! The normalized output model handed to the renderer.
//!
//! One [`Entity`] per record, variant, enum, interface, or template,
//! keyed by a globally unique name. Type references inside fields and
//! choices are canonical tokens usable verbatim; interning, schema
//! generations, and name collisions are all resolved before anything
//! lands here.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Record,
    Variant,
    Enum,
    Interface,
    Template,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,

    /// Raw type descriptor, kept for diagnostics only.
    pub raw: String,

    /// Canonical type token; what the renderer emits.
    pub token: String,

    pub optional: bool,

    pub is_enum: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub name: String,

    /// Absent when the declared argument normalizes to unit.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub argument: Option<String>,

    pub result: String,

    /// Name of the interface the choice was inherited from, if any.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub inherited_from: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,

    /// Dotted name of the defining module.
    pub module: String,

    pub kind: EntityKind,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub fields: Vec<Field>,

    /// Enum constructor names, in declaration order.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub constructors: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub choices: Vec<Choice>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub key_field: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub implements: Vec<String>,
}

impl Entity {
    pub fn new(name: String, module: String, kind: EntityKind) -> Self {
        Self {
            name,
            module,
            kind,
            fields: Vec::new(),
            constructors: Vec::new(),
            choices: Vec::new(),
            key_field: None,
            implements: Vec::new(),
        }
    }

    pub fn with_fields(mut self, fields: Vec<Field>) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_constructors(mut self, constructors: Vec<String>) -> Self {
        self.constructors = constructors;
        self
    }

    pub fn with_choices(mut self, choices: Vec<Choice>) -> Self {
        self.choices = choices;
        self
    }
}

/// The finished, renderer-facing model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    /// Trailing 64-hex hash of the primary module's file name.
    pub package_id: String,

    pub entities: BTreeMap<String, Entity>,
}

impl Model {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
