//! Shared domain models.

mod game;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Whether a definition is a raw material or something built from inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Raw material without inputs.
    Resource,
    /// Manufactured item with a bill of materials.
    Product,
}

impl ResourceKind {
    /// Label used in listings and the stored `type` field.
    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Resource => "Resource",
            ResourceKind::Product => "Product",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One dependency: `quantity` units of `input` per unit of the owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputLine {
    /// Name of the referenced resource or product.
    pub input: String,
    /// Units consumed, always at least one.
    pub quantity: u32,
}

impl InputLine {
    /// Build a line for `quantity` units of `input`.
    pub fn new(input: impl Into<String>, quantity: u32) -> Self {
        Self {
            input: input.into(),
            quantity,
        }
    }
}

/// A resource or product definition within a tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Unique name within the owning tab.
    pub name: String,
    /// Raw resource or product.
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    /// Direct dependencies; empty for raw resources.
    #[serde(default)]
    pub inputs: Vec<InputLine>,
}

impl Resource {
    /// A raw material.
    pub fn raw(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ResourceKind::Resource,
            inputs: Vec::new(),
        }
    }

    /// A product built from the given inputs.
    pub fn product(name: impl Into<String>, inputs: Vec<InputLine>) -> Self {
        Self {
            name: name.into(),
            kind: ResourceKind::Product,
            inputs,
        }
    }

    /// Returns true for products.
    pub fn is_product(&self) -> bool {
        self.kind == ResourceKind::Product
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.kind)
    }
}

/// A work order requesting quantities of named products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Unique name within the owning tab.
    pub name: String,
    /// Requested products and how many of each.
    #[serde(default)]
    pub products: Vec<InputLine>,
}

impl Job {
    /// Build a job ordering the given products.
    pub fn new(name: impl Into<String>, products: Vec<InputLine>) -> Self {
        Self {
            name: name.into(),
            products,
        }
    }
}

/// All definitions and jobs belonging to one tab.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    /// Resource and product definitions in insertion order.
    #[serde(default)]
    pub resources: Vec<Resource>,
    /// Jobs in insertion order.
    #[serde(default)]
    pub jobs: Vec<Job>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resource_uses_type_field_on_the_wire() {
        let gear = Resource::product("Gear", vec![InputLine::new("Iron", 2)]);
        let value = serde_json::to_value(&gear).unwrap();
        assert_eq!(
            value,
            json!({"name": "Gear", "type": "Product", "inputs": [{"input": "Iron", "quantity": 2}]})
        );
    }

    #[test]
    fn missing_lists_default_to_empty() {
        let job: Job = serde_json::from_value(json!({"name": "Rush order"})).unwrap();
        assert!(job.products.is_empty());

        let record: GameRecord = serde_json::from_value(json!({})).unwrap();
        assert_eq!(record, GameRecord::default());
    }

    #[test]
    fn display_matches_listing_format() {
        assert_eq!(Resource::raw("Iron").to_string(), "Iron (Resource)");
        assert_eq!(
            Resource::product("Gear", vec![InputLine::new("Iron", 1)]).to_string(),
            "Gear (Product)"
        );
    }
}
