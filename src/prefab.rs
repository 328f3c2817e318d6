//! Item prefab catalog.
//!
//! Loading prefab definitions from content files is the host's business; this
//! catalog only holds validated definitions and hands them out by identifier.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PrefabError {
    #[error("item prefab '{0}' not found")]
    NotFound(String),
    #[error("invalid item prefab '{identifier}': {reason}")]
    Invalid { identifier: String, reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemPrefab {
    pub identifier: String,
    pub name: String,
    /// Items with a power container spawn fully charged.
    #[serde(default)]
    pub power_capacity: Option<f32>,
}

impl ItemPrefab {
    pub fn new(identifier: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            name: name.into(),
            power_capacity: None,
        }
    }

    pub fn with_power_capacity(mut self, capacity: f32) -> Self {
        self.power_capacity = Some(capacity);
        self
    }

    fn validate(&self) -> Result<(), PrefabError> {
        let invalid = |reason: &str| PrefabError::Invalid {
            identifier: self.identifier.clone(),
            reason: reason.into(),
        };
        if self.identifier.trim().is_empty() {
            return Err(invalid("empty identifier"));
        }
        if self.name.trim().is_empty() {
            return Err(invalid("empty name"));
        }
        if let Some(capacity) = self.power_capacity {
            if !(capacity > 0.0) {
                return Err(invalid("power capacity must be positive"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct PrefabCatalog {
    prefabs: HashMap<String, ItemPrefab>,
}

impl PrefabCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with the items of the default revival loadout.
    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();
        let defaults = [
            ItemPrefab::new("divingsuit", "Diving Suit"),
            ItemPrefab::new("oxygentank", "Oxygen Tank"),
            ItemPrefab::new("underwaterscooter", "Underwater Scooter"),
            ItemPrefab::new("batterycell", "Battery Cell").with_power_capacity(100.0),
        ];
        for prefab in defaults {
            // Built-in definitions are known to be valid.
            catalog.prefabs.insert(prefab.identifier.clone(), prefab);
        }
        catalog
    }

    /// Adds or replaces a definition after validating it.
    pub fn insert(&mut self, prefab: ItemPrefab) -> Result<(), PrefabError> {
        prefab.validate()?;
        self.prefabs.insert(prefab.identifier.clone(), prefab);
        Ok(())
    }

    pub fn get(&self, identifier: &str) -> Result<&ItemPrefab, PrefabError> {
        self.prefabs
            .get(identifier)
            .ok_or_else(|| PrefabError::NotFound(identifier.to_string()))
    }

    pub fn len(&self) -> usize {
        self.prefabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefabs.is_empty()
    }
}
