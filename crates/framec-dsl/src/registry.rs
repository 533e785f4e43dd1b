//! Integration registry: which block and action kinds exist and what each
//! one accepts. Loaded once from two JSON documents keyed by `keyType`, then
//! read-only.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

/// Top-level entry that is metadata, not an integration.
pub const SCHEMA_VERSION_KEY: &str = "schema-version";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PropertyDefinition {
    pub key: String,
    #[serde(rename = "type")]
    pub value_type: String,
    /// Default value, if the integration declares one.
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DataDefinition {
    pub key: String,
    #[serde(rename = "type")]
    pub value_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventDefinition {
    pub event: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotDefinition {
    pub slot: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlockIntegration {
    pub key_type: String,
    pub version: i32,
    pub properties: Vec<PropertyDefinition>,
    pub data: Vec<DataDefinition>,
    pub events: Vec<EventDefinition>,
    pub slots: Vec<SlotDefinition>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActionIntegration {
    pub key_type: String,
    pub version: i32,
    pub properties: Vec<PropertyDefinition>,
    pub data: Vec<DataDefinition>,
}

// ── Integration ───────────────────────────────────────────────────────────

/// What blocks and actions have in common: property and data keys.
pub trait Integration {
    fn key_type(&self) -> &str;
    fn properties(&self) -> &[PropertyDefinition];
    fn data(&self) -> &[DataDefinition];

    fn has_property(&self, key: &str) -> bool {
        self.properties().iter().any(|p| p.key == key)
    }

    fn has_data(&self, key: &str) -> bool {
        self.data().iter().any(|d| d.key == key)
    }

    fn property_keys(&self) -> Vec<&str> {
        self.properties().iter().map(|p| p.key.as_str()).collect()
    }

    fn data_keys(&self) -> Vec<&str> {
        self.data().iter().map(|d| d.key.as_str()).collect()
    }
}

impl Integration for BlockIntegration {
    fn key_type(&self) -> &str {
        &self.key_type
    }
    fn properties(&self) -> &[PropertyDefinition] {
        &self.properties
    }
    fn data(&self) -> &[DataDefinition] {
        &self.data
    }
}

impl Integration for ActionIntegration {
    fn key_type(&self) -> &str {
        &self.key_type
    }
    fn properties(&self) -> &[PropertyDefinition] {
        &self.properties
    }
    fn data(&self) -> &[DataDefinition] {
        &self.data
    }
}

impl BlockIntegration {
    pub fn has_slot(&self, slot: &str) -> bool {
        self.slots.iter().any(|s| s.slot == slot)
    }

    pub fn has_event(&self, event: &str) -> bool {
        self.events.iter().any(|e| e.event == event)
    }

    pub fn slot_names(&self) -> Vec<&str> {
        self.slots.iter().map(|s| s.slot.as_str()).collect()
    }

    pub fn event_names(&self) -> Vec<&str> {
        self.events.iter().map(|e| e.event.as_str()).collect()
    }
}

// ── IntegrationRegistry ───────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegrationRegistry {
    blocks: HashMap<String, BlockIntegration>,
    actions: HashMap<String, ActionIntegration>,
}

impl IntegrationRegistry {
    /// Build from the block-kind and action-kind documents.
    pub fn from_json(blocks: &str, actions: &str) -> Result<Self, RegistryError> {
        let mut registry = Self::default();
        for (key_type, mut block) in parse_document::<BlockIntegration>("blocks", blocks)? {
            block.key_type = key_type.clone();
            registry.blocks.insert(key_type, block);
        }
        for (key_type, mut action) in parse_document::<ActionIntegration>("actions", actions)? {
            action.key_type = key_type.clone();
            registry.actions.insert(key_type, action);
        }
        log::debug!(
            "loaded integration registry: {} block kinds, {} action kinds",
            registry.blocks.len(),
            registry.actions.len()
        );
        Ok(registry)
    }

    pub fn with_block(mut self, block: BlockIntegration) -> Self {
        self.blocks.insert(block.key_type.clone(), block);
        self
    }

    pub fn with_action(mut self, action: ActionIntegration) -> Self {
        self.actions.insert(action.key_type.clone(), action);
        self
    }

    pub fn block(&self, key_type: &str) -> Option<&BlockIntegration> {
        self.blocks.get(key_type)
    }

    pub fn action(&self, key_type: &str) -> Option<&ActionIntegration> {
        self.actions.get(key_type)
    }

    /// Block kinds, sorted.
    pub fn block_kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.blocks.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    /// Action kinds, sorted.
    pub fn action_kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.actions.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty() && self.actions.is_empty()
    }
}

fn parse_document<T: DeserializeOwned>(document: &'static str, json: &str) -> Result<Vec<(String, T)>, RegistryError> {
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|source| RegistryError::Document { document, source })?;
    let serde_json::Value::Object(entries) = value else {
        return Err(RegistryError::NotAnObject { document });
    };

    entries
        .into_iter()
        .filter(|(key, _)| key != SCHEMA_VERSION_KEY)
        .map(|(key, value)| match serde_json::from_value::<T>(value) {
            Ok(entry) => Ok((key, entry)),
            Err(source) => Err(RegistryError::Entry { document, key_type: key, source }),
        })
        .collect()
}
