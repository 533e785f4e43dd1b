//! The flat, relational form of a frame: rows with generated ids and
//! explicit parent keys, serialized as camelCase JSON.
//!
//! Every field defaults when missing and unknown fields are ignored, so
//! documents written by other tools still load.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompiledFrame {
    pub id: String,
    pub name: String,
    pub route: String,
    pub route_arguments: Vec<RouteArgument>,
    #[serde(rename = "type")]
    pub frame_type: String,
    /// Caller-owned metadata; never set by the compiler.
    pub is_starter: bool,
    pub project_id: String,
    pub checksum: String,
    pub variables: Vec<VariableRow>,
    /// Depth-first pre-order.
    pub blocks: Vec<BlockRow>,
    pub actions: Vec<ActionRow>,
}

impl CompiledFrame {
    pub fn block(&self, id: &str) -> Option<&BlockRow> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn trigger(&self, id: &str) -> Option<&TriggerRow> {
        self.actions.iter().flat_map(|a| a.triggers.iter()).find(|t| t.id == id)
    }

    /// Block key for `id`, or the id itself when no such row exists.
    pub fn block_key<'a>(&'a self, id: &'a str) -> &'a str {
        self.block(id).map(|b| b.key.as_str()).unwrap_or(id)
    }

    /// Trigger name for `id`, or the id itself when no such row exists.
    pub fn trigger_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.trigger(id).map(|t| t.name.as_str()).unwrap_or(id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteArgument {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VariableRow {
    pub id: String,
    pub frame_id: String,
    pub key: String,
    pub value: String,
    #[serde(rename = "type")]
    pub value_type: String,
}

// ── Blocks ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlockRow {
    pub id: String,
    pub frame_id: String,
    pub key_type: String,
    pub key: String,
    pub visibility_key: String,
    /// Index among siblings.
    pub position: usize,
    pub slot: String,
    pub integration_version: i32,
    /// Empty for root blocks.
    pub parent_id: String,
    pub data: Vec<BlockDataRow>,
    pub properties: Vec<BlockPropertyRow>,
    pub slots: Vec<BlockSlotRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlockPropertyRow {
    pub block_id: String,
    pub key: String,
    pub value_mobile: String,
    pub value_tablet: String,
    pub value_desktop: String,
    #[serde(rename = "type")]
    pub value_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlockDataRow {
    pub block_id: String,
    pub key: String,
    pub value: String,
    #[serde(rename = "type")]
    pub value_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlockSlotRow {
    pub block_id: String,
    pub slot: String,
}

// ── Actions ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActionRow {
    pub id: String,
    pub frame_id: String,
    /// Key of the owning block.
    pub key: String,
    pub event: String,
    /// Every trigger of the action, pre-order; nesting via `parent_id`.
    pub triggers: Vec<TriggerRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TriggerRow {
    pub id: String,
    pub action_id: String,
    /// Empty for triggers directly under the action.
    pub parent_id: String,
    pub key_type: String,
    pub then: String,
    pub name: String,
    pub integration_version: i32,
    pub properties: Vec<TriggerPropertyRow>,
    pub data: Vec<TriggerDataRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TriggerPropertyRow {
    pub action_trigger_id: String,
    pub key: String,
    pub value: String,
    #[serde(rename = "type")]
    pub value_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TriggerDataRow {
    pub action_trigger_id: String,
    pub key: String,
    pub value: String,
    #[serde(rename = "type")]
    pub value_type: String,
}
