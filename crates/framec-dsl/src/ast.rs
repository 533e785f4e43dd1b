//! The nested frame tree produced by the parser.
//!
//! Every node owns its children. Positions are 1-based and `0:0` for nodes
//! that did not come from source text (e.g. rebuilt from a compiled frame).

use serde::{Deserialize, Serialize};

use crate::types::ValueType;

/// `keyType` of the synthetic block every frame must start with.
pub const ROOT_KEY_TYPE: &str = "ROOT";
/// Slot a nameless non-root child falls into.
pub const DEFAULT_SLOT: &str = "content";
/// Legacy spelling of "no slot".
pub const NULL_SLOT: &str = "null";

pub const FRAME_TYPES: &[&str] = &["FRAME", "BOTTOM_SHEET", "DIALOG"];
pub const THEN_OUTCOMES: &[&str] = &["NEXT", "SUCCESS", "FAILURE", "END", "ALWAYS"];
/// Outcome of a root trigger that does not say otherwise.
pub const DEFAULT_THEN: &str = "NEXT";
/// Outcome after which nothing may run.
pub const END_THEN: &str = "END";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub line: usize,
    pub column: usize,
}

impl Pos {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

// ── Frame ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Frame {
    pub name: String,
    pub route: String,
    #[serde(rename = "type")]
    pub frame_type: String,
    pub variables: Vec<Variable>,
    pub blocks: Vec<Block>,
    #[serde(skip)]
    pub pos: Pos,
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            name: String::new(),
            route: String::new(),
            frame_type: FRAME_TYPES[0].to_string(),
            variables: Vec::new(),
            blocks: Vec::new(),
            pos: Pos::default(),
        }
    }
}

impl Frame {
    /// Every block in the frame, depth-first pre-order.
    pub fn walk_blocks(&self) -> Vec<&Block> {
        fn visit<'a>(blocks: &'a [Block], out: &mut Vec<&'a Block>) {
            for b in blocks {
                out.push(b);
                visit(&b.blocks, out);
            }
        }
        let mut out = Vec::new();
        visit(&self.blocks, &mut out);
        out
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Variable {
    pub key: String,
    /// Declared type name as written; checked by the validator.
    #[serde(rename = "type")]
    pub var_type: String,
    pub value: String,
    #[serde(skip)]
    pub pos: Pos,
}

// ── Block ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Block {
    pub key_type: String,
    pub key: String,
    pub visibility_key: String,
    /// Slot of the parent this block sits in; empty for root blocks.
    pub slot: String,
    pub integration_version: i32,
    pub properties: Vec<Property>,
    pub data: Vec<Data>,
    pub slots: Vec<Slot>,
    pub blocks: Vec<Block>,
    pub actions: Vec<Action>,
    #[serde(skip)]
    pub pos: Pos,
}

impl Block {
    pub fn declares_slot(&self, name: &str) -> bool {
        self.slots.iter().any(|s| s.name == name)
    }
}

/// A value that may differ per device class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Property {
    pub key: String,
    #[serde(rename = "valueMobile")]
    pub mobile: String,
    #[serde(rename = "valueTablet")]
    pub tablet: String,
    #[serde(rename = "valueDesktop")]
    pub desktop: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    #[serde(skip)]
    pub pos: Pos,
}

impl Default for Property {
    fn default() -> Self {
        Self {
            key: String::new(),
            mobile: String::new(),
            tablet: String::new(),
            desktop: String::new(),
            value_type: ValueType::String,
            pos: Pos::default(),
        }
    }
}

impl Property {
    /// One value for every device.
    pub fn uniform(key: impl Into<String>, value: impl Into<String>, value_type: ValueType) -> Self {
        let value = value.into();
        Self {
            key: key.into(),
            mobile: value.clone(),
            tablet: value.clone(),
            desktop: value,
            value_type,
            pos: Pos::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Data {
    pub key: String,
    /// A literal, or the key of a frame variable.
    pub value: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    #[serde(skip)]
    pub pos: Pos,
}

impl Default for Data {
    fn default() -> Self {
        Self { key: String::new(), value: String::new(), value_type: ValueType::String, pos: Pos::default() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Slot {
    #[serde(rename = "slot")]
    pub name: String,
    #[serde(skip)]
    pub pos: Pos,
}

impl Slot {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), pos: Pos::default() }
    }
}

// ── Action / Trigger ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Action {
    /// Key of the block that declared this action.
    #[serde(rename = "key")]
    pub block_key: String,
    pub event: String,
    pub triggers: Vec<Trigger>,
    #[serde(skip)]
    pub pos: Pos,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Trigger {
    pub key_type: String,
    pub name: String,
    /// Outcome of the parent under which this trigger runs.
    pub then: String,
    pub integration_version: i32,
    pub properties: Vec<Property>,
    pub data: Vec<Data>,
    pub triggers: Vec<Trigger>,
    #[serde(skip)]
    pub pos: Pos,
}

impl Default for Trigger {
    fn default() -> Self {
        Self {
            key_type: String::new(),
            name: String::new(),
            then: DEFAULT_THEN.to_string(),
            integration_version: 0,
            properties: Vec::new(),
            data: Vec::new(),
            triggers: Vec::new(),
            pos: Pos::default(),
        }
    }
}
