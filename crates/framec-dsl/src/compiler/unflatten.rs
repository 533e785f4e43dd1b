//! Relational rows → nested frame. Total: never fails, never validates.

use std::collections::{HashMap, HashSet};

use crate::ast::{Action, Block, Data, Frame, Property, Slot, Trigger, Variable, DEFAULT_THEN, FRAME_TYPES};
use crate::compiled::{ActionRow, BlockRow, CompiledFrame, TriggerRow};
use crate::types::{self, ValueType};

use super::flatten::effective_slot;

fn value_type(name: &str, value: &str) -> ValueType {
    name.parse().unwrap_or_else(|_| types::infer(value))
}

/// Rebuild the nested tree. Rows whose parent is missing are dropped, as are
/// rows whose id already appears on the path from the root; ids do not
/// survive.
pub fn decompile(compiled: &CompiledFrame) -> Frame {
    let mut children: HashMap<&str, Vec<&BlockRow>> = HashMap::new();
    for row in &compiled.blocks {
        children.entry(row.parent_id.as_str()).or_default().push(row);
    }
    for rows in children.values_mut() {
        rows.sort_by_key(|r| r.position);
    }

    let mut actions: HashMap<&str, Vec<&ActionRow>> = HashMap::new();
    for action in &compiled.actions {
        actions.entry(action.key.as_str()).or_default().push(action);
    }

    let tree = Tree { children, actions };
    let mut path = HashSet::new();
    let blocks = tree.children_of("").iter().filter_map(|&row| tree.block(row, false, &mut path)).collect();

    let frame_type =
        if compiled.frame_type.is_empty() { FRAME_TYPES[0].to_string() } else { compiled.frame_type.clone() };

    Frame {
        name: compiled.name.clone(),
        route: compiled.route.clone(),
        frame_type,
        variables: compiled
            .variables
            .iter()
            .map(|v| Variable {
                key: v.key.clone(),
                var_type: v.value_type.clone(),
                value: v.value.clone(),
                ..Default::default()
            })
            .collect(),
        blocks,
        ..Default::default()
    }
}

struct Tree<'c> {
    children: HashMap<&'c str, Vec<&'c BlockRow>>,
    actions: HashMap<&'c str, Vec<&'c ActionRow>>,
}

impl<'c> Tree<'c> {
    fn children_of(&self, parent_id: &str) -> &[&'c BlockRow] {
        self.children.get(parent_id).map(Vec::as_slice).unwrap_or(&[])
    }

    fn block(&self, row: &'c BlockRow, has_parent: bool, path: &mut HashSet<&'c str>) -> Option<Block> {
        if !row.id.is_empty() && !path.insert(row.id.as_str()) {
            return None;
        }
        let children = if row.id.is_empty() { &[][..] } else { self.children_of(&row.id) };
        let blocks = children.iter().filter_map(|&child| self.block(child, true, path)).collect();
        path.remove(row.id.as_str());

        Some(Block {
            key_type: row.key_type.clone(),
            key: row.key.clone(),
            visibility_key: row.visibility_key.clone(),
            slot: effective_slot(&row.slot, has_parent),
            integration_version: row.integration_version,
            properties: row
                .properties
                .iter()
                .map(|p| Property {
                    key: p.key.clone(),
                    mobile: p.value_mobile.clone(),
                    tablet: p.value_tablet.clone(),
                    desktop: p.value_desktop.clone(),
                    value_type: value_type(&p.value_type, &p.value_mobile),
                    ..Default::default()
                })
                .collect(),
            data: row
                .data
                .iter()
                .map(|d| Data {
                    key: d.key.clone(),
                    value: d.value.clone(),
                    value_type: value_type(&d.value_type, &d.value),
                    ..Default::default()
                })
                .collect(),
            slots: row.slots.iter().map(|s| Slot::new(s.slot.clone())).collect(),
            blocks,
            actions: self
                .actions
                .get(row.key.as_str())
                .map(|list| list.iter().map(|a| action(a)).collect())
                .unwrap_or_default(),
            ..Default::default()
        })
    }
}

fn action(row: &ActionRow) -> Action {
    let mut by_parent: HashMap<&str, Vec<&TriggerRow>> = HashMap::new();
    for t in &row.triggers {
        by_parent.entry(t.parent_id.as_str()).or_default().push(t);
    }
    Action {
        block_key: row.key.clone(),
        event: row.event.clone(),
        triggers: triggers(&by_parent, "", true, &mut HashSet::new()),
        ..Default::default()
    }
}

fn triggers<'r>(
    by_parent: &HashMap<&'r str, Vec<&'r TriggerRow>>,
    parent_id: &str,
    root: bool,
    path: &mut HashSet<&'r str>,
) -> Vec<Trigger> {
    let Some(rows) = by_parent.get(parent_id) else {
        return Vec::new();
    };
    rows.iter()
        .filter_map(|&row| {
            if !row.id.is_empty() && !path.insert(row.id.as_str()) {
                return None;
            }
            let nested = if row.id.is_empty() { Vec::new() } else { triggers(by_parent, &row.id, false, path) };
            path.remove(row.id.as_str());

            let then = if row.then.is_empty() && root { DEFAULT_THEN.to_string() } else { row.then.clone() };
            Some(Trigger {
                key_type: row.key_type.clone(),
                name: row.name.clone(),
                then,
                integration_version: row.integration_version,
                properties: row
                    .properties
                    .iter()
                    .map(|p| Property::uniform(p.key.clone(), p.value.clone(), value_type(&p.value_type, &p.value)))
                    .collect(),
                data: row
                    .data
                    .iter()
                    .map(|d| Data {
                        key: d.key.clone(),
                        value: d.value.clone(),
                        value_type: value_type(&d.value_type, &d.value),
                        ..Default::default()
                    })
                    .collect(),
                triggers: nested,
                ..Default::default()
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiled::{BlockPropertyRow, BlockSlotRow, TriggerPropertyRow};

    fn row(id: &str, key: &str, parent: &str, position: usize, slot: &str) -> BlockRow {
        BlockRow {
            id: id.into(),
            key: key.into(),
            parent_id: parent.into(),
            position,
            slot: slot.into(),
            ..Default::default()
        }
    }

    #[test]
    fn rebuilds_nesting_in_position_order() {
        let mut root = row("r", "root", "", 0, "null");
        root.key_type = "ROOT".into();
        root.slots = vec![BlockSlotRow { slot: "content".into(), ..Default::default() }];
        let compiled = CompiledFrame {
            name: "f".into(),
            blocks: vec![root, row("b", "second", "r", 1, "content"), row("a", "first", "r", 0, "")],
            ..Default::default()
        };
        let frame = decompile(&compiled);
        assert_eq!(frame.frame_type, "FRAME");
        let root = &frame.blocks[0];
        assert_eq!(root.slot, "");
        assert_eq!(root.slots[0].name, "content");
        let keys: Vec<&str> = root.blocks.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, ["first", "second"]);
        assert_eq!(root.blocks[0].slot, "content");
    }

    #[test]
    fn orphans_and_cycles_are_dropped() {
        let compiled = CompiledFrame {
            blocks: vec![row("r", "root", "", 0, ""), row("x", "x", "y", 0, ""), row("y", "y", "x", 0, "")],
            ..Default::default()
        };
        let frame = decompile(&compiled);
        assert_eq!(frame.blocks.len(), 1);
        assert!(frame.blocks[0].blocks.is_empty());
    }

    #[test]
    fn actions_attach_by_block_key() {
        let mut button = row("b", "button", "", 0, "");
        button.properties = vec![BlockPropertyRow {
            key: "size".into(),
            value_mobile: "12".into(),
            value_tablet: "14".into(),
            value_desktop: "16".into(),
            value_type: "INT".into(),
            ..Default::default()
        }];
        let compiled = CompiledFrame {
            blocks: vec![button],
            actions: vec![ActionRow {
                id: "a".into(),
                key: "button".into(),
                event: "onClick".into(),
                triggers: vec![
                    TriggerRow { id: "t1".into(), name: "first".into(), ..Default::default() },
                    TriggerRow {
                        id: "t2".into(),
                        parent_id: "t1".into(),
                        name: "second".into(),
                        then: "SUCCESS".into(),
                        properties: vec![TriggerPropertyRow {
                            key: "message".into(),
                            value: "hi".into(),
                            ..Default::default()
                        }],
                        ..Default::default()
                    },
                ],
                ..Default::default()
            }],
            ..Default::default()
        };
        let frame = decompile(&compiled);
        let block = &frame.blocks[0];
        assert_eq!(block.properties[0].tablet, "14");
        assert_eq!(block.properties[0].value_type, ValueType::Int);

        let action = &block.actions[0];
        assert_eq!(action.block_key, "button");
        let first = &action.triggers[0];
        assert_eq!(first.then, "NEXT");
        let second = &first.triggers[0];
        assert_eq!(second.then, "SUCCESS");
        let p = &second.properties[0];
        assert_eq!((p.mobile.as_str(), p.tablet.as_str(), p.desktop.as_str()), ("hi", "hi", "hi"));
    }

    #[test]
    fn duplicate_block_ids_stop_at_the_repeat() {
        let compiled = CompiledFrame {
            blocks: vec![row("r", "root", "", 0, ""), row("r", "again", "r", 0, "content")],
            ..Default::default()
        };
        let frame = decompile(&compiled);
        assert_eq!(frame.blocks.len(), 1);
        assert_eq!(frame.blocks[0].key, "root");
        assert!(frame.blocks[0].blocks.is_empty());
    }

    #[test]
    fn self_parented_trigger_is_dropped() {
        let compiled = CompiledFrame {
            blocks: vec![row("b", "button", "", 0, "")],
            actions: vec![ActionRow {
                key: "button".into(),
                event: "onClick".into(),
                triggers: vec![
                    TriggerRow { id: "t".into(), name: "first".into(), ..Default::default() },
                    TriggerRow { id: "t".into(), parent_id: "t".into(), name: "loop".into(), ..Default::default() },
                ],
                ..Default::default()
            }],
            ..Default::default()
        };
        let frame = decompile(&compiled);
        let triggers = &frame.blocks[0].actions[0].triggers;
        assert_eq!(triggers.len(), 1);
        assert_eq!(triggers[0].name, "first");
        assert!(triggers[0].triggers.is_empty());
    }
}
