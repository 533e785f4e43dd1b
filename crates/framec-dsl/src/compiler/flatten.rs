//! Nested frame → relational rows.

use std::collections::HashMap;

use crate::ast::{Action, Block, Frame, Slot, Trigger, DEFAULT_SLOT, END_THEN, NULL_SLOT, ROOT_KEY_TYPE};
use crate::compiled::{
    ActionRow, BlockDataRow, BlockPropertyRow, BlockRow, BlockSlotRow, CompiledFrame, TriggerDataRow,
    TriggerPropertyRow, TriggerRow, VariableRow,
};
use crate::ids::IdSource;
use crate::route::route_arguments;

use super::error::CompileError;

/// Slot a block occupies once defaults are applied: `"null"` means no slot,
/// and a nameless child of another block sits in `"content"`.
pub fn effective_slot(slot: &str, has_parent: bool) -> String {
    match (slot, has_parent) {
        ("" | NULL_SLOT, false) => String::new(),
        ("" | NULL_SLOT, true) => DEFAULT_SLOT.to_string(),
        (s, _) => s.to_string(),
    }
}

/// Flatten `frame` into rows. Always produces a frame; structural problems
/// come back alongside it.
pub fn flatten(frame: &Frame, ids: &dyn IdSource, frame_id: Option<&str>) -> (CompiledFrame, Vec<CompileError>) {
    let frame_id = match frame_id {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => ids.next_id(),
    };

    let mut f = Flattener { ids, frame_id, blocks: Vec::new(), actions: Vec::new(), errors: Vec::new() };

    let variables = frame
        .variables
        .iter()
        .map(|v| VariableRow {
            id: f.ids.next_id(),
            frame_id: f.frame_id.clone(),
            key: v.key.clone(),
            value: v.value.clone(),
            value_type: v.var_type.clone(),
        })
        .collect();

    f.flatten_blocks(&frame.blocks, None);

    if let Some(first) = f.blocks.first() {
        if first.key_type != ROOT_KEY_TYPE {
            f.errors.insert(0, CompileError::RootRequired { block_id: first.id.clone(), key_type: first.key_type.clone() });
        }
    }
    f.duplicate_keys();

    let compiled = CompiledFrame {
        id: f.frame_id,
        name: frame.name.clone(),
        route: frame.route.clone(),
        route_arguments: route_arguments(&frame.route),
        frame_type: frame.frame_type.clone(),
        variables,
        blocks: f.blocks,
        actions: f.actions,
        ..Default::default()
    };
    log::debug!(
        "flattened frame '{}': {} blocks, {} actions, {} variables",
        compiled.name,
        compiled.blocks.len(),
        compiled.actions.len(),
        compiled.variables.len()
    );
    (compiled, f.errors)
}

struct Flattener<'a> {
    ids: &'a dyn IdSource,
    frame_id: String,
    blocks: Vec<BlockRow>,
    actions: Vec<ActionRow>,
    errors: Vec<CompileError>,
}

impl Flattener<'_> {
    /// `parent` is the parent row's id and the slots it declares.
    fn flatten_blocks(&mut self, blocks: &[Block], parent: Option<(&str, &[Slot])>) {
        for (position, block) in blocks.iter().enumerate() {
            let id = self.ids.next_id();
            let slot = effective_slot(&block.slot, parent.is_some());

            if let Some((parent_id, parent_slots)) = parent {
                if !parent_slots.iter().any(|s| s.name == slot) {
                    self.errors.push(CompileError::WrongSlot {
                        block_id: id.clone(),
                        parent_id: parent_id.to_string(),
                        slot: slot.clone(),
                    });
                }
            }

            for action in &block.actions {
                self.action(action, &block.key);
            }

            self.blocks.push(BlockRow {
                frame_id: self.frame_id.clone(),
                key_type: block.key_type.clone(),
                key: block.key.clone(),
                visibility_key: block.visibility_key.clone(),
                position,
                slot,
                integration_version: block.integration_version,
                parent_id: parent.map(|(p, _)| p.to_string()).unwrap_or_default(),
                data: block
                    .data
                    .iter()
                    .map(|d| BlockDataRow {
                        block_id: id.clone(),
                        key: d.key.clone(),
                        value: d.value.clone(),
                        value_type: d.value_type.name().to_string(),
                    })
                    .collect(),
                properties: block
                    .properties
                    .iter()
                    .map(|p| BlockPropertyRow {
                        block_id: id.clone(),
                        key: p.key.clone(),
                        value_mobile: p.mobile.clone(),
                        value_tablet: p.tablet.clone(),
                        value_desktop: p.desktop.clone(),
                        value_type: p.value_type.name().to_string(),
                    })
                    .collect(),
                slots: block.slots.iter().map(|s| BlockSlotRow { block_id: id.clone(), slot: s.name.clone() }).collect(),
                id: id.clone(),
            });

            self.flatten_blocks(&block.blocks, Some((id.as_str(), block.slots.as_slice())));
        }
    }

    fn action(&mut self, action: &Action, block_key: &str) {
        let id = self.ids.next_id();
        let mut triggers = Vec::new();
        self.triggers(&id, &action.triggers, "", &mut triggers);
        self.actions.push(ActionRow {
            frame_id: self.frame_id.clone(),
            key: block_key.to_string(),
            event: action.event.clone(),
            triggers,
            id,
        });
    }

    /// Pre-order: each trigger is followed by its own nested triggers.
    fn triggers(&mut self, action_id: &str, triggers: &[Trigger], parent_id: &str, out: &mut Vec<TriggerRow>) {
        for trigger in triggers {
            let id = self.ids.next_id();
            if trigger.then == END_THEN && !trigger.triggers.is_empty() {
                self.errors.push(CompileError::EndTriggerWithChildren { trigger_id: id.clone() });
            }

            out.push(TriggerRow {
                action_id: action_id.to_string(),
                parent_id: parent_id.to_string(),
                key_type: trigger.key_type.clone(),
                then: trigger.then.clone(),
                name: trigger.name.clone(),
                integration_version: trigger.integration_version,
                properties: trigger
                    .properties
                    .iter()
                    .map(|p| TriggerPropertyRow {
                        action_trigger_id: id.clone(),
                        key: p.key.clone(),
                        value: p.mobile.clone(),
                        value_type: p.value_type.name().to_string(),
                    })
                    .collect(),
                data: trigger
                    .data
                    .iter()
                    .map(|d| TriggerDataRow {
                        action_trigger_id: id.clone(),
                        key: d.key.clone(),
                        value: d.value.clone(),
                        value_type: d.value_type.name().to_string(),
                    })
                    .collect(),
                id: id.clone(),
            });

            self.triggers(action_id, &trigger.triggers, &id, out);
        }
    }

    /// Frame-wide key uniqueness over the flat list, in first-seen order.
    fn duplicate_keys(&mut self) {
        let mut order: Vec<&str> = Vec::new();
        let mut by_key: HashMap<&str, Vec<String>> = HashMap::new();
        for row in self.blocks.iter().filter(|b| !b.key.is_empty()) {
            let ids = by_key.entry(&row.key).or_default();
            if ids.is_empty() {
                order.push(&row.key);
            }
            ids.push(row.id.clone());
        }

        let mut found = Vec::new();
        for key in order {
            if let Some(block_ids) = by_key.remove(key) {
                if block_ids.len() > 1 {
                    found.push(CompileError::DuplicateKey { key: key.to_string(), block_ids });
                }
            }
        }
        self.errors.extend(found);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Property;
    use crate::ids::SequentialIds;
    use crate::types::ValueType;

    fn block(key_type: &str, key: &str) -> Block {
        Block { key_type: key_type.into(), key: key.into(), ..Default::default() }
    }

    fn root_with(children: Vec<Block>) -> Frame {
        let root = Block { slots: vec![Slot::new("content")], blocks: children, ..block("ROOT", "root") };
        Frame { name: "f".into(), route: "/f/{id}".into(), blocks: vec![root], ..Default::default() }
    }

    #[test]
    fn slot_defaults() {
        assert_eq!(effective_slot("null", false), "");
        assert_eq!(effective_slot("", false), "");
        assert_eq!(effective_slot("", true), "content");
        assert_eq!(effective_slot("null", true), "content");
        assert_eq!(effective_slot("header", true), "header");
    }

    #[test]
    fn rows_carry_parents_and_positions() {
        let frame = root_with(vec![
            Block { slot: "content".into(), ..block("a", "first") },
            Block { slot: "content".into(), ..block("a", "second") },
        ]);
        let (compiled, errors) = flatten(&frame, &SequentialIds::new(), Some("frame-1"));
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(compiled.id, "frame-1");
        assert_eq!(compiled.route_arguments[0].name, "id");

        let keys: Vec<&str> = compiled.blocks.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, ["root", "first", "second"]);
        let root = &compiled.blocks[0];
        assert_eq!((root.parent_id.as_str(), root.position, root.slot.as_str()), ("", 0, ""));
        assert_eq!(compiled.blocks[1].parent_id, root.id);
        assert_eq!(compiled.blocks[2].position, 1);
        assert!(compiled.blocks.iter().all(|b| b.frame_id == "frame-1"));
    }

    #[test]
    fn generates_frame_id_when_missing() {
        let (compiled, _) = flatten(&root_with(vec![]), &SequentialIds::new(), None);
        assert_eq!(compiled.id, "id-1");
        let (compiled, _) = flatten(&root_with(vec![]), &SequentialIds::new(), Some(""));
        assert_eq!(compiled.id, "id-1");
    }

    #[test]
    fn nameless_child_defaults_to_content() {
        let (compiled, errors) = flatten(&root_with(vec![block("a", "child")]), &SequentialIds::new(), None);
        assert!(errors.is_empty());
        assert_eq!(compiled.blocks[1].slot, "content");
    }

    #[test]
    fn wrong_slot_is_reported() {
        let frame = root_with(vec![Block { slot: "sidebar".into(), ..block("a", "child") }]);
        let (compiled, errors) = flatten(&frame, &SequentialIds::new(), None);
        assert!(matches!(&errors[..], [CompileError::WrongSlot { slot, .. }] if slot == "sidebar"));
        assert!(errors[0].message(&compiled).contains("used in a wrong slot"));
    }

    #[test]
    fn root_must_come_first() {
        let frame = Frame { blocks: vec![block("nativeblocks/text", "t")], ..Default::default() };
        let (compiled, errors) = flatten(&frame, &SequentialIds::new(), None);
        assert!(matches!(&errors[..], [CompileError::RootRequired { key_type, .. }] if key_type == "nativeblocks/text"));
        assert_eq!(compiled.blocks.len(), 1);
    }

    #[test]
    fn duplicate_keys_across_depths() {
        let inner = Block { slots: vec![Slot::new("content")], blocks: vec![block("a", "dup")], ..block("a", "dup") };
        let (_, errors) = flatten(&root_with(vec![inner]), &SequentialIds::new(), None);
        match &errors[..] {
            [CompileError::DuplicateKey { key, block_ids }] => {
                assert_eq!(key, "dup");
                assert_eq!(block_ids.len(), 2);
            }
            other => panic!("unexpected errors: {other:?}"),
        }
    }

    #[test]
    fn triggers_flatten_pre_order_with_parent_links() {
        let second = Trigger { name: "second".into(), then: "SUCCESS".into(), ..Default::default() };
        let first = Trigger {
            name: "first".into(),
            properties: vec![Property {
                key: "value".into(),
                mobile: "m".into(),
                tablet: "t".into(),
                desktop: "d".into(),
                value_type: ValueType::String,
                ..Default::default()
            }],
            triggers: vec![second],
            ..Default::default()
        };
        let third = Trigger { name: "third".into(), ..Default::default() };
        let button = Block {
            actions: vec![Action { event: "onClick".into(), triggers: vec![first, third], ..Default::default() }],
            ..block("a", "button")
        };
        let (compiled, errors) = flatten(&root_with(vec![button]), &SequentialIds::new(), None);
        assert!(errors.is_empty());

        let action = &compiled.actions[0];
        assert_eq!(action.key, "button");
        let names: Vec<&str> = action.triggers.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["first", "second", "third"]);
        assert_eq!(action.triggers[0].parent_id, "");
        assert_eq!(action.triggers[1].parent_id, action.triggers[0].id);
        assert_eq!(action.triggers[2].parent_id, "");
        assert!(action.triggers.iter().all(|t| t.action_id == action.id));
        assert_eq!(action.triggers[0].properties[0].value, "m");
    }

    #[test]
    fn end_trigger_with_children_is_reported() {
        let stop = Trigger {
            name: "stop".into(),
            then: "END".into(),
            triggers: vec![Trigger::default()],
            ..Default::default()
        };
        let root = Block {
            actions: vec![Action { event: "onLoad".into(), triggers: vec![stop], ..Default::default() }],
            ..block("ROOT", "root")
        };
        let frame = Frame { blocks: vec![root], ..Default::default() };
        let (compiled, errors) = flatten(&frame, &SequentialIds::new(), None);
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].message(&compiled),
            "The stop can not have a subTrigger because it defines with \"END\" then"
        );
    }
}
