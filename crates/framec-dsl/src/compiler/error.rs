use crate::ast::{END_THEN, ROOT_KEY_TYPE};
use crate::compiled::CompiledFrame;

/// Row that owns an offending property or data key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Owner {
    Block { block_id: String },
    Trigger { action_id: String, trigger_id: String },
}

/// One structural or registry problem found while flattening. Variants hold
/// row ids; [`CompileError::message`] resolves them to keys and names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    RootRequired { block_id: String, key_type: String },
    WrongSlot { block_id: String, parent_id: String, slot: String },
    EndTriggerWithChildren { trigger_id: String },
    DuplicateKey { key: String, block_ids: Vec<String> },
    UnknownIntegration { block_id: String, key_type: String },
    UnknownActionIntegration { action_id: String, trigger_id: String, key_type: String },
    IllegalProperty { owner: Owner, key: String, integration: String, available: Vec<String> },
    IllegalData { owner: Owner, key: String, integration: String, available: Vec<String> },
    IllegalSlot { block_id: String, slot: String, integration: String, available: Vec<String> },
    IllegalEvent { block_id: String, event: String, integration: String, available: Vec<String> },
}

fn action_key<'a>(frame: &'a CompiledFrame, action_id: &'a str) -> &'a str {
    frame.actions.iter().find(|a| a.id == action_id).map(|a| a.key.as_str()).unwrap_or(action_id)
}

fn owner_prefix(frame: &CompiledFrame, owner: &Owner) -> String {
    match owner {
        Owner::Block { block_id } => format!("block '{}'", frame.block_key(block_id)),
        Owner::Trigger { action_id, trigger_id } => format!(
            "block '{}' trigger '{}'",
            action_key(frame, action_id),
            frame.trigger_name(trigger_id)
        ),
    }
}

impl CompileError {
    /// Human-readable message with ids resolved against `frame`.
    pub fn message(&self, frame: &CompiledFrame) -> String {
        match self {
            CompileError::RootRequired { block_id, key_type } => format!(
                "The first block must be {ROOT_KEY_TYPE}, but '{}' is '{key_type}'",
                frame.block_key(block_id)
            ),
            CompileError::WrongSlot { block_id, parent_id, slot } => format!(
                "The {} used in a wrong slot '{slot}' of '{}'",
                frame.block_key(block_id),
                frame.block_key(parent_id)
            ),
            CompileError::EndTriggerWithChildren { trigger_id } => format!(
                "The {} can not have a subTrigger because it defines with \"{END_THEN}\" then",
                frame.trigger_name(trigger_id)
            ),
            CompileError::DuplicateKey { key, block_ids } => {
                format!("Duplicate block key '{key}' used by {} blocks", block_ids.len())
            }
            CompileError::UnknownIntegration { block_id, key_type } => {
                format!("block '{}' uses unknown integration '{key_type}'", frame.block_key(block_id))
            }
            CompileError::UnknownActionIntegration { action_id, trigger_id, key_type } => format!(
                "block '{}' uses unknown action integration '{key_type}' in trigger '{}'",
                action_key(frame, action_id),
                frame.trigger_name(trigger_id)
            ),
            CompileError::IllegalProperty { owner, key, integration, available } => format!(
                "{} uses invalid property '{key}' for integration '{integration}'. Available properties: [{}]",
                owner_prefix(frame, owner),
                available.join(", ")
            ),
            CompileError::IllegalData { owner, key, integration, available } => format!(
                "{} uses invalid data key '{key}' for integration '{integration}'. Available data keys: [{}]",
                owner_prefix(frame, owner),
                available.join(", ")
            ),
            CompileError::IllegalSlot { block_id, slot, integration, available } => format!(
                "block '{}' uses invalid slot '{slot}' for integration '{integration}'. Available slots: [{}]",
                frame.block_key(block_id),
                available.join(", ")
            ),
            CompileError::IllegalEvent { block_id, event, integration, available } => format!(
                "block '{}' uses invalid event '{event}' for integration '{integration}'. Available events: [{}]",
                frame.block_key(block_id),
                available.join(", ")
            ),
        }
    }
}

// ── CompileErrors ─────────────────────────────────────────────────────────

/// Everything that went wrong in one compile, with the best-effort compiled
/// frame the ids refer to.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("compile failed with {} error(s):{}", .errors.len(), bullet_list(&self.messages()))]
pub struct CompileErrors {
    pub frame: CompiledFrame,
    pub errors: Vec<CompileError>,
}

impl CompileErrors {
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.message(&self.frame)).collect()
    }
}

fn bullet_list(messages: &[String]) -> String {
    messages.iter().map(|m| format!("\n  - {m}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiled::{ActionRow, BlockRow, TriggerRow};

    fn frame() -> CompiledFrame {
        CompiledFrame {
            blocks: vec![
                BlockRow { id: "b1".into(), key: "root".into(), ..Default::default() },
                BlockRow { id: "b2".into(), key: "button".into(), parent_id: "b1".into(), ..Default::default() },
            ],
            actions: vec![ActionRow {
                id: "a1".into(),
                key: "button".into(),
                triggers: vec![TriggerRow { id: "t1".into(), name: "go".into(), ..Default::default() }],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn messages_resolve_ids() {
        let f = frame();
        let e = CompileError::WrongSlot { block_id: "b2".into(), parent_id: "b1".into(), slot: "side".into() };
        assert_eq!(e.message(&f), "The button used in a wrong slot 'side' of 'root'");

        let e = CompileError::IllegalProperty {
            owner: Owner::Trigger { action_id: "a1".into(), trigger_id: "t1".into() },
            key: "colour".into(),
            integration: "nativeblocks/log".into(),
            available: vec!["message".into()],
        };
        assert_eq!(
            e.message(&f),
            "block 'button' trigger 'go' uses invalid property 'colour' for integration 'nativeblocks/log'. Available properties: [message]"
        );
    }

    #[test]
    fn unresolved_ids_fall_back_to_the_id() {
        let e = CompileError::UnknownIntegration { block_id: "zz".into(), key_type: "x".into() };
        assert_eq!(e.message(&CompiledFrame::default()), "block 'zz' uses unknown integration 'x'");
    }

    #[test]
    fn display_lists_every_error() {
        let errs = CompileErrors {
            frame: frame(),
            errors: vec![
                CompileError::EndTriggerWithChildren { trigger_id: "t1".into() },
                CompileError::DuplicateKey { key: "root".into(), block_ids: vec!["b1".into(), "b9".into()] },
            ],
        };
        let text = errs.to_string();
        assert!(text.starts_with("compile failed with 2 error(s):"));
        assert!(text.contains("The go can not have a subTrigger"));
        assert!(text.contains("Duplicate block key 'root' used by 2 blocks"));
    }
}
