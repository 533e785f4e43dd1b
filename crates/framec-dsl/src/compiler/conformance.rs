//! Checks flattened rows against the integration registry.

use crate::ast::ROOT_KEY_TYPE;
use crate::compiled::{ActionRow, BlockRow, CompiledFrame};
use crate::registry::{BlockIntegration, Integration, IntegrationRegistry};

use super::error::{CompileError, Owner};

fn owned(keys: Vec<&str>) -> Vec<String> {
    keys.into_iter().map(str::to_string).collect()
}

/// Every registry violation in `frame`; blocks first, then triggers.
pub fn check(frame: &CompiledFrame, registry: &IntegrationRegistry) -> Vec<CompileError> {
    let mut errors = Vec::new();

    for block in frame.blocks.iter().filter(|b| b.key_type != ROOT_KEY_TYPE) {
        match registry.block(&block.key_type) {
            None => errors.push(CompileError::UnknownIntegration {
                block_id: block.id.clone(),
                key_type: block.key_type.clone(),
            }),
            Some(integration) => check_block(frame, block, integration, &mut errors),
        }
    }

    for action in &frame.actions {
        check_triggers(action, registry, &mut errors);
    }
    errors
}

fn check_block(frame: &CompiledFrame, block: &BlockRow, integration: &BlockIntegration, errors: &mut Vec<CompileError>) {
    let owner = || Owner::Block { block_id: block.id.clone() };

    for prop in block.properties.iter().filter(|p| !integration.has_property(&p.key)) {
        errors.push(CompileError::IllegalProperty {
            owner: owner(),
            key: prop.key.clone(),
            integration: block.key_type.clone(),
            available: owned(integration.property_keys()),
        });
    }
    for data in block.data.iter().filter(|d| !integration.has_data(&d.key)) {
        errors.push(CompileError::IllegalData {
            owner: owner(),
            key: data.key.clone(),
            integration: block.key_type.clone(),
            available: owned(integration.data_keys()),
        });
    }
    for slot in block.slots.iter().filter(|s| !integration.has_slot(&s.slot)) {
        errors.push(CompileError::IllegalSlot {
            block_id: block.id.clone(),
            slot: slot.slot.clone(),
            integration: block.key_type.clone(),
            available: owned(integration.slot_names()),
        });
    }

    let events = frame.actions.iter().filter(|a| a.key == block.key);
    for action in events.filter(|a| !integration.has_event(&a.event)) {
        errors.push(CompileError::IllegalEvent {
            block_id: block.id.clone(),
            event: action.event.clone(),
            integration: block.key_type.clone(),
            available: owned(integration.event_names()),
        });
    }
}

fn check_triggers(action: &ActionRow, registry: &IntegrationRegistry, errors: &mut Vec<CompileError>) {
    for trigger in &action.triggers {
        let Some(integration) = registry.action(&trigger.key_type) else {
            errors.push(CompileError::UnknownActionIntegration {
                action_id: action.id.clone(),
                trigger_id: trigger.id.clone(),
                key_type: trigger.key_type.clone(),
            });
            continue;
        };

        let owner = || Owner::Trigger { action_id: action.id.clone(), trigger_id: trigger.id.clone() };
        for prop in trigger.properties.iter().filter(|p| !integration.has_property(&p.key)) {
            errors.push(CompileError::IllegalProperty {
                owner: owner(),
                key: prop.key.clone(),
                integration: trigger.key_type.clone(),
                available: owned(integration.property_keys()),
            });
        }
        for data in trigger.data.iter().filter(|d| !integration.has_data(&d.key)) {
            errors.push(CompileError::IllegalData {
                owner: owner(),
                key: data.key.clone(),
                integration: trigger.key_type.clone(),
                available: owned(integration.data_keys()),
            });
        }
    }
}
