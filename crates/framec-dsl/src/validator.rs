//! Semantic checks over a parsed frame. Never mutates the tree; every
//! problem is collected, nothing short-circuits.

use std::collections::HashMap;

use crate::ast::{Action, Block, Frame, Pos, Trigger, FRAME_TYPES, THEN_OUTCOMES};
use crate::diagnostics::{self, Diagnostic, Diagnostics};
use crate::types::{self, ValueType};

struct VarInfo {
    key: String,
    pos: Pos,
    used: bool,
}

/// Validate `frame`. `source` is the text it was parsed from, used to quote
/// offending lines; pass `""` when there is none.
pub fn validate(frame: &Frame, source: &str) -> Diagnostics {
    let mut v = Validator { diags: Diagnostics::new(source), vars: Vec::new(), index: HashMap::new() };

    v.frame_attributes(frame);
    v.collect_variables(frame);
    v.block_keys(frame);
    for block in &frame.blocks {
        v.block(block);
    }
    v.unused_variables();

    log::debug!(
        "validated frame '{}': {} errors, {} warnings",
        frame.name,
        v.diags.errors().len(),
        v.diags.warnings().len()
    );
    v.diags
}

/// Starts with an ASCII letter, then letters, digits or `_`. Boolean
/// literals are not references.
pub fn is_variable_name(s: &str) -> bool {
    let mut chars = s.chars();
    let first_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    first_ok && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') && s != "true" && s != "false"
}

struct Validator {
    diags: Diagnostics,
    /// Declaration order.
    vars: Vec<VarInfo>,
    index: HashMap<String, usize>,
}

impl Validator {
    // ── (a) frame ─────────────────────────────────────────────────────────

    fn frame_attributes(&mut self, frame: &Frame) {
        let Pos { line, column } = frame.pos;
        if frame.name.is_empty() {
            self.diags.error("Frame 'name' attribute is required", line, column);
        }
        if frame.route.is_empty() {
            self.diags.error("Frame 'route' attribute is required", line, column);
        }
        if !FRAME_TYPES.contains(&frame.frame_type.as_str()) {
            self.diags.warning(
                format!("Unexpected frame type '{}'. Valid types: {}", frame.frame_type, FRAME_TYPES.join(", ")),
                line,
                column,
                "Consider using one of the standard frame types",
            );
        }
    }

    // ── (b) variables ─────────────────────────────────────────────────────

    fn collect_variables(&mut self, frame: &Frame) {
        for var in &frame.variables {
            let Pos { line, column } = var.pos;

            if let Some(&i) = self.index.get(&var.key) {
                let first = self.vars[i].pos.line;
                self.diags.push(diagnostics::duplicate_declaration(&var.key, line, column, first));
                continue;
            }

            match var.var_type.parse::<ValueType>() {
                Ok(t) => {
                    if let Err(msg) = types::validate(&var.value, t) {
                        let got = types::infer(&var.value);
                        self.diags.push(diagnostics::type_mismatch(&var.key, t.name(), got.name(), &msg, line, column));
                    }
                }
                Err(_) => {
                    let valid: Vec<&str> = ValueType::ALL.iter().map(|t| t.name()).collect();
                    self.diags.push(
                        Diagnostic::error(format!("Unknown type '{}' for variable '{}'", var.var_type, var.key), line, column)
                            .with_note(format!("Valid types: {}", valid.join(", "))),
                    );
                }
            }

            self.index.insert(var.key.clone(), self.vars.len());
            self.vars.push(VarInfo { key: var.key.clone(), pos: var.pos, used: false });
        }
    }

    // ── (c) block keys ────────────────────────────────────────────────────

    fn block_keys(&mut self, frame: &Frame) {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for block in frame.walk_blocks() {
            if block.key.is_empty() {
                continue;
            }
            if let Some(first_line) = seen.get(block.key.as_str()) {
                self.diags.error(
                    format!("Duplicate block key '{}' (first declared at line {first_line})", block.key),
                    block.pos.line,
                    block.pos.column,
                );
            } else {
                seen.insert(&block.key, block.pos.line);
            }
        }
    }

    // ── (d) blocks ────────────────────────────────────────────────────────

    fn block(&mut self, block: &Block) {
        let Pos { line, column } = block.pos;
        if block.key_type.is_empty() {
            self.diags.error(format!("Block '{}' is missing required 'keyType' attribute", block.key), line, column);
        }
        if block.key.is_empty() {
            self.diags.error("Block is missing required 'key' attribute", line, column);
        }

        if !block.visibility_key.is_empty() {
            self.reference(&block.visibility_key, block.pos);
        }
        for data in &block.data {
            self.binding(&data.value, data.pos);
        }
        for action in &block.actions {
            self.action(action, &block.key);
        }
        for child in &block.blocks {
            self.block(child);
        }
    }

    // ── (e) actions ───────────────────────────────────────────────────────

    fn action(&mut self, action: &Action, block_key: &str) {
        if action.event.is_empty() {
            self.diags.error(
                format!("Action in block '{block_key}' is missing required 'event' attribute"),
                action.pos.line,
                action.pos.column,
            );
        }
        for trigger in &action.triggers {
            self.trigger(trigger);
        }
    }

    fn trigger(&mut self, trigger: &Trigger) {
        let Pos { line, column } = trigger.pos;
        if trigger.key_type.is_empty() {
            self.diags.error(format!("Trigger '{}' is missing required 'keyType' attribute", trigger.name), line, column);
        }
        if !THEN_OUTCOMES.contains(&trigger.then.as_str()) {
            let mut d = Diagnostic::error(
                format!("Trigger '{}' has unexpected 'then' value '{}'", trigger.name, trigger.then),
                line,
                column,
            )
            .with_note(format!("Valid outcomes: {}", THEN_OUTCOMES.join(", ")));
            let close = crate::suggest::similar_names(&trigger.then, THEN_OUTCOMES.iter().copied());
            if let Some(s) = crate::suggest::did_you_mean(&close) {
                d = d.with_suggestion(s);
            }
            self.diags.push(d);
        }
        for data in &trigger.data {
            self.binding(&data.value, data.pos);
        }
        for nested in &trigger.triggers {
            self.trigger(nested);
        }
    }

    // ── references ────────────────────────────────────────────────────────

    fn binding(&mut self, value: &str, pos: Pos) {
        let value = value.trim();
        if is_variable_name(value) {
            self.reference(value, pos);
        }
    }

    fn reference(&mut self, name: &str, pos: Pos) {
        match self.index.get(name) {
            Some(&i) => self.vars[i].used = true,
            None => {
                let available: Vec<&str> = self.vars.iter().map(|v| v.key.as_str()).collect();
                let d = diagnostics::undefined_variable(name, pos.line, pos.column, &available);
                self.diags.push(d);
            }
        }
    }

    // ── (f) unused ────────────────────────────────────────────────────────

    fn unused_variables(&mut self) {
        let unused: Vec<(String, Pos)> =
            self.vars.iter().filter(|v| !v.used).map(|v| (v.key.clone(), v.pos)).collect();
        for (key, pos) in unused {
            self.diags.warning(
                format!("Variable '{key}' is declared but never used"),
                pos.line,
                pos.column,
                "Remove the unused variable or use it in your blocks",
            );
        }
    }
}
