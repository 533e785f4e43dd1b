use std::collections::HashMap;

use crate::ast::{
    Action, Block, Data, Frame, Pos, Property, Slot, Trigger, Variable, DEFAULT_SLOT, DEFAULT_THEN, END_THEN,
    ROOT_KEY_TYPE,
};
use crate::diagnostics::{self, Diagnostic, Diagnostics};
use crate::lexer::{Token, TokenKind};
use crate::types::{self, ValueType};

pub const FRAME_ATTRIBUTES: &[&str] = &["name", "route"];
pub const BLOCK_ATTRIBUTES: &[&str] = &["keyType", "key", "visibility", "version"];
pub const TRIGGER_ATTRIBUTES: &[&str] = &["keyType", "name", "then", "version"];
pub const ACTION_ATTRIBUTES: &[&str] = &["event"];
pub const PROP_VALUE_KEYS: &[&str] =
    &["value", "mobile", "tablet", "desktop", "valueMobile", "valueTablet", "valueDesktop"];
pub const BLOCK_METHODS: &[&str] = &["data", "prop", "slot", "action"];
pub const TRIGGER_METHODS: &[&str] = &["data", "prop", "then"];

/// Result of a parse: the frame, if the document was structurally sound
/// enough to build one, and everything that went wrong along the way.
#[derive(Debug, Clone)]
pub struct ParseOutput {
    pub frame: Option<Frame>,
    pub diagnostics: Diagnostics,
}

/// One `key = value` entry of a parenthesised attribute list.
struct Pair {
    key: String,
    value: Token,
}

fn pos_of(tok: &Token) -> Pos {
    Pos::new(tok.line, tok.column)
}

// ── Parser ────────────────────────────────────────────────────────────────

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    diags: Diagnostics,
    /// Declared variable types, so data bindings can take their variable's type.
    var_types: HashMap<String, ValueType>,
}

impl Parser {
    /// `source` is only used to quote lines in diagnostics. Illegal tokens are
    /// reported here and removed from the stream.
    pub fn new(tokens: Vec<Token>, source: &str) -> Self {
        let mut diags = Diagnostics::new(source);
        let mut kept: Vec<Token> = Vec::with_capacity(tokens.len());

        for tok in tokens {
            if tok.is(TokenKind::Illegal) {
                let message = if tok.literal.starts_with('"') {
                    "Unterminated string literal".to_string()
                } else {
                    format!("Illegal character '{}'", tok.literal)
                };
                diags.push(Diagnostic::at_token(message, &tok));
            } else {
                kept.push(tok);
            }
        }

        if !kept.last().is_some_and(|t| t.is(TokenKind::Eof)) {
            let (line, column) = kept.last().map(|t| (t.line, t.column)).unwrap_or((1, 1));
            kept.push(Token { kind: TokenKind::Eof, literal: String::new(), line, column });
        }

        Self { tokens: kept, pos: 0, diags, var_types: HashMap::new() }
    }

    pub fn parse(mut self) -> ParseOutput {
        let frame = self.parse_frame();
        match &frame {
            Some(f) => log::debug!(
                "parsed frame '{}': {} variables, {} root blocks, {} errors",
                f.name,
                f.variables.len(),
                f.blocks.len(),
                self.diags.errors().len()
            ),
            None => log::debug!("parse failed before a frame could be built"),
        }
        ParseOutput { frame, diagnostics: self.diags }
    }

    // ── Token helpers ─────────────────────────────────────────────────────

    fn peek(&self) -> &Token {
        // the stream always ends with Eof and `advance` never moves past it
        &self.tokens[self.pos]
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek().is(kind)
    }

    fn at_keyword(&self, word: &str) -> bool {
        self.peek().is_keyword(word)
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn unexpected(&mut self, expected: TokenKind) {
        let d = diagnostics::unexpected_token(expected, self.peek());
        self.diags.push(d);
    }

    fn error_here(&mut self, message: impl Into<String>) {
        let d = Diagnostic::at_token(message, self.peek());
        self.diags.push(d);
    }

    fn expect(&mut self, kind: TokenKind) -> Option<Token> {
        if self.at(kind) {
            Some(self.advance())
        } else {
            self.unexpected(kind);
            None
        }
    }

    /// Attribute names may collide with keywords (`then = "SUCCESS"`).
    fn expect_key(&mut self) -> Option<Token> {
        if self.at(TokenKind::Ident) || self.at(TokenKind::Keyword) {
            Some(self.advance())
        } else {
            self.unexpected(TokenKind::Ident);
            None
        }
    }

    fn expect_value(&mut self) -> Option<Token> {
        if self.peek().kind.is_value() {
            Some(self.advance())
        } else {
            let shown = if self.at(TokenKind::Eof) { "end of input".to_string() } else { self.peek().literal.clone() };
            self.error_here(format!("Expected a value, but got '{shown}'"));
            None
        }
    }

    /// Skip to the next point a body loop can resume from.
    fn synchronize(&mut self) {
        while !(self.at(TokenKind::Eof)
            || self.at(TokenKind::RBrace)
            || self.at_keyword("var")
            || self.at_keyword("block")
            || self.at_keyword("trigger"))
        {
            self.advance();
        }
    }

    /// Report whatever sits where `expected` should be, then skip past it.
    fn skip_unexpected(&mut self, expected: &str) {
        let tok = self.advance();
        self.diags.push(Diagnostic::at_token(
            format!("Unexpected '{}', expected {expected}", tok.literal),
            &tok,
        ));
        self.synchronize();
    }

    /// `( key = value, ... )`. Keys outside `valid` are reported but still
    /// returned; an empty `valid` accepts any key. `None` when the list is
    /// malformed.
    fn pairs(&mut self, context: &str, valid: &[&str]) -> Option<Vec<Pair>> {
        self.expect(TokenKind::LParen)?;
        let mut pairs = Vec::new();
        loop {
            if self.at(TokenKind::RParen) {
                self.advance();
                return Some(pairs);
            }
            let key = self.expect_key()?;
            self.expect(TokenKind::Assign)?;
            let value = self.expect_value()?;

            if !valid.is_empty() && !valid.contains(&key.literal.as_str()) {
                self.diags.push(diagnostics::unknown_attribute(&key.literal, context, key.line, key.column, valid));
            }
            pairs.push(Pair { key: key.literal, value });

            if self.at(TokenKind::Comma) {
                self.advance();
            } else if !self.at(TokenKind::RParen) {
                self.unexpected(TokenKind::RParen);
                return None;
            }
        }
    }

    fn version(&mut self, tok: &Token) -> i32 {
        match tok.literal.parse::<i32>() {
            Ok(v) if tok.is(TokenKind::Int) => v,
            _ => {
                self.diags.push(Diagnostic::at_token(
                    format!("Version must be an integer, but got '{}'", tok.literal),
                    tok,
                ));
                0
            }
        }
    }

    /// Type of a data value: the variable's declared type for a bound
    /// variable, otherwise whatever the literal looks like.
    fn binding_type(&self, tok: &Token) -> ValueType {
        if tok.is(TokenKind::Ident) {
            if let Some(t) = self.var_types.get(&tok.literal) {
                return *t;
            }
        }
        types::infer(&tok.literal)
    }

    // ── Frame ─────────────────────────────────────────────────────────────

    fn parse_frame(&mut self) -> Option<Frame> {
        if !self.at_keyword("frame") {
            let d = Diagnostic::at_token("Program must start with a frame declaration", self.peek())
                .with_suggestion("Start the document with frame(name = \"...\", route = \"...\")");
            self.diags.push(d);
            return None;
        }
        let start = self.advance();

        let header = self.pairs("frame", FRAME_ATTRIBUTES)?;
        let mut frame = Frame { pos: pos_of(&start), ..Default::default() };
        for pair in header {
            match pair.key.as_str() {
                "name" => frame.name = pair.value.literal,
                "route" => frame.route = pair.value.literal,
                _ => {}
            }
        }

        if self.at(TokenKind::LBrace) {
            self.advance();
            self.parse_frame_body(&mut frame);
        }

        if !self.at(TokenKind::Eof) {
            let lit = self.peek().literal.clone();
            self.error_here(format!("Unexpected '{lit}' after the end of the frame"));
        }

        if let Some(first) = frame.blocks.first() {
            if first.key_type != ROOT_KEY_TYPE {
                self.diags.push(
                    Diagnostic::error(
                        format!("The first block must be {ROOT_KEY_TYPE}, found '{}'", first.key_type),
                        first.pos.line,
                        first.pos.column,
                    )
                    .with_suggestion(format!("Wrap the content in block(keyType = \"{ROOT_KEY_TYPE}\", key = \"root\")")),
                );
            }
        }
        Some(frame)
    }

    fn parse_frame_body(&mut self, frame: &mut Frame) {
        loop {
            if self.at(TokenKind::RBrace) {
                self.advance();
                return;
            }
            if self.at(TokenKind::Eof) {
                self.error_here("Expected '}' to close the frame body");
                return;
            }
            if self.at_keyword("var") {
                match self.parse_variable() {
                    Some(v) => frame.variables.push(v),
                    None => self.synchronize(),
                }
            } else if self.at_keyword("block") {
                match self.parse_block("") {
                    Some(b) => frame.blocks.push(b),
                    None => self.synchronize(),
                }
            } else {
                self.skip_unexpected("'var' or 'block'");
            }
        }
    }

    // ── Variable ──────────────────────────────────────────────────────────

    fn parse_variable(&mut self) -> Option<Variable> {
        self.advance(); // consume `var`
        let key = self.expect(TokenKind::Ident)?;
        self.expect(TokenKind::Colon)?;
        let ty = self.expect(TokenKind::Ident)?;
        self.expect(TokenKind::Assign)?;
        let value = self.expect_value()?;

        if let Ok(t) = ty.literal.parse::<ValueType>() {
            self.var_types.entry(key.literal.clone()).or_insert(t);
        }

        Some(Variable { pos: pos_of(&key), key: key.literal, var_type: ty.literal, value: value.literal })
    }

    // ── Block ─────────────────────────────────────────────────────────────

    fn parse_block(&mut self, slot: &str) -> Option<Block> {
        let start = self.advance(); // consume `block`
        let header = self.pairs("block", BLOCK_ATTRIBUTES)?;

        let mut block = Block { slot: slot.to_string(), pos: pos_of(&start), ..Default::default() };
        for pair in header {
            match pair.key.as_str() {
                "keyType" => block.key_type = pair.value.literal,
                "key" => block.key = pair.value.literal,
                "visibility" => block.visibility_key = pair.value.literal,
                "version" => block.integration_version = self.version(&pair.value),
                _ => {}
            }
        }

        loop {
            if self.at(TokenKind::Dot) {
                self.advance();
                if self.block_method(&mut block).is_none() {
                    self.synchronize();
                    break;
                }
            } else if self.at(TokenKind::LBrace) {
                // a bare body is shorthand for `.slot("content") { ... }`
                if !block.declares_slot(DEFAULT_SLOT) {
                    block.slots.push(Slot { name: DEFAULT_SLOT.to_string(), pos: pos_of(self.peek()) });
                }
                if self.slot_body(&mut block, DEFAULT_SLOT).is_none() {
                    break;
                }
            } else {
                break;
            }
        }
        Some(block)
    }

    fn block_method(&mut self, block: &mut Block) -> Option<()> {
        let method = self.advance();
        match method.literal.as_str() {
            "data" => {
                let data = self.parse_data()?;
                block.data.extend(data);
            }
            "prop" | "props" => {
                let props = self.parse_props()?;
                block.properties.extend(props);
            }
            "slot" => self.parse_slot(block)?,
            "action" => {
                let action = self.parse_action(&block.key, pos_of(&method))?;
                block.actions.push(action);
            }
            other => {
                self.diags.push(diagnostics::unknown_attribute(
                    other,
                    "block methods",
                    method.line,
                    method.column,
                    BLOCK_METHODS,
                ));
                return None;
            }
        }
        Some(())
    }

    fn parse_data(&mut self) -> Option<Vec<Data>> {
        let pairs = self.pairs("data", &[])?;
        Some(
            pairs
                .into_iter()
                .map(|p| Data {
                    value_type: self.binding_type(&p.value),
                    pos: pos_of(&p.value),
                    key: p.key,
                    value: p.value.literal,
                })
                .collect(),
        )
    }

    // ── Properties ────────────────────────────────────────────────────────

    fn parse_props(&mut self) -> Option<Vec<Property>> {
        self.expect(TokenKind::LParen)?;
        let mut props = Vec::new();
        loop {
            if self.at(TokenKind::RParen) {
                self.advance();
                return Some(props);
            }
            let key = self.expect_key()?;
            self.expect(TokenKind::Assign)?;

            let prop = if self.at(TokenKind::LParen) {
                self.prop_group(&key)?
            } else {
                let value = self.prop_value()?;
                let value_type = types::infer(&value);
                Property { pos: pos_of(&key), ..Property::uniform(key.literal, value, value_type) }
            };
            props.push(prop);

            if self.at(TokenKind::Comma) {
                self.advance();
            } else if !self.at(TokenKind::RParen) {
                self.unexpected(TokenKind::RParen);
                return None;
            }
        }
    }

    /// A single value. Bare tokens keep accumulating until `,` or `)`;
    /// tokens on a new line are joined with `\n`, others with a space.
    fn prop_value(&mut self) -> Option<String> {
        let first = self.expect_value()?;
        let mut value = first.literal;
        let mut line = first.line;
        while self.peek().kind.is_value() {
            let tok = self.advance();
            value.push(if tok.line != line { '\n' } else { ' ' });
            value.push_str(&tok.literal);
            line = tok.line;
        }
        Some(value)
    }

    /// `key = (mobile = .., tablet = .., desktop = ..)` or `key = (value = ..)`.
    fn prop_group(&mut self, key: &Token) -> Option<Property> {
        let pairs = self.pairs("property values", PROP_VALUE_KEYS)?;
        let mut prop = Property { key: key.literal.clone(), pos: pos_of(key), ..Default::default() };

        // `value` first so device-specific entries override it
        for pair in pairs.iter().filter(|p| p.key == "value") {
            prop.mobile = pair.value.literal.clone();
            prop.tablet = pair.value.literal.clone();
            prop.desktop = pair.value.literal.clone();
        }
        for pair in &pairs {
            let v = pair.value.literal.clone();
            match pair.key.as_str() {
                "mobile" | "valueMobile" => prop.mobile = v,
                "tablet" | "valueTablet" => prop.tablet = v,
                "desktop" | "valueDesktop" => prop.desktop = v,
                _ => {}
            }
        }
        prop.value_type = types::infer(&prop.mobile);
        Some(prop)
    }

    // ── Slot ──────────────────────────────────────────────────────────────

    fn parse_slot(&mut self, block: &mut Block) -> Option<()> {
        self.expect(TokenKind::LParen)?;
        let name = self.expect(TokenKind::Str)?;
        self.expect(TokenKind::RParen)?;
        if !block.declares_slot(&name.literal) {
            block.slots.push(Slot { name: name.literal.clone(), pos: pos_of(&name) });
        }
        self.slot_body(block, &name.literal)
    }

    /// `{ block* }`, stamping each child with `slot`.
    fn slot_body(&mut self, block: &mut Block, slot: &str) -> Option<()> {
        self.expect(TokenKind::LBrace)?;
        loop {
            if self.at(TokenKind::RBrace) {
                self.advance();
                return Some(());
            }
            if self.at(TokenKind::Eof) {
                self.error_here(format!("Expected '}}' to close slot '{slot}'"));
                return None;
            }
            if self.at_keyword("block") {
                match self.parse_block(slot) {
                    Some(child) => block.blocks.push(child),
                    None => self.synchronize(),
                }
            } else {
                self.skip_unexpected("'block'");
            }
        }
    }

    // ── Action ────────────────────────────────────────────────────────────

    fn parse_action(&mut self, block_key: &str, pos: Pos) -> Option<Action> {
        let header = self.pairs("action", ACTION_ATTRIBUTES)?;
        let mut action = Action { block_key: block_key.to_string(), pos, ..Default::default() };
        for pair in header {
            if pair.key == "event" {
                action.event = pair.value.literal;
            }
        }

        action.triggers = self.trigger_body("action", DEFAULT_THEN)?;
        Some(action)
    }

    /// `{ trigger* }` where every trigger defaults to outcome `then`.
    fn trigger_body(&mut self, owner: &str, then: &str) -> Option<Vec<Trigger>> {
        self.expect(TokenKind::LBrace)?;
        let mut triggers = Vec::new();
        loop {
            if self.at(TokenKind::RBrace) {
                self.advance();
                return Some(triggers);
            }
            if self.at(TokenKind::Eof) {
                self.error_here(format!("Expected '}}' to close {owner}"));
                return None;
            }
            if self.at_keyword("trigger") {
                match self.parse_trigger(then) {
                    Some(t) => triggers.push(t),
                    None => self.synchronize(),
                }
            } else {
                self.skip_unexpected("'trigger'");
            }
        }
    }

    // ── Trigger ───────────────────────────────────────────────────────────

    fn parse_trigger(&mut self, default_then: &str) -> Option<Trigger> {
        let start = self.advance(); // consume `trigger`
        let header = self.pairs("trigger", TRIGGER_ATTRIBUTES)?;

        let mut trigger = Trigger { then: default_then.to_string(), pos: pos_of(&start), ..Default::default() };
        for pair in header {
            match pair.key.as_str() {
                "keyType" => trigger.key_type = pair.value.literal,
                "name" => trigger.name = pair.value.literal,
                "then" => trigger.then = pair.value.literal,
                "version" => trigger.integration_version = self.version(&pair.value),
                _ => {}
            }
        }

        while self.at(TokenKind::Dot) {
            self.advance();
            if self.trigger_method(&mut trigger).is_none() {
                self.synchronize();
                break;
            }
        }

        if trigger.then == END_THEN && !trigger.triggers.is_empty() {
            self.report_end_nesting(&trigger.name, trigger.pos);
            trigger.triggers.clear();
        }
        Some(trigger)
    }

    fn trigger_method(&mut self, trigger: &mut Trigger) -> Option<()> {
        let method = self.advance();
        match method.literal.as_str() {
            "data" => {
                let data = self.parse_data()?;
                trigger.data.extend(data);
            }
            "prop" | "props" => {
                let props = self.parse_props()?;
                trigger.properties.extend(props);
            }
            "then" => {
                self.expect(TokenKind::LParen)?;
                let outcome = self.expect(TokenKind::Str)?;
                self.expect(TokenKind::RParen)?;
                let owner = format!("then(\"{}\")", outcome.literal);
                let nested = self.trigger_body(&owner, &outcome.literal)?;
                if outcome.literal == END_THEN && !nested.is_empty() {
                    self.report_end_nesting(&trigger.name, pos_of(&method));
                } else {
                    trigger.triggers.extend(nested);
                }
            }
            other => {
                self.diags.push(diagnostics::unknown_attribute(
                    other,
                    "trigger methods",
                    method.line,
                    method.column,
                    TRIGGER_METHODS,
                ));
                return None;
            }
        }
        Some(())
    }

    fn report_end_nesting(&mut self, name: &str, pos: Pos) {
        self.diags.push(
            Diagnostic::error(
                format!("The trigger '{name}' can not have nested triggers because it is declared with \"{END_THEN}\" then"),
                pos.line,
                pos.column,
            )
            .with_suggestion("Remove the nested triggers or use another outcome"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn run(src: &str) -> ParseOutput {
        Parser::new(Lexer::new(src).tokenize(), src).parse()
    }

    fn ok(src: &str) -> Frame {
        let out = run(src);
        assert!(!out.diagnostics.has_errors(), "{}", out.diagnostics.render_all());
        out.frame.expect("frame")
    }

    fn err(src: &str) -> ParseOutput {
        let out = run(src);
        assert!(out.diagnostics.has_errors(), "expected errors for {src}");
        out
    }

    fn messages(out: &ParseOutput) -> Vec<String> {
        out.diagnostics.errors().iter().map(|d| d.message.clone()).collect()
    }

    #[test]
    fn welcome_frame() {
        let f = ok(r#"frame(name="welcome", route="/welcome"){ var count: INT = 0  block(keyType="ROOT", key="root"){ } }"#);
        assert_eq!(f.name, "welcome");
        assert_eq!(f.route, "/welcome");
        assert_eq!(f.frame_type, "FRAME");
        assert_eq!(f.variables.len(), 1);
        assert_eq!(f.variables[0].var_type, "INT");
        assert_eq!(f.blocks.len(), 1);
        assert_eq!(f.blocks[0].slot, "");
    }

    #[test]
    fn header_only_frame() {
        let f = ok(r#"frame(name = "a", route = "/a")"#);
        assert!(f.blocks.is_empty());
    }

    #[test]
    fn all_variable_types() {
        let f = ok(r#"
frame(name = "types_test", route = "/types") {
    var boolVar: BOOLEAN = true
    var intVar: INT = 42
    var negVar: INT = -7
    var longVar: LONG = 9223372036854775807
    var floatVar: FLOAT = 3.14
    var doubleVar: DOUBLE = 3.141592653589793
    var stringVar: STRING = "Hello World"
}"#);
        let values: Vec<&str> = f.variables.iter().map(|v| v.value.as_str()).collect();
        assert_eq!(values, ["true", "42", "-7", "9223372036854775807", "3.14", "3.141592653589793", "Hello World"]);
    }

    #[test]
    fn nested_slots_stamp_children() {
        let f = ok(r#"
frame(name = "n", route = "/n") {
    block(keyType = "ROOT", key = "root")
    .slot("content") {
        block(keyType = "nativeblocks/column", key = "column1", version = 1)
        .slot("content") {
            block(keyType = "nativeblocks/text", key = "text1", version = 2)
        }
    }
}"#);
        let root = &f.blocks[0];
        assert_eq!(root.slots[0].name, "content");
        let column = &root.blocks[0];
        assert_eq!(column.slot, "content");
        assert_eq!(column.integration_version, 1);
        assert_eq!(column.blocks[0].key, "text1");
        assert_eq!(column.blocks[0].slot, "content");
        assert_eq!(column.blocks[0].integration_version, 2);
    }

    #[test]
    fn method_chain_in_any_order() {
        let f = ok(r#"
frame(name = "p", route = "/p") {
    var visible: BOOLEAN = true
    block(keyType = "ROOT", key = "root", visibility = visible)
    .data(text = visible)
    .prop(width = "match", height = "wrap")
    .data(extra = "1")
}"#);
        let root = &f.blocks[0];
        assert_eq!(root.visibility_key, "visible");
        assert_eq!(root.properties.len(), 2);
        assert_eq!(root.data.len(), 2);
        assert_eq!(root.data[0].value_type, ValueType::Boolean);
        assert_eq!(root.data[1].value_type, ValueType::Int);
    }

    #[test]
    fn device_scoped_property() {
        let f = ok(r#"
frame(name = "p", route = "/p") {
    block(keyType = "ROOT", key = "root")
    .prop(padding = (value = "4", desktop = "16"), margin = (mobile = "1", tablet = "2", desktop = "3"))
}"#);
        let props = &f.blocks[0].properties;
        assert_eq!((props[0].mobile.as_str(), props[0].tablet.as_str(), props[0].desktop.as_str()), ("4", "4", "16"));
        assert_eq!((props[1].mobile.as_str(), props[1].tablet.as_str(), props[1].desktop.as_str()), ("1", "2", "3"));
    }

    #[test]
    fn script_property_is_verbatim() {
        let f = ok(r##"
frame(name = "s", route = "/s") {
    var count: INT = 0
    block(keyType = "ROOT", key = "root")
    .action(event = "onClick") {
        trigger(keyType = "nativeblocks/change_variable", name = "calculate", version = 1)
        .prop(variableValue = "#SCRIPT
        const result = {var:count} + 1
        #ENDSCRIPT")
        .data(variableKey = count)
    }
}"##);
        let trigger = &f.blocks[0].actions[0].triggers[0];
        let value = &trigger.properties[0].mobile;
        assert!(value.starts_with("#SCRIPT\n"));
        assert!(value.trim_end().ends_with("#ENDSCRIPT"));
        assert_eq!(trigger.data[0].value_type, ValueType::Int);
    }

    #[test]
    fn bare_tokens_accumulate() {
        let f = ok("frame(name = \"s\", route = \"/s\") {\n block(keyType = \"ROOT\", key = \"root\")\n .prop(text = hello world\n again)\n}");
        assert_eq!(f.blocks[0].properties[0].mobile, "hello world\nagain");
    }

    #[test]
    fn actions_and_then_branches() {
        let f = ok(r#"
frame(name = "a", route = "/a") {
    block(keyType = "ROOT", key = "root")
    .action(event = "onClick") {
        trigger(keyType = "nativeblocks/change_variable", name = "first", version = 1)
        .then("SUCCESS") {
            trigger(keyType = "nativeblocks/log", name = "second")
        }
        .then("FAILURE") {
            trigger(keyType = "nativeblocks/log", name = "third", then = "FAILURE")
        }
    }
}"#);
        let action = &f.blocks[0].actions[0];
        assert_eq!(action.block_key, "root");
        assert_eq!(action.event, "onClick");
        let first = &action.triggers[0];
        assert_eq!(first.then, "NEXT");
        assert_eq!(first.triggers.len(), 2);
        assert_eq!(first.triggers[0].then, "SUCCESS");
        assert_eq!(first.triggers[1].then, "FAILURE");
    }

    #[test]
    fn end_then_with_nested_triggers_is_an_error() {
        let out = err(r#"
frame(name = "e", route = "/e") {
    block(keyType = "ROOT", key = "root")
    .action(event = "onClick") {
        trigger(keyType = "a", name = "stop")
        .then("END") {
            trigger(keyType = "b", name = "never")
        }
    }
}"#);
        assert!(messages(&out).iter().any(|m| m.contains("'stop'") && m.contains("END")));
        let f = out.frame.expect("frame");
        assert!(f.blocks[0].actions[0].triggers[0].triggers.is_empty());
    }

    #[test]
    fn end_trigger_declared_in_header_cannot_nest() {
        let out = err(r#"
frame(name = "e", route = "/e") {
    block(keyType = "ROOT", key = "root")
    .action(event = "onClick") {
        trigger(keyType = "a", name = "stop", then = "END")
        .then("NEXT") {
            trigger(keyType = "b", name = "never")
        }
    }
}"#);
        assert!(messages(&out).iter().any(|m| m.contains("END")));
    }

    #[test]
    fn missing_frame_is_fatal() {
        let out = err(r#"block(keyType = "ROOT", key = "root")"#);
        assert!(out.frame.is_none());
        assert_eq!(messages(&out), ["Program must start with a frame declaration"]);
    }

    #[test]
    fn missing_paren_is_fatal() {
        assert!(err(r#"frame name = "x""#).frame.is_none());
    }

    #[test]
    fn unterminated_header_is_fatal() {
        assert!(err(r#"frame(name = "x" route = "/x") { }"#).frame.is_none());
        assert!(err(r#"frame(name = "x""#).frame.is_none());
    }

    #[test]
    fn unknown_header_attribute_suggests() {
        let out = err(r#"frame(nme = "x", route = "/x")"#);
        let d = &out.diagnostics.errors()[0];
        assert_eq!(d.message, "Unknown attribute 'nme' in frame");
        assert_eq!(d.suggestion.as_deref(), Some("Did you mean 'name'?"));
        assert!(out.frame.is_some());
    }

    #[test]
    fn first_block_must_be_root() {
        let out = err(r#"frame(name = "x", route = "/x") { block(keyType = "nativeblocks/text", key = "t") }"#);
        assert!(messages(&out)[0].contains("must be ROOT"));
        assert_eq!(out.frame.expect("frame").blocks.len(), 1);
    }

    #[test]
    fn recovers_and_reports_several_errors() {
        let out = err(r#"
frame(name = "x", route = "/x") {
    var a INT = 1
    var b: INT = 2
    block(keyType = "ROOT", key = "root", colour = "red")
    .slot("content") {
        block(keyType = "t", key = "child").frobnicate()
    }
}"#);
        assert!(out.diagnostics.errors().len() >= 3, "{}", out.diagnostics.render_all());
        let f = out.frame.expect("frame");
        assert_eq!(f.variables.len(), 1);
        assert_eq!(f.variables[0].key, "b");
        assert_eq!(f.blocks[0].blocks[0].key, "child");
    }

    #[test]
    fn unterminated_string_reported() {
        let out = err("frame(name = \"x\", route = \"/x\") { var s: STRING = \"oops }");
        assert!(messages(&out).iter().any(|m| m == "Unterminated string literal"));
    }

    #[test]
    fn version_must_be_integer() {
        let out = err(r#"frame(name = "x", route = "/x") { block(keyType = "ROOT", key = "r", version = "one") }"#);
        assert!(messages(&out)[0].contains("Version must be an integer"));
    }

    #[test]
    fn nodes_record_positions() {
        let f = ok("frame(name = \"x\", route = \"/x\") {\n  var a: INT = 1\n  block(keyType = \"ROOT\", key = \"r\")\n}");
        assert_eq!(f.variables[0].pos, Pos::new(2, 7));
        assert_eq!(f.blocks[0].pos, Pos::new(3, 3));
    }
}
