//! Static knowledge base: the DSL's keywords, chained methods, value types,
//! and trigger outcomes. Drives hover documentation and completion; the
//! integration kinds themselves come from the registry at runtime.

// ── Entry ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Keyword,
    Method,
    Type,
    Outcome,
}

impl EntryKind {
    pub fn label(self) -> &'static str {
        match self {
            EntryKind::Keyword => "keyword",
            EntryKind::Method => "method",
            EntryKind::Type => "type",
            EntryKind::Outcome => "then outcome",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Entry {
    pub name: &'static str,
    pub kind: EntryKind,
    pub doc: &'static str,
    /// Snippet inserted on completion; `None` inserts the name.
    pub snippet: Option<&'static str>,
}

impl Entry {
    pub fn summary(&self) -> &'static str {
        self.doc.lines().next().unwrap_or("")
    }
}

// ── Keywords ──────────────────────────────────────────────────────────────

pub static KEYWORDS: &[Entry] = &[
    Entry {
        name: "frame",
        kind: EntryKind::Keyword,
        doc: "Declares a screen.\n\nAttributes: `name`, `route`. Route segments written as `{param}` become route arguments.",
        snippet: Some("frame(name = \"$1\", route = \"/$2\") {\n\t$0\n}"),
    },
    Entry {
        name: "var",
        kind: EntryKind::Keyword,
        doc: "Declares a frame variable: `var name: TYPE = value`.\n\nVariables are referenced by `visibility` and by `.data(...)` bindings.",
        snippet: Some("var ${1:name}: ${2:STRING} = $0"),
    },
    Entry {
        name: "block",
        kind: EntryKind::Keyword,
        doc: "Declares a UI block.\n\nAttributes: `keyType`, `key`, `visibility`, `version`. The first block of a frame must be `ROOT`.",
        snippet: Some("block(keyType = \"$1\", key = \"$2\")$0"),
    },
    Entry {
        name: "trigger",
        kind: EntryKind::Keyword,
        doc: "Declares an action trigger inside `.action(...) { }`.\n\nAttributes: `keyType`, `name`, `then`, `version`.",
        snippet: Some("trigger(keyType = \"$1\", name = \"$2\")$0"),
    },
];

// ── Methods ───────────────────────────────────────────────────────────────

pub static METHODS: &[Entry] = &[
    Entry {
        name: "prop",
        kind: EntryKind::Method,
        doc: "Sets properties: `.prop(key = value)` or `.prop(key = (mobile = .., tablet = .., desktop = ..))`.",
        snippet: Some("prop($0)"),
    },
    Entry {
        name: "data",
        kind: EntryKind::Method,
        doc: "Binds data: `.data(key = variable)`. A bare identifier must name a declared variable.",
        snippet: Some("data($0)"),
    },
    Entry {
        name: "slot",
        kind: EntryKind::Method,
        doc: "Declares a named slot and the child blocks placed in it.\n\nA bare `{ }` body is shorthand for `.slot(\"content\") { }`.",
        snippet: Some("slot(\"${1:content}\") {\n\t$0\n}"),
    },
    Entry {
        name: "action",
        kind: EntryKind::Method,
        doc: "Handles a block event: `.action(event = \"onClick\") { trigger(...) }`.",
        snippet: Some("action(event = \"$1\") {\n\t$0\n}"),
    },
    Entry {
        name: "then",
        kind: EntryKind::Method,
        doc: "Nests triggers that run on an outcome of this one: `.then(\"SUCCESS\") { trigger(...) }`.",
        snippet: Some("then(\"${1:SUCCESS}\") {\n\t$0\n}"),
    },
];

/// Methods valid after a block header; the rest are trigger-only.
pub const BLOCK_METHOD_NAMES: &[&str] = framec_dsl::parser::BLOCK_METHODS;
pub const TRIGGER_METHOD_NAMES: &[&str] = framec_dsl::parser::TRIGGER_METHODS;

// ── Types ─────────────────────────────────────────────────────────────────

pub static TYPES: &[Entry] = &[
    Entry { name: "STRING", kind: EntryKind::Type, doc: "Text. Literals must be quoted.", snippet: None },
    Entry { name: "INT", kind: EntryKind::Type, doc: "32-bit integer, at most 9 digits.", snippet: None },
    Entry { name: "LONG", kind: EntryKind::Type, doc: "64-bit integer.", snippet: None },
    Entry { name: "FLOAT", kind: EntryKind::Type, doc: "Single-precision decimal. Requires a decimal point.", snippet: None },
    Entry { name: "DOUBLE", kind: EntryKind::Type, doc: "Double-precision decimal. Requires a decimal point.", snippet: None },
    Entry { name: "BOOLEAN", kind: EntryKind::Type, doc: "`true` or `false`.", snippet: None },
];

// ── Outcomes ──────────────────────────────────────────────────────────────

pub static OUTCOMES: &[Entry] = &[
    Entry { name: "NEXT", kind: EntryKind::Outcome, doc: "Runs after the parent trigger, whatever its result. Default for top-level triggers.", snippet: None },
    Entry { name: "SUCCESS", kind: EntryKind::Outcome, doc: "Runs when the parent trigger succeeds.", snippet: None },
    Entry { name: "FAILURE", kind: EntryKind::Outcome, doc: "Runs when the parent trigger fails.", snippet: None },
    Entry { name: "END", kind: EntryKind::Outcome, doc: "Terminal. A trigger with this outcome may not have nested triggers.", snippet: None },
    Entry { name: "ALWAYS", kind: EntryKind::Outcome, doc: "Runs regardless of the outcome.", snippet: None },
];

// ── Lookup helpers ────────────────────────────────────────────────────────

pub fn entry(name: &str) -> Option<&'static Entry> {
    KEYWORDS.iter().chain(METHODS).chain(TYPES).chain(OUTCOMES).find(|e| e.name == name)
}

pub fn method(name: &str) -> Option<&'static Entry> {
    METHODS.iter().find(|e| e.name == name)
}
