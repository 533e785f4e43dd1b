//! Heuristic source analysis for completion and hover.
//!
//! The document is almost never well-formed at the cursor, so this works on
//! the raw text before the cursor instead of the parsed frame.

use std::sync::LazyLock;

use regex::Regex;
use tower_lsp::lsp_types::Position;

static HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(block|trigger)\s*\(").expect("valid regex"));
static KEY_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"keyType\s*=\s*"([^"]*)""#).expect("valid regex"));
static OPEN_METHOD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.(\w+)\s*\(([^()]*)$").expect("valid regex"));
static OPEN_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(frame|block|trigger)\s*\(([^()]*)$").expect("valid regex"));
static VAR_TYPE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bvar\s+\w+\s*:\s*\w*$").expect("valid regex"));
static METHOD_DOT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.\w*$").expect("valid regex"));
static OPEN_STRING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"(\w+)\s*=\s*"[^"]*$"#).expect("valid regex"));

// ── Context kind ──────────────────────────────────────────────────────────

/// Whether the cursor sits under a block or a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    Block,
    Trigger,
}

/// What the cursor is positioned inside, used to drive completions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Context {
    /// Start of a statement: `frame`, `var`, `block`, `trigger`.
    Statement,
    /// After a `.` following a block or trigger header.
    Method { owner: Owner },
    /// After `var name:`.
    TypeName,
    /// Inside `then = "` or `.then("`.
    Outcome,
    /// Inside `keyType = "`.
    KeyType { owner: Owner },
    /// On a key position of a header's attribute list.
    Attribute { header: String },
    /// On a key position inside `.prop(`, `.data(`, `.slot("` or `.action(`.
    Argument { method: String, owner: Owner, key_type: Option<String> },
    Unknown,
}

// ── word_at ───────────────────────────────────────────────────────────────

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '/' | '-')
}

/// The word under (or just before) the cursor. Integration kinds such as
/// `nativeblocks/text` count as one word.
pub fn word_at<'t>(text: &'t str, pos: &Position) -> Option<&'t str> {
    let line = text.lines().nth(pos.line as usize)?;
    let col = floor_char_boundary(line, pos.character as usize);

    let start = line[..col].rfind(|c: char| !is_word_char(c)).map(|i| i + 1).unwrap_or(0);
    let end = col + line[col..].find(|c: char| !is_word_char(c)).unwrap_or(line.len() - col);

    if start < end { Some(&line[start..end]) } else { None }
}

fn floor_char_boundary(s: &str, mut i: usize) -> usize {
    i = i.min(s.len());
    while !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

// ── enclosing header ──────────────────────────────────────────────────────

/// The nearest `block(` or `trigger(` header before the cursor, and the
/// `keyType` it declares, if any.
pub fn enclosing_header(before: &str) -> Option<(Owner, Option<String>)> {
    let m = HEADER.captures_iter(before).last()?;
    let owner = if &m[1] == "trigger" { Owner::Trigger } else { Owner::Block };
    let start = m.get(0).map(|g| g.start()).unwrap_or(0);
    let key_type = KEY_TYPE.captures(&before[start..]).map(|c| c[1].to_string());
    Some((owner, key_type))
}

// ── completion_context ────────────────────────────────────────────────────

/// Classify the cursor position for completion.
pub fn completion_context(text: &str, pos: &Position) -> Context {
    let before = text_before(text, pos.line as usize, pos.character as usize);
    let current = strip_comment(before.rsplit('\n').next().unwrap_or(""));

    if VAR_TYPE.is_match(current) {
        return Context::TypeName;
    }

    if let Some(c) = OPEN_METHOD.captures(current) {
        let method = c[1].to_string();
        let args = &c[2];
        let (owner, key_type) = enclosing_header(&before).unwrap_or((Owner::Block, None));
        return match &c[1] {
            "then" => Context::Outcome,
            "slot" => Context::Argument { method, owner, key_type },
            _ if at_key_position(args) => Context::Argument { method, owner, key_type },
            "action" if OPEN_STRING.captures(args).is_some_and(|s| &s[1] == "event") => {
                Context::Argument { method, owner, key_type }
            }
            _ => Context::Unknown,
        };
    }

    if let Some(c) = OPEN_HEADER.captures(current) {
        let header = c[1].to_string();
        let args = &c[2];
        let owner = if header == "trigger" { Owner::Trigger } else { Owner::Block };
        if let Some(s) = OPEN_STRING.captures(args) {
            return match &s[1] {
                "keyType" if header != "frame" => Context::KeyType { owner },
                "then" if header == "trigger" => Context::Outcome,
                _ => Context::Unknown,
            };
        }
        if at_key_position(args) {
            return Context::Attribute { header };
        }
        return Context::Unknown;
    }

    if METHOD_DOT.is_match(current) {
        if let Some((owner, _)) = enclosing_header(&before) {
            return Context::Method { owner };
        }
    }

    let trimmed = current.trim();
    if trimmed.is_empty() || trimmed.chars().all(|c| c.is_alphanumeric() || c == '_') {
        Context::Statement
    } else {
        Context::Unknown
    }
}

/// True when the text since the last `(` or `,` has no `=` yet.
fn at_key_position(args: &str) -> bool {
    let tail = args.rsplit(',').next().unwrap_or(args);
    !tail.contains('=') && !tail.contains('"')
}

// ── helpers ───────────────────────────────────────────────────────────────

/// Cut a line at the first `//` that is not inside a string literal.
fn strip_comment(s: &str) -> &str {
    let mut in_string = false;
    let mut prev = '\0';
    for (i, c) in s.char_indices() {
        match c {
            '"' => in_string = !in_string,
            '/' if prev == '/' && !in_string => return &s[..i - 1],
            _ => {}
        }
        prev = c;
    }
    s
}

/// Source text from the beginning of the file up to `(line, col)`.
pub fn text_before(text: &str, line_idx: usize, col: usize) -> String {
    let mut out = String::new();
    for (i, line) in text.lines().enumerate() {
        if i < line_idx {
            out.push_str(line);
            out.push('\n');
        } else if i == line_idx {
            out.push_str(&line[..floor_char_boundary(line, col)]);
            break;
        } else {
            break;
        }
    }
    out
}
