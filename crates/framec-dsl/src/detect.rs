//! Tell the two surface syntaxes apart before choosing a reader.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static XML_PROLOG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*<\?xml").expect("valid regex"));
static DSL_HEADER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*frame\s*\(").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    Dsl,
    Xml,
    Unknown,
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SourceFormat::Dsl => "dsl",
            SourceFormat::Xml => "xml",
            SourceFormat::Unknown => "unknown",
        })
    }
}

pub fn detect_format(content: &str) -> SourceFormat {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return SourceFormat::Unknown;
    }
    if XML_PROLOG.is_match(trimmed) || trimmed.starts_with("<frame") {
        return SourceFormat::Xml;
    }
    if DSL_HEADER.is_match(skip_line_comments(trimmed)) {
        return SourceFormat::Dsl;
    }
    SourceFormat::Unknown
}

fn skip_line_comments(mut s: &str) -> &str {
    while s.starts_with("//") {
        s = s.split_once('\n').map(|(_, rest)| rest.trim_start()).unwrap_or("");
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_dsl() {
        assert_eq!(detect_format(r#"frame(name = "x", route = "/x")"#), SourceFormat::Dsl);
        assert_eq!(detect_format("\n   frame (name = \"x\")"), SourceFormat::Dsl);
        assert_eq!(detect_format("// header\nframe("), SourceFormat::Dsl);
    }

    #[test]
    fn detects_xml() {
        assert_eq!(detect_format(r#"<?xml version="1.0"?><frame/>"#), SourceFormat::Xml);
        assert_eq!(detect_format(r#"  <frame name="x">"#), SourceFormat::Xml);
    }

    #[test]
    fn everything_else_is_unknown() {
        assert_eq!(detect_format(""), SourceFormat::Unknown);
        assert_eq!(detect_format("   "), SourceFormat::Unknown);
        assert_eq!(detect_format("block("), SourceFormat::Unknown);
        assert_eq!(detect_format("frames("), SourceFormat::Unknown);
    }
}
