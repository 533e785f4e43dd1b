//! Lexer, parser, validator, and flat compiler for the **frame DSL**: the
//! textual form of server-driven UI screens (frames of nested blocks, their
//! variables, and the event actions that fire trigger chains).
//!
//! This crate has no async runtime or editor dependency so language-server
//! tooling, CLIs, and services can all embed it.
//!
//! # Structure
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`lexer`] | `Lexer`, `Token`, `TokenKind` |
//! | [`parser`] | `Parser`, `ParseOutput` |
//! | [`ast`] | `Frame`, `Variable`, `Block`, `Action`, `Trigger`, `Property`, `Data`, `Slot` |
//! | [`types`] | `ValueType`, `infer`, `validate` |
//! | [`validator`] | semantic checks over a parsed `Frame` |
//! | [`diagnostics`] | `Diagnostic`, `Diagnostics`, canned constructors |
//! | [`suggest`] | "did you mean" by edit distance |
//! | [`registry`] | `IntegrationRegistry` of block and action kinds |
//! | [`compiled`] | `CompiledFrame` and its row types |
//! | [`compiler`] | `Compiler`, `flatten`, `decompile` |
//! | [`route`] | `{param}` extraction from routes |
//! | [`ids`] | `IdSource` and its UUID / sequential implementations |
//! | [`detect`] | DSL vs XML sniffing |
//! | [`error`] | `ParseError`, `RegistryError`, `PipelineError` |
//!
//! # Quick start
//!
//! ```rust
//! use framec_dsl::{compile_source, IntegrationRegistry};
//!
//! let src = r#"
//!     frame(name = "welcome", route = "/welcome") {
//!         var count: INT = 0
//!         block(keyType = "ROOT", key = "root") { }
//!     }
//! "#;
//!
//! let compiled = compile_source(src, &IntegrationRegistry::default(), None).unwrap();
//! assert_eq!(compiled.name, "welcome");
//! assert_eq!(compiled.variables.len(), 1);
//! assert_eq!(compiled.blocks[0].parent_id, "");
//! ```

pub mod ast;
pub mod compiled;
pub mod compiler;
pub mod detect;
pub mod diagnostics;
pub mod error;
pub mod ids;
pub mod lexer;
pub mod parser;
pub mod registry;
pub mod route;
pub mod suggest;
pub mod types;
pub mod validator;

pub use ast::Frame;
pub use compiled::CompiledFrame;
pub use compiler::{decompile, CompileError, CompileErrors, Compiler};
pub use detect::{detect_format, SourceFormat};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::{ParseError, PipelineError, RegistryError};
pub use parser::ParseOutput;
pub use registry::IntegrationRegistry;
pub use types::ValueType;

use lexer::Lexer;
use parser::Parser;

/// Lex and parse `src`. The frame is `None` only when the header itself
/// could not be read.
pub fn parse(src: &str) -> ParseOutput {
    Parser::new(Lexer::new(src).tokenize(), src).parse()
}

/// Parse `src`, failing on any parse error.
pub fn parse_str(src: &str) -> Result<Frame, ParseError> {
    match parse(src) {
        ParseOutput { frame: Some(frame), diagnostics } if !diagnostics.has_errors() => Ok(frame),
        ParseOutput { diagnostics, .. } => Err(ParseError { diagnostics }),
    }
}

/// Parse and validation diagnostics together, as an editor shows them.
pub fn check(src: &str) -> Diagnostics {
    let ParseOutput { frame, mut diagnostics } = parse(src);
    if let Some(frame) = frame {
        diagnostics.extend(validator::validate(&frame, src));
    }
    diagnostics
}

/// Source text to compiled rows. Stops at the first stage with errors;
/// validation warnings do not block compilation.
pub fn compile_source(
    src: &str,
    registry: &IntegrationRegistry,
    frame_id: Option<&str>,
) -> Result<CompiledFrame, PipelineError> {
    let ParseOutput { frame, diagnostics } = parse(src);
    let frame = match frame {
        Some(frame) if !diagnostics.has_errors() => frame,
        _ => return Err(PipelineError::Parse(diagnostics)),
    };

    let validation = validator::validate(&frame, src);
    if validation.has_errors() {
        return Err(PipelineError::Invalid(validation));
    }

    Ok(compiler::compile(&frame, registry, frame_id)?)
}
