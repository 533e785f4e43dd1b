use crate::compiler::CompileErrors;
use crate::diagnostics::Diagnostics;

/// A document that did not parse cleanly. Displays every collected
/// diagnostic in rendered form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("parse failed: {}", .diagnostics.render_all())]
pub struct ParseError {
    pub diagnostics: Diagnostics,
}

/// A registry document that could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("invalid {document} JSON: {source}")]
    Document {
        document: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{document} JSON must be an object keyed by keyType")]
    NotAnObject { document: &'static str },

    #[error("failed to read {document} entry '{key_type}': {source}")]
    Entry {
        document: &'static str,
        key_type: String,
        #[source]
        source: serde_json::Error,
    },
}

/// First stage of the source-to-compiled pipeline that failed.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("{}", .0.render_all())]
    Parse(Diagnostics),

    #[error("{}", .0.render_all())]
    Invalid(Diagnostics),

    #[error(transparent)]
    Compile(#[from] CompileErrors),
}

impl PipelineError {
    /// Diagnostics for the parse and validation stages; `None` for compile
    /// failures, which carry ids rather than positions.
    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        match self {
            PipelineError::Parse(d) | PipelineError::Invalid(d) => Some(d),
            PipelineError::Compile(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiled::CompiledFrame;

    #[test]
    fn parse_error_renders_its_diagnostics() {
        let mut diagnostics = Diagnostics::new("");
        diagnostics.error("Expected ')'", 1, 5);
        let err = ParseError { diagnostics };
        let text = err.to_string();
        assert!(text.starts_with("parse failed: Found 1 error(s):"));
        assert!(text.contains("Expected ')'"));
    }

    #[test]
    fn compile_errors_pass_through_the_pipeline() {
        let err = PipelineError::from(CompileErrors { frame: CompiledFrame::default(), errors: Vec::new() });
        assert_eq!(err.to_string(), "compile failed with 0 error(s):");
        assert!(err.diagnostics().is_none());
        assert!(std::error::Error::source(&err).is_none());
    }
}
