//! Nested [`Frame`] ⇄ flat [`CompiledFrame`].
//!
//! Compiling runs two passes over the same output: structural checks while
//! flattening (root first, slots, `END` triggers, unique keys), then registry
//! conformance on the finished rows. Every error from both passes is
//! reported together.

mod conformance;
pub mod error;
mod flatten;
mod unflatten;

use std::sync::Arc;

pub use error::{CompileError, CompileErrors, Owner};
pub use flatten::{effective_slot, flatten};
pub use unflatten::decompile;

use crate::ast::Frame;
use crate::compiled::CompiledFrame;
use crate::ids::{IdSource, UuidV7Ids};
use crate::registry::IntegrationRegistry;

/// Compiles frames against one registry.
///
/// ```rust
/// use framec_dsl::{Compiler, IntegrationRegistry, parse_str};
///
/// let frame = parse_str(r#"frame(name = "main", route = "/main") {
///     block(keyType = "ROOT", key = "root") {}
/// }"#).unwrap();
/// let compiled = Compiler::new(&IntegrationRegistry::default())
///     .frame_id("f-1")
///     .compile(&frame)
///     .unwrap();
/// assert_eq!(compiled.id, "f-1");
/// ```
pub struct Compiler<'r> {
    registry: &'r IntegrationRegistry,
    frame_id: Option<String>,
    ids: Arc<dyn IdSource>,
}

impl<'r> Compiler<'r> {
    pub fn new(registry: &'r IntegrationRegistry) -> Self {
        Self { registry, frame_id: None, ids: Arc::new(UuidV7Ids) }
    }

    /// Use this id for the frame instead of generating one.
    pub fn frame_id(mut self, id: impl Into<String>) -> Self {
        self.frame_id = Some(id.into());
        self
    }

    pub fn id_source(mut self, ids: Arc<dyn IdSource>) -> Self {
        self.ids = ids;
        self
    }

    pub fn compile(&self, frame: &Frame) -> Result<CompiledFrame, CompileErrors> {
        let (compiled, mut errors) = flatten(frame, self.ids.as_ref(), self.frame_id.as_deref());
        errors.extend(conformance::check(&compiled, self.registry));

        if errors.is_empty() {
            log::debug!("compiled frame '{}' ({})", compiled.name, compiled.id);
            Ok(compiled)
        } else {
            log::warn!("frame '{}' failed to compile with {} error(s)", compiled.name, errors.len());
            Err(CompileErrors { frame: compiled, errors })
        }
    }
}

/// One-shot [`Compiler::compile`] with generated ids.
pub fn compile(
    frame: &Frame,
    registry: &IntegrationRegistry,
    frame_id: Option<&str>,
) -> Result<CompiledFrame, CompileErrors> {
    let mut compiler = Compiler::new(registry);
    if let Some(id) = frame_id {
        compiler = compiler.frame_id(id);
    }
    compiler.compile(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Block, Slot};
    use crate::ids::SequentialIds;
    use crate::registry::BlockIntegration;

    fn frame() -> Frame {
        Frame {
            name: "main".into(),
            route: "/main".into(),
            blocks: vec![Block {
                key_type: "ROOT".into(),
                key: "root".into(),
                slots: vec![Slot::new("content")],
                blocks: vec![Block { key_type: "text".into(), key: "title".into(), ..Default::default() }],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn structural_and_registry_errors_are_reported_together() {
        let mut f = frame();
        f.blocks[0].blocks.push(Block { key_type: "text".into(), key: "title".into(), ..Default::default() });

        let err = Compiler::new(&IntegrationRegistry::default())
            .id_source(Arc::new(SequentialIds::new()))
            .frame_id("f")
            .compile(&f)
            .unwrap_err();
        assert_eq!(
            err.messages(),
            [
                "Duplicate block key 'title' used by 2 blocks",
                "block 'title' uses unknown integration 'text'",
                "block 'title' uses unknown integration 'text'",
            ]
        );
        assert_eq!(err.frame.id, "f");
    }

    #[test]
    fn compiles_against_registry() {
        let registry =
            IntegrationRegistry::default().with_block(BlockIntegration { key_type: "text".into(), ..Default::default() });
        let compiled = compile(&frame(), &registry, Some("frame-1")).unwrap();
        assert_eq!(compiled.blocks.len(), 2);
        assert!(compiled.blocks.iter().all(|b| b.frame_id == "frame-1"));
        assert_eq!(decompile(&compiled).blocks[0].blocks[0].key, "title");
    }

    #[test]
    fn generated_frame_ids_are_not_empty() {
        let registry =
            IntegrationRegistry::default().with_block(BlockIntegration { key_type: "text".into(), ..Default::default() });
        let compiled = compile(&frame(), &registry, None).unwrap();
        assert!(!compiled.id.is_empty());
    }
}
