//! LSP backend: document store, registry, diagnostics, hover, and completion.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use framec_dsl::registry::{BlockIntegration, Integration, IntegrationRegistry};
use framec_dsl::{parser, Severity};
use serde::Deserialize;
use tokio::sync::RwLock;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};

use crate::analysis::{completion_context, Context, Owner};
use crate::knowledge::{self, Entry, EntryKind, BLOCK_METHOD_NAMES, KEYWORDS, OUTCOMES, TRIGGER_METHOD_NAMES, TYPES};

const SOURCE: &str = "framec-lsp";

// ── Options ───────────────────────────────────────────────────────────────

/// `initializationOptions` sent by the client.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ServerOptions {
    pub blocks: Option<PathBuf>,
    pub actions: Option<PathBuf>,
}

async fn read_document(path: Option<&PathBuf>) -> std::result::Result<String, String> {
    match path {
        Some(p) => tokio::fs::read_to_string(p).await.map_err(|e| format!("{}: {e}", p.display())),
        None => Ok("{}".to_string()),
    }
}

async fn load_registry(options: &ServerOptions) -> std::result::Result<IntegrationRegistry, String> {
    let blocks = read_document(options.blocks.as_ref()).await?;
    let actions = read_document(options.actions.as_ref()).await?;
    IntegrationRegistry::from_json(&blocks, &actions).map_err(|e| e.to_string())
}

// ── Backend ───────────────────────────────────────────────────────────────

pub struct Backend {
    client: Client,
    docs: Arc<RwLock<HashMap<Url, String>>>,
    registry: Arc<RwLock<IntegrationRegistry>>,
    options: Arc<RwLock<ServerOptions>>,
}

impl Backend {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            docs: Arc::new(RwLock::new(HashMap::new())),
            registry: Arc::new(RwLock::new(IntegrationRegistry::default())),
            options: Arc::new(RwLock::new(ServerOptions::default())),
        }
    }

    async fn update(&self, uri: Url, text: String) {
        let diagnostics = document_diagnostics(&text);
        self.client.publish_diagnostics(uri.clone(), diagnostics, None).await;
        self.docs.write().await.insert(uri, text);
    }
}

// ── LanguageServer impl ───────────────────────────────────────────────────

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        if let Some(raw) = params.initialization_options {
            match serde_json::from_value::<ServerOptions>(raw) {
                Ok(options) => *self.options.write().await = options,
                Err(e) => log::warn!("ignoring malformed initializationOptions: {e}"),
            }
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(vec![".".to_string(), "\"".to_string(), "(".to_string()]),
                    ..Default::default()
                }),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: SOURCE.to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        let options = self.options.read().await;
        if options.blocks.is_some() || options.actions.is_some() {
            match load_registry(&options).await {
                Ok(registry) => {
                    let msg = format!(
                        "loaded {} block and {} action integrations",
                        registry.block_kinds().len(),
                        registry.action_kinds().len()
                    );
                    *self.registry.write().await = registry;
                    self.client.log_message(MessageType::INFO, msg).await;
                }
                Err(e) => {
                    self.client.log_message(MessageType::ERROR, format!("failed to load registry: {e}")).await;
                }
            }
        }
        self.client.log_message(MessageType::INFO, "framec-lsp ready").await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    // ── Document lifecycle ────────────────────────────────────────────────

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        self.update(params.text_document.uri, params.text_document.text).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        // FULL sync: the last change carries the whole document.
        if let Some(change) = params.content_changes.into_iter().last() {
            self.update(params.text_document.uri, change.text).await;
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        self.docs.write().await.remove(&params.text_document.uri);
        self.client.publish_diagnostics(params.text_document.uri, Vec::new(), None).await;
    }

    // ── Hover ─────────────────────────────────────────────────────────────

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let uri = &params.text_document_position_params.text_document.uri;
        let pos = &params.text_document_position_params.position;

        let docs = self.docs.read().await;
        let Some(text) = docs.get(uri) else {
            return Ok(None);
        };
        let Some(word) = crate::analysis::word_at(text, pos) else {
            return Ok(None);
        };

        if let Some(entry) = knowledge::entry(word) {
            let md = format!("**{}** · {}\n\n{}", entry.name, entry.kind.label(), entry.doc);
            return Ok(Some(markdown_hover(md)));
        }

        let registry = self.registry.read().await;
        if let Some(block) = registry.block(word) {
            return Ok(Some(markdown_hover(block_doc(block))));
        }
        if let Some(action) = registry.action(word) {
            return Ok(Some(markdown_hover(integration_doc(action, "action", &[]))));
        }
        Ok(None)
    }

    // ── Completion ────────────────────────────────────────────────────────

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = &params.text_document_position.text_document.uri;
        let pos = &params.text_document_position.position;

        let docs = self.docs.read().await;
        let Some(text) = docs.get(uri) else {
            return Ok(None);
        };
        let registry = self.registry.read().await;

        let items = match completion_context(text, pos) {
            Context::Statement => entry_items(KEYWORDS),
            Context::Method { owner } => method_items(owner),
            Context::TypeName => entry_items(TYPES),
            Context::Outcome => entry_items(OUTCOMES),
            Context::KeyType { owner } => key_type_items(&registry, owner),
            Context::Attribute { header } => attribute_items(&header),
            Context::Argument { method, owner, key_type } => {
                argument_items(&registry, &method, owner, key_type.as_deref())
            }
            Context::Unknown => vec![],
        };
        Ok(Some(CompletionResponse::Array(items)))
    }
}

// ── Diagnostics ───────────────────────────────────────────────────────────

/// Parse + validation diagnostics in LSP form. Positions are 1-based in the
/// core and 0-based on the wire.
pub fn document_diagnostics(text: &str) -> Vec<Diagnostic> {
    framec_dsl::check(text).iter().map(to_lsp).collect()
}

fn to_lsp(d: &framec_dsl::Diagnostic) -> Diagnostic {
    let line = d.line.saturating_sub(1) as u32;
    let col = d.column.saturating_sub(1) as u32;

    let mut message = d.message.clone();
    if let Some(s) = &d.suggestion {
        message.push('\n');
        message.push_str(s);
    }
    for note in &d.related {
        message.push('\n');
        message.push_str(note);
    }

    Diagnostic {
        range: Range { start: Position::new(line, col), end: Position::new(line, col + d.width.max(1) as u32) },
        severity: Some(match d.severity {
            Severity::Error => DiagnosticSeverity::ERROR,
            Severity::Warning => DiagnosticSeverity::WARNING,
        }),
        source: Some(SOURCE.to_string()),
        message,
        ..Default::default()
    }
}

// ── Completion item builders ──────────────────────────────────────────────

fn entry_item(e: &Entry) -> CompletionItem {
    let mut item = CompletionItem::new_simple(e.name.to_string(), e.summary().to_string());
    item.kind = Some(match e.kind {
        EntryKind::Keyword => CompletionItemKind::KEYWORD,
        EntryKind::Method => CompletionItemKind::METHOD,
        EntryKind::Type => CompletionItemKind::TYPE_PARAMETER,
        EntryKind::Outcome => CompletionItemKind::ENUM_MEMBER,
    });
    if let Some(snippet) = e.snippet {
        item.insert_text = Some(snippet.to_string());
        item.insert_text_format = Some(InsertTextFormat::SNIPPET);
    }
    item
}

fn entry_items(entries: &[Entry]) -> Vec<CompletionItem> {
    entries.iter().map(entry_item).collect()
}

fn method_items(owner: Owner) -> Vec<CompletionItem> {
    let names = match owner {
        Owner::Block => BLOCK_METHOD_NAMES,
        Owner::Trigger => TRIGGER_METHOD_NAMES,
    };
    names.iter().filter_map(|n| knowledge::method(n)).map(entry_item).collect()
}

fn simple_items<'a>(labels: impl IntoIterator<Item = &'a str>, kind: CompletionItemKind) -> Vec<CompletionItem> {
    labels
        .into_iter()
        .map(|label| {
            let mut item = CompletionItem::new_simple(label.to_string(), String::new());
            item.kind = Some(kind);
            item
        })
        .collect()
}

fn key_type_items(registry: &IntegrationRegistry, owner: Owner) -> Vec<CompletionItem> {
    match owner {
        Owner::Block => {
            let mut kinds = vec![framec_dsl::ast::ROOT_KEY_TYPE];
            kinds.extend(registry.block_kinds());
            simple_items(kinds, CompletionItemKind::CLASS)
        }
        Owner::Trigger => simple_items(registry.action_kinds(), CompletionItemKind::FUNCTION),
    }
}

fn attribute_items(header: &str) -> Vec<CompletionItem> {
    let names = match header {
        "frame" => parser::FRAME_ATTRIBUTES,
        "trigger" => parser::TRIGGER_ATTRIBUTES,
        _ => parser::BLOCK_ATTRIBUTES,
    };
    names
        .iter()
        .map(|n| {
            let mut item = CompletionItem::new_simple(n.to_string(), format!("{header} attribute"));
            item.kind = Some(CompletionItemKind::FIELD);
            item.insert_text = Some(format!("{n} = \"$0\""));
            item.insert_text_format = Some(InsertTextFormat::SNIPPET);
            item
        })
        .collect()
}

fn argument_items(
    registry: &IntegrationRegistry,
    method: &str,
    owner: Owner,
    key_type: Option<&str>,
) -> Vec<CompletionItem> {
    let Some(key_type) = key_type else {
        return vec![];
    };
    let integration: Option<&dyn Integration> = match owner {
        Owner::Block => registry.block(key_type).map(|b| b as &dyn Integration),
        Owner::Trigger => registry.action(key_type).map(|a| a as &dyn Integration),
    };
    let Some(integration) = integration else {
        return vec![];
    };

    match (method, owner) {
        ("prop", _) => simple_items(integration.property_keys(), CompletionItemKind::PROPERTY),
        ("data", _) => simple_items(integration.data_keys(), CompletionItemKind::FIELD),
        ("slot", Owner::Block) => registry
            .block(key_type)
            .map(|b| simple_items(b.slot_names(), CompletionItemKind::MODULE))
            .unwrap_or_default(),
        ("action", Owner::Block) => registry
            .block(key_type)
            .map(|b| simple_items(b.event_names(), CompletionItemKind::EVENT))
            .unwrap_or_default(),
        _ => vec![],
    }
}

// ── Hover docs ────────────────────────────────────────────────────────────

fn integration_doc(integration: &dyn Integration, label: &str, extra: &[(&str, Vec<&str>)]) -> String {
    let mut md = format!("**{}** · {label} integration\n", integration.key_type());
    let sections = [("Properties", integration.property_keys()), ("Data", integration.data_keys())];
    for (title, names) in sections.iter().chain(extra) {
        if !names.is_empty() {
            md.push_str(&format!("\n{title}: `{}`", names.join("`, `")));
        }
    }
    md
}

fn block_doc(block: &BlockIntegration) -> String {
    integration_doc(block, "block", &[("Events", block.event_names()), ("Slots", block.slot_names())])
}

fn markdown_hover(md: String) -> Hover {
    Hover { contents: HoverContents::Markup(MarkupContent { kind: MarkupKind::Markdown, value: md }), range: None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framec_dsl::registry::{EventDefinition, PropertyDefinition, SlotDefinition};

    fn registry() -> IntegrationRegistry {
        IntegrationRegistry::default().with_block(BlockIntegration {
            key_type: "nativeblocks/text".into(),
            properties: vec![PropertyDefinition { key: "fontSize".into(), ..Default::default() }],
            events: vec![EventDefinition { event: "onClick".into() }],
            slots: vec![SlotDefinition { slot: "content".into() }],
            ..Default::default()
        })
    }

    fn labels(items: &[CompletionItem]) -> Vec<&str> {
        items.iter().map(|i| i.label.as_str()).collect()
    }

    #[test]
    fn diagnostics_are_zero_based() {
        let diags = document_diagnostics("frame(name = \"a\", route = \"/a\") {\n  var x: INT = \"one\"\n}");
        let d = diags.iter().find(|d| d.message.starts_with("Invalid initial value")).unwrap();
        assert_eq!(d.range.start, Position::new(1, 2));
        assert_eq!(d.severity, Some(DiagnosticSeverity::ERROR));
    }

    #[test]
    fn warnings_keep_their_severity() {
        let diags = document_diagnostics("frame(name = \"a\", route = \"/a\") { var x: INT = 1 }");
        assert!(diags.iter().any(|d| d.severity == Some(DiagnosticSeverity::WARNING)));
    }

    #[test]
    fn registry_completions() {
        let r = registry();
        assert_eq!(labels(&key_type_items(&r, Owner::Block)), ["ROOT", "nativeblocks/text"]);
        assert_eq!(
            labels(&argument_items(&r, "prop", Owner::Block, Some("nativeblocks/text"))),
            ["fontSize"]
        );
        assert_eq!(labels(&argument_items(&r, "action", Owner::Block, Some("nativeblocks/text"))), ["onClick"]);
        assert!(argument_items(&r, "prop", Owner::Trigger, Some("nativeblocks/text")).is_empty());
        assert!(argument_items(&r, "prop", Owner::Block, None).is_empty());
    }

    #[test]
    fn methods_depend_on_owner() {
        assert_eq!(labels(&method_items(Owner::Block)), ["data", "prop", "slot", "action"]);
        assert_eq!(labels(&method_items(Owner::Trigger)), ["data", "prop", "then"]);
    }

    #[test]
    fn block_hover_lists_everything() {
        let r = registry();
        let md = block_doc(r.block("nativeblocks/text").unwrap());
        assert!(md.contains("Properties: `fontSize`"));
        assert!(md.contains("Events: `onClick`"));
        assert!(md.contains("Slots: `content`"));
        assert!(!md.contains("Data:"));
    }
}
