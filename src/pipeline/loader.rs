// SPDX-License-Identifier: MIT

//! Document loader - YAML text to tree model
//!
//! `yaml-rust2` reports anchors and aliases as numeric ids. The scanner is
//! run once up front to recover the anchor names in declaration order, so
//! the tree keeps the names exactly as written.

use super::tree::{Node, NodeKind, ScalarStyle};
use crate::error::LoadError;
use std::collections::{HashMap, VecDeque};
use yaml_rust2::parser::{Event, EventReceiver, Parser, Tag};
use yaml_rust2::scanner::{Scanner, TScalarStyle, TokenType};

const CORE_SCHEMA_PREFIX: &str = "tag:yaml.org,2002:";

/// Loads pipeline documents into the tree model
pub struct DocumentLoader;

impl DocumentLoader {
    /// Parse a single YAML document. Returns `None` for an empty stream.
    pub fn parse(source: &[u8]) -> Result<Option<Node>, LoadError> {
        let text = std::str::from_utf8(source)?;

        let anchor_names = Scanner::new(text.chars())
            .filter_map(|token| match token.1 {
                TokenType::Anchor(name) => Some(name),
                _ => None,
            })
            .collect();

        let mut builder = TreeBuilder::new(anchor_names);
        Parser::new(text.chars()).load(&mut builder, true)?;

        let mut documents = builder.documents;
        match documents.len() {
            0 => Ok(None),
            1 => Ok(documents.pop().flatten()),
            n => Err(LoadError::MultipleDocuments(n)),
        }
    }
}

/// Collection under construction, with the pending key for mappings
struct Frame {
    node: Node,
    pending_key: Option<Node>,
}

struct TreeBuilder {
    anchor_names: VecDeque<String>,
    anchors_by_id: HashMap<usize, String>,
    stack: Vec<Frame>,
    current: Option<Node>,
    documents: Vec<Option<Node>>,
}

impl TreeBuilder {
    fn new(anchor_names: VecDeque<String>) -> Self {
        Self {
            anchor_names,
            anchors_by_id: HashMap::new(),
            stack: Vec::new(),
            current: None,
            documents: Vec::new(),
        }
    }

    /// Name the parser-assigned anchor id, consuming the next declared name
    fn anchor(&mut self, id: usize) -> Option<String> {
        if id == 0 {
            return None;
        }
        let name = self
            .anchor_names
            .pop_front()
            .unwrap_or_else(|| format!("anchor-{}", id));
        self.anchors_by_id.insert(id, name.clone());
        Some(name)
    }

    fn alias_name(&self, id: usize) -> String {
        self.anchors_by_id
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("anchor-{}", id))
    }

    fn open(&mut self, kind: NodeKind, anchor_id: usize, tag: Option<Tag>) {
        let mut node = Node::new(kind);
        node.anchor = self.anchor(anchor_id);
        node.tag = tag.and_then(render_tag);
        self.stack.push(Frame {
            node,
            pending_key: None,
        });
    }

    fn close(&mut self) {
        if let Some(frame) = self.stack.pop() {
            self.attach(frame.node);
        }
    }

    fn attach(&mut self, node: Node) {
        let Some(frame) = self.stack.last_mut() else {
            self.current = Some(node);
            return;
        };
        match &mut frame.node.kind {
            NodeKind::Sequence(items) => items.push(node),
            NodeKind::Mapping(pairs) => match frame.pending_key.take() {
                Some(key) => pairs.push((key, node)),
                None => frame.pending_key = Some(node),
            },
            _ => {}
        }
    }
}

impl EventReceiver for TreeBuilder {
    fn on_event(&mut self, ev: Event) {
        match ev {
            Event::DocumentEnd => {
                let root = self.current.take();
                self.documents.push(root);
            }
            Event::Alias(id) => {
                let name = self.alias_name(id);
                self.attach(Node::alias(name));
            }
            Event::Scalar(value, style, anchor_id, tag) => {
                let mut style = match style {
                    TScalarStyle::Plain => ScalarStyle::Plain,
                    _ => ScalarStyle::Quoted,
                };
                let tag = tag.and_then(render_tag);
                if tag.as_deref() == Some("tag:yaml.org,2002:str") {
                    style = ScalarStyle::Quoted;
                }
                let mut node = Node::new(NodeKind::Scalar { value, style });
                node.anchor = self.anchor(anchor_id);
                node.tag = tag.filter(|t| !t.starts_with(CORE_SCHEMA_PREFIX));
                self.attach(node);
            }
            Event::SequenceStart(anchor_id, tag) => {
                self.open(NodeKind::Sequence(Vec::new()), anchor_id, tag)
            }
            Event::MappingStart(anchor_id, tag) => {
                self.open(NodeKind::Mapping(Vec::new()), anchor_id, tag)
            }
            Event::SequenceEnd | Event::MappingEnd => self.close(),
            _ => {}
        }
    }
}

fn render_tag(tag: Tag) -> Option<String> {
    let rendered = format!("{}{}", tag.handle, tag.suffix);
    (!rendered.is_empty() && rendered != "!").then_some(rendered)
}
