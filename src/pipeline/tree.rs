// SPDX-License-Identifier: MIT

//! Tree model for parsed YAML documents
//!
//! Unlike `serde_yaml::Value`, this model keeps anchors, aliases and tags so
//! the expander can resolve them itself.

/// Tag marking a cross-reference to another part of the document
pub const REFERENCE_TAG: &str = "!reference";

/// Mapping key that splices other mappings into the current one
pub const MERGE_KEY: &str = "<<";

/// How a scalar was written in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScalarStyle {
    /// Unquoted; subject to core schema resolution (bool, int, null...)
    #[default]
    Plain,
    /// Single/double quoted or block scalar; always a string
    Quoted,
}

/// Shape of a node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Scalar { value: String, style: ScalarStyle },
    Sequence(Vec<Node>),
    /// Ordered key/value pairs; duplicate keys are kept
    Mapping(Vec<(Node, Node)>),
    /// Reference to an anchor by name
    Alias(String),
}

/// A YAML node with its optional anchor and tag
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub anchor: Option<String>,
    pub tag: Option<String>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            anchor: None,
            tag: None,
        }
    }

    /// Plain scalar
    pub fn scalar(value: impl Into<String>) -> Self {
        Self::new(NodeKind::Scalar {
            value: value.into(),
            style: ScalarStyle::Plain,
        })
    }

    pub fn sequence(items: Vec<Node>) -> Self {
        Self::new(NodeKind::Sequence(items))
    }

    pub fn mapping(pairs: Vec<(Node, Node)>) -> Self {
        Self::new(NodeKind::Mapping(pairs))
    }

    pub fn alias(name: impl Into<String>) -> Self {
        Self::new(NodeKind::Alias(name.into()))
    }

    pub fn with_anchor(mut self, anchor: impl Into<String>) -> Self {
        self.anchor = Some(anchor.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Scalar text, if this is a scalar
    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Scalar { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Scalar text with plain nulls (`key:`, `~`, `null`) read as empty
    pub fn as_text(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Scalar {
                value,
                style: ScalarStyle::Plain,
            } if is_null(value) => Some(""),
            NodeKind::Scalar { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Node]> {
        match &self.kind {
            NodeKind::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&[(Node, Node)]> {
        match &self.kind {
            NodeKind::Mapping(pairs) => Some(pairs),
            _ => None,
        }
    }

    pub fn is_reference(&self) -> bool {
        self.tag.as_deref() == Some(REFERENCE_TAG)
    }

    /// Value of the first pair whose key is the scalar `key`
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_mapping()?
            .iter()
            .find(|(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v)
    }

    /// Human readable kind name used in error messages
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            NodeKind::Scalar { .. } => "scalar",
            NodeKind::Sequence(_) => "sequence",
            NodeKind::Mapping(_) => "mapping",
            NodeKind::Alias(_) => "alias",
        }
    }

    /// Children in document order (mapping keys precede their values)
    pub fn children(&self) -> Vec<&Node> {
        match &self.kind {
            NodeKind::Sequence(items) => items.iter().collect(),
            NodeKind::Mapping(pairs) => pairs.iter().flat_map(|(k, v)| [k, v]).collect(),
            _ => Vec::new(),
        }
    }

    /// Pre-order visit of this node and every descendant
    pub fn walk<'a, F>(&'a self, visit: &mut F)
    where
        F: FnMut(&'a Node),
    {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }

    /// True if `predicate` holds for this node or any descendant
    pub fn any<F>(&self, predicate: F) -> bool
    where
        F: Fn(&Node) -> bool,
    {
        let mut found = false;
        self.walk(&mut |node| found |= predicate(node));
        found
    }
}

fn is_null(text: &str) -> bool {
    matches!(text, "" | "~" | "null" | "Null" | "NULL")
}
