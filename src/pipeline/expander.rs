// SPDX-License-Identifier: MIT

//! Document expansion
//!
//! Four passes turn a raw tree into a self-contained one:
//! 1. collect anchors into a name table (later declarations win)
//! 2. replace aliases with copies of their anchored nodes
//! 3. splice `<<` merge sources into their mappings
//! 4. inline `!reference [path, ...]` nodes from the document root
//!
//! Every pass builds a new tree from an immutable input. Unknown aliases and
//! unresolvable references are left in place; cycles are reported as errors.

use super::loader::DocumentLoader;
use super::tree::{Node, NodeKind, MERGE_KEY};
use crate::error::ExpandError;
use std::borrow::Cow;
use std::collections::HashMap;

/// Anchor name to the node it was declared on
pub type AnchorTable = HashMap<String, Node>;

/// Outcome of looking up an alias or reference target
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<T> {
    Resolved(T),
    NotFound,
    /// The target is already being expanded further up the stack
    Cycle,
}

/// Parse and fully expand a YAML document. `None` means the stream was empty.
pub fn expand(source: &[u8]) -> Result<Option<Node>, ExpandError> {
    match DocumentLoader::parse(source)? {
        Some(root) => expand_tree(&root).map(Some),
        None => Ok(None),
    }
}

/// Run all four passes over an already parsed tree
pub fn expand_tree(root: &Node) -> Result<Node, ExpandError> {
    let anchors = collect_anchors(root);
    let resolved = resolve_aliases(root, &anchors)?;
    let merged = apply_merge_keys(&resolved);
    inline_references(&merged)
}

/// Pass 1: pre-order anchor collection
pub fn collect_anchors(root: &Node) -> AnchorTable {
    let mut anchors = AnchorTable::new();
    root.walk(&mut |node| {
        if let Some(name) = &node.anchor {
            anchors.insert(name.clone(), node.clone());
        }
    });
    anchors
}

/// Pass 2: substitute aliases with structural copies of their anchors
pub fn resolve_aliases(root: &Node, anchors: &AnchorTable) -> Result<Node, ExpandError> {
    let mut stack = Vec::new();
    substitute_aliases(root, anchors, &mut stack)
}

fn lookup_anchor<'a>(
    name: &str,
    anchors: &'a AnchorTable,
    stack: &[String],
) -> Resolution<&'a Node> {
    if stack.iter().any(|active| active == name) {
        return Resolution::Cycle;
    }
    match anchors.get(name) {
        Some(node) => Resolution::Resolved(node),
        None => Resolution::NotFound,
    }
}

fn substitute_aliases(
    node: &Node,
    anchors: &AnchorTable,
    stack: &mut Vec<String>,
) -> Result<Node, ExpandError> {
    let kind = match &node.kind {
        NodeKind::Alias(name) => match lookup_anchor(name, anchors, stack) {
            Resolution::Resolved(target) => {
                stack.push(name.clone());
                let copy = substitute_aliases(target, anchors, stack);
                stack.pop();
                return copy;
            }
            Resolution::NotFound => {
                log::debug!("Leaving unknown alias *{} unresolved", name);
                return Ok(node.clone());
            }
            Resolution::Cycle => {
                let mut chain = stack.clone();
                chain.push(name.clone());
                return Err(ExpandError::CyclicAlias(chain));
            }
        },
        NodeKind::Scalar { .. } => return Ok(node.clone()),
        NodeKind::Sequence(items) => NodeKind::Sequence(
            items
                .iter()
                .map(|item| substitute_aliases(item, anchors, stack))
                .collect::<Result<_, _>>()?,
        ),
        NodeKind::Mapping(pairs) => NodeKind::Mapping(
            pairs
                .iter()
                .map(|(k, v)| {
                    Ok((
                        substitute_aliases(k, anchors, stack)?,
                        substitute_aliases(v, anchors, stack)?,
                    ))
                })
                .collect::<Result<_, ExpandError>>()?,
        ),
    };
    Ok(Node {
        kind,
        anchor: node.anchor.clone(),
        tag: node.tag.clone(),
    })
}

/// Pass 3: remove `<<` keys, prepending the pairs of their merge sources
///
/// Each source is prepended in turn, so with `<<: [*a, *b]` the pairs end up
/// ordered `b, a, explicit`. Reading pairs left to right with later keys
/// overwriting earlier ones gives explicit keys precedence, then `a`, then `b`.
pub fn apply_merge_keys(node: &Node) -> Node {
    let kind = match &node.kind {
        NodeKind::Sequence(items) => NodeKind::Sequence(items.iter().map(apply_merge_keys).collect()),
        NodeKind::Mapping(pairs) => {
            let mut explicit = Vec::with_capacity(pairs.len());
            let mut sources = Vec::new();

            for (key, value) in pairs {
                if key.as_str() == Some(MERGE_KEY) {
                    sources.extend(merge_sources(value));
                } else {
                    explicit.push((apply_merge_keys(key), apply_merge_keys(value)));
                }
            }

            let mut merged = explicit;
            for source in sources {
                match apply_merge_keys(source).kind {
                    NodeKind::Mapping(source_pairs) => {
                        merged = source_pairs.into_iter().chain(merged).collect();
                    }
                    _ => log::debug!("Ignoring non-mapping merge source ({})", source.kind_name()),
                }
            }
            NodeKind::Mapping(merged)
        }
        _ => return node.clone(),
    };
    Node {
        kind,
        anchor: node.anchor.clone(),
        tag: node.tag.clone(),
    }
}

fn merge_sources(value: &Node) -> Vec<&Node> {
    match &value.kind {
        NodeKind::Sequence(items) => items.iter().collect(),
        _ => vec![value],
    }
}

/// Pass 4: replace `!reference` nodes with copies of their targets
pub fn inline_references(root: &Node) -> Result<Node, ExpandError> {
    let mut stack = Vec::new();
    substitute_references(root, root, &mut stack)
}

/// Path components of a `!reference` node (scalar items only)
pub fn reference_path(node: &Node) -> Vec<String> {
    node.as_sequence()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Walk `root` one mapping key per path component.
///
/// A `!reference` met on the way is inlined first, so a path may run through
/// another reference. `stack` holds the reference paths being expanded.
fn find_referenced(
    root: &Node,
    path: &[String],
    stack: &mut Vec<Vec<String>>,
) -> Result<Option<Node>, ExpandError> {
    let mut current = Cow::Borrowed(root);
    for component in path {
        let next = match current.get(component) {
            Some(next) if next.is_reference() => substitute_references(next, root, stack)?,
            Some(next) => next.clone(),
            None => return Ok(None),
        };
        current = Cow::Owned(next);
    }
    Ok(Some(current.into_owned()))
}

fn lookup_reference(
    root: &Node,
    path: &[String],
    stack: &mut Vec<Vec<String>>,
) -> Result<Resolution<Node>, ExpandError> {
    if stack.iter().any(|active| active == path) {
        return Ok(Resolution::Cycle);
    }
    stack.push(path.to_vec());
    let found = find_referenced(root, path, stack);
    stack.pop();
    Ok(match found? {
        Some(target) => Resolution::Resolved(target),
        None => Resolution::NotFound,
    })
}

fn substitute_references(
    node: &Node,
    root: &Node,
    stack: &mut Vec<Vec<String>>,
) -> Result<Node, ExpandError> {
    if node.is_reference() {
        let path = reference_path(node);
        if !path.is_empty() {
            match lookup_reference(root, &path, stack)? {
                Resolution::Resolved(target) => {
                    stack.push(path);
                    let copy = substitute_references(&target, root, stack);
                    stack.pop();
                    return copy;
                }
                Resolution::NotFound => {
                    log::debug!("Leaving unresolved reference [{}]", path.join(", "));
                }
                Resolution::Cycle => {
                    let mut chain: Vec<String> = stack.iter().map(|p| p.join(".")).collect();
                    chain.push(path.join("."));
                    return Err(ExpandError::CyclicReference(chain));
                }
            }
        }
    }

    let kind = match &node.kind {
        NodeKind::Sequence(items) => NodeKind::Sequence(
            items
                .iter()
                .map(|item| substitute_references(item, root, stack))
                .collect::<Result<_, _>>()?,
        ),
        NodeKind::Mapping(pairs) => NodeKind::Mapping(
            pairs
                .iter()
                .map(|(k, v)| {
                    Ok((
                        substitute_references(k, root, stack)?,
                        substitute_references(v, root, stack)?,
                    ))
                })
                .collect::<Result<_, ExpandError>>()?,
        ),
        _ => return Ok(node.clone()),
    };
    Ok(Node {
        kind,
        anchor: node.anchor.clone(),
        tag: node.tag.clone(),
    })
}
