// SPDX-License-Identifier: MIT

//! Job and stage extraction from an expanded document

use super::tree::Node;
use super::types::{Job, Rule};
use crate::error::ExtractError;

const STAGES_KEY: &str = "stages";

/// Jobs in document order plus the declared stage order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    pub jobs: Vec<Job>,
    pub stage_order: Vec<String>,
}

/// Walk the top-level mapping of an expanded document.
///
/// Mapping pairs are read left to right; when a key repeats, the later pair
/// replaces what the earlier one set.
pub fn extract(root: Option<&Node>) -> Result<Pipeline, ExtractError> {
    let root = root.ok_or(ExtractError::EmptyDocument)?;
    let pairs = root
        .as_mapping()
        .ok_or(ExtractError::RootNotMapping(root.kind_name()))?;

    let mut pipeline = Pipeline::default();
    for (key, value) in pairs {
        let Some(name) = key.as_str() else {
            continue;
        };
        if name == STAGES_KEY {
            if let Some(stages) = value.as_sequence() {
                pipeline.stage_order = scalars(stages);
            }
        } else if let Some(attributes) = value.as_mapping() {
            pipeline.jobs.push(extract_job(name, attributes));
        }
    }

    log::debug!(
        "Extracted {} jobs across {} declared stages",
        pipeline.jobs.len(),
        pipeline.stage_order.len()
    );
    Ok(pipeline)
}

fn extract_job(name: &str, attributes: &[(Node, Node)]) -> Job {
    let mut job = Job {
        name: name.to_string(),
        ..Default::default()
    };

    for (key, value) in attributes {
        match key.as_str() {
            Some("stage") => {
                if let Some(stage) = value.as_text() {
                    job.stage = stage.to_string();
                }
            }
            Some("rules") => {
                if let Some(rules) = value.as_sequence() {
                    job.rules = rules.iter().filter_map(extract_rule).collect();
                }
            }
            Some("script") => {
                if let Some(lines) = value.as_sequence() {
                    job.scripts = scalars(lines);
                }
            }
            _ => {}
        }
    }

    job
}

/// Read `if`/`when` from a rule mapping; other shapes are skipped
fn extract_rule(node: &Node) -> Option<Rule> {
    let pairs = node.as_mapping()?;
    let mut rule = Rule::default();
    for (key, value) in pairs {
        match (key.as_str(), value.as_text()) {
            (Some("if"), Some(condition)) => rule.if_condition = condition.to_string(),
            (Some("when"), Some(when)) => rule.when = when.to_string(),
            _ => {}
        }
    }
    Some(rule)
}

fn scalars(nodes: &[Node]) -> Vec<String> {
    nodes
        .iter()
        .filter_map(|node| node.as_str().map(str::to_string))
        .collect()
}
