// SPDX-License-Identifier: MIT

//! Rendering of simulation reports and expanded documents

use super::simulator::SimulationReport;
use super::tree::{Node, NodeKind, ScalarStyle};
use super::types::JobResult;
use crate::error::SimulatorError;
use colored::Colorize;
use serde::Serialize;
use std::io::{self, Write};

/// Human readable report, stages in declared order
pub fn write_report<W: Write>(
    out: &mut W,
    report: &SimulationReport,
    show_scripts: bool,
) -> io::Result<()> {
    writeln!(out, "\n=== Pipeline Simulation Results ===")?;
    writeln!(out, "Jobs that would run based on current conditions:")?;

    for (stage, jobs) in report.ordered() {
        writeln!(out, "🚀 Stage: {}", stage)?;
        for job in jobs {
            write_job(out, job, show_scripts)?;
        }
    }

    let hidden = report.undeclared();
    if hidden > 0 {
        writeln!(
            out,
            "{}",
            format!("({} running job(s) in stages missing from `stages` not shown)", hidden)
                .dimmed()
        )?;
    }
    Ok(())
}

fn write_job<W: Write>(out: &mut W, job: &JobResult, show_scripts: bool) -> io::Result<()> {
    writeln!(out, "   ✅ Job: {}", job.name)?;
    if !job.matched_condition.is_empty() {
        writeln!(
            out,
            "      ├─ Condition: {}",
            job.matched_condition.cyan().bold()
        )?;
    }
    if show_scripts && !job.scripts.is_empty() {
        writeln!(out, "      ├─ Scripts:")?;
        for script in &job.scripts {
            writeln!(out, "      │  - {}", script)?;
        }
    }
    writeln!(out)
}

#[derive(Serialize)]
struct JsonStage<'a> {
    stage: &'a str,
    jobs: &'a [JobResult],
}

#[derive(Serialize)]
struct JsonReport<'a> {
    stage_order: &'a [String],
    stages: Vec<JsonStage<'a>>,
    hidden_jobs: usize,
}

/// Machine readable report, stages in declared order
pub fn report_to_json(report: &SimulationReport) -> Result<String, SimulatorError> {
    let json = JsonReport {
        stage_order: &report.stage_order,
        stages: report
            .ordered()
            .into_iter()
            .map(|(stage, jobs)| JsonStage { stage, jobs })
            .collect(),
        hidden_jobs: report.undeclared(),
    };
    Ok(serde_json::to_string_pretty(&json)?)
}

/// Re-serialize an expanded tree as block YAML.
///
/// Plain scalars are written exactly as they appeared in the source, so
/// `3.10` stays `3.10`. Quoted scalars are quoted the way `serde_yaml` would
/// quote them. Duplicate mapping keys collapse, keeping the first position and
/// the last value. Leftover tags stay visible; leftover aliases become strings.
pub fn expanded_to_yaml(root: Option<&Node>) -> Result<String, SimulatorError> {
    let mut out = String::new();
    let Some(root) = root else {
        out.push_str("null\n");
        return Ok(out);
    };
    match &root.kind {
        NodeKind::Mapping(pairs) if !pairs.is_empty() => {
            write_tag_line(&mut out, root);
            write_mapping(&mut out, pairs, 0)?;
        }
        NodeKind::Sequence(items) if !items.is_empty() => {
            write_tag_line(&mut out, root);
            write_sequence(&mut out, items, 0)?;
        }
        _ => {
            if let Some(tag) = &root.tag {
                out.push_str(tag);
                out.push(' ');
            }
            out.push_str(&inline_text(root)?);
            out.push('\n');
        }
    }
    Ok(out)
}

fn write_tag_line(out: &mut String, node: &Node) {
    if let Some(tag) = &node.tag {
        out.push_str(tag);
        out.push('\n');
    }
}

/// Write `node` right after a `key:` or `-` indicator at column `indent`
fn write_value(out: &mut String, node: &Node, indent: usize) -> Result<(), SimulatorError> {
    if let Some(tag) = &node.tag {
        out.push(' ');
        out.push_str(tag);
    }
    match &node.kind {
        NodeKind::Mapping(pairs) if !pairs.is_empty() => {
            out.push('\n');
            write_mapping(out, pairs, indent + 2)
        }
        NodeKind::Sequence(items) if !items.is_empty() => {
            out.push('\n');
            write_sequence(out, items, indent + 2)
        }
        _ => {
            out.push(' ');
            out.push_str(&inline_text(node)?);
            out.push('\n');
            Ok(())
        }
    }
}

fn write_mapping(out: &mut String, pairs: &[(Node, Node)], indent: usize) -> Result<(), SimulatorError> {
    let mut entries: Vec<(&Node, &Node)> = Vec::with_capacity(pairs.len());
    for (key, value) in pairs {
        match entries.iter_mut().find(|(seen, _)| *seen == key) {
            Some(entry) => entry.1 = value,
            None => entries.push((key, value)),
        }
    }

    for (key, value) in entries {
        out.push_str(&" ".repeat(indent));
        match (&key.kind, &key.tag) {
            (NodeKind::Scalar { .. } | NodeKind::Alias(_), None) => out.push_str(&inline_text(key)?),
            _ => {
                // complex key
                out.push('?');
                write_value(out, key, indent)?;
                out.push_str(&" ".repeat(indent));
            }
        }
        out.push(':');
        write_value(out, value, indent)?;
    }
    Ok(())
}

fn write_sequence(out: &mut String, items: &[Node], indent: usize) -> Result<(), SimulatorError> {
    for item in items {
        out.push_str(&" ".repeat(indent));
        out.push('-');
        write_value(out, item, indent)?;
    }
    Ok(())
}

/// Single-line rendering of scalars, aliases and empty collections
fn inline_text(node: &Node) -> Result<String, SimulatorError> {
    Ok(match &node.kind {
        NodeKind::Scalar {
            value,
            style: ScalarStyle::Plain,
        } if value.is_empty() => "~".to_string(),
        NodeKind::Scalar {
            value,
            style: ScalarStyle::Plain,
        } => value.clone(),
        NodeKind::Scalar {
            value,
            style: ScalarStyle::Quoted,
        } => quote(value)?,
        NodeKind::Alias(name) => quote(&format!("*{}", name))?,
        NodeKind::Mapping(_) => "{}".to_string(),
        NodeKind::Sequence(_) => "[]".to_string(),
    })
}

/// A string scalar that reads back as the same string
fn quote(text: &str) -> Result<String, SimulatorError> {
    let rendered = serde_yaml::to_string(text)?;
    let rendered = rendered.trim_end_matches('\n');
    if rendered.contains('\n') {
        // block scalar; fall back to a double-quoted flow scalar
        Ok(serde_json::to_string(text)?)
    } else {
        Ok(rendered.to_string())
    }
}
