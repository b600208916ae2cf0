// SPDX-License-Identifier: MIT

//! Simulation entry points
//!
//! `Simulator::run` reads a pipeline file, expands it, extracts the jobs and
//! decides which would run. `expand_source` stops after expansion.

use super::expander::expand;
use super::extractor::{extract, Pipeline};
use super::rules::RuleSelector;
use super::tree::Node;
use super::types::{Environment, Job, JobResult};
use crate::error::SimulatorError;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Result of a simulation run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SimulationReport {
    /// Declared stages, in document order
    pub stage_order: Vec<String>,
    /// Running jobs grouped by stage, in extraction order within each stage
    pub results: HashMap<String, Vec<JobResult>>,
    /// Every extracted job, running or not
    #[serde(skip)]
    pub jobs: Vec<Job>,
}

impl SimulationReport {
    /// Declared stages with their running jobs; stages without any are skipped
    pub fn ordered(&self) -> Vec<(&str, &[JobResult])> {
        self.stage_order
            .iter()
            .filter_map(|stage| {
                self.results
                    .get(stage)
                    .map(|jobs| (stage.as_str(), jobs.as_slice()))
            })
            .collect()
    }

    /// Running jobs whose stage is missing from the declared order
    pub fn undeclared(&self) -> usize {
        self.results
            .iter()
            .filter(|(stage, _)| !self.stage_order.contains(*stage))
            .map(|(_, jobs)| jobs.len())
            .sum()
    }

    pub fn running_jobs(&self) -> usize {
        self.results.values().map(Vec::len).sum()
    }
}

/// Runs pipeline simulations against a fixed environment
pub struct Simulator {
    env: Environment,
}

impl Simulator {
    pub fn new(env: Environment) -> Self {
        Self { env }
    }

    /// Simulate the pipeline file at `path`
    pub fn run<P: AsRef<Path>>(&self, path: P) -> Result<SimulationReport, SimulatorError> {
        let path = path.as_ref();
        log::info!("Simulating pipeline {}", path.display());
        let data = fs::read(path).map_err(|source| SimulatorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.run_source(&data)
    }

    /// Simulate a pipeline from raw YAML bytes
    pub fn run_source(&self, source: &[u8]) -> Result<SimulationReport, SimulatorError> {
        let root = expand(source)?;
        let Pipeline { jobs, stage_order } = extract(root.as_ref())?;
        let results = self.evaluate(&jobs);
        log::info!(
            "{} of {} jobs would run",
            results.values().map(Vec::len).sum::<usize>(),
            jobs.len()
        );
        Ok(SimulationReport {
            stage_order,
            results,
            jobs,
        })
    }

    /// Group the jobs that would run by stage
    pub fn evaluate(&self, jobs: &[Job]) -> HashMap<String, Vec<JobResult>> {
        let selector = RuleSelector::new(&self.env);
        let mut results: HashMap<String, Vec<JobResult>> = HashMap::new();

        for job in jobs {
            let decision = selector.decide(job);
            if !decision.runs {
                continue;
            }
            let matched_condition = decision
                .matched_rule
                .as_ref()
                .map(|rule| rule.if_condition.clone())
                .unwrap_or_default();
            results
                .entry(job.stage.clone())
                .or_default()
                .push(JobResult {
                    name: job.name.clone(),
                    stage: job.stage.clone(),
                    matched_rule: decision.matched_rule,
                    matched_condition,
                    scripts: job.scripts.clone(),
                });
        }

        results
    }
}

/// Expand raw YAML without evaluating anything
pub fn expand_source(source: &[u8]) -> Result<Option<Node>, SimulatorError> {
    Ok(expand(source)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractError;
    use crate::pipeline::types::Rule;

    const PIPELINE: &str = r#"
stages: [build, test, deploy]

deploy:
  stage: deploy
  rules:
    - if: $CI_COMMIT_BRANCH == "main"
  script: [./deploy.sh]

unit:
  stage: test
  script: [cargo test]

lint:
  stage: test
  script: [cargo clippy]

compile:
  stage: build
  rules:
    - if: $SKIP_BUILD == "1"
      when: never
    - when: always
  script: [cargo build]

docs:
  stage: pages
  script: [mdbook build]
"#;

    fn env_with(pairs: &[(&str, &str)]) -> Environment {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn names(jobs: &[JobResult]) -> Vec<&str> {
        jobs.iter().map(|j| j.name.as_str()).collect()
    }

    #[test]
    fn test_stage_order_independent_of_job_order() {
        let report = Simulator::new(env_with(&[("CI_COMMIT_BRANCH", "main")]))
            .run_source(PIPELINE.as_bytes())
            .unwrap();
        let stages: Vec<&str> = report.ordered().iter().map(|(s, _)| *s).collect();
        assert_eq!(stages, vec!["build", "test", "deploy"]);
        assert_eq!(names(&report.results["test"]), vec!["unit", "lint"]);
    }

    #[test]
    fn test_undeclared_stage_grouped_but_not_ordered() {
        let report = Simulator::new(Environment::new())
            .run_source(PIPELINE.as_bytes())
            .unwrap();
        assert_eq!(names(&report.results["pages"]), vec!["docs"]);
        assert!(!report.stage_order.contains(&"pages".to_string()));
        assert!(report.ordered().iter().all(|(stage, _)| *stage != "pages"));
        assert_eq!(report.undeclared(), 1);
        assert_eq!(report.jobs.len(), 5);
    }

    #[test]
    fn test_matched_condition_recorded() {
        let report = Simulator::new(env_with(&[("CI_COMMIT_BRANCH", "main")]))
            .run_source(PIPELINE.as_bytes())
            .unwrap();
        let deploy = &report.results["deploy"][0];
        assert_eq!(deploy.matched_condition, r#"$CI_COMMIT_BRANCH == "main""#);
        assert_eq!(
            deploy.matched_rule,
            Some(Rule::new(r#"$CI_COMMIT_BRANCH == "main""#, ""))
        );
        assert_eq!(deploy.scripts, vec!["./deploy.sh"]);

        let unit = &report.results["test"][0];
        assert!(unit.matched_rule.is_none());
        assert!(unit.matched_condition.is_empty());
    }

    #[test]
    fn test_jobs_that_do_not_run_are_absent() {
        let report = Simulator::new(env_with(&[("SKIP_BUILD", "1")]))
            .run_source(PIPELINE.as_bytes())
            .unwrap();
        assert!(!report.results.contains_key("build"));
        assert!(!report.results.contains_key("deploy"));
        assert_eq!(report.running_jobs(), 3);
    }

    #[test]
    fn test_empty_if_rule_always_holds() {
        let report = Simulator::new(Environment::new())
            .run_source(b"stages: [build]\njob:\n  stage: build\n  rules:\n    - if:\n      when: always\n")
            .unwrap();
        let job = &report.results["build"][0];
        assert_eq!(job.name, "job");
        assert_eq!(job.matched_rule, Some(Rule::new("", "always")));
        assert!(job.matched_condition.is_empty());
    }

    #[test]
    fn test_empty_stage_groups_under_empty_name() {
        let report = Simulator::new(Environment::new())
            .run_source(b"job:\n  stage:\n  script: [make]\n")
            .unwrap();
        assert_eq!(names(&report.results[""]), vec!["job"]);
        assert!(!report.results.contains_key("~"));
    }

    #[test]
    fn test_run_missing_file() {
        let err = Simulator::new(Environment::new())
            .run("/nonexistent/pipeline.yml")
            .unwrap_err();
        assert!(matches!(err, SimulatorError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/pipeline.yml"));
    }

    #[test]
    fn test_run_non_mapping_root() {
        let err = Simulator::new(Environment::new())
            .run_source(b"just a string\n")
            .unwrap_err();
        assert!(matches!(
            err,
            SimulatorError::Extract(ExtractError::RootNotMapping("scalar"))
        ));
    }

    #[test]
    fn test_run_malformed_yaml() {
        let err = Simulator::new(Environment::new())
            .run_source(b"stages: [build\n")
            .unwrap_err();
        assert!(matches!(err, SimulatorError::Expand(_)));
    }
}
