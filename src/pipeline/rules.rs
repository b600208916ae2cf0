// SPDX-License-Identifier: MIT

//! Rule selection: first matching rule decides whether a job runs

use super::condition::evaluate_condition;
use super::types::{Environment, Job, Rule};

/// Outcome of scanning a job's rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub runs: bool,
    /// The rule whose condition held first, if any
    pub matched_rule: Option<Rule>,
}

/// Applies rule semantics to jobs under one environment
pub struct RuleSelector<'a> {
    env: &'a Environment,
}

impl<'a> RuleSelector<'a> {
    pub fn new(env: &'a Environment) -> Self {
        Self { env }
    }

    /// Decide whether `job` runs.
    ///
    /// No rules means the job always runs. Otherwise the first rule whose
    /// condition holds decides through its `when`; a condition that fails to
    /// compile or evaluate counts as not holding. If nothing holds, the job
    /// does not run.
    pub fn decide(&self, job: &Job) -> Decision {
        if job.rules.is_empty() {
            return Decision {
                runs: true,
                matched_rule: None,
            };
        }

        for rule in &job.rules {
            match evaluate_condition(&rule.if_condition, self.env) {
                Ok(true) => {
                    let runs = rule.action().runs();
                    log::debug!(
                        "Job {}: rule {:?} matched (when: {:?}), runs: {}",
                        job.name,
                        rule.if_condition,
                        rule.action(),
                        runs
                    );
                    return Decision {
                        runs,
                        matched_rule: Some(rule.clone()),
                    };
                }
                Ok(false) => {}
                Err(e) => {
                    log::debug!(
                        "Job {}: treating condition {:?} as false: {}",
                        job.name,
                        rule.if_condition,
                        e
                    );
                }
            }
        }

        Decision {
            runs: false,
            matched_rule: None,
        }
    }
}
