// SPDX-License-Identifier: MIT

//! Job model extracted from a pipeline document

use serde::Serialize;
use std::collections::HashMap;

/// Variable bindings a simulation runs against
pub type Environment = HashMap<String, String>;

/// A job's conditional gate
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Rule {
    /// Condition; empty always holds
    #[serde(rename = "if", skip_serializing_if = "String::is_empty")]
    pub if_condition: String,
    /// Raw `when` action; see [`When`]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub when: String,
}

impl Rule {
    pub fn new(if_condition: impl Into<String>, when: impl Into<String>) -> Self {
        Self {
            if_condition: if_condition.into(),
            when: when.into(),
        }
    }

    pub fn action(&self) -> When {
        When::parse(&self.when)
    }
}

/// Action taken when a rule's condition holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum When {
    Always,
    Never,
    Manual,
    /// Unset or unrecognized value; the job runs
    Default,
}

impl When {
    pub fn parse(value: &str) -> Self {
        match value {
            "always" => When::Always,
            "never" => When::Never,
            "manual" => When::Manual,
            _ => When::Default,
        }
    }

    /// Whether a matching rule with this action lets the job run
    pub fn runs(self) -> bool {
        matches!(self, When::Always | When::Default)
    }
}

/// A pipeline job
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Job {
    pub name: String,
    pub stage: String,
    pub rules: Vec<Rule>,
    pub scripts: Vec<String>,
}

/// A job that would run, with the rule that decided it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobResult {
    pub name: String,
    pub stage: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_rule: Option<Rule>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub matched_condition: String,
    pub scripts: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_when_parse() {
        assert_eq!(When::parse("always"), When::Always);
        assert_eq!(When::parse("never"), When::Never);
        assert_eq!(When::parse("manual"), When::Manual);
        assert_eq!(When::parse(""), When::Default);
        assert_eq!(When::parse("on_success"), When::Default);
    }

    #[test]
    fn test_when_runs() {
        assert!(When::Always.runs());
        assert!(When::Default.runs());
        assert!(!When::Never.runs());
        assert!(!When::Manual.runs());
    }

    #[test]
    fn test_rule_serialization_skips_empty_fields() {
        let rule = Rule::new("$CI == \"true\"", "");
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json, serde_json::json!({"if": "$CI == \"true\""}));
    }
}
