// SPDX-License-Identifier: MIT

//! Textual rewriting of rule conditions before parsing
//!
//! `$VAR =~ /regex/` becomes `matches($VAR, "regex")`, then every `$NAME`
//! becomes a quoted string literal holding its value.

use crate::pipeline::types::Environment;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static REGEX_OPERATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\$[A-Za-z0-9_]+)\s*=~\s*/((?:\\/|[^/])+)/").expect("regex operator pattern")
});

static VARIABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$([A-Za-z0-9_]+)").expect("variable pattern"));

/// Apply both rewrite passes
pub fn rewrite(condition: &str, env: &Environment) -> String {
    let with_calls = replace_regex_operators(condition);
    substitute_variables(&with_calls, env)
}

/// `$VAR =~ /re/` to `matches($VAR, "re")`.
///
/// Backslashes in the regex are doubled, then `\/` is turned into `/`. An
/// escaped slash therefore reaches the string literal as `\/`, which the
/// literal unescapes to `/`.
pub fn replace_regex_operators(condition: &str) -> String {
    REGEX_OPERATOR
        .replace_all(condition, |caps: &Captures| {
            let pattern = caps[2].replace('\\', r"\\").replace(r"\/", "/");
            format!("matches({}, \"{}\")", &caps[1], pattern)
        })
        .into_owned()
}

/// `$NAME` to its quoted value; unbound names become `""`
pub fn substitute_variables(condition: &str, env: &Environment) -> String {
    VARIABLE
        .replace_all(condition, |caps: &Captures| match env.get(&caps[1]) {
            Some(value) => quote(value),
            None => "\"\"".to_string(),
        })
        .into_owned()
}

/// Double-quoted literal readable by the condition parser
pub fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}
