//! Condition expression evaluator

use super::ast::{CompareOp, Expression, Literal};
use super::parser::parse;
use super::rewrite::rewrite;
use crate::error::ConditionError;
use crate::pipeline::types::Environment;
use regex::Regex;
use std::cmp::Ordering;

/// Decide whether a rule condition holds in `env`.
///
/// An empty condition always holds. Otherwise the condition is rewritten,
/// parsed and evaluated, and the result coerced with [`Literal::is_truthy`].
pub fn evaluate_condition(condition: &str, env: &Environment) -> Result<bool, ConditionError> {
    if condition.is_empty() {
        return Ok(true);
    }
    let rewritten = rewrite(condition, env);
    log::trace!("Rewrote condition {:?} => {:?}", condition, rewritten);
    let expr = parse(&rewritten)?;
    Ok(evaluate(&expr, env)?.is_truthy())
}

/// Evaluate an expression against the environment
pub fn evaluate(expr: &Expression, env: &Environment) -> Result<Literal, ConditionError> {
    match expr {
        Expression::Literal(value) => Ok(value.clone()),
        Expression::Variable(name) => env
            .get(name)
            .map(|value| Literal::String(value.clone()))
            .ok_or_else(|| ConditionError::UnknownVariable(name.clone())),
        Expression::Compare { left, op, right } => {
            let left = evaluate(left, env)?;
            let right = evaluate(right, env)?;
            evaluate_compare(&left, *op, &right).map(Literal::Boolean)
        }
        Expression::And(left, right) => {
            Ok(Literal::Boolean(as_bool(left, env, "&&")? && as_bool(right, env, "&&")?))
        }
        Expression::Or(left, right) => {
            Ok(Literal::Boolean(as_bool(left, env, "||")? || as_bool(right, env, "||")?))
        }
        Expression::Not(inner) => Ok(Literal::Boolean(!as_bool(inner, env, "!")?)),
        Expression::Negate(inner) => match evaluate(inner, env)? {
            Literal::Number(n) => Ok(Literal::Number(-n)),
            other => Err(ConditionError::type_error(format!(
                "cannot negate a {}",
                other.type_name()
            ))),
        },
        Expression::Call { name, args } => call(name, args, env),
    }
}

fn as_bool(expr: &Expression, env: &Environment, op: &str) -> Result<bool, ConditionError> {
    match evaluate(expr, env)? {
        Literal::Boolean(b) => Ok(b),
        other => Err(ConditionError::type_error(format!(
            "operator {} expects booleans, got {}",
            op,
            other.type_name()
        ))),
    }
}

fn evaluate_compare(left: &Literal, op: CompareOp, right: &Literal) -> Result<bool, ConditionError> {
    match op {
        CompareOp::Eq => Ok(left == right),
        CompareOp::NotEq => Ok(left != right),
        CompareOp::Gt => order(left, op, right).map(|o| o == Ordering::Greater),
        CompareOp::Gte => order(left, op, right).map(|o| o != Ordering::Less),
        CompareOp::Lt => order(left, op, right).map(|o| o == Ordering::Less),
        CompareOp::Lte => order(left, op, right).map(|o| o != Ordering::Greater),
        CompareOp::Match => regex_search(left, op, right),
        CompareOp::NotMatch => regex_search(left, op, right).map(|matched| !matched),
    }
}

fn order(left: &Literal, op: CompareOp, right: &Literal) -> Result<Ordering, ConditionError> {
    match (left, right) {
        (Literal::Number(a), Literal::Number(b)) => a
            .partial_cmp(b)
            .ok_or_else(|| ConditionError::type_error("cannot order NaN")),
        (Literal::String(a), Literal::String(b)) => Ok(a.cmp(b)),
        _ => Err(ConditionError::type_error(format!(
            "cannot compare {} {} {}",
            left.type_name(),
            op,
            right.type_name()
        ))),
    }
}

fn regex_search(left: &Literal, op: CompareOp, right: &Literal) -> Result<bool, ConditionError> {
    match (left, right) {
        (Literal::String(value), Literal::String(pattern)) => Ok(Regex::new(pattern)?.is_match(value)),
        _ => Err(ConditionError::type_error(format!(
            "operator {} expects strings, got {} and {}",
            op,
            left.type_name(),
            right.type_name()
        ))),
    }
}

fn call(name: &str, args: &[Expression], env: &Environment) -> Result<Literal, ConditionError> {
    match name {
        "matches" => {
            if args.len() != 2 {
                return Err(ConditionError::Arity {
                    name: name.to_string(),
                    expected: 2,
                    found: args.len(),
                });
            }
            let value = evaluate(&args[0], env)?.to_string();
            let pattern = evaluate(&args[1], env)?.to_string();
            let matched = Regex::new(&pattern)?.is_match(&value);
            Ok(Literal::Boolean(matched))
        }
        other => Err(ConditionError::UnknownFunction(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_with(pairs: &[(&str, &str)]) -> Environment {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn holds(condition: &str, env: &Environment) -> bool {
        evaluate_condition(condition, env).unwrap()
    }

    #[test]
    fn test_empty_condition_holds() {
        assert!(holds("", &Environment::new()));
    }

    #[test]
    fn test_string_equality() {
        let env = env_with(&[("CI_COMMIT_BRANCH", "master")]);
        assert!(holds(r#"$CI_COMMIT_BRANCH == "master""#, &env));
        assert!(!holds(r#"$CI_COMMIT_BRANCH == "main""#, &env));
        assert!(holds(r#"$CI_COMMIT_BRANCH != "main""#, &env));
    }

    #[test]
    fn test_regex_operator() {
        let condition = r"$TAG =~ /^v\d+\.\d+\.\d+$/";
        assert!(holds(condition, &env_with(&[("TAG", "v1.2.3")])));
        assert!(!holds(condition, &env_with(&[("TAG", "1.2.3")])));
    }

    #[test]
    fn test_regex_is_unanchored_search() {
        let env = env_with(&[("BRANCH", "feature/login")]);
        assert!(holds("$BRANCH =~ /login/", &env));
    }

    #[test]
    fn test_regex_escaped_slash() {
        let env = env_with(&[("BRANCH", "feature/login")]);
        assert!(holds(r"$BRANCH =~ /^feature\/.+$/", &env));
        assert!(!holds(r"$BRANCH =~ /^bugfix\/.+$/", &env));
    }

    #[test]
    fn test_regex_combined_with_and() {
        let env = env_with(&[
            ("CI_COMMIT_BRANCH", "feature/new-auth"),
            ("DEPLOY_ENV", "production"),
            ("CI_COMMIT_TAG", "v2-45"),
        ]);
        assert!(holds(
            r#"$DEPLOY_ENV == "production" && $CI_COMMIT_TAG =~ /^v\d+-\d+$/"#,
            &env
        ));
    }

    #[test]
    fn test_missing_variable_is_empty_string() {
        assert!(holds(r#"$UNSET == """#, &Environment::new()));
        assert!(!holds("$UNSET", &Environment::new()));
    }

    #[test]
    fn test_bare_variable_truthiness() {
        assert!(holds("$FLAG", &env_with(&[("FLAG", "yes")])));
        assert!(!holds("$FLAG", &env_with(&[("FLAG", "")])));
    }

    #[test]
    fn test_or_and_not() {
        let env = env_with(&[("A", "1"), ("B", "2")]);
        assert!(holds(r#"$A == "x" || $B == "2""#, &env));
        assert!(!holds(r#"$A == "1" && $B == "x""#, &env));
        assert!(holds(r#"!($A == "x")"#, &env));
    }

    #[test]
    fn test_numeric_and_string_ordering() {
        let env = Environment::new();
        assert!(holds("2 > 1", &env));
        assert!(holds("1 <= 1", &env));
        assert!(holds(r#""abc" < "abd""#, &env));
    }

    #[test]
    fn test_native_match_operators() {
        let env = Environment::new();
        assert!(holds(r#""release-1" =~ "^release""#, &env));
        assert!(holds(r#""main" !~ "^release""#, &env));
    }

    #[test]
    fn test_numeric_result_truthiness() {
        let env = Environment::new();
        assert!(holds("3", &env));
        assert!(!holds("0", &env));
    }

    #[test]
    fn test_values_with_quotes_are_literal() {
        let env = env_with(&[("MSG", r#"say "hi""#)]);
        assert!(holds(r#"$MSG == 'say "hi"'"#, &env));
    }

    #[test]
    fn test_mixed_type_equality_is_false() {
        assert!(!holds(r#""1" == 1"#, &Environment::new()));
    }

    #[test]
    fn test_errors() {
        let env = Environment::new();
        assert!(matches!(
            evaluate_condition("$A ==", &env),
            Err(ConditionError::Parse { .. })
        ));
        assert!(matches!(
            evaluate_condition(r#"$A =~ /(/"#, &env),
            Err(ConditionError::InvalidPattern(_))
        ));
        assert!(matches!(
            evaluate_condition(r#"CI == "true""#, &env),
            Err(ConditionError::UnknownVariable(_))
        ));
        assert!(matches!(
            evaluate_condition(r#""a" && true"#, &env),
            Err(ConditionError::Type(_))
        ));
        assert!(matches!(
            evaluate_condition(r#"matches("a")"#, &env),
            Err(ConditionError::Arity { .. })
        ));
        assert!(matches!(
            evaluate_condition(r#"lower("a")"#, &env),
            Err(ConditionError::UnknownFunction(_))
        ));
        assert!(matches!(
            evaluate_condition("1 < \"a\"", &env),
            Err(ConditionError::Type(_))
        ));
    }
}
