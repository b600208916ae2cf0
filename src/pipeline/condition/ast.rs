// SPDX-License-Identifier: MIT

//! Abstract Syntax Tree for condition expressions

use std::fmt;

/// A condition expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Literal value
    Literal(Literal),
    /// Bare identifier, looked up in the environment
    Variable(String),
    /// Binary comparison: left op right
    Compare {
        left: Box<Expression>,
        op: CompareOp,
        right: Box<Expression>,
    },
    /// Logical AND
    And(Box<Expression>, Box<Expression>),
    /// Logical OR
    Or(Box<Expression>, Box<Expression>),
    /// Logical NOT
    Not(Box<Expression>),
    /// Numeric negation
    Negate(Box<Expression>),
    /// Function call, e.g. `matches(value, "pattern")`
    Call { name: String, args: Vec<Expression> },
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// ==
    Eq,
    /// !=
    NotEq,
    /// >
    Gt,
    /// >=
    Gte,
    /// <
    Lt,
    /// <=
    Lte,
    /// =~ (regex search)
    Match,
    /// !~
    NotMatch,
}

/// Literal values, also used as evaluation results
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Number(f64),
    Boolean(bool),
}

impl Literal {
    pub fn type_name(&self) -> &'static str {
        match self {
            Literal::String(_) => "string",
            Literal::Number(_) => "number",
            Literal::Boolean(_) => "boolean",
        }
    }

    /// Truthiness of a condition result: non-empty strings and non-zero
    /// numbers are true
    pub fn is_truthy(&self) -> bool {
        match self {
            Literal::Boolean(b) => *b,
            Literal::String(s) => !s.is_empty(),
            Literal::Number(n) => *n != 0.0,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(s) => write!(f, "{}", s),
            Literal::Number(n) => write!(f, "{}", n),
            Literal::Boolean(b) => write!(f, "{}", b),
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::Eq => write!(f, "=="),
            CompareOp::NotEq => write!(f, "!="),
            CompareOp::Gt => write!(f, ">"),
            CompareOp::Gte => write!(f, ">="),
            CompareOp::Lt => write!(f, "<"),
            CompareOp::Lte => write!(f, "<="),
            CompareOp::Match => write!(f, "=~"),
            CompareOp::NotMatch => write!(f, "!~"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_op_display() {
        assert_eq!(format!("{}", CompareOp::Eq), "==");
        assert_eq!(format!("{}", CompareOp::NotEq), "!=");
        assert_eq!(format!("{}", CompareOp::Gte), ">=");
        assert_eq!(format!("{}", CompareOp::Match), "=~");
        assert_eq!(format!("{}", CompareOp::NotMatch), "!~");
    }

    #[test]
    fn test_truthiness() {
        assert!(Literal::Boolean(true).is_truthy());
        assert!(!Literal::Boolean(false).is_truthy());
        assert!(Literal::String("x".into()).is_truthy());
        assert!(!Literal::String(String::new()).is_truthy());
        assert!(Literal::Number(-1.5).is_truthy());
        assert!(!Literal::Number(0.0).is_truthy());
    }

    #[test]
    fn test_literal_display() {
        assert_eq!(Literal::Number(3.0).to_string(), "3");
        assert_eq!(Literal::Number(0.5).to_string(), "0.5");
        assert_eq!(Literal::Boolean(true).to_string(), "true");
    }
}
