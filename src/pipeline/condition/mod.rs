// SPDX-License-Identifier: MIT

//! Rule condition evaluation
//!
//! Conditions use the CI rule dialect:
//! - `$CI_COMMIT_BRANCH == "main"`
//! - `$CI_COMMIT_TAG =~ /^v\d+$/`
//! - `$DEPLOY == "prod" && $CI_PIPELINE_SOURCE != "schedule"`
//!
//! They are rewritten into a small expression language, parsed, then
//! evaluated against the environment.

mod ast;
mod evaluator;
mod parser;
mod rewrite;

pub use ast::{CompareOp, Expression, Literal};
pub use evaluator::{evaluate, evaluate_condition};
pub use parser::parse;
pub use rewrite::{quote, rewrite};
