// SPDX-License-Identifier: MIT

pub mod condition;
pub mod expander;
pub mod extractor;
pub mod loader;
pub mod printer;
pub mod rules;
pub mod simulator;
pub mod tree;
pub mod types;

pub use simulator::{expand_source, SimulationReport, Simulator};
pub use types::{Environment, Job, JobResult, Rule, When};
