// SPDX-License-Identifier: MIT

//! Simulate which jobs of a CI pipeline definition would run for a given
//! set of variables, without running anything.

pub mod error;
pub mod pipeline;
