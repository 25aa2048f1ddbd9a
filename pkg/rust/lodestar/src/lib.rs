// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Lodestar compiles analytical data requests: formulas are lowered and validated, the requested
//! legend is split into placed blocks, and sliced queries are separated into a multi-level query
//! DAG ready for execution.

#![cfg_attr(not(debug_assertions), deny(warnings))]

mod compiler;
mod config;
pub mod logging;

pub use compiler::{Compiler, FormalizedRequest};
pub use config::{CompilerConfig, CompilerConfigBuilder};
pub use lodestar_formula as formula;
pub use lodestar_legend as legend;
pub use lodestar_query as query;
pub use lodestar_type::{Error, Result};
pub use logging::TracingBuilder;
