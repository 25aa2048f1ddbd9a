// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Formula trees and the passes run over them before query planning: syntax lowering,
//! constant folding, lookup-to-fork lowering and aggregation validation.

#![cfg_attr(not(debug_assertions), deny(warnings))]

pub mod build;
pub mod error;
pub mod function;
pub mod inspect;
pub mod mutation;
pub mod node;
pub mod validation;

pub use error::FormulaError;
pub use mutation::{Mutation, apply_mutation, apply_mutations, filter_comparison_passes, standard_lowering_passes};
pub use node::{Node, NodeKind, NodeMeta};
pub use validation::{AggregationChecker, Checker, validate};
