// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::node::{BeforeFilterBy, Lod, Node};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinType {
	#[default]
	Inner,
	Left,
	Right,
	Full,
}

impl Display for JoinType {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			JoinType::Inner => f.write_str("INNER"),
			JoinType::Left => f.write_str("LEFT"),
			JoinType::Right => f.write_str("RIGHT"),
			JoinType::Full => f.write_str("FULL"),
		}
	}
}

/// How the outer query is matched against its forked copy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JoinCondition {
	/// `expr` of the outer query equals the same `expr` of the fork
	SelfEquality {
		expr: Node,
	},
	/// `expr` of the outer query equals `fork_expr` evaluated in the fork
	Binary {
		expr: Node,
		fork_expr: Node,
	},
}

impl JoinCondition {
	pub fn nodes(&self) -> Vec<&Node> {
		match self {
			JoinCondition::SelfEquality {
				expr,
			} => vec![expr],
			JoinCondition::Binary {
				expr,
				fork_expr,
			} => vec![expr, fork_expr],
		}
	}
}

/// Filter rewrite applied inside the fork: filters on `original` are rewritten to `replacement`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BfbFilterMutation {
	pub original: Node,
	pub replacement: Node,
}

/// Correlated self-join: `result_expr` is computed over a copy of the query and joined back on `joining`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryFork {
	pub join_type: JoinType,
	pub result_expr: Node,
	pub joining: Vec<JoinCondition>,
	pub before_filter_by: BeforeFilterBy,
	pub lod: Lod,
	pub bfb_filter_mutations: Vec<BfbFilterMutation>,
}
