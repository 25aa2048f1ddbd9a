// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use crate::{
	mutation::Mutation,
	node::{Node, NodeKind},
};

/// Drops parentheses that carry no level tag.
pub struct RemoveParenthesesMutation;

impl Mutation for RemoveParenthesesMutation {
	fn name(&self) -> &'static str {
		"remove_parentheses"
	}

	fn match_node(&self, node: &Node, _parent_stack: &[Node]) -> bool {
		matches!(node.kind(), NodeKind::Parenthesized(_)) && node.meta().level_tag.is_none()
	}

	fn make_replacement(&self, old: &Node, _parent_stack: &[Node]) -> Node {
		match old.kind() {
			NodeKind::Parenthesized(expr) => expr.clone(),
			_ => old.clone(),
		}
	}
}
