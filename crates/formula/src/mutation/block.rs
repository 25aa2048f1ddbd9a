// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use crate::{
	mutation::Mutation,
	node::{FuncCall, Node, NodeKind},
};

/// `IF c1 THEN t1 ELSEIF c2 THEN t2 ELSE e END` becomes `if(c1, t1, c2, t2, e)`.
pub struct IfBlockToFunctionMutation;

impl Mutation for IfBlockToFunctionMutation {
	fn name(&self) -> &'static str {
		"if_block_to_function"
	}

	fn match_node(&self, node: &Node, _parent_stack: &[Node]) -> bool {
		matches!(node.kind(), NodeKind::If(_))
	}

	fn make_replacement(&self, old: &Node, _parent_stack: &[Node]) -> Node {
		let NodeKind::If(block) = old.kind() else {
			return old.clone();
		};
		let mut args = Vec::with_capacity(block.parts.len() * 2 + 1);
		for part in &block.parts {
			args.push(part.cond.clone());
			args.push(part.then.clone());
		}
		args.push(block.else_expr.clone());
		old.replace_kind(NodeKind::Call(FuncCall::new("if", args)))
	}
}

/// `CASE e WHEN v1 THEN t1 ELSE d END` becomes `case(e, v1, t1, d)`.
pub struct CaseBlockToFunctionMutation;

impl Mutation for CaseBlockToFunctionMutation {
	fn name(&self) -> &'static str {
		"case_block_to_function"
	}

	fn match_node(&self, node: &Node, _parent_stack: &[Node]) -> bool {
		matches!(node.kind(), NodeKind::Case(_))
	}

	fn make_replacement(&self, old: &Node, _parent_stack: &[Node]) -> Node {
		let NodeKind::Case(block) = old.kind() else {
			return old.clone();
		};
		let mut args = Vec::with_capacity(block.whens.len() * 2 + 2);
		args.push(block.case_expr.clone());
		for when in &block.whens {
			args.push(when.value.clone());
			args.push(when.then.clone());
		}
		args.push(block.else_expr.clone());
		old.replace_kind(NodeKind::Call(FuncCall::new("case", args)))
	}
}
