// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Tree rewriting.
//!
//! A [`Mutation`] is a match/replace rule. [`apply_mutations`] runs each rule over the whole tree
//! bottom-up: children are rewritten first, then the rebuilt node is offered to the rule together
//! with the stack of its ancestors (outermost first). A replacement is not descended into again.
//! Untouched sub-trees are shared with the input.

mod block;
pub mod lookup;
mod optimization;
mod parenthesis;

pub use block::{CaseBlockToFunctionMutation, IfBlockToFunctionMutation};
pub use lookup::{
	AgoStrategy, AtDateStrategy, LookupDefaultBfbMutation, LookupFunctionToQueryForkMutation, LookupRegistry,
	LookupStrategy,
};
pub use optimization::{
	AndOrOptimizerMutation, AndOrZeroOneMutation, CaseOptimizerMutation, ComparisonZeroOneMutation,
	ConstComparisonMutation, ConstMathMutation, IfOptimizerMutation, NotOptimizerMutation, UnaryBoolOptimizerMutation,
};
pub use parenthesis::RemoveParenthesesMutation;
use tracing::{debug, instrument};

use crate::node::Node;

pub trait Mutation {
	fn name(&self) -> &'static str;

	fn match_node(&self, node: &Node, parent_stack: &[Node]) -> bool;

	/// Builds the replacement of a matched node. Lowering failures are reported by returning
	/// an error node rather than failing the whole pass.
	fn make_replacement(&self, old: &Node, parent_stack: &[Node]) -> Node;
}

fn replace_nodes(node: &Node, mutation: &dyn Mutation, parent_stack: &mut Vec<Node>, replaced: &mut usize) -> Node {
	let children = node.children();
	let mut rebuilt = node.clone();
	if !children.is_empty() {
		parent_stack.push(node.clone());
		let mut changed = false;
		let mut new_children = Vec::with_capacity(children.len());
		for child in children {
			let new_child = replace_nodes(child, mutation, parent_stack, replaced);
			changed |= !Node::ptr_eq(&new_child, child);
			new_children.push(new_child);
		}
		parent_stack.pop();
		if changed {
			rebuilt = node.with_children(new_children);
		}
	}

	if mutation.match_node(&rebuilt, parent_stack) {
		*replaced += 1;
		mutation.make_replacement(&rebuilt, parent_stack)
	} else {
		rebuilt
	}
}

/// Applies a single rule to every node of `tree`.
pub fn apply_mutation(tree: &Node, mutation: &dyn Mutation) -> Node {
	let mut parent_stack = Vec::new();
	let mut replaced = 0;
	let result = replace_nodes(tree, mutation, &mut parent_stack, &mut replaced);
	debug!(mutation = mutation.name(), replaced, "applied mutation");
	result
}

/// Applies the rules one after another, each over the whole tree.
#[instrument(name = "formula::mutation::apply", level = "trace", skip_all, fields(count = mutations.len()))]
pub fn apply_mutations(tree: &Node, mutations: &[&dyn Mutation]) -> Node {
	mutations.iter().fold(tree.clone(), |tree, mutation| apply_mutation(&tree, *mutation))
}

/// Canonical lowering order: syntax sugar first, then constants, then lookups.
pub fn standard_lowering_passes<'a>(
	lookup_bfb: &'a LookupDefaultBfbMutation<'a>,
	lookup_fork: &'a LookupFunctionToQueryForkMutation<'a>,
) -> Vec<&'a dyn Mutation> {
	vec![
		&RemoveParenthesesMutation as &dyn Mutation,
		&IfBlockToFunctionMutation,
		&CaseBlockToFunctionMutation,
		&ConstComparisonMutation,
		&ConstMathMutation,
		&UnaryBoolOptimizerMutation,
		&NotOptimizerMutation,
		&AndOrOptimizerMutation,
		&IfOptimizerMutation,
		&CaseOptimizerMutation,
		lookup_bfb,
		lookup_fork,
	]
}

/// Simplifications of filter conditions compared with `0`/`1` or `FALSE`/`TRUE`.
pub fn filter_comparison_passes() -> Vec<&'static dyn Mutation> {
	vec![&ComparisonZeroOneMutation, &AndOrZeroOneMutation]
}
