// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Lowering of lookup functions (`AGO`, `AT_DATE`) into query forks.

mod registry;
mod strategy;

pub use registry::{LookupRegistry, LookupRegistryBuilder};
pub use strategy::{AgoStrategy, AtDateStrategy, LookupStrategy};
use tracing::trace;

use crate::{
	error::FormulaError,
	inspect::{is_aggregate_expression, resolve_dimensions, used_fields},
	mutation::Mutation,
	node::{FuncCall, JoinCondition, JoinType, Lod, Node, NodeKind, QueryFork},
};

fn lookup_call<'n>(registry: &LookupRegistry, node: &'n Node) -> Option<&'n FuncCall> {
	match node.kind() {
		NodeKind::Call(call) if registry.contains(&call.name) => Some(call),
		_ => None,
	}
}

fn error_node(old: &Node, error: FormulaError) -> Node {
	old.replace_kind(NodeKind::Error(error))
}

fn arg_number_error(strategy: &dyn LookupStrategy, call: &FuncCall, old: &Node) -> Option<Node> {
	if strategy.arity().contains(&call.args.len()) {
		return None;
	}
	Some(error_node(old, FormulaError::LookupFunctionArgNumber {
		function: call.name.to_uppercase(),
		count: call.args.len(),
		fragment: old.diagnostic_fragment(),
	}))
}

/// Adds a plain-field lookup dimension to the function's `BEFORE FILTER BY` clause so that the
/// filter on that dimension is not applied twice around the generated join.
pub struct LookupDefaultBfbMutation<'a> {
	registry: &'a LookupRegistry,
}

impl<'a> LookupDefaultBfbMutation<'a> {
	pub fn new(registry: &'a LookupRegistry) -> Self {
		Self {
			registry,
		}
	}
}

impl Mutation for LookupDefaultBfbMutation<'_> {
	fn name(&self) -> &'static str {
		"lookup_default_bfb"
	}

	fn match_node(&self, node: &Node, _parent_stack: &[Node]) -> bool {
		let Some(call) = lookup_call(self.registry, node) else {
			return false;
		};
		let Some(strategy) = self.registry.get(&call.name) else {
			return false;
		};
		if !strategy.arity().contains(&call.args.len()) {
			return true;
		}
		strategy.lookup_dimension(&call.args).field_name().is_some_and(|name| !call.before_filter_by.contains(name))
	}

	fn make_replacement(&self, old: &Node, _parent_stack: &[Node]) -> Node {
		let Some(call) = lookup_call(self.registry, old) else {
			return old.clone();
		};
		let Some(strategy) = self.registry.get(&call.name) else {
			return old.clone();
		};
		if let Some(error) = arg_number_error(strategy, call, old) {
			return error;
		}
		let dimension = strategy.lookup_dimension(&call.args);
		match dimension.field_name() {
			Some(name) if !call.before_filter_by.contains(name) => old.replace_kind(NodeKind::Call(FuncCall {
				before_filter_by: call.before_filter_by.with(name),
				..call.clone()
			})),
			_ => old.clone(),
		}
	}
}

/// Replaces every registered lookup function call with a left [`QueryFork`] joined on the
/// lookup conditions plus a self-equality condition for each other query dimension.
pub struct LookupFunctionToQueryForkMutation<'a> {
	registry: &'a LookupRegistry,
	global_dimensions: &'a [Node],
	allow_empty_dimensions: bool,
}

impl<'a> LookupFunctionToQueryForkMutation<'a> {
	pub fn new(registry: &'a LookupRegistry, global_dimensions: &'a [Node], allow_empty_dimensions: bool) -> Self {
		Self {
			registry,
			global_dimensions,
			allow_empty_dimensions,
		}
	}

	fn lower(&self, strategy: &dyn LookupStrategy, call: &FuncCall, old: &Node, parent_stack: &[Node]) -> Node {
		if let Some(error) = arg_number_error(strategy, call, old) {
			return error;
		}
		let function = call.name.to_uppercase();

		let result_expr = strategy.result_expr(&call.args);
		if !is_aggregate_expression(&result_expr) {
			return error_node(old, FormulaError::LookupFunctionWithoutAggregation {
				function,
				fragment: old.diagnostic_fragment(),
			});
		}

		let lookup_dimension = strategy.lookup_dimension(&call.args);
		let lookup_conditions = strategy.join_conditions(&call.args);

		if is_aggregate_expression(&lookup_dimension) {
			return error_node(old, FormulaError::LookupFunctionAggregatedDimension {
				function,
				fragment: lookup_dimension.diagnostic_fragment(),
			});
		}
		if call.ignore_dimensions.contains(&lookup_dimension) {
			return error_node(old, FormulaError::LookupFunctionIgnoredLookupDimension {
				function,
				dimension: lookup_dimension.to_string(),
				fragment: lookup_dimension.diagnostic_fragment(),
			});
		}

		let references_fields = lookup_conditions
			.iter()
			.flat_map(JoinCondition::nodes)
			.any(|node| !used_fields(node).is_empty());
		if !references_fields {
			return error_node(old, FormulaError::LookupFunctionConstantLookupDimension {
				function,
				fragment: lookup_dimension.diagnostic_fragment(),
			});
		}

		let dimensions = resolve_dimensions(self.global_dimensions, parent_stack);
		let mut joining = Vec::with_capacity(dimensions.len() + lookup_conditions.len());
		let mut found = false;
		for dimension in &dimensions {
			if call.ignore_dimensions.contains(dimension) {
				continue;
			}
			if dimension == &lookup_dimension {
				found = true;
				joining.extend(lookup_conditions.iter().cloned());
			} else {
				joining.push(JoinCondition::SelfEquality {
					expr: dimension.clone(),
				});
			}
		}

		// a single formula is validated without any query dimensions
		let tolerated = self.allow_empty_dimensions && dimensions.is_empty();
		if !found && !tolerated {
			return error_node(old, FormulaError::LookupFunctionUnselectedDimension {
				function,
				dimension: lookup_dimension.to_string(),
				fragment: lookup_dimension.diagnostic_fragment(),
			});
		}

		trace!(function = %function, conditions = joining.len(), "lowered lookup function");
		old.replace_kind(NodeKind::QueryFork(QueryFork {
			join_type: JoinType::Left,
			result_expr,
			joining,
			before_filter_by: call.before_filter_by.clone(),
			lod: Lod::Inherited,
			bfb_filter_mutations: strategy.bfb_filter_mutations(&call.args),
		}))
	}
}

impl Mutation for LookupFunctionToQueryForkMutation<'_> {
	fn name(&self) -> &'static str {
		"lookup_function_to_query_fork"
	}

	fn match_node(&self, node: &Node, _parent_stack: &[Node]) -> bool {
		lookup_call(self.registry, node).is_some()
	}

	fn make_replacement(&self, old: &Node, parent_stack: &[Node]) -> Node {
		let Some(call) = lookup_call(self.registry, old) else {
			return old.clone();
		};
		match self.registry.get(&call.name) {
			Some(strategy) => self.lower(strategy, call, old, parent_stack),
			None => old.clone(),
		}
	}
}
