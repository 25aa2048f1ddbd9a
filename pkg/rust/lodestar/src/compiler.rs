// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use lodestar_formula::{
	AggregationChecker, Node, apply_mutations,
	error::into_error,
	inspect::collect_errors,
	mutation::{LookupDefaultBfbMutation, LookupFunctionToQueryForkMutation},
	filter_comparison_passes, standard_lowering_passes, validate,
};
use lodestar_legend::{BlockFormalizer, BlockLegend, FieldSource, Legend, LegendFormalizer, Notification, raw::RawQuerySpec};
use lodestar_query::{CompiledMultiLevelQuery, CompiledMultiQuery, QuerySeparator, SlicedQuery};
use lodestar_type::Result;
use tracing::{debug, instrument};

use crate::CompilerConfig;

/// Entry point of the compilation pipeline. Holds no per-request state, so one instance can
/// serve concurrent requests.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
	config: CompilerConfig,
}

/// Result of formalizing a raw data request.
#[derive(Debug, Clone)]
pub struct FormalizedRequest {
	pub legend: Legend,
	pub block_legend: BlockLegend,
	pub notifications: Vec<Notification>,
}

impl Compiler {
	pub fn new(config: CompilerConfig) -> Self {
		Self {
			config,
		}
	}

	pub fn config(&self) -> &CompilerConfig {
		&self.config
	}

	/// Runs the standard lowering passes. Lowering failures are embedded into the tree as error
	/// nodes and reported here, all of them or the first one depending on the configuration.
	#[instrument(name = "lodestar::compiler::lower_formula", level = "debug", skip_all)]
	pub fn lower_formula(&self, tree: &Node, global_dimensions: &[Node]) -> Result<Node> {
		let registry = self.config.lookup_registry.as_ref();
		let bfb = LookupDefaultBfbMutation::new(registry);
		let fork = LookupFunctionToQueryForkMutation::new(registry, global_dimensions, self.config.allow_empty_dimensions);
		let lowered = apply_mutations(tree, &standard_lowering_passes(&bfb, &fork));

		let mut errors = collect_errors(&lowered);
		if !self.config.collect_errors {
			errors.truncate(1);
		}
		match into_error(errors) {
			Some(err) => Err(err),
			None => Ok(lowered),
		}
	}

	/// Lowers a filter condition. On top of the standard passes, comparisons of a condition
	/// with `0`/`1` are folded into the condition itself or its negation.
	pub fn lower_filter(&self, tree: &Node, global_dimensions: &[Node]) -> Result<Node> {
		let lowered = self.lower_formula(tree, global_dimensions)?;
		Ok(apply_mutations(&lowered, &filter_comparison_passes()))
	}

	#[instrument(name = "lodestar::compiler::validate_formula", level = "debug", skip_all)]
	pub fn validate_formula(&self, tree: &Node, global_dimensions: &[Node]) -> Result<()> {
		let mut checker = AggregationChecker::new(global_dimensions.to_vec());
		validate(tree, &mut [&mut checker], self.config.collect_errors)
	}

	/// Lowers and validates one formula.
	pub fn compile_formula(&self, tree: &Node, global_dimensions: &[Node]) -> Result<Node> {
		let lowered = self.lower_formula(tree, global_dimensions)?;
		self.validate_formula(&lowered, global_dimensions)?;
		Ok(lowered)
	}

	pub fn make_legend<S: FieldSource + ?Sized>(&self, raw: &RawQuerySpec, source: &S) -> Result<Legend> {
		LegendFormalizer::new(source).with_autofill(self.config.autofill_legend).make_legend(raw)
	}

	pub fn make_block_legend(&self, raw: &RawQuerySpec, legend: &Legend) -> Result<(BlockLegend, Vec<Notification>)> {
		BlockFormalizer::new().make_block_legend(raw, legend)
	}

	/// Legend and blocks of a raw request.
	#[instrument(name = "lodestar::compiler::formalize_request", level = "debug", skip_all)]
	pub fn formalize_request<S: FieldSource + ?Sized>(&self, raw: &RawQuerySpec, source: &S) -> Result<FormalizedRequest> {
		let legend = self.make_legend(raw, source)?;
		let (block_legend, notifications) = self.make_block_legend(raw, &legend)?;
		debug!(items = legend.len(), blocks = block_legend.blocks.len(), "formalized request");
		Ok(FormalizedRequest {
			legend,
			block_legend,
			notifications,
		})
	}

	pub fn separate_query(&self, sliced_query: &SlicedQuery, iteration_id: &str) -> Result<CompiledMultiLevelQuery> {
		QuerySeparator::new(self.config.source_row_limit).separate_query(sliced_query, iteration_id)
	}

	/// Separates a sliced query and flattens it into the DAG handed to execution.
	#[instrument(name = "lodestar::compiler::compile_multi_query", level = "debug", skip_all, fields(query_id = %sliced_query.id))]
	pub fn compile_multi_query(&self, sliced_query: &SlicedQuery, iteration_id: &str) -> Result<CompiledMultiQuery> {
		let multi_query = self.separate_query(sliced_query, iteration_id)?.flatten()?;
		multi_query.single_top_query()?;
		debug!(queries = multi_query.len(), "compiled multi-query");
		Ok(multi_query)
	}
}
