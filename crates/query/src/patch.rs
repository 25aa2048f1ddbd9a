// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Patching of already separated multi-level queries.
//!
//! Patches never modify their input: when a patch changes nothing the original `Arc` is returned,
//! otherwise a new multi-level query sharing all untouched sub-queries is built.

use std::{
	collections::{HashMap, HashSet},
	sync::Arc,
};

use lodestar_type::{Result, return_internal_error};
use tracing::{debug, instrument};

use crate::{
	multi_query::{CompiledLevel, CompiledMultiLevelQuery, MultiQueryIndex},
	primitives::CompiledQuery,
};

/// New sub-queries to append, per level, bottom first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncrementalPatch {
	pub level_patches: Vec<Vec<Arc<CompiledQuery>>>,
}

impl IncrementalPatch {
	pub fn generate(level_count: usize) -> Self {
		Self {
			level_patches: vec![Vec::new(); level_count],
		}
	}

	pub fn add_query_for_level(&mut self, level_idx: usize, query: Arc<CompiledQuery>) -> Result<()> {
		match self.level_patches.get_mut(level_idx) {
			Some(level) => {
				level.push(query);
				Ok(())
			}
			None => {
				return_internal_error!("patch has {} levels, got a query for level {}", self.level_patches.len(), level_idx)
			}
		}
	}

	pub fn top_level_query(&self) -> Result<&Arc<CompiledQuery>> {
		match self.level_patches.last().map(Vec::as_slice) {
			Some([query]) => Ok(query),
			_ => return_internal_error!("there must be exactly 1 top-level query in the patch"),
		}
	}

	pub fn level_count(&self) -> usize {
		self.level_patches.len()
	}

	pub fn is_empty(&self) -> bool {
		self.level_patches.iter().all(Vec::is_empty)
	}
}

/// Appends the sub-queries of `patches` to the bottom levels of `multi_query`.
#[instrument(name = "query::patch::apply_incremental_patches", level = "trace", skip_all, fields(patches = patches.len()))]
pub fn apply_incremental_patches(
	multi_query: &Arc<CompiledMultiLevelQuery>,
	patches: &[IncrementalPatch],
) -> Result<Arc<CompiledMultiLevelQuery>> {
	if patches.iter().all(IncrementalPatch::is_empty) {
		return Ok(Arc::clone(multi_query));
	}

	let level_counts: HashSet<usize> = patches.iter().map(IncrementalPatch::level_count).collect();
	if level_counts.len() != 1 {
		return_internal_error!("all patches must have the same number of levels");
	}
	let patch_level_count = patches[0].level_count();
	if patch_level_count > multi_query.level_count() {
		return_internal_error!(
			"patch has {} levels, multi-query only {}",
			patch_level_count,
			multi_query.level_count()
		);
	}

	let mut levels = Vec::with_capacity(multi_query.level_count());
	for (level_idx, level) in multi_query.levels.iter().enumerate() {
		if level_idx >= patch_level_count {
			levels.push(level.clone());
			continue;
		}

		let existing_ids: HashSet<&str> = level.queries.iter().map(|query| query.id.as_str()).collect();
		let mut queries = level.queries.clone();
		for query in patches.iter().flat_map(|patch| patch.level_patches[level_idx].iter()) {
			if existing_ids.contains(query.id.as_str()) {
				return_internal_error!("patch query id {} is already used at level {}", query.id, level_idx);
			}
			queries.push(Arc::clone(query));
		}
		debug!(level_idx, added = queries.len() - level.queries.len(), "patched level");
		levels.push(CompiledLevel {
			level_type: level.level_type,
			queries,
		});
	}

	Ok(Arc::new(CompiledMultiLevelQuery::new(levels)))
}

/// Replaces the sub-query at `index`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementPatch {
	pub index: MultiQueryIndex,
	pub new_subquery: Arc<CompiledQuery>,
}

#[instrument(name = "query::patch::apply_replacement_patches", level = "trace", skip_all, fields(patches = patches.len()))]
pub fn apply_replacement_patches(
	multi_query: &Arc<CompiledMultiLevelQuery>,
	patches: &[ReplacementPatch],
) -> Result<Arc<CompiledMultiLevelQuery>> {
	let mut effective = Vec::with_capacity(patches.len());
	for patch in patches {
		match multi_query.get(patch.index) {
			Some(existing) if Arc::ptr_eq(existing, &patch.new_subquery) => {}
			Some(_) => effective.push(patch),
			None => return_internal_error!(
				"no sub-query at level {} index {}",
				patch.index.level_idx,
				patch.index.query_idx
			),
		}
	}
	if effective.is_empty() {
		return Ok(Arc::clone(multi_query));
	}

	let mut replacements: HashMap<MultiQueryIndex, &Arc<CompiledQuery>> = HashMap::new();
	for patch in effective {
		replacements.insert(patch.index, &patch.new_subquery);
	}

	let levels = multi_query
		.levels
		.iter()
		.enumerate()
		.map(|(level_idx, level)| CompiledLevel {
			level_type: level.level_type,
			queries: level
				.queries
				.iter()
				.enumerate()
				.map(|(query_idx, query)| {
					let replacement = replacements.get(&MultiQueryIndex::new(level_idx, query_idx));
					Arc::clone(replacement.copied().unwrap_or(query))
				})
				.collect(),
		})
		.collect();
	debug!(replaced = replacements.len(), "replaced sub-queries");

	Ok(Arc::new(CompiledMultiLevelQuery::new(levels)))
}

#[cfg(test)]
mod tests {
	use lodestar_formula::build::field;

	use super::*;
	use crate::primitives::{CompiledFormula, ExecutionLevel};

	fn make_query(id: &str) -> Arc<CompiledQuery> {
		let mut query = CompiledQuery::new(id, ExecutionLevel::SourceDb);
		query.select = vec![CompiledFormula::new(field("city"), "res_0")];
		Arc::new(query)
	}

	fn make_multi_query() -> Arc<CompiledMultiLevelQuery> {
		Arc::new(CompiledMultiLevelQuery::new(vec![
			CompiledLevel {
				level_type: ExecutionLevel::SourceDb,
				queries: vec![make_query("qq_0_0_0")],
			},
			CompiledLevel {
				level_type: ExecutionLevel::Compeng,
				queries: vec![make_query("qq")],
			},
		]))
	}

	#[test]
	fn test_empty_incremental_patches_return_original() {
		let multi_query = make_multi_query();

		let result = apply_incremental_patches(&multi_query, &[IncrementalPatch::generate(1)]).unwrap();
		assert!(Arc::ptr_eq(&result, &multi_query));
	}

	#[test]
	fn test_incremental_patch_appends_to_bottom_levels() {
		let multi_query = make_multi_query();
		let mut first = IncrementalPatch::generate(1);
		first.add_query_for_level(0, make_query("lod_0")).unwrap();
		let mut second = IncrementalPatch::generate(1);
		second.add_query_for_level(0, make_query("lod_1")).unwrap();

		let result = apply_incremental_patches(&multi_query, &[first, second]).unwrap();

		let ids: Vec<&str> = result.levels[0].queries.iter().map(|query| query.id.as_str()).collect();
		assert_eq!(ids, vec!["qq_0_0_0", "lod_0", "lod_1"]);
		assert!(Arc::ptr_eq(&result.levels[1].queries[0], &multi_query.levels[1].queries[0]));
		assert_eq!(multi_query.levels[0].queries.len(), 1);
	}

	#[test]
	fn test_incremental_patch_id_collision() {
		let multi_query = make_multi_query();
		let mut patch = IncrementalPatch::generate(1);
		patch.add_query_for_level(0, make_query("qq_0_0_0")).unwrap();

		let err = apply_incremental_patches(&multi_query, &[patch]).unwrap_err();
		assert_eq!(err.code, "INTERNAL_ERROR");
		assert!(err.message.contains("already used"));
	}

	#[test]
	fn test_incremental_patch_level_count_mismatch() {
		let multi_query = make_multi_query();
		let mut first = IncrementalPatch::generate(1);
		first.add_query_for_level(0, make_query("lod_0")).unwrap();
		let second = IncrementalPatch::generate(2);

		assert!(apply_incremental_patches(&multi_query, &[first, second]).is_err());
	}

	#[test]
	fn test_add_query_out_of_range() {
		let mut patch = IncrementalPatch::generate(1);
		assert!(patch.add_query_for_level(3, make_query("lod_0")).is_err());
	}

	#[test]
	fn test_top_level_query() {
		let mut patch = IncrementalPatch::generate(2);
		assert!(patch.top_level_query().is_err());

		patch.add_query_for_level(1, make_query("lod_top")).unwrap();
		assert_eq!(patch.top_level_query().unwrap().id, "lod_top");
		assert!(!patch.is_empty());
	}

	#[test]
	fn test_replacement_patch_noop_returns_original() {
		let multi_query = make_multi_query();
		let patch = ReplacementPatch {
			index: MultiQueryIndex::new(0, 0),
			new_subquery: Arc::clone(&multi_query.levels[0].queries[0]),
		};

		let result = apply_replacement_patches(&multi_query, &[patch]).unwrap();
		assert!(Arc::ptr_eq(&result, &multi_query));
	}

	#[test]
	fn test_replacement_patch_with_equal_copy_is_applied() {
		let multi_query = make_multi_query();
		let patch = ReplacementPatch {
			index: MultiQueryIndex::new(0, 0),
			new_subquery: make_query("qq_0_0_0"),
		};

		let result = apply_replacement_patches(&multi_query, &[patch.clone()]).unwrap();
		assert!(!Arc::ptr_eq(&result, &multi_query));
		assert!(Arc::ptr_eq(&result.levels[0].queries[0], &patch.new_subquery));
		assert!(Arc::ptr_eq(&result.levels[1].queries[0], &multi_query.levels[1].queries[0]));
	}

	#[test]
	fn test_replacement_patch_unknown_index() {
		let multi_query = make_multi_query();
		let patch = ReplacementPatch {
			index: MultiQueryIndex::new(1, 4),
			new_subquery: make_query("x"),
		};

		assert_eq!(apply_replacement_patches(&multi_query, &[patch]).unwrap_err().code, "INTERNAL_ERROR");
	}
}
