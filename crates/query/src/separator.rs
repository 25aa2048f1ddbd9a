// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Turns a sliced query into one compiled query per execution level.
//!
//! Levels are built bottom-up. Each level reads from the previous one through a single sub-query
//! FROM that exposes the previous SELECT aliases as columns; level 0 reads from the original
//! avatars. Expressions of higher levels reference lower-level results by alias, so their avatar
//! ids are recomputed from the id of the query that produced each alias.

use std::{
	collections::{BTreeMap, BTreeSet, HashMap, HashSet},
	sync::Arc,
};

use lodestar_formula::{Node, inspect::used_fields};
use lodestar_type::{Result, return_error, return_internal_error};
use tracing::{debug, instrument};

use crate::{
	error::QueryError,
	multi_query::{CompiledLevel, CompiledMultiLevelQuery},
	primitives::{
		CompiledFormula, CompiledJoinOn, CompiledOrderBy, CompiledQuery, FromColumn, FromObject, JoinedFromObject,
		QueryMeta,
	},
	sliced::{SlicedFormula, SlicedQuery},
};

/// Row cap of queries that are never exposed to the user directly.
pub const DEFAULT_SOURCE_ROW_LIMIT: u64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuerySeparator {
	source_row_limit: u64,
}

impl Default for QuerySeparator {
	fn default() -> Self {
		Self::new(DEFAULT_SOURCE_ROW_LIMIT)
	}
}

impl QuerySeparator {
	pub fn new(source_row_limit: u64) -> Self {
		Self {
			source_row_limit,
		}
	}

	/// Ids must be stable across runs so that compiled queries stay cacheable.
	fn make_query_id(top_id: &str, level_idx: usize, query_idx: usize, is_top_level: bool, iteration_id: &str) -> String {
		if is_top_level {
			top_id.to_string()
		} else {
			format!("{top_id}_{iteration_id}_{level_idx}_{query_idx}")
		}
	}

	#[instrument(
		name = "query::separator::separate_query",
		level = "trace",
		skip_all,
		fields(query_id = %sliced_query.id, iteration_id = iteration_id)
	)]
	pub fn separate_query(&self, sliced_query: &SlicedQuery, iteration_id: &str) -> Result<CompiledMultiLevelQuery> {
		check_level_plan(sliced_query)?;

		let query_top_level_idx = sliced_query.level_count() - 1;
		let mut separation = Separation::default();
		let mut levels: Vec<CompiledLevel> = Vec::with_capacity(sliced_query.level_count());

		for (level_idx, level_type) in sliced_query.level_types.iter().copied().enumerate() {
			let is_top_level = level_idx == query_top_level_idx;
			let query_idx = 0;
			let query_id = Self::make_query_id(&sliced_query.id, level_idx, query_idx, is_top_level, iteration_id);

			let mut used_avatar_ids = BTreeSet::new();
			let mut select: BTreeMap<String, CompiledFormula> = BTreeMap::new();
			let mut group_by: BTreeMap<String, CompiledFormula> = BTreeMap::new();
			let mut order_by: BTreeMap<String, CompiledOrderBy> = BTreeMap::new();
			let mut filters: BTreeMap<String, CompiledFormula> = BTreeMap::new();
			let mut join_on: BTreeMap<String, CompiledJoinOn> = BTreeMap::new();

			for sliced in &sliced_query.select {
				if let Some((_, pieces)) = separation.level_pieces(level_idx, sliced, &mut used_avatar_ids)? {
					separation.add_to_select(&mut select, pieces, &query_id);
				}
			}
			for sliced in &sliced_query.group_by {
				match separation.level_pieces(level_idx, sliced, &mut used_avatar_ids)? {
					Some((true, pieces)) => separation.add_to_select(&mut select, pieces, &query_id),
					Some((false, pieces)) => group_by.extend(pieces),
					None => {}
				}
			}
			for sliced in &sliced_query.order_by {
				match separation.level_pieces(level_idx, &sliced.sliced, &mut used_avatar_ids)? {
					Some((true, pieces)) => separation.add_to_select(&mut select, pieces, &query_id),
					Some((false, pieces)) => order_by.extend(pieces.into_iter().map(|(alias, formula)| {
						(
							alias,
							CompiledOrderBy {
								formula,
								direction: sliced.direction,
							},
						)
					})),
					None => {}
				}
			}
			for sliced in &sliced_query.filters {
				match separation.level_pieces(level_idx, sliced, &mut used_avatar_ids)? {
					Some((true, pieces)) => separation.add_to_select(&mut select, pieces, &query_id),
					Some((false, pieces)) => filters.extend(pieces),
					None => {}
				}
			}
			for sliced in &sliced_query.join_on {
				match separation.level_pieces(level_idx, &sliced.sliced, &mut used_avatar_ids)? {
					Some((true, pieces)) => separation.add_to_select(&mut select, pieces, &query_id),
					Some((false, pieces)) => join_on.extend(pieces.into_iter().map(|(alias, formula)| {
						(
							alias,
							CompiledJoinOn {
								formula,
								left_id: sliced.left_id.clone(),
								right_id: sliced.right_id.clone(),
								join_type: sliced.join_type,
							},
						)
					})),
					None => {}
				}
			}

			debug!(
				level_idx,
				query_idx,
				query_id = %query_id,
				level_type = %level_type,
				avatar_ids = ?used_avatar_ids,
				"separated level query"
			);

			let (select, order_by, limit, offset, row_count_hard_limit, field_order) = if is_top_level {
				let select = restore_original_order("select", sliced_query.select.iter(), &select, |formula, alias| {
					formula.alias = Some(alias)
				})?;
				let order_by = restore_original_order(
					"order_by",
					sliced_query.order_by.iter().map(|sliced| &sliced.sliced),
					&order_by,
					|order_by, alias| order_by.formula.alias = Some(alias),
				)?;
				(
					select,
					order_by,
					sliced_query.limit,
					sliced_query.offset,
					sliced_query.meta.row_count_hard_limit,
					sliced_query.meta.field_order.clone(),
				)
			} else {
				(
					select.into_values().collect(),
					order_by.into_values().collect(),
					None,
					None,
					Some(self.source_row_limit),
					None,
				)
			};

			let joined_from = match levels.last() {
				None => sliced_query.joined_from.clone(),
				Some(previous_level) => match previous_level.queries.first() {
					Some(previous_query) => subquery_from(previous_query)?,
					None => return_internal_error!("level {} has no queries", level_idx - 1),
				},
			};

			let query = CompiledQuery {
				id: query_id,
				level_type,
				select,
				group_by: group_by.into_values().collect(),
				filters: filters.into_values().collect(),
				order_by,
				join_on: join_on.into_values().collect(),
				joined_from,
				limit,
				offset,
				meta: QueryMeta {
					row_count_hard_limit,
					field_order,
					..sliced_query.meta.clone()
				},
			};
			levels.push(CompiledLevel {
				level_type,
				queries: vec![Arc::new(query)],
			});
		}

		if levels[query_top_level_idx].queries.len() != 1 {
			return_internal_error!("there must be only one top level query");
		}

		Ok(CompiledMultiLevelQuery::new(levels))
	}
}

fn check_level_plan(sliced_query: &SlicedQuery) -> Result<()> {
	if sliced_query.level_types.is_empty() {
		return_error!(QueryError::EmptyLevelPlan {
			query_id: sliced_query.id.clone(),
		});
	}
	let all_formulas = sliced_query
		.select
		.iter()
		.chain(sliced_query.group_by.iter())
		.chain(sliced_query.order_by.iter().map(|sliced| &sliced.sliced))
		.chain(sliced_query.filters.iter())
		.chain(sliced_query.join_on.iter().map(|sliced| &sliced.sliced));
	for sliced in all_formulas {
		if sliced.level_count() == 0 {
			return_error!(QueryError::EmptyFormulaSlice {
				query_id: sliced_query.id.clone(),
			});
		}
		if sliced.level_count() > sliced_query.level_count() {
			let alias = sliced
				.top_slice()
				.and_then(|slice| slice.aliased_formulas.keys().next())
				.cloned()
				.unwrap_or_default();
			return_error!(QueryError::LevelCountMismatch {
				query_id: sliced_query.id.clone(),
				alias,
				formula_levels: sliced.level_count(),
				query_levels: sliced_query.level_count(),
			});
		}
	}
	Ok(())
}

/// Sub-query FROM exposing the SELECT aliases of `query`.
fn subquery_from(query: &CompiledQuery) -> Result<JoinedFromObject> {
	let mut columns = Vec::with_capacity(query.select.len());
	for formula in &query.select {
		match &formula.alias {
			Some(alias) => columns.push(FromColumn::new(alias.clone(), alias.clone())),
			None => return_internal_error!("select expression {} of query {} has no alias", formula.expr, query.id),
		}
	}
	Ok(JoinedFromObject {
		root_from_id: Some(query.id.clone()),
		froms: vec![FromObject::subquery(query.id.clone(), columns)],
	})
}

/// Re-emits top-level expressions in the order they were requested. Repeated aliases get a
/// `_cp{n}` suffix.
fn restore_original_order<'a, T: Clone>(
	part: &str,
	sliced_formulas: impl Iterator<Item = &'a SlicedFormula>,
	by_alias: &BTreeMap<String, T>,
	set_alias: impl Fn(&mut T, String),
) -> Result<Vec<T>> {
	let mut result = Vec::new();
	let mut used_aliases: HashSet<String> = HashSet::new();
	for sliced in sliced_formulas {
		let top_pieces = match sliced.top_slice() {
			Some(slice) if slice.aliased_formulas.len() == 1 => &slice.aliased_formulas,
			_ => return_internal_error!("every top-level {} formula slice must consist of a single formula", part),
		};
		let Some(mut alias) = top_pieces.keys().next().cloned() else {
			return_internal_error!("empty top-level {} formula slice", part);
		};
		let mut formula = match by_alias.get(&alias) {
			Some(formula) => formula.clone(),
			None => return_internal_error!("top-level {} expression {} was not separated", part, alias),
		};

		let mut patch_idx = 0;
		let mut patched = false;
		while used_aliases.contains(&alias) {
			alias = format!("{alias}_cp{patch_idx}");
			patch_idx += 1;
			patched = true;
		}
		if patched {
			set_alias(&mut formula, alias.clone());
		}

		result.push(formula);
		used_aliases.insert(alias);
	}
	Ok(result)
}

/// State shared by all levels of one separation.
#[derive(Default)]
struct Separation {
	/// Query that first produced each SELECT alias
	avatar_id_by_column: HashMap<String, String>,
	remap_cache: HashMap<Node, BTreeSet<String>>,
}

impl Separation {
	/// Pieces of `sliced` at `level_idx` with remapped avatar ids, or `None` when the formula has
	/// no piece at this level. The flag is set when the level lies below the formula's own top
	/// level, in which case the pieces belong to SELECT.
	fn level_pieces(
		&mut self,
		level_idx: usize,
		sliced: &SlicedFormula,
		used_avatar_ids: &mut BTreeSet<String>,
	) -> Result<Option<(bool, Vec<(String, CompiledFormula)>)>> {
		let Some(slice) = sliced.slices.get(level_idx) else {
			return Ok(None);
		};
		let below_top = level_idx + 1 < sliced.level_count();

		let mut pieces = Vec::with_capacity(slice.aliased_formulas.len());
		for (alias, piece) in &slice.aliased_formulas {
			let piece = self.remap_avatar_ids(level_idx, piece)?;
			used_avatar_ids.extend(piece.avatar_ids.iter().cloned());
			pieces.push((alias.clone(), piece));
		}
		Ok(Some((below_top, pieces)))
	}

	fn remap_avatar_ids(&mut self, level_idx: usize, piece: &CompiledFormula) -> Result<CompiledFormula> {
		// level 0 reads avatars directly
		if level_idx == 0 {
			return Ok(piece.clone());
		}

		let avatar_ids = match self.remap_cache.get(&piece.expr) {
			Some(avatar_ids) => avatar_ids.clone(),
			None => {
				let mut avatar_ids = BTreeSet::new();
				for field in used_fields(&piece.expr) {
					let name = field.field_name().unwrap_or_default();
					match self.avatar_id_by_column.get(name) {
						Some(query_id) => {
							avatar_ids.insert(query_id.clone());
						}
						None => return_internal_error!("unreferenced alias {} in formula {}", name, piece.expr),
					}
				}
				self.remap_cache.insert(piece.expr.clone(), avatar_ids.clone());
				avatar_ids
			}
		};

		Ok(CompiledFormula {
			avatar_ids,
			..piece.clone()
		})
	}

	fn add_to_select(
		&mut self,
		select: &mut BTreeMap<String, CompiledFormula>,
		pieces: Vec<(String, CompiledFormula)>,
		query_id: &str,
	) {
		for (alias, piece) in pieces {
			self.avatar_id_by_column.entry(alias.clone()).or_insert_with(|| query_id.to_string());
			select.insert(alias, piece);
		}
	}
}
