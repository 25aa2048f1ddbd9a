// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Helpers for re-instantiating and inspecting compiled queries.

use std::collections::{BTreeSet, HashMap};

use indexmap::IndexMap;
use lodestar_formula::{Mutation, Node, NodeKind, apply_mutation, build::int, inspect::used_fields};
use lodestar_type::{Result, return_internal_error};
use tracing::{instrument, trace};

use crate::{
	multi_query::CompiledLevel,
	primitives::{CompiledFormula, CompiledQuery, FromColumn, FromObject, FromSource, JoinedFromObject},
};

/// Hands out `{base}_{n}` aliases, one per distinct old alias.
#[derive(Debug, Clone)]
pub struct AliasRemapper {
	base: String,
	mapping: IndexMap<String, String>,
	counter: usize,
}

impl AliasRemapper {
	pub fn new(base: impl Into<String>) -> Self {
		Self {
			base: base.into(),
			mapping: IndexMap::new(),
			counter: 0,
		}
	}

	pub fn remap(&mut self, old_alias: &str) -> String {
		if let Some(alias) = self.mapping.get(old_alias) {
			return alias.clone();
		}
		let alias = format!("{}_{}", self.base, self.counter);
		self.counter += 1;
		self.mapping.insert(old_alias.to_string(), alias.clone());
		alias
	}

	pub fn into_mapping(self) -> IndexMap<String, String> {
		self.mapping
	}
}

/// Renames field references according to a name map.
pub struct FieldRenameMutation<'a> {
	field_name_map: &'a HashMap<String, String>,
}

impl<'a> FieldRenameMutation<'a> {
	pub fn new(field_name_map: &'a HashMap<String, String>) -> Self {
		Self {
			field_name_map,
		}
	}
}

impl Mutation for FieldRenameMutation<'_> {
	fn name(&self) -> &'static str {
		"field_rename"
	}

	fn match_node(&self, node: &Node, _parent_stack: &[Node]) -> bool {
		node.field_name().is_some_and(|name| self.field_name_map.contains_key(name))
	}

	fn make_replacement(&self, old: &Node, _parent_stack: &[Node]) -> Node {
		match old.field_name().and_then(|name| self.field_name_map.get(name)) {
			Some(new_name) => old.replace_kind(NodeKind::Field {
				name: new_name.clone(),
			}),
			None => old.clone(),
		}
	}
}

struct QueryRemap<'a> {
	aliases: AliasRemapper,
	field_name_map: &'a HashMap<String, String>,
	avatar_map: &'a HashMap<String, String>,
}

impl QueryRemap<'_> {
	fn avatar_id(&self, id: &str) -> String {
		self.avatar_map.get(id).cloned().unwrap_or_else(|| id.to_string())
	}

	fn formula(&mut self, formula: &CompiledFormula, with_alias: bool) -> Result<CompiledFormula> {
		let alias = if with_alias {
			match &formula.alias {
				Some(alias) => Some(self.aliases.remap(alias)),
				None => return_internal_error!("formula {} has no alias to remap", formula.expr),
			}
		} else {
			None
		};
		let expr = if self.field_name_map.is_empty() {
			formula.expr.clone()
		} else {
			apply_mutation(&formula.expr, &FieldRenameMutation::new(self.field_name_map))
		};
		Ok(CompiledFormula {
			expr,
			alias,
			avatar_ids: formula.avatar_ids.iter().map(|id| self.avatar_id(id)).collect(),
			original_field_id: formula.original_field_id.clone(),
		})
	}

	fn formulas(&mut self, formulas: &[CompiledFormula]) -> Result<Vec<CompiledFormula>> {
		formulas.iter().map(|formula| self.formula(formula, true)).collect()
	}

	fn joined_from(&self, joined_from: &JoinedFromObject) -> Result<JoinedFromObject> {
		let reverse_avatar_map: HashMap<&str, &str> =
			self.avatar_map.iter().map(|(old, new)| (new.as_str(), old.as_str())).collect();
		let new_ids: BTreeSet<String> = joined_from.iter_ids().map(|id| self.avatar_id(id)).collect();

		let mut froms = Vec::with_capacity(new_ids.len());
		for new_id in new_ids {
			let old_id = reverse_avatar_map.get(new_id.as_str()).copied().unwrap_or(new_id.as_str());
			let Some(old_from) = joined_from.get(old_id) else {
				return_internal_error!("from object {} is missing", old_id);
			};
			if new_id == old_id {
				froms.push(old_from.clone());
				continue;
			}
			if !matches!(old_from.source, FromSource::Subquery { .. }) {
				return_internal_error!("avatar from {} must not be remapped", old_id);
			}

			let mut columns = Vec::with_capacity(old_from.columns.len());
			for column in &old_from.columns {
				if column.id != column.name {
					return_internal_error!("sub-query column {} is named {}", column.id, column.name);
				}
				match self.field_name_map.get(&column.id) {
					Some(new_column_id) => columns.push(FromColumn::new(new_column_id.clone(), new_column_id.clone())),
					None => return_internal_error!("unreferenced alias {} in from {}", column.id, old_id),
				}
			}
			froms.push(FromObject::subquery(new_id, columns));
		}

		Ok(JoinedFromObject {
			root_from_id: joined_from.root_from_id.as_deref().map(|id| self.avatar_id(id)),
			froms,
		})
	}
}

/// Copies `query` under a new id with fresh aliases, renaming fields and avatars in every clause
/// and in the FROM graph. Returns the copy and the old to new alias mapping.
#[instrument(name = "query::tools::copy_and_remap_query", level = "trace", skip_all, fields(from = %query.id, to = id))]
pub fn copy_and_remap_query(
	query: &CompiledQuery,
	id: &str,
	field_name_map: &HashMap<String, String>,
	avatar_map: &HashMap<String, String>,
) -> Result<(CompiledQuery, IndexMap<String, String>)> {
	let mut remap = QueryRemap {
		aliases: AliasRemapper::new(id),
		field_name_map,
		avatar_map,
	};

	let select = remap.formulas(&query.select)?;
	let group_by = remap.formulas(&query.group_by)?;
	let mut order_by = Vec::with_capacity(query.order_by.len());
	for item in &query.order_by {
		let mut item = item.clone();
		item.formula = remap.formula(&item.formula, true)?;
		order_by.push(item);
	}
	let filters = remap.formulas(&query.filters)?;
	// join conditions are the only formulas without aliases
	let mut join_on = Vec::with_capacity(query.join_on.len());
	for item in &query.join_on {
		let mut item = item.clone();
		item.formula = remap.formula(&item.formula, false)?;
		item.left_id = remap.avatar_id(&item.left_id);
		item.right_id = remap.avatar_id(&item.right_id);
		join_on.push(item);
	}
	let joined_from = remap.joined_from(&query.joined_from)?;

	let mapping = remap.aliases.into_mapping();
	trace!(aliases = mapping.len(), "remapped query");

	Ok((
		CompiledQuery {
			id: id.to_string(),
			select,
			group_by,
			order_by,
			filters,
			join_on,
			joined_from,
			..query.clone()
		},
		mapping,
	))
}

/// Explicit GROUP BY, or SELECT when the query does not group.
pub fn query_dimension_list(query: &CompiledQuery) -> &[CompiledFormula] {
	if query.group_by.is_empty() {
		&query.select
	} else {
		&query.group_by
	}
}

pub fn query_dimension_aliases(query: &CompiledQuery) -> Result<Vec<String>> {
	let mut aliases = Vec::new();
	for formula in query_dimension_list(query) {
		match &formula.alias {
			Some(alias) => aliases.push(alias.clone()),
			None => return_internal_error!("dimension {} of query {} has no alias", formula.expr, query.id),
		}
	}
	Ok(aliases)
}

/// Names of all fields referenced anywhere on a level.
pub fn level_used_fields(level: &CompiledLevel) -> BTreeSet<String> {
	level.queries
		.iter()
		.flat_map(|query| query.all_formulas())
		.flat_map(|formula| used_fields(&formula.expr))
		.filter_map(|field| field.field_name().map(str::to_string))
		.collect()
}

/// Appends a constant `1` column to SELECT and GROUP BY, so that queries without dimensions
/// can still be joined.
pub fn add_dummy_select_column(query: &CompiledQuery, alias: &str) -> CompiledQuery {
	let dummy = CompiledFormula {
		expr: int(1),
		alias: Some(alias.to_string()),
		avatar_ids: BTreeSet::new(),
		original_field_id: None,
	};
	let mut result = query.clone();
	result.select.push(dummy.clone());
	result.group_by.push(dummy);
	result
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use lodestar_formula::{
		build::{eq, field, func},
		node::{JoinType, SortDirection},
	};

	use super::*;
	use crate::primitives::{CompiledJoinOn, CompiledOrderBy, ExecutionLevel};

	fn make_map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
		pairs.iter().map(|(old, new)| (old.to_string(), new.to_string())).collect()
	}

	fn make_lod_query() -> CompiledQuery {
		let mut query = CompiledQuery::new("q_lod", ExecutionLevel::Compeng);
		query.select = vec![
			CompiledFormula::new(field("sub_0"), "res_0").with_avatar_ids(["q_sub"]),
			CompiledFormula::new(func("sum", vec![field("sub_1")]), "res_1").with_avatar_ids(["q_sub"]),
		];
		query.group_by = vec![CompiledFormula::new(field("sub_0"), "res_0").with_avatar_ids(["q_sub"])];
		query.order_by = vec![CompiledOrderBy {
			formula: CompiledFormula::new(field("sub_1"), "ord_0").with_avatar_ids(["q_sub"]),
			direction: SortDirection::Desc,
		}];
		query.join_on = vec![CompiledJoinOn {
			formula: CompiledFormula {
				alias: None,
				..CompiledFormula::new(eq(field("sub_0"), field("x")), "")
			}
			.with_avatar_ids(["q_sub", "a1"]),
			left_id: "q_sub".to_string(),
			right_id: "a1".to_string(),
			join_type: JoinType::Left,
		}];
		query.joined_from = JoinedFromObject {
			root_from_id: Some("q_sub".to_string()),
			froms: vec![
				FromObject::subquery("q_sub", vec![FromColumn::new("sub_0", "sub_0"), FromColumn::new("sub_1", "sub_1")]),
				FromObject::avatar("a1", "src", vec![FromColumn::new("x", "x")]),
			],
		};
		query
	}

	#[test]
	fn test_alias_remapper() {
		let mut remapper = AliasRemapper::new("q2");

		assert_eq!(remapper.remap("a"), "q2_0");
		assert_eq!(remapper.remap("b"), "q2_1");
		assert_eq!(remapper.remap("a"), "q2_0");
		assert_eq!(remapper.into_mapping().len(), 2);
	}

	#[test]
	fn test_copy_and_remap_query() {
		let query = make_lod_query();
		let field_name_map = make_map(&[("sub_0", "sub2_0"), ("sub_1", "sub2_1")]);
		let avatar_map = make_map(&[("q_sub", "q_sub2")]);

		let (copy, mapping) = copy_and_remap_query(&query, "q_lod2", &field_name_map, &avatar_map).unwrap();

		assert_eq!(copy.id, "q_lod2");
		assert_eq!(copy.level_type, ExecutionLevel::Compeng);
		let aliases: Vec<_> = copy.select.iter().map(|formula| formula.alias.clone().unwrap()).collect();
		assert_eq!(aliases, vec!["q_lod2_0", "q_lod2_1"]);
		assert_eq!(copy.group_by[0].alias.as_deref(), Some("q_lod2_0"));
		assert_eq!(copy.order_by[0].formula.alias.as_deref(), Some("q_lod2_2"));
		assert_eq!(copy.order_by[0].direction, SortDirection::Desc);

		assert_eq!(copy.select[1].expr, func("sum", vec![field("sub2_1")]));
		assert_eq!(copy.select[0].avatar_ids, BTreeSet::from(["q_sub2".to_string()]));

		assert_eq!(copy.join_on[0].formula.alias, None);
		assert_eq!(copy.join_on[0].formula.expr, eq(field("sub2_0"), field("x")));
		assert_eq!(copy.join_on[0].left_id, "q_sub2");
		assert_eq!(copy.join_on[0].right_id, "a1");

		assert_eq!(copy.joined_from.root_from_id.as_deref(), Some("q_sub2"));
		assert_eq!(copy.joined_from.iter_ids().collect::<Vec<_>>(), vec!["a1", "q_sub2"]);
		let sub = copy.joined_from.get("q_sub2").unwrap();
		assert_eq!(sub.subquery_id(), Some("q_sub2"));
		assert_eq!(sub.columns, vec![FromColumn::new("sub2_0", "sub2_0"), FromColumn::new("sub2_1", "sub2_1")]);
		assert_eq!(copy.joined_from.get("a1"), query.joined_from.get("a1"));

		assert_eq!(mapping.get("res_0").map(String::as_str), Some("q_lod2_0"));
		assert_eq!(mapping.get("ord_0").map(String::as_str), Some("q_lod2_2"));
	}

	#[test]
	fn test_copy_without_renames_keeps_expressions() {
		let query = make_lod_query();

		let (copy, _) = copy_and_remap_query(&query, "q3", &HashMap::new(), &HashMap::new()).unwrap();

		assert!(Node::ptr_eq(&copy.select[1].expr, &query.select[1].expr));
		assert_eq!(copy.joined_from, query.joined_from);
	}

	#[test]
	fn test_avatar_from_must_not_be_remapped() {
		let query = make_lod_query();
		let avatar_map = make_map(&[("a1", "a2")]);

		let err = copy_and_remap_query(&query, "q3", &HashMap::new(), &avatar_map).unwrap_err();
		assert_eq!(err.code, "INTERNAL_ERROR");
		assert!(err.message.contains("avatar from a1"));
	}

	#[test]
	fn test_missing_column_mapping() {
		let query = make_lod_query();
		let field_name_map = make_map(&[("sub_0", "sub2_0")]);
		let avatar_map = make_map(&[("q_sub", "q_sub2")]);

		let err = copy_and_remap_query(&query, "q3", &field_name_map, &avatar_map).unwrap_err();
		assert!(err.message.contains("unreferenced alias sub_1"));
	}

	#[test]
	fn test_dimension_aliases() {
		let mut query = make_lod_query();
		assert_eq!(query_dimension_aliases(&query).unwrap(), vec!["res_0"]);

		query.group_by.clear();
		assert_eq!(query_dimension_aliases(&query).unwrap(), vec!["res_0", "res_1"]);
	}

	#[test]
	fn test_level_used_fields() {
		let level = CompiledLevel {
			level_type: ExecutionLevel::Compeng,
			queries: vec![Arc::new(make_lod_query())],
		};

		let fields: Vec<String> = level_used_fields(&level).into_iter().collect();
		assert_eq!(fields, vec!["sub_0", "sub_1", "x"]);
	}

	#[test]
	fn test_add_dummy_select_column() {
		let query = make_lod_query();

		let result = add_dummy_select_column(&query, "dummy");

		assert_eq!(result.select.len(), 3);
		assert_eq!(result.group_by.len(), 2);
		assert_eq!(result.select[2].expr, int(1));
		assert_eq!(result.group_by[1].alias.as_deref(), Some("dummy"));
		assert_eq!(query.select.len(), 2);
	}
}
