// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{collections::BTreeSet, sync::Arc};

use lodestar_formula::{
	Node,
	build::{eq, field, func, string},
	node::SortDirection,
};
use lodestar_query::{
	BASE_QUERY_ID, CompiledFormula, ExecutionLevel, FormulaSlice, FromColumn, FromObject, JoinedFromObject,
	MultiQueryIndex, QuerySeparator, ReplacementPatch, SlicedFormula, SlicedOrderByFormula, SlicedQuery,
	apply_replacement_patches, copy_and_remap_query,
};

fn piece(expr: Node, alias: &str, avatar_ids: &[&str]) -> FormulaSlice {
	CompiledFormula::new(expr, alias).with_avatar_ids(avatar_ids.iter().copied()).into()
}

fn sales_sum() -> SlicedFormula {
	SlicedFormula::new(vec![
		piece(func("sum", vec![field("sales")]), "res_1_l0", &["a1"]),
		piece(field("res_1_l0"), "res_1", &[]),
	])
}

fn city() -> SlicedFormula {
	SlicedFormula::new(vec![piece(field("city"), "res_0_l0", &["a1"]), piece(field("res_0_l0"), "res_0", &[])])
}

/// Two levels: aggregation in the source database, the user-facing query in the compute engine.
fn make_sliced_query() -> SlicedQuery {
	let mut query = SlicedQuery::new(BASE_QUERY_ID, vec![ExecutionLevel::SourceDb, ExecutionLevel::Compeng]);
	query.select = vec![sales_sum(), city(), sales_sum()];
	query.group_by = vec![SlicedFormula::new(vec![
		piece(field("city"), "grp_0_l0", &["a1"]),
		piece(field("grp_0_l0"), "grp_0", &[]),
	])];
	query.order_by = vec![SlicedOrderByFormula {
		sliced: SlicedFormula::new(vec![
			piece(func("sum", vec![field("sales")]), "ord_0_l0", &["a1"]),
			piece(field("ord_0_l0"), "ord_0", &[]),
		]),
		direction: SortDirection::Desc,
	}];
	query.filters = vec![SlicedFormula::new(vec![piece(eq(field("city"), string("Paris")), "flt_0", &["a1"])])];
	query.joined_from = JoinedFromObject {
		root_from_id: Some("a1".to_string()),
		froms: vec![FromObject::avatar(
			"a1",
			"src",
			vec![FromColumn::new("city", "city"), FromColumn::new("sales", "sales")],
		)],
	};
	query.limit = Some(100);
	query.offset = Some(20);
	query.meta.row_count_hard_limit = Some(5000);
	query.meta.field_order = Some(vec![(0, "f_sales".to_string()), (1, "f_city".to_string())]);
	query
}

fn aliases(formulas: &[CompiledFormula]) -> Vec<&str> {
	formulas.iter().map(|formula| formula.alias.as_deref().unwrap_or_default()).collect()
}

#[test]
fn test_two_level_separation() {
	let result = QuerySeparator::default().separate_query(&make_sliced_query(), "0").unwrap();
	assert_eq!(result.level_count(), 2);

	let bottom = &result.levels[0].queries[0];
	assert_eq!(bottom.id, "qq_0_0_0");
	assert_eq!(bottom.level_type, ExecutionLevel::SourceDb);
	assert_eq!(aliases(&bottom.select), vec!["grp_0_l0", "ord_0_l0", "res_0_l0", "res_1_l0"]);
	assert!(bottom.group_by.is_empty());
	assert_eq!(aliases(&bottom.filters), vec!["flt_0"]);
	assert_eq!(bottom.joined_from.root_from_id.as_deref(), Some("a1"));
	assert_eq!((bottom.limit, bottom.offset), (None, None));
	assert_eq!(bottom.meta.row_count_hard_limit, Some(1_000_000));

	let top = &result.levels[1].queries[0];
	assert_eq!(top.id, "qq");
	assert_eq!(top.level_type, ExecutionLevel::Compeng);
	assert_eq!(aliases(&top.select), vec!["res_1", "res_0", "res_1_cp0"]);
	assert_eq!(aliases(&top.group_by), vec!["grp_0"]);
	assert_eq!(top.order_by.len(), 1);
	assert_eq!(top.order_by[0].formula.alias.as_deref(), Some("ord_0"));
	assert_eq!(top.order_by[0].direction, SortDirection::Desc);
	assert!(top.filters.is_empty());
	assert_eq!((top.limit, top.offset), (Some(100), Some(20)));
	assert_eq!(top.meta.row_count_hard_limit, Some(5000));
	assert_eq!(top.meta.field_order.as_ref().map(Vec::len), Some(2));

	for formula in top.all_formulas() {
		assert_eq!(formula.avatar_ids, BTreeSet::from(["qq_0_0_0".to_string()]));
	}

	let from = top.joined_from.get("qq_0_0_0").unwrap();
	assert_eq!(top.joined_from.root_from_id.as_deref(), Some("qq_0_0_0"));
	assert_eq!(from.subquery_id(), Some("qq_0_0_0"));
	let columns: Vec<&str> = from.columns.iter().map(|column| column.id.as_str()).collect();
	assert_eq!(columns, aliases(&bottom.select));
}

#[test]
fn test_flattened_dag() {
	let result = QuerySeparator::default().separate_query(&make_sliced_query(), "0").unwrap();
	let multi_query = result.flatten().unwrap();

	assert_eq!(multi_query.len(), 2);
	assert_eq!(multi_query.single_top_query().unwrap().id, "qq");
	let bottom: Vec<&str> = multi_query.bottom_queries().iter().map(|query| query.id.as_str()).collect();
	assert_eq!(bottom, vec!["qq_0_0_0"]);
	assert_eq!(multi_query.base_froms().keys().copied().collect::<Vec<_>>(), vec!["a1"]);
	assert_eq!(multi_query.for_level_type(ExecutionLevel::Compeng).len(), 1);
}

#[test]
fn test_separation_is_deterministic() {
	let separator = QuerySeparator::default();
	let first = separator.separate_query(&make_sliced_query(), "7").unwrap();
	let second = separator.separate_query(&make_sliced_query(), "7").unwrap();

	assert_eq!(first, second);
	assert_eq!(first.levels[0].queries[0].id, "qq_7_0_0");
}

#[test]
fn test_replace_bottom_query_with_remapped_copy() {
	let result = Arc::new(QuerySeparator::default().separate_query(&make_sliced_query(), "0").unwrap());
	let bottom = &result.levels[0].queries[0];

	let (copy, mapping) =
		copy_and_remap_query(bottom, "qq_0_0_0", &Default::default(), &Default::default()).unwrap();
	assert_eq!(mapping.len(), bottom.select.len() + bottom.filters.len());

	let index = MultiQueryIndex::new(0, 0);
	let unchanged = apply_replacement_patches(&result, &[ReplacementPatch {
		index,
		new_subquery: Arc::clone(bottom),
	}])
	.unwrap();
	assert!(Arc::ptr_eq(&unchanged, &result));

	let replaced = apply_replacement_patches(&result, &[ReplacementPatch {
		index,
		new_subquery: Arc::new(copy),
	}])
	.unwrap();
	assert!(!Arc::ptr_eq(&replaced, &result));
	assert_eq!(aliases(&replaced.levels[0].queries[0].select), vec![
		"qq_0_0_0_0",
		"qq_0_0_0_1",
		"qq_0_0_0_2",
		"qq_0_0_0_3"
	]);
}
