// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use lodestar::{
	Compiler, CompilerConfig, TracingBuilder,
	formula::{
		Node, NodeKind,
		build::{add, and, binary, eq, field, func, int, not, or, string, window_within},
		node::BinaryOp,
	},
	legend::{BlockPlacement, FieldInfo, QueryType, raw::RawQuerySpec},
	query::{
		CompiledFormula, ExecutionLevel, FormulaSlice, FromColumn, FromObject, JoinedFromObject, SlicedFormula,
		SlicedQuery,
	},
};

fn make_dims() -> Vec<Node> {
	vec![field("Category"), field("Region")]
}

fn make_fields() -> Vec<FieldInfo> {
	serde_json::from_str(
		r#"[
			{"id": "region", "title": "Region", "data_type": "string", "field_type": "dimension"},
			{"id": "category", "title": "Category", "data_type": "string", "field_type": "dimension"},
			{"id": "sales", "title": "Sales", "data_type": "float", "field_type": "measure"}
		]"#,
	)
	.unwrap()
}

fn piece(expr: Node, alias: &str, avatar_ids: &[&str]) -> FormulaSlice {
	CompiledFormula::new(expr, alias).with_avatar_ids(avatar_ids.iter().copied()).into()
}

fn make_sliced_query() -> SlicedQuery {
	let mut query = SlicedQuery::new("qq", vec![ExecutionLevel::SourceDb, ExecutionLevel::Compeng]);
	query.select = vec![
		SlicedFormula::new(vec![
			piece(func("sum", vec![field("sales")]), "res_1_l0", &["a1"]),
			piece(field("res_1_l0"), "res_1", &[]),
		]),
		SlicedFormula::new(vec![piece(field("region"), "res_0_l0", &["a1"]), piece(field("res_0_l0"), "res_0", &[])]),
	];
	query.joined_from = JoinedFromObject {
		root_from_id: Some("a1".to_string()),
		froms: vec![FromObject::avatar("a1", "src", vec![FromColumn::new("region", "region")])],
	};
	query
}

#[test]
fn test_window_and_inconsistent_aggregation() {
	TracingBuilder::new().try_init();
	let compiler = Compiler::default();
	let dims = make_dims();

	let rank = window_within("rank", vec![func("sum", vec![field("Sales")])], vec![field("Region")]);
	assert!(compiler.compile_formula(&rank, &dims).is_ok());

	let mixed = add(func("sum", vec![field("Sales")]), field("Region"));
	let err = compiler.compile_formula(&mixed, &dims).unwrap_err();
	assert_eq!(err.code, "AGGREGATION_002");
}

#[test]
fn test_lookup_is_lowered_to_fork() {
	let compiler = Compiler::default();
	let dims = vec![field("Date"), field("Region")];

	let ago = func("ago", vec![func("sum", vec![field("Sales")]), field("Date"), string("month")]);
	let lowered = compiler.compile_formula(&ago, &dims).unwrap();

	let NodeKind::QueryFork(fork) = lowered.kind() else {
		panic!("expected a query fork, got {}", lowered);
	};
	assert_eq!(fork.joining.len(), 3);
}

#[test]
fn test_error_reporting_modes() {
	let dims = make_dims();
	let tree = add(func("ago", vec![func("sum", vec![field("Sales")])]), func("at_date", vec![field("Sales")]));

	let err = Compiler::default().lower_formula(&tree, &dims).unwrap_err();
	assert_eq!(err.code, "LOOKUP_001");

	let collecting = Compiler::new(CompilerConfig::builder().collect_errors(true).build());
	let err = collecting.lower_formula(&tree, &dims).unwrap_err();
	assert_eq!(err.code, "VALIDATION_001");
	assert_eq!(err.diagnostics().len(), 2);
}

#[test]
fn test_formalize_request() {
	let request: RawQuerySpec = serde_json::from_str(
		r#"{
			"select": [
				{"ref": {"type": "id", "id": "region"}},
				{"ref": {"type": "title", "title": "Sales"}, "role_spec": {"role": "measure"}}
			],
			"limit": 10
		}"#,
	)
	.unwrap();

	let formalized = Compiler::default().formalize_request(&request, &make_fields()).unwrap();

	assert_eq!(formalized.legend.len(), 2);
	assert_eq!(formalized.block_legend.blocks.len(), 1);
	let root = &formalized.block_legend.blocks[0];
	assert_eq!(root.placement, BlockPlacement::Root);
	assert_eq!(root.query_type, QueryType::Result);
	assert_eq!(root.legend_item_ids, vec![0, 1]);
	assert!(formalized.notifications.is_empty());
}

#[test]
fn test_compile_multi_query_with_configured_cap() {
	let config: CompilerConfig = serde_json::from_str(r#"{"source_row_limit": 10}"#).unwrap();
	assert!(config.lookup_registry.contains("ago"));
	let compiler = Compiler::new(config);

	let multi_query = compiler.compile_multi_query(&make_sliced_query(), "0").unwrap();

	assert_eq!(multi_query.len(), 2);
	let top = multi_query.single_top_query().unwrap();
	let aliases: Vec<_> = top.select.iter().map(|formula| formula.alias.clone().unwrap()).collect();
	assert_eq!(aliases, vec!["res_1", "res_0"]);

	let bottom = multi_query.query("qq_0_0_0").unwrap();
	assert_eq!(bottom.meta.row_count_hard_limit, Some(10));
	assert_eq!(multi_query.base_root_from_ids().into_iter().collect::<Vec<_>>(), vec!["a1"]);
}

#[test]
fn test_filter_conditions_are_simplified() {
	let compiler = Compiler::default();
	let dims = make_dims();

	let condition = eq(binary(BinaryOp::GreaterThan, field("Sales"), int(10)), int(0));
	let lowered = compiler.lower_filter(&condition, &dims).unwrap();
	assert_eq!(lowered, binary(BinaryOp::LessThanEqual, field("Sales"), int(10)));

	let either = or(eq(field("Region"), string("EU")), eq(field("Region"), string("US")));
	let condition = binary(BinaryOp::NotEqual, and(either.clone(), int(1)), int(1));
	assert_eq!(compiler.lower_filter(&condition, &dims).unwrap(), not(either));
}
