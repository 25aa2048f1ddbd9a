// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Data request as sent by a client, before formalization.

use std::collections::BTreeSet;

use lodestar_formula::node::SortDirection;
use serde::Deserialize;

use crate::{BlockId, DimensionValueSpec, FilterOperation, LegendItemId, QueryType, RangeType};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldRef {
	Id {
		id: String,
	},
	Title {
		title: String,
	},
	MeasureName,
	DimensionName,
	Placeholder,
}

impl std::fmt::Display for FieldRef {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			FieldRef::Id {
				id,
			} => write!(f, "id={}", id),
			FieldRef::Title {
				title,
			} => write!(f, "title={}", title),
			FieldRef::MeasureName => f.write_str("measure_name"),
			FieldRef::DimensionName => f.write_str("dimension_name"),
			FieldRef::Placeholder => f.write_str("placeholder"),
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum RawRoleSpec {
	#[default]
	Row,
	Column,
	Measure,
	Info,
	Total,
	Distinct,
	Template {
		template: String,
	},
	Tree {
		level: u32,
		/// JSON encoded list of path components
		#[serde(default = "empty_prefix")]
		prefix: String,
		#[serde(default)]
		dimension_values: Vec<DimensionValueSpec>,
	},
	Range {
		range_type: RangeType,
	},
}

fn empty_prefix() -> String {
	"[]".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawSelectFieldSpec {
	#[serde(default)]
	pub legend_item_id: Option<LegendItemId>,
	#[serde(rename = "ref")]
	pub field_ref: FieldRef,
	#[serde(default)]
	pub block_id: Option<BlockId>,
	#[serde(default)]
	pub role_spec: RawRoleSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawGroupByFieldSpec {
	#[serde(default)]
	pub legend_item_id: Option<LegendItemId>,
	#[serde(rename = "ref")]
	pub field_ref: FieldRef,
	#[serde(default)]
	pub block_id: Option<BlockId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawOrderByFieldSpec {
	#[serde(default)]
	pub legend_item_id: Option<LegendItemId>,
	#[serde(rename = "ref")]
	pub field_ref: FieldRef,
	#[serde(default)]
	pub block_id: Option<BlockId>,
	#[serde(default)]
	pub direction: SortDirection,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawFilterFieldSpec {
	#[serde(default)]
	pub legend_item_id: Option<LegendItemId>,
	#[serde(rename = "ref")]
	pub field_ref: FieldRef,
	#[serde(default)]
	pub block_id: Option<BlockId>,
	pub operation: FilterOperation,
	#[serde(default)]
	pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawParameterValueSpec {
	#[serde(default)]
	pub legend_item_id: Option<LegendItemId>,
	#[serde(rename = "ref")]
	pub field_ref: FieldRef,
	#[serde(default)]
	pub block_id: Option<BlockId>,
	pub value: String,
}

/// Borrowed view over any kind of item spec, in request order.
#[derive(Debug, Clone, Copy)]
pub enum RawItemSpec<'a> {
	Select(&'a RawSelectFieldSpec),
	GroupBy(&'a RawGroupByFieldSpec),
	OrderBy(&'a RawOrderByFieldSpec),
	Filter(&'a RawFilterFieldSpec),
	Parameter(&'a RawParameterValueSpec),
}

impl RawItemSpec<'_> {
	pub fn legend_item_id(&self) -> Option<LegendItemId> {
		match self {
			RawItemSpec::Select(spec) => spec.legend_item_id,
			RawItemSpec::GroupBy(spec) => spec.legend_item_id,
			RawItemSpec::OrderBy(spec) => spec.legend_item_id,
			RawItemSpec::Filter(spec) => spec.legend_item_id,
			RawItemSpec::Parameter(spec) => spec.legend_item_id,
		}
	}

	pub fn field_ref(&self) -> &FieldRef {
		match self {
			RawItemSpec::Select(spec) => &spec.field_ref,
			RawItemSpec::GroupBy(spec) => &spec.field_ref,
			RawItemSpec::OrderBy(spec) => &spec.field_ref,
			RawItemSpec::Filter(spec) => &spec.field_ref,
			RawItemSpec::Parameter(spec) => &spec.field_ref,
		}
	}

	pub fn block_id(&self) -> Option<BlockId> {
		match self {
			RawItemSpec::Select(spec) => spec.block_id,
			RawItemSpec::GroupBy(spec) => spec.block_id,
			RawItemSpec::OrderBy(spec) => spec.block_id,
			RawItemSpec::Filter(spec) => spec.block_id,
			RawItemSpec::Parameter(spec) => spec.block_id,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RawBlockPlacement {
	Root,
	After {
		#[serde(default)]
		dimension_values: Option<Vec<DimensionValueSpec>>,
	},
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawBlockSpec {
	pub block_id: BlockId,
	#[serde(default)]
	pub parent_block_id: Option<BlockId>,
	pub placement: RawBlockPlacement,
	#[serde(default)]
	pub limit: Option<u64>,
	#[serde(default)]
	pub offset: Option<u64>,
	#[serde(default)]
	pub row_count_hard_limit: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawQueryMeta {
	#[serde(default)]
	pub query_type: QueryType,
	#[serde(default)]
	pub row_count_hard_limit: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawQuerySpec {
	#[serde(default)]
	pub select: Vec<RawSelectFieldSpec>,
	#[serde(default)]
	pub group_by: Vec<RawGroupByFieldSpec>,
	#[serde(default)]
	pub order_by: Vec<RawOrderByFieldSpec>,
	#[serde(default)]
	pub filters: Vec<RawFilterFieldSpec>,
	#[serde(default)]
	pub parameters: Vec<RawParameterValueSpec>,
	#[serde(default)]
	pub blocks: Vec<RawBlockSpec>,
	#[serde(default)]
	pub limit: Option<u64>,
	#[serde(default)]
	pub offset: Option<u64>,
	#[serde(default)]
	pub meta: RawQueryMeta,
	#[serde(default)]
	pub ignore_nonexistent_filters: bool,
}

impl RawQuerySpec {
	pub fn iter_item_specs(&self) -> impl Iterator<Item = RawItemSpec<'_>> {
		self.select
			.iter()
			.map(RawItemSpec::Select)
			.chain(self.group_by.iter().map(RawItemSpec::GroupBy))
			.chain(self.order_by.iter().map(RawItemSpec::OrderBy))
			.chain(self.filters.iter().map(RawItemSpec::Filter))
			.chain(self.parameters.iter().map(RawItemSpec::Parameter))
	}

	/// Block ids of explicit block specs and of every item spec.
	pub fn unique_block_ids(&self) -> BTreeSet<BlockId> {
		self.blocks
			.iter()
			.map(|block| block.block_id)
			.chain(self.iter_item_specs().filter_map(|spec| spec.block_id()))
			.collect()
	}
}
