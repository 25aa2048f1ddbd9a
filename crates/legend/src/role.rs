// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::{Display, Formatter};

use lodestar_formula::node::SortDirection;
use serde::{Deserialize, Serialize};

use crate::LegendItemId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRole {
	Row,
	/// Pivot table column
	Column,
	Measure,
	Filter,
	OrderBy,
	Info,
	Template,
	Tree,
	Total,
	Range,
	Distinct,
	Parameter,
}

impl FieldRole {
	/// Roles that produce an output column.
	pub fn is_streamable(&self) -> bool {
		matches!(
			self,
			FieldRole::Row
				| FieldRole::Column
				| FieldRole::Measure
				| FieldRole::Template
				| FieldRole::Tree
				| FieldRole::Total
				| FieldRole::Info
		)
	}

	/// Roles whose fields end up in the SELECT list.
	pub fn is_selectable(&self) -> bool {
		self.is_streamable() || matches!(self, FieldRole::Range | FieldRole::Distinct)
	}

	fn as_str(&self) -> &'static str {
		match self {
			FieldRole::Row => "row",
			FieldRole::Column => "column",
			FieldRole::Measure => "measure",
			FieldRole::Filter => "filter",
			FieldRole::OrderBy => "order_by",
			FieldRole::Info => "info",
			FieldRole::Template => "template",
			FieldRole::Tree => "tree",
			FieldRole::Total => "total",
			FieldRole::Range => "range",
			FieldRole::Distinct => "distinct",
			FieldRole::Parameter => "parameter",
		}
	}
}

impl Display for FieldRole {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
	Dimension,
	Measure,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
	#[default]
	Result,
	Totals,
	Pivot,
	Distinct,
	Range,
}

impl QueryType {
	pub fn supported_roles(&self) -> &'static [FieldRole] {
		use FieldRole::*;
		match self {
			QueryType::Result | QueryType::Totals => {
				&[OrderBy, Filter, Parameter, Info, Row, Total, Template, Tree, Measure]
			}
			QueryType::Pivot => &[OrderBy, Filter, Parameter, Info, Row, Column, Measure, Template, Total],
			QueryType::Distinct => &[OrderBy, Filter, Parameter, Info, Distinct],
			QueryType::Range => &[Filter, Parameter, Info, Range],
		}
	}

	pub fn supports_role(&self, role: FieldRole) -> bool {
		self.supported_roles().contains(&role)
	}

	pub fn supports_measure_name(&self) -> bool {
		matches!(self, QueryType::Pivot)
	}

	pub fn supports_measure_filters(&self) -> bool {
		!matches!(self, QueryType::Distinct | QueryType::Range)
	}
}

impl Display for QueryType {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			QueryType::Result => f.write_str("result"),
			QueryType::Totals => f.write_str("totals"),
			QueryType::Pivot => f.write_str("pivot"),
			QueryType::Distinct => f.write_str("distinct"),
			QueryType::Range => f.write_str("range"),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FilterOperation {
	Eq,
	Ne,
	Gt,
	Gte,
	Lt,
	Lte,
	In,
	Nin,
	IsNull,
	IsNotNull,
	StartsWith,
	Contains,
	Between,
	/// Length of a tree path is less than or equal to the value
	LenLte,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeType {
	Min,
	Max,
}

/// Fixed value of a dimension for rows of a subordinate block.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DimensionValueSpec {
	pub legend_item_id: LegendItemId,
	pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RoleSpec {
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
		prefix: Vec<String>,
		dimension_values: Vec<DimensionValueSpec>,
	},
	Filter {
		operation: FilterOperation,
		values: Vec<String>,
	},
	OrderBy {
		direction: SortDirection,
	},
	Range {
		range_type: RangeType,
	},
	Parameter {
		value: String,
	},
}

impl RoleSpec {
	pub fn role(&self) -> FieldRole {
		match self {
			RoleSpec::Row => FieldRole::Row,
			RoleSpec::Column => FieldRole::Column,
			RoleSpec::Measure => FieldRole::Measure,
			RoleSpec::Info => FieldRole::Info,
			RoleSpec::Total => FieldRole::Total,
			RoleSpec::Distinct => FieldRole::Distinct,
			RoleSpec::Template {
				..
			} => FieldRole::Template,
			RoleSpec::Tree {
				..
			} => FieldRole::Tree,
			RoleSpec::Filter {
				..
			} => FieldRole::Filter,
			RoleSpec::OrderBy {
				..
			} => FieldRole::OrderBy,
			RoleSpec::Range {
				..
			} => FieldRole::Range,
			RoleSpec::Parameter {
				..
			} => FieldRole::Parameter,
		}
	}
}
