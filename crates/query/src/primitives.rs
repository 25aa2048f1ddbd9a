// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Dialect-agnostic compiled queries. Every clause is expressed with formula trees; rendering
//! them into SQL happens downstream.

use std::{
	collections::BTreeSet,
	fmt::{Display, Formatter},
};

use lodestar_formula::{
	Node,
	node::{JoinType, SortDirection},
};
use lodestar_legend::{EmptyQueryMode, QueryType};
use serde::{Deserialize, Serialize};

/// Id of the user-facing query of a request.
pub const BASE_QUERY_ID: &str = "qq";

/// Where a query is executed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionLevel {
	/// In the source database
	#[default]
	SourceDb,
	/// In the compute engine, on top of source results
	Compeng,
}

impl Display for ExecutionLevel {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			ExecutionLevel::SourceDb => f.write_str("source_db"),
			ExecutionLevel::Compeng => f.write_str("compeng"),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryPart {
	Select,
	GroupBy,
	OrderBy,
	Filters,
	JoinOn,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledFormula {
	pub expr: Node,
	pub alias: Option<String>,
	/// Avatars (or sub-queries) the expression reads from
	pub avatar_ids: BTreeSet<String>,
	pub original_field_id: Option<String>,
}

impl CompiledFormula {
	pub fn new(expr: Node, alias: impl Into<String>) -> Self {
		Self {
			expr,
			alias: Some(alias.into()),
			avatar_ids: BTreeSet::new(),
			original_field_id: None,
		}
	}

	pub fn with_avatar_ids<I, S>(mut self, avatar_ids: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.avatar_ids = avatar_ids.into_iter().map(Into::into).collect();
		self
	}

	pub fn with_original_field_id(mut self, field_id: impl Into<String>) -> Self {
		self.original_field_id = Some(field_id.into());
		self
	}
}

impl Display for CompiledFormula {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match &self.alias {
			Some(alias) => write!(f, "{} AS {}", self.expr, alias),
			None => write!(f, "{}", self.expr),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledOrderBy {
	pub formula: CompiledFormula,
	pub direction: SortDirection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledJoinOn {
	pub formula: CompiledFormula,
	/// Left side of the join; the root from for relations managed by features
	pub left_id: String,
	pub right_id: String,
	pub join_type: JoinType,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FromColumn {
	pub id: String,
	pub name: String,
}

impl FromColumn {
	pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			name: name.into(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FromSource {
	Avatar {
		avatar_id: String,
		source_id: String,
	},
	Subquery {
		query_id: String,
	},
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FromObject {
	pub id: String,
	pub alias: String,
	pub columns: Vec<FromColumn>,
	pub source: FromSource,
}

impl FromObject {
	pub fn avatar(id: impl Into<String>, source_id: impl Into<String>, columns: Vec<FromColumn>) -> Self {
		let id = id.into();
		Self {
			alias: id.clone(),
			columns,
			source: FromSource::Avatar {
				avatar_id: id.clone(),
				source_id: source_id.into(),
			},
			id,
		}
	}

	pub fn subquery(query_id: impl Into<String>, columns: Vec<FromColumn>) -> Self {
		let query_id = query_id.into();
		Self {
			id: query_id.clone(),
			alias: query_id.clone(),
			columns,
			source: FromSource::Subquery {
				query_id,
			},
		}
	}

	pub fn subquery_id(&self) -> Option<&str> {
		match &self.source {
			FromSource::Subquery {
				query_id,
			} => Some(query_id),
			FromSource::Avatar {
				..
			} => None,
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct JoinedFromObject {
	pub root_from_id: Option<String>,
	pub froms: Vec<FromObject>,
}

impl JoinedFromObject {
	pub fn iter_ids(&self) -> impl Iterator<Item = &str> {
		self.froms.iter().map(|from| from.id.as_str())
	}

	pub fn get(&self, id: &str) -> Option<&FromObject> {
		self.froms.iter().find(|from| from.id == id)
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryMeta {
	pub row_count_hard_limit: Option<u64>,
	pub query_type: QueryType,
	/// Output position and field id of every selected column, for the user-facing query only
	pub field_order: Option<Vec<(usize, String)>>,
	pub from_subquery: bool,
	pub subquery_limit: Option<u64>,
	pub empty_query_mode: EmptyQueryMode,
}

impl Default for QueryMeta {
	fn default() -> Self {
		Self {
			row_count_hard_limit: None,
			query_type: QueryType::Result,
			field_order: None,
			from_subquery: false,
			subquery_limit: None,
			empty_query_mode: EmptyQueryMode::Error,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery {
	pub id: String,
	pub level_type: ExecutionLevel,
	pub select: Vec<CompiledFormula>,
	pub group_by: Vec<CompiledFormula>,
	pub filters: Vec<CompiledFormula>,
	pub order_by: Vec<CompiledOrderBy>,
	pub join_on: Vec<CompiledJoinOn>,
	pub joined_from: JoinedFromObject,
	pub limit: Option<u64>,
	pub offset: Option<u64>,
	pub meta: QueryMeta,
}

impl CompiledQuery {
	pub fn new(id: impl Into<String>, level_type: ExecutionLevel) -> Self {
		Self {
			id: id.into(),
			level_type,
			select: Vec::new(),
			group_by: Vec::new(),
			filters: Vec::new(),
			order_by: Vec::new(),
			join_on: Vec::new(),
			joined_from: JoinedFromObject::default(),
			limit: None,
			offset: None,
			meta: QueryMeta::default(),
		}
	}

	pub fn formulas(&self, part: QueryPart) -> Vec<&CompiledFormula> {
		match part {
			QueryPart::Select => self.select.iter().collect(),
			QueryPart::GroupBy => self.group_by.iter().collect(),
			QueryPart::Filters => self.filters.iter().collect(),
			QueryPart::OrderBy => self.order_by.iter().map(|order_by| &order_by.formula).collect(),
			QueryPart::JoinOn => self.join_on.iter().map(|join_on| &join_on.formula).collect(),
		}
	}

	/// Formulas of every clause, SELECT first.
	pub fn all_formulas(&self) -> impl Iterator<Item = &CompiledFormula> {
		self.select
			.iter()
			.chain(self.group_by.iter())
			.chain(self.filters.iter())
			.chain(self.order_by.iter().map(|order_by| &order_by.formula))
			.chain(self.join_on.iter().map(|join_on| &join_on.formula))
	}

	pub fn used_avatar_ids(&self) -> BTreeSet<&str> {
		self.all_formulas().flat_map(|formula| formula.avatar_ids.iter().map(String::as_str)).collect()
	}

	pub fn is_empty(&self) -> bool {
		self.select.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use lodestar_formula::build::{field, func, int};

	use super::*;

	fn make_query() -> CompiledQuery {
		let mut query = CompiledQuery::new("qq", ExecutionLevel::SourceDb);
		query.select = vec![
			CompiledFormula::new(field("city"), "res_0").with_avatar_ids(["a1"]),
			CompiledFormula::new(func("sum", vec![field("sales")]), "res_1").with_avatar_ids(["a2"]),
		];
		query.group_by = vec![CompiledFormula::new(field("city"), "res_0").with_avatar_ids(["a1"])];
		query.order_by = vec![CompiledOrderBy {
			formula: CompiledFormula::new(int(1), "ord_0"),
			direction: SortDirection::Desc,
		}];
		query.joined_from = JoinedFromObject {
			root_from_id: Some("a1".to_string()),
			froms: vec![
				FromObject::avatar("a1", "src", vec![FromColumn::new("city", "city")]),
				FromObject::avatar("a2", "src", vec![FromColumn::new("sales", "sales")]),
			],
		};
		query
	}

	#[test]
	fn test_formulas_per_part() {
		let query = make_query();

		assert_eq!(query.formulas(QueryPart::Select).len(), 2);
		assert_eq!(query.formulas(QueryPart::GroupBy).len(), 1);
		assert_eq!(query.formulas(QueryPart::OrderBy)[0].alias.as_deref(), Some("ord_0"));
		assert!(query.formulas(QueryPart::JoinOn).is_empty());
		assert_eq!(query.all_formulas().count(), 4);
	}

	#[test]
	fn test_used_avatar_ids() {
		let query = make_query();
		assert_eq!(query.used_avatar_ids().into_iter().collect::<Vec<_>>(), vec!["a1", "a2"]);
	}

	#[test]
	fn test_joined_from_lookup() {
		let query = make_query();

		assert_eq!(query.joined_from.iter_ids().collect::<Vec<_>>(), vec!["a1", "a2"]);
		assert!(query.joined_from.get("a2").is_some());
		assert!(query.joined_from.get("a3").is_none());
		assert_eq!(query.joined_from.get("a1").and_then(FromObject::subquery_id), None);
	}

	#[test]
	fn test_subquery_from() {
		let from = FromObject::subquery("qq_0_0_0", vec![FromColumn::new("res_0", "res_0")]);

		assert_eq!(from.alias, "qq_0_0_0");
		assert_eq!(from.subquery_id(), Some("qq_0_0_0"));
	}

	#[test]
	fn test_display() {
		let formula = CompiledFormula::new(func("sum", vec![field("sales")]), "res_1");
		assert!(formula.to_string().ends_with("AS res_1"));
		assert_eq!(ExecutionLevel::Compeng.to_string(), "compeng");
	}
}
