// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Input of the query separator: a query whose formulas were already cut into one piece per
//! execution level, bottom level first.

use indexmap::IndexMap;
use lodestar_formula::node::{JoinType, SortDirection};

use crate::primitives::{CompiledFormula, ExecutionLevel, JoinedFromObject, QueryMeta};

/// Pieces of one formula that are evaluated at the same level, keyed by alias.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormulaSlice {
	pub aliased_formulas: IndexMap<String, CompiledFormula>,
}

impl FormulaSlice {
	pub fn with(mut self, formula: CompiledFormula) -> Self {
		let alias = formula.alias.clone().unwrap_or_default();
		self.aliased_formulas.insert(alias, formula);
		self
	}
}

impl From<CompiledFormula> for FormulaSlice {
	fn from(formula: CompiledFormula) -> Self {
		FormulaSlice::default().with(formula)
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlicedFormula {
	pub slices: Vec<FormulaSlice>,
}

impl SlicedFormula {
	pub fn new(slices: Vec<FormulaSlice>) -> Self {
		Self {
			slices,
		}
	}

	pub fn level_count(&self) -> usize {
		self.slices.len()
	}

	pub fn top_slice(&self) -> Option<&FormulaSlice> {
		self.slices.last()
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlicedOrderByFormula {
	pub sliced: SlicedFormula,
	pub direction: SortDirection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlicedJoinOnFormula {
	pub sliced: SlicedFormula,
	pub left_id: String,
	pub right_id: String,
	pub join_type: JoinType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlicedQuery {
	pub id: String,
	/// One entry per level, bottom first
	pub level_types: Vec<ExecutionLevel>,
	pub select: Vec<SlicedFormula>,
	pub group_by: Vec<SlicedFormula>,
	pub order_by: Vec<SlicedOrderByFormula>,
	pub filters: Vec<SlicedFormula>,
	pub join_on: Vec<SlicedJoinOnFormula>,
	pub joined_from: JoinedFromObject,
	pub limit: Option<u64>,
	pub offset: Option<u64>,
	pub meta: QueryMeta,
}

impl SlicedQuery {
	pub fn new(id: impl Into<String>, level_types: Vec<ExecutionLevel>) -> Self {
		Self {
			id: id.into(),
			level_types,
			select: Vec::new(),
			group_by: Vec::new(),
			order_by: Vec::new(),
			filters: Vec::new(),
			join_on: Vec::new(),
			joined_from: JoinedFromObject::default(),
			limit: None,
			offset: None,
			meta: QueryMeta::default(),
		}
	}

	pub fn level_count(&self) -> usize {
		self.level_types.len()
	}
}
