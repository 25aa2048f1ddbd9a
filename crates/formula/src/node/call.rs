// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::node::Node;

/// Level of detail of an aggregation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Lod {
	/// Dimensions come from the enclosing context
	#[default]
	Inherited,
	/// Aggregate over the whole context, ignoring any dimension
	DefaultAggregation,
	Fixed(Vec<Node>),
	Include(Vec<Node>),
	Exclude(Vec<Node>),
}

impl Lod {
	pub fn dimensions(&self) -> &[Node] {
		match self {
			Lod::Inherited | Lod::DefaultAggregation => &[],
			Lod::Fixed(dims) | Lod::Include(dims) | Lod::Exclude(dims) => dims,
		}
	}

	pub fn with_dimensions(&self, dims: Vec<Node>) -> Lod {
		match self {
			Lod::Inherited => Lod::Inherited,
			Lod::DefaultAggregation => Lod::DefaultAggregation,
			Lod::Fixed(_) => Lod::Fixed(dims),
			Lod::Include(_) => Lod::Include(dims),
			Lod::Exclude(_) => Lod::Exclude(dims),
		}
	}

	pub fn is_inherited(&self) -> bool {
		matches!(self, Lod::Inherited)
	}
}

/// Names of the fields whose filters apply only after the expression is computed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BeforeFilterBy {
	pub field_names: BTreeSet<String>,
}

impl BeforeFilterBy {
	pub fn new<I, S>(names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			field_names: names.into_iter().map(Into::into).collect(),
		}
	}

	pub fn contains(&self, name: &str) -> bool {
		self.field_names.contains(name)
	}

	pub fn is_empty(&self) -> bool {
		self.field_names.is_empty()
	}

	pub fn with(&self, name: impl Into<String>) -> Self {
		let mut field_names = self.field_names.clone();
		field_names.insert(name.into());
		Self {
			field_names,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FuncCall {
	pub name: String,
	pub args: Vec<Node>,
	pub lod: Lod,
	pub ignore_dimensions: Vec<Node>,
	pub before_filter_by: BeforeFilterBy,
}

impl FuncCall {
	pub fn new(name: impl Into<String>, args: Vec<Node>) -> Self {
		Self {
			name: name.into().to_lowercase(),
			args,
			lod: Lod::Inherited,
			ignore_dimensions: Vec::new(),
			before_filter_by: BeforeFilterBy::default(),
		}
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
	#[default]
	Asc,
	Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ordering {
	pub expr: Node,
	pub direction: SortDirection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum WindowGrouping {
	#[default]
	Total,
	Within(Vec<Node>),
	Among(Vec<Node>),
}

impl WindowGrouping {
	pub fn dimensions(&self) -> &[Node] {
		match self {
			WindowGrouping::Total => &[],
			WindowGrouping::Within(dims) | WindowGrouping::Among(dims) => dims,
		}
	}

	pub fn with_dimensions(&self, dims: Vec<Node>) -> WindowGrouping {
		match self {
			WindowGrouping::Total => WindowGrouping::Total,
			WindowGrouping::Within(_) => WindowGrouping::Within(dims),
			WindowGrouping::Among(_) => WindowGrouping::Among(dims),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WindowFuncCall {
	pub name: String,
	pub args: Vec<Node>,
	pub grouping: WindowGrouping,
	pub ordering: Vec<Ordering>,
	pub before_filter_by: BeforeFilterBy,
}

impl WindowFuncCall {
	pub fn new(name: impl Into<String>, args: Vec<Node>, grouping: WindowGrouping) -> Self {
		Self {
			name: name.into().to_lowercase(),
			args,
			grouping,
			ordering: Vec::new(),
			before_filter_by: BeforeFilterBy::default(),
		}
	}
}
