// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Collections of compiled queries.
//!
//! [`CompiledMultiLevelQuery`] keeps queries grouped by execution level, which is the shape the
//! separator produces and patches address. [`CompiledMultiQuery`] is the flat DAG handed to the
//! executor: queries reference each other only by id through their FROM objects.

use std::{
	collections::{BTreeSet, HashMap, HashSet},
	sync::Arc,
};

use indexmap::IndexMap;
use lodestar_type::{Result, internal_err, return_internal_error};

use crate::primitives::{CompiledQuery, ExecutionLevel, FromObject};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledLevel {
	pub level_type: ExecutionLevel,
	pub queries: Vec<Arc<CompiledQuery>>,
}

/// Coordinate of a query inside a [`CompiledMultiLevelQuery`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MultiQueryIndex {
	pub level_idx: usize,
	pub query_idx: usize,
}

impl MultiQueryIndex {
	pub fn new(level_idx: usize, query_idx: usize) -> Self {
		Self {
			level_idx,
			query_idx,
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledMultiLevelQuery {
	/// Bottom level first
	pub levels: Vec<CompiledLevel>,
}

impl CompiledMultiLevelQuery {
	pub fn new(levels: Vec<CompiledLevel>) -> Self {
		Self {
			levels,
		}
	}

	pub fn level_count(&self) -> usize {
		self.levels.len()
	}

	pub fn get(&self, index: MultiQueryIndex) -> Option<&Arc<CompiledQuery>> {
		self.levels.get(index.level_idx).and_then(|level| level.queries.get(index.query_idx))
	}

	pub fn iter_queries(&self) -> impl Iterator<Item = &Arc<CompiledQuery>> {
		self.levels.iter().flat_map(|level| level.queries.iter())
	}

	pub fn flatten(&self) -> Result<CompiledMultiQuery> {
		CompiledMultiQuery::new(self.iter_queries().cloned().collect())
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledMultiQuery {
	queries: Vec<Arc<CompiledQuery>>,
	by_id: HashMap<String, usize>,
}

impl CompiledMultiQuery {
	pub fn new(queries: Vec<Arc<CompiledQuery>>) -> Result<Self> {
		let mut by_id = HashMap::with_capacity(queries.len());
		for (idx, query) in queries.iter().enumerate() {
			if by_id.insert(query.id.clone(), idx).is_some() {
				return_internal_error!("query id {} is used more than once", query.id);
			}
		}
		Ok(Self {
			queries,
			by_id,
		})
	}

	pub fn queries(&self) -> &[Arc<CompiledQuery>] {
		&self.queries
	}

	pub fn iter(&self) -> impl Iterator<Item = &Arc<CompiledQuery>> {
		self.queries.iter()
	}

	pub fn len(&self) -> usize {
		self.queries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.queries.is_empty()
	}

	pub fn contains(&self, id: &str) -> bool {
		self.by_id.contains_key(id)
	}

	pub fn query(&self, id: &str) -> Result<&Arc<CompiledQuery>> {
		match self.by_id.get(id) {
			Some(idx) => Ok(&self.queries[*idx]),
			None => internal_err!("unknown query {}", id),
		}
	}

	/// Queries no other query reads from, ordered by id.
	pub fn top_queries(&self) -> Vec<&Arc<CompiledQuery>> {
		let referenced: HashSet<&str> =
			self.queries.iter().flat_map(|query| query.joined_from.iter_ids()).collect();
		let mut top: Vec<&Arc<CompiledQuery>> =
			self.queries.iter().filter(|query| !referenced.contains(query.id.as_str())).collect();
		top.sort_by(|left, right| left.id.cmp(&right.id));
		top
	}

	pub fn single_top_query(&self) -> Result<&Arc<CompiledQuery>> {
		let top = self.top_queries();
		if top.len() != 1 {
			return_internal_error!("exactly one top-level query expected, got {}", top.len());
		}
		Ok(top[0])
	}

	/// Queries that read from avatars only.
	pub fn bottom_queries(&self) -> Vec<&Arc<CompiledQuery>> {
		self.queries.iter().filter(|query| query.joined_from.iter_ids().all(|id| !self.contains(id))).collect()
	}

	/// FROM objects that are not queries of this DAG, in order of first use.
	pub fn base_froms(&self) -> IndexMap<&str, &FromObject> {
		let mut result = IndexMap::new();
		for from in self.queries.iter().flat_map(|query| query.joined_from.froms.iter()) {
			if !self.contains(&from.id) && !result.contains_key(from.id.as_str()) {
				result.insert(from.id.as_str(), from);
			}
		}
		result
	}

	pub fn base_root_from_ids(&self) -> BTreeSet<&str> {
		self.queries
			.iter()
			.filter_map(|query| query.joined_from.root_from_id.as_deref())
			.filter(|id| !self.contains(id))
			.collect()
	}

	pub fn for_level_type(&self, level_type: ExecutionLevel) -> CompiledMultiQuery {
		let queries: Vec<Arc<CompiledQuery>> =
			self.queries.iter().filter(|query| query.level_type == level_type).cloned().collect();
		let by_id = queries.iter().enumerate().map(|(idx, query)| (query.id.clone(), idx)).collect();
		CompiledMultiQuery {
			queries,
			by_id,
		}
	}
}
