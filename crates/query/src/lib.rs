// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Multi-level query compilation: separation of sliced queries into per-level compiled queries,
//! the resulting query DAG, and the tools used to re-instantiate and patch it.

#![cfg_attr(not(debug_assertions), deny(warnings))]

pub mod error;
pub mod multi_query;
pub mod patch;
pub mod primitives;
pub mod separator;
pub mod sliced;
pub mod tools;

pub use error::QueryError;
pub use multi_query::{CompiledLevel, CompiledMultiLevelQuery, CompiledMultiQuery, MultiQueryIndex};
pub use patch::{IncrementalPatch, ReplacementPatch, apply_incremental_patches, apply_replacement_patches};
pub use primitives::{
	BASE_QUERY_ID, CompiledFormula, CompiledJoinOn, CompiledOrderBy, CompiledQuery, ExecutionLevel, FromColumn,
	FromObject, FromSource, JoinedFromObject, QueryMeta, QueryPart,
};
pub use separator::{DEFAULT_SOURCE_ROW_LIMIT, QuerySeparator};
pub use sliced::{FormulaSlice, SlicedFormula, SlicedJoinOnFormula, SlicedOrderByFormula, SlicedQuery};
pub use tools::{AliasRemapper, add_dummy_select_column, copy_and_remap_query, query_dimension_aliases};
