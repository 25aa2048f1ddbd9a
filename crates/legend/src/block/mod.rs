// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Blocks: independently planned parts of one data request, such as the main result and its
//! totals, and the way their rows are merged into one response.

mod formalizer;

pub use formalizer::BlockFormalizer;
use serde::{Deserialize, Serialize};

use crate::{BlockId, DimensionValueSpec, Legend, LegendItemId, QueryType};

/// Dimension of a dispersed block aligned with a dimension of its parent block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DimensionPair {
	pub parent: LegendItemId,
	pub child: LegendItemId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockPlacement {
	Root,
	/// Rows are appended after the rows of the parent, optionally with locked dimension values.
	After {
		#[serde(default, skip_serializing_if = "Option::is_none")]
		dimension_values: Option<Vec<DimensionValueSpec>>,
	},
	/// Rows are spread among the rows of the parent block, matching the paired dimensions.
	DispersedAfter {
		parent_block_id: BlockId,
		dimensions: Vec<DimensionPair>,
	},
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyQueryMode {
	#[default]
	Error,
	/// A single empty row is returned instead of an error.
	EmptyRow,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSpec {
	pub block_id: BlockId,
	pub parent_block_id: Option<BlockId>,
	pub placement: BlockPlacement,
	/// Streamable items of the block in output order.
	pub legend_item_ids: Vec<LegendItemId>,
	pub legend: Legend,
	pub limit: Option<u64>,
	pub offset: Option<u64>,
	pub query_type: QueryType,
	pub row_count_hard_limit: Option<u64>,
	pub empty_query_mode: EmptyQueryMode,
}

impl BlockSpec {
	pub fn is_root(&self) -> bool {
		matches!(self.placement, BlockPlacement::Root)
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockLegendMeta {
	pub limit: Option<u64>,
	pub offset: Option<u64>,
	pub row_count_hard_limit: Option<u64>,
}

/// Validated blocks of a request. The first block is the root (main) block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockLegend {
	pub blocks: Vec<BlockSpec>,
	pub meta: BlockLegendMeta,
}

impl BlockLegend {
	pub fn root(&self) -> Option<&BlockSpec> {
		self.blocks.iter().find(|block| block.is_root())
	}

	pub fn get(&self, block_id: BlockId) -> Option<&BlockSpec> {
		self.blocks.iter().find(|block| block.block_id == block_id)
	}

	pub fn block_ids(&self) -> Vec<BlockId> {
		self.blocks.iter().map(|block| block.block_id).collect()
	}
}
