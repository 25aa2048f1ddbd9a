// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::collections::BTreeSet;

use lodestar_type::{Result, return_internal_error};
use tracing::{debug, info, instrument, trace};

use super::{BlockLegend, BlockLegendMeta, BlockPlacement, BlockSpec, DimensionPair, EmptyQueryMode};
use crate::{
	BlockId, FieldRole, FieldType, Legend, QueryType, RoleSpec,
	error::BlockError,
	id_gen::IdGenerator,
	notification::Notification,
	raw::{RawBlockPlacement, RawBlockSpec, RawQuerySpec},
};

/// Splits a formalized legend into blocks and decides how the rows of each block are placed.
#[derive(Debug, Default)]
pub struct BlockFormalizer;

impl BlockFormalizer {
	pub fn new() -> Self {
		Self
	}

	/// Builds the validated blocks of a request together with the notifications about
	/// adjustments made on the way.
	#[instrument(name = "legend::block::make_block_legend", level = "trace", skip_all)]
	pub fn make_block_legend(&self, raw: &RawQuerySpec, legend: &Legend) -> Result<(BlockLegend, Vec<Notification>)> {
		let mut id_gen = IdGenerator::new(raw.unique_block_ids().into_iter().chain(legend.block_ids()));
		if id_gen.used().is_empty() {
			// there is always at least one block
			id_gen.generate();
		}
		let used_ids = id_gen.used().clone();

		let mut blocks: Vec<BlockSpec> = Vec::with_capacity(used_ids.len());
		for raw_block in &raw.blocks {
			if let Some(parent_block_id) = raw_block.parent_block_id {
				if !used_ids.contains(&parent_block_id) {
					return Err(BlockError::UnknownBlock {
						block_id: raw_block.block_id,
						parent_block_id,
					}
					.into());
				}
			}
			let block = self.make_block_spec(raw_block.block_id, Some(raw_block), raw, legend, blocks.first())?;
			blocks.push(block);
		}

		let explicit: BTreeSet<BlockId> = blocks.iter().map(|block| block.block_id).collect();
		for block_id in used_ids.difference(&explicit) {
			let block = self.make_block_spec(*block_id, None, raw, legend, blocks.first())?;
			blocks.push(block);
		}

		if let Some(first) = blocks.first_mut() {
			first.placement = BlockPlacement::Root;
		}

		let block_legend = BlockLegend {
			blocks,
			meta: BlockLegendMeta {
				limit: raw.limit,
				offset: raw.offset,
				row_count_hard_limit: raw.meta.row_count_hard_limit,
			},
		};
		let (block_legend, notifications) = self.finalize(block_legend);
		self.validate(&block_legend)?;
		debug!(blocks = block_legend.blocks.len(), notifications = notifications.len(), "formalized blocks");
		Ok((block_legend, notifications))
	}

	fn make_block_spec(
		&self,
		block_id: BlockId,
		raw_block: Option<&RawBlockSpec>,
		raw: &RawQuerySpec,
		legend: &Legend,
		main_block: Option<&BlockSpec>,
	) -> Result<BlockSpec> {
		let legend = legend.limit_to_block(block_id);
		let streamable = legend.list_streamable_items();
		let legend_item_ids = streamable.iter().map(|item| item.legend_item_id).collect();

		let template_only = !streamable.is_empty() && streamable.iter().all(|item| item.role() == FieldRole::Template);
		let empty_query_mode = if template_only {
			EmptyQueryMode::EmptyRow
		} else {
			EmptyQueryMode::Error
		};

		let query_type = if streamable.iter().any(|item| matches!(item.role(), FieldRole::Total | FieldRole::Template))
		{
			QueryType::Totals
		} else {
			raw.meta.query_type
		};

		let (parent_block_id, limit, offset, row_count_hard_limit, placement) = match raw_block {
			Some(raw_block) => (
				raw_block.parent_block_id,
				raw_block.limit,
				raw_block.offset,
				raw_block.row_count_hard_limit.or(raw.meta.row_count_hard_limit),
				match &raw_block.placement {
					RawBlockPlacement::Root => BlockPlacement::Root,
					RawBlockPlacement::After {
						dimension_values,
					} => BlockPlacement::After {
						dimension_values: dimension_values.clone(),
					},
				},
			),
			None => (
				None,
				None,
				None,
				raw.meta.row_count_hard_limit,
				self.resolve_placement(block_id, &legend, raw.meta.query_type, main_block)?,
			),
		};
		trace!(block_id, placement = ?placement, query_type = %query_type, "resolved block");

		Ok(BlockSpec {
			block_id,
			parent_block_id,
			placement,
			legend_item_ids,
			legend,
			limit,
			offset,
			query_type,
			row_count_hard_limit,
			empty_query_mode,
		})
	}

	fn resolve_placement(
		&self,
		block_id: BlockId,
		legend: &Legend,
		query_type: QueryType,
		main_block: Option<&BlockSpec>,
	) -> Result<BlockPlacement> {
		let streamable = legend.list_streamable_items();
		if !streamable.is_empty() && streamable.iter().all(|item| item.role() == FieldRole::Template) {
			// nothing to group by, so the block can only be appended
			return Ok(BlockPlacement::After {
				dimension_values: None,
			});
		}

		let totals = legend.list_for_role(FieldRole::Total);
		let trees = legend.list_for_role(FieldRole::Tree);
		if !trees.is_empty() && !totals.is_empty() {
			return Err(BlockError::ItemCompatibility {
				block_id,
			}
			.into());
		}

		if !totals.is_empty() && query_type == QueryType::Result {
			let Some(main_block) = main_block else {
				return_internal_error!("totals block {} has no main block to be dispersed after", block_id);
			};
			let main_ids = &main_block.legend_item_ids;
			if streamable.len() != main_ids.len() {
				return Err(BlockError::UnevenColumnCount {
					block_id,
					main: main_ids.len(),
					secondary: streamable.len(),
				}
				.into());
			}
			let dimensions = streamable
				.iter()
				.zip(main_ids)
				.filter(|(item, _)| item.field_type == FieldType::Dimension && item.role() != FieldRole::Template)
				.map(|(item, parent)| DimensionPair {
					parent: *parent,
					child: item.legend_item_id,
				})
				.collect();
			return Ok(BlockPlacement::DispersedAfter {
				parent_block_id: main_block.block_id,
				dimensions,
			});
		}

		if !totals.is_empty() {
			// pivot tables remix the rows anyway
			return Ok(BlockPlacement::After {
				dimension_values: None,
			});
		}

		match trees.as_slice() {
			[] => Ok(BlockPlacement::Root),
			[tree] => {
				let dimension_values = match &tree.role_spec {
					RoleSpec::Tree {
						dimension_values,
						..
					} => Some(dimension_values.clone()),
					_ => None,
				};
				Ok(BlockPlacement::After {
					dimension_values,
				})
			}
			_ => Err(BlockError::MultipleTree {
				block_id,
			}
			.into()),
		}
	}

	/// Totals cannot be computed consistently under filters by measures, so they are dropped
	/// when the main block has any.
	fn finalize(&self, block_legend: BlockLegend) -> (BlockLegend, Vec<Notification>) {
		let mut notifications = Vec::new();
		let Some((first, others)) = block_legend.blocks.split_first() else {
			return (block_legend, notifications);
		};
		let removable = !others.is_empty()
			&& matches!(first.query_type, QueryType::Result | QueryType::Pivot)
			&& others.iter().all(|block| block.query_type == QueryType::Totals)
			&& !first.legend.measure_filters().is_empty();
		if !removable {
			return (block_legend, notifications);
		}

		let BlockLegend {
			blocks,
			meta,
		} = block_legend;
		let blocks: Vec<BlockSpec> = blocks.into_iter().filter(|block| block.query_type != QueryType::Totals).collect();
		let notification = Notification::totals_removed_due_to_measure_filter();
		info!(code = %notification.code, remaining = blocks.len(), "removed totals blocks");
		notifications.push(notification);
		(
			BlockLegend {
				blocks,
				meta,
			},
			notifications,
		)
	}

	fn validate(&self, block_legend: &BlockLegend) -> Result<()> {
		let roots: Vec<BlockId> =
			block_legend.blocks.iter().filter(|block| block.is_root()).map(|block| block.block_id).collect();
		match roots.len() {
			1 => Ok(()),
			0 => Err(BlockError::NoRootBlock.into()),
			_ => Err(BlockError::MultipleRootBlocks {
				block_ids: roots,
			}
			.into()),
		}
	}
}
