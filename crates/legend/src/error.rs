// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use lodestar_type::error::{Diagnostic, Error, IntoDiagnostic};

use crate::{BlockId, FieldRole, LegendItemId, QueryType};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LegendError {
	#[error("Got non-unique legend item ids: {ids:?}")]
	NonUniqueLegendIds {
		ids: Vec<LegendItemId>,
	},

	#[error("Unknown field: {reference}")]
	UnknownField {
		reference: String,
	},

	#[error("Legend role {role} is not supported for {query_type} queries")]
	UnsupportedRole {
		role: FieldRole,
		query_type: QueryType,
	},

	#[error("Invalid value for tree prefix: {prefix}")]
	InvalidTreePrefix {
		prefix: String,
	},

	#[error("Filters by measures are not supported for {query_type} queries")]
	MeasureFilterUnsupported {
		query_type: QueryType,
	},

	#[error("Legend of a {query_type} query must have {expected} {role} items, got {count}")]
	InvalidRoleCount {
		role: FieldRole,
		query_type: QueryType,
		expected: &'static str,
		count: usize,
	},

	#[error("Unsupported data type for {role} role of legend item {legend_item_id}")]
	RoleDataTypeMismatch {
		role: FieldRole,
		legend_item_id: LegendItemId,
	},

	#[error("Measure Name is not supported for {query_type} queries")]
	MeasureNameUnsupported {
		query_type: QueryType,
	},

	#[error("Unknown legend item {legend_item_id}")]
	UnknownLegendItem {
		legend_item_id: LegendItemId,
	},
}

impl LegendError {
	pub fn code(&self) -> &'static str {
		match self {
			LegendError::NonUniqueLegendIds {
				..
			} => "LEGEND_001",
			LegendError::UnknownField {
				..
			} => "LEGEND_002",
			LegendError::UnsupportedRole {
				..
			} => "LEGEND_003",
			LegendError::InvalidTreePrefix {
				..
			} => "LEGEND_004",
			LegendError::MeasureFilterUnsupported {
				..
			} => "LEGEND_005",
			LegendError::InvalidRoleCount {
				..
			} => "LEGEND_006",
			LegendError::RoleDataTypeMismatch {
				..
			} => "LEGEND_007",
			LegendError::MeasureNameUnsupported {
				..
			} => "LEGEND_008",
			LegendError::UnknownLegendItem {
				..
			} => "LEGEND_009",
		}
	}
}

impl IntoDiagnostic for LegendError {
	fn into_diagnostic(self) -> Diagnostic {
		let help = match &self {
			LegendError::NonUniqueLegendIds {
				..
			} => Some("Give every legend item a distinct id or omit the id".to_string()),
			LegendError::UnknownField {
				..
			} => Some("Check that the field exists in the dataset".to_string()),
			LegendError::InvalidTreePrefix {
				..
			} => Some("The tree prefix must be a JSON encoded list".to_string()),
			LegendError::RoleDataTypeMismatch {
				..
			} => Some("Tree role requires a tree_str field".to_string()),
			_ => None,
		};
		Diagnostic {
			code: self.code().to_string(),
			message: self.to_string(),
			help,
			..Default::default()
		}
	}
}

impl From<LegendError> for Error {
	fn from(err: LegendError) -> Self {
		Error(err.into_diagnostic())
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlockError {
	#[error("Multiple root blocks: {block_ids:?}")]
	MultipleRootBlocks {
		block_ids: Vec<BlockId>,
	},

	#[error("No root block")]
	NoRootBlock,

	#[error("Multiple trees detected in block {block_id}")]
	MultipleTree {
		block_id: BlockId,
	},

	#[error("Got tree and totals in block {block_id}, they are incompatible")]
	ItemCompatibility {
		block_id: BlockId,
	},

	#[error("Blocks have different column counts. Main block: {main}, block {block_id}: {secondary}")]
	UnevenColumnCount {
		block_id: BlockId,
		main: usize,
		secondary: usize,
	},

	#[error("Block {block_id} refers to unknown parent block {parent_block_id}")]
	UnknownBlock {
		block_id: BlockId,
		parent_block_id: BlockId,
	},
}

impl BlockError {
	pub fn code(&self) -> &'static str {
		match self {
			BlockError::MultipleRootBlocks {
				..
			} => "BLOCK_001",
			BlockError::NoRootBlock => "BLOCK_002",
			BlockError::MultipleTree {
				..
			} => "BLOCK_003",
			BlockError::ItemCompatibility {
				..
			} => "BLOCK_004",
			BlockError::UnevenColumnCount {
				..
			} => "BLOCK_005",
			BlockError::UnknownBlock {
				..
			} => "BLOCK_006",
		}
	}
}

impl IntoDiagnostic for BlockError {
	fn into_diagnostic(self) -> Diagnostic {
		let notes = match &self {
			BlockError::UnevenColumnCount {
				..
			} => vec!["A totals block is aligned column by column with the main block".to_string()],
			BlockError::MultipleRootBlocks {
				..
			}
			| BlockError::NoRootBlock => vec!["Exactly one block must be placed at the root".to_string()],
			_ => vec![],
		};
		Diagnostic {
			code: self.code().to_string(),
			message: self.to_string(),
			notes,
			..Default::default()
		}
	}
}

impl From<BlockError> for Error {
	fn from(err: BlockError) -> Self {
		Error(err.into_diagnostic())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_codes_are_carried_into_diagnostics() {
		let err: Error = BlockError::NoRootBlock.into();
		assert_eq!(err.code, "BLOCK_002");
		assert_eq!(err.notes.len(), 1);

		let err: Error = LegendError::UnsupportedRole {
			role: FieldRole::Tree,
			query_type: QueryType::Pivot,
		}
		.into();
		assert_eq!(err.code, "LEGEND_003");
		assert_eq!(err.message, "Legend role tree is not supported for pivot queries");
	}
}
