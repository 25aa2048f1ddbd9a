// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use lodestar_type::{DataType, Result};

use crate::{BlockId, FieldRole, FieldType, LegendItemId, RoleSpec, error::LegendError};

/// What a legend item refers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ObjSpec {
	Field {
		id: String,
		title: String,
	},
	/// Virtual dimension holding the names of the measures of a pivot table
	MeasureName,
	/// Virtual dimension holding the names of the dimensions of a pivot table
	DimensionName,
	Placeholder,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LegendItem {
	pub legend_item_id: LegendItemId,
	pub obj: ObjSpec,
	pub role_spec: RoleSpec,
	pub block_id: Option<BlockId>,
	pub data_type: DataType,
	pub field_type: FieldType,
}

impl LegendItem {
	pub fn role(&self) -> FieldRole {
		self.role_spec.role()
	}

	pub fn field_id(&self) -> Option<&str> {
		match &self.obj {
			ObjSpec::Field {
				id,
				..
			} => Some(id),
			_ => None,
		}
	}

	pub fn title(&self) -> &str {
		match &self.obj {
			ObjSpec::Field {
				title,
				..
			} => title,
			ObjSpec::MeasureName => "Measure Names",
			ObjSpec::DimensionName => "Dimension Names",
			ObjSpec::Placeholder => "",
		}
	}

	/// The item is visible in every block.
	pub fn is_shared(&self) -> bool {
		self.block_id.is_none()
	}
}

/// Ordered list of the items requested by one data request, optionally limited to one block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Legend {
	items: Vec<LegendItem>,
}

impl Legend {
	pub fn new(items: Vec<LegendItem>) -> Self {
		Self {
			items,
		}
	}

	pub fn items(&self) -> &[LegendItem] {
		&self.items
	}

	pub fn iter(&self) -> std::slice::Iter<'_, LegendItem> {
		self.items.iter()
	}

	pub fn len(&self) -> usize {
		self.items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	pub fn add_item(&mut self, item: LegendItem) {
		self.items.push(item);
	}

	pub fn list_for_role(&self, role: FieldRole) -> Vec<&LegendItem> {
		self.items.iter().filter(|item| item.role() == role).collect()
	}

	pub fn list_streamable_items(&self) -> Vec<&LegendItem> {
		self.items.iter().filter(|item| item.role().is_streamable()).collect()
	}

	/// Items belonging to `block_id` plus the items shared by all blocks.
	pub fn limit_to_block(&self, block_id: BlockId) -> Legend {
		Legend::new(
			self.items
				.iter()
				.filter(|item| item.block_id.is_none_or(|id| id == block_id))
				.cloned()
				.collect(),
		)
	}

	pub fn get_item(&self, legend_item_id: LegendItemId) -> Result<&LegendItem> {
		self.items.iter().find(|item| item.legend_item_id == legend_item_id).ok_or_else(|| {
			LegendError::UnknownLegendItem {
				legend_item_id,
			}
			.into()
		})
	}

	pub fn legend_item_ids(&self) -> Vec<LegendItemId> {
		self.items.iter().map(|item| item.legend_item_id).collect()
	}

	/// Filters on measures, which are applied after aggregation.
	pub fn measure_filters(&self) -> Vec<&LegendItem> {
		self.items
			.iter()
			.filter(|item| item.role() == FieldRole::Filter && item.field_type == FieldType::Measure)
			.collect()
	}

	pub fn block_ids(&self) -> impl Iterator<Item = BlockId> + '_ {
		self.items.iter().filter_map(|item| item.block_id)
	}

	pub fn contains_obj(&self, obj: &ObjSpec) -> bool {
		self.items.iter().any(|item| &item.obj == obj)
	}
}

impl<'a> IntoIterator for &'a Legend {
	type Item = &'a LegendItem;
	type IntoIter = std::slice::Iter<'a, LegendItem>;

	fn into_iter(self) -> Self::IntoIter {
		self.items.iter()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::FilterOperation;

	fn make_item(legend_item_id: LegendItemId, role_spec: RoleSpec, block_id: Option<BlockId>) -> LegendItem {
		LegendItem {
			legend_item_id,
			obj: ObjSpec::Field {
				id: format!("f{}", legend_item_id),
				title: format!("Field {}", legend_item_id),
			},
			role_spec,
			block_id,
			data_type: DataType::Integer,
			field_type: FieldType::Dimension,
		}
	}

	fn make_legend() -> Legend {
		let mut measure_filter = make_item(3, RoleSpec::Filter {
			operation: FilterOperation::Gt,
			values: vec!["10".to_string()],
		}, None);
		measure_filter.field_type = FieldType::Measure;
		Legend::new(vec![
			make_item(0, RoleSpec::Row, None),
			make_item(1, RoleSpec::Measure, Some(0)),
			make_item(2, RoleSpec::Total, Some(1)),
			measure_filter,
		])
	}

	#[test]
	fn test_limit_to_block() {
		let legend = make_legend();
		assert_eq!(legend.limit_to_block(0).legend_item_ids(), vec![0, 1, 3]);
		assert_eq!(legend.limit_to_block(1).legend_item_ids(), vec![0, 2, 3]);
		assert_eq!(legend.limit_to_block(7).legend_item_ids(), vec![0, 3]);
	}

	#[test]
	fn test_streamable_and_filters() {
		let legend = make_legend();
		let streamable: Vec<_> = legend.list_streamable_items().iter().map(|item| item.legend_item_id).collect();
		assert_eq!(streamable, vec![0, 1, 2]);
		assert_eq!(legend.measure_filters().len(), 1);
		assert_eq!(legend.list_for_role(FieldRole::Total).len(), 1);
	}

	#[test]
	fn test_get_item() {
		let legend = make_legend();
		assert_eq!(legend.get_item(2).unwrap().role(), FieldRole::Total);
		assert_eq!(legend.get_item(42).unwrap_err().code, "LEGEND_009");
	}
}
