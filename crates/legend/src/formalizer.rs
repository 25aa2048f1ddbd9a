// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::collections::HashSet;

use lodestar_type::{DataType, Result};
use tracing::{debug, instrument, trace};

use crate::{
	FieldRole, FieldType, FilterOperation, Legend, LegendItem, LegendItemId, ObjSpec, QueryType, RoleSpec,
	error::LegendError,
	id_gen::IdGenerator,
	raw::{FieldRef, RawItemSpec, RawQuerySpec, RawRoleSpec},
	source::{FieldInfo, FieldSource},
};

/// Turns the item specs of a raw request into a [`Legend`]: resolves field references, assigns
/// the missing legend item ids and derives the implicit items (tree filters, pivot name
/// dimensions, autofilled info fields).
pub struct LegendFormalizer<'a, S: FieldSource + ?Sized> {
	source: &'a S,
	autofill_legend: bool,
}

impl<'a, S: FieldSource + ?Sized> LegendFormalizer<'a, S> {
	pub fn new(source: &'a S) -> Self {
		Self {
			source,
			autofill_legend: false,
		}
	}

	/// Adds every dataset field missing from the request as an `info` item.
	pub fn with_autofill(mut self, autofill_legend: bool) -> Self {
		self.autofill_legend = autofill_legend;
		self
	}

	#[instrument(name = "legend::formalizer::make_legend", level = "trace", skip_all)]
	pub fn make_legend(&self, raw: &RawQuerySpec) -> Result<Legend> {
		let query_type = raw.meta.query_type;
		let used_ids = validate_explicit_ids(raw)?;
		let mut id_gen = IdGenerator::new(used_ids);
		let items = self.generate_items(raw, &mut id_gen)?;
		let mut legend = Legend::new(items);
		self.patch_legend(&mut legend, query_type, &mut id_gen)?;
		validate_legend(&legend, query_type)?;
		debug!(items = legend.len(), query_type = %query_type, "formalized legend");
		Ok(legend)
	}

	fn resolve_field(&self, field_ref: &FieldRef) -> Option<&FieldInfo> {
		match field_ref {
			FieldRef::Id {
				id,
			} => self.source.by_id(id),
			FieldRef::Title {
				title,
			} => self.source.by_title(title),
			_ => None,
		}
	}

	fn generate_items(&self, raw: &RawQuerySpec, id_gen: &mut IdGenerator) -> Result<Vec<LegendItem>> {
		let query_type = raw.meta.query_type;
		let mut items = Vec::new();
		let mut selected_field_ids = HashSet::new();

		for spec in raw.iter_item_specs() {
			if let RawItemSpec::GroupBy(group_by) = spec {
				// grouping by a selected field adds nothing
				if let Some(field) = self.resolve_field(&group_by.field_ref) {
					if selected_field_ids.contains(&field.id) {
						trace!(field = %field.id, "skipped group by of a selected field");
						continue;
					}
				}
			}

			let legend_item_id = match spec.legend_item_id() {
				Some(id) => id,
				None => id_gen.generate(),
			};
			let Some(item) = self.resolve_item(legend_item_id, spec, raw.ignore_nonexistent_filters)? else {
				continue;
			};

			validate_item(&item, query_type)?;
			if item.role().is_selectable() {
				if let Some(id) = item.field_id() {
					selected_field_ids.insert(id.to_string());
				}
			}
			items.push(item);
		}
		Ok(items)
	}

	fn resolve_item(
		&self,
		legend_item_id: LegendItemId,
		spec: RawItemSpec<'_>,
		ignore_nonexistent_filters: bool,
	) -> Result<Option<LegendItem>> {
		let role_spec = resolve_role_spec(spec)?;
		let (obj, data_type, field_type) = match spec.field_ref() {
			FieldRef::MeasureName => (ObjSpec::MeasureName, DataType::String, FieldType::Dimension),
			FieldRef::DimensionName => (ObjSpec::DimensionName, DataType::String, FieldType::Dimension),
			FieldRef::Placeholder => (ObjSpec::Placeholder, DataType::String, FieldType::Dimension),
			field_ref => match self.resolve_field(field_ref) {
				Some(field) => (
					ObjSpec::Field {
						id: field.id.clone(),
						title: field.title.clone(),
					},
					field.data_type,
					field.field_type,
				),
				None if role_spec.role() == FieldRole::Filter && ignore_nonexistent_filters => {
					trace!(reference = %field_ref, "ignored filter by a missing field");
					return Ok(None);
				}
				None => {
					return Err(LegendError::UnknownField {
						reference: field_ref.to_string(),
					}
					.into());
				}
			},
		};

		Ok(Some(LegendItem {
			legend_item_id,
			obj,
			role_spec,
			block_id: spec.block_id(),
			data_type,
			field_type,
		}))
	}

	fn patch_legend(&self, legend: &mut Legend, query_type: QueryType, id_gen: &mut IdGenerator) -> Result<()> {
		generate_tree_filters(legend, id_gen)?;

		if self.autofill_legend {
			for field in self.source.fields() {
				if legend.iter().any(|item| item.field_id() == Some(field.id.as_str())) {
					continue;
				}
				legend.add_item(LegendItem {
					legend_item_id: id_gen.generate(),
					obj: ObjSpec::Field {
						id: field.id.clone(),
						title: field.title.clone(),
					},
					role_spec: RoleSpec::Info,
					block_id: None,
					data_type: field.data_type,
					field_type: field.field_type,
				});
			}
		}

		if query_type == QueryType::Pivot {
			// pivot tables always carry both name dimensions
			for obj in [ObjSpec::MeasureName, ObjSpec::DimensionName] {
				if !legend.contains_obj(&obj) {
					legend.add_item(LegendItem {
						legend_item_id: id_gen.generate(),
						obj,
						role_spec: RoleSpec::Info,
						block_id: None,
						data_type: DataType::String,
						field_type: FieldType::Dimension,
					});
				}
			}
		}
		Ok(())
	}
}

fn validate_explicit_ids(raw: &RawQuerySpec) -> Result<Vec<LegendItemId>> {
	let explicit: Vec<LegendItemId> = raw.iter_item_specs().filter_map(|spec| spec.legend_item_id()).collect();
	let mut seen = HashSet::new();
	let mut duplicates: Vec<LegendItemId> = explicit.iter().copied().filter(|id| !seen.insert(*id)).collect();
	if !duplicates.is_empty() {
		duplicates.sort_unstable();
		duplicates.dedup();
		return Err(LegendError::NonUniqueLegendIds {
			ids: duplicates,
		}
		.into());
	}
	Ok(explicit)
}

fn resolve_role_spec(spec: RawItemSpec<'_>) -> Result<RoleSpec> {
	let role_spec = match spec {
		RawItemSpec::Select(select) => match &select.role_spec {
			RawRoleSpec::Row => RoleSpec::Row,
			RawRoleSpec::Column => RoleSpec::Column,
			RawRoleSpec::Measure => RoleSpec::Measure,
			RawRoleSpec::Info => RoleSpec::Info,
			RawRoleSpec::Total => RoleSpec::Total,
			RawRoleSpec::Distinct => RoleSpec::Distinct,
			RawRoleSpec::Template {
				template,
			} => RoleSpec::Template {
				template: template.clone(),
			},
			RawRoleSpec::Tree {
				level,
				prefix,
				dimension_values,
			} => RoleSpec::Tree {
				level: *level,
				prefix: serde_json::from_str(prefix).map_err(|_| LegendError::InvalidTreePrefix {
					prefix: prefix.clone(),
				})?,
				dimension_values: dimension_values.clone(),
			},
			RawRoleSpec::Range {
				range_type,
			} => RoleSpec::Range {
				range_type: *range_type,
			},
		},
		RawItemSpec::GroupBy(_) => RoleSpec::Row,
		RawItemSpec::OrderBy(order_by) => RoleSpec::OrderBy {
			direction: order_by.direction,
		},
		RawItemSpec::Filter(filter) => RoleSpec::Filter {
			operation: filter.operation,
			values: filter.values.clone(),
		},
		RawItemSpec::Parameter(parameter) => RoleSpec::Parameter {
			value: parameter.value.clone(),
		},
	};
	Ok(role_spec)
}

fn validate_item(item: &LegendItem, query_type: QueryType) -> Result<()> {
	let role = item.role();
	if !query_type.supports_role(role) {
		return Err(LegendError::UnsupportedRole {
			role,
			query_type,
		}
		.into());
	}
	if matches!(item.obj, ObjSpec::MeasureName | ObjSpec::DimensionName) && !query_type.supports_measure_name() {
		return Err(LegendError::MeasureNameUnsupported {
			query_type,
		}
		.into());
	}
	if role == FieldRole::Tree && !item.data_type.supports_tree() {
		return Err(LegendError::RoleDataTypeMismatch {
			role,
			legend_item_id: item.legend_item_id,
		}
		.into());
	}
	if role == FieldRole::Filter && item.field_type == FieldType::Measure && !query_type.supports_measure_filters() {
		return Err(LegendError::MeasureFilterUnsupported {
			query_type,
		}
		.into());
	}
	Ok(())
}

fn validate_legend(legend: &Legend, query_type: QueryType) -> Result<()> {
	for item in legend {
		validate_item(item, query_type)?;
	}

	let (role, expected, valid): (FieldRole, &'static str, fn(usize) -> bool) = match query_type {
		QueryType::Distinct => (FieldRole::Distinct, "exactly one", |count| count == 1),
		QueryType::Range => (FieldRole::Range, "at most two", |count| count <= 2),
		_ => return Ok(()),
	};
	let count = legend.list_for_role(role).len();
	if !valid(count) {
		return Err(LegendError::InvalidRoleCount {
			role,
			query_type,
			expected,
			count,
		}
		.into());
	}
	Ok(())
}

/// Every tree item filters its own field by depth and prefix, and every dimension value it
/// locks becomes an equality filter, all within the tree's block.
fn generate_tree_filters(legend: &mut Legend, id_gen: &mut IdGenerator) -> Result<()> {
	let trees: Vec<LegendItem> = legend.list_for_role(FieldRole::Tree).into_iter().cloned().collect();
	for tree in trees {
		let RoleSpec::Tree {
			level,
			prefix,
			dimension_values,
		} = &tree.role_spec
		else {
			continue;
		};

		let mut filters = vec![(&tree, RoleSpec::Filter {
			operation: FilterOperation::LenLte,
			values: vec![level.to_string()],
		})];
		if !prefix.is_empty() {
			filters.push((&tree, RoleSpec::Filter {
				operation: FilterOperation::StartsWith,
				values: prefix.clone(),
			}));
		}

		let mut locked = Vec::new();
		for dimension_value in dimension_values {
			let item = legend.get_item(dimension_value.legend_item_id)?;
			if item.obj == tree.obj {
				continue;
			}
			locked.push((item.clone(), RoleSpec::Filter {
				operation: FilterOperation::Eq,
				values: vec![dimension_value.value.clone()],
			}));
		}

		let generated = filters
			.into_iter()
			.map(|(source, role_spec)| (source.clone(), role_spec))
			.chain(locked)
			.collect::<Vec<_>>();
		for (source, role_spec) in generated {
			legend.add_item(LegendItem {
				legend_item_id: id_gen.generate(),
				obj: source.obj,
				role_spec,
				block_id: tree.block_id,
				data_type: source.data_type,
				field_type: source.field_type,
			});
		}
	}
	Ok(())
}
