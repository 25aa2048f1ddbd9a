// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use lodestar_type::DataType;
use serde::{Deserialize, Serialize};

use crate::FieldType;

/// A field of the dataset a request is made against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldInfo {
	pub id: String,
	pub title: String,
	pub data_type: DataType,
	pub field_type: FieldType,
}

/// Resolves field references of a raw request.
pub trait FieldSource {
	fn by_id(&self, id: &str) -> Option<&FieldInfo>;

	fn by_title(&self, title: &str) -> Option<&FieldInfo>;

	/// Every field in schema order.
	fn fields(&self) -> Vec<&FieldInfo>;
}

impl FieldSource for [FieldInfo] {
	fn by_id(&self, id: &str) -> Option<&FieldInfo> {
		self.iter().find(|field| field.id == id)
	}

	fn by_title(&self, title: &str) -> Option<&FieldInfo> {
		self.iter().find(|field| field.title == title)
	}

	fn fields(&self) -> Vec<&FieldInfo> {
		self.iter().collect()
	}
}

impl FieldSource for Vec<FieldInfo> {
	fn by_id(&self, id: &str) -> Option<&FieldInfo> {
		self.as_slice().by_id(id)
	}

	fn by_title(&self, title: &str) -> Option<&FieldInfo> {
		self.as_slice().by_title(title)
	}

	fn fields(&self) -> Vec<&FieldInfo> {
		self.as_slice().fields()
	}
}
