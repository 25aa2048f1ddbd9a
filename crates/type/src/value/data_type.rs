// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// User-facing data type of a legend item or formula result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
	Boolean,
	Integer,
	Float,
	String,
	Date,
	Datetime,
	Uuid,
	Markup,
	/// Path-encoded string usable as a tree hierarchy
	#[serde(rename = "tree_str")]
	TreeString,
	Unsupported,
}

impl DataType {
	pub fn is_temporal(&self) -> bool {
		matches!(self, DataType::Date | DataType::Datetime)
	}

	pub fn is_numeric(&self) -> bool {
		matches!(self, DataType::Integer | DataType::Float)
	}

	pub fn supports_tree(&self) -> bool {
		matches!(self, DataType::TreeString)
	}
}

impl Display for DataType {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			DataType::Boolean => f.write_str("boolean"),
			DataType::Integer => f.write_str("integer"),
			DataType::Float => f.write_str("float"),
			DataType::String => f.write_str("string"),
			DataType::Date => f.write_str("date"),
			DataType::Datetime => f.write_str("datetime"),
			DataType::Uuid => f.write_str("uuid"),
			DataType::Markup => f.write_str("markup"),
			DataType::TreeString => f.write_str("tree_str"),
			DataType::Unsupported => f.write_str("unsupported"),
		}
	}
}
