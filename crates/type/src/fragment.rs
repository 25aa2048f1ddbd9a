// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	fmt::{Display, Formatter},
	ops::Deref,
	sync::Arc,
};

use serde::{Deserialize, Serialize};

#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StatementColumn(pub u32);

impl Deref for StatementColumn {
	type Target = u32;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StatementLine(pub u32);

impl Deref for StatementLine {
	type Target = u32;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

/// Location of a piece of formula text.
///
/// Fragments travel with formula nodes through every rewrite so that a diagnostic raised deep
/// inside a lowered tree still points at the text the user wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Fragment {
	/// No position information available
	#[default]
	None,

	/// Text taken from a user formula with its position
	Statement {
		text: Arc<str>,
		line: StatementLine,
		column: StatementColumn,
	},

	/// Text produced by the compiler itself
	Internal {
		text: Arc<str>,
	},
}

impl Fragment {
	pub fn statement(text: impl Into<Arc<str>>, line: u32, column: u32) -> Self {
		Fragment::Statement {
			text: text.into(),
			line: StatementLine(line),
			column: StatementColumn(column),
		}
	}

	pub fn internal(text: impl Into<Arc<str>>) -> Self {
		Fragment::Internal {
			text: text.into(),
		}
	}

	pub fn text(&self) -> &str {
		match self {
			Fragment::None => "",
			Fragment::Statement {
				text,
				..
			}
			| Fragment::Internal {
				text,
			} => text,
		}
	}

	pub fn line(&self) -> StatementLine {
		match self {
			Fragment::Statement {
				line,
				..
			} => *line,
			_ => StatementLine(1),
		}
	}

	pub fn column(&self) -> StatementColumn {
		match self {
			Fragment::Statement {
				column,
				..
			} => *column,
			_ => StatementColumn(0),
		}
	}

	pub fn is_none(&self) -> bool {
		matches!(self, Fragment::None)
	}

	/// Returns `self` unless it carries no position, in which case `other` is used.
	pub fn or(self, other: &Fragment) -> Fragment {
		match self {
			Fragment::None => other.clone(),
			fragment => fragment,
		}
	}
}

impl Display for Fragment {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.text())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_statement_position() {
		let fragment = Fragment::statement("SUM([Sales])", 2, 7);
		assert_eq!(fragment.text(), "SUM([Sales])");
		assert_eq!(*fragment.line(), 2);
		assert_eq!(*fragment.column(), 7);
	}

	#[test]
	fn test_none_defaults() {
		let fragment = Fragment::None;
		assert_eq!(fragment.text(), "");
		assert_eq!(*fragment.line(), 1);
		assert_eq!(*fragment.column(), 0);
	}

	#[test]
	fn test_or_prefers_position() {
		let positioned = Fragment::statement("[Date]", 1, 4);
		assert_eq!(Fragment::None.or(&positioned), positioned);
		assert_eq!(Fragment::internal("x").or(&positioned), Fragment::internal("x"));
	}
}
