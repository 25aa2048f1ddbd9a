// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Semantic validation of lowered formula trees.

mod aggregation;

pub use aggregation::AggregationChecker;
use lodestar_type::Result;
use tracing::{debug, instrument};

use crate::{
	error::{FormulaError, into_error},
	node::Node,
};

/// A validation rule run over a whole tree. Checkers may keep state between runs, such as
/// caches of sub-tree results.
pub trait Checker {
	fn name(&self) -> &'static str;

	/// Every violation found in `tree`, innermost first.
	fn check(&mut self, tree: &Node) -> Vec<FormulaError>;
}

/// Runs `checkers` over `tree`.
///
/// With `collect_errors` every violation of every checker is returned together (as a single
/// aggregated error when there is more than one); otherwise the first violation found fails
/// the validation.
#[instrument(name = "formula::validation::validate", level = "trace", skip_all, fields(collect_errors = collect_errors))]
pub fn validate(tree: &Node, checkers: &mut [&mut dyn Checker], collect_errors: bool) -> Result<()> {
	let mut errors = Vec::new();
	for checker in checkers.iter_mut() {
		let found = checker.check(tree);
		debug!(checker = checker.name(), errors = found.len(), "checked formula");
		if !collect_errors {
			if let Some(first) = found.into_iter().next() {
				return Err(first.into());
			}
			continue;
		}
		errors.extend(found);
	}

	match into_error(errors) {
		Some(err) => Err(err),
		None => Ok(()),
	}
}

#[cfg(test)]
mod tests {
	use lodestar_type::Fragment;

	use super::*;
	use crate::build::{field, int};

	struct FieldNameChecker {
		runs: usize,
	}

	impl Checker for FieldNameChecker {
		fn name(&self) -> &'static str {
			"field_name"
		}

		fn check(&mut self, tree: &Node) -> Vec<FormulaError> {
			self.runs += 1;
			tree.iter()
				.filter_map(|node| node.field_name())
				.map(|name| FormulaError::InconsistentAggregation {
					expression: name.to_string(),
					fragment: Fragment::None,
				})
				.collect()
		}
	}

	#[test]
	fn test_valid_tree() {
		let mut checker = FieldNameChecker {
			runs: 0,
		};
		assert!(validate(&int(1), &mut [&mut checker], false).is_ok());
		assert_eq!(checker.runs, 1);
	}

	#[test]
	fn test_fail_fast_returns_first() {
		let tree = crate::build::add(field("a"), field("b"));
		let mut checker = FieldNameChecker {
			runs: 0,
		};
		let err = validate(&tree, &mut [&mut checker], false).unwrap_err();
		assert_eq!(err.code, "AGGREGATION_002");
		assert!(err.message.contains("a is not aggregated"));
		assert!(err.related.is_empty());
	}

	#[test]
	fn test_collect_aggregates_errors() {
		let tree = crate::build::add(field("a"), field("b"));
		let mut first = FieldNameChecker {
			runs: 0,
		};
		let mut second = FieldNameChecker {
			runs: 0,
		};
		let err = validate(&tree, &mut [&mut first, &mut second], true).unwrap_err();
		assert_eq!(err.code, "VALIDATION_001");
		assert_eq!(err.diagnostics().len(), 4);
		assert_eq!(second.runs, 1);
	}
}
