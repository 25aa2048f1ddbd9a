// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use lodestar_type::{
	error::{Diagnostic, Error, IntoDiagnostic},
	fragment::Fragment,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash, thiserror::Error)]
pub enum FormulaError {
	#[error("Invalid number of arguments for function {function}: {count}")]
	LookupFunctionArgNumber {
		function: String,
		count: usize,
		fragment: Fragment,
	},

	#[error("First argument of {function} must be an aggregate expression")]
	LookupFunctionWithoutAggregation {
		function: String,
		fragment: Fragment,
	},

	#[error("Lookup dimension of {function} must not be aggregated")]
	LookupFunctionAggregatedDimension {
		function: String,
		fragment: Fragment,
	},

	#[error("Lookup dimension {dimension} of {function} is listed in IGNORE DIMENSIONS")]
	LookupFunctionIgnoredLookupDimension {
		function: String,
		dimension: String,
		fragment: Fragment,
	},

	#[error("Lookup dimension of {function} is a constant")]
	LookupFunctionConstantLookupDimension {
		function: String,
		fragment: Fragment,
	},

	#[error("Lookup dimension {dimension} of {function} is not among the query dimensions")]
	LookupFunctionUnselectedDimension {
		function: String,
		dimension: String,
		fragment: Fragment,
	},

	#[error("Double aggregation in {expression}")]
	DoubleAggregation {
		expression: String,
		fragment: Fragment,
	},

	#[error("Inconsistent aggregation: {expression} is not aggregated")]
	InconsistentAggregation {
		expression: String,
		fragment: Fragment,
	},
}

impl FormulaError {
	pub fn code(&self) -> &'static str {
		match self {
			FormulaError::LookupFunctionArgNumber {
				..
			} => "LOOKUP_001",
			FormulaError::LookupFunctionWithoutAggregation {
				..
			} => "LOOKUP_002",
			FormulaError::LookupFunctionAggregatedDimension {
				..
			} => "LOOKUP_003",
			FormulaError::LookupFunctionIgnoredLookupDimension {
				..
			} => "LOOKUP_004",
			FormulaError::LookupFunctionConstantLookupDimension {
				..
			} => "LOOKUP_005",
			FormulaError::LookupFunctionUnselectedDimension {
				..
			} => "LOOKUP_006",
			FormulaError::DoubleAggregation {
				..
			} => "AGGREGATION_001",
			FormulaError::InconsistentAggregation {
				..
			} => "AGGREGATION_002",
		}
	}

	pub fn fragment(&self) -> &Fragment {
		match self {
			FormulaError::LookupFunctionArgNumber {
				fragment,
				..
			}
			| FormulaError::LookupFunctionWithoutAggregation {
				fragment,
				..
			}
			| FormulaError::LookupFunctionAggregatedDimension {
				fragment,
				..
			}
			| FormulaError::LookupFunctionIgnoredLookupDimension {
				fragment,
				..
			}
			| FormulaError::LookupFunctionConstantLookupDimension {
				fragment,
				..
			}
			| FormulaError::LookupFunctionUnselectedDimension {
				fragment,
				..
			}
			| FormulaError::DoubleAggregation {
				fragment,
				..
			}
			| FormulaError::InconsistentAggregation {
				fragment,
				..
			} => fragment,
		}
	}
}

impl IntoDiagnostic for FormulaError {
	fn into_diagnostic(self) -> Diagnostic {
		let code = self.code().to_string();
		let message = self.to_string();
		match self {
			FormulaError::LookupFunctionArgNumber {
				function,
				fragment,
				..
			} => Diagnostic {
				code,
				statement: None,
				message,
				fragment,
				label: Some("wrong number of arguments".to_string()),
				help: Some(format!(
					"{} expects an aggregated measure, a date dimension and optional shift arguments",
					function.to_uppercase()
				)),
				notes: vec![],
				cause: None,
				related: vec![],
			},

			FormulaError::LookupFunctionWithoutAggregation {
				function,
				fragment,
			} => Diagnostic {
				code,
				statement: None,
				message,
				fragment,
				label: Some("expression is not aggregated".to_string()),
				help: Some(format!("Wrap the first argument of {} in an aggregate function, e.g. SUM", function.to_uppercase())),
				notes: vec!["Lookup functions shift an aggregated value along a dimension".to_string()],
				cause: None,
				related: vec![],
			},

			FormulaError::LookupFunctionAggregatedDimension {
				fragment,
				..
			} => Diagnostic {
				code,
				statement: None,
				message,
				fragment,
				label: Some("aggregated lookup dimension".to_string()),
				help: Some("Use a plain dimension as the lookup dimension".to_string()),
				notes: vec![],
				cause: None,
				related: vec![],
			},

			FormulaError::LookupFunctionIgnoredLookupDimension {
				fragment,
				..
			} => Diagnostic {
				code,
				statement: None,
				message,
				fragment,
				label: Some("dimension is ignored".to_string()),
				help: Some("Remove the lookup dimension from IGNORE DIMENSIONS".to_string()),
				notes: vec![],
				cause: None,
				related: vec![],
			},

			FormulaError::LookupFunctionConstantLookupDimension {
				fragment,
				..
			} => Diagnostic {
				code,
				statement: None,
				message,
				fragment,
				label: Some("constant lookup dimension".to_string()),
				help: Some("The lookup dimension must reference at least one field".to_string()),
				notes: vec![],
				cause: None,
				related: vec![],
			},

			FormulaError::LookupFunctionUnselectedDimension {
				fragment,
				..
			} => Diagnostic {
				code,
				statement: None,
				message,
				fragment,
				label: Some("dimension is missing from the query".to_string()),
				help: Some("Add the lookup dimension to the chart dimensions".to_string()),
				notes: vec![],
				cause: None,
				related: vec![],
			},

			FormulaError::DoubleAggregation {
				fragment,
				..
			} => Diagnostic {
				code,
				statement: None,
				message,
				fragment,
				label: Some("aggregate function applied to an aggregated value".to_string()),
				help: Some("Remove one of the nested aggregations or use a window function instead".to_string()),
				notes: vec![],
				cause: None,
				related: vec![],
			},

			FormulaError::InconsistentAggregation {
				fragment,
				..
			} => Diagnostic {
				code,
				statement: None,
				message,
				fragment,
				label: Some("not aggregated".to_string()),
				help: Some("Aggregate this operand or use one of the query dimensions".to_string()),
				notes: vec!["Aggregated and non-aggregated operands cannot be mixed".to_string()],
				cause: None,
				related: vec![],
			},
		}
	}
}

impl From<FormulaError> for Error {
	fn from(err: FormulaError) -> Self {
		Error(err.into_diagnostic())
	}
}

/// Turns a batch of formula errors into a single error, `None` when the batch is empty.
pub fn into_error(errors: Vec<FormulaError>) -> Option<Error> {
	Error::aggregate(errors.into_iter().map(IntoDiagnostic::into_diagnostic).collect())
}
