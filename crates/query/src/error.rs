// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use lodestar_type::error::{Diagnostic, Error, IntoDiagnostic};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
	#[error("Query {query_id} has no execution levels")]
	EmptyLevelPlan {
		query_id: String,
	},

	#[error("Formula {alias} is sliced into {formula_levels} levels, query {query_id} only has {query_levels}")]
	LevelCountMismatch {
		query_id: String,
		alias: String,
		formula_levels: usize,
		query_levels: usize,
	},

	#[error("Formula slice without pieces in query {query_id}")]
	EmptyFormulaSlice {
		query_id: String,
	},
}

impl QueryError {
	pub fn code(&self) -> &'static str {
		match self {
			QueryError::EmptyLevelPlan {
				..
			} => "QUERY_001",
			QueryError::LevelCountMismatch {
				..
			} => "QUERY_002",
			QueryError::EmptyFormulaSlice {
				..
			} => "QUERY_003",
		}
	}
}

impl IntoDiagnostic for QueryError {
	fn into_diagnostic(self) -> Diagnostic {
		let help = match &self {
			QueryError::LevelCountMismatch {
				..
			} => Some("Every formula must be sliced into at most as many levels as its query".to_string()),
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

impl From<QueryError> for Error {
	fn from(err: QueryError) -> Self {
		Error(err.into_diagnostic())
	}
}
