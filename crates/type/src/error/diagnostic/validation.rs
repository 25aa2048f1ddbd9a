// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use crate::{error::diagnostic::Diagnostic, fragment::Fragment};

/// Folds several independent diagnostics into one reported failure.
pub fn aggregated(errors: Vec<Diagnostic>) -> Diagnostic {
	let mut codes: Vec<&str> = errors.iter().map(|d| d.code.as_str()).collect();
	codes.sort_unstable();
	codes.dedup();
	let notes = vec![format!("Error codes: {}", codes.join(", "))];

	Diagnostic {
		code: "VALIDATION_001".to_string(),
		statement: None,
		message: format!("Formula validation failed with {} errors", errors.len()),
		fragment: Fragment::None,
		label: None,
		help: Some("Fix each of the reported problems and validate again".to_string()),
		notes,
		cause: None,
		related: errors,
	}
}
