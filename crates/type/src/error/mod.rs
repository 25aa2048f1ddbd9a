// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	fmt::{Display, Formatter},
	ops::{Deref, DerefMut},
};

pub mod diagnostic;
mod r#macro;

pub use diagnostic::{Diagnostic, render::DefaultRenderer};

pub type Result<T> = std::result::Result<T, Error>;

/// Domain errors turn themselves into a [`Diagnostic`] carrying a stable code.
pub trait IntoDiagnostic {
	fn into_diagnostic(self) -> Diagnostic;
}

impl IntoDiagnostic for Diagnostic {
	fn into_diagnostic(self) -> Diagnostic {
		self
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct Error(pub Diagnostic);

impl Deref for Error {
	type Target = Diagnostic;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

impl DerefMut for Error {
	fn deref_mut(&mut self) -> &mut Self::Target {
		&mut self.0
	}
}

impl Display for Error {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		let out = DefaultRenderer::render_string(&self.0);
		f.write_str(out.as_str())
	}
}

impl Error {
	pub fn diagnostic(self) -> Diagnostic {
		self.0
	}

	/// Flattens an aggregated error into the individual diagnostics it was built from.
	pub fn diagnostics(&self) -> Vec<&Diagnostic> {
		if self.0.related.is_empty() {
			vec![&self.0]
		} else {
			self.0.related.iter().collect()
		}
	}

	/// Builds one error out of many. A single diagnostic is returned as is.
	pub fn aggregate(mut diagnostics: Vec<Diagnostic>) -> Option<Error> {
		match diagnostics.len() {
			0 => None,
			1 => diagnostics.pop().map(Error),
			_ => Some(Error(diagnostic::validation::aggregated(diagnostics))),
		}
	}
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::fragment::Fragment;

	fn make_diagnostic(code: &str) -> Diagnostic {
		Diagnostic {
			code: code.to_string(),
			message: format!("failure {}", code),
			fragment: Fragment::statement("[Region]", 1, 3),
			..Diagnostic::default()
		}
	}

	#[test]
	fn test_aggregate_empty() {
		assert!(Error::aggregate(vec![]).is_none());
	}

	#[test]
	fn test_aggregate_single_is_unwrapped() {
		let err = Error::aggregate(vec![make_diagnostic("AGGREGATION_001")]).unwrap();
		assert_eq!(err.code, "AGGREGATION_001");
		assert_eq!(err.diagnostics().len(), 1);
	}

	#[test]
	fn test_aggregate_many() {
		let err = Error::aggregate(vec![make_diagnostic("AGGREGATION_001"), make_diagnostic("AGGREGATION_002")])
			.unwrap();
		assert_eq!(err.code, "VALIDATION_001");
		let codes: Vec<_> = err.diagnostics().iter().map(|d| d.code.as_str()).collect();
		assert_eq!(codes, vec!["AGGREGATION_001", "AGGREGATION_002"]);
	}

	#[test]
	fn test_display_renders_code_and_message() {
		let err = Error(make_diagnostic("LOOKUP_001"));
		let rendered = err.to_string();
		assert!(rendered.contains("error[LOOKUP_001]"));
		assert!(rendered.contains("failure LOOKUP_001"));
	}
}
