// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Compiler invariant violations.
//!
//! These are raised when one compilation stage hands another a plan it should never have
//! produced: a missing alias, a duplicate query id, a level without queries. Nothing in the
//! user's formula can fix them, so the diagnostic points at the compiler rather than at a
//! fragment of the input.

use crate::{error::diagnostic::Diagnostic, fragment::Fragment};

pub const INTERNAL_ERROR_CODE: &str = "INTERNAL_ERROR";

/// Compilation stage of a module path: `lodestar_query::separator` is the `query separator`.
fn stage_of(module_path: &str) -> String {
	let mut segments = module_path.split("::");
	let krate = segments.next().unwrap_or(module_path);
	let krate = krate.strip_prefix("lodestar_").unwrap_or(krate);
	let rest: Vec<&str> = segments.filter(|segment| *segment != "tests").collect();
	if rest.is_empty() {
		krate.to_string()
	} else {
		format!("{} {}", krate, rest.join(" "))
	}
}

/// Diagnostic for a violated invariant at `file:line` of `module_path`.
pub fn invariant_violation(reason: String, file: &str, line: u32, module_path: &str) -> Diagnostic {
	let stage = stage_of(module_path);
	Diagnostic {
		code: INTERNAL_ERROR_CODE.to_string(),
		message: format!("Internal compiler error in {}: {}", stage, reason),
		fragment: Fragment::None,
		label: Some(format!("invariant violated at {}:{}", file, line)),
		help: Some(format!(
			"The {} stage received an inconsistent plan. Report it together with the request that \
			 triggered it (lodestar {}).",
			stage,
			env!("CARGO_PKG_VERSION")
		)),
		notes: vec![format!("raised in {}", module_path)],
		..Default::default()
	}
}

/// Builds an invariant violation [`Diagnostic`] from a format string.
#[macro_export]
macro_rules! internal_error {
	($($arg:tt)+) => {
		$crate::error::diagnostic::internal::invariant_violation(format!($($arg)+), file!(), line!(), module_path!())
	};
}

/// `Err` of an invariant violation.
#[macro_export]
macro_rules! internal_err {
	($($arg:tt)+) => {
		Err($crate::error::Error($crate::internal_error!($($arg)+)))
	};
}

/// Returns an invariant violation from the enclosing function.
#[macro_export]
macro_rules! return_internal_error {
	($($arg:tt)+) => {
		return $crate::internal_err!($($arg)+)
	};
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::Error;

	#[test]
	fn test_stage_of() {
		assert_eq!(stage_of("lodestar_query::separator"), "query separator");
		assert_eq!(stage_of("lodestar_query::multi_query::tests"), "query multi_query");
		assert_eq!(stage_of("lodestar_type"), "type");
	}

	#[test]
	fn test_internal_error_names_stage_and_location() {
		let diagnostic = internal_error!("query id {} is used more than once", "qq_0_0_1");

		assert_eq!(diagnostic.code, INTERNAL_ERROR_CODE);
		assert_eq!(
			diagnostic.message,
			"Internal compiler error in type error diagnostic internal: query id qq_0_0_1 is used more than once"
		);
		assert!(diagnostic.label.as_ref().unwrap().starts_with("invariant violated at "));
		assert!(diagnostic.label.as_ref().unwrap().contains("internal.rs:"));
		assert_eq!(diagnostic.notes, vec!["raised in lodestar_type::error::diagnostic::internal::tests".to_string()]);
		assert_eq!(diagnostic.fragment, Fragment::None);
	}

	#[test]
	fn test_return_internal_error() {
		fn first_level(levels: &[u32]) -> crate::Result<u32> {
			match levels.first() {
				Some(level) => Ok(*level),
				None => return_internal_error!("multi-level query has no levels"),
			}
		}

		let err: Error = first_level(&[]).unwrap_err();
		assert_eq!(err.code, INTERNAL_ERROR_CODE);
		assert!(err.message.ends_with("multi-level query has no levels"));
		assert_eq!(first_level(&[3]).unwrap(), 3);
	}
}
