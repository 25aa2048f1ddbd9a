// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::Arc;

use lodestar_formula::mutation::LookupRegistry;
use lodestar_query::DEFAULT_SOURCE_ROW_LIMIT;
use serde::Deserialize;

/// Settings of a [`Compiler`](crate::Compiler). Immutable once built.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
	/// Row cap of sub-queries below the user-facing level
	pub source_row_limit: u64,
	/// Lookup functions may be lowered in queries without dimensions
	pub allow_empty_dimensions: bool,
	/// Report every diagnostic of a formula instead of the first one
	pub collect_errors: bool,
	/// Add info items for fields referenced by a legend but not requested
	pub autofill_legend: bool,
	#[serde(skip)]
	pub lookup_registry: Arc<LookupRegistry>,
}

impl Default for CompilerConfig {
	fn default() -> Self {
		Self {
			source_row_limit: DEFAULT_SOURCE_ROW_LIMIT,
			allow_empty_dimensions: false,
			collect_errors: false,
			autofill_legend: false,
			lookup_registry: Arc::new(LookupRegistry::default()),
		}
	}
}

impl CompilerConfig {
	pub fn builder() -> CompilerConfigBuilder {
		CompilerConfigBuilder::new()
	}
}

pub struct CompilerConfigBuilder {
	config: CompilerConfig,
}

impl CompilerConfigBuilder {
	pub fn new() -> Self {
		Self {
			config: CompilerConfig::default(),
		}
	}

	pub fn source_row_limit(mut self, limit: u64) -> Self {
		self.config.source_row_limit = limit;
		self
	}

	pub fn allow_empty_dimensions(mut self, allow: bool) -> Self {
		self.config.allow_empty_dimensions = allow;
		self
	}

	pub fn collect_errors(mut self, collect: bool) -> Self {
		self.config.collect_errors = collect;
		self
	}

	pub fn autofill_legend(mut self, autofill: bool) -> Self {
		self.config.autofill_legend = autofill;
		self
	}

	pub fn lookup_registry(mut self, registry: Arc<LookupRegistry>) -> Self {
		self.config.lookup_registry = registry;
		self
	}

	pub fn build(self) -> CompilerConfig {
		self.config
	}
}

impl Default for CompilerConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults() {
		let config = CompilerConfig::default();

		assert_eq!(config.source_row_limit, 1_000_000);
		assert!(!config.allow_empty_dimensions);
		assert!(!config.collect_errors);
		assert!(config.lookup_registry.contains("ago"));
		assert!(config.lookup_registry.contains("at_date"));
	}

	#[test]
	fn test_builder() {
		let config = CompilerConfig::builder()
			.source_row_limit(10)
			.collect_errors(true)
			.allow_empty_dimensions(true)
			.lookup_registry(Arc::new(LookupRegistry::empty()))
			.build();

		assert_eq!(config.source_row_limit, 10);
		assert!(config.collect_errors);
		assert!(config.allow_empty_dimensions);
		assert!(config.lookup_registry.names().is_empty());
	}

	#[test]
	fn test_debug_lists_lookup_functions() {
		let rendered = format!("{:?}", CompilerConfig::default());
		assert!(rendered.contains("functions"));
		assert!(rendered.contains("ago"));
	}
}
