// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	collections::HashMap,
	fmt::{Debug, Formatter},
	sync::Arc,
};

use crate::mutation::lookup::{AgoStrategy, AtDateStrategy, LookupStrategy};

/// Lookup functions known to the compiler, keyed by lower-case name.
///
/// Built once and shared read-only afterwards.
#[derive(Clone)]
pub struct LookupRegistry {
	strategies: HashMap<&'static str, Arc<dyn LookupStrategy>>,
}

impl LookupRegistry {
	pub fn builder() -> LookupRegistryBuilder {
		LookupRegistryBuilder {
			strategies: HashMap::new(),
		}
	}

	pub fn empty() -> Self {
		Self::builder().build()
	}

	pub fn get(&self, name: &str) -> Option<&dyn LookupStrategy> {
		self.strategies.get(name.to_lowercase().as_str()).map(|s| s.as_ref())
	}

	pub fn contains(&self, name: &str) -> bool {
		self.get(name).is_some()
	}

	pub fn names(&self) -> Vec<&'static str> {
		let mut names: Vec<_> = self.strategies.keys().copied().collect();
		names.sort_unstable();
		names
	}
}

impl Default for LookupRegistry {
	fn default() -> Self {
		Self::builder().register(AgoStrategy).register(AtDateStrategy).build()
	}
}

impl Debug for LookupRegistry {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("LookupRegistry").field("functions", &self.names()).finish()
	}
}

pub struct LookupRegistryBuilder {
	strategies: HashMap<&'static str, Arc<dyn LookupStrategy>>,
}

impl LookupRegistryBuilder {
	pub fn register<S: LookupStrategy + 'static>(mut self, strategy: S) -> Self {
		self.strategies.insert(strategy.name(), Arc::new(strategy));
		self
	}

	pub fn build(self) -> LookupRegistry {
		LookupRegistry {
			strategies: self.strategies,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_registry() {
		let registry = LookupRegistry::default();
		assert_eq!(registry.names(), vec!["ago", "at_date"]);
		assert!(registry.contains("AGO"));
		assert!(!registry.contains("sum"));
	}

	#[test]
	fn test_empty_registry() {
		assert!(LookupRegistry::empty().get("ago").is_none());
	}
}
