// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Subscriber setup for applications and tests embedding the compiler.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_DIRECTIVES: &str = "lodestar=info";

/// Builder for the global `tracing` subscriber. `RUST_LOG` overrides the configured directives.
pub struct TracingBuilder {
	directives: String,
	json: bool,
	with_target: bool,
}

impl TracingBuilder {
	pub fn new() -> Self {
		Self {
			directives: DEFAULT_DIRECTIVES.to_string(),
			json: false,
			with_target: true,
		}
	}

	pub fn with_directives(mut self, directives: impl Into<String>) -> Self {
		self.directives = directives.into();
		self
	}

	/// One JSON object per event
	pub fn json(mut self, json: bool) -> Self {
		self.json = json;
		self
	}

	pub fn with_target(mut self, with_target: bool) -> Self {
		self.with_target = with_target;
		self
	}

	pub fn env_filter(&self) -> EnvFilter {
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.directives))
	}

	/// Installs the subscriber. Returns `false` when a global subscriber was already set, which
	/// makes repeated calls from tests harmless.
	pub fn try_init(self) -> bool {
		let builder = tracing_subscriber::fmt().with_env_filter(self.env_filter()).with_target(self.with_target);
		if self.json {
			builder.json().try_init().is_ok()
		} else {
			builder.try_init().is_ok()
		}
	}
}

impl Default for TracingBuilder {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_repeated_init_is_harmless() {
		TracingBuilder::new().try_init();
		assert!(!TracingBuilder::new().json(true).try_init());
	}
}
