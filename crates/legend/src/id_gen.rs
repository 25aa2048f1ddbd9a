// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::collections::BTreeSet;

/// Hands out the smallest non-negative ids not taken yet.
#[derive(Debug, Default)]
pub(crate) struct IdGenerator {
	used: BTreeSet<u32>,
	next: u32,
}

impl IdGenerator {
	pub(crate) fn new(used: impl IntoIterator<Item = u32>) -> Self {
		Self {
			used: used.into_iter().collect(),
			next: 0,
		}
	}

	pub(crate) fn generate(&mut self) -> u32 {
		while self.used.contains(&self.next) {
			self.next += 1;
		}
		let id = self.next;
		self.used.insert(id);
		id
	}

	pub(crate) fn used(&self) -> &BTreeSet<u32> {
		&self.used
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_fills_gaps() {
		let mut id_gen = IdGenerator::new([0, 2, 3]);
		assert_eq!(id_gen.generate(), 1);
		assert_eq!(id_gen.generate(), 4);
		assert_eq!(id_gen.used().len(), 5);
	}
}
