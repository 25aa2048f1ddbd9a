// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::collections::HashSet;

use once_cell::sync::Lazy;

static AGGREGATE_FUNCTIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
	[
		"sum", "avg", "min", "max", "count", "countd", "countd_approx", "sum_if", "avg_if", "count_if", "countd_if",
		"median", "quantile", "quantile_approx", "stdev", "stdevp", "var", "varp", "any", "arg_min", "arg_max",
		"all_concat", "top_concat",
	]
	.into_iter()
	.collect()
});

static WINDOW_FUNCTIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
	[
		"rank", "rank_dense", "rank_unique", "rank_percentile", "msum", "mcount", "mmin", "mmax", "mavg", "rsum",
		"rcount", "rmin", "rmax", "ravg", "lag", "first", "last", "sum", "count", "min", "max", "avg",
	]
	.into_iter()
	.collect()
});

/// Regular (non-window) aggregate function.
pub fn is_aggregate_function(name: &str) -> bool {
	AGGREGATE_FUNCTIONS.contains(name.to_lowercase().as_str())
}

pub fn is_window_function(name: &str) -> bool {
	WINDOW_FUNCTIONS.contains(name.to_lowercase().as_str())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_aggregate_names() {
		assert!(is_aggregate_function("sum"));
		assert!(is_aggregate_function("COUNTD"));
		assert!(!is_aggregate_function("rank"));
		assert!(!is_aggregate_function("dateadd"));
	}

	#[test]
	fn test_window_names() {
		assert!(is_window_function("rank"));
		assert!(is_window_function("RSUM"));
		assert!(!is_window_function("dateadd"));
	}
}
