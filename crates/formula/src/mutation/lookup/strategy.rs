// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::ops::RangeInclusive;

use crate::{
	build::func,
	node::{BfbFilterMutation, JoinCondition, Literal, Node},
};

/// Lowering of one lookup function into the parts of a query fork.
///
/// Every method except [`LookupStrategy::arity`] is only called with argument lists whose length
/// is within the declared arity.
pub trait LookupStrategy: Send + Sync {
	/// Lower-case function name the strategy is registered under.
	fn name(&self) -> &'static str;

	fn arity(&self) -> RangeInclusive<usize>;

	fn result_expr(&self, args: &[Node]) -> Node {
		args[0].clone()
	}

	fn lookup_dimension(&self, args: &[Node]) -> Node {
		args[1].clone()
	}

	/// Conditions binding the lookup dimension of the outer query to the fork.
	fn join_conditions(&self, args: &[Node]) -> Vec<JoinCondition>;

	fn bfb_filter_mutations(&self, _args: &[Node]) -> Vec<BfbFilterMutation> {
		Vec::new()
	}
}

const MONTH_BASED_UNITS: [&str; 3] = ["month", "year", "quarter"];

/// `AGO(measure, dimension [, unit] [, number])`
pub struct AgoStrategy;

impl AgoStrategy {
	fn shifted_dimension(&self, args: &[Node]) -> Node {
		let mut shift_args = vec![self.lookup_dimension(args)];
		shift_args.extend(args[2..].iter().cloned());
		func("dateadd", shift_args)
	}

	fn unit(args: &[Node]) -> String {
		args[2..]
			.iter()
			.find_map(|arg| arg.as_literal().and_then(Literal::as_str))
			.map(str::to_lowercase)
			.unwrap_or_else(|| "day".to_string())
	}
}

impl LookupStrategy for AgoStrategy {
	fn name(&self) -> &'static str {
		"ago"
	}

	fn arity(&self) -> RangeInclusive<usize> {
		2..=4
	}

	fn join_conditions(&self, args: &[Node]) -> Vec<JoinCondition> {
		let dimension = self.lookup_dimension(args);
		let mut conditions = vec![JoinCondition::Binary {
			expr: dimension.clone(),
			fork_expr: self.shifted_dimension(args),
		}];

		// month lengths differ, so the day of month has to match as well
		if args.len() > 2 && MONTH_BASED_UNITS.contains(&Self::unit(args).as_str()) {
			conditions.push(JoinCondition::Binary {
				expr: func("day", vec![dimension.clone()]),
				fork_expr: func("day", vec![dimension]),
			});
		}
		conditions
	}

	fn bfb_filter_mutations(&self, args: &[Node]) -> Vec<BfbFilterMutation> {
		vec![BfbFilterMutation {
			original: self.lookup_dimension(args),
			replacement: self.shifted_dimension(args),
		}]
	}
}

/// `AT_DATE(measure, dimension, date)`
pub struct AtDateStrategy;

impl LookupStrategy for AtDateStrategy {
	fn name(&self) -> &'static str {
		"at_date"
	}

	fn arity(&self) -> RangeInclusive<usize> {
		3..=3
	}

	fn join_conditions(&self, args: &[Node]) -> Vec<JoinCondition> {
		vec![JoinCondition::Binary {
			expr: args[2].clone(),
			fork_expr: self.lookup_dimension(args),
		}]
	}
}
