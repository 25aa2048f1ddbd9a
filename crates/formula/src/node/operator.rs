// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
	Add,
	Sub,
	Mul,
	Div,
	Mod,
	Pow,
	Equal,
	NotEqual,
	/// `_==`, null-safe equality
	NullSafeEqual,
	/// `_!=`, null-safe inequality
	NullSafeNotEqual,
	LessThan,
	LessThanEqual,
	GreaterThan,
	GreaterThanEqual,
	And,
	Or,
	Like,
	NotLike,
}

impl BinaryOp {
	pub fn symbol(&self) -> &'static str {
		match self {
			BinaryOp::Add => "+",
			BinaryOp::Sub => "-",
			BinaryOp::Mul => "*",
			BinaryOp::Div => "/",
			BinaryOp::Mod => "%",
			BinaryOp::Pow => "^",
			BinaryOp::Equal => "=",
			BinaryOp::NotEqual => "!=",
			BinaryOp::NullSafeEqual => "_==",
			BinaryOp::NullSafeNotEqual => "_!=",
			BinaryOp::LessThan => "<",
			BinaryOp::LessThanEqual => "<=",
			BinaryOp::GreaterThan => ">",
			BinaryOp::GreaterThanEqual => ">=",
			BinaryOp::And => "AND",
			BinaryOp::Or => "OR",
			BinaryOp::Like => "LIKE",
			BinaryOp::NotLike => "NOT LIKE",
		}
	}

	pub fn is_equality(&self) -> bool {
		matches!(self, BinaryOp::Equal | BinaryOp::NullSafeEqual)
	}

	pub fn is_inequality(&self) -> bool {
		matches!(self, BinaryOp::NotEqual | BinaryOp::NullSafeNotEqual)
	}

	/// Comparison with the opposite outcome on the same operands, `>` for `<=` and so on.
	pub fn inverted_comparison(&self) -> Option<BinaryOp> {
		match self {
			BinaryOp::GreaterThan => Some(BinaryOp::LessThanEqual),
			BinaryOp::GreaterThanEqual => Some(BinaryOp::LessThan),
			BinaryOp::LessThan => Some(BinaryOp::GreaterThanEqual),
			BinaryOp::LessThanEqual => Some(BinaryOp::GreaterThan),
			BinaryOp::Equal => Some(BinaryOp::NotEqual),
			BinaryOp::NotEqual => Some(BinaryOp::Equal),
			_ => None,
		}
	}
}

impl Display for BinaryOp {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.symbol())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
	Neg,
	Not,
	IsNull,
	IsNotNull,
}

impl Display for UnaryOp {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			UnaryOp::Neg => f.write_str("-"),
			UnaryOp::Not => f.write_str("NOT"),
			UnaryOp::IsNull => f.write_str("IS NULL"),
			UnaryOp::IsNotNull => f.write_str("IS NOT NULL"),
		}
	}
}
