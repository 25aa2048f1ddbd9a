// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	fmt::{Display, Formatter},
	hash::{Hash, Hasher},
	mem::discriminant,
};

use lodestar_type::{Date, DateTime};

#[derive(Debug, Clone)]
pub enum Literal {
	Null,
	Integer(i64),
	Float(f64),
	Boolean(bool),
	String(String),
	Date(Date),
	Datetime(DateTime),
}

impl Literal {
	/// Both literals are of the same primitive kind and neither is null.
	pub fn same_kind(&self, other: &Literal) -> bool {
		!matches!(self, Literal::Null) && discriminant(self) == discriminant(other)
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Literal::Boolean(value) => Some(*value),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Literal::String(value) => Some(value),
			_ => None,
		}
	}

	pub fn as_f64(&self) -> Option<f64> {
		match self {
			Literal::Integer(value) => Some(*value as f64),
			Literal::Float(value) => Some(*value),
			_ => None,
		}
	}

	/// Equality of the values rather than of the nodes: numbers compare across integer and
	/// float, `0.0` equals `-0.0`. `None` if the kinds cannot be compared or either side is null.
	pub fn value_eq(&self, other: &Literal) -> Option<bool> {
		match (self, other) {
			(Literal::Null, _) | (_, Literal::Null) => None,
			(Literal::Integer(l), Literal::Integer(r)) => Some(l == r),
			(Literal::Integer(_) | Literal::Float(_), Literal::Integer(_) | Literal::Float(_)) => {
				Some(self.as_f64()? == other.as_f64()?)
			}
			_ if discriminant(self) == discriminant(other) => Some(self == other),
			_ => None,
		}
	}

	/// Truth value of a constant operand of AND/OR.
	pub fn is_truthy(&self) -> bool {
		match self {
			Literal::Null => false,
			Literal::Integer(value) => *value != 0,
			Literal::Float(value) => *value != 0.0,
			Literal::Boolean(value) => *value,
			Literal::String(value) => !value.is_empty(),
			Literal::Date(_) | Literal::Datetime(_) => true,
		}
	}

	/// `Some(false)` for `0`/`FALSE`, `Some(true)` for `1`/`TRUE`.
	pub fn as_zero_one(&self) -> Option<bool> {
		match self {
			Literal::Boolean(value) => Some(*value),
			Literal::Integer(0) => Some(false),
			Literal::Integer(1) => Some(true),
			Literal::Float(value) if *value == 0.0 => Some(false),
			Literal::Float(value) if *value == 1.0 => Some(true),
			_ => None,
		}
	}
}

impl PartialEq for Literal {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Literal::Null, Literal::Null) => true,
			(Literal::Integer(l), Literal::Integer(r)) => l == r,
			(Literal::Float(l), Literal::Float(r)) => l.to_bits() == r.to_bits(),
			(Literal::Boolean(l), Literal::Boolean(r)) => l == r,
			(Literal::String(l), Literal::String(r)) => l == r,
			(Literal::Date(l), Literal::Date(r)) => l == r,
			(Literal::Datetime(l), Literal::Datetime(r)) => l == r,
			_ => false,
		}
	}
}

impl Eq for Literal {}

impl Hash for Literal {
	fn hash<H: Hasher>(&self, state: &mut H) {
		discriminant(self).hash(state);
		match self {
			Literal::Null => {}
			Literal::Integer(value) => value.hash(state),
			Literal::Float(value) => value.to_bits().hash(state),
			Literal::Boolean(value) => value.hash(state),
			Literal::String(value) => value.hash(state),
			Literal::Date(value) => value.hash(state),
			Literal::Datetime(value) => value.hash(state),
		}
	}
}

impl Display for Literal {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Literal::Null => f.write_str("NULL"),
			Literal::Integer(value) => write!(f, "{}", value),
			Literal::Float(value) => write!(f, "{:?}", value),
			Literal::Boolean(true) => f.write_str("TRUE"),
			Literal::Boolean(false) => f.write_str("FALSE"),
			Literal::String(value) => write!(f, "'{}'", value.replace('\'', "\\'")),
			Literal::Date(value) => write!(f, "#{}#", value),
			Literal::Datetime(value) => write!(f, "##{}##", value),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_same_kind() {
		assert!(Literal::Integer(1).same_kind(&Literal::Integer(2)));
		assert!(!Literal::Integer(1).same_kind(&Literal::Float(1.0)));
		assert!(!Literal::Null.same_kind(&Literal::Null));
	}

	#[test]
	fn test_float_equality_by_bits() {
		assert_eq!(Literal::Float(1.5), Literal::Float(1.5));
		assert_ne!(Literal::Float(0.0), Literal::Float(-0.0));
	}

	#[test]
	fn test_value_eq() {
		assert_eq!(Literal::Float(0.0).value_eq(&Literal::Float(-0.0)), Some(true));
		assert_eq!(Literal::Integer(1).value_eq(&Literal::Float(1.0)), Some(true));
		assert_eq!(Literal::Float(2.5).value_eq(&Literal::Integer(2)), Some(false));
		assert_eq!(Literal::String("a".to_string()).value_eq(&Literal::String("a".to_string())), Some(true));
		assert_eq!(Literal::String("1".to_string()).value_eq(&Literal::Integer(1)), None);
		assert_eq!(Literal::Null.value_eq(&Literal::Null), None);
		assert_eq!(Literal::Float(f64::NAN).value_eq(&Literal::Float(f64::NAN)), Some(false));
	}

	#[test]
	fn test_truthiness() {
		assert!(!Literal::Integer(0).is_truthy());
		assert!(!Literal::Float(0.0).is_truthy());
		assert!(!Literal::String(String::new()).is_truthy());
		assert!(!Literal::Null.is_truthy());
		assert!(Literal::String("a".to_string()).is_truthy());
		assert!(Literal::Integer(-3).is_truthy());
	}

	#[test]
	fn test_zero_one() {
		assert_eq!(Literal::Integer(0).as_zero_one(), Some(false));
		assert_eq!(Literal::Float(1.0).as_zero_one(), Some(true));
		assert_eq!(Literal::Boolean(false).as_zero_one(), Some(false));
		assert_eq!(Literal::Integer(2).as_zero_one(), None);
		assert_eq!(Literal::String("1".to_string()).as_zero_one(), None);
	}

	#[test]
	fn test_display() {
		assert_eq!(Literal::String("it's".to_string()).to_string(), "'it\\'s'");
		assert_eq!(Literal::Float(2.0).to_string(), "2.0");
		assert_eq!(Literal::Date(Date::new(2020, 1, 31).unwrap()).to_string(), "#2020-01-31#");
	}
}
