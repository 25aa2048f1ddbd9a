// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::value::Date;

/// A naive date and time with second precision.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DateTime {
	date: Date,
	seconds_of_day: u32,
}

impl DateTime {
	pub fn new(date: Date, hour: u32, minute: u32, second: u32) -> Option<Self> {
		if hour > 23 || minute > 59 || second > 59 {
			return None;
		}
		Some(Self {
			date,
			seconds_of_day: hour * 3600 + minute * 60 + second,
		})
	}

	pub fn date(&self) -> Date {
		self.date
	}

	pub fn hour(&self) -> u32 {
		self.seconds_of_day / 3600
	}

	pub fn minute(&self) -> u32 {
		self.seconds_of_day % 3600 / 60
	}

	pub fn second(&self) -> u32 {
		self.seconds_of_day % 60
	}
}

impl Display for DateTime {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}T{:02}:{:02}:{:02}", self.date, self.hour(), self.minute(), self.second())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_components() {
		let dt = DateTime::new(Date::new(2022, 11, 5).unwrap(), 13, 4, 59).unwrap();
		assert_eq!((dt.hour(), dt.minute(), dt.second()), (13, 4, 59));
		assert_eq!(dt.to_string(), "2022-11-05T13:04:59");
	}

	#[test]
	fn test_out_of_range() {
		assert!(DateTime::new(Date::default(), 24, 0, 0).is_none());
	}
}
