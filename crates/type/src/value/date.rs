// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	fmt::{Display, Formatter},
	str::FromStr,
};

use serde::{
	Deserialize, Deserializer, Serialize, Serializer,
	de::{self, Visitor},
};

/// A calendar date without time information.
///
/// Internally stored as days since Unix epoch (1970-01-01).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Date {
	days_since_epoch: i32,
}

impl Date {
	#[inline]
	fn is_leap_year(year: i32) -> bool {
		(year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
	}

	#[inline]
	fn days_in_month(year: i32, month: u32) -> u32 {
		match month {
			1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
			4 | 6 | 9 | 11 => 30,
			2 => {
				if Self::is_leap_year(year) {
					29
				} else {
					28
				}
			}
			_ => 0,
		}
	}

	fn ymd_to_days_since_epoch(year: i32, month: u32, day: u32) -> Option<i32> {
		if !(1..=12).contains(&month) || day < 1 || day > Self::days_in_month(year, month) {
			return None;
		}

		// Howard Hinnant's civil-from-days, months shifted so that March is 0
		let (y, m) = if month <= 2 {
			(year - 1, month as i32 + 9)
		} else {
			(year, month as i32 - 3)
		};

		let era = if y >= 0 {
			y
		} else {
			y - 399
		} / 400;
		let yoe = y - era * 400;
		let doy = (153 * m + 2) / 5 + day as i32 - 1;
		let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
		Some(era * 146097 + doe - 719468)
	}

	fn days_since_epoch_to_ymd(days: i32) -> (i32, u32, u32) {
		let days_since_ce = days + 719468;

		let era = if days_since_ce >= 0 {
			days_since_ce
		} else {
			days_since_ce - 146096
		} / 146097;
		let doe = days_since_ce - era * 146097;
		let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
		let y = yoe + era * 400;
		let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
		let mp = (5 * doy + 2) / 153;
		let d = doy - (153 * mp + 2) / 5 + 1;
		let m = if mp < 10 {
			mp + 3
		} else {
			mp - 9
		};
		let year = if m <= 2 {
			y + 1
		} else {
			y
		};

		(year, m as u32, d as u32)
	}
}

impl Date {
	pub fn new(year: i32, month: u32, day: u32) -> Option<Self> {
		Self::ymd_to_days_since_epoch(year, month, day).map(|days_since_epoch| Self {
			days_since_epoch,
		})
	}

	pub fn year(&self) -> i32 {
		Self::days_since_epoch_to_ymd(self.days_since_epoch).0
	}

	pub fn month(&self) -> u32 {
		Self::days_since_epoch_to_ymd(self.days_since_epoch).1
	}

	pub fn day(&self) -> u32 {
		Self::days_since_epoch_to_ymd(self.days_since_epoch).2
	}

	pub fn to_days_since_epoch(&self) -> i32 {
		self.days_since_epoch
	}

	pub fn from_days_since_epoch(days: i32) -> Self {
		Self {
			days_since_epoch: days,
		}
	}
}

impl Display for Date {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		let (year, month, day) = Self::days_since_epoch_to_ymd(self.days_since_epoch);
		if year < 0 {
			write!(f, "-{:04}-{:02}-{:02}", -year, month, day)
		} else {
			write!(f, "{:04}-{:02}-{:02}", year, month, day)
		}
	}
}

impl FromStr for Date {
	type Err = String;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		let (negative, rest) = match value.strip_prefix('-') {
			Some(rest) => (true, rest),
			None => (false, value),
		};
		let parts: Vec<&str> = rest.split('-').collect();
		if parts.len() != 3 {
			return Err(format!("invalid date format: {}", value));
		}

		let year = parts[0].parse::<i32>().map_err(|_| format!("invalid year: {}", parts[0]))?;
		let year = if negative {
			-year
		} else {
			year
		};
		let month = parts[1].parse::<u32>().map_err(|_| format!("invalid month: {}", parts[1]))?;
		let day = parts[2].parse::<u32>().map_err(|_| format!("invalid day: {}", parts[2]))?;

		Date::new(year, month, day).ok_or_else(|| format!("invalid date: {}-{:02}-{:02}", year, month, day))
	}
}

impl Serialize for Date {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&self.to_string())
	}
}

struct DateVisitor;

impl<'de> Visitor<'de> for DateVisitor {
	type Value = Date;

	fn expecting(&self, formatter: &mut Formatter) -> std::fmt::Result {
		formatter.write_str("a date in ISO 8601 format (YYYY-MM-DD)")
	}

	fn visit_str<E>(self, value: &str) -> Result<Date, E>
	where
		E: de::Error,
	{
		value.parse::<Date>().map_err(E::custom)
	}
}

impl<'de> Deserialize<'de> for Date {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		deserializer.deserialize_str(DateVisitor)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_display() {
		assert_eq!(Date::new(2024, 3, 15).unwrap().to_string(), "2024-03-15");
		assert_eq!(Date::new(1970, 1, 1).unwrap().to_string(), "1970-01-01");
		assert_eq!(Date::new(1969, 12, 31).unwrap().to_days_since_epoch(), -1);
	}

	#[test]
	fn test_invalid_dates() {
		assert!(Date::new(2023, 2, 29).is_none());
		assert!(Date::new(2024, 13, 1).is_none());
		assert!(Date::new(2024, 4, 31).is_none());
		assert!(Date::new(2024, 2, 29).is_some());
	}

	#[test]
	fn test_parse() {
		let date: Date = "2020-02-29".parse().unwrap();
		assert_eq!((date.year(), date.month(), date.day()), (2020, 2, 29));
		assert!("2020-02".parse::<Date>().is_err());
	}

	#[test]
	fn test_serde_as_string() {
		let date = Date::new(2021, 7, 4).unwrap();
		let json = serde_json::to_string(&date).unwrap();
		assert_eq!(json, "\"2021-07-04\"");
		let back: Date = serde_json::from_str(&json).unwrap();
		assert_eq!(back, date);
	}
}
