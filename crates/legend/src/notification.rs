// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
	Info,
	Warning,
}

/// Non-fatal message about how a request was adjusted, reported to the caller next to the result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Notification {
	pub code: String,
	pub level: NotificationLevel,
	pub message: String,
}

impl Notification {
	pub fn totals_removed_due_to_measure_filter() -> Self {
		Self {
			code: "NOTIF.TOTALS_REMOVED_DUE_TO_MEASURE_FILTER".to_string(),
			level: NotificationLevel::Info,
			message: "Totals were removed because the request contains filters by measures".to_string(),
		}
	}
}
