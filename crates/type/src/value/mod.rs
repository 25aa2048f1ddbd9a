// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

mod data_type;
mod date;
mod datetime;

pub use data_type::DataType;
pub use date::Date;
pub use datetime::DateTime;
