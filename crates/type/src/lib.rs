// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

#![cfg_attr(not(debug_assertions), deny(warnings))]

pub mod error;
pub mod fragment;
pub mod value;

pub use error::{Error, IntoDiagnostic, Result};
pub use fragment::Fragment;
pub use value::{DataType, Date, DateTime};
