// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Legend and block formalization: turns the raw field/role request of a client into a
//! validated [`Legend`] and splits it into placed blocks.

#![cfg_attr(not(debug_assertions), deny(warnings))]

pub mod block;
pub mod error;
mod formalizer;
mod id_gen;
mod item;
mod notification;
pub mod raw;
mod role;
mod source;

pub use block::{BlockFormalizer, BlockLegend, BlockLegendMeta, BlockPlacement, BlockSpec, DimensionPair, EmptyQueryMode};
pub use error::{BlockError, LegendError};
pub use formalizer::LegendFormalizer;
pub use item::{Legend, LegendItem, ObjSpec};
pub use notification::{Notification, NotificationLevel};
pub use role::{DimensionValueSpec, FieldRole, FieldType, FilterOperation, QueryType, RangeType, RoleSpec};
pub use source::{FieldInfo, FieldSource};

pub type LegendItemId = u32;
pub type BlockId = u32;
