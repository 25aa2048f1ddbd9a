// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use crate::node::Node;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IfPart {
	pub cond: Node,
	pub then: Node,
}

/// `IF c THEN t [ELSEIF c THEN t]* ELSE e END`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IfBlock {
	pub parts: Vec<IfPart>,
	pub else_expr: Node,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WhenPart {
	pub value: Node,
	pub then: Node,
}

/// `CASE e WHEN v THEN t [WHEN v THEN t]* ELSE e END`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CaseBlock {
	pub case_expr: Node,
	pub whens: Vec<WhenPart>,
	pub else_expr: Node,
}
