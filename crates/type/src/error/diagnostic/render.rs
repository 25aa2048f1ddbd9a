// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::Write;

use crate::{error::diagnostic::Diagnostic, fragment::Fragment};

pub trait DiagnosticRenderer {
	fn render(&self, diagnostic: &Diagnostic) -> String;
}

pub struct DefaultRenderer;

impl DiagnosticRenderer for DefaultRenderer {
	fn render(&self, diagnostic: &Diagnostic) -> String {
		let mut output = String::new();
		render_nested(&mut output, diagnostic, 0);
		output
	}
}

impl DefaultRenderer {
	pub fn render_string(diagnostic: &Diagnostic) -> String {
		DefaultRenderer.render(diagnostic)
	}
}

fn render_nested(output: &mut String, d: &Diagnostic, depth: usize) {
	let indent = "  ".repeat(depth);
	let _ = writeln!(output, "{}error[{}]: {}", indent, d.code, d.message);

	if let Fragment::Statement {
		text,
		line,
		column,
	} = &d.fragment
	{
		let line_number_width = (**line).to_string().len().max(2);
		let _ = writeln!(output, "{} {:>width$} --> {}:{}", indent, "", **line, **column, width = line_number_width);
		let _ = writeln!(output, "{} {:>width$} │ {}", indent, **line, text, width = line_number_width);
		if let Some(label) = &d.label {
			let _ = writeln!(
				output,
				"{} {:>width$} │ {} {}",
				indent,
				"",
				"^".repeat(text.chars().count().max(1)),
				label,
				width = line_number_width
			);
		}
	} else if let Some(label) = &d.label {
		let _ = writeln!(output, "{}  = {}", indent, label);
	}

	if let Some(statement) = &d.statement {
		let _ = writeln!(output, "{}  in: {}", indent, statement);
	}

	if let Some(help) = &d.help {
		let _ = writeln!(output, "{}help: {}", indent, help);
	}

	for note in &d.notes {
		let _ = writeln!(output, "{}note: {}", indent, note);
	}

	for related in &d.related {
		render_nested(output, related, depth + 1);
	}

	if let Some(cause) = &d.cause {
		let _ = writeln!(output, "{}caused by:", indent);
		render_nested(output, cause, depth + 1);
	}
}
