//! Keystroke replay scripts.
//!
//! ```text
//! # type "paris" one letter at a time, then change our mind
//! 0 p
//! 40 pa
//! 40 par
//! 900 -
//! 30 lyon
//! ```
//!
//! Each line waits `delay_ms` after the previous one, then sets the input
//! field to the rest of the line. The delay may be indented and is followed
//! by exactly one space or tab; everything after that separator is replayed
//! verbatim, surrounding whitespace included. A lone `-` sets it to empty.

use std::time::Duration;

use thiserror::Error;

/// One replayed input change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keystroke {
	pub delay: Duration,
	pub text: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScriptError {
	#[error("line {line}: missing delay")]
	MissingDelay { line: usize },

	#[error("line {line}: invalid delay {value:?}")]
	InvalidDelay { line: usize, value: String },

	#[error("line {line}: missing input text (use `-` to clear)")]
	MissingText { line: usize },
}

pub fn parse(input: &str) -> Result<Vec<Keystroke>, ScriptError> {
	let mut keystrokes = Vec::new();
	for (idx, raw) in input.lines().enumerate() {
		let line = idx + 1;
		let body = raw.trim_start();
		if body.trim_end().is_empty() || body.starts_with('#') {
			continue;
		}

		let (delay, rest) = body.split_once([' ', '\t']).unwrap_or((body.trim_end(), ""));
		if delay.is_empty() {
			return Err(ScriptError::MissingDelay { line });
		}
		let delay_ms: u64 = delay.parse().map_err(|_| ScriptError::InvalidDelay {
			line,
			value: delay.to_string(),
		})?;

		let text = match rest {
			"" => return Err(ScriptError::MissingText { line }),
			"-" => String::new(),
			text => text.to_string(),
		};

		keystrokes.push(Keystroke {
			delay: Duration::from_millis(delay_ms),
			text,
		});
	}
	Ok(keystrokes)
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	fn key(ms: u64, text: &str) -> Keystroke {
		Keystroke {
			delay: Duration::from_millis(ms),
			text: text.to_string(),
		}
	}

	#[test]
	fn parses_delays_text_and_clears() {
		let script = "# warmup\n0 p\n\n40 pa ris\n900 -\n";
		assert_eq!(parse(script).unwrap(), vec![key(0, "p"), key(40, "pa ris"), key(900, "")]);
	}

	#[test]
	fn text_after_separator_is_kept_verbatim() {
		let script = "  10 paris \n20\t  lyon\n30  x\n";
		assert_eq!(parse(script).unwrap(), vec![key(10, "paris "), key(20, "  lyon"), key(30, " x")]);
	}

	#[test]
	fn reports_line_numbers() {
		assert_eq!(parse("0 a\nsoon b\n"), Err(ScriptError::InvalidDelay {
			line: 2,
			value: "soon".to_string(),
		}));
		assert_eq!(parse("\n\n25\n"), Err(ScriptError::MissingText { line: 3 }));
	}
}
