//! Pass 1: strip comments/blank lines, collect labels, and assign each
//! instruction its address (spec.md §4.E).

use crate::error::{AssembleError, AssembleErrorKind};
use std::collections::HashMap;

/// One instruction line surviving pass 1, with its final address and
/// 1-based source line number (for error messages in pass 2).
pub struct InstrLine {
    pub line_no: usize,
    pub addr: u32,
    pub text: String,
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Strip a `#`-to-end-of-line comment and surrounding whitespace.
fn strip_comment(line: &str) -> &str {
    let code = match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    };
    code.trim()
}

pub fn run(text: &str) -> Result<(HashMap<String, u32>, Vec<InstrLine>), AssembleError> {
    let mut symbols = HashMap::new();
    let mut instructions = Vec::new();
    let mut next_addr: u32 = 0;

    for (zero_based, raw_line) in text.lines().enumerate() {
        let line_no = zero_based + 1;
        let code = strip_comment(raw_line);
        if code.is_empty() {
            continue;
        }

        let (label, rest) = match code.split_once(':') {
            Some((before, after)) if is_identifier(before.trim()) => {
                (Some(before.trim().to_string()), after.trim())
            }
            _ => (None, code),
        };

        if let Some(name) = label {
            if symbols.contains_key(&name) {
                return Err(AssembleError::new(
                    line_no,
                    AssembleErrorKind::DuplicateLabel(name),
                ));
            }
            symbols.insert(name, next_addr);
        }

        if !rest.is_empty() {
            instructions.push(InstrLine {
                line_no,
                addr: next_addr,
                text: rest.to_string(),
            });
            next_addr = next_addr.wrapping_add(4);
        }
    }

    Ok((symbols, instructions))
}
