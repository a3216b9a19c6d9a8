//! Luhn (mod 10) checksum used by payment card numbers
//!
//! A passing checksum does not mean the number belongs to a real card.

use crate::error::{ToolError, ToolResult};

/// Check `number` against the Luhn algorithm. Spaces and dashes are ignored.
pub fn luhn_is_valid(number: &str) -> ToolResult<bool> {
    let mut digits = Vec::with_capacity(number.len());
    for c in number.chars().filter(|c| *c != ' ' && *c != '-') {
        let digit = c.to_digit(10).ok_or_else(|| ToolError::InvalidDigit {
            input: number.to_string(),
            found: c,
        })?;
        digits.push(digit);
    }

    if digits.is_empty() {
        return Err(ToolError::EmptyNumber {
            input: number.to_string(),
        });
    }

    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();

    Ok(sum % 10 == 0)
}
