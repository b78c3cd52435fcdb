//! Integer, number and date/time parsing checks.

use crate::error::{GuardError, Result};
use chrono::format::{parse, ParseErrorKind, Parsed, StrftimeItems};
use std::fmt;

/// Returns true if `value` parses as a signed 64-bit integer.
///
/// No surrounding whitespace or grouping separators are accepted.
pub fn is_integer(value: &str) -> bool {
    value.parse::<i64>().is_ok()
}

/// Returns true if `value` parses as a finite decimal number.
///
/// Uses `.` as the decimal separator regardless of locale. Surrounding
/// whitespace is ignored; `NaN` and infinities are rejected.
pub fn is_number(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty()
        && trimmed
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'))
        && trimmed.parse::<f64>().is_ok_and(f64::is_finite)
}

/// A date/time pattern such as `yyyy-MM-dd` or `dd.MM.yyyy HH:mm`.
///
/// The pattern is translated to `chrono` strftime syntax once, when the rule
/// is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatePattern {
    pattern: String,
    strftime: String,
}

impl DatePattern {
    /// Compiles a pattern.
    ///
    /// Supported letters: `y` (year), `M` (month, `MMM`/`MMMM` for names),
    /// `d` (day), `H` (hour 0-23), `h` (hour 1-12), `m` (minute), `s`
    /// (second), `S` (fraction), `a` (AM/PM), `E` (weekday name), `X`/`Z`
    /// (offset). Text in single quotes is literal and `''` is a quote.
    pub fn new(pattern: impl Into<String>) -> Result<Self> {
        let pattern = pattern.into();
        let strftime = translate(&pattern)?;
        Ok(Self { pattern, strftime })
    }

    /// The pattern as configured.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns true if `value` is a date, a time or a datetime under this
    /// pattern.
    pub fn matches(&self, value: &str) -> bool {
        let mut parsed = Parsed::new();
        if parse(&mut parsed, value, StrftimeItems::new(&self.strftime)).is_err() {
            return false;
        }
        // Calendar checks (e.g. Feb 30) only apply once enough fields are known.
        [parsed.to_naive_date().err(), parsed.to_naive_time().err()]
            .into_iter()
            .flatten()
            .all(|e| e.kind() == ParseErrorKind::NotEnough)
    }
}

impl fmt::Display for DatePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

fn translate(pattern: &str) -> Result<String> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\'' {
            if chars.get(i + 1) == Some(&'\'') {
                out.push('\'');
                i += 2;
                continue;
            }
            i += 1;
            loop {
                match (chars.get(i), chars.get(i + 1)) {
                    (Some('\''), Some('\'')) => {
                        out.push('\'');
                        i += 2;
                    }
                    (Some('\''), _) => {
                        i += 1;
                        break;
                    }
                    (Some(&literal), _) => {
                        push_literal(&mut out, literal);
                        i += 1;
                    }
                    (None, _) => {
                        return Err(GuardError::configuration(format!(
                            "unterminated quote in date pattern '{pattern}'"
                        )))
                    }
                }
            }
            continue;
        }

        if !c.is_ascii_alphabetic() {
            push_literal(&mut out, c);
            i += 1;
            continue;
        }

        let run = chars[i..].iter().take_while(|&&r| r == c).count();
        let spec = match (c, run) {
            ('y', 2) => "%y",
            ('y', _) => "%Y",
            ('M', 1 | 2) => "%m",
            ('M', 3) => "%b",
            ('M', _) => "%B",
            ('d', _) => "%d",
            ('H', _) => "%H",
            ('h', _) => "%I",
            ('m', _) => "%M",
            ('s', _) => "%S",
            ('S', 3) => "%3f",
            ('S', 6) => "%6f",
            ('S', 9) => "%9f",
            ('S', _) => "%f",
            ('a', _) => "%p",
            ('E', 1..=3) => "%a",
            ('E', _) => "%A",
            ('X', 1 | 2) | ('Z', _) => "%z",
            ('X', _) => "%:z",
            _ => {
                return Err(GuardError::configuration(format!(
                    "unsupported letter '{c}' in date pattern '{pattern}'"
                )))
            }
        };
        out.push_str(spec);
        i += run;
    }

    Ok(out)
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}
