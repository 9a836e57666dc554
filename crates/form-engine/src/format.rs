//! Value formatting
//!
//! Each format mode maps to one pure formatter producing a canonical display
//! string. Separator glyphs (space, dash, comma, period) are embedded into
//! the canonical form so that each skip box of the field consumes exactly
//! one of them during layout; for right-to-left fields the separators are
//! embedded right-aligned so partial fills still line up.

use chrono::NaiveDate;

use crate::error::FieldError;
use crate::schema::{Direction, FieldSpec, FormatMode, Overflow};

/// Glyphs that may occupy a skip box
pub(crate) const SEPARATORS: [char; 4] = [' ', '-', ',', '.'];

/// Accepted input layouts for date fields
const DATE_FORMATS: &[&str] = &["%d-%m-%Y", "%d/%m/%Y", "%Y-%m-%d", "%d.%m.%Y"];

/// A canonical display string plus its resolved fill direction
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Formatted {
    pub canonical: String,
    pub rtl: bool,
}

impl Formatted {
    fn ltr(canonical: String) -> Self {
        Self {
            canonical,
            rtl: false,
        }
    }
}

pub(crate) fn is_separator(glyph: char) -> bool {
    SEPARATORS.contains(&glyph)
}

/// Format a raw submitted value according to the field's mode
pub(crate) fn format_value(spec: &FieldSpec, raw: &str) -> Result<Formatted, FieldError> {
    match spec.mode {
        FormatMode::PlainText | FormatMode::FreeText => text_value(spec, raw),
        FormatMode::IdNumber => id_number(spec, raw),
        FormatMode::Digits => digits_value(spec, raw),
        FormatMode::Number => whole_amount(spec, raw),
        FormatMode::DecimalCurrency => decimal_amount(spec, raw),
        FormatMode::Date => date_value(spec, raw),
        FormatMode::Checkbox => checkbox_value(spec, raw),
    }
}

/// Collapse whitespace runs (including newlines) to single spaces and
/// uppercase unless the field preserves case
fn normalize(raw: &str, preserve_case: bool) -> String {
    let joined = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if preserve_case {
        joined
    } else {
        joined.to_uppercase()
    }
}

fn text_value(spec: &FieldSpec, raw: &str) -> Result<Formatted, FieldError> {
    let mut text = normalize(raw, spec.preserve_case);

    if let Some(limit) = glyph_limit(spec) {
        let count = text.chars().count();
        if count > limit {
            match spec.overflow {
                Overflow::Truncate => text = text.chars().take(limit).collect(),
                Overflow::Reject => return Err(FieldError::overflow(&spec.id, limit, count)),
            }
        }
    }

    Ok(Formatted::ltr(text))
}

fn id_number(spec: &FieldSpec, raw: &str) -> Result<Formatted, FieldError> {
    let digits: String = raw
        .chars()
        .filter(|c| !matches!(c, '-' | ' '))
        .collect();

    if digits.chars().count() != 12 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(FieldError::format(
            &spec.id,
            "identification number must be exactly 12 digits",
        ));
    }

    Ok(Formatted::ltr(embed_separators_ltr(&digits, spec, ' ')))
}

fn digits_value(spec: &FieldSpec, raw: &str) -> Result<Formatted, FieldError> {
    let digits: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(FieldError::format(
            &spec.id,
            "value must contain digits only",
        ));
    }

    let digits = enforce_limit(spec, digits)?;
    let rtl = fills_rtl(spec, &digits);
    let canonical = if rtl {
        embed_separators_rtl(&digits, spec, ' ')
    } else {
        embed_separators_ltr(&digits, spec, ' ')
    };

    Ok(Formatted { canonical, rtl })
}

fn whole_amount(spec: &FieldSpec, raw: &str) -> Result<Formatted, FieldError> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, ',' | ' '))
        .collect();

    if cleaned.is_empty() || !cleaned.chars().all(|c| c.is_ascii_digit()) {
        return Err(FieldError::format(
            &spec.id,
            "amount must be a non-negative whole number",
        ));
    }

    let digits = strip_leading_zeros(&cleaned);
    if let Some(capacity) = spec.capacity() {
        let needed = digits.chars().count();
        if needed > capacity {
            return Err(FieldError::overflow(&spec.id, capacity, needed));
        }
    }

    Ok(Formatted {
        canonical: group_thousands(&digits),
        rtl: fills_rtl(spec, &digits),
    })
}

fn decimal_amount(spec: &FieldSpec, raw: &str) -> Result<Formatted, FieldError> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, ',' | ' '))
        .collect();

    let (int_raw, frac_raw) = match cleaned.split_once('.') {
        Some((i, f)) => (i, f),
        None => (cleaned.as_str(), ""),
    };

    let all_digits =
        int_raw.chars().all(|c| c.is_ascii_digit()) && frac_raw.chars().all(|c| c.is_ascii_digit());
    if !all_digits || (int_raw.is_empty() && frac_raw.is_empty()) {
        return Err(FieldError::format(
            &spec.id,
            "amount must be a non-negative number",
        ));
    }

    let int_digits = strip_leading_zeros(int_raw);
    // Pad or drop cent digits to exactly two
    let cents: String = format!("{frac_raw}00").chars().take(2).collect();

    if let Some(capacity) = spec.capacity() {
        let needed = int_digits.chars().count() + 2;
        if needed > capacity {
            return Err(FieldError::overflow(&spec.id, capacity, needed));
        }
    }

    Ok(Formatted {
        canonical: format!("{}.{}", group_thousands(&int_digits), cents),
        rtl: fills_rtl(spec, &int_digits),
    })
}

fn date_value(spec: &FieldSpec, raw: &str) -> Result<Formatted, FieldError> {
    let text = raw.trim();
    for layout in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, layout) {
            return Ok(Formatted::ltr(date.format("%d-%m-%Y").to_string()));
        }
    }

    Err(FieldError::format(
        &spec.id,
        "unrecognized date, expected DD-MM-YYYY",
    ))
}

fn checkbox_value(spec: &FieldSpec, raw: &str) -> Result<Formatted, FieldError> {
    let wanted = normalize(raw, false);
    for label in spec.options.keys() {
        if label.to_uppercase() == wanted {
            return Ok(Formatted::ltr(label.clone()));
        }
    }

    Err(FieldError::format(
        &spec.id,
        format!("'{wanted}' is not one of the listed options"),
    ))
}

/// Resolve the fill direction against the input digit stream
fn fills_rtl(spec: &FieldSpec, digits: &str) -> bool {
    match spec.direction {
        Direction::Ltr => false,
        Direction::Rtl => true,
        Direction::ByDigit { index, value } => digits.chars().nth(index) != Some(value),
    }
}

/// Smaller of `maxLength` and box capacity, if either is set
fn glyph_limit(spec: &FieldSpec) -> Option<usize> {
    match (spec.max_length, spec.capacity()) {
        (Some(m), Some(c)) => Some(m.min(c)),
        (Some(m), None) => Some(m),
        (None, Some(c)) => Some(c),
        (None, None) => None,
    }
}

fn enforce_limit(spec: &FieldSpec, digits: String) -> Result<String, FieldError> {
    if let Some(limit) = glyph_limit(spec) {
        let count = digits.chars().count();
        if count > limit {
            return match spec.overflow {
                Overflow::Truncate => Ok(digits.chars().take(limit).collect()),
                Overflow::Reject => Err(FieldError::overflow(&spec.id, limit, count)),
            };
        }
    }
    Ok(digits)
}

fn strip_leading_zeros(digits: &str) -> String {
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Insert a thousands separator every three digits from the right
pub(crate) fn group_thousands(digits: &str) -> String {
    let len = digits.chars().count();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Walk box indices ascending, pairing input glyphs with data boxes and the
/// separator glyph with each skip box reached while input remains
fn embed_separators_ltr(digits: &str, spec: &FieldSpec, separator: char) -> String {
    let mut out = String::new();
    let mut input = digits.chars().peekable();
    for index in 0..spec.box_count {
        if input.peek().is_none() {
            break;
        }
        if spec.skip_boxes.contains(&index) {
            out.push(separator);
        } else if let Some(c) = input.next() {
            out.push(c);
        }
    }
    out
}

/// Right-aligned counterpart of [`embed_separators_ltr`]: walk box indices
/// descending from the last box, consuming input glyphs from the end
fn embed_separators_rtl(digits: &str, spec: &FieldSpec, separator: char) -> String {
    let mut reversed = String::new();
    let mut input = digits.chars().rev().peekable();
    for index in (0..spec.box_count).rev() {
        if input.peek().is_none() {
            break;
        }
        if spec.skip_boxes.contains(&index) {
            reversed.push(separator);
        } else if let Some(c) = input.next() {
            reversed.push(c);
        }
    }
    reversed.chars().rev().collect()
}
