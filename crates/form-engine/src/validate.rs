//! Spec validation
//!
//! Structural checks run once at load time so that rendering can assume a
//! well-formed field table: unique ids, coherent box grids, resolvable
//! conditions and no overlapping grids on the same page.

use std::collections::HashSet;

use crate::error::SpecError;
use crate::format::{group_thousands, is_separator};
use crate::schema::{Direction, DocumentSpec, FieldSpec, FormatMode, Overflow};

pub(crate) fn check(spec: &DocumentSpec) -> Result<(), SpecError> {
    let mut seen = HashSet::new();
    for field in &spec.fields {
        if !seen.insert(field.id.as_str()) {
            return Err(SpecError::DuplicateField(field.id.clone()));
        }
    }

    for field in &spec.fields {
        check_field(field)?;
        if let Some(cond) = &field.condition {
            if !seen.contains(cond.field.as_str()) {
                return Err(SpecError::UnknownConditionTarget {
                    field: field.id.clone(),
                    target: cond.field.clone(),
                });
            }
        }
    }

    check_overlaps(spec)
}

fn check_field(field: &FieldSpec) -> Result<(), SpecError> {
    let invalid = |detail: &str| SpecError::InvalidField {
        field: field.id.clone(),
        detail: detail.to_string(),
    };

    if field.mode == FormatMode::Checkbox {
        if field.options.is_empty() {
            return Err(invalid("checkbox field has no options"));
        }
        if field.box_count != 0 {
            return Err(invalid("checkbox field cannot have a box grid"));
        }
        return Ok(());
    }

    if field.origin.is_none() {
        return Err(invalid("field has no origin"));
    }
    if field.box_count > 0 && field.box_advance <= 0.0 {
        return Err(invalid("boxAdvance must be positive"));
    }

    for &index in &field.skip_boxes {
        if index >= field.box_count {
            return Err(invalid("skipBoxes index outside the box grid"));
        }
    }
    for &index in field.skip_advance.keys() {
        if index >= field.box_count {
            return Err(invalid("skipAdvance index outside the box grid"));
        }
    }

    if field.rows > 1 {
        let Some(per_row) = field.chars_per_row else {
            return Err(invalid("multi-row field needs charsPerRow"));
        };
        if field.rows * per_row != field.box_count {
            return Err(invalid("rows * charsPerRow must equal boxCount"));
        }
        if field.row_advance <= 0.0 {
            return Err(invalid("multi-row field needs a positive rowAdvance"));
        }
        if !field.skip_boxes.is_empty() {
            return Err(invalid("multi-row fields cannot have skip boxes"));
        }
    }

    // Fixed-shape modes carry their separator slots in the grid itself
    match field.mode {
        FormatMode::IdNumber => {
            if field.skip_boxes.len() != 2 || field.capacity() != Some(12) {
                return Err(invalid(
                    "identification fields need 12 data boxes and 2 separator slots",
                ));
            }
        }
        FormatMode::Date => {
            // The canonical DD-MM-YYYY form carries its dashes at 2 and 5
            if field.box_count != 10 || !field.skip_boxes.iter().eq([2usize, 5].iter()) {
                return Err(invalid(
                    "date fields need 10 boxes with separator slots at 2 and 5",
                ));
            }
        }
        FormatMode::Number | FormatMode::DecimalCurrency => {
            // Only single-row walks pair glyphs with skip boxes
            if field.box_count > 0 && field.rows <= 1 {
                check_amount_shapes(field)?;
            }
        }
        _ => {}
    }

    if field.overflow == Overflow::Reject {
        if let (Some(max), Some(capacity)) = (field.max_length, field.capacity()) {
            if max > capacity {
                return Err(invalid("maxLength exceeds box capacity"));
            }
        }
    }

    Ok(())
}

/// Amount grids must place every comma and period a formatted value can
/// produce on a skip box. Every integer width the grid can hold is
/// simulated so no valid submission can disagree with the skip set at
/// render time.
fn check_amount_shapes(field: &FieldSpec) -> Result<(), SpecError> {
    let invalid = |detail: String| SpecError::InvalidField {
        field: field.id.clone(),
        detail,
    };

    let Some(capacity) = field.capacity() else {
        return Ok(());
    };
    let cents = field.mode == FormatMode::DecimalCurrency;
    let max_int_digits = if cents {
        capacity.saturating_sub(2)
    } else {
        capacity
    };
    if max_int_digits == 0 {
        return Err(invalid("grid too small to hold any amount".to_string()));
    }

    let directions: &[bool] = match field.direction {
        Direction::Ltr => &[false],
        Direction::Rtl => &[true],
        Direction::ByDigit { .. } => &[false, true],
    };

    for width in 1..=max_int_digits {
        let grouped = group_thousands(&"9".repeat(width));
        let canonical = if cents {
            format!("{grouped}.00")
        } else {
            grouped
        };
        if canonical.chars().count() > field.box_count {
            return Err(invalid(format!(
                "a {width}-digit amount does not fit the box grid"
            )));
        }
        for &rtl in directions {
            if let Some(index) = misplaced_separator(&canonical, rtl, field) {
                return Err(invalid(format!(
                    "a {width}-digit amount puts a separator on data box {index}"
                )));
            }
        }
    }
    Ok(())
}

/// First box index where a canonical amount string and the skip set
/// disagree, walking the grid the way layout will
fn misplaced_separator(canonical: &str, rtl: bool, field: &FieldSpec) -> Option<usize> {
    let glyphs: Vec<char> = canonical.chars().collect();
    let start = if rtl { field.box_count - glyphs.len() } else { 0 };
    for (offset, glyph) in glyphs.iter().enumerate() {
        let index = start + offset;
        if field.skip_boxes.contains(&index) != is_separator(*glyph) {
            return Some(index);
        }
    }
    None
}

/// Reject field tables whose box grids overlap on the same page. Checkboxes
/// and boxless runs sit inside or after printed labels and are exempt.
fn check_overlaps(spec: &DocumentSpec) -> Result<(), SpecError> {
    let grids: Vec<(&FieldSpec, Rect)> = spec
        .fields
        .iter()
        .filter(|f| f.mode != FormatMode::Checkbox && f.box_count > 0)
        .filter_map(|f| grid_rect(f).map(|r| (f, r)))
        .collect();

    for (i, (a, ra)) in grids.iter().enumerate() {
        for (b, rb) in &grids[i + 1..] {
            if a.page == b.page && ra.intersects(rb) {
                return Err(SpecError::Overlap {
                    first: a.id.clone(),
                    second: b.id.clone(),
                    page: a.page,
                });
            }
        }
    }
    Ok(())
}

struct Rect {
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
}

impl Rect {
    fn intersects(&self, other: &Rect) -> bool {
        self.x0 < other.x1 && other.x0 < self.x1 && self.y0 < other.y1 && other.y0 < self.y1
    }
}

/// Bounding rectangle of a field's box grid in page coordinates
fn grid_rect(field: &FieldSpec) -> Option<Rect> {
    let origin = field.origin?;

    let per_row = if field.rows > 1 {
        field.chars_per_row.unwrap_or(field.box_count)
    } else {
        field.box_count
    };
    let mut width = 0.0;
    for index in 0..per_row {
        width += field.advance_after(index);
    }

    let depth = (field.rows.saturating_sub(1)) as f64 * field.row_advance;
    Some(Rect {
        x0: origin.x,
        y0: origin.y - depth,
        x1: origin.x + width,
        y1: origin.y + field.font_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DocumentSpec;

    fn parse(json: &str) -> Result<DocumentSpec, SpecError> {
        DocumentSpec::from_json(json)
    }

    fn doc(fields: &str) -> String {
        format!(
            r#"{{"name":"test","pageWidth":595.28,"pageHeight":841.89,"fields":[{fields}]}}"#
        )
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let json = doc(
            r#"{"id":"a","mode":"digits","origin":{"x":10,"y":10},"boxCount":3,"boxAdvance":12},
               {"id":"a","mode":"digits","origin":{"x":10,"y":400},"boxCount":3,"boxAdvance":12}"#,
        );
        assert!(matches!(parse(&json), Err(SpecError::DuplicateField(_))));
    }

    #[test]
    fn test_skip_index_out_of_range() {
        let json = doc(
            r#"{"id":"a","mode":"digits","origin":{"x":10,"y":10},"boxCount":3,"boxAdvance":12,"skipBoxes":[5]}"#,
        );
        assert!(matches!(parse(&json), Err(SpecError::InvalidField { .. })));
    }

    #[test]
    fn test_id_number_shape_enforced() {
        // 13 boxes with two separator slots leaves only 11 data boxes
        let json = doc(
            r#"{"id":"ic","mode":"id-number","origin":{"x":10,"y":10},"boxCount":13,"boxAdvance":12,"skipBoxes":[6,9]}"#,
        );
        assert!(matches!(parse(&json), Err(SpecError::InvalidField { .. })));
    }

    #[test]
    fn test_currency_needs_separator_slot() {
        let json = doc(
            r#"{"id":"amt","mode":"decimal-currency","origin":{"x":10,"y":10},"boxCount":9,"boxAdvance":12}"#,
        );
        assert!(matches!(parse(&json), Err(SpecError::InvalidField { .. })));
    }

    #[test]
    fn test_currency_grid_missing_comma_slot_rejected() {
        // A period slot alone is not enough: a four-digit amount such as
        // 5,000.00 would drop its comma onto data box 2
        let json = doc(
            r#"{"id":"amt","mode":"decimal-currency","direction":"rtl","origin":{"x":10,"y":10},"boxCount":9,"boxAdvance":12,"skipBoxes":[6]}"#,
        );
        assert!(matches!(parse(&json), Err(SpecError::InvalidField { .. })));
    }

    #[test]
    fn test_currency_grid_with_aligned_slots_accepted() {
        let json = doc(
            r#"{"id":"amt","mode":"decimal-currency","direction":"rtl","origin":{"x":10,"y":10},"boxCount":9,"boxAdvance":12,"skipBoxes":[2,6]}"#,
        );
        assert!(parse(&json).is_ok());
    }

    #[test]
    fn test_number_grid_missing_comma_slot_rejected() {
        // Six digit boxes with no gap cannot hold 123,456
        let json = doc(
            r#"{"id":"amt","mode":"number","direction":"rtl","origin":{"x":10,"y":10},"boxCount":6,"boxAdvance":12}"#,
        );
        assert!(matches!(parse(&json), Err(SpecError::InvalidField { .. })));
    }

    #[test]
    fn test_number_grid_with_gap_slot_accepted() {
        let json = doc(
            r#"{"id":"amt","mode":"number","direction":"rtl","origin":{"x":10,"y":10},"boxCount":7,"boxAdvance":12,"skipBoxes":[3]}"#,
        );
        assert!(parse(&json).is_ok());
    }

    #[test]
    fn test_date_separator_positions_enforced() {
        let json = doc(
            r#"{"id":"d","mode":"date","origin":{"x":10,"y":10},"boxCount":10,"boxAdvance":12,"skipBoxes":[3,7]}"#,
        );
        assert!(matches!(parse(&json), Err(SpecError::InvalidField { .. })));
    }

    #[test]
    fn test_unknown_condition_target() {
        let json = doc(
            r#"{"id":"other","mode":"plain-text","origin":{"x":10,"y":10},"boxCount":0,"boxAdvance":12,
                "condition":{"field":"race","equals":"LAIN-LAIN"}}"#,
        );
        assert!(matches!(
            parse(&json),
            Err(SpecError::UnknownConditionTarget { .. })
        ));
    }

    #[test]
    fn test_overlapping_grids_rejected() {
        let json = doc(
            r#"{"id":"a","mode":"digits","origin":{"x":10,"y":100},"boxCount":5,"boxAdvance":12},
               {"id":"b","mode":"digits","origin":{"x":40,"y":100},"boxCount":5,"boxAdvance":12}"#,
        );
        assert!(matches!(parse(&json), Err(SpecError::Overlap { .. })));
    }

    #[test]
    fn test_separate_pages_do_not_overlap() {
        let json = doc(
            r#"{"id":"a","mode":"digits","origin":{"x":10,"y":100},"boxCount":5,"boxAdvance":12},
               {"id":"b","mode":"digits","origin":{"x":40,"y":100},"boxCount":5,"boxAdvance":12,"page":2}"#,
        );
        assert!(parse(&json).is_ok());
    }

    #[test]
    fn test_multi_row_needs_chars_per_row() {
        let json = doc(
            r#"{"id":"name","mode":"plain-text","origin":{"x":10,"y":100},"boxCount":63,"boxAdvance":12,"rows":3,"rowAdvance":13}"#,
        );
        let json_ok = doc(
            r#"{"id":"name","mode":"plain-text","origin":{"x":10,"y":100},"boxCount":63,"boxAdvance":12,"rows":3,"charsPerRow":21,"rowAdvance":13}"#,
        );
        assert!(matches!(parse(&json), Err(SpecError::InvalidField { .. })));
        assert!(parse(&json_ok).is_ok());
    }

    #[test]
    fn test_checkbox_needs_options() {
        let json = doc(r#"{"id":"gender","mode":"checkbox","boxAdvance":12,"boxCount":0}"#);
        assert!(matches!(parse(&json), Err(SpecError::InvalidField { .. })));
    }
}
