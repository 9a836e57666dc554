//! Glyph placement
//!
//! Turns a canonical value string into absolute page positions, one glyph
//! per box for box-grid fields, a single proportional run for boxless
//! fields and a single tick mark for checkboxes. In box grids, spaces
//! advance the walk but produce no placement.

use crate::format::{is_separator, Formatted};
use crate::schema::{FieldSpec, FormatMode, Origin};

/// Tick drawn into a checkbox option
const CHECK_GLYPH: char = '/';

/// A text run pinned to an absolute position on a page. Box-grid glyphs
/// are single-character runs; boxless fields render their whole value as
/// one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub font_size: f64,
    pub page: usize,
    /// True for runs sitting inside printed character boxes; the renderer
    /// nudges those by the pen offset
    pub in_box: bool,
}

/// Faults surfaced while walking a field's box grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LayoutFault {
    Overflow { capacity: usize, needed: usize },
    Consistency { detail: String },
}

/// Resolve every placement for one field's formatted value
pub(crate) fn resolve_placements(
    spec: &FieldSpec,
    value: &Formatted,
) -> Result<Vec<Placement>, LayoutFault> {
    if spec.mode == FormatMode::Checkbox {
        return tick_option(spec, &value.canonical);
    }

    let origin = spec.origin.ok_or_else(|| LayoutFault::Consistency {
        detail: "field has no origin".to_string(),
    })?;

    if spec.box_count == 0 {
        return Ok(free_run(spec, origin, &value.canonical));
    }
    if spec.rows > 1 {
        return grid_rows(spec, origin, &value.canonical);
    }
    if value.rtl {
        single_row_rtl(spec, origin, &value.canonical)
    } else {
        single_row_ltr(spec, origin, &value.canonical)
    }
}

fn tick_option(spec: &FieldSpec, label: &str) -> Result<Vec<Placement>, LayoutFault> {
    let at = spec
        .options
        .get(label)
        .ok_or_else(|| LayoutFault::Consistency {
            detail: format!("no coordinates for option '{label}'"),
        })?;

    Ok(vec![Placement {
        text: CHECK_GLYPH.to_string(),
        x: at.x,
        y: at.y,
        font_size: spec.font_size,
        page: spec.page,
        in_box: false,
    }])
}

/// Boxless field: the whole value goes down as one proportional run at
/// the field origin
fn free_run(spec: &FieldSpec, origin: Origin, text: &str) -> Vec<Placement> {
    vec![Placement {
        text: text.to_string(),
        x: origin.x,
        y: origin.y,
        font_size: spec.font_size,
        page: spec.page,
        in_box: false,
    }]
}

/// Multi-row box grid: glyphs flow left-to-right, top-to-bottom, wrapping
/// at word boundaries where the mode allows it
fn grid_rows(spec: &FieldSpec, origin: Origin, text: &str) -> Result<Vec<Placement>, LayoutFault> {
    let per_row = spec.chars_per_row.ok_or_else(|| LayoutFault::Consistency {
        detail: "multi-row field has no charsPerRow".to_string(),
    })?;
    let capacity = spec.rows * per_row;

    let cells = match spec.mode {
        FormatMode::PlainText => word_wrap_rows(text, spec.rows, per_row),
        _ => sequential_rows(text, per_row, capacity),
    };

    let needed = text.chars().count();
    if cells.is_none() {
        match spec.overflow {
            crate::schema::Overflow::Truncate => {}
            crate::schema::Overflow::Reject => {
                return Err(LayoutFault::Overflow { capacity, needed })
            }
        }
    }
    // Truncation: refit whatever prefix the grid holds
    let cells = cells.unwrap_or_else(|| match spec.mode {
        FormatMode::PlainText => truncate_wrapped(text, spec.rows, per_row),
        _ => {
            let prefix: String = text.chars().take(capacity).collect();
            sequential_rows(&prefix, per_row, capacity).unwrap_or_default()
        }
    });

    Ok(cells
        .into_iter()
        .filter(|(_, _, c)| *c != ' ')
        .map(|(row, col, c)| Placement {
            text: c.to_string(),
            x: origin.x + col as f64 * spec.box_advance,
            y: origin.y - row as f64 * spec.row_advance,
            font_size: spec.font_size,
            page: spec.page,
            in_box: true,
        })
        .collect())
}

/// Place glyphs row by row, breaking before a word that would straddle a
/// row edge when it can fit on the next row whole. Returns None when the
/// text does not fit the grid.
fn word_wrap_rows(text: &str, rows: usize, per_row: usize) -> Option<Vec<(usize, usize, char)>> {
    let mut cells = Vec::new();
    let mut row = 0;
    let mut col = 0;

    for word in text.split(' ') {
        let len = word.chars().count();

        // Break early for a word that fits a fresh row but not this one
        if col > 0 && col + 1 + len > per_row && len <= per_row {
            row += 1;
            col = 0;
        } else if col > 0 {
            // Space between words occupies a box
            col += 1;
            if col >= per_row {
                row += 1;
                col = 0;
            }
        }

        for c in word.chars() {
            if col >= per_row {
                row += 1;
                col = 0;
            }
            if row >= rows {
                return None;
            }
            cells.push((row, col, c));
            col += 1;
        }
    }

    Some(cells)
}

/// Word wrap that stops at the grid edge instead of failing
fn truncate_wrapped(text: &str, rows: usize, per_row: usize) -> Vec<(usize, usize, char)> {
    for take in (0..=text.chars().count()).rev() {
        let prefix: String = text.chars().take(take).collect();
        if let Some(cells) = word_wrap_rows(prefix.trim_end(), rows, per_row) {
            return cells;
        }
    }
    Vec::new()
}

/// Fill the grid cell by cell with no regard for word boundaries
fn sequential_rows(
    text: &str,
    per_row: usize,
    capacity: usize,
) -> Option<Vec<(usize, usize, char)>> {
    if text.chars().count() > capacity {
        return None;
    }
    Some(
        text.chars()
            .enumerate()
            .map(|(i, c)| (i / per_row, i % per_row, c))
            .collect(),
    )
}

/// Walk boxes left to right, one glyph per data box; skip boxes must meet a
/// separator glyph and vice versa
fn single_row_ltr(
    spec: &FieldSpec,
    origin: Origin,
    text: &str,
) -> Result<Vec<Placement>, LayoutFault> {
    let mut placements = Vec::new();
    let mut glyphs = text.chars().peekable();
    let mut x = origin.x;

    for index in 0..spec.box_count {
        let Some(&glyph) = glyphs.peek() else { break };
        check_slot(spec, index, glyph)?;
        glyphs.next();
        if glyph != ' ' {
            placements.push(Placement {
                text: glyph.to_string(),
                x,
                y: origin.y,
                font_size: spec.font_size,
                page: spec.page,
                in_box: true,
            });
        }
        x += spec.advance_after(index);
    }

    if let Some(extra) = glyphs.next() {
        return Err(LayoutFault::Consistency {
            detail: format!("glyph '{extra}' has no box to land in"),
        });
    }
    Ok(placements)
}

/// Right-aligned walk: start at the last box and pair glyphs from the end
/// of the value backwards
fn single_row_rtl(
    spec: &FieldSpec,
    origin: Origin,
    text: &str,
) -> Result<Vec<Placement>, LayoutFault> {
    // Absolute x of every box, accounting for per-gap advances
    let mut xs = Vec::with_capacity(spec.box_count);
    let mut x = origin.x;
    for index in 0..spec.box_count {
        xs.push(x);
        x += spec.advance_after(index);
    }

    let mut placements = Vec::new();
    let mut glyphs = text.chars().rev().peekable();

    for index in (0..spec.box_count).rev() {
        let Some(&glyph) = glyphs.peek() else { break };
        check_slot(spec, index, glyph)?;
        glyphs.next();
        if glyph != ' ' {
            placements.push(Placement {
                text: glyph.to_string(),
                x: xs[index],
                y: origin.y,
                font_size: spec.font_size,
                page: spec.page,
                in_box: true,
            });
        }
    }

    if let Some(extra) = glyphs.next() {
        return Err(LayoutFault::Consistency {
            detail: format!("glyph '{extra}' has no box to land in"),
        });
    }
    placements.reverse();
    Ok(placements)
}

/// A skip box must receive a separator glyph and, in the modes whose
/// formatter embeds separators, a data box must not. Text modes treat
/// punctuation as ordinary input.
fn check_slot(spec: &FieldSpec, index: usize, glyph: char) -> Result<(), LayoutFault> {
    let skip = spec.skip_boxes.contains(&index);
    if skip && !is_separator(glyph) {
        return Err(LayoutFault::Consistency {
            detail: format!("box {index} is a separator slot but glyph '{glyph}' is not a separator"),
        });
    }
    let embeds_separators = !matches!(spec.mode, FormatMode::PlainText | FormatMode::FreeText);
    if !skip && embeds_separators && is_separator(glyph) && glyph != ' ' {
        return Err(LayoutFault::Consistency {
            detail: format!("separator '{glyph}' landed on data box {index}"),
        });
    }
    Ok(())
}
