//! Field specification schema types

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::SpecError;
use crate::validate;

/// A point on the page, in points
///
/// Authored JSON measures `y` from the TOP edge of the page (matching how
/// coordinates are read off a scanned form). [`DocumentSpec::from_json`]
/// flips them, so a loaded spec always carries bottom-left PDF coordinates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Origin {
    pub x: f64,
    pub y: f64,
}

/// How a submitted value is normalized and expanded into glyphs
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FormatMode {
    /// Uppercased text, word-aware wrapping across box rows
    PlainText,

    /// Uppercased text, strict sequential fill (no word wrapping)
    FreeText,

    /// Exactly 12 digits, separators embedded at the skip boxes
    IdNumber,

    /// Generic digit field (phone, membership, tenure)
    Digits,

    /// Non-negative whole amount with thousands grouping
    Number,

    /// Non-negative amount with thousands grouping and two cent digits
    DecimalCurrency,

    /// Day-month-year date, canonicalized to `DD-MM-YYYY`
    Date,

    /// One tick glyph at the matched option's coordinate
    Checkbox,
}

/// Box fill direction
///
/// `ByDigit` picks the direction per value: left-to-right when the digit at
/// `index` equals `value`, right-to-left otherwise. Used for phone fields
/// where mobile numbers anchor left and landline numbers anchor right.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    Ltr,
    Rtl,
    ByDigit { index: usize, value: char },
}

impl Default for Direction {
    fn default() -> Self {
        Direction::Ltr
    }
}

/// What to do when a value needs more boxes than the field has
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Overflow {
    #[default]
    Reject,
    Truncate,
}

/// Render a field only when another field's submitted value matches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    /// Field id whose value is inspected
    pub field: String,

    /// Required value (compared case-insensitively)
    pub equals: String,
}

fn default_font_size() -> f64 {
    10.0
}

fn default_rows() -> usize {
    1
}

fn default_page() -> usize {
    1
}

/// Per-field layout and format descriptor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    /// Unique field key
    pub id: String,

    /// Human-readable label, used in error messages
    #[serde(default)]
    pub label: Option<String>,

    /// Format mode
    pub mode: FormatMode,

    /// Position of the first box (absent for checkbox fields)
    #[serde(default)]
    pub origin: Option<Origin>,

    /// Total number of boxes; 0 means a boxless glyph run from `origin`
    #[serde(default)]
    pub box_count: usize,

    /// Horizontal distance between consecutive box origins (width + gap)
    #[serde(default)]
    pub box_advance: f64,

    /// Box indices reserved for separator glyphs, never for input glyphs
    #[serde(default)]
    pub skip_boxes: BTreeSet<usize>,

    /// Per-skip-box advance override (separator boxes are often narrower)
    #[serde(default)]
    pub skip_advance: BTreeMap<usize, f64>,

    /// Fill direction
    #[serde(default)]
    pub direction: Direction,

    /// Font size in points
    #[serde(default = "default_font_size")]
    pub font_size: f64,

    /// Maximum accepted input glyphs, before separators
    #[serde(default)]
    pub max_length: Option<usize>,

    /// Number of stacked box rows
    #[serde(default = "default_rows")]
    pub rows: usize,

    /// Boxes per row (required when `rows > 1`)
    #[serde(default)]
    pub chars_per_row: Option<usize>,

    /// Vertical distance between rows, downward
    #[serde(default)]
    pub row_advance: f64,

    /// Overflow policy
    #[serde(default)]
    pub overflow: Overflow,

    /// Skip uppercase normalization (email fields)
    #[serde(default)]
    pub preserve_case: bool,

    /// Render only when another field carries a specific value
    #[serde(default)]
    pub condition: Option<Condition>,

    /// Checkbox option label -> tick coordinate
    #[serde(default)]
    pub options: BTreeMap<String, Origin>,

    /// Page to render on (1-indexed)
    #[serde(default = "default_page")]
    pub page: usize,
}

impl FieldSpec {
    /// Label for error messages, falling back to the id
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }

    /// Number of input glyphs the boxes can hold, `None` for boxless fields
    pub fn capacity(&self) -> Option<usize> {
        if self.box_count == 0 {
            None
        } else {
            Some(self.box_count - self.skip_boxes.len())
        }
    }

    /// Pen advance from box `index` to the next box
    pub fn advance_after(&self, index: usize) -> f64 {
        self.skip_advance
            .get(&index)
            .copied()
            .unwrap_or(self.box_advance)
    }
}

/// A complete per-document field table
///
/// Loaded and validated once, immutable afterwards, safe for unbounded
/// concurrent reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSpec {
    /// Document name (used in logs)
    pub name: String,

    /// Page width in points
    pub page_width: f64,

    /// Page height in points
    pub page_height: f64,

    /// Field table
    pub fields: Vec<FieldSpec>,
}

impl DocumentSpec {
    /// Parse, flip to bottom-left coordinates, and validate a field table
    pub fn from_json(json: &str) -> Result<Self, SpecError> {
        let mut spec: DocumentSpec = serde_json::from_str(json)?;
        spec.flip_vertical();
        validate::check(&spec)?;
        Ok(spec)
    }

    /// Look up a field by id
    pub fn field(&self, id: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.id == id)
    }

    fn flip_vertical(&mut self) {
        let height = self.page_height;
        for field in &mut self.fields {
            if let Some(origin) = &mut field.origin {
                origin.y = height - origin.y;
            }
            for coord in field.options.values_mut() {
                coord.y = height - coord.y;
            }
        }
    }
}
