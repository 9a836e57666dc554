//! Error types for spec loading, validation and rendering

use thiserror::Error;

/// What went wrong with a single field's submitted value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldErrorKind {
    #[error("{reason}")]
    Format { reason: String },

    #[error("value needs {needed} boxes but only {capacity} are available")]
    Overflow { capacity: usize, needed: usize },
}

/// A recoverable per-field validation failure
///
/// Collected across all fields of a request; a failed render reports the
/// complete list rather than stopping at the first bad field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {kind}")]
pub struct FieldError {
    pub field: String,
    pub kind: FieldErrorKind,
}

impl FieldError {
    pub(crate) fn format(field: &str, reason: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            kind: FieldErrorKind::Format {
                reason: reason.into(),
            },
        }
    }

    pub(crate) fn overflow(field: &str, capacity: usize, needed: usize) -> Self {
        Self {
            field: field.to_string(),
            kind: FieldErrorKind::Overflow { capacity, needed },
        }
    }
}

/// Errors that can occur while rendering a request
#[derive(Debug, Error)]
pub enum RenderError {
    /// One or more fields failed validation; no partial output is produced
    #[error("{} field(s) failed validation", .0.len())]
    Invalid(Vec<FieldError>),

    /// A formatted value disagreed with its field's skip-box layout
    ///
    /// Internal invariant violation, never a user-facing validation message.
    #[error("box layout disagrees with field spec for '{field}': {detail}")]
    Consistency { field: String, detail: String },

    /// Background page size does not match the document spec
    #[error(
        "background page is {found_width:.2}x{found_height:.2} pt, \
         spec expects {want_width:.2}x{want_height:.2} pt"
    )]
    PageSizeMismatch {
        found_width: f64,
        found_height: f64,
        want_width: f64,
        want_height: f64,
    },

    #[error("overlay error: {0}")]
    Overlay(#[from] pdf_overlay::OverlayError),
}

/// Load-time field table errors; fatal, raised before any render
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("failed to parse document spec: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid field '{field}': {detail}")]
    InvalidField { field: String, detail: String },

    #[error("duplicate field id '{0}'")]
    DuplicateField(String),

    #[error("field '{field}' conditions on unknown field '{target}'")]
    UnknownConditionTarget { field: String, target: String },

    #[error("fields '{first}' and '{second}' overlap on page {page}")]
    Overlap {
        first: String,
        second: String,
        page: usize,
    },
}
