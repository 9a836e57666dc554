//! Form Engine - coordinate-box form filling
//!
//! This crate provides:
//! - Field specification schema types and JSON loading
//! - Load-time validation of field geometry invariants
//! - Value formatting per field mode (text, id number, currency, date, ...)
//! - Box layout resolution (left-to-right, right-to-left, multi-row, skip boxes)
//! - A render pipeline that stamps resolved glyphs onto a background PDF
//!
//! # Example
//!
//! ```ignore
//! use form_engine::{Background, DocumentSpec, RenderRequest};
//!
//! let spec = DocumentSpec::from_json(spec_json)?;
//! let background = Background::new(base_pdf_bytes, &spec)?;
//!
//! let mut request = RenderRequest::new();
//! request.set("ic_number", "850805106789");
//! request.set("monthly_salary", "5000");
//!
//! let filled = form_engine::render(&spec, &request, background)?;
//! ```

mod error;
mod format;
mod layout;
mod render;
mod schema;
mod validate;

pub use error::{FieldError, FieldErrorKind, RenderError, SpecError};
pub use layout::Placement;
pub use render::{plan, render, Background, RenderRequest};
pub use schema::{Condition, Direction, DocumentSpec, FieldSpec, FormatMode, Origin, Overflow};
