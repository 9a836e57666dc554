//! Rendering pipeline
//!
//! Collects submitted values, formats and lays out every applicable field,
//! then stamps the resulting glyph placements over the background PDF.

use std::collections::HashMap;

use pdf_overlay::Overlay;
use tracing::{debug, error, info};

use crate::error::{FieldError, RenderError};
use crate::format::format_value;
use crate::layout::{resolve_placements, LayoutFault, Placement};
use crate::schema::DocumentSpec;

/// Nudge applied to box-grid glyphs so each sits visually centered in its
/// printed box rather than flush against the box edge. Checkbox ticks and
/// boxless runs are stamped at their raw coordinates.
const PEN_OFFSET_X: f64 = 2.0;
const PEN_OFFSET_Y: f64 = -3.0;

/// Largest tolerated difference between the background page size and the
/// size the field table was authored against, in points
const PAGE_SIZE_TOLERANCE: f64 = 1.0;

/// Submitted values keyed by field id
#[derive(Debug, Default, Clone)]
pub struct RenderRequest {
    values: HashMap<String, String>,
}

impl RenderRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.values.insert(field.into(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }
}

impl<K, V> FromIterator<(K, V)> for RenderRequest
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// The blank form the placements are stamped onto
pub struct Background {
    overlay: Overlay,
}

impl Background {
    /// Open a background PDF and verify its first page matches the size
    /// the field table was authored against
    pub fn new(bytes: &[u8], spec: &DocumentSpec) -> Result<Self, RenderError> {
        let overlay = Overlay::open_from_bytes(bytes)?;
        let (width, height) = overlay.page_size(1)?;

        if (width - spec.page_width).abs() > PAGE_SIZE_TOLERANCE
            || (height - spec.page_height).abs() > PAGE_SIZE_TOLERANCE
        {
            return Err(RenderError::PageSizeMismatch {
                found_width: width,
                found_height: height,
                want_width: spec.page_width,
                want_height: spec.page_height,
            });
        }

        Ok(Self { overlay })
    }

    pub fn page_count(&self) -> usize {
        self.overlay.page_count()
    }
}

/// Format and lay out every applicable field without touching a PDF.
///
/// Field-level faults (bad values, overflow under the reject policy) are
/// accumulated and reported together; a consistency fault means the field
/// table itself is wrong and aborts immediately.
pub fn plan(spec: &DocumentSpec, request: &RenderRequest) -> Result<Vec<Placement>, RenderError> {
    let mut placements = Vec::new();
    let mut faults: Vec<FieldError> = Vec::new();

    for field in &spec.fields {
        let Some(raw) = request.get(&field.id) else {
            continue;
        };
        if raw.trim().is_empty() {
            continue;
        }
        if !condition_met(request, field) {
            debug!(field = %field.id, "condition not met, skipping");
            continue;
        }

        let formatted = match format_value(field, raw) {
            Ok(v) => v,
            Err(fault) => {
                faults.push(fault);
                continue;
            }
        };

        match resolve_placements(field, &formatted) {
            Ok(mut out) => placements.append(&mut out),
            Err(LayoutFault::Overflow { capacity, needed }) => {
                faults.push(FieldError::overflow(&field.id, capacity, needed));
            }
            Err(LayoutFault::Consistency { detail }) => {
                error!(field = %field.id, %detail, "field table is inconsistent");
                return Err(RenderError::Consistency {
                    field: field.id.clone(),
                    detail,
                });
            }
        }
    }

    if !faults.is_empty() {
        return Err(RenderError::Invalid(faults));
    }

    debug!(placements = placements.len(), "layout complete");
    Ok(placements)
}

fn condition_met(request: &RenderRequest, field: &crate::schema::FieldSpec) -> bool {
    let Some(cond) = &field.condition else {
        return true;
    };

    match request.get(&cond.field) {
        Some(value) => value.trim().eq_ignore_ascii_case(cond.equals.trim()),
        None => false,
    }
}

/// Stamp a filled form: plan the placements, draw each glyph onto the
/// background and return the finished PDF bytes
pub fn render(
    spec: &DocumentSpec,
    request: &RenderRequest,
    background: Background,
) -> Result<Vec<u8>, RenderError> {
    let placements = plan(spec, request)?;
    let mut overlay = background.overlay;

    for p in &placements {
        let (x, y) = pen_position(p);
        overlay.draw_text(p.page, &p.text, x, y, p.font_size)?;
    }

    info!(
        form = %spec.name,
        runs = placements.len(),
        "form rendered"
    );
    Ok(overlay.to_bytes()?)
}

/// Where the pen lands for a placement: box-grid runs get the pen offset,
/// anything else is stamped where it was planned
fn pen_position(p: &Placement) -> (f64, f64) {
    if p.in_box {
        (p.x + PEN_OFFSET_X, p.y + PEN_OFFSET_Y)
    } else {
        (p.x, p.y)
    }
}
