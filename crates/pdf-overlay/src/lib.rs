//! PDF Overlay - Glyph-level text stamping onto existing PDF pages
//!
//! This crate provides functionality for:
//! - Opening a base PDF form from bytes
//! - Stamping short text runs (typically single characters) at exact coordinates
//! - Saving the merged document back to bytes
//!
//! Text uses the built-in Helvetica font, so no font embedding is needed.
//! Coordinates are PDF-native: origin at the bottom-left of the page.
//!
//! # Example
//!
//! ```ignore
//! use pdf_overlay::Overlay;
//!
//! let mut overlay = Overlay::open_from_bytes(&base_pdf)?;
//! overlay.draw_text(1, "A", 100.0, 700.0, 11.0)?;
//! let filled = overlay.to_bytes()?;
//! ```

use std::collections::HashMap;

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during overlay operations
#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("Failed to open PDF: {0}")]
    OpenError(String),

    #[error("Failed to save PDF: {0}")]
    SaveError(String),

    #[error("Invalid page number: {0} (document has {1} pages)")]
    InvalidPage(usize, usize),

    #[error("PDF parsing error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Lopdf error: {0}")]
    LopdfError(#[from] lopdf::Error),
}

/// Result type for overlay operations
pub type Result<T> = std::result::Result<T, OverlayError>;

/// Resource name the stamped font is registered under on each page
const FONT_RESOURCE: &str = "Fbx1";

/// Built-in Type1 font used for all stamped text
const BASE_FONT: &str = "Helvetica";

/// An open PDF document accepting text stamps on its pages.
///
/// Text is buffered during drawing and merged into page content streams
/// during [`Overlay::to_bytes`], so each touched page gains exactly one
/// new content stream regardless of how many glyphs were stamped.
pub struct Overlay {
    inner: Document,
    page_count: usize,

    /// Buffered operator bytes per page number (1-based), flushed at save
    page_content_buffer: HashMap<usize, Vec<u8>>,

    /// Indirect object for the stamped font, created on first save
    font_id: Option<ObjectId>,
}

impl Overlay {
    /// Open a PDF document from a byte slice
    pub fn open_from_bytes(data: &[u8]) -> Result<Self> {
        let inner = Document::load_mem(data).map_err(|e| OverlayError::OpenError(e.to_string()))?;
        let page_count = inner.get_pages().len();
        Ok(Self {
            inner,
            page_count,
            page_content_buffer: HashMap::new(),
            font_id: None,
        })
    }

    /// Number of pages in the document
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Page dimensions in points as `(width, height)`
    ///
    /// Follows the Pages tree parent chain when the page object does not
    /// carry its own MediaBox.
    pub fn page_size(&self, page: usize) -> Result<(f64, f64)> {
        let pages = self.inner.get_pages();
        let page_id = *pages
            .get(&(page as u32))
            .ok_or(OverlayError::InvalidPage(page, self.page_count))?;

        let media_box = self.get_inherited_media_box(page_id)?;
        if media_box.len() < 4 {
            return Err(OverlayError::ParseError(
                "Invalid MediaBox format".to_string(),
            ));
        }

        let coord = |i: usize| -> Result<f64> {
            media_box[i]
                .as_f32()
                .map(|v| v as f64)
                .ok()
                .or_else(|| media_box[i].as_i64().ok().map(|v| v as f64))
                .ok_or_else(|| {
                    OverlayError::ParseError(format!("Invalid MediaBox coordinate {i}"))
                })
        };

        let (x1, y1, x2, y2) = (coord(0)?, coord(1)?, coord(2)?, coord(3)?);
        Ok((x2 - x1, y2 - y1))
    }

    /// Buffer a text run at the given position
    ///
    /// # Arguments
    /// * `page` - Page number (1-based)
    /// * `text` - Text to stamp (drawn as a single run)
    /// * `x` - X coordinate in points, from the left edge
    /// * `y` - Y coordinate in points, from the bottom edge
    /// * `size` - Font size in points
    pub fn draw_text(&mut self, page: usize, text: &str, x: f64, y: f64, size: f64) -> Result<()> {
        if page == 0 || page > self.page_count {
            return Err(OverlayError::InvalidPage(page, self.page_count));
        }

        let escaped = escape_string_literal(text);
        let ops = format!("BT\n/{FONT_RESOURCE} {size} Tf\n{x} {y} Td\n({escaped}) Tj\nET\n");
        self.page_content_buffer
            .entry(page)
            .or_default()
            .extend_from_slice(ops.as_bytes());
        Ok(())
    }

    /// Merge all buffered text into the document and serialize it
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        self.flush_content_buffers()?;

        let mut buffer = Vec::new();
        self.inner
            .save_to(&mut buffer)
            .map_err(|e| OverlayError::SaveError(e.to_string()))?;
        Ok(buffer)
    }

    /// Flush buffered operators, registering the font on every touched page
    fn flush_content_buffers(&mut self) -> Result<()> {
        // Take ownership of the buffer to avoid borrow issues
        let mut buffers: Vec<(usize, Vec<u8>)> = self.page_content_buffer.drain().collect();
        buffers.sort_by_key(|(page, _)| *page);

        for (page, content) in buffers {
            if content.is_empty() {
                continue;
            }
            debug!(page, bytes = content.len(), "flushing stamped text");
            let font_id = self.ensure_font();
            self.add_font_to_page_resources(page, font_id)?;
            self.append_to_content_stream(page, &content)?;
        }

        Ok(())
    }

    /// Get or create the indirect font object for stamped text
    fn ensure_font(&mut self) -> ObjectId {
        if let Some(id) = self.font_id {
            return id;
        }
        let id = self.inner.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => BASE_FONT,
        });
        self.font_id = Some(id);
        id
    }

    /// Register the stamped font in a page's Resources dictionary
    fn add_font_to_page_resources(&mut self, page: usize, font_id: ObjectId) -> Result<()> {
        let pages = self.inner.get_pages();
        let page_id = *pages
            .get(&(page as u32))
            .ok_or(OverlayError::InvalidPage(page, self.page_count))?;

        let page_obj = self.inner.get_object(page_id)?;
        let page_dict = page_obj
            .as_dict()
            .map_err(|_| OverlayError::ParseError("Page object is not a dictionary".to_string()))?;

        // Get or create Resources dictionary
        let mut resources_dict = match page_dict.get(b"Resources") {
            Ok(resources) => match resources.as_dict() {
                Ok(dict) => dict.clone(),
                Err(_) => Dictionary::new(),
            },
            Err(_) => Dictionary::new(),
        };

        // Get or create Font dictionary in Resources
        let mut font_dict = match resources_dict.get(b"Font") {
            Ok(font) => match font.as_dict() {
                Ok(dict) => dict.clone(),
                Err(_) => Dictionary::new(),
            },
            Err(_) => Dictionary::new(),
        };

        font_dict.set(FONT_RESOURCE.as_bytes(), Object::Reference(font_id));
        resources_dict.set(b"Font", Object::Dictionary(font_dict));

        // Update page dictionary
        let mut new_page_dict = page_dict.clone();
        new_page_dict.set(b"Resources", Object::Dictionary(resources_dict));

        // Replace page object by creating a new one
        self.inner.objects.insert(page_id, new_page_dict.into());

        Ok(())
    }

    /// Append content to a page's content stream
    ///
    /// Handles both compressed and uncompressed content streams.
    fn append_to_content_stream(&mut self, page: usize, content: &[u8]) -> Result<()> {
        let pages = self.inner.get_pages();
        let page_id = *pages
            .get(&(page as u32))
            .ok_or(OverlayError::InvalidPage(page, self.page_count))?;

        // First pass: extract page dict and gather the existing content.
        // We need to clone data to avoid borrowing issues.
        let (existing_content, page_dict_clone) = {
            let page_obj = self.inner.get_object(page_id)?;
            let page_dict = page_obj.as_dict().map_err(|_| {
                OverlayError::ParseError("Page object is not a dictionary".to_string())
            })?;

            let page_dict_clone = page_dict.clone();

            let existing_content = match page_dict.get(b"Contents") {
                Ok(contents) => {
                    match contents {
                        Object::Stream(stream) => {
                            // Single stream - decompress if needed
                            stream
                                .decompressed_content()
                                .unwrap_or_else(|_| stream.content.clone())
                        }
                        Object::Reference(ref_id) => {
                            // Contents is a reference to a stream object
                            if let Ok(Object::Stream(stream)) = self.inner.get_object(*ref_id) {
                                stream
                                    .decompressed_content()
                                    .unwrap_or_else(|_| stream.content.clone())
                            } else {
                                Vec::new()
                            }
                        }
                        Object::Array(arr) => {
                            // Array of streams or references - concatenate them
                            let mut combined = Vec::new();
                            for obj in arr {
                                match obj {
                                    Object::Reference(ref_id) => {
                                        if let Ok(Object::Stream(stream)) =
                                            self.inner.get_object(*ref_id)
                                        {
                                            let data = stream
                                                .decompressed_content()
                                                .unwrap_or_else(|_| stream.content.clone());
                                            combined.extend_from_slice(&data);
                                        }
                                    }
                                    Object::Stream(stream) => {
                                        let data = stream
                                            .decompressed_content()
                                            .unwrap_or_else(|_| stream.content.clone());
                                        combined.extend_from_slice(&data);
                                    }
                                    _ => {}
                                }
                            }
                            combined
                        }
                        _ => Vec::new(),
                    }
                }
                Err(_) => Vec::new(),
            };

            (existing_content, page_dict_clone)
        };

        // Append new content after a separating newline so the stamped
        // operators never fuse with the last token of the base stream.
        let mut new_content = existing_content;
        if !new_content.is_empty() && !new_content.ends_with(b"\n") {
            new_content.push(b'\n');
        }
        new_content.extend_from_slice(content);

        // Create new stream and add as indirect object
        let new_stream = Stream::new(Dictionary::new(), new_content);
        let stream_id = self.inner.add_object(new_stream);

        // Update page dictionary with reference to stream
        let mut new_page_dict = page_dict_clone;
        new_page_dict.set(b"Contents", Object::Reference(stream_id));

        // Replace page object
        self.inner.objects.insert(page_id, new_page_dict.into());

        Ok(())
    }

    /// Get MediaBox, following parent inheritance chain if needed
    fn get_inherited_media_box(&self, page_id: ObjectId) -> Result<Vec<Object>> {
        let mut current_id = page_id;

        // Follow parent chain up to 10 levels (safety limit)
        for _ in 0..10 {
            let obj = self.inner.get_object(current_id)?;
            let dict = obj.as_dict().map_err(|_| {
                OverlayError::ParseError("Object is not a dictionary".to_string())
            })?;

            if let Ok(media_box) = dict.get(b"MediaBox").or_else(|_| dict.get(b"CropBox")) {
                // Handle both direct array and reference
                let media_box_array = match media_box {
                    Object::Array(arr) => arr.clone(),
                    Object::Reference(ref_id) => {
                        let referred = self.inner.get_object(*ref_id)?;
                        referred
                            .as_array()
                            .map_err(|_| {
                                OverlayError::ParseError(
                                    "MediaBox reference is not an array".to_string(),
                                )
                            })?
                            .clone()
                    }
                    _ => {
                        return Err(OverlayError::ParseError(
                            "MediaBox is not an array".to_string(),
                        ))
                    }
                };
                return Ok(media_box_array);
            }

            // Follow Parent reference
            if let Ok(Object::Reference(parent_id)) = dict.get(b"Parent") {
                current_id = *parent_id;
                continue;
            }

            break;
        }

        // Fallback: assume A4 page size
        Ok(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(595.28),
            Object::Real(841.89),
        ])
    }

    /// Get a reference to the underlying lopdf document
    pub fn inner(&self) -> &Document {
        &self.inner
    }
}

/// Escape the characters PDF string literals reserve
fn escape_string_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}
