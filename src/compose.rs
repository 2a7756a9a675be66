//! Page Composition module
//!
//! Places one or two resized labels side by side on a single landscape page
//! and serializes the result as PDF.
//!
//! # Layout
//!
//! The page is split into two equal halves. Each label is centered in its
//! half at its physical size; a single label occupies the left half.
//!
//! # Example
//!
//! ```rust
//! use label_print::compose::layout;
//! use label_print::{LabelSize, PageSpec};
//!
//! let placements = layout(2, LabelSize::FOUR_BY_SIX, &PageSpec::default());
//! assert_eq!(placements[0].x_pt, 54.0);
//! assert_eq!(placements[1].x_pt, 450.0);
//! assert_eq!(placements[0].y_pt, 90.0);
//! ```

use crate::buffer::{PixelBuffer, PixelFormat};
use crate::label::{LabelSize, PageSpec, POINTS_PER_INCH};
use crate::util::points_to_mm;
use printpdf::{
    ColorBits, ColorSpace, Image, ImageTransform, ImageXObject, Mm, PdfDocument,
    PdfLayerReference, Px,
};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Document title written into the PDF metadata
pub const DOCUMENT_TITLE: &str = "Shipping Label";

/// Maximum labels per page
pub const MAX_LABELS: usize = 2;

/// Page composition error types
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("Expected 1 or 2 labels, got {0}")]
    LabelCount(usize),

    #[error("Failed to embed label: {0}")]
    EmbeddingFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ComposeError>;

/// Position and size of one label on the page, in points from the
/// bottom-left corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x_pt: f64,
    pub y_pt: f64,
    pub width_pt: f64,
    pub height_pt: f64,
}

/// Serialized single-page PDF
#[derive(Debug, Clone)]
pub struct LabelDocument {
    pub bytes: Vec<u8>,
    pub placements: Vec<Placement>,
    pub page_width_pt: f64,
    pub page_height_pt: f64,
}

impl LabelDocument {
    /// Write the PDF bytes to `path`
    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, &self.bytes)?;
        Ok(())
    }

    /// Serialized size in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Label positions for `count` labels (at most two) of `size` on `page`
///
/// Labels wider than half the page are not clamped and may start at a
/// negative x.
pub fn layout(count: usize, size: LabelSize, page: &PageSpec) -> Vec<Placement> {
    let half = page.width_pt() / 2.0;
    let (width_pt, height_pt) = size.points();
    let inset = (half - width_pt) / 2.0;
    let y_pt = (page.height_pt() - height_pt) / 2.0;

    [inset, half + inset]
        .into_iter()
        .take(count.min(MAX_LABELS))
        .map(|x_pt| Placement {
            x_pt,
            y_pt,
            width_pt,
            height_pt,
        })
        .collect()
}

/// Compose labels onto one page and serialize it as PDF
pub fn compose(labels: &[PixelBuffer], size: LabelSize, page: &PageSpec) -> Result<LabelDocument> {
    if labels.is_empty() || labels.len() > MAX_LABELS {
        return Err(ComposeError::LabelCount(labels.len()));
    }
    for label in labels {
        check_embeddable(label)?;
    }

    let page_width_pt = page.width_pt();
    let page_height_pt = page.height_pt();
    let (doc, page_index, layer_index) = PdfDocument::new(
        DOCUMENT_TITLE,
        Mm(points_to_mm(page_width_pt)),
        Mm(points_to_mm(page_height_pt)),
        "Layer 1",
    );
    let layer = doc.get_page(page_index).get_layer(layer_index);

    let placements = layout(labels.len(), size, page);
    for (label, placement) in labels.iter().zip(&placements) {
        add_label_to_layer(&layer, label, placement);
    }

    let bytes = doc
        .save_to_bytes()
        .map_err(|e| ComposeError::EmbeddingFailed(e.to_string()))?;

    debug!(
        labels = labels.len(),
        bytes = bytes.len(),
        page_width_pt,
        page_height_pt,
        "Composed label page"
    );

    Ok(LabelDocument {
        bytes,
        placements,
        page_width_pt,
        page_height_pt,
    })
}

fn check_embeddable(label: &PixelBuffer) -> Result<()> {
    if label.is_empty() {
        return Err(ComposeError::EmbeddingFailed(format!(
            "label image is {}x{} px",
            label.width(),
            label.height()
        )));
    }
    if label.format().has_alpha() {
        return Err(ComposeError::EmbeddingFailed(
            "label image carries an alpha channel; flatten it first".into(),
        ));
    }
    let expected =
        label.width() as usize * label.height() as usize * label.format().channels();
    if label.data().len() != expected {
        return Err(ComposeError::EmbeddingFailed(format!(
            "pixel data is {} bytes, expected {}",
            label.data().len(),
            expected
        )));
    }
    Ok(())
}

/// Embed a label as an image XObject scaled to its physical size
fn add_label_to_layer(layer: &PdfLayerReference, label: &PixelBuffer, placement: &Placement) {
    let color_space = match label.format() {
        PixelFormat::Gray8 => ColorSpace::Greyscale,
        _ => ColorSpace::Rgb,
    };

    let xobject = ImageXObject {
        width: Px(label.width() as usize),
        height: Px(label.height() as usize),
        color_space,
        bits_per_component: ColorBits::Bit8,
        interpolate: true,
        image_data: label.data().to_vec(),
        image_filter: None,
        smask: None,
        clipping_bbox: None,
    };

    // At 72 dpi one pixel is one point, so the scale is points per pixel
    let transform = ImageTransform {
        translate_x: Some(Mm(points_to_mm(placement.x_pt))),
        translate_y: Some(Mm(points_to_mm(placement.y_pt))),
        dpi: Some(POINTS_PER_INCH as f32),
        scale_x: Some((placement.width_pt / label.width() as f64) as f32),
        scale_y: Some((placement.height_pt / label.height() as f64) as f32),
        ..Default::default()
    };

    Image::from(xobject).add_to_layer(layer.clone(), transform);
}
