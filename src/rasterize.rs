//! Rasterization module
//!
//! Turns an input file's bytes into a [`PixelBuffer`]. Bitmaps are decoded
//! with the `image` crate at their native resolution; PDFs have their first
//! page rendered by ImageMagick onto an opaque white background.
//!
//! # Example
//!
//! ```rust,no_run
//! use label_print::rasterize::{rasterize, SourceKind};
//! use std::path::Path;
//!
//! let path = Path::new("label.png");
//! let kind = SourceKind::from_path(path).unwrap();
//! let bytes = std::fs::read(path).unwrap();
//! let buffer = rasterize(&bytes, kind, 300).unwrap();
//! println!("{}x{}", buffer.width(), buffer.height());
//! ```

use crate::buffer::PixelBuffer;
use crate::label::POINTS_PER_INCH;
use image::ImageFormat;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::{debug, warn};

/// Bitmap extensions accepted as input
pub const BITMAP_EXTENSIONS: [&str; 7] = [
    ".bmp", ".jpeg", ".jpg", ".png", ".tif", ".tiff", ".webp",
];

/// Document extensions accepted as input
pub const DOCUMENT_EXTENSIONS: [&str; 1] = [".pdf"];

/// Page size assumed when a PDF has no readable MediaBox (US Letter)
const FALLBACK_PAGE_SIZE_PT: (f64, f64) = (612.0, 792.0);

/// Rasterization error types
#[derive(Debug, Error)]
pub enum RasterizeError {
    #[error("Unsupported file format '{extension}'. Supported formats: {}", .supported.join(", "))]
    UnsupportedFormat {
        extension: String,
        supported: Vec<&'static str>,
    },

    #[error("Unreadable input: {0}")]
    UnreadableInput(String),
}

pub type Result<T> = std::result::Result<T, RasterizeError>;

/// Every accepted extension, sorted
pub fn supported_extensions() -> Vec<&'static str> {
    let mut all: Vec<&'static str> = BITMAP_EXTENSIONS
        .iter()
        .chain(DOCUMENT_EXTENSIONS.iter())
        .copied()
        .collect();
    all.sort_unstable();
    all
}

fn unsupported(extension: &str) -> RasterizeError {
    RasterizeError::UnsupportedFormat {
        extension: extension.to_string(),
        supported: supported_extensions(),
    }
}

/// Declared kind of an input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Raster image decoded as-is
    Bitmap(ImageFormat),
    /// Document whose first page is rendered
    Document,
}

impl SourceKind {
    /// Classify by file extension (case-insensitive, leading dot optional)
    pub fn from_extension(extension: &str) -> Result<Self> {
        let ext = extension.trim().to_ascii_lowercase();
        let ext = if ext.starts_with('.') {
            ext
        } else {
            format!(".{}", ext)
        };

        match ext.as_str() {
            ".bmp" => Ok(SourceKind::Bitmap(ImageFormat::Bmp)),
            ".jpg" | ".jpeg" => Ok(SourceKind::Bitmap(ImageFormat::Jpeg)),
            ".png" => Ok(SourceKind::Bitmap(ImageFormat::Png)),
            ".tif" | ".tiff" => Ok(SourceKind::Bitmap(ImageFormat::Tiff)),
            ".webp" => Ok(SourceKind::Bitmap(ImageFormat::WebP)),
            ".pdf" => Ok(SourceKind::Document),
            _ => Err(unsupported(&ext)),
        }
    }

    /// Classify by the extension of `path`
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();
        Self::from_extension(&ext)
    }

    /// Classify by MIME type
    pub fn from_mime(mime: &str) -> Result<Self> {
        let mime = mime.trim().to_ascii_lowercase();
        match mime.as_str() {
            "image/bmp" | "image/x-ms-bmp" => Ok(SourceKind::Bitmap(ImageFormat::Bmp)),
            "image/jpeg" | "image/jpg" => Ok(SourceKind::Bitmap(ImageFormat::Jpeg)),
            "image/png" => Ok(SourceKind::Bitmap(ImageFormat::Png)),
            "image/tiff" => Ok(SourceKind::Bitmap(ImageFormat::Tiff)),
            "image/webp" => Ok(SourceKind::Bitmap(ImageFormat::WebP)),
            "application/pdf" => Ok(SourceKind::Document),
            _ => Err(unsupported(&mime)),
        }
    }

    pub fn is_document(&self) -> bool {
        matches!(self, SourceKind::Document)
    }
}

/// Rasterization options
#[derive(Debug, Clone)]
pub struct RasterizeOptions {
    /// ImageMagick executable used to render PDF pages
    pub renderer: String,
}

impl Default for RasterizeOptions {
    fn default() -> Self {
        Self {
            renderer: "magick".to_string(),
        }
    }
}

impl RasterizeOptions {
    /// Create a new options builder
    pub fn builder() -> RasterizeOptionsBuilder {
        RasterizeOptionsBuilder::default()
    }
}

/// Builder for RasterizeOptions
#[derive(Debug, Default)]
pub struct RasterizeOptionsBuilder {
    options: RasterizeOptions,
}

impl RasterizeOptionsBuilder {
    /// Set the renderer executable
    #[must_use]
    pub fn renderer(mut self, renderer: impl Into<String>) -> Self {
        self.options.renderer = renderer.into();
        self
    }

    /// Build the options
    #[must_use]
    pub fn build(self) -> RasterizeOptions {
        self.options
    }
}

/// Rasterize `bytes` with the default renderer
pub fn rasterize(bytes: &[u8], kind: SourceKind, dpi: u32) -> Result<PixelBuffer> {
    rasterize_with(bytes, kind, dpi, &RasterizeOptions::default())
}

/// Rasterize `bytes` with explicit options
pub fn rasterize_with(
    bytes: &[u8],
    kind: SourceKind,
    dpi: u32,
    options: &RasterizeOptions,
) -> Result<PixelBuffer> {
    match kind {
        SourceKind::Bitmap(format) => decode_bitmap(bytes, format),
        SourceKind::Document => render_first_page(bytes, dpi, options),
    }
}

fn decode_bitmap(bytes: &[u8], format: ImageFormat) -> Result<PixelBuffer> {
    let img = image::load_from_memory_with_format(bytes, format).map_err(|e| {
        RasterizeError::UnreadableInput(format!("failed to decode {:?} image: {}", format, e))
    })?;

    debug!(
        width = img.width(),
        height = img.height(),
        color = ?img.color(),
        "Decoded bitmap"
    );

    Ok(PixelBuffer::from(img))
}

fn load_document(bytes: &[u8]) -> Result<lopdf::Document> {
    lopdf::Document::load_mem(bytes)
        .map_err(|e| RasterizeError::UnreadableInput(format!("invalid PDF: {}", e)))
}

/// Number of pages in a PDF
pub fn page_count(bytes: &[u8]) -> Result<usize> {
    Ok(load_document(bytes)?.get_pages().len())
}

/// Size of the first page in points, from its (possibly inherited) MediaBox
pub fn page_size_points(bytes: &[u8]) -> Result<(f64, f64)> {
    let doc = load_document(bytes)?;
    let first = doc
        .get_pages()
        .values()
        .next()
        .copied()
        .ok_or_else(|| RasterizeError::UnreadableInput("PDF has no pages".to_string()))?;

    Ok(media_box(&doc, first).unwrap_or(FALLBACK_PAGE_SIZE_PT))
}

fn number(obj: &lopdf::Object) -> Option<f64> {
    match obj {
        lopdf::Object::Integer(i) => Some(*i as f64),
        lopdf::Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

fn media_box(doc: &lopdf::Document, page: lopdf::ObjectId) -> Option<(f64, f64)> {
    let mut node = page;
    // Walk up the page tree; MediaBox is inheritable
    for _ in 0..32 {
        let dict = doc.get_dictionary(node).ok()?;
        if let Ok(obj) = dict.get(b"MediaBox") {
            let obj = match obj.as_reference() {
                Ok(id) => doc.get_object(id).ok()?,
                Err(_) => obj,
            };
            let values: Vec<f64> = obj.as_array().ok()?.iter().filter_map(number).collect();
            if values.len() == 4 {
                return Some(((values[2] - values[0]).abs(), (values[3] - values[1]).abs()));
            }
            return None;
        }
        node = dict.get(b"Parent").ok()?.as_reference().ok()?;
    }
    None
}

/// Pixel size a page of `page_pt` renders to at `dpi`
pub fn expected_render_size(page_pt: (f64, f64), dpi: u32) -> (u32, u32) {
    let scale = dpi as f64 / POINTS_PER_INCH;
    (
        (page_pt.0 * scale).round() as u32,
        (page_pt.1 * scale).round() as u32,
    )
}

fn render_first_page(bytes: &[u8], dpi: u32, options: &RasterizeOptions) -> Result<PixelBuffer> {
    let doc = load_document(bytes)?;
    let pages = doc.get_pages();
    let Some(&first) = pages.values().next() else {
        return Err(RasterizeError::UnreadableInput(
            "PDF has no pages".to_string(),
        ));
    };
    if pages.len() > 1 {
        debug!(pages = pages.len(), "Only the first page is rendered");
    }

    let page_pt = media_box(&doc, first).unwrap_or(FALLBACK_PAGE_SIZE_PT);
    let expected = expected_render_size(page_pt, dpi);
    debug!(
        width_pt = page_pt.0,
        height_pt = page_pt.1,
        dpi,
        ?expected,
        renderer = %options.renderer,
        "Rendering first PDF page"
    );

    let mut child = Command::new(&options.renderer)
        .arg("-density")
        .arg(dpi.to_string())
        .arg("-background")
        .arg("white")
        .arg("pdf:-[0]")
        .arg("-alpha")
        .arg("remove")
        .arg("-alpha")
        .arg("off")
        .arg("-colorspace")
        .arg("sRGB")
        .arg("png24:-")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            RasterizeError::UnreadableInput(format!(
                "PDF renderer '{}' could not be started: {}",
                options.renderer, e
            ))
        })?;

    // stdin is written on its own thread while stdout drains
    let writer = child.stdin.take().map(|mut stdin| {
        let input = bytes.to_vec();
        std::thread::spawn(move || stdin.write_all(&input))
    });

    let output = child.wait_with_output().map_err(|e| {
        RasterizeError::UnreadableInput(format!("PDF renderer failed: {}", e))
    })?;

    if let Some(handle) = writer {
        if let Ok(Err(e)) = handle.join() {
            warn!(error = %e, "Renderer closed stdin early");
        }
    }

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(RasterizeError::UnreadableInput(format!(
            "page render failed: {}",
            stderr.trim()
        )));
    }

    let img = image::load_from_memory_with_format(&output.stdout, ImageFormat::Png).map_err(
        |e| RasterizeError::UnreadableInput(format!("renderer produced no image: {}", e)),
    )?;

    if (img.width(), img.height()) != expected {
        debug!(
            actual = ?(img.width(), img.height()),
            ?expected,
            "Rendered size differs from MediaBox estimate"
        );
    }

    Ok(PixelBuffer::from(img))
}
