//! Label Resizing module
//!
//! Maps a label image onto the exact pixel grid of a physical label size.
//!
//! # Fit modes
//!
//! - `Fit`: uniform scale so the whole image fits, centered on white
//! - `Fill`: uniform scale so the image covers the box, overflow cropped
//!   equally from both sides. The crop happens on the source, so only the
//!   visible window is ever resampled
//! - `Stretch`: independent scaling per axis
//!
//! # Example
//!
//! ```rust
//! use label_print::resize::{plan, resize};
//! use label_print::{FitMode, LabelSize, PixelBuffer};
//!
//! let geometry = plan(2000, 1000, (1200, 1800), FitMode::Fit).unwrap();
//! assert_eq!(geometry.scaled, (1200, 600));
//! assert_eq!(geometry.offset, (0, 600));
//!
//! let label = resize(PixelBuffer::white(400, 600), LabelSize::FOUR_BY_SIX, 100, FitMode::Fit).unwrap();
//! assert_eq!(label.dimensions(), (400, 600));
//! ```

use crate::buffer::{PixelBuffer, Rect};
use crate::label::{FitMode, LabelSize};
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage};
use thiserror::Error;
use tracing::debug;

/// Resize error types
#[derive(Debug, Error, PartialEq)]
pub enum ResizeError {
    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),
}

pub type Result<T> = std::result::Result<T, ResizeError>;

/// Resampling filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Resampler {
    /// Nearest neighbor (fastest, blocky)
    Nearest,
    /// Bilinear
    Triangle,
    /// Bicubic
    CatmullRom,
    /// Lanczos3 (sharpest text)
    #[default]
    Lanczos3,
}

impl Resampler {
    fn filter_type(self) -> FilterType {
        match self {
            Resampler::Nearest => FilterType::Nearest,
            Resampler::Triangle => FilterType::Triangle,
            Resampler::CatmullRom => FilterType::CatmullRom,
            Resampler::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Resize options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResizeOptions {
    pub resampler: Resampler,
}

impl ResizeOptions {
    /// Create a new options builder
    pub fn builder() -> ResizeOptionsBuilder {
        ResizeOptionsBuilder::default()
    }

    /// Nearest-neighbor preset for previews and benchmarks
    pub fn fast() -> Self {
        Self {
            resampler: Resampler::Nearest,
        }
    }
}

/// Builder for ResizeOptions
#[derive(Debug, Default)]
pub struct ResizeOptionsBuilder {
    options: ResizeOptions,
}

impl ResizeOptionsBuilder {
    /// Set resampler
    #[must_use]
    pub fn resampler(mut self, resampler: Resampler) -> Self {
        self.options.resampler = resampler;
        self
    }

    /// Build the options
    #[must_use]
    pub fn build(self) -> ResizeOptions {
        self.options
    }
}

/// Resize geometry
///
/// For `Fit`, `offset` is where the scaled image is pasted on the canvas.
/// For `Fill`, it is the top-left corner of the crop window inside the
/// scaled image. `Stretch` always has `scaled == target` and a zero offset.
///
/// `source_window` is the part of the source that ends up on the label:
/// the whole image for `Fit` and `Stretch`, the centered crop for `Fill`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizePlan {
    pub fit: FitMode,
    pub target: (u32, u32),
    pub scaled: (u32, u32),
    pub offset: (u32, u32),
    pub source_window: Rect,
}

/// Compute the resize geometry for a `src_w` x `src_h` image
pub fn plan(src_w: u32, src_h: u32, target: (u32, u32), fit: FitMode) -> Result<ResizePlan> {
    let (tw, th) = target;
    if src_w == 0 || src_h == 0 {
        return Err(ResizeError::InvalidDimensions(format!(
            "source image is {}x{} px",
            src_w, src_h
        )));
    }
    if tw == 0 || th == 0 {
        return Err(ResizeError::InvalidDimensions(format!(
            "target is {}x{} px",
            tw, th
        )));
    }

    let sx = tw as f64 / src_w as f64;
    let sy = th as f64 / src_h as f64;

    let full = Rect::full(src_w, src_h);
    let (scaled, offset, source_window) = match fit {
        FitMode::Stretch => (target, (0, 0), full),
        FitMode::Fill => {
            let scale = sx.max(sy);
            let nw = ((src_w as f64 * scale).round() as u32).max(tw);
            let nh = ((src_h as f64 * scale).round() as u32).max(th);

            // Target box mapped back onto the source
            let ww = ((tw as f64 / scale).round() as u32).clamp(1, src_w);
            let wh = ((th as f64 / scale).round() as u32).clamp(1, src_h);
            let window = Rect::new((src_w - ww) / 2, (src_h - wh) / 2, ww, wh);

            ((nw, nh), ((nw - tw) / 2, (nh - th) / 2), window)
        }
        FitMode::Fit => {
            let scale = sx.min(sy);
            let nw = ((src_w as f64 * scale).round() as u32).clamp(1, tw);
            let nh = ((src_h as f64 * scale).round() as u32).clamp(1, th);
            ((nw, nh), ((tw - nw) / 2, (th - nh) / 2), full)
        }
    };

    Ok(ResizePlan {
        fit,
        target,
        scaled,
        offset,
        source_window,
    })
}

/// Target pixel size for a label, validating the physical size and dpi
pub fn target_dimensions(label_size: LabelSize, dpi: u32) -> Result<(u32, u32)> {
    if !label_size.is_valid() {
        return Err(ResizeError::InvalidDimensions(format!(
            "label size {}x{} in",
            label_size.width_in, label_size.height_in
        )));
    }
    if dpi == 0 {
        return Err(ResizeError::InvalidDimensions("dpi must be positive".into()));
    }

    let (tw, th) = label_size.pixel_dimensions(dpi);
    if tw == 0 || th == 0 {
        return Err(ResizeError::InvalidDimensions(format!(
            "label {} at {} dpi is {}x{} px",
            label_size, dpi, tw, th
        )));
    }
    Ok((tw, th))
}

/// Resize a label to `label_size` at `dpi` with the default Lanczos3 filter
pub fn resize(
    buffer: PixelBuffer,
    label_size: LabelSize,
    dpi: u32,
    fit: FitMode,
) -> Result<PixelBuffer> {
    resize_with(buffer, label_size, dpi, fit, &ResizeOptions::default())
}

/// Resize a label with explicit options
pub fn resize_with(
    buffer: PixelBuffer,
    label_size: LabelSize,
    dpi: u32,
    fit: FitMode,
    options: &ResizeOptions,
) -> Result<PixelBuffer> {
    let target = target_dimensions(label_size, dpi)?;
    let (src_w, src_h) = buffer.dimensions();
    let geometry = plan(src_w, src_h, target, fit)?;

    debug!(
        src_w,
        src_h,
        target_w = target.0,
        target_h = target.1,
        scaled_w = geometry.scaled.0,
        scaled_h = geometry.scaled.1,
        fit = %fit,
        "Resizing label"
    );

    let buffer = match fit {
        FitMode::Fill if geometry.source_window != buffer.bounds() => {
            buffer.crop(geometry.source_window)
        }
        _ => buffer,
    };
    let rgb = match buffer.flatten_to_rgb().into_dynamic_image() {
        DynamicImage::ImageRgb8(img) => img,
        other => other.to_rgb8(),
    };
    let filter = options.resampler.filter_type();

    let (tw, th) = target;
    let output = match fit {
        FitMode::Stretch | FitMode::Fill => scale_to(rgb, target, filter),
        FitMode::Fit => {
            let scaled = scale_to(rgb, geometry.scaled, filter);
            let (ox, oy) = geometry.offset;
            let mut canvas = RgbImage::from_pixel(tw, th, Rgb([255, 255, 255]));
            imageops::replace(&mut canvas, &scaled, ox as i64, oy as i64);
            canvas
        }
    };

    Ok(PixelBuffer::from(DynamicImage::ImageRgb8(output)))
}

fn scale_to(img: RgbImage, (width, height): (u32, u32), filter: FilterType) -> RgbImage {
    if img.dimensions() == (width, height) {
        debug!(width, height, "Image already at scaled size, skipping resample");
        return img;
    }
    imageops::resize(&img, width, height, filter)
}
