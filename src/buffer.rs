//! Pixel buffer module
//!
//! Owned, row-major pixel storage passed from stage to stage, plus the
//! integer rectangle type used for crops.

use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};
use thiserror::Error;

/// Buffer error types
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BufferError {
    #[error("Pixel data length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, BufferError>;

/// Pixel layout of a [`PixelBuffer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 8-bit luminance
    Gray8,
    /// 8-bit RGB
    Rgb8,
    /// 8-bit RGB with straight alpha (decoded bitmaps only)
    Rgba8,
}

impl PixelFormat {
    /// Bytes per pixel
    pub fn channels(self) -> usize {
        match self {
            PixelFormat::Gray8 => 1,
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
        }
    }

    /// Whether the format carries an alpha channel
    pub fn has_alpha(self) -> bool {
        matches!(self, PixelFormat::Rgba8)
    }
}

/// Luminance (ITU-R BT.601)
#[inline]
pub fn luminance(r: u8, g: u8, b: u8) -> u8 {
    let y = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
    y.round() as u8
}

/// Composite a straight-alpha channel value over white
#[inline]
fn over_white(c: u8, a: u8) -> u8 {
    let c = c as u32;
    let a = a as u32;
    ((c * a + 255 * (255 - a) + 127) / 255) as u8
}

/// Owned pixel buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    format: PixelFormat,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap raw pixel data, checking its length against the dimensions
    pub fn new(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * format.channels();
        if data.len() != expected {
            return Err(BufferError::LengthMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }

    /// Buffer with every pixel set to `pixel` (one value per channel)
    pub fn filled(width: u32, height: u32, format: PixelFormat, pixel: &[u8]) -> Self {
        let channels = format.channels();
        let mut data = Vec::with_capacity(width as usize * height as usize * channels);
        for _ in 0..(width as usize * height as usize) {
            data.extend((0..channels).map(|c| pixel.get(c).copied().unwrap_or(255)));
        }
        Self {
            width,
            height,
            format,
            data,
        }
    }

    /// Opaque white RGB buffer
    pub fn white(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            format: PixelFormat::Rgb8,
            data: vec![255; width as usize * height as usize * 3],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// True when the buffer holds no pixels
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Bounds of the whole image
    pub fn bounds(&self) -> Rect {
        Rect::full(self.width, self.height)
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * self.format.channels()
    }

    /// Channel values of the pixel at (x, y), or `None` when out of bounds
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = self.offset(x, y);
        self.data.get(start..start + self.format.channels())
    }

    /// Luminance of the pixel at (x, y); transparent pixels read as white
    pub fn luma_at(&self, x: u32, y: u32) -> Option<u8> {
        self.pixel(x, y).map(|p| match self.format {
            PixelFormat::Gray8 => p[0],
            PixelFormat::Rgb8 => luminance(p[0], p[1], p[2]),
            PixelFormat::Rgba8 => luminance(
                over_white(p[0], p[3]),
                over_white(p[1], p[3]),
                over_white(p[2], p[3]),
            ),
        })
    }

    /// Single-channel luminance plane, one byte per pixel in row-major order
    pub fn luma_plane(&self) -> Vec<u8> {
        match self.format {
            PixelFormat::Gray8 => self.data.clone(),
            PixelFormat::Rgb8 => self
                .data
                .chunks_exact(3)
                .map(|p| luminance(p[0], p[1], p[2]))
                .collect(),
            PixelFormat::Rgba8 => self
                .data
                .chunks_exact(4)
                .map(|p| {
                    luminance(
                        over_white(p[0], p[3]),
                        over_white(p[1], p[3]),
                        over_white(p[2], p[3]),
                    )
                })
                .collect(),
        }
    }

    /// Copy out the region covered by `rect` (clamped to the image)
    pub fn crop(&self, rect: Rect) -> PixelBuffer {
        let rect = rect.clamp_to(self.width, self.height);
        let channels = self.format.channels();
        let row_len = rect.width as usize * channels;
        let mut data = Vec::with_capacity(row_len * rect.height as usize);

        for y in rect.top..rect.bottom() {
            let start = self.offset(rect.left, y);
            data.extend_from_slice(&self.data[start..start + row_len]);
        }

        PixelBuffer {
            width: rect.width,
            height: rect.height,
            format: self.format,
            data,
        }
    }

    /// Opaque RGB version of this buffer; alpha is composited onto white
    pub fn flatten_to_rgb(self) -> PixelBuffer {
        let data = match self.format {
            PixelFormat::Rgb8 => return self,
            PixelFormat::Gray8 => self.data.iter().flat_map(|&v| [v, v, v]).collect(),
            PixelFormat::Rgba8 => self
                .data
                .chunks_exact(4)
                .flat_map(|p| {
                    [
                        over_white(p[0], p[3]),
                        over_white(p[1], p[3]),
                        over_white(p[2], p[3]),
                    ]
                })
                .collect(),
        };

        PixelBuffer {
            width: self.width,
            height: self.height,
            format: PixelFormat::Rgb8,
            data,
        }
    }

    /// Convert into an `image` crate buffer
    pub fn into_dynamic_image(self) -> DynamicImage {
        let (w, h) = (self.width, self.height);
        // Length is validated on construction; from_raw cannot return None.
        match self.format {
            PixelFormat::Gray8 => GrayImage::from_raw(w, h, self.data)
                .map(DynamicImage::ImageLuma8)
                .unwrap_or_else(|| DynamicImage::new_luma8(w, h)),
            PixelFormat::Rgb8 => RgbImage::from_raw(w, h, self.data)
                .map(DynamicImage::ImageRgb8)
                .unwrap_or_else(|| DynamicImage::new_rgb8(w, h)),
            PixelFormat::Rgba8 => RgbaImage::from_raw(w, h, self.data)
                .map(DynamicImage::ImageRgba8)
                .unwrap_or_else(|| DynamicImage::new_rgba8(w, h)),
        }
    }
}

impl From<DynamicImage> for PixelBuffer {
    fn from(img: DynamicImage) -> Self {
        let (width, height) = (img.width(), img.height());
        let (format, data) = match img {
            DynamicImage::ImageLuma8(gray) => (PixelFormat::Gray8, gray.into_raw()),
            DynamicImage::ImageRgb8(rgb) => (PixelFormat::Rgb8, rgb.into_raw()),
            DynamicImage::ImageRgba8(rgba) => (PixelFormat::Rgba8, rgba.into_raw()),
            other if other.color().has_alpha() => (PixelFormat::Rgba8, other.to_rgba8().into_raw()),
            other if other.color().channel_count() <= 2 => {
                (PixelFormat::Gray8, other.to_luma8().into_raw())
            }
            other => (PixelFormat::Rgb8, other.to_rgb8().into_raw()),
        };

        Self {
            width,
            height,
            format,
            data,
        }
    }
}

/// Axis-aligned integer rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(left: u32, top: u32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Rectangle from exclusive edge coordinates
    pub fn from_edges(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self {
            left,
            top,
            width: right.saturating_sub(left),
            height: bottom.saturating_sub(top),
        }
    }

    /// Rectangle covering a whole `width` x `height` image
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Exclusive right edge
    pub fn right(&self) -> u32 {
        self.left + self.width
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> u32 {
        self.top + self.height
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Whether `other` lies entirely inside this rectangle
    pub fn contains(&self, other: &Rect) -> bool {
        other.left >= self.left
            && other.top >= self.top
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Clamp to `[0, image_width] x [0, image_height]`
    pub fn clamp_to(&self, image_width: u32, image_height: u32) -> Rect {
        let left = self.left.min(image_width);
        let top = self.top.min(image_height);
        let right = self.left.saturating_add(self.width).min(image_width);
        let bottom = self.top.saturating_add(self.height).min(image_height);
        Rect::from_edges(left, top, right, bottom)
    }

    /// Grow by `padding` on every side, clamped to the image
    pub fn expand(&self, padding: u32, image_width: u32, image_height: u32) -> Rect {
        let left = self.left.saturating_sub(padding);
        let top = self.top.saturating_sub(padding);
        let right = self.right().saturating_add(padding).min(image_width);
        let bottom = self.bottom().saturating_add(padding).min(image_height);
        Rect::from_edges(left, top, right, bottom)
    }
}
