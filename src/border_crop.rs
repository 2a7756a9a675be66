//! Border Crop Detection module
//!
//! Finds the printed border of a shipping label and returns the rectangle
//! that isolates it. Detection is best effort: anything it cannot make sense
//! of yields [`CropDecision::NoCropNeeded`], never an error.
//!
//! # Example
//!
//! ```rust
//! use label_print::border_crop::{detect_crop, CropDecision, CropOptions};
//! use label_print::PixelBuffer;
//!
//! let blank = PixelBuffer::white(100, 150);
//! let decision = detect_crop(&blank, &CropOptions::default());
//! assert_eq!(decision, CropDecision::NoCropNeeded);
//! ```

use crate::buffer::{PixelBuffer, Rect};
use tracing::debug;

/// Luminance below which a pixel counts as border ink
pub const DEFAULT_DARK_THRESHOLD: u8 = 80;

/// Minimum bounding-box share of the image for a border to be trusted
pub const DEFAULT_MIN_AREA_RATIO: f64 = 0.05;

/// Maximum rows/columns scanned inward from each bounding-box edge
pub const DEFAULT_EDGE_SCAN_LIMIT: u32 = 100;

/// Pixels of border kept around the inner rectangle
pub const DEFAULT_PADDING: u32 = 8;

/// Border crop options
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropOptions {
    /// Luminance threshold (0-255); darker pixels are border
    pub dark_threshold: u8,
    /// Minimum bounding-box area as a fraction of the image
    pub min_area_ratio: f64,
    /// Inward scan limit per edge
    pub edge_scan_limit: u32,
    /// Outward padding in pixels
    pub padding: u32,
}

impl Default for CropOptions {
    fn default() -> Self {
        Self {
            dark_threshold: DEFAULT_DARK_THRESHOLD,
            min_area_ratio: DEFAULT_MIN_AREA_RATIO,
            edge_scan_limit: DEFAULT_EDGE_SCAN_LIMIT,
            padding: DEFAULT_PADDING,
        }
    }
}

impl CropOptions {
    /// Create a new options builder
    pub fn builder() -> CropOptionsBuilder {
        CropOptionsBuilder::default()
    }
}

/// Builder for CropOptions
#[derive(Debug, Default)]
pub struct CropOptionsBuilder {
    options: CropOptions,
}

impl CropOptionsBuilder {
    /// Set dark threshold (0-255)
    #[must_use]
    pub fn dark_threshold(mut self, threshold: u8) -> Self {
        self.options.dark_threshold = threshold;
        self
    }

    /// Set minimum area ratio (0.0-1.0)
    #[must_use]
    pub fn min_area_ratio(mut self, ratio: f64) -> Self {
        self.options.min_area_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    /// Set inward scan limit
    #[must_use]
    pub fn edge_scan_limit(mut self, limit: u32) -> Self {
        self.options.edge_scan_limit = limit;
        self
    }

    /// Set outward padding
    #[must_use]
    pub fn padding(mut self, padding: u32) -> Self {
        self.options.padding = padding;
        self
    }

    /// Build the options
    #[must_use]
    pub fn build(self) -> CropOptions {
        self.options
    }
}

/// Outcome of border detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropDecision {
    /// Crop to this rectangle
    Crop(Rect),
    /// Leave the image as it is
    NoCropNeeded,
}

impl CropDecision {
    /// The crop rectangle, or the full image for `NoCropNeeded`
    pub fn rect_or_full(&self, width: u32, height: u32) -> Rect {
        match self {
            CropDecision::Crop(rect) => *rect,
            CropDecision::NoCropNeeded => Rect::full(width, height),
        }
    }

    pub fn is_crop(&self) -> bool {
        matches!(self, CropDecision::Crop(_))
    }
}

/// Intermediate results of a detection run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropAnalysis {
    /// Tight bounds of every dark pixel
    pub bounding_box: Option<Rect>,
    /// Bounds after skipping solid border lines, before padding
    pub inner: Option<Rect>,
    pub decision: CropDecision,
}

impl CropAnalysis {
    fn no_crop(bounding_box: Option<Rect>) -> Self {
        Self {
            bounding_box,
            inner: None,
            decision: CropDecision::NoCropNeeded,
        }
    }
}

/// Thresholded view over a luminance plane
struct DarkMask<'a> {
    luma: &'a [u8],
    width: usize,
    height: usize,
    threshold: u8,
}

impl DarkMask<'_> {
    #[inline]
    fn is_dark(&self, x: usize, y: usize) -> bool {
        self.luma[y * self.width + x] < self.threshold
    }

    /// Tight `[x0, x1) x [y0, y1)` bounds of the dark pixels
    fn bounds(&self) -> Option<(usize, usize, usize, usize)> {
        let mut x0 = usize::MAX;
        let mut y0 = usize::MAX;
        let mut x1 = 0;
        let mut y1 = 0;

        for y in 0..self.height {
            let row = &self.luma[y * self.width..(y + 1) * self.width];
            let first = row.iter().position(|&v| v < self.threshold);
            let Some(first) = first else { continue };
            let last = row.iter().rposition(|&v| v < self.threshold).unwrap_or(first);

            x0 = x0.min(first);
            x1 = x1.max(last + 1);
            y0 = y0.min(y);
            y1 = y + 1;
        }

        (x0 != usize::MAX).then_some((x0, y0, x1, y1))
    }

    /// More than half of row `y` within `[x0, x1)` is dark
    fn row_is_border(&self, y: usize, x0: usize, x1: usize) -> bool {
        let dark = (x0..x1).filter(|&x| self.is_dark(x, y)).count();
        dark * 2 > x1 - x0
    }

    /// More than half of column `x` within `[y0, y1)` is dark
    fn col_is_border(&self, x: usize, y0: usize, y1: usize) -> bool {
        let dark = (y0..y1).filter(|&y| self.is_dark(x, y)).count();
        dark * 2 > y1 - y0
    }
}

/// Detect the label border and return the crop to apply
pub fn detect_crop(buffer: &PixelBuffer, options: &CropOptions) -> CropDecision {
    analyze(buffer, options).decision
}

/// Run border detection and keep the intermediate rectangles
pub fn analyze(buffer: &PixelBuffer, options: &CropOptions) -> CropAnalysis {
    let (width, height) = buffer.dimensions();
    if buffer.is_empty() {
        return CropAnalysis::no_crop(None);
    }

    let luma = buffer.luma_plane();
    let mask = DarkMask {
        luma: &luma,
        width: width as usize,
        height: height as usize,
        threshold: options.dark_threshold,
    };

    let Some((bx0, by0, bx1, by1)) = mask.bounds() else {
        debug!("No dark pixels, skipping crop");
        return CropAnalysis::no_crop(None);
    };
    let bounding_box = Rect::from_edges(bx0 as u32, by0 as u32, bx1 as u32, by1 as u32);

    let image_area = width as f64 * height as f64;
    if (bounding_box.area() as f64) < image_area * options.min_area_ratio {
        debug!(?bounding_box, "Dark region too small to be a border");
        return CropAnalysis::no_crop(Some(bounding_box));
    }

    let box_w = bx1 - bx0;
    let box_h = by1 - by0;
    let limit = options.edge_scan_limit as usize;
    let rows = (box_h / 2).min(limit);
    let cols = (box_w / 2).min(limit);

    let top = (by0..by0 + rows)
        .find(|&y| !mask.row_is_border(y, bx0, bx1))
        .unwrap_or(by0);

    // Bottom and right scan one line fewer than top and left
    let bottom = ((by1 + 1 - rows.max(1))..by1)
        .rev()
        .find(|&y| !mask.row_is_border(y, bx0, bx1))
        .map_or(by1, |y| y + 1);

    let left = (bx0..bx0 + cols)
        .find(|&x| !mask.col_is_border(x, by0, by1))
        .unwrap_or(bx0);

    let right = ((bx1 + 1 - cols.max(1))..bx1)
        .rev()
        .find(|&x| !mask.col_is_border(x, by0, by1))
        .map_or(bx1, |x| x + 1);

    let inner = Rect::from_edges(left as u32, top as u32, right as u32, bottom as u32);
    let crop = inner.expand(options.padding, width, height);

    debug!(?bounding_box, ?inner, ?crop, "Detected label border");

    CropAnalysis {
        bounding_box: Some(bounding_box),
        inner: Some(inner),
        decision: CropDecision::Crop(crop),
    }
}

/// Apply a crop decision; `NoCropNeeded` hands the buffer back untouched
pub fn apply_crop(buffer: PixelBuffer, decision: CropDecision) -> PixelBuffer {
    match decision {
        CropDecision::Crop(rect) => buffer.crop(rect),
        CropDecision::NoCropNeeded => buffer,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::PixelFormat;

    /// White gray image with dark pixels wherever `dark(x, y)` holds
    fn gray_image(width: u32, height: u32, dark: impl Fn(u32, u32) -> bool) -> PixelBuffer {
        let mut data = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(if dark(x, y) { 0 } else { 255 });
            }
        }
        PixelBuffer::new(width, height, PixelFormat::Gray8, data).unwrap()
    }

    /// Hollow rectangle `[x0, x1) x [y0, y1)` with the given line thickness
    fn frame(x0: u32, y0: u32, x1: u32, y1: u32, t: u32) -> impl Fn(u32, u32) -> bool {
        move |x, y| {
            let inside = x >= x0 && x < x1 && y >= y0 && y < y1;
            let in_hole = x >= x0 + t && x < x1 - t && y >= y0 + t && y < y1 - t;
            inside && !in_hole
        }
    }

    #[test]
    fn test_default_options() {
        let opts = CropOptions::default();
        assert_eq!(opts.dark_threshold, 80);
        assert_eq!(opts.min_area_ratio, 0.05);
        assert_eq!(opts.edge_scan_limit, 100);
        assert_eq!(opts.padding, 8);
    }

    #[test]
    fn test_builder_pattern() {
        let opts = CropOptions::builder()
            .dark_threshold(100)
            .min_area_ratio(1.5)
            .edge_scan_limit(20)
            .padding(0)
            .build();

        assert_eq!(opts.dark_threshold, 100);
        assert_eq!(opts.min_area_ratio, 1.0);
        assert_eq!(opts.edge_scan_limit, 20);
        assert_eq!(opts.padding, 0);
    }

    #[test]
    fn test_blank_image_needs_no_crop() {
        let img = PixelBuffer::white(120, 80);
        let decision = detect_crop(&img, &CropOptions::default());
        assert_eq!(decision, CropDecision::NoCropNeeded);
        assert!(!decision.is_crop());
        assert_eq!(decision.rect_or_full(120, 80), img.bounds());

        let passed = apply_crop(img.clone(), decision);
        assert_eq!(passed, img);
    }

    #[test]
    fn test_empty_buffer_needs_no_crop() {
        let img = PixelBuffer::new(0, 0, PixelFormat::Rgb8, vec![]).unwrap();
        assert_eq!(
            detect_crop(&img, &CropOptions::default()),
            CropDecision::NoCropNeeded
        );
    }

    #[test]
    fn test_known_border_gives_padded_inner_rect() {
        let img = gray_image(200, 300, frame(20, 30, 180, 270, 5));
        let analysis = analyze(&img, &CropOptions::default());

        assert_eq!(analysis.bounding_box, Some(Rect::from_edges(20, 30, 180, 270)));
        let inner = Rect::from_edges(25, 35, 175, 265);
        assert_eq!(analysis.inner, Some(inner));

        let expected = Rect::from_edges(17, 27, 183, 273);
        assert_eq!(analysis.decision, CropDecision::Crop(expected));
        assert!(analysis.decision.is_crop());
        assert!(expected.contains(&inner));
    }

    #[test]
    fn test_padding_clamped_at_image_edges() {
        let img = gray_image(100, 100, frame(0, 0, 100, 100, 3));
        let analysis = analyze(&img, &CropOptions::default());

        assert_eq!(analysis.inner, Some(Rect::from_edges(3, 3, 97, 97)));
        assert_eq!(analysis.decision, CropDecision::Crop(Rect::full(100, 100)));
    }

    #[test]
    fn test_zero_padding_returns_inner_rect() {
        let img = gray_image(200, 300, frame(20, 30, 180, 270, 5));
        let opts = CropOptions::builder().padding(0).build();
        assert_eq!(
            detect_crop(&img, &opts),
            CropDecision::Crop(Rect::from_edges(25, 35, 175, 265))
        );
    }

    #[test]
    fn test_small_dark_region_is_noise() {
        // 10x10 speck on 200x200: 100 < 0.05 * 40000
        let img = gray_image(200, 200, |x, y| (50..60).contains(&x) && (50..60).contains(&y));
        let analysis = analyze(&img, &CropOptions::default());

        assert_eq!(analysis.bounding_box, Some(Rect::new(50, 50, 10, 10)));
        assert_eq!(analysis.decision, CropDecision::NoCropNeeded);
    }

    #[test]
    fn test_all_dark_keeps_bounding_box() {
        let img = gray_image(40, 60, |_, _| true);
        let opts = CropOptions::builder().padding(0).build();
        assert_eq!(detect_crop(&img, &opts), CropDecision::Crop(Rect::full(40, 60)));
    }

    #[test]
    fn test_border_thicker_than_scan_limit_stays_at_bbox() {
        let img = gray_image(400, 400, frame(0, 0, 400, 400, 120));
        let opts = CropOptions::builder().padding(0).build();
        let analysis = analyze(&img, &opts);
        assert_eq!(analysis.inner, Some(Rect::full(400, 400)));
    }

    #[test]
    fn test_scan_limit_is_configurable() {
        let img = gray_image(200, 300, frame(20, 30, 180, 270, 5));
        // Limit 3 never reaches the first non-border line
        let opts = CropOptions::builder().edge_scan_limit(3).padding(0).build();
        assert_eq!(
            detect_crop(&img, &opts),
            CropDecision::Crop(Rect::from_edges(20, 30, 180, 270))
        );
    }

    #[test]
    fn test_bottom_scan_covers_one_line_less() {
        // Solid rows at y=5 and y=8, side columns at x=0 and x=19
        let img = gray_image(20, 20, |x, y| {
            (5..9).contains(&y) && (y == 5 || y == 8 || x == 0 || x == 19)
        });
        let opts = CropOptions::builder().padding(0).build();
        let analysis = analyze(&img, &opts);

        assert_eq!(analysis.bounding_box, Some(Rect::from_edges(0, 5, 20, 9)));
        // Box height 4 allows two top steps but only one bottom step
        assert_eq!(analysis.inner, Some(Rect::from_edges(1, 6, 19, 9)));
    }

    #[test]
    fn test_rgb_border_uses_luminance() {
        // Dark red (luma 30) border counts, light gray interior does not
        let (w, h) = (100u32, 100u32);
        let dark = frame(10, 10, 90, 90, 4);
        let mut data = Vec::new();
        for y in 0..h {
            for x in 0..w {
                if dark(x, y) {
                    data.extend_from_slice(&[100, 0, 0]);
                } else {
                    data.extend_from_slice(&[200, 200, 200]);
                }
            }
        }
        let img = PixelBuffer::new(w, h, PixelFormat::Rgb8, data).unwrap();
        let opts = CropOptions::builder().padding(0).build();
        assert_eq!(
            detect_crop(&img, &opts),
            CropDecision::Crop(Rect::from_edges(14, 14, 86, 86))
        );
    }

    #[test]
    fn test_transparent_pixels_are_not_dark() {
        let img = PixelBuffer::filled(50, 50, PixelFormat::Rgba8, &[0, 0, 0, 0]);
        assert_eq!(
            detect_crop(&img, &CropOptions::default()),
            CropDecision::NoCropNeeded
        );
    }

    #[test]
    fn test_apply_crop_cuts_buffer() {
        let img = gray_image(200, 300, frame(20, 30, 180, 270, 5));
        let decision = detect_crop(&img, &CropOptions::default());
        let cropped = apply_crop(img, decision);
        assert_eq!(cropped.dimensions(), (166, 246));
        // Padding leaves white at the corner, border ink 3px in
        assert_eq!(cropped.luma_at(0, 0), Some(255));
        assert_eq!(cropped.luma_at(3, 3), Some(0));
    }
}
