//! Common utilities for label-print
//!
//! Unit conversions between inches, points, millimeters and pixels, plus
//! human-readable formatting for CLI output.

use crate::label::POINTS_PER_INCH;
use std::time::Duration;

/// Millimeters per inch
pub const MM_PER_INCH: f64 = 25.4;

/// Convert inches to PDF points
#[inline]
pub fn inches_to_points(inches: f64) -> f64 {
    inches * POINTS_PER_INCH
}

/// Convert PDF points to inches
#[inline]
pub fn points_to_inches(points: f64) -> f64 {
    points / POINTS_PER_INCH
}

/// Convert points to millimeters (printpdf works in `Mm(f32)`)
#[inline]
pub fn points_to_mm(points: f64) -> f32 {
    (points / POINTS_PER_INCH * MM_PER_INCH) as f32
}

/// Pixels covering `inches` at `dpi`, rounded to nearest
#[inline]
pub fn inches_to_pixels(inches: f64, dpi: u32) -> u32 {
    (inches * dpi as f64).round() as u32
}

/// Physical length of `pixels` at `dpi`
#[inline]
pub fn pixels_to_inches(pixels: u32, dpi: u32) -> f64 {
    if dpi == 0 {
        return 0.0;
    }
    pixels as f64 / dpi as f64
}

/// Format file size in human-readable format
pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Format duration in human-readable format
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs > 0 {
        format!("{}.{:03}s", secs, millis)
    } else {
        format!("{}ms", millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inches_and_points() {
        assert_eq!(inches_to_points(11.0), 792.0);
        assert_eq!(inches_to_points(8.5), 612.0);
        assert_eq!(points_to_inches(288.0), 4.0);
    }

    #[test]
    fn test_points_to_mm() {
        // 72 points = 1 inch = 25.4 mm
        assert!((points_to_mm(72.0) - 25.4).abs() < 0.001);
        assert!((points_to_mm(792.0) - 279.4).abs() < 0.01);
    }

    #[test]
    fn test_inches_to_pixels_rounds() {
        assert_eq!(inches_to_pixels(4.0, 300), 1200);
        assert_eq!(inches_to_pixels(3.5, 203), 711);
        assert_eq!(inches_to_pixels(2.25, 203), 457);
    }

    #[test]
    fn test_pixels_to_inches() {
        assert_eq!(pixels_to_inches(1800, 300), 6.0);
        assert_eq!(pixels_to_inches(100, 0), 0.0);
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(500), "500 B");
        assert_eq!(format_file_size(1536), "1.50 KB");
        assert_eq!(format_file_size(1048576), "1.00 MB");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.500s");
        assert_eq!(format_duration(Duration::from_secs(65)), "1m 5s");
    }
}
