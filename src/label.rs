//! Label geometry module
//!
//! Physical label sizes, fit policies and the output page description.
//!
//! # Example
//!
//! ```rust
//! use label_print::{FitMode, LabelSize};
//!
//! let size: LabelSize = "4x6".parse().unwrap();
//! assert_eq!(size.pixel_dimensions(300), (1200, 1800));
//!
//! let custom: LabelSize = "3.5x5".parse().unwrap();
//! assert_eq!(custom.width_in, 3.5);
//!
//! let fit: FitMode = "fill".parse().unwrap();
//! assert_eq!(fit, FitMode::Fill);
//! ```

use crate::util::{inches_to_pixels, inches_to_points};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// PDF user-space units per inch
pub const POINTS_PER_INCH: f64 = 72.0;

/// Default output resolution
pub const DEFAULT_DPI: u32 = 300;

/// Default catalog entry
pub const DEFAULT_LABEL_SIZE: &str = "4x6";

/// Named label sizes in inches (width, height)
pub const LABEL_SIZES: [(&str, f64, f64); 4] = [
    ("4x6", 4.0, 6.0),
    ("4x8", 4.0, 8.0),
    ("2x7", 2.0, 7.0),
    ("letter", 8.5, 11.0),
];

/// Label parameter errors
#[derive(Debug, Error, PartialEq)]
pub enum LabelError {
    #[error("Unknown label size '{0}'. Use one of 4x6, 4x8, 2x7, letter or WIDTHxHEIGHT in inches")]
    UnknownLabelSize(String),

    #[error("Label size must be positive, got {width}x{height} in")]
    InvalidSize { width: f64, height: f64 },

    #[error("Unknown fit mode '{0}'. Use fit, fill or stretch")]
    UnknownFitMode(String),
}

/// Physical label size in inches
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelSize {
    pub width_in: f64,
    pub height_in: f64,
}

impl Default for LabelSize {
    fn default() -> Self {
        Self::FOUR_BY_SIX
    }
}

impl LabelSize {
    pub const FOUR_BY_SIX: LabelSize = LabelSize {
        width_in: 4.0,
        height_in: 6.0,
    };

    /// Create a custom size; both sides must be finite and positive
    pub fn new(width_in: f64, height_in: f64) -> Result<Self, LabelError> {
        let size = Self {
            width_in,
            height_in,
        };
        if !size.is_valid() {
            return Err(LabelError::InvalidSize {
                width: width_in,
                height: height_in,
            });
        }
        Ok(size)
    }

    /// Look up a catalog entry by name (`4x6`, `4x8`, `2x7`, `letter`)
    pub fn named(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        LABEL_SIZES
            .iter()
            .find(|(n, _, _)| *n == name)
            .map(|&(_, w, h)| Self {
                width_in: w,
                height_in: h,
            })
    }

    pub fn is_valid(&self) -> bool {
        self.width_in.is_finite()
            && self.height_in.is_finite()
            && self.width_in > 0.0
            && self.height_in > 0.0
    }

    /// Exact pixel dimensions at `dpi`: `round(w*dpi) x round(h*dpi)`
    pub fn pixel_dimensions(&self, dpi: u32) -> (u32, u32) {
        (
            inches_to_pixels(self.width_in, dpi),
            inches_to_pixels(self.height_in, dpi),
        )
    }

    /// Size in PDF points
    pub fn points(&self) -> (f64, f64) {
        (
            inches_to_points(self.width_in),
            inches_to_points(self.height_in),
        )
    }
}

impl FromStr for LabelSize {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(size) = Self::named(s) {
            return Ok(size);
        }

        let lower = s.trim().to_ascii_lowercase();
        let (w, h) = lower
            .split_once('x')
            .ok_or_else(|| LabelError::UnknownLabelSize(s.to_string()))?;
        let width: f64 = w
            .trim()
            .parse()
            .map_err(|_| LabelError::UnknownLabelSize(s.to_string()))?;
        let height: f64 = h
            .trim()
            .parse()
            .map_err(|_| LabelError::UnknownLabelSize(s.to_string()))?;

        Self::new(width, height)
    }
}

impl fmt::Display for LabelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match LABEL_SIZES
            .iter()
            .find(|(_, w, h)| *w == self.width_in && *h == self.height_in)
        {
            Some((name, _, _)) => write!(f, "{}", name),
            None => write!(f, "{}x{}", self.width_in, self.height_in),
        }
    }
}

/// Aspect-ratio policy for mapping content into the label box
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Preserve ratio, pad with white
    #[default]
    Fit,
    /// Preserve ratio, crop the overflow
    Fill,
    /// Ignore ratio
    Stretch,
}

impl FitMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FitMode::Fit => "fit",
            FitMode::Fill => "fill",
            FitMode::Stretch => "stretch",
        }
    }
}

impl fmt::Display for FitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FitMode {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fit" => Ok(FitMode::Fit),
            "fill" => Ok(FitMode::Fill),
            "stretch" => Ok(FitMode::Stretch),
            _ => Err(LabelError::UnknownFitMode(s.to_string())),
        }
    }
}

/// Output page, landscape US Letter unless configured otherwise
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSpec {
    pub width_in: f64,
    pub height_in: f64,
}

impl Default for PageSpec {
    fn default() -> Self {
        Self::LANDSCAPE_LETTER
    }
}

impl PageSpec {
    pub const LANDSCAPE_LETTER: PageSpec = PageSpec {
        width_in: 11.0,
        height_in: 8.5,
    };

    /// Page width in points
    pub fn width_pt(&self) -> f64 {
        inches_to_points(self.width_in)
    }

    /// Page height in points
    pub fn height_pt(&self) -> f64 {
        inches_to_points(self.height_in)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_lookup() {
        assert_eq!(LabelSize::named("4x6"), Some(LabelSize::new(4.0, 6.0).unwrap()));
        assert_eq!(LabelSize::named("4x8").map(|s| s.height_in), Some(8.0));
        assert_eq!(LabelSize::named("2x7").map(|s| s.width_in), Some(2.0));
        assert_eq!(
            LabelSize::named("LETTER"),
            Some(LabelSize {
                width_in: 8.5,
                height_in: 11.0
            })
        );
        assert_eq!(LabelSize::named("a4"), None);
    }

    #[test]
    fn test_parse_custom_size() {
        let size: LabelSize = "3.5 x 5".parse().unwrap();
        assert_eq!(size.width_in, 3.5);
        assert_eq!(size.height_in, 5.0);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            "huge".parse::<LabelSize>(),
            Err(LabelError::UnknownLabelSize(_))
        ));
        assert!(matches!(
            "4xabc".parse::<LabelSize>(),
            Err(LabelError::UnknownLabelSize(_))
        ));
        assert!(matches!(
            "0x6".parse::<LabelSize>(),
            Err(LabelError::InvalidSize { .. })
        ));
        assert!(matches!(
            "-4x6".parse::<LabelSize>(),
            Err(LabelError::InvalidSize { .. })
        ));
    }

    #[test]
    fn test_pixel_dimensions_round() {
        let size = LabelSize::FOUR_BY_SIX;
        assert_eq!(size.pixel_dimensions(300), (1200, 1800));
        assert_eq!(size.pixel_dimensions(203), (812, 1218));

        let odd = LabelSize::new(3.5, 2.25).unwrap();
        // 710.5 -> 711, 456.75 -> 457
        assert_eq!(odd.pixel_dimensions(203), (711, 457));
    }

    #[test]
    fn test_display_uses_catalog_name() {
        assert_eq!(LabelSize::FOUR_BY_SIX.to_string(), "4x6");
        assert_eq!(LabelSize::new(3.5, 5.0).unwrap().to_string(), "3.5x5");
    }

    #[test]
    fn test_fit_mode_parse_and_display() {
        assert_eq!("FIT".parse::<FitMode>().unwrap(), FitMode::Fit);
        assert_eq!("stretch".parse::<FitMode>().unwrap(), FitMode::Stretch);
        assert!("crop".parse::<FitMode>().is_err());
        assert_eq!(FitMode::Fill.to_string(), "fill");
        assert_eq!(FitMode::default(), FitMode::Fit);
    }

    #[test]
    fn test_page_spec_points() {
        let page = PageSpec::default();
        assert_eq!(page.width_pt(), 792.0);
        assert_eq!(page.height_pt(), 612.0);
    }
}
