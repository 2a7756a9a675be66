//! label-print - Shipping label resizer and 2-up PDF composer
//!
//! Takes a carrier-generated shipping label (bitmap or PDF), trims the
//! surrounding whitespace down to the printed border, rescales it to an exact
//! physical label size, and places one or two labels on a landscape page.
//!
//! # Features
//!
//! - **Rasterization** ([`rasterize`]) - Decode bitmaps, render the first PDF page with `ImageMagick`
//! - **Border Crop** ([`border_crop`]) - Find the printed label border
//! - **Resizing** ([`resize`]) - Fit, fill or stretch onto the label's pixel grid
//! - **Composition** ([`compose`]) - Lay out labels 2-up and write a PDF
//! - **Pipeline** ([`pipeline`]) - Run the stages for one job
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use label_print::{resize_label, FitMode, PipelineConfig};
//! use std::path::Path;
//!
//! let config = PipelineConfig::default()
//!     .with_dpi(203)
//!     .with_fit_mode(FitMode::Fill);
//!
//! let pdf = resize_label(Path::new("ups.png"), None, Some(Path::new("fedex.pdf")), &config).unwrap();
//! println!("Wrote {}", pdf.display());
//! ```
//!
//! ## Using Builder Patterns
//!
//! ```rust
//! use label_print::{CropOptions, ResizeOptions, Resampler};
//!
//! let crop = CropOptions::builder()
//!     .dark_threshold(100)
//!     .padding(4)
//!     .build();
//!
//! let resize = ResizeOptions::builder()
//!     .resampler(Resampler::CatmullRom)
//!     .build();
//! ```
//!
//! # Architecture
//!
//! Each stage is a pure function over in-memory buffers; only the pipeline
//! touches the filesystem.
//!
//! ```text
//! bytes -> Rasterize -> Border Crop (optional) -> Resize -> Compose -> PDF
//! ```
//!
//! # License
//!
//! AGPL-3.0

pub mod border_crop;
pub mod buffer;
pub mod cli;
pub mod compose;
pub mod config;
pub mod label;
pub mod pipeline;
pub mod rasterize;
pub mod resize;
pub mod util;

// Re-exports for convenience
pub use border_crop::{
    analyze, apply_crop, detect_crop, CropAnalysis, CropDecision, CropOptions, CropOptionsBuilder,
};
pub use buffer::{BufferError, PixelBuffer, PixelFormat, Rect};
pub use cli::{create_spinner, Cli, Commands, ConvertArgs, ExitCode};
pub use compose::{compose, layout, ComposeError, LabelDocument, Placement};
pub use config::{CliOverrides, Config, ConfigError};
pub use label::{
    FitMode, LabelError, LabelSize, PageSpec, DEFAULT_DPI, LABEL_SIZES, POINTS_PER_INCH,
};
pub use pipeline::{
    default_output_path, prepare_label, process_job, process_job_with_progress, resize_label,
    ErrorKind, JobOutput, LabelJob, LabelPipeline, LabelSource, LabelSummary, PipelineConfig,
    PipelineError, PreparedLabel, ProgressCallback, SilentProgress,
};
pub use rasterize::{
    expected_render_size, page_count, page_size_points, rasterize, rasterize_with,
    supported_extensions, RasterizeError, RasterizeOptions, RasterizeOptionsBuilder, SourceKind,
};
pub use resize::{resize, resize_with, ResizeError, ResizeOptions, ResizePlan, Resampler};
pub use util::{
    format_duration, format_file_size, inches_to_points, pixels_to_inches, points_to_inches,
    points_to_mm,
};

/// Exit codes for CLI
///
/// Integer mirrors of [`ExitCode`] for scripts and tests.
pub mod exit_codes {
    use super::ExitCode;

    pub const SUCCESS: i32 = ExitCode::Success as i32;
    pub const GENERAL_ERROR: i32 = ExitCode::GeneralError as i32;
    pub const INVALID_ARGS: i32 = ExitCode::InvalidArgs as i32;
    pub const INPUT_NOT_FOUND: i32 = ExitCode::InputNotFound as i32;
    pub const OUTPUT_ERROR: i32 = ExitCode::OutputError as i32;
    pub const PROCESSING_ERROR: i32 = ExitCode::ProcessingError as i32;
    pub const UNSUPPORTED_FORMAT: i32 = ExitCode::UnsupportedFormat as i32;
}
