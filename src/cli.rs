//! CLI interface module
//!
//! Provides command-line interface using clap derive macros.

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::CliOverrides;
use crate::label::{FitMode, LabelSize};
use crate::pipeline::ErrorKind;

/// Exit codes for the CLI
///
/// These codes follow standard Unix conventions and provide
/// specific error categories for scripting and automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    /// Bad argument or config value
    InvalidArgs = 2,
    InputNotFound = 3,
    /// Output could not be written
    OutputError = 4,
    /// Decode, resize or PDF generation failed
    ProcessingError = 5,
    /// Input extension not supported
    UnsupportedFormat = 6,
}

impl ExitCode {
    /// Convert to process exit code
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Get human-readable description
    pub fn description(self) -> &'static str {
        match self {
            ExitCode::Success => "Success",
            ExitCode::GeneralError => "General error",
            ExitCode::InvalidArgs => "Invalid arguments",
            ExitCode::InputNotFound => "Input file not found",
            ExitCode::OutputError => "Output error (permission denied, disk full, etc.)",
            ExitCode::ProcessingError => "Processing error",
            ExitCode::UnsupportedFormat => "Unsupported input format",
        }
    }

    /// Exit code for a pipeline failure category
    pub fn from_error_kind(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::UnsupportedFormat => ExitCode::UnsupportedFormat,
            ErrorKind::UnreadableInput | ErrorKind::EmbeddingFailed => ExitCode::ProcessingError,
            ErrorKind::InvalidDimensions | ErrorKind::InvalidJob => ExitCode::InvalidArgs,
            ErrorKind::InputNotFound => ExitCode::InputNotFound,
            ErrorKind::Io => ExitCode::OutputError,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.code()
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.code() as u8)
    }
}

/// Shipping label resizer and 2-up PDF composer
#[derive(Parser, Debug)]
#[command(name = "label-print")]
#[command(version)]
#[command(about = "Resize shipping labels and print them 2-up on a landscape page", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resize one or two labels into a printable PDF
    Convert(ConvertArgs),
    /// Show supported formats, label sizes and defaults
    Info,
}

/// Arguments for the convert command
#[derive(clap::Args, Debug)]
pub struct ConvertArgs {
    /// Label image or PDF
    pub input: PathBuf,

    /// Second label, placed on the right half of the page
    pub input2: Option<PathBuf>,

    /// Output PDF [default: <input>_label.pdf]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output DPI [default: 300]
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    pub dpi: Option<u32>,

    /// How the label fills its box [default: fit]
    #[arg(short, long, value_enum)]
    pub fit: Option<FitMode>,

    /// Label size: 4x6, 4x8, 2x7, letter or WIDTHxHEIGHT in inches [default: 4x6]
    #[arg(short, long)]
    pub size: Option<LabelSize>,

    /// Skip border detection and keep the whole image
    #[arg(long)]
    pub no_crop: bool,

    /// Page width in inches [default: 11]
    #[arg(long)]
    pub page_width: Option<f64>,

    /// Page height in inches [default: 8.5]
    #[arg(long)]
    pub page_height: Option<f64>,

    /// Config file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Show execution plan without processing
    #[arg(long)]
    pub dry_run: bool,
}

impl ConvertArgs {
    /// Input paths in page order
    pub fn inputs(&self) -> Vec<&PathBuf> {
        std::iter::once(&self.input).chain(&self.input2).collect()
    }

    /// Values given on the command line, to be layered over the config file
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            dpi: self.dpi,
            label_size: self.size,
            fit_mode: self.fit,
            auto_crop: self.no_crop.then_some(false),
            page_width_in: self.page_width,
            page_height_in: self.page_height,
        }
    }
}

/// Create a spinner for indeterminate progress
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .expect("Invalid spinner template"),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
