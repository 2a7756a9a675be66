//! Pipeline processing module
//!
//! Ties the stages together, separating the label logic from CLI handling.
//!
//! ## Processing Steps
//!
//! 1. Rasterize (bitmap decode or first PDF page)
//! 2. Border crop (optional)
//! 3. Resize to the physical label size
//! 4. Compose one or two labels onto a landscape page
//!
//! Every parameter travels in [`LabelJob`]; nothing is shared between jobs.

use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

use crate::border_crop::{self, CropDecision, CropOptions};
use crate::buffer::PixelBuffer;
use crate::compose::{self, ComposeError, LabelDocument};
use crate::label::{FitMode, LabelSize, PageSpec, DEFAULT_DPI};
use crate::rasterize::{self, RasterizeError, RasterizeOptions, SourceKind};
use crate::resize::{self, ResizeError, ResizeOptions};

/// Progress callback for pipeline steps
pub trait ProgressCallback: Send + Sync {
    /// Called when a new step starts
    fn on_step_start(&self, step: &str);
    /// Called to report progress within a step
    fn on_step_progress(&self, current: usize, total: usize);
    /// Called when a step completes
    fn on_step_complete(&self, step: &str, message: &str);
    /// Called for debug/verbose messages
    fn on_debug(&self, message: &str);
}

/// No-op progress callback (silent mode)
pub struct SilentProgress;

impl ProgressCallback for SilentProgress {
    fn on_step_start(&self, _step: &str) {}
    fn on_step_progress(&self, _current: usize, _total: usize) {}
    fn on_step_complete(&self, _step: &str, _message: &str) {}
    fn on_debug(&self, _message: &str) {}
}

/// Pipeline processing error
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Input file not found: {0}")]
    InputNotFound(PathBuf),

    #[error(transparent)]
    Rasterize(#[from] RasterizeError),

    #[error(transparent)]
    Resize(#[from] ResizeError),

    #[error(transparent)]
    Compose(#[from] ComposeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure category, for presenting errors to users
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unrecognized input type; user-correctable
    UnsupportedFormat,
    /// File present but undecodable, or a document without pages
    UnreadableInput,
    /// Non-positive target size or dpi
    InvalidDimensions,
    /// Output stage failure
    EmbeddingFailed,
    /// Zero or more than two labels in one job
    InvalidJob,
    InputNotFound,
    Io,
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::InputNotFound(_) => ErrorKind::InputNotFound,
            PipelineError::Rasterize(RasterizeError::UnsupportedFormat { .. }) => {
                ErrorKind::UnsupportedFormat
            }
            PipelineError::Rasterize(RasterizeError::UnreadableInput(_)) => {
                ErrorKind::UnreadableInput
            }
            PipelineError::Resize(ResizeError::InvalidDimensions(_)) => {
                ErrorKind::InvalidDimensions
            }
            PipelineError::Compose(ComposeError::LabelCount(_)) => ErrorKind::InvalidJob,
            PipelineError::Compose(ComposeError::EmbeddingFailed(_)) => ErrorKind::EmbeddingFailed,
            PipelineError::Compose(ComposeError::IoError(_)) | PipelineError::Io(_) => {
                ErrorKind::Io
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Output DPI
    pub dpi: u32,
    /// Aspect-ratio policy
    pub fit_mode: FitMode,
    /// Detect and crop the printed border
    pub auto_crop: bool,
    /// Physical label size
    pub label_size: LabelSize,
    /// Border detection tuning
    pub crop: CropOptions,
    /// Output page
    pub page: PageSpec,
    /// ImageMagick executable for PDF inputs
    pub renderer: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            fit_mode: FitMode::default(),
            auto_crop: true,
            label_size: LabelSize::default(),
            crop: CropOptions::default(),
            page: PageSpec::default(),
            renderer: RasterizeOptions::default().renderer,
        }
    }
}

impl PipelineConfig {
    /// Builder pattern: set DPI
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    /// Builder pattern: set fit mode
    pub fn with_fit_mode(mut self, fit_mode: FitMode) -> Self {
        self.fit_mode = fit_mode;
        self
    }

    /// Builder pattern: enable or disable border cropping
    pub fn with_auto_crop(mut self, enabled: bool) -> Self {
        self.auto_crop = enabled;
        self
    }

    /// Builder pattern: set label size
    pub fn with_label_size(mut self, size: LabelSize) -> Self {
        self.label_size = size;
        self
    }

    /// Builder pattern: set crop options
    pub fn with_crop(mut self, crop: CropOptions) -> Self {
        self.crop = crop;
        self
    }

    /// Builder pattern: set output page
    pub fn with_page(mut self, page: PageSpec) -> Self {
        self.page = page;
        self
    }

    /// Builder pattern: set PDF renderer executable
    pub fn with_renderer(mut self, renderer: impl Into<String>) -> Self {
        self.renderer = renderer.into();
        self
    }

    /// Target label size in pixels
    pub fn target_pixels(&self) -> (u32, u32) {
        self.label_size.pixel_dimensions(self.dpi)
    }
}

/// One input label, already read into memory
#[derive(Debug, Clone)]
pub struct LabelSource {
    pub bytes: Vec<u8>,
    pub kind: SourceKind,
    /// Display name for logs and reports
    pub name: String,
}

impl LabelSource {
    pub fn new(bytes: Vec<u8>, kind: SourceKind, name: impl Into<String>) -> Self {
        Self {
            bytes,
            kind,
            name: name.into(),
        }
    }

    /// Read a label file, checking existence and extension first
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PipelineError::InputNotFound(path.to_path_buf()));
        }
        let kind = SourceKind::from_path(path)?;
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned();
        Ok(Self::new(bytes, kind, name))
    }
}

/// Everything needed to produce one output page
#[derive(Debug, Clone)]
pub struct LabelJob {
    /// One or two labels
    pub sources: Vec<LabelSource>,
    pub label_size: LabelSize,
    pub fit_mode: FitMode,
    pub dpi: u32,
    pub auto_crop: bool,
    pub crop: CropOptions,
    pub page: PageSpec,
    pub rasterize: RasterizeOptions,
    pub resize: ResizeOptions,
}

impl LabelJob {
    /// Job for `sources` using the parameters in `config`
    pub fn new(sources: Vec<LabelSource>, config: &PipelineConfig) -> Self {
        Self {
            sources,
            label_size: config.label_size,
            fit_mode: config.fit_mode,
            dpi: config.dpi,
            auto_crop: config.auto_crop,
            crop: config.crop,
            page: config.page,
            rasterize: RasterizeOptions::builder()
                .renderer(config.renderer.clone())
                .build(),
            resize: ResizeOptions::default(),
        }
    }
}

/// A label after rasterize, crop and resize
#[derive(Debug, Clone)]
pub struct PreparedLabel {
    pub name: String,
    /// Rasterized size before cropping
    pub source_size: (u32, u32),
    /// `None` when border cropping is disabled
    pub crop: Option<CropDecision>,
    pub buffer: PixelBuffer,
}

impl PreparedLabel {
    pub fn summary(&self) -> LabelSummary {
        LabelSummary {
            name: self.name.clone(),
            source_size: self.source_size,
            crop: self.crop,
            output_size: self.buffer.dimensions(),
        }
    }
}

/// Per-label report kept after composition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSummary {
    pub name: String,
    pub source_size: (u32, u32),
    pub crop: Option<CropDecision>,
    pub output_size: (u32, u32),
}

/// Result of one job
#[derive(Debug, Clone)]
pub struct JobOutput {
    pub document: LabelDocument,
    pub labels: Vec<LabelSummary>,
    /// Processing time in seconds
    pub elapsed_seconds: f64,
}

/// Rasterize, optionally crop, and resize one label
pub fn prepare_label(source: &LabelSource, job: &LabelJob) -> Result<PreparedLabel> {
    let raster = rasterize::rasterize_with(&source.bytes, source.kind, job.dpi, &job.rasterize)?;
    let source_size = raster.dimensions();

    let (cropped, crop) = if job.auto_crop {
        let decision = border_crop::detect_crop(&raster, &job.crop);
        (border_crop::apply_crop(raster, decision), Some(decision))
    } else {
        (raster, None)
    };

    let buffer = resize::resize_with(cropped, job.label_size, job.dpi, job.fit_mode, &job.resize)?;

    info!(
        name = %source.name,
        src_w = source_size.0,
        src_h = source_size.1,
        cropped = crop.is_some_and(|d| d.is_crop()),
        out_w = buffer.width(),
        out_h = buffer.height(),
        "Prepared label"
    );

    Ok(PreparedLabel {
        name: source.name.clone(),
        source_size,
        crop,
        buffer,
    })
}

/// Run a job silently
pub fn process_job(job: &LabelJob) -> Result<JobOutput> {
    process_job_with_progress(job, &SilentProgress)
}

/// Run a job, reporting steps to `progress`
///
/// Two labels are prepared in parallel; the first failure aborts the job.
pub fn process_job_with_progress<P: ProgressCallback>(
    job: &LabelJob,
    progress: &P,
) -> Result<JobOutput> {
    let start_time = Instant::now();
    resize::target_dimensions(job.label_size, job.dpi)?;

    let total = job.sources.len();
    progress.on_step_start("Preparing labels");
    let prepared = match job.sources.as_slice() {
        [single] => vec![prepare_label(single, job)?],
        [first, second] => {
            let (a, b) = rayon::join(|| prepare_label(first, job), || prepare_label(second, job));
            vec![a?, b?]
        }
        other => return Err(ComposeError::LabelCount(other.len()).into()),
    };
    progress.on_step_progress(total, total);
    progress.on_step_complete("Preparing labels", &format!("{} label(s)", total));

    for label in &prepared {
        progress.on_debug(&format!(
            "{}: {}x{} -> {}x{} ({})",
            label.name,
            label.source_size.0,
            label.source_size.1,
            label.buffer.width(),
            label.buffer.height(),
            match label.crop {
                Some(CropDecision::Crop(rect)) => format!(
                    "cropped to {}x{} at ({}, {})",
                    rect.width, rect.height, rect.left, rect.top
                ),
                Some(CropDecision::NoCropNeeded) => "no border found".to_string(),
                None => "crop disabled".to_string(),
            }
        ));
    }

    progress.on_step_start("Composing page");
    let labels: Vec<LabelSummary> = prepared.iter().map(PreparedLabel::summary).collect();
    let buffers: Vec<PixelBuffer> = prepared.into_iter().map(|p| p.buffer).collect();
    let document = compose::compose(&buffers, job.label_size, &job.page)?;
    progress.on_step_complete(
        "Composing page",
        &crate::util::format_file_size(document.len() as u64),
    );

    Ok(JobOutput {
        document,
        labels,
        elapsed_seconds: start_time.elapsed().as_secs_f64(),
    })
}

/// Default output path: `<input stem>_label.pdf` next to the input
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    input.with_file_name(format!("{}_label.pdf", stem))
}

/// Label processing pipeline over files
pub struct LabelPipeline {
    config: PipelineConfig,
}

impl LabelPipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Get the pipeline configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Process one or two label files into a PDF (silent mode)
    pub fn process(
        &self,
        input: &Path,
        input2: Option<&Path>,
        output: Option<&Path>,
    ) -> Result<PathBuf> {
        self.process_with_progress(input, input2, output, &SilentProgress)
            .map(|(path, _)| path)
    }

    /// Process label files with progress callback
    ///
    /// Returns the written path and the job report.
    pub fn process_with_progress<P: ProgressCallback>(
        &self,
        input: &Path,
        input2: Option<&Path>,
        output: Option<&Path>,
        progress: &P,
    ) -> Result<(PathBuf, JobOutput)> {
        for path in std::iter::once(input).chain(input2) {
            if !path.exists() {
                return Err(PipelineError::InputNotFound(path.to_path_buf()));
            }
        }

        let sources = std::iter::once(input)
            .chain(input2)
            .map(LabelSource::from_path)
            .collect::<Result<Vec<_>>>()?;

        let output_path = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| default_output_path(input));

        debug!(
            inputs = sources.len(),
            output = %output_path.display(),
            "Starting label job"
        );

        let job = LabelJob::new(sources, &self.config);
        let result = process_job_with_progress(&job, progress)?;

        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        result.document.write_to(&output_path)?;

        info!(
            output = %output_path.display(),
            bytes = result.document.len(),
            elapsed = result.elapsed_seconds,
            "Wrote label PDF"
        );

        Ok((output_path, result))
    }
}

/// Resize one or two label files and write the 2-up PDF
///
/// `output` defaults to `<input stem>_label.pdf` next to `input`.
pub fn resize_label(
    input: &Path,
    output: Option<&Path>,
    input2: Option<&Path>,
    config: &PipelineConfig,
) -> Result<PathBuf> {
    LabelPipeline::new(config.clone()).process(input, input2, output)
}
