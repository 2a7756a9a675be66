//! label-print - Shipping label resizer and 2-up PDF composer
//!
//! CLI entry point

use clap::Parser;
use indicatif::ProgressBar;
use label_print::{
    create_spinner, default_output_path, expected_render_size, format_duration,
    format_file_size, page_count, page_size_points, pixels_to_inches, points_to_inches,
    resize::plan, supported_extensions, Cli, Commands, Config, ConvertArgs, ExitCode,
    LabelPipeline, PipelineConfig, ProgressCallback, SourceKind, LABEL_SIZES,
};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    let code = match cli.command {
        Commands::Convert(args) => run_convert(&args),
        Commands::Info => {
            init_tracing(0, false);
            run_info()
        }
    };

    std::process::exit(code.code());
}

/// Install the log subscriber; `RUST_LOG` wins over `-v` and the config file
fn init_tracing(verbose: u8, quiet: bool) {
    let default_level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

// ============ Progress Callback Implementation ============

/// Progress callback that drives a spinner
struct SpinnerProgress {
    spinner: Option<ProgressBar>,
    verbose: bool,
}

impl SpinnerProgress {
    fn new(quiet: bool, verbose: u8) -> Self {
        Self {
            spinner: (!quiet).then(|| create_spinner("Starting")),
            verbose: verbose > 0,
        }
    }

    fn finish(&self) {
        if let Some(ref spinner) = self.spinner {
            spinner.finish_and_clear();
        }
    }
}

impl ProgressCallback for SpinnerProgress {
    fn on_step_start(&self, step: &str) {
        if let Some(ref spinner) = self.spinner {
            spinner.set_message(step.to_string());
        }
    }

    fn on_step_progress(&self, current: usize, total: usize) {
        if let Some(ref spinner) = self.spinner {
            spinner.set_message(format!("Preparing labels ({}/{})", current, total));
        }
    }

    fn on_step_complete(&self, step: &str, message: &str) {
        match self.spinner {
            Some(ref spinner) if self.verbose => {
                spinner.println(format!("  {}: {}", step, message))
            }
            _ => {}
        }
    }

    fn on_debug(&self, message: &str) {
        debug!("{}", message);
    }
}

// ============ Convert Command ============

fn run_convert(args: &ConvertArgs) -> ExitCode {
    for input in args.inputs() {
        if !input.exists() {
            eprintln!("Error: Input file not found: {}", input.display());
            return ExitCode::InputNotFound;
        }
        if let Err(e) = SourceKind::from_path(input) {
            eprintln!("Error: {}", e);
            return ExitCode::UnsupportedFormat;
        }
    }

    let file_config = match Config::load_or_search(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: Failed to load config file: {}", e);
            return ExitCode::InvalidArgs;
        }
    };

    let verbose = file_config.verbosity(args.verbose);
    init_tracing(verbose, args.quiet);

    // CLI values take precedence over the config file
    let config = match file_config.merge_with_cli(&args.overrides()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::InvalidArgs;
        }
    };

    if args.dry_run {
        print_execution_plan(args, &config);
        return ExitCode::Success;
    }

    let pipeline = LabelPipeline::new(config);
    let progress = SpinnerProgress::new(args.quiet, verbose);
    let result = pipeline.process_with_progress(
        &args.input,
        args.input2.as_deref(),
        args.output.as_deref(),
        &progress,
    );
    progress.finish();

    match result {
        Ok((path, output)) => {
            if !args.quiet {
                println!(
                    "Saved {} ({}, {} label{}, {})",
                    path.display(),
                    format_file_size(output.document.len() as u64),
                    output.labels.len(),
                    if output.labels.len() == 1 { "" } else { "s" },
                    format_duration(Duration::from_secs_f64(output.elapsed_seconds))
                );
            }
            ExitCode::Success
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from_error_kind(e.kind())
        }
    }
}

/// Print execution plan for dry-run mode
fn print_execution_plan(args: &ConvertArgs, config: &PipelineConfig) {
    let (target_w, target_h) = config.target_pixels();
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input));

    println!("=== Dry Run - Execution Plan ===");
    println!();
    println!("Inputs:");
    for (i, input) in args.inputs().iter().enumerate() {
        let side = if i == 0 { "left" } else { "right" };
        println!("  {}. {} ({})", i + 1, input.display(), side);
        print_source_geometry(input, config);
    }
    println!("Output: {}", output.display());
    println!();
    println!("Pipeline Configuration:");
    println!("  1. Rasterize (DPI: {}, PDF renderer: {})", config.dpi, config.renderer);
    if config.auto_crop {
        println!(
            "  2. Border Crop: ENABLED (threshold {}, padding {}px)",
            config.crop.dark_threshold, config.crop.padding
        );
    } else {
        println!("  2. Border Crop: DISABLED");
    }
    println!(
        "  3. Resize: {} in -> {}x{} px ({})",
        config.label_size, target_w, target_h, config.fit_mode
    );
    println!(
        "  4. Compose: {}x{} in page, {} label(s)",
        config.page.width_in,
        config.page.height_in,
        args.inputs().len()
    );
}

/// Source size and resize geometry, when it can be read without rendering
fn print_source_geometry(input: &Path, config: &PipelineConfig) {
    let Ok(kind) = SourceKind::from_path(input) else {
        return;
    };

    let (w, h) = if kind.is_document() {
        let Ok(bytes) = std::fs::read(input) else {
            return;
        };
        let (Ok(pages), Ok(page_pt)) = (page_count(&bytes), page_size_points(&bytes)) else {
            warn!("{}: cannot read PDF page tree", input.display());
            return;
        };
        println!(
            "     PDF, {} page{}, {:.2}x{:.2} in",
            pages,
            if pages == 1 { "" } else { "s" },
            points_to_inches(page_pt.0),
            points_to_inches(page_pt.1)
        );
        let (w, h) = expected_render_size(page_pt, config.dpi);
        println!("     renders to {}x{} px", w, h);
        (w, h)
    } else {
        let Ok((w, h)) = image::image_dimensions(input) else {
            return;
        };
        println!(
            "     {}x{} px ({:.2}x{:.2} in at {} dpi)",
            w,
            h,
            pixels_to_inches(w, config.dpi),
            pixels_to_inches(h, config.dpi),
            config.dpi
        );
        (w, h)
    };

    match plan(w, h, config.target_pixels(), config.fit_mode) {
        Ok(p) => println!(
            "     scaled to {}x{} at offset ({}, {})",
            p.scaled.0, p.scaled.1, p.offset.0, p.offset.1
        ),
        Err(e) => warn!("{}: {}", input.display(), e),
    }
}

// ============ Info Command ============

fn run_info() -> ExitCode {
    let defaults = PipelineConfig::default();

    println!("label-print v{}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("Supported Formats:");
    println!("  {}", supported_extensions().join(", "));

    println!();
    println!("Label Sizes:");
    for (name, w, h) in LABEL_SIZES {
        println!("  {:<7} {} x {} in", name, w, h);
    }
    println!("  custom  WIDTHxHEIGHT in inches (e.g. 3.5x5)");

    println!();
    println!("Defaults:");
    println!("  DPI: {}", defaults.dpi);
    println!("  Label size: {}", defaults.label_size);
    println!("  Fit mode: {}", defaults.fit_mode);
    println!("  Auto crop: {}", if defaults.auto_crop { "YES" } else { "NO" });
    println!(
        "  Page: {} x {} in",
        defaults.page.width_in, defaults.page.height_in
    );

    println!();
    println!("PDF Renderer:");
    match which::which(&defaults.renderer) {
        Ok(path) => println!("  ImageMagick: {} (found)", path.display()),
        Err(_) => println!("  ImageMagick: Not found (PDF inputs unavailable)"),
    }

    println!();
    println!("Config File Locations:");
    for path in Config::search_paths() {
        println!("  {}", path.display());
    }

    ExitCode::Success
}
