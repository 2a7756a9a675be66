//! Configuration file support for label-print
//!
//! Supports TOML configuration files with the following search order:
//! 1. `--config <path>` - explicitly specified path
//! 2. `./label-print.toml` - current directory
//! 3. `~/.config/label-print/config.toml` - user config
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [general]
//! dpi = 203
//!
//! [label]
//! size = "4x6"
//! fit = "fill"
//! auto_crop = true
//!
//! [crop]
//! dark_threshold = 90
//! padding = 4
//!
//! [page]
//! width_in = 11.0
//! height_in = 8.5
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::border_crop::CropOptions;
use crate::label::{FitMode, LabelSize, PageSpec};
use crate::PipelineConfig;

/// File name looked up in the current directory
pub const LOCAL_CONFIG_FILE: &str = "label-print.toml";

/// Directory under the user config dir
pub const APP_CONFIG_DIR: &str = "label-print";

/// Configuration file errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading config file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// File not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Well-formed TOML with a value out of range
    #[error("Invalid config value for '{key}': {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// General configuration options
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfig {
    /// Output DPI
    #[serde(default)]
    pub dpi: Option<u32>,

    /// Verbosity level (0-3)
    #[serde(default)]
    pub verbose: Option<u8>,
}

/// Label configuration options
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LabelConfig {
    /// Catalog name or `WxH` in inches
    #[serde(default)]
    pub size: Option<String>,

    /// `fit`, `fill` or `stretch`
    #[serde(default)]
    pub fit: Option<String>,

    /// Detect and crop the printed border
    #[serde(default)]
    pub auto_crop: Option<bool>,
}

/// Border detection tuning
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CropConfig {
    #[serde(default)]
    pub dark_threshold: Option<u8>,

    #[serde(default)]
    pub min_area_ratio: Option<f64>,

    #[serde(default)]
    pub edge_scan_limit: Option<u32>,

    #[serde(default)]
    pub padding: Option<u32>,
}

/// Output page size in inches
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PageConfig {
    #[serde(default)]
    pub width_in: Option<f64>,

    #[serde(default)]
    pub height_in: Option<f64>,
}

/// PDF rendering configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RenderConfig {
    /// ImageMagick executable
    #[serde(default)]
    pub renderer: Option<String>,
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// General settings
    #[serde(default)]
    pub general: GeneralConfig,

    /// Label settings
    #[serde(default)]
    pub label: LabelConfig,

    /// Border crop settings
    #[serde(default)]
    pub crop: CropConfig,

    /// Page settings
    #[serde(default)]
    pub page: PageConfig,

    /// Render settings
    #[serde(default)]
    pub render: RenderConfig,
}

fn invalid(key: &'static str, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        key,
        reason: reason.to_string(),
    }
}

fn check_page(page: &PageSpec) -> Result<(), ConfigError> {
    let positive = |v: f64| v.is_finite() && v > 0.0;
    if !(positive(page.width_in) && positive(page.height_in)) {
        return Err(invalid(
            "page",
            format!("size must be positive, got {}x{}", page.width_in, page.height_in),
        ));
    }
    Ok(())
}

impl Config {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from the default search path
    ///
    /// Search order:
    /// 1. `./label-print.toml`
    /// 2. `~/.config/label-print/config.toml`
    /// 3. Default values (if no file found)
    pub fn load() -> Result<Self, ConfigError> {
        for path in Self::search_paths() {
            if path.exists() {
                return Self::load_from_path(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load an explicit path if given, otherwise search the default locations
    pub fn load_or_search(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific file path
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Check every present value
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.to_pipeline_config().map(|_| ())
    }

    /// Convert to PipelineConfig
    pub fn to_pipeline_config(&self) -> Result<PipelineConfig, ConfigError> {
        let mut config = PipelineConfig::default();

        // Apply general settings
        if self.general.verbose.is_some_and(|v| v > 3) {
            return Err(invalid("general.verbose", "must be between 0 and 3"));
        }
        if let Some(dpi) = self.general.dpi {
            if dpi == 0 {
                return Err(invalid("general.dpi", "must be positive"));
            }
            config = config.with_dpi(dpi);
        }

        // Apply label settings
        if let Some(ref size) = self.label.size {
            let size: LabelSize = size.parse().map_err(|e| invalid("label.size", e))?;
            config = config.with_label_size(size);
        }
        if let Some(ref fit) = self.label.fit {
            let fit: FitMode = fit.parse().map_err(|e| invalid("label.fit", e))?;
            config = config.with_fit_mode(fit);
        }
        if let Some(auto_crop) = self.label.auto_crop {
            config = config.with_auto_crop(auto_crop);
        }

        // Apply crop settings
        let mut crop = CropOptions::builder();
        if let Some(threshold) = self.crop.dark_threshold {
            crop = crop.dark_threshold(threshold);
        }
        if let Some(ratio) = self.crop.min_area_ratio {
            if !(0.0..=1.0).contains(&ratio) {
                return Err(invalid("crop.min_area_ratio", "must be between 0.0 and 1.0"));
            }
            crop = crop.min_area_ratio(ratio);
        }
        if let Some(limit) = self.crop.edge_scan_limit {
            crop = crop.edge_scan_limit(limit);
        }
        if let Some(padding) = self.crop.padding {
            crop = crop.padding(padding);
        }
        config = config.with_crop(crop.build());

        // Apply page settings
        let page = PageSpec {
            width_in: self.page.width_in.unwrap_or(config.page.width_in),
            height_in: self.page.height_in.unwrap_or(config.page.height_in),
        };
        check_page(&page)?;
        config = config.with_page(page);

        // Apply render settings
        if let Some(ref renderer) = self.render.renderer {
            if renderer.trim().is_empty() {
                return Err(invalid("render.renderer", "must not be empty"));
            }
            config = config.with_renderer(renderer.trim());
        }

        Ok(config)
    }

    /// Log verbosity: the `-v` count when given, otherwise `[general] verbose`
    pub fn verbosity(&self, cli_verbose: u8) -> u8 {
        if cli_verbose > 0 {
            cli_verbose
        } else {
            self.general.verbose.unwrap_or(0)
        }
    }

    /// Merge with CLI arguments (CLI takes precedence)
    pub fn merge_with_cli(&self, cli: &CliOverrides) -> Result<PipelineConfig, ConfigError> {
        let mut config = self.to_pipeline_config()?;

        // CLI overrides take precedence
        if let Some(dpi) = cli.dpi {
            config = config.with_dpi(dpi);
        }
        if let Some(size) = cli.label_size {
            config = config.with_label_size(size);
        }
        if let Some(fit) = cli.fit_mode {
            config = config.with_fit_mode(fit);
        }
        if let Some(auto_crop) = cli.auto_crop {
            config = config.with_auto_crop(auto_crop);
        }
        if let Some(width) = cli.page_width_in {
            config.page.width_in = width;
        }
        if let Some(height) = cli.page_height_in {
            config.page.height_in = height;
        }
        check_page(&config.page)?;

        Ok(config)
    }

    /// Get config file search paths
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join(APP_CONFIG_DIR).join("config.toml"));
        }

        paths
    }
}

/// CLI override values for merging with config file
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub dpi: Option<u32>,
    pub label_size: Option<LabelSize>,
    pub fit_mode: Option<FitMode>,
    pub auto_crop: Option<bool>,
    pub page_width_in: Option<f64>,
    pub page_height_in: Option<f64>,
}

impl CliOverrides {
    /// Create new empty overrides
    pub fn new() -> Self {
        Self::default()
    }

    /// Set DPI override
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = Some(dpi);
        self
    }

    /// Set label size override
    pub fn with_label_size(mut self, size: LabelSize) -> Self {
        self.label_size = Some(size);
        self
    }

    /// Set fit mode override
    pub fn with_fit_mode(mut self, fit: FitMode) -> Self {
        self.fit_mode = Some(fit);
        self
    }

    /// Set auto crop override
    pub fn with_auto_crop(mut self, enabled: bool) -> Self {
        self.auto_crop = Some(enabled);
        self
    }
}
