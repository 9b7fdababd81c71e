//! Configuration for pyramid building and screenshot ingestion.
//!
//! All settings travel as explicit values handed to the components at
//! construction. Settings may come from defaults, an INI file
//! ([`ConfigFile`]) or CLI flags, in increasing order of precedence.

mod file;

pub use file::ConfigFile;

use std::path::PathBuf;

use image::Rgb;
use thiserror::Error;

/// Default number of coarser levels built above LOD 0.
pub const DEFAULT_MAX_LOD: u32 = 5;

/// Default background fill, matching the sea color of the source maps.
pub const DEFAULT_BACKGROUND_COLOR: Rgb<u8> = Rgb([0x2B, 0x3D, 0x49]);

/// Default JPEG quality for pyramid tiles.
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Default center crop applied to raw screenshots, in pixels.
pub const DEFAULT_CROP_SIZE: u32 = 550;

/// Default seam overlap between neighbouring screenshots, in pixels.
pub const DEFAULT_OVERLAP: i32 = -7;

/// Default JPEG quality for LOD-0 tiles cut from screenshots.
pub const DEFAULT_INGEST_JPEG_QUALITY: u8 = 95;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read or parsed.
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    /// The config file could not be written.
    #[error("failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A value in the config file could not be parsed.
    #[error("invalid value '{value}' for {section}.{key}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
    },

    /// A color string is not of the form `#RRGGBB`.
    #[error("invalid color '{0}', expected #RRGGBB")]
    InvalidColor(String),

    /// `max_lod` must be at least 1.
    #[error("max_lod must be at least 1, got {0}")]
    InvalidMaxLod(u32),

    /// JPEG quality must be in 1..=100.
    #[error("jpeg quality must be between 1 and 100, got {0}")]
    InvalidJpegQuality(u8),

    /// The crop must leave a positive tile size once the overlap is applied.
    #[error("crop size {crop_size} with overlap {overlap} leaves no pixels")]
    InvalidCrop { crop_size: u32, overlap: i32 },

    /// Screenshot spacing must be positive.
    #[error("screenshot step must be positive, got {0}")]
    InvalidStep(i32),
}

/// Settings for the pyramid builder and the tile store it writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PyramidConfig {
    /// Coarsest level to build. LOD 0 is the source level.
    pub max_lod: u32,
    /// Fill for empty tiles and for missing quadrants in merges.
    pub background_color: Rgb<u8>,
    /// Rewrite tiles that already exist instead of keeping them.
    pub overwrite_existing: bool,
    /// JPEG quality used for every tile written.
    pub jpeg_quality: u8,
}

impl Default for PyramidConfig {
    fn default() -> Self {
        Self {
            max_lod: DEFAULT_MAX_LOD,
            background_color: DEFAULT_BACKGROUND_COLOR,
            overwrite_existing: false,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl PyramidConfig {
    /// Create a config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the coarsest level to build.
    pub fn with_max_lod(mut self, max_lod: u32) -> Self {
        self.max_lod = max_lod;
        self
    }

    /// Set the background fill color.
    pub fn with_background_color(mut self, color: Rgb<u8>) -> Self {
        self.background_color = color;
        self
    }

    /// Set whether existing tiles are rewritten.
    pub fn with_overwrite_existing(mut self, overwrite: bool) -> Self {
        self.overwrite_existing = overwrite;
        self
    }

    /// Set the JPEG quality.
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    /// Check all values are within range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_lod < 1 {
            return Err(ConfigError::InvalidMaxLod(self.max_lod));
        }
        validate_jpeg_quality(self.jpeg_quality)
    }
}

/// Settings for turning raw screenshots into LOD-0 tiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestConfig {
    /// Edge length of the center crop taken from each screenshot.
    pub crop_size: u32,
    /// Pixels added to the crop (negative trims) so neighbours line up.
    pub overlap: i32,
    /// World-unit spacing of screenshots. Derived from the files when unset.
    pub step: Option<i32>,
    /// JPEG quality for the LOD-0 tiles.
    pub jpeg_quality: u8,
    /// Keep LOD-0 tiles that already exist.
    pub skip_existing: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            crop_size: DEFAULT_CROP_SIZE,
            overlap: DEFAULT_OVERLAP,
            step: None,
            jpeg_quality: DEFAULT_INGEST_JPEG_QUALITY,
            skip_existing: true,
        }
    }
}

impl IngestConfig {
    /// Create a config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the center crop size.
    pub fn with_crop_size(mut self, crop_size: u32) -> Self {
        self.crop_size = crop_size;
        self
    }

    /// Set the seam overlap.
    pub fn with_overlap(mut self, overlap: i32) -> Self {
        self.overlap = overlap;
        self
    }

    /// Set an explicit screenshot spacing.
    pub fn with_step(mut self, step: i32) -> Self {
        self.step = Some(step);
        self
    }

    /// Set the JPEG quality.
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    /// Set whether existing LOD-0 tiles are kept.
    pub fn with_skip_existing(mut self, skip: bool) -> Self {
        self.skip_existing = skip;
        self
    }

    /// Final LOD-0 tile edge length: the crop plus the overlap.
    pub fn tile_size(&self) -> u32 {
        (self.crop_size as i64 + self.overlap as i64).max(0) as u32
    }

    /// Check all values are within range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tile_size() == 0 {
            return Err(ConfigError::InvalidCrop {
                crop_size: self.crop_size,
                overlap: self.overlap,
            });
        }
        if let Some(step) = self.step {
            if step <= 0 {
                return Err(ConfigError::InvalidStep(step));
            }
        }
        validate_jpeg_quality(self.jpeg_quality)
    }
}

fn validate_jpeg_quality(quality: u8) -> Result<(), ConfigError> {
    if (1..=100).contains(&quality) {
        Ok(())
    } else {
        Err(ConfigError::InvalidJpegQuality(quality))
    }
}

/// Parse a `#RRGGBB` color (the leading `#` is optional).
pub fn parse_hex_color(s: &str) -> Result<Rgb<u8>, ConfigError> {
    let hex = s.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ConfigError::InvalidColor(s.to_string()));
    }

    let channel = |i: usize| {
        u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| ConfigError::InvalidColor(s.to_string()))
    };
    Ok(Rgb([channel(0)?, channel(2)?, channel(4)?]))
}

/// Format a color as `#RRGGBB`.
pub fn format_hex_color(color: Rgb<u8>) -> String {
    let [r, g, b] = color.0;
    format!("#{:02X}{:02X}{:02X}", r, g, b)
}
