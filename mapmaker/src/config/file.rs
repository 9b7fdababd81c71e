//! INI configuration file.
//!
//! ```ini
//! [pyramid]
//! max_lod = 5
//! background_color = 2B3D49
//! overwrite_existing = false
//! jpeg_quality = 90
//!
//! [ingest]
//! crop_size = 550
//! overlap = -7
//! step = 100
//! jpeg_quality = 95
//! ```
//!
//! Every key is optional. Missing keys keep their defaults. Colors are
//! written without the leading `#`, which INI readers treat as a comment
//! marker; a leading `#` is still accepted when reading.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use ini::{Ini, Properties};

use super::{format_hex_color, parse_hex_color, ConfigError, IngestConfig, PyramidConfig};

const PYRAMID_SECTION: &str = "pyramid";
const INGEST_SECTION: &str = "ingest";

/// Settings loaded from a config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub pyramid: PyramidConfig,
    pub ingest: IngestConfig,
}

impl ConfigFile {
    /// Load settings from an INI file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ini(&ini)
    }

    /// Load settings from `path` when given, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Parse settings from INI text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::Read {
            path: "<string>".into(),
            source: ini::Error::Parse(e),
        })?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(section) = ini.section(Some(PYRAMID_SECTION)) {
            let pyramid = &mut config.pyramid;
            if let Some(v) = parse_key(section, PYRAMID_SECTION, "max_lod")? {
                pyramid.max_lod = v;
            }
            if let Some(raw) = section.get("background_color") {
                pyramid.background_color = parse_hex_color(raw)?;
            }
            if let Some(v) = parse_key(section, PYRAMID_SECTION, "overwrite_existing")? {
                pyramid.overwrite_existing = v;
            }
            if let Some(v) = parse_key(section, PYRAMID_SECTION, "jpeg_quality")? {
                pyramid.jpeg_quality = v;
            }
        }

        if let Some(section) = ini.section(Some(INGEST_SECTION)) {
            let ingest = &mut config.ingest;
            if let Some(v) = parse_key(section, INGEST_SECTION, "crop_size")? {
                ingest.crop_size = v;
            }
            if let Some(v) = parse_key(section, INGEST_SECTION, "overlap")? {
                ingest.overlap = v;
            }
            if let Some(v) = parse_key(section, INGEST_SECTION, "step")? {
                ingest.step = Some(v);
            }
            if let Some(v) = parse_key(section, INGEST_SECTION, "jpeg_quality")? {
                ingest.jpeg_quality = v;
            }
            if let Some(v) = parse_key(section, INGEST_SECTION, "skip_existing")? {
                ingest.skip_existing = v;
            }
        }

        config.pyramid.validate()?;
        config.ingest.validate()?;
        Ok(config)
    }

    /// Write settings to an INI file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        self.to_ini()
            .write_to_file(path)
            .map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })
    }

    fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        let pyramid = Some(PYRAMID_SECTION);
        ini.set_to(pyramid, "max_lod".into(), self.pyramid.max_lod.to_string());
        ini.set_to(
            pyramid,
            "background_color".into(),
            format_hex_color(self.pyramid.background_color)
                .trim_start_matches('#')
                .to_string(),
        );
        ini.set_to(
            pyramid,
            "overwrite_existing".into(),
            self.pyramid.overwrite_existing.to_string(),
        );
        ini.set_to(
            pyramid,
            "jpeg_quality".into(),
            self.pyramid.jpeg_quality.to_string(),
        );

        let ingest = Some(INGEST_SECTION);
        ini.set_to(ingest, "crop_size".into(), self.ingest.crop_size.to_string());
        ini.set_to(ingest, "overlap".into(), self.ingest.overlap.to_string());
        if let Some(step) = self.ingest.step {
            ini.set_to(ingest, "step".into(), step.to_string());
        }
        ini.set_to(
            ingest,
            "jpeg_quality".into(),
            self.ingest.jpeg_quality.to_string(),
        );
        ini.set_to(
            ingest,
            "skip_existing".into(),
            self.ingest.skip_existing.to_string(),
        );
        ini
    }
}

/// Renders the settings as the INI text [`ConfigFile::save`] writes.
impl fmt::Display for ConfigFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = Vec::new();
        self.to_ini().write_to(&mut buf).map_err(|_| fmt::Error)?;
        f.write_str(&String::from_utf8_lossy(&buf))
    }
}

fn parse_key<T: FromStr>(
    section: &Properties,
    section_name: &str,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    let Some(raw) = section.get(key) else {
        return Ok(None);
    };
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|_| ConfigError::InvalidValue {
            section: section_name.to_string(),
            key: key.to_string(),
            value: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use tempfile::TempDir;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = ConfigFile::parse("").unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_parse_all_keys() {
        let config = ConfigFile::parse(
            "[pyramid]\n\
             max_lod = 3\n\
             background_color = 102030\n\
             overwrite_existing = true\n\
             jpeg_quality = 85\n\
             [ingest]\n\
             crop_size = 600\n\
             overlap = -10\n\
             step = 100\n\
             jpeg_quality = 98\n\
             skip_existing = false\n",
        )
        .unwrap();

        assert_eq!(config.pyramid.max_lod, 3);
        assert_eq!(config.pyramid.background_color, Rgb([0x10, 0x20, 0x30]));
        assert!(config.pyramid.overwrite_existing);
        assert_eq!(config.pyramid.jpeg_quality, 85);
        assert_eq!(config.ingest.crop_size, 600);
        assert_eq!(config.ingest.overlap, -10);
        assert_eq!(config.ingest.step, Some(100));
        assert_eq!(config.ingest.jpeg_quality, 98);
        assert!(!config.ingest.skip_existing);
    }

    #[test]
    fn test_invalid_value_names_the_key() {
        let err = ConfigFile::parse("[pyramid]\nmax_lod = lots\n").unwrap_err();
        match err {
            ConfigError::InvalidValue {
                section,
                key,
                value,
            } => {
                assert_eq!(section, "pyramid");
                assert_eq!(key, "max_lod");
                assert_eq!(value, "lots");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_out_of_range_values_are_rejected() {
        assert!(matches!(
            ConfigFile::parse("[pyramid]\nmax_lod = 0\n"),
            Err(ConfigError::InvalidMaxLod(0))
        ));
        assert!(matches!(
            ConfigFile::parse("[pyramid]\nbackground_color = navy\n"),
            Err(ConfigError::InvalidColor(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("mapmaker.ini");

        let mut config = ConfigFile::default();
        config.pyramid.max_lod = 4;
        config.pyramid.background_color = Rgb([9, 8, 7]);
        config.ingest.step = Some(250);
        config.save(&path).unwrap();

        assert_eq!(ConfigFile::load(&path).unwrap(), config);
    }

    #[test]
    fn test_display_matches_saved_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("mapmaker.ini");
        let config = ConfigFile::default();
        config.save(&path).unwrap();

        let text = config.to_string();

        assert_eq!(text, std::fs::read_to_string(&path).unwrap());
        assert!(text.contains("[pyramid]"));
        assert!(text.contains("2B3D49"));
        assert_eq!(ConfigFile::parse(&text).unwrap(), config);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = ConfigFile::load(Path::new("/nonexistent/mapmaker.ini")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_load_or_default_without_path() {
        assert_eq!(
            ConfigFile::load_or_default(None).unwrap(),
            ConfigFile::default()
        );
    }
}
