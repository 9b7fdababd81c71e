//! Screenshot discovery.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::error::{IngestError, IngestResult};
use super::filename::{parse_screenshot_filename, ScreenshotKind};
use crate::coord::{BoundingBox, TilePos};
use crate::store::SkippedEntry;

/// One camera position, with the files captured there.
///
/// Every screenshot has a source image. A position only gets an entry once
/// a file for it has been found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screenshot {
    /// World x position.
    pub x: i32,
    /// World z position.
    pub z: i32,
    source: PathBuf,
    kind: ScreenshotKind,
    unused_raw: Option<PathBuf>,
}

impl Screenshot {
    /// A screenshot at `(x, z)` whose only file is `path`.
    pub fn new(x: i32, z: i32, path: impl Into<PathBuf>, kind: ScreenshotKind) -> Self {
        Self {
            x,
            z,
            source: path.into(),
            kind,
            unused_raw: None,
        }
    }

    /// Add another file captured at the same position.
    ///
    /// A pre-cropped frame replaces a full frame as the source. Returns the
    /// already known file when `kind` is a variant this position has.
    fn add(&mut self, path: PathBuf, kind: ScreenshotKind) -> Result<(), &Path> {
        match (self.kind, kind) {
            (ScreenshotKind::Raw, ScreenshotKind::Cropped) => {
                self.unused_raw = Some(std::mem::replace(&mut self.source, path));
                self.kind = ScreenshotKind::Cropped;
                Ok(())
            }
            (ScreenshotKind::Cropped, ScreenshotKind::Raw) if self.unused_raw.is_none() => {
                self.unused_raw = Some(path);
                Ok(())
            }
            (ScreenshotKind::Cropped, ScreenshotKind::Raw) => {
                Err(self.unused_raw.as_deref().unwrap_or(&self.source))
            }
            _ => Err(&self.source),
        }
    }

    /// Image to cut the tile from: the cropped frame when available.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Variant of [`source`](Self::source).
    pub fn kind(&self) -> ScreenshotKind {
        self.kind
    }

    /// Full frame that lost out to a pre-cropped one.
    pub fn unused_raw(&self) -> Option<&Path> {
        self.unused_raw.as_deref()
    }

    /// Grid position for a world-space spacing of `step`.
    pub fn grid_position(&self, step: i32) -> TilePos {
        TilePos::new(self.x.div_euclid(step), self.z.div_euclid(step))
    }
}

/// What a directory scan found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// PNG files matched by the scan.
    pub files: usize,
    /// Distinct camera positions.
    pub screenshots: usize,
    /// Files left out, with the reason.
    pub skipped: Vec<SkippedEntry>,
}

/// Screenshots of one capture run, sorted by world position (x, then z).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScreenshotSet {
    screenshots: Vec<Screenshot>,
}

impl ScreenshotSet {
    /// Scan `<input>/*/*.png` for screenshots.
    ///
    /// Files with unparsable names, and second copies of a variant already
    /// seen for the same position, are skipped and listed in the report.
    pub fn from_directory(input: &Path) -> IngestResult<(Self, ScanReport)> {
        let root = input
            .to_str()
            .ok_or_else(|| IngestError::InvalidInputPath(input.to_path_buf()))?;
        let pattern = format!("{}/*/*.png", glob::Pattern::escape(root));

        let mut by_position: BTreeMap<(i32, i32), Screenshot> = BTreeMap::new();
        let mut report = ScanReport::default();

        for entry in glob::glob(&pattern)? {
            let path = match entry {
                Ok(path) => path,
                Err(err) => {
                    warn!(path = %err.path().display(), error = %err, "Unreadable entry");
                    report.skipped.push(SkippedEntry {
                        path: err.path().to_path_buf(),
                        reason: err.to_string(),
                    });
                    continue;
                }
            };
            report.files += 1;

            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_default();
            let name = match parse_screenshot_filename(&file_name) {
                Ok(name) => name,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "Skipping file");
                    report.skipped.push(SkippedEntry {
                        path,
                        reason: err.to_string(),
                    });
                    continue;
                }
            };

            let key = (name.x, name.z);
            let Some(screenshot) = by_position.get_mut(&key) else {
                debug!(x = name.x, z = name.z, kind = %name.kind, "Found screenshot");
                by_position.insert(key, Screenshot::new(name.x, name.z, path, name.kind));
                continue;
            };
            if let Err(existing) = screenshot.add(path.clone(), name.kind) {
                warn!(
                    path = %path.display(),
                    existing = %existing.display(),
                    "Duplicate {} screenshot",
                    name.kind
                );
                report.skipped.push(SkippedEntry {
                    reason: format!("duplicate of {}", existing.display()),
                    path,
                });
                continue;
            }
            debug!(x = name.x, z = name.z, kind = %name.kind, "Found screenshot");
        }

        let set = Self {
            screenshots: by_position.into_values().collect(),
        };
        report.screenshots = set.len();
        info!(
            input = %input.display(),
            files = report.files,
            screenshots = report.screenshots,
            skipped = report.skipped.len(),
            "Scanned screenshots"
        );
        Ok((set, report))
    }

    /// Build a set from already-known screenshots.
    pub fn from_screenshots(mut screenshots: Vec<Screenshot>) -> Self {
        screenshots.sort_by_key(|s| (s.x, s.z));
        Self { screenshots }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Screenshot> {
        self.screenshots.iter()
    }

    pub fn len(&self) -> usize {
        self.screenshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.screenshots.is_empty()
    }

    /// World-space bounds of the camera positions.
    pub fn world_bounds(&self) -> Option<BoundingBox> {
        BoundingBox::from_positions(self.screenshots.iter().map(|s| TilePos::new(s.x, s.z)))
    }

    /// World-space spacing between neighbouring camera positions.
    ///
    /// Uses `configured` when given. Otherwise the smallest positive gap
    /// between distinct x values or between distinct z values.
    ///
    /// # Errors
    ///
    /// [`IngestError::UndeterminedStep`] when there is no explicit step and
    /// fewer than two distinct positions on both axes.
    pub fn step(&self, configured: Option<i32>) -> IngestResult<i32> {
        if let Some(step) = configured {
            return Ok(step);
        }

        let smallest_gap = |values: Vec<i32>| {
            let mut values = values;
            values.sort_unstable();
            values.dedup();
            values.windows(2).map(|w| w[1] - w[0]).min()
        };
        let x_gap = smallest_gap(self.screenshots.iter().map(|s| s.x).collect());
        let z_gap = smallest_gap(self.screenshots.iter().map(|s| s.z).collect());

        match (x_gap, z_gap) {
            (Some(a), Some(b)) => Ok(a.min(b)),
            (Some(gap), None) | (None, Some(gap)) => Ok(gap),
            (None, None) => Err(IngestError::UndeterminedStep {
                screenshots: self.len(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::fs;
    use tempfile::TempDir;

    fn touch_png(dir: &Path, name: &str) -> PathBuf {
        fs::create_dir_all(dir).unwrap();
        let path = dir.join(name);
        RgbImage::from_pixel(2, 2, Rgb([0, 0, 0])).save(&path).unwrap();
        path
    }

    fn shot(x: i32, z: i32) -> Screenshot {
        Screenshot::new(x, z, format!("s_{x}_{z}.png"), ScreenshotKind::Raw)
    }

    #[test]
    fn test_scan_merges_raw_and_cropped() {
        let temp = TempDir::new().unwrap();
        let run = temp.path().join("run1");
        let raw = touch_png(&run, "everon_0_0.png");
        let cropped = touch_png(&run, "everon_0_0_tile.png");
        touch_png(&run, "everon_100_0.png");

        let (set, report) = ScreenshotSet::from_directory(temp.path()).unwrap();

        assert_eq!(report.files, 3);
        assert_eq!(report.screenshots, 2);
        assert!(report.skipped.is_empty());
        let first = set.iter().next().unwrap();
        assert_eq!(first.source(), cropped.as_path());
        assert_eq!(first.kind(), ScreenshotKind::Cropped);
        assert_eq!(first.unused_raw(), Some(raw.as_path()));
    }

    #[test]
    fn test_cropped_frame_replaces_raw_source() {
        let mut shot = Screenshot::new(0, 0, "a_0_0_tile.png", ScreenshotKind::Cropped);

        assert!(shot.add(PathBuf::from("a_0_0.png"), ScreenshotKind::Raw).is_ok());
        assert_eq!(shot.source(), Path::new("a_0_0_tile.png"));
        assert_eq!(shot.unused_raw(), Some(Path::new("a_0_0.png")));

        assert_eq!(
            shot.add(PathBuf::from("b_0_0.png"), ScreenshotKind::Raw),
            Err(Path::new("a_0_0.png"))
        );
        assert_eq!(
            shot.add(PathBuf::from("b_0_0_tile.png"), ScreenshotKind::Cropped),
            Err(Path::new("a_0_0_tile.png"))
        );
    }

    #[test]
    fn test_scan_skips_malformed_and_duplicates() {
        let temp = TempDir::new().unwrap();
        touch_png(&temp.path().join("a"), "everon_0_0.png");
        touch_png(&temp.path().join("b"), "everon_0_0.png");
        touch_png(&temp.path().join("b"), "thumbnail.png");
        // Files directly in the root are not part of any capture run.
        touch_png(temp.path(), "everon_5_5.png");

        let (set, report) = ScreenshotSet::from_directory(temp.path()).unwrap();

        assert_eq!(set.len(), 1);
        assert_eq!(report.files, 3);
        assert_eq!(report.skipped.len(), 2);
        assert!(report
            .skipped
            .iter()
            .any(|s| s.path.ends_with("thumbnail.png")));
    }

    #[test]
    fn test_scan_sorts_by_position() {
        let temp = TempDir::new().unwrap();
        let run = temp.path().join("run");
        for name in ["m_200_0.png", "m_-100_50.png", "m_-100_0.png"] {
            touch_png(&run, name);
        }

        let (set, _) = ScreenshotSet::from_directory(temp.path()).unwrap();

        let positions: Vec<(i32, i32)> = set.iter().map(|s| (s.x, s.z)).collect();
        assert_eq!(positions, vec![(-100, 0), (-100, 50), (200, 0)]);
        assert_eq!(set.world_bounds(), Some(BoundingBox::new(-100, 0, 200, 50)));
    }

    #[test]
    fn test_scan_empty_directory() {
        let temp = TempDir::new().unwrap();
        let (set, report) = ScreenshotSet::from_directory(temp.path()).unwrap();
        assert!(set.is_empty());
        assert_eq!(report, ScanReport::default());
    }

    #[test]
    fn test_step_from_smallest_gap() {
        let set = ScreenshotSet::from_screenshots(vec![shot(0, 0), shot(200, 0), shot(0, 100)]);
        assert_eq!(set.step(None).unwrap(), 100);
    }

    #[test]
    fn test_step_single_axis() {
        let set = ScreenshotSet::from_screenshots(vec![shot(0, 0), shot(0, 64), shot(0, 192)]);
        assert_eq!(set.step(None).unwrap(), 64);
    }

    #[test]
    fn test_step_configured_wins() {
        let set = ScreenshotSet::from_screenshots(vec![shot(0, 0), shot(200, 0)]);
        assert_eq!(set.step(Some(50)).unwrap(), 50);
    }

    #[test]
    fn test_step_undetermined() {
        let set = ScreenshotSet::from_screenshots(vec![shot(10, 10)]);
        assert!(matches!(
            set.step(None),
            Err(IngestError::UndeterminedStep { screenshots: 1 })
        ));
    }

    #[test]
    fn test_grid_position_floors_negative_world_coordinates() {
        assert_eq!(shot(-100, 250).grid_position(100), TilePos::new(-1, 2));
        assert_eq!(shot(-1, 0).grid_position(100), TilePos::new(-1, 0));
        assert_eq!(shot(0, 99).grid_position(100), TilePos::new(0, 0));
    }
}
