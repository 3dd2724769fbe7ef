use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use geo::coord;

use crate::domain::{ZoneError, ZoneMap, zone::default_zone_name};
use crate::occupancy::{DEFAULT_LOW_THRESHOLD, DEFAULT_VEHICLE_LABEL};

/// Frame size the zone polygons are drawn in (the feed is resized to this
/// before detection)
pub const DEFAULT_FRAME_WIDTH: u32 = 1020;
pub const DEFAULT_FRAME_HEIGHT: u32 = 500;

/// Parking spaces of the reference lot, in 1020x500 frame pixels
const DEFAULT_ZONES: [[[f64; 2]; 4]; 12] = [
    [[49.0, 364.0], [20.0, 424.0], [71.0, 424.0], [92.0, 365.0]],
    [[105.0, 353.0], [86.0, 428.0], [137.0, 427.0], [146.0, 358.0]],
    [[159.0, 354.0], [150.0, 427.0], [204.0, 425.0], [203.0, 353.0]],
    [[217.0, 352.0], [219.0, 422.0], [273.0, 418.0], [261.0, 347.0]],
    [[274.0, 345.0], [286.0, 417.0], [338.0, 415.0], [321.0, 345.0]],
    [[336.0, 343.0], [357.0, 410.0], [409.0, 408.0], [382.0, 340.0]],
    [[396.0, 338.0], [426.0, 404.0], [479.0, 399.0], [439.0, 334.0]],
    [[458.0, 333.0], [494.0, 397.0], [543.0, 390.0], [495.0, 330.0]],
    [[509.0, 335.0], [557.0, 388.0], [603.0, 383.0], [549.0, 324.0]],
    [[564.0, 323.0], [615.0, 381.0], [654.0, 372.0], [596.0, 315.0]],
    [[616.0, 316.0], [666.0, 369.0], [703.0, 363.0], [642.0, 312.0]],
    [[674.0, 311.0], [730.0, 360.0], [764.0, 355.0], [707.0, 308.0]],
];

fn default_zones() -> Vec<ZoneConfig> {
    DEFAULT_ZONES
        .iter()
        .map(|points| ZoneConfig {
            name: None,
            points: points.to_vec(),
        })
        .collect()
}
fn default_allowed_labels() -> Vec<String> {
    vec![DEFAULT_VEHICLE_LABEL.to_string()]
}
fn default_low_threshold() -> usize {
    DEFAULT_LOW_THRESHOLD
}
fn default_frame_width() -> u32 {
    DEFAULT_FRAME_WIDTH
}
fn default_frame_height() -> u32 {
    DEFAULT_FRAME_HEIGHT
}
fn default_workers() -> usize {
    1
}
fn default_verbose() -> bool {
    false
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// One parking zone as written in the config file
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ZoneConfig {
    #[serde(default)]
    pub name: Option<String>,
    /// Polygon vertices as [x, y] pixel pairs
    pub points: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct FileConfig {
    #[serde(default = "default_zones")]
    pub zones: Vec<ZoneConfig>,
    #[serde(default = "default_allowed_labels")]
    pub allowed_labels: Vec<String>,
    #[serde(default = "default_low_threshold")]
    pub low_threshold: usize,
    #[serde(default = "default_frame_width")]
    pub frame_width: u32,
    #[serde(default = "default_frame_height")]
    pub frame_height: u32,
    /// Resolution the detector ran at, if different from the zone frame
    #[serde(default)]
    pub source_width: Option<u32>,
    #[serde(default)]
    pub source_height: Option<u32>,
    /// Class names file, one per line; the COCO list is used when absent
    #[serde(default)]
    pub class_file: Option<PathBuf>,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_verbose")]
    pub verbose: bool,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            zones: default_zones(),
            allowed_labels: default_allowed_labels(),
            low_threshold: default_low_threshold(),
            frame_width: default_frame_width(),
            frame_height: default_frame_height(),
            source_width: None,
            source_height: None,
            class_file: None,
            workers: default_workers(),
            verbose: default_verbose(),
        }
    }
}

impl FileConfig {
    /// Search the usual locations for a config file
    ///
    /// Returns `Ok(None)` when no file exists. A file that exists but cannot be
    /// read or parsed is an error rather than falling back to defaults.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        Self::load_first(&get_config_paths())
    }

    /// Load the first existing file among `paths`
    pub fn load_first(paths: &[PathBuf]) -> Result<Option<Self>, ConfigError> {
        match paths.iter().find(|path| path.exists()) {
            Some(path) => {
                info!("Using config file {:?}", path);
                Self::from_file(path).map(Some)
            }
            None => Ok(None),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Build the zone map; any invalid zone rejects the whole config
    pub fn zone_map(&self) -> Result<ZoneMap, ZoneError> {
        ZoneMap::new(self.zones.iter().enumerate().map(|(i, zone)| {
            let name = zone.name.clone().unwrap_or_else(|| default_zone_name(i));
            let vertices = zone
                .points
                .iter()
                .map(|&[x, y]| coord! { x: x, y: y })
                .collect();
            (name, vertices)
        }))
    }

    pub fn frame_size(&self) -> (u32, u32) {
        (self.frame_width, self.frame_height)
    }

    /// Detector resolution, only when both dimensions are configured
    pub fn source_size(&self) -> Option<(u32, u32)> {
        self.source_width.zip(self.source_height)
    }
}

fn get_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    paths.push(PathBuf::from("parkwatch.toml"));
    paths.push(PathBuf::from(".parkwatch.toml"));

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("parkwatch").join("config.toml"));
        paths.push(config_dir.join("parkwatch.toml"));
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".parkwatch.toml"));
    }

    paths
}
