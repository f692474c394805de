//! Configuration structs with sensible defaults and RON persistence.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Sentinel for [`OceanConfig::max_scale`] meaning "no upper bound".
pub const UNBOUNDED_SCALE: f32 = -1.0;

/// Smallest allowed [`OceanConfig::min_scale`].
pub const MIN_SCALE_FLOOR: f32 = 0.25;

/// Smallest allowed [`OceanConfig::lod_count`].
pub const MIN_LOD_COUNT: u32 = 2;

/// Largest allowed [`OceanConfig::lod_count`].
pub const MAX_LOD_COUNT: u32 = 15;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// LOD scale controller settings.
    pub ocean: OceanConfig,
    /// Viewer height tracking settings.
    pub viewer: ViewerConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Settings for the viewer-relative LOD system.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OceanConfig {
    /// Height of the undisplaced water plane. Fixed after initialization.
    pub sea_level: f32,
    /// Smallest scale the LOD rings may shrink to. Power of two, at least 0.25.
    pub min_scale: f32,
    /// Largest scale the LOD rings may grow to. Power of two, or -1 for unbounded.
    pub max_scale: f32,
    /// Number of nested LOD rings. At least 2.
    pub lod_count: u32,
    /// Side length, in texels, of each LOD data texture.
    pub lod_data_resolution: u32,
    /// Geometry resolution divisor relative to `lod_data_resolution`.
    pub geometry_down_sample_factor: u32,
    /// Re-center the LOD origin under the viewpoint every frame.
    pub follow_viewpoint: bool,
    /// Memoize height queries within a frame; the cache is cleared each frame.
    pub cached_height_queries: bool,
    /// Divisor applied to the vertical displacement bound when biasing the
    /// zero-detail altitude below sea level.
    pub displacement_bias_divisor: f32,
}

/// Viewer height tracking configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewerConfig {
    /// Minimum radius of the footprint requested for the per-frame height query.
    pub min_sample_radius: f32,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for OceanConfig {
    fn default() -> Self {
        Self {
            sea_level: 0.0,
            min_scale: 8.0,
            max_scale: 256.0,
            lod_count: 7,
            lod_data_resolution: 256,
            geometry_down_sample_factor: 2,
            follow_viewpoint: true,
            cached_height_queries: false,
            displacement_bias_divisor: 5.0,
        }
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            min_sample_radius: 0.0,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

// --- Normalization ---

/// A correction applied to an out-of-range setting during normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct Adjustment {
    /// Name of the corrected field.
    pub field: &'static str,
    /// Value as it was configured.
    pub from: f32,
    /// Value after correction.
    pub to: f32,
}

/// Round a positive value to the nearest power of two in log space.
pub fn nearest_power_of_two(value: f32) -> f32 {
    value.log2().round().exp2()
}

/// Returns `true` if `value` is exactly `2^k` for some integer `k`.
pub fn is_power_of_two(value: f32) -> bool {
    value > 0.0 && value.is_finite() && value.log2().fract() == 0.0
}

impl OceanConfig {
    /// Returns `true` when the maximum scale is the unbounded sentinel.
    pub fn is_unbounded(&self) -> bool {
        self.max_scale == UNBOUNDED_SCALE
    }

    /// The maximum scale, or `None` when unbounded.
    pub fn max_scale_bound(&self) -> Option<f32> {
        (!self.is_unbounded()).then_some(self.max_scale)
    }

    /// Return a copy with every scale-related setting forced into its valid
    /// range, along with the list of corrections that were made.
    ///
    /// Scale bounds are snapped to the nearest power of two, `min_scale` is
    /// raised to at least [`MIN_SCALE_FLOOR`], `max_scale` is raised to at
    /// least `min_scale` (any non-positive value other than the exact sentinel
    /// becomes unbounded), and `lod_count` is clamped to
    /// [`MIN_LOD_COUNT`]..=[`MAX_LOD_COUNT`].
    pub fn normalized(&self) -> (Self, Vec<Adjustment>) {
        let mut out = self.clone();
        let mut adjustments = Vec::new();
        let mut record = |field, from: f32, to: f32| {
            if from != to && !(from.is_nan() && to.is_nan()) {
                adjustments.push(Adjustment { field, from, to });
            }
        };

        let min_scale = if self.min_scale.is_finite() && self.min_scale > 0.0 {
            nearest_power_of_two(self.min_scale).max(MIN_SCALE_FLOOR)
        } else {
            MIN_SCALE_FLOOR
        };
        record("min_scale", self.min_scale, min_scale);
        out.min_scale = min_scale;

        if !self.is_unbounded() {
            let max_scale = if self.max_scale.is_finite() && self.max_scale > 0.0 {
                nearest_power_of_two(self.max_scale).max(min_scale)
            } else {
                UNBOUNDED_SCALE
            };
            record("max_scale", self.max_scale, max_scale);
            out.max_scale = max_scale;
        }

        let lod_count = self.lod_count.clamp(MIN_LOD_COUNT, MAX_LOD_COUNT);
        record("lod_count", self.lod_count as f32, lod_count as f32);
        out.lod_count = lod_count;

        if !(self.displacement_bias_divisor.is_finite() && self.displacement_bias_divisor > 0.0) {
            let fallback = OceanConfig::default().displacement_bias_divisor;
            record(
                "displacement_bias_divisor",
                self.displacement_bias_divisor,
                fallback,
            );
            out.displacement_bias_divisor = fallback;
        }

        (out, adjustments)
    }

    /// Normalize in place, logging a warning for every correction.
    pub fn normalize(&mut self) {
        let (normalized, adjustments) = self.normalized();
        for adj in &adjustments {
            log::warn!(
                "ocean.{} = {} is invalid, using {}",
                adj.field,
                adj.from,
                adj.to
            );
        }
        *self = normalized;
    }
}

// --- Load / Save / Reload ---

/// File name of the persisted configuration inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.ron";

fn read_config_file(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    ron::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            let config = read_config_file(&config_path)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as [`CONFIG_FILE_NAME`].
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);
        std::fs::create_dir_all(config_dir).map_err(|source| ConfigError::Write {
            path: config_dir.to_path_buf(),
            source,
        })?;

        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized = ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::Encode)?;

        std::fs::write(&config_path, serialized).map_err(|source| ConfigError::Write {
            path: config_path.clone(),
            source,
        })?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let new_config = read_config_file(&config_dir.join(CONFIG_FILE_NAME))?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}
