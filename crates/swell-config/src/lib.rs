//! Configuration for the ocean LOD system.
//!
//! Settings persist to disk as RON files, accept CLI overrides via clap, and
//! are normalized into their valid ranges before the LOD controller sees them.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    Adjustment, CONFIG_FILE_NAME, Config, DebugConfig, MAX_LOD_COUNT, MIN_LOD_COUNT,
    MIN_SCALE_FLOOR, OceanConfig, UNBOUNDED_SCALE, ViewerConfig, is_power_of_two,
    nearest_power_of_two,
};
pub use error::ConfigError;
