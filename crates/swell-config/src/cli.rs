//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Command-line arguments for the ocean demo driver.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug)]
#[command(name = "swell", about = "Viewer-relative ocean LOD driver")]
pub struct CliArgs {
    /// Smallest LOD scale (power of two).
    #[arg(long)]
    pub min_scale: Option<f32>,

    /// Largest LOD scale (power of two, or -1 for unbounded).
    #[arg(long, allow_hyphen_values = true)]
    pub max_scale: Option<f32>,

    /// Number of LOD rings.
    #[arg(long)]
    pub lod_count: Option<u32>,

    /// Re-center the LOD origin under the viewer.
    #[arg(long)]
    pub follow_viewpoint: Option<bool>,

    /// Cache height queries within a frame.
    #[arg(long)]
    pub cached_height_queries: Option<bool>,

    /// Number of frames to simulate.
    #[arg(long, default_value_t = 600)]
    pub frames: u64,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(min) = args.min_scale {
            self.ocean.min_scale = min;
        }
        if let Some(max) = args.max_scale {
            self.ocean.max_scale = max;
        }
        if let Some(count) = args.lod_count {
            self.ocean.lod_count = count;
        }
        if let Some(follow) = args.follow_viewpoint {
            self.ocean.follow_viewpoint = follow;
        }
        if let Some(cached) = args.cached_height_queries {
            self.ocean.cached_height_queries = cached;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
