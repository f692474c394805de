//! Altitude-to-scale quantization.
//!
//! Viewer altitude maps to a continuous "raw level", which is clamped to the
//! configured bounds and split into a power-of-two scale plus a fractional
//! blend weight towards the next power of two.

use swell_config::OceanConfig;

/// Raw level gained per unit of effective viewer altitude.
pub const HEIGHT_LOD_MULTIPLIER: f32 = 2.0;

/// The raw level may reach just under twice the maximum scale before it is
/// floored, so the ceiling level never flips to the next power of two.
pub const MAX_SCALE_HEADROOM: f32 = 1.99;

/// Clamp range for the raw level, derived from a normalized [`OceanConfig`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleBounds {
    /// Smallest scale. Always a positive power of two.
    pub min: f32,
    /// Largest scale, or `None` when unbounded.
    pub max: Option<f32>,
}

impl ScaleBounds {
    /// Read the bounds out of an already normalized config.
    pub fn from_config(config: &OceanConfig) -> Self {
        Self {
            min: config.min_scale,
            max: config.max_scale_bound(),
        }
    }

    /// Clamp a raw level into `[min, MAX_SCALE_HEADROOM * max]`.
    pub fn clamp_level(&self, raw_level: f32) -> f32 {
        let level = raw_level.max(self.min);
        match self.max {
            Some(max) => level.min(MAX_SCALE_HEADROOM * max),
            None => level,
        }
    }
}

/// Unclamped level for a viewer at `viewer_y`.
///
/// The zero-detail altitude is biased below sea level by a fraction of the
/// vertical displacement bound, so a viewer hovering over calm water keeps
/// its horizontal range when large waves are present elsewhere.
pub fn raw_level(
    viewer_y: f32,
    sea_level: f32,
    max_vertical_displacement: f32,
    bias_divisor: f32,
) -> f32 {
    let max_detail_height = sea_level - max_vertical_displacement / bias_divisor;
    let cam_height = ((viewer_y - sea_level).abs() - max_detail_height).max(0.0);
    cam_height * HEIGHT_LOD_MULTIPLIER
}

/// The discrete scale and inter-level blend published each frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleState {
    /// Power-of-two multiplier on the base LOD footprint.
    pub scale: f32,
    /// Fractional progress from `scale` towards `2 * scale`, in `[0, 1)`.
    pub level_alpha: f32,
    /// Number of nested LOD rings.
    pub lod_count: u32,
}

impl ScaleState {
    /// A state sitting exactly on `scale` with no blend.
    pub fn at(scale: f32, lod_count: u32) -> Self {
        Self {
            scale,
            level_alpha: 0.0,
            lod_count,
        }
    }

    /// Split a positive level into `2^floor(log2 level)` and the remainder.
    pub fn quantize(level: f32, lod_count: u32) -> Self {
        debug_assert!(level > 0.0, "level must be positive, got {level}");
        let log2_level = level.log2();
        let mut floor_level = log2_level.floor();
        let mut level_alpha = log2_level - floor_level;
        // Rounding can land exactly on 1.0 for levels a hair below a power of two.
        if level_alpha >= 1.0 {
            floor_level += 1.0;
            level_alpha = 0.0;
        }
        Self {
            scale: 2.0_f32.powi(floor_level as i32),
            level_alpha,
            lod_count,
        }
    }

    /// Full pipeline: altitude, bias, clamp, quantize.
    pub fn from_altitude(
        viewer_y: f32,
        config: &OceanConfig,
        bounds: &ScaleBounds,
        max_vertical_displacement: f32,
    ) -> Self {
        let raw = raw_level(
            viewer_y,
            config.sea_level,
            max_vertical_displacement,
            config.displacement_bias_divisor,
        );
        Self::quantize(bounds.clamp_level(raw), config.lod_count)
    }

    /// The continuous level this state was quantized from.
    pub fn reconstructed_level(&self) -> f32 {
        self.scale * self.level_alpha.exp2()
    }

    /// World-space footprint size of LOD ring `lod_index`.
    pub fn lod_scale(&self, lod_index: u32) -> f32 {
        self.scale * 2.0_f32.powi(i32::try_from(lod_index).unwrap_or(i32::MAX))
    }
}
