//! The LOD scale controller.
//!
//! Once per frame the controller moves the ring origin under the viewpoint,
//! turns viewer altitude into a power-of-two scale and blend weight, publishes
//! the resulting [`LodFrame`], and notifies every registered
//! [`LodDataLayer`]. It has no sub-states: every frame is a full recompute.

use glam::{Vec2, Vec3};
use swell_config::OceanConfig;
use tracing::{debug, trace, warn};

use crate::displacement::DisplacementAggregator;
use crate::frame::{FrameId, LodFrame, ReferenceFrame};
use crate::layer::LodDataLayer;
use crate::scale::{ScaleBounds, ScaleState};

/// Owns the reference frame and scale state; everything else reads them
/// through [`frame`](Self::frame).
pub struct LodScaleController {
    config: OceanConfig,
    bounds: ScaleBounds,
    frame: LodFrame,
    layers: Vec<Box<dyn LodDataLayer>>,
    warned_missing_viewpoint: bool,
}

impl LodScaleController {
    /// Create a controller from `config`, normalizing it first.
    ///
    /// The rings start at the origin with the minimum scale until the first
    /// [`update`](Self::update).
    pub fn new(config: &OceanConfig) -> Self {
        let mut config = config.clone();
        config.normalize();
        let bounds = ScaleBounds::from_config(&config);
        let frame = LodFrame {
            frame_id: None,
            origin: ReferenceFrame {
                position: Vec2::ZERO,
                sea_level: config.sea_level,
            },
            scale: ScaleState::at(bounds.min, config.lod_count),
            lod_data_resolution: config.lod_data_resolution,
            geometry_down_sample_factor: config.geometry_down_sample_factor,
        };
        Self {
            config,
            bounds,
            frame,
            layers: Vec::new(),
            warned_missing_viewpoint: false,
        }
    }

    /// Register a layer to be notified after each update.
    pub fn add_layer(&mut self, layer: Box<dyn LodDataLayer>) {
        debug!(layer = layer.name(), "registered lod data layer");
        self.layers.push(layer);
    }

    /// Number of registered layers.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Apply an edited configuration.
    ///
    /// The edit is normalized like the initial config. Ring count, sea level,
    /// data resolution and query caching are fixed at initialization; edits to
    /// them are ignored with a warning.
    pub fn set_config(&mut self, config: &OceanConfig) {
        let mut config = config.clone();
        config.normalize();

        if config.lod_count != self.config.lod_count {
            warn!(
                requested = config.lod_count,
                kept = self.config.lod_count,
                "lod_count cannot change after initialization"
            );
            config.lod_count = self.config.lod_count;
        }
        if config.sea_level != self.config.sea_level {
            warn!(
                requested = config.sea_level,
                kept = self.config.sea_level,
                "sea_level cannot change after initialization"
            );
            config.sea_level = self.config.sea_level;
        }
        if config.lod_data_resolution != self.config.lod_data_resolution
            || config.geometry_down_sample_factor != self.config.geometry_down_sample_factor
        {
            warn!("lod data resolution cannot change after initialization");
            config.lod_data_resolution = self.config.lod_data_resolution;
            config.geometry_down_sample_factor = self.config.geometry_down_sample_factor;
        }

        if config.cached_height_queries != self.config.cached_height_queries {
            warn!(
                requested = config.cached_height_queries,
                kept = self.config.cached_height_queries,
                "cached_height_queries cannot change after initialization"
            );
            config.cached_height_queries = self.config.cached_height_queries;
        }

        self.bounds = ScaleBounds::from_config(&config);
        self.config = config;
    }

    /// Recompute the frame for `frame_id` and notify layers.
    ///
    /// `displacement` is read as-is; shape contributors of the current frame
    /// usually report after this call, so the bound used lags by one frame.
    /// Without a viewpoint the previous origin and scale are kept.
    pub fn update(
        &mut self,
        frame_id: FrameId,
        viewpoint: Option<Vec3>,
        displacement: &DisplacementAggregator,
    ) {
        match viewpoint {
            Some(viewpoint) => {
                self.warned_missing_viewpoint = false;
                self.recompute(viewpoint, displacement.current_vertical());
            }
            None => {
                if !self.warned_missing_viewpoint {
                    warn!(
                        frame = frame_id.0,
                        "no viewpoint available, holding previous lod transform"
                    );
                    self.warned_missing_viewpoint = true;
                }
            }
        }
        self.frame.frame_id = Some(frame_id);

        for layer in &mut self.layers {
            trace!(layer = layer.name(), frame = frame_id.0, "updating lod data layer");
            layer.update_for_frame(&self.frame);
        }
    }

    fn recompute(&mut self, viewpoint: Vec3, max_vertical_displacement: f32) {
        if self.config.follow_viewpoint {
            self.frame.origin.position = Vec2::new(viewpoint.x, viewpoint.z);
        }

        let state = ScaleState::from_altitude(
            viewpoint.y,
            &self.config,
            &self.bounds,
            max_vertical_displacement,
        );
        if state.scale != self.frame.scale.scale {
            debug!(
                from = self.frame.scale.scale,
                to = state.scale,
                viewer_y = viewpoint.y,
                "lod scale changed"
            );
        }
        self.frame.scale = state;
    }

    /// The snapshot published by the last update.
    pub fn frame(&self) -> &LodFrame {
        &self.frame
    }

    /// The normalized configuration in effect.
    pub fn config(&self) -> &OceanConfig {
        &self.config
    }

    /// Current clamp range.
    pub fn bounds(&self) -> &ScaleBounds {
        &self.bounds
    }

    /// Whether the viewer could still climb into a coarser scale.
    pub fn scale_could_increase(&self) -> bool {
        match self.bounds.max {
            Some(max) => self.frame.scale.scale < 0.99 * max,
            None => true,
        }
    }

    /// Whether the viewer could still descend into a finer scale.
    pub fn scale_could_decrease(&self) -> bool {
        self.frame.scale.scale > 1.01 * self.bounds.min
    }
}
