//! Explicit owner of the per-frame ocean LOD pipeline.
//!
//! [`Ocean`] replaces any ambient "current instance": the frame driver owns
//! it and hands out references. Each [`Ocean::update`] runs, in order:
//!
//! 1. the scale controller (re-center, rescale, notify layers),
//! 2. the height-query cache clear (a no-op for uncached providers),
//! 3. the height provider's sync to the new transform,
//! 4. the viewer height query.

use glam::Vec3;
use swell_config::Config;
use tracing::{error, info, trace_span};

use crate::cache::CachedHeightProvider;
use crate::controller::LodScaleController;
use crate::displacement::DisplacementAggregator;
use crate::error::OceanError;
use crate::frame::{FrameId, LodFrame};
use crate::layer::LodDataLayer;
use crate::sampling::{HeightProvider, HeightSampler, SampleOutcome};
use crate::viewer_height::ViewerHeightTracker;

/// Collects collaborators and validates them before the loop starts.
pub struct OceanBuilder {
    config: Config,
    heights: Option<Box<dyn HeightProvider>>,
    layers: Vec<Box<dyn LodDataLayer>>,
}

impl OceanBuilder {
    /// Start a builder from the loaded configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            heights: None,
            layers: Vec::new(),
        }
    }

    /// Supply the height provider. Required.
    pub fn height_provider(mut self, provider: impl HeightProvider + 'static) -> Self {
        self.heights = Some(Box::new(provider));
        self
    }

    /// Register a dependent LOD data layer.
    pub fn layer(mut self, layer: impl LodDataLayer + 'static) -> Self {
        self.layers.push(Box::new(layer));
        self
    }

    /// Validate and assemble the ocean.
    ///
    /// Fails when the height provider is missing or the data resolution is
    /// unusable. Either failure is logged once at error level.
    pub fn build(self) -> Result<Ocean, OceanError> {
        let ocean = &self.config.ocean;
        let resolution = ocean.lod_data_resolution;
        let factor = ocean.geometry_down_sample_factor;
        if resolution == 0 || factor == 0 || resolution % factor != 0 {
            let err = OceanError::UnsupportedResolution { resolution, factor };
            error!("{err}");
            return Err(err);
        }

        let Some(heights) = self.heights else {
            let err = OceanError::MissingCollaborator("height provider");
            error!("{err}");
            return Err(err);
        };
        let heights: Box<dyn HeightProvider> = if ocean.cached_height_queries {
            Box::new(CachedHeightProvider::new(heights))
        } else {
            heights
        };

        let mut controller = LodScaleController::new(ocean);
        for layer in self.layers {
            controller.add_layer(layer);
        }

        info!(
            min_scale = controller.config().min_scale,
            max_scale = controller.config().max_scale,
            lod_count = controller.config().lod_count,
            cached_height_queries = controller.config().cached_height_queries,
            "ocean lod system ready"
        );

        Ok(Ocean {
            controller,
            displacement: DisplacementAggregator::new(),
            heights,
            viewer: ViewerHeightTracker::new(self.config.viewer.min_sample_radius),
        })
    }
}

/// The controller together with its aggregator, height provider and tracker.
pub struct Ocean {
    controller: LodScaleController,
    displacement: DisplacementAggregator,
    heights: Box<dyn HeightProvider>,
    viewer: ViewerHeightTracker,
}

impl Ocean {
    /// Start building an ocean from `config`.
    pub fn builder(config: &Config) -> OceanBuilder {
        OceanBuilder::new(config)
    }

    /// Run one frame of the pipeline.
    pub fn update(&mut self, frame_id: FrameId, viewpoint: Option<Vec3>) {
        let _span = trace_span!("ocean_update", frame = frame_id.0).entered();

        self.controller
            .update(frame_id, viewpoint, &self.displacement);

        self.heights.clear_cache();
        self.heights.sync_to_frame(self.controller.frame());

        if let Some(viewpoint) = viewpoint {
            self.viewer
                .update(self.heights.as_mut(), self.controller.frame(), viewpoint);
        }
    }

    /// Record a shape contributor's displacement bound for `frame_id`.
    pub fn report_displacement(&mut self, horizontal: f32, vertical: f32, frame_id: FrameId) {
        self.displacement.report(horizontal, vertical, frame_id);
    }

    /// One-shot height lookup against the current surface.
    pub fn sample_height(&mut self, position: Vec3, min_footprint_radius: f32) -> SampleOutcome {
        HeightSampler::sample(self.heights.as_mut(), position, min_footprint_radius)
    }

    /// The published transform.
    pub fn frame(&self) -> &LodFrame {
        self.controller.frame()
    }

    /// The scale controller.
    pub fn controller(&self) -> &LodScaleController {
        &self.controller
    }

    /// Mutable controller access for explicit configuration edits.
    pub fn controller_mut(&mut self) -> &mut LodScaleController {
        &mut self.controller
    }

    /// The displacement totals.
    pub fn displacement(&self) -> &DisplacementAggregator {
        &self.displacement
    }

    /// Mutable access for contributors that report directly.
    pub fn displacement_mut(&mut self) -> &mut DisplacementAggregator {
        &mut self.displacement
    }

    /// The height provider, for systems issuing their own scoped queries.
    pub fn heights_mut(&mut self) -> &mut dyn HeightProvider {
        self.heights.as_mut()
    }

    /// The viewer height tracker.
    pub fn viewer(&self) -> &ViewerHeightTracker {
        &self.viewer
    }
}
