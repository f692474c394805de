//! Viewer height above the displaced water surface.

use glam::Vec3;

use crate::frame::{FrameId, LodFrame};
use crate::sampling::{HeightProvider, HeightSampler, SampleOutcome};

/// Tracks how far the viewer is above (positive) or below (negative) the
/// water, one scoped query per frame.
///
/// A failed or unavailable query keeps the previous value; until the first
/// successful query the height reads as `f32::MAX`.
#[derive(Clone, Debug)]
pub struct ViewerHeightTracker {
    min_sample_radius: f32,
    height_above_water: f32,
    last_sampled: Option<FrameId>,
    consecutive_misses: u32,
}

impl ViewerHeightTracker {
    /// Create a tracker requesting footprints of at least `min_sample_radius`.
    pub fn new(min_sample_radius: f32) -> Self {
        Self {
            min_sample_radius: min_sample_radius.max(0.0),
            height_above_water: f32::MAX,
            last_sampled: None,
            consecutive_misses: 0,
        }
    }

    /// Query the surface under `viewpoint` for the frame just published.
    pub fn update<P: HeightProvider + ?Sized>(
        &mut self,
        provider: &mut P,
        frame: &LodFrame,
        viewpoint: Vec3,
    ) -> SampleOutcome {
        let outcome = HeightSampler::sample(provider, viewpoint, self.min_sample_radius);
        match outcome {
            SampleOutcome::Found(water_height) => {
                self.height_above_water = viewpoint.y - water_height;
                self.last_sampled = frame.frame_id;
                self.consecutive_misses = 0;
            }
            SampleOutcome::NotFound | SampleOutcome::Unavailable(_) => {
                self.consecutive_misses += 1;
                if self.consecutive_misses == 1 {
                    tracing::debug!(?outcome, "viewer height unknown, keeping last value");
                }
            }
        }
        outcome
    }

    /// Signed distance from the water surface to the viewer.
    pub fn height_above_water(&self) -> f32 {
        self.height_above_water
    }

    /// Whether the viewer is below the water surface.
    pub fn is_underwater(&self) -> bool {
        self.height_above_water < 0.0
    }

    /// Frame of the last successful query.
    pub fn last_sampled(&self) -> Option<FrameId> {
        self.last_sampled
    }

    /// Frames in a row without a successful query.
    pub fn consecutive_misses(&self) -> u32 {
        self.consecutive_misses
    }
}

impl Default for ViewerHeightTracker {
    fn default() -> Self {
        Self::new(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context_pool::ContextPool;
    use crate::frame::ReferenceFrame;
    use crate::sampling::{Footprint, SamplingContext, Unavailable};
    use crate::scale::ScaleState;
    use glam::Vec2;

    struct ScriptedProvider {
        pool: ContextPool,
        answers: Vec<Result<Option<f32>, Unavailable>>,
        step: usize,
    }

    impl HeightProvider for ScriptedProvider {
        fn acquire(
            &mut self,
            footprint: Footprint,
            min_footprint_radius: f32,
        ) -> Result<SamplingContext, Unavailable> {
            self.answers[self.step]?;
            Ok(self.pool.acquire(FrameId(0), footprint, min_footprint_radius, 0))
        }

        fn query(&mut self, _context: &SamplingContext, _position: Vec3) -> Option<f32> {
            self.answers[self.step].ok().flatten()
        }

        fn release(&mut self, context: SamplingContext) {
            self.pool.release(context);
        }
    }

    fn lod_frame(id: u64) -> LodFrame {
        LodFrame {
            frame_id: Some(FrameId(id)),
            origin: ReferenceFrame {
                position: Vec2::ZERO,
                sea_level: 0.0,
            },
            scale: ScaleState::at(8.0, 4),
            lod_data_resolution: 64,
            geometry_down_sample_factor: 2,
        }
    }

    #[test]
    fn test_unknown_until_first_sample() {
        let tracker = ViewerHeightTracker::default();
        assert_eq!(tracker.height_above_water(), f32::MAX);
        assert!(!tracker.is_underwater());
        assert_eq!(tracker.last_sampled(), None);
    }

    #[test]
    fn test_failures_keep_last_value() {
        let mut provider = ScriptedProvider {
            pool: ContextPool::new(),
            answers: vec![
                Ok(Some(1.0)),
                Err(Unavailable::Invalidated),
                Ok(None),
                Ok(Some(-2.0)),
            ],
            step: 0,
        };
        let mut tracker = ViewerHeightTracker::new(0.5);
        let viewpoint = Vec3::new(0.0, 10.0, 0.0);

        tracker.update(&mut provider, &lod_frame(1), viewpoint);
        assert_eq!(tracker.height_above_water(), 9.0);

        provider.step = 1;
        let outcome = tracker.update(&mut provider, &lod_frame(2), viewpoint);
        assert_eq!(outcome, SampleOutcome::Unavailable(Unavailable::Invalidated));
        assert_eq!(tracker.height_above_water(), 9.0);

        provider.step = 2;
        assert_eq!(
            tracker.update(&mut provider, &lod_frame(3), viewpoint),
            SampleOutcome::NotFound
        );
        assert_eq!(tracker.height_above_water(), 9.0);
        assert_eq!(tracker.consecutive_misses(), 2);
        assert_eq!(tracker.last_sampled(), Some(FrameId(1)));

        provider.step = 3;
        tracker.update(&mut provider, &lod_frame(4), viewpoint);
        assert_eq!(tracker.height_above_water(), 12.0);
        assert_eq!(tracker.consecutive_misses(), 0);

        let stats = provider.pool.stats();
        assert_eq!(stats.acquired, 3);
        assert_eq!(stats.released, 3);
    }

    #[test]
    fn test_below_surface_is_underwater() {
        let mut provider = ScriptedProvider {
            pool: ContextPool::new(),
            answers: vec![Ok(Some(0.5))],
            step: 0,
        };
        let mut tracker = ViewerHeightTracker::default();
        tracker.update(&mut provider, &lod_frame(1), Vec3::new(3.0, -1.5, 2.0));
        assert_eq!(tracker.height_above_water(), -2.0);
        assert!(tracker.is_underwater());
    }
}
