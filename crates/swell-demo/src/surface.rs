//! Analytic wave surface standing in for a simulated ocean.

use glam::Vec3;
use swell_lod::{ContextPool, Footprint, HeightProvider, LodFrame, SamplingContext, Unavailable};

/// Simulation step per frame, in seconds.
pub const FIXED_DT: f32 = 1.0 / 60.0;

/// One travelling sine wave. Each component acts as a shape contributor and
/// reports its own displacement bound.
#[derive(Clone, Copy, Debug)]
pub struct WaveComponent {
    /// Label used when the component reports as a shape contributor.
    pub name: &'static str,
    /// Vertical amplitude in meters.
    pub amplitude: f32,
    /// Cycles per meter.
    pub frequency: f32,
    /// Meters per second.
    pub speed: f32,
    /// Unit direction of travel on the x/z plane.
    pub direction: [f32; 2],
    /// Horizontal choppiness as a fraction of the amplitude.
    pub choppiness: f32,
}

impl WaveComponent {
    /// Long, slow swell.
    pub fn swell() -> Self {
        Self {
            name: "swell",
            amplitude: 1.2,
            frequency: 0.02,
            speed: 6.0,
            direction: [1.0, 0.0],
            choppiness: 0.3,
        }
    }

    /// Short wind chop running diagonally.
    pub fn chop() -> Self {
        Self {
            name: "chop",
            amplitude: 0.35,
            frequency: 0.15,
            speed: 2.0,
            direction: [std::f32::consts::FRAC_1_SQRT_2, std::f32::consts::FRAC_1_SQRT_2],
            choppiness: 0.8,
        }
    }

    /// `(horizontal, vertical)` displacement bound this component can produce.
    pub fn displacement_bounds(&self) -> (f32, f32) {
        (self.amplitude * self.choppiness, self.amplitude)
    }

    fn height(&self, position: Vec3, time: f32) -> f32 {
        let along = position.x * self.direction[0] + position.z * self.direction[1];
        let phase = (along * self.frequency + time * self.speed * self.frequency)
            * std::f32::consts::TAU;
        phase.sin() * self.amplitude
    }
}

/// Height provider summing [`WaveComponent`]s around the published rings.
///
/// Queries become available once the first frame is synced and only inside
/// the outermost ring.
pub struct WaveSurface {
    components: Vec<WaveComponent>,
    frame: Option<LodFrame>,
    time: f32,
    pool: ContextPool,
}

impl WaveSurface {
    /// Create a surface from `components`; queries stay unavailable until the
    /// first [`HeightProvider::sync_to_frame`].
    pub fn new(components: Vec<WaveComponent>) -> Self {
        Self {
            components,
            frame: None,
            time: 0.0,
            pool: ContextPool::new(),
        }
    }

    /// Water height at `position` for the current simulation time.
    fn height_at(&self, position: Vec3) -> f32 {
        let sea_level = self.frame.as_ref().map_or(0.0, |f| f.origin.sea_level);
        sea_level
            + self
                .components
                .iter()
                .map(|c| c.height(position, self.time))
                .sum::<f32>()
    }
}

impl HeightProvider for WaveSurface {
    fn acquire(
        &mut self,
        footprint: Footprint,
        min_footprint_radius: f32,
    ) -> Result<SamplingContext, Unavailable> {
        let frame = self.frame.as_ref().ok_or(Unavailable::NotReady)?;
        let frame_id = frame.frame_id.ok_or(Unavailable::NotReady)?;
        let lod = frame
            .select_lod(&footprint, min_footprint_radius)
            .ok_or(Unavailable::OutOfBounds)?;
        Ok(self
            .pool
            .acquire(frame_id, footprint, min_footprint_radius, lod))
    }

    fn query(&mut self, context: &SamplingContext, position: Vec3) -> Option<f32> {
        let frame_id = self.frame.as_ref()?.frame_id?;
        if !context.is_valid_for(frame_id) || !context.footprint().contains_point(position) {
            return None;
        }
        Some(self.height_at(position))
    }

    fn release(&mut self, context: SamplingContext) {
        self.pool.release(context);
    }

    fn sync_to_frame(&mut self, frame: &LodFrame) {
        if let Some(id) = frame.frame_id {
            self.time = id.0 as f32 * FIXED_DT;
        }
        self.frame = Some(frame.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use swell_lod::{FrameId, HeightSampler, ReferenceFrame, SampleOutcome, ScaleState};

    fn lod_frame(id: u64) -> LodFrame {
        LodFrame {
            frame_id: Some(FrameId(id)),
            origin: ReferenceFrame {
                position: Vec2::ZERO,
                sea_level: 2.0,
            },
            scale: ScaleState::at(8.0, 4),
            lod_data_resolution: 64,
            geometry_down_sample_factor: 2,
        }
    }

    #[test]
    fn test_not_ready_before_sync() {
        let mut surface = WaveSurface::new(vec![WaveComponent::swell()]);
        assert_eq!(
            HeightSampler::sample(&mut surface, Vec3::ZERO, 0.0),
            SampleOutcome::Unavailable(Unavailable::NotReady)
        );
    }

    #[test]
    fn test_heights_stay_within_reported_bounds() {
        let components = vec![WaveComponent::swell(), WaveComponent::chop()];
        let bound: f32 = components.iter().map(|c| c.displacement_bounds().1).sum();
        let mut surface = WaveSurface::new(components);
        surface.sync_to_frame(&lod_frame(37));
        for i in -10..=10 {
            let p = Vec3::new(i as f32 * 1.7, 0.0, i as f32 * -0.9);
            let h = HeightSampler::sample(&mut surface, p, 0.0).height().unwrap();
            assert!((h - 2.0).abs() <= bound + 1e-4);
        }
        assert_eq!(surface.pool.outstanding(), 0);
    }

    #[test]
    fn test_outside_outer_ring_is_out_of_bounds() {
        let mut surface = WaveSurface::new(vec![WaveComponent::chop()]);
        surface.sync_to_frame(&lod_frame(1));
        // Outer ring of scale 8 with 4 rings spans 64 units.
        assert_eq!(
            HeightSampler::sample(&mut surface, Vec3::new(100.0, 0.0, 0.0), 0.0),
            SampleOutcome::Unavailable(Unavailable::OutOfBounds)
        );
    }

    #[test]
    fn test_time_follows_frame_id() {
        let mut surface = WaveSurface::new(Vec::new());
        surface.sync_to_frame(&lod_frame(120));
        assert!((surface.time - 2.0).abs() < 1e-5);
    }
}
