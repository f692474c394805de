//! Frame-scoped memoization of height queries.
//!
//! Results are keyed on a quantized x/z grid and live only until the next
//! [`HeightProvider::clear_cache`]. The frame driver clears the cache once per
//! frame before any query, so a cached sample never outlives the displaced
//! geometry it was computed against.

use glam::Vec3;
use rustc_hash::FxHashMap;

use crate::frame::{FrameId, LodFrame};
use crate::sampling::{Footprint, HeightProvider, SamplingContext, Unavailable};

/// Default size of a cache cell in world units.
pub const DEFAULT_CELL_SIZE: f32 = 0.25;

/// Wraps a [`HeightProvider`] and memoizes its answers until the next clear.
pub struct CachedHeightProvider<P> {
    inner: P,
    cell_size: f32,
    samples: FxHashMap<(i32, i32), Option<f32>>,
    frame: Option<FrameId>,
    hits: u64,
    misses: u64,
    clears: u64,
}

impl<P: HeightProvider> CachedHeightProvider<P> {
    /// Wrap `inner` with the default cell size.
    pub fn new(inner: P) -> Self {
        Self::with_cell_size(inner, DEFAULT_CELL_SIZE)
    }

    /// Wrap `inner`, quantizing query positions to `cell_size`.
    pub fn with_cell_size(inner: P, cell_size: f32) -> Self {
        Self {
            inner,
            cell_size: if cell_size > 0.0 {
                cell_size
            } else {
                DEFAULT_CELL_SIZE
            },
            samples: FxHashMap::default(),
            frame: None,
            hits: 0,
            misses: 0,
            clears: 0,
        }
    }

    /// The wrapped provider.
    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Mutable access to the wrapped provider.
    pub fn inner_mut(&mut self) -> &mut P {
        &mut self.inner
    }

    /// Number of memoized cells.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether nothing is memoized.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// `(hits, misses, clears)` since creation.
    pub fn counters(&self) -> (u64, u64, u64) {
        (self.hits, self.misses, self.clears)
    }

    fn key(&self, position: Vec3) -> (i32, i32) {
        (
            (position.x / self.cell_size).floor() as i32,
            (position.z / self.cell_size).floor() as i32,
        )
    }
}

impl<P: HeightProvider> HeightProvider for CachedHeightProvider<P> {
    fn acquire(
        &mut self,
        footprint: Footprint,
        min_footprint_radius: f32,
    ) -> Result<SamplingContext, Unavailable> {
        self.inner.acquire(footprint, min_footprint_radius)
    }

    fn query(&mut self, context: &SamplingContext, position: Vec3) -> Option<f32> {
        if let Some(frame) = self.frame
            && !context.is_valid_for(frame)
        {
            return None;
        }
        if !context.footprint().contains_point(position) {
            return None;
        }
        let key = self.key(position);
        if let Some(&cached) = self.samples.get(&key) {
            self.hits += 1;
            return cached;
        }
        self.misses += 1;
        let sample = self.inner.query(context, position);
        self.samples.insert(key, sample);
        sample
    }

    fn release(&mut self, context: SamplingContext) {
        self.inner.release(context);
    }

    fn sync_to_frame(&mut self, frame: &LodFrame) {
        self.frame = frame.frame_id;
        self.inner.sync_to_frame(frame);
    }

    fn clear_cache(&mut self) {
        tracing::trace!(cells = self.samples.len(), "clearing height query cache");
        self.samples.clear();
        self.clears += 1;
        self.inner.clear_cache();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context_pool::ContextPool;
    use crate::frame::ReferenceFrame;
    use crate::sampling::{HeightSampler, SamplingScope};
    use crate::scale::ScaleState;
    use glam::Vec2;

    /// Surface whose height is whatever `level` currently says.
    struct TideProvider {
        level: f32,
        frame: FrameId,
        pool: ContextPool,
        inner_queries: u32,
    }

    impl TideProvider {
        fn new(level: f32) -> Self {
            Self {
                level,
                frame: FrameId(0),
                pool: ContextPool::new(),
                inner_queries: 0,
            }
        }
    }

    impl HeightProvider for TideProvider {
        fn acquire(
            &mut self,
            footprint: Footprint,
            min_footprint_radius: f32,
        ) -> Result<SamplingContext, Unavailable> {
            Ok(self.pool.acquire(self.frame, footprint, min_footprint_radius, 0))
        }

        fn query(&mut self, _context: &SamplingContext, _position: Vec3) -> Option<f32> {
            self.inner_queries += 1;
            Some(self.level)
        }

        fn release(&mut self, context: SamplingContext) {
            self.pool.release(context);
        }

        fn sync_to_frame(&mut self, frame: &LodFrame) {
            if let Some(id) = frame.frame_id {
                self.frame = id;
            }
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
    fn test_repeat_queries_hit_cache() {
        let mut cached = CachedHeightProvider::new(TideProvider::new(2.0));
        cached.sync_to_frame(&lod_frame(1));
        let p = Vec3::new(1.0, 0.0, 1.0);
        assert_eq!(HeightSampler::sample(&mut cached, p, 0.0).height(), Some(2.0));
        assert_eq!(HeightSampler::sample(&mut cached, p, 0.0).height(), Some(2.0));
        assert_eq!(cached.inner().inner_queries, 1);
        assert_eq!(cached.counters(), (1, 1, 0));
    }

    #[test]
    fn test_same_frame_queries_agree_after_geometry_moves() {
        let mut cached = CachedHeightProvider::new(TideProvider::new(1.0));
        cached.clear_cache();
        cached.sync_to_frame(&lod_frame(1));
        let p = Vec3::new(3.0, 0.0, -2.0);

        let first = HeightSampler::sample(&mut cached, p, 0.0).height();
        cached.inner_mut().level = 5.0;
        let second = HeightSampler::sample(&mut cached, p, 0.0).height();
        assert_eq!(first, second);

        cached.clear_cache();
        cached.sync_to_frame(&lod_frame(2));
        let third = HeightSampler::sample(&mut cached, p, 0.0).height();
        assert_eq!(third, Some(5.0));
    }

    #[test]
    fn test_context_from_previous_frame_is_rejected() {
        let mut cached = CachedHeightProvider::new(TideProvider::new(1.0));
        cached.sync_to_frame(&lod_frame(1));
        let stale = cached
            .acquire(Footprint::around(Vec2::ZERO, 1.0), 0.0)
            .unwrap();
        assert_eq!(cached.query(&stale, Vec3::ZERO), Some(1.0));

        cached.clear_cache();
        cached.sync_to_frame(&lod_frame(2));
        assert_eq!(cached.query(&stale, Vec3::ZERO), None);
        cached.release(stale);
        assert_eq!(cached.inner().pool.outstanding(), 0);
    }

    #[test]
    fn test_clear_empties_cache() {
        let mut cached = CachedHeightProvider::with_cell_size(TideProvider::new(0.0), 1.0);
        cached.sync_to_frame(&lod_frame(1));
        {
            let mut scope =
                SamplingScope::acquire(&mut cached, Footprint::around(Vec2::ZERO, 4.0), 0.0)
                    .unwrap();
            for x in -3..=3 {
                scope.query(Vec3::new(x as f32, 0.0, 0.0));
            }
        }
        assert_eq!(cached.len(), 7);
        cached.clear_cache();
        assert!(cached.is_empty());
        assert_eq!(cached.counters().2, 1);
    }
}
