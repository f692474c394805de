//! Scoped height queries against the simulated surface.
//!
//! A query is an acquire / query / release triple. [`SamplingScope`] ties the
//! release to scope exit so a failed query can never leak a context, and
//! [`HeightSampler`] wraps the whole triple for one-shot lookups.

use glam::{Vec2, Vec3};

use crate::frame::{FrameId, LodFrame};

/// Axis-aligned x/z rectangle that a sampling context must cover.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Footprint {
    /// Minimum corner (x, z).
    pub min: Vec2,
    /// Maximum corner (x, z).
    pub max: Vec2,
}

impl Footprint {
    /// Square of half-width `radius` centered on `center`.
    pub fn around(center: Vec2, radius: f32) -> Self {
        let r = Vec2::splat(radius.max(0.0));
        Self {
            min: center - r,
            max: center + r,
        }
    }

    /// Smallest footprint containing every position's x/z.
    pub fn enclosing(positions: &[Vec3]) -> Option<Self> {
        let (first, rest) = positions.split_first()?;
        let start = Vec2::new(first.x, first.z);
        let (min, max) = rest.iter().fold((start, start), |(min, max), p| {
            let xz = Vec2::new(p.x, p.z);
            (min.min(xz), max.max(xz))
        });
        Some(Self { min, max })
    }

    /// Whether the x/z projection of `position` lies inside (edges included).
    pub fn contains_point(&self, position: Vec3) -> bool {
        let xz = Vec2::new(position.x, position.z);
        xz.cmpge(self.min).all() && xz.cmple(self.max).all()
    }

    /// Whether `other` lies entirely inside this footprint.
    pub fn contains(&self, other: &Footprint) -> bool {
        other.min.cmpge(self.min).all() && other.max.cmple(self.max).all()
    }

    /// Half of the larger side length.
    pub fn radius(&self) -> f32 {
        0.5 * (self.max - self.min).max_element()
    }
}

/// Why a sampling context could not be handed out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Unavailable {
    /// No frame has been published to the provider yet.
    #[error("no surface state published yet")]
    NotReady,
    /// The footprint lies outside every simulated LOD ring.
    #[error("footprint lies outside the simulated area")]
    OutOfBounds,
    /// The provider's backing data was invalidated and is being rebuilt.
    #[error("surface data invalidated")]
    Invalidated,
}

/// Opaque handle for one scoped height query.
///
/// Bound to the frame, footprint and query radius it was acquired with. It is
/// neither `Clone` nor `Copy`: a context belongs to exactly one caller and is
/// consumed by [`HeightProvider::release`]. Covering a different footprint
/// requires releasing this context and acquiring a new one.
#[derive(Debug, PartialEq)]
pub struct SamplingContext {
    pool: u32,
    id: u32,
    frame_id: FrameId,
    footprint: Footprint,
    min_footprint_radius: f32,
    lod: u32,
}

impl SamplingContext {
    pub(crate) fn new(
        pool: u32,
        id: u32,
        frame_id: FrameId,
        footprint: Footprint,
        min_footprint_radius: f32,
        lod: u32,
    ) -> Self {
        Self {
            pool,
            id,
            frame_id,
            footprint,
            min_footprint_radius,
            lod,
        }
    }

    /// Identity of the [`ContextPool`](crate::ContextPool) that issued this
    /// context, or 0 for contexts minted outside a pool.
    pub fn pool(&self) -> u32 {
        self.pool
    }

    /// Pool slot of this context.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Frame this context was acquired in.
    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    /// Area this context may be queried over.
    pub fn footprint(&self) -> &Footprint {
        &self.footprint
    }

    /// Smallest feature size the query was asked to resolve.
    pub fn min_footprint_radius(&self) -> f32 {
        self.min_footprint_radius
    }

    /// LOD ring the provider chose for this context.
    pub fn lod(&self) -> u32 {
        self.lod
    }

    /// Whether the context may still be used during `frame`.
    pub fn is_valid_for(&self, frame: FrameId) -> bool {
        self.frame_id == frame
    }
}

/// Source of surface heights for the current frame.
pub trait HeightProvider {
    /// Reserve a context covering `footprint` at the detail implied by
    /// `min_footprint_radius`.
    fn acquire(
        &mut self,
        footprint: Footprint,
        min_footprint_radius: f32,
    ) -> Result<SamplingContext, Unavailable>;

    /// Height of the displaced surface above `position`, or `None` when the
    /// position is not covered by the context or the current simulation.
    fn query(&mut self, context: &SamplingContext, position: Vec3) -> Option<f32>;

    /// Return a context. Called exactly once per successful [`acquire`](Self::acquire).
    fn release(&mut self, context: SamplingContext);

    /// Observe the transform published for the new frame.
    fn sync_to_frame(&mut self, _frame: &LodFrame) {}

    /// Drop any memoized samples.
    fn clear_cache(&mut self) {}
}

impl<P: HeightProvider + ?Sized> HeightProvider for Box<P> {
    fn acquire(
        &mut self,
        footprint: Footprint,
        min_footprint_radius: f32,
    ) -> Result<SamplingContext, Unavailable> {
        (**self).acquire(footprint, min_footprint_radius)
    }

    fn query(&mut self, context: &SamplingContext, position: Vec3) -> Option<f32> {
        (**self).query(context, position)
    }

    fn release(&mut self, context: SamplingContext) {
        (**self).release(context)
    }

    fn sync_to_frame(&mut self, frame: &LodFrame) {
        (**self).sync_to_frame(frame)
    }

    fn clear_cache(&mut self) {
        (**self).clear_cache()
    }
}

/// An acquired context that is released when the scope ends, including on
/// early return and unwinding.
pub struct SamplingScope<'a, P: HeightProvider + ?Sized> {
    provider: &'a mut P,
    context: Option<SamplingContext>,
}

impl<'a, P: HeightProvider + ?Sized> SamplingScope<'a, P> {
    /// Acquire a context from `provider` for the lifetime of the scope.
    pub fn acquire(
        provider: &'a mut P,
        footprint: Footprint,
        min_footprint_radius: f32,
    ) -> Result<Self, Unavailable> {
        let context = provider.acquire(footprint, min_footprint_radius)?;
        Ok(Self {
            provider,
            context: Some(context),
        })
    }

    /// Query the surface height above `position`.
    pub fn query(&mut self, position: Vec3) -> Option<f32> {
        match &self.context {
            Some(context) => self.provider.query(context, position),
            None => None,
        }
    }

    /// The context held by this scope.
    pub fn context(&self) -> Option<&SamplingContext> {
        self.context.as_ref()
    }
}

impl<P: HeightProvider + ?Sized> Drop for SamplingScope<'_, P> {
    fn drop(&mut self) {
        if let Some(context) = self.context.take() {
            self.provider.release(context);
        }
    }
}

/// Result of a one-shot height lookup.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SampleOutcome {
    /// Surface height at the queried position.
    Found(f32),
    /// A context was acquired but the position had no data.
    NotFound,
    /// No context could be acquired this frame.
    Unavailable(Unavailable),
}

impl SampleOutcome {
    /// The height if one was found.
    pub fn height(self) -> Option<f32> {
        match self {
            SampleOutcome::Found(h) => Some(h),
            _ => None,
        }
    }
}

/// Stateless acquire / query / release sequencing over a [`HeightProvider`].
pub struct HeightSampler;

impl HeightSampler {
    /// Sample the surface height directly above `position`.
    pub fn sample<P: HeightProvider + ?Sized>(
        provider: &mut P,
        position: Vec3,
        min_footprint_radius: f32,
    ) -> SampleOutcome {
        let footprint = Footprint::around(Vec2::new(position.x, position.z), 0.0);
        let mut scope = match SamplingScope::acquire(provider, footprint, min_footprint_radius) {
            Ok(scope) => scope,
            Err(reason) => return SampleOutcome::Unavailable(reason),
        };
        match scope.query(position) {
            Some(height) => SampleOutcome::Found(height),
            None => SampleOutcome::NotFound,
        }
    }

    /// Sample several positions through a single context covering all of them.
    ///
    /// Writes one entry per position into `heights` and returns how many were
    /// found. An empty `positions` slice succeeds trivially.
    pub fn sample_many<P: HeightProvider + ?Sized>(
        provider: &mut P,
        positions: &[Vec3],
        min_footprint_radius: f32,
        heights: &mut Vec<Option<f32>>,
    ) -> Result<usize, Unavailable> {
        heights.clear();
        let Some(footprint) = Footprint::enclosing(positions) else {
            return Ok(0);
        };
        let mut scope = SamplingScope::acquire(provider, footprint, min_footprint_radius)?;
        heights.extend(positions.iter().map(|&p| scope.query(p)));
        Ok(heights.iter().filter(|h| h.is_some()).count())
    }
}
