//! Viewer-relative ocean LOD: altitude-driven scale selection, reference-frame
//! re-centering, displacement aggregation, and scoped height sampling.

mod cache;
mod context_pool;
mod controller;
mod displacement;
mod error;
mod frame;
mod layer;
mod lod_transform;
mod ocean;
mod sampling;
mod scale;
mod viewer_height;


pub use cache::CachedHeightProvider;
pub use context_pool::{ContextPool, PoolStats};
pub use controller::LodScaleController;
pub use displacement::DisplacementAggregator;
pub use error::OceanError;
pub use frame::{FrameId, LodFrame, LodUniform, ReferenceFrame};
pub use layer::LodDataLayer;
pub use lod_transform::{LodRenderData, LodTransform};
pub use ocean::{Ocean, OceanBuilder};
pub use sampling::{
    Footprint, HeightProvider, HeightSampler, SampleOutcome, SamplingContext, SamplingScope,
    Unavailable,
};
pub use scale::{HEIGHT_LOD_MULTIPLIER, MAX_SCALE_HEADROOM, ScaleBounds, ScaleState, raw_level};
pub use viewer_height::ViewerHeightTracker;
