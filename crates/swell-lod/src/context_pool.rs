//! Pool of reusable sampling-context slots.
//!
//! Height providers hand out contexts from a [`ContextPool`] instead of
//! minting fresh state per query. Released slots are recycled, and the
//! acquire/release counters make leaks visible.

use std::sync::atomic::{AtomicU32, Ordering};

use rustc_hash::FxHashSet;

use crate::frame::FrameId;
use crate::sampling::{Footprint, SamplingContext};

/// Snapshot of pool counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Contexts handed out since creation.
    pub acquired: u64,
    /// Contexts returned since creation.
    pub released: u64,
    /// Contexts currently held by callers.
    pub outstanding: usize,
    /// Slots ever created (in use + free).
    pub capacity: usize,
}

/// Pool identities start at 1; 0 marks contexts minted outside any pool.
static NEXT_POOL_ID: AtomicU32 = AtomicU32::new(1);

/// Slot allocator for [`SamplingContext`]s.
///
/// Every pool carries a process-unique identity that is stamped into the
/// contexts it issues, so a context from another pool is never mistaken for
/// one of ours even when the slot ids coincide.
#[derive(Debug)]
pub struct ContextPool {
    pool_id: u32,
    free: Vec<u32>,
    live: FxHashSet<u32>,
    next_id: u32,
    acquired: u64,
    released: u64,
}

impl Default for ContextPool {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self {
            pool_id: NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed),
            free: Vec::new(),
            live: FxHashSet::default(),
            next_id: 0,
            acquired: 0,
            released: 0,
        }
    }

    /// This pool's identity, as stamped into its contexts.
    pub fn pool_id(&self) -> u32 {
        self.pool_id
    }

    /// Hand out a context, reusing a free slot when one exists.
    pub fn acquire(
        &mut self,
        frame_id: FrameId,
        footprint: Footprint,
        min_footprint_radius: f32,
        lod: u32,
    ) -> SamplingContext {
        let id = self.free.pop().unwrap_or_else(|| {
            let id = self.next_id;
            self.next_id += 1;
            id
        });
        self.live.insert(id);
        self.acquired += 1;
        SamplingContext::new(
            self.pool_id,
            id,
            frame_id,
            footprint,
            min_footprint_radius,
            lod,
        )
    }

    /// Take a context back. Returns `false` if it did not come from this pool.
    pub fn release(&mut self, context: SamplingContext) -> bool {
        let id = context.id();
        if !self.owns(&context) {
            tracing::warn!(
                id,
                pool = context.pool(),
                "released a sampling context this pool does not own"
            );
            return false;
        }
        self.live.remove(&id);
        self.free.push(id);
        self.released += 1;
        true
    }

    /// Whether `context` is currently checked out from this pool.
    pub fn owns(&self, context: &SamplingContext) -> bool {
        context.pool() == self.pool_id && self.live.contains(&context.id())
    }

    /// Contexts currently held by callers.
    pub fn outstanding(&self) -> usize {
        self.live.len()
    }

    /// Current counters.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            acquired: self.acquired,
            released: self.released,
            outstanding: self.live.len(),
            capacity: self.next_id as usize,
        }
    }
}
