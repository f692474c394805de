//! Per-ring render data derived from the published LOD frame.
//!
//! Each ring's center is snapped to that ring's texel grid so simulation data
//! does not swim as the viewer moves. The previous frame's data is retained
//! for reprojection by layers that need it.

use glam::Vec2;

use crate::frame::{FrameId, LodFrame};
use crate::layer::LodDataLayer;

/// Placement of one LOD ring's data texture.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LodRenderData {
    /// World-space size of one texel.
    pub texel_width: f32,
    /// Texels per side.
    pub texture_resolution: u32,
    /// Ring center snapped down to the texel grid (x, z).
    pub pos_snapped: Vec2,
}

impl LodRenderData {
    /// Ring-local texture coordinates of a world x/z position.
    pub fn world_to_uv(&self, world_xz: Vec2) -> Vec2 {
        let extent = self.texel_width * self.texture_resolution as f32;
        (world_xz - self.pos_snapped) / extent + Vec2::splat(0.5)
    }
}

/// Built-in layer computing [`LodRenderData`] for every ring.
#[derive(Debug, Default)]
pub struct LodTransform {
    current: Vec<LodRenderData>,
    previous: Vec<LodRenderData>,
    frame_id: Option<FrameId>,
}

impl LodTransform {
    /// Create a transform layer with no data yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Render data for ring `lod_index` in the latest frame.
    pub fn render_data(&self, lod_index: u32) -> Option<&LodRenderData> {
        self.current.get(lod_index as usize)
    }

    /// Render data for ring `lod_index` in the frame before.
    pub fn previous_render_data(&self, lod_index: u32) -> Option<&LodRenderData> {
        self.previous.get(lod_index as usize)
    }

    /// Frame the current data belongs to.
    pub fn frame_id(&self) -> Option<FrameId> {
        self.frame_id
    }
}

/// Snap `position` down to a multiple of `texel_width` on each axis.
pub(crate) fn snap_to_texel(position: Vec2, texel_width: f32) -> Vec2 {
    Vec2::new(
        position.x - position.x.rem_euclid(texel_width),
        position.y - position.y.rem_euclid(texel_width),
    )
}

impl LodDataLayer for LodTransform {
    fn name(&self) -> &'static str {
        "lod_transform"
    }

    fn update_for_frame(&mut self, frame: &LodFrame) {
        std::mem::swap(&mut self.current, &mut self.previous);
        self.current.clear();
        self.current.extend((0..frame.lod_count()).map(|lod| {
            let texel_width = frame.grid_size(lod);
            LodRenderData {
                texel_width,
                texture_resolution: frame.lod_data_resolution,
                pos_snapped: snap_to_texel(frame.origin.position, texel_width),
            }
        }));
        if self.previous.is_empty() {
            self.previous.clone_from(&self.current);
        }
        self.frame_id = frame.frame_id;
    }
}
