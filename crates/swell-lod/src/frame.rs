//! Frame tokens and the per-frame LOD snapshot published to dependent layers.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::sampling::Footprint;
use crate::scale::ScaleState;

/// Identity of a rendered frame, supplied by the frame driver.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub u64);

impl FrameId {
    /// The frame after this one.
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// Origin of the LOD rings: horizontal position plus the fixed sea level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReferenceFrame {
    /// World-space x/z position of the ring center.
    pub position: Vec2,
    /// Height of the undisplaced water plane.
    pub sea_level: f32,
}

/// Read-only snapshot of the controller's output for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct LodFrame {
    /// Frame this snapshot was computed for. `None` until the first update.
    pub frame_id: Option<FrameId>,
    /// Ring center and sea level.
    pub origin: ReferenceFrame,
    /// Scale, blend weight and ring count.
    pub scale: ScaleState,
    /// Texels per side of each LOD data texture.
    pub lod_data_resolution: u32,
    /// Geometry resolution divisor relative to the data resolution.
    pub geometry_down_sample_factor: u32,
}

impl LodFrame {
    /// Number of LOD rings.
    pub fn lod_count(&self) -> u32 {
        self.scale.lod_count
    }

    /// Side length of LOD ring `lod_index`.
    pub fn lod_scale(&self, lod_index: u32) -> f32 {
        self.scale.lod_scale(lod_index)
    }

    /// World-space size of one data texel in LOD ring `lod_index`.
    pub fn grid_size(&self, lod_index: u32) -> f32 {
        self.lod_scale(lod_index) / self.lod_data_resolution as f32
    }

    /// Vertices per side of the rendered geometry in each ring.
    pub fn geometry_resolution(&self) -> u32 {
        self.lod_data_resolution / self.geometry_down_sample_factor.max(1)
    }

    /// Half the side length of the outermost ring.
    pub fn max_footprint_radius(&self) -> f32 {
        0.5 * self.lod_scale(self.lod_count().saturating_sub(1))
    }

    /// Area covered by LOD ring `lod_index`.
    pub fn footprint(&self, lod_index: u32) -> Footprint {
        Footprint::around(self.origin.position, 0.5 * self.lod_scale(lod_index))
    }

    /// Finest ring that fully covers `area` and whose texels are small enough
    /// to resolve features of size `min_spatial_length`.
    pub fn select_lod(&self, area: &Footprint, min_spatial_length: f32) -> Option<u32> {
        (0..self.lod_count()).find(|&lod| {
            self.footprint(lod).contains(area) && 2.0 * self.grid_size(lod) >= min_spatial_length
        })
    }

    /// Pack the snapshot for upload as a shader uniform.
    pub fn to_uniform(&self) -> LodUniform {
        LodUniform {
            origin: self.origin.position.to_array(),
            scale: self.scale.scale,
            level_alpha: self.scale.level_alpha,
            sea_level: self.origin.sea_level,
            lod_count: self.scale.lod_count,
            lod_data_resolution: self.lod_data_resolution,
            _padding: 0,
        }
    }
}

/// GPU uniform carrying the LOD transform to the simulation and mesh shaders.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct LodUniform {
    /// Ring center (x, z).
    pub origin: [f32; 2],
    /// Power-of-two scale of ring 0.
    pub scale: f32,
    /// Blend towards the next scale level.
    pub level_alpha: f32,
    /// Height of the undisplaced water plane.
    pub sea_level: f32,
    /// Number of LOD rings.
    pub lod_count: u32,
    /// Texels per side of each LOD data texture.
    pub lod_data_resolution: u32,
    /// Padding for 16-byte alignment.
    pub _padding: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(scale: f32, lod_count: u32) -> LodFrame {
        LodFrame {
            frame_id: Some(FrameId(1)),
            origin: ReferenceFrame {
                position: Vec2::new(100.0, -50.0),
                sea_level: 0.0,
            },
            scale: ScaleState::at(scale, lod_count),
            lod_data_resolution: 256,
            geometry_down_sample_factor: 2,
        }
    }

    #[test]
    fn test_grid_size_per_ring() {
        let f = frame(128.0, 4);
        assert_eq!(f.grid_size(0), 0.5);
        assert_eq!(f.grid_size(1), 1.0);
        assert_eq!(f.grid_size(3), 4.0);
        assert_eq!(f.geometry_resolution(), 128);
    }

    #[test]
    fn test_max_footprint_radius_is_outer_ring() {
        let f = frame(8.0, 5);
        // Outer ring: 8 * 2^4 = 128 wide.
        assert_eq!(f.max_footprint_radius(), 64.0);
    }

    #[test]
    fn test_select_lod_prefers_finest_covering_ring() {
        let f = frame(16.0, 5);
        let near = Footprint::around(Vec2::new(100.0, -50.0), 1.0);
        assert_eq!(f.select_lod(&near, 0.0), Some(0));

        // Ring 0 is 16 wide and ring 1 is 32 wide, so reaching 20 units out needs ring 2.
        let wide = Footprint::around(Vec2::new(100.0, -50.0), 20.0);
        assert_eq!(f.select_lod(&wide, 0.0), Some(2));
    }

    #[test]
    fn test_select_lod_honours_spatial_length() {
        let f = frame(16.0, 5);
        let near = Footprint::around(Vec2::new(100.0, -50.0), 1.0);
        // Ring grid sizes: 1/16, 1/8, 1/4, 1/2, 1.  Twice the grid must reach 0.5.
        assert_eq!(f.select_lod(&near, 0.5), Some(2));
    }

    #[test]
    fn test_select_lod_outside_all_rings() {
        let f = frame(16.0, 3);
        let far = Footprint::around(Vec2::new(10_000.0, 0.0), 1.0);
        assert_eq!(f.select_lod(&far, 0.0), None);
    }

    #[test]
    fn test_uniform_alignment() {
        assert_eq!(std::mem::size_of::<LodUniform>() % 16, 0);
        let u = frame(32.0, 6).to_uniform();
        assert_eq!(u.scale, 32.0);
        assert_eq!(u.lod_count, 6);
        assert_eq!(u.origin, [100.0, -50.0]);
    }

    #[test]
    fn test_frame_id_next() {
        assert_eq!(FrameId(41).next(), FrameId(42));
        assert_eq!(FrameId(u64::MAX).next(), FrameId(0));
    }
}
