//! Per-draw uniform block.
//!
//! Every program reads the same block; each uses the fields it needs. The
//! layout is `std140`-compatible (every member is 16-byte aligned) so the
//! wgpu backend can upload it verbatim.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// Light parameters as the programs see them.
///
/// The `w` component of each position/direction vector is the enabled flag
/// (1.0 or 0.0); the `w` component of each color is the intensity.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightBlock {
    pub directional_direction: [f32; 4],
    pub directional_color: [f32; 4],
    pub point_position: [f32; 4],
    pub point_color: [f32; 4],
    pub spot_position: [f32; 4],
    pub spot_direction: [f32; 4],
    pub spot_color: [f32; 4],
    /// x = cosine of the inner cut-off, y = cosine of the outer cut-off.
    pub spot_cutoff: [f32; 4],
}

/// Uniform values for one draw.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct DrawUniforms {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    /// rgb albedo, a unused.
    pub albedo: [f32; 4],
    /// x = metallic, y = roughness, z = ambient occlusion.
    pub material: [f32; 4],
    /// x = prefilter roughness, y = exposure, z = gamma.
    pub params: [f32; 4],
    /// x = post-process flag bits, y = blur direction (1 = horizontal),
    /// z = deferred debug view.
    pub switches: [u32; 4],
    pub lights: LightBlock,
}

impl DrawUniforms {
    /// Size of the block in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Identity matrices, everything else zero.
    pub fn new() -> Self {
        let identity = Mat4::IDENTITY.to_cols_array_2d();
        Self {
            view: identity,
            projection: identity,
            model: identity,
            ..Zeroable::zeroed()
        }
    }

    pub fn with_view(mut self, view: Mat4) -> Self {
        self.view = view.to_cols_array_2d();
        self
    }

    pub fn with_projection(mut self, projection: Mat4) -> Self {
        self.projection = projection.to_cols_array_2d();
        self
    }

    pub fn with_model(mut self, model: Mat4) -> Self {
        self.model = model.to_cols_array_2d();
        self
    }

    pub fn with_camera_position(mut self, position: Vec3) -> Self {
        self.camera_position = position.extend(1.0).to_array();
        self
    }

    /// Roughness level the prefilter program convolves for.
    pub fn with_roughness(mut self, roughness: f32) -> Self {
        self.params[0] = roughness;
        self
    }

    pub fn with_tone_mapping(mut self, exposure: f32, gamma: f32) -> Self {
        self.params[1] = exposure;
        self.params[2] = gamma;
        self
    }

    pub fn with_post_flags(mut self, bits: u32) -> Self {
        self.switches[0] = bits;
        self
    }

    pub fn with_horizontal(mut self, horizontal: bool) -> Self {
        self.switches[1] = horizontal as u32;
        self
    }

    pub fn with_deferred_view(mut self, view: u32) -> Self {
        self.switches[2] = view;
        self
    }

    pub fn with_lights(mut self, lights: LightBlock) -> Self {
        self.lights = lights;
        self
    }

    /// Prefilter roughness.
    pub fn roughness(&self) -> f32 {
        self.params[0]
    }

    /// Blur direction flag.
    pub fn horizontal(&self) -> bool {
        self.switches[1] != 0
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.view)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.projection)
    }
}

impl Default for DrawUniforms {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_is_16_byte_aligned() {
        assert_eq!(DrawUniforms::SIZE % 16, 0);
        assert_eq!(std::mem::size_of::<LightBlock>(), 8 * 16);
    }

    #[test]
    fn test_builders() {
        let u = DrawUniforms::new()
            .with_roughness(0.25)
            .with_horizontal(true)
            .with_view(Mat4::from_translation(Vec3::X));
        assert_eq!(u.roughness(), 0.25);
        assert!(u.horizontal());
        assert_eq!(u.view_matrix(), Mat4::from_translation(Vec3::X));
        assert_eq!(u.projection_matrix(), Mat4::IDENTITY);
    }
}
