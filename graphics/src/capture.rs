//! Rendering into the six faces of a cube texture.

use std::sync::Arc;

use glam::{Mat4, Vec3};

use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::graph::{ColorAttachment, DrawKind, RenderTarget, TextureBinding};
use crate::recorder::CommandRecorder;
use crate::resources::{Program, Texture};
use crate::targets::{RenderTargetRegistry, TargetId, TargetSize, TargetSpec};
use crate::types::{TextureDimension, TextureFormat, Viewport};
use crate::uniforms::DrawUniforms;

/// Number of cube faces.
pub const CUBE_FACES: u32 = 6;

/// Look direction and up vector of each face, in +X, -X, +Y, -Y, +Z, -Z order.
pub const FACE_DIRECTIONS: [(Vec3, Vec3); CUBE_FACES as usize] = [
    (Vec3::X, Vec3::NEG_Y),
    (Vec3::NEG_X, Vec3::NEG_Y),
    (Vec3::Y, Vec3::Z),
    (Vec3::NEG_Y, Vec3::NEG_Z),
    (Vec3::Z, Vec3::NEG_Y),
    (Vec3::NEG_Z, Vec3::NEG_Y),
];

/// The six look-at views from the origin plus a 90° projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureViewSet {
    views: [Mat4; CUBE_FACES as usize],
    projection: Mat4,
}

impl CaptureViewSet {
    pub fn new() -> Self {
        Self {
            views: FACE_DIRECTIONS.map(|(look, up)| Mat4::look_at_rh(Vec3::ZERO, look, up)),
            projection: Mat4::perspective_rh(90f32.to_radians(), 1.0, 0.1, 10.0),
        }
    }

    pub fn view(&self, face: u32) -> Mat4 {
        self.views[face as usize]
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }
}

impl Default for CaptureViewSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders a program over the unit cube into every face of a cube texture,
/// one mip level per call.
///
/// A depth-only scratch target is reused for all captures and resized to
/// the face size of each call.
#[derive(Debug)]
pub struct EnvironmentCapture {
    views: CaptureViewSet,
    scratch: TargetId,
}

impl EnvironmentCapture {
    pub fn new(registry: &mut RenderTargetRegistry, initial_size: u32) -> Result<Self, GraphicsError> {
        let scratch = registry.allocate(
            TargetSpec::new("capture", TargetSize::Fixed(initial_size, initial_size))
                .with_depth(TextureFormat::Depth32Float),
        )?;
        Ok(Self {
            views: CaptureViewSet::new(),
            scratch,
        })
    }

    pub fn views(&self) -> &CaptureViewSet {
        &self.views
    }

    /// Scratch depth target.
    pub fn scratch(&self) -> TargetId {
        self.scratch
    }

    /// Render `program` into all six faces of `target` at `mip`.
    ///
    /// `inputs` are bound for the duration of the capture and `base` supplies
    /// every uniform except view and projection. The caller's target,
    /// viewport and texture units are restored before returning, and the
    /// recorded passes are submitted.
    #[allow(clippy::too_many_arguments)]
    pub fn capture_cube(
        &self,
        device: &GraphicsDevice,
        recorder: &mut CommandRecorder,
        registry: &mut RenderTargetRegistry,
        program: &Arc<Program>,
        inputs: &[(u32, TextureBinding)],
        target: &Arc<Texture>,
        mip: u32,
        base: DrawUniforms,
    ) -> Result<(), GraphicsError> {
        if target.dimension() != TextureDimension::Cube {
            return Err(GraphicsError::InvalidParameter(format!(
                "capture target {:?} is not a cube texture",
                target.label()
            )));
        }
        let (face_size, _) = target.mip_size(mip);
        // Work recorded against the previous scratch size has to run first.
        recorder.submit(device)?;
        registry.resize_depth(self.scratch, face_size, face_size)?;

        log::debug!(
            "EnvironmentCapture: {} into {:?} mip {} ({}²)",
            program.kind().label(),
            target.label(),
            mip,
            face_size
        );

        {
            let mut viewport =
                recorder.set_viewport(Viewport::from_dimensions(face_size, face_size));
            let mut bound = viewport.bind_target("capture", registry.get(self.scratch).config());
            let mut units = bound.bind_textures(inputs);
            for face in 0..CUBE_FACES {
                units.attach_color(
                    0,
                    ColorAttachment::new(RenderTarget::from_cube_face(target.clone(), face, mip)),
                );
                units.begin_pass(format!(
                    "capture.{}.mip{}.face{}",
                    program.kind().label(),
                    mip,
                    face
                ));
                units.clear([0.0, 0.0, 0.0, 1.0], 1.0);
                units.draw(
                    program,
                    DrawKind::UnitCube,
                    base.with_view(self.views.view(face))
                        .with_projection(self.views.projection()),
                );
            }
        }
        recorder.submit(device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_views_look_along_axes() {
        let views = CaptureViewSet::new();
        for (face, (look, _)) in FACE_DIRECTIONS.iter().enumerate() {
            // A point along the look direction ends up in front of the camera.
            let in_view = views.view(face as u32).transform_point3(*look);
            assert!((in_view - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-5);
        }
    }

    #[test]
    fn test_projection_is_square_90_degrees() {
        let projection = CaptureViewSet::new().projection();
        assert!((projection.x_axis.x - 1.0).abs() < 1e-5);
        assert!((projection.y_axis.y - 1.0).abs() < 1e-5);
    }
}
