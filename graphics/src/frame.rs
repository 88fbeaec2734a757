//! Per-frame transient state.

use glam::{Mat4, Vec3};

/// Vertical field of view of the scene camera, in degrees.
pub const FIELD_OF_VIEW: f32 = 45.0;
pub const NEAR_PLANE: f32 = 0.1;
pub const FAR_PLANE: f32 = 100.0;

/// Camera and animation values for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameState {
    pub view: Mat4,
    pub projection: Mat4,
    /// Extra transform applied to every scene object.
    pub model: Mat4,
    /// Demo rotation, in radians.
    pub rotation: f32,
    pub camera_position: Vec3,
    /// Direction the camera looks in; the spot light follows it.
    pub camera_front: Vec3,
}

impl FrameState {
    pub fn new(width: u32, height: u32) -> Self {
        let camera_position = Vec3::new(0.0, 1.0, 3.0);
        let camera_front = Vec3::NEG_Z;
        Self {
            view: Mat4::look_at_rh(camera_position, camera_position + camera_front, Vec3::Y),
            projection: projection(width, height),
            model: Mat4::IDENTITY,
            rotation: 0.0,
            camera_position,
            camera_front,
        }
    }

    /// Recompute the projection for a new window size. Zero sizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.projection = projection(width, height);
        }
    }

    /// Advance the demo rotation and rebuild the model transform.
    pub fn advance_rotation(&mut self, speed: f32, dt: f32) {
        self.rotation = (self.rotation + speed * dt) % std::f32::consts::TAU;
        self.model = Mat4::from_rotation_y(self.rotation);
    }

    pub fn set_camera(&mut self, position: Vec3, front: Vec3, view: Mat4) {
        self.camera_position = position;
        self.camera_front = front;
        self.view = view;
    }
}

/// Scene perspective projection for a window size.
pub fn projection(width: u32, height: u32) -> Mat4 {
    let aspect = width.max(1) as f32 / height.max(1) as f32;
    Mat4::perspective_rh(FIELD_OF_VIEW.to_radians(), aspect, NEAR_PLANE, FAR_PLANE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_ignores_zero() {
        let mut frame = FrameState::new(1200, 800);
        let before = frame.projection;
        frame.resize(0, 800);
        assert_eq!(frame.projection, before);
        frame.resize(800, 800);
        assert_ne!(frame.projection, before);
    }

    #[test]
    fn test_rotation_wraps() {
        let mut frame = FrameState::new(1200, 800);
        frame.advance_rotation(1.0, 7.0);
        assert!(frame.rotation < std::f32::consts::TAU);
        assert_ne!(frame.model, Mat4::IDENTITY);
    }
}
