//! Fly camera for the PBR demo.
//!
//! WASD moves along the view direction and its right vector; mouse offsets
//! turn yaw and pitch. The renderer only sees the resulting position, front
//! vector and view matrix.

use glam::{Mat4, Vec3};

/// Degrees of rotation per pixel of mouse movement.
pub const MOUSE_SENSITIVITY: f32 = 0.1;
pub const PITCH_LIMIT: f32 = 89.0;
/// Units per second at normal speed.
pub const DEFAULT_SPEED: f32 = 7.5;

const FAST_MULTIPLIER: f32 = 3.0;
const SLOW_MULTIPLIER: f32 = 0.15;

/// Keys held this frame, as movement intents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Movement {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub fast: bool,
    pub slow: bool,
}

impl Movement {
    fn multiplier(self) -> f32 {
        // Shift wins when both modifiers are held.
        if self.fast {
            FAST_MULTIPLIER
        } else if self.slow {
            SLOW_MULTIPLIER
        } else {
            1.0
        }
    }
}

pub struct FlyCamera {
    pub position: Vec3,
    /// Degrees; -90 looks down -Z.
    pub yaw: f32,
    /// Degrees, clamped to ±[`PITCH_LIMIT`].
    pub pitch: f32,
    pub speed: f32,
}

impl FlyCamera {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            yaw: -90.0,
            pitch: 0.0,
            speed: DEFAULT_SPEED,
        }
    }

    pub fn front(&self) -> Vec3 {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize()
    }

    pub fn right(&self) -> Vec3 {
        self.front().cross(Vec3::Y).normalize()
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front(), Vec3::Y)
    }

    /// Move for `dt` seconds.
    pub fn travel(&mut self, movement: Movement, dt: f32) {
        let step = self.speed * dt * movement.multiplier();
        let front = self.front();
        let right = self.right();
        if movement.forward {
            self.position += front * step;
        }
        if movement.backward {
            self.position -= front * step;
        }
        if movement.left {
            self.position -= right * step;
        }
        if movement.right {
            self.position += right * step;
        }
    }

    /// Turn by a cursor offset in pixels. Moving the cursor up looks up,
    /// so `dy` (which grows downwards) is inverted.
    pub fn look(&mut self, dx: f64, dy: f64) {
        self.yaw += dx as f32 * MOUSE_SENSITIVITY;
        self.pitch = (self.pitch - dy as f32 * MOUSE_SENSITIVITY).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }
}

impl Default for FlyCamera {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 1.0, 3.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Vec3, b: Vec3) {
        assert!((a - b).length() < 1e-4, "{a:?} != {b:?}");
    }

    #[test]
    fn test_starts_looking_down_negative_z() {
        let camera = FlyCamera::default();
        assert_close(camera.front(), Vec3::NEG_Z);
        assert_close(camera.right(), Vec3::X);
        assert_eq!(camera.position, Vec3::new(0.0, 1.0, 3.0));
    }

    #[test]
    fn test_travel_scales_with_modifiers() {
        let forward = Movement {
            forward: true,
            ..Default::default()
        };

        let mut camera = FlyCamera::default();
        camera.travel(forward, 1.0);
        assert_close(camera.position, Vec3::new(0.0, 1.0, 3.0 - 7.5));

        let mut camera = FlyCamera::default();
        camera.travel(Movement { fast: true, ..forward }, 1.0);
        assert_close(camera.position, Vec3::new(0.0, 1.0, 3.0 - 22.5));

        let mut camera = FlyCamera::default();
        camera.travel(Movement { slow: true, ..forward }, 2.0);
        assert_close(camera.position, Vec3::new(0.0, 1.0, 3.0 - 2.25));
    }

    #[test]
    fn test_strafe_and_cancel() {
        let mut camera = FlyCamera::default();
        camera.travel(
            Movement {
                right: true,
                ..Default::default()
            },
            0.5,
        );
        assert_close(camera.position, Vec3::new(3.75, 1.0, 3.0));

        camera.travel(
            Movement {
                forward: true,
                backward: true,
                ..Default::default()
            },
            1.0,
        );
        assert_close(camera.position, Vec3::new(3.75, 1.0, 3.0));
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut camera = FlyCamera::default();
        camera.look(0.0, -10_000.0);
        assert_eq!(camera.pitch, PITCH_LIMIT);
        assert!(camera.front().y > 0.99);

        camera.look(0.0, 10_000.0);
        assert_eq!(camera.pitch, -PITCH_LIMIT);
    }

    #[test]
    fn test_horizontal_look_turns_yaw() {
        let mut camera = FlyCamera::default();
        camera.look(900.0, 0.0);
        assert!((camera.yaw - 0.0).abs() < 1e-4);
        assert_close(camera.front(), Vec3::X);
    }
}
