//! Scene description: objects, materials and lights.

use std::sync::Arc;

use glam::{Mat4, Vec3};
use lumina_core::mesh::{generate_cube, generate_plane, generate_sphere};

use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::resources::Mesh;
use crate::uniforms::{DrawUniforms, LightBlock};

/// Metallic-roughness material factors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub albedo: Vec3,
    pub metallic: f32,
    pub roughness: f32,
    pub ao: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            albedo: Vec3::new(0.5, 0.0, 0.0),
            metallic: 0.0,
            roughness: 0.5,
            ao: 1.0,
        }
    }
}

impl Material {
    pub fn new(albedo: Vec3, metallic: f32, roughness: f32) -> Self {
        Self {
            albedo,
            metallic,
            roughness,
            ao: 1.0,
        }
    }

    /// Write the material factors into a uniform block.
    pub fn apply(&self, uniforms: DrawUniforms) -> DrawUniforms {
        let mut uniforms = uniforms;
        uniforms.albedo = self.albedo.extend(1.0).to_array();
        // Fully smooth surfaces produce a degenerate GGX lobe.
        uniforms.material = [self.metallic, self.roughness.clamp(0.05, 1.0), self.ao, 0.0];
        uniforms
    }
}

/// A drawable object.
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub label: String,
    pub mesh: Arc<Mesh>,
    pub transform: Mat4,
    pub material: Material,
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub direction: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    pub enabled: bool,
}

/// A cone light. Cut-offs are stored as cosines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotLight {
    pub color: Vec3,
    pub intensity: f32,
    pub cut_off: f32,
    pub outer_cut_off: f32,
    pub enabled: bool,
}

impl SpotLight {
    /// Build from inner and outer cone angles in degrees.
    pub fn new(color: Vec3, intensity: f32, inner_degrees: f32, outer_degrees: f32) -> Self {
        if inner_degrees > outer_degrees {
            log::warn!("SpotLight: inner cut off bigger than outer ({inner_degrees} > {outer_degrees})");
        }
        Self {
            color,
            intensity,
            cut_off: inner_degrees.to_radians().cos(),
            outer_cut_off: outer_degrees.to_radians().cos(),
            enabled: false,
        }
    }
}

/// Everything the geometry stages draw.
#[derive(Debug, Clone)]
pub struct Scene {
    pub objects: Vec<SceneObject>,
    pub directional: DirectionalLight,
    pub point: PointLight,
    /// Placed at the camera and aimed where it looks.
    pub spot: SpotLight,
}

impl Scene {
    /// An empty scene with the default light rig.
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            directional: DirectionalLight {
                direction: Vec3::new(-1.0, -1.0, -1.0),
                color: Vec3::ONE,
                intensity: 1.0,
                enabled: false,
            },
            point: PointLight {
                position: Vec3::new(0.0, 0.5, 1.0),
                color: Vec3::ONE,
                intensity: 1.0,
                enabled: true,
            },
            spot: SpotLight::new(Vec3::ONE, 1.0, 12.5, 15.0),
        }
    }

    /// The demo scene: a ground plane, two cubes and a 7×7 grid of spheres
    /// with metallic increasing by row and roughness by column.
    pub fn demo(device: &GraphicsDevice) -> Result<Self, GraphicsError> {
        let plane = device.create_mesh(&generate_plane(10.0).with_label("plane"))?;
        let cube = device.create_mesh(&generate_cube().with_label("cube"))?;
        let sphere = device.create_mesh(&generate_sphere(0.4, 32, 16).with_label("sphere"))?;

        let mut scene = Self::new();
        scene.add(
            "plane",
            plane,
            Mat4::IDENTITY,
            Material::new(Vec3::splat(0.6), 0.0, 0.8),
        );
        scene.add(
            "cube1",
            cube.clone(),
            Mat4::from_translation(Vec3::new(-1.0, 0.501, -2.0)) * Mat4::from_scale(Vec3::splat(0.5)),
            Material::new(Vec3::new(0.8, 0.3, 0.2), 0.0, 0.4),
        );
        scene.add(
            "cube2",
            cube,
            Mat4::from_translation(Vec3::new(0.0, 0.501, 0.0)) * Mat4::from_scale(Vec3::splat(0.5)),
            Material::new(Vec3::new(0.2, 0.4, 0.8), 1.0, 0.3),
        );

        const GRID: usize = 7;
        const SPACING: f32 = 1.0;
        for row in 0..GRID {
            for column in 0..GRID {
                let x = (column as f32 - (GRID as f32 - 1.0) / 2.0) * SPACING;
                let y = 1.5 + row as f32 * SPACING;
                scene.add(
                    &format!("sphere_{row}_{column}"),
                    sphere.clone(),
                    Mat4::from_translation(Vec3::new(x, y, -5.0)),
                    Material::new(
                        Vec3::new(0.5, 0.0, 0.0),
                        row as f32 / (GRID - 1) as f32,
                        column as f32 / (GRID - 1) as f32,
                    ),
                );
            }
        }
        Ok(scene)
    }

    pub fn add(&mut self, label: &str, mesh: Arc<Mesh>, transform: Mat4, material: Material) {
        self.objects.push(SceneObject {
            label: label.to_string(),
            mesh,
            transform,
            material,
            enabled: true,
        });
    }

    /// Enabled objects.
    pub fn visible(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.iter().filter(|o| o.enabled)
    }

    /// Light parameters for a camera at `camera_position` looking along
    /// `camera_front`.
    pub fn light_block(&self, camera_position: Vec3, camera_front: Vec3) -> LightBlock {
        let flag = |enabled: bool| if enabled { 1.0 } else { 0.0 };
        let d = &self.directional;
        let p = &self.point;
        let s = &self.spot;
        LightBlock {
            directional_direction: d.direction.normalize_or_zero().extend(flag(d.enabled)).to_array(),
            directional_color: d.color.extend(d.intensity).to_array(),
            point_position: p.position.extend(flag(p.enabled)).to_array(),
            point_color: p.color.extend(p.intensity).to_array(),
            spot_position: camera_position.extend(flag(s.enabled)).to_array(),
            spot_direction: camera_front.normalize_or_zero().extend(0.0).to_array(),
            spot_color: s.color.extend(s.intensity).to_array(),
            spot_cutoff: [s.cut_off, s.outer_cut_off, 0.0, 0.0],
        }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::GraphicsInstance;

    #[test]
    fn test_demo_scene_layout() {
        let device = GraphicsInstance::new().unwrap().create_device().unwrap();
        let scene = Scene::demo(&device).unwrap();
        assert_eq!(scene.objects.len(), 3 + 49);
        assert_eq!(scene.visible().count(), 52);

        let corner = &scene.objects[3 + 48];
        assert_eq!(corner.material.metallic, 1.0);
        assert_eq!(corner.material.roughness, 1.0);
    }

    #[test]
    fn test_light_block_flags() {
        let scene = Scene::new();
        let block = scene.light_block(Vec3::new(0.0, 1.0, 3.0), Vec3::NEG_Z);
        assert_eq!(block.directional_direction[3], 0.0);
        assert_eq!(block.point_position[3], 1.0);
        assert_eq!(block.spot_position[..3], [0.0, 1.0, 3.0]);
        assert!(block.spot_cutoff[0] > block.spot_cutoff[1]);
    }

    #[test]
    fn test_material_clamps_roughness() {
        let uniforms = Material::new(Vec3::ONE, 0.0, 0.0).apply(DrawUniforms::new());
        assert_eq!(uniforms.material[1], 0.05);
    }
}
