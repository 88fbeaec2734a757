//! Mesh generators for the demo scene shapes.

use std::f32::consts::PI;

use super::data::{CpuMesh, Vertex};

/// Generate a unit cube (-1..1) as 36 non-indexed vertices.
///
/// The same layout is used for capture and backdrop draws, where only the
/// positions matter.
pub fn generate_cube() -> CpuMesh {
    // (normal, tangent u, tangent v) per face.
    const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
    ];
    const CORNERS: [(f32, f32); 6] = [
        (-1.0, -1.0),
        (1.0, -1.0),
        (1.0, 1.0),
        (1.0, 1.0),
        (-1.0, 1.0),
        (-1.0, -1.0),
    ];

    let mut vertices = Vec::with_capacity(36);
    for (n, u, v) in FACES {
        for (a, b) in CORNERS {
            let position = [
                n[0] + u[0] * a + v[0] * b,
                n[1] + u[1] * a + v[1] * b,
                n[2] + u[2] * a + v[2] * b,
            ];
            vertices.push(Vertex::new(
                position,
                n,
                [(a + 1.0) * 0.5, (b + 1.0) * 0.5],
            ));
        }
    }
    CpuMesh::new(vertices).with_label("cube")
}

/// Generate a flat plane on XZ, facing +Y, with the given half extent.
pub fn generate_plane(half_extent: f32) -> CpuMesh {
    let e = half_extent;
    let up = [0.0, 1.0, 0.0];
    let vertices = vec![
        Vertex::new([-e, 0.0, -e], up, [0.0, 0.0]),
        Vertex::new([-e, 0.0, e], up, [0.0, 1.0]),
        Vertex::new([e, 0.0, e], up, [1.0, 1.0]),
        Vertex::new([e, 0.0, -e], up, [1.0, 0.0]),
    ];
    CpuMesh::indexed(vertices, vec![0, 1, 2, 2, 3, 0]).with_label("plane")
}

/// Generate a UV sphere.
///
/// `segments` is the number of longitudinal slices, `rings` the number of
/// latitudinal bands from pole to pole.
pub fn generate_sphere(radius: f32, segments: u32, rings: u32) -> CpuMesh {
    let mut vertices = Vec::with_capacity(((rings + 1) * (segments + 1)) as usize);
    let mut indices = Vec::with_capacity((rings * segments * 6) as usize);

    for ring in 0..=rings {
        let theta = ring as f32 * PI / rings as f32;
        let (sin_theta, cos_theta) = theta.sin_cos();

        for segment in 0..=segments {
            let phi = segment as f32 * 2.0 * PI / segments as f32;
            let (sin_phi, cos_phi) = phi.sin_cos();

            let normal = [sin_theta * cos_phi, cos_theta, sin_theta * sin_phi];
            vertices.push(Vertex::new(
                [normal[0] * radius, normal[1] * radius, normal[2] * radius],
                normal,
                [segment as f32 / segments as f32, ring as f32 / rings as f32],
            ));
        }
    }

    for ring in 0..rings {
        for segment in 0..segments {
            let current = ring * (segments + 1) + segment;
            let next = current + segments + 1;

            indices.extend_from_slice(&[current, next, current + 1]);
            indices.extend_from_slice(&[current + 1, next, next + 1]);
        }
    }

    CpuMesh::indexed(vertices, indices).with_label("sphere")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::MeshShape;

    #[test]
    fn test_cube_has_36_vertices_on_unit_bounds() {
        let cube = generate_cube();
        assert_eq!(cube.shape(), MeshShape::Arrays { vertex_count: 36 });
        for v in cube.vertices() {
            assert!(v.position.iter().all(|c| c.abs() <= 1.0));
            // every vertex lies on the face its normal points to
            let on_face = (0..3).any(|i| v.normal[i] != 0.0 && v.position[i] == v.normal[i]);
            assert!(on_face, "{v:?}");
        }
    }

    #[test]
    fn test_generate_sphere() {
        let mesh = generate_sphere(1.0, 8, 4);
        // (rings+1) * (segments+1) = 5 * 9 = 45 vertices
        assert_eq!(mesh.vertex_count(), 45);
        // rings * segments * 6 = 4 * 8 * 6 = 192 indices
        assert_eq!(mesh.shape().draw_count(), 192);
    }

    #[test]
    fn test_plane_faces_up() {
        let plane = generate_plane(2.0);
        assert_eq!(plane.shape().draw_count(), 6);
        assert!(plane.vertices().iter().all(|v| v.normal == [0.0, 1.0, 0.0]));
        assert!(plane.vertices().iter().all(|v| v.position[1] == 0.0));
    }
}
