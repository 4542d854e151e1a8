//! Cube and UV-sphere generators
//!
//! Both shapes are centered on the origin, carry outward unit normals and
//! texture coordinates in `[0, 1]`, and wind counter-clockwise seen from
//! outside.

use std::f32::consts::PI;

use super::GeometryData;

/// Default sphere tessellation, fine enough for gizmos and demo objects.
pub const SPHERE_LONGITUDE_SEGMENTS: u32 = 24;
pub const SPHERE_LATITUDE_SEGMENTS: u32 = 16;

// (outward normal, u direction, v direction) per face
const CUBE_FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
    ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
    ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
    ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
    ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
];

/// Unit cube spanning `-0.5..0.5`, four vertices per face so normals stay flat.
pub fn generate_cube() -> GeometryData {
    let mut data = GeometryData::new();

    for (normal, u, v) in CUBE_FACES {
        let base = data.vertices.len() as u32;
        for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let corner = [0, 1, 2].map(|i| 0.5 * (normal[i] + su * u[i] + sv * v[i]));
            data.vertices.push(corner);
            data.normals.push(normal);
            data.tex_coords.push([(su + 1.0) * 0.5, (1.0 - sv) * 0.5]);
        }
        data.indices
            .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }

    data
}

/// Sphere of radius 1. Segment counts are clamped to the smallest closed shape.
pub fn generate_sphere(longitude_segments: u32, latitude_segments: u32) -> GeometryData {
    let mut data = GeometryData::new();
    let longitude = longitude_segments.max(3);
    let latitude = latitude_segments.max(2);

    for ring in 0..=latitude {
        let v = ring as f32 / latitude as f32;
        let (sin_theta, cos_theta) = (v * PI).sin_cos();
        for segment in 0..=longitude {
            let u = segment as f32 / longitude as f32;
            let (sin_phi, cos_phi) = (u * 2.0 * PI).sin_cos();
            let point = [sin_theta * cos_phi, cos_theta, sin_theta * sin_phi];
            data.vertices.push(point);
            data.normals.push(point);
            data.tex_coords.push([u, v]);
        }
    }

    let stride = longitude + 1;
    for ring in 0..latitude {
        for segment in 0..longitude {
            let a = ring * stride + segment;
            let b = a + stride;
            data.indices.extend_from_slice(&[a, a + 1, b, b, a + 1, b + 1]);
        }
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn length(v: [f32; 3]) -> f32 {
        (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
    }

    #[test]
    fn test_cube_generation() {
        let cube = generate_cube();
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.triangle_count(), 12);
        for vertex in &cube.vertices {
            assert!(vertex.iter().all(|c| c.abs() == 0.5));
        }
    }

    #[test]
    fn test_cube_faces_wind_outward() {
        let cube = generate_cube();
        for triangle in cube.indices.chunks(3) {
            let [a, b, c] = [0, 1, 2].map(|i| cube.vertices[triangle[i] as usize]);
            let e1 = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
            let e2 = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
            let cross = [
                e1[1] * e2[2] - e1[2] * e2[1],
                e1[2] * e2[0] - e1[0] * e2[2],
                e1[0] * e2[1] - e1[1] * e2[0],
            ];
            let n = cube.normals[triangle[0] as usize];
            assert!(cross[0] * n[0] + cross[1] * n[1] + cross[2] * n[2] > 0.0);
        }
    }

    #[test]
    fn test_sphere_generation() {
        let sphere = generate_sphere(8, 6);
        assert_eq!(sphere.vertex_count(), 9 * 7);
        assert_eq!(sphere.triangle_count(), 8 * 6 * 2);
        assert_eq!(sphere.vertices.len(), sphere.normals.len());
        assert_eq!(sphere.vertices.len(), sphere.tex_coords.len());
        for normal in &sphere.normals {
            assert_abs_diff_eq!(length(*normal), 1.0, epsilon = 1e-5);
        }
    }
}
