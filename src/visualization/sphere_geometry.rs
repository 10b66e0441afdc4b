use std::f32::consts::{PI, TAU};

use crate::sampling::Point;

use super::VisualizationError;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 4], // straight (non-premultiplied) RGBA
    // Point whose visibility decides fading: the marker center, or the vertex itself
    pub anchor: [f32; 3],
    // Fraction of alpha removed while the anchor is behind the sphere
    pub far_fade: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct MeshOptions {
    pub radius: f32,
    // Polar and azimuthal subdivisions of the sphere surface
    pub stacks: u32,
    pub sectors: u32,
    // Half-diagonal of the octahedron drawn at each point
    pub marker_size: f32,
    pub surface_color: [f32; 4],
    pub point_color: [f32; 4],
    pub hidden_marker_fade: f32,
}

impl Default for MeshOptions {
    fn default() -> Self {
        MeshOptions {
            radius: 1.0,
            stacks: 50,
            sectors: 100,
            marker_size: 0.025,
            surface_color: [0.1, 0.3, 0.9, 0.3], // translucent blue
            // Light so markers stand out against egui's dark panel
            point_color: [0.95, 0.95, 0.95, 1.0],
            hidden_marker_fade: 0.7,
        }
    }
}

/// Triangle mesh for a translucent sphere with one marker per sampled point.
///
/// Surface triangles come first in `indices`, so drawing in order paints the
/// markers on top of the surface without a depth buffer. Markers on the far
/// side are told apart by the shader, which fades them using `far_fade`.
#[derive(Debug, Clone, Default)]
pub struct SphereMesh {
    pub radius: f32,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub surface_index_count: u32,
    pub marker_count: usize,
}

impl SphereMesh {
    pub fn build(points: &[Point], options: &MeshOptions) -> Result<Self, VisualizationError> {
        let centers = points
            .iter()
            .enumerate()
            .map(|(index, p)| {
                p.to_array3()
                    .ok_or(VisualizationError::UnsupportedDimension {
                        index,
                        dim: p.dim(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut mesh = SphereMesh {
            radius: options.radius,
            ..SphereMesh::default()
        };
        mesh.push_surface(options);
        mesh.surface_index_count = mesh.indices.len() as u32;
        for center in &centers {
            mesh.push_marker(*center, options);
        }
        mesh.marker_count = centers.len();

        tracing::debug!(
            "Built sphere mesh: {} vertices, {} indices, {} markers",
            mesh.vertices.len(),
            mesh.indices.len(),
            mesh.marker_count
        );
        Ok(mesh)
    }

    fn push_surface(&mut self, options: &MeshOptions) {
        let stacks = options.stacks.max(2);
        let sectors = options.sectors.max(3);
        let base = self.vertices.len() as u32;

        for i in 0..=stacks {
            let phi = PI * i as f32 / stacks as f32; // 0 at +z, PI at -z
            let (sin_phi, cos_phi) = phi.sin_cos();
            for j in 0..=sectors {
                let theta = TAU * j as f32 / sectors as f32;
                let (sin_theta, cos_theta) = theta.sin_cos();
                let position = [
                    options.radius * sin_phi * cos_theta,
                    options.radius * sin_phi * sin_theta,
                    options.radius * cos_phi,
                ];
                self.vertices.push(Vertex {
                    position,
                    color: options.surface_color,
                    anchor: position,
                    far_fade: 0.0,
                });
            }
        }

        let row = sectors + 1;
        for i in 0..stacks {
            for j in 0..sectors {
                let a = base + i * row + j;
                let b = a + row;
                self.indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
            }
        }
    }

    fn push_marker(&mut self, center: [f32; 3], options: &MeshOptions) {
        const AXES: [[f32; 3]; 6] = [
            [1.0, 0.0, 0.0],
            [-1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, -1.0, 0.0],
            [0.0, 0.0, 1.0],
            [0.0, 0.0, -1.0],
        ];
        // Each face joins one x tip, one y tip and one z tip.
        const FACES: [[u32; 3]; 8] = [
            [0, 2, 4],
            [2, 1, 4],
            [1, 3, 4],
            [3, 0, 4],
            [2, 0, 5],
            [1, 2, 5],
            [3, 1, 5],
            [0, 3, 5],
        ];

        let base = self.vertices.len() as u32;
        let c = center.map(|x| x * options.radius);
        for axis in AXES {
            self.vertices.push(Vertex {
                position: [
                    c[0] + axis[0] * options.marker_size,
                    c[1] + axis[1] * options.marker_size,
                    c[2] + axis[2] * options.marker_size,
                ],
                color: options.point_color,
                anchor: c,
                far_fade: options.hidden_marker_fade,
            });
        }
        for face in FACES {
            self.indices.extend(face.iter().map(|i| base + i));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(coords: &[f64]) -> Point {
        Point::normalized(coords.to_vec()).unwrap()
    }

    #[test]
    fn counts_match_resolution_and_points() {
        let options = MeshOptions {
            stacks: 4,
            sectors: 8,
            ..MeshOptions::default()
        };
        let points = vec![unit(&[1.0, 0.0, 0.0]), unit(&[0.0, 0.0, -1.0])];
        let mesh = SphereMesh::build(&points, &options).unwrap();

        assert_eq!(mesh.surface_index_count, 4 * 8 * 6);
        assert_eq!(mesh.marker_count, 2);
        assert_eq!(mesh.vertices.len(), 5 * 9 + 2 * 6);
        assert_eq!(mesh.indices.len(), 4 * 8 * 6 + 2 * 8 * 3);
        assert!(mesh
            .indices
            .iter()
            .all(|&i| (i as usize) < mesh.vertices.len()));
    }

    #[test]
    fn surface_vertices_lie_on_sphere() {
        let mesh = SphereMesh::build(&[], &MeshOptions::default()).unwrap();
        assert_eq!(mesh.marker_count, 0);
        for v in &mesh.vertices {
            let [x, y, z] = v.position;
            let r = (x * x + y * y + z * z).sqrt();
            assert!((r - 1.0).abs() < 1e-5, "radius = {}", r);
        }
    }

    #[test]
    fn markers_are_centered_on_points() {
        let options = MeshOptions::default();
        let p = unit(&[0.0, 3.0, 4.0]);
        let mesh = SphereMesh::build(std::slice::from_ref(&p), &options).unwrap();

        let marker = &mesh.vertices[mesh.vertices.len() - 6..];
        let mut centroid = [0.0f32; 3];
        for v in marker {
            for k in 0..3 {
                centroid[k] += v.position[k] / 6.0;
            }
            assert_eq!(v.color, options.point_color);
        }
        assert!((centroid[1] - 0.6).abs() < 1e-6);
        assert!((centroid[2] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn only_markers_fade_when_hidden() {
        let options = MeshOptions {
            stacks: 3,
            sectors: 4,
            ..MeshOptions::default()
        };
        let p = unit(&[1.0, 0.0, 0.0]);
        let mesh = SphereMesh::build(std::slice::from_ref(&p), &options).unwrap();
        let (surface, marker) = mesh.vertices.split_at(mesh.vertices.len() - 6);

        assert_eq!(mesh.radius, options.radius);
        for v in surface {
            assert_eq!(v.far_fade, 0.0);
            assert_eq!(v.anchor, v.position);
        }
        for v in marker {
            assert_eq!(v.far_fade, options.hidden_marker_fade);
            assert_eq!(v.anchor, [1.0, 0.0, 0.0]);
            // Opaque and lighter than the surface
            assert_eq!(v.color[3], 1.0);
            assert!(v.color[0] > options.surface_color[0]);
        }
    }

    #[test]
    fn non_three_dimensional_points_are_rejected() {
        let points = vec![unit(&[0.0, 1.0, 0.0]), unit(&[1.0, 1.0])];
        let err = SphereMesh::build(&points, &MeshOptions::default()).unwrap_err();
        assert_eq!(
            err,
            VisualizationError::UnsupportedDimension { index: 1, dim: 2 }
        );
    }
}
