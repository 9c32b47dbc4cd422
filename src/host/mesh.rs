//! Primitive tessellation and mesh file writers

use glam::Vec3;
use std::path::Path;

use crate::host::document::Shape;
use crate::host::{HostError, MeshRefinement};

/// A triangle soup in world space
///
/// Indices reference `vertices`; triangles wind counter-clockwise when
/// seen from outside the solid.
#[derive(Debug, Clone, Default)]
pub struct TriangleMesh {
    pub vertices: Vec<Vec3>,
    pub triangles: Vec<[u32; 3]>,
}

impl TriangleMesh {
    /// Shift every vertex by `offset`
    pub fn translated(mut self, offset: Vec3) -> Self {
        for v in &mut self.vertices {
            *v += offset;
        }
        self
    }

    /// Outward normal of one triangle, `+Z` for degenerate ones
    pub fn face_normal(&self, triangle: [u32; 3]) -> Vec3 {
        let [a, b, c] = triangle.map(|i| self.vertices[i as usize]);
        let normal = (b - a).cross(c - a);
        if normal.length_squared() > 0.0 {
            normal.normalize()
        } else {
            Vec3::Z
        }
    }

    /// Axis-aligned bounds, `None` for an empty mesh
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.vertices.first()?;
        let mut min = first;
        let mut max = first;
        for v in &self.vertices {
            min = min.min(*v);
            max = max.max(*v);
        }
        Some((min, max))
    }
}

/// A resolved body: qualified name plus world-space mesh
#[derive(Debug, Clone)]
pub struct BodyMesh {
    pub name: String,
    pub mesh: TriangleMesh,
}

/// Tessellate a primitive shape centered at the origin
pub fn tessellate(shape: &Shape, refinement: MeshRefinement) -> TriangleMesh {
    match shape {
        Shape::Box { size } => tessellate_box(Vec3::from(*size)),
        Shape::Cylinder { radius, height } => {
            tessellate_cylinder(*radius, *height, refinement.segments())
        }
    }
}

const BOX_TRIANGLES: [[u32; 3]; 12] = [
    [0, 2, 3],
    [0, 3, 1], // bottom
    [4, 5, 7],
    [4, 7, 6], // top
    [0, 1, 5],
    [0, 5, 4], // front
    [2, 6, 7],
    [2, 7, 3], // back
    [0, 4, 6],
    [0, 6, 2], // left
    [1, 3, 7],
    [1, 7, 5], // right
];

fn tessellate_box(size: Vec3) -> TriangleMesh {
    let h = size * 0.5;
    let vertices = (0..8)
        .map(|i| {
            Vec3::new(
                if i & 1 == 0 { -h.x } else { h.x },
                if i & 2 == 0 { -h.y } else { h.y },
                if i & 4 == 0 { -h.z } else { h.z },
            )
        })
        .collect();
    TriangleMesh {
        vertices,
        triangles: BOX_TRIANGLES.to_vec(),
    }
}

fn tessellate_cylinder(radius: f32, height: f32, segments: u32) -> TriangleMesh {
    let n = segments.max(3);
    let half = height * 0.5;

    // 0 = bottom center, 1 = top center, then the bottom and top rims
    let mut vertices = Vec::with_capacity(2 + 2 * n as usize);
    vertices.push(Vec3::new(0.0, 0.0, -half));
    vertices.push(Vec3::new(0.0, 0.0, half));
    for z in [-half, half] {
        for i in 0..n {
            let angle = i as f32 / n as f32 * std::f32::consts::TAU;
            let (sin, cos) = angle.sin_cos();
            vertices.push(Vec3::new(radius * cos, radius * sin, z));
        }
    }

    let bottom = |i: u32| 2 + (i % n);
    let top = |i: u32| 2 + n + (i % n);
    let mut triangles = Vec::with_capacity(4 * n as usize);
    for i in 0..n {
        triangles.push([0, bottom(i + 1), bottom(i)]);
        triangles.push([1, top(i), top(i + 1)]);
        triangles.push([bottom(i), bottom(i + 1), top(i + 1)]);
        triangles.push([bottom(i), top(i + 1), top(i)]);
    }
    TriangleMesh {
        vertices,
        triangles,
    }
}

/// Write a mesh as binary STL
pub fn write_stl(mesh: &TriangleMesh, path: &Path) -> Result<(), HostError> {
    let write_err = |e: &dyn std::fmt::Display| HostError::WriteError {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    let triangles: Vec<stl_io::Triangle> = mesh
        .triangles
        .iter()
        .map(|&tri| {
            let normal = mesh.face_normal(tri);
            let [a, b, c] = tri.map(|i| mesh.vertices[i as usize]);
            stl_io::Triangle {
                normal: stl_io::Normal::new(normal.to_array()),
                vertices: [
                    stl_io::Vertex::new(a.to_array()),
                    stl_io::Vertex::new(b.to_array()),
                    stl_io::Vertex::new(c.to_array()),
                ],
            }
        })
        .collect();

    let mut file = std::fs::File::create(path).map_err(|e| write_err(&e))?;
    stl_io::write_stl(&mut file, triangles.iter()).map_err(|e| write_err(&e))?;
    Ok(())
}

/// Write bodies as a Wavefront OBJ with one `o` group per body
///
/// Vertex indices are 1-based and global across groups, as the format
/// requires.
pub fn write_obj(bodies: &[BodyMesh], path: &Path) -> Result<(), HostError> {
    let mut out = String::new();
    let mut vertex_base: u32 = 1;
    for body in bodies {
        out.push_str(&format!("o {}\n", obj_group_name(&body.name)));
        for v in &body.mesh.vertices {
            out.push_str(&format!("v {} {} {}\n", v.x, v.y, v.z));
        }
        for tri in &body.mesh.triangles {
            out.push_str(&format!(
                "f {} {} {}\n",
                vertex_base + tri[0],
                vertex_base + tri[1],
                vertex_base + tri[2]
            ));
        }
        vertex_base += body.mesh.vertices.len() as u32;
    }
    std::fs::write(path, out).map_err(|e| HostError::WriteError {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Group names must not contain whitespace
fn obj_group_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join("_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufReader;
    use tempfile::tempdir;

    fn unit_box() -> TriangleMesh {
        tessellate(&Shape::Box { size: [1.0, 1.0, 1.0] }, MeshRefinement::Low)
    }

    #[test]
    fn box_tessellation_is_a_closed_cuboid() {
        let mesh = unit_box();
        assert_eq!(mesh.vertices.len(), 8);
        assert_eq!(mesh.triangles.len(), 12);
        let (min, max) = mesh.bounds().unwrap();
        assert_eq!(min, Vec3::splat(-0.5));
        assert_eq!(max, Vec3::splat(0.5));
    }

    #[test]
    fn cylinder_triangle_count_follows_refinement() {
        for refinement in [
            MeshRefinement::Low,
            MeshRefinement::Medium,
            MeshRefinement::High,
        ] {
            let mesh = tessellate(
                &Shape::Cylinder {
                    radius: 1.0,
                    height: 2.0,
                },
                refinement,
            );
            let n = refinement.segments() as usize;
            assert_eq!(mesh.triangles.len(), 4 * n);
            assert_eq!(mesh.vertices.len(), 2 + 2 * n);
        }
    }

    #[test]
    fn normals_point_away_from_the_center() {
        // Both primitives are convex and centered at the origin, so
        // every face normal must agree with its centroid direction.
        for shape in [
            Shape::Box { size: [1.0, 2.0, 3.0] },
            Shape::Cylinder {
                radius: 0.5,
                height: 2.0,
            },
        ] {
            let mesh = tessellate(&shape, MeshRefinement::Low);
            for &tri in &mesh.triangles {
                let centroid = tri
                    .iter()
                    .map(|&i| mesh.vertices[i as usize])
                    .sum::<Vec3>()
                    / 3.0;
                assert!(
                    mesh.face_normal(tri).dot(centroid) > 0.0,
                    "inward-facing triangle {:?} in {:?}",
                    tri,
                    shape
                );
            }
        }
    }

    #[test]
    fn degenerate_triangles_fall_back_to_z() {
        let mesh = TriangleMesh {
            vertices: vec![Vec3::ZERO, Vec3::ZERO, Vec3::X],
            triangles: vec![[0, 1, 2]],
        };
        assert_eq!(mesh.face_normal([0, 1, 2]), Vec3::Z);
    }

    #[test]
    fn translation_shifts_bounds() {
        let mesh = unit_box().translated(Vec3::new(10.0, 0.0, -2.0));
        let (min, max) = mesh.bounds().unwrap();
        assert_eq!(min, Vec3::new(9.5, -0.5, -2.5));
        assert_eq!(max, Vec3::new(10.5, 0.5, -1.5));
    }

    #[test]
    fn stl_round_trips_through_stl_io() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("body.stl");
        write_stl(&unit_box(), &path).unwrap();

        let file = std::fs::File::open(&path).unwrap();
        let mut reader = BufReader::new(file);
        let read = stl_io::read_stl(&mut reader).unwrap();
        assert_eq!(read.faces.len(), 12);
    }

    #[test]
    fn obj_output_groups_bodies_with_global_indices() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("design.obj");
        let bodies = vec![
            BodyMesh {
                name: "Frame Left".to_string(),
                mesh: unit_box(),
            },
            BodyMesh {
                name: "Frame_Right".to_string(),
                mesh: unit_box(),
            },
        ];
        write_obj(&bodies, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("o Frame_Left\n"));
        assert!(text.contains("\no Frame_Right\n"));
        assert_eq!(text.lines().filter(|l| l.starts_with("v ")).count(), 16);
        // second body's faces start after the first body's 8 vertices
        assert!(text.contains("f 9 "));
    }
}
