//! Preview image rendering
//!
//! A tiny orthographic software rasterizer: fixed three-quarter view,
//! flat shading, transparent background. Enough to tell designs apart
//! in a file browser, nothing more.

use glam::{Vec2, Vec3};
use image::{ImageFormat, Rgba, RgbaImage};
use std::path::Path;

use crate::host::mesh::BodyMesh;
use crate::host::HostError;

/// Default preview edge length in pixels
pub const DEFAULT_PREVIEW_SIZE: u32 = 400;

/// Smallest preview edge the renderer accepts
pub const MIN_PREVIEW_SIZE: u32 = 16;

/// Largest preview edge the renderer accepts
pub const MAX_PREVIEW_SIZE: u32 = 4096;

/// Fraction of each viewport edge kept clear around the model
const MARGIN: f32 = 0.1;

/// Body fill colors, cycled by body index
const PALETTE: [[u8; 3]; 5] = [
    [93, 138, 190],
    [196, 148, 90],
    [122, 168, 116],
    [168, 120, 160],
    [148, 148, 148],
];

/// Render bodies to a transparent PNG at `dest`
///
/// An empty design produces a fully transparent image rather than an
/// error; a blank thumbnail is still a valid snapshot.
pub fn render(
    bodies: &[BodyMesh],
    dest: &Path,
    width: u32,
    height: u32,
) -> Result<(), HostError> {
    let mut img = RgbaImage::new(width, height);

    // Fixed three-quarter view with Z up
    let view = Vec3::new(-1.0, -1.0, -1.0).normalize();
    let right = view.cross(Vec3::Z).normalize();
    let up = right.cross(view);
    let light = Vec3::new(0.35, -0.45, 0.82).normalize();

    // Project once: screen-plane position plus depth along the view ray
    let projected: Vec<Vec<(Vec2, f32)>> = bodies
        .iter()
        .map(|body| {
            body.mesh
                .vertices
                .iter()
                .map(|&v| (Vec2::new(v.dot(right), v.dot(up)), v.dot(view)))
                .collect()
        })
        .collect();

    if let Some(to_screen) = fit_viewport(&projected, width, height) {
        let mut zbuf = vec![f32::INFINITY; (width * height) as usize];
        for (bi, body) in bodies.iter().enumerate() {
            let color = PALETTE[bi % PALETTE.len()];
            let verts = &projected[bi];
            for &tri in &body.mesh.triangles {
                let normal = body.mesh.face_normal(tri);
                let shade = 0.3 + 0.7 * normal.dot(light).abs();
                let shaded = Rgba([
                    (color[0] as f32 * shade) as u8,
                    (color[1] as f32 * shade) as u8,
                    (color[2] as f32 * shade) as u8,
                    255,
                ]);
                let [a, b, c] = tri.map(|i| verts[i as usize]);
                fill_triangle(
                    &mut img,
                    &mut zbuf,
                    [to_screen(a.0), to_screen(b.0), to_screen(c.0)],
                    [a.1, b.1, c.1],
                    shaded,
                );
            }
        }
    }

    img.save_with_format(dest, ImageFormat::Png)
        .map_err(|e| HostError::EncodeError {
            path: dest.to_path_buf(),
            reason: e.to_string(),
        })
}

/// Scale-to-fit mapping from projected coordinates to pixels
///
/// `None` when there is nothing to draw.
fn fit_viewport(
    projected: &[Vec<(Vec2, f32)>],
    width: u32,
    height: u32,
) -> Option<impl Fn(Vec2) -> Vec2> {
    let mut points = projected.iter().flatten().map(|(p, _)| *p);
    let first = points.next()?;
    let (mut min, mut max) = (first, first);
    for p in points {
        min = min.min(p);
        max = max.max(p);
    }

    let extent = max - min;
    let usable = Vec2::new(width as f32, height as f32) * (1.0 - 2.0 * MARGIN);
    let scale_x = if extent.x > 0.0 { usable.x / extent.x } else { f32::INFINITY };
    let scale_y = if extent.y > 0.0 { usable.y / extent.y } else { f32::INFINITY };
    let mut scale = scale_x.min(scale_y);
    if !scale.is_finite() {
        // the whole model projects to a single point
        scale = 1.0;
    }

    let center = (min + max) * 0.5;
    let screen_center = Vec2::new(width as f32, height as f32) * 0.5;
    Some(move |p: Vec2| {
        let d = (p - center) * scale;
        Vec2::new(screen_center.x + d.x, screen_center.y - d.y)
    })
}

fn edge(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (b - a).perp_dot(c - a)
}

fn fill_triangle(
    img: &mut RgbaImage,
    zbuf: &mut [f32],
    corners: [Vec2; 3],
    depths: [f32; 3],
    color: Rgba<u8>,
) {
    let [a, b, c] = corners;
    let area = edge(a, b, c);
    if area.abs() < f32::EPSILON {
        return;
    }

    let (width, height) = img.dimensions();
    let raw_min_x = a.x.min(b.x).min(c.x);
    let raw_max_x = a.x.max(b.x).max(c.x);
    let raw_min_y = a.y.min(b.y).min(c.y);
    let raw_max_y = a.y.max(b.y).max(c.y);
    if raw_max_x < 0.0
        || raw_max_y < 0.0
        || raw_min_x >= width as f32
        || raw_min_y >= height as f32
    {
        return;
    }

    let min_x = raw_min_x.floor().max(0.0) as u32;
    let max_x = raw_max_x.ceil().min(width as f32 - 1.0) as u32;
    let min_y = raw_min_y.floor().max(0.0) as u32;
    let max_y = raw_max_y.ceil().min(height as f32 - 1.0) as u32;

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            let w0 = edge(b, c, p);
            let w1 = edge(c, a, p);
            let w2 = edge(a, b, p);
            let inside = (w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0)
                || (w0 <= 0.0 && w1 <= 0.0 && w2 <= 0.0);
            if !inside {
                continue;
            }
            let depth =
                (w0 * depths[0] + w1 * depths[1] + w2 * depths[2]) / area;
            let idx = (y * width + x) as usize;
            if depth < zbuf[idx] {
                zbuf[idx] = depth;
                img.put_pixel(x, y, color);
            }
        }
    }
}
