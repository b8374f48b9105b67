//! The four demo shapes.
//!
//! Vertex generation is CPU-side and pure (clip-space `vec3 position` at
//! attribute location 0) so it can be unit-tested; GL upload happens once at
//! startup and the meshes are static for the life of the app: a centered
//! rectangle at 80% of the viewport, a triangle, a 100-segment circle fan,
//! and a 12-segment UV sphere.

use glow::HasContext;
use serde::Deserialize;

pub const CIRCLE_SEGMENTS: usize = 100;
pub const SPHERE_SEGMENTS: usize = 12;
const SHAPE_EXTENT: f32 = 0.8;

/// Which shape the loaded shader is applied to. Cycled with the `m` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawMode {
    Rect,
    Triangle,
    Circle,
    Sphere,
}

impl Default for DrawMode {
    fn default() -> Self {
        DrawMode::Rect
    }
}

impl DrawMode {
    pub fn next(self) -> Self {
        match self {
            DrawMode::Rect => DrawMode::Triangle,
            DrawMode::Triangle => DrawMode::Circle,
            DrawMode::Circle => DrawMode::Sphere,
            DrawMode::Sphere => DrawMode::Rect,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DrawMode::Rect => "rect",
            DrawMode::Triangle => "triangle",
            DrawMode::Circle => "circle",
            DrawMode::Sphere => "sphere",
        }
    }
}

/// Centered quad covering 80% of the viewport, as two triangles.
pub fn rect_vertices() -> Vec<f32> {
    let e = SHAPE_EXTENT;
    #[rustfmt::skip]
    let v = vec![
        -e, -e, 0.0,   e, -e, 0.0,   e,  e, 0.0,
        -e, -e, 0.0,   e,  e, 0.0,  -e,  e, 0.0,
    ];
    v
}

/// Isoceles triangle: apex high center, base corners low.
pub fn triangle_vertices() -> Vec<f32> {
    #[rustfmt::skip]
    let v = vec![
         0.0,   0.75, 0.0,
        -0.75, -0.75, 0.0,
         0.75, -0.75, 0.0,
    ];
    v
}

/// Triangle fan: center vertex plus a closed ring of `segments + 1` points.
pub fn circle_vertices(segments: usize) -> Vec<f32> {
    let mut v = Vec::with_capacity((segments + 2) * 3);
    v.extend_from_slice(&[0.0, 0.0, 0.0]);
    for i in 0..=segments {
        let a = (i as f32 / segments as f32) * std::f32::consts::TAU;
        v.extend_from_slice(&[SHAPE_EXTENT * a.cos(), SHAPE_EXTENT * a.sin(), 0.0]);
    }
    v
}

/// UV sphere: `(rings + 1) * (sectors + 1)` vertices, indexed triangles.
pub fn sphere_vertices(segments: usize) -> (Vec<f32>, Vec<u16>) {
    let rings = segments;
    let sectors = segments;

    let mut vertices = Vec::with_capacity((rings + 1) * (sectors + 1) * 3);
    for r in 0..=rings {
        let phi = std::f32::consts::PI * (r as f32 / rings as f32);
        for s in 0..=sectors {
            let theta = std::f32::consts::TAU * (s as f32 / sectors as f32);
            vertices.push(SHAPE_EXTENT * phi.sin() * theta.cos());
            vertices.push(SHAPE_EXTENT * phi.cos());
            vertices.push(SHAPE_EXTENT * phi.sin() * theta.sin());
        }
    }

    let row = (sectors + 1) as u16;
    let mut indices = Vec::with_capacity(rings * sectors * 6);
    for r in 0..rings as u16 {
        for s in 0..sectors as u16 {
            let a = r * row + s;
            let b = a + row;
            indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
        }
    }

    (vertices, indices)
}

#[derive(Debug)]
pub struct Mesh {
    vao: glow::NativeVertexArray,
    count: i32,
    primitive: u32,
    indexed: bool,
}

impl Mesh {
    pub fn draw(&self, gl: &glow::Context) {
        unsafe {
            gl.bind_vertex_array(Some(self.vao));
            if self.indexed {
                gl.draw_elements(self.primitive, self.count, glow::UNSIGNED_SHORT, 0);
            } else {
                gl.draw_arrays(self.primitive, 0, self.count);
            }
            gl.bind_vertex_array(None);
        }
    }
}

unsafe fn upload(
    gl: &glow::Context,
    vertices: &[f32],
    indices: Option<&[u16]>,
    primitive: u32,
) -> Mesh {
    let vao = gl.create_vertex_array().expect("create_vertex_array failed");
    gl.bind_vertex_array(Some(vao));

    let vbo = gl.create_buffer().expect("create_buffer failed");
    gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
    let bytes =
        core::slice::from_raw_parts(vertices.as_ptr() as *const u8, std::mem::size_of_val(vertices));
    gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, bytes, glow::STATIC_DRAW);

    gl.vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, 3 * 4, 0);
    gl.enable_vertex_attrib_array(0);

    let (count, indexed) = match indices {
        Some(idx) => {
            let ebo = gl.create_buffer().expect("create_buffer failed");
            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ebo));
            let idx_bytes =
                core::slice::from_raw_parts(idx.as_ptr() as *const u8, std::mem::size_of_val(idx));
            gl.buffer_data_u8_slice(glow::ELEMENT_ARRAY_BUFFER, idx_bytes, glow::STATIC_DRAW);
            (idx.len() as i32, true)
        }
        None => ((vertices.len() / 3) as i32, false),
    };

    gl.bind_vertex_array(None);
    gl.bind_buffer(glow::ARRAY_BUFFER, None);
    gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, None);

    Mesh { vao, count, primitive, indexed }
}

/// All four meshes, uploaded once at startup.
#[derive(Debug)]
pub struct ShapeSet {
    rect: Mesh,
    triangle: Mesh,
    circle: Mesh,
    sphere: Mesh,
}

impl ShapeSet {
    pub fn create(gl: &glow::Context) -> Self {
        let (sphere_verts, sphere_idx) = sphere_vertices(SPHERE_SEGMENTS);
        unsafe {
            Self {
                rect: upload(gl, &rect_vertices(), None, glow::TRIANGLES),
                triangle: upload(gl, &triangle_vertices(), None, glow::TRIANGLES),
                circle: upload(gl, &circle_vertices(CIRCLE_SEGMENTS), None, glow::TRIANGLE_FAN),
                sphere: upload(gl, &sphere_verts, Some(&sphere_idx), glow::TRIANGLES),
            }
        }
    }

    pub fn mesh(&self, mode: DrawMode) -> &Mesh {
        match mode {
            DrawMode::Rect => &self.rect,
            DrawMode::Triangle => &self.triangle,
            DrawMode::Circle => &self.circle,
            DrawMode::Sphere => &self.sphere,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_is_two_triangles() {
        let v = rect_vertices();
        assert_eq!(v.len(), 6 * 3);
        // All corners sit on the 80% extent.
        for c in v.chunks(3) {
            assert!((c[0].abs() - SHAPE_EXTENT).abs() < 1e-6);
            assert!((c[1].abs() - SHAPE_EXTENT).abs() < 1e-6);
            assert_eq!(c[2], 0.0);
        }
    }

    #[test]
    fn triangle_has_three_vertices() {
        assert_eq!(triangle_vertices().len(), 3 * 3);
    }

    #[test]
    fn circle_fan_closes() {
        let v = circle_vertices(CIRCLE_SEGMENTS);
        assert_eq!(v.len(), (CIRCLE_SEGMENTS + 2) * 3);
        // Fan center first.
        assert_eq!(&v[0..3], &[0.0, 0.0, 0.0]);
        // Ring start and end coincide.
        let first = &v[3..6];
        let last = &v[v.len() - 3..];
        assert!((first[0] - last[0]).abs() < 1e-4);
        assert!((first[1] - last[1]).abs() < 1e-4);
    }

    #[test]
    fn sphere_indices_are_in_bounds_and_on_surface() {
        let (v, idx) = sphere_vertices(SPHERE_SEGMENTS);
        let vertex_count = v.len() / 3;
        assert_eq!(vertex_count, (SPHERE_SEGMENTS + 1) * (SPHERE_SEGMENTS + 1));
        assert_eq!(idx.len(), SPHERE_SEGMENTS * SPHERE_SEGMENTS * 6);
        assert!(idx.iter().all(|&i| (i as usize) < vertex_count));
        for p in v.chunks(3) {
            let norm = (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt();
            assert!((norm - SHAPE_EXTENT).abs() < 1e-4);
        }
    }

    #[test]
    fn mode_cycle_visits_all_four() {
        let mut m = DrawMode::Rect;
        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(m.label());
            m = m.next();
        }
        assert_eq!(seen, vec!["rect", "triangle", "circle", "sphere"]);
        assert_eq!(m, DrawMode::Rect);
    }
}
