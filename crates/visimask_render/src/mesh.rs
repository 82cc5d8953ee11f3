//! Mesh generation and upload
//!
//! All meshes are built in local space, centered on the origin, with
//! counter-clockwise front faces and bottom-left UV origin.

use std::f32::consts::{PI, TAU};

use bytemuck::{Pod, Zeroable};
use visimask_core::MeshTemplate;
use visimask_math::Vec3;
use wgpu::util::DeviceExt;

/// GPU vertex: position, normal, uv (32 bytes)
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3, uv: [f32; 2]) -> Self {
        Self { position: position.into(), normal: normal.into(), uv }
    }

    /// Vertex buffer layout matching the shaders' @location(0..3) inputs
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
            0 => Float32x3,
            1 => Float32x3,
            2 => Float32x2,
        ];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

/// CPU-side indexed triangle list
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn from_template(template: &MeshTemplate) -> Self {
        match *template {
            MeshTemplate::Box { size } => Self::cube(size),
            MeshTemplate::Sphere { diameter, segments } => Self::sphere(diameter, segments),
            MeshTemplate::Ground { width, depth, uv_scale } => Self::ground(width, depth, uv_scale),
            MeshTemplate::Capsule { height, radius, segments } => Self::capsule(height, radius, segments),
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Axis-aligned cube with side `size`, one quad per face
    pub fn cube(size: f32) -> Self {
        let h = size * 0.5;
        // (normal, right, up) with right x up = normal
        let faces = [
            (Vec3::Z, Vec3::X, Vec3::Y),
            (-Vec3::Z, -Vec3::X, Vec3::Y),
            (Vec3::X, -Vec3::Z, Vec3::Y),
            (-Vec3::X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, -Vec3::Z),
            (-Vec3::Y, Vec3::X, Vec3::Z),
        ];

        let mut mesh = Self::default();
        for (normal, right, up) in faces {
            let center = normal * h;
            let base = mesh.vertices.len() as u32;
            let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];
            for (sx, sy) in corners {
                let p = center + right * (sx * h) + up * (sy * h);
                let uv = [(sx + 1.0) * 0.5, (sy + 1.0) * 0.5];
                mesh.vertices.push(Vertex::new(p, normal, uv));
            }
            mesh.push_quad(base, base + 1, base + 2, base + 3);
        }
        mesh
    }

    /// UV sphere; `segments` around, half as many rings top to bottom
    pub fn sphere(diameter: f32, segments: u32) -> Self {
        let radius = diameter * 0.5;
        let segments = segments.max(3);
        let rings = (segments / 2).max(2);

        let mut mesh = Self::default();
        for i in 0..=rings {
            let theta = PI * i as f32 / rings as f32;
            mesh.push_ring(segments, theta, radius, 0.0, 1.0 - i as f32 / rings as f32);
        }
        mesh.stitch_rows(rings + 1, segments);
        mesh
    }

    /// Flat rectangle in XZ facing +Y; UVs repeat `uv_scale` times
    pub fn ground(width: f32, depth: f32, uv_scale: f32) -> Self {
        let hx = width * 0.5;
        let hz = depth * 0.5;
        let s = uv_scale;
        let mut mesh = Self::default();
        mesh.vertices = vec![
            Vertex::new(Vec3::new(-hx, 0.0, hz), Vec3::Y, [0.0, 0.0]),
            Vertex::new(Vec3::new(hx, 0.0, hz), Vec3::Y, [s, 0.0]),
            Vertex::new(Vec3::new(hx, 0.0, -hz), Vec3::Y, [s, s]),
            Vertex::new(Vec3::new(-hx, 0.0, -hz), Vec3::Y, [0.0, s]),
        ];
        mesh.push_quad(0, 1, 2, 3);
        mesh
    }

    /// Upright capsule of total `height`; two hemispheres joined by a cylinder
    pub fn capsule(height: f32, radius: f32, segments: u32) -> Self {
        let segments = segments.max(3);
        let half_rings = (segments / 4).max(1);
        let half_cylinder = (height * 0.5 - radius).max(0.0);
        let total = 2.0 * (half_cylinder + radius);

        let mut mesh = Self::default();
        let mut rows = 0;
        // Top hemisphere down to the equator, then the equator again lowered
        for i in 0..=half_rings {
            let theta = 0.5 * PI * i as f32 / half_rings as f32;
            let y = half_cylinder + radius * theta.cos();
            mesh.push_ring(segments, theta, radius, half_cylinder, (y + total * 0.5) / total);
            rows += 1;
        }
        for i in half_rings..=2 * half_rings {
            let theta = 0.5 * PI * i as f32 / half_rings as f32;
            let y = -half_cylinder + radius * theta.cos();
            mesh.push_ring(segments, theta, radius, -half_cylinder, (y + total * 0.5) / total);
            rows += 1;
        }
        mesh.stitch_rows(rows, segments);
        mesh
    }

    /// One latitude row of `segments + 1` vertices (the seam is duplicated)
    fn push_ring(&mut self, segments: u32, theta: f32, radius: f32, y_offset: f32, v: f32) {
        let (st, ct) = theta.sin_cos();
        for j in 0..=segments {
            let phi = TAU * j as f32 / segments as f32;
            let (sp, cp) = phi.sin_cos();
            let normal = Vec3::new(st * cp, ct, st * sp);
            let position = normal * radius + Vec3::new(0.0, y_offset, 0.0);
            self.vertices.push(Vertex::new(position, normal, [j as f32 / segments as f32, v]));
        }
    }

    /// Triangulate consecutive rows pushed by `push_ring`
    fn stitch_rows(&mut self, rows: u32, segments: u32) {
        let stride = segments + 1;
        for i in 0..rows.saturating_sub(1) {
            for j in 0..segments {
                let a = i * stride + j;
                let b = (i + 1) * stride + j;
                self.indices.extend_from_slice(&[a, a + 1, b, a + 1, b + 1, b]);
            }
        }
    }

    fn push_quad(&mut self, a: u32, b: u32, c: u32, d: u32) {
        self.indices.extend_from_slice(&[a, b, c, a, c, d]);
    }
}

/// Mesh uploaded to vertex and index buffers
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl GpuMesh {
    pub fn upload(device: &wgpu::Device, mesh: &MeshData, label: &str) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertices", label)),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Indices", label)),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self { vertex_buffer, index_buffer, index_count: mesh.indices.len() as u32 }
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    fn pos(v: &Vertex) -> Vec3 {
        Vec3::from(v.position)
    }

    /// Every non-degenerate triangle faces the same way as its vertex normals
    fn assert_outward_winding(mesh: &MeshData) {
        for tri in mesh.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| &mesh.vertices[i as usize]);
            let face = (pos(b) - pos(a)).cross(pos(c) - pos(a));
            if face.length() < 1e-6 {
                continue;
            }
            let normal = Vec3::from(a.normal) + Vec3::from(b.normal) + Vec3::from(c.normal);
            assert!(face.dot(normal) > 0.0, "triangle {:?} winds inward", tri);
        }
    }

    fn assert_valid(mesh: &MeshData) {
        assert_eq!(mesh.indices.len() % 3, 0);
        for &i in &mesh.indices {
            assert!((i as usize) < mesh.vertices.len());
        }
        for v in &mesh.vertices {
            assert!((Vec3::from(v.normal).length() - 1.0).abs() < EPSILON);
        }
    }

    #[test]
    fn test_vertex_size() {
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
        assert_eq!(Vertex::layout().array_stride, 32);
    }

    #[test]
    fn test_cube() {
        let mesh = MeshData::cube(2.0);
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.triangle_count(), 12);
        assert_valid(&mesh);
        assert_outward_winding(&mesh);
        for v in &mesh.vertices {
            let p = pos(v);
            assert!((p.x.abs().max(p.y.abs()).max(p.z.abs()) - 1.0).abs() < EPSILON);
        }
    }

    #[test]
    fn test_sphere() {
        let mesh = MeshData::sphere(20.0, 16);
        assert_valid(&mesh);
        assert_outward_winding(&mesh);
        for v in &mesh.vertices {
            assert!((pos(v).length() - 10.0).abs() < 1e-3);
        }
        // Top of the sphere sits at the top of the texture
        assert_eq!(mesh.vertices[0].uv[1], 1.0);
    }

    #[test]
    fn test_ground_uv_tiling() {
        let mesh = MeshData::ground(10.0, 4.0, 3.0);
        assert_valid(&mesh);
        assert_outward_winding(&mesh);
        let max_u = mesh.vertices.iter().map(|v| v.uv[0]).fold(0.0, f32::max);
        assert_eq!(max_u, 3.0);
        assert!(mesh.vertices.iter().all(|v| v.position[1] == 0.0));
    }

    #[test]
    fn test_capsule_extents() {
        let mesh = MeshData::capsule(2.0, 0.5, 16);
        assert_valid(&mesh);
        assert_outward_winding(&mesh);
        let max_y = mesh.vertices.iter().map(|v| v.position[1]).fold(f32::MIN, f32::max);
        let min_y = mesh.vertices.iter().map(|v| v.position[1]).fold(f32::MAX, f32::min);
        assert!((max_y - 1.0).abs() < EPSILON);
        assert!((min_y + 1.0).abs() < EPSILON);
        for v in &mesh.vertices {
            assert!((0.0..=1.0).contains(&v.uv[1]));
        }
    }

    #[test]
    fn test_from_template() {
        let mesh = MeshData::from_template(&MeshTemplate::cube(1.0));
        assert_eq!(mesh.vertices.len(), 24);
    }
}
