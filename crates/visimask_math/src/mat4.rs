//! 4x4 matrix utilities
//!
//! Matrices are column-major (`m[column][row]`) so they can be uploaded to WGSL
//! `mat4x4<f32>` uniforms without transposing. Projections use the OpenGL
//! convention: view space is right-handed looking down -Z and NDC z spans
//! [-1, 1].

use crate::{Vec3, Vec4};

/// 4x4 matrix type (column-major)
pub type Mat4 = [[f32; 4]; 4];

/// Identity matrix
pub const IDENTITY: Mat4 = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// Create a rotation matrix in the plane spanned by axes `p1` and `p2`
///
/// Rotates `p1` toward `p2` by `angle` radians (0=X, 1=Y, 2=Z).
pub fn plane_rotation(angle: f32, p1: usize, p2: usize) -> Mat4 {
    let cs = angle.cos();
    let sn = angle.sin();

    let mut m = IDENTITY;
    m[p1][p1] = cs;
    m[p2][p2] = cs;
    m[p1][p2] = sn;
    m[p2][p1] = -sn;
    m
}

/// Rotation about the X axis (right-handed)
pub fn rotation_x(angle: f32) -> Mat4 {
    plane_rotation(angle, 1, 2)
}

/// Rotation about the Y axis (right-handed)
pub fn rotation_y(angle: f32) -> Mat4 {
    plane_rotation(angle, 2, 0)
}

/// Rotation about the Z axis (right-handed)
pub fn rotation_z(angle: f32) -> Mat4 {
    plane_rotation(angle, 0, 1)
}

/// Translation matrix
pub fn translation(t: Vec3) -> Mat4 {
    let mut m = IDENTITY;
    m[3][0] = t.x;
    m[3][1] = t.y;
    m[3][2] = t.z;
    m
}

/// Non-uniform scale matrix
pub fn scaling(s: Vec3) -> Mat4 {
    let mut m = IDENTITY;
    m[0][0] = s.x;
    m[1][1] = s.y;
    m[2][2] = s.z;
    m
}

/// Model matrix from translation, Euler rotation and scale
///
/// Rotation is applied Z first, then X, then Y (roll, pitch, yaw).
pub fn from_trs(position: Vec3, rotation: Vec3, scale: Vec3) -> Mat4 {
    let r = mul(rotation_y(rotation.y), mul(rotation_x(rotation.x), rotation_z(rotation.z)));
    mul(translation(position), mul(r, scaling(scale)))
}

/// Multiply two 4x4 matrices: result = a * b
///
/// In column-major convention, this applies b first, then a.
#[allow(clippy::needless_range_loop)]
pub fn mul(a: Mat4, b: Mat4) -> Mat4 {
    let mut result = [[0.0f32; 4]; 4];

    for i in 0..4 {
        for j in 0..4 {
            for k in 0..4 {
                result[i][j] += a[k][j] * b[i][k];
            }
        }
    }

    result
}

/// Transform a Vec4 by a 4x4 matrix: result = M * v
pub fn transform(m: &Mat4, v: Vec4) -> Vec4 {
    Vec4::new(
        m[0][0] * v.x + m[1][0] * v.y + m[2][0] * v.z + m[3][0] * v.w,
        m[0][1] * v.x + m[1][1] * v.y + m[2][1] * v.z + m[3][1] * v.w,
        m[0][2] * v.x + m[1][2] * v.y + m[2][2] * v.z + m[3][2] * v.w,
        m[0][3] * v.x + m[1][3] * v.y + m[2][3] * v.z + m[3][3] * v.w,
    )
}

/// Transform a point (w = 1), keeping the homogeneous result
pub fn transform_point(m: &Mat4, p: Vec3) -> Vec4 {
    transform(m, Vec4::point(p))
}

/// Transform a direction (w = 0)
pub fn transform_direction(m: &Mat4, d: Vec3) -> Vec3 {
    transform(m, Vec4::direction(d)).xyz()
}

/// Transpose a matrix
pub fn transpose(m: Mat4) -> Mat4 {
    [
        [m[0][0], m[1][0], m[2][0], m[3][0]],
        [m[0][1], m[1][1], m[2][1], m[3][1]],
        [m[0][2], m[1][2], m[2][2], m[3][2]],
        [m[0][3], m[1][3], m[2][3], m[3][3]],
    ]
}

/// Perspective projection matrix (OpenGL clip convention)
pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    let f = 1.0 / (fov_y / 2.0).tan();
    let nf = 1.0 / (near - far);

    [
        [f / aspect, 0.0, 0.0, 0.0],
        [0.0, f, 0.0, 0.0],
        [0.0, 0.0, (far + near) * nf, -1.0],
        [0.0, 0.0, 2.0 * far * near * nf, 0.0],
    ]
}

/// Right-handed look-at view matrix
pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
    let f = (target - eye).normalized();
    let mut s = f.cross(up).normalized();
    if s == Vec3::ZERO {
        // Looking straight along `up`; any perpendicular works.
        s = f.cross(Vec3::Z).normalized();
    }
    let u = s.cross(f);

    [
        [s.x, u.x, -f.x, 0.0],
        [s.y, u.y, -f.y, 0.0],
        [s.z, u.z, -f.z, 0.0],
        [-s.dot(eye), -u.dot(eye), f.dot(eye), 1.0],
    ]
}

/// Inverse-transpose of the upper 3x3 block, for transforming normals
///
/// Returns the matrix unchanged if the block is singular.
pub fn normal_matrix(m: &Mat4) -> Mat4 {
    // Row-major view of the upper 3x3 block
    let a = |r: usize, c: usize| m[c][r];
    let cofactor = |r: usize, c: usize| {
        a((r + 1) % 3, (c + 1) % 3) * a((r + 2) % 3, (c + 2) % 3)
            - a((r + 1) % 3, (c + 2) % 3) * a((r + 2) % 3, (c + 1) % 3)
    };

    let det = a(0, 0) * cofactor(0, 0) + a(0, 1) * cofactor(0, 1) + a(0, 2) * cofactor(0, 2);
    if det.abs() < f32::EPSILON {
        return *m;
    }

    // The inverse-transpose is the cofactor matrix over the determinant.
    let mut out = IDENTITY;
    for r in 0..3 {
        for c in 0..3 {
            out[c][r] = cofactor(r, c) / det;
        }
    }
    out
}
