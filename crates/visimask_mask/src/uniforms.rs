//! Per-draw parameter blocks
//!
//! A plugin declares its uniforms as a list of [`UniformDecl`]s. The list is
//! laid out with WGSL uniform-buffer rules so the CPU bytes can be copied
//! straight into a GPU buffer bound as `var<uniform>`.

use std::collections::BTreeSet;

use visimask_math::{Mat4, Vec3};

/// WGSL type of one uniform member
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UniformKind {
    Float,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
}

impl UniformKind {
    /// Size in bytes
    pub const fn size(self) -> u32 {
        match self {
            UniformKind::Float => 4,
            UniformKind::Vec2 => 8,
            UniformKind::Vec3 => 12,
            UniformKind::Vec4 => 16,
            UniformKind::Mat4 => 64,
        }
    }

    /// Required alignment in bytes
    pub const fn align(self) -> u32 {
        match self {
            UniformKind::Float => 4,
            UniformKind::Vec2 => 8,
            UniformKind::Vec3 | UniformKind::Vec4 | UniformKind::Mat4 => 16,
        }
    }

    pub const fn wgsl_type(self) -> &'static str {
        match self {
            UniformKind::Float => "f32",
            UniformKind::Vec2 => "vec2<f32>",
            UniformKind::Vec3 => "vec3<f32>",
            UniformKind::Vec4 => "vec4<f32>",
            UniformKind::Mat4 => "mat4x4<f32>",
        }
    }
}

/// One named uniform
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UniformDecl {
    pub name: &'static str,
    pub kind: UniformKind,
}

impl UniformDecl {
    pub const fn new(name: &'static str, kind: UniformKind) -> Self {
        Self { name, kind }
    }
}

/// One named texture binding
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureSlot {
    pub name: &'static str,
}

impl TextureSlot {
    pub const fn new(name: &'static str) -> Self {
        Self { name }
    }
}

/// Handle to a texture owned by the rendering backend
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct LayoutEntry {
    decl: UniformDecl,
    offset: u32,
}

/// Byte offsets of a uniform struct
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UniformLayout {
    entries: Vec<LayoutEntry>,
    size: u32,
}

const fn align_to(value: u32, align: u32) -> u32 {
    value.div_ceil(align) * align
}

impl UniformLayout {
    /// Lay out `decls` in declaration order
    pub fn new(decls: &[UniformDecl]) -> Self {
        let mut entries = Vec::with_capacity(decls.len());
        let mut cursor = 0u32;
        let mut struct_align = 16u32;

        for decl in decls {
            let offset = align_to(cursor, decl.kind.align());
            entries.push(LayoutEntry { decl: *decl, offset });
            cursor = offset + decl.kind.size();
            struct_align = struct_align.max(decl.kind.align());
        }

        // Uniform buffers want a 16-byte multiple, and wgpu rejects empty bindings.
        let size = align_to(cursor.max(1), struct_align);
        Self { entries, size }
    }

    /// Total size in bytes, a multiple of 16
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Offset and kind of a named member
    pub fn get(&self, name: &str) -> Option<(u32, UniformKind)> {
        self.entries
            .iter()
            .find(|e| e.decl.name == name)
            .map(|e| (e.offset, e.decl.kind))
    }

    /// Members with their offsets, in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (UniformDecl, u32)> + '_ {
        self.entries.iter().map(|e| (e.decl, e.offset))
    }

    /// WGSL `struct` matching this layout
    pub fn wgsl_struct(&self, struct_name: &str) -> String {
        let mut out = format!("struct {} {{\n", struct_name);
        for e in &self.entries {
            out.push_str(&format!("    {}: {},\n", e.decl.name, e.decl.kind.wgsl_type()));
        }
        out.push_str("};\n");
        out
    }
}

/// Where plugins write their per-draw values
///
/// This is the draw-time half of the plugin contract: the host calls
/// [`MaterialPlugin::bind_for_draw`](crate::MaterialPlugin::bind_for_draw)
/// with a sink before each draw and uploads whatever changed.
pub trait ShaderParameterSink {
    fn set_float(&mut self, name: &str, value: f32);
    fn set_vec3(&mut self, name: &str, value: Vec3);
    fn set_mat4(&mut self, name: &str, value: &Mat4);
    /// Bind a texture, or `None` to leave the slot unbound this draw
    fn set_texture(&mut self, name: &str, texture: Option<TextureId>);
}

/// CPU-side uniform block with texture slots
#[derive(Clone, Debug)]
pub struct ParameterBlock {
    layout: UniformLayout,
    bytes: Vec<u8>,
    slots: Vec<TextureSlot>,
    textures: Vec<Option<TextureId>>,
    dirty: bool,
    textures_dirty: bool,
    unknown: BTreeSet<String>,
}

impl ParameterBlock {
    pub fn new(uniforms: &[UniformDecl], textures: &[TextureSlot]) -> Self {
        let layout = UniformLayout::new(uniforms);
        Self {
            bytes: vec![0; layout.size() as usize],
            layout,
            slots: textures.to_vec(),
            textures: vec![None; textures.len()],
            dirty: true,
            textures_dirty: true,
            unknown: BTreeSet::new(),
        }
    }

    pub fn layout(&self) -> &UniformLayout {
        &self.layout
    }

    /// Uniform bytes, ready for a buffer write
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn texture_slots(&self) -> &[TextureSlot] {
        &self.slots
    }

    /// Currently bound texture of a slot
    pub fn texture(&self, name: &str) -> Option<TextureId> {
        self.slot_index(name).and_then(|i| self.textures[i])
    }

    /// Bound textures in slot order
    pub fn textures(&self) -> &[Option<TextureId>] {
        &self.textures
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Return and clear the uniform-bytes dirty flag
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    /// Return and clear the texture-bindings dirty flag
    pub fn take_textures_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.textures_dirty, false)
    }

    /// Read back a float member
    pub fn get_float(&self, name: &str) -> Option<f32> {
        let (offset, kind) = self.layout.get(name)?;
        (kind == UniformKind::Float).then(|| self.read_f32(offset))
    }

    /// Read back a vec3 member
    pub fn get_vec3(&self, name: &str) -> Option<Vec3> {
        let (offset, kind) = self.layout.get(name)?;
        (kind == UniformKind::Vec3).then(|| {
            Vec3::new(self.read_f32(offset), self.read_f32(offset + 4), self.read_f32(offset + 8))
        })
    }

    /// Read back a mat4 member
    pub fn get_mat4(&self, name: &str) -> Option<Mat4> {
        let (offset, kind) = self.layout.get(name)?;
        if kind != UniformKind::Mat4 {
            return None;
        }
        let mut m = [[0.0f32; 4]; 4];
        for (c, column) in m.iter_mut().enumerate() {
            for (r, v) in column.iter_mut().enumerate() {
                *v = self.read_f32(offset + ((c * 4 + r) * 4) as u32);
            }
        }
        Some(m)
    }

    fn slot_index(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|s| s.name == name)
    }

    fn read_f32(&self, offset: u32) -> f32 {
        let o = offset as usize;
        f32::from_le_bytes([self.bytes[o], self.bytes[o + 1], self.bytes[o + 2], self.bytes[o + 3]])
    }

    fn write_floats(&mut self, name: &str, expected: UniformKind, values: &[f32]) {
        match self.layout.get(name) {
            Some((offset, kind)) if kind == expected => {
                let start = offset as usize;
                for (i, v) in values.iter().enumerate() {
                    let o = start + i * 4;
                    let le = v.to_le_bytes();
                    if self.bytes[o..o + 4] != le {
                        self.bytes[o..o + 4].copy_from_slice(&le);
                        self.dirty = true;
                    }
                }
            }
            Some((_, kind)) => {
                log::warn!("Uniform '{}' is {:?}, not {:?}; ignoring write", name, kind, expected);
            }
            None => self.note_unknown(name),
        }
    }

    fn note_unknown(&mut self, name: &str) {
        if self.unknown.insert(name.to_string()) {
            log::debug!("Parameter block has no member '{}'; ignoring", name);
        }
    }
}

impl ShaderParameterSink for ParameterBlock {
    fn set_float(&mut self, name: &str, value: f32) {
        self.write_floats(name, UniformKind::Float, &[value]);
    }

    fn set_vec3(&mut self, name: &str, value: Vec3) {
        self.write_floats(name, UniformKind::Vec3, &value.to_array());
    }

    fn set_mat4(&mut self, name: &str, value: &Mat4) {
        let flat: Vec<f32> = value.iter().flatten().copied().collect();
        self.write_floats(name, UniformKind::Mat4, &flat);
    }

    fn set_texture(&mut self, name: &str, texture: Option<TextureId>) {
        match self.slot_index(name) {
            Some(i) => {
                if self.textures[i] != texture {
                    self.textures[i] = texture;
                    self.textures_dirty = true;
                }
            }
            None => self.note_unknown(name),
        }
    }
}
