//! Uniform Declaration & Upload
//!
//! [`UniformHandler`] is used during emission: every FP declares its uniforms
//! by name and gets back a handle. Names are mangled with the FP's stage
//! suffix so two instances of the same effect never collide. All uniforms of a
//! program share one block at `@group(0) @binding(0)`, laid out with WGSL
//! uniform-address-space alignment.
//!
//! [`UniformDataManager`] is the matching per-draw CPU buffer.

use std::fmt::Write as _;

use bitflags::bitflags;
use serde::Serialize;

use crate::gpu::swizzle::Swizzle;

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct ShaderVisibility: u32 {
        const VERTEX   = 1 << 0;
        const FRAGMENT = 1 << 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformType {
    Float,
    Float2,
    Float3,
    Float4,
}

impl UniformType {
    #[must_use]
    pub fn wgsl_name(self) -> &'static str {
        match self {
            Self::Float => "f32",
            Self::Float2 => "vec2<f32>",
            Self::Float3 => "vec3<f32>",
            Self::Float4 => "vec4<f32>",
        }
    }

    #[must_use]
    pub fn size(self) -> u32 {
        match self {
            Self::Float => 4,
            Self::Float2 => 8,
            Self::Float3 => 12,
            Self::Float4 => 16,
        }
    }

    #[must_use]
    pub fn align(self) -> u32 {
        match self {
            Self::Float => 4,
            Self::Float2 => 8,
            Self::Float3 | Self::Float4 => 16,
        }
    }

    #[must_use]
    pub fn component_count(self) -> usize {
        (self.size() / 4) as usize
    }
}

#[inline]
fn align_to(offset: u32, align: u32) -> u32 {
    offset.div_ceil(align) * align
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformHandle(u32);

impl UniformHandle {
    #[inline]
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SamplerHandle(u32);

impl SamplerHandle {
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UniformInfo {
    pub name: String,
    #[serde(serialize_with = "serialize_wgsl_type")]
    pub ty: UniformType,
    #[serde(skip)]
    pub visibility: ShaderVisibility,
    pub offset: u32,
    /// Name of the FP class that declared it.
    #[serde(skip)]
    pub owner: &'static str,
}

fn serialize_wgsl_type<S: serde::Serializer>(ty: &UniformType, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(ty.wgsl_name())
}

#[derive(Debug, Clone, Serialize)]
pub struct SamplerInfo {
    pub texture_name: String,
    pub sampler_name: String,
    pub texture_binding: u32,
    pub sampler_binding: u32,
    #[serde(skip)]
    pub swizzle: Swizzle,
}

#[derive(Debug, Default)]
pub struct UniformHandler {
    uniforms: Vec<UniformInfo>,
    samplers: Vec<SamplerInfo>,
    current_offset: u32,
    stage_suffix: String,
}

impl UniformHandler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the suffix appended to names declared by the next FP.
    pub(crate) fn enter_stage(&mut self, stage_index: usize) {
        self.stage_suffix.clear();
        let _ = write!(self.stage_suffix, "_S{stage_index}");
    }

    pub fn add_uniform(
        &mut self,
        owner: &'static str,
        visibility: ShaderVisibility,
        ty: UniformType,
        name: &str,
    ) -> UniformHandle {
        let offset = align_to(self.current_offset, ty.align());
        self.current_offset = offset + ty.size();

        let handle = UniformHandle(self.uniforms.len() as u32);
        self.uniforms.push(UniformInfo {
            name: format!("{name}{}", self.stage_suffix),
            ty,
            visibility,
            offset,
            owner,
        });
        handle
    }

    /// Declares a texture + sampler pair in `@group(1)`.
    pub fn add_sampler(&mut self, swizzle: Swizzle, name: &str) -> SamplerHandle {
        let index = self.samplers.len() as u32;
        self.samplers.push(SamplerInfo {
            texture_name: format!("{name}{}", self.stage_suffix),
            sampler_name: format!("{name}_sampler{}", self.stage_suffix),
            texture_binding: index * 2,
            sampler_binding: index * 2 + 1,
            swizzle,
        });
        SamplerHandle(index)
    }

    /// Expression that reads `handle` inside shader code.
    #[must_use]
    pub fn uniform_var(&self, handle: UniformHandle) -> String {
        format!("_uniforms.{}", self.uniforms[handle.index()].name)
    }

    #[must_use]
    pub fn sampler_info(&self, handle: SamplerHandle) -> &SamplerInfo {
        &self.samplers[handle.index()]
    }

    #[must_use]
    pub fn uniforms(&self) -> &[UniformInfo] {
        &self.uniforms
    }

    #[must_use]
    pub fn samplers(&self) -> &[SamplerInfo] {
        &self.samplers
    }

    /// Size of the uniform block, rounded up to its 16-byte alignment.
    #[must_use]
    pub fn block_size(&self) -> u32 {
        align_to(self.current_offset, 16)
    }
}

// ─── Per-draw Data ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct Slot {
    offset: usize,
    ty: UniformType,
}

/// CPU copy of a program's uniform block.
#[derive(Debug, Clone)]
pub struct UniformDataManager {
    slots: Vec<Slot>,
    data: Vec<f32>,
    write_counts: Vec<u32>,
    dirty: bool,
}

impl UniformDataManager {
    #[must_use]
    pub fn new(handler: &UniformHandler) -> Self {
        let slots = handler
            .uniforms()
            .iter()
            .map(|u| Slot {
                offset: (u.offset / 4) as usize,
                ty: u.ty,
            })
            .collect::<Vec<_>>();
        Self {
            write_counts: vec![0; slots.len()],
            slots,
            data: vec![0.0; (handler.block_size() / 4) as usize],
            dirty: false,
        }
    }

    fn write(&mut self, handle: UniformHandle, values: &[f32]) {
        let slot = self.slots[handle.index()];
        debug_assert_eq!(
            slot.ty.component_count(),
            values.len(),
            "uniform type mismatch"
        );
        self.data[slot.offset..slot.offset + values.len()].copy_from_slice(values);
        self.write_counts[handle.index()] += 1;
        self.dirty = true;
    }

    pub fn set1f(&mut self, handle: UniformHandle, v: f32) {
        self.write(handle, &[v]);
    }

    pub fn set2f(&mut self, handle: UniformHandle, x: f32, y: f32) {
        self.write(handle, &[x, y]);
    }

    pub fn set4f(&mut self, handle: UniformHandle, x: f32, y: f32, z: f32, w: f32) {
        self.write(handle, &[x, y, z, w]);
    }

    /// Current value of a uniform's components.
    #[must_use]
    pub fn get(&self, handle: UniformHandle) -> &[f32] {
        let slot = self.slots[handle.index()];
        &self.data[slot.offset..slot.offset + slot.ty.component_count()]
    }

    /// How many times `handle` has been written since creation.
    #[must_use]
    pub fn write_count(&self, handle: UniformHandle) -> u32 {
        self.write_counts[handle.index()]
    }

    #[inline]
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns the block bytes if anything changed since the last call.
    pub fn take_dirty_bytes(&mut self) -> Option<&[u8]> {
        if !std::mem::take(&mut self.dirty) {
            return None;
        }
        Some(bytemuck::cast_slice(&self.data))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }
}
