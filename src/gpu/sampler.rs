//! Sampler state carried by texture effects.
//!
//! Filtering and wrap modes live here rather than in program keys; the same
//! program serves every sampler configuration.

/// Texel filtering within a mip level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Filter {
    #[default]
    Nearest,
    Linear,
}

/// Filtering between mip levels. `None` samples the base level only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MipmapMode {
    #[default]
    None,
    Nearest,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WrapMode {
    #[default]
    Clamp,
    Repeat,
    MirrorRepeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SamplerState {
    pub filter: Filter,
    pub mipmap_mode: MipmapMode,
    pub wrap_x: WrapMode,
    pub wrap_y: WrapMode,
}

impl SamplerState {
    #[must_use]
    pub fn new(filter: Filter, mipmap_mode: MipmapMode, wrap: WrapMode) -> Self {
        Self {
            filter,
            mipmap_mode,
            wrap_x: wrap,
            wrap_y: wrap,
        }
    }

    #[inline]
    #[must_use]
    pub fn mipmapped(&self) -> bool {
        self.mipmap_mode != MipmapMode::None
    }
}
