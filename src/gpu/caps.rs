//! Hardware Capability Descriptors
//!
//! [`Caps`] is the per-context description of what the GPU can do. It is plain
//! data with `serde` support so a host can load capability profiles from JSON
//! (or override fields for testing) instead of probing a live device.
//!
//! ```rust,ignore
//! let caps = Caps {
//!     multisample_disable_support: true,
//!     shader_caps: ShaderCaps { float_is_32_bits: false },
//!     ..Default::default()
//! };
//! ```

use serde::{Deserialize, Serialize};

/// Shader-compiler related capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderCaps {
    /// `false` on devices whose `float` is medium precision; effects then
    /// switch to scaled evaluation to stay within range.
    pub float_is_32_bits: bool,
}

impl Default for ShaderCaps {
    fn default() -> Self {
        Self {
            float_is_32_bits: true,
        }
    }
}

/// Context-wide GPU capabilities consulted while building pipelines and keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Caps {
    /// The API can turn multisampling off per draw. Without it the
    /// hardware-antialias request has no effect on the program.
    pub multisample_disable_support: bool,

    /// Advanced (KHR_blend_equation_advanced style) blend equations exist.
    pub advanced_blend_equation_support: bool,

    /// Advanced blending is coherent and needs no blend barrier between draws.
    pub advanced_coherent_blend_equation_support: bool,

    pub shader_caps: ShaderCaps,
}

impl Caps {
    #[inline]
    #[must_use]
    pub fn shader_caps(&self) -> &ShaderCaps {
        &self.shader_caps
    }
}
