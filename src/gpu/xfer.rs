//! Transfer (blend) processors.
//!
//! An [`XferProcessor`] decides how the fragment's final color combines with
//! the destination. Only fixed-function blending is modeled: the processor
//! resolves a [`BlendMode`] into a [`BlendInfo`] and reports which barriers or
//! destination copies the draw needs.

use super::blend::{BlendCoeff, BlendEquation, BlendInfo};
use super::caps::Caps;

/// Barrier a draw must issue before it can read what earlier draws wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum XferBarrierType {
    #[default]
    None,
    /// The draw samples the render target it renders to.
    Texture,
    /// Non-coherent advanced blending.
    Blend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    Clear,
    Src,
    Dst,
    #[default]
    SrcOver,
    DstOver,
    SrcIn,
    DstIn,
    SrcOut,
    DstOut,
    SrcATop,
    DstATop,
    Xor,
    Plus,
    Modulate,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Multiply,
    Hue,
    Saturation,
    Color,
    Luminosity,
}

impl BlendMode {
    /// Fixed-function coefficients and equation for this mode.
    #[must_use]
    pub fn blend_info(self) -> BlendInfo {
        use BlendCoeff as C;
        use BlendEquation as E;

        let coeffs = |src, dst| BlendInfo::new(E::Add, src, dst);
        let advanced = |eq| BlendInfo::new(eq, C::One, C::Zero);

        match self {
            Self::Clear => coeffs(C::Zero, C::Zero),
            Self::Src => coeffs(C::One, C::Zero),
            Self::Dst => coeffs(C::Zero, C::One),
            Self::SrcOver => coeffs(C::One, C::OneMinusSrcAlpha),
            Self::DstOver => coeffs(C::OneMinusDstAlpha, C::One),
            Self::SrcIn => coeffs(C::DstAlpha, C::Zero),
            Self::DstIn => coeffs(C::Zero, C::SrcAlpha),
            Self::SrcOut => coeffs(C::OneMinusDstAlpha, C::Zero),
            Self::DstOut => coeffs(C::Zero, C::OneMinusSrcAlpha),
            Self::SrcATop => coeffs(C::DstAlpha, C::OneMinusSrcAlpha),
            Self::DstATop => coeffs(C::OneMinusDstAlpha, C::SrcAlpha),
            Self::Xor => coeffs(C::OneMinusDstAlpha, C::OneMinusSrcAlpha),
            Self::Plus => coeffs(C::One, C::One),
            Self::Modulate => coeffs(C::Zero, C::SrcColor),
            Self::Screen => coeffs(C::One, C::OneMinusSrcColor),
            Self::Overlay => advanced(E::Overlay),
            Self::Darken => advanced(E::Darken),
            Self::Lighten => advanced(E::Lighten),
            Self::ColorDodge => advanced(E::ColorDodge),
            Self::ColorBurn => advanced(E::ColorBurn),
            Self::HardLight => advanced(E::HardLight),
            Self::SoftLight => advanced(E::SoftLight),
            Self::Difference => advanced(E::Difference),
            Self::Exclusion => advanced(E::Exclusion),
            Self::Multiply => advanced(E::Multiply),
            Self::Hue => advanced(E::HslHue),
            Self::Saturation => advanced(E::HslSaturation),
            Self::Color => advanced(E::HslColor),
            Self::Luminosity => advanced(E::HslLuminosity),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct XferProcessor {
    blend_info: BlendInfo,
}

impl Default for XferProcessor {
    fn default() -> Self {
        Self::from_blend_mode(BlendMode::SrcOver)
    }
}

impl XferProcessor {
    #[must_use]
    pub fn from_blend_mode(mode: BlendMode) -> Self {
        Self {
            blend_info: mode.blend_info(),
        }
    }

    #[must_use]
    pub fn from_blend_info(blend_info: BlendInfo) -> Self {
        Self { blend_info }
    }

    /// Writes nothing to the color buffer (stencil-only passes).
    #[must_use]
    pub fn disable_color() -> Self {
        Self {
            blend_info: BlendInfo {
                write_color: false,
                ..BlendInfo::new(BlendEquation::Add, BlendCoeff::Zero, BlendCoeff::One)
            },
        }
    }

    #[inline]
    #[must_use]
    pub fn blend_info(&self) -> BlendInfo {
        self.blend_info
    }

    /// `true` when the blend has to be done in the shader against a copy of
    /// the destination.
    #[must_use]
    pub fn needs_dst_texture(&self, caps: &Caps) -> bool {
        self.blend_info.equation.is_advanced() && !caps.advanced_blend_equation_support
    }

    #[must_use]
    pub fn xfer_barrier_type(&self, caps: &Caps) -> XferBarrierType {
        if self.blend_info.equation.is_advanced()
            && caps.advanced_blend_equation_support
            && !caps.advanced_coherent_blend_equation_support
        {
            XferBarrierType::Blend
        } else {
            XferBarrierType::None
        }
    }
}
