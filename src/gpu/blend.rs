//! Blend coefficients, equations and their key encoding.

/// Source/destination blend coefficients.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendCoeff {
    Zero,
    One,
    /// src color
    SrcColor,
    OneMinusSrcColor,
    DstColor,
    OneMinusDstColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
    ConstColor,
    OneMinusConstColor,
    /// Dual-source color output.
    Src2Color,
    OneMinusSrc2Color,
    Src2Alpha,
    OneMinusSrc2Alpha,
    Illegal,
}

impl BlendCoeff {
    pub const LAST: Self = Self::Illegal;
}

/// Blend equations. Everything from [`BlendEquation::FIRST_ADVANCED`] on is an
/// "advanced" equation that fixed-function blending may not support.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendEquation {
    Add,
    Subtract,
    ReverseSubtract,

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
    HslHue,
    HslSaturation,
    HslColor,
    HslLuminosity,

    Illegal,
}

impl BlendEquation {
    pub const FIRST_ADVANCED: Self = Self::Screen;
    pub const LAST: Self = Self::Illegal;

    #[inline]
    #[must_use]
    pub fn is_advanced(self) -> bool {
        self as u8 >= Self::FIRST_ADVANCED as u8
    }
}

// ─── Key Layout ──────────────────────────────────────────────────────────────

const BLEND_WRITE_SHIFT: u32 = 1;
const BLEND_COEFF_SHIFT: u32 = 5;
const BLEND_EQUATION_SHIFT: u32 = BLEND_WRITE_SHIFT + 2 * BLEND_COEFF_SHIFT;

const _: () = assert!((BlendCoeff::LAST as u32) < (1 << BLEND_COEFF_SHIFT));
const _: () = assert!((BlendEquation::LAST as u32) < (1 << (32 - BLEND_EQUATION_SHIFT)));

/// Fixed-function blend state resolved by a transfer processor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendInfo {
    pub equation: BlendEquation,
    pub src_blend: BlendCoeff,
    pub dst_blend: BlendCoeff,
    pub blend_constant: [f32; 4],
    pub write_color: bool,
}

impl Default for BlendInfo {
    /// Plain replace: `src * 1 + dst * 0`.
    fn default() -> Self {
        Self {
            equation: BlendEquation::Add,
            src_blend: BlendCoeff::One,
            dst_blend: BlendCoeff::Zero,
            blend_constant: [0.0; 4],
            write_color: true,
        }
    }
}

impl BlendInfo {
    #[must_use]
    pub fn new(equation: BlendEquation, src_blend: BlendCoeff, dst_blend: BlendCoeff) -> Self {
        Self {
            equation,
            src_blend,
            dst_blend,
            ..Self::default()
        }
    }

    /// Packs the write flag, coefficients and equation into one key word:
    /// bit 0 write color, bits 1..6 src coeff, bits 6..11 dst coeff,
    /// bits 11.. equation. The blend constant is dynamic state and stays out.
    #[must_use]
    pub fn key(&self) -> u32 {
        let mut key = u32::from(self.write_color);
        key |= (self.src_blend as u32) << BLEND_WRITE_SHIFT;
        key |= (self.dst_blend as u32) << (BLEND_WRITE_SHIFT + BLEND_COEFF_SHIFT);
        key |= (self.equation as u32) << BLEND_EQUATION_SHIFT;
        key
    }

    /// `src * 1 + dst * 0`; blending can be disabled.
    #[must_use]
    pub fn is_replace(&self) -> bool {
        self.equation == BlendEquation::Add
            && self.src_blend == BlendCoeff::One
            && self.dst_blend == BlendCoeff::Zero
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_fields_do_not_overlap() {
        let info = BlendInfo {
            equation: BlendEquation::LAST,
            src_blend: BlendCoeff::LAST,
            dst_blend: BlendCoeff::LAST,
            blend_constant: [0.0; 4],
            write_color: true,
        };
        let key = info.key();
        assert_eq!(key & 1, 1);
        assert_eq!((key >> 1) & 0x1f, BlendCoeff::LAST as u32);
        assert_eq!((key >> 6) & 0x1f, BlendCoeff::LAST as u32);
        assert_eq!(key >> 11, BlendEquation::LAST as u32);
    }

    #[test]
    fn test_distinct_combinations_have_distinct_keys() {
        let a = BlendInfo::new(BlendEquation::Add, BlendCoeff::One, BlendCoeff::OneMinusSrcAlpha);
        let b = BlendInfo::new(BlendEquation::Add, BlendCoeff::OneMinusSrcAlpha, BlendCoeff::One);
        let c = BlendInfo::new(BlendEquation::Screen, BlendCoeff::One, BlendCoeff::OneMinusSrcAlpha);
        assert_ne!(a.key(), b.key());
        assert_ne!(a.key(), c.key());
        assert_ne!(b.key(), c.key());
    }

    #[test]
    fn test_advanced_equations() {
        assert!(!BlendEquation::ReverseSubtract.is_advanced());
        assert!(BlendEquation::Screen.is_advanced());
        assert!(BlendEquation::HslLuminosity.is_advanced());
    }
}
