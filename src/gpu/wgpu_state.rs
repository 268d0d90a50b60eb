//! Translation of pipeline state into `wgpu` descriptors.

use super::blend::{BlendCoeff, BlendEquation, BlendInfo};
use super::pipeline::{Pipeline, UserStencilSettings};

#[must_use]
pub fn blend_factor(coeff: BlendCoeff) -> Option<wgpu::BlendFactor> {
    use wgpu::BlendFactor as F;
    Some(match coeff {
        BlendCoeff::Zero => F::Zero,
        BlendCoeff::One => F::One,
        BlendCoeff::SrcColor => F::Src,
        BlendCoeff::OneMinusSrcColor => F::OneMinusSrc,
        BlendCoeff::DstColor => F::Dst,
        BlendCoeff::OneMinusDstColor => F::OneMinusDst,
        BlendCoeff::SrcAlpha => F::SrcAlpha,
        BlendCoeff::OneMinusSrcAlpha => F::OneMinusSrcAlpha,
        BlendCoeff::DstAlpha => F::DstAlpha,
        BlendCoeff::OneMinusDstAlpha => F::OneMinusDstAlpha,
        BlendCoeff::ConstColor => F::Constant,
        BlendCoeff::OneMinusConstColor => F::OneMinusConstant,
        BlendCoeff::Src2Color => F::Src1,
        BlendCoeff::OneMinusSrc2Color => F::OneMinusSrc1,
        BlendCoeff::Src2Alpha => F::Src1Alpha,
        BlendCoeff::OneMinusSrc2Alpha => F::OneMinusSrc1Alpha,
        BlendCoeff::Illegal => return None,
    })
}

#[must_use]
pub fn blend_operation(equation: BlendEquation) -> Option<wgpu::BlendOperation> {
    match equation {
        BlendEquation::Add => Some(wgpu::BlendOperation::Add),
        BlendEquation::Subtract => Some(wgpu::BlendOperation::Subtract),
        BlendEquation::ReverseSubtract => Some(wgpu::BlendOperation::ReverseSubtract),
        _ => None,
    }
}

/// Fixed-function blend state, or `None` when blending is off (replace) or
/// cannot be expressed (advanced equations).
#[must_use]
pub fn to_wgpu_blend_state(info: &BlendInfo) -> Option<wgpu::BlendState> {
    if info.is_replace() {
        return None;
    }
    let (Some(src_factor), Some(dst_factor), Some(operation)) = (
        blend_factor(info.src_blend),
        blend_factor(info.dst_blend),
        blend_operation(info.equation),
    ) else {
        log::warn!(
            "Blend {:?}({:?}, {:?}) has no wgpu equivalent",
            info.equation,
            info.src_blend,
            info.dst_blend
        );
        return None;
    };

    let component = wgpu::BlendComponent {
        src_factor,
        dst_factor,
        operation,
    };
    Some(wgpu::BlendState {
        color: component,
        alpha: component,
    })
}

#[must_use]
pub fn color_writes(info: &BlendInfo) -> wgpu::ColorWrites {
    if info.write_color {
        wgpu::ColorWrites::ALL
    } else {
        wgpu::ColorWrites::empty()
    }
}

#[must_use]
pub fn stencil_face(settings: &UserStencilSettings) -> wgpu::StencilFaceState {
    wgpu::StencilFaceState {
        compare: settings.compare,
        fail_op: settings.fail_op,
        depth_fail_op: settings.fail_op,
        pass_op: settings.pass_op,
    }
}

/// Color target state for `pipeline` drawing into `format`.
#[must_use]
pub fn color_target_state(
    pipeline: &Pipeline,
    format: wgpu::TextureFormat,
) -> wgpu::ColorTargetState {
    let info = pipeline.xfer_processor().blend_info();
    wgpu::ColorTargetState {
        format,
        blend: to_wgpu_blend_state(&info),
        write_mask: color_writes(&info),
    }
}

/// Stencil bit holding the clip mask: the top bit of an 8-bit stencil buffer.
/// User stencil tests only see the bits below it while a stencil clip is
/// active.
pub const STENCIL_CLIP_BIT: u32 = 0x80;
const USER_STENCIL_BITS: u32 = STENCIL_CLIP_BIT - 1;

/// Stencil state for `pipeline`, `None` when neither a user stencil test nor a
/// stencil clip is active.
///
/// With a stencil clip the clip bit is folded into the test: `Always` becomes
/// "clip bit set", and `Equal`, `Less`, `LessEqual` compare the clip bit along
/// with the user bits. Other comparisons cannot be combined with the clip in
/// one test; they fall back to the clip test alone. The reference value to
/// bind comes from [`stencil_reference`].
#[must_use]
pub fn stencil_state(pipeline: &Pipeline) -> Option<wgpu::StencilState> {
    use wgpu::CompareFunction as C;

    let settings = pipeline.user_stencil();
    if !pipeline.has_stencil_clip() {
        if !pipeline.is_stencil_enabled() {
            return None;
        }
        let face = stencil_face(settings);
        return Some(wgpu::StencilState {
            front: face,
            back: face,
            read_mask: settings.read_mask,
            write_mask: settings.write_mask,
        });
    }

    let (compare, read_mask) = match settings.compare {
        C::Always => (C::Equal, STENCIL_CLIP_BIT),
        compare @ (C::Equal | C::Less | C::LessEqual) => (
            compare,
            STENCIL_CLIP_BIT | (settings.read_mask & USER_STENCIL_BITS),
        ),
        other => {
            log::warn!("Stencil test {other:?} cannot be combined with a stencil clip");
            (C::Equal, STENCIL_CLIP_BIT)
        }
    };
    let face = wgpu::StencilFaceState {
        compare,
        ..stencil_face(settings)
    };
    Some(wgpu::StencilState {
        front: face,
        back: face,
        read_mask,
        write_mask: settings.write_mask & USER_STENCIL_BITS,
    })
}

/// Stencil reference value to bind alongside [`stencil_state`].
#[must_use]
pub fn stencil_reference(pipeline: &Pipeline) -> u32 {
    let reference = pipeline.user_stencil().reference;
    if pipeline.has_stencil_clip() {
        STENCIL_CLIP_BIT | (reference & USER_STENCIL_BITS)
    } else {
        reference
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::gpu::caps::Caps;
    use crate::gpu::clip::{AppliedClip, AppliedHardClip};
    use crate::gpu::pipeline::InitArgs;
    use crate::gpu::processor_set::ProcessorSet;
    use crate::gpu::xfer::{BlendMode, XferProcessor};

    fn pipeline(user_stencil: Option<UserStencilSettings>, stencil_clip: bool) -> Pipeline {
        let hard_clip = AppliedHardClip {
            stencil_stack_id: stencil_clip.then_some(3),
            ..AppliedHardClip::default()
        };
        let mut set = ProcessorSet::empty();
        set.finalize(&Caps::default());
        let args = InitArgs {
            user_stencil,
            ..InitArgs::default()
        };
        Pipeline::new(args, set, AppliedClip::new(hard_clip, None))
    }

    fn user_stencil(compare: wgpu::CompareFunction) -> UserStencilSettings {
        UserStencilSettings {
            compare,
            pass_op: wgpu::StencilOperation::Replace,
            reference: 0x05,
            read_mask: 0xff,
            write_mask: 0xff,
            ..UserStencilSettings::UNUSED
        }
    }

    #[test]
    fn test_src_over_translates() {
        let state = to_wgpu_blend_state(&BlendMode::SrcOver.blend_info()).expect("src-over");
        assert_eq!(state.color.src_factor, wgpu::BlendFactor::One);
        assert_eq!(state.color.dst_factor, wgpu::BlendFactor::OneMinusSrcAlpha);
        assert_eq!(state.color.operation, wgpu::BlendOperation::Add);
    }

    #[test]
    fn test_replace_and_advanced_have_no_state() {
        assert!(to_wgpu_blend_state(&BlendMode::Src.blend_info()).is_none());
        assert!(to_wgpu_blend_state(&BlendMode::Multiply.blend_info()).is_none());
    }

    #[test]
    fn test_color_target_state() {
        let p = pipeline(None, false);
        let target = color_target_state(&p, wgpu::TextureFormat::Rgba8Unorm);
        assert_eq!(target.format, wgpu::TextureFormat::Rgba8Unorm);
        assert_eq!(target.write_mask, wgpu::ColorWrites::ALL);
        assert!(target.blend.is_some());

        let no_color = Pipeline::new_state_only(
            false,
            Arc::new(XferProcessor::disable_color()),
            crate::gpu::swizzle::Swizzle::RGBA,
            crate::gpu::pipeline::PipelineFlags::empty(),
            None,
        );
        let target = color_target_state(&no_color, wgpu::TextureFormat::Bgra8Unorm);
        assert_eq!(target.write_mask, wgpu::ColorWrites::empty());
    }

    #[test]
    fn test_no_stencil_state_when_unused() {
        let p = pipeline(None, false);
        assert!(stencil_state(&p).is_none());
        assert_eq!(stencil_reference(&p), 0);
    }

    #[test]
    fn test_user_stencil_state() {
        let p = pipeline(Some(user_stencil(wgpu::CompareFunction::Less)), false);
        let state = stencil_state(&p).expect("user stencil");
        assert_eq!(state.front.compare, wgpu::CompareFunction::Less);
        assert_eq!(state.front.pass_op, wgpu::StencilOperation::Replace);
        assert_eq!(state.front, state.back);
        assert_eq!(state.read_mask, 0xff);
        assert_eq!(state.write_mask, 0xff);
        assert_eq!(stencil_reference(&p), 0x05);
    }

    #[test]
    fn test_stencil_clip_alone_tests_clip_bit() {
        let p = pipeline(None, true);
        assert!(p.has_stencil_clip());
        assert!(!p.is_stencil_enabled());

        let state = stencil_state(&p).expect("stencil clip");
        assert_eq!(state.front.compare, wgpu::CompareFunction::Equal);
        assert_eq!(state.front.pass_op, wgpu::StencilOperation::Keep);
        assert_eq!(state.read_mask, STENCIL_CLIP_BIT);
        assert_eq!(state.write_mask & STENCIL_CLIP_BIT, 0);
        assert_eq!(stencil_reference(&p), STENCIL_CLIP_BIT);
    }

    #[test]
    fn test_stencil_clip_merges_with_user_stencil() {
        let p = pipeline(Some(user_stencil(wgpu::CompareFunction::LessEqual)), true);
        let state = stencil_state(&p).expect("clipped user stencil");
        assert_eq!(state.front.compare, wgpu::CompareFunction::LessEqual);
        assert_eq!(state.front.pass_op, wgpu::StencilOperation::Replace);
        assert_eq!(state.read_mask, 0xff);
        assert_eq!(state.write_mask, 0x7f);
        assert_eq!(stencil_reference(&p), 0x85);

        let p = pipeline(Some(user_stencil(wgpu::CompareFunction::Greater)), true);
        let state = stencil_state(&p).expect("clip test");
        assert_eq!(state.front.compare, wgpu::CompareFunction::Equal);
        assert_eq!(state.read_mask, STENCIL_CLIP_BIT);
    }
}
