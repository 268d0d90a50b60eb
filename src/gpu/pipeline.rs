//! Pipeline Descriptor
//!
//! A [`Pipeline`] is the immutable per-draw description of everything that
//! shapes the generated program and the fixed-function state: input flags,
//! clip-derived flags, the transfer processor, the write swizzle, an optional
//! destination copy and the fragment processors in a fixed order
//!
//! ```text
//! [ color FP (paint) ] [ coverage FP (paint) ] [ clip coverage FP ]
//! ```
//!
//! [`Pipeline::gen_key`] serializes the code-relevant part of that state for
//! program caching. Flags that cannot change the program on the current
//! hardware are removed first by [`mask_input_flags`], so requests with
//! identical effect share one key.

use std::sync::Arc;

use bitflags::bitflags;
use smallvec::SmallVec;

use super::caps::Caps;
use super::clip::{AppliedClip, AppliedHardClip, WindowRectsState};
use super::effects::TextureEffect;
use super::fp::FragmentProcessor;
use super::key::{KeyBuilder, ProgramKey};
use super::processor_set::ProcessorSet;
use super::proxy::{DstProxyView, Mipmapped, TextureProxy};
use super::swizzle::Swizzle;
use super::xfer::{XferBarrierType, XferProcessor};

bitflags! {
    /// Pipeline flags. The first four may be requested by the caller; the
    /// rest are derived from clip and stencil state during construction.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct PipelineFlags: u32 {
        const HW_ANTIALIAS                   = 1 << 0;
        const SNAP_VERTICES_TO_PIXEL_CENTERS = 1 << 1;
        const WIREFRAME                      = 1 << 2;
        const CONSERVATIVE_RASTER            = 1 << 3;

        const HAS_STENCIL_CLIP               = 1 << 4;
        const STENCIL_ENABLED                = 1 << 5;
        const SCISSOR_TEST_ENABLED           = 1 << 6;
    }
}

impl PipelineFlags {
    /// Flags a caller may pass in [`InitArgs::input_flags`].
    pub const INPUT_FLAGS: Self = Self::HW_ANTIALIAS
        .union(Self::SNAP_VERTICES_TO_PIXEL_CENTERS)
        .union(Self::WIREFRAME)
        .union(Self::CONSERVATIVE_RASTER);
}

/// Removes flags that cannot affect the program under `caps`.
///
/// Pixel-center snapping is done in the vertex shader and never distinguishes
/// programs. Without per-draw multisample control, the antialias request is
/// ignored by the hardware and is dropped too.
#[must_use]
pub fn mask_input_flags(flags: PipelineFlags, caps: &Caps) -> PipelineFlags {
    let mut ignored = PipelineFlags::SNAP_VERTICES_TO_PIXEL_CENTERS;
    if !caps.multisample_disable_support {
        ignored |= PipelineFlags::HW_ANTIALIAS;
    }
    flags - ignored
}

// ─── Stencil ─────────────────────────────────────────────────────────────────

/// Stencil test requested by the draw itself (as opposed to the clip).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserStencilSettings {
    pub compare: wgpu::CompareFunction,
    pub pass_op: wgpu::StencilOperation,
    pub fail_op: wgpu::StencilOperation,
    pub reference: u32,
    pub read_mask: u32,
    pub write_mask: u32,
}

impl UserStencilSettings {
    pub const UNUSED: Self = Self {
        compare: wgpu::CompareFunction::Always,
        pass_op: wgpu::StencilOperation::Keep,
        fail_op: wgpu::StencilOperation::Keep,
        reference: 0,
        read_mask: 0xffff,
        write_mask: 0xffff,
    };

    #[inline]
    #[must_use]
    pub fn is_unused(&self) -> bool {
        self.compare == wgpu::CompareFunction::Always
            && self.pass_op == wgpu::StencilOperation::Keep
            && self.fail_op == wgpu::StencilOperation::Keep
    }
}

impl Default for UserStencilSettings {
    fn default() -> Self {
        Self::UNUSED
    }
}

// ─── Pipeline ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct InitArgs {
    pub input_flags: PipelineFlags,
    pub user_stencil: Option<UserStencilSettings>,
    pub dst_proxy_view: DstProxyView,
    pub write_swizzle: Swizzle,
}

#[derive(Debug)]
pub struct Pipeline {
    flags: PipelineFlags,
    window_rects_state: WindowRectsState,
    user_stencil: UserStencilSettings,
    xfer: Arc<XferProcessor>,
    write_swizzle: Swizzle,
    dst_proxy_view: DstProxyView,
    fragment_processors: SmallVec<[Box<dyn FragmentProcessor>; 3]>,
    num_color_processors: usize,
}

impl Pipeline {
    fn from_state(args: InitArgs, xfer: Arc<XferProcessor>, hard_clip: &AppliedHardClip) -> Self {
        debug_assert!(
            PipelineFlags::INPUT_FLAGS.contains(args.input_flags),
            "derived flags passed as input: {:?}",
            args.input_flags
        );

        let mut flags = args.input_flags;
        if hard_clip.has_stencil_clip() {
            flags |= PipelineFlags::HAS_STENCIL_CLIP;
        }
        if hard_clip.scissor_state.is_enabled() {
            flags |= PipelineFlags::SCISSOR_TEST_ENABLED;
        }

        let user_stencil = args.user_stencil.unwrap_or_default();
        if !user_stencil.is_unused() {
            flags |= PipelineFlags::STENCIL_ENABLED;
        }

        let dst_proxy_view = if args.dst_proxy_view.proxy().is_some() {
            args.dst_proxy_view
        } else {
            DstProxyView::default()
        };

        Self {
            flags,
            window_rects_state: hard_clip.window_rects_state.clone(),
            user_stencil,
            xfer,
            write_swizzle: args.write_swizzle,
            dst_proxy_view,
            fragment_processors: SmallVec::new(),
            num_color_processors: 0,
        }
    }

    /// Builds a pipeline from a finalized processor set and the applied clip,
    /// taking ownership of their fragment processors.
    #[must_use]
    pub fn new(args: InitArgs, mut processors: ProcessorSet, mut applied_clip: AppliedClip) -> Self {
        debug_assert!(processors.is_finalized(), "processor set must be finalized");

        let mut pipeline =
            Self::from_state(args, processors.ref_xfer_processor(), applied_clip.hard_clip());

        if let Some(fp) = processors.detach_color_fragment_processor() {
            pipeline.fragment_processors.push(fp);
            pipeline.num_color_processors = 1;
        }
        if let Some(fp) = processors.detach_coverage_fragment_processor() {
            pipeline.fragment_processors.push(fp);
        }
        if let Some(fp) = applied_clip.detach_coverage_fragment_processor() {
            pipeline.fragment_processors.push(fp);
        }

        log::debug!(
            "Pipeline: flags {:?}, {} color / {} coverage processors",
            pipeline.flags,
            pipeline.num_color_fragment_processors(),
            pipeline.num_coverage_fragment_processors()
        );
        pipeline
    }

    /// A pipeline without fragment processors, for clears and stencil passes.
    #[must_use]
    pub fn new_state_only(
        scissor_test: bool,
        xfer: Arc<XferProcessor>,
        write_swizzle: Swizzle,
        input_flags: PipelineFlags,
        user_stencil: Option<UserStencilSettings>,
    ) -> Self {
        let mut pipeline = Self::from_state(
            InitArgs {
                input_flags,
                user_stencil,
                dst_proxy_view: DstProxyView::default(),
                write_swizzle,
            },
            xfer,
            &AppliedHardClip::default(),
        );
        if scissor_test {
            pipeline.flags |= PipelineFlags::SCISSOR_TEST_ENABLED;
        }
        pipeline
    }

    // ── Keys ────────────────────────────────────────────────────────────────

    /// Appends the pipeline key: masked flags, blend key, then every fragment
    /// processor's key in pipeline order.
    pub fn gen_key(&self, b: &mut KeyBuilder, caps: &Caps) {
        b.add32(mask_input_flags(self.flags, caps).bits());
        b.add32(self.xfer.blend_info().key());
        for fp in &self.fragment_processors {
            fp.add_to_key(caps.shader_caps(), b);
        }
    }

    #[must_use]
    pub fn generate_key(&self, caps: &Caps) -> ProgramKey {
        let mut b = KeyBuilder::new();
        self.gen_key(&mut b, caps);
        b.finish()
    }

    // ── Barriers ────────────────────────────────────────────────────────────

    /// Barrier needed before drawing into `target`.
    #[must_use]
    pub fn xfer_barrier_type(&self, target: &TextureProxy, caps: &Caps) -> XferBarrierType {
        if self
            .dst_proxy_view
            .proxy()
            .is_some_and(|proxy| proxy.id() == target.id())
        {
            return XferBarrierType::Texture;
        }
        self.xfer.xfer_barrier_type(caps)
    }

    // ── Resource Visitation ─────────────────────────────────────────────────

    pub fn visit_texture_effects(&self, f: &mut dyn FnMut(&TextureEffect)) {
        for fp in &self.fragment_processors {
            fp.visit_texture_effects(f);
        }
    }

    /// Every sampled proxy (clip coverage included), then the destination
    /// copy, which never needs mipmaps.
    pub fn visit_proxies(&self, f: &mut dyn FnMut(&Arc<TextureProxy>, Mipmapped)) {
        for fp in &self.fragment_processors {
            fp.visit_proxies(f);
        }
        if let Some(proxy) = self.dst_proxy_view.proxy() {
            f(proxy, Mipmapped::No);
        }
    }

    // ── Accessors ───────────────────────────────────────────────────────────

    #[inline]
    #[must_use]
    pub fn flags(&self) -> PipelineFlags {
        self.flags
    }

    #[inline]
    #[must_use]
    pub fn is_hw_antialias_state(&self) -> bool {
        self.flags.contains(PipelineFlags::HW_ANTIALIAS)
    }

    #[inline]
    #[must_use]
    pub fn is_wireframe(&self) -> bool {
        self.flags.contains(PipelineFlags::WIREFRAME)
    }

    #[inline]
    #[must_use]
    pub fn is_scissor_test_enabled(&self) -> bool {
        self.flags.contains(PipelineFlags::SCISSOR_TEST_ENABLED)
    }

    #[inline]
    #[must_use]
    pub fn has_stencil_clip(&self) -> bool {
        self.flags.contains(PipelineFlags::HAS_STENCIL_CLIP)
    }

    #[inline]
    #[must_use]
    pub fn is_stencil_enabled(&self) -> bool {
        self.flags.contains(PipelineFlags::STENCIL_ENABLED)
    }

    #[must_use]
    pub fn user_stencil(&self) -> &UserStencilSettings {
        &self.user_stencil
    }

    #[must_use]
    pub fn window_rects_state(&self) -> &WindowRectsState {
        &self.window_rects_state
    }

    #[must_use]
    pub fn xfer_processor(&self) -> &XferProcessor {
        &self.xfer
    }

    #[inline]
    #[must_use]
    pub fn write_swizzle(&self) -> Swizzle {
        self.write_swizzle
    }

    #[must_use]
    pub fn dst_proxy_view(&self) -> &DstProxyView {
        &self.dst_proxy_view
    }

    #[must_use]
    pub fn num_fragment_processors(&self) -> usize {
        self.fragment_processors.len()
    }

    #[must_use]
    pub fn num_color_fragment_processors(&self) -> usize {
        self.num_color_processors
    }

    /// Paint coverage plus clip coverage.
    #[must_use]
    pub fn num_coverage_fragment_processors(&self) -> usize {
        self.fragment_processors.len() - self.num_color_processors
    }

    #[must_use]
    pub fn is_color_fragment_processor(&self, index: usize) -> bool {
        index < self.num_color_processors
    }

    #[must_use]
    pub fn is_coverage_fragment_processor(&self, index: usize) -> bool {
        index >= self.num_color_processors && index < self.fragment_processors.len()
    }

    #[must_use]
    pub fn fragment_processor(&self, index: usize) -> Option<&dyn FragmentProcessor> {
        self.fragment_processors.get(index).map(AsRef::as_ref)
    }

    /// All fragment processors in pipeline order.
    pub fn fragment_processors(&self) -> impl Iterator<Item = &dyn FragmentProcessor> {
        self.fragment_processors.iter().map(AsRef::as_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snap_is_always_masked() {
        let caps = Caps {
            multisample_disable_support: true,
            ..Caps::default()
        };
        let flags = PipelineFlags::SNAP_VERTICES_TO_PIXEL_CENTERS | PipelineFlags::WIREFRAME;
        assert_eq!(mask_input_flags(flags, &caps), PipelineFlags::WIREFRAME);
    }

    #[test]
    fn test_hw_antialias_masked_without_multisample_disable() {
        let without = Caps::default();
        let with = Caps {
            multisample_disable_support: true,
            ..Caps::default()
        };
        let flags = PipelineFlags::HW_ANTIALIAS | PipelineFlags::SCISSOR_TEST_ENABLED;
        assert_eq!(
            mask_input_flags(flags, &without),
            PipelineFlags::SCISSOR_TEST_ENABLED
        );
        assert_eq!(mask_input_flags(flags, &with), flags);
    }

    #[test]
    fn test_derived_flags_from_clip_and_stencil() {
        let hard_clip = AppliedHardClip {
            scissor_state: crate::gpu::clip::ScissorState::enabled(
                crate::gpu::clip::IRect::from_ltrb(0, 0, 10, 10),
            ),
            stencil_stack_id: Some(7),
            ..AppliedHardClip::default()
        };
        let stencil = UserStencilSettings {
            compare: wgpu::CompareFunction::Equal,
            ..UserStencilSettings::UNUSED
        };
        let args = InitArgs {
            user_stencil: Some(stencil),
            ..InitArgs::default()
        };
        let mut set = ProcessorSet::empty();
        set.finalize(&Caps::default());
        let pipeline = Pipeline::new(args, set, AppliedClip::new(hard_clip, None));

        assert!(pipeline.has_stencil_clip());
        assert!(pipeline.is_scissor_test_enabled());
        assert!(pipeline.is_stencil_enabled());
        assert_eq!(pipeline.num_fragment_processors(), 0);
    }

    #[test]
    fn test_state_only_pipeline() {
        let pipeline = Pipeline::new_state_only(
            true,
            Arc::new(XferProcessor::disable_color()),
            Swizzle::RGBA,
            PipelineFlags::empty(),
            None,
        );
        assert!(pipeline.is_scissor_test_enabled());
        assert!(!pipeline.is_stencil_enabled());
        assert_eq!(pipeline.generate_key(&Caps::default()).words().len(), 2);
    }
}
