//! Samples a texture at the fragment position.

use glam::UVec2;

use crate::gpu::caps::ShaderCaps;
use crate::gpu::fp::{
    ClassId, EmitArgs, FragmentProcessor, OptimizationFlags, ProcessorBase, ProgramImpl,
    impl_processor_boilerplate,
};
use crate::gpu::key::KeyBuilder;
use crate::gpu::program::{ShaderVisibility, UniformDataManager, UniformHandle, UniformType};
use crate::gpu::proxy::SurfaceProxyView;
use crate::gpu::sampler::SamplerState;

/// Reads a texture through a sampler and modulates the result by the input
/// alpha. Texture coordinates are the device position scaled by the inverse
/// texture size.
#[derive(Debug, Clone)]
pub struct TextureEffect {
    base: ProcessorBase,
    view: SurfaceProxyView,
    sampler_state: SamplerState,
}

impl TextureEffect {
    const NAME: &'static str = "TextureEffect";

    #[must_use]
    pub fn make(view: SurfaceProxyView, sampler_state: SamplerState) -> Box<dyn FragmentProcessor> {
        Box::new(Self {
            base: ProcessorBase::new(
                OptimizationFlags::MODULATES_INPUT
                    | OptimizationFlags::COMPATIBLE_WITH_COVERAGE_AS_ALPHA,
            ),
            view,
            sampler_state,
        })
    }

    #[inline]
    #[must_use]
    pub fn view(&self) -> &SurfaceProxyView {
        &self.view
    }

    #[inline]
    #[must_use]
    pub fn sampler_state(&self) -> SamplerState {
        self.sampler_state
    }
}

impl FragmentProcessor for TextureEffect {
    impl_processor_boilerplate!();

    fn class_id(&self) -> ClassId {
        ClassId::TextureEffect
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn on_add_to_key(&self, _caps: &ShaderCaps, b: &mut KeyBuilder) {
        b.add_bits(16, u32::from(self.view.swizzle().as_key()));
    }

    fn on_is_equal(&self, other: &dyn FragmentProcessor) -> bool {
        other.cast::<Self>().is_some_and(|that| {
            self.view.proxy().id() == that.view.proxy().id()
                && self.view.swizzle() == that.view.swizzle()
                && self.sampler_state == that.sampler_state
        })
    }

    fn make_program_impl(&self) -> Box<dyn ProgramImpl> {
        Box::<TextureProgramImpl>::default()
    }

    fn texture_effect(&self) -> Option<&TextureEffect> {
        Some(self)
    }

    fn dump_info(&self) -> String {
        format!(
            "(proxy={}, swizzle={}, sampler={:?})",
            self.view.proxy().id().to_u32(),
            self.view.swizzle(),
            self.sampler_state
        )
    }
}

#[derive(Debug, Default)]
struct TextureProgramImpl {
    inv_dimensions_var: Option<UniformHandle>,
    prev_dimensions: Option<UVec2>,
}

impl ProgramImpl for TextureProgramImpl {
    fn emit_code(&mut self, args: &mut EmitArgs<'_>) {
        let fp = args.fp;
        let Some(te) = fp.cast::<TextureEffect>() else {
            debug_assert!(false, "TextureProgramImpl driven by a foreign processor");
            return;
        };

        let sampler = args.uniform_handler.add_sampler(te.view.swizzle(), "tex");
        let inv_dimensions_var = args.uniform_handler.add_uniform(
            TextureEffect::NAME,
            ShaderVisibility::FRAGMENT,
            UniformType::Float2,
            "inv_dimensions",
        );
        self.inv_dimensions_var = Some(inv_dimensions_var);

        let info = args.uniform_handler.sampler_info(sampler);
        let (texture, sampler_name) = (info.texture_name.clone(), info.sampler_name.clone());
        let inv_dimensions = args.uniform_handler.uniform_var(inv_dimensions_var);
        let frag_coord = args.frag_builder.frag_coord();
        let texel = te.view.swizzle().apply("texel");
        let (input, output) = (args.input_color, args.output_color);

        args.code_appendf(format_args!(
            "let uv = {frag_coord}.xy * {inv_dimensions};\n\
             let texel = textureSample({texture}, {sampler_name}, uv);\n\
             {output} = {texel} * {input}.a;\n"
        ));
    }

    fn on_set_data(&mut self, pdman: &mut UniformDataManager, fp: &dyn FragmentProcessor) {
        let (Some(te), Some(var)) = (fp.cast::<TextureEffect>(), self.inv_dimensions_var) else {
            return;
        };
        let dimensions = te.view.proxy().dimensions();
        if self.prev_dimensions == Some(dimensions) {
            log::trace!("TextureEffect upload skipped");
            return;
        }
        pdman.set2f(var, 1.0 / dimensions.x as f32, 1.0 / dimensions.y as f32);
        self.prev_dimensions = Some(dimensions);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::effects::test_util::emit_single;
    use crate::gpu::proxy::{Mipmapped, TextureProxy};
    use crate::gpu::sampler::{Filter, MipmapMode, WrapMode};
    use crate::gpu::swizzle::Swizzle;

    fn view(swizzle: Swizzle) -> SurfaceProxyView {
        SurfaceProxyView::new(TextureProxy::new(UVec2::new(64, 32), Mipmapped::No), swizzle)
    }

    #[test]
    fn test_key_depends_on_swizzle_only() {
        let caps = ShaderCaps::default();
        let key = |fp: &dyn FragmentProcessor| {
            let mut b = KeyBuilder::new();
            fp.add_to_key(&caps, &mut b);
            b.finish()
        };
        let nearest = SamplerState::default();
        let linear = SamplerState::new(Filter::Linear, MipmapMode::None, WrapMode::Repeat);

        let a = TextureEffect::make(view(Swizzle::RGBA), nearest);
        let b = TextureEffect::make(view(Swizzle::RGBA), linear);
        let c = TextureEffect::make(view(Swizzle::AAAA), nearest);
        assert_eq!(key(a.as_ref()), key(b.as_ref()));
        assert_ne!(key(a.as_ref()), key(c.as_ref()));
        assert!(!a.is_equal(b.as_ref()));
    }

    #[test]
    fn test_visit_reports_mipmap_need() {
        let mipped = SamplerState::new(Filter::Linear, MipmapMode::Linear, WrapMode::Clamp);
        let fp = TextureEffect::make(view(Swizzle::RGBA), mipped);
        let mut seen = Vec::new();
        fp.visit_proxies(&mut |proxy, mipmapped| seen.push((proxy.id(), mipmapped)));
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].1, Mipmapped::Yes);
    }

    #[test]
    fn test_emit_and_upload_inverse_dimensions() {
        let fp = TextureEffect::make(view(Swizzle::BGRA), SamplerState::default());
        let mut emitted = emit_single(fp.as_ref(), &ShaderCaps::default());
        assert!(emitted.code.contains("textureSample(tex_S0, tex_sampler_S0, uv)"));
        assert!(emitted.code.contains("_output = texel.bgra * _input.a;"));

        let mut pdman = UniformDataManager::new(&emitted.handler);
        let handle = emitted.handler_uniform(0);
        emitted.program_impl.on_set_data(&mut pdman, fp.as_ref());
        emitted.program_impl.on_set_data(&mut pdman, fp.as_ref());
        assert_eq!(pdman.get(handle), &[1.0 / 64.0, 1.0 / 32.0]);
        assert_eq!(pdman.write_count(handle), 1);
    }
}
