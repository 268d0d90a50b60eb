//! Analytic ellipse coverage.
//!
//! Evaluates the implicit `(x/rx)² + (y/ry)² - 1` at the fragment, divides by
//! the gradient length to get an approximate signed distance to the edge and
//! turns that into coverage according to the [`ClipEdgeType`].
//!
//! On devices where `float` is medium precision the computation runs in a
//! space normalized by the larger radius, and an extra `scale` uniform carries
//! that radius and its reciprocal.

use glam::Vec2;
use half::f16;

use crate::gpu::caps::ShaderCaps;
use crate::gpu::fp::{
    ClassId, EmitArgs, FpResult, FragmentProcessor, OptimizationFlags, ProcessorBase,
    ProgramImpl, impl_processor_boilerplate, processor_optimization_flags,
};
use crate::gpu::key::KeyBuilder;
use crate::gpu::program::{ShaderVisibility, UniformDataManager, UniformHandle, UniformType};

use super::ClipEdgeType;

/// Smallest radius that still rasterizes sensibly at medium precision.
const MIN_MEDIUM_PRECISION_RADIUS: f32 = 0.5;
/// Largest ratio between the two radii at medium precision.
const MAX_MEDIUM_PRECISION_ASPECT: f32 = 255.0;
/// Largest radius at medium precision.
const MAX_MEDIUM_PRECISION_RADIUS: f32 = 16384.0;

#[derive(Debug, Clone)]
pub struct EllipseEffect {
    base: ProcessorBase,
    edge_type: ClipEdgeType,
    center: Vec2,
    radii: Vec2,
}

impl EllipseEffect {
    const NAME: &'static str = "EllipseEffect";

    /// Builds the effect, or hands `input` back when the ellipse cannot be
    /// evaluated accurately with the device's float precision.
    pub fn make(
        input: Option<Box<dyn FragmentProcessor>>,
        edge_type: ClipEdgeType,
        center: Vec2,
        radii: Vec2,
        caps: &ShaderCaps,
    ) -> FpResult {
        if !caps.float_is_32_bits {
            let too_small = radii.x < MIN_MEDIUM_PRECISION_RADIUS
                || radii.y < MIN_MEDIUM_PRECISION_RADIUS;
            let too_narrow = radii.x > MAX_MEDIUM_PRECISION_ASPECT * radii.y
                || radii.y > MAX_MEDIUM_PRECISION_ASPECT * radii.x;
            let too_large = radii.x > MAX_MEDIUM_PRECISION_RADIUS
                || radii.y > MAX_MEDIUM_PRECISION_RADIUS;
            if too_small || too_narrow || too_large {
                log::warn!(
                    "EllipseEffect refused at medium precision: radii ({}, {})",
                    radii.x,
                    radii.y
                );
                return Err(input);
            }
        }
        Ok(Box::new(Self::new(input, edge_type, center, radii)))
    }

    fn new(
        input: Option<Box<dyn FragmentProcessor>>,
        edge_type: ClipEdgeType,
        center: Vec2,
        radii: Vec2,
    ) -> Self {
        let flags = processor_optimization_flags(input.as_deref())
            & OptimizationFlags::COMPATIBLE_WITH_COVERAGE_AS_ALPHA;
        let mut base = ProcessorBase::new(flags);
        base.register_child(input);
        Self {
            base,
            edge_type,
            center,
            radii,
        }
    }

    #[inline]
    #[must_use]
    pub fn edge_type(&self) -> ClipEdgeType {
        self.edge_type
    }

    #[inline]
    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.center
    }

    #[inline]
    #[must_use]
    pub fn radii(&self) -> Vec2 {
        self.radii
    }
}

impl FragmentProcessor for EllipseEffect {
    impl_processor_boilerplate!();

    fn class_id(&self) -> ClassId {
        ClassId::EllipseEffect
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn on_add_to_key(&self, _caps: &ShaderCaps, b: &mut KeyBuilder) {
        b.add32(self.edge_type as u32);
    }

    fn on_is_equal(&self, other: &dyn FragmentProcessor) -> bool {
        other.cast::<Self>().is_some_and(|that| {
            self.edge_type == that.edge_type
                && self.center == that.center
                && self.radii == that.radii
        })
    }

    fn make_program_impl(&self) -> Box<dyn ProgramImpl> {
        Box::<EllipseProgramImpl>::default()
    }

    fn dump_info(&self) -> String {
        format!(
            "(edgeType={}, center=({}, {}), radii=({}, {}))",
            self.edge_type as u32, self.center.x, self.center.y, self.radii.x, self.radii.y
        )
    }
}

// ─── Program Side ────────────────────────────────────────────────────────────

/// Emission and upload state for one ellipse node in one program.
///
/// `prev_center`/`prev_radii` remember the last upload for this program
/// instance only; they are not valid across programs or threads.
#[derive(Debug, Default)]
struct EllipseProgramImpl {
    ellipse_var: Option<UniformHandle>,
    scale_var: Option<UniformHandle>,
    prev_center: Option<Vec2>,
    prev_radii: Option<Vec2>,
}

impl ProgramImpl for EllipseProgramImpl {
    fn emit_code(&mut self, args: &mut EmitArgs<'_>) {
        let medium_precision = !args.shader_caps.float_is_32_bits;

        let ellipse_var = args.uniform_handler.add_uniform(
            EllipseEffect::NAME,
            ShaderVisibility::FRAGMENT,
            UniformType::Float4,
            "ellipse",
        );
        self.ellipse_var = Some(ellipse_var);
        self.scale_var = medium_precision.then(|| {
            args.uniform_handler.add_uniform(
                EllipseEffect::NAME,
                ShaderVisibility::FRAGMENT,
                UniformType::Float2,
                "scale",
            )
        });

        let Some(edge_type) = args.fp.cast::<EllipseEffect>().map(EllipseEffect::edge_type)
        else {
            debug_assert!(false, "EllipseProgramImpl driven by a foreign processor");
            return;
        };

        let ellipse = args.uniform_handler.uniform_var(ellipse_var);
        let frag_coord = args.frag_builder.frag_coord();
        args.code_appendf(format_args!(
            "var d = {frag_coord}.xy - {ellipse}.xy;\n"
        ));
        if let Some(scale_var) = self.scale_var {
            let scale = args.uniform_handler.uniform_var(scale_var);
            args.code_appendf(format_args!("d = d * {scale}.y;\n"));
        }

        let grad_clamp = if medium_precision {
            f16::MIN_POSITIVE.to_f32()
        } else {
            f32::MIN_POSITIVE
        };
        args.code_appendf(format_args!(
            "let Z = d * {ellipse}.zw;\n\
             let implicit = dot(Z, d) - 1.0;\n\
             let grad_dot = max(4.0 * dot(Z, Z), {grad_clamp:e});\n\
             var approx_dist = implicit * inverseSqrt(grad_dot);\n"
        ));
        if let Some(scale_var) = self.scale_var {
            let scale = args.uniform_handler.uniform_var(scale_var);
            args.code_appendf(format_args!(
                "approx_dist = approx_dist * {scale}.x;\n"
            ));
        }

        let alpha = match edge_type {
            ClipEdgeType::FillBw => "select(1.0, 0.0, approx_dist > 0.0)",
            ClipEdgeType::FillAa => "clamp(0.5 - approx_dist, 0.0, 1.0)",
            ClipEdgeType::InverseFillBw => "select(0.0, 1.0, approx_dist > 0.0)",
            ClipEdgeType::InverseFillAa => "clamp(0.5 + approx_dist, 0.0, 1.0)",
            ClipEdgeType::HairlineAa => {
                args.code_appendf(format_args!("discard;\n"));
                "0.0"
            }
        };
        args.code_appendf(format_args!("let alpha = {alpha};\n"));

        let child = args.invoke_child(0, args.input_color);
        let output = args.output_color;
        args.code_appendf(format_args!("{output} = {child} * alpha;\n"));
    }

    fn on_set_data(&mut self, pdman: &mut UniformDataManager, fp: &dyn FragmentProcessor) {
        let Some(ee) = fp.cast::<EllipseEffect>() else {
            debug_assert!(false, "EllipseProgramImpl driven by a foreign processor");
            return;
        };
        let Some(ellipse_var) = self.ellipse_var else {
            return;
        };
        let (center, radii) = (ee.center, ee.radii);

        if self.prev_center == Some(center) && self.prev_radii == Some(radii) {
            log::trace!("EllipseEffect upload skipped");
            return;
        }

        let (inv_rx_sqd, inv_ry_sqd) = if let Some(scale_var) = self.scale_var {
            // The larger radius becomes the scale; inverse radii are pre-scaled.
            if radii.x > radii.y {
                pdman.set2f(scale_var, radii.x, 1.0 / radii.x);
                (1.0, (radii.x * radii.x) / (radii.y * radii.y))
            } else {
                pdman.set2f(scale_var, radii.y, 1.0 / radii.y);
                ((radii.y * radii.y) / (radii.x * radii.x), 1.0)
            }
        } else {
            (1.0 / (radii.x * radii.x), 1.0 / (radii.y * radii.y))
        };
        pdman.set4f(ellipse_var, center.x, center.y, inv_rx_sqd, inv_ry_sqd);

        self.prev_center = Some(center);
        self.prev_radii = Some(radii);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::effects::ConstColorProcessor;
    use crate::gpu::effects::test_util::emit_single;
    use glam::Vec4;

    fn medium() -> ShaderCaps {
        ShaderCaps {
            float_is_32_bits: false,
        }
    }

    fn ellipse(edge: ClipEdgeType, center: Vec2, radii: Vec2) -> Box<dyn FragmentProcessor> {
        EllipseEffect::make(None, edge, center, radii, &ShaderCaps::default())
            .unwrap_or_else(|_| panic!("full precision never refuses"))
    }

    #[test]
    fn test_medium_precision_refusals_return_input() {
        let input: Box<dyn FragmentProcessor> = Box::new(ConstColorProcessor::new(
            Vec4::ONE,
            crate::gpu::effects::InputMode::Ignore,
        ));

        for radii in [
            Vec2::new(0.25, 10.0),
            Vec2::new(1000.0, 2.0),
            Vec2::new(20000.0, 20000.0),
        ] {
            let back = EllipseEffect::make(
                Some(input.clone()),
                ClipEdgeType::FillAa,
                Vec2::ZERO,
                radii,
                &medium(),
            )
            .expect_err("refused");
            let back = back.expect("input returned");
            assert!(back.is_equal(input.as_ref()));
        }

        assert!(
            EllipseEffect::make(None, ClipEdgeType::FillAa, Vec2::ZERO, Vec2::new(5.0, 3.0), &medium())
                .is_ok()
        );
    }

    #[test]
    fn test_full_precision_accepts_tiny_radii() {
        let fp = EllipseEffect::make(
            None,
            ClipEdgeType::FillBw,
            Vec2::ZERO,
            Vec2::new(0.1, 0.1),
            &ShaderCaps::default(),
        );
        assert!(fp.is_ok());
    }

    #[test]
    fn test_flags_limited_to_coverage_as_alpha() {
        let fp = ellipse(ClipEdgeType::FillAa, Vec2::ZERO, Vec2::ONE);
        assert_eq!(
            fp.optimization_flags(),
            OptimizationFlags::COMPATIBLE_WITH_COVERAGE_AS_ALPHA
        );
        assert_eq!(fp.num_children(), 1);
        assert!(fp.child_processor(0).is_none());
    }

    #[test]
    fn test_key_ignores_center_and_radii() {
        let caps = ShaderCaps::default();
        let key = |fp: &dyn FragmentProcessor| {
            let mut b = KeyBuilder::new();
            fp.add_to_key(&caps, &mut b);
            b.finish()
        };
        let a = ellipse(ClipEdgeType::FillAa, Vec2::new(10.0, 10.0), Vec2::new(5.0, 3.0));
        let b = ellipse(ClipEdgeType::FillAa, Vec2::new(20.0, 20.0), Vec2::new(7.0, 1.0));
        let c = ellipse(ClipEdgeType::InverseFillAa, Vec2::new(10.0, 10.0), Vec2::new(5.0, 3.0));

        assert_eq!(key(a.as_ref()), key(b.as_ref()));
        assert_ne!(key(a.as_ref()), key(c.as_ref()));
        assert!(!a.is_equal(b.as_ref()));
    }

    #[test]
    fn test_emitted_code_per_edge_type() {
        let caps = ShaderCaps::default();
        let cases = [
            (ClipEdgeType::FillBw, "select(1.0, 0.0, approx_dist > 0.0)"),
            (ClipEdgeType::FillAa, "clamp(0.5 - approx_dist, 0.0, 1.0)"),
            (ClipEdgeType::InverseFillBw, "select(0.0, 1.0, approx_dist > 0.0)"),
            (ClipEdgeType::InverseFillAa, "clamp(0.5 + approx_dist, 0.0, 1.0)"),
            (ClipEdgeType::HairlineAa, "discard;"),
        ];
        for (edge, expected) in cases {
            let fp = ellipse(edge, Vec2::ZERO, Vec2::ONE);
            let emitted = emit_single(fp.as_ref(), &caps);
            assert!(emitted.code.contains(expected), "{edge:?}: {}", emitted.code);
            assert!(emitted.code.contains("_output = _input * alpha;"));
            assert!(!emitted.code.contains("scale"));
        }
    }

    #[test]
    fn test_medium_precision_declares_scale() {
        let fp = ellipse(ClipEdgeType::FillAa, Vec2::ZERO, Vec2::ONE);
        let emitted = emit_single(fp.as_ref(), &medium());
        let names: Vec<&str> = emitted.handler.uniforms().iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["ellipse_S0", "scale_S0"]);
        assert!(emitted.code.contains("d = d * _uniforms.scale_S0.y;"));
        assert!(emitted.code.contains("approx_dist = approx_dist * _uniforms.scale_S0.x;"));
    }

    #[test]
    fn test_upload_full_precision_and_skip_unchanged() {
        let fp = ellipse(ClipEdgeType::FillAa, Vec2::new(10.0, 10.0), Vec2::new(5.0, 4.0));
        let mut emitted = emit_single(fp.as_ref(), &ShaderCaps::default());
        let mut pdman = UniformDataManager::new(&emitted.handler);
        let handle = emitted.handler_uniform(0);

        emitted.program_impl.on_set_data(&mut pdman, fp.as_ref());
        assert_eq!(pdman.get(handle), &[10.0, 10.0, 1.0 / 25.0, 1.0 / 16.0]);
        assert_eq!(pdman.write_count(handle), 1);

        emitted.program_impl.on_set_data(&mut pdman, fp.as_ref());
        assert_eq!(pdman.write_count(handle), 1);

        let moved = ellipse(ClipEdgeType::FillAa, Vec2::new(11.0, 10.0), Vec2::new(5.0, 4.0));
        emitted.program_impl.on_set_data(&mut pdman, moved.as_ref());
        assert_eq!(pdman.write_count(handle), 2);
    }

    #[test]
    fn test_upload_medium_precision_uses_larger_radius() {
        let fp = ellipse(ClipEdgeType::FillAa, Vec2::new(1.0, 2.0), Vec2::new(2.0, 8.0));
        let mut emitted = emit_single(fp.as_ref(), &medium());
        let mut pdman = UniformDataManager::new(&emitted.handler);
        let ellipse_var = emitted.handler_uniform(0);
        let scale_var = emitted.handler_uniform(1);

        emitted.program_impl.on_set_data(&mut pdman, fp.as_ref());
        assert_eq!(pdman.get(scale_var), &[8.0, 0.125]);
        assert_eq!(pdman.get(ellipse_var), &[1.0, 2.0, 16.0, 1.0]);
    }
}
