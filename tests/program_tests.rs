//! Program Tests
//!
//! Tests for:
//! - WGSL program assembly from pipelines (stage functions, fs_main chaining)
//! - Uniform and sampler declarations
//! - Per-draw uniform upload and redundant-upload skipping
//! - Medium-precision ellipse evaluation
//! - Program cache hits, misses and concurrent lookups

use std::sync::Arc;

use glam::{UVec2, Vec2, Vec4};
use strata::gpu::{
    AppliedClip, Caps, ClipEdgeType, ConstColorProcessor, EllipseEffect, FragmentProcessor,
    InitArgs, InputMode, Mipmapped, Pipeline, ProcessorSet, ProgramBuilder, ProgramCache,
    SamplerState, ShaderCaps, SurfaceProxyView, Swizzle, TextureEffect, TextureProxy,
    XferProcessor,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn ellipse_fp(
    input: Option<Box<dyn FragmentProcessor>>,
    edge: ClipEdgeType,
    center: Vec2,
    radii: Vec2,
    caps: &Caps,
) -> Box<dyn FragmentProcessor> {
    EllipseEffect::make(input, edge, center, radii, caps.shader_caps())
        .expect("ellipse within limits")
}

fn pipeline(
    args: InitArgs,
    color: Option<Box<dyn FragmentProcessor>>,
    coverage: Option<Box<dyn FragmentProcessor>>,
    caps: &Caps,
) -> Pipeline {
    let mut processors = ProcessorSet::new(color, coverage, XferProcessor::default());
    processors.finalize(caps);
    Pipeline::new(args, processors, AppliedClip::disabled())
}

fn ellipse_pipeline(edge: ClipEdgeType, center: Vec2, radii: Vec2, caps: &Caps) -> Pipeline {
    pipeline(
        InitArgs::default(),
        None,
        Some(ellipse_fp(None, edge, center, radii, caps)),
        caps,
    )
}

// ============================================================================
// Assembly
// ============================================================================

#[test]
fn color_and_coverage_stages_are_chained() -> anyhow::Result<()> {
    init_logger();
    let caps = Caps::default();
    let color = ConstColorProcessor::make(Vec4::new(1.0, 0.5, 0.0, 1.0), InputMode::ModulateA);
    let coverage = ellipse_fp(
        None,
        ClipEdgeType::FillAa,
        Vec2::new(10.0, 10.0),
        Vec2::new(5.0, 3.0),
        &caps,
    );
    let pipeline = pipeline(InitArgs::default(), Some(color), Some(coverage), &caps);

    let program = ProgramBuilder::build(&pipeline, &caps)?;
    let source = program.source();

    assert!(source.starts_with("// === Generated Fragment Program ==="));
    assert!(source.contains("fn ConstColorProcessor_S0(_input: vec4<f32>) -> vec4<f32>"));
    assert!(source.contains("fn EllipseEffect_S1(_input: vec4<f32>) -> vec4<f32>"));
    assert!(source.contains("color = ConstColorProcessor_S0(color);"));
    assert!(source.contains("coverage = EllipseEffect_S1(coverage);"));
    assert!(source.contains("fn fs_main(frag: FragmentInput)"));
    assert!(source.contains("color_S0: vec4<f32>,"));
    assert!(source.contains("ellipse_S1: vec4<f32>,"));
    assert!(source.contains("clamp(0.5 - approx_dist, 0.0, 1.0)"));
    assert!(source.contains("return result;"));

    let names: Vec<_> = program.uniforms().iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, vec!["color_S0", "ellipse_S1"]);
    assert!(program.samplers().is_empty());
    Ok(())
}

#[test]
fn children_are_emitted_before_parents() -> anyhow::Result<()> {
    let caps = Caps::default();
    let child = ConstColorProcessor::make(Vec4::ONE, InputMode::ModulateRgba);
    let parent = ellipse_fp(
        Some(child),
        ClipEdgeType::InverseFillAa,
        Vec2::ZERO,
        Vec2::new(4.0, 4.0),
        &caps,
    );
    let pipeline = pipeline(InitArgs::default(), None, Some(parent), &caps);

    let program = ProgramBuilder::build(&pipeline, &caps)?;
    let source = program.source();

    let child_at = source.find("fn ConstColorProcessor_S0").expect("child function");
    let parent_at = source.find("fn EllipseEffect_S1").expect("parent function");
    assert!(child_at < parent_at);
    assert!(source.contains("_output = ConstColorProcessor_S0(_input) * alpha;"));
    assert!(source.contains("coverage = EllipseEffect_S1(coverage);"));
    assert!(!source.contains("coverage = ConstColorProcessor_S0"));
    Ok(())
}

#[test]
fn write_swizzle_applied_to_output() -> anyhow::Result<()> {
    let caps = Caps::default();
    let bgra = pipeline(
        InitArgs {
            write_swizzle: Swizzle::BGRA,
            ..InitArgs::default()
        },
        None,
        None,
        &caps,
    );
    let program = ProgramBuilder::build(&bgra, &caps)?;
    assert!(program.source().contains("return result.bgra;"));
    assert!(!program.source().contains("struct Uniforms"));
    Ok(())
}

#[test]
fn texture_effect_declares_bindings() -> anyhow::Result<()> {
    let caps = Caps::default();
    let proxy = TextureProxy::new(UVec2::new(128, 64), Mipmapped::No);
    let texture = TextureEffect::make(
        SurfaceProxyView::new(Arc::clone(&proxy), Swizzle::RGBA),
        SamplerState::default(),
    );
    let pipeline = pipeline(InitArgs::default(), Some(texture), None, &caps);

    let mut program = ProgramBuilder::build(&pipeline, &caps)?;
    assert!(program.source().contains("@group(1) @binding(0) var tex_S0: texture_2d<f32>;"));
    assert!(program.source().contains("@group(1) @binding(1) var tex_sampler_S0: sampler;"));
    assert_eq!(program.samplers().len(), 1);

    program.set_data(&pipeline);
    let handle = program.uniform_handle("inv_dimensions_S0").expect("declared");
    assert_eq!(program.uniform_data().get(handle), &[1.0 / 128.0, 1.0 / 64.0]);
    Ok(())
}

// ============================================================================
// Uniform Upload
// ============================================================================

#[test]
fn unchanged_ellipse_is_not_reuploaded() -> anyhow::Result<()> {
    let caps = Caps::default();
    let first = ellipse_pipeline(
        ClipEdgeType::FillAa,
        Vec2::new(10.0, 10.0),
        Vec2::new(5.0, 3.0),
        &caps,
    );
    let mut program = ProgramBuilder::build(&first, &caps)?;
    let handle = program.uniform_handle("ellipse_S0").expect("declared");

    program.set_data(&first);
    assert_eq!(
        program.uniform_data().get(handle),
        &[10.0, 10.0, 1.0 / 25.0, 1.0 / 9.0]
    );
    assert!(program.uniform_data_mut().take_dirty_bytes().is_some());

    program.set_data(&first);
    assert_eq!(program.uniform_data().write_count(handle), 1);
    assert!(program.uniform_data_mut().take_dirty_bytes().is_none());

    let moved = ellipse_pipeline(
        ClipEdgeType::FillAa,
        Vec2::new(20.0, 20.0),
        Vec2::new(5.0, 3.0),
        &caps,
    );
    program.set_data(&moved);
    assert_eq!(program.uniform_data().write_count(handle), 2);
    assert_eq!(
        program.uniform_data().get(handle),
        &[20.0, 20.0, 1.0 / 25.0, 1.0 / 9.0]
    );
    Ok(())
}

#[test]
fn medium_precision_uploads_scaled_radii() -> anyhow::Result<()> {
    let caps = Caps {
        shader_caps: ShaderCaps {
            float_is_32_bits: false,
        },
        ..Caps::default()
    };
    let pipeline = ellipse_pipeline(
        ClipEdgeType::FillBw,
        Vec2::new(1.0, 2.0),
        Vec2::new(2.0, 8.0),
        &caps,
    );
    let mut program = ProgramBuilder::build(&pipeline, &caps)?;
    assert!(program.source().contains("d = d * _uniforms.scale_S0.y;"));
    assert!(program.source().contains("approx_dist = approx_dist * _uniforms.scale_S0.x;"));

    program.set_data(&pipeline);
    let ellipse = program.uniform_handle("ellipse_S0").expect("ellipse");
    let scale = program.uniform_handle("scale_S0").expect("scale");
    assert_eq!(program.uniform_data().get(scale), &[8.0, 0.125]);
    assert_eq!(program.uniform_data().get(ellipse), &[1.0, 2.0, 16.0, 1.0]);
    Ok(())
}

#[test]
fn uniform_block_is_16_byte_aligned() -> anyhow::Result<()> {
    let caps = Caps {
        shader_caps: ShaderCaps {
            float_is_32_bits: false,
        },
        ..Caps::default()
    };
    let pipeline = ellipse_pipeline(
        ClipEdgeType::FillAa,
        Vec2::ZERO,
        Vec2::new(4.0, 4.0),
        &caps,
    );
    let program = ProgramBuilder::build(&pipeline, &caps)?;

    let offsets: Vec<_> = program.uniforms().iter().map(|u| u.offset).collect();
    assert_eq!(offsets, vec![0, 16]);
    assert_eq!(program.uniform_data().as_bytes().len(), 32);
    Ok(())
}

// ============================================================================
// Program Cache
// ============================================================================

#[test]
fn cache_shares_programs_between_equivalent_draws() -> anyhow::Result<()> {
    init_logger();
    let caps = Caps::default();
    let cache = ProgramCache::new(caps);

    let a = ellipse_pipeline(ClipEdgeType::FillAa, Vec2::splat(10.0), Vec2::new(5.0, 3.0), &caps);
    let b = ellipse_pipeline(ClipEdgeType::FillAa, Vec2::splat(20.0), Vec2::new(5.0, 3.0), &caps);
    let c = ellipse_pipeline(
        ClipEdgeType::InverseFillAa,
        Vec2::splat(10.0),
        Vec2::new(5.0, 3.0),
        &caps,
    );

    assert!(cache.find(&a).is_none());
    let pa = cache.find_or_create(&a)?;
    let pb = cache.find_or_create(&b)?;
    let pc = cache.find_or_create(&c)?;

    assert!(Arc::ptr_eq(&pa, &pb));
    assert!(!Arc::ptr_eq(&pa, &pc));

    let stats = cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 2);
    assert_eq!(stats.programs, 2);

    pb.lock().set_data(&b);
    let handle = pa.lock().uniform_handle("ellipse_S0").expect("declared");
    assert_eq!(pa.lock().uniform_data().get(handle)[..2], [20.0, 20.0]);

    cache.clear();
    assert!(cache.is_empty());
    Ok(())
}

#[test]
fn concurrent_lookups_keep_one_program() {
    let caps = Caps::default();
    let cache = ProgramCache::new(caps);
    let pipeline = ellipse_pipeline(
        ClipEdgeType::FillAa,
        Vec2::splat(8.0),
        Vec2::splat(4.0),
        &caps,
    );

    let programs: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(|| cache.find_or_create(&pipeline).expect("program builds")))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("thread panicked"))
            .collect()
    });

    assert_eq!(cache.len(), 1);
    let stats = cache.stats();
    assert_eq!(stats.hits + stats.misses, 4);
    let kept = cache.find(&pipeline).expect("cached");
    assert!(programs.iter().all(|p| Arc::ptr_eq(p, &kept)));
}
