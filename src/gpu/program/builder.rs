//! Program Assembly
//!
//! Turns a [`Pipeline`] into WGSL. Each FP node becomes one function
//!
//! ```wgsl
//! fn EllipseEffect_S1(_input: vec4<f32>) -> vec4<f32> { ... }
//! ```
//!
//! emitted in post-order, so a parent can call its children by name. The
//! pipeline's root FPs are then chained in `fs_main` by the program template:
//! color roots transform the vertex color, coverage roots the coverage, and
//! the write swizzle is applied to `color * coverage`.

use std::fmt;

use crate::errors::Result;
use crate::gpu::caps::Caps;
use crate::gpu::fp::{EmitArgs, FragmentProcessor, ProgramImpl};
use crate::gpu::pipeline::Pipeline;

use super::template::{ProgramContext, render_fragment_program};
use super::uniform::{
    SamplerInfo, UniformDataManager, UniformHandle, UniformHandler, UniformInfo,
};

const INPUT_COLOR: &str = "_input";
const OUTPUT_COLOR: &str = "_output";

/// Accumulates the body of the function currently being emitted.
#[derive(Debug, Default)]
pub struct FragmentShaderBuilder {
    code: String,
}

impl FragmentShaderBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn code_append(&mut self, code: &str) {
        self.code.push_str(code);
    }

    /// Built-in holding the fragment's window position.
    #[must_use]
    pub fn frag_coord(&self) -> &'static str {
        "sk_FragCoord"
    }

    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Returns the body indented one level, leaving the builder empty.
    fn finish_body(&mut self) -> String {
        let code = std::mem::take(&mut self.code);
        let mut out = String::with_capacity(code.len() + 64);
        for line in code.lines() {
            if !line.trim().is_empty() {
                out.push_str("    ");
                out.push_str(line);
            }
            out.push('\n');
        }
        out
    }
}

impl fmt::Write for FragmentShaderBuilder {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.code.push_str(s);
        Ok(())
    }
}

// ─── Program ─────────────────────────────────────────────────────────────────

/// A compiled (generated) program plus the per-node upload objects.
pub struct Program {
    source: String,
    uniforms: Vec<UniformInfo>,
    samplers: Vec<SamplerInfo>,
    impls: Vec<Box<dyn ProgramImpl>>,
    pdman: UniformDataManager,
}

impl fmt::Debug for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Program")
            .field("uniforms", &self.uniforms)
            .field("samplers", &self.samplers)
            .field("num_impls", &self.impls.len())
            .finish_non_exhaustive()
    }
}

impl Program {
    /// Complete WGSL fragment module.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn uniforms(&self) -> &[UniformInfo] {
        &self.uniforms
    }

    #[must_use]
    pub fn samplers(&self) -> &[SamplerInfo] {
        &self.samplers
    }

    #[must_use]
    pub fn uniform_data(&self) -> &UniformDataManager {
        &self.pdman
    }

    pub fn uniform_data_mut(&mut self) -> &mut UniformDataManager {
        &mut self.pdman
    }

    /// Handle of the uniform with mangled name `name` (e.g. `ellipse_S0`).
    #[must_use]
    pub fn uniform_handle(&self, name: &str) -> Option<UniformHandle> {
        self.uniforms
            .iter()
            .position(|u| u.name == name)
            .map(UniformHandle::from_index)
    }

    /// Uploads per-draw values of `pipeline`, which must have the same key as
    /// the pipeline this program was built from.
    pub fn set_data(&mut self, pipeline: &Pipeline) {
        let impls = &mut self.impls;
        let pdman = &mut self.pdman;
        let mut index = 0;
        for fp in pipeline.fragment_processors() {
            fp.visit_post_order(&mut |node| {
                if let Some(imp) = impls.get_mut(index) {
                    imp.on_set_data(pdman, node);
                }
                index += 1;
            });
        }
        debug_assert_eq!(index, impls.len(), "pipeline does not match program");
    }
}

// ─── Builder ─────────────────────────────────────────────────────────────────

pub struct ProgramBuilder<'a> {
    caps: &'a Caps,
    uniform_handler: UniformHandler,
    frag_builder: FragmentShaderBuilder,
    functions: Vec<String>,
    impls: Vec<Box<dyn ProgramImpl>>,
}

impl<'a> ProgramBuilder<'a> {
    pub fn build(pipeline: &Pipeline, caps: &'a Caps) -> Result<Program> {
        let mut builder = Self {
            caps,
            uniform_handler: UniformHandler::new(),
            frag_builder: FragmentShaderBuilder::new(),
            functions: Vec::new(),
            impls: Vec::new(),
        };

        let mut color_stages = Vec::new();
        let mut coverage_stages = Vec::new();
        for (i, fp) in pipeline.fragment_processors().enumerate() {
            let func = builder.emit_tree(fp);
            if i < pipeline.num_color_fragment_processors() {
                color_stages.push(func);
            } else {
                coverage_stages.push(func);
            }
        }

        let ctx = ProgramContext {
            uniforms: builder.uniform_handler.uniforms(),
            samplers: builder.uniform_handler.samplers(),
            functions: &builder.functions,
            color_stages: &color_stages,
            coverage_stages: &coverage_stages,
            output_swizzle: pipeline.write_swizzle().apply("result"),
        };
        let source = render_fragment_program(&ctx)?;

        log::debug!(
            "Built program: {} functions, {} uniforms, {} samplers",
            builder.functions.len(),
            builder.uniform_handler.uniforms().len(),
            builder.uniform_handler.samplers().len()
        );

        let pdman = UniformDataManager::new(&builder.uniform_handler);
        Ok(Program {
            source,
            uniforms: builder.uniform_handler.uniforms().to_vec(),
            samplers: builder.uniform_handler.samplers().to_vec(),
            impls: builder.impls,
            pdman,
        })
    }

    /// Emits `fp`'s subtree and returns the name of its root function.
    fn emit_tree(&mut self, fp: &dyn FragmentProcessor) -> String {
        let child_functions = fp
            .base()
            .children()
            .map(|child| child.map(|c| self.emit_tree(c)))
            .collect::<Vec<_>>();

        let stage_index = self.impls.len();
        let func_name = format!("{}_S{stage_index}", fp.name());
        self.uniform_handler.enter_stage(stage_index);

        let mut imp = fp.make_program_impl();
        let mut args = EmitArgs {
            frag_builder: &mut self.frag_builder,
            uniform_handler: &mut self.uniform_handler,
            shader_caps: self.caps.shader_caps(),
            fp,
            input_color: INPUT_COLOR,
            output_color: OUTPUT_COLOR,
            child_functions: &child_functions,
        };
        imp.emit_code(&mut args);

        let body = self.frag_builder.finish_body();
        self.functions.push(format!(
            "fn {func_name}({INPUT_COLOR}: vec4<f32>) -> vec4<f32> {{\n    var {OUTPUT_COLOR}: vec4<f32>;\n{body}    return {OUTPUT_COLOR};\n}}"
        ));
        self.impls.push(imp);
        func_name
    }
}
