//! Program-side half of a fragment processor.

use std::fmt::Write as _;

use crate::gpu::caps::ShaderCaps;
use crate::gpu::program::{FragmentShaderBuilder, UniformDataManager, UniformHandler};

use super::FragmentProcessor;

/// Emits shader code for one FP and uploads its uniforms on each draw.
///
/// One instance exists per FP node per compiled program. `on_set_data` takes
/// `&mut self` so an implementation may keep the last uploaded values and skip
/// redundant uploads; programs are never driven by two threads at once.
pub trait ProgramImpl: Send + Sync {
    /// Writes the body of this node's function. The body must assign the
    /// node's result to [`EmitArgs::output_color`].
    fn emit_code(&mut self, args: &mut EmitArgs<'_>);

    fn on_set_data(&mut self, pdman: &mut UniformDataManager, fp: &dyn FragmentProcessor);
}

pub struct EmitArgs<'a> {
    pub frag_builder: &'a mut FragmentShaderBuilder,
    pub uniform_handler: &'a mut UniformHandler,
    pub shader_caps: &'a ShaderCaps,
    pub fp: &'a dyn FragmentProcessor,
    /// Name of the incoming color (a `vec4<f32>` parameter).
    pub input_color: &'a str,
    /// Name of the variable the body must write.
    pub output_color: &'a str,
    /// Emitted function name of each child slot, `None` for a null child.
    pub(crate) child_functions: &'a [Option<String>],
}

impl EmitArgs<'_> {
    /// Expression evaluating child `index` on `input`.
    ///
    /// A null child passes its input through unchanged.
    #[must_use]
    pub fn invoke_child(&self, index: usize, input: &str) -> String {
        match self.child_functions.get(index) {
            Some(Some(func)) => format!("{func}({input})"),
            _ => input.to_string(),
        }
    }

    /// Appends formatted code to the function body.
    pub fn code_appendf(&mut self, args: std::fmt::Arguments<'_>) {
        let _ = self.frag_builder.write_fmt(args);
    }
}
