//! Concrete fragment processors.

mod const_color;
mod ellipse;
mod texture;

pub use const_color::{ConstColorProcessor, InputMode};
pub use ellipse::EllipseEffect;
pub use texture::TextureEffect;

/// How a coverage effect treats the region bounded by its shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ClipEdgeType {
    /// Inside is 1, outside 0, no antialiasing.
    FillBw = 0,
    /// Inside is 1, outside 0, antialiased across the edge.
    FillAa,
    InverseFillBw,
    InverseFillAa,
    /// Only meaningful for stroked geometry; shape effects discard.
    HairlineAa,
}

#[cfg(test)]
pub(crate) mod test_util {
    use crate::gpu::caps::ShaderCaps;
    use crate::gpu::fp::{EmitArgs, FragmentProcessor, ProgramImpl};
    use crate::gpu::program::{FragmentShaderBuilder, UniformHandle, UniformHandler};

    pub struct Emitted {
        pub program_impl: Box<dyn ProgramImpl>,
        pub handler: UniformHandler,
        pub code: String,
    }

    impl Emitted {
        /// Handle of the `i`-th declared uniform.
        pub fn handler_uniform(&self, i: usize) -> UniformHandle {
            assert!(i < self.handler.uniforms().len());
            UniformHandle::from_index(i)
        }
    }

    /// Emits `fp` alone as stage 0, treating every child slot as null.
    pub fn emit_single(fp: &dyn FragmentProcessor, caps: &ShaderCaps) -> Emitted {
        let mut handler = UniformHandler::new();
        handler.enter_stage(0);
        let mut builder = FragmentShaderBuilder::new();
        let children = vec![None; fp.num_children()];
        let mut program_impl = fp.make_program_impl();
        let mut args = EmitArgs {
            frag_builder: &mut builder,
            uniform_handler: &mut handler,
            shader_caps: caps,
            fp,
            input_color: "_input",
            output_color: "_output",
            child_functions: &children,
        };
        program_impl.emit_code(&mut args);
        Emitted {
            program_impl,
            handler,
            code: builder.code().to_string(),
        }
    }
}
