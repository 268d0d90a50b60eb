//! Constant color fragment processor.

use glam::Vec4;

use crate::gpu::caps::ShaderCaps;
use crate::gpu::fp::{
    ClassId, EmitArgs, FragmentProcessor, OptimizationFlags, ProcessorBase, ProgramImpl,
    impl_processor_boilerplate,
};
use crate::gpu::key::KeyBuilder;
use crate::gpu::program::{ShaderVisibility, UniformDataManager, UniformHandle, UniformType};

/// How the constant color combines with the incoming color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u32)]
pub enum InputMode {
    #[default]
    Ignore = 0,
    ModulateRgba,
    ModulateA,
}

/// Outputs a (premultiplied) uniform color.
#[derive(Debug, Clone)]
pub struct ConstColorProcessor {
    base: ProcessorBase,
    color: Vec4,
    mode: InputMode,
}

impl ConstColorProcessor {
    const NAME: &'static str = "ConstColorProcessor";

    #[must_use]
    pub fn new(color: Vec4, mode: InputMode) -> Self {
        let mut flags = OptimizationFlags::CONSTANT_OUTPUT_FOR_CONSTANT_INPUT;
        if mode != InputMode::Ignore {
            flags |= OptimizationFlags::MODULATES_INPUT
                | OptimizationFlags::COMPATIBLE_WITH_COVERAGE_AS_ALPHA;
        }
        if color.w >= 1.0 {
            flags |= OptimizationFlags::PRESERVES_OPAQUE_INPUT;
        }
        Self {
            base: ProcessorBase::new(flags),
            color,
            mode,
        }
    }

    #[must_use]
    pub fn make(color: Vec4, mode: InputMode) -> Box<dyn FragmentProcessor> {
        Box::new(Self::new(color, mode))
    }

    #[inline]
    #[must_use]
    pub fn color(&self) -> Vec4 {
        self.color
    }

    /// Changes the color. The key is unaffected; the next upload picks it up.
    pub fn set_color(&mut self, color: Vec4) {
        self.color = color;
    }

    #[inline]
    #[must_use]
    pub fn input_mode(&self) -> InputMode {
        self.mode
    }
}

impl FragmentProcessor for ConstColorProcessor {
    impl_processor_boilerplate!();

    fn class_id(&self) -> ClassId {
        ClassId::ConstColorProcessor
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn on_add_to_key(&self, _caps: &ShaderCaps, b: &mut KeyBuilder) {
        b.add_bits(2, self.mode as u32);
    }

    fn on_is_equal(&self, other: &dyn FragmentProcessor) -> bool {
        other
            .cast::<Self>()
            .is_some_and(|that| self.color == that.color && self.mode == that.mode)
    }

    fn make_program_impl(&self) -> Box<dyn ProgramImpl> {
        Box::<ConstColorProgramImpl>::default()
    }

    fn dump_info(&self) -> String {
        format!("(color={}, mode={:?})", self.color, self.mode)
    }
}

#[derive(Debug, Default)]
struct ConstColorProgramImpl {
    color_var: Option<UniformHandle>,
    prev_color: Option<Vec4>,
}

impl ProgramImpl for ConstColorProgramImpl {
    fn emit_code(&mut self, args: &mut EmitArgs<'_>) {
        let fp = args.fp;
        let mode = fp
            .cast::<ConstColorProcessor>()
            .map_or(InputMode::Ignore, ConstColorProcessor::input_mode);

        let color_var = args.uniform_handler.add_uniform(
            ConstColorProcessor::NAME,
            ShaderVisibility::FRAGMENT,
            UniformType::Float4,
            "color",
        );
        self.color_var = Some(color_var);

        let color = args.uniform_handler.uniform_var(color_var);
        let (input, output) = (args.input_color, args.output_color);
        match mode {
            InputMode::Ignore => args.code_appendf(format_args!("{output} = {color};\n")),
            InputMode::ModulateRgba => {
                args.code_appendf(format_args!("{output} = {color} * {input};\n"));
            }
            InputMode::ModulateA => {
                args.code_appendf(format_args!("{output} = {color} * {input}.a;\n"));
            }
        }
    }

    fn on_set_data(&mut self, pdman: &mut UniformDataManager, fp: &dyn FragmentProcessor) {
        let (Some(cc), Some(var)) = (fp.cast::<ConstColorProcessor>(), self.color_var) else {
            return;
        };
        if self.prev_color == Some(cc.color) {
            log::trace!("ConstColorProcessor upload skipped");
            return;
        }
        let c = cc.color;
        pdman.set4f(var, c.x, c.y, c.z, c.w);
        self.prev_color = Some(c);
    }
}
