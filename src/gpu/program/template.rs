//! Program template environment.
//!
//! The outer WGSL skeleton (uniform block, bindings, `fs_main`) is a
//! minijinja template embedded with `rust-embed`. Debug builds read it from
//! disk first so it can be edited without recompiling.

use std::borrow::Cow;
use std::sync::OnceLock;

use minijinja::{Environment, Error, syntax::SyntaxConfig};
use rust_embed::RustEmbed;
use serde::Serialize;

use super::uniform::{SamplerInfo, UniformInfo};

#[cfg(debug_assertions)]
const SHADER_DIR: &str = "src/gpu/program/shaders";

pub const FRAGMENT_PROGRAM_TEMPLATE: &str = "fragment_program";

static PROGRAM_ENV: OnceLock<Environment<'static>> = OnceLock::new();

#[derive(RustEmbed)]
#[folder = "src/gpu/program/shaders"]
struct ProgramTemplates;

pub fn get_env() -> &'static Environment<'static> {
    PROGRAM_ENV.get_or_init(|| {
        let mut env = Environment::new();

        let syntax = SyntaxConfig::builder()
            .block_delimiters("{$", "$}")
            .variable_delimiters("{{", "}}")
            .line_statement_prefix("$$")
            .build()
            .expect("Failed to configure Jinja2 syntax");

        env.set_syntax(syntax);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_undefined_behavior(minijinja::UndefinedBehavior::SemiStrict);

        env.set_loader(template_loader);

        env
    })
}

fn template_loader(name: &str) -> Result<Option<String>, Error> {
    let filename = if std::path::Path::new(name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wgsl"))
    {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!("{name}.wgsl"))
    };

    #[cfg(debug_assertions)]
    {
        let path = std::path::Path::new(SHADER_DIR).join(filename.as_ref());
        if path.exists() {
            return std::fs::read_to_string(&path).map(Some).map_err(|e| {
                Error::new(
                    minijinja::ErrorKind::TemplateNotFound,
                    format!("Failed to read file: {e}"),
                )
            });
        }
    }

    if let Some(file) = ProgramTemplates::get(&filename)
        && let Ok(source) = std::str::from_utf8(file.data.as_ref())
    {
        return Ok(Some(source.to_string()));
    }

    Ok(None)
}

/// Values consumed by `fragment_program.wgsl`.
#[derive(Debug, Serialize)]
pub struct ProgramContext<'a> {
    pub uniforms: &'a [UniformInfo],
    pub samplers: &'a [SamplerInfo],
    pub functions: &'a [String],
    pub color_stages: &'a [String],
    pub coverage_stages: &'a [String],
    pub output_swizzle: String,
}

/// Renders the complete fragment program.
pub fn render_fragment_program(ctx: &ProgramContext<'_>) -> Result<String, Error> {
    let template = get_env().get_template(FRAGMENT_PROGRAM_TEMPLATE)?;
    let source = template.render(ctx)?;
    Ok(format!("// === Generated Fragment Program ===\n{source}"))
}
