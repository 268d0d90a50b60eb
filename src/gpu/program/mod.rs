//! Program Generation
//!
//! Key → cache → (on miss) WGSL emission → per-draw uniform upload.

pub mod builder;
pub mod cache;
pub mod desc;
pub mod template;
pub mod uniform;

pub use builder::{FragmentShaderBuilder, Program, ProgramBuilder};
pub use cache::{CacheStats, ProgramCache, SharedProgram};
pub use desc::ProgramDesc;
pub use uniform::{
    SamplerHandle, SamplerInfo, ShaderVisibility, UniformDataManager, UniformHandle,
    UniformHandler, UniformInfo, UniformType,
};
