//! GPU Pipeline Construction
//!
//! Per-draw state is gathered into a [`Pipeline`](pipeline::Pipeline):
//!
//! ```text
//! ProcessorSet (paint) ─┐
//! AppliedClip  (clip)  ─┼─► Pipeline ─► ProgramKey ─► ProgramCache ─► Program::set_data
//! InitArgs     (draw)  ─┘        │
//!                                └─► visit_proxies ─► ProxyDependencies
//! ```
//!
//! - [`fp`]: the fragment processor tree protocol.
//! - [`effects`]: concrete processors (ellipse coverage, texture, constant color).
//! - [`key`]: bit-packed program keys.
//! - [`program`]: WGSL emission, uniforms and the program cache.
//! - [`wgpu_state`]: fixed-function state for `wgpu` pipeline descriptors.

pub mod blend;
pub mod caps;
pub mod clip;
pub mod dependencies;
pub mod effects;
pub mod fp;
pub mod key;
pub mod pipeline;
pub mod processor_set;
pub mod program;
pub mod proxy;
pub mod sampler;
pub mod swizzle;
pub mod wgpu_state;
pub mod xfer;

pub use blend::{BlendCoeff, BlendEquation, BlendInfo};
pub use caps::{Caps, ShaderCaps};
pub use clip::{AppliedClip, AppliedHardClip, IRect, ScissorState, WindowRectsMode, WindowRectsState};
pub use dependencies::ProxyDependencies;
pub use effects::{ClipEdgeType, ConstColorProcessor, EllipseEffect, InputMode, TextureEffect};
pub use fp::{ClassId, FpResult, FragmentProcessor, OptimizationFlags, ProcessorBase, ProgramImpl};
pub use key::{KeyBuilder, ProgramKey};
pub use pipeline::{InitArgs, Pipeline, PipelineFlags, UserStencilSettings, mask_input_flags};
pub use processor_set::{ProcessorAnalysis, ProcessorSet};
pub use program::{Program, ProgramBuilder, ProgramCache, ProgramDesc};
pub use proxy::{DstProxyView, Mipmapped, ProxyId, SurfaceProxyView, TextureProxy};
pub use sampler::{Filter, MipmapMode, SamplerState, WrapMode};
pub use swizzle::Swizzle;
pub use xfer::{BlendMode, XferBarrierType, XferProcessor};
