//! # Strata
//!
//! Pipeline construction and shader composition core of a 2D GPU renderer,
//! plus the indexing rules of its shading-language front end.
//!
//! - [`sksl`]: expression types and `base[index]` resolution.
//! - [`gpu`]: fragment processor trees, pipeline descriptors, program keys
//!   and WGSL program generation.
//!
//! ```rust,ignore
//! use glam::Vec2;
//! use strata::gpu::*;
//!
//! let caps = Caps::default();
//! let coverage = EllipseEffect::make(
//!     None,
//!     ClipEdgeType::FillAa,
//!     Vec2::new(10.0, 10.0),
//!     Vec2::new(5.0, 3.0),
//!     caps.shader_caps(),
//! )
//! .ok();
//!
//! let mut processors = ProcessorSet::new(None, coverage, XferProcessor::default());
//! processors.finalize(&caps);
//! let pipeline = Pipeline::new(InitArgs::default(), processors, AppliedClip::disabled());
//!
//! let cache = ProgramCache::new(caps);
//! let program = cache.find_or_create(&pipeline)?;
//! program.lock().set_data(&pipeline);
//! ```

pub mod errors;
pub mod gpu;
pub mod sksl;

pub use errors::{Result, StrataError};
