//! Fragment Processors
//!
//! A fragment processor (FP) is a node in a tree of per-pixel shading
//! computations. Concrete effects implement [`FragmentProcessor`]; the
//! tree-wide operations (structural equality, key generation, resource
//! visitation) are provided once on `dyn FragmentProcessor`.
//!
//! # Ownership
//!
//! Children are owned exclusively by their parent (`Box`), there are no back
//! edges, and cloning is always deep: a clone can outlive the original and be
//! attached to an unrelated pipeline.
//!
//! # Emission vs. data
//!
//! An FP itself is immutable draw data. Code emission and per-draw uniform
//! upload are done by the [`ProgramImpl`] object it creates, which lives
//! inside a compiled program.

mod program_impl;

pub use program_impl::{EmitArgs, ProgramImpl};

use std::any::Any;
use std::sync::Arc;

use bitflags::bitflags;
use smallvec::SmallVec;

use super::caps::ShaderCaps;
use super::effects::TextureEffect;
use super::key::KeyBuilder;
use super::proxy::{Mipmapped, TextureProxy};

bitflags! {
    /// Facts about an FP's output that let the pipeline skip work.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct OptimizationFlags: u32 {
        const MODULATES_INPUT                     = 1 << 0;
        const COMPATIBLE_WITH_COVERAGE_AS_ALPHA   = 1 << 1;
        const PRESERVES_OPAQUE_INPUT              = 1 << 2;
        const CONSTANT_OUTPUT_FOR_CONSTANT_INPUT  = 1 << 3;
    }
}

/// Stable identifier of an FP class; the first word of every FP key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassId {
    EllipseEffect,
    TextureEffect,
    ConstColorProcessor,
    /// Effects defined outside this crate. Values must not collide.
    Custom(u16),
}

impl ClassId {
    #[must_use]
    pub fn as_u32(self) -> u32 {
        match self {
            Self::EllipseEffect => 1,
            Self::TextureEffect => 2,
            Self::ConstColorProcessor => 3,
            Self::Custom(id) => 0x1_0000 | u32::from(id),
        }
    }
}

/// Outcome of a fallible effect factory. On failure the caller gets its input
/// processor back untouched so it can try another strategy.
pub type FpResult = Result<Box<dyn FragmentProcessor>, Option<Box<dyn FragmentProcessor>>>;

/// Key word written in place of a missing (null) child.
const NULL_CHILD_KEY: u32 = u32::MAX;

// ─── Shared Node State ───────────────────────────────────────────────────────

/// State common to every FP: ordered child slots and optimization flags.
#[derive(Debug, Clone, Default)]
pub struct ProcessorBase {
    flags: OptimizationFlags,
    children: SmallVec<[Option<Box<dyn FragmentProcessor>>; 1]>,
}

impl ProcessorBase {
    #[must_use]
    pub fn new(flags: OptimizationFlags) -> Self {
        Self {
            flags,
            children: SmallVec::new(),
        }
    }

    /// Appends a child slot. `None` is a legal placeholder: invoking it in
    /// shader code yields the input color unchanged.
    pub fn register_child(&mut self, child: Option<Box<dyn FragmentProcessor>>) {
        self.children.push(child);
    }

    #[inline]
    #[must_use]
    pub fn optimization_flags(&self) -> OptimizationFlags {
        self.flags
    }

    #[inline]
    #[must_use]
    pub fn num_children(&self) -> usize {
        self.children.len()
    }

    #[must_use]
    pub fn child(&self, index: usize) -> Option<&dyn FragmentProcessor> {
        self.children.get(index).and_then(|c| c.as_deref())
    }

    #[must_use]
    pub fn child_mut(&mut self, index: usize) -> Option<&mut Box<dyn FragmentProcessor>> {
        self.children.get_mut(index).and_then(Option::as_mut)
    }

    pub fn children(&self) -> impl Iterator<Item = Option<&dyn FragmentProcessor>> {
        self.children.iter().map(|c| c.as_deref())
    }
}

/// Flags an FP may claim given the FP it wraps; everything when there is none.
#[must_use]
pub fn processor_optimization_flags(fp: Option<&dyn FragmentProcessor>) -> OptimizationFlags {
    fp.map_or(OptimizationFlags::all(), |fp| fp.optimization_flags())
}

// ─── The Trait ───────────────────────────────────────────────────────────────

pub trait FragmentProcessor: Any + Send + Sync + std::fmt::Debug {
    fn class_id(&self) -> ClassId;

    /// Human-readable class name, also used to name emitted functions.
    fn name(&self) -> &'static str;

    fn base(&self) -> &ProcessorBase;

    fn base_mut(&mut self) -> &mut ProcessorBase;

    /// Deep copy, children included.
    fn clone_fp(&self) -> Box<dyn FragmentProcessor>;

    /// Appends the parameters that select different generated code.
    /// Values that only flow through uniforms must not be added.
    fn on_add_to_key(&self, caps: &ShaderCaps, b: &mut KeyBuilder);

    /// Node-local equality. `other` is guaranteed to have the same class id.
    fn on_is_equal(&self, other: &dyn FragmentProcessor) -> bool;

    fn make_program_impl(&self) -> Box<dyn ProgramImpl>;

    /// `Some` for nodes that sample a texture.
    fn texture_effect(&self) -> Option<&TextureEffect> {
        None
    }

    /// Parameter summary for debug logs.
    fn dump_info(&self) -> String {
        String::new()
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    #[inline]
    fn optimization_flags(&self) -> OptimizationFlags {
        self.base().optimization_flags()
    }

    #[inline]
    fn num_children(&self) -> usize {
        self.base().num_children()
    }

    #[inline]
    fn child_processor(&self, index: usize) -> Option<&dyn FragmentProcessor> {
        self.base().child(index)
    }
}

impl Clone for Box<dyn FragmentProcessor> {
    fn clone(&self) -> Self {
        self.clone_fp()
    }
}

impl dyn FragmentProcessor {
    /// Downcasts to a concrete effect.
    #[must_use]
    pub fn cast<T: FragmentProcessor>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    #[must_use]
    pub fn cast_mut<T: FragmentProcessor>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    /// Structural equality: same class, equal node parameters and pairwise
    /// equal children in the same order.
    #[must_use]
    pub fn is_equal(&self, that: &dyn FragmentProcessor) -> bool {
        if self.class_id() != that.class_id() || !self.on_is_equal(that) {
            return false;
        }
        if self.num_children() != that.num_children() {
            return false;
        }
        self.base()
            .children()
            .zip(that.base().children())
            .all(|pair| match pair {
                (Some(a), Some(b)) => a.is_equal(b),
                (None, None) => true,
                _ => false,
            })
    }

    /// Appends this subtree's key: class id, child count, node key, then each
    /// child depth-first (or a null marker for empty slots).
    pub fn add_to_key(&self, caps: &ShaderCaps, b: &mut KeyBuilder) {
        b.add32(self.class_id().as_u32());
        b.add32(self.num_children() as u32);
        self.on_add_to_key(caps, b);
        b.flush();
        for child in self.base().children() {
            match child {
                Some(child) => child.add_to_key(caps, b),
                None => b.add32(NULL_CHILD_KEY),
            }
        }
    }

    /// Calls `f` on every texture effect in this subtree, pre-order.
    pub fn visit_texture_effects(&self, f: &mut dyn FnMut(&TextureEffect)) {
        if let Some(te) = self.texture_effect() {
            f(te);
        }
        for child in self.base().children().flatten() {
            child.visit_texture_effects(f);
        }
    }

    /// Calls `f` once for each proxy sampled in this subtree, with whether the
    /// sampler needs mipmaps.
    pub fn visit_proxies(&self, f: &mut dyn FnMut(&Arc<TextureProxy>, Mipmapped)) {
        self.visit_texture_effects(&mut |te| {
            let mipmapped = if te.sampler_state().mipmapped() {
                Mipmapped::Yes
            } else {
                Mipmapped::No
            };
            f(te.view().proxy(), mipmapped);
        });
    }

    /// Children first, then the node itself; null children are skipped.
    /// This is the order in which programs emit and upload nodes.
    pub fn visit_post_order<'a>(&'a self, f: &mut dyn FnMut(&'a dyn FragmentProcessor)) {
        for child in self.base().children().flatten() {
            child.visit_post_order(f);
        }
        f(self);
    }
}

/// Implements the boilerplate accessors of [`FragmentProcessor`].
macro_rules! impl_processor_boilerplate {
    () => {
        fn base(&self) -> &$crate::gpu::fp::ProcessorBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut $crate::gpu::fp::ProcessorBase {
            &mut self.base
        }

        fn clone_fp(&self) -> Box<dyn $crate::gpu::fp::FragmentProcessor> {
            Box::new(self.clone())
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }
    };
}

pub(crate) use impl_processor_boilerplate;
