//! The paint-derived processors of a draw.

use std::sync::Arc;

use super::caps::Caps;
use super::fp::{FragmentProcessor, OptimizationFlags};
use super::xfer::{BlendMode, XferBarrierType, XferProcessor};

/// What [`ProcessorSet::finalize`] learned about the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProcessorAnalysis {
    pub requires_dst_texture: bool,
    pub requires_non_overlapping_draws: bool,
    /// Coverage may be folded into the color's alpha.
    pub compatible_with_coverage_as_alpha: bool,
}

/// Color FP, coverage FP and transfer processor of one draw.
///
/// Must be finalized before being handed to a pipeline; the pipeline then
/// takes the FPs out of the set.
#[derive(Debug, Clone)]
pub struct ProcessorSet {
    color_fp: Option<Box<dyn FragmentProcessor>>,
    coverage_fp: Option<Box<dyn FragmentProcessor>>,
    xfer: Arc<XferProcessor>,
    finalized: bool,
}

impl ProcessorSet {
    #[must_use]
    pub fn new(
        color_fp: Option<Box<dyn FragmentProcessor>>,
        coverage_fp: Option<Box<dyn FragmentProcessor>>,
        xfer: XferProcessor,
    ) -> Self {
        Self {
            color_fp,
            coverage_fp,
            xfer: Arc::new(xfer),
            finalized: false,
        }
    }

    /// No processors, src-over blending.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(None, None, XferProcessor::default())
    }

    #[must_use]
    pub fn from_blend_mode(mode: BlendMode) -> Self {
        Self::new(None, None, XferProcessor::from_blend_mode(mode))
    }

    pub fn finalize(&mut self, caps: &Caps) -> ProcessorAnalysis {
        debug_assert!(!self.finalized, "processor set finalized twice");
        self.finalized = true;

        let coverage_as_alpha = [self.color_fp.as_deref(), self.coverage_fp.as_deref()]
            .into_iter()
            .flatten()
            .all(|fp| {
                fp.optimization_flags()
                    .contains(OptimizationFlags::COMPATIBLE_WITH_COVERAGE_AS_ALPHA)
            });

        let analysis = ProcessorAnalysis {
            requires_dst_texture: self.xfer.needs_dst_texture(caps),
            requires_non_overlapping_draws: self.xfer.xfer_barrier_type(caps)
                == XferBarrierType::Blend,
            compatible_with_coverage_as_alpha: coverage_as_alpha,
        };
        log::debug!("ProcessorSet finalized: {analysis:?}");
        analysis
    }

    #[inline]
    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    #[must_use]
    pub fn has_color_fragment_processor(&self) -> bool {
        self.color_fp.is_some()
    }

    #[must_use]
    pub fn has_coverage_fragment_processor(&self) -> bool {
        self.coverage_fp.is_some()
    }

    #[must_use]
    pub fn color_fragment_processor(&self) -> Option<&dyn FragmentProcessor> {
        self.color_fp.as_deref()
    }

    #[must_use]
    pub fn coverage_fragment_processor(&self) -> Option<&dyn FragmentProcessor> {
        self.coverage_fp.as_deref()
    }

    pub fn detach_color_fragment_processor(&mut self) -> Option<Box<dyn FragmentProcessor>> {
        self.color_fp.take()
    }

    pub fn detach_coverage_fragment_processor(&mut self) -> Option<Box<dyn FragmentProcessor>> {
        self.coverage_fp.take()
    }

    #[must_use]
    pub fn ref_xfer_processor(&self) -> Arc<XferProcessor> {
        Arc::clone(&self.xfer)
    }
}
