//! Clip state handed to pipeline construction.
//!
//! The clip system (external) reduces a clip stack to fixed-function state
//! ([`AppliedHardClip`]: scissor, window rectangles, stencil) plus at most one
//! coverage fragment processor.

use smallvec::SmallVec;

use super::fp::FragmentProcessor;

/// Integer device-space rectangle, `[left, right) x [top, bottom)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct IRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl IRect {
    #[must_use]
    pub fn from_ltrb(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScissorState {
    rect: Option<IRect>,
}

impl ScissorState {
    #[must_use]
    pub fn enabled(rect: IRect) -> Self {
        Self { rect: Some(rect) }
    }

    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.rect.is_some()
    }

    #[inline]
    #[must_use]
    pub fn rect(&self) -> Option<IRect> {
        self.rect
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowRectsMode {
    /// Draw only outside the windows.
    #[default]
    Exclusive,
    /// Draw only inside the windows.
    Inclusive,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WindowRectsState {
    windows: SmallVec<[IRect; 4]>,
    mode: WindowRectsMode,
}

impl WindowRectsState {
    #[must_use]
    pub fn new(windows: &[IRect], mode: WindowRectsMode) -> Self {
        Self {
            windows: windows.iter().copied().collect(),
            mode,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.mode == WindowRectsMode::Inclusive || !self.windows.is_empty()
    }

    #[must_use]
    pub fn windows(&self) -> &[IRect] {
        &self.windows
    }

    #[must_use]
    pub fn mode(&self) -> WindowRectsMode {
        self.mode
    }
}

/// Clipping that is applied purely through fixed-function state.
#[derive(Debug, Clone, Default)]
pub struct AppliedHardClip {
    pub scissor_state: ScissorState,
    pub window_rects_state: WindowRectsState,
    /// Identifier of the clip stack element rendered into the stencil buffer.
    pub stencil_stack_id: Option<u32>,
}

impl AppliedHardClip {
    #[inline]
    #[must_use]
    pub fn has_stencil_clip(&self) -> bool {
        self.stencil_stack_id.is_some()
    }
}

/// Result of applying the clip stack to one draw.
#[derive(Debug, Default)]
pub struct AppliedClip {
    hard_clip: AppliedHardClip,
    coverage_fp: Option<Box<dyn FragmentProcessor>>,
}

impl AppliedClip {
    /// No clipping at all.
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn new(hard_clip: AppliedHardClip, coverage_fp: Option<Box<dyn FragmentProcessor>>) -> Self {
        Self {
            hard_clip,
            coverage_fp,
        }
    }

    #[inline]
    #[must_use]
    pub fn hard_clip(&self) -> &AppliedHardClip {
        &self.hard_clip
    }

    #[inline]
    #[must_use]
    pub fn has_coverage_fragment_processor(&self) -> bool {
        self.coverage_fp.is_some()
    }

    #[must_use]
    pub fn coverage_fragment_processor(&self) -> Option<&dyn FragmentProcessor> {
        self.coverage_fp.as_deref()
    }

    pub fn detach_coverage_fragment_processor(&mut self) -> Option<Box<dyn FragmentProcessor>> {
        self.coverage_fp.take()
    }
}
