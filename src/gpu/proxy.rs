//! GPU resource references.
//!
//! A [`TextureProxy`] stands in for a GPU texture whose backing allocation is
//! owned by an external resource cache. Everything in this crate holds proxies
//! through `Arc`; nothing here decides when the texture dies.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use glam::{IVec2, UVec2};

use super::swizzle::Swizzle;

/// Whether a resource needs (or has) a full mip chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mipmapped {
    #[default]
    No,
    Yes,
}

/// Stable identity of a proxy, unique for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProxyId(u32);

impl ProxyId {
    fn next() -> Self {
        static NEXT: AtomicU32 = AtomicU32::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    #[must_use]
    pub fn to_u32(self) -> u32 {
        self.0
    }
}

#[derive(Debug)]
pub struct TextureProxy {
    id: ProxyId,
    dimensions: UVec2,
    mipmapped: Mipmapped,
}

impl TextureProxy {
    #[must_use]
    pub fn new(dimensions: UVec2, mipmapped: Mipmapped) -> Arc<Self> {
        Arc::new(Self {
            id: ProxyId::next(),
            dimensions,
            mipmapped,
        })
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> ProxyId {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn dimensions(&self) -> UVec2 {
        self.dimensions
    }

    #[inline]
    #[must_use]
    pub fn mipmapped(&self) -> Mipmapped {
        self.mipmapped
    }
}

/// A proxy plus the swizzle that maps its stored channels to RGBA.
#[derive(Debug, Clone)]
pub struct SurfaceProxyView {
    proxy: Arc<TextureProxy>,
    swizzle: Swizzle,
}

impl SurfaceProxyView {
    #[must_use]
    pub fn new(proxy: Arc<TextureProxy>, swizzle: Swizzle) -> Self {
        Self { proxy, swizzle }
    }

    #[inline]
    #[must_use]
    pub fn proxy(&self) -> &Arc<TextureProxy> {
        &self.proxy
    }

    #[inline]
    #[must_use]
    pub fn swizzle(&self) -> Swizzle {
        self.swizzle
    }
}

/// Copy of the render target used by blend modes that read the destination.
///
/// `offset` is the position of the copied sub-rectangle within the target.
#[derive(Debug, Clone, Default)]
pub struct DstProxyView {
    proxy: Option<Arc<TextureProxy>>,
    offset: IVec2,
}

impl DstProxyView {
    #[must_use]
    pub fn new(proxy: Arc<TextureProxy>, offset: IVec2) -> Self {
        Self {
            proxy: Some(proxy),
            offset,
        }
    }

    #[inline]
    #[must_use]
    pub fn proxy(&self) -> Option<&Arc<TextureProxy>> {
        self.proxy.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn offset(&self) -> IVec2 {
        self.offset
    }
}
