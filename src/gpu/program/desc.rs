//! Program descriptors: the cache key of a compiled program.

use crate::gpu::caps::Caps;
use crate::gpu::key::{KeyBuilder, ProgramKey};
use crate::gpu::pipeline::Pipeline;

/// Everything that selects a distinct compiled program.
///
/// The pipeline key already covers processors, flags and blend state; the
/// descriptor adds the output swizzle and whether the program reads a
/// destination copy. Equality and hashing go through the key's digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProgramDesc {
    key: ProgramKey,
}

impl ProgramDesc {
    #[must_use]
    pub fn build(pipeline: &Pipeline, caps: &Caps) -> Self {
        let mut b = KeyBuilder::new();
        pipeline.gen_key(&mut b, caps);
        b.add_bits(16, u32::from(pipeline.write_swizzle().as_key()));
        b.add_bool(pipeline.dst_proxy_view().proxy().is_some());
        Self { key: b.finish() }
    }

    #[inline]
    #[must_use]
    pub fn key(&self) -> &ProgramKey {
        &self.key
    }

    /// xxh3-128 digest of the key bytes.
    #[inline]
    #[must_use]
    pub fn hash_u128(&self) -> u128 {
        self.key.digest()
    }
}
