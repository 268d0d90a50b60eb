//! Program Cache
//!
//! Deduplicates generated programs by [`ProgramDesc`]. Lookups take a shared
//! lock; only a miss takes the write lock, and it re-checks before inserting
//! so concurrent misses on the same key build at most one program that is
//! kept.
//!
//! A cache serves exactly one [`Caps`]: descriptors do not encode the
//! capability set, so sharing a cache between contexts with different caps
//! would alias programs.
//!
//! Cached programs are handed out as `Arc<Mutex<Program>>`. The mutex is the
//! external synchronization required by per-node upload caching: one draw at a
//! time may call [`Program::set_data`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;

use crate::errors::Result;
use crate::gpu::caps::Caps;
use crate::gpu::pipeline::Pipeline;

use super::builder::{Program, ProgramBuilder};
use super::desc::ProgramDesc;

pub type SharedProgram = Arc<Mutex<Program>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub programs: usize,
}

pub struct ProgramCache {
    caps: Caps,
    programs: RwLock<FxHashMap<ProgramDesc, SharedProgram>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ProgramCache {
    #[must_use]
    pub fn new(caps: Caps) -> Self {
        Self {
            caps,
            programs: RwLock::new(FxHashMap::default()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    #[inline]
    #[must_use]
    pub fn caps(&self) -> &Caps {
        &self.caps
    }

    /// Returns the cached program for `pipeline`, building it on a miss.
    pub fn find_or_create(&self, pipeline: &Pipeline) -> Result<SharedProgram> {
        let desc = ProgramDesc::build(pipeline, &self.caps);

        if let Some(program) = self.programs.read().get(&desc) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(program));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let program = ProgramBuilder::build(pipeline, &self.caps)?;
        log::debug!(
            "Program cache miss, key {} bytes, digest {:032x}",
            desc.key().len(),
            desc.hash_u128()
        );

        let mut programs = self.programs.write();
        let entry = programs
            .entry(desc)
            .or_insert_with(|| Arc::new(Mutex::new(program)));
        Ok(Arc::clone(entry))
    }

    /// Looks up without building.
    #[must_use]
    pub fn find(&self, pipeline: &Pipeline) -> Option<SharedProgram> {
        let desc = ProgramDesc::build(pipeline, &self.caps);
        self.programs.read().get(&desc).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.programs.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.programs.read().is_empty()
    }

    pub fn clear(&self) {
        self.programs.write().clear();
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            programs: self.len(),
        }
    }
}
