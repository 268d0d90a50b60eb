//! Collects the GPU resources a draw depends on.
//!
//! Fed by [`Pipeline::visit_proxies`]; the result is what a resource cache
//! must keep alive (and mip-complete) until the draw has executed.
//!
//! [`Pipeline::visit_proxies`]: super::pipeline::Pipeline::visit_proxies

use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::pipeline::Pipeline;
use super::proxy::{Mipmapped, ProxyId, TextureProxy};

#[derive(Debug, Default)]
pub struct ProxyDependencies {
    order: Vec<ProxyId>,
    entries: FxHashMap<ProxyId, (Arc<TextureProxy>, Mipmapped)>,
}

impl ProxyDependencies {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_pipeline(pipeline: &Pipeline) -> Self {
        let mut deps = Self::new();
        pipeline.visit_proxies(&mut |proxy, mipmapped| deps.add(proxy, mipmapped));
        deps
    }

    /// Records `proxy`. A proxy seen several times needs mips if any use does.
    pub fn add(&mut self, proxy: &Arc<TextureProxy>, mipmapped: Mipmapped) {
        let id = proxy.id();
        match self.entries.get_mut(&id) {
            Some(entry) => {
                if mipmapped == Mipmapped::Yes {
                    entry.1 = Mipmapped::Yes;
                }
            }
            None => {
                self.order.push(id);
                self.entries.insert(id, (Arc::clone(proxy), mipmapped));
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    #[must_use]
    pub fn mipmapped(&self, id: ProxyId) -> Option<Mipmapped> {
        self.entries.get(&id).map(|(_, m)| *m)
    }

    /// Proxies in first-visit order.
    pub fn iter(&self) -> impl Iterator<Item = (&Arc<TextureProxy>, Mipmapped)> {
        self.order.iter().filter_map(|id| {
            self.entries
                .get(id)
                .map(|(proxy, mipmapped)| (proxy, *mipmapped))
        })
    }
}
