//! Surface generation tracker: detects surface-id reuse.
//!
//! The render host may hand out the same surface id again after a
//! surface is destroyed. Tracking generations lets a detached window's
//! non-owning reference distinguish the surface it was born on from a
//! later tenant of the same id.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use floatplay_core::types::SurfaceId;

#[derive(Debug, Clone, Default)]
pub struct SurfaceTracker {
    live: HashMap<SurfaceId, (u64, DateTime<Utc>)>,
    retired: HashMap<SurfaceId, u64>,
}

impl SurfaceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a surface id is present. A first sighting gets
    /// generation 0; a sighting after retirement gets the next
    /// generation. Re-observing a live surface changes nothing.
    pub fn observe(&mut self, surface: &SurfaceId, now: DateTime<Utc>) -> u64 {
        if let Some((generation, _)) = self.live.get(surface) {
            return *generation;
        }
        let generation = self
            .retired
            .remove(surface)
            .map(|last| last + 1)
            .unwrap_or(0);
        self.live.insert(surface.clone(), (generation, now));
        generation
    }

    /// Retire a surface id (surface closed).
    pub fn retire(&mut self, surface: &SurfaceId) {
        if let Some((generation, _)) = self.live.remove(surface) {
            self.retired.insert(surface.clone(), generation);
        }
    }

    /// Generation and first-seen timestamp for a live surface.
    pub fn get(&self, surface: &SurfaceId) -> Option<(u64, DateTime<Utc>)> {
        self.live.get(surface).copied()
    }

    pub fn is_live(&self, surface: &SurfaceId) -> bool {
        self.live.contains_key(surface)
    }

    /// Live surface ids, in no particular order.
    pub fn surfaces(&self) -> Vec<SurfaceId> {
        self.live.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}
