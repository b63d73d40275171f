//! # Entity Allocation
//!
//! This module defines the generational entity allocator.
//!
//! ## Purpose
//! Entities are lightweight, opaque identifiers. The allocator is responsible
//! for:
//!
//! - Issuing stable entity identifiers
//! - Tracking entity liveness via generation counters
//! - Recycling freed slots without resurrecting stale handles
//!
//! ## Design
//! - Freed indices are kept on a LIFO free list and reused before the
//!   generation vector grows.
//! - A slot's generation is bumped on despawn, so every handle issued before
//!   the despawn answers `false` to [`EntityAllocator::is_alive`] forever,
//!   even after the slot is recycled.
//! - Generations begin at 1; generation 0 is reserved so the null identity
//!   (index 0, generation 0) can never be issued. The generation counter wraps
//!   modulo 2^16 and skips 0 when it does, which keeps that guarantee at the
//!   wrap boundary. Callers must tolerate ABA over such long horizons.
//!
//! ## Invariants
//! - `alive_count` equals the number of successful creates minus the number of
//!   successful destroys.
//! - Every index on the free list is less than `generations.len()`.
//!
//! All operations are total: destroying a null, out-of-range, or stale handle
//! is a silent no-op.

use crate::engine::types::{Entity, Generation};

/// Free-list entity allocator with generation counters.
#[derive(Default)]
pub struct EntityAllocator {
    generations: Vec<Generation>,
    free_list: Vec<u64>,
    alive_count: u64,
}

impl EntityAllocator {
    /// Creates an empty allocator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a new entity handle.
    ///
    /// ## Behavior
    /// - Recycles the most recently freed index if one exists, reusing the
    ///   slot's current (already bumped) generation.
    /// - Otherwise appends a fresh slot with generation 1.
    ///
    /// The returned handle is never the null identity.
    pub fn create(&mut self) -> Entity {
        if let Some(index) = self.free_list.pop() {
            let generation = self.generations[index as usize];
            self.alive_count += 1;
            return Entity::new(index, generation);
        }

        let index = self.generations.len() as u64;
        self.generations.push(1);
        self.alive_count += 1;
        Entity::new(index, 1)
    }

    /// Destroys an entity handle.
    ///
    /// ## Behavior
    /// - Null, out-of-range, and stale handles are ignored (idempotent).
    /// - Otherwise the slot generation is bumped (wrapping, skipping 0) and
    ///   the index is pushed onto the free list.
    pub fn destroy(&mut self, entity: Entity) {
        if entity.is_null() {
            return;
        }
        let index = entity.index() as usize;
        if index >= self.generations.len() {
            return;
        }
        if self.generations[index] != entity.generation() {
            return;
        }

        let bumped = self.generations[index].wrapping_add(1);
        // Generation 0 is reserved for the null identity.
        self.generations[index] = if bumped == 0 { 1 } else { bumped };
        self.free_list.push(entity.index());
        self.alive_count = self.alive_count.saturating_sub(1);
    }

    /// Returns `true` if the handle refers to a live entity.
    ///
    /// `false` on null, out-of-range, or generation mismatch.
    pub fn is_alive(&self, entity: Entity) -> bool {
        if entity.is_null() {
            return false;
        }
        let index = entity.index() as usize;
        index < self.generations.len() && self.generations[index] == entity.generation()
    }

    /// Returns the number of live entities.
    pub fn alive_count(&self) -> u64 {
        self.alive_count
    }

    /// Resets the allocator to its initial empty state.
    pub fn clear(&mut self) {
        self.generations.clear();
        self.free_list.clear();
        self.alive_count = 0;
    }

    /// Returns the generation currently stored at `index` (0 if out of range).
    ///
    /// Introspection helper for tests and diagnostics.
    pub fn generation_at(&self, index: u64) -> Generation {
        self.generations
            .get(index as usize)
            .copied()
            .unwrap_or(0)
    }
}
