//! # World
//!
//! The world owns the entity allocator, the archetype vector, the signature
//! index, and the epoch counter. It is the single entry point for spawning
//! and despawning entities and for advancing the change-detection clock.
//!
//! ## Known limitations (by design)
//! - `despawn` retires the entity id only; the row stays in its chunk and
//!   queries continue to iterate it. Consumers that care cross-check
//!   [`World::is_alive`] against the chunk's entity array at read time.
//! - `clear` resets the entity allocator; archetype storage is retained.

use fnv::FnvHashMap;

use crate::engine::archetype::{Archetype, ArchetypeSignature};
use crate::engine::component::ComponentBundle;
use crate::engine::entity::EntityAllocator;
use crate::engine::error::ECSResult;
use crate::engine::types::{Entity, Epoch, DEFAULT_CHUNK_BYTES};

/// Container for entities, archetype storage, and the epoch clock.
pub struct World {
    entities: EntityAllocator,
    archetypes: Vec<Archetype>,
    signature_index: FnvHashMap<ArchetypeSignature, usize>,
    epoch: Epoch,
    chunk_budget: usize,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Creates an empty world with the default 64 KiB chunk budget.
    pub fn new() -> Self {
        Self::with_chunk_budget(DEFAULT_CHUNK_BYTES)
    }

    /// Creates an empty world with a custom per-chunk byte budget.
    pub fn with_chunk_budget(chunk_budget_bytes: usize) -> Self {
        Self {
            entities: EntityAllocator::new(),
            archetypes: Vec::new(),
            signature_index: FnvHashMap::default(),
            epoch: 1,
            chunk_budget: chunk_budget_bytes,
        }
    }

    /// Current value of the epoch clock. Never less than 1.
    #[inline]
    pub fn current_epoch(&self) -> Epoch {
        self.epoch
    }

    /// Advances the epoch clock by one. No other state changes.
    #[inline]
    pub fn next_epoch(&mut self) {
        self.epoch += 1;
    }

    /// Creates an entity with no components.
    ///
    /// Does not touch the archetype store.
    pub fn spawn_empty(&mut self) -> Entity {
        self.entities.create()
    }

    /// Creates an entity with the given component values.
    ///
    /// The bundle's signature is canonicalized; the matching archetype is
    /// looked up or created lazily; the row is inserted and every column is
    /// stamped with the current epoch.
    pub fn spawn<B: ComponentBundle>(&mut self, bundle: B) -> ECSResult<Entity> {
        let entity = self.entities.create();
        let index = self.get_or_create_archetype::<B>();
        let epoch = self.epoch;
        self.archetypes[index].insert(entity, epoch, &bundle)?;
        Ok(entity)
    }

    /// Destroys an entity id.
    ///
    /// Tolerant: null, out-of-range, and stale ids are ignored. The entity's
    /// row, if any, is not removed from its chunk (see module docs).
    pub fn despawn(&mut self, entity: Entity) {
        self.entities.destroy(entity);
    }

    /// Returns `true` if the id refers to a live entity.
    #[inline]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    /// Number of live entities.
    #[inline]
    pub fn alive_count(&self) -> u64 {
        self.entities.alive_count()
    }

    /// Resets the entity allocator. Archetype storage is retained.
    pub fn clear(&mut self) {
        self.entities.clear();
    }

    /// Read-only view of the archetype list, in creation order.
    #[inline]
    pub fn archetypes(&self) -> &[Archetype] {
        &self.archetypes
    }

    /// Read access to the entity allocator.
    #[inline]
    pub fn entity_allocator(&self) -> &EntityAllocator {
        &self.entities
    }

    /// Number of chunks currently allocated for a bundle's archetype.
    ///
    /// Testing helper; returns 0 when no such archetype exists.
    pub fn chunk_count_for<B: ComponentBundle>(&self) -> usize {
        let signature = ArchetypeSignature::from_unordered(B::type_ids());
        self.signature_index
            .get(&signature)
            .map_or(0, |&index| self.archetypes[index].chunk_count())
    }

    /// Per-chunk row capacity of a bundle's archetype.
    ///
    /// Testing helper; returns 0 when no such archetype exists.
    pub fn chunk_capacity_for<B: ComponentBundle>(&self) -> usize {
        let signature = ArchetypeSignature::from_unordered(B::type_ids());
        self.signature_index
            .get(&signature)
            .map_or(0, |&index| self.archetypes[index].chunk_capacity())
    }

    /// Mutable archetype access for query iteration.
    #[inline]
    pub(crate) fn archetypes_mut(&mut self) -> &mut [Archetype] {
        &mut self.archetypes
    }

    fn get_or_create_archetype<B: ComponentBundle>(&mut self) -> usize {
        let signature = ArchetypeSignature::from_unordered(B::type_ids());
        if let Some(&index) = self.signature_index.get(&signature) {
            return index;
        }

        // Component infos in canonical (signature) order, deduplicated.
        let mut infos = B::infos();
        infos.sort_unstable_by_key(|info| info.id);
        infos.dedup_by_key(|info| info.id);
        debug_assert_eq!(infos.len(), signature.types().len());

        log::trace!(
            "world: creating archetype {} ({} columns, hash {:#018x})",
            self.archetypes.len(),
            infos.len(),
            signature.hash_value(),
        );

        let index = self.archetypes.len();
        self.archetypes
            .push(Archetype::new(signature.clone(), infos, self.chunk_budget));
        self.signature_index.insert(signature, index);
        index
    }
}
