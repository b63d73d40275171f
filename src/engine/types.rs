//! Core ECS Types, Identifiers, and Bit-Level Layouts
//!
//! This module defines the **fundamental types, identifiers, and bit layouts**
//! used throughout the ECS engine. These definitions form the *semantic
//! backbone* of the system and are shared across all subsystems, including
//! entity management, archetypes, queries, scheduling, and commands.
//!
//! ## Entity Representation
//!
//! Entities are encoded as a packed 64-bit integer with the following layout:
//!
//! ```text
//! | generation:16 | index:48 |
//! ```
//!
//! - **Index** identifies the entity slot in the allocator.
//! - **Generation** enables stale-entity detection after despawning.
//!
//! Index 0 with generation 0 is the reserved null identity; generations of
//! live entities therefore start at 1.
//!
//! The exact bit widths are controlled by compile-time constants and validated
//! using static assertions.
//!
//! ## Epochs
//!
//! The world carries a monotonic [`Epoch`] counter, advanced explicitly by the
//! user. Chunks stamp per-column *write* and *added* clocks with the epoch
//! current at the time of the operation; queries compare those clocks against
//! the current epoch to implement `Changed` and `Added` filtering. Epoch 0 is
//! the sentinel "never".
//!
//! ## Type Identity
//!
//! Component types are identified by a process-stable 64-bit [`TypeId`]
//! derived from the fully-qualified type name (see `component::type_id_of`).
//! Archetype signatures are canonical sorted sequences of these identifiers.

/// Bit-width type used for compile-time layout calculations.
pub type Bits = u8;

/// Globally unique entity identifier encoded as a packed 64-bit value.
pub type EntityId = u64;
/// Generation counter used to detect stale entities.
pub type Generation = u16;
/// Monotonic world tick used to stamp and filter column clocks.
pub type Epoch = u64;

/// Stable 64-bit identity of a component type.
pub type TypeId = u64;

/// Unique identifier for a registered system (its registration index).
pub type SystemId = u32;

/// Total number of bits in an [`EntityId`].
pub const ENTITY_BITS: Bits = 64;
/// Number of bits reserved for the entity index.
pub const INDEX_BITS: Bits = 48;
/// Number of bits reserved for entity generations.
pub const GENERATION_BITS: Bits = ENTITY_BITS - INDEX_BITS;

const _: [(); 1] = [(); (INDEX_BITS > 0) as usize];
const _: [(); 1] = [(); (GENERATION_BITS > 0) as usize];
const _: [(); 1] = [(); (INDEX_BITS + GENERATION_BITS == ENTITY_BITS) as usize];

const fn mask(bits: Bits) -> EntityId {
    if bits == 0 { 0 } else { ((1 as EntityId) << bits) - 1 }
}

/// Mask selecting the index portion of an [`EntityId`].
pub const INDEX_MASK: EntityId = mask(INDEX_BITS);
/// Mask selecting the generation portion after shifting.
pub const GENERATION_MASK: EntityId = mask(GENERATION_BITS);

/// Epoch value meaning "never stamped".
pub const EPOCH_NEVER: Epoch = 0;

/// Default per-chunk byte budget (64 KiB).
pub const DEFAULT_CHUNK_BYTES: usize = 64 * 1024;

/// Opaque, versioned identifier for an ECS entity.
///
/// ## Representation
/// Packs an index and a generation into a single 64-bit value. Two entities
/// with the same index but different generations are distinct; a despawn bumps
/// the slot generation, invalidating all previously issued handles.
///
/// ## Notes
/// `Entity` values are cheap to copy and compare and are safe to pass across
/// threads.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Entity(pub EntityId);

#[inline]
const fn make_id(index: u64, generation: Generation) -> EntityId {
    ((generation as EntityId) << INDEX_BITS) | (index & INDEX_MASK)
}

impl Entity {
    /// The reserved null identity (index 0, generation 0).
    pub const NULL: Entity = Entity(0);

    /// Packs an index and generation into an entity handle.
    #[inline]
    pub const fn new(index: u64, generation: Generation) -> Self {
        Entity(make_id(index, generation))
    }

    /// Returns the index component of this entity.
    #[inline]
    pub const fn index(self) -> u64 {
        self.0 & INDEX_MASK
    }

    /// Returns the generation component of this entity.
    #[inline]
    pub const fn generation(self) -> Generation {
        ((self.0 >> INDEX_BITS) & GENERATION_MASK) as Generation
    }

    /// Returns `true` if this is the reserved null identity.
    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == Entity::NULL.0
    }
}
