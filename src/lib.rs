//! # epoch-ecs
//!
//! Archetype-based Entity-Component-System (ECS) runtime storing components
//! in column-major chunked memory, with epoch-stamped change detection and a
//! dependency-staged serial scheduler.
//!
//! ## Design Goals
//! - Archetype-based storage for cache efficiency
//! - Bit-copyable components only; rows move with plain byte copies
//! - Explicit, declared data access driving both query views and scheduling
//! - Deterministic staging with command-flush barriers
//!
//! ## Quick start
//! ```ignore
//! use epoch_ecs::prelude::*;
//!
//! #[repr(C)]
//! #[derive(Clone, Copy, Pod, Zeroable)]
//! struct Position { x: f32, y: f32 }
//! impl Component for Position {}
//!
//! let mut world = World::new();
//! let entity = world.spawn((Position { x: 0.0, y: 0.0 },))?;
//!
//! Query::<(Write<Position>,)>::new().for_chunks(&mut world, |view| {
//!     let mut positions = view.write::<Position>()?;
//!     for i in view.begin()..view.end() {
//!         positions[i].x += 1.0;
//!     }
//!     Ok(())
//! })?;
//! ```

#![forbid(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

pub mod engine;

// ─────────────────────────────────────────────────────────────────────────────
// Re-exports (Public API)
// ─────────────────────────────────────────────────────────────────────────────

pub use engine::types::{
    Entity,
    EntityId,
    Epoch,
    Generation,
    SystemId,
    TypeId,
    DEFAULT_CHUNK_BYTES,
    EPOCH_NEVER,
};

pub use engine::component::{
    describe_component,
    type_id_of,
    Component,
    ComponentBundle,
    ComponentInfo,
    ComponentPayload,
};

pub use engine::entity::EntityAllocator;

pub use engine::archetype::{
    Archetype,
    ArchetypeSignature,
    Chunk,
    ColumnLayout,
};

pub use engine::world::World;

pub use engine::query::{
    Added,
    Changed,
    ChunkView,
    ColumnRead,
    ColumnWrite,
    Opt,
    Query,
    QueryTerm,
    Read,
    TermList,
    TermSpec,
    With,
    Without,
    Write,
};

pub use engine::commands::Commands;

pub use engine::scheduler::{
    make_system,
    Scheduler,
    SystemDescriptor,
};

pub use engine::error::{
    AccessConflict,
    ChunkFullError,
    ColumnAccessError,
    ECSError,
    ECSResult,
    QueryError,
    SpawnError,
};

// ─────────────────────────────────────────────────────────────────────────────
// Prelude
// ─────────────────────────────────────────────────────────────────────────────

/// Commonly used ECS types.
///
/// Import with:
/// ```rust
/// use epoch_ecs::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        make_system,
        Added,
        Changed,
        Commands,
        Component,
        ECSResult,
        Entity,
        Opt,
        Query,
        Read,
        Scheduler,
        SystemDescriptor,
        With,
        Without,
        World,
        Write,
    };
    pub use bytemuck::{Pod, Zeroable};
}
