//! Error types for row insertion, column access, and query execution.
//!
//! This module declares focused, composable error types used across the
//! archetype storage and query pipeline. Each error carries enough context to
//! make failures actionable while remaining small and cheap to pass around or
//! convert into the aggregate [`ECSError`].
//!
//! ## Goals
//! * **Specificity:** Each error type models a single failure mode (e.g. a
//!   full chunk, a missing component value, an unknown column).
//! * **Ergonomics:** All errors implement [`std::error::Error`] and
//!   [`fmt::Display`], and provide `From<T>` conversions into aggregate
//!   variants so callers can use `?` throughout.
//! * **Actionability:** Structured fields (offending type identity, row counts
//!   versus capacity) make logs useful without reproducing the issue.
//!
//! ## Soft conditions
//! Two conditions in the design are deliberately *not* errors: a stale entity
//! handle (callers branch on `World::is_alive`) and a scheduler dependency
//! cycle (remaining systems are batched into a final serial stage). Neither
//! appears here.
//!
//! ## Display vs. Debug
//! * [`fmt::Display`] is optimized for operator logs (short, imperative
//!   phrasing).
//! * [`fmt::Debug`] (derived) retains full structure for diagnostics.

use std::fmt;

use crate::engine::types::TypeId;

/// Returned when a row insertion addresses a chunk that has no room left.
///
/// ## Context
/// The archetype allocates a fresh chunk whenever the last one is full, so
/// this error indicates an internal invariant violation rather than a
/// recoverable runtime condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkFullError {
    /// Rows already stored in the chunk.
    pub count: usize,

    /// Maximum rows the chunk can hold.
    pub capacity: usize,
}

impl fmt::Display for ChunkFullError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "chunk full: {} rows stored (capacity {})",
            self.count, self.capacity
        )
    }
}

impl std::error::Error for ChunkFullError {}

/// High-level error for spawning entities with components.
///
/// Aggregates the failure modes encountered while canonicalizing a component
/// bundle and writing its row into archetype storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpawnError {
    /// A non-empty column had no matching value in the supplied components.
    MissingComponent {
        /// Component type name, for diagnostics.
        name: &'static str,

        /// Stable identity of the missing component type.
        type_id: TypeId,
    },

    /// Row insertion attempted to exceed chunk capacity.
    ChunkFull(ChunkFullError),

    /// A supplied payload's byte length disagreed with the column stride.
    ///
    /// Indicates a corrupted bundle or a component registered with stale
    /// layout information.
    PayloadSizeMismatch {
        /// Stable identity of the offending component type.
        type_id: TypeId,

        /// Byte length the column expects per row.
        expected: usize,

        /// Byte length the payload supplied.
        actual: usize,
    },
}

impl fmt::Display for SpawnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpawnError::MissingComponent { name, .. } => {
                write!(f, "missing component value for column: {}", name)
            }
            SpawnError::ChunkFull(e) => write!(f, "{e}"),
            SpawnError::PayloadSizeMismatch { type_id, expected, actual } => write!(
                f,
                "payload size mismatch for component {:#018x}: expected {} bytes, got {}",
                type_id, expected, actual
            ),
        }
    }
}

impl std::error::Error for SpawnError {}

impl From<ChunkFullError> for SpawnError {
    fn from(e: ChunkFullError) -> Self { SpawnError::ChunkFull(e) }
}

/// Why a column borrow was rejected by the chunk view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessConflict {
    /// A read was requested while a write view of the column was live.
    ReadWhileWritten,

    /// A write was requested while any view of the column was live.
    WriteWhileBorrowed,
}

/// Returned when a chunk view borrow would alias a live column view.
///
/// ## Context
/// Within a single chunk callback, a column may be projected either as one
/// write view or any number of read views. The view tracks borrow states at
/// runtime and rejects the second conflicting projection instead of aliasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnAccessError {
    /// Stable identity of the contested component type.
    pub type_id: TypeId,

    /// Which rule the request violated.
    pub reason: AccessConflict,
}

impl fmt::Display for ColumnAccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.reason {
            AccessConflict::ReadWhileWritten => "read while write view is live",
            AccessConflict::WriteWhileBorrowed => "write while another view is live",
        };
        write!(f, "conflicting column access ({}): {:#018x}", what, self.type_id)
    }
}

impl std::error::Error for ColumnAccessError {}

/// Errors raised while executing a query or projecting a chunk view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryError {
    /// A column lookup named a component the archetype does not contain.
    UnknownComponent {
        /// Stable identity of the requested component type.
        type_id: TypeId,
    },

    /// A column borrow conflicted with a live view of the same column.
    Access(ColumnAccessError),
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::UnknownComponent { type_id } => {
                write!(f, "component not present in archetype: {:#018x}", type_id)
            }
            QueryError::Access(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for QueryError {}

impl From<ColumnAccessError> for QueryError {
    fn from(e: ColumnAccessError) -> Self { QueryError::Access(e) }
}

/// Aggregate error type for all fallible ECS operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ECSError {
    /// Entity spawning or row insertion failed.
    Spawn(SpawnError),

    /// Query execution or chunk view projection failed.
    Query(QueryError),
}

impl fmt::Display for ECSError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ECSError::Spawn(e) => write!(f, "{e}"),
            ECSError::Query(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ECSError {}

impl From<SpawnError> for ECSError {
    fn from(e: SpawnError) -> Self { ECSError::Spawn(e) }
}
impl From<ChunkFullError> for ECSError {
    fn from(e: ChunkFullError) -> Self { ECSError::Spawn(SpawnError::ChunkFull(e)) }
}
impl From<QueryError> for ECSError {
    fn from(e: QueryError) -> Self { ECSError::Query(e) }
}
impl From<ColumnAccessError> for ECSError {
    fn from(e: ColumnAccessError) -> Self { ECSError::Query(QueryError::Access(e)) }
}

/// Result alias used across the engine.
pub type ECSResult<T> = Result<T, ECSError>;
