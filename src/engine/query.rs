//! Typed query construction and execution over archetype chunks.
//!
//! A query is parameterized by a compile-time term list. Each term is one of
//! the marker types [`Read`], [`Write`], [`Opt`], [`With`], [`Without`],
//! [`Changed`], [`Added`]; a tuple of terms forms a [`TermList`]. At
//! construction the list is partitioned into the sorted, deduplicated sets
//! that drive matching and filtering, so all decisions are made before any
//! chunk is touched.
//!
//! ## Execution model
//! 1. Archetypes match when they contain every required/with type and none of
//!    the without types (binary search over the canonical signature).
//! 2. Within a matched archetype, chunks are filtered by the epoch clocks:
//!    `Changed<T>` requires the column's write clock to equal the current
//!    epoch, `Added<T>` the add clock.
//! 3. Before the callback runs for a chunk, the write clock of every declared
//!    `Write<T>` column is stamped with the current epoch. The stamp is the
//!    contract of the declaration; it is applied whether or not the callback
//!    mutates the column.
//! 4. The callback receives a [`ChunkView`] projecting typed column slices
//!    over rows `[begin, end)`.
//!
//! ## Column borrow discipline
//! The view hands out column projections over the same chunk memory, so it
//! tracks a per-column borrow state at runtime (free, one writer, or N
//! readers) and rejects conflicting projections with an error instead of
//! aliasing. Guards release their column when dropped. Structural mutation
//! from inside the callback is impossible by construction: the world is
//! exclusively borrowed by the iteration; deferred mutation goes through the
//! command buffer.

use std::cell::Cell;
use std::marker::PhantomData;
use std::mem::size_of;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;
use std::slice;

use crate::engine::archetype::{ArchetypeSignature, Chunk, ColumnLayout};
use crate::engine::component::{type_id_of, Component};
use crate::engine::error::{AccessConflict, ColumnAccessError, ECSResult, QueryError};
use crate::engine::types::{Entity, TypeId};
use crate::engine::world::World;

/// Term: the archetype must contain `T`; the view provides read access.
pub struct Read<T: Component>(PhantomData<T>);
/// Term: the archetype must contain `T`; the view provides write access and
/// the chunk's write clock is stamped on entry.
pub struct Write<T: Component>(PhantomData<T>);
/// Term: no matching constraint; the view may or may not contain `T`.
pub struct Opt<T: Component>(PhantomData<T>);
/// Term: the archetype must contain `T`; no view access implied.
pub struct With<T: Component>(PhantomData<T>);
/// Term: the archetype must **not** contain `T`.
pub struct Without<T: Component>(PhantomData<T>);
/// Term: only yield chunks whose `T` write clock equals the current epoch.
pub struct Changed<T: Component>(PhantomData<T>);
/// Term: only yield chunks whose `T` add clock equals the current epoch.
pub struct Added<T: Component>(PhantomData<T>);

/// The partitioned access sets of a query, determined before iteration.
#[derive(Clone, Debug, Default)]
pub struct TermSpec {
    /// Types the archetype must contain (Read/Write/Changed/Added).
    pub required: Vec<TypeId>,
    /// Types the archetype must contain without view access (With).
    pub with: Vec<TypeId>,
    /// Types the archetype must not contain (Without).
    pub without: Vec<TypeId>,
    /// Types whose write clock is stamped per visited chunk (Write).
    pub writes: Vec<TypeId>,
    /// Types filtered by write clock (Changed).
    pub changed: Vec<TypeId>,
    /// Types filtered by add clock (Added).
    pub added: Vec<TypeId>,
    /// Types declared read-only (Read); used for system scheduling.
    pub reads: Vec<TypeId>,
}

impl TermSpec {
    fn normalize(&mut self) {
        for set in [
            &mut self.required,
            &mut self.with,
            &mut self.without,
            &mut self.writes,
            &mut self.changed,
            &mut self.added,
            &mut self.reads,
        ] {
            set.sort_unstable();
            set.dedup();
        }
    }
}

/// A single query term, contributing to the partitioned sets.
pub trait QueryTerm {
    /// Records this term's contribution.
    fn apply(spec: &mut TermSpec);
}

impl<T: Component> QueryTerm for Read<T> {
    fn apply(spec: &mut TermSpec) {
        let id = type_id_of::<T>();
        spec.required.push(id);
        spec.reads.push(id);
    }
}

impl<T: Component> QueryTerm for Write<T> {
    fn apply(spec: &mut TermSpec) {
        let id = type_id_of::<T>();
        spec.required.push(id);
        spec.writes.push(id);
    }
}

impl<T: Component> QueryTerm for Opt<T> {
    fn apply(_spec: &mut TermSpec) {}
}

impl<T: Component> QueryTerm for With<T> {
    fn apply(spec: &mut TermSpec) {
        spec.with.push(type_id_of::<T>());
    }
}

impl<T: Component> QueryTerm for Without<T> {
    fn apply(spec: &mut TermSpec) {
        spec.without.push(type_id_of::<T>());
    }
}

impl<T: Component> QueryTerm for Changed<T> {
    fn apply(spec: &mut TermSpec) {
        let id = type_id_of::<T>();
        spec.required.push(id);
        spec.changed.push(id);
    }
}

impl<T: Component> QueryTerm for Added<T> {
    fn apply(spec: &mut TermSpec) {
        let id = type_id_of::<T>();
        spec.required.push(id);
        spec.added.push(id);
    }
}

/// A compile-time list of query terms (a tuple of [`QueryTerm`]s).
pub trait TermList {
    /// Records every term's contribution, in order.
    fn collect(spec: &mut TermSpec);
}

macro_rules! impl_term_list {
    ($($name:ident),+) => {
        impl<$($name: QueryTerm),+> TermList for ($($name,)+) {
            fn collect(spec: &mut TermSpec) {
                $($name::apply(spec);)+
            }
        }
    };
}

impl_term_list!(A);
impl_term_list!(A, B);
impl_term_list!(A, B, C);
impl_term_list!(A, B, C, D);
impl_term_list!(A, B, C, D, E);
impl_term_list!(A, B, C, D, E, F);
impl_term_list!(A, B, C, D, E, F, G);
impl_term_list!(A, B, C, D, E, F, G, H);

/// A query over a compile-time term list.
///
/// ```ignore
/// let query = Query::<(Write<Transform>, Read<Velocity>)>::new();
/// query.for_chunks(&mut world, |view| {
///     let velocity = view.read::<Velocity>()?;
///     let mut transform = view.write::<Transform>()?;
///     for i in view.begin()..view.end() {
///         transform[i].x += velocity[i].vx * dt;
///     }
///     Ok(())
/// })?;
/// ```
pub struct Query<L: TermList> {
    spec: TermSpec,
    _terms: PhantomData<fn() -> L>,
}

impl<L: TermList> Default for Query<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: TermList> Query<L> {
    /// Builds the query's partitioned access sets from the term list.
    pub fn new() -> Self {
        let mut spec = TermSpec::default();
        L::collect(&mut spec);
        spec.normalize();
        Self { spec, _terms: PhantomData }
    }

    /// The query's partitioned access sets.
    #[inline]
    pub fn spec(&self) -> &TermSpec {
        &self.spec
    }

    /// Returns `true` if an archetype with this signature matches.
    ///
    /// Matching requires every required/with type present and every without
    /// type absent.
    pub fn matches(&self, signature: &ArchetypeSignature) -> bool {
        self.spec.required.iter().all(|&t| signature.contains(t))
            && self.spec.with.iter().all(|&t| signature.contains(t))
            && !self.spec.without.iter().any(|&t| signature.contains(t))
    }

    /// Iterates every matched, filter-passing chunk in a single pass.
    ///
    /// Archetypes are visited in creation order, chunks in creation order.
    /// Empty chunks are skipped. The callback may fail; the first error
    /// aborts the pass and propagates.
    pub fn for_chunks<F>(&self, world: &mut World, mut f: F) -> ECSResult<()>
    where
        F: FnMut(&mut ChunkView<'_>) -> ECSResult<()>,
    {
        let epoch = world.current_epoch();

        for archetype in world.archetypes_mut() {
            if !self.matches(archetype.signature()) {
                continue;
            }

            let (signature, columns, chunks) = archetype.split_for_iteration();

            // Matching guarantees presence of every filtered or written type;
            // resolve their column indices once per archetype.
            let changed_columns = resolve_columns(signature, &self.spec.changed)?;
            let added_columns = resolve_columns(signature, &self.spec.added)?;
            let write_columns = resolve_columns(signature, &self.spec.writes)?;

            for chunk in chunks.iter_mut() {
                if chunk.count() == 0 {
                    continue;
                }
                if changed_columns
                    .iter()
                    .any(|&c| chunk.write_version(c) != epoch)
                {
                    continue;
                }
                if added_columns
                    .iter()
                    .any(|&c| chunk.added_version(c) != epoch)
                {
                    continue;
                }

                for &c in &write_columns {
                    chunk.bump_write_version(c, epoch);
                }

                let mut view = ChunkView::new(signature, columns, chunk);
                f(&mut view)?;
            }
        }

        Ok(())
    }
}

fn resolve_columns(
    signature: &ArchetypeSignature,
    types: &[TypeId],
) -> Result<Vec<usize>, QueryError> {
    types
        .iter()
        .map(|&t| {
            signature
                .index_of(t)
                .ok_or(QueryError::UnknownComponent { type_id: t })
        })
        .collect()
}

// Per-column borrow state: 0 free, -1 one writer, n > 0 that many readers.
type BorrowFlag = isize;

/// A transient typed window over one chunk, valid for a single callback.
///
/// Indices `[begin, end)` are valid for every column of the archetype and for
/// the parallel [`ChunkView::entities`] array.
pub struct ChunkView<'a> {
    signature: &'a ArchetypeSignature,
    columns: &'a [ColumnLayout],
    entities: &'a [Entity],
    ptrs: Vec<Option<NonNull<u8>>>,
    borrows: Vec<Cell<BorrowFlag>>,
    count: usize,
    // The chunk is exclusively borrowed for 'a; column projections subdivide
    // that exclusivity per column, policed by `borrows`.
    _chunk: PhantomData<&'a mut Chunk>,
}

impl<'a> ChunkView<'a> {
    pub(crate) fn new(
        signature: &'a ArchetypeSignature,
        columns: &'a [ColumnLayout],
        chunk: &'a mut Chunk,
    ) -> Self {
        let chunk: &'a Chunk = chunk;
        let ptrs = (0..columns.len()).map(|c| chunk.column_ptr(c)).collect();
        Self {
            signature,
            columns,
            entities: chunk.entities(),
            ptrs,
            borrows: (0..columns.len()).map(|_| Cell::new(0)).collect(),
            count: chunk.count(),
            _chunk: PhantomData,
        }
    }

    /// First valid row index. Always 0.
    #[inline]
    pub fn begin(&self) -> usize {
        0
    }

    /// One past the last valid row index.
    #[inline]
    pub fn end(&self) -> usize {
        self.count
    }

    /// Number of rows in the view.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns `true` if the view holds no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Entity ids of the rows, parallel to every column.
    ///
    /// Rows of despawned entities remain in the chunk; cross-check
    /// `World::is_alive` when that matters.
    #[inline]
    pub fn entities(&self) -> &[Entity] {
        &self.entities[..self.count]
    }

    /// Returns `true` if the archetype contains component `T`.
    ///
    /// Supports `Opt<T>` terms, whose view presence varies per archetype.
    #[inline]
    pub fn contains<T: Component>(&self) -> bool {
        self.signature.contains(type_id_of::<T>())
    }

    fn column_of<T: Component>(&self) -> Result<usize, QueryError> {
        let type_id = type_id_of::<T>();
        let column = self
            .signature
            .index_of(type_id)
            .ok_or(QueryError::UnknownComponent { type_id })?;
        debug_assert_eq!(self.columns[column].stride, size_of::<T>());
        Ok(column)
    }

    #[inline]
    fn data_ptr<T>(&self, column: usize) -> *mut T {
        match self.ptrs[column] {
            Some(ptr) => ptr.as_ptr().cast::<T>(),
            // Tag columns hold no storage; a dangling pointer is valid for
            // zero-sized element reads.
            None => NonNull::<T>::dangling().as_ptr(),
        }
    }

    /// Projects column `T` as a read-only slice.
    ///
    /// ## Errors
    /// - `UnknownComponent` if the archetype does not contain `T`.
    /// - `Access` if a write projection of `T` is live.
    pub fn read<T: Component>(&self) -> ECSResult<ColumnRead<'_, T>> {
        let column = self.column_of::<T>()?;
        let state = &self.borrows[column];
        if state.get() < 0 {
            return Err(ColumnAccessError {
                type_id: type_id_of::<T>(),
                reason: AccessConflict::ReadWhileWritten,
            }
            .into());
        }
        state.set(state.get() + 1);

        // Safety: the chunk is exclusively borrowed for 'a and the borrow
        // state now records a reader, so no write projection of this column
        // can coexist. The column allocation holds at least `count`
        // elements of T (alignment and stride established at construction).
        let slice = unsafe { slice::from_raw_parts(self.data_ptr::<T>(column), self.count) };
        Ok(ColumnRead { slice, state })
    }

    /// Projects column `T` as a mutable slice.
    ///
    /// ## Errors
    /// - `UnknownComponent` if the archetype does not contain `T`.
    /// - `Access` if any projection of `T` is live.
    pub fn write<T: Component>(&self) -> ECSResult<ColumnWrite<'_, T>> {
        let column = self.column_of::<T>()?;
        let state = &self.borrows[column];
        if state.get() != 0 {
            return Err(ColumnAccessError {
                type_id: type_id_of::<T>(),
                reason: AccessConflict::WriteWhileBorrowed,
            }
            .into());
        }
        state.set(-1);

        // Safety: as in `read`, plus the borrow state now records the unique
        // writer, so this is the only live projection of the column.
        let slice = unsafe { slice::from_raw_parts_mut(self.data_ptr::<T>(column), self.count) };
        Ok(ColumnWrite { slice, state })
    }
}

/// Shared projection of one column; releases its borrow on drop.
pub struct ColumnRead<'v, T> {
    slice: &'v [T],
    state: &'v Cell<BorrowFlag>,
}

impl<T> Deref for ColumnRead<'_, T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        self.slice
    }
}

impl<T> Drop for ColumnRead<'_, T> {
    fn drop(&mut self) {
        self.state.set(self.state.get() - 1);
    }
}

/// Exclusive projection of one column; releases its borrow on drop.
pub struct ColumnWrite<'v, T> {
    slice: &'v mut [T],
    state: &'v Cell<BorrowFlag>,
}

impl<T> Deref for ColumnWrite<'_, T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        self.slice
    }
}

impl<T> DerefMut for ColumnWrite<'_, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        self.slice
    }
}

impl<T> Drop for ColumnWrite<'_, T> {
    fn drop(&mut self) {
        self.state.set(0);
    }
}
