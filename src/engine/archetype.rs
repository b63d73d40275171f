//! # Archetype Storage
//!
//! Signature-indexed columnar storage with chunked row pages and per-column
//! version clocks.
//!
//! ## Purpose
//! An [`Archetype`] owns the storage for every entity sharing one exact set of
//! component types. Component data is stored column-major inside fixed-budget
//! [`Chunk`] pages, one contiguous array per non-empty component, plus a
//! parallel array of entity ids per row.
//!
//! ## Design
//! - The [`ArchetypeSignature`] is the canonical (sorted, deduplicated) set of
//!   type identities, with a combined hash for fast map lookup. Equality
//!   fast-rejects on the hash and then compares the sequences elementwise, so
//!   a hash collision can never misidentify an archetype.
//! - Chunk capacity is derived from a byte budget:
//!   `budget / (row_stride + size_of::<EntityId>())`, minimum 1. The last
//!   chunk is the insertion target; a new chunk is allocated when it fills.
//!   Chunks are never reordered, collapsed, or freed before the world drops.
//! - Every column carries two epoch clocks: `write_version` (stamped when a
//!   writer query iterates the chunk) and `added_version` (stamped on every
//!   column of a chunk a row is inserted into, tags included). Both start at
//!   the "never" epoch 0 and are monotonically non-decreasing.
//!
//! ## Unsafe code
//! Column data lives in raw aligned allocations ([`ColumnBuf`]). All writes
//! are plain byte copies of `Pod` component values; no destructors run on
//! column memory. Unsafe blocks state the invariant they rely on.

use std::alloc::{self, Layout};
use std::ptr::{self, NonNull};

use crate::engine::component::{fnv1a_64, ComponentBundle, ComponentInfo, ComponentPayload};
use crate::engine::error::{ChunkFullError, QueryError, SpawnError};
use crate::engine::types::{Entity, EntityId, Epoch, TypeId, EPOCH_NEVER};

/// Seed for the signature hash fold (the FNV-1a 64 offset basis).
const SIGNATURE_HASH_SEED: u64 = 0xcbf29ce484222325;

/// Canonical identity of an archetype: its sorted, deduplicated type set.
#[derive(Clone, Debug)]
pub struct ArchetypeSignature {
    types: Vec<TypeId>,
    hash: u64,
}

impl ArchetypeSignature {
    /// Canonicalizes an unordered, possibly duplicated type list.
    ///
    /// Sorts ascending, removes adjacent duplicates, then folds each type's
    /// FNV-1a hash into a combined 64-bit hash with a splitmix-style mixer.
    pub fn from_unordered(mut types: Vec<TypeId>) -> Self {
        types.sort_unstable();
        types.dedup();

        let mut hash = SIGNATURE_HASH_SEED;
        for t in &types {
            let hv = fnv1a_64(&t.to_ne_bytes());
            hash ^= hv
                .wrapping_add(0x9e3779b97f4a7c15)
                .wrapping_add(hash << 6)
                .wrapping_add(hash >> 2);
        }

        Self { types, hash }
    }

    /// The canonical type sequence, sorted ascending without duplicates.
    #[inline]
    pub fn types(&self) -> &[TypeId] {
        &self.types
    }

    /// The combined 64-bit hash of the type sequence.
    #[inline]
    pub fn hash_value(&self) -> u64 {
        self.hash
    }

    /// Returns `true` if the signature contains `type_id`.
    #[inline]
    pub fn contains(&self, type_id: TypeId) -> bool {
        self.types.binary_search(&type_id).is_ok()
    }

    /// Returns the column index of `type_id`, if present.
    #[inline]
    pub fn index_of(&self, type_id: TypeId) -> Option<usize> {
        self.types.binary_search(&type_id).ok()
    }
}

impl PartialEq for ArchetypeSignature {
    fn eq(&self, other: &Self) -> bool {
        // Hash inequality is a fast reject; equality still compares the
        // sequences so a collision cannot misidentify.
        if self.hash != other.hash {
            return false;
        }
        self.types == other.types
    }
}

impl Eq for ArchetypeSignature {}

impl std::hash::Hash for ArchetypeSignature {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

/// Storage layout of one column within an archetype.
#[derive(Copy, Clone, Debug)]
pub struct ColumnLayout {
    /// Component description for the column.
    pub info: ComponentInfo,

    /// Bytes per row: `info.size` for data columns, 0 for empty tags.
    pub stride: usize,
}

/// Owned, aligned raw allocation backing one column of one chunk.
struct ColumnBuf {
    ptr: NonNull<u8>,
    layout: Layout,
}

impl ColumnBuf {
    /// Allocates `size` bytes aligned to `align`. `size` must be nonzero.
    fn new(size: usize, align: usize) -> Self {
        debug_assert!(size > 0);
        let layout = Layout::from_size_align(size, align).expect("column layout");
        // Safety: layout has nonzero size.
        let raw = unsafe { alloc::alloc(layout) };
        let Some(ptr) = NonNull::new(raw) else {
            alloc::handle_alloc_error(layout);
        };
        Self { ptr, layout }
    }

    #[inline]
    fn as_ptr(&self) -> NonNull<u8> {
        self.ptr
    }
}

impl Drop for ColumnBuf {
    fn drop(&mut self) {
        // Safety: ptr was allocated with exactly this layout. Column data is
        // plain bytes of Pod components; nothing to drop element-wise.
        unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) };
    }
}

// Safety: the buffer exclusively owns its allocation and the stored bytes are
// plain component data with no interior pointers or thread affinity.
unsafe impl Send for ColumnBuf {}
unsafe impl Sync for ColumnBuf {}

/// A fixed-capacity page of rows within an archetype.
///
/// Holds one contiguous aligned array per non-empty column (`None` for tag
/// columns), the parallel entity array, and the per-column epoch clocks.
pub struct Chunk {
    columns: Vec<Option<ColumnBuf>>,
    entities: Vec<Entity>,
    write_version: Vec<Epoch>,
    added_version: Vec<Epoch>,
    count: usize,
    capacity: usize,
}

impl Chunk {
    fn new(layouts: &[ColumnLayout], capacity: usize) -> Self {
        let mut columns = Vec::with_capacity(layouts.len());
        for layout in layouts {
            if layout.info.is_empty || layout.stride == 0 {
                columns.push(None);
            } else {
                columns.push(Some(ColumnBuf::new(
                    layout.stride * capacity,
                    layout.info.align,
                )));
            }
        }

        Self {
            columns,
            entities: Vec::with_capacity(capacity),
            write_version: vec![EPOCH_NEVER; layouts.len()],
            added_version: vec![EPOCH_NEVER; layouts.len()],
            count: 0,
            capacity,
        }
    }

    /// Maximum rows this chunk can hold.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Rows currently stored.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Returns `true` if another row fits.
    #[inline]
    pub fn has_room(&self) -> bool {
        self.count < self.capacity
    }

    /// Entity ids of the stored rows, parallel to every column.
    #[inline]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Last epoch at which a writer query iterated this chunk for `column`.
    #[inline]
    pub fn write_version(&self, column: usize) -> Epoch {
        self.write_version[column]
    }

    /// Last epoch at which a row was inserted, as seen by `column`.
    #[inline]
    pub fn added_version(&self, column: usize) -> Epoch {
        self.added_version[column]
    }

    /// Stamps the write clock of `column` with `epoch`.
    #[inline]
    pub(crate) fn bump_write_version(&mut self, column: usize, epoch: Epoch) {
        self.write_version[column] = epoch;
    }

    /// Base pointer of a column's data array; `None` for tag columns.
    #[inline]
    pub(crate) fn column_ptr(&self, column: usize) -> Option<NonNull<u8>> {
        self.columns[column].as_ref().map(ColumnBuf::as_ptr)
    }

    /// Appends one row.
    ///
    /// `values` is parallel to `layouts`; every non-empty column must carry
    /// `Some` payload of exactly `stride` bytes (validated by the archetype
    /// before the call). Stamps the added clock of **every** column, tags
    /// included: added-ness is a property of the row, projected onto each
    /// column.
    fn add_row(
        &mut self,
        layouts: &[ColumnLayout],
        values: &[Option<&[u8]>],
        entity: Entity,
        epoch: Epoch,
    ) -> Result<(), ChunkFullError> {
        let row = self.count;
        if row >= self.capacity {
            return Err(ChunkFullError {
                count: self.count,
                capacity: self.capacity,
            });
        }

        for (c, layout) in layouts.iter().enumerate() {
            if layout.stride > 0 {
                debug_assert!(values[c].is_some(), "unresolved column payload");
                if let (Some(bytes), Some(buf)) = (values[c], self.columns[c].as_ref()) {
                    debug_assert_eq!(bytes.len(), layout.stride);
                    // Safety: row < capacity, so the destination range
                    // [row * stride, (row + 1) * stride) lies inside the
                    // column allocation of capacity * stride bytes. Source and
                    // destination cannot overlap: the payload borrows a value
                    // outside this chunk's storage.
                    unsafe {
                        ptr::copy_nonoverlapping(
                            bytes.as_ptr(),
                            buf.as_ptr().as_ptr().add(row * layout.stride),
                            layout.stride,
                        );
                    }
                }
            }
            self.added_version[c] = epoch;
        }

        self.entities.push(entity);
        self.count += 1;
        Ok(())
    }
}

/// Columnar storage for all entities sharing one component signature.
pub struct Archetype {
    signature: ArchetypeSignature,
    components: Vec<ComponentInfo>,
    columns: Vec<ColumnLayout>,
    chunks: Vec<Chunk>,
    row_stride: usize,
    chunk_capacity: usize,
}

impl Archetype {
    /// Creates an empty archetype.
    ///
    /// `components` must be the signature's types in canonical order; the
    /// column layout list is derived from it one-to-one. The per-chunk row
    /// capacity is computed once from `chunk_budget_bytes`.
    pub fn new(
        signature: ArchetypeSignature,
        components: Vec<ComponentInfo>,
        chunk_budget_bytes: usize,
    ) -> Self {
        debug_assert_eq!(signature.types().len(), components.len());
        debug_assert!(signature
            .types()
            .iter()
            .zip(components.iter())
            .all(|(t, info)| *t == info.id));

        let columns: Vec<ColumnLayout> = components
            .iter()
            .map(|info| ColumnLayout {
                info: *info,
                stride: if info.is_empty { 0 } else { info.size },
            })
            .collect();

        let row_stride: usize = components
            .iter()
            .filter(|info| !info.is_empty)
            .map(|info| info.size)
            .sum();

        let chunk_capacity = Self::capacity_for_budget(row_stride, chunk_budget_bytes);

        Self {
            signature,
            components,
            columns,
            chunks: Vec::new(),
            row_stride,
            chunk_capacity,
        }
    }

    /// Rows per chunk for a given row stride and byte budget, minimum 1.
    ///
    /// The per-row entity id is charged against the budget alongside the
    /// component columns.
    pub fn capacity_for_budget(row_stride: usize, chunk_budget_bytes: usize) -> usize {
        let stride = row_stride + std::mem::size_of::<EntityId>();
        let capacity = chunk_budget_bytes / stride;
        if capacity == 0 { 1 } else { capacity }
    }

    /// The archetype's canonical signature.
    #[inline]
    pub fn signature(&self) -> &ArchetypeSignature {
        &self.signature
    }

    /// Component descriptions in canonical (signature) order.
    #[inline]
    pub fn components(&self) -> &[ComponentInfo] {
        &self.components
    }

    /// Column layouts in canonical (signature) order.
    #[inline]
    pub fn columns(&self) -> &[ColumnLayout] {
        &self.columns
    }

    /// Bytes of component data per row, excluding the entity id.
    #[inline]
    pub fn row_stride_bytes(&self) -> usize {
        self.row_stride
    }

    /// Rows per chunk, as computed at construction.
    #[inline]
    pub fn chunk_capacity(&self) -> usize {
        self.chunk_capacity
    }

    /// Number of allocated chunks.
    #[inline]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Read access to one chunk.
    #[inline]
    pub fn chunk(&self, index: usize) -> &Chunk {
        &self.chunks[index]
    }

    /// Read access to all chunks, in creation order.
    #[inline]
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Total rows stored across all chunks.
    pub fn row_count(&self) -> usize {
        self.chunks.iter().map(Chunk::count).sum()
    }

    /// Resolves the column index of a component, failing when absent.
    pub fn column_index_of(&self, type_id: TypeId) -> Result<usize, QueryError> {
        self.signature
            .index_of(type_id)
            .ok_or(QueryError::UnknownComponent { type_id })
    }

    /// Splits the archetype into layout metadata and mutable chunk access.
    ///
    /// Used by query iteration, which needs column lookup while holding chunks
    /// mutably.
    #[inline]
    pub(crate) fn split_for_iteration(
        &mut self,
    ) -> (&ArchetypeSignature, &[ColumnLayout], &mut [Chunk]) {
        (&self.signature, &self.columns, &mut self.chunks)
    }

    /// Appends a row from a typed component bundle.
    ///
    /// Thin wrapper over [`Archetype::insert_dynamic`]: the bundle lowers its
    /// values into payloads and the dynamic path resolves them per column.
    pub fn insert<B: ComponentBundle>(
        &mut self,
        entity: Entity,
        epoch: Epoch,
        bundle: &B,
    ) -> Result<(), SpawnError> {
        let payloads = bundle.payloads();
        self.insert_dynamic(entity, epoch, &payloads)
    }

    /// Appends a row from type-erased payloads.
    ///
    /// Each non-empty column locates its source payload by type identity;
    /// a column without a matching payload fails with
    /// [`SpawnError::MissingComponent`]. Tag columns take no payload but are
    /// still stamped with the add epoch.
    pub fn insert_dynamic(
        &mut self,
        entity: Entity,
        epoch: Epoch,
        payloads: &[ComponentPayload<'_>],
    ) -> Result<(), SpawnError> {
        let mut values: Vec<Option<&[u8]>> = Vec::with_capacity(self.columns.len());
        for layout in &self.columns {
            if layout.info.is_empty || layout.stride == 0 {
                values.push(None);
                continue;
            }

            let need = layout.info.id;
            let payload = payloads.iter().find(|p| p.id == need);
            match payload {
                Some(p) => {
                    if p.bytes.len() != layout.stride {
                        return Err(SpawnError::PayloadSizeMismatch {
                            type_id: need,
                            expected: layout.stride,
                            actual: p.bytes.len(),
                        });
                    }
                    values.push(Some(p.bytes));
                }
                None => {
                    return Err(SpawnError::MissingComponent {
                        name: layout.info.name,
                        type_id: need,
                    });
                }
            }
        }

        if self.chunks.last().map_or(true, |chunk| !chunk.has_room()) {
            self.chunks.push(Chunk::new(&self.columns, self.chunk_capacity));
        }
        let chunk = self
            .chunks
            .last_mut()
            .expect("insertion target chunk must exist");
        chunk
            .add_row(&self.columns, &values, entity, epoch)
            .map_err(SpawnError::from)
    }
}
