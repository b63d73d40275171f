//! # Component Identity and Metadata
//!
//! This module defines what a component *is* to the engine: a bit-copyable
//! value type with a stable 64-bit identity and a described memory layout.
//!
//! ## Purpose
//! Archetype storage is type-erased byte columns; everything the storage layer
//! needs to know about a component type is captured once, up front, as a
//! [`ComponentInfo`]. Queries and signatures refer to components exclusively
//! through their [`TypeId`](crate::engine::types::TypeId).
//!
//! ## Type identity
//! A component's identity is the FNV-1a 64 hash of its fully-qualified type
//! name. This is stable for the lifetime of the process, requires no
//! registration step, and is identical across invocations of the same build.
//! Distinct component types are assumed to hash to distinct values for column
//! lookup; signature equality additionally compares type sequences
//! elementwise, so a collision cannot cause archetype misidentification.
//!
//! ## Bit-copyable restriction
//! Storage is restricted to bit-copyable component types. The [`Component`]
//! trait requires [`bytemuck::Pod`], turning that restriction into a
//! compile-time obligation: rows are written with plain byte copies and no
//! destructors ever run on column data.
//!
//! ## Tags
//! Zero-sized component types are *tags*: they occupy a column slot in a
//! signature (and participate in added-epoch stamping) but allocate no per-row
//! storage.

use std::any::type_name;
use std::hash::Hasher;
use std::mem::{align_of, size_of};

use bytemuck::Pod;
use fnv::FnvHasher;

use crate::engine::types::TypeId;

/// Marker trait for types storable as ECS components.
///
/// ## Requirements
/// - [`Pod`]: the component is plain bytes; rows are inserted by `memcpy` and
///   never dropped.
/// - `Send + Sync + 'static`: component data may be handed to systems and
///   command buffers.
///
/// Implement it explicitly per component type:
///
/// ```ignore
/// #[repr(C)]
/// #[derive(Clone, Copy, Pod, Zeroable)]
/// struct Velocity { vx: f32, vy: f32, vz: f32 }
///
/// impl Component for Velocity {}
/// ```
pub trait Component: Pod + Send + Sync + 'static {}

/// Computes the FNV-1a 64 hash of a byte string.
#[inline]
pub fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hasher = FnvHasher::default();
    hasher.write(bytes);
    hasher.finish()
}

/// Returns the stable 64-bit identity of component type `T`.
///
/// The identity is the FNV-1a 64 hash of `std::any::type_name::<T>()` and is
/// constant for the lifetime of the process.
#[inline]
pub fn type_id_of<T: 'static>() -> TypeId {
    fnv1a_64(type_name::<T>().as_bytes())
}

/// Describes a component type to the storage layer.
///
/// ## Fields
/// - `id`: stable identity, see [`type_id_of`].
/// - `name`: Rust type name, kept for diagnostics.
/// - `size` / `align`: memory layout of one value.
/// - `is_bit_copyable`: always `true` here; the [`Component`] bound enforces
///   it at compile time.
/// - `is_empty`: zero-sized tag marker; tag columns hold no data.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ComponentInfo {
    /// Stable identity of the component type.
    pub id: TypeId,

    /// Rust type name for diagnostics.
    pub name: &'static str,

    /// Size of one component value in bytes.
    pub size: usize,

    /// Alignment of the component type in bytes.
    pub align: usize,

    /// Whether values may be moved with a plain byte copy.
    pub is_bit_copyable: bool,

    /// Whether the type is a zero-sized tag.
    pub is_empty: bool,
}

/// Builds the [`ComponentInfo`] for component type `T`.
#[inline]
pub fn describe_component<T: Component>() -> ComponentInfo {
    let size = size_of::<T>();
    ComponentInfo {
        id: type_id_of::<T>(),
        name: type_name::<T>(),
        size,
        align: align_of::<T>(),
        is_bit_copyable: true,
        is_empty: size == 0,
    }
}

/// A component value presented to row insertion as identity plus raw bytes.
#[derive(Copy, Clone, Debug)]
pub struct ComponentPayload<'a> {
    /// Stable identity of the component type.
    pub id: TypeId,

    /// The value's bytes; empty for tags.
    pub bytes: &'a [u8],
}

/// A heterogeneous pack of component values, spawned as one row.
///
/// ## Purpose
/// `ComponentBundle` is the variadic component pack of the spawn path: it
/// reports the pack's type identities and layouts, and lowers the values into
/// type-erased [`ComponentPayload`]s for row insertion.
///
/// ## Implementations
/// Implemented for tuples of [`Component`] up to arity 8; single components
/// spawn as one-element tuples:
///
/// ```ignore
/// world.spawn((Transform { x: 0.0, y: 0.0, z: 0.0 }, Velocity { vx: 1.0, vy: 0.0, vz: 0.0 }))?;
/// world.spawn((PlayerTag,))?;
/// ```
///
/// Duplicate component types within one bundle deduplicate during signature
/// canonicalization; the first value for a type wins.
pub trait ComponentBundle: Send + Sync + 'static {
    /// Type identities of the bundle's components, in declaration order.
    fn type_ids() -> Vec<TypeId>;

    /// Layout descriptions of the bundle's components, in declaration order.
    fn infos() -> Vec<ComponentInfo>;

    /// Lowers the bundle's values into type-erased payloads.
    fn payloads(&self) -> Vec<ComponentPayload<'_>>;
}

macro_rules! impl_component_bundle {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name: Component),+> ComponentBundle for ($($name,)+) {
            fn type_ids() -> Vec<TypeId> {
                vec![$(type_id_of::<$name>()),+]
            }

            fn infos() -> Vec<ComponentInfo> {
                vec![$(describe_component::<$name>()),+]
            }

            fn payloads(&self) -> Vec<ComponentPayload<'_>> {
                vec![$(ComponentPayload {
                    id: type_id_of::<$name>(),
                    bytes: bytemuck::bytes_of(&self.$idx),
                }),+]
            }
        }
    };
}

impl_component_bundle!(A: 0);
impl_component_bundle!(A: 0, B: 1);
impl_component_bundle!(A: 0, B: 1, C: 2);
impl_component_bundle!(A: 0, B: 1, C: 2, D: 3);
impl_component_bundle!(A: 0, B: 1, C: 2, D: 3, E: 4);
impl_component_bundle!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);
impl_component_bundle!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6);
impl_component_bundle!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7);
