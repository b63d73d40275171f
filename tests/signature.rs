use bytemuck::{Pod, Zeroable};
use epoch_ecs::{type_id_of, ArchetypeSignature, Component};

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct C1(u32);
impl Component for C1 {}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct C2(f32);
impl Component for C2 {}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct Tag;
impl Component for Tag {}

#[test]
fn permutations_canonicalize_identically() {
    let a = ArchetypeSignature::from_unordered(vec![
        type_id_of::<C2>(),
        type_id_of::<C1>(),
        type_id_of::<Tag>(),
    ]);
    let b = ArchetypeSignature::from_unordered(vec![
        type_id_of::<Tag>(),
        type_id_of::<C1>(),
        type_id_of::<C2>(),
    ]);

    assert_eq!(a, b);
    assert_eq!(a.hash_value(), b.hash_value());
    assert_eq!(a.types(), b.types());
}

#[test]
fn types_are_sorted_and_deduplicated() {
    let signature = ArchetypeSignature::from_unordered(vec![
        type_id_of::<C1>(),
        type_id_of::<C2>(),
        type_id_of::<C1>(),
        type_id_of::<C1>(),
    ]);

    assert_eq!(signature.types().len(), 2);
    assert!(signature.types().windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn duplicates_hash_like_the_deduplicated_set() {
    let with_dupes = ArchetypeSignature::from_unordered(vec![
        type_id_of::<C1>(),
        type_id_of::<C1>(),
        type_id_of::<C2>(),
    ]);
    let plain =
        ArchetypeSignature::from_unordered(vec![type_id_of::<C1>(), type_id_of::<C2>()]);

    assert_eq!(with_dupes, plain);
    assert_eq!(with_dupes.hash_value(), plain.hash_value());
}

#[test]
fn distinct_sets_compare_unequal() {
    let ab = ArchetypeSignature::from_unordered(vec![type_id_of::<C1>(), type_id_of::<C2>()]);
    let a = ArchetypeSignature::from_unordered(vec![type_id_of::<C1>()]);
    let at = ArchetypeSignature::from_unordered(vec![type_id_of::<C1>(), type_id_of::<Tag>()]);

    assert_ne!(ab, a);
    assert_ne!(ab, at);
    assert_ne!(a, at);
}

#[test]
fn contains_and_index_follow_canonical_order() {
    let signature =
        ArchetypeSignature::from_unordered(vec![type_id_of::<C2>(), type_id_of::<C1>()]);

    assert!(signature.contains(type_id_of::<C1>()));
    assert!(signature.contains(type_id_of::<C2>()));
    assert!(!signature.contains(type_id_of::<Tag>()));

    let c1 = signature.index_of(type_id_of::<C1>()).unwrap();
    let c2 = signature.index_of(type_id_of::<C2>()).unwrap();
    assert_ne!(c1, c2);
    assert_eq!(signature.types()[c1], type_id_of::<C1>());
    assert_eq!(signature.types()[c2], type_id_of::<C2>());
}

#[test]
fn empty_signature_is_well_formed() {
    let empty = ArchetypeSignature::from_unordered(Vec::new());
    assert!(empty.types().is_empty());
    assert_eq!(empty, ArchetypeSignature::from_unordered(Vec::new()));
}

#[test]
fn type_identity_is_stable_and_distinct() {
    assert_eq!(type_id_of::<C1>(), type_id_of::<C1>());
    assert_ne!(type_id_of::<C1>(), type_id_of::<C2>());
    assert_ne!(type_id_of::<C1>(), type_id_of::<Tag>());
}
