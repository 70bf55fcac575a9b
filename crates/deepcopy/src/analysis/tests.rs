use pretty_assertions::assert_eq;

use super::*;
use crate::hooks::copy_hook;
use crate::types::StructBuilder;

#[test]
fn test_scalars_are_value_only() {
    for ty in [
        Ty::BOOL,
        Ty::INT,
        Ty::UINT,
        Ty::FLOAT,
        Ty::COMPLEX,
        Ty::STR,
        Ty::TIMESTAMP,
    ] {
        let result = analyze(ty);
        assert!(result.is_only_values, "{ty} should be value-only");
        assert_eq!(result.contains, Contains::empty());
        assert_eq!(result.ty, Some(ty));
    }
}

#[test]
fn test_nil_result() {
    let nil = TypeAnalysis::nil();
    assert!(nil.is_only_values);
    assert_eq!(&*nil.type_name, "nil");
    assert_eq!(nil.ty, None);
}

#[test]
fn test_scalar_record_is_value_only() {
    let point = StructBuilder::new("Point")
        .field("X", Ty::INT)
        .field("Y", Ty::FLOAT)
        .build()
        .unwrap();
    let result = analyze(point);
    assert!(result.is_only_values);
    assert_eq!(&*result.type_name, "Point");
    assert!(result.field("X").unwrap().is_only_values);
    assert_eq!(result.field_analysis.as_ref().map(FxHashMap::len), Some(2));
}

#[test]
fn test_private_field_forces_traversal() {
    let secret = StructBuilder::new("Secret")
        .field("Public", Ty::INT)
        .private_field("hidden", Ty::INT)
        .build()
        .unwrap();
    let result = analyze(secret);
    assert!(!result.is_only_values);
    assert!(result.field("Public").is_some());
    assert!(result.field("hidden").is_none());
    assert_eq!(result.contains, Contains::empty());
}

#[test]
fn test_reference_kinds_set_their_flags() {
    let ptr = analyze(Ty::pointer_to(Ty::INT));
    assert!(!ptr.is_only_values);
    assert_eq!(ptr.contains, Contains::PTR);

    let slice = analyze(Ty::slice_of(Ty::map_of(Ty::STR, Ty::INT)));
    assert!(!slice.is_only_values);
    assert!(slice.contains_slice());
    assert!(slice.contains_map());
    assert!(!slice.contains_ptr());

    let map = analyze(Ty::map_of(Ty::STR, Ty::slice_of(Ty::INT)));
    assert_eq!(map.contains, Contains::MAP | Contains::SLICE);

    let chan = analyze(Ty::chan_of(Ty::pointer_to(Ty::INT)));
    assert_eq!(chan.contains, Contains::CHAN);

    let func = analyze(Ty::func("func()"));
    assert_eq!(func.contains, Contains::FUNC);
    assert!(func.contains_func());

    let iface = analyze(Ty::ANY);
    assert!(!iface.is_only_values);
    assert!(iface.contains_iface());
}

#[test]
fn test_pointer_inherits_containers_below_it() {
    let ptr = analyze(Ty::pointer_to(Ty::slice_of(Ty::pointer_to(Ty::INT))));
    assert_eq!(ptr.contains, Contains::PTR | Contains::SLICE);
}

#[test]
fn test_arrays_inherit_from_element() {
    let ints = analyze(Ty::array_of(Ty::INT, 4));
    assert!(ints.is_only_values);

    let ptrs = analyze(Ty::array_of(Ty::pointer_to(Ty::INT), 4));
    assert!(!ptrs.is_only_values);
    assert!(ptrs.contains_ptr());
}

#[test]
fn test_opaque_is_conservative() {
    let result = analyze(Ty::opaque("Mutex"));
    assert!(!result.is_only_values);
    assert_eq!(result.contains, Contains::empty());
}

#[test]
fn test_recursive_record_terminates() {
    let builder = StructBuilder::new("Node");
    let node = builder.ty();
    let node = builder
        .field("Name", Ty::STR)
        .field("Next", Ty::pointer_to(node))
        .field("Children", Ty::slice_of(Ty::pointer_to(node)))
        .build()
        .unwrap();

    let result = analyze(node);
    assert!(!result.is_only_values);
    assert!(result.contains_ptr());
    assert!(result.contains_slice());
    assert!(result.field("Name").unwrap().is_only_values);
    assert!(result.field("Next").unwrap().contains_ptr());
}

#[test]
fn test_mutually_recursive_records_terminate() {
    let a = StructBuilder::new("A");
    let b = StructBuilder::new("B");
    let (a_ty, b_ty) = (a.ty(), b.ty());
    a.field("B", Ty::pointer_to(b_ty)).build().unwrap();
    b.field("A", Ty::map_of(Ty::STR, a_ty)).build().unwrap();

    let result = analyze(a_ty);
    assert!(result.contains_ptr());
    assert!(result.contains_map());
}

#[test]
fn test_hooked_record_is_never_value_only() {
    let ty = StructBuilder::new("Counter")
        .field("N", Ty::INT)
        .copy_hook(copy_hook(|value| Some(value.clone())))
        .build()
        .unwrap();
    let result = analyze(ty);
    assert!(!result.is_only_values);
    assert_eq!(result.contains, Contains::empty());
}

#[test]
fn test_nested_value_record_is_value_only() {
    let inner = StructBuilder::new("Inner")
        .field("A", Ty::INT)
        .build()
        .unwrap();
    let outer = StructBuilder::new("Outer")
        .field("Inner", inner)
        .field("Grid", Ty::array_of(inner, 3))
        .field("When", Ty::TIMESTAMP)
        .build()
        .unwrap();
    assert!(analyze(outer).is_only_values);
}
