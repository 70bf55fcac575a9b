use std::time::UNIX_EPOCH;

use pretty_assertions::assert_eq;
use rustc_hash::FxHashSet;

use super::*;
use crate::types::StructBuilder;

fn point_type() -> Ty {
    StructBuilder::new("Point")
        .field("X", Ty::INT)
        .field("Y", Ty::INT)
        .build()
        .unwrap()
}

#[test]
fn test_scalar_types() {
    assert_eq!(Value::int(1).ty(), Ty::INT);
    assert_eq!(Value::uint(1).ty(), Ty::UINT);
    assert_eq!(Value::float(1.5).ty(), Ty::FLOAT);
    assert_eq!(Value::bool(true).ty(), Ty::BOOL);
    assert_eq!(Value::string("a").ty(), Ty::STR);
    assert_eq!(Value::complex(1.0, 2.0).ty(), Ty::COMPLEX);
    assert_eq!(Value::timestamp(UNIX_EPOCH).ty(), Ty::TIMESTAMP);
}

#[test]
fn test_factory_types() {
    assert_eq!(Value::pointer(Value::int(1)).ty(), Ty::pointer_to(Ty::INT));
    assert_eq!(Value::slice(Ty::STR, vec![]).ty(), Ty::slice_of(Ty::STR));
    assert_eq!(
        Value::map(Ty::STR, Ty::INT, []).ty(),
        Ty::map_of(Ty::STR, Ty::INT)
    );
    assert_eq!(
        Value::array(Ty::INT, vec![Value::int(1), Value::int(2)]).ty(),
        Ty::array_of(Ty::INT, 2)
    );
    assert_eq!(Value::any(Value::int(1)).ty(), Ty::ANY);
}

#[test]
fn test_nil_is_not_empty() {
    let nil = Value::nil_slice(Ty::INT);
    let empty = Value::slice(Ty::INT, vec![]);
    assert!(nil.is_nil());
    assert!(!empty.is_nil());
    assert!(!nil.deep_eq(&empty));

    let nil = Value::nil_map(Ty::STR, Ty::INT);
    let empty = Value::map(Ty::STR, Ty::INT, []);
    assert!(nil.is_nil());
    assert!(!empty.is_nil());
    assert!(!nil.deep_eq(&empty));
}

#[test]
fn test_untyped_nil() {
    assert!(Value::nil().is_untyped_nil());
    assert!(!Value::nil_interface(Ty::interface("Stringer")).is_untyped_nil());
    assert!(!Value::any(Value::int(0)).is_untyped_nil());
    assert!(!Value::nil_pointer(Ty::INT).is_untyped_nil());
}

#[test]
fn test_zero_values() {
    let point = point_type();
    let zero = Value::zero(point);
    assert_eq!(zero.field("X"), Some(&Value::int(0)));
    assert_eq!(zero.field("Y"), Some(&Value::int(0)));

    assert_eq!(Value::zero(Ty::STR).as_str(), Some(""));
    assert_eq!(Value::zero(Ty::TIMESTAMP), Value::Timestamp(UNIX_EPOCH));
    assert!(Value::zero(Ty::pointer_to(point)).is_nil());
    assert!(Value::zero(Ty::slice_of(point)).is_nil());
    assert!(Value::zero(Ty::ANY).is_untyped_nil());

    let array = Value::zero(Ty::array_of(point, 3));
    assert_eq!(array.as_items().map(<[Value]>::len), Some(3));
}

#[test]
fn test_record_fields() {
    let point = point_type();
    let mut p = Value::record(point, [("X", Value::int(3)), ("Y", Value::int(4))]);
    assert_eq!(p.field("X").and_then(Value::as_int), Some(3));
    assert!(p.set_field("Y", Value::int(9)));
    assert_eq!(p.field("Y").and_then(Value::as_int), Some(9));
    assert!(!p.set_field("Z", Value::int(0)));
    assert_eq!(p.field("Z"), None);
    assert_eq!(Value::int(1).field("X"), None);
}

#[test]
#[should_panic(expected = "has no field `Z`")]
fn test_record_unknown_field_panics() {
    let point = point_type();
    let _ = Value::record(point, [("Z", Value::int(1))]);
}

#[test]
fn test_key_equality_is_structural_for_scalars() {
    assert_eq!(Value::string("a"), Value::string("a"));
    assert_ne!(Value::int(1), Value::uint(1));
    assert_eq!(Value::float(f64::NAN), Value::float(f64::NAN));
    assert_ne!(Value::float(0.0), Value::float(-0.0));

    let point = point_type();
    let a = Value::record(point, [("X", Value::int(1))]);
    let b = Value::record(point, [("X", Value::int(1))]);
    assert_eq!(a, b);

    let mut set = FxHashSet::default();
    set.insert(a);
    assert!(set.contains(&b));
}

#[test]
fn test_key_equality_is_identity_for_pointers() {
    let a = Value::pointer(Value::int(1));
    let b = Value::pointer(Value::int(1));
    assert_ne!(a, b);
    assert_eq!(a, a.clone());
    assert!(a.deep_eq(&b));
}

#[test]
fn test_shared_aliasing() {
    let cell = Shared::new(Value::int(1));
    let a = Value::pointer_at(Ty::INT, cell.clone());
    let b = Value::pointer_at(Ty::INT, cell.clone());
    *cell.write() = Value::int(2);
    assert_eq!(a.load(), Some(Value::int(2)));
    assert_eq!(b.load(), Some(Value::int(2)));
    assert_eq!(a, b);
}

#[test]
fn test_deep_eq_handles_cycles() {
    let builder = StructBuilder::new("Ring");
    let ring = builder.ty();
    let ring = builder
        .field("Name", Ty::STR)
        .field("Next", Ty::pointer_to(ring))
        .build()
        .unwrap();

    let make = || {
        let a = Shared::new(Value::record(ring, [("Name", Value::string("a"))]));
        let b = Shared::new(Value::record(ring, [("Name", Value::string("b"))]));
        a.write()
            .set_field("Next", Value::pointer_at(ring, b.clone()));
        b.write()
            .set_field("Next", Value::pointer_at(ring, a.clone()));
        Value::pointer_at(ring, a)
    };

    let first = make();
    let second = make();
    assert!(first.deep_eq(&second));

    let other = make();
    if let Some(cell) = other.as_pointer() {
        cell.write().set_field("Name", Value::string("z"));
    }
    assert!(!first.deep_eq(&other));
}

#[test]
fn test_deep_eq_maps_with_pointer_keys() {
    let key_ty = Ty::pointer_to(Ty::INT);
    let a = Value::map(key_ty, Ty::STR, [(Value::pointer(Value::int(1)), Value::string("one"))]);
    let b = Value::map(key_ty, Ty::STR, [(Value::pointer(Value::int(1)), Value::string("one"))]);
    let c = Value::map(key_ty, Ty::STR, [(Value::pointer(Value::int(2)), Value::string("one"))]);
    assert!(a.deep_eq(&b));
    assert!(!a.deep_eq(&c));
}

#[test]
fn test_handles_compare_by_identity() {
    let chan = Channel::bounded(1);
    let a = Value::chan(Ty::INT, chan.clone());
    let b = Value::chan(Ty::INT, chan);
    let c = Value::chan(Ty::INT, Channel::bounded(1));
    assert!(a.deep_eq(&b));
    assert!(!a.deep_eq(&c));

    let f = Function::new(|args| args.first().cloned().unwrap_or(Value::int(0)));
    let g = Value::func(Ty::func("func(int) int"), f.clone());
    assert_eq!(g.as_function().map(|h| h.call(&[Value::int(5)])), Some(Value::int(5)));
    assert!(g.as_function().is_some_and(|h| h.ptr_eq(&f)));
}

#[test]
fn test_channel_round_trip() {
    let chan = Channel::bounded(1);
    assert!(chan.try_send(Value::int(1)).is_ok());
    assert_eq!(chan.try_send(Value::int(2)), Err(Value::int(2)));
    assert_eq!(chan.len(), 1);
    assert_eq!(chan.try_recv(), Some(Value::int(1)));
    assert!(chan.is_empty());
}

#[test]
fn test_opaque_downcast() {
    let handle = OpaqueHandle::new(42_u16);
    assert_eq!(handle.downcast_ref::<u16>(), Some(&42));
    assert_eq!(handle.downcast_ref::<u32>(), None);
}

#[test]
fn test_debug_does_not_follow_cycles() {
    let cell = Shared::new(Value::nil_pointer(Ty::INT));
    let ptr = Value::pointer_at(Ty::INT, cell.clone());
    *cell.write() = ptr.clone();
    let text = format!("{ptr:?}");
    assert!(text.starts_with("Pointer"));
}
