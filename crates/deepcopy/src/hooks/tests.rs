use std::sync::LazyLock;

use pretty_assertions::assert_eq;

use super::*;
use crate::error::ReflectError;
use crate::types::StructBuilder;

fn counter_record(name: &str) -> Ty {
    StructBuilder::new(name)
        .field("N", Ty::INT)
        .build()
        .unwrap()
}

fn bump(value: &Value) -> Option<Value> {
    let n = value.field("N")?.as_int()?;
    Some(Value::record(value.ty(), [("N", Value::int(n + 100))]))
}

#[test]
fn test_no_override_for_builtins_and_plain_records() {
    assert!(!has_override(Ty::INT));
    assert!(!has_override(Ty::pointer_to(Ty::STR)));
    assert!(find_override(&Value::int(1)).is_none());

    let plain = counter_record("HooksPlain");
    assert!(!has_override(plain));
    assert!(!has_override(Ty::pointer_to(plain)));
    assert!(find_override(&Value::record(plain, [("N", Value::int(1))])).is_none());
}

#[test]
fn test_value_hook_reaches_through_pointer() {
    let ty = counter_record("HooksBump");
    types().set_copy_hook(ty, copy_hook(bump)).unwrap();
    assert!(has_override(ty));
    assert!(has_override(Ty::pointer_to(ty)));
    // Only one level of indirection.
    assert!(!has_override(Ty::pointer_to(Ty::pointer_to(ty))));

    let record = Value::record(ty, [("N", Value::int(1))]);
    assert!(matches!(find_override(&record), Some(Override::Direct(_))));
    let copy = find_override(&record).unwrap().apply(&record).unwrap();
    assert_eq!(copy.field("N"), Some(&Value::int(101)));

    let ptr = Value::pointer(record.clone());
    assert!(matches!(find_override(&ptr), Some(Override::Pointee(_))));
    let copy = find_override(&ptr).unwrap().apply(&ptr).unwrap();
    assert_eq!(copy.ty(), ptr.ty());
    assert!(!copy.as_pointer().unwrap().ptr_eq(ptr.as_pointer().unwrap()));
    assert_eq!(
        copy.load().unwrap().field("N"),
        Some(&Value::int(101))
    );
}

#[test]
fn test_nil_pointer_never_reaches_hook() {
    let ty = counter_record("HooksNil");
    types()
        .set_copy_hook(ty, copy_hook(|_| panic!("hook called on nil")))
        .unwrap();
    assert!(find_override(&Value::nil_pointer(ty)).is_none());
}

#[test]
fn test_pointer_hook_may_return_pointee() {
    let ty = counter_record("HooksPtrRecv");
    let ptr_ty = Ty::pointer_to(ty);
    types()
        .set_copy_hook(ptr_ty, copy_hook(|ptr| bump(&ptr.load()?)))
        .unwrap();

    let src = Value::pointer(Value::record(ty, [("N", Value::int(5))]));
    assert!(matches!(find_override(&src), Some(Override::Direct(_))));
    let copy = find_override(&src).unwrap().apply(&src).unwrap();
    assert_eq!(copy.ty(), ptr_ty);
    assert_eq!(copy.load().unwrap().field("N"), Some(&Value::int(105)));
}

#[test]
fn test_wrong_type_declines() {
    let ty = counter_record("HooksWrong");
    types()
        .set_copy_hook(ty, copy_hook(|_| Some(Value::string("nope"))))
        .unwrap();

    let record = Value::record(ty, [("N", Value::int(1))]);
    assert_eq!(find_override(&record).unwrap().apply(&record), None);
    let ptr = Value::pointer(record);
    assert_eq!(find_override(&ptr).unwrap().apply(&ptr), None);
}

#[test]
fn test_hook_returning_none_declines() {
    let ty = counter_record("HooksDecline");
    types().set_copy_hook(ty, copy_hook(|_| None)).unwrap();
    let record = Value::record(ty, [("N", Value::int(1))]);
    assert_eq!(find_override(&record).unwrap().apply(&record), None);
}

struct Counter {
    n: i64,
}

static COUNTER: LazyLock<Ty> = LazyLock::new(|| {
    StructBuilder::new("HooksCounter")
        .field("N", Ty::INT)
        .copy_hook(self_copying::<Counter>())
        .build()
        .unwrap()
});

impl Reflect for Counter {
    fn static_type() -> Ty {
        *COUNTER
    }

    fn to_value(&self) -> Value {
        Value::record(*COUNTER, [("N", Value::int(self.n))])
    }

    fn from_value(value: Value) -> Result<Self, ReflectError> {
        if value.ty() != *COUNTER {
            return Err(ReflectError::mismatch("HooksCounter", &value));
        }
        match value.field("N").and_then(Value::as_int) {
            Some(n) => Ok(Counter { n }),
            None => Err(ReflectError::mismatch("HooksCounter", &value)),
        }
    }
}

impl SelfCopying for Counter {
    fn self_copy(&self) -> Self {
        Counter { n: self.n * 2 }
    }
}

#[test]
fn test_self_copying_hook() {
    let src = Counter { n: 21 }.to_value();
    let copy = find_override(&src).unwrap().apply(&src).unwrap();
    assert_eq!(Counter::from_value(copy).unwrap().n, 42);
}

#[test]
fn test_self_copying_declines_foreign_values() {
    let hook = self_copying::<Counter>();
    assert!(hook(&Value::int(3)).is_none());
}
