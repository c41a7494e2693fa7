//! The unified runtime value type.
//!
//! Every value is reference-counted so cloning (which happens constantly —
//! environments, tuples, and call argument lists all hold values by
//! clone) is a pointer bump. Hashes are computed eagerly at construction,
//! matching the design note's preference for a typed language: there is no
//! interior-mutability hash cache to reason about.

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;

use crate::function::{Function, Proto, ProtoMethod};

static NEXT_CALLABLE_ID: AtomicU64 = AtomicU64::new(1);

/// Hands out a process-wide unique id for a newly constructed callable
/// (`Function`, `ProtoMethod`, or the result of partial application /
/// binding). Grounded on the teacher's `AtomicUsize` heap/namespace id
/// counters rather than pulling in `uuid`, which the teacher never depends
/// on.
pub fn next_callable_id() -> u64 {
    NEXT_CALLABLE_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug)]
struct ValueData {
    kind: ValueKind,
    hash: String,
    proto: Option<Value>,
}

/// A runtime value. Cheap to clone — it's a single `Rc` bump.
#[derive(Clone)]
pub struct Value(Rc<ValueData>);

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value({})", self.0.hash)
    }
}

/// A record entry: the key value alongside the bound value, kept so the
/// record's own hash can be rebuilt from declaration order.
pub type RecordEntry = (Value, Value);

#[derive(Debug)]
pub enum ValueKind {
    Number(f64),
    Str(String),
    Boolean(bool),
    Bottom,
    Tuple(Vec<Value>),
    Record(IndexMap<String, RecordEntry>),
    Function(Function),
    Proto(Proto),
    ProtoMethod(ProtoMethod),
}

fn hash_number(n: f64) -> String {
    format!("n:{n}")
}

fn hash_string(s: &str) -> String {
    format!("s:{s:?}")
}

fn hash_boolean(b: bool) -> String {
    format!("b:{b}")
}

fn hash_tuple(items: &[Value]) -> String {
    let mut h = String::from("tpl:");
    for item in items {
        h.push(',');
        h.push_str(item.hash());
    }
    h
}

fn hash_record(entries: &IndexMap<String, RecordEntry>) -> String {
    let mut h = String::from("rec:");
    for (key, value) in entries.values() {
        h.push(',');
        h.push_str(key.hash());
        h.push(':');
        h.push_str(value.hash());
    }
    h
}

impl Value {
    fn new(kind: ValueKind, hash: String, proto: Option<Value>) -> Self {
        Value(Rc::new(ValueData { kind, hash, proto }))
    }

    #[must_use]
    pub fn number(n: f64) -> Self {
        let hash = hash_number(n);
        Self::new(ValueKind::Number(n), hash, Some(protos::number_proto()))
    }

    #[must_use]
    pub fn string(s: impl Into<String>) -> Self {
        let s = s.into();
        let hash = hash_string(&s);
        Self::new(ValueKind::Str(s), hash, Some(protos::string_proto()))
    }

    #[must_use]
    pub fn boolean(b: bool) -> Self {
        let hash = hash_boolean(b);
        Self::new(ValueKind::Boolean(b), hash, Some(protos::boolean_proto()))
    }

    #[must_use]
    pub fn bottom() -> Self {
        Self::new(ValueKind::Bottom, "btm".to_string(), None)
    }

    #[must_use]
    pub fn tuple(items: Vec<Value>) -> Self {
        let hash = hash_tuple(&items);
        Self::new(ValueKind::Tuple(items), hash, Some(protos::tuple_proto()))
    }

    #[must_use]
    pub fn record(entries: IndexMap<String, RecordEntry>) -> Self {
        let hash = hash_record(&entries);
        Self::new(
            ValueKind::Record(entries),
            hash,
            Some(protos::record_proto()),
        )
    }

    #[must_use]
    pub fn function(f: Function) -> Self {
        let hash = format!("fn:{}", f.id());
        Self::new(ValueKind::Function(f), hash, None)
    }

    #[must_use]
    pub fn proto(p: Proto) -> Self {
        let hash = p.hash().to_string();
        Self::new(ValueKind::Proto(p), hash, None)
    }

    #[must_use]
    pub fn proto_method(pm: ProtoMethod) -> Self {
        let hash = format!("pm:{}", pm.id());
        Self::new(ValueKind::ProtoMethod(pm), hash, None)
    }

    #[must_use]
    pub fn kind(&self) -> &ValueKind {
        &self.0.kind
    }

    #[must_use]
    pub fn hash(&self) -> &str {
        &self.0.hash
    }

    #[must_use]
    pub fn proto_value(&self) -> Option<&Value> {
        self.0.proto.as_ref()
    }

    /// Structural equality by hash, per the spec's `==`/`!=` semantics.
    #[must_use]
    pub fn value_eq(&self, other: &Value) -> bool {
        self.hash() == other.hash()
    }

    /// Returns a new value identical in content but with `new_proto` as its
    /// prototype. `Bottom`, `Function`, `Proto`, and `ProtoMethod` have no
    /// prototype slot and are returned unchanged, matching the spec's
    /// pass-through rule.
    #[must_use]
    pub fn inherit(&self, new_proto: Value) -> Value {
        match &self.0.kind {
            ValueKind::Bottom
            | ValueKind::Function(_)
            | ValueKind::Proto(_)
            | ValueKind::ProtoMethod(_) => self.clone(),
            ValueKind::Number(n) => Self::new(ValueKind::Number(*n), self.0.hash.clone(), Some(new_proto)),
            ValueKind::Str(s) => {
                Self::new(ValueKind::Str(s.clone()), self.0.hash.clone(), Some(new_proto))
            }
            ValueKind::Boolean(b) => {
                Self::new(ValueKind::Boolean(*b), self.0.hash.clone(), Some(new_proto))
            }
            ValueKind::Tuple(items) => Self::new(
                ValueKind::Tuple(items.clone()),
                self.0.hash.clone(),
                Some(new_proto),
            ),
            ValueKind::Record(entries) => Self::new(
                ValueKind::Record(entries.clone()),
                self.0.hash.clone(),
                Some(new_proto),
            ),
        }
    }

    #[must_use]
    pub fn is_tuple(&self) -> bool {
        matches!(self.0.kind, ValueKind::Tuple(_))
    }

    #[must_use]
    pub fn as_tuple_items(&self) -> Option<&[Value]> {
        match &self.0.kind {
            ValueKind::Tuple(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self.0.kind {
            ValueKind::Number(n) => Some(n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match &self.0.kind {
            ValueKind::Str(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_boolean(&self) -> Option<bool> {
        match self.0.kind {
            ValueKind::Boolean(b) => Some(b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_record_entries(&self) -> Option<&IndexMap<String, RecordEntry>> {
        match &self.0.kind {
            ValueKind::Record(entries) => Some(entries),
            _ => None,
        }
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match &self.0.kind {
            ValueKind::Number(_) => "number",
            ValueKind::Str(_) => "string",
            ValueKind::Boolean(_) => "boolean",
            ValueKind::Bottom => "bottom",
            ValueKind::Tuple(_) => "tuple",
            ValueKind::Record(_) => "record",
            ValueKind::Function(_) => "function",
            ValueKind::Proto(_) => "proto",
            ValueKind::ProtoMethod(_) => "proto method",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.kind {
            ValueKind::Number(n) => write!(f, "{n}"),
            ValueKind::Str(s) => write!(f, "{s}"),
            ValueKind::Boolean(b) => write!(f, "{b}"),
            ValueKind::Bottom => write!(f, "bottom"),
            ValueKind::Tuple(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            ValueKind::Record(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.values().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key} -> {value}")?;
                }
                write!(f, "}}")
            }
            ValueKind::Function(_) => write!(f, "<function>"),
            ValueKind::Proto(_) => write!(f, "<proto>"),
            ValueKind::ProtoMethod(_) => write!(f, "<proto method>"),
        }
    }
}

/// Process-wide, lazily-initialized, read-only prototype tables for the
/// built-in value kinds. Built via `OnceLock` rather than a mutable global,
/// matching the teacher's preference for initialize-once global state over
/// `unsafe`.
pub mod protos {
    use std::sync::OnceLock;

    use super::Value;
    use crate::builtins;
    use crate::function::Proto;

    fn proto_cell(methods: Vec<(&'static str, crate::function::NativeMethod)>) -> Value {
        Value::proto(Proto::native(methods))
    }

    pub fn tuple_proto() -> Value {
        static CELL: OnceLock<Value> = OnceLock::new();
        CELL.get_or_init(|| proto_cell(vec![("push", builtins::tuple_push::METHOD)]))
            .clone()
    }

    pub fn number_proto() -> Value {
        static CELL: OnceLock<Value> = OnceLock::new();
        CELL.get_or_init(|| proto_cell(vec![("stringify", builtins::number_stringify::METHOD)]))
            .clone()
    }

    pub fn string_proto() -> Value {
        static CELL: OnceLock<Value> = OnceLock::new();
        CELL.get_or_init(|| proto_cell(vec![("upper", builtins::string_upper::METHOD)]))
            .clone()
    }

    pub fn boolean_proto() -> Value {
        static CELL: OnceLock<Value> = OnceLock::new();
        CELL.get_or_init(|| {
            proto_cell(vec![("stringify", builtins::boolean_stringify::METHOD)])
        })
        .clone()
    }

    pub fn record_proto() -> Value {
        static CELL: OnceLock<Value> = OnceLock::new();
        CELL.get_or_init(|| proto_cell(vec![("get", builtins::record_get::METHOD)]))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_literals_hash_equal() {
        assert!(Value::number(1.0).value_eq(&Value::number(1.0)));
        assert!(Value::string("a").value_eq(&Value::string("a")));
        assert!(!Value::number(1.0).value_eq(&Value::number(2.0)));
    }

    #[test]
    fn nested_tuples_compare_structurally() {
        let a = Value::tuple(vec![
            Value::number(1.0),
            Value::string("a"),
            Value::tuple(vec![Value::boolean(true), Value::bottom()]),
        ]);
        let b = Value::tuple(vec![
            Value::number(1.0),
            Value::string("a"),
            Value::tuple(vec![Value::boolean(true), Value::bottom()]),
        ]);
        assert!(a.value_eq(&b));
    }

    #[test]
    fn reordered_tuples_are_not_equal() {
        let a = Value::tuple(vec![Value::number(1.0), Value::number(2.0)]);
        let b = Value::tuple(vec![Value::number(2.0), Value::number(1.0)]);
        assert!(!a.value_eq(&b));
    }

    #[test]
    fn inherit_replaces_prototype_without_mutating_source() {
        let original_proto = protos::number_proto();
        let n = Value::number(5.0);
        assert!(n.proto_value().unwrap().value_eq(&original_proto));

        let new_proto = protos::string_proto();
        let inherited = n.inherit(new_proto.clone());
        assert!(inherited.proto_value().unwrap().value_eq(&new_proto));
        assert!(n.proto_value().unwrap().value_eq(&original_proto));
    }

    #[test]
    fn bottom_inherit_is_a_pass_through() {
        let b = Value::bottom();
        let inherited = b.inherit(protos::number_proto());
        assert!(inherited.proto_value().is_none());
    }
}
