//! Callable runtime values: user-defined [`Function`]s, [`Proto`] method
//! tables, and [`ProtoMethod`]s bound (or not) to a receiver.
//!
//! Grounded on the original interpreter's `internal/value/function.go` and
//! `protoMethod.go`: the same `params`/`args`/`arity`/`rest`/`apply`/`bind`
//! shape, reimplemented without in-place mutation (every operation that
//! "changes" a callable returns a new one) and with eager id assignment via
//! a process-wide counter instead of a lazily-minted `uuid`.

use std::rc::Rc;

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::ast::{Binding, Node};
use crate::environment::Environment;
use crate::error::RuntimeError;
use crate::token::CodeLoc;
use crate::value::{next_callable_id, Value};

/// Small inline buffer for already-applied arguments; most calls apply
/// zero or a handful of arguments before invocation.
pub type Args = SmallVec<[Value; 4]>;

struct FunctionShared {
    params: Vec<Binding>,
    body: Rc<Node>,
    closure_env: Option<Environment<Value>>,
}

/// A user-defined, interpreted callable produced by a `fn(...)` literal.
#[derive(Clone)]
pub struct Function {
    shared: Rc<FunctionShared>,
    apps: Args,
    id: u64,
}

impl Function {
    #[must_use]
    pub fn new(params: Vec<Binding>, body: Rc<Node>, closure_env: Option<Environment<Value>>) -> Self {
        Function {
            shared: Rc::new(FunctionShared {
                params,
                body,
                closure_env,
            }),
            apps: Args::new(),
            id: next_callable_id(),
        }
    }

    #[must_use]
    pub fn params(&self) -> &[Binding] {
        &self.shared.params
    }

    #[must_use]
    pub fn body(&self) -> &Node {
        &self.shared.body
    }

    #[must_use]
    pub fn body_rc(&self) -> Rc<Node> {
        self.shared.body.clone()
    }

    #[must_use]
    pub fn closure_env(&self) -> Option<&Environment<Value>> {
        self.shared.closure_env.as_ref()
    }

    #[must_use]
    pub fn apps(&self) -> &[Value] {
        &self.apps
    }

    #[must_use]
    pub fn has_rest(&self) -> bool {
        self.shared.params.last().is_some_and(|p| p.rest)
    }

    /// Remaining formal arity, not counting the rest parameter (if any) or
    /// arguments already applied.
    #[must_use]
    pub fn arity(&self) -> usize {
        let formal = self.shared.params.len() - usize::from(self.has_rest());
        formal.saturating_sub(self.apps.len())
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Produces a new callable with `extra` appended to the already-applied
    /// arguments. Never mutates `self`; always assigns a fresh id, since
    /// every construction is a distinct callable per the spec's hash rule.
    #[must_use]
    pub fn apply(&self, extra: impl IntoIterator<Item = Value>) -> Function {
        let mut apps = self.apps.clone();
        apps.extend(extra);
        Function {
            shared: self.shared.clone(),
            apps,
            id: next_callable_id(),
        }
    }
}

/// A native (builtin) method implementation: a plain Rust function plus the
/// arity bookkeeping needed to participate in partial application like any
/// other callable.
pub struct NativeMethod {
    pub name: &'static str,
    pub arity: usize,
    pub handler: NativeFn,
}

pub type NativeFn =
    fn(me: Option<&Value>, args: &[Value], loc: CodeLoc) -> Result<Value, RuntimeError>;

enum ProtoMethodShared {
    Interpreted {
        params: Vec<Binding>,
        body: Rc<Node>,
        closure_env: Option<Environment<Value>>,
    },
    Native(&'static NativeMethod),
}

/// A method fetched from a [`Proto`] table, optionally bound to a receiver.
#[derive(Clone)]
pub struct ProtoMethod {
    shared: Rc<ProtoMethodShared>,
    apps: Args,
    me: Option<Value>,
    id: u64,
}

impl ProtoMethod {
    #[must_use]
    pub fn interpreted(
        params: Vec<Binding>,
        body: Rc<Node>,
        closure_env: Option<Environment<Value>>,
    ) -> Self {
        ProtoMethod {
            shared: Rc::new(ProtoMethodShared::Interpreted {
                params,
                body,
                closure_env,
            }),
            apps: Args::new(),
            me: None,
            id: next_callable_id(),
        }
    }

    #[must_use]
    pub fn native(native: &'static NativeMethod) -> Self {
        ProtoMethod {
            shared: Rc::new(ProtoMethodShared::Native(native)),
            apps: Args::new(),
            me: None,
            id: next_callable_id(),
        }
    }

    #[must_use]
    pub fn apps(&self) -> &[Value] {
        &self.apps
    }

    #[must_use]
    pub fn me(&self) -> Option<&Value> {
        self.me.as_ref()
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn arity(&self) -> usize {
        let formal = match self.shared.as_ref() {
            ProtoMethodShared::Interpreted { params, .. } => {
                params.len() - usize::from(params.last().is_some_and(|p| p.rest))
            }
            ProtoMethodShared::Native(n) => n.arity,
        };
        formal.saturating_sub(self.apps.len())
    }

    #[must_use]
    pub fn has_rest(&self) -> bool {
        match self.shared.as_ref() {
            ProtoMethodShared::Interpreted { params, .. } => {
                params.last().is_some_and(|p| p.rest)
            }
            ProtoMethodShared::Native(_) => false,
        }
    }

    /// Binds `receiver` as `me`. A no-op (returns `self`) if already bound —
    /// matches the original `Bind`'s "already has a receiver" short-circuit.
    #[must_use]
    pub fn bind(&self, receiver: Value) -> ProtoMethod {
        if self.me.is_some() {
            return self.clone();
        }
        ProtoMethod {
            shared: self.shared.clone(),
            apps: self.apps.clone(),
            me: Some(receiver),
            id: next_callable_id(),
        }
    }

    #[must_use]
    pub fn apply(&self, extra: impl IntoIterator<Item = Value>) -> ProtoMethod {
        let mut apps = self.apps.clone();
        apps.extend(extra);
        ProtoMethod {
            shared: self.shared.clone(),
            apps,
            me: self.me.clone(),
            id: next_callable_id(),
        }
    }

    /// Interpreted method body, if this isn't a native method.
    #[must_use]
    pub fn interpreted_body(&self) -> Option<(&[Binding], &Node, Option<&Environment<Value>>)> {
        match self.shared.as_ref() {
            ProtoMethodShared::Interpreted {
                params,
                body,
                closure_env,
            } => Some((params, body, closure_env.as_ref())),
            ProtoMethodShared::Native(_) => None,
        }
    }

    #[must_use]
    pub fn native_handler(&self) -> Option<NativeFn> {
        match self.shared.as_ref() {
            ProtoMethodShared::Native(n) => Some(n.handler),
            ProtoMethodShared::Interpreted { .. } => None,
        }
    }
}

struct ProtoData {
    keys: Vec<Value>,
    methods: IndexMap<String, ProtoMethod>,
}

/// A prototype method table. Keys keep their declaration order for both
/// hashing and, eventually, iteration.
#[derive(Clone)]
pub struct Proto(Rc<ProtoData>);

impl Proto {
    /// Builds a proto table from evaluated `(key, method)` pairs, in
    /// declaration order, used for `proto { ... }` literals.
    #[must_use]
    pub fn from_entries(entries: Vec<(Value, ProtoMethod)>) -> Self {
        let mut keys = Vec::with_capacity(entries.len());
        let mut methods = IndexMap::with_capacity(entries.len());
        for (key, method) in entries {
            methods.insert(key.hash().to_string(), method);
            keys.push(key);
        }
        Proto(Rc::new(ProtoData { keys, methods }))
    }

    /// Builds a proto table from native methods keyed by plain string
    /// names, used for the built-in per-type prototypes.
    #[must_use]
    pub fn native(methods: Vec<(&'static str, NativeMethod)>) -> Self {
        let leaked: Vec<(&'static str, &'static NativeMethod)> = methods
            .into_iter()
            .map(|(name, m)| (name, &*Box::leak(Box::new(m))))
            .collect();
        let entries = leaked
            .into_iter()
            .map(|(name, m)| (Value::string(name), ProtoMethod::native(m)))
            .collect();
        Self::from_entries(entries)
    }

    #[must_use]
    pub fn get(&self, key_hash: &str) -> Option<&ProtoMethod> {
        self.0.methods.get(key_hash)
    }

    #[must_use]
    pub fn hash(&self) -> String {
        let mut h = String::from("prt:");
        for key in &self.0.keys {
            if let Some(method) = self.0.methods.get(key.hash()) {
                h.push_str(key.hash());
                h.push_str("->");
                h.push_str(&format!("pm:{}", method.id()));
            }
        }
        h
    }
}
