pub use bounce_syntax::*;

use crate::{jump::JumpRecord, promise::Promise, Runtime};
use derive_more::From;
use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    rc::Rc,
};

/* ---------------------------------- Value --------------------------------- */

#[derive(From, Clone)]
pub enum Value {
    #[from(skip)]
    Unit,
    Bool(bool),
    Int(i64),
    Str(Rc<str>),
    Tuple(Rc<[Value]>),
    List(Rc<RefCell<Vec<Value>>>),
    Func(Rc<Callable>),
    Jump(Rc<JumpRecord>),
    Promise(Rc<Promise>),
}

/// A mutable binding; closures and continuations share them.
pub type Slot = Rc<RefCell<Value>>;
pub type Env = im::HashMap<VarName, Slot>;
pub type Kwargs = Vec<(VarName, Value)>;

/// Hashable view of a value, used as a memoization key.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum MemoKey {
    Unit,
    Bool(bool),
    Int(i64),
    Str(Rc<str>),
    Tuple(Vec<MemoKey>),
}

/* -------------------------------- Callable -------------------------------- */

pub type NativeFn = fn(&mut Runtime, Vec<Value>) -> crate::Result<Value>;

#[derive(Clone)]
pub struct Native {
    pub name: &'static str,
    /// `None` for variadic natives
    pub arity: Option<usize>,
    pub body: NativeFn,
}

#[derive(Clone)]
pub struct Closure {
    pub func: FnId,
    pub env: Env,
}

/// Whether a continuation or activation can still be resumed.
pub type Extent = Rc<Cell<bool>>;

/// The rest of a function body after a capture point.
#[derive(Clone)]
pub struct Continuation {
    pub closure: Closure,
    /// the activation the continuation was captured in
    pub extent: Extent,
    pub lazy: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Variant {
    Strict,
    /// forces promise arguments before handing them to strict callables
    PromiseAware,
}

pub enum Callable {
    Closure(Closure),
    Native(Native),
    /// runs the trampoline until a non-jump value comes out
    Trampolined { inner: Rc<Callable>, variant: Variant },
    Memoized { inner: Rc<Callable>, cache: RefCell<HashMap<Vec<MemoKey>, Value>> },
    /// passes a [`Callable::LoopHandle`] as the first argument
    Looped { inner: Rc<Callable> },
    LoopHandle { inner: Rc<Callable> },
    /// passes a fresh [`Callable::Escape`] as the first argument
    EscapePoint { inner: Rc<Callable> },
    Escape { tag: usize, live: Extent },
    /// supplies the identity continuation when no `cc` is given
    ContEnabled { inner: Rc<Callable> },
    /// accepts promises as arguments
    LazyFn { inner: Rc<Callable> },
    Continuation(Continuation),
    /// the default continuation
    Identity,
}

impl Callable {
    /// Wrappers that only add behaviour around another callable.
    pub fn inner(&self) -> Option<&Rc<Callable>> {
        match self {
            | Callable::Trampolined { inner, .. }
            | Callable::Memoized { inner, .. }
            | Callable::Looped { inner }
            | Callable::EscapePoint { inner }
            | Callable::ContEnabled { inner }
            | Callable::LazyFn { inner } => Some(inner),
            | Callable::Closure(_)
            | Callable::Native(_)
            | Callable::LoopHandle { .. }
            | Callable::Escape { .. }
            | Callable::Continuation(_)
            | Callable::Identity => None,
        }
    }
    pub fn is_lazy(&self) -> bool {
        match self {
            | Callable::LazyFn { .. } => true,
            | Callable::Continuation(cont) => cont.lazy,
            // keys are computed from forced arguments
            | Callable::Memoized { .. } => false,
            | _ => self.inner().is_some_and(|inner| inner.is_lazy()),
        }
    }
    /// Takes `cc` as a keyword argument.
    pub fn accepts_cc(&self) -> bool {
        match self {
            | Callable::ContEnabled { .. } => true,
            | Callable::Memoized { .. } => false,
            | _ => self.inner().is_some_and(|inner| inner.accepts_cc()),
        }
    }
    /// Jumping to a continuation discards the current one.
    pub fn is_continuation(&self) -> bool {
        match self {
            | Callable::Continuation(_) | Callable::Identity => true,
            | Callable::Trampolined { inner, .. } => inner.is_continuation(),
            | _ => false,
        }
    }
}

impl Variant {
    /// The trampoline variant suited to running `callable`.
    pub fn of(callable: &Callable) -> Self {
        if callable.is_lazy() { Variant::PromiseAware } else { Variant::Strict }
    }
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            | Value::Unit => "nil",
            | Value::Bool(_) => "bool",
            | Value::Int(_) => "int",
            | Value::Str(_) => "str",
            | Value::Tuple(_) => "tuple",
            | Value::List(_) => "list",
            | Value::Func(func) if func.is_continuation() => "continuation",
            | Value::Func(_) => "function",
            | Value::Jump(_) => "jump",
            | Value::Promise(_) => "promise",
        }
    }
    pub fn truthy(&self) -> bool {
        !matches!(self, Value::Unit | Value::Bool(false))
    }
    pub fn str(s: impl AsRef<str>) -> Self {
        Value::Str(Rc::from(s.as_ref()))
    }
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items)))
    }
    pub fn tuple(items: Vec<Value>) -> Self {
        Value::Tuple(Rc::from(items))
    }
    /// Zero values are nil, one value is itself, several are a tuple.
    pub fn pack(mut values: Vec<Value>) -> Self {
        match values.len() {
            | 0 => Value::Unit,
            | 1 => values.remove(0),
            | _ => Value::tuple(values),
        }
    }
    pub fn memo_key(&self) -> Option<MemoKey> {
        Some(match self {
            | Value::Unit => MemoKey::Unit,
            | Value::Bool(b) => MemoKey::Bool(*b),
            | Value::Int(i) => MemoKey::Int(*i),
            | Value::Str(s) => MemoKey::Str(s.clone()),
            | Value::Tuple(items) => {
                MemoKey::Tuple(items.iter().map(Value::memo_key).collect::<Option<_>>()?)
            }
            | Value::List(_) | Value::Func(_) | Value::Jump(_) | Value::Promise(_) => return None,
        })
    }
}

/// Structural on data, identity on functions and promises.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            | (Value::Unit, Value::Unit) => true,
            | (Value::Bool(a), Value::Bool(b)) => a == b,
            | (Value::Int(a), Value::Int(b)) => a == b,
            | (Value::Str(a), Value::Str(b)) => a == b,
            | (Value::Tuple(a), Value::Tuple(b)) => a == b,
            | (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            | (Value::Func(a), Value::Func(b)) => Rc::ptr_eq(a, b),
            | (Value::Jump(a), Value::Jump(b)) => Rc::ptr_eq(a, b),
            | (Value::Promise(a), Value::Promise(b)) => Rc::ptr_eq(a, b),
            | _ => false,
        }
    }
}
