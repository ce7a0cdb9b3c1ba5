use crate::syntax::*;
use std::fmt;

/// Strings quoted, as they appear inside containers.
pub struct Repr<'a>(pub &'a Value);

fn items(f: &mut fmt::Formatter<'_>, head: &str, items: &[Value]) -> fmt::Result {
    write!(f, "({}", head)?;
    for item in items {
        write!(f, " {}", Repr(item))?;
    }
    write!(f, ")")
}

impl fmt::Display for Repr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            | Value::Str(s) => write!(f, "{:?}", s),
            | value => write!(f, "{}", value),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            | Value::Unit => write!(f, "nil"),
            | Value::Bool(true) => write!(f, "#t"),
            | Value::Bool(false) => write!(f, "#f"),
            | Value::Int(i) => write!(f, "{}", i),
            | Value::Str(s) => write!(f, "{}", s),
            | Value::Tuple(values) => items(f, "tuple", values),
            | Value::List(values) => match values.try_borrow() {
                | Ok(values) => items(f, "list", &values),
                | Err(_) => write!(f, "(list ...)"),
            },
            | Value::Func(func) => write!(f, "{:?}", func),
            | Value::Jump(_) => write!(f, "<jump>"),
            | Value::Promise(_) => write!(f, "<promise>"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Repr(self))
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            | Callable::Closure(Closure { func, .. }) => write!(f, "<fn {}>", func.concise()),
            | Callable::Native(Native { name, .. }) => write!(f, "<native {}>", name),
            | Callable::LoopHandle { .. } => write!(f, "<loop>"),
            | Callable::Escape { .. } => write!(f, "<ec>"),
            | Callable::Continuation(_) => write!(f, "<continuation>"),
            | Callable::Identity => write!(f, "<identity>"),
            | wrapper => match wrapper.inner() {
                | Some(inner) => write!(f, "{:?}", inner),
                | None => write!(f, "<callable>"),
            },
        }
    }
}
