//! Native functions available to every program.

use crate::{err::*, eval::callable, fmt::Repr, syntax::*, Runtime};
use std::{io::Write, rc::Rc};

macro_rules! natives {
    ($($name:literal $arity:expr => $body:path;)*) => {
        const NATIVES: &[Native] = &[$(Native { name: $name, arity: $arity, body: $body },)*];
    };
}

natives! {
    "+" None => add;
    "-" None => sub;
    "*" None => mul;
    "/" Some(2) => div;
    "%" Some(2) => rem;
    "=" Some(2) => eq;
    "<" Some(2) => lt;
    ">" Some(2) => gt;
    "<=" Some(2) => le;
    ">=" Some(2) => ge;
    "not" Some(1) => not;
    "list" None => list;
    "tuple" None => tuple;
    "values" None => values;
    "push!" Some(2) => push;
    "len" Some(1) => len;
    "nth" Some(2) => nth;
    "print" None => print;
    "str" None => to_str;
    "type-of" Some(1) => type_of;
    "raise" None => raise;
    "assert-eq" Some(2) => assert_eq;
    "force" Some(1) => force;
    "force-deep" Some(1) => force_deep;
    "try" Some(2) => try_;
}

pub(crate) fn install(rt: &mut Runtime) {
    for native in NATIVES {
        rt.define(native.name, Value::Func(Rc::new(Callable::Native(native.clone()))));
    }
    rt.define("identity", Value::Func(Rc::new(Callable::Identity)));
}

/* --------------------------------- Helpers -------------------------------- */

fn int(op: &str, value: &Value) -> Result<i64> {
    match value {
        | Value::Int(i) => Ok(*i),
        | value => Err(EvalError::TypeMismatch {
            op: op.to_string(),
            expected: "int",
            found: value.type_name(),
        }),
    }
}

fn ints(op: &str, args: &[Value]) -> Result<Vec<i64>> {
    args.iter().map(|arg| int(op, arg)).collect()
}

/// Natives with a fixed arity are only called with that many arguments.
fn two(args: Vec<Value>) -> (Value, Value) {
    let mut args = args.into_iter();
    (args.next().unwrap_or(Value::Unit), args.next().unwrap_or(Value::Unit))
}

fn one(args: Vec<Value>) -> Value {
    args.into_iter().next().unwrap_or(Value::Unit)
}

fn compare(op: &str, args: Vec<Value>, cmp: fn(&i64, &i64) -> bool) -> Result<Value> {
    let (a, b) = two(args);
    Ok(Value::Bool(cmp(&int(op, &a)?, &int(op, &b)?)))
}

/* ------------------------------- Arithmetic ------------------------------- */

fn add(_: &mut Runtime, args: Vec<Value>) -> Result<Value> {
    Ok(Value::Int(ints("+", &args)?.into_iter().fold(0, i64::wrapping_add)))
}

fn sub(_: &mut Runtime, args: Vec<Value>) -> Result<Value> {
    let ints = ints("-", &args)?;
    match ints.split_first() {
        | None => Err(EvalError::Arity { func: "-".to_string(), expected: 1, found: 0 }),
        | Some((first, [])) => Ok(Value::Int(first.wrapping_neg())),
        | Some((first, rest)) => {
            Ok(Value::Int(rest.iter().fold(*first, |acc, b| acc.wrapping_sub(*b))))
        }
    }
}

fn mul(_: &mut Runtime, args: Vec<Value>) -> Result<Value> {
    Ok(Value::Int(ints("*", &args)?.into_iter().fold(1, i64::wrapping_mul)))
}

fn div(_: &mut Runtime, args: Vec<Value>) -> Result<Value> {
    let (a, b) = two(args);
    match int("/", &b)? {
        | 0 => Err(EvalError::DivisionByZero),
        | b => Ok(Value::Int(int("/", &a)?.wrapping_div(b))),
    }
}

fn rem(_: &mut Runtime, args: Vec<Value>) -> Result<Value> {
    let (a, b) = two(args);
    match int("%", &b)? {
        | 0 => Err(EvalError::DivisionByZero),
        | b => Ok(Value::Int(int("%", &a)?.wrapping_rem(b))),
    }
}

fn eq(_: &mut Runtime, args: Vec<Value>) -> Result<Value> {
    let (a, b) = two(args);
    Ok(Value::Bool(a == b))
}

fn lt(_: &mut Runtime, args: Vec<Value>) -> Result<Value> {
    compare("<", args, i64::lt)
}
fn gt(_: &mut Runtime, args: Vec<Value>) -> Result<Value> {
    compare(">", args, i64::gt)
}
fn le(_: &mut Runtime, args: Vec<Value>) -> Result<Value> {
    compare("<=", args, i64::le)
}
fn ge(_: &mut Runtime, args: Vec<Value>) -> Result<Value> {
    compare(">=", args, i64::ge)
}

fn not(_: &mut Runtime, args: Vec<Value>) -> Result<Value> {
    Ok(Value::Bool(!one(args).truthy()))
}

/* ------------------------------- Containers ------------------------------- */

fn list(_: &mut Runtime, args: Vec<Value>) -> Result<Value> {
    Ok(Value::list(args))
}

fn tuple(_: &mut Runtime, args: Vec<Value>) -> Result<Value> {
    Ok(Value::tuple(args))
}

fn values(_: &mut Runtime, args: Vec<Value>) -> Result<Value> {
    Ok(Value::pack(args))
}

fn push(_: &mut Runtime, args: Vec<Value>) -> Result<Value> {
    match two(args) {
        | (Value::List(items), value) => {
            items.borrow_mut().push(value);
            Ok(Value::List(items))
        }
        | (other, _) => Err(EvalError::TypeMismatch {
            op: "push!".to_string(),
            expected: "list",
            found: other.type_name(),
        }),
    }
}

fn len(_: &mut Runtime, args: Vec<Value>) -> Result<Value> {
    let len = match one(args) {
        | Value::List(items) => items.borrow().len(),
        | Value::Tuple(items) => items.len(),
        | Value::Str(s) => s.chars().count(),
        | other => Err(EvalError::TypeMismatch {
            op: "len".to_string(),
            expected: "list, tuple or str",
            found: other.type_name(),
        })?,
    };
    Ok(Value::Int(len as i64))
}

fn nth(_: &mut Runtime, args: Vec<Value>) -> Result<Value> {
    let (coll, index) = two(args);
    let index = int("nth", &index)?;
    let pick = |items: &[Value]| {
        usize::try_from(index)
            .ok()
            .and_then(|i| items.get(i).cloned())
            .ok_or(EvalError::IndexOutOfRange { index, len: items.len() })
    };
    match coll {
        | Value::List(items) => pick(items.borrow().as_slice()),
        | Value::Tuple(items) => pick(&items[..]),
        | other => Err(EvalError::TypeMismatch {
            op: "nth".to_string(),
            expected: "list or tuple",
            found: other.type_name(),
        }),
    }
}

/* ---------------------------------- Text ---------------------------------- */

fn forced_text(rt: &mut Runtime, args: Vec<Value>, sep: &str) -> Result<String> {
    let mut parts = Vec::with_capacity(args.len());
    for arg in args {
        parts.push(rt.force_deep(arg)?.to_string());
    }
    Ok(parts.join(sep))
}

fn print(rt: &mut Runtime, args: Vec<Value>) -> Result<Value> {
    let line = forced_text(rt, args, " ")?;
    writeln!(rt.output, "{}", line).map_err(|err| EvalError::Output(err.to_string()))?;
    Ok(Value::Unit)
}

fn to_str(rt: &mut Runtime, args: Vec<Value>) -> Result<Value> {
    Ok(Value::str(forced_text(rt, args, "")?))
}

/// Reports what the argument is right now; promises are not forced.
fn type_of(_: &mut Runtime, args: Vec<Value>) -> Result<Value> {
    Ok(Value::str(one(args).type_name()))
}

/* --------------------------------- Control -------------------------------- */

fn raise(rt: &mut Runtime, args: Vec<Value>) -> Result<Value> {
    Err(EvalError::Raised(forced_text(rt, args, "")?))
}

fn assert_eq(rt: &mut Runtime, args: Vec<Value>) -> Result<Value> {
    let (a, b) = two(args);
    let (a, b) = (rt.force_deep(a)?, rt.force_deep(b)?);
    if a == b {
        Ok(Value::Unit)
    } else {
        Err(EvalError::AssertionFailed {
            left: Repr(&a).to_string(),
            right: Repr(&b).to_string(),
        })
    }
}

fn force(rt: &mut Runtime, args: Vec<Value>) -> Result<Value> {
    rt.force(one(args))
}

fn force_deep(rt: &mut Runtime, args: Vec<Value>) -> Result<Value> {
    rt.force_deep(one(args))
}

/// `(try thunk handler)`: run `thunk`; if it fails, pass the error message to
/// `handler`. Escapes pass through untouched.
fn try_(rt: &mut Runtime, args: Vec<Value>) -> Result<Value> {
    let (thunk, handler) = two(args);
    let (thunk, handler) = (callable(thunk)?, callable(handler)?);
    match rt.guarded(|rt| rt.call(&thunk, Vec::new(), Vec::new())) {
        | Err(err) if !err.is_escape() => {
            log::debug!("try: caught `{}`", err);
            rt.call(&handler, vec![Value::str(err.to_string())], Vec::new())
        }
        | result => result,
    }
}
