//! Applying callables: closures, natives and the wrappers decorators install.

use crate::{err::*, eval::Frame, jump::JumpRecord, syntax::*, Runtime};
use bounce_statics::CC;
use std::{cell::Cell, cell::RefCell, rc::Rc};

fn no_keywords(func: &str, kwargs: Kwargs) -> Result<()> {
    match kwargs.into_iter().next() {
        | Some((keyword, _)) => {
            Err(EvalError::UnexpectedKeyword { func: func.to_string(), keyword })
        }
        | None => Ok(()),
    }
}

impl Runtime {
    /// Apply `func` once. The result may be a jump record for the caller's
    /// trampoline to run.
    pub fn apply(
        &mut self, func: &Rc<Callable>, mut args: Vec<Value>, mut kwargs: Kwargs,
    ) -> Result<Value> {
        match func.as_ref() {
            | Callable::Closure(closure) => self.enter(closure, args, kwargs),
            | Callable::Native(native) => {
                no_keywords(native.name, kwargs)?;
                if let Some(expected) = native.arity {
                    if args.len() != expected {
                        Err(EvalError::Arity {
                            func: native.name.to_string(),
                            expected,
                            found: args.len(),
                        })?
                    }
                }
                (native.body)(self, args)
            }
            | Callable::Trampolined { inner, variant } => {
                let first = self.apply(inner, args, kwargs)?;
                self.trampoline(first, *variant)
            }
            | Callable::Memoized { inner, cache } => {
                let mut key = Vec::with_capacity(args.len() + kwargs.len());
                for arg in args.iter_mut() {
                    *arg = self.force(arg.clone())?;
                    key.push(arg.memo_key().ok_or(EvalError::Unhashable(arg.type_name()))?);
                }
                for (name, arg) in kwargs.iter_mut() {
                    *arg = self.force(arg.clone())?;
                    let value = arg.memo_key().ok_or(EvalError::Unhashable(arg.type_name()))?;
                    key.push(MemoKey::Tuple(vec![MemoKey::Str(Rc::from(name.plain())), value]));
                }
                if let Some(hit) = cache.borrow().get(&key) {
                    return Ok(hit.clone());
                }
                let value = self.call(inner, args, kwargs)?;
                cache.borrow_mut().insert(key, value.clone());
                Ok(value)
            }
            | Callable::Looped { inner } => {
                let handle = Rc::new(Callable::LoopHandle { inner: inner.clone() });
                args.insert(0, Value::Func(handle));
                let first = self.apply(inner, args, kwargs)?;
                self.trampoline(first, Variant::of(inner))
            }
            | Callable::LoopHandle { inner } => {
                args.insert(0, Value::Func(func.clone()));
                Ok(JumpRecord::new(inner.clone(), args, kwargs, None).value())
            }
            | Callable::EscapePoint { inner } => {
                let tag = self.next_tag;
                self.next_tag += 1;
                let live = Rc::new(Cell::new(true));
                args.insert(0, Value::Func(Rc::new(Callable::Escape { tag, live: live.clone() })));
                let result = self.apply(inner, args, kwargs);
                live.set(false);
                match result {
                    | Err(EvalError::Escape { tag: target, value }) if target == tag => {
                        log::debug!("escaped to call-ec point #{}", tag);
                        Ok(value)
                    }
                    | result => result,
                }
            }
            | Callable::Escape { tag, live } => {
                if !live.get() {
                    Err(EvalError::EscapeOutsideExtent)?
                }
                no_keywords("escape continuation", kwargs)?;
                Err(EvalError::Escape { tag: *tag, value: Value::pack(args) })
            }
            | Callable::ContEnabled { inner } => {
                if !kwargs.iter().any(|(name, _)| name.plain() == CC) {
                    kwargs.push((VarName::from(CC), Value::Func(Rc::new(Callable::Identity))));
                }
                self.apply(inner, args, kwargs)
            }
            | Callable::LazyFn { inner } => self.apply(inner, args, kwargs),
            | Callable::Continuation(cont) => self.resume(cont, args, kwargs),
            | Callable::Identity => {
                no_keywords("identity", kwargs)?;
                Ok(Value::pack(args))
            }
        }
    }

    /// Apply `func` and run any resulting jump to completion.
    pub fn call(&mut self, func: &Rc<Callable>, args: Vec<Value>, kwargs: Kwargs) -> Result<Value> {
        match self.apply(func, args, kwargs)? {
            | jump @ Value::Jump(_) => self.trampoline(jump, Variant::of(func)),
            | value => Ok(value),
        }
    }

    /// Continue a body cut at a capture point with the values its call
    /// produced.
    fn resume(&mut self, cont: &Continuation, args: Vec<Value>, kwargs: Kwargs) -> Result<Value> {
        if !cont.extent.get() {
            Err(EvalError::ContinuationInvalidated)?
        }
        no_keywords("continuation", kwargs)?;
        let program = self.program.clone();
        let def = &program.program.fns[&cont.closure.func];
        let expected = def.params.len();
        let values = match (expected, args.len()) {
            // nothing to bind; the value is dropped
            | (0, _) => Vec::new(),
            | (n, found) if n == found => args,
            | (n, 1) => match &args[0] {
                | Value::Tuple(values) if values.len() == n => values.to_vec(),
                | Value::Tuple(values) => {
                    Err(EvalError::ContinuationArity { expected: n, found: values.len() })?
                }
                | _ => Err(EvalError::ContinuationArity { expected: n, found: 1 })?,
            },
            | (n, found) => Err(EvalError::ContinuationArity { expected: n, found })?,
        };
        let mut env = cont.closure.env.clone();
        for (param, value) in def.params.iter().zip(values) {
            env.insert(param.clone(), Rc::new(RefCell::new(value)));
        }
        let mut frame = Frame { env, lazy: cont.lazy, extent: None };
        self.eval(&def.body, &mut frame)
    }
}
