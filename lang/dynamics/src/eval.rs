use crate::{
    builtin,
    err::*,
    jump::JumpRecord,
    promise::{Binding, LazyPolicy},
    syntax::*,
};
use bounce_statics::Transformed;
use std::{
    cell::{Cell, RefCell},
    io::Write,
    rc::Rc,
};

pub struct Runtime {
    pub(crate) program: Rc<Transformed>,
    globals: Env,
    pub(crate) output: Box<dyn Write>,
    /// extents of activations that captured inside the innermost running trampoline
    pub(crate) extents: Vec<Extent>,
    pub(crate) next_tag: usize,
}

/// Evaluation state of one activation.
pub struct Frame {
    pub env: Env,
    /// under the call-by-need policy
    pub lazy: bool,
    /// handed to continuations captured here; allocated on the first capture
    pub extent: Option<Extent>,
}

impl Frame {
    pub fn toplevel() -> Self {
        Frame { env: Env::new(), lazy: false, extent: None }
    }
}

pub(crate) fn literal(lit: &Literal) -> Value {
    match lit {
        | Literal::Unit => Value::Unit,
        | Literal::Bool(b) => Value::Bool(*b),
        | Literal::Int(i) => Value::Int(*i),
        | Literal::Str(s) => Value::str(s),
    }
}

pub(crate) fn callable(value: Value) -> Result<Rc<Callable>> {
    match value {
        | Value::Func(func) => Ok(func),
        | value => Err(EvalError::NotCallable(value.type_name())),
    }
}

impl Runtime {
    pub fn new(program: Transformed, output: Box<dyn Write>) -> Self {
        let mut runtime = Runtime {
            program: Rc::new(program),
            globals: Env::new(),
            output,
            extents: Vec::new(),
            next_tag: 0,
        };
        builtin::install(&mut runtime);
        runtime
    }

    pub fn program(&self) -> &Transformed {
        &self.program
    }

    /// Bind or rebind a global.
    pub fn define(&mut self, name: impl Into<VarName>, value: Value) {
        let name = name.into();
        match self.globals.get(&name) {
            | Some(slot) => *slot.borrow_mut() = value,
            | None => {
                self.globals.insert(name, Rc::new(RefCell::new(value)));
            }
        }
    }

    pub fn global(&self, name: &str) -> Option<Value> {
        self.globals.get(&VarName::from(name)).map(|slot| slot.borrow().clone())
    }

    /// Run every toplevel form; the value of the last bare expression is returned.
    pub fn run(&mut self) -> Result<Value> {
        let program = self.program.clone();
        let mut last = Value::Unit;
        for top in &program.program.top {
            match top {
                | Toplevel::Define(name, expr) => {
                    let value = self.toplevel(expr)?;
                    log::trace!("defined `{}`", name);
                    self.define(name.clone(), value);
                }
                | Toplevel::Exec(expr) => {
                    let value = self.toplevel(expr)?;
                    last = self.force(value)?;
                }
            }
        }
        Ok(last)
    }

    fn toplevel(&mut self, expr: &ExprId) -> Result<Value> {
        self.guarded(|rt| rt.eval(expr, &mut Frame::toplevel()))
    }

    /// Run `f`; if it fails, every continuation captured by activations it
    /// entered becomes invalid.
    pub(crate) fn guarded<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let mark = self.extents.len();
        let result = f(self);
        if let Err(err) = &result {
            if !err.is_escape() {
                for extent in &self.extents[mark..] {
                    extent.set(false);
                }
            }
        }
        self.extents.truncate(mark);
        result
    }

    pub(crate) fn new_extent(&mut self) -> Extent {
        let extent = Rc::new(Cell::new(true));
        self.extents.push(extent.clone());
        extent
    }

    /* -------------------------------- Variables ------------------------------- */

    fn slot(&self, name: &VarName, frame: &Frame) -> Result<Slot> {
        frame
            .env
            .get(name)
            .or_else(|| self.globals.get(name))
            .cloned()
            .ok_or_else(|| EvalError::Unbound(name.clone()))
    }

    fn lookup(&self, name: &VarName, frame: &Frame) -> Result<Value> {
        Ok(self.slot(name, frame)?.borrow().clone())
    }

    /* ------------------------------- Expressions ------------------------------ */

    pub fn eval(&mut self, expr: &ExprId, frame: &mut Frame) -> Result<Value> {
        let program = self.program.clone();
        match &program.program.exprs[expr] {
            | Expr::Lit(lit) => Ok(literal(lit)),
            | Expr::Var(name) => {
                let value = self.lookup(name, frame)?;
                if frame.lazy { self.force(value) } else { Ok(value) }
            }
            | Expr::Fn(func) => self.closure(func, frame),
            | Expr::Call(Call { func, args, kwargs }) => {
                let callee = callable(self.eval_forced(func, frame)?)?;
                let policy = match frame.lazy && callee.is_lazy() {
                    | true => LazyPolicy::for_binding(Binding::NewName),
                    | false => LazyPolicy::Strict,
                };
                let args = self.operands(args, frame, policy)?;
                let kwargs = self.keywords(kwargs, frame, policy)?;
                self.apply(&callee, args, kwargs)
            }
            | Expr::If(If { arms, alt }) => {
                for Arm { cond, body } in arms {
                    if self.eval_forced(cond, frame)?.truthy() {
                        return self.eval(body, frame);
                    }
                }
                match alt {
                    | Some(alt) => self.eval(alt, frame),
                    | None => Ok(Value::Unit),
                }
            }
            | Expr::Short(ShortCircuit { op, operands }) => {
                let mut value = Value::Bool(*op == BoolOp::And);
                for operand in operands {
                    value = self.eval_forced(operand, frame)?;
                    let done = match op {
                        | BoolOp::And => !value.truthy(),
                        | BoolOp::Or => value.truthy(),
                    };
                    if done {
                        break;
                    }
                }
                Ok(value)
            }
            | Expr::Seq(items) => {
                let saved = frame.env.clone();
                let mut result = Ok(Value::Unit);
                for item in items {
                    result = self.eval(item, frame);
                    if result.is_err() {
                        break;
                    }
                }
                frame.env = saved;
                result
            }
            | Expr::Let(Let { binder, bindee }) => {
                let slot = Rc::new(RefCell::new(Value::Unit));
                if let Expr::Fn(_) = &program.program.exprs[bindee] {
                    // visible to the function itself
                    frame.env.insert(binder.clone(), slot.clone());
                    *slot.borrow_mut() = self.eval(bindee, frame)?;
                } else {
                    let policy = LazyPolicy::for_binding(Binding::NewName);
                    *slot.borrow_mut() = self.operand(bindee, frame, policy)?;
                    frame.env.insert(binder.clone(), slot);
                }
                Ok(Value::Unit)
            }
            | Expr::Set(Set { binder, bindee }) => {
                let policy = LazyPolicy::for_binding(Binding::Reassign);
                let value = self.operand(bindee, frame, policy)?;
                *self.slot(binder, frame)?.borrow_mut() = value;
                Ok(Value::Unit)
            }
            | Expr::While(While { cond, body }) => {
                while self.eval_forced(cond, frame)?.truthy() {
                    self.eval(body, frame)?;
                }
                Ok(Value::Unit)
            }
            | Expr::Jump(Jump { func, args, kwargs, cc }) => {
                let target = callable(self.eval_forced(func, frame)?)?;
                // the trampoline decides what to force
                let args = self.operands(args, frame, LazyPolicy::Delay)?;
                let kwargs = self.keywords(kwargs, frame, LazyPolicy::Delay)?;
                let cc = match cc {
                    | Some(cc) => Some(self.eval_forced(cc, frame)?),
                    | None => None,
                };
                Ok(JumpRecord::new(target, args, kwargs, cc).value())
            }
            | Expr::Capture(_) => {
                Err(EvalError::Unsupported("`capture` outside of a `continuations` block"))
            }
        }
    }

    fn eval_forced(&mut self, expr: &ExprId, frame: &mut Frame) -> Result<Value> {
        let value = self.eval(expr, frame)?;
        self.force(value)
    }

    /// Evaluate an argument-like position. Outside lazy bodies everything is
    /// evaluated as is.
    fn operand(&mut self, expr: &ExprId, frame: &mut Frame, policy: LazyPolicy) -> Result<Value> {
        if !frame.lazy {
            return self.eval(expr, frame);
        }
        match policy {
            | LazyPolicy::Strict => self.eval_forced(expr, frame),
            | LazyPolicy::Delay => self.delayed(expr, frame),
        }
    }

    fn operands(
        &mut self, exprs: &[ExprId], frame: &mut Frame, policy: LazyPolicy,
    ) -> Result<Vec<Value>> {
        exprs.iter().map(|expr| self.operand(expr, frame, policy)).collect()
    }

    fn keywords(
        &mut self, kwargs: &[(VarName, ExprId)], frame: &mut Frame, policy: LazyPolicy,
    ) -> Result<Kwargs> {
        let mut values = Vec::with_capacity(kwargs.len());
        for (name, expr) in kwargs {
            values.push((name.clone(), self.operand(expr, frame, policy)?));
        }
        Ok(values)
    }

    /// Names are passed through unforced; other atoms are cheap enough to
    /// evaluate right away.
    fn delayed(&mut self, expr: &ExprId, frame: &mut Frame) -> Result<Value> {
        let program = self.program.clone();
        match &program.program.exprs[expr] {
            | Expr::Var(name) => self.lookup(name, frame),
            | Expr::Lit(_) | Expr::Fn(_) => self.eval(expr, frame),
            | _ => {
                let (expr, env) = (*expr, frame.env.clone());
                Ok(Runtime::delay(move |rt| {
                    // argument expressions never capture
                    let mut frame = Frame { env: env.clone(), lazy: true, extent: None };
                    rt.eval(&expr, &mut frame)
                }))
            }
        }
    }

    fn closure(&mut self, func: &FnId, frame: &mut Frame) -> Result<Value> {
        let program = self.program.clone();
        let def = &program.program.fns[func];
        let closure = Closure { func: *func, env: frame.env.clone() };
        let callable = match def.kind {
            | FnKind::Plain => decorate(Callable::Closure(closure), program.decorations_of(func)),
            | FnKind::Continuation => {
                let extent = match frame.extent.clone() {
                    | Some(extent) => extent,
                    | None => {
                        let extent = self.new_extent();
                        frame.extent = Some(extent.clone());
                        extent
                    }
                };
                let lazy = def.regions.lazy;
                let cont = Callable::Continuation(Continuation { closure, extent, lazy });
                log::debug!("captured continuation {}", func.concise());
                let variant = if lazy { Variant::PromiseAware } else { Variant::Strict };
                Rc::new(Callable::Trampolined { inner: Rc::new(cont), variant })
            }
        };
        Ok(Value::Func(callable))
    }

    /// Bind arguments to the parameters of `closure` and run its body.
    pub(crate) fn enter(
        &mut self, closure: &Closure, args: Vec<Value>, kwargs: Kwargs,
    ) -> Result<Value> {
        let program = self.program.clone();
        let def = &program.program.fns[&closure.func];
        let label = || match &def.name {
            | Some(name) => name.plain().to_string(),
            | None => format!("fn {}", closure.func.concise()),
        };
        if args.len() > def.params.len() {
            Err(EvalError::Arity { func: label(), expected: def.params.len(), found: args.len() })?
        }
        let mut bound: Vec<Option<Value>> = vec![None; def.params.len()];
        for (i, arg) in args.into_iter().enumerate() {
            bound[i] = Some(arg);
        }
        for (keyword, arg) in kwargs {
            match def.params.iter().position(|param| param == &keyword) {
                | Some(i) => bound[i] = Some(arg),
                | None => Err(EvalError::UnexpectedKeyword { func: label(), keyword })?,
            }
        }
        let mut env = closure.env.clone();
        for (param, value) in def.params.iter().zip(bound) {
            let value = value
                .ok_or_else(|| EvalError::MissingArgument { func: label(), param: param.clone() })?;
            env.insert(param.clone(), Rc::new(RefCell::new(value)));
        }
        let mut frame = Frame { env, lazy: program.is_lazy(&closure.func), extent: None };
        self.eval(&def.body, &mut frame)
    }
}

/// Wrap `base` with `kinds`, given outermost first.
pub fn decorate(base: Callable, kinds: &[bounce_statics::DecoratorKind]) -> Rc<Callable> {
    use bounce_statics::DecoratorKind as Kind;
    let mut callable = Rc::new(base);
    for kind in kinds.iter().rev() {
        callable = Rc::new(match kind {
            | Kind::Memoize => Callable::Memoized { inner: callable, cache: Default::default() },
            | Kind::Trampolined => {
                let variant = Variant::of(&callable);
                Callable::Trampolined { inner: callable, variant }
            }
            | Kind::Looped => Callable::Looped { inner: callable },
            | Kind::CallEc => Callable::EscapePoint { inner: callable },
            | Kind::Continuations => Callable::ContEnabled { inner: callable },
            | Kind::Lazy => Callable::LazyFn { inner: callable },
        });
    }
    callable
}
