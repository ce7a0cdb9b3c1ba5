use crate::{
    err::*,
    eval::callable,
    jump::{JumpPayload, JumpRecord},
    syntax::*,
    Runtime,
};
use bounce_statics::CC;

pub enum Step<T, Out> {
    Done(Out),
    Step(T),
}

impl Runtime {
    /// Run jump records until a plain value comes out. Stack depth stays
    /// constant however many jumps are made.
    pub fn trampoline(&mut self, first: Value, variant: Variant) -> Result<Value> {
        self.guarded(|rt| {
            let mut current = first;
            loop {
                match rt.step(current, variant)? {
                    | Step::Done(value) => break Ok(value),
                    | Step::Step(next) => current = next,
                }
            }
        })
    }

    fn step(&mut self, current: Value, variant: Variant) -> Result<Step<Value, Value>> {
        let record = match current {
            | Value::Jump(record) => record,
            | value => return Ok(Step::Done(value)),
        };
        let JumpPayload { target, mut args, mut kwargs, cc } = record.take()?;
        // the trampoline is running now; the target's own one would be redundant
        let callee = match target.as_ref() {
            | Callable::Trampolined { inner, .. } => inner.clone(),
            | _ => target.clone(),
        };
        if variant == Variant::PromiseAware && !callee.is_lazy() {
            for arg in args.iter_mut() {
                *arg = self.force(arg.clone())?;
            }
            for (_, arg) in kwargs.iter_mut() {
                *arg = self.force(arg.clone())?;
            }
        }
        log::trace!("trampoline: jump to {:?}", callee);
        let next = match cc {
            | None => self.apply(&callee, args, kwargs)?,
            | Some(cc) if callee.accepts_cc() => {
                kwargs.retain(|(name, _)| name.plain() != CC);
                kwargs.push((VarName::from(CC), cc));
                self.apply(&callee, args, kwargs)?
            }
            | Some(_) if callee.is_continuation() => self.apply(&callee, args, kwargs)?,
            | Some(cc) => {
                // a callable that knows nothing of continuations returns normally
                let result = self.call(&target, args, kwargs)?;
                JumpRecord::new(callable(cc)?, vec![result], Vec::new(), None).value()
            }
        };
        Ok(Step::Step(next))
    }
}
