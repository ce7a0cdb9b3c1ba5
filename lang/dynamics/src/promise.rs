//! Call-by-need: promises and the policy deciding what gets delayed.

use crate::{err::*, syntax::*, Runtime};
use std::{cell::RefCell, rc::Rc};

pub type Thunk = Rc<dyn Fn(&mut Runtime) -> Result<Value>>;

pub enum PromiseState {
    Pending(Thunk),
    /// the thunk is running; forcing again would never finish
    Forcing,
    Forced(Value),
}

pub struct Promise {
    state: RefCell<PromiseState>,
}

impl Promise {
    pub fn new(thunk: Thunk) -> Self {
        Promise { state: RefCell::new(PromiseState::Pending(thunk)) }
    }
    pub fn is_forced(&self) -> bool {
        matches!(&*self.state.borrow(), PromiseState::Forced(_))
    }
}

/// How a binding site introduces its name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Binding {
    /// `let`, and parameters receiving call arguments
    NewName,
    /// `set!`
    Reassign,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LazyPolicy {
    Delay,
    Strict,
}

impl LazyPolicy {
    /// New names may be bound to promises; reassignment always stores a value.
    pub fn for_binding(binding: Binding) -> Self {
        match binding {
            | Binding::NewName => LazyPolicy::Delay,
            | Binding::Reassign => LazyPolicy::Strict,
        }
    }
}

impl Runtime {
    pub fn delay(thunk: impl Fn(&mut Runtime) -> Result<Value> + 'static) -> Value {
        Value::Promise(Rc::new(Promise::new(Rc::new(thunk))))
    }

    /// The value behind a promise, computing it on first use. Other values
    /// pass through.
    pub fn force(&mut self, value: Value) -> Result<Value> {
        let promise = match value {
            | Value::Promise(promise) => promise,
            | value => return Ok(value),
        };
        let thunk = {
            let mut state = promise.state.borrow_mut();
            match &*state {
                | PromiseState::Forced(value) => return Ok(value.clone()),
                | PromiseState::Forcing => return Err(EvalError::RecursiveForce),
                | PromiseState::Pending(thunk) => {
                    let thunk = thunk.clone();
                    *state = PromiseState::Forcing;
                    thunk
                }
            }
        };
        log::trace!("forcing promise");
        let result = thunk(self).and_then(|value| self.force(value));
        let mut state = promise.state.borrow_mut();
        match result {
            | Ok(value) => {
                *state = PromiseState::Forced(value.clone());
                Ok(value)
            }
            | Err(err) => {
                // a failed promise can be forced again
                *state = PromiseState::Pending(thunk);
                Err(err)
            }
        }
    }

    /// Force a value and everything reachable through lists (updated in
    /// place) and tuples (rebuilt).
    pub fn force_deep(&mut self, value: Value) -> Result<Value> {
        match self.force(value)? {
            | Value::List(items) => {
                let snapshot = items.borrow().clone();
                let mut forced = Vec::with_capacity(snapshot.len());
                for item in snapshot {
                    forced.push(self.force_deep(item)?);
                }
                *items.borrow_mut() = forced;
                Ok(Value::List(items))
            }
            | Value::Tuple(values) => {
                let mut forced = Vec::with_capacity(values.len());
                for item in values.iter() {
                    forced.push(self.force_deep(item.clone())?);
                }
                Ok(Value::tuple(forced))
            }
            | value => Ok(value),
        }
    }
}
