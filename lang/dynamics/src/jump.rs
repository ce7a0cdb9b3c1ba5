//! Jump records: the values a tail call evaluates to.

use crate::{err::*, syntax::*};
use std::{cell::RefCell, rc::Rc};

/// What a trampoline needs to make the next call.
pub struct JumpPayload {
    pub target: Rc<Callable>,
    pub args: Vec<Value>,
    pub kwargs: Kwargs,
    /// the continuation the target's result goes to, inside `continuations` blocks
    pub cc: Option<Value>,
}

/// A pending tail call. It is consumed exactly once by a trampoline;
/// dropping it unconsumed is reported.
pub struct JumpRecord {
    payload: RefCell<Option<JumpPayload>>,
}

impl JumpRecord {
    pub fn new(target: Rc<Callable>, args: Vec<Value>, kwargs: Kwargs, cc: Option<Value>) -> Self {
        JumpRecord { payload: RefCell::new(Some(JumpPayload { target, args, kwargs, cc })) }
    }
    pub fn value(self) -> Value {
        Value::Jump(Rc::new(self))
    }
    pub fn is_consumed(&self) -> bool {
        self.payload.borrow().is_none()
    }
    pub fn take(&self) -> Result<JumpPayload> {
        self.payload.borrow_mut().take().ok_or(EvalError::JumpConsumed)
    }
}

impl Drop for JumpRecord {
    fn drop(&mut self) {
        if let Some(JumpPayload { target, .. }) = self.payload.get_mut().take() {
            diagnostics::report_unconsumed(&Value::Func(target).to_string());
        }
    }
}

/// Per-thread bookkeeping of abandoned jump records.
pub mod diagnostics {
    use std::cell::Cell;

    thread_local! {
        static UNCONSUMED: Cell<usize> = const { Cell::new(0) };
        static WARN: Cell<bool> = const { Cell::new(true) };
    }

    pub(crate) fn report_unconsumed(label: &str) {
        UNCONSUMED.with(|count| count.set(count.get() + 1));
        if WARN.with(Cell::get) {
            log::warn!("jump to {} was never run by a trampoline", label);
        }
    }

    /// Jump records dropped without being consumed on this thread so far.
    pub fn unconsumed_jumps() -> usize {
        UNCONSUMED.with(Cell::get)
    }

    pub fn reset() {
        UNCONSUMED.with(|count| count.set(0));
    }

    pub fn set_warn_unconsumed(warn: bool) {
        WARN.with(|flag| flag.set(warn));
    }
}
