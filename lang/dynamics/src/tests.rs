use crate::{jump::JumpRecord, syntax::Native, *};
use bounce_statics::{transform, DecoratorRegistry};
use bounce_syntax::{Program, VarName};
use pretty_assertions::assert_eq;
use std::{
    cell::{Cell, RefCell},
    io,
    rc::Rc,
};

#[derive(Clone, Default)]
struct SharedBuf(Rc<RefCell<Vec<u8>>>);

impl io::Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SharedBuf {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

fn runtime(src: &str) -> (Runtime, SharedBuf) {
    let program = bounce_surface::parse(src, None).unwrap();
    let escapes = vec![VarName::from("ec")];
    let transformed = transform(program, &DecoratorRegistry::with_defaults(), &escapes).unwrap();
    let buf = SharedBuf::default();
    (Runtime::new(transformed, Box::new(buf.clone())), buf)
}

fn run(src: &str) -> Value {
    let (mut rt, _) = runtime(src);
    rt.run().unwrap()
}

fn run_err(src: &str) -> EvalError {
    let (mut rt, _) = runtime(src);
    match rt.run() {
        | Ok(value) => panic!("expected an error, got {}", value),
        | Err(err) => err,
    }
}

fn output(src: &str) -> String {
    let (mut rt, buf) = runtime(src);
    rt.run().unwrap();
    buf.text()
}

fn empty() -> Runtime {
    let transformed =
        transform(Program::default(), &DecoratorRegistry::with_defaults(), &[]).unwrap();
    Runtime::new(transformed, Box::new(io::sink()))
}

/* --------------------------------- Basics --------------------------------- */

#[test]
fn evaluates_plain_programs() {
    let src = r#"
        (defn fact (n) (if (= n 0) 1 (* n (fact (- n 1)))))
        (define xs (list))
        (define i 0)
        (while (< i 3) (push! xs i) (set! i (+ i 1)))
        (tuple (fact 10) xs (and) (or) (and 1 #f 2) (or #f nil 3))
    "#;
    let xs = Value::list(vec![Value::Int(0), Value::Int(1), Value::Int(2)]);
    let expected = vec![
        Value::Int(3628800),
        xs,
        Value::Bool(true),
        Value::Bool(false),
        Value::Bool(false),
        Value::Int(3),
    ];
    assert_eq!(run(src), Value::tuple(expected));
}

#[test]
fn missing_else_is_nil() {
    assert_eq!(run("(if #f 1)"), Value::Unit);
    assert_eq!(run("(cond (#f 1) (nil 2))"), Value::Unit);
}

#[test]
fn print_writes_lines() {
    let src = r#"(print "a" 1 (list "b" (tuple 2 nil))) (print (str "x" 1 #t))"#;
    assert_eq!(output(src), "a 1 (list \"b\" (tuple 2 nil))\nx1#t\n");
}

#[test]
fn keyword_arguments_bind_by_name() {
    assert_eq!(run("(defn f (a b) (- a b)) (f :b 1 :a 10)"), Value::Int(9));
    assert!(matches!(run_err("(defn f (a) a) (f :z 1)"), EvalError::UnexpectedKeyword { .. }));
    assert!(matches!(run_err("(defn f (a b) a) (f 1)"), EvalError::MissingArgument { .. }));
    assert!(matches!(run_err("(defn f (a) a) (f 1 2)"), EvalError::Arity { .. }));
}

#[test]
fn runtime_errors() {
    assert!(matches!(run_err("(/ 1 0)"), EvalError::DivisionByZero));
    assert!(matches!(run_err("(1 2)"), EvalError::NotCallable("int")));
    assert!(matches!(run_err("nope"), EvalError::Unbound(_)));
    assert!(matches!(run_err("(+ 1 \"a\")"), EvalError::TypeMismatch { .. }));
    let err = run_err("(nth (list 1) 3)");
    assert!(matches!(err, EvalError::IndexOutOfRange { index: 3, len: 1 }));
    assert!(matches!(run_err("(assert-eq 1 2)"), EvalError::AssertionFailed { .. }));
}

#[test]
fn try_hands_the_message_to_the_handler() {
    let src = r#"(try (fn () (raise "bad " 1)) (fn (msg) (str "caught: " msg)))"#;
    assert_eq!(run(src), Value::str("caught: bad 1"));
    assert_eq!(run("(try (fn () 7) (fn (msg) msg))"), Value::Int(7));
}

/* ------------------------------- Trampolines ------------------------------ */

#[test]
fn tail_calls_run_in_constant_stack() {
    let src = r#"
        (tco
          (defn count (n acc) (if (= n 0) acc (count (- n 1) (+ acc 1))))
          (defn is-even (n) (if (= n 0) #t (is-odd (- n 1))))
          (defn is-odd (n) (if (= n 0) #f (is-even (- n 1)))))
        (tuple (count 50000 0) (is-even 50001))
    "#;
    assert_eq!(run(src), Value::tuple(vec![Value::Int(50000), Value::Bool(false)]));
}

#[test]
fn continuation_tail_calls_run_in_constant_stack() {
    let src = r#"
        (continuations
          (defn down (n) (if (= n 0) "done" (down (- n 1)))))
        (down 50000)
    "#;
    assert_eq!(run(src), Value::str("done"));
}

#[test]
fn lazy_tail_calls_run_in_constant_stack() {
    let src = r#"
        (tco (lazify (defn down (n) (if (= n 0) "done" (down (- n 1))))))
        (down 50000)
    "#;
    assert_eq!(run(src), Value::str("done"));
}

#[test]
fn looped_functions_get_a_loop_handle() {
    let src = r#"
        (defn sum-to (loop i acc) :decorators (looped)
          (if (> i 100000) acc (loop (+ i 1) (+ acc i))))
        (sum-to 1 0)
    "#;
    assert_eq!(run(src), Value::Int(5000050000));
}

#[test]
fn unconsumed_jumps_are_counted() {
    diagnostics::set_warn_unconsumed(false);
    diagnostics::reset();
    let identity = Rc::new(Callable::Identity);
    let consumed = JumpRecord::new(identity.clone(), vec![Value::Int(1)], vec![], None);
    let mut rt = empty();
    assert_eq!(rt.trampoline(consumed.value(), Variant::Strict).unwrap(), Value::Int(1));
    assert_eq!(diagnostics::unconsumed_jumps(), 0);
    drop(JumpRecord::new(identity, vec![], vec![], None));
    assert_eq!(diagnostics::unconsumed_jumps(), 1);
    diagnostics::set_warn_unconsumed(true);
}

/* ------------------------------ Continuations ----------------------------- */

#[test]
fn continuations_are_multi_shot() {
    let src = r#"
        (define saved nil)
        (define total (list))
        (continuations
          (defn grab (cc) (set! saved cc) 1)
          (defn main ()
            (capture (x) (grab))
            (push! total x)
            x))
        (main)
        (saved 10)
        (saved 20)
        total
    "#;
    assert_eq!(run(src), Value::list(vec![Value::Int(1), Value::Int(10), Value::Int(20)]));
}

#[test]
fn tuples_spread_over_capture_variables() {
    let src = r#"
        (continuations
          (defn pair () (values 1 2))
          (defn main ()
            (capture (a b) (pair))
            (+ a b)))
        (main)
    "#;
    assert_eq!(run(src), Value::Int(3));
    let src = r#"
        (define saved nil)
        (continuations
          (defn grab (cc) (set! saved cc) (values 1 2))
          (defn main () (capture (a b) (grab)) a))
        (main)
        (saved 1 2 3)
    "#;
    assert!(matches!(run_err(src), EvalError::ContinuationArity { expected: 2, found: 3 }));
}

#[test]
fn replacing_cc_returns_early() {
    let src = r#"
        (continuations
          (defn outer ()
            (let ec cc)
            (defn inner (x) (set! cc ec) (* x 2))
            (capture (y) (inner 5))
            (+ y 100)))
        (outer)
    "#;
    assert_eq!(run(src), Value::Int(10));
}

#[test]
fn empty_arms_do_not_swallow_the_body() {
    assert_eq!(run("(continuations (defn f (x) (if x 1 (begin)))) (f #t)"), Value::Int(1));
    assert_eq!(run("(continuations (defn f (x) (if x 1 (begin)))) (f #f)"), Value::Unit);
    let src = r#"
        (continuations
          (defn f (x)
            (print "side")
            (cond ((= x 0)) (else (+ x 1)))))
        (print (f 5))
        (print (f 0))
    "#;
    assert_eq!(output(src), "side\n6\nside\nnil\n");
}

#[test]
fn escapes_reach_the_caller_they_were_taken_from() {
    let src = r#"
        (define resumed (list))
        (continuations
          (defn finder (x out)
            (if (< x 0) (begin (set! cc out) "sentinel") (* x 2)))
          (defn a ()
            (let out cc)
            (capture (r) (finder -1 out))
            (push! resumed "a")
            (str "a:" r))
          (defn b ()
            (let out cc)
            (capture (r) (finder -1 out))
            (push! resumed "b")
            (str "b:" r))
          (defn top-a () (capture (v) (a)) (str "top-a got " v))
          (defn top-b () (capture (v) (b)) (str "top-b got " v)))
        (tuple (top-a) (top-b) (a) resumed)
    "#;
    let expected = Value::tuple(vec![
        Value::str("top-a got sentinel"),
        Value::str("top-b got sentinel"),
        Value::str("sentinel"),
        Value::list(vec![]),
    ]);
    assert_eq!(run(src), expected);
}

fn live_extents(rt: &mut Runtime, _: Vec<Value>) -> Result<Value> {
    Ok(Value::Int(rt.extents.len() as i64))
}

#[test]
fn only_capturing_activations_hold_an_extent() {
    let src = r#"
        (continuations
          (defn spin (n) (if (= n 0) (live-extents) (spin (- n 1))))
          (defn one () 0)
          (defn main () (capture (x) (one)) (spin 1000)))
        (tuple (spin 1000) (main))
    "#;
    let (mut rt, _) = runtime(src);
    let native = Native { name: "live-extents", arity: Some(0), body: live_extents };
    rt.define("live-extents", Value::Func(Rc::new(Callable::Native(native))));
    assert_eq!(rt.run().unwrap(), Value::tuple(vec![Value::Int(0), Value::Int(1)]));
}

#[test]
fn errors_invalidate_captured_continuations() {
    let src = r#"
        (define saved nil)
        (continuations
          (defn grab (cc) (set! saved cc) 1)
          (defn risky ()
            (capture (x) (grab))
            (if (= x 1) (raise "boom") x)))
        (assert-eq (try risky (fn (msg) msg)) "boom")
        (saved 2)
    "#;
    assert!(matches!(run_err(src), EvalError::ContinuationInvalidated));
}

/* ---------------------------------- call-ec --------------------------------- */

#[test]
fn escapes_return_to_their_call_ec_point() {
    let src = r#"
        (defn double-odd (ec x) :decorators (call-ec)
          (if (= (% x 2) 0) (ec "not odd") (* 2 x)))
        (defn main () (print (str "result was: " (double-odd 21))))
        (defn caller () (print (str "caller saw: " (double-odd 4))))
        (main)
        (caller)
    "#;
    assert_eq!(output(src), "result was: 42\ncaller saw: not odd\n");
}

#[test]
fn escapes_unwind_through_loops() {
    let src = r#"
        (defn find-first (ec pred xs) :decorators (call-ec)
          (let i 0)
          (while (< i (len xs))
            (if (pred (nth xs i)) (ec (nth xs i)))
            (set! i (+ i 1)))
          nil)
        (tuple
          (find-first (fn (x) (> x 2)) (list 1 2 3 4))
          (find-first (fn (x) (> x 9)) (list 1 2)))
    "#;
    assert_eq!(run(src), Value::tuple(vec![Value::Int(3), Value::Unit]));
}

#[test]
fn stale_escape_continuations_are_rejected() {
    let src = r#"
        (define saved nil)
        (defn keep (ec) :decorators (call-ec) (set! saved ec) 1)
        (keep)
        (saved 2)
    "#;
    assert!(matches!(run_err(src), EvalError::EscapeOutsideExtent));
}

/* --------------------------------- Memoize -------------------------------- */

#[test]
fn memoized_recursion() {
    let src = r#"
        (define calls 0)
        (defn fib (n) :decorators (memoize)
          (set! calls (+ calls 1))
          (if (< n 2) n (+ (fib (- n 1)) (fib (- n 2)))))
        (tuple (fib 60) calls)
    "#;
    assert_eq!(run(src), Value::tuple(vec![Value::Int(1548008755920), Value::Int(61)]));
    let src = "(defn f (xs) :decorators (memoize) 1) (f (list))";
    assert!(matches!(run_err(src), EvalError::Unhashable("list")));
}

/* ---------------------------------- Lazy ---------------------------------- */

#[test]
fn lazy_arguments_are_only_forced_when_used() {
    let src = r#"
        (lazify
          (defn my-if (c a b) (if c a b))
          (defn safe (x) (my-if (= x 0) 0 (/ 10 x))))
        (tuple (safe 0) (safe 5))
    "#;
    assert_eq!(run(src), Value::tuple(vec![Value::Int(0), Value::Int(2)]));
}

#[test]
fn promises_are_forced_once() {
    let mut rt = empty();
    let count = Rc::new(Cell::new(0));
    let counter = count.clone();
    let promise = Runtime::delay(move |_| {
        counter.set(counter.get() + 1);
        Ok(Value::Int(42))
    });
    assert_eq!(rt.force(promise.clone()).unwrap(), Value::Int(42));
    assert_eq!(rt.force(promise).unwrap(), Value::Int(42));
    assert_eq!(count.get(), 1);
    assert_eq!(rt.force(Value::Int(7)).unwrap(), Value::Int(7));
}

#[test]
fn force_deep_reaches_into_containers() {
    let mut rt = empty();
    let one = Runtime::delay(|_| Ok(Value::Int(1)));
    let list = Value::list(vec![one.clone(), Value::tuple(vec![one])]);
    let forced = rt.force_deep(list.clone()).unwrap();
    let expected = Value::list(vec![Value::Int(1), Value::tuple(vec![Value::Int(1)])]);
    assert_eq!(forced, expected);
    // lists are updated in place
    assert_eq!(list, expected);
}

#[test]
fn force_deep_runs_a_shared_thunk_once() {
    let mut rt = empty();
    let count = Rc::new(Cell::new(0));
    let counter = count.clone();
    let shared = Runtime::delay(move |_| {
        counter.set(counter.get() + 1);
        Ok(Value::Int(5))
    });
    let tuple = Value::tuple(vec![shared.clone(), shared.clone()]);
    let list = Value::list(vec![shared.clone(), tuple, shared]);
    let expected = Value::list(vec![
        Value::Int(5),
        Value::tuple(vec![Value::Int(5), Value::Int(5)]),
        Value::Int(5),
    ]);
    assert_eq!(rt.force_deep(list.clone()).unwrap(), expected);
    assert_eq!(rt.force_deep(list).unwrap(), expected);
    assert_eq!(count.get(), 1);
}

#[test]
fn forcing_a_promise_from_itself_fails() {
    let mut rt = empty();
    let cell: Rc<RefCell<Value>> = Rc::new(RefCell::new(Value::Unit));
    let inner = cell.clone();
    let promise = Runtime::delay(move |rt| {
        let me = inner.borrow().clone();
        rt.force(me)
    });
    *cell.borrow_mut() = promise.clone();
    assert!(matches!(rt.force(promise.clone()), Err(EvalError::RecursiveForce)));
    *cell.borrow_mut() = Value::Unit;
    // failed promises can be retried
    assert_eq!(rt.force(promise).unwrap(), Value::Unit);
}

#[test]
fn strict_trampolines_may_pass_promises_through() {
    let src = r#"
        (tco
          (defn h (x) (type-of x))
          (lazify (defn f (x) (h (+ x 0))))
          (defn g (x) (f x)))
        (tuple (f 1) (g 1))
    "#;
    assert_eq!(run(src), Value::tuple(vec![Value::str("int"), Value::str("promise")]));
}
