use crate::*;
use bounce_syntax::*;
use pretty_assertions::assert_eq;

fn parse(src: &str) -> Program {
    bounce_surface::parse(src, None).unwrap()
}

fn escapes() -> Vec<VarName> {
    vec![VarName::from("ec"), VarName::from("brk")]
}

/// Analyze the body of the last function in `src` and render its tail positions.
fn tails(src: &str) -> Vec<String> {
    let program = parse(src);
    let (_, def) = program.functions().last().unwrap();
    let positions = analyze(&program, &def.body, &escapes());
    let f = Formatter::new(&program);
    positions
        .iter()
        .map(|pos| match pos {
            | TailPosition::Expr { expr, kind: TailKind::Return } => expr.ugly(&f),
            | TailPosition::Expr { expr, kind: TailKind::Escape } => format!("^{}", expr.ugly(&f)),
            | TailPosition::FallThrough { .. } => "<fall-through>".to_string(),
        })
        .collect()
}

fn transformed(src: &str) -> Vec<String> {
    let out = transform(parse(src), &DecoratorRegistry::with_defaults(), &escapes()).unwrap();
    let f = Formatter::new(&out.program);
    out.program.top.iter().map(|top| top.ugly(&f)).collect()
}

fn transform_err(src: &str) -> StaticsError {
    transform(parse(src), &DecoratorRegistry::with_defaults(), &escapes()).unwrap_err()
}

/* -------------------------------- Analyzer -------------------------------- */

#[test]
fn last_statement_is_the_tail() {
    assert_eq!(tails("(defn f () (a) (b) (c))"), vec!["(c)"]);
}

#[test]
fn every_branch_is_analyzed() {
    let src = "(defn f (x) (cond ((a) (b) (c)) ((d) (and (e) (g))) (else (or (h) (i)))))";
    assert_eq!(tails(src), vec!["(c)", "(g)", "(i)"]);
}

#[test]
fn missing_else_is_not_a_tail() {
    assert_eq!(tails("(defn f (x) (if x (a)))"), vec!["(a)"]);
}

#[test]
fn loops_are_leaves() {
    assert_eq!(tails("(defn f () (while #t (a)))"), vec!["(while #t (a))"]);
}

#[test]
fn escape_arguments_anywhere() {
    let src = "(defn f (ec) (while #t (ec (a))) (if x (brk 1) 2))";
    assert_eq!(tails(src), vec!["(brk 1)", "2", "^(a)", "^1"]);
}

#[test]
fn nested_functions_are_separate_bodies() {
    let src = "(defn f () (let g (fn () (ec 1) (inner))) (g))";
    assert_eq!(tails(src), vec!["(g)"]);
}

#[test]
fn empty_body_falls_through() {
    assert_eq!(tails("(defn f ())"), vec!["<fall-through>"]);
    assert_eq!(tails("(defn f () (begin))"), vec!["<fall-through>"]);
}

#[test]
fn empty_arms_fall_through_on_their_own() {
    assert_eq!(tails("(defn f (x) (if x 1 (begin)))"), vec!["1", "<fall-through>"]);
    let program = parse("(defn f (x) (a) (cond ((= x 0)) (else (b))))");
    let (_, def) = program.functions().last().unwrap();
    let positions = analyze(&program, &def.body, &escapes());
    let seqs: Vec<_> = positions.fall_throughs().collect();
    assert_eq!(seqs.len(), 1);
    assert_ne!(seqs[0], def.body);
    assert!(matches!(&program.exprs[&seqs[0]], Expr::Seq(items) if items.is_empty()));
}

#[test]
fn empty_short_circuit_is_a_leaf() {
    assert_eq!(tails("(defn f () (and))"), vec!["(and)"]);
}

/* -------------------------------- Registry -------------------------------- */

#[test]
fn ordering_ignores_request_order() {
    use DecoratorKind::*;
    let registry = DecoratorRegistry::with_defaults();
    let expected = vec![Memoize, Trampolined, CallEc, Continuations, Lazy];
    let requests = [
        vec![Lazy, Continuations, CallEc, Trampolined, Memoize],
        vec![CallEc, Memoize, Lazy, Trampolined, Continuations],
        vec![Trampolined, Lazy, Memoize, Continuations, CallEc, Lazy],
    ];
    for request in requests {
        assert_eq!(registry.order_for(request).unwrap(), expected);
    }
}

#[test]
fn trampoline_wraps_escape() {
    use DecoratorKind::*;
    let registry = DecoratorRegistry::with_defaults();
    assert_eq!(registry.order_for([CallEc, Trampolined]).unwrap(), vec![Trampolined, CallEc]);
    let mut bad = DecoratorRegistry::new();
    bad.register(CallEc, 1).unwrap();
    bad.register(Trampolined, 2).unwrap();
    assert_eq!(
        bad.validate(),
        Err(StaticsError::EscapeOutsideTrampoline { trampolined: 2, call_ec: 1 })
    );
}

#[test]
fn registry_rejects_what_it_does_not_know() {
    use DecoratorKind::*;
    let mut registry = DecoratorRegistry::new();
    registry.register(Trampolined, 20).unwrap();
    assert_eq!(registry.order_for([Lazy]), Err(StaticsError::UnregisteredKind(Lazy)));
    assert_eq!(
        registry.lookup(&DecoratorName::from("lazy")),
        Err(StaticsError::UnknownDecorator { name: "lazy".into() })
    );
    assert_eq!(
        registry.lookup(&DecoratorName::from("bogus")),
        Err(StaticsError::UnknownDecorator { name: "bogus".into() })
    );
    assert_eq!(registry.lookup(&DecoratorName::from("trampolined")), Ok(Trampolined));
    assert_eq!(registry.register(Trampolined, 5), Err(StaticsError::DuplicateRegistration(Trampolined)));
    assert_eq!(
        registry.register(Lazy, 20),
        Err(StaticsError::ConflictingPosition { kind: Lazy, other: Trampolined, position: 20 })
    );
}

#[test]
fn global_registry_is_installed_once() {
    let global = DecoratorRegistry::global();
    assert_eq!(global.records().count(), DecoratorKind::ALL.len());
    let again = DecoratorRegistry::with_defaults().install().unwrap();
    assert!(std::ptr::eq(again, global));
    let mut other = DecoratorRegistry::new();
    other.register(DecoratorKind::Trampolined, 20).unwrap();
    assert!(matches!(other.install(), Err(StaticsError::RegistryInstalled)));
}

/* ------------------------------- Transforms ------------------------------- */

#[test]
fn tco_rewrites_return_calls() {
    let src = "(tco (defn f (n) (print n) (if (= n 0) 0 (f (- n 1)))))";
    assert_eq!(
        transformed(src),
        vec!["(define f (fn (n) (print n) (cond ((= n 0) 0) (else (jump f (- n 1))))))"]
    );
}

#[test]
fn escape_calls_are_left_alone() {
    let src = "(tco (defn f (ec) (ec (g 1))))";
    assert_eq!(transformed(src), vec!["(define f (fn (ec) (ec (g 1))))"]);
    let src = "(continuations (defn f (ec x) (if x (ec 1) 2)))";
    let expected = "(define f (fn (ec x cc) (cond (x (ec 1)) (else (jump cc 2)))))";
    assert_eq!(transformed(src), vec![expected]);
}

#[test]
fn functions_outside_blocks_are_untouched() {
    let src = "(defn f (n) (f n))";
    assert_eq!(transformed(src), vec!["(define f (fn (n) (f n)))"]);
}

#[test]
fn capture_splits_the_body() {
    let src = "(continuations (defn f (x) (print x) (capture (k) (g x)) (print k) (+ k 1)))";
    assert_eq!(
        transformed(src),
        vec![
            "(define f (fn (x cc) (print x) \
             (jump g x :cc (cont (k) (print k) (jump + k 1 :cc cc)))))"
        ]
    );
}

#[test]
fn successive_captures_nest() {
    let src = "(continuations (defn f () (capture (a) (g)) (capture (b) (h a)) (tuple a b)))";
    assert_eq!(
        transformed(src),
        vec![
            "(define f (fn (cc) (jump g :cc (cont (a) \
             (jump h a :cc (cont (b) (jump tuple a b :cc cc)))))))"
        ]
    );
}

#[test]
fn plain_values_return_through_cc() {
    assert_eq!(transformed("(continuations (defn f () 5))"), vec!["(define f (fn (cc) (jump cc 5)))"]);
    assert_eq!(transformed("(continuations (defn f ()))"), vec!["(define f (fn (cc) (jump cc nil)))"]);
    assert_eq!(
        transformed("(continuations (defn f (x) (if x 1 (g))))"),
        vec!["(define f (fn (x cc) (cond (x (jump cc 1)) (else (jump g :cc cc)))))"]
    );
}

#[test]
fn empty_arms_return_nil_through_cc() {
    assert_eq!(
        transformed("(continuations (defn f (x) (if x 1 (begin))))"),
        vec!["(define f (fn (x cc) (cond (x (jump cc 1)) (else (jump cc nil)))))"]
    );
    assert_eq!(
        transformed("(continuations (defn f (x) (g) (cond ((= x 0)) (else (+ x 1)))))"),
        vec!["(define f (fn (x cc) (g) (cond ((= x 0) (jump cc nil)) (else (jump + x 1 :cc cc)))))"]
    );
}

#[test]
fn misplaced_captures_are_rejected() {
    for src in [
        "(capture (k) (f))",
        "(defn f () (capture (k) (g)) k)",
        "(continuations (defn f (x) (if x (capture (k) (g)) 1)))",
        "(continuations (defn f () (print (capture (k) (g)))))",
    ] {
        let err = transform_err(src);
        assert!(matches!(err, StaticsError::CapturePlacement { .. }), "{}: {:?}", src, err);
    }
}

#[test]
fn decorations_combine_blocks_and_names() {
    use DecoratorKind::*;
    let src = "(continuations (lazify (defn f () :decorators (memoize call-ec) 1)))";
    let out = transform(parse(src), &DecoratorRegistry::with_defaults(), &escapes()).unwrap();
    let (f, _) = out.program.functions().next().unwrap();
    assert_eq!(out.decorations_of(&f), &[Memoize, Trampolined, CallEc, Continuations, Lazy]);
    assert!(out.is_lazy(&f));
}

#[test]
fn unknown_decorator_is_a_configuration_error() {
    assert_eq!(
        transform_err("(defn f () :decorators (bogus) 1)"),
        StaticsError::UnknownDecorator { name: "bogus".into() }
    );
}
