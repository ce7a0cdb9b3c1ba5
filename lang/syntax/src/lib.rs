pub mod fmt;
pub use fmt::*;

mod impls;

use bounce_utils::{arena::*, span::Span};
use derive_more::From;

/* --------------------------------- Binder --------------------------------- */

#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct VarName(pub String);
/// a decorator as written after `:decorators`
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct DecoratorName(pub String);

/* ---------------------------------- Index --------------------------------- */

new_key_type! {
    pub struct ExprId;
    pub struct FnId;
}

/* ------------------------------- Expression ------------------------------- */

/// literals in term
#[derive(From, Clone, Debug, PartialEq, Eq)]
pub enum Literal {
    #[from(skip)]
    Unit,
    Bool(bool),
    Int(i64),
    Str(String),
}

/// `(f a b :k v)`
#[derive(Clone, Debug)]
pub struct Call {
    pub func: ExprId,
    pub args: Vec<ExprId>,
    pub kwargs: Vec<(VarName, ExprId)>,
}

/// `(cond (c1 e1) (c2 e2) (else e3))`; `(if c t e)` is the one-arm case
#[derive(Clone, Debug)]
pub struct If {
    pub arms: Vec<Arm>,
    pub alt: Option<ExprId>,
}
#[derive(Clone, Debug)]
pub struct Arm {
    pub cond: ExprId,
    pub body: ExprId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}
/// `(and ...)` / `(or ...)`
#[derive(Clone, Debug)]
pub struct ShortCircuit {
    pub op: BoolOp,
    pub operands: Vec<ExprId>,
}

/// `(let x e)`, introducing a new cell
#[derive(Clone, Debug)]
pub struct Let {
    pub binder: VarName,
    pub bindee: ExprId,
}
/// `(set! x e)`, updating an existing cell
#[derive(Clone, Debug)]
pub struct Set {
    pub binder: VarName,
    pub bindee: ExprId,
}

/// `(while c body...)`
#[derive(Clone, Debug)]
pub struct While {
    pub cond: ExprId,
    pub body: ExprId,
}

/// `(jump f a b)`; `cc` is filled in by the continuation pass
#[derive(Clone, Debug)]
pub struct Jump {
    pub func: ExprId,
    pub args: Vec<ExprId>,
    pub kwargs: Vec<(VarName, ExprId)>,
    pub cc: Option<ExprId>,
}

/// `(capture (x y) (f a))`
#[derive(Clone, Debug)]
pub struct Capture {
    pub binders: Vec<VarName>,
    pub call: ExprId,
}

#[derive(From, Clone, Debug)]
pub enum Expr {
    Lit(Literal),
    Var(VarName),
    Fn(FnId),
    Call(Call),
    If(If),
    Short(ShortCircuit),
    Seq(Vec<ExprId>),
    Let(Let),
    Set(Set),
    While(While),
    Jump(Jump),
    Capture(Capture),
}

/* -------------------------------- Function -------------------------------- */

/// The transformation blocks a function was defined in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Regions {
    pub tco: bool,
    pub cont: bool,
    pub lazy: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FnKind {
    /// written by the user with `defn` or `fn`
    Plain,
    /// the rest of a body after a capture point
    Continuation,
}

#[derive(Clone, Debug)]
pub struct FnDef {
    pub name: Option<VarName>,
    pub params: Vec<VarName>,
    pub body: ExprId,
    pub decorators: Vec<(DecoratorName, Span)>,
    pub regions: Regions,
    pub kind: FnKind,
}

/* -------------------------------- Toplevel -------------------------------- */

#[derive(Clone, Debug)]
pub enum Toplevel {
    /// `(define x e)` and `(defn f ...)`
    Define(VarName, ExprId),
    /// a bare expression run for its effect
    Exec(ExprId),
}

#[derive(Clone, Debug, Default)]
pub struct Program {
    pub exprs: ArenaDense<ExprId, Expr>,
    pub fns: ArenaDense<FnId, FnDef>,
    pub spans: ArenaAssoc<ExprId, Span>,
    pub top: Vec<Toplevel>,
}
