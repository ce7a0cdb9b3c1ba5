use crate::*;
use std::fmt;

macro_rules! impl_name {
    ($name:ident) => {
        impl $name {
            pub fn plain(&self) -> &str {
                let $name(name) = self;
                name.as_str()
            }
        }
        impl<T: AsRef<str>> From<T> for $name {
            fn from(name: T) -> Self {
                $name(name.as_ref().to_string())
            }
        }
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.plain())
            }
        }
    };
}

impl_name!(VarName);
impl_name!(DecoratorName);

impl Program {
    pub fn alloc_expr(&mut self, expr: impl Into<Expr>, span: Span) -> ExprId {
        let id = self.exprs.alloc(expr.into());
        if !span.is_dummy() {
            self.spans.insert(id, span);
        }
        id
    }
    pub fn alloc_fn(&mut self, def: FnDef) -> FnId {
        self.fns.alloc(def)
    }
    /// The span of an expression, or of the nearest one it was derived from.
    pub fn span(&self, id: &ExprId) -> Span {
        self.spans.get(id).copied().unwrap_or_default()
    }
    /// Function definitions in allocation order.
    pub fn functions(&self) -> impl Iterator<Item = (FnId, &FnDef)> + '_ {
        self.fns.iter()
    }
}

impl Expr {
    /// Atoms are cheap and side-effect free to evaluate.
    pub fn is_atom(&self) -> bool {
        matches!(self, Expr::Lit(_) | Expr::Var(_) | Expr::Fn(_))
    }
    /// Sub-expressions evaluated as part of this one. Function bodies are not
    /// included; they belong to their own `FnDef`.
    pub fn children(&self) -> Vec<ExprId> {
        match self {
            | Expr::Lit(_) | Expr::Var(_) | Expr::Fn(_) => Vec::new(),
            | Expr::Call(Call { func, args, kwargs }) => {
                let mut ids = vec![*func];
                ids.extend(args.iter().copied());
                ids.extend(kwargs.iter().map(|(_, arg)| *arg));
                ids
            }
            | Expr::If(If { arms, alt }) => {
                let mut ids: Vec<_> = arms.iter().flat_map(|arm| [arm.cond, arm.body]).collect();
                ids.extend(alt.iter().copied());
                ids
            }
            | Expr::Short(ShortCircuit { operands, .. }) => operands.clone(),
            | Expr::Seq(items) => items.clone(),
            | Expr::Let(Let { bindee, .. }) | Expr::Set(Set { bindee, .. }) => vec![*bindee],
            | Expr::While(While { cond, body }) => vec![*cond, *body],
            | Expr::Jump(Jump { func, args, kwargs, cc }) => {
                let mut ids = vec![*func];
                ids.extend(args.iter().copied());
                ids.extend(kwargs.iter().map(|(_, arg)| *arg));
                ids.extend(cc.iter().copied());
                ids
            }
            | Expr::Capture(Capture { call, .. }) => vec![*call],
        }
    }
}
