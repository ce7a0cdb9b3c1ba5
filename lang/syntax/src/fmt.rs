//! The formatter traits, and the s-expression rendering of a program.

use crate::*;
use pretty::RcDoc;

#[impl_tools::autoimpl(for<T: trait + ?Sized> &T, &mut T, Box<T>, std::rc::Rc<T>)]
pub trait Ugly<'a, Fmter> {
    fn ugly(&self, f: &'a Fmter) -> String;
}

#[impl_tools::autoimpl(for<T: trait + ?Sized> &T, &mut T, Box<T>, std::rc::Rc<T>)]
pub trait Pretty<'a, Fmter> {
    fn pretty(&self, f: &'a Fmter) -> RcDoc<'a>;
}

pub struct Formatter<'arena> {
    program: &'arena Program,
}

impl<'arena> Formatter<'arena> {
    pub fn new(program: &'arena Program) -> Self {
        Formatter { program }
    }
    pub fn render(&self, width: usize) -> String {
        let doc = self.program.pretty(self);
        format!("{}", doc.pretty(width))
    }
}

/* ---------------------------------- Ugly ---------------------------------- */

impl<'a> Ugly<'a, Formatter<'a>> for Literal {
    fn ugly(&self, _f: &'a Formatter) -> String {
        match self {
            | Literal::Unit => format!("nil"),
            | Literal::Bool(true) => format!("#t"),
            | Literal::Bool(false) => format!("#f"),
            | Literal::Int(i) => format!("{}", i),
            | Literal::Str(s) => format!("{:?}", s),
        }
    }
}

fn ugly_args<'a>(
    f: &'a Formatter, args: &[ExprId], kwargs: &[(VarName, ExprId)],
) -> String {
    let mut s = String::new();
    for arg in args {
        s += &format!(" {}", arg.ugly(f));
    }
    for (kw, arg) in kwargs {
        s += &format!(" :{} {}", kw, arg.ugly(f));
    }
    s
}

fn ugly_block<'a>(f: &'a Formatter, body: &ExprId) -> String {
    match &f.program.exprs[body] {
        | Expr::Seq(items) => items.iter().map(|item| format!(" {}", item.ugly(f))).collect(),
        | _ => format!(" {}", body.ugly(f)),
    }
}

impl<'a> Ugly<'a, Formatter<'a>> for ExprId {
    fn ugly(&self, f: &'a Formatter) -> String {
        match &f.program.exprs[self] {
            | Expr::Lit(lit) => lit.ugly(f),
            | Expr::Var(name) => format!("{}", name),
            | Expr::Fn(func) => func.ugly(f),
            | Expr::Call(Call { func, args, kwargs }) => {
                format!("({}{})", func.ugly(f), ugly_args(f, args, kwargs))
            }
            | Expr::If(If { arms, alt }) => {
                let mut s = format!("(cond");
                for Arm { cond, body } in arms {
                    s += &format!(" ({}{})", cond.ugly(f), ugly_block(f, body));
                }
                if let Some(alt) = alt {
                    s += &format!(" (else{})", ugly_block(f, alt));
                }
                s + ")"
            }
            | Expr::Short(ShortCircuit { op, operands }) => {
                let op = match op {
                    | BoolOp::And => "and",
                    | BoolOp::Or => "or",
                };
                format!("({}{})", op, ugly_args(f, operands, &[]))
            }
            | Expr::Seq(items) => format!("(begin{})", ugly_args(f, items, &[])),
            | Expr::Let(Let { binder, bindee }) => format!("(let {} {})", binder, bindee.ugly(f)),
            | Expr::Set(Set { binder, bindee }) => format!("(set! {} {})", binder, bindee.ugly(f)),
            | Expr::While(While { cond, body }) => {
                format!("(while {}{})", cond.ugly(f), ugly_block(f, body))
            }
            | Expr::Jump(Jump { func, args, kwargs, cc }) => {
                let mut s = format!("(jump {}{}", func.ugly(f), ugly_args(f, args, kwargs));
                if let Some(cc) = cc {
                    s += &format!(" :cc {}", cc.ugly(f));
                }
                s + ")"
            }
            | Expr::Capture(Capture { binders, call }) => {
                let binders: Vec<_> = binders.iter().map(|b| b.plain()).collect();
                format!("(capture ({}) {})", binders.join(" "), call.ugly(f))
            }
        }
    }
}

impl<'a> Ugly<'a, Formatter<'a>> for FnId {
    fn ugly(&self, f: &'a Formatter) -> String {
        let FnDef { name: _, params, body, decorators, regions: _, kind } = &f.program.fns[self];
        let head = match kind {
            | FnKind::Plain => "fn",
            | FnKind::Continuation => "cont",
        };
        let params: Vec<_> = params.iter().map(|p| p.plain()).collect();
        let mut s = format!("({} ({})", head, params.join(" "));
        if !decorators.is_empty() {
            let names: Vec<_> = decorators.iter().map(|(d, _)| d.plain()).collect();
            s += &format!(" :decorators ({})", names.join(" "));
        }
        s + &ugly_block(f, body) + ")"
    }
}

impl<'a> Ugly<'a, Formatter<'a>> for Toplevel {
    fn ugly(&self, f: &'a Formatter) -> String {
        match self {
            | Toplevel::Define(name, bindee) => format!("(define {} {})", name, bindee.ugly(f)),
            | Toplevel::Exec(expr) => expr.ugly(f),
        }
    }
}

/* --------------------------------- Pretty --------------------------------- */

fn group<'a>(head: RcDoc<'a>, items: Vec<RcDoc<'a>>) -> RcDoc<'a> {
    RcDoc::text("(")
        .append(head)
        .append(RcDoc::line().append(RcDoc::intersperse(items, RcDoc::line())).nest(2))
        .append(RcDoc::text(")"))
        .group()
}

fn pretty_block<'a>(f: &'a Formatter, body: &ExprId) -> Vec<RcDoc<'a>> {
    match &f.program.exprs[body] {
        | Expr::Seq(items) => items.iter().map(|item| item.pretty(f)).collect(),
        | _ => vec![body.pretty(f)],
    }
}

impl<'a> Pretty<'a, Formatter<'a>> for ExprId {
    fn pretty(&self, f: &'a Formatter) -> RcDoc<'a> {
        match &f.program.exprs[self] {
            | Expr::Fn(func) => func.pretty(f),
            | Expr::If(If { arms, alt }) => {
                let mut items: Vec<_> = arms
                    .iter()
                    .map(|Arm { cond, body }| group(cond.pretty(f), pretty_block(f, body)))
                    .collect();
                if let Some(alt) = alt {
                    items.push(group(RcDoc::text("else"), pretty_block(f, alt)));
                }
                group(RcDoc::text("cond"), items)
            }
            | Expr::Seq(items) => {
                group(RcDoc::text("begin"), items.iter().map(|item| item.pretty(f)).collect())
            }
            | Expr::While(While { cond, body }) => group(
                RcDoc::text("while ").append(cond.pretty(f)),
                pretty_block(f, body),
            ),
            | _ => RcDoc::text(self.ugly(f)),
        }
    }
}

impl<'a> Pretty<'a, Formatter<'a>> for FnId {
    fn pretty(&self, f: &'a Formatter) -> RcDoc<'a> {
        let FnDef { params, body, kind, .. } = &f.program.fns[self];
        let head = match kind {
            | FnKind::Plain => "fn",
            | FnKind::Continuation => "cont",
        };
        let params: Vec<_> = params.iter().map(|p| p.plain()).collect();
        group(RcDoc::text(format!("{} ({})", head, params.join(" "))), pretty_block(f, body))
    }
}

impl<'a> Pretty<'a, Formatter<'a>> for Program {
    fn pretty(&self, f: &'a Formatter) -> RcDoc<'a> {
        let tops = self.top.iter().map(|top| match top {
            | Toplevel::Define(name, bindee) => {
                group(RcDoc::text(format!("define {}", name)), vec![bindee.pretty(f)])
            }
            | Toplevel::Exec(expr) => expr.pretty(f),
        });
        RcDoc::intersperse(tops, RcDoc::hardline())
    }
}
