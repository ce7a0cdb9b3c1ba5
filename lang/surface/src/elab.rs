use crate::{err::*, textual::SExp};
use bounce_syntax::*;
use bounce_utils::span::{FileInfo, Sp, Span};

pub struct Elaborator<'a> {
    info: &'a FileInfo,
    program: Program,
    /// blocks enclosing the form being elaborated
    regions: Regions,
}

type Items<'s> = &'s [Sp<SExp>];

impl<'a> Elaborator<'a> {
    pub fn new(info: &'a FileInfo) -> Self {
        Elaborator { info, program: Program::default(), regions: Regions::default() }
    }

    pub fn run(mut self, forms: Vec<Sp<SExp>>) -> Result<Program> {
        for form in &forms {
            self.toplevel(form)?;
        }
        Ok(self.program)
    }

    fn malformed<T>(&self, span: &Span, form: &str, reason: impl Into<String>) -> Result<T> {
        Err(ParseError::Malformed {
            location: self.info.locate(span),
            form: form.to_string(),
            reason: reason.into(),
        })
    }

    fn sym(&self, sexp: &Sp<SExp>, form: &str) -> Result<VarName> {
        match sexp.inner.as_sym() {
            | Some(s) => Ok(VarName::from(s)),
            | None => self.malformed(&sexp.info, form, "expected a name"),
        }
    }

    fn syms(&self, sexp: &Sp<SExp>, form: &str) -> Result<Vec<VarName>> {
        match sexp.inner.as_list() {
            | Some(items) => items.iter().map(|item| self.sym(item, form)).collect(),
            | None => self.malformed(&sexp.info, form, "expected a parenthesized list of names"),
        }
    }

    /* -------------------------------- Toplevel -------------------------------- */

    fn toplevel(&mut self, form: &Sp<SExp>) -> Result<()> {
        let span = form.info;
        if let Some(items) = form.inner.as_list() {
            match items.first().and_then(|head| head.inner.as_sym()) {
                | Some("define") => {
                    let [_, name, bindee] = items else {
                        return self.malformed(&span, "define", "expected `(define NAME EXPR)`");
                    };
                    let name = self.sym(name, "define")?;
                    let bindee = self.expr(bindee)?;
                    self.program.top.push(Toplevel::Define(name, bindee));
                    return Ok(());
                }
                | Some("defn") => {
                    let (name, func) = self.defn(&span, items)?;
                    self.program.top.push(Toplevel::Define(name, func));
                    return Ok(());
                }
                | Some(region @ ("tco" | "continuations" | "lazify")) => {
                    let saved = self.regions;
                    match region {
                        | "tco" => self.regions.tco = true,
                        | "continuations" => {
                            self.regions.tco = true;
                            self.regions.cont = true;
                        }
                        | _ => self.regions.lazy = true,
                    }
                    for item in &items[1..] {
                        self.toplevel(item)?;
                    }
                    self.regions = saved;
                    return Ok(());
                }
                | _ => {}
            }
        }
        let expr = self.expr(form)?;
        self.program.top.push(Toplevel::Exec(expr));
        Ok(())
    }

    /// `(defn NAME (PARAM*) [:decorators (KIND*)] BODY*)`
    fn defn(&mut self, span: &Span, items: Items) -> Result<(VarName, ExprId)> {
        let [_, name, params, rest @ ..] = items else {
            return self.malformed(span, "defn", "expected `(defn NAME (PARAM*) BODY*)`");
        };
        let name = self.sym(name, "defn")?;
        let func = self.func(span, Some(name.clone()), params, rest)?;
        Ok((name, self.program.alloc_expr(func, *span)))
    }

    fn func(
        &mut self, span: &Span, name: Option<VarName>, params: &Sp<SExp>, rest: Items,
    ) -> Result<FnId> {
        let params = self.syms(params, "fn")?;
        let (decorators, body) = match rest {
            | [kw, names, body @ ..] if kw.inner == SExp::Keyword("decorators".into()) => {
                let Some(names) = names.inner.as_list() else {
                    return self.malformed(&names.info, "fn", "`:decorators` takes a list");
                };
                let decorators = names
                    .iter()
                    .map(|item| match item.inner.as_sym() {
                        | Some(s) => Ok((DecoratorName::from(s), item.info)),
                        | None => self.malformed(&item.info, "fn", "decorators are plain names"),
                    })
                    .collect::<Result<Vec<_>>>()?;
                (decorators, body)
            }
            | body => (Vec::new(), body),
        };
        let body = self.block(span, body)?;
        let def = FnDef { name, params, body, decorators, regions: self.regions, kind: FnKind::Plain };
        Ok(self.program.alloc_fn(def))
    }

    /* ------------------------------- Expression ------------------------------- */

    fn block(&mut self, span: &Span, items: Items) -> Result<ExprId> {
        let items = items.iter().map(|item| self.expr(item)).collect::<Result<Vec<_>>>()?;
        Ok(self.program.alloc_expr(items, *span))
    }

    fn args(&mut self, items: Items) -> Result<(Vec<ExprId>, Vec<(VarName, ExprId)>)> {
        let mut args = Vec::new();
        let mut kwargs = Vec::new();
        let mut iter = items.iter();
        while let Some(item) = iter.next() {
            match &item.inner {
                | SExp::Keyword(kw) => {
                    let Some(value) = iter.next() else {
                        return self.malformed(&item.info, "call", format!("`:{}` needs a value", kw));
                    };
                    let value = self.expr(value)?;
                    kwargs.push((VarName::from(kw), value));
                }
                | _ if !kwargs.is_empty() => {
                    return self.malformed(&item.info, "call", "positional argument after keyword");
                }
                | _ => args.push(self.expr(item)?),
            }
        }
        Ok((args, kwargs))
    }

    pub fn expr(&mut self, sexp: &Sp<SExp>) -> Result<ExprId> {
        let span = sexp.info;
        let expr: Expr = match &sexp.inner {
            | SExp::Int(i) => Literal::Int(*i).into(),
            | SExp::Str(s) => Literal::Str(s.clone()).into(),
            | SExp::Bool(b) => Literal::Bool(*b).into(),
            | SExp::Sym(s) if s == "nil" => Literal::Unit.into(),
            | SExp::Sym(s) => VarName::from(s).into(),
            | SExp::Keyword(kw) => {
                return self.malformed(&span, kw, "keyword outside of a call");
            }
            | SExp::List(items) => return self.form(&span, items),
        };
        Ok(self.program.alloc_expr(expr, span))
    }

    fn form(&mut self, span: &Span, items: Items) -> Result<ExprId> {
        let Some(head) = items.first() else {
            return self.malformed(span, "()", "empty application");
        };
        let expr: Expr = match head.inner.as_sym() {
            | Some("fn") => {
                let [_, params, rest @ ..] = items else {
                    return self.malformed(span, "fn", "expected `(fn (PARAM*) BODY*)`");
                };
                self.func(span, None, params, rest)?.into()
            }
            | Some("defn") => {
                let (name, func) = self.defn(span, items)?;
                Let { binder: name, bindee: func }.into()
            }
            | Some("define") => {
                return self.malformed(span, "define", "only allowed at toplevel; use `let`");
            }
            | Some("if") => match items {
                | [_, cond, then, rest @ ..] if rest.len() <= 1 => {
                    let arm = Arm { cond: self.expr(cond)?, body: self.expr(then)? };
                    let alt = match rest {
                        | [alt] => Some(self.expr(alt)?),
                        | _ => None,
                    };
                    If { arms: vec![arm], alt }.into()
                }
                | _ => return self.malformed(span, "if", "expected `(if COND THEN [ELSE])`"),
            },
            | Some("cond") => {
                let mut arms = Vec::new();
                let mut alt = None;
                for (i, clause) in items[1..].iter().enumerate() {
                    let Some([test, body @ ..]) = clause.inner.as_list() else {
                        return self.malformed(&clause.info, "cond", "clauses are `(TEST BODY*)`");
                    };
                    if test.inner.as_sym() == Some("else") {
                        if i + 2 != items.len() {
                            return self.malformed(&clause.info, "cond", "`else` must come last");
                        }
                        alt = Some(self.block(&clause.info, body)?);
                    } else {
                        let cond = self.expr(test)?;
                        arms.push(Arm { cond, body: self.block(&clause.info, body)? });
                    }
                }
                if arms.is_empty() {
                    return self.malformed(span, "cond", "needs at least one test clause");
                }
                If { arms, alt }.into()
            }
            | Some(op @ ("and" | "or")) => {
                let op = if op == "and" { BoolOp::And } else { BoolOp::Or };
                let operands =
                    items[1..].iter().map(|item| self.expr(item)).collect::<Result<Vec<_>>>()?;
                ShortCircuit { op, operands }.into()
            }
            | Some("begin") => {
                return self.block(span, &items[1..]);
            }
            | Some(form @ ("let" | "set!")) => {
                let [_, binder, bindee] = items else {
                    return self.malformed(span, form, format!("expected `({} NAME EXPR)`", form));
                };
                let binder = self.sym(binder, form)?;
                let bindee = self.expr(bindee)?;
                match form {
                    | "let" => Let { binder, bindee }.into(),
                    | _ => Set { binder, bindee }.into(),
                }
            }
            | Some("while") => {
                let [_, cond, body @ ..] = items else {
                    return self.malformed(span, "while", "expected `(while COND BODY*)`");
                };
                let cond = self.expr(cond)?;
                While { cond, body: self.block(span, body)? }.into()
            }
            | Some("jump") => {
                let [_, func, rest @ ..] = items else {
                    return self.malformed(span, "jump", "expected `(jump F ARG*)`");
                };
                let func = self.expr(func)?;
                let (args, kwargs) = self.args(rest)?;
                Jump { func, args, kwargs, cc: None }.into()
            }
            | Some("capture") => {
                let [_, binders, call] = items else {
                    return self.malformed(span, "capture", "expected `(capture (NAME*) (F ARG*))`");
                };
                let binders = self.syms(binders, "capture")?;
                let call = self.expr(call)?;
                if !matches!(self.program.exprs[&call], Expr::Call(_)) {
                    return self.malformed(span, "capture", "the captured expression must be a call");
                }
                Capture { binders, call }.into()
            }
            | _ => {
                let func = self.expr(head)?;
                let (args, kwargs) = self.args(&items[1..])?;
                Call { func, args, kwargs }.into()
            }
        };
        Ok(self.program.alloc_expr(expr, *span))
    }
}
