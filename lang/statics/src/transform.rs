//! Rewrites function bodies according to the blocks they were defined in, and
//! resolves the wrappers each function is decorated with.
//!
//! * `tco`: calls in return position become [`Jump`]s.
//! * `continuations`: every function takes a trailing `cc`; the body is cut at
//!   each `capture` and the rest becomes a continuation function; return
//!   positions hand their value to `cc`.

use crate::{analyzer::*, err::*, registry::*};
use bounce_syntax::*;
use bounce_utils::{arena::*, span::Span};

/// The implicit continuation parameter of continuation-enabled functions.
pub const CC: &str = "cc";

#[derive(Clone, Debug)]
pub struct Transformed {
    pub program: Program,
    /// wrappers of every function, outermost first
    pub decorations: ArenaAssoc<FnId, Vec<DecoratorKind>>,
}

impl Transformed {
    pub fn decorations_of(&self, func: &FnId) -> &[DecoratorKind] {
        self.decorations.get(func).map(Vec::as_slice).unwrap_or_default()
    }
    /// Whether the body of `func` evaluates under the call-by-need policy.
    pub fn is_lazy(&self, func: &FnId) -> bool {
        self.program.fns[func].regions.lazy
            || self.decorations_of(func).contains(&DecoratorKind::Lazy)
    }
}

pub struct Transformer<'a> {
    program: Program,
    registry: &'a DecoratorRegistry,
    escapes: &'a [VarName],
}

impl<'a> Transformer<'a> {
    pub fn new(program: Program, registry: &'a DecoratorRegistry, escapes: &'a [VarName]) -> Self {
        Transformer { program, registry, escapes }
    }

    pub fn run(mut self) -> Result<Transformed> {
        for top in self.program.top.clone() {
            let (Toplevel::Define(_, expr) | Toplevel::Exec(expr)) = top;
            self.forbid_capture(&expr, "toplevel", "only function bodies can capture")?;
        }
        // continuation functions created on the way are handled with their parent
        let fns: Vec<FnId> = self.program.functions().map(|(id, _)| id).collect();
        for func in &fns {
            let FnDef { body, regions, .. } = self.program.fns[func];
            let label = self.label(func);
            if regions.cont {
                log::trace!("continuation-passing rewrite of {}", label);
                let params = &mut self.program.fns[func].params;
                if !params.iter().any(|p| p.plain() == CC) {
                    params.push(VarName::from(CC));
                }
                self.cps_block(&body, regions, &label)?;
            } else {
                self.forbid_capture(&body, &label, "not inside a `continuations` block")?;
                if regions.tco {
                    log::trace!("tail-call rewrite of {}", label);
                    self.tco(&body);
                }
            }
        }
        let mut decorations = ArenaAssoc::new();
        for (func, def) in self.program.functions() {
            decorations.insert(func, self.decorate(def)?);
        }
        Ok(Transformed { program: self.program, decorations })
    }

    fn label(&self, func: &FnId) -> String {
        match &self.program.fns[func].name {
            | Some(name) => format!("`{}`", name),
            | None => format!("anonymous function {}", func.concise()),
        }
    }

    fn forbid_capture(&self, expr: &ExprId, label: &str, reason: &'static str) -> Result<()> {
        let node = &self.program.exprs[expr];
        if let Expr::Capture(_) = node {
            Err(StaticsError::CapturePlacement { func: label.to_string(), reason })?
        }
        for child in node.children() {
            self.forbid_capture(&child, label, reason)?;
        }
        Ok(())
    }

    /// Copy `expr` into a fresh slot so the original slot can be overwritten.
    fn relocate(&mut self, expr: &ExprId) -> ExprId {
        let span = self.program.span(expr);
        let node = self.program.exprs[expr].clone();
        self.program.alloc_expr(node, span)
    }

    /// A call to one of the escape names. It unwinds on its own and has to
    /// run inside the extent of its `call-ec` point, so it is never deferred.
    fn is_escape_call(&self, expr: &ExprId) -> bool {
        match &self.program.exprs[expr] {
            | Expr::Call(Call { func, .. }) => match &self.program.exprs[func] {
                | Expr::Var(name) => self.escapes.contains(name),
                | _ => false,
            },
            | _ => false,
        }
    }

    /* ----------------------------------- TCO ---------------------------------- */

    fn tco(&mut self, body: &ExprId) {
        let positions = analyze(&self.program, body, self.escapes);
        for leaf in positions.returns().collect::<Vec<_>>() {
            // escape calls and their arguments stay strict
            if positions.contains(&leaf, TailKind::Escape) || self.is_escape_call(&leaf) {
                continue;
            }
            if let Expr::Call(Call { func, args, kwargs }) = self.program.exprs[&leaf].clone() {
                self.program.exprs[&leaf] = Jump { func, args, kwargs, cc: None }.into();
            }
        }
    }

    /* ----------------------------------- CPS ---------------------------------- */

    fn cps_block(&mut self, body: &ExprId, regions: Regions, label: &str) -> Result<()> {
        let items = match self.program.exprs[body].clone() {
            | Expr::Seq(items) => items,
            | _ => {
                let moved = self.relocate(body);
                self.program.exprs[body] = Expr::Seq(vec![moved]);
                vec![moved]
            }
        };
        let found = items.iter().enumerate().find_map(|(i, item)| {
            match &self.program.exprs[item] {
                | Expr::Capture(capture) => Some((i, capture.clone())),
                | _ => None,
            }
        });
        let misplaced = "only allowed as a statement of the function body";
        let Some((i, Capture { binders, call })) = found else {
            for item in &items {
                self.forbid_capture(item, label, misplaced)?;
            }
            self.cps_tails(body);
            return Ok(());
        };
        for item in &items[..i] {
            self.forbid_capture(item, label, misplaced)?;
        }
        self.forbid_capture(&call, label, "captures cannot nest")?;
        let Expr::Call(Call { func, args, kwargs }) = self.program.exprs[&call].clone() else {
            return Err(StaticsError::CapturePlacement {
                func: label.to_string(),
                reason: "only calls can be captured",
            });
        };
        let span = self.program.span(&items[i]);
        let rest = self.program.alloc_expr(items[i + 1..].to_vec(), span);
        self.cps_block(&rest, regions, label)?;
        let names: Vec<_> = binders.iter().map(|b| b.plain()).collect();
        log::debug!("capture in {} binds ({})", label, names.join(" "));
        let cont = self.program.alloc_fn(FnDef {
            name: None,
            params: binders,
            body: rest,
            decorators: Vec::new(),
            regions,
            kind: FnKind::Continuation,
        });
        let cont = self.program.alloc_expr(cont, span);
        let jump = self.program.alloc_expr(Jump { func, args, kwargs, cc: Some(cont) }, span);
        let mut kept = items[..i].to_vec();
        kept.push(jump);
        self.program.exprs[body] = Expr::Seq(kept);
        Ok(())
    }

    fn cc(&mut self, span: Span) -> ExprId {
        self.program.alloc_expr(VarName::from(CC), span)
    }

    /// Return positions hand their value to `cc`; calls pass `cc` along.
    fn cps_tails(&mut self, body: &ExprId) {
        let positions = analyze(&self.program, body, self.escapes);
        for seq in positions.fall_throughs().collect::<Vec<_>>() {
            let span = self.program.span(&seq);
            let nil = self.program.alloc_expr(Literal::Unit, span);
            let func = self.cc(span);
            let jump = Jump { func, args: vec![nil], kwargs: Vec::new(), cc: None };
            let jump = self.program.alloc_expr(jump, span);
            self.program.exprs[&seq] = Expr::Seq(vec![jump]);
        }
        for leaf in positions.returns().collect::<Vec<_>>() {
            if self.is_escape_call(&leaf) {
                continue;
            }
            let span = self.program.span(&leaf);
            let rewritten: Expr = match self.program.exprs[&leaf].clone() {
                | Expr::Call(Call { func, args, kwargs })
                | Expr::Jump(Jump { func, args, kwargs, cc: None }) => {
                    Jump { func, args, kwargs, cc: Some(self.cc(span)) }.into()
                }
                | Expr::Jump(_) => continue,
                | _ => {
                    let value = self.relocate(&leaf);
                    let func = self.cc(span);
                    Jump { func, args: vec![value], kwargs: Vec::new(), cc: None }.into()
                }
            };
            self.program.exprs[&leaf] = rewritten;
        }
    }

    /* ------------------------------- Decoration ------------------------------- */

    fn decorate(&self, def: &FnDef) -> Result<Vec<DecoratorKind>> {
        let mut kinds = Vec::new();
        for (name, _) in &def.decorators {
            kinds.push(self.registry.lookup(name)?);
        }
        // continuation functions are wrapped by the runtime when captured
        if def.kind == FnKind::Plain {
            let Regions { tco, cont, lazy } = def.regions;
            if tco {
                kinds.push(DecoratorKind::Trampolined);
            }
            if cont {
                kinds.push(DecoratorKind::Continuations);
            }
            if lazy {
                kinds.push(DecoratorKind::Lazy);
            }
        }
        let order = self.registry.order_for(kinds)?;
        if !order.is_empty() {
            let names: Vec<_> = order.iter().map(|kind| kind.name()).collect();
            let name = def.name.as_ref().map(|n| n.plain()).unwrap_or("fn");
            log::debug!("{}: decorated with ({})", name, names.join(" "));
        }
        Ok(order)
    }
}

/// Rewrite `program` and resolve decorations against `registry`.
pub fn transform(
    program: Program, registry: &DecoratorRegistry, escapes: &[VarName],
) -> Result<Transformed> {
    Transformer::new(program, registry, escapes).run()
}
