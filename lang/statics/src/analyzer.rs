//! Tail positions of a function body.
//!
//! A body is analyzed on its own: nested functions are separate bodies. The
//! result lists the leaves whose value becomes the value of the body, plus the
//! arguments of every escape call anywhere in it.

use bounce_syntax::*;
use indexmap::IndexSet;

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum TailKind {
    /// the value is returned from the body
    Return,
    /// the value is handed to an escape continuation
    Escape,
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum TailPosition {
    Expr { expr: ExprId, kind: TailKind },
    /// the end of an empty block; its value is the implicit nil
    FallThrough { seq: ExprId },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TailPositions(IndexSet<TailPosition>);

impl TailPositions {
    pub fn contains(&self, expr: &ExprId, kind: TailKind) -> bool {
        self.0.contains(&TailPosition::Expr { expr: *expr, kind })
    }
    pub fn is_tail(&self, expr: &ExprId) -> bool {
        self.contains(expr, TailKind::Return) || self.contains(expr, TailKind::Escape)
    }
    /// Empty blocks whose end is the end of the body.
    pub fn fall_throughs(&self) -> impl Iterator<Item = ExprId> + '_ {
        self.0.iter().filter_map(|pos| match pos {
            | TailPosition::FallThrough { seq } => Some(*seq),
            | _ => None,
        })
    }
    /// Leaves returned from the body, in source order.
    pub fn returns(&self) -> impl Iterator<Item = ExprId> + '_ {
        self.0.iter().filter_map(|pos| match pos {
            | TailPosition::Expr { expr, kind: TailKind::Return } => Some(*expr),
            | _ => None,
        })
    }
    pub fn escapes(&self) -> impl Iterator<Item = ExprId> + '_ {
        self.0.iter().filter_map(|pos| match pos {
            | TailPosition::Expr { expr, kind: TailKind::Escape } => Some(*expr),
            | _ => None,
        })
    }
    pub fn iter(&self) -> impl Iterator<Item = &TailPosition> {
        self.0.iter()
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

pub struct Analyzer<'a> {
    program: &'a Program,
    escapes: &'a [VarName],
    positions: IndexSet<TailPosition>,
}

/// Tail positions of `body`, treating calls to any of `escapes` as escape calls.
pub fn analyze(program: &Program, body: &ExprId, escapes: &[VarName]) -> TailPositions {
    let mut analyzer = Analyzer { program, escapes, positions: IndexSet::new() };
    analyzer.tail(body);
    analyzer.escape_calls(body);
    log::trace!("{} tail positions in {:?}", analyzer.positions.len(), body);
    TailPositions(analyzer.positions)
}

impl<'a> Analyzer<'a> {
    fn tail(&mut self, expr: &ExprId) {
        match &self.program.exprs[expr] {
            | Expr::Seq(items) => match items.last() {
                | Some(last) => self.tail(last),
                | None => {
                    self.positions.insert(TailPosition::FallThrough { seq: *expr });
                }
            },
            | Expr::If(If { arms, alt }) => {
                for arm in arms {
                    self.tail(&arm.body);
                }
                // no `else`: the implicit nil is not a tail position
                if let Some(alt) = alt {
                    self.tail(alt);
                }
            }
            | Expr::Short(ShortCircuit { operands, .. }) if !operands.is_empty() => {
                self.tail(&operands[operands.len() - 1])
            }
            | _ => {
                self.positions.insert(TailPosition::Expr { expr: *expr, kind: TailKind::Return });
            }
        }
    }

    fn escape_calls(&mut self, expr: &ExprId) {
        let node = &self.program.exprs[expr];
        if let Expr::Call(Call { func, args, .. }) = node {
            if let Expr::Var(name) = &self.program.exprs[func] {
                if self.escapes.contains(name) {
                    for arg in args {
                        let pos = TailPosition::Expr { expr: *arg, kind: TailKind::Escape };
                        self.positions.insert(pos);
                    }
                }
            }
        }
        for child in node.children() {
            self.escape_calls(&child);
        }
    }
}
