use super::{escape::apply_string_escapes, lexer::Tok};
use crate::err::*;
use bounce_utils::span::{FileInfo, Sp, Span};
use logos::Logos;

/// The untyped tree the reader produces.
#[derive(Clone, Debug, PartialEq)]
pub enum SExp {
    Int(i64),
    Str(String),
    Bool(bool),
    Sym(String),
    Keyword(String),
    List(Vec<Sp<SExp>>),
}

impl SExp {
    pub fn as_sym(&self) -> Option<&str> {
        match self {
            | SExp::Sym(s) => Some(s),
            | _ => None,
        }
    }
    pub fn as_list(&self) -> Option<&[Sp<SExp>]> {
        match self {
            | SExp::List(items) => Some(items),
            | _ => None,
        }
    }
}

pub struct Reader<'src> {
    source: &'src str,
    info: &'src FileInfo,
}

impl<'src> Reader<'src> {
    pub fn new(source: &'src str, info: &'src FileInfo) -> Self {
        Reader { source, info }
    }

    pub fn read_all(self) -> Result<Vec<Sp<SExp>>> {
        // open lists, innermost last, with the offset of their `(`
        let mut stack: Vec<(usize, Vec<Sp<SExp>>)> = Vec::new();
        let mut top = Vec::new();
        for (tok, range) in Tok::lexer(self.source).spanned() {
            let span = Span::new(range.start, range.end);
            let tok = tok.map_err(|()| ParseError::InvalidToken {
                location: self.info.locate(&span),
                text: self.source[range.clone()].to_string(),
            })?;
            let atom = match tok {
                | Tok::ParenOpen => {
                    stack.push((range.start, Vec::new()));
                    continue;
                }
                | Tok::ParenClose => {
                    let Some((start, items)) = stack.pop() else {
                        return Err(ParseError::Unbalanced { location: self.info.locate(&span) });
                    };
                    Span::new(start, range.end).make(SExp::List(items))
                }
                | Tok::True => span.make(SExp::Bool(true)),
                | Tok::False => span.make(SExp::Bool(false)),
                | Tok::IntLit(s) => {
                    let i = s.parse::<i64>().map_err(|_| ParseError::InvalidInt {
                        location: self.info.locate(&span),
                        text: s.to_string(),
                    })?;
                    span.make(SExp::Int(i))
                }
                | Tok::StrLit(s) => {
                    let s = apply_string_escapes(s).map_err(|c| ParseError::InvalidEscape {
                        location: self.info.locate(&span),
                        escape: c,
                    })?;
                    span.make(SExp::Str(s))
                }
                | Tok::Keyword(s) => span.make(SExp::Keyword(s[1..].to_string())),
                | Tok::Ident(s) => span.make(SExp::Sym(s.to_string())),
            };
            match stack.last_mut() {
                | Some((_, items)) => items.push(atom),
                | None => top.push(atom),
            }
        }
        if let Some((start, _)) = stack.pop() {
            return Err(ParseError::UnclosedParen {
                location: self.info.locate(&Span::new(start, start + 1)),
                depth: stack.len() + 1,
            });
        }
        Ok(top)
    }
}
