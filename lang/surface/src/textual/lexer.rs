use logos::Logos;
use std::fmt::Display;

#[derive(Logos, Clone, Debug, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r";[^\n]*")]
#[logos(subpattern ident = r"[a-zA-Z0-9_!?*<>=/+\-%'.]")]
pub enum Tok<'input> {
    #[token("(")]
    ParenOpen,
    #[token(")")]
    ParenClose,
    #[token("#t")]
    True,
    #[token("#f")]
    False,

    #[regex(r"[\+-]?[0-9]+", priority = 10)]
    IntLit(&'input str),
    #[regex(r#""[^"\\]*(?:\\.[^"\\]*)*""#)]
    StrLit(&'input str),
    #[regex(r":[a-zA-Z_](?&ident)*")]
    Keyword(&'input str),
    #[regex(r"[a-zA-Z_!?*<>=/+\-%](?&ident)*")]
    Ident(&'input str),
}

impl Display for Tok<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            | Tok::ParenOpen => write!(f, "("),
            | Tok::ParenClose => write!(f, ")"),
            | Tok::True => write!(f, "#t"),
            | Tok::False => write!(f, "#f"),
            | Tok::IntLit(s) | Tok::StrLit(s) | Tok::Keyword(s) | Tok::Ident(s) => {
                write!(f, "{}", s)
            }
        }
    }
}
