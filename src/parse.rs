//! Reader for lambda notation.
//!
//! ```text
//! expr  := lambda | atom+ lambda?
//! lambda:= ('\' | 'λ') ident+ '.' expr
//! atom  := ident | integer | '(' expr ')'
//! ```
//!
//! Terms are written straight into the arena with de Bruijn indices. Names
//! resolve to the innermost binder, then to a builtin, then to a global
//! definition.

use std::collections::HashMap;
use std::fmt;
use crate::error::ParseError;
use crate::term::*;

pub type Globals = HashMap<String, TermPtr>;

/// Deepest nesting of parentheses and lambda bodies the reader accepts.
pub const MAX_NESTING: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
  Lambda,
  Dot,
  LParen,
  RParen,
  Ident(String),
  Int(i64),
}

impl fmt::Display for Token {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Token::Lambda => write!(f, "'\\'"),
      Token::Dot => write!(f, "'.'"),
      Token::LParen => write!(f, "'('"),
      Token::RParen => write!(f, "')'"),
      Token::Ident(name) => write!(f, "name {}", name),
      Token::Int(num) => write!(f, "integer {}", num),
    }
  }
}

fn is_ident_start(ch: char) -> bool {
  ch.is_ascii_alphabetic() || ch == '_'
}

fn is_ident_continue(ch: char) -> bool {
  ch.is_ascii_alphanumeric() || ch == '_'
}

pub fn tokenize(src: &str) -> Result<Vec<(usize, Token)>, ParseError> {
  let mut tokens = vec![];
  let mut chars = src.char_indices().peekable();
  while let Some((offset, ch)) = chars.next() {
    let token = match ch {
      '\\' | 'λ' => Token::Lambda,
      '.' => Token::Dot,
      '(' => Token::LParen,
      ')' => Token::RParen,
      '#' => {
        while let Some((_, c)) = chars.next() {
          if c == '\n' {
            break
          }
        }
        continue
      },
      c if c.is_whitespace() => continue,
      c if c.is_ascii_digit() => {
        let mut end = offset + c.len_utf8();
        while let Some(&(i, d)) = chars.peek() {
          if !d.is_ascii_digit() {
            break
          }
          end = i + d.len_utf8();
          chars.next();
        }
        let literal = &src[offset..end];
        match literal.parse() {
          Ok(num) => Token::Int(num),
          Err(_) => return Err(ParseError::InvalidInteger { literal: literal.to_string(), offset }),
        }
      },
      c if is_ident_start(c) => {
        let mut end = offset + c.len_utf8();
        while let Some(&(i, d)) = chars.peek() {
          if !is_ident_continue(d) {
            break
          }
          end = i + d.len_utf8();
          chars.next();
        }
        Token::Ident(src[offset..end].to_string())
      },
      ch => return Err(ParseError::UnexpectedChar { ch, offset }),
    };
    tokens.push((offset, token));
  }
  Ok(tokens)
}

/// Builtins are primitives of the machine rather than lambda terms.
fn builtin(name: &str, store: &mut Store) -> Option<TermPtr> {
  let term = match name {
    "TRUE" => tbool(true, store),
    "FALSE" => tbool(false, store),
    "NIL" => tnil(store),
    "CONS" | "PAIR" => topr(Opr::Pair, store),
    "HEAD" | "FIRST" => topr(Opr::First, store),
    "TAIL" | "SECOND" => topr(Opr::Second, store),
    "IS_NIL" => topr(Opr::IsNil, store),
    "INT_ADD" => topr(Opr::Add, store),
    _ => return None,
  };
  Some(term)
}

pub fn is_builtin(name: &str) -> bool {
  matches!(
    name,
    "TRUE" | "FALSE" | "NIL" | "CONS" | "PAIR" | "HEAD" | "FIRST" | "TAIL" | "SECOND" | "IS_NIL" | "INT_ADD"
  )
}

pub struct Parser<'s> {
  tokens: Vec<(usize, Token)>,
  pos: usize,
  store: &'s mut Store,
  globals: &'s Globals,
  scope: Vec<String>,
  depth: usize,
  end: usize,
}

impl<'s> Parser<'s> {
  pub fn new(src: &str, store: &'s mut Store, globals: &'s Globals) -> Result<Self, ParseError> {
    Ok(Parser {
      tokens: tokenize(src)?,
      pos: 0,
      store,
      globals,
      scope: vec![],
      depth: 0,
      end: src.len(),
    })
  }

  fn peek(&self) -> Option<&Token> {
    self.tokens.get(self.pos).map(|(_, tok)| tok)
  }

  fn next(&mut self) -> Option<(usize, Token)> {
    let tok = self.tokens.get(self.pos).cloned();
    if tok.is_some() {
      self.pos += 1;
    }
    tok
  }

  fn offset(&self) -> usize {
    self.tokens.get(self.pos).map_or(self.end, |(offset, _)| *offset)
  }

  fn unexpected(found: Option<(usize, Token)>, expected: &'static str) -> ParseError {
    match found {
      Some((offset, tok)) => ParseError::UnexpectedToken { found: tok.to_string(), expected, offset },
      None => ParseError::UnexpectedEnd { expected },
    }
  }

  /// Parses the whole input as one expression.
  pub fn parse(mut self) -> Result<TermPtr, ParseError> {
    let term = self.expr()?;
    match self.next() {
      None => Ok(term),
      found => Err(Self::unexpected(found, "end of input")),
    }
  }

  fn expr(&mut self) -> Result<TermPtr, ParseError> {
    if self.depth >= MAX_NESTING {
      return Err(ParseError::TooDeep { limit: MAX_NESTING, offset: self.offset() })
    }
    self.depth += 1;
    let term = self.application();
    self.depth -= 1;
    term
  }

  fn application(&mut self) -> Result<TermPtr, ParseError> {
    if self.peek() == Some(&Token::Lambda) {
      return self.lambda()
    }
    let mut fun = self.atom()?;
    loop {
      match self.peek() {
        Some(Token::Lambda) => {
          let arg = self.lambda()?;
          return Ok(tapp(fun, arg, self.store))
        },
        Some(Token::Ident(_)) | Some(Token::Int(_)) | Some(Token::LParen) => {
          let arg = self.atom()?;
          fun = tapp(fun, arg, self.store);
        },
        _ => return Ok(fun),
      }
    }
  }

  fn lambda(&mut self) -> Result<TermPtr, ParseError> {
    match self.next() {
      Some((_, Token::Lambda)) => (),
      found => return Err(Self::unexpected(found, "a lambda")),
    }
    let mut binders = 0;
    loop {
      match self.next() {
        Some((_, Token::Ident(name))) => {
          self.scope.push(name);
          binders += 1;
        },
        Some((_, Token::Dot)) if binders > 0 => break,
        found => {
          self.scope.truncate(self.scope.len() - binders);
          return Err(Self::unexpected(found, "a binder name"))
        },
      }
    }
    let body = self.expr();
    self.scope.truncate(self.scope.len() - binders);
    let mut term = body?;
    for _ in 0..binders {
      term = tlam(term, self.store);
    }
    Ok(term)
  }

  fn atom(&mut self) -> Result<TermPtr, ParseError> {
    match self.next() {
      Some((offset, Token::Ident(name))) => self.resolve(name, offset),
      Some((_, Token::Int(num))) => Ok(tint(num, self.store)),
      Some((_, Token::LParen)) => {
        let term = self.expr()?;
        match self.next() {
          Some((_, Token::RParen)) => Ok(term),
          found => Err(Self::unexpected(found, "')'")),
        }
      },
      found => Err(Self::unexpected(found, "an expression")),
    }
  }

  fn resolve(&mut self, name: String, offset: usize) -> Result<TermPtr, ParseError> {
    if let Some(pos) = self.scope.iter().rposition(|bound| *bound == name) {
      let idx = self.scope.len() - 1 - pos;
      return Ok(tvar(idx, self.store))
    }
    if let Some(term) = builtin(&name, self.store) {
      return Ok(term)
    }
    match self.globals.get(&name) {
      Some(&def) => Ok(tref(def, self.store)),
      None => Err(ParseError::UnknownName { name, offset }),
    }
  }
}

/// Parses `src` into `store`, resolving free names against `globals`.
pub fn parse(src: &str, store: &mut Store, globals: &Globals) -> Result<TermPtr, ParseError> {
  Parser::new(src, store, globals)?.parse()
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  fn read(src: &str) -> (Store, Result<TermPtr, ParseError>) {
    let mut store = vec![];
    let globals = Globals::new();
    let out = parse(src, &mut store, &globals);
    (store, out)
  }

  #[test]
  fn tokenizes_both_lambda_spellings() {
    let tokens: Vec<Token> = tokenize("λx.x \\y. y 42 # trailing comment")
      .unwrap()
      .into_iter()
      .map(|(_, tok)| tok)
      .collect();
    assert_eq!(tokens, vec![
      Token::Lambda,
      Token::Ident("x".to_string()),
      Token::Dot,
      Token::Ident("x".to_string()),
      Token::Lambda,
      Token::Ident("y".to_string()),
      Token::Dot,
      Token::Ident("y".to_string()),
      Token::Int(42),
    ]);
  }

  #[test]
  fn identity_is_a_lambda_over_index_zero() {
    let (store, out) = read(r"\x. x");
    let term = out.unwrap();
    assert_eq!(store[term], Term::Lam(0));
    assert_eq!(store[0], Term::Var(0));
  }

  #[test]
  fn binders_get_indices_from_the_inside() {
    // \f x. f x
    let (store, out) = read(r"\f x. f x");
    let outer = out.unwrap();
    let inner = match store[outer] {
      Term::Lam(inner) => inner,
      other => panic!("expected a lambda, got {:?}", other),
    };
    let body = match store[inner] {
      Term::Lam(body) => body,
      other => panic!("expected a lambda, got {:?}", other),
    };
    match store[body] {
      Term::App(fun, arg) => {
        assert_eq!(store[fun], Term::Var(1));
        assert_eq!(store[arg], Term::Var(0));
      },
      other => panic!("expected an application, got {:?}", other),
    }
  }

  #[test]
  fn shadowing_picks_the_innermost_binder() {
    let (store, out) = read(r"\x. \x. x");
    let outer = out.unwrap();
    assert_eq!(store[outer], Term::Lam(outer - 1));
    assert_eq!(store[outer - 1], Term::Lam(outer - 2));
    assert_eq!(store[outer - 2], Term::Var(0));
  }

  #[test]
  fn application_associates_left_and_lambda_extends_right() {
    let mut store = vec![];
    let mut globals = Globals::new();
    let f = tint(0, &mut store);
    globals.insert("F".to_string(), f);
    let term = parse(r"F 1 \y. y", &mut store, &globals).unwrap();
    match store[term] {
      Term::App(fun, arg) => {
        assert!(matches!(store[arg], Term::Lam(_)));
        assert!(matches!(store[fun], Term::App(_, _)));
      },
      other => panic!("expected an application, got {:?}", other),
    }
  }

  #[test]
  fn builtins_and_globals_resolve() {
    let mut store = vec![];
    let mut globals = Globals::new();
    let id = parse(r"\x. x", &mut store, &globals).unwrap();
    globals.insert("ID".to_string(), id);
    let term = parse("ID TRUE", &mut store, &globals).unwrap();
    match store[term] {
      Term::App(fun, arg) => {
        assert_eq!(store[fun], Term::Ref(id));
        assert_eq!(store[arg], Term::Bool(true));
      },
      other => panic!("expected an application, got {:?}", other),
    }
  }

  #[test]
  fn reports_unknown_names() {
    let (_, out) = read(r"\x. y");
    assert_eq!(out, Err(ParseError::UnknownName { name: "y".to_string(), offset: 4 }));
  }

  #[test]
  fn reports_unbalanced_parentheses() {
    let (_, out) = read(r"(\x. x");
    assert_eq!(out, Err(ParseError::UnexpectedEnd { expected: "')'" }));
  }

  #[test]
  fn reports_trailing_input() {
    let (_, out) = read(r"(\x. x))");
    assert_eq!(out, Err(ParseError::UnexpectedToken {
      found: "')'".to_string(),
      expected: "end of input",
      offset: 7,
    }));
  }

  #[test]
  fn rejects_lambdas_without_binders() {
    let (_, out) = read(r"\. x");
    assert_eq!(out, Err(ParseError::UnexpectedToken {
      found: "'.'".to_string(),
      expected: "a binder name",
      offset: 1,
    }));
  }

  #[test]
  fn bounds_nested_parentheses() {
    let src = format!("{}x{}", "(".repeat(100_000), ")".repeat(100_000));
    let (_, out) = read(&src);
    assert_eq!(out, Err(ParseError::TooDeep { limit: MAX_NESTING, offset: MAX_NESTING }));

    let src = format!("{}x{}", "(".repeat(100), ")".repeat(100));
    let (store, out) = read(&src);
    assert_eq!(out, Err(ParseError::UnknownName { name: "x".to_string(), offset: 100 }));
    assert!(store.is_empty());
  }

  #[test]
  fn bounds_nested_lambda_bodies() {
    let src = format!("{}x", r"\x. ".repeat(10_000));
    let (_, out) = read(&src);
    assert_eq!(out, Err(ParseError::TooDeep { limit: MAX_NESTING, offset: 4 * MAX_NESTING }));

    let src = format!("{}x", r"\x. ".repeat(200));
    let (store, out) = read(&src);
    assert!(out.is_ok());
    assert_eq!(store.len(), 201);
  }

  #[test]
  fn rejects_oversized_integers() {
    let (_, out) = read("99999999999999999999");
    assert_eq!(out, Err(ParseError::InvalidInteger {
      literal: "99999999999999999999".to_string(),
      offset: 0,
    }));
  }
}
