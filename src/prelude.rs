//! Standard definitions, written in lambda notation.
//!
//! Booleans, the empty list and the pair primitives are builtins of the
//! machine; everything here is built from them and from plain abstraction
//! and application. Recursive definitions go through `Z`, the fixed-point
//! combinator for strict evaluation. A branch that recurses is wrapped in a
//! thunk `\_. e` and the selected thunk is forced with `ID`, so the branch
//! not taken is never unfolded.

use tracing::trace;
use crate::error::ParseError;
use crate::parse::{self, Globals};
use crate::term::{Store, TermPtr};

/// Handles to every prelude definition.
#[derive(Debug, Clone, Copy)]
pub struct Prelude {
  pub id: TermPtr,
  pub not: TermPtr,
  pub and: TermPtr,
  pub or: TermPtr,

  pub zero: TermPtr,
  pub one: TermPtr,
  pub two: TermPtr,
  pub three: TermPtr,
  pub four: TermPtr,
  pub succ: TermPtr,
  pub add: TermPtr,
  pub mult: TermPtr,
  pub exp: TermPtr,
  pub pred: TermPtr,
  pub sub: TermPtr,
  pub is_zero: TermPtr,
  pub leq: TermPtr,
  pub eq: TermPtr,

  pub z: TermPtr,
  pub modulo: TermPtr,
  pub fact: TermPtr,
  pub fib: TermPtr,
  pub is_even: TermPtr,

  pub map: TermPtr,
  pub filter: TermPtr,
  pub reduce: TermPtr,

  pub to_int: TermPtr,
}

/// Parses `src` and registers it under `name`.
pub fn define(store: &mut Store, globals: &mut Globals, name: &str, src: &str) -> Result<TermPtr, ParseError> {
  if parse::is_builtin(name) || globals.contains_key(name) {
    return Err(ParseError::Redefinition { name: name.to_string() })
  }
  let term = parse::parse(src, store, globals)?;
  trace!(name, term, "defined");
  globals.insert(name.to_string(), term);
  Ok(term)
}

impl Prelude {
  pub fn load(store: &mut Store, globals: &mut Globals) -> Result<Self, ParseError> {
    let mut def = |name: &str, src: &str| define(store, globals, name, src);

    let id = def("ID", r"\x. x")?;
    let not = def("NOT", r"\b. b FALSE TRUE")?;
    let and = def("AND", r"\a b. a b FALSE")?;
    let or = def("OR", r"\a b. a TRUE b")?;

    let zero = def("ZERO", r"\f x. x")?;
    let one = def("ONE", r"\f x. f x")?;
    let two = def("TWO", r"\f x. f (f x)")?;
    let three = def("THREE", r"\f x. f (f (f x))")?;
    let four = def("FOUR", r"\f x. f (f (f (f x)))")?;
    let succ = def("SUCC", r"\n f x. f (n f x)")?;
    let add = def("ADD", r"\n k f x. n f (k f x)")?;
    let mult = def("MULT", r"\n k f x. n (k f) x")?;
    let exp = def("EXP", r"\n k. k n")?;
    let pred = def("PRED", r"\n f x. n (\g h. h (g f)) (\u. x) (\u. u)")?;
    let sub = def("SUB", r"\n k. k PRED n")?;
    let is_zero = def("IS_ZERO", r"\n. n (\x. FALSE) TRUE")?;
    let leq = def("LEQ", r"\n k. IS_ZERO (SUB n k)")?;
    let eq = def("EQ", r"\n k. AND (LEQ n k) (LEQ k n)")?;

    // the inner self-application stays behind \v so it only unfolds when called
    let z = def("Z", r"\f. (\x. f (\v. x x v)) (\x. f (\v. x x v))")?;
    let modulo = def("MOD", r"
      Z (\r m n.
        LEQ n m
          (\_. r (SUB m n) n)
          (\_. m)
          ID)")?;
    let fact = def("FACT", r"
      Z (\r n.
        IS_ZERO n
          (\_. ONE)
          (\_. MULT n (r (PRED n)))
          ID)")?;
    let fib = def("FIB", r"
      Z (\r n.
        LEQ n ONE
          (\_. n)
          (\_. ADD (r (PRED n)) (r (SUB n TWO)))
          ID)")?;
    let is_even = def("IS_EVEN", r"\n. IS_ZERO (MOD n TWO)")?;

    let map = def("MAP", r"
      Z (\r l m.
        IS_NIL l
          (\_. NIL)
          (\_. CONS (m (HEAD l)) (r (TAIL l) m))
          ID)")?;
    let filter = def("FILTER", r"
      Z (\r l p.
        IS_NIL l
          (\_. NIL)
          (\_. p (HEAD l)
            (\_. CONS (HEAD l) (r (TAIL l) p))
            (\_. r (TAIL l) p)
            ID)
          ID)")?;
    let reduce = def("REDUCE", r"
      Z (\r l m acc.
        IS_NIL l
          (\_. acc)
          (\_. r (TAIL l) m (m acc (HEAD l)))
          ID)")?;

    let to_int = def("TO_INT", r"\n. n (\x. INT_ADD x 1) 0")?;

    Ok(Prelude {
      id, not, and, or,
      zero, one, two, three, four,
      succ, add, mult, exp, pred, sub, is_zero, leq, eq,
      z, modulo, fact, fib, is_even,
      map, filter, reduce,
      to_int,
    })
  }
}
