#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Term {
  Var(EnvPtr),
  Lam(TermPtr),
  App(TermPtr, TermPtr),
  Ref(TermPtr),
  Opr(Opr),
  Int(i64),
  Bool(bool),
  Nil,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opr {
  Add,
  Pair,
  First,
  Second,
  IsNil,
}

#[inline(always)]
pub fn opr_arity(opr: Opr) -> usize {
  match opr {
    Opr::Add => 2,
    Opr::Pair => 2,
    Opr::First => 1,
    Opr::Second => 1,
    Opr::IsNil => 1,
  }
}

pub type TermPtr = usize;
pub type EnvPtr = usize;
pub type Store = Vec<Term>;

#[inline(always)]
pub fn tvar(idx: EnvPtr, store: &mut Store) -> TermPtr {
  store.push(Term::Var(idx));
  store.len()-1
}
#[inline(always)]
pub fn tlam(bod: TermPtr, store: &mut Store) -> TermPtr {
  store.push(Term::Lam(bod));
  store.len()-1
}
#[inline(always)]
pub fn tapp(fun: TermPtr, arg: TermPtr, store: &mut Store) -> TermPtr {
  store.push(Term::App(fun, arg));
  store.len()-1
}
#[inline(always)]
pub fn tref(idx: TermPtr, store: &mut Store) -> TermPtr {
  store.push(Term::Ref(idx));
  store.len()-1
}
#[inline(always)]
pub fn topr(opr: Opr, store: &mut Store) -> TermPtr {
  store.push(Term::Opr(opr));
  store.len()-1
}
#[inline(always)]
pub fn tint(num: i64, store: &mut Store) -> TermPtr {
  store.push(Term::Int(num));
  store.len()-1
}
#[inline(always)]
pub fn tbool(b: bool, store: &mut Store) -> TermPtr {
  store.push(Term::Bool(b));
  store.len()-1
}
#[inline(always)]
pub fn tnil(store: &mut Store) -> TermPtr {
  store.push(Term::Nil);
  store.len()-1
}

/// Left-nested application of `fun` to every element of `args`.
pub fn tapps(fun: TermPtr, args: &[TermPtr], store: &mut Store) -> TermPtr {
  args.iter().fold(fun, |acc, &arg| tapp(acc, arg, store))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn builders_return_the_pushed_index() {
    let mut store = vec![];
    let x = tvar(0, &mut store);
    let id = tlam(x, &mut store);
    let five = tint(5, &mut store);
    let app = tapp(id, five, &mut store);
    assert_eq!(app, 3);
    assert_eq!(store[app], Term::App(id, five));
    assert_eq!(store[id], Term::Lam(x));
  }

  #[test]
  fn tapps_nests_to_the_left() {
    let mut store = vec![];
    let f = topr(Opr::Pair, &mut store);
    let a = tint(1, &mut store);
    let b = tnil(&mut store);
    let app = tapps(f, &[a, b], &mut store);
    match store[app] {
      Term::App(inner, arg) => {
        assert_eq!(arg, b);
        assert_eq!(store[inner], Term::App(f, a));
      }
      other => panic!("expected an application, got {:?}", other),
    }
  }

  #[test]
  fn primitive_arities() {
    assert_eq!(opr_arity(Opr::Add), 2);
    assert_eq!(opr_arity(Opr::Pair), 2);
    assert_eq!(opr_arity(Opr::First), 1);
    assert_eq!(opr_arity(Opr::IsNil), 1);
  }
}
