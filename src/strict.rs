use std::{
  mem,
  vec::Vec,
  boxed::Box,
};
use tailcall::trampoline;
use im::Vector;
use tracing::{debug, trace, warn};
use crate::config::EvalConfig;
use crate::error::{EvalError, EvalResult};
use crate::term::*;

/// Runtime values of the call-by-value machine.
///
/// Numerals are ordinary closures. Booleans and list cells are tagged, but
/// still behave as selectors when applied: `Bool(true) a b = a`,
/// `Bool(false) a b = b` and `Cons(h, t) s = s h t`.
#[derive(Debug, Clone)]
pub enum Value {
  VLam(TermPtr, Env),
  Int(i64),
  Bool(bool),
  // boolean waiting for its second argument
  Sel(bool, ValuePtr),
  Nil,
  Cons(ValuePtr, ValuePtr),
  Papp(Opr, Args),
}

impl Value {
  pub fn kind(&self) -> &'static str {
    match self {
      Value::VLam(..) => "a function",
      Value::Int(_) => "an integer",
      Value::Bool(_) => "a boolean",
      Value::Sel(..) => "a partially applied boolean",
      Value::Nil => "the empty list",
      Value::Cons(..) => "a pair",
      Value::Papp(..) => "a partially applied primitive",
    }
  }
}

pub type Env = Vector<ValuePtr>;
pub type Args = Vec<ValuePtr>;

pub type Heap = Vec<Value>;
pub type ValuePtr = u32;

pub type Continuation = Option<Box<Node>>;

pub struct Node {
  term: TermPtr,
  env: Env,
  args: Args,
  cont: Continuation,
}

impl Drop for Node {
  // unlink the chain one frame at a time instead of recursing
  fn drop(&mut self) {
    let mut next = self.cont.take();
    while let Some(mut node) = next {
      next = node.cont.take();
    }
  }
}

pub struct Machine<'a> {
  store: &'a Store,
  heap: &'a mut Heap,
  config: EvalConfig,
  depth: usize,
  steps: u64,
}

pub type State<'a> = (Machine<'a>, TermPtr, Env, Args, Continuation);
pub type Step<'a> = trampoline::Next<State<'a>, EvalResult<ValuePtr>>;

impl<'a> Machine<'a> {
  pub fn new(store: &'a Store, heap: &'a mut Heap, config: EvalConfig) -> Self {
    Machine { store, heap, config, depth: 0, steps: 0 }
  }

  #[inline(always)]
  fn alloc(&mut self, val: Value) -> ValuePtr {
    self.heap.push(val);
    (self.heap.len()-1) as ValuePtr
  }

  #[inline(always)]
  fn tick(&mut self) -> EvalResult<()> {
    self.steps += 1;
    if self.steps > self.config.max_steps {
      return Err(EvalError::StepLimitExceeded { limit: self.config.max_steps })
    }
    Ok(())
  }

  #[inline(always)]
  fn push(&mut self, term: TermPtr, env: Env, args: Args, cont: Continuation) -> EvalResult<Continuation> {
    if self.depth >= self.config.max_depth {
      return Err(EvalError::DepthExceeded { limit: self.config.max_depth })
    }
    self.depth += 1;
    Ok(Some(Box::new(Node { term, env, args, cont })))
  }
}

fn abort<'a>(m: &Machine<'a>, err: EvalError) -> Step<'a> {
  match err {
    EvalError::DepthExceeded { .. } | EvalError::StepLimitExceeded { .. } => {
      warn!(steps = m.steps, depth = m.depth, %err, "evaluation aborted")
    },
    _ => debug!(steps = m.steps, depth = m.depth, %err, "evaluation failed"),
  }
  trampoline::Finish(Err(err))
}

#[inline(always)]
fn cont_or_ret<'a>(mut m: Machine<'a>, val: ValuePtr, cont: Continuation) -> Step<'a> {
  match cont {
    None => {
      trace!(steps = m.steps, heap = m.heap.len(), "evaluation finished");
      trampoline::Finish(Ok(val))
    },
    Some(mut ctx) => {
      m.depth -= 1;
      let mut args = mem::take(&mut ctx.args);
      args.push(val);
      let env = mem::take(&mut ctx.env);
      let cont = ctx.cont.take();
      trampoline::Recurse((m, ctx.term, env, args, cont))
    },
  }
}

fn int_arg(m: &Machine, val: ValuePtr) -> EvalResult<i64> {
  match m.heap[val as usize] {
    Value::Int(num) => Ok(num),
    ref other => Err(EvalError::TypeMismatch { opr: "INT_ADD", found: other.kind() }),
  }
}

fn fire(m: &mut Machine, opr: Opr, args: &[ValuePtr]) -> EvalResult<ValuePtr> {
  match opr {
    Opr::Add => {
      let a = int_arg(m, args[0])?;
      let b = int_arg(m, args[1])?;
      let sum = a.checked_add(b).ok_or(EvalError::IntegerOverflow)?;
      Ok(m.alloc(Value::Int(sum)))
    },
    Opr::Pair => Ok(m.alloc(Value::Cons(args[0], args[1]))),
    Opr::First => match m.heap[args[0] as usize] {
      Value::Cons(head, _) => Ok(head),
      ref other => Err(EvalError::NotAPair { found: other.kind() }),
    },
    Opr::Second => match m.heap[args[0] as usize] {
      Value::Cons(_, tail) => Ok(tail),
      ref other => Err(EvalError::NotAPair { found: other.kind() }),
    },
    Opr::IsNil => {
      let empty = match m.heap[args[0] as usize] {
        Value::Nil => true,
        Value::Cons(..) => false,
        ref other => return Err(EvalError::NotAList { found: other.kind() }),
      };
      Ok(m.alloc(Value::Bool(empty)))
    },
  }
}

/// Applies the value `fun` to the argument stack, top of the stack first.
fn apply<'a>(mut m: Machine<'a>, mut fun: ValuePtr, mut args: Args, cont: Continuation) -> Step<'a> {
  loop {
    let arg = match args.pop() {
      Some(arg) => arg,
      None => return cont_or_ret(m, fun, cont),
    };
    if let Err(err) = m.tick() {
      return abort(&m, err)
    }
    let callee = m.heap[fun as usize].clone();
    fun = match callee {
      Value::VLam(bod, mut env) => {
        env.push_front(arg);
        return trampoline::Recurse((m, bod, env, args, cont))
      },
      Value::Bool(b) => match args.pop() {
        Some(other) => if b { arg } else { other },
        None => m.alloc(Value::Sel(b, arg)),
      },
      Value::Sel(b, first) => if b { first } else { arg },
      Value::Cons(head, tail) => {
        args.push(tail);
        args.push(head);
        arg
      },
      Value::Papp(opr, mut p_args) => {
        p_args.push(arg);
        if p_args.len() < opr_arity(opr) {
          m.alloc(Value::Papp(opr, p_args))
        }
        else {
          match fire(&mut m, opr, &p_args) {
            Ok(val) => val,
            Err(err) => return abort(&m, err),
          }
        }
      },
      other @ (Value::Int(_) | Value::Nil) => {
        return abort(&m, EvalError::NotAFunction { found: other.kind() })
      },
    };
  }
}

pub fn eval_step<'a>(
  (mut m, term, mut env, mut args, cont): State<'a>
) -> Step<'a> {
  if let Err(err) = m.tick() {
    return abort(&m, err)
  }
  let store = m.store;
  match store[term] {
    Term::App(fun, arg) => {
      match m.push(fun, env.clone(), args, cont) {
        Ok(cont) => trampoline::Recurse((m, arg, env, vec![], cont)),
        Err(err) => abort(&m, err),
      }
    },
    Term::Lam(bod) => {
      match args.pop() {
        Some(arg) => {
          env.push_front(arg);
          trampoline::Recurse((m, bod, env, args, cont))
        },
        None => {
          let val = m.alloc(Value::VLam(bod, env));
          cont_or_ret(m, val, cont)
        },
      }
    },
    Term::Var(idx) => {
      match env.get(idx) {
        Some(&val) => apply(m, val, args, cont),
        None => abort(&m, EvalError::UnboundVariable(idx)),
      }
    },
    Term::Ref(def) => {
      trampoline::Recurse((m, def, Vector::new(), args, cont))
    },
    Term::Opr(opr) => {
      let val = m.alloc(Value::Papp(opr, vec![]));
      apply(m, val, args, cont)
    },
    Term::Int(num) => {
      let val = m.alloc(Value::Int(num));
      apply(m, val, args, cont)
    },
    Term::Bool(b) => {
      let val = m.alloc(Value::Bool(b));
      apply(m, val, args, cont)
    },
    Term::Nil => {
      let val = m.alloc(Value::Nil);
      apply(m, val, args, cont)
    },
  }
}

/// Evaluates the closed term `term` applied to `args`, given in application order.
pub fn eval(store: &Store, heap: &mut Heap, config: EvalConfig, term: TermPtr, args: &[ValuePtr]) -> EvalResult<ValuePtr> {
  let args: Args = args.iter().rev().copied().collect();
  let m = Machine::new(store, heap, config);
  trampoline::run(eval_step, (m, term, Vector::new(), args, None))
}

/// Applies an already evaluated value to `args`, given in application order.
pub fn call(store: &Store, heap: &mut Heap, config: EvalConfig, fun: ValuePtr, args: &[ValuePtr]) -> EvalResult<ValuePtr> {
  let args: Args = args.iter().rev().copied().collect();
  let m = Machine::new(store, heap, config);
  match apply(m, fun, args, None) {
    trampoline::Finish(out) => out,
    trampoline::Recurse(state) => trampoline::run(eval_step, state),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn run(store: &Store, term: TermPtr, config: EvalConfig) -> (Heap, EvalResult<ValuePtr>) {
    let mut heap = vec![];
    let out = eval(store, &mut heap, config, term, &[]);
    (heap, out)
  }

  fn int_of(heap: &Heap, val: ValuePtr) -> i64 {
    match heap[val as usize] {
      Value::Int(num) => num,
      ref other => panic!("expected an integer, got {:?}", other),
    }
  }

  #[test]
  fn applies_identity() {
    let mut store = vec![];
    let x = tvar(0, &mut store);
    let id = tlam(x, &mut store);
    let seven = tint(7, &mut store);
    let main = tapp(id, seven, &mut store);
    let (heap, out) = run(&store, main, EvalConfig::default());
    assert_eq!(int_of(&heap, out.unwrap()), 7);
  }

  #[test]
  fn de_bruijn_indices_count_outwards() {
    let mut store = vec![];
    // \a b. a
    let a = tvar(1, &mut store);
    let k = tlam(a, &mut store);
    let k = tlam(k, &mut store);
    let one = tint(1, &mut store);
    let two = tint(2, &mut store);
    let main = tapps(k, &[one, two], &mut store);
    let (heap, out) = run(&store, main, EvalConfig::default());
    assert_eq!(int_of(&heap, out.unwrap()), 1);
  }

  #[test]
  fn booleans_select_one_argument() {
    let mut store = vec![];
    let one = tint(1, &mut store);
    let two = tint(2, &mut store);
    let f = tbool(false, &mut store);
    let main = tapps(f, &[one, two], &mut store);
    let (heap, out) = run(&store, main, EvalConfig::default());
    assert_eq!(int_of(&heap, out.unwrap()), 2);

    // one argument at a time
    let t = tbool(true, &mut store);
    let partial = tapp(t, one, &mut store);
    let mut heap = vec![];
    let config = EvalConfig::default();
    let sel = eval(&store, &mut heap, config, partial, &[]).unwrap();
    assert!(matches!(heap[sel as usize], Value::Sel(true, _)));
    let arg = eval(&store, &mut heap, config, two, &[]).unwrap();
    let out = call(&store, &mut heap, config, sel, &[arg]).unwrap();
    assert_eq!(int_of(&heap, out), 1);
  }

  #[test]
  fn pairs_feed_their_components_to_a_selector() {
    let mut store = vec![];
    let pair = topr(Opr::Pair, &mut store);
    let one = tint(1, &mut store);
    let two = tint(2, &mut store);
    let cell = tapps(pair, &[one, two], &mut store);
    let snd = tvar(0, &mut store);
    let snd = tlam(snd, &mut store);
    let snd = tlam(snd, &mut store);
    let main = tapp(cell, snd, &mut store);
    let (heap, out) = run(&store, main, EvalConfig::default());
    assert_eq!(int_of(&heap, out.unwrap()), 2);

    let first = topr(Opr::First, &mut store);
    let main = tapp(first, cell, &mut store);
    let (heap, out) = run(&store, main, EvalConfig::default());
    assert_eq!(int_of(&heap, out.unwrap()), 1);
  }

  #[test]
  fn projecting_the_empty_list_fails_fast() {
    let mut store = vec![];
    let first = topr(Opr::First, &mut store);
    let nil = tnil(&mut store);
    let main = tapp(first, nil, &mut store);
    let (_, out) = run(&store, main, EvalConfig::default());
    assert_eq!(out, Err(EvalError::NotAPair { found: "the empty list" }));
  }

  #[test]
  fn integers_are_not_functions() {
    let mut store = vec![];
    let one = tint(1, &mut store);
    let main = tapp(one, one, &mut store);
    let (_, out) = run(&store, main, EvalConfig::default());
    assert_eq!(out, Err(EvalError::NotAFunction { found: "an integer" }));
  }

  #[test]
  fn int_add_rejects_non_integers() {
    let mut store = vec![];
    let add = topr(Opr::Add, &mut store);
    let one = tint(1, &mut store);
    let nil = tnil(&mut store);
    let main = tapps(add, &[one, nil], &mut store);
    let (_, out) = run(&store, main, EvalConfig::default());
    assert_eq!(out, Err(EvalError::TypeMismatch { opr: "INT_ADD", found: "the empty list" }));
  }

  #[test]
  fn omega_runs_out_of_steps() {
    let mut store = vec![];
    let x = tvar(0, &mut store);
    let xx = tapp(x, x, &mut store);
    let omega = tlam(xx, &mut store);
    let main = tapp(omega, omega, &mut store);
    let config = EvalConfig::default().with_max_steps(10_000);
    let (_, out) = run(&store, main, config);
    assert_eq!(out, Err(EvalError::StepLimitExceeded { limit: 10_000 }));
  }

  fn nested_sum(depth: usize, store: &mut Store) -> TermPtr {
    let add = topr(Opr::Add, store);
    let one = tint(1, store);
    let inc = tapp(add, one, store);
    let mut term = tint(0, store);
    for _ in 0..depth {
      term = tapp(inc, term, store);
    }
    term
  }

  #[test]
  fn nested_arguments_hit_the_depth_limit() {
    let mut store = vec![];
    let main = nested_sum(50, &mut store);
    let (heap, out) = run(&store, main, EvalConfig::default());
    assert_eq!(int_of(&heap, out.unwrap()), 50);

    let config = EvalConfig::default().with_max_depth(10);
    let (_, out) = run(&store, main, config);
    assert_eq!(out, Err(EvalError::DepthExceeded { limit: 10 }));
  }

  #[test]
  fn deep_continuations_are_dropped_without_recursion() {
    let mut store = vec![];
    let main = nested_sum(120_000, &mut store);
    let config = EvalConfig::default().with_max_depth(100_000);
    let (_, out) = run(&store, main, config);
    assert_eq!(out, Err(EvalError::DepthExceeded { limit: 100_000 }));
  }

  #[test]
  fn call_applies_an_evaluated_closure() {
    let mut store = vec![];
    let add = topr(Opr::Add, &mut store);
    let x = tvar(0, &mut store);
    let ten = tint(10, &mut store);
    let body = tapps(add, &[x, ten], &mut store);
    let plus_ten = tlam(body, &mut store);
    let five = tint(5, &mut store);

    let mut heap = vec![];
    let config = EvalConfig::default();
    let fun = eval(&store, &mut heap, config, plus_ten, &[]).unwrap();
    let arg = eval(&store, &mut heap, config, five, &[]).unwrap();
    let out = call(&store, &mut heap, config, fun, &[arg]).unwrap();
    assert_eq!(int_of(&heap, out), 15);
  }
}
