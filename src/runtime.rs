use tracing::debug;
use crate::config::EvalConfig;
use crate::error::{EvalError, EvalResult, ParseError};
use crate::parse::{self, Globals};
use crate::prelude::{self, Prelude};
use crate::strict::{self, Heap, Value, ValuePtr};
use crate::term::*;

/// Owns the term arena, the value heap and the prelude.
///
/// Operations only build terms; nothing is reduced until one of the
/// `eval`/`decode_*` methods is called.
pub struct Runtime {
  store: Store,
  heap: Heap,
  globals: Globals,
  prelude: Prelude,
  config: EvalConfig,
  lit_true: TermPtr,
  lit_false: TermPtr,
  to_int: TermPtr,
}

impl Runtime {
  pub fn new(config: EvalConfig) -> Result<Self, ParseError> {
    let mut store = vec![];
    let mut globals = Globals::new();
    let prelude = Prelude::load(&mut store, &mut globals)?;
    let lit_true = tint(1, &mut store);
    let lit_false = tint(0, &mut store);
    let to_int = tref(prelude.to_int, &mut store);
    debug!(definitions = globals.len(), terms = store.len(), "prelude loaded");
    Ok(Runtime {
      store,
      heap: vec![],
      globals,
      prelude,
      config,
      lit_true,
      lit_false,
      to_int,
    })
  }

  pub fn config(&self) -> EvalConfig {
    self.config
  }

  pub fn set_config(&mut self, config: EvalConfig) {
    self.config = config;
  }

  pub fn prelude(&self) -> &Prelude {
    &self.prelude
  }

  /// Looks up a global definition by name.
  pub fn global(&self, name: &str) -> EvalResult<TermPtr> {
    self.globals
      .get(name)
      .copied()
      .ok_or_else(|| EvalError::UnknownDefinition(name.to_string()))
  }

  pub fn define(&mut self, name: &str, src: &str) -> Result<TermPtr, ParseError> {
    prelude::define(&mut self.store, &mut self.globals, name, src)
  }

  /// Parses an expression against the prelude and the user definitions.
  pub fn parse(&mut self, src: &str) -> Result<TermPtr, ParseError> {
    parse::parse(src, &mut self.store, &self.globals)
  }

  pub fn apply(&mut self, fun: TermPtr, args: &[TermPtr]) -> TermPtr {
    tapps(fun, args, &mut self.store)
  }

  fn call(&mut self, def: TermPtr, args: &[TermPtr]) -> TermPtr {
    let fun = tref(def, &mut self.store);
    tapps(fun, args, &mut self.store)
  }

  fn opr(&mut self, opr: Opr, args: &[TermPtr]) -> TermPtr {
    let fun = topr(opr, &mut self.store);
    tapps(fun, args, &mut self.store)
  }

  // Booleans

  pub fn boolean(&mut self, b: bool) -> TermPtr {
    tbool(b, &mut self.store)
  }

  /// `cond on_true on_false`
  pub fn select(&mut self, cond: TermPtr, on_true: TermPtr, on_false: TermPtr) -> TermPtr {
    self.apply(cond, &[on_true, on_false])
  }

  pub fn not(&mut self, b: TermPtr) -> TermPtr {
    self.call(self.prelude.not, &[b])
  }

  pub fn and(&mut self, a: TermPtr, b: TermPtr) -> TermPtr {
    self.call(self.prelude.and, &[a, b])
  }

  pub fn or(&mut self, a: TermPtr, b: TermPtr) -> TermPtr {
    self.call(self.prelude.or, &[a, b])
  }

  // Numerals

  /// Builds `n` by applying `SUCC` to `ZERO` n times.
  pub fn encode_numeral(&mut self, n: u64) -> TermPtr {
    let mut term = tref(self.prelude.zero, &mut self.store);
    for _ in 0..n {
      term = self.successor(term);
    }
    term
  }

  pub fn numeral(&mut self, n: u64) -> TermPtr {
    self.encode_numeral(n)
  }

  pub fn successor(&mut self, n: TermPtr) -> TermPtr {
    self.call(self.prelude.succ, &[n])
  }

  /// Saturates at zero.
  pub fn predecessor(&mut self, n: TermPtr) -> TermPtr {
    self.call(self.prelude.pred, &[n])
  }

  pub fn add(&mut self, n: TermPtr, k: TermPtr) -> TermPtr {
    self.call(self.prelude.add, &[n, k])
  }

  /// `max(n - k, 0)`
  pub fn subtract(&mut self, n: TermPtr, k: TermPtr) -> TermPtr {
    self.call(self.prelude.sub, &[n, k])
  }

  pub fn multiply(&mut self, n: TermPtr, k: TermPtr) -> TermPtr {
    self.call(self.prelude.mult, &[n, k])
  }

  pub fn exponentiate(&mut self, n: TermPtr, k: TermPtr) -> TermPtr {
    self.call(self.prelude.exp, &[n, k])
  }

  pub fn is_zero(&mut self, n: TermPtr) -> TermPtr {
    self.call(self.prelude.is_zero, &[n])
  }

  pub fn less_or_equal(&mut self, n: TermPtr, k: TermPtr) -> TermPtr {
    self.call(self.prelude.leq, &[n, k])
  }

  pub fn equal(&mut self, n: TermPtr, k: TermPtr) -> TermPtr {
    self.call(self.prelude.eq, &[n, k])
  }

  /// Repeated subtraction; diverges (and hits the step limit) for `k = 0`.
  pub fn modulo(&mut self, n: TermPtr, k: TermPtr) -> TermPtr {
    self.call(self.prelude.modulo, &[n, k])
  }

  // Recursion

  /// `Z step`, where `step` takes the recursive call as its first argument.
  pub fn fix(&mut self, step: TermPtr) -> TermPtr {
    self.call(self.prelude.z, &[step])
  }

  pub fn factorial(&mut self, n: TermPtr) -> TermPtr {
    self.call(self.prelude.fact, &[n])
  }

  pub fn fibonacci(&mut self, n: TermPtr) -> TermPtr {
    self.call(self.prelude.fib, &[n])
  }

  pub fn is_even(&mut self, n: TermPtr) -> TermPtr {
    self.call(self.prelude.is_even, &[n])
  }

  // Pairs and lists

  pub fn nil(&mut self) -> TermPtr {
    tnil(&mut self.store)
  }

  pub fn pair(&mut self, head: TermPtr, tail: TermPtr) -> TermPtr {
    self.opr(Opr::Pair, &[head, tail])
  }

  pub fn cons(&mut self, head: TermPtr, tail: TermPtr) -> TermPtr {
    self.pair(head, tail)
  }

  pub fn first(&mut self, pair: TermPtr) -> TermPtr {
    self.opr(Opr::First, &[pair])
  }

  pub fn head(&mut self, list: TermPtr) -> TermPtr {
    self.first(list)
  }

  pub fn second(&mut self, pair: TermPtr) -> TermPtr {
    self.opr(Opr::Second, &[pair])
  }

  pub fn tail(&mut self, list: TermPtr) -> TermPtr {
    self.second(list)
  }

  pub fn is_empty(&mut self, list: TermPtr) -> TermPtr {
    self.opr(Opr::IsNil, &[list])
  }

  pub fn encode_list(&mut self, items: &[u64]) -> TermPtr {
    let mut list = self.nil();
    for &item in items.iter().rev() {
      let head = self.encode_numeral(item);
      list = self.cons(head, list);
    }
    list
  }

  pub fn map_list(&mut self, list: TermPtr, f: TermPtr) -> TermPtr {
    self.call(self.prelude.map, &[list, f])
  }

  pub fn filter_list(&mut self, list: TermPtr, predicate: TermPtr) -> TermPtr {
    self.call(self.prelude.filter, &[list, predicate])
  }

  /// Left fold: `combiner` receives the accumulator first.
  pub fn reduce_list(&mut self, list: TermPtr, combiner: TermPtr, acc: TermPtr) -> TermPtr {
    self.call(self.prelude.reduce, &[list, combiner, acc])
  }

  // Evaluation boundary

  /// Number of terms in the arena.
  pub fn terms(&self) -> usize {
    self.store.len()
  }

  /// Evaluates `term` on an empty heap. The returned pointer is valid until
  /// the next `eval` or `decode_*` call.
  pub fn eval(&mut self, term: TermPtr) -> EvalResult<ValuePtr> {
    self.heap.clear();
    self.run(term)
  }

  /// Looks up a value produced by the last evaluation.
  pub fn value(&self, val: ValuePtr) -> Option<&Value> {
    self.heap.get(val as usize)
  }

  fn run(&mut self, term: TermPtr) -> EvalResult<ValuePtr> {
    strict::eval(&self.store, &mut self.heap, self.config, term, &[])
  }

  fn run_call(&mut self, fun: ValuePtr, args: &[ValuePtr]) -> EvalResult<ValuePtr> {
    strict::call(&self.store, &mut self.heap, self.config, fun, args)
  }

  fn kind(&self, val: ValuePtr) -> &'static str {
    self.heap[val as usize].kind()
  }

  fn expect_int(&self, val: ValuePtr) -> Option<i64> {
    match self.heap[val as usize] {
      Value::Int(num) => Some(num),
      _ => None,
    }
  }

  fn to_u64(&mut self, decoder: ValuePtr, val: ValuePtr) -> EvalResult<u64> {
    let num = self.run_call(decoder, &[val])?;
    match self.expect_int(num) {
      Some(num) if num >= 0 => Ok(num as u64),
      _ => Err(EvalError::NotANumeral { found: self.kind(num) }),
    }
  }

  pub fn decode_numeral(&mut self, term: TermPtr) -> EvalResult<u64> {
    self.heap.clear();
    debug!(term, "decoding numeral");
    let decoder = self.run(self.to_int)?;
    let val = self.run(term)?;
    let num = self.to_u64(decoder, val)?;
    debug!(value = num, heap = self.heap.len(), "numeral decoded");
    Ok(num)
  }

  /// Applies the value of `term` to host `1` and `0`, so both tagged and
  /// lambda-encoded booleans decode. Data values and functions that do not
  /// select one of the two are rejected with `NotABoolean`.
  pub fn decode_boolean(&mut self, term: TermPtr) -> EvalResult<bool> {
    self.heap.clear();
    debug!(term, "decoding boolean");
    let val = self.run(term)?;
    match self.heap[val as usize] {
      Value::Bool(_) | Value::VLam(..) => (),
      ref other => return Err(EvalError::NotABoolean { found: other.kind() }),
    }
    let on_true = self.run(self.lit_true)?;
    let on_false = self.run(self.lit_false)?;
    let out = match self.run_call(val, &[on_true, on_false]) {
      Ok(out) => out,
      // the host literals were used as functions
      Err(EvalError::NotAFunction { .. }) => {
        return Err(EvalError::NotABoolean { found: self.kind(val) })
      },
      Err(err) => return Err(err),
    };
    let b = match self.expect_int(out) {
      Some(1) => true,
      Some(0) => false,
      _ => return Err(EvalError::NotABoolean { found: self.kind(out) }),
    };
    debug!(value = b, "boolean decoded");
    Ok(b)
  }

  /// Walks the list to its empty marker, decoding every element as a numeral.
  pub fn decode_list(&mut self, term: TermPtr) -> EvalResult<Vec<u64>> {
    self.heap.clear();
    debug!(term, "decoding list");
    let decoder = self.run(self.to_int)?;
    let mut cell = self.run(term)?;
    let mut items = vec![];
    loop {
      let (head, tail) = match self.heap[cell as usize] {
        Value::Nil => break,
        Value::Cons(head, tail) => (head, tail),
        ref other => return Err(EvalError::NotAList { found: other.kind() }),
      };
      items.push(self.to_u64(decoder, head)?);
      cell = tail;
    }
    debug!(len = items.len(), "list decoded");
    Ok(items)
  }
}
