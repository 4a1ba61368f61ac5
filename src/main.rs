use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use church::config::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_STEPS};
use church::{EvalConfig, Runtime, TermPtr};

#[derive(Parser)]
#[command(name = "church", version, about = "Evaluate Church-encoded lambda terms")]
struct Cli {
  /// Maximum number of pending continuation frames
  #[arg(long, global = true, env = "CHURCH_MAX_DEPTH", default_value_t = DEFAULT_MAX_DEPTH)]
  max_depth: usize,

  /// Maximum number of machine steps per evaluation
  #[arg(long, global = true, env = "CHURCH_MAX_STEPS", default_value_t = DEFAULT_MAX_STEPS)]
  max_steps: u64,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Run the fixed demonstration sequence
  Demo,
  /// Evaluate one expression against the prelude
  Eval {
    /// Expression in lambda notation, e.g. "FACT (SUCC THREE)"
    expr: String,

    /// How to decode the result
    #[arg(long = "as", value_enum, default_value_t = Decode::Number)]
    decode: Decode,
  },
}

#[derive(Clone, Copy, ValueEnum)]
enum Decode {
  Number,
  Bool,
  List,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  let config = EvalConfig::default()
    .with_max_depth(cli.max_depth)
    .with_max_steps(cli.max_steps);
  let mut rt = Runtime::new(config).context("loading the prelude")?;
  info!(max_depth = config.max_depth, max_steps = config.max_steps, "runtime ready");

  match cli.command.unwrap_or(Command::Demo) {
    Command::Demo => demo(&mut rt),
    Command::Eval { expr, decode } => {
      let term = rt.parse(&expr).with_context(|| format!("parsing {:?}", expr))?;
      match decode {
        Decode::Number => println!("{}", rt.decode_numeral(term)?),
        Decode::Bool => println!("{}", rt.decode_boolean(term)?),
        Decode::List => println!("{:?}", rt.decode_list(term)?),
      }
      Ok(())
    },
  }
}

fn show_bool(rt: &mut Runtime, label: &str, term: TermPtr) -> Result<()> {
  let b = rt.decode_boolean(term).with_context(|| label.to_string())?;
  println!("{} = {}", label, b);
  Ok(())
}

fn show_num(rt: &mut Runtime, label: &str, term: TermPtr) -> Result<()> {
  let n = rt.decode_numeral(term).with_context(|| label.to_string())?;
  println!("{} = {}", label, n);
  Ok(())
}

fn demo(rt: &mut Runtime) -> Result<()> {
  let t = rt.boolean(true);
  let f = rt.boolean(false);

  let not_t = rt.not(t);
  show_bool(rt, "NOT TRUE", not_t)?;
  let not_f = rt.not(f);
  show_bool(rt, "NOT FALSE", not_f)?;
  let and_tf = rt.and(t, f);
  show_bool(rt, "AND TRUE FALSE", and_tf)?;
  let or_tf = rt.or(t, f);
  show_bool(rt, "OR TRUE FALSE", or_tf)?;

  let p = *rt.prelude();
  for (name, def) in [("ZERO", p.zero), ("ONE", p.one), ("TWO", p.two), ("THREE", p.three), ("FOUR", p.four)] {
    show_num(rt, name, def)?;
  }

  let one = rt.numeral(1);
  let two = rt.numeral(2);
  let three = rt.numeral(3);
  let four = rt.numeral(4);

  let sum = rt.add(one, four);
  show_num(rt, "1 + 4", sum)?;
  let diff = rt.subtract(four, two);
  show_num(rt, "4 - 2", diff)?;
  let prod = rt.multiply(four, three);
  show_num(rt, "4 * 3", prod)?;
  let pow = rt.exponentiate(two, three);
  show_num(rt, "2 ^ 3", pow)?;

  let le = rt.less_or_equal(four, three);
  show_bool(rt, "4 <= 3", le)?;
  let le = rt.less_or_equal(three, four);
  show_bool(rt, "3 <= 4", le)?;
  let eq = rt.equal(four, four);
  show_bool(rt, "4 == 4", eq)?;

  let rem = rt.modulo(four, three);
  show_num(rt, "4 mod 3", rem)?;
  let fact = rt.factorial(four);
  show_num(rt, "4!", fact)?;
  let fib = rt.fibonacci(four);
  show_num(rt, "fib 4", fib)?;

  let list = rt.encode_list(&[1, 2, 3, 4]);
  let head = rt.head(list);
  show_num(rt, "head", head)?;
  let tail = rt.tail(list);
  let second = rt.head(tail);
  show_num(rt, "second element", second)?;
  let nil = rt.nil();
  let empty = rt.is_empty(nil);
  show_bool(rt, "NIL is empty", empty)?;
  let empty = rt.is_empty(list);
  show_bool(rt, "[1, 2, 3, 4] is empty", empty)?;

  let incremented = rt.map_list(list, p.succ);
  let first = rt.head(incremented);
  show_num(rt, "head of incremented list", first)?;

  let evens = rt.filter_list(list, p.is_even);
  let any_even = rt.is_empty(evens);
  if rt.decode_boolean(any_even)? {
    println!("first even = none");
  } else {
    let first = rt.head(evens);
    show_num(rt, "first even", first)?;
  }

  let zero = rt.numeral(0);
  let total = rt.reduce_list(list, p.add, zero);
  show_num(rt, "sum of list", total)?;
  Ok(())
}
