use std::time::{Duration, Instant};

use clap::Parser;
use log::info;

use sfa_rs::automaton::{Sfa, StateId, Transition};
use sfa_rs::budget::Budget;
use sfa_rs::equivalence::Verdict;
use sfa_rs::intervals::{CharAlgebra, CharPred};

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Position of the distinguished letter, counted from the end.
    #[arg(value_name = "INT", default_value = "6")]
    n: usize,

    /// Time budget per check, in milliseconds.
    #[clap(long, value_name = "MS", default_value = "10000")]
    timeout: u64,

    /// Make the second automaton differ from the first.
    #[clap(long)]
    distinct: bool,

    /// Log level.
    #[clap(long, value_name = "LEVEL", default_value = "info")]
    log: simplelog::LevelFilter,
}

/// Words over [a-z] whose n-th letter from the end is in `letter`.
///
/// This is the textbook family whose subset construction is exponential in `n`.
fn nth_from_end(n: usize, letter: CharPred, alg: &CharAlgebra) -> sfa_rs::error::Result<Sfa<CharPred>> {
    let mut transitions = vec![
        Transition::input(0, 0, CharPred::lower_alpha()),
        Transition::input(0, 1, letter),
    ];
    for i in 1..n as StateId {
        transitions.push(Transition::input(i, i + 1, CharPred::lower_alpha()));
    }
    Sfa::new(transitions, 0, [n as StateId], alg)
}

/// The same language, built from the union of one automaton per letter range.
fn nth_from_end_split(n: usize, ranges: &[(char, char)], alg: &CharAlgebra) -> sfa_rs::error::Result<Sfa<CharPred>> {
    let mut result = Sfa::empty(alg);
    for &(lo, hi) in ranges {
        let part = nth_from_end(n, CharPred::range(lo, hi), alg)?;
        result = result.union(&part, alg)?;
    }
    Ok(result)
}

fn report(name: &str, verdict: &sfa_rs::error::Result<Verdict<char>>, elapsed: Duration) {
    match verdict {
        Ok(Verdict::Equivalent) => println!("{:>6}: equivalent ({:?})", name, elapsed),
        Ok(Verdict::Distinct(Some(w))) => println!(
            "{:>6}: distinct, witness {:?} ({:?})",
            name,
            w.iter().collect::<String>(),
            elapsed
        ),
        Ok(Verdict::Distinct(None)) => println!("{:>6}: distinct ({:?})", name, elapsed),
        Err(e) => println!("{:>6}: {} ({:?})", name, e, elapsed),
    }
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Cli::parse();

    simplelog::TermLogger::init(
        args.log,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    println!("args = {:?}", args);

    let alg = CharAlgebra;
    let a = nth_from_end(args.n, CharPred::range('a', 'm'), &alg)?;
    let ranges: &[(char, char)] = if args.distinct {
        &[('a', 'f'), ('h', 'm')]
    } else {
        &[('a', 'f'), ('g', 'm')]
    };
    let b = nth_from_end_split(args.n, ranges, &alg)?;
    info!("a has {} states, b has {} states", a.state_count(), b.state_count());

    let budget = Budget::with_timeout(Duration::from_millis(args.timeout));

    let time = Instant::now();
    let lazy = a.equivalent_lazy_within(&b, &alg, &budget);
    report("lazy", &lazy, time.elapsed());

    let time = Instant::now();
    let eager = a.equivalent_eager_within(&b, &alg, &budget);
    report("eager", &eager, time.elapsed());

    if let (Ok(l), Ok(e)) = (&lazy, &eager) {
        assert_eq!(l.is_equivalent(), e.is_equivalent());
    }

    Ok(())
}
