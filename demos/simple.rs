use sfa_rs::automaton::{Sfa, Transition};
use sfa_rs::intervals::{CharAlgebra, CharPred};

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Debug,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let alg = CharAlgebra;

    // [a-z]+[0-9]*
    let a = Sfa::new(
        [
            Transition::input(0, 1, CharPred::lower_alpha()),
            Transition::input(1, 1, CharPred::lower_alpha()),
            Transition::epsilon(1, 2),
            Transition::input(2, 2, CharPred::num()),
        ],
        0,
        [2],
        &alg,
    )?;
    println!("a: {} states, {} transitions", a.state_count(), a.transition_count());

    // [a-z][0-9]
    let b = Sfa::new(
        [
            Transition::input(0, 1, CharPred::lower_alpha()),
            Transition::input(1, 2, CharPred::num()),
        ],
        0,
        [2],
        &alg,
    )?;
    println!("b: {} states, {} transitions", b.state_count(), b.transition_count());

    let union = a.union(&b, &alg)?;
    println!("a | b: {} states", union.state_count());

    let inter = a.intersection(&b, &alg)?;
    println!("a & b: {} states, witness = {:?}", inter.state_count(), inter.get_witness(&alg)?);

    let diff = a.difference(&b, &alg)?;
    println!("a - b: {} states, witness = {:?}", diff.state_count(), diff.get_witness(&alg)?);

    let det = a.determinize(&alg)?;
    println!("det(a): {} states", det.state_count());

    let min = a.minimize(&alg)?;
    println!("min(a): {} states", min.state_count());

    let not_a = a.complement(&alg)?;
    println!("!a: {} states, witness = {:?}", not_a.state_count(), not_a.get_witness(&alg)?);

    println!("a == min(a): {:?}", a.equivalent_lazy(&min, &alg)?);
    println!("a == b: {:?}", a.equivalent_lazy(&b, &alg)?);

    println!("min(a) in DOT:\n{}", min.to_dot()?);

    Ok(())
}
