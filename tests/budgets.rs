use std::cell::Cell;
use std::time::Duration;

use test_log::test;

use sfa_rs::algebra::PredicateAlgebra;
use sfa_rs::automaton::{Sfa, Transition};
use sfa_rs::budget::{Budget, CancelToken};
use sfa_rs::error::{Cause, Error, Result};
use sfa_rs::intervals::{CharAlgebra, CharPred};

/// What a [`Flaky`] algebra does once its call allowance is spent.
enum Trip {
    /// Every further call fails with [`solver_error`].
    Fail,
    /// The token is cancelled, and calls keep answering correctly.
    Cancel(CancelToken),
}

/// Character intervals behind a counter of the calls that may fail.
struct Flaky {
    inner: CharAlgebra,
    calls: Cell<usize>,
    allowance: usize,
    trip: Trip,
}

impl Flaky {
    fn failing_after(allowance: usize) -> Self {
        Self {
            inner: CharAlgebra,
            calls: Cell::new(0),
            allowance,
            trip: Trip::Fail,
        }
    }

    fn cancelling_after(allowance: usize, token: CancelToken) -> Self {
        Self {
            inner: CharAlgebra,
            calls: Cell::new(0),
            allowance,
            trip: Trip::Cancel(token),
        }
    }

    fn tripped(&self) -> bool {
        self.calls.get() > self.allowance
    }

    fn tick(&self) -> Result<()> {
        self.calls.set(self.calls.get() + 1);
        if !self.tripped() {
            return Ok(());
        }
        match &self.trip {
            Trip::Fail => Err(solver_error()),
            Trip::Cancel(token) => {
                token.cancel();
                Ok(())
            }
        }
    }
}

fn solver_error() -> Error {
    Error::timeout("solver", Cause::Cancelled)
}

impl PredicateAlgebra for Flaky {
    type Pred = CharPred;
    type Symbol = char;

    fn mk_true(&self) -> CharPred {
        self.inner.mk_true()
    }

    fn mk_false(&self) -> CharPred {
        self.inner.mk_false()
    }

    fn mk_atom(&self, symbol: &char) -> CharPred {
        self.inner.mk_atom(symbol)
    }

    fn mk_not(&self, p: &CharPred) -> Result<CharPred> {
        self.tick()?;
        self.inner.mk_not(p)
    }

    fn mk_and(&self, p: &CharPred, q: &CharPred) -> Result<CharPred> {
        self.tick()?;
        self.inner.mk_and(p, q)
    }

    fn mk_or(&self, p: &CharPred, q: &CharPred) -> Result<CharPred> {
        self.tick()?;
        self.inner.mk_or(p, q)
    }

    fn is_satisfiable(&self, p: &CharPred) -> Result<bool> {
        self.tick()?;
        self.inner.is_satisfiable(p)
    }

    fn has_model(&self, p: &CharPred, symbol: &char) -> bool {
        self.inner.has_model(p, symbol)
    }

    fn generate_witness(&self, p: &CharPred) -> Result<Option<char>> {
        self.tick()?;
        self.inner.generate_witness(p)
    }
}

/// [a-z]* followed by one of [a-m]: nondeterministic and ambiguous.
fn nfa(alg: &CharAlgebra) -> Sfa<CharPred> {
    Sfa::new(
        [
            Transition::input(0, 0, CharPred::lower_alpha()),
            Transition::input(0, 1, CharPred::range('a', 'm')),
        ],
        0,
        [1],
        alg,
    )
    .unwrap()
}

/// [a-z][0-9]*
fn lower_then_digits(alg: &CharAlgebra) -> Sfa<CharPred> {
    Sfa::new(
        [
            Transition::input(0, 1, CharPred::lower_alpha()),
            Transition::input(1, 1, CharPred::num()),
        ],
        0,
        [1],
        alg,
    )
    .unwrap()
}

/// Runs `op` against algebras failing after every allowance up to a bound, and checks
/// that a failure of the algebra is always the error the operation reports.
fn assert_propagates<T>(name: &str, op: impl Fn(&Flaky) -> Result<T>) {
    for allowance in 0..64 {
        let alg = Flaky::failing_after(allowance);
        let result = op(&alg);
        if alg.tripped() {
            match result {
                Err(err) => assert_eq!(err, solver_error(), "{} with allowance {}", name, allowance),
                Ok(_) => panic!("{} swallowed a failure of the algebra (allowance {})", name, allowance),
            }
        } else {
            assert!(result.is_ok(), "{} failed with allowance {}", name, allowance);
        }
        if allowance == 0 {
            assert!(alg.tripped(), "{} never called the algebra", name);
        }
    }
}

#[test]
fn test_algebra_failures_propagate() {
    let alg = CharAlgebra;
    let a = nfa(&alg);
    let b = lower_then_digits(&alg);

    assert_propagates("minimize", |f| a.minimize(f));
    assert_propagates("determinize", |f| a.determinize(f));
    assert_propagates("intersection", |f| a.intersection(&b, f));
    assert_propagates("complement", |f| a.complement(f));
    assert_propagates("difference", |f| a.difference(&b, f));
    assert_propagates("equivalent_eager", |f| a.equivalent_eager(&b, f));
    assert_propagates("equivalent_lazy", |f| a.equivalent_lazy(&b, f));
    assert_propagates("ambiguous_input", |f| a.ambiguous_input(f));
    assert_propagates("get_witnesses", |f| b.get_witnesses(f, 3));
}

#[test]
fn test_algebra_failure_in_minterms() {
    let alg = Flaky::failing_after(2);
    let preds = [CharPred::lower_alpha(), CharPred::range('a', 'm'), CharPred::num()];
    assert_eq!(alg.get_minterms(&preds).unwrap_err(), solver_error());
}

#[test]
fn test_zero_timeout() {
    let alg = CharAlgebra;
    let a = nfa(&alg);
    let b = lower_then_digits(&alg);
    let budget = Budget::with_timeout(Duration::ZERO);
    let expired = |err: Error| matches!(err.cause(), Cause::Deadline { .. });

    assert!(expired(a.minimize_within(&alg, &budget).unwrap_err()));
    assert!(expired(a.complement_within(&alg, &budget).unwrap_err()));
    assert!(expired(a.difference_within(&b, &alg, &budget).unwrap_err()));
    assert!(expired(a.equivalent_eager_within(&b, &alg, &budget).unwrap_err()));
    assert!(expired(a.equivalent_lazy_within(&b, &alg, &budget).unwrap_err()));

    // Already total: the first check happens inside the refinement loop.
    let total = a.mk_total(&alg).unwrap();
    let err = total.minimize_within(&alg, &budget).unwrap_err();
    assert_eq!(err.operation(), "minimize");
}

#[test]
fn test_cancelled_before_start() {
    let alg = CharAlgebra;
    let a = nfa(&alg);
    let b = lower_then_digits(&alg);
    let token = CancelToken::new();
    token.cancel();
    let budget = Budget::unlimited().cancel_token(token);
    let cancelled = |err: Error| err.cause() == &Cause::Cancelled;

    assert!(cancelled(a.minimize_within(&alg, &budget).unwrap_err()));
    assert!(cancelled(a.complement_within(&alg, &budget).unwrap_err()));
    assert!(cancelled(a.difference_within(&b, &alg, &budget).unwrap_err()));
    assert!(cancelled(a.equivalent_eager_within(&b, &alg, &budget).unwrap_err()));
}

/// `x a` or `y b`. After totalization, the states reached on `x` and `y` are only told
/// apart by splitting on their guards.
fn split_by_guards(alg: &CharAlgebra) -> Sfa<CharPred> {
    Sfa::new(
        [
            Transition::input(0, 1, CharPred::of('x')),
            Transition::input(0, 2, CharPred::of('y')),
            Transition::input(1, 3, CharPred::of('a')),
            Transition::input(2, 3, CharPred::of('b')),
        ],
        0,
        [3],
        alg,
    )
    .unwrap()
}

#[test]
fn test_minimize_cancelled_mid_refinement() {
    let total = split_by_guards(&CharAlgebra).mk_total(&CharAlgebra).unwrap();
    assert!(total.is_total());

    let token = CancelToken::new();
    let alg = Flaky::cancelling_after(0, token.clone());
    let budget = Budget::unlimited().cancel_token(token.clone());
    let err = total.minimize_within(&alg, &budget).unwrap_err();

    assert!(alg.tripped());
    assert!(token.is_cancelled());
    assert_eq!(err.operation(), "minimize");
    assert_eq!(err.cause(), &Cause::Cancelled);
}

#[test]
fn test_minimize_with_untripped_token() {
    let total = split_by_guards(&CharAlgebra).mk_total(&CharAlgebra).unwrap();
    let token = CancelToken::new();
    let alg = Flaky::cancelling_after(usize::MAX, token.clone());
    let budget = Budget::unlimited().cancel_token(token.clone());
    let min = total.minimize_within(&alg, &budget).unwrap();

    assert!(!token.is_cancelled());
    // Initial, the two middle states, the final state and the sink.
    assert_eq!(min.state_count(), 5);
    assert!(min.accepts(&['y', 'b'], &CharAlgebra));
    assert!(!min.accepts(&['y', 'a'], &CharAlgebra));
}
