//! Equations with fractional powers.
//!
//! The expanded terms are split into a polynomial part `normal` and terms carrying factors
//! `base^(p/q)` with `q > 1`. All fractional terms must share the same factors, their
//! multipliers are summed, and with `L = lcm(q)` the equation `normal + multiplier · Π base^(p/q)`
//! is raised to
//!
//! ```text
//! normal^L - (-multiplier)^L · Π (base^p)^(L/q) = 0
//! ```
//!
//! Raising to a power can add roots, so the orchestrator checks every root against the original
//! equation.
use crate::solver::analytical_solver::solve;
use crate::solver::errors::SolveResult;
use crate::solver::solve_settings::SolveContext;
use crate::symbolic::numbers::Number;
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_sets::Set;
use crate::symbolic::tree_analyzer::{gather_linear_children_over_sum_and_expand, product_factors};
use log::{debug, trace};
use num::integer::Integer;
use num::{BigInt, One};

/// factors `(base^p, q)` of a term and the product of the other factors
struct FractionedTerm {
    multiplier: Expr,
    fracs: Vec<(Expr, BigInt)>,
}

enum Split {
    Term(FractionedTerm),
    /// an exponent that is a number but not a rational one
    Irrational,
}

fn split_term(term: &Expr) -> Split {
    let mut multiplier = Expr::int(1);
    let mut fracs = Vec::new();
    for factor in product_factors(term) {
        let power = match &factor {
            Expr::Pow(base, exp) => exp.as_number().filter(|n| !n.is_integer()).map(|n| (base, n)),
            _ => None,
        };
        let Some((base, number)) = power else {
            multiplier = multiplier * factor;
            continue;
        };
        let Some(ratio) = number.as_rational().filter(|_| number.is_exact()) else {
            return Split::Irrational;
        };
        let main = base
            .as_ref()
            .clone()
            .pow(Expr::Const(Number::from_bigint(ratio.numer().clone())))
            .simplify();
        fracs.push((main, ratio.denom().clone()));
    }
    Split::Term(FractionedTerm { multiplier, fracs })
}

pub fn solve_fractioned_polynomial(
    expr: &Expr,
    x: &Expr,
    ctx: &SolveContext,
) -> SolveResult<Option<Set>> {
    let Some(children) =
        gather_linear_children_over_sum_and_expand(expr, ctx.settings().max_expansion_terms)
    else {
        return Ok(None);
    };
    let mut normal = Expr::int(0);
    let mut fractioned: Option<FractionedTerm> = None;
    for child in children {
        ctx.check_cancelled()?;
        let term = match split_term(&child) {
            Split::Irrational => {
                trace!("{} has an irrational power", child);
                return Ok(None);
            }
            Split::Term(term) if term.fracs.is_empty() => {
                normal = normal + child;
                continue;
            }
            Split::Term(term) => term,
        };
        fractioned = match fractioned {
            None => Some(term),
            Some(first) if first.fracs == term.fracs => Some(FractionedTerm {
                multiplier: first.multiplier + term.multiplier,
                fracs: first.fracs,
            }),
            Some(_) => {
                trace!("{} mixes different fractional powers", expr);
                return Ok(None);
            }
        };
    }
    let Some(FractionedTerm { multiplier, fracs }) = fractioned else {
        return Ok(None);
    };
    let lcm = fracs
        .iter()
        .fold(BigInt::one(), |acc, (_, q)| acc.lcm(q));
    let power = |n: BigInt| Expr::Const(Number::from_bigint(n));
    // the minus moves the fractional part across: x + sqrt(x + 1) = 0 => x = -sqrt(x + 1)
    let raised = fracs.into_iter().fold(
        (-multiplier).pow(power(lcm.clone())),
        |acc, (main, q)| acc * main.pow(power(&lcm / q)),
    );
    let cleared = (normal.pow(power(lcm.clone())) - raised).simplify();
    debug!("{} raised to the power {}: {}", expr, lcm, cleared);
    Ok(Some(solve(&cleared, x, false, ctx)?.simplify()))
}
