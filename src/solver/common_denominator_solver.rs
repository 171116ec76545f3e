//! Clearing denominators.
//!
//! Every additive term is split into a numerator and denominator factors: a factor containing
//! `x` whose (flattened) exponent is a negative real number. Each distinct denominator base is
//! taken at its largest power, every term is multiplied by the part of that common denominator it
//! lacks, and the cleared sum is solved again. Points where a denominator vanishes are removed by
//! the domain filter of the orchestrator.
use crate::solver::analytical_solver::solve;
use crate::solver::errors::SolveResult;
use crate::solver::solve_settings::SolveContext;
use crate::symbolic::numbers::Number;
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_sets::Set;
use crate::symbolic::tree_analyzer::{product_factors, sum_terms};
use log::debug;
use num::{BigRational, Zero};

/// `(b^p)^q` flattened to `(b, p·q)`
fn flatten_power(expr: &Expr) -> (Expr, Expr) {
    match expr {
        Expr::Pow(base, exp) => {
            let (inner, power) = flatten_power(base);
            (inner, (exp.as_ref().clone() * power).simplify())
        }
        other => (other.clone(), Expr::int(1)),
    }
}

struct Fraction {
    numerator: Expr,
    /// denominator bases with their positive powers
    denominators: Vec<(Expr, BigRational)>,
}

fn split_fraction(term: &Expr, x: &Expr) -> Fraction {
    let mut numerator = Expr::int(1);
    let mut denominators = Vec::new();
    for factor in product_factors(term) {
        let (base, power) = flatten_power(&factor);
        let negative = power
            .as_number()
            .filter(|n| n.is_real())
            .and_then(Number::as_rational)
            .filter(|p| *p < BigRational::zero());
        match negative {
            Some(p) if factor.contains_node(x) => denominators.push((base, -p)),
            _ => numerator = numerator * factor,
        }
    }
    Fraction {
        numerator,
        denominators,
    }
}

fn power_of(list: &[(Expr, BigRational)], base: &Expr) -> Option<BigRational> {
    list.iter().find(|(b, _)| b == base).map(|(_, p)| p.clone())
}

/// the cleared numerator sum, `None` when no term has a denominator in `x`
pub(crate) fn clear_denominators(expr: &Expr, x: &Expr) -> Option<Expr> {
    let fractions: Vec<Fraction> = sum_terms(expr)
        .iter()
        .map(|term| split_fraction(term, x))
        .collect();
    let mut common: Vec<(Expr, BigRational)> = Vec::new();
    for (base, power) in fractions.iter().flat_map(|f| f.denominators.iter()) {
        match common.iter_mut().find(|(b, _)| b == base) {
            Some((_, max)) if *max < *power => *max = power.clone(),
            Some(_) => {}
            None => common.push((base.clone(), power.clone())),
        }
    }
    if common.is_empty() {
        return None;
    }
    let cleared = fractions
        .into_iter()
        .map(|fraction| {
            common.iter().fold(fraction.numerator, |acc, (base, max)| {
                let own = power_of(&fraction.denominators, base).unwrap_or_else(BigRational::zero);
                let missing = max - own;
                if missing.is_zero() {
                    acc
                } else {
                    acc * base.clone().pow(Expr::Const(Number::from_rational(missing)))
                }
            })
        })
        .reduce(|acc, term| acc + term)
        .unwrap_or_else(|| Expr::int(0));
    Some(cleared.simplify())
}

pub fn solve_common_denominator(
    expr: &Expr,
    x: &Expr,
    ctx: &SolveContext,
) -> SolveResult<Option<Set>> {
    let Some(cleared) = clear_denominators(expr, x) else {
        return Ok(None);
    };
    if cleared == *expr {
        return Ok(None);
    }
    debug!("cleared denominators of {}: {}", expr, cleared);
    Ok(Some(solve(&cleared, x, false, ctx)?.simplify()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_clear_simple_fractions() {
        let x = Expr::var("x");
        // 1/x + 1/(x+1) - 1
        let f = Expr::int(1) / x.clone() + Expr::int(1) / (x.clone() + Expr::int(1)) - Expr::int(1);
        let cleared = clear_denominators(&f, &x).unwrap();
        // (x+1) + x - x(x+1) = -x^2 + x + 1
        for v in [0.5, 2.0, -3.0] {
            let expected = -v * v + v + 1.0;
            let got = cleared
                .eval_complex_with(&[("x", num_complex::Complex64::new(v, 0.0))])
                .unwrap();
            assert_relative_eq!(got.re, expected, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_solve_cleared_equation() {
        let ctx = SolveContext::default();
        let x = Expr::var("x");
        let f = Expr::int(1) / x.clone() + Expr::int(1) / (x.clone() + Expr::int(1)) - Expr::int(1);
        let roots = solve_common_denominator(&f, &x, &ctx).unwrap().unwrap();
        let mut values: Vec<f64> = roots
            .elements()
            .unwrap()
            .iter()
            .map(|r| r.eval_complex().unwrap().re)
            .collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let sqrt5 = 5f64.sqrt();
        assert_eq!(values.len(), 2);
        assert_relative_eq!(values[0], (1.0 - sqrt5) / 2.0, epsilon = 1e-9);
        assert_relative_eq!(values[1], (1.0 + sqrt5) / 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_largest_power_wins() {
        let x = Expr::var("x");
        // 1/x^2 + 1/x: common denominator x^2, cleared 1 + x
        let f = Expr::int(1) / x.clone().pow(Expr::int(2)) + Expr::int(1) / x.clone();
        let cleared = clear_denominators(&f, &x).unwrap();
        let got = cleared
            .eval_complex_with(&[("x", num_complex::Complex64::new(3.0, 0.0))])
            .unwrap();
        assert_relative_eq!(got.re, 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_no_denominators() {
        let ctx = SolveContext::default();
        let x = Expr::var("x");
        let f = x.clone().pow(Expr::int(2)) - Expr::int(2) / Expr::int(3);
        assert_eq!(solve_common_denominator(&f, &x, &ctx).unwrap(), None);
    }
}
