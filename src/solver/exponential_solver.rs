//! Exponential reductions.
//!
//! * linear: every `b^(a·x + c)` with `x`-free base is rewritten as `b^c · (e^x)^(a·ln b)`, so the
//!   equation becomes algebraic in `t = e^x`; when all bases are positive rationals the
//!   smallest of them replaces `e`, so `4^x - 3·2^x + 2` becomes `t^2 - 3t + 2` with `t = 2^x`
//! * multiplicative: every `x^(p·q)` with numeric `p` and non-numeric `q` becomes `(x^q)^p`, so the
//!   equation becomes algebraic in `t = x^q`; with only numeric exponents the smallest one is
//!   taken as the new unknown (`x^(1/2) + x^(1/4)` is quadratic in `x^(1/4)`)
use crate::solver::analytical_solver::{invert_substituted, solve};
use crate::solver::errors::SolveResult;
use crate::solver::solve_settings::SolveContext;
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_sets::Set;
use crate::symbolic::tree_analyzer::{product_factors, try_get_poly_linear};
use log::{debug, trace};
use num::ToPrimitive;
use std::cell::RefCell;

/// base of the new unknown `t = base^x`: the common base, the smallest positive rational base
/// when all of them are rational, `e` otherwise
fn reference_base(expr: &Expr, x: &Expr) -> Expr {
    let bases: Vec<&Expr> = expr
        .nodes()
        .into_iter()
        .filter_map(|node| match node {
            Expr::Pow(base, arg) if !base.contains_node(x) && arg.contains_node(x) => {
                Some(base.as_ref())
            }
            _ => None,
        })
        .collect();
    let Some(first) = bases.first() else {
        return Expr::E;
    };
    if bases.iter().all(|b| b == first) {
        return (*first).clone();
    }
    let mut best: Option<(f64, &Expr)> = None;
    for base in bases {
        let Some(r) = base.as_number().and_then(|n| n.as_rational()) else {
            return Expr::E;
        };
        let Some(size) = r.to_f64().filter(|v| *v > 0.0 && *v != 1.0).map(|v| v.ln().abs()) else {
            return Expr::E;
        };
        if best.is_none_or(|(s, _)| size < s) {
            best = Some((size, base));
        }
    }
    best.map(|(_, b)| b.clone()).unwrap_or(Expr::E)
}

/// `b^(a·x + c)` rewritten through a common power `base^x`, then solved for `t = base^x`.
pub fn solve_exponential_linear(
    expr: &Expr,
    x: &Expr,
    ctx: &SolveContext,
) -> SolveResult<Option<Set>> {
    let reference = reference_base(expr, x);
    let b_x = reference.clone().pow(x.clone());
    let prepared = expr.replace_bottom_up(&|node| match node {
        Expr::Pow(base, arg)
            if *node != b_x && !base.contains_node(x) && arg.contains_node(x) =>
        {
            let (a, c) = try_get_poly_linear(arg, x)?;
            let base = base.as_ref().clone();
            let log = base.clone().log(reference.clone());
            Some(base.pow(c) * b_x.clone().pow(log * a))
        }
        _ => None,
    });
    if !prepared.contains_node(&b_x) {
        return Ok(None);
    }
    let t = expr.fresh_var("t", &[x]);
    let replaced = prepared.substitute(&b_x, &t);
    if replaced.contains_node(x) {
        trace!("{} is not a pure exponential equation", expr);
        return Ok(None);
    }
    let replaced = replaced.simplify();
    debug!("exponential substitution {} = {}: {}", t, b_x, replaced);
    let t_roots = solve(&replaced, &t, false, ctx)?;
    invert_substituted(&t_roots, &b_x, x, ctx)
}

/// `log_b(c^k) = k·log_b(c)` for integer `k`, so constant factors surface in exponents
fn constant_out_of_log(node: &Expr) -> Option<Expr> {
    match node {
        Expr::Log(base, arg) => match arg.as_ref() {
            Expr::Pow(inner, k) if k.as_number().is_some_and(|n| n.is_integer()) => {
                Some(k.as_ref().clone() * Expr::Log(base.clone(), inner.clone()))
            }
            _ => None,
        },
        _ => None,
    }
}

#[derive(Default)]
struct PowerSplit {
    substitution: Option<Expr>,
    inner_powers: Vec<Expr>,
    outer_powers: Vec<Expr>,
}

/// `x^q` substituted by a fresh variable after splitting every exponent into numeric and
/// symbolic factors.
pub fn solve_exponential_multiplicative(
    expr: &Expr,
    x: &Expr,
    ctx: &SolveContext,
) -> SolveResult<Option<Set>> {
    let split = RefCell::new(PowerSplit::default());
    let transformed = expr.replace_bottom_up(&|node| match node {
        Expr::Pow(base, arg) if **base == *x && !arg.contains_node(x) => {
            let arg = arg.replace_bottom_up(&constant_out_of_log);
            let (numeric, symbolic): (Vec<Expr>, Vec<Expr>) =
                product_factors(&arg).into_iter().partition(|f| f.is_numeric());
            let product = |factors: Vec<Expr>| {
                factors
                    .into_iter()
                    .reduce(|acc, f| acc * f)
                    .map(|p| p.simplify())
                    .unwrap_or_else(|| Expr::int(1))
            };
            let (outer, inner) = (product(numeric), product(symbolic));
            let mut split = split.borrow_mut();
            let substitution = if inner.is_one() {
                x.clone()
            } else {
                x.clone().pow(inner.clone())
            };
            split.substitution = Some(substitution.clone());
            if !inner.is_one() {
                split.inner_powers.push(inner);
            }
            if !outer.is_one() {
                split.outer_powers.push(outer.clone());
            }
            Some(substitution.pow(outer))
        }
        _ => None,
    });
    let PowerSplit {
        substitution,
        mut inner_powers,
        outer_powers,
    } = split.into_inner();
    let Some(mut substitution) = substitution else {
        return Ok(None);
    };
    let mut transformed = transformed;
    if inner_powers.is_empty() {
        inner_powers = outer_powers;
    }
    // only numeric exponents: the smallest one becomes the unknown
    let real_powers: Option<Vec<(f64, Expr)>> = inner_powers
        .iter()
        .map(|p| {
            let v = p.eval_complex().filter(|v| v.im == 0.0)?;
            p.is_numeric().then(|| (v.re, p.clone()))
        })
        .collect();
    if let Some(min_pow) = real_powers
        .filter(|powers| !powers.is_empty())
        .and_then(|powers| {
            powers
                .into_iter()
                .min_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal))
        })
        .map(|(_, p)| p)
    {
        substitution = x.clone().pow(min_pow.clone()).simplify();
        for pow in &inner_powers {
            let divided = (pow.clone() / min_pow.clone()).simplify();
            transformed = transformed.substitute(
                &x.clone().pow(pow.simplify()),
                &substitution.clone().pow(divided),
            );
        }
        ctx.check_cancelled()?;
    }
    let t = expr.fresh_var("t", &[x]);
    let replaced = transformed.substitute(&substitution, &t);
    if replaced.contains_node(x) {
        trace!("{} is not multiplicative in {}", expr, substitution);
        return Ok(None);
    }
    let replaced = replaced.simplify();
    debug!(
        "multiplicative substitution {} = {}: {}",
        t, substitution, replaced
    );
    let t_roots = solve(&replaced, &t, false, ctx)?;
    invert_substituted(&t_roots, &substitution, x, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use num_complex::Complex64;

    #[test]
    fn test_linear_exponential() {
        let ctx = SolveContext::default();
        let x = Expr::var("x");
        // 4^x - 3·2^x + 2 = 0  =>  2^x ∈ {1, 2}
        let f = Expr::int(4).pow(x.clone()) - Expr::int(3) * Expr::int(2).pow(x.clone())
            + Expr::int(2);
        let roots = solve_exponential_linear(&f, &x, &ctx).unwrap().unwrap();
        let mut values: Vec<f64> = roots
            .elements()
            .unwrap()
            .iter()
            .map(|r| r.eval_complex().unwrap().re)
            .collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(values.len(), 2);
        assert_relative_eq!(values[0], 0.0, epsilon = 1e-9);
        assert_relative_eq!(values[1], 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_linear_exponential_rejects_mixed() {
        let ctx = SolveContext::default();
        let x = Expr::var("x");
        let f = x.clone().exp() + x.clone();
        assert_eq!(solve_exponential_linear(&f, &x, &ctx).unwrap(), None);
        let g = Expr::sin(x.clone().boxed()) - Expr::int(1);
        assert_eq!(solve_exponential_linear(&g, &x, &ctx).unwrap(), None);
    }

    #[test]
    fn test_multiplicative_symbolic_exponent() {
        let ctx = SolveContext::default();
        let x = Expr::var("x");
        let a = Expr::var("a");
        // x^(2a) + x^a - 2  =>  x^a ∈ {1, -2}
        let f = x.clone().pow(Expr::int(2) * a.clone()) + x.clone().pow(a.clone()) - Expr::int(2);
        let roots = solve_exponential_multiplicative(&f, &x, &ctx)
            .unwrap()
            .unwrap();
        let roots = roots.elements().unwrap();
        assert_eq!(roots.len(), 2);
        assert!(roots.contains(&Expr::int(1)));
        let other = roots.iter().find(|r| **r != Expr::int(1)).unwrap();
        let v = other
            .eval_complex_with(&[("a", Complex64::new(3.0, 0.0))])
            .unwrap();
        assert_relative_eq!(v.re, -(2f64.powf(1.0 / 3.0)), epsilon = 1e-9);
    }

    #[test]
    fn test_multiplicative_numeric_exponents() {
        let ctx = SolveContext::default();
        let x = Expr::var("x");
        // x^(1/2) + x^(1/4) - 2, quadratic in x^(1/4)
        let f = x.clone().pow(Expr::rational(1, 2)) + x.clone().pow(Expr::rational(1, 4))
            - Expr::int(2);
        let roots = solve_exponential_multiplicative(&f, &x, &ctx)
            .unwrap()
            .unwrap();
        // 1 and the extraneous 16, dropped later by the orchestrator's check
        assert!(roots.elements().unwrap().contains(&Expr::int(1)));
    }

    #[test]
    fn test_multiplicative_without_powers_of_x() {
        let ctx = SolveContext::default();
        let x = Expr::var("x");
        let f = Expr::sin(x.clone().boxed());
        assert_eq!(solve_exponential_multiplicative(&f, &x, &ctx).unwrap(), None);
    }
}
