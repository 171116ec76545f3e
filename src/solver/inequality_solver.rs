//! Sign chart for `expr > 0` over the reals.
//!
//! Critical points are the real roots of the expression and of its denominators. Between two
//! neighbouring points the sign cannot change, so one sample per gap decides the gap. Gaps
//! reaching infinity are returned as conditional sets `{ x | x < p }` and `{ x | x > p }`.
use crate::solver::analytical_solver::solve;
use crate::solver::errors::SolveResult;
use crate::solver::solve_settings::SolveContext;
use crate::symbolic::numbers::Number;
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_sets::{Set, SpecialSet};
use log::{debug, trace};
use num_complex::Complex64;

/// points closer than this are one critical point
const POINT_TOLERANCE: f64 = 1e-9;

/// sub-expressions whose zeros make `expr` undefined
fn denominators(expr: &Expr, x: &Expr) -> Vec<Expr> {
    expr.nodes()
        .into_iter()
        .filter_map(|node| match node {
            Expr::Div(_, d) if d.contains_node(x) => Some(d.as_ref().clone()),
            Expr::Pow(base, e)
                if base.contains_node(x)
                    && e.as_number().is_some_and(|n| n.is_negative_real()) =>
            {
                Some(base.as_ref().clone())
            }
            _ => None,
        })
        .collect()
}

/// real critical points sorted by value, `None` when a root set cannot be listed numerically
fn critical_points(expr: &Expr, x: &Expr, ctx: &SolveContext) -> SolveResult<Option<Vec<(f64, Expr)>>> {
    let mut points: Vec<(f64, Expr)> = Vec::new();
    let mut sources = vec![expr.clone()];
    sources.extend(denominators(expr, x));
    for source in sources {
        let roots = solve(&source, x, false, ctx)?;
        let Some(elements) = roots.elements() else {
            trace!("roots of {} are not a finite set: {}", source, roots);
            return Ok(None);
        };
        for root in elements {
            let Some(value) = root.eval_complex() else {
                return Ok(None);
            };
            if value.im.abs() < POINT_TOLERANCE {
                points.push((value.re, root.clone()));
            }
        }
    }
    points.sort_by(|a, b| a.0.total_cmp(&b.0));
    points.dedup_by(|a, b| (a.0 - b.0).abs() < POINT_TOLERANCE);
    Ok(Some(points))
}

/// sign of `expr` at a real point; undefined and non-real values count as not positive
fn positive_at(expr: &Expr, x: &Expr, at: f64) -> bool {
    let value = Expr::Const(Number::approx(Complex64::new(at, 0.0)));
    expr.substitute(x, &value)
        .eval_complex()
        .is_some_and(|v| v.im.abs() < POINT_TOLERANCE && v.re > 0.0)
}

/// Solution set of `expr > 0` for real `x`.
pub fn solve_inequality(expr: &Expr, x: &Expr, ctx: &SolveContext) -> SolveResult<Set> {
    let name = match x {
        Expr::Var(name) => name.clone(),
        other => other.to_string(),
    };
    let unsampled = || Set::conditional(&name, Expr::Greater(expr.clone().boxed(), Expr::int(0).boxed()));
    let other_symbols = expr.vars().into_iter().any(|v| v != name) || !expr.params().is_empty();
    if other_symbols {
        return Ok(unsampled());
    }
    let Some(points) = critical_points(expr, x, ctx)? else {
        return Ok(unsampled());
    };
    debug!("{} critical points of {} > 0", points.len(), expr);
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return Ok(if positive_at(expr, x, 0.0) {
            Set::Special(SpecialSet::Reals)
        } else {
            Set::empty()
        });
    };
    let mut pieces = Vec::new();
    if positive_at(expr, x, first.0 - 1.0) {
        pieces.push(Set::conditional(
            &name,
            Expr::Less(x.clone().boxed(), first.1.clone().boxed()),
        ));
    }
    for pair in points.windows(2) {
        let (left, right) = (&pair[0], &pair[1]);
        if positive_at(expr, x, (left.0 + right.0) / 2.0) {
            pieces.push(Set::interval(left.1.clone(), right.1.clone(), false, false));
        }
    }
    if positive_at(expr, x, last.0 + 1.0) {
        pieces.push(Set::conditional(
            &name,
            Expr::Greater(x.clone().boxed(), last.1.clone().boxed()),
        ));
    }
    Ok(Set::unite_all(pieces))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quadratic_outside_roots() {
        let ctx = SolveContext::default();
        let x = Expr::var("x");
        // x^2 - 1 > 0  <=>  x < -1 or x > 1
        let f = x.clone().pow(Expr::int(2)) - Expr::int(1);
        let set = solve_inequality(&f, &x, &ctx).unwrap();
        assert_eq!(set.contains(&Expr::int(2)), Some(true));
        assert_eq!(set.contains(&Expr::int(-3)), Some(true));
        assert_eq!(set.contains(&Expr::int(0)), Some(false));
    }

    #[test]
    fn test_between_roots() {
        let ctx = SolveContext::default();
        let x = Expr::var("x");
        // 1 - x^2 > 0  <=>  -1 < x < 1
        let f = Expr::int(1) - x.clone().pow(Expr::int(2));
        let set = solve_inequality(&f, &x, &ctx).unwrap();
        assert_eq!(set, Set::interval(Expr::int(-1), Expr::int(1), false, false));
    }

    #[test]
    fn test_denominator_splits_gaps() {
        let ctx = SolveContext::default();
        let x = Expr::var("x");
        // 1/x > 0  <=>  x > 0
        let f = Expr::int(1) / x.clone();
        let set = solve_inequality(&f, &x, &ctx).unwrap();
        assert_eq!(
            set,
            Set::conditional("x", Expr::Greater(x.clone().boxed(), Expr::int(0).boxed()))
        );
    }

    #[test]
    fn test_without_critical_points() {
        let ctx = SolveContext::default();
        let x = Expr::var("x");
        let f = x.clone().pow(Expr::int(2)) + Expr::int(1);
        assert_eq!(
            solve_inequality(&f, &x, &ctx).unwrap(),
            Set::Special(SpecialSet::Reals)
        );
        let g = -(x.clone().pow(Expr::int(2))) - Expr::int(1);
        assert!(solve_inequality(&g, &x, &ctx).unwrap().is_empty());
    }

    #[test]
    fn test_symbolic_coefficient_is_conditional() {
        let ctx = SolveContext::default();
        let x = Expr::var("x");
        let f = x.clone() - Expr::var("a");
        let set = solve_inequality(&f, &x, &ctx).unwrap();
        assert!(matches!(set, Set::Conditional { .. }));
    }
}
