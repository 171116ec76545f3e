//! Euler substitution for trigonometric equations.
//!
//! `sin(a·x + b)` and `cos(a·x + b)` with integer `a` are written through `t = e^(i·x)`:
//!
//! ```text
//! sin(a·x + b) = (t^a·e^(ib) - t^(-a)·e^(-ib)) / (2i)
//! cos(a·x + b) = (t^a·e^(ib) + t^(-a)·e^(-ib)) / 2
//! ```
//!
//! which turns `sin(x) + cos(x) = 1` into a polynomial in `t` (after clearing `t^(-1)`).
//! Every root `t` gives the family `x = -i·ln(t) + 2πn`.
use crate::solver::analytical_solver::solve;
use crate::solver::errors::SolveResult;
use crate::solver::solve_settings::SolveContext;
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_sets::Set;
use crate::symbolic::tree_analyzer::try_get_poly_linear;
use log::{debug, trace};

/// `(t^a·e^(ib), t^(-a)·e^(-ib))` for an argument linear in `x` with integer slope
fn euler_halves(arg: &Expr, x: &Expr, t: &Expr) -> Option<(Expr, Expr)> {
    let (a, b) = try_get_poly_linear(arg, x)?;
    let a = a.as_number()?;
    if !a.is_integer() {
        return None;
    }
    let a = Expr::Const(a.clone());
    let phase = Expr::i() * b;
    let forward = t.clone().pow(a.clone()) * Expr::E.pow(phase.clone());
    let backward = t.clone().pow(-a) * Expr::E.pow(-phase);
    Some((forward, backward))
}

pub fn solve_trigonometric(
    expr: &Expr,
    x: &Expr,
    ctx: &SolveContext,
) -> SolveResult<Option<Set>> {
    let t = expr.fresh_var("t", &[x]);
    let replaced = expr.replace_bottom_up(&|node| match node {
        Expr::sin(arg) => {
            let (forward, backward) = euler_halves(arg, x, &t)?;
            Some((forward - backward) / (Expr::int(2) * Expr::i()))
        }
        Expr::cos(arg) => {
            let (forward, backward) = euler_halves(arg, x, &t)?;
            Some((forward + backward) / Expr::int(2))
        }
        _ => None,
    });
    if !replaced.contains_node(&t) || replaced.contains_node(x) {
        trace!("{} has no Euler form in {}", expr, x);
        return Ok(None);
    }
    let replaced = replaced.simplify();
    debug!("trigonometric substitution {} = e^(i{}): {}", t, x, replaced);
    let t_roots = solve(&replaced, &t, false, ctx)?;
    let Some(elements) = t_roots.elements() else {
        return Ok(None);
    };
    if elements.is_empty() {
        return Ok(None);
    }
    // e^(ix) = t  =>  x = -i ln(t) + 2πn
    let mut roots = Vec::with_capacity(elements.len());
    for t_root in elements {
        ctx.check_cancelled()?;
        if t_root.is_zero() {
            continue;
        }
        let n = expr.fresh_param("n", &[x, t_root]);
        let root = (-Expr::i() * t_root.clone().ln() + Expr::int(2) * Expr::Pi * n).simplify();
        if root.is_defined() {
            roots.push(root);
        }
    }
    Ok(Some(Set::finite(roots).simplify()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use num_complex::Complex64;
    use std::f64::consts::PI;

    fn real_parts(set: &Set) -> Vec<f64> {
        let mut values: Vec<f64> = set
            .elements()
            .unwrap()
            .iter()
            .map(|r| r.eval_complex().unwrap().re)
            .collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap());
        values
    }

    fn at(root: &Expr, n: f64) -> Complex64 {
        let params = root.params();
        let bindings: Vec<(&str, Complex64)> = params
            .iter()
            .map(|p| (p.as_str(), Complex64::new(n, 0.0)))
            .collect();
        root.eval_complex_with(&bindings).unwrap()
    }

    #[test]
    fn test_sin_plus_cos() {
        let ctx = SolveContext::default();
        let x = Expr::var("x");
        let f = Expr::sin(x.clone().boxed()) + Expr::cos(x.clone().boxed()) - Expr::int(1);
        let roots = solve_trigonometric(&f, &x, &ctx).unwrap().unwrap();
        let elements = roots.elements().unwrap();
        assert_eq!(elements.len(), 2);
        let mut principal: Vec<f64> = elements.iter().map(|r| at(r, 0.0).re).collect();
        principal.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_relative_eq!(principal[0], 0.0, epsilon = 1e-9);
        assert_relative_eq!(principal[1], PI / 2.0, epsilon = 1e-9);
        // ln(i) and ln(1) fold, no logarithm is left
        for root in elements {
            assert!(!root.nodes().iter().any(|n| matches!(n, Expr::Log(..))), "{}", root);
        }
    }

    #[test]
    fn test_roots_are_periodic_families() {
        let ctx = SolveContext::default();
        let x = Expr::var("x");
        let f = Expr::sin(x.clone().boxed()) + Expr::cos(x.clone().boxed()) - Expr::int(1);
        let roots = solve_trigonometric(&f, &x, &ctx).unwrap().unwrap();
        for root in roots.elements().unwrap() {
            assert_eq!(root.params().len(), 1);
            let shift = at(root, 3.0) - at(root, 0.0);
            assert_relative_eq!(shift.re, 6.0 * PI, epsilon = 1e-9);
            for n in [-1.0, 2.0] {
                let residual = f.lambdify_complex("x")(at(root, n)).unwrap();
                assert_relative_eq!(residual.norm(), 0.0, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_double_angle_cosine() {
        let ctx = SolveContext::default();
        let x = Expr::var("x");
        let f = Expr::cos((Expr::int(2) * x.clone()).boxed()) - Expr::int(1);
        let roots = solve_trigonometric(&f, &x, &ctx).unwrap().unwrap();
        assert!(!roots.is_empty());
        for root in roots.elements().unwrap() {
            for n in [0.0, 1.0] {
                let at_root = f.lambdify_complex("x")(at(root, n)).unwrap();
                assert_relative_eq!(at_root.norm(), 0.0, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_rejects_non_linear_argument() {
        let ctx = SolveContext::default();
        let x = Expr::var("x");
        let f = Expr::sin(x.clone().pow(Expr::int(2)).boxed()) - Expr::int(1);
        assert_eq!(solve_trigonometric(&f, &x, &ctx).unwrap(), None);
        let g = Expr::sin(x.clone().boxed()) + x.clone();
        assert_eq!(solve_trigonometric(&g, &x, &ctx).unwrap(), None);
        let h = Expr::sin((Expr::rational(1, 2) * x.clone()).boxed());
        assert_eq!(solve_trigonometric(&h, &x, &ctx).unwrap(), None);
    }
}
