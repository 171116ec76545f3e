//! # Polynomial root-finder
//!
//! Exact closed forms for polynomials in a distinguished sub-expression `x` up to degree four.
//!
//! The expression is expanded into additive terms, each term is read as `coefficient · x^power`,
//! the lowest power is factored out (giving the root `0`) and the powers are divided by their
//! greatest common divisor `g`, so that `x^6 - 1` becomes the linear `t - 1` with `t = x^6`.
//! The roots of the reduced polynomial are then expanded back through the `g`-th roots of unity.
//!
//! Degree 2 uses the quadratic formula, degree 3 Cardano's formula and degree 4 Ferrari's
//! method; every intermediate step is simplified so exact inputs give exact roots whenever the
//! simplifier can fold them. Roots that stay as nested radicals are left to the downcasting
//! step of the orchestrator.
use crate::solver::errors::SolveResult;
use crate::solver::solve_settings::SolveContext;
use crate::symbolic::numbers::Number;
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_sets::Set;
use crate::symbolic::tree_analyzer::{
    gather_linear_children_over_sum_and_expand, parse_monomial, roots_of_unity, unity_root_family,
};
use log::{debug, trace};
use num::{BigInt, BigRational, Integer, One, ToPrimitive, Zero};
use std::collections::BTreeMap;

/// approximate coefficients are treated as vanishing below this magnitude
const VANISHING: f64 = 1e-12;

fn rat(n: i64, d: i64) -> Expr {
    Expr::rational(n, d)
}

/// Zero test of a coefficient. Exact numbers are compared exactly, approximate ones against
/// `VANISHING`; a numeric tree the simplifier cannot fold to a number (nested radicals) falls
/// back to its numeric value.
fn vanishes(e: &Expr) -> bool {
    match e {
        Expr::Const(Number::Exact(_)) => e.is_zero(),
        Expr::Const(Number::Approx(z)) => z.norm() < VANISHING,
        _ if e.is_numeric() => match e.simplify() {
            folded @ Expr::Const(_) => vanishes(&folded),
            folded => folded
                .eval_complex()
                .is_some_and(|z| z.norm() < VANISHING),
        },
        _ => false,
    }
}

/// `power -> coefficient` of `expr` seen as a polynomial in `x`, zero coefficients dropped
fn monomial_map(expr: &Expr, x: &Expr, max_terms: usize) -> Option<BTreeMap<BigInt, Expr>> {
    let terms = gather_linear_children_over_sum_and_expand(expr, max_terms)?;
    let mut monomials: BTreeMap<BigInt, Expr> = BTreeMap::new();
    for term in terms {
        let (coefficient, power) = parse_monomial(&term, x)?;
        let entry = monomials.entry(power).or_insert_with(|| Expr::int(0));
        *entry = entry.clone() + coefficient;
    }
    Some(
        monomials
            .into_iter()
            .map(|(p, c)| (p, c.simplify()))
            .filter(|(_, c)| !c.is_zero())
            .collect(),
    )
}

/// roots of `a t^2 + b t + c`
pub fn solve_quadratic(a: &Expr, b: &Expr, c: &Expr) -> Vec<Expr> {
    if vanishes(a) {
        return solve_linear(b, c);
    }
    if vanishes(c) {
        // t (a t + b) = 0
        let mut roots = vec![Expr::int(0)];
        roots.extend(solve_linear(a, b));
        return roots;
    }
    let discriminant = (b.clone().pow(Expr::int(2)) - Expr::int(4) * a.clone() * c.clone())
        .simplify()
        .sqrt()
        .simplify();
    let two_a = Expr::int(2) * a.clone();
    vec![
        ((-b.clone() + discriminant.clone()) / two_a.clone()).simplify(),
        ((-b.clone() - discriminant) / two_a).simplify(),
    ]
}

/// root of `a t + b`
fn solve_linear(a: &Expr, b: &Expr) -> Vec<Expr> {
    if vanishes(a) {
        return vec![];
    }
    vec![(-b.clone() / a.clone()).simplify()]
}

/// roots of `a t^3 + b t^2 + c t + d` by Cardano's formula
pub fn solve_cubic(a: &Expr, b: &Expr, c: &Expr, d: &Expr) -> Vec<Expr> {
    if vanishes(a) {
        return solve_quadratic(b, c, d);
    }
    let (a, b, c, d) = (a.clone(), b.clone(), c.clone(), d.clone());
    let sq = |e: &Expr| e.clone().pow(Expr::int(2));
    let cube = |e: &Expr| e.clone().pow(Expr::int(3));
    let d0 = (sq(&b) - Expr::int(3) * a.clone() * c.clone()).simplify();
    let d1 = (Expr::int(2) * cube(&b) - Expr::int(9) * a.clone() * b.clone() * c.clone()
        + Expr::int(27) * sq(&a) * d.clone())
    .simplify();
    if vanishes(&d0) && vanishes(&d1) {
        // triple root
        return vec![(-b / (Expr::int(3) * a)).simplify()];
    }
    let root_of_disc = (sq(&d1) - Expr::int(4) * cube(&d0)).simplify().sqrt().simplify();
    let mut big_c = ((d1.clone() + root_of_disc.clone()) / Expr::int(2))
        .pow(rat(1, 3))
        .simplify();
    if vanishes(&big_c) {
        big_c = ((d1 - root_of_disc) / Expr::int(2)).pow(rat(1, 3)).simplify();
    }
    trace!("cardano: D0 = {}, C = {}", d0, big_c);
    roots_of_unity(3)
        .into_iter()
        .map(|xi| {
            let xi_c = (xi * big_c.clone()).simplify();
            (-(b.clone() + xi_c.clone() + d0.clone() / xi_c) / (Expr::int(3) * a.clone()))
                .simplify()
        })
        .collect()
}

/// roots of `a t^4 + b t^3 + c t^2 + d t + e` by Ferrari's method; `None` when the resolvent
/// degenerates
pub fn solve_quartic(a: &Expr, b: &Expr, c: &Expr, d: &Expr, e: &Expr) -> Option<Vec<Expr>> {
    if vanishes(a) {
        return Some(solve_cubic(b, c, d, e));
    }
    let (a, b, c, d, e) = (a.clone(), b.clone(), c.clone(), d.clone(), e.clone());
    let p = |base: &Expr, k: i64| base.clone().pow(Expr::int(k));
    let alpha = (rat(-3, 8) * p(&b, 2) / p(&a, 2) + c.clone() / a.clone()).simplify();
    let beta = (p(&b, 3) / (Expr::int(8) * p(&a, 3)) - b.clone() * c.clone() / (Expr::int(2) * p(&a, 2))
        + d.clone() / a.clone())
    .simplify();
    let gamma = (rat(-3, 256) * p(&b, 4) / p(&a, 4)
        + c.clone() * p(&b, 2) / (Expr::int(16) * p(&a, 3))
        - b.clone() * d.clone() / (Expr::int(4) * p(&a, 2))
        + e / a.clone())
    .simplify();
    let shift = (-b / (Expr::int(4) * a)).simplify();

    if vanishes(&beta) {
        // biquadratic in the depressed variable
        let inner = (p(&alpha, 2) - Expr::int(4) * gamma.clone()).simplify().sqrt();
        let mut roots = Vec::with_capacity(4);
        for s in [1, -1] {
            let square = ((-alpha.clone() + Expr::int(s) * inner.clone()) / Expr::int(2))
                .simplify()
                .sqrt();
            for t in [1, -1] {
                roots.push((shift.clone() + Expr::int(t) * square.clone()).simplify());
            }
        }
        return Some(roots);
    }

    let big_p = (-p(&alpha, 2) / Expr::int(12) - gamma.clone()).simplify();
    let big_q = (-p(&alpha, 3) / Expr::int(108) + alpha.clone() * gamma / Expr::int(3)
        - p(&beta, 2) / Expr::int(8))
    .simplify();
    let big_r = (-big_q.clone() / Expr::int(2)
        + (p(&big_q, 2) / Expr::int(4) + p(&big_p, 3) / Expr::int(27)).sqrt())
    .simplify();
    let big_u = big_r.pow(rat(1, 3)).simplify();
    let y = if vanishes(&big_u) {
        rat(-5, 6) * alpha.clone() - big_q.pow(rat(1, 3))
    } else {
        rat(-5, 6) * alpha.clone() + big_u.clone() - big_p / (Expr::int(3) * big_u)
    }
    .simplify();
    let w = (alpha.clone() + Expr::int(2) * y.clone()).simplify().sqrt().simplify();
    if vanishes(&w) {
        debug!("ferrari resolvent degenerates");
        return None;
    }
    let mut roots = Vec::with_capacity(4);
    for s in [1, -1] {
        let s = Expr::int(s);
        let radical = (-(Expr::int(3) * alpha.clone()
            + Expr::int(2) * y.clone()
            + s.clone() * Expr::int(2) * beta.clone() / w.clone()))
        .simplify()
        .sqrt();
        for t in [1, -1] {
            let root = shift.clone()
                + (s.clone() * w.clone() + Expr::int(t) * radical.clone()) / Expr::int(2);
            roots.push(root.simplify());
        }
    }
    Some(roots)
}

/// Roots of `expr` seen as a polynomial in `x`.
///
/// # Returns
/// `Ok(None)` when `expr` is not a polynomial in `x` the finder can handle (non-integer powers,
/// `x` inside functions, degree above four with more than two terms, too many terms after
/// expansion), otherwise the finite set of roots.
pub fn solve_polynomial(expr: &Expr, x: &Expr, ctx: &SolveContext) -> SolveResult<Option<Set>> {
    ctx.check_cancelled()?;
    let settings = ctx.settings();
    let Some(monomials) = monomial_map(expr, x, settings.max_expansion_terms) else {
        return Ok(None);
    };
    let Some(min_power) = monomials.keys().next().cloned() else {
        return Ok(None);
    };
    let mut roots = Vec::new();
    if min_power > BigInt::zero() {
        roots.push(Expr::int(0));
    }
    let shifted: BTreeMap<BigInt, Expr> = monomials
        .into_iter()
        .map(|(power, c)| (power - &min_power, c))
        .collect();
    let gcd = shifted
        .keys()
        .filter(|p| !p.is_zero())
        .fold(BigInt::zero(), |g, p| g.gcd(p));
    if gcd.is_zero() {
        // a nonzero constant is left
        return Ok(Some(Set::finite(roots)));
    }
    let reduced: BTreeMap<BigInt, Expr> = shifted
        .into_iter()
        .map(|(power, c)| (power / &gcd, c))
        .collect();
    let degree = reduced.keys().last().and_then(|d| d.to_u32()).unwrap_or(u32::MAX);
    if reduced.len() > 2 && degree > 4 {
        return Ok(None);
    }
    let coefficient = |k: i64| {
        reduced
            .get(&BigInt::from(k))
            .cloned()
            .unwrap_or_else(|| Expr::int(0))
    };
    debug!("polynomial of degree {} (power gcd {}) in {}", degree, gcd, x);
    let base_roots = match (reduced.len(), degree) {
        (2, 1) => solve_linear(&coefficient(1), &coefficient(0)),
        (_, 2) => solve_quadratic(&coefficient(2), &coefficient(1), &coefficient(0)),
        (_, 3) => solve_cubic(
            &coefficient(3),
            &coefficient(2),
            &coefficient(1),
            &coefficient(0),
        ),
        (_, 4) => match solve_quartic(
            &coefficient(4),
            &coefficient(3),
            &coefficient(2),
            &coefficient(1),
            &coefficient(0),
        ) {
            Some(roots) => roots,
            None => return Ok(None),
        },
        _ => return Ok(None),
    };

    if gcd.is_one() {
        roots.extend(base_roots);
    } else {
        let exponent = Expr::Const(Number::from_rational(BigRational::new(
            BigInt::one(),
            gcd.clone(),
        )));
        let omegas = match gcd.to_u32().filter(|g| *g <= settings.max_unity_roots) {
            Some(g) => roots_of_unity(g),
            None => {
                let k = expr.fresh_param("k", &[x]);
                debug!("{} branches kept as one family over {}", gcd, k);
                vec![unity_root_family(&gcd, &k)]
            }
        };
        for t in base_roots {
            let principal = t.pow(exponent.clone()).simplify();
            roots.extend(
                omegas
                    .iter()
                    .map(|w| (w.clone() * principal.clone()).simplify()),
            );
        }
    }
    Ok(Some(Set::finite(roots)))
}
