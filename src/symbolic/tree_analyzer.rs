//! # Tree analysis helpers
//!
//! Structural queries over expression trees used by the simplifier and the solver:
//! flattening of sums and products, monomial parsing, the minimum subtree search of the
//! substitution step, alternate forms of an expression, linear decomposition and roots of unity.
use crate::symbolic::numbers::Number;
use crate::symbolic::symbolic_engine::Expr;
use num::{BigInt, BigRational, One, Zero};

/// Additive terms of an expression; subtracted terms carry a `-1` factor.
pub fn sum_terms(expr: &Expr) -> Vec<Expr> {
    let mut out = Vec::new();
    collect_sum(expr, true, &mut out);
    out
}

fn collect_sum(expr: &Expr, positive: bool, out: &mut Vec<Expr>) {
    match expr {
        Expr::Add(a, b) => {
            collect_sum(a, positive, out);
            collect_sum(b, positive, out);
        }
        Expr::Sub(a, b) => {
            collect_sum(a, positive, out);
            collect_sum(b, !positive, out);
        }
        other if positive => out.push(other.clone()),
        other => out.push(Expr::Mul(Expr::int(-1).boxed(), other.clone().boxed())),
    }
}

/// Multiplicative factors of an expression; divisors become `d^(-1)`.
pub fn product_factors(expr: &Expr) -> Vec<Expr> {
    let mut out = Vec::new();
    collect_product(expr, true, &mut out);
    out
}

fn collect_product(expr: &Expr, positive: bool, out: &mut Vec<Expr>) {
    match expr {
        Expr::Mul(a, b) => {
            collect_product(a, positive, out);
            collect_product(b, positive, out);
        }
        Expr::Div(a, b) => {
            collect_product(a, positive, out);
            collect_product(b, !positive, out);
        }
        other if positive => out.push(other.clone()),
        Expr::Pow(base, exp) => out.push(Expr::Pow(
            base.clone(),
            (Expr::int(-1) * exp.as_ref().clone()).simplify().boxed(),
        )),
        other => out.push(Expr::Pow(other.clone().boxed(), Expr::int(-1).boxed())),
    }
}

/// Expanded, simplified additive terms; `None` when expansion would exceed `max_terms`.
pub fn gather_linear_children_over_sum_and_expand(expr: &Expr, max_terms: usize) -> Option<Vec<Expr>> {
    let expanded = expr.expand();
    let terms = sum_terms(&expanded);
    if terms.len() > max_terms {
        return None;
    }
    Some(
        terms
            .into_iter()
            .map(|t| t.simplify())
            .filter(|t| !t.is_zero())
            .collect(),
    )
}

/// Split a product term into `(coefficient, power of x)`.
///
/// Returns `None` when a factor carries `x` in any form other than `x^n` with integer `n`.
pub fn parse_monomial(term: &Expr, x: &Expr) -> Option<(Expr, BigInt)> {
    if !term.contains_node(x) {
        return Some((term.clone(), BigInt::zero()));
    }
    let mut power = BigInt::zero();
    let mut coefficient = Vec::new();
    for factor in product_factors(term) {
        if factor == *x {
            power += 1;
            continue;
        }
        if !factor.contains_node(x) {
            coefficient.push(factor);
            continue;
        }
        match &factor {
            Expr::Pow(base, exp) if **base == *x => {
                power += exp.as_number()?.as_integer()?;
            }
            _ => return None,
        }
    }
    let coefficient = coefficient
        .into_iter()
        .reduce(|acc, f| acc * f)
        .unwrap_or_else(|| Expr::int(1))
        .simplify();
    Some((coefficient, power))
}

/// Smallest sub-expression holding every occurrence of `x`.
///
/// Walks the pre-order node list up to the first occurrence of `x` and keeps the last node
/// `s` containing `x` with `count(expr, s) * count(s, x) == count(expr, x)`. The whole
/// expression always qualifies unless it is `x` itself.
pub fn minimum_subtree(expr: &Expr, x: &Expr) -> Expr {
    let total = expr.count_occurrences(x);
    expr.nodes()
        .into_iter()
        .take_while(|n| *n != x)
        .filter(|n| n.contains_node(x))
        .filter(|n| expr.count_occurrences(n) * n.count_occurrences(x) == total)
        .last()
        .cloned()
        .unwrap_or_else(|| x.clone())
}

/// Structurally different equivalent forms, simplest first, at most `max` of them.
pub fn alternate_forms(expr: &Expr, max: usize) -> Vec<Expr> {
    let simplified = expr.simplify();
    let expanded = expr.expand().simplify();
    let mut forms: Vec<Expr> = Vec::new();
    for form in [simplified, expanded, expr.clone()] {
        if !forms.contains(&form) {
            forms.push(form);
        }
    }
    forms.truncate(max);
    forms
}

/// `(a, b)` with `expr = a·x + b` and both free of `x`.
pub fn try_get_poly_linear(expr: &Expr, x: &Expr) -> Option<(Expr, Expr)> {
    if !expr.contains_node(x) {
        return None;
    }
    let mut a = Expr::int(0);
    let mut b = Expr::int(0);
    for term in sum_terms(&expr.expand()) {
        let (coef, power) = parse_monomial(&term, x)?;
        if power.is_zero() {
            b = b + coef;
        } else if power.is_one() {
            a = a + coef;
        } else {
            return None;
        }
    }
    let a = a.simplify();
    if a.is_zero() {
        return None;
    }
    Some((a, b.simplify()))
}

/// The `n` complex `n`-th roots of unity `cos(2πk/n) + i·sin(2πk/n)`, `k = 0..n`.
pub fn roots_of_unity(n: u32) -> Vec<Expr> {
    let n = n.max(1);
    (0..n)
        .map(|k| {
            if k == 0 {
                return Expr::int(1);
            }
            let angle = Expr::Mul(
                Expr::Const(Number::from_rational(BigRational::new(
                    BigInt::from(2 * k),
                    BigInt::from(n),
                )))
                .boxed(),
                Expr::Pi.boxed(),
            );
            (Expr::cos(angle.clone().boxed()) + Expr::i() * Expr::sin(angle.boxed())).simplify()
        })
        .collect()
}

/// All `n`-th roots of unity as one family `cos(2πk/n) + i·sin(2πk/n)` over the integer
/// parameter `k`.
pub fn unity_root_family(n: &BigInt, k: &Expr) -> Expr {
    let angle = Expr::Const(Number::from_rational(BigRational::new(BigInt::from(2), n.clone())))
        * Expr::Pi
        * k.clone();
    (Expr::cos(angle.clone().boxed()) + Expr::i() * Expr::sin(angle.boxed())).simplify()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sum_terms_signs() {
        let x = Expr::var("x");
        let e = x.clone() - Expr::int(2) + x.clone();
        let terms = sum_terms(&e);
        assert_eq!(terms.len(), 3);
        assert_eq!(terms[1], Expr::int(-1) * Expr::int(2));
    }

    #[test]
    fn test_parse_monomial() {
        let x = Expr::var("x");
        let term = Expr::int(3) * x.clone().pow(Expr::int(2)) / x.clone();
        let (coef, power) = parse_monomial(&term, &x).unwrap();
        assert_eq!(coef, Expr::int(3));
        assert_eq!(power, BigInt::from(1));
        let bad = Expr::sin(x.clone().boxed());
        assert!(parse_monomial(&bad, &x).is_none());
        let fractional = x.clone().pow(Expr::rational(1, 2));
        assert!(parse_monomial(&fractional, &x).is_none());
    }

    #[test]
    fn test_minimum_subtree() {
        let x = Expr::var("x");
        let s = Expr::sin(x.clone().boxed());
        let e = s.clone().pow(Expr::int(2)) + s.clone() - Expr::int(2);
        assert_eq!(minimum_subtree(&e, &x), s);
        let mixed = x.clone() + Expr::sin(x.clone().boxed());
        assert_eq!(minimum_subtree(&mixed, &x), mixed);
        assert_eq!(minimum_subtree(&x, &x), x);
    }

    #[test]
    fn test_poly_linear() {
        let x = Expr::var("x");
        let e = Expr::int(2) * x.clone() + Expr::int(3) - x.clone();
        let (a, b) = try_get_poly_linear(&e, &x).unwrap();
        assert_eq!(a, Expr::int(1));
        assert_eq!(b, Expr::int(3));
        assert!(try_get_poly_linear(&(x.clone() * x.clone()), &x).is_none());
    }

    #[test]
    fn test_roots_of_unity() {
        for n in [1u32, 2, 3, 4, 5] {
            let roots = roots_of_unity(n);
            assert_eq!(roots.len(), n as usize);
            for r in roots {
                let v = r.pow(Expr::int(n as i64)).eval_complex().unwrap();
                assert_relative_eq!(v.re, 1.0, epsilon = 1e-9);
                assert_relative_eq!(v.im, 0.0, epsilon = 1e-9);
            }
        }
        assert_eq!(roots_of_unity(2)[1], Expr::int(-1));
    }

    #[test]
    fn test_unity_root_family() {
        let k = Expr::Param("k".to_string());
        let family = unity_root_family(&BigInt::from(1000), &k);
        for step in [0.0, 1.0, 250.0, 999.0] {
            let v = family
                .clone()
                .pow(Expr::int(1000))
                .eval_complex_with(&[("k", num_complex::Complex64::new(step, 0.0))])
                .unwrap();
            assert_relative_eq!(v.re, 1.0, epsilon = 1e-6);
            assert_relative_eq!(v.im, 0.0, epsilon = 1e-6);
        }
    }
}
