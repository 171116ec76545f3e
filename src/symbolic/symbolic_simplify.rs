//! # Symbolic Expression Simplification Module
//!
//! Exact algebraic simplification of symbolic expressions. The solver relies on it to detect
//! numeric zero, to keep coefficient arithmetic of the closed-form formulas small, and to fold
//! equal roots together.
//!
//! ## Simplification Strategy
//!
//! `simplify()` runs bottom-up passes until a fixpoint is reached (bounded number of passes):
//!
//! 1. **Sums**: flattened into `(coefficient, rest)` terms, like terms collected, rebuilt in a
//!    canonical order (symbolic terms sorted by their printed form, the constant last)
//! 2. **Products**: flattened into a coefficient and `(base, exponent)` factors, equal bases
//!    combined by adding exponents, negative exponents moved into a denominator
//! 3. **Powers**: exact integer powers, exact roots of perfect powers, extraction of perfect
//!    power factors, `(-a)^(1/2) = i a^(1/2)`, `b^(log_b z) = z`
//! 4. **Functions**: logarithms of exact powers, trigonometric values at rational multiples of π
//!    with denominators 1, 2, 3, 4, 6, inverse trigonometric values, `abs`, `signum`, `factorial`
//! 5. **Logic**: boolean folding, numeric comparison of relations, set membership, pruning of
//!    `Provided` and `Piecewise`
//! 6. **Approximate constants**: a node whose children are all numbers, one of them approximate,
//!    is evaluated numerically
//!
//! `expand()` distributes products over sums and expands small integer powers of sums.

use crate::symbolic::numbers::Number;
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::tree_analyzer::sum_terms;
use itertools::Itertools;
use num::{BigInt, BigRational, Integer, One, Signed, ToPrimitive, Zero};

/// upper bound of bottom-up passes in `simplify`
const MAX_PASSES: usize = 8;
/// largest root index handled exactly
const MAX_ROOT_INDEX: u32 = 64;
/// largest integer power of a sum expanded by `expand`
const MAX_EXPANDED_POWER: u32 = 6;
/// largest number of terms `expand` produces from one product
const MAX_EXPANDED_TERMS: usize = 64;

fn num(n: Number) -> Expr {
    Expr::Const(n)
}

fn rational_expr(r: BigRational) -> Expr {
    Expr::Const(Number::from_rational(r))
}

/// k·π
pub(crate) fn pi_times(k: BigRational) -> Expr {
    if k.is_zero() {
        Expr::int(0)
    } else if k.is_one() {
        Expr::Pi
    } else {
        Expr::Mul(rational_expr(k).boxed(), Expr::Pi.boxed())
    }
}

/// k when the argument is k·π with exact rational k
fn pi_multiple(arg: &Expr) -> Option<BigRational> {
    match arg {
        Expr::Pi => Some(BigRational::one()),
        Expr::Const(n) if n.is_zero() => Some(BigRational::zero()),
        Expr::Mul(c, rest) if **rest == Expr::Pi => c.as_number()?.as_rational(),
        _ => None,
    }
}

/// a^(1/2)/2 in canonical form
fn half_sqrt(a: i64) -> Expr {
    Expr::Mul(
        Expr::rational(1, 2).boxed(),
        Expr::Pow(Expr::int(a).boxed(), Expr::rational(1, 2).boxed()).boxed(),
    )
}

/// exact sin(kπ)
fn sin_pi_multiple(k: &BigRational) -> Option<Expr> {
    let two = BigRational::from_integer(BigInt::from(2));
    let mut k = k - &two * (k / &two).floor();
    let mut negate = false;
    if k >= BigRational::one() {
        k -= BigRational::one();
        negate = true;
    }
    let value = match (k.numer().to_i64()?, k.denom().to_i64()?) {
        (0, _) => Expr::int(0),
        (1, 6) | (5, 6) => Expr::rational(1, 2),
        (1, 4) | (3, 4) => half_sqrt(2),
        (1, 3) | (2, 3) => half_sqrt(3),
        (1, 2) => Expr::int(1),
        _ => return None,
    };
    if negate {
        Some(Expr::Mul(Expr::int(-1).boxed(), value.boxed()).simplify_node())
    } else {
        Some(value)
    }
}

fn cos_pi_multiple(k: &BigRational) -> Option<Expr> {
    sin_pi_multiple(&(k + BigRational::new(BigInt::one(), BigInt::from(2))))
}

/// principal value table shared by the inverse trigonometric functions
fn inverse_trig_table(arg: &Expr, table: &[(Expr, (i64, i64))]) -> Option<Expr> {
    table
        .iter()
        .find(|(value, _)| value == arg)
        .map(|(_, (p, q))| pi_times(BigRational::new(BigInt::from(*p), BigInt::from(*q))))
}

fn arcsin_table() -> Vec<(Expr, (i64, i64))> {
    vec![
        (Expr::int(0), (0, 1)),
        (Expr::rational(1, 2), (1, 6)),
        (Expr::rational(-1, 2), (-1, 6)),
        (half_sqrt(2), (1, 4)),
        (half_sqrt(3), (1, 3)),
        (Expr::int(1), (1, 2)),
        (Expr::int(-1), (-1, 2)),
    ]
}

fn arccos_table() -> Vec<(Expr, (i64, i64))> {
    vec![
        (Expr::int(1), (0, 1)),
        (Expr::rational(1, 2), (1, 3)),
        (half_sqrt(2), (1, 4)),
        (half_sqrt(3), (1, 6)),
        (Expr::int(0), (1, 2)),
        (Expr::rational(-1, 2), (2, 3)),
        (Expr::int(-1), (1, 1)),
    ]
}

fn arctg_table() -> Vec<(Expr, (i64, i64))> {
    vec![
        (Expr::int(0), (0, 1)),
        (Expr::int(1), (1, 4)),
        (Expr::int(-1), (-1, 4)),
    ]
}

fn arcctg_table() -> Vec<(Expr, (i64, i64))> {
    vec![
        (Expr::int(0), (1, 2)),
        (Expr::int(1), (1, 4)),
        (Expr::int(-1), (-1, 4)),
    ]
}

/// Split a simplified term into its numeric coefficient and the remaining factor.
///
/// Canonical products keep their coefficient as the left operand, so
/// `Mul(c, rest)` gives `(c, rest)` and `Div(Mul(c, rest), d)` gives `(c, rest / d)`.
pub(crate) fn split_coefficient(term: &Expr) -> (Number, Expr) {
    match term {
        Expr::Const(c) => (c.clone(), Expr::int(1)),
        Expr::Mul(c, rest) => match c.as_ref() {
            Expr::Const(c) => (c.clone(), rest.as_ref().clone()),
            _ => (Number::int(1), term.clone()),
        },
        Expr::Div(numer, denom) => match numer.as_ref() {
            Expr::Const(c) => (c.clone(), Expr::Div(Expr::int(1).boxed(), denom.clone())),
            Expr::Mul(c, rest) => match c.as_ref() {
                Expr::Const(c) => (c.clone(), Expr::Div(rest.clone(), denom.clone())),
                _ => (Number::int(1), term.clone()),
            },
            _ => (Number::int(1), term.clone()),
        },
        _ => (Number::int(1), term.clone()),
    }
}

/// Flatten nested Add/Sub expressions into signed `(coefficient, rest)` terms.
fn collect_terms(expr: &Expr, positive: bool, out: &mut Vec<(Number, Expr)>) {
    match expr {
        Expr::Add(a, b) => {
            collect_terms(a, positive, out);
            collect_terms(b, positive, out);
        }
        Expr::Sub(a, b) => {
            collect_terms(a, positive, out);
            collect_terms(b, !positive, out);
        }
        other => {
            let (c, rest) = split_coefficient(other);
            let c = if positive { c } else { -c };
            out.push((c, rest));
        }
    }
}

/// Flatten nested Mul/Div expressions into a coefficient and `(base, exponent)` factors.
///
/// Returns false when a literal zero divisor is met, the caller keeps the node as it is.
fn collect_factors(
    expr: &Expr,
    positive: bool,
    coef: &mut Number,
    factors: &mut Vec<(Expr, Expr)>,
) -> bool {
    match expr {
        Expr::Mul(a, b) => {
            collect_factors(a, positive, coef, factors) && collect_factors(b, positive, coef, factors)
        }
        Expr::Div(a, b) => {
            collect_factors(a, positive, coef, factors) && collect_factors(b, !positive, coef, factors)
        }
        Expr::Const(c) => {
            if positive {
                *coef = &*coef * c;
                true
            } else {
                match coef.checked_div(c) {
                    Some(v) => {
                        *coef = v;
                        true
                    }
                    None => false,
                }
            }
        }
        Expr::Pow(base, exp) => {
            let exp = if positive {
                exp.as_ref().clone()
            } else {
                negate(exp)
            };
            factors.push((base.as_ref().clone(), exp));
            true
        }
        other => {
            let exp = if positive { Expr::int(1) } else { Expr::int(-1) };
            factors.push((other.clone(), exp));
            true
        }
    }
}

fn negate(e: &Expr) -> Expr {
    match e {
        Expr::Const(c) => Expr::Const(-c.clone()),
        _ => Expr::Mul(Expr::int(-1).boxed(), e.clone().boxed()).simplify_node(),
    }
}

/// exponent with a negative leading coefficient
fn is_negative_exponent(e: &Expr) -> bool {
    split_coefficient(e).0.is_negative_real()
}

fn product_of(factors: Vec<Expr>) -> Option<Expr> {
    factors.into_iter().reduce(|acc, f| Expr::Mul(acc.boxed(), f.boxed()))
}

fn power_node(base: Expr, exp: Expr) -> Expr {
    if exp.is_one() {
        base
    } else {
        Expr::Pow(base.boxed(), exp.boxed())
    }
}

fn simplify_sum(expr: &Expr) -> Expr {
    let mut raw = Vec::new();
    collect_terms(expr, true, &mut raw);
    let mut grouped: Vec<(Number, Expr)> = Vec::new();
    for (c, rest) in raw {
        match grouped.iter_mut().find(|(_, r)| *r == rest) {
            Some(entry) => entry.0 = &entry.0 + &c,
            None => grouped.push((c, rest)),
        }
    }
    let constant_key = Expr::int(1);
    let mut terms: Vec<(Number, Expr)> = grouped.into_iter().filter(|(c, _)| !c.is_zero()).collect();
    if terms.is_empty() {
        return Expr::int(0);
    }
    terms.sort_by_key(|(_, rest)| (*rest == constant_key, rest.to_string()));
    let make_term = |c: &Number, rest: &Expr| -> Expr {
        if *rest == constant_key {
            num(c.clone())
        } else if c.is_one() {
            rest.clone()
        } else {
            simplify_product(&Expr::Mul(num(c.clone()).boxed(), rest.clone().boxed()))
        }
    };
    let mut iter = terms.iter();
    let Some((c0, r0)) = iter.next() else {
        return Expr::int(0);
    };
    let mut acc = make_term(c0, r0);
    for (c, rest) in iter {
        acc = if c.is_negative_real() {
            Expr::Sub(acc.boxed(), make_term(&-c.clone(), rest).boxed())
        } else {
            Expr::Add(acc.boxed(), make_term(c, rest).boxed())
        };
    }
    acc
}

fn simplify_product(expr: &Expr) -> Expr {
    let mut coef = Number::int(1);
    let mut raw = Vec::new();
    if !collect_factors(expr, true, &mut coef, &mut raw) {
        return expr.clone();
    }
    // x^a * x^b = x^(a + b)
    let mut grouped: Vec<(Expr, Expr)> = Vec::new();
    for (base, exp) in raw {
        match grouped.iter_mut().find(|(b, _)| *b == base) {
            Some(entry) => {
                entry.1 = Expr::Add(entry.1.clone().boxed(), exp.boxed()).simplify_node();
            }
            None => grouped.push((base, exp)),
        }
    }
    let mut factors: Vec<(Expr, Expr)> = Vec::new();
    for (base, exp) in grouped {
        match simplify_pow(base, exp) {
            Expr::Const(c) => coef = &coef * &c,
            Expr::Pow(b, e) => factors.push((*b, *e)),
            Expr::Mul(c, rest) if matches!(c.as_ref(), Expr::Const(_)) => {
                if let Expr::Const(c) = *c {
                    coef = &coef * &c;
                }
                match *rest {
                    Expr::Pow(b, e) => factors.push((*b, *e)),
                    other => factors.push((other, Expr::int(1))),
                }
            }
            other => factors.push((other, Expr::int(1))),
        }
    }
    if coef.is_zero() {
        return Expr::int(0); // 0 * x = 0
    }
    factors.sort_by_key(|(base, _)| base.to_string());
    let (denominator, numerator): (Vec<_>, Vec<_>) =
        factors.into_iter().partition(|(_, e)| is_negative_exponent(e));
    let numerator = product_of(
        numerator
            .into_iter()
            .map(|(b, e)| power_node(b, e))
            .collect(),
    );
    let denominator = product_of(
        denominator
            .into_iter()
            .map(|(b, e)| power_node(b, negate(&e)))
            .collect(),
    );
    let numerator = match numerator {
        None => num(coef),
        Some(rest) if coef.is_one() => rest,
        Some(rest) => Expr::Mul(num(coef).boxed(), rest.boxed()),
    };
    match denominator {
        None => numerator,
        Some(den) => Expr::Div(numerator.boxed(), den.boxed()),
    }
}

fn simplify_pow(base: Expr, exp: Expr) -> Expr {
    if exp.is_zero() {
        return Expr::int(1); // x^0 = 1
    }
    if exp.is_one() {
        return base; // x^1 = x
    }
    if base.is_one() {
        return Expr::int(1); // 1^x = 1
    }
    if base.is_zero() && exp.as_number().is_some_and(|n| n.is_positive_real()) {
        return Expr::int(0); // 0^a = 0, a > 0
    }
    match (&base, &exp) {
        (Expr::Const(b), Expr::Const(e)) if b.is_exact() && e.is_exact() => {
            if let Some(n) = e.as_integer() {
                return match b.pow_int(&n) {
                    Some(v) => num(v),
                    None => Expr::Pow(base.boxed(), exp.boxed()),
                };
            }
            if let Some(r) = e.as_rational() {
                if let Some(v) = rational_power(b, &r) {
                    return v;
                }
            }
            Expr::Pow(base.boxed(), exp.boxed())
        }
        (Expr::Const(_), Expr::Const(_)) => fold_numeric(Expr::Pow(base.boxed(), exp.boxed())),
        // (a^b)^n = a^(b n) for integer n
        (Expr::Pow(inner, e1), Expr::Const(e)) if e.is_integer() => simplify_pow(
            inner.as_ref().clone(),
            Expr::Mul(e1.clone(), exp.clone().boxed()).simplify_node(),
        ),
        // (a b)^n = a^n b^n for integer n
        (Expr::Mul(..) | Expr::Div(..), Expr::Const(e)) if e.is_integer() => {
            let mut coef = Number::int(1);
            let mut factors = Vec::new();
            if !collect_factors(&base, true, &mut coef, &mut factors) {
                return Expr::Pow(base.boxed(), exp.boxed());
            }
            let mut powered = vec![simplify_pow(num(coef), exp.clone())];
            for (b, e) in factors {
                powered.push(Expr::Pow(
                    b.boxed(),
                    Expr::Mul(e.boxed(), exp.clone().boxed()).simplify_node().boxed(),
                ));
            }
            match product_of(powered) {
                Some(p) => simplify_product(&p),
                None => Expr::int(1),
            }
        }
        // b^(log_b z) = z
        (b, Expr::Log(log_base, z)) if **log_base == *b => z.as_ref().clone(),
        _ => Expr::Pow(base.boxed(), exp.boxed()),
    }
}

/// b^(p/q) for an exact base and a non-integer rational exponent
fn rational_power(b: &Number, r: &BigRational) -> Option<Expr> {
    let q = r.denom().to_u32().filter(|q| *q <= MAX_ROOT_INDEX)?;
    let p = r.numer().clone();
    let base = b.as_rational()?;
    if base.is_negative() {
        let magnitude = Expr::Pow(
            rational_expr(-base).boxed(),
            rational_expr(r.clone()).boxed(),
        );
        let sign = if q % 2 == 1 {
            // real odd root of a negative number
            if p.is_odd() { Number::int(-1) } else { Number::int(1) }
        } else if q == 2 {
            // (-a)^(p/2) = i^p a^(p/2)
            Number::imaginary_unit().pow_int(&p)?
        } else {
            return None;
        };
        return Some(simplify_product(&Expr::Mul(
            num(sign).boxed(),
            magnitude.boxed(),
        )));
    }
    if let Some(root) = Number::from_rational(base.clone()).exact_root(q) {
        return root.pow_int(&p).map(num);
    }
    // b^(p/q) = b^k b^(s/q) with p = k q + s
    let (k, s) = p.div_mod_floor(&BigInt::from(q));
    if !k.is_zero() {
        let whole = Number::from_rational(base.clone()).pow_int(&k)?;
        let rest = Expr::Pow(
            rational_expr(base).boxed(),
            rational_expr(BigRational::new(s, BigInt::from(q))).boxed(),
        );
        return Some(simplify_product(&Expr::Mul(num(whole).boxed(), rest.boxed())));
    }
    // pull perfect powers out of numerator and denominator
    let (num_out, num_in) = Number::extract_root(base.numer(), q);
    let (den_out, den_in) = Number::extract_root(base.denom(), q);
    if num_out.is_one() && den_out.is_one() {
        return None;
    }
    let outside = Number::from_rational(BigRational::new(num_out, den_out)).pow_int(&p)?;
    let inside = Expr::Pow(
        rational_expr(BigRational::new(num_in, den_in)).boxed(),
        rational_expr(r.clone()).boxed(),
    );
    Some(simplify_product(&Expr::Mul(num(outside).boxed(), inside.boxed())))
}

fn simplify_log(base: Expr, arg: Expr) -> Expr {
    if arg.is_one() {
        return Expr::int(0); // log_b 1 = 0
    }
    if arg == base {
        return Expr::int(1); // log_b b = 1
    }
    if let Expr::Pow(b, k) = &arg {
        if **b == base {
            return k.as_ref().clone(); // log_b b^k = k
        }
    }
    if let (Expr::E, Expr::Const(a)) = (&base, &arg) {
        if let Some(multiple) = principal_ln_of_unit(a) {
            return Expr::Mul(num(multiple).boxed(), Expr::Pi.boxed());
        }
    }
    if let (Expr::Const(b), Expr::Const(a)) = (&base, &arg) {
        if let (Some(b), Some(a)) = (b.as_rational(), a.as_rational()) {
            if let Some(k) = exact_log(&b, &a) {
                return Expr::int(k);
            }
        }
        if !b.is_exact() || !a.is_exact() {
            return fold_numeric(Expr::Log(base.boxed(), arg.boxed()));
        }
    }
    Expr::Log(base.boxed(), arg.boxed())
}

/// `c` with `ln(a) = c·π` on the principal branch, for `a` in `{-1, i, -i}`
fn principal_ln_of_unit(a: &Number) -> Option<Number> {
    let half = BigRational::new(BigInt::one(), BigInt::from(2));
    if *a == Number::int(-1) {
        Some(Number::imaginary_unit())
    } else if *a == Number::imaginary_unit() {
        Some(Number::complex(BigRational::zero(), half))
    } else if *a == -Number::imaginary_unit() {
        Some(Number::complex(BigRational::zero(), -half))
    } else {
        None
    }
}

/// integer k with b^k = a for positive rationals
fn exact_log(b: &BigRational, a: &BigRational) -> Option<i64> {
    if !b.is_positive() || !a.is_positive() || b.is_one() {
        return None;
    }
    let size = |r: &BigRational| r.numer().bits() + r.denom().bits();
    let limit = size(a);
    let (mut up, mut down) = (BigRational::one(), BigRational::one());
    for k in 0..=64i64 {
        if up == *a {
            return Some(k);
        }
        if down == *a {
            return Some(-k);
        }
        if size(&up) > limit && size(&down) > limit {
            break;
        }
        up *= b;
        down /= b;
    }
    None
}

fn simplify_trig(expr: &Expr) -> Expr {
    match expr {
        Expr::sin(a) => match a.as_ref() {
            Expr::arcsin(z) => z.as_ref().clone(), // sin(arcsin(z)) = z
            arg => pi_multiple(arg)
                .and_then(|k| sin_pi_multiple(&k))
                .unwrap_or_else(|| expr.clone()),
        },
        Expr::cos(a) => match a.as_ref() {
            Expr::arccos(z) => z.as_ref().clone(),
            arg => pi_multiple(arg)
                .and_then(|k| cos_pi_multiple(&k))
                .unwrap_or_else(|| expr.clone()),
        },
        Expr::tg(a) => match a.as_ref() {
            Expr::arctg(z) => z.as_ref().clone(),
            arg => ratio_at_pi_multiple(arg, false).unwrap_or_else(|| expr.clone()),
        },
        Expr::ctg(a) => match a.as_ref() {
            Expr::arcctg(z) => z.as_ref().clone(),
            arg => ratio_at_pi_multiple(arg, true).unwrap_or_else(|| expr.clone()),
        },
        Expr::sec(a) => pi_multiple(a)
            .and_then(|k| cos_pi_multiple(&k))
            .filter(|c| !c.is_zero())
            .map(|c| Expr::Div(Expr::int(1).boxed(), c.boxed()).simplify())
            .unwrap_or_else(|| expr.clone()),
        Expr::cosec(a) => pi_multiple(a)
            .and_then(|k| sin_pi_multiple(&k))
            .filter(|s| !s.is_zero())
            .map(|s| Expr::Div(Expr::int(1).boxed(), s.boxed()).simplify())
            .unwrap_or_else(|| expr.clone()),
        _ => expr.clone(),
    }
}

/// tg or ctg at k·π, undefined points stay symbolic
fn ratio_at_pi_multiple(arg: &Expr, cotangent: bool) -> Option<Expr> {
    let k = pi_multiple(arg)?;
    let s = sin_pi_multiple(&k)?;
    let c = cos_pi_multiple(&k)?;
    let (n, d) = if cotangent { (c, s) } else { (s, c) };
    if d.is_zero() {
        return None;
    }
    Some(Expr::Div(n.boxed(), d.boxed()).simplify())
}

fn simplify_inverse_trig(expr: &Expr) -> Expr {
    let found = match expr {
        Expr::arcsin(a) => inverse_trig_table(a, &arcsin_table()),
        Expr::arccos(a) => inverse_trig_table(a, &arccos_table()),
        Expr::arctg(a) => inverse_trig_table(a, &arctg_table()),
        Expr::arcctg(a) => inverse_trig_table(a, &arcctg_table()),
        // arcsec(z) = arccos(1/z), arccosec(z) = arcsin(1/z)
        Expr::arcsec(a) | Expr::arccosec(a) if !a.is_zero() && a.as_number().is_some() => {
            let recip = Expr::Div(Expr::int(1).boxed(), a.clone()).simplify_node();
            let table = if matches!(expr, Expr::arcsec(_)) {
                arccos_table()
            } else {
                arcsin_table()
            };
            inverse_trig_table(&recip, &table)
        }
        _ => None,
    };
    found.unwrap_or_else(|| expr.clone())
}

fn simplify_arithmetic_function(expr: &Expr) -> Expr {
    match expr {
        Expr::abs(a) => match a.as_ref() {
            Expr::Const(c) if c.is_exact() => match (c.abs_real(), c) {
                (Some(v), _) => num(v),
                (None, Number::Exact(z)) => {
                    let norm = &z.re * &z.re + &z.im * &z.im;
                    simplify_pow(rational_expr(norm), Expr::rational(1, 2))
                }
                _ => expr.clone(),
            },
            Expr::Pi | Expr::E => a.as_ref().clone(),
            Expr::abs(_) => a.as_ref().clone(),
            _ => expr.clone(),
        },
        Expr::signum(a) => match a.as_ref() {
            Expr::Const(c) => c.signum_real().map(num).unwrap_or_else(|| expr.clone()),
            Expr::Pi | Expr::E => Expr::int(1),
            _ => expr.clone(),
        },
        Expr::factorial(a) => match a.as_ref().as_number().and_then(|n| n.as_i64()) {
            Some(n) if (0..=20).contains(&n) => {
                let f: BigInt = (1..=n).map(BigInt::from).product();
                num(Number::from_bigint(f))
            }
            _ => expr.clone(),
        },
        _ => expr.clone(),
    }
}

/// numeric comparison of two sides: `Some(ordering)` when both evaluate to reals
fn compare_sides(a: &Expr, b: &Expr) -> Option<std::cmp::Ordering> {
    if let (Expr::Const(x), Expr::Const(y)) = (a, b) {
        if let Some(ord) = x.partial_cmp_real(y) {
            return Some(ord);
        }
    }
    if !a.is_numeric() || !b.is_numeric() {
        return None;
    }
    let (va, vb) = (a.eval_complex()?, b.eval_complex()?);
    let scale = va.norm().max(vb.norm()).max(1.0);
    if va.im.abs() > 1e-12 * scale || vb.im.abs() > 1e-12 * scale {
        return None;
    }
    if (va.re - vb.re).abs() <= 1e-12 * scale {
        return Some(std::cmp::Ordering::Equal);
    }
    va.re.partial_cmp(&vb.re)
}

fn simplify_logic(expr: &Expr) -> Expr {
    use std::cmp::Ordering::*;
    match expr {
        Expr::Not(a) => match a.as_ref() {
            Expr::Bool(b) => Expr::Bool(!b),
            Expr::Not(inner) => inner.as_ref().clone(), // not not a = a
            _ => expr.clone(),
        },
        Expr::And(a, b) => match (a.as_ref(), b.as_ref()) {
            (Expr::Bool(false), _) | (_, Expr::Bool(false)) => Expr::Bool(false),
            (Expr::Bool(true), other) | (other, Expr::Bool(true)) => other.clone(),
            _ if a == b => a.as_ref().clone(),
            _ => expr.clone(),
        },
        Expr::Or(a, b) => match (a.as_ref(), b.as_ref()) {
            (Expr::Bool(true), _) | (_, Expr::Bool(true)) => Expr::Bool(true),
            (Expr::Bool(false), other) | (other, Expr::Bool(false)) => other.clone(),
            _ if a == b => a.as_ref().clone(),
            _ => expr.clone(),
        },
        Expr::Xor(a, b) => match (a.as_ref(), b.as_ref()) {
            (Expr::Bool(x), Expr::Bool(y)) => Expr::Bool(x != y),
            (Expr::Bool(false), other) | (other, Expr::Bool(false)) => other.clone(),
            _ => expr.clone(),
        },
        Expr::Implies(a, b) => match (a.as_ref(), b.as_ref()) {
            (Expr::Bool(false), _) | (_, Expr::Bool(true)) => Expr::Bool(true),
            (Expr::Bool(true), other) => other.clone(),
            _ => expr.clone(),
        },
        Expr::Equals(a, b) => {
            if a == b {
                return Expr::Bool(true);
            }
            match (a.as_ref(), b.as_ref()) {
                (Expr::Const(x), Expr::Const(y)) if x.is_exact() && y.is_exact() => {
                    Expr::Bool(x == y)
                }
                (Expr::Bool(x), Expr::Bool(y)) => Expr::Bool(x == y),
                _ => match (a.is_numeric() && b.is_numeric(), a.eval_complex(), b.eval_complex()) {
                    (true, Some(x), Some(y)) => {
                        Expr::Bool((x - y).norm() <= 1e-12 * x.norm().max(y.norm()).max(1.0))
                    }
                    _ => expr.clone(),
                },
            }
        }
        Expr::Greater(a, b) => compare_sides(a, b)
            .map(|o| Expr::Bool(o == Greater))
            .unwrap_or_else(|| expr.clone()),
        Expr::GreaterOrEqual(a, b) => compare_sides(a, b)
            .map(|o| Expr::Bool(o != Less))
            .unwrap_or_else(|| expr.clone()),
        Expr::Less(a, b) => compare_sides(a, b)
            .map(|o| Expr::Bool(o == Less))
            .unwrap_or_else(|| expr.clone()),
        Expr::LessOrEqual(a, b) => compare_sides(a, b)
            .map(|o| Expr::Bool(o != Greater))
            .unwrap_or_else(|| expr.clone()),
        Expr::In(elem, set) => match set.contains(elem) {
            Some(b) => Expr::Bool(b),
            None => expr.clone(),
        },
        _ => expr.clone(),
    }
}

fn simplify_conditions(expr: &Expr) -> Expr {
    match expr {
        Expr::Provided(inner, pred) => match (inner.as_ref(), pred.as_ref()) {
            (_, Expr::Bool(true)) => inner.as_ref().clone(),
            // (a provided p) provided q = a provided (p and q)
            (Expr::Provided(e, p), _) => Expr::Provided(
                e.clone(),
                simplify_logic(&Expr::And(p.clone(), pred.clone())).boxed(),
            ),
            _ => expr.clone(),
        },
        Expr::Piecewise(pieces) => {
            let kept: Vec<(Expr, Expr)> = pieces
                .iter()
                .filter(|(_, c)| *c != Expr::Bool(false))
                .cloned()
                .collect();
            match kept.first() {
                Some((e, Expr::Bool(true))) => e.clone(),
                _ => Expr::Piecewise(kept),
            }
        }
        _ => expr.clone(),
    }
}

/// evaluates a node numerically when a child is an approximate number
fn fold_numeric(expr: Expr) -> Expr {
    let children = expr.children();
    let all_numbers = !children.is_empty() && children.iter().all(|c| c.as_number().is_some());
    let any_approx = children
        .iter()
        .any(|c| matches!(c, Expr::Const(Number::Approx(_))));
    if all_numbers && any_approx && expr.is_numeric() {
        if let Some(v) = expr.eval_complex() {
            return Expr::Const(Number::Approx(v));
        }
    }
    expr
}

impl Expr {
    /// Simplify the expression to a fixpoint.
    ///
    /// # Examples
    /// ```rust, ignore
    /// let x = Expr::var("x");
    /// let e = (x.clone() + x.clone() - Expr::int(2) * x).simplify();
    /// assert_eq!(e, Expr::int(0));
    /// ```
    pub fn simplify(&self) -> Expr {
        let mut current = self.clone();
        for _ in 0..MAX_PASSES {
            let next = current.simplify_pass();
            if next == current {
                return next;
            }
            current = next;
        }
        current
    }

    fn simplify_pass(&self) -> Expr {
        self.map_children(&mut |child| child.simplify_pass())
            .simplify_node()
    }

    /// rules of a single node, children are assumed simplified
    pub(crate) fn simplify_node(&self) -> Expr {
        let result = match self {
            Expr::Add(..) | Expr::Sub(..) => simplify_sum(self),
            Expr::Mul(..) | Expr::Div(..) => simplify_product(self),
            Expr::Pow(b, e) => simplify_pow(b.as_ref().clone(), e.as_ref().clone()),
            Expr::Log(b, a) => simplify_log(b.as_ref().clone(), a.as_ref().clone()),
            Expr::sin(_)
            | Expr::cos(_)
            | Expr::tg(_)
            | Expr::ctg(_)
            | Expr::sec(_)
            | Expr::cosec(_) => simplify_trig(self),
            Expr::arcsin(_)
            | Expr::arccos(_)
            | Expr::arctg(_)
            | Expr::arcctg(_)
            | Expr::arcsec(_)
            | Expr::arccosec(_) => simplify_inverse_trig(self),
            Expr::abs(_) | Expr::signum(_) | Expr::factorial(_) => {
                simplify_arithmetic_function(self)
            }
            Expr::Not(_)
            | Expr::And(..)
            | Expr::Or(..)
            | Expr::Xor(..)
            | Expr::Implies(..)
            | Expr::Equals(..)
            | Expr::Greater(..)
            | Expr::GreaterOrEqual(..)
            | Expr::Less(..)
            | Expr::LessOrEqual(..)
            | Expr::In(..) => simplify_logic(self),
            Expr::Provided(..) | Expr::Piecewise(_) => simplify_conditions(self),
            Expr::Set(set) => Expr::Set(set.simplify().boxed()),
            _ => self.clone(),
        };
        fold_numeric(result)
    }

    /// Distributes products over sums and expands small integer powers of sums.
    pub fn expand(&self) -> Expr {
        let expanded = self.map_children(&mut |child| child.expand());
        match &expanded {
            Expr::Mul(a, b) => {
                let (ta, tb) = (sum_terms(a), sum_terms(b));
                if ta.len() * tb.len() > MAX_EXPANDED_TERMS || ta.len() * tb.len() == 1 {
                    return expanded;
                }
                ta.iter()
                    .cartesian_product(tb.iter())
                    .map(|(p, q)| Expr::Mul(p.clone().boxed(), q.clone().boxed()))
                    .reduce(|acc, t| Expr::Add(acc.boxed(), t.boxed()))
                    .unwrap_or(expanded)
            }
            Expr::Div(a, d) => {
                let ta = sum_terms(a);
                if ta.len() == 1 {
                    return expanded;
                }
                ta.into_iter()
                    .map(|t| Expr::Div(t.boxed(), d.clone()))
                    .reduce(|acc, t| Expr::Add(acc.boxed(), t.boxed()))
                    .unwrap_or(expanded)
            }
            Expr::Pow(base, e) => {
                let n = e.as_number().and_then(|n| n.as_i64()).unwrap_or(0);
                if n < 2 || n > MAX_EXPANDED_POWER as i64 || sum_terms(base).len() < 2 {
                    return expanded;
                }
                let mut acc = base.as_ref().clone();
                for _ in 1..n {
                    acc = Expr::Mul(acc.boxed(), base.clone()).expand();
                }
                acc
            }
            _ => expanded,
        }
    }
}
