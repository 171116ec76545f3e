//! # Node inversion
//!
//! "If this node equals `value`, what can the distinguished sub-expression `x` be?"
//!
//! Every node kind knows how to move one step towards `x`: the child holding `x` receives a new
//! value computed from the old one, and the recursion stops when it reaches `x` itself.
//! Periodic functions introduce a fresh integer parameter `n`, `signum` and `abs` introduce a
//! fresh free parameter `r` restricted by a `Provided` guard.
//!
//! Candidates are simplified and only the defined ones are returned (no division by zero,
//! no guard that folded to `false`).
use crate::solver::errors::{SolveError, SolveResult};
use crate::symbolic::numbers::Number;
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_sets::{Set, SpecialSet};
use crate::symbolic::tree_analyzer::{roots_of_unity, unity_root_family};
use log::trace;
use num::{BigInt, BigRational, One, Signed, ToPrimitive, Zero};
use std::f64::consts::PI;

/// default bound on the number of branches of `x^n = v` listed one by one
pub const DEFAULT_UNITY_ROOTS: u32 = 128;

/// largest fixed part of a union whose subsets are enumerated
const MAX_POWER_SET_BASE: usize = 12;

/// slack of the principal value gate of inverse trigonometric functions
const RANGE_SLACK: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Side {
    Left,
    Right,
    Both,
}

fn side(a: &Expr, b: &Expr, x: &Expr) -> Side {
    match (a.contains_node(x), b.contains_node(x)) {
        (true, false) => Side::Left,
        (false, true) => Side::Right,
        _ => Side::Both,
    }
}

/// `Re v` within `[low, high]`; values that cannot be evaluated pass
fn in_principal_range(v: &Expr, low: f64, high: f64) -> bool {
    match v.eval_complex() {
        Some(z) => z.re >= low - RANGE_SLACK && z.re <= high + RANGE_SLACK,
        None => true,
    }
}

struct Inverter<'a> {
    x: &'a Expr,
    max_unity_roots: u32,
}

impl Inverter<'_> {
    fn child(&self, child: &Expr, value: Expr) -> SolveResult<Vec<Expr>> {
        child.invert_bounded(&value, self.x, self.max_unity_roots)
    }

    fn children(&self, child: &Expr, values: Vec<Expr>) -> SolveResult<Vec<Expr>> {
        let mut out = Vec::new();
        for value in values {
            out.extend(self.child(child, value)?);
        }
        Ok(out)
    }

    fn guarded(&self, child: &Expr, value: Expr, guard: &Expr) -> SolveResult<Vec<Expr>> {
        Ok(self
            .child(child, value)?
            .into_iter()
            .map(|c| {
                let guard = guard.substitute(self.x, &c);
                c.provided(guard).simplify()
            })
            .collect())
    }

    fn invert_node(&self, node: &Expr, v: Expr) -> SolveResult<Vec<Expr>> {
        let x = self.x;
        let n_param = || node.fresh_param("n", &[&v, x]);
        match node {
            Expr::Var(_) | Expr::Param(_) | Expr::Const(_) | Expr::Pi | Expr::E | Expr::Bool(_) => {
                Err(SolveError::Internal(format!(
                    "leaf {} contains {} without being it",
                    node, x
                )))
            }
            Expr::Add(a, b) => match side(a, b, x) {
                Side::Left => self.child(a, v - *b.clone()),
                Side::Right => self.child(b, v - *a.clone()),
                Side::Both => Ok(vec![]),
            },
            Expr::Sub(a, b) => match side(a, b, x) {
                Side::Left => self.child(a, v + *b.clone()),
                Side::Right => self.child(b, *a.clone() - v),
                Side::Both => Ok(vec![]),
            },
            Expr::Mul(a, b) => match side(a, b, x) {
                Side::Left => self.child(a, v / *b.clone()),
                Side::Right => self.child(b, v / *a.clone()),
                Side::Both => Ok(vec![]),
            },
            Expr::Div(a, b) => match side(a, b, x) {
                Side::Left => self.child(a, v * *b.clone()),
                Side::Right => self.child(b, *a.clone() / v),
                Side::Both => Ok(vec![]),
            },
            Expr::Pow(base, exp) => match side(base, exp, x) {
                Side::Left => self.invert_power_base(base, exp, v),
                Side::Right => self.child(exp, v.log(*base.clone())),
                Side::Both => Ok(vec![]),
            },
            Expr::Log(base, arg) => match side(base, arg, x) {
                Side::Left => self.child(base, arg.as_ref().clone().pow(Expr::int(1) / v)),
                Side::Right => self.child(arg, base.as_ref().clone().pow(v)),
                Side::Both => Ok(vec![]),
            },
            Expr::sin(a) => {
                let n = n_param();
                let period = Expr::int(2) * Expr::Pi * n;
                let arc = Expr::arcsin(v.boxed());
                self.children(
                    a,
                    vec![
                        arc.clone() + period.clone(),
                        Expr::Pi - arc + period,
                    ],
                )
            }
            Expr::cos(a) => {
                let n = n_param();
                let period = Expr::int(2) * Expr::Pi * n;
                let arc = Expr::arccos(v.boxed());
                self.children(a, vec![arc.clone() + period.clone(), -arc + period])
            }
            Expr::tg(a) => {
                let n = n_param();
                self.child(a, Expr::arctg(v.boxed()) + Expr::Pi * n)
            }
            Expr::ctg(a) => {
                let n = n_param();
                self.child(a, Expr::arcctg(v.boxed()) + Expr::Pi * n)
            }
            Expr::sec(a) => Expr::cos(a.clone()).invert_bounded(
                &(Expr::int(1) / v),
                x,
                self.max_unity_roots,
            ),
            Expr::cosec(a) => Expr::sin(a.clone()).invert_bounded(
                &(Expr::int(1) / v),
                x,
                self.max_unity_roots,
            ),
            Expr::arcsin(a) | Expr::arctg(a) | Expr::arcctg(a) | Expr::arccosec(a) => {
                if !in_principal_range(&v, -PI / 2.0, PI / 2.0) {
                    return Ok(vec![]);
                }
                let inner = match node {
                    Expr::arcsin(_) => Expr::sin(v.boxed()),
                    Expr::arctg(_) => Expr::tg(v.boxed()),
                    Expr::arcctg(_) => Expr::ctg(v.boxed()),
                    _ => Expr::cosec(v.boxed()),
                };
                self.child(a, inner)
            }
            Expr::arccos(a) | Expr::arcsec(a) => {
                if !in_principal_range(&v, 0.0, PI) {
                    return Ok(vec![]);
                }
                let inner = match node {
                    Expr::arccos(_) => Expr::cos(v.boxed()),
                    _ => Expr::sec(v.boxed()),
                };
                self.child(a, inner)
            }
            Expr::signum(a) => {
                let r = node.fresh_param("r", &[&v, x]);
                let guard = Expr::Greater(r.clone().boxed(), Expr::int(0).boxed());
                self.guarded(a, v * r, &guard)
            }
            Expr::abs(a) => {
                let r = node.fresh_param("r", &[&v, x]);
                let guard = Expr::In(r.clone().boxed(), Set::Special(SpecialSet::Reals).boxed());
                self.guarded(a, v * (Expr::i() * r).exp(), &guard)
            }
            // no closed inverse
            Expr::factorial(_) | Expr::Limit(..) => Ok(vec![]),
            Expr::Derivative(a, var, order) => {
                self.child(a, Expr::Integral(v.boxed(), var.clone(), *order))
            }
            Expr::Integral(a, var, order) => {
                self.child(a, Expr::Derivative(v.boxed(), var.clone(), *order))
            }
            Expr::Not(a) => self.child(a, Expr::Not(v.boxed())),
            Expr::And(a, b) => self.invert_connective(a, b, v, Expr::And),
            Expr::Or(a, b) => self.invert_connective(a, b, v, Expr::Or),
            Expr::Xor(a, b) => self.invert_connective(a, b, v, Expr::Xor),
            Expr::Implies(a, b) => self.invert_connective(a, b, v, Expr::Implies),
            Expr::Set(set) => match &v {
                Expr::Set(value) => self.invert_set(set, value),
                _ => Ok(vec![]),
            },
            Expr::Equals(..)
            | Expr::Greater(..)
            | Expr::GreaterOrEqual(..)
            | Expr::Less(..)
            | Expr::LessOrEqual(..)
            | Expr::In(..) => Ok(vec![]),
            Expr::Provided(inner, guard) => {
                if !inner.contains_node(x) {
                    return Ok(vec![]);
                }
                self.guarded(inner, v, guard)
            }
            Expr::Piecewise(pieces) => {
                let mut out = Vec::new();
                for (piece, condition) in pieces.iter().filter(|(p, _)| p.contains_node(x)) {
                    out.extend(self.guarded(piece, v.clone(), condition)?);
                }
                Ok(out)
            }
        }
    }

    /// `base^exp = v` with `x` in the base
    fn invert_power_base(&self, base: &Expr, exp: &Expr, v: Expr) -> SolveResult<Vec<Expr>> {
        let Some(n) = exp.as_number().and_then(Number::as_integer) else {
            return self.child(base, v.pow(Expr::int(1) / exp.clone()));
        };
        if n.is_zero() {
            return Ok(vec![]);
        }
        let principal = v.clone().pow(Expr::Const(Number::from_rational(BigRational::new(
            BigInt::one(),
            n.clone(),
        ))));
        let omegas = match n.abs().to_u32().filter(|k| *k <= self.max_unity_roots) {
            Some(k) => roots_of_unity(k),
            None => {
                let k = base.fresh_param("k", &[&v, exp, self.x]);
                vec![unity_root_family(&n.abs(), &k)]
            }
        };
        let branches = omegas
            .into_iter()
            .map(|w| w * principal.clone())
            .collect();
        self.children(base, branches)
    }

    fn set_holds_x(&self, set: &Set) -> bool {
        set.exprs().iter().any(|e| e.contains_node(self.x))
    }

    /// set node equal to the set `value`
    fn invert_set(&self, node: &Set, value: &Set) -> SolveResult<Vec<Expr>> {
        let x = self.x;
        match node {
            Set::Finite(elements) => {
                let (carriers, fixed): (Vec<&Expr>, Vec<&Expr>) =
                    elements.iter().partition(|e| e.contains_node(x));
                let ([carrier], Some(targets)) = (carriers.as_slice(), value.elements()) else {
                    return Ok(vec![]);
                };
                let fixed_set = Set::finite(fixed.iter().map(|e| (*e).clone()).collect());
                if fixed.iter().any(|e| value.contains(e) != Some(true)) {
                    return Ok(vec![]);
                }
                let mut rest = Vec::new();
                for target in targets {
                    match fixed_set.contains(target) {
                        Some(true) => {}
                        Some(false) => rest.push(target.clone()),
                        None => return Ok(vec![]),
                    }
                }
                // {c} ∪ F = S: c covers S \ F, or repeats an element of F when nothing is left
                let candidates = match rest.len() {
                    0 => targets.to_vec(),
                    1 => rest,
                    _ => return Ok(vec![]),
                };
                self.children(carrier, candidates)
            }
            Set::Interval {
                left,
                right,
                left_closed,
                right_closed,
            } => {
                let Set::Interval {
                    left: to_left,
                    right: to_right,
                    left_closed: to_left_closed,
                    right_closed: to_right_closed,
                } = value
                else {
                    return Ok(vec![]);
                };
                if left_closed != to_left_closed || right_closed != to_right_closed {
                    return Ok(vec![]);
                }
                let (carrier, target, other, other_target) = match side(left, right, x) {
                    Side::Left | Side::Both => (left, to_left, right, to_right),
                    Side::Right => (right, to_right, left, to_left),
                };
                let other_target = other_target.simplify();
                Ok(self
                    .child(carrier, target.clone())?
                    .into_iter()
                    .filter(|c| other.substitute(x, c).simplify() == other_target)
                    .collect())
            }
            Set::Union(a, b) => {
                let (with_x, without_x) = match (self.set_holds_x(a), self.set_holds_x(b)) {
                    (true, false) => (a.as_ref(), b.as_ref()),
                    (false, true) => (b.as_ref(), a.as_ref()),
                    _ => return Ok(vec![]),
                };
                let (Some(targets), Some(fixed)) = (value.elements(), without_x.elements()) else {
                    return self.invert_set(with_x, &value.clone().minus(without_x.clone()));
                };
                // F(x) ∪ A = S needs A ⊆ S, then F(x) = (S \ A) ∪ P for any P ⊆ A
                let mut remainder = Vec::new();
                for target in targets {
                    match without_x.contains(target) {
                        Some(true) => {}
                        Some(false) => remainder.push(target.clone()),
                        None => {
                            return self.invert_set(with_x, &value.clone().minus(without_x.clone()));
                        }
                    }
                }
                for element in fixed {
                    if value.contains(element) != Some(true) {
                        return Ok(vec![]);
                    }
                }
                if fixed.len() > MAX_POWER_SET_BASE {
                    return self.invert_set(with_x, &Set::finite(remainder));
                }
                let mut out = Vec::new();
                for mask in 0u32..(1 << fixed.len()) {
                    let mut target = remainder.clone();
                    target.extend(
                        fixed
                            .iter()
                            .enumerate()
                            .filter(|(i, _)| mask & (1 << i) != 0)
                            .map(|(_, e)| e.clone()),
                    );
                    out.extend(self.invert_set(with_x, &Set::finite(target))?);
                }
                Ok(out)
            }
            Set::Special(_) | Set::Intersection(..) | Set::Minus(..) | Set::Conditional { .. } => {
                Ok(vec![])
            }
        }
    }

    /// truth table of the operand holding `x`, guarded by the value the connective takes
    fn invert_connective(
        &self,
        a: &Expr,
        b: &Expr,
        v: Expr,
        rebuild: fn(Box<Expr>, Box<Expr>) -> Expr,
    ) -> SolveResult<Vec<Expr>> {
        let s = side(a, b, self.x);
        if s == Side::Both {
            return Ok(vec![]);
        }
        let mut out = Vec::new();
        for t in [true, false] {
            let truth = Expr::Bool(t);
            let node_value = match s {
                Side::Left => rebuild(truth.clone().boxed(), b.clone().boxed()),
                _ => rebuild(a.clone().boxed(), truth.clone().boxed()),
            };
            let guard = Expr::Equals(node_value.boxed(), v.clone().boxed());
            let operand = if s == Side::Left { a } else { b };
            out.extend(self.child(operand, truth.provided(guard))?);
        }
        Ok(out)
    }
}

impl Expr {
    /// Values `x` can take when this node equals `value`.
    ///
    /// # Errors
    /// `SolveError::Internal` when `x` does not occur in the node.
    ///
    /// # Examples
    /// ```rust, ignore
    /// let x = Expr::var("x");
    /// let node = Expr::int(2) * x.clone() + Expr::int(1);
    /// assert_eq!(node.invert(&Expr::int(5), &x).unwrap(), vec![Expr::int(2)]);
    /// ```
    pub fn invert(&self, value: &Expr, x: &Expr) -> SolveResult<Vec<Expr>> {
        self.invert_bounded(value, x, DEFAULT_UNITY_ROOTS)
    }

    /// `invert` with an explicit bound on the branches of integer powers listed one by one;
    /// above it the branches come as one family over a fresh integer parameter `k`
    pub fn invert_bounded(
        &self,
        value: &Expr,
        x: &Expr,
        max_unity_roots: u32,
    ) -> SolveResult<Vec<Expr>> {
        let value = value.simplify();
        if self == x {
            return Ok(vec![value]);
        }
        if !self.contains_node(x) {
            return Err(SolveError::Internal(format!(
                "cannot invert {} for {}: it does not occur",
                self, x
            )));
        }
        trace!("inverting {} = {} for {}", self, value, x);
        let inverter = Inverter { x, max_unity_roots };
        let candidates = inverter.invert_node(self, value)?;
        Ok(candidates
            .into_iter()
            .map(|c| c.simplify())
            .filter(|c| c.is_defined())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use num_complex::Complex64;

    fn values(candidates: &[Expr], bindings: &[(&str, Complex64)]) -> Vec<Complex64> {
        candidates
            .iter()
            .map(|c| c.eval_complex_with(bindings).unwrap())
            .collect()
    }

    #[test]
    fn test_arithmetic_operand_order() {
        let x = Expr::var("x");
        let a = Expr::int(6);
        // 6 / x = 2  =>  x = 3
        let div = a.clone() / x.clone();
        assert_eq!(div.invert(&Expr::int(2), &x).unwrap(), vec![Expr::int(3)]);
        // 6 - x = 2  =>  x = 4
        let sub = a.clone() - x.clone();
        assert_eq!(sub.invert(&Expr::int(2), &x).unwrap(), vec![Expr::int(4)]);
        // 2x + 1 = 5  =>  x = 2
        let lin = Expr::int(2) * x.clone() + Expr::int(1);
        assert_eq!(lin.invert(&Expr::int(5), &x).unwrap(), vec![Expr::int(2)]);
    }

    #[test]
    fn test_x_on_both_sides_gives_nothing() {
        let x = Expr::var("x");
        let node = x.clone() * (x.clone() + Expr::int(1));
        assert!(node.invert(&Expr::int(2), &x).unwrap().is_empty());
    }

    #[test]
    fn test_node_without_x_is_internal_error() {
        let x = Expr::var("x");
        let node = Expr::var("y") + Expr::int(1);
        assert!(matches!(
            node.invert(&Expr::int(0), &x),
            Err(SolveError::Internal(_))
        ));
    }

    #[test]
    fn test_integer_power_has_all_branches() {
        let x = Expr::var("x");
        let cube = x.clone().pow(Expr::int(3));
        let roots = cube.invert(&Expr::int(8), &x).unwrap();
        assert_eq!(roots.len(), 3);
        for z in values(&roots, &[]) {
            let w = z * z * z;
            assert_relative_eq!(w.re, 8.0, epsilon = 1e-9);
            assert_relative_eq!(w.im, 0.0, epsilon = 1e-9);
        }
        assert!(roots.contains(&Expr::int(2)));
    }

    #[test]
    fn test_exponent_inversion() {
        let x = Expr::var("x");
        let node = Expr::int(2).pow(x.clone());
        assert_eq!(node.invert(&Expr::int(8), &x).unwrap(), vec![Expr::int(3)]);
    }

    #[test]
    fn test_sin_branches_are_periodic() {
        let x = Expr::var("x");
        let node = Expr::sin(x.clone().boxed());
        let roots = node.invert(&Expr::rational(1, 2), &x).unwrap();
        assert_eq!(roots.len(), 2);
        for root in &roots {
            let params = root.params();
            assert_eq!(params.len(), 1);
            let n = params.iter().next().unwrap().clone();
            for k in [-2.0, 0.0, 3.0] {
                let at_k = root
                    .eval_complex_with(&[(n.as_str(), Complex64::new(k, 0.0))])
                    .unwrap();
                assert_relative_eq!(at_k.sin().re, 0.5, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_fresh_parameter_avoids_existing_names() {
        let x = Expr::var("x");
        let node = Expr::cos((x.clone() + Expr::Param("n".to_string())).boxed());
        let roots = node.invert(&Expr::int(1), &x).unwrap();
        assert!(!roots.is_empty());
        for root in roots {
            assert!(root.params().len() >= 2);
        }
    }

    #[test]
    fn test_arcsin_gate() {
        let x = Expr::var("x");
        let node = Expr::arcsin(x.clone().boxed());
        assert!(node.invert(&Expr::int(3), &x).unwrap().is_empty());
        let roots = node.invert(&Expr::rational(1, 2), &x).unwrap();
        assert_eq!(roots.len(), 1);
        let v = roots[0].eval_complex().unwrap();
        assert_relative_eq!(v.re, 0.5f64.sin(), epsilon = 1e-12);
    }

    #[test]
    fn test_logarithm_inversion() {
        let x = Expr::var("x");
        let node = x.clone().ln();
        let roots = node.invert(&Expr::int(2), &x).unwrap();
        let v = roots[0].eval_complex().unwrap();
        assert_relative_eq!(v.re, std::f64::consts::E.powi(2), epsilon = 1e-9);
        let base = Expr::int(8).log(x.clone());
        assert_eq!(base.invert(&Expr::int(3), &x).unwrap(), vec![Expr::int(2)]);
    }

    #[test]
    fn test_signum_and_abs_are_guarded() {
        let x = Expr::var("x");
        let sgn = Expr::signum(x.clone().boxed());
        let roots = sgn.invert(&Expr::int(1), &x).unwrap();
        assert_eq!(roots.len(), 1);
        assert!(matches!(roots[0], Expr::Provided(..)));
        let abs = Expr::abs(x.clone().boxed());
        let roots = abs.invert(&Expr::int(2), &x).unwrap();
        assert!(matches!(roots[0], Expr::Provided(..)));
    }

    #[test]
    fn test_factorial_has_no_inverse() {
        let x = Expr::var("x");
        let node = Expr::factorial(x.clone().boxed());
        assert!(node.invert(&Expr::int(6), &x).unwrap().is_empty());
    }

    #[test]
    fn test_boolean_truth_table() {
        let x = Expr::var("x");
        let node = Expr::And(x.clone().boxed(), Expr::Bool(true).boxed());
        assert_eq!(
            node.invert(&Expr::Bool(true), &x).unwrap(),
            vec![Expr::Bool(true)]
        );
        let node = Expr::Or(x.clone().boxed(), Expr::Bool(true).boxed());
        assert_eq!(node.invert(&Expr::Bool(false), &x).unwrap(), vec![]);
    }

    #[test]
    fn test_power_above_bound_is_one_family() {
        let x = Expr::var("x");
        let node = x.clone().pow(Expr::int(1000));
        let roots = node.invert_bounded(&Expr::int(1), &x, 8).unwrap();
        let [family] = roots.as_slice() else {
            panic!("one family expected, got {:?}", roots);
        };
        let k = family.params().into_iter().next().unwrap();
        for step in [0.0, 3.0, 500.0] {
            let z = family
                .eval_complex_with(&[(k.as_str(), Complex64::new(step, 0.0))])
                .unwrap();
            let w = z.powu(1000);
            assert_relative_eq!(w.re, 1.0, epsilon = 1e-6);
            assert_relative_eq!(w.im, 0.0, epsilon = 1e-6);
        }
        // the default bound lists a hundred branches one by one
        let hundred = x.clone().pow(Expr::int(100));
        assert_eq!(hundred.invert(&Expr::int(1), &x).unwrap().len(), 100);
        assert_eq!(node.invert(&Expr::int(1), &x).unwrap().len(), 1);
    }

    #[test]
    fn test_finite_set_inversion() {
        let x = Expr::var("x");
        let single = Expr::Set(Set::singleton(x.clone() + Expr::int(1)).boxed());
        let target = Expr::Set(Set::singleton(Expr::int(3)).boxed());
        assert_eq!(single.invert(&target, &x).unwrap(), vec![Expr::int(2)]);
        // {x, 1} = {1} forces x = 1
        let pair = Expr::Set(Set::finite(vec![x.clone(), Expr::int(1)]).boxed());
        let one = Expr::Set(Set::singleton(Expr::int(1)).boxed());
        assert_eq!(pair.invert(&one, &x).unwrap(), vec![Expr::int(1)]);
        // three targets cannot be covered by one unknown element
        let three = Expr::Set(Set::finite(vec![Expr::int(4), Expr::int(5), Expr::int(6)]).boxed());
        assert!(single.invert(&three, &x).unwrap().is_empty());
    }

    #[test]
    fn test_union_inversion() {
        let x = Expr::var("x");
        let union = Set::Union(
            Set::singleton(x.clone()).boxed(),
            Set::singleton(Expr::int(1)).boxed(),
        );
        let node = Expr::Set(union.boxed());
        let value = Expr::Set(Set::finite(vec![Expr::int(1), Expr::int(2)]).boxed());
        assert_eq!(node.invert(&value, &x).unwrap(), vec![Expr::int(2)]);
        // the fixed part is missing from the value
        let value = Expr::Set(Set::singleton(Expr::int(2)).boxed());
        assert!(node.invert(&value, &x).unwrap().is_empty());
        // x may repeat the fixed element
        let value = Expr::Set(Set::singleton(Expr::int(1)).boxed());
        assert_eq!(node.invert(&value, &x).unwrap(), vec![Expr::int(1)]);
    }

    #[test]
    fn test_interval_inversion() {
        let x = Expr::var("x");
        let node = Expr::Set(Set::interval(Expr::int(2) * x.clone(), Expr::int(5), true, false).boxed());
        let value = Expr::Set(Set::interval(Expr::int(4), Expr::int(5), true, false).boxed());
        assert_eq!(node.invert(&value, &x).unwrap(), vec![Expr::int(2)]);
        let other_end = Expr::Set(Set::interval(Expr::int(4), Expr::int(6), true, false).boxed());
        assert!(node.invert(&other_end, &x).unwrap().is_empty());
        let open = Expr::Set(Set::interval(Expr::int(4), Expr::int(5), false, false).boxed());
        assert!(node.invert(&open, &x).unwrap().is_empty());
    }

    #[test]
    fn test_division_by_zero_candidate_is_dropped() {
        let x = Expr::var("x");
        let node = Expr::int(1) / x.clone();
        assert!(node.invert(&Expr::int(0), &x).unwrap().is_empty());
    }
}
