//! # Symbolic Engine Derivatives Module
//!
//! This module extends the symbolic engine with differentiation and numeric evaluation over
//! the complex numbers. Evaluation is the computational backbone of the solver's numeric
//! checks: root verification, domain filtering, downcasting of roots to exact values and the
//! Newton fallback all go through it.
//!
//! ## Key Methods
//!
//! ### Differentiation
//! - `diff(var: &str)` - Analytical derivative by the usual calculus rules
//!
//! ### Function evaluation
//! - `eval_complex()` - Evaluate a tree without free variables
//! - `eval_complex_with(values)` - Evaluate with bindings for variables and parameters
//! - `lambdify_complex(var)` - Closure of one complex argument
//! - `is_defined()` - false for numeric trees that cannot be evaluated (division by zero,
//!   logarithm of zero, ...) and for trees guarded by a false predicate
//!
//! ## Interesting Code Features
//!
//! 1. **Undefined is a value**: evaluation returns `Option<Complex64>`; `None` stands for an
//!    undefined point or a node that has no numeric meaning (sets, booleans, calculus nodes)
//!
//! 2. **Real odd roots**: a negative real base raised to an exact rational power with odd
//!    denominator evaluates to the real root, matching what the simplifier does with exact
//!    constants

use crate::symbolic::numbers::Number;
use crate::symbolic::symbolic_engine::Expr;
use num::{Integer, ToPrimitive};
use num_complex::Complex64;
use std::f64::consts::{E, PI};

/// factorials above this argument are not evaluated
const MAX_FACTORIAL: u64 = 170;

fn finite(z: Complex64) -> Option<Complex64> {
    if z.re.is_finite() && z.im.is_finite() {
        Some(z)
    } else {
        None
    }
}

fn checked_recip(z: Complex64) -> Option<Complex64> {
    if z.norm() == 0.0 {
        None
    } else {
        finite(1.0 / z)
    }
}

fn complex_pow(base: Complex64, exp: Complex64, exact_exp: Option<&Number>) -> Option<Complex64> {
    if base.norm() == 0.0 {
        return if exp.norm() == 0.0 {
            Some(Complex64::new(1.0, 0.0))
        } else if exp.re > 0.0 {
            Some(Complex64::new(0.0, 0.0))
        } else {
            None
        };
    }
    if let Some(n) = exact_exp.and_then(|e| e.as_i64()).and_then(|n| i32::try_from(n).ok()) {
        return finite(base.powi(n));
    }
    // real odd root of a negative real base
    if let Some(r) = exact_exp.and_then(|e| e.as_rational()) {
        if base.im == 0.0 && base.re < 0.0 && r.denom().is_odd() {
            let magnitude = (-base.re).powf(r.to_f64()?);
            let sign = if r.numer().is_odd() { -1.0 } else { 1.0 };
            return finite(Complex64::new(sign * magnitude, 0.0));
        }
    }
    finite(base.powc(exp))
}

impl Expr {
    /// Analytical derivative with respect to a variable.
    ///
    /// Nodes without a differentiation rule (sets, relations, calculus nodes) give a
    /// `Derivative` node. The result is not simplified.
    ///
    /// # Examples
    /// ```rust, ignore
    /// let x = Expr::var("x");
    /// let f = x.clone().pow(Expr::int(2)); // x^2
    /// let df_dx = f.diff("x").simplify(); // 2*x
    /// ```
    pub fn diff(&self, var: &str) -> Expr {
        if !self.contains_variable(var) {
            return Expr::int(0);
        }
        let d = |e: &Expr| e.diff(var);
        match self {
            Expr::Var(_) => Expr::int(1),
            Expr::Add(lhs, rhs) => d(lhs) + d(rhs),
            Expr::Sub(lhs, rhs) => d(lhs) - d(rhs),
            // (f g)' = f' g + f g'
            Expr::Mul(lhs, rhs) => d(lhs) * *rhs.clone() + *lhs.clone() * d(rhs),
            // (f/g)' = (f' g - g' f) / g^2
            Expr::Div(lhs, rhs) => (d(lhs) * *rhs.clone() - d(rhs) * *lhs.clone())
                / rhs.as_ref().clone().pow(Expr::int(2)),
            Expr::Pow(base, exp) => {
                let (b, e) = (base.as_ref().clone(), exp.as_ref().clone());
                if !exp.contains_variable(var) {
                    e.clone() * b.clone().pow(e - Expr::int(1)) * d(base)
                } else if !base.contains_variable(var) {
                    self.clone() * b.ln() * d(exp)
                } else {
                    // (b^e)' = b^e (e' ln b + e b' / b)
                    self.clone() * (d(exp) * b.clone().ln() + e * d(base) / b)
                }
            }
            Expr::Log(base, arg) => {
                if !base.contains_variable(var) {
                    d(arg) / (*arg.clone() * base.as_ref().clone().ln())
                } else {
                    let quotient = arg.as_ref().clone().ln() / base.as_ref().clone().ln();
                    quotient.diff(var)
                }
            }
            Expr::sin(a) => Expr::cos(a.clone()) * d(a),
            Expr::cos(a) => Expr::int(-1) * Expr::sin(a.clone()) * d(a),
            Expr::tg(a) => d(a) / Expr::cos(a.clone()).pow(Expr::int(2)),
            Expr::ctg(a) => Expr::int(-1) * d(a) / Expr::sin(a.clone()).pow(Expr::int(2)),
            Expr::sec(a) => Expr::sec(a.clone()) * Expr::tg(a.clone()) * d(a),
            Expr::cosec(a) => Expr::int(-1) * Expr::cosec(a.clone()) * Expr::ctg(a.clone()) * d(a),
            Expr::arcsin(a) => {
                d(a) / (Expr::int(1) - a.as_ref().clone().pow(Expr::int(2))).sqrt()
            }
            Expr::arccos(a) => {
                Expr::int(-1) * d(a) / (Expr::int(1) - a.as_ref().clone().pow(Expr::int(2))).sqrt()
            }
            Expr::arctg(a) => d(a) / (Expr::int(1) + a.as_ref().clone().pow(Expr::int(2))),
            Expr::arcctg(a) => {
                Expr::int(-1) * d(a) / (Expr::int(1) + a.as_ref().clone().pow(Expr::int(2)))
            }
            Expr::arcsec(a) => {
                let inner = Expr::int(1) - Expr::int(1) / a.as_ref().clone().pow(Expr::int(2));
                d(a) / (a.as_ref().clone().pow(Expr::int(2)) * inner.sqrt())
            }
            Expr::arccosec(a) => {
                let inner = Expr::int(1) - Expr::int(1) / a.as_ref().clone().pow(Expr::int(2));
                Expr::int(-1) * d(a) / (a.as_ref().clone().pow(Expr::int(2)) * inner.sqrt())
            }
            // |f|' = signum(f) f' away from zero
            Expr::abs(a) => Expr::signum(a.clone()) * d(a),
            Expr::signum(_) => Expr::int(0),
            Expr::Provided(inner, pred) => Expr::Provided(d(inner).boxed(), pred.clone()),
            Expr::Piecewise(pieces) => {
                Expr::Piecewise(pieces.iter().map(|(e, c)| (d(e), c.clone())).collect())
            }
            _ => Expr::Derivative(self.clone().boxed(), var.to_string(), 1),
        }
    } // end of diff

    /// Numeric value of a tree without free variables.
    pub fn eval_complex(&self) -> Option<Complex64> {
        self.eval_complex_with(&[])
    }

    /// Numeric value with bindings for variables and parameters.
    ///
    /// # Arguments
    /// * `values` - pairs of (name, value); a name binds both `Var` and `Param` nodes
    ///
    /// # Returns
    /// `None` at undefined points and for nodes without numeric meaning
    pub fn eval_complex_with(&self, values: &[(&str, Complex64)]) -> Option<Complex64> {
        let ev = |e: &Expr| e.eval_complex_with(values);
        let value = match self {
            Expr::Var(name) | Expr::Param(name) => values
                .iter()
                .find(|(n, _)| *n == name.as_str())
                .map(|(_, v)| *v)?,
            Expr::Const(n) => n.to_complex64(),
            Expr::Pi => Complex64::new(PI, 0.0),
            Expr::E => Complex64::new(E, 0.0),
            Expr::Add(lhs, rhs) => ev(lhs)? + ev(rhs)?,
            Expr::Sub(lhs, rhs) => ev(lhs)? - ev(rhs)?,
            Expr::Mul(lhs, rhs) => ev(lhs)? * ev(rhs)?,
            Expr::Div(lhs, rhs) => ev(lhs)? * checked_recip(ev(rhs)?)?,
            Expr::Pow(base, exp) => complex_pow(ev(base)?, ev(exp)?, exp.as_number())?,
            Expr::Log(base, arg) => {
                let (b, a) = (ev(base)?, ev(arg)?);
                if a.norm() == 0.0 || b.norm() == 0.0 {
                    return None;
                }
                a.ln() * checked_recip(b.ln())?
            }
            Expr::sin(a) => ev(a)?.sin(),
            Expr::cos(a) => ev(a)?.cos(),
            Expr::tg(a) => {
                let v = ev(a)?;
                v.sin() * checked_recip(v.cos())?
            }
            Expr::ctg(a) => {
                let v = ev(a)?;
                v.cos() * checked_recip(v.sin())?
            }
            Expr::sec(a) => checked_recip(ev(a)?.cos())?,
            Expr::cosec(a) => checked_recip(ev(a)?.sin())?,
            Expr::arcsin(a) => ev(a)?.asin(),
            Expr::arccos(a) => ev(a)?.acos(),
            Expr::arctg(a) => ev(a)?.atan(),
            Expr::arcctg(a) => {
                let v = ev(a)?;
                if v.norm() == 0.0 {
                    Complex64::new(PI / 2.0, 0.0)
                } else {
                    (1.0 / v).atan()
                }
            }
            Expr::arcsec(a) => checked_recip(ev(a)?)?.acos(),
            Expr::arccosec(a) => checked_recip(ev(a)?)?.asin(),
            Expr::signum(a) => {
                let v = ev(a)?;
                if v.norm() == 0.0 {
                    Complex64::new(0.0, 0.0)
                } else {
                    v / v.norm()
                }
            }
            Expr::abs(a) => Complex64::new(ev(a)?.norm(), 0.0),
            Expr::factorial(a) => {
                let v = ev(a)?;
                let n = v.re.round();
                if v.im != 0.0 || (v.re - n).abs() > 1e-12 || n < 0.0 {
                    return None;
                }
                let n = n.to_u64().filter(|n| *n <= MAX_FACTORIAL)?;
                Complex64::new((1..=n).map(|k| k as f64).product(), 0.0)
            }
            Expr::Provided(inner, pred) => match pred.as_ref() {
                Expr::Bool(false) => return None,
                _ => ev(inner)?,
            },
            Expr::Piecewise(pieces) => {
                let (e, _) = pieces
                    .iter()
                    .find(|(_, c)| *c == Expr::Bool(true))?;
                ev(e)?
            }
            _ => return None,
        };
        finite(value)
    }

    /// Closure of a single complex argument bound to `var`.
    ///
    /// # Examples
    /// ```rust, ignore
    /// let f = Expr::parse_expression("x^2 - 1").unwrap();
    /// let f = f.lambdify_complex("x");
    /// assert_eq!(f(Complex64::new(1.0, 0.0)), Some(Complex64::new(0.0, 0.0)));
    /// ```
    pub fn lambdify_complex(
        &self,
        var: &str,
    ) -> Box<dyn Fn(Complex64) -> Option<Complex64> + Send + Sync> {
        let expr = self.clone();
        let var = var.to_string();
        Box::new(move |z| expr.eval_complex_with(&[(var.as_str(), z)]))
    }

    /// false for a numeric tree that cannot be evaluated, or a tree guarded by `false`
    pub fn is_defined(&self) -> bool {
        let guarded_false = self
            .nodes()
            .into_iter()
            .any(|n| matches!(n, Expr::Provided(_, p) if **p == Expr::Bool(false)));
        if guarded_false {
            return false;
        }
        !(self.is_numeric() && self.eval_complex().is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_eval_basic_arithmetic() {
        let x = Expr::var("x");
        let f = x.clone() * x.clone() - Expr::int(1);
        let v = f
            .eval_complex_with(&[("x", Complex64::new(3.0, 0.0))])
            .unwrap();
        assert_relative_eq!(v.re, 8.0);
        assert_relative_eq!(v.im, 0.0);
    }

    #[test]
    fn test_eval_undefined_points() {
        let zero_div = Expr::int(1) / Expr::int(0);
        assert!(zero_div.eval_complex().is_none());
        assert!(!zero_div.is_defined());
        let log_zero = Expr::int(0).ln();
        assert!(log_zero.eval_complex().is_none());
        assert!(Expr::var("x").eval_complex().is_none());
        assert!(Expr::var("x").is_defined());
    }

    #[test]
    fn test_eval_real_odd_root() {
        let root = Expr::int(-8).pow(Expr::rational(1, 3));
        let v = root.eval_complex().unwrap();
        assert_relative_eq!(v.re, -2.0, epsilon = 1e-12);
        assert_relative_eq!(v.im, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_eval_square_root_of_negative() {
        let root = Expr::int(-4).sqrt();
        let v = root.eval_complex().unwrap();
        assert_relative_eq!(v.re, 0.0, epsilon = 1e-12);
        assert_relative_eq!(v.im, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_eval_trig_and_params() {
        let n = Expr::Param("n".to_string());
        let f = Expr::sin(Expr::Pi.boxed()) + n;
        let v = f
            .eval_complex_with(&[("n", Complex64::new(2.0, 0.0))])
            .unwrap();
        assert_relative_eq!(v.re, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_diff_polynomial() {
        let x = Expr::var("x");
        let f = x.clone().pow(Expr::int(3)) + Expr::int(2) * x.clone();
        let df = f.diff("x");
        let v = df
            .eval_complex_with(&[("x", Complex64::new(2.0, 0.0))])
            .unwrap();
        assert_relative_eq!(v.re, 14.0, epsilon = 1e-12);
    }

    #[test]
    fn test_diff_exponential_and_log() {
        let x = Expr::var("x");
        let f = x.clone().exp() + x.clone().ln();
        let df = f.diff("x");
        let v = df
            .eval_complex_with(&[("x", Complex64::new(1.0, 0.0))])
            .unwrap();
        assert_relative_eq!(v.re, E + 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_diff_of_constant_is_zero() {
        let y = Expr::var("y");
        assert_eq!(Expr::sin(y.boxed()).diff("x"), Expr::int(0));
    }

    #[test]
    fn test_lambdify_complex() {
        let f = Expr::var("x").pow(Expr::int(2)) + Expr::int(1);
        let f = f.lambdify_complex("x");
        let v = f(Complex64::new(0.0, 1.0)).unwrap();
        assert_relative_eq!(v.norm(), 0.0, epsilon = 1e-12);
    }
}
