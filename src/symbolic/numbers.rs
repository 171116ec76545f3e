//! # Number tower
//!
//! Numeric leaves of the symbolic engine. A number is either exact (a complex number with
//! arbitrary-precision rational parts, which covers integers, rationals and Gaussian rationals)
//! or approximate (an `f64` complex produced by numeric evaluation or the Newton fallback).
//!
//! Exact arithmetic stays exact; mixing an exact and an approximate number gives an approximate
//! result. Division is checked so a zero divisor never panics inside the solver.
//!
//! ## Downcasting
//! `Number::downcast` rebuilds an exact value from a floating point approximation by continued
//! fractions, bounded both in denominator size and in iteration count. The solver uses it to turn
//! numerically evaluated roots back into exact rationals when the equation confirms them.
use num::integer::Roots;
use num::{BigInt, BigRational, Complex, Integer, One, Signed, ToPrimitive, Zero};
use num_complex::Complex64;
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

pub type ExactComplex = Complex<BigRational>;

/// exponents above this bound are not expanded exactly
const MAX_EXACT_EXPONENT: u64 = 4096;

#[derive(Clone, Debug, PartialEq)]
pub enum Number {
    /// exact complex value, the imaginary part is zero for real numbers
    Exact(ExactComplex),
    /// approximate value
    Approx(Complex64),
}

impl Number {
    pub fn int(v: i64) -> Self {
        Number::from_bigint(BigInt::from(v))
    }

    pub fn from_bigint(v: BigInt) -> Self {
        Number::from_rational(BigRational::from_integer(v))
    }

    pub fn from_rational(v: BigRational) -> Self {
        Number::Exact(Complex::new(v, BigRational::zero()))
    }

    /// n/d for literal constants, d must not be zero
    pub fn rational(n: i64, d: i64) -> Self {
        Number::from_rational(BigRational::new(BigInt::from(n), BigInt::from(d)))
    }

    pub fn complex(re: BigRational, im: BigRational) -> Self {
        Number::Exact(Complex::new(re, im))
    }

    pub fn imaginary_unit() -> Self {
        Number::complex(BigRational::zero(), BigRational::one())
    }

    pub fn approx(v: Complex64) -> Self {
        Number::Approx(v)
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Number::Exact(c) => c.re.is_zero() && c.im.is_zero(),
            Number::Approx(c) => c.re == 0.0 && c.im == 0.0,
        }
    }

    pub fn is_one(&self) -> bool {
        match self {
            Number::Exact(c) => c.re.is_one() && c.im.is_zero(),
            Number::Approx(_) => false,
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, Number::Exact(_))
    }

    pub fn is_real(&self) -> bool {
        match self {
            Number::Exact(c) => c.im.is_zero(),
            Number::Approx(c) => c.im == 0.0,
        }
    }

    /// exact real value if there is one
    pub fn as_rational(&self) -> Option<BigRational> {
        match self {
            Number::Exact(c) if c.im.is_zero() => Some(c.re.clone()),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<BigInt> {
        self.as_rational()
            .filter(|r| r.is_integer())
            .map(|r| r.to_integer())
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_integer().and_then(|i| i.to_i64())
    }

    pub fn is_integer(&self) -> bool {
        self.as_integer().is_some()
    }

    pub fn is_negative_real(&self) -> bool {
        match self {
            Number::Exact(c) => c.im.is_zero() && c.re.is_negative(),
            Number::Approx(c) => c.im == 0.0 && c.re < 0.0,
        }
    }

    pub fn is_positive_real(&self) -> bool {
        match self {
            Number::Exact(c) => c.im.is_zero() && c.re.is_positive(),
            Number::Approx(c) => c.im == 0.0 && c.re > 0.0,
        }
    }

    pub fn to_complex64(&self) -> Complex64 {
        match self {
            Number::Exact(c) => Complex64::new(
                c.re.to_f64().unwrap_or(f64::NAN),
                c.im.to_f64().unwrap_or(f64::NAN),
            ),
            Number::Approx(c) => *c,
        }
    }

    /// comparison of two real numbers, `None` when either one has an imaginary part
    pub fn partial_cmp_real(&self, other: &Number) -> Option<Ordering> {
        match (self.as_rational(), other.as_rational()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ if self.is_real() && other.is_real() => {
                self.to_complex64().re.partial_cmp(&other.to_complex64().re)
            }
            _ => None,
        }
    }

    pub fn checked_div(&self, other: &Number) -> Option<Number> {
        if other.is_zero() {
            return None;
        }
        match (self, other) {
            (Number::Exact(a), Number::Exact(b)) => Some(Number::Exact(a / b)),
            _ => Some(Number::Approx(self.to_complex64() / other.to_complex64())),
        }
    }

    pub fn recip(&self) -> Option<Number> {
        Number::int(1).checked_div(self)
    }

    /// integer power; `None` for a zero base with a negative exponent
    pub fn pow_int(&self, n: &BigInt) -> Option<Number> {
        if n.is_negative() {
            return self.pow_int(&-n)?.recip();
        }
        match self {
            Number::Exact(c) => match n.to_u64() {
                Some(e) if e <= MAX_EXACT_EXPONENT => {
                    let mut result = Complex::new(BigRational::one(), BigRational::zero());
                    let mut base = c.clone();
                    let mut e = e;
                    while e > 0 {
                        if e & 1 == 1 {
                            result = &result * &base;
                        }
                        base = &base * &base;
                        e >>= 1;
                    }
                    Some(Number::Exact(result))
                }
                _ => {
                    let e = n.to_f64()?;
                    Some(Number::Approx(self.to_complex64().powf(e)))
                }
            },
            Number::Approx(c) => Some(Number::Approx(c.powf(n.to_f64()?))),
        }
    }

    /// exact q-th root of a real rational, only when it exists in the rationals
    pub fn exact_root(&self, q: u32) -> Option<Number> {
        let r = self.as_rational()?;
        if q == 0 {
            return None;
        }
        if r.is_negative() {
            if q % 2 == 0 {
                return None;
            }
            return Number::from_rational(-r).exact_root(q).map(|v| -v);
        }
        let num_root = r.numer().nth_root(q);
        let den_root = r.denom().nth_root(q);
        let candidate = BigRational::new(num_root, den_root);
        let back = Number::from_rational(candidate.clone()).pow_int(&BigInt::from(q))?;
        if back == Number::from_rational(r) {
            Some(Number::from_rational(candidate))
        } else {
            None
        }
    }

    /// split a non-negative integer into `outside^q * inside` pulling out small perfect powers
    pub fn extract_root(value: &BigInt, q: u32) -> (BigInt, BigInt) {
        let mut outside = BigInt::one();
        let mut inside = value.clone();
        if inside.is_zero() || q < 2 {
            return (outside, inside);
        }
        let mut k = BigInt::from(2);
        let limit = BigInt::from(1000);
        while k <= limit {
            let kq = num::pow(k.clone(), q as usize);
            if kq > inside {
                break;
            }
            while (&inside % &kq).is_zero() {
                inside /= &kq;
                outside *= &k;
            }
            k += 1;
        }
        (outside, inside)
    }

    /// absolute value of an exact real number
    pub fn abs_real(&self) -> Option<Number> {
        self.as_rational().map(|r| Number::from_rational(r.abs()))
    }

    pub fn signum_real(&self) -> Option<Number> {
        self.as_rational()
            .map(|r| Number::from_rational(BigRational::from_integer(r.numer().signum())))
    }

    /// continued fraction reconstruction of a float, bounded by denominator size and steps
    pub fn rationalize(value: f64, max_denominator: i64, max_iter: usize, tol: f64) -> Option<BigRational> {
        if !value.is_finite() || value.abs() > 1e15 {
            return None;
        }
        let scale = value.abs().max(1.0);
        let mut a = value.floor();
        let mut frac = value - a;
        let (mut p_prev, mut p) = (1i128, a as i128);
        let (mut q_prev, mut q) = (0i128, 1i128);
        for _ in 0..max_iter {
            if ((p as f64) / (q as f64) - value).abs() <= tol * scale {
                return Some(BigRational::new(BigInt::from(p), BigInt::from(q)));
            }
            if frac.abs() < f64::EPSILON {
                break;
            }
            let inv = 1.0 / frac;
            a = inv.floor();
            frac = inv - a;
            let ai = a as i128;
            let p_next = ai.checked_mul(p)?.checked_add(p_prev)?;
            let q_next = ai.checked_mul(q)?.checked_add(q_prev)?;
            if q_next > max_denominator as i128 {
                break;
            }
            (p_prev, p) = (p, p_next);
            (q_prev, q) = (q, q_next);
        }
        if ((p as f64) / (q as f64) - value).abs() <= tol * scale {
            Some(BigRational::new(BigInt::from(p), BigInt::from(q)))
        } else {
            None
        }
    }

    /// exact number close to `value` if both parts rationalize
    pub fn downcast(value: Complex64, max_denominator: i64, max_iter: usize, tol: f64) -> Option<Number> {
        let re = Number::rationalize(value.re, max_denominator, max_iter, tol)?;
        let im = if value.im.abs() <= tol * value.re.abs().max(1.0) {
            BigRational::zero()
        } else {
            Number::rationalize(value.im, max_denominator, max_iter, tol)?
        };
        Some(Number::complex(re, im))
    }
}

impl<'a> Add<&'a Number> for &'a Number {
    type Output = Number;
    fn add(self, rhs: &'a Number) -> Number {
        match (self, rhs) {
            (Number::Exact(a), Number::Exact(b)) => Number::Exact(a + b),
            _ => Number::Approx(self.to_complex64() + rhs.to_complex64()),
        }
    }
}

impl<'a> Sub<&'a Number> for &'a Number {
    type Output = Number;
    fn sub(self, rhs: &'a Number) -> Number {
        match (self, rhs) {
            (Number::Exact(a), Number::Exact(b)) => Number::Exact(a - b),
            _ => Number::Approx(self.to_complex64() - rhs.to_complex64()),
        }
    }
}

impl<'a> Mul<&'a Number> for &'a Number {
    type Output = Number;
    fn mul(self, rhs: &'a Number) -> Number {
        match (self, rhs) {
            (Number::Exact(a), Number::Exact(b)) => Number::Exact(a * b),
            _ => Number::Approx(self.to_complex64() * rhs.to_complex64()),
        }
    }
}

impl Neg for Number {
    type Output = Number;
    fn neg(self) -> Number {
        match self {
            Number::Exact(c) => Number::Exact(-c),
            Number::Approx(c) => Number::Approx(-c),
        }
    }
}

fn fmt_imaginary(f: &mut fmt::Formatter<'_>, im: &BigRational) -> fmt::Result {
    if im.is_one() {
        write!(f, "i")
    } else if (-im).is_one() {
        write!(f, "-i")
    } else if im.is_integer() {
        write!(f, "{}i", im)
    } else {
        write!(f, "({})i", im)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Exact(c) if c.im.is_zero() => write!(f, "{}", c.re),
            Number::Exact(c) if c.re.is_zero() => fmt_imaginary(f, &c.im),
            Number::Exact(c) => {
                write!(f, "({} + ", c.re)?;
                fmt_imaginary(f, &c.im)?;
                write!(f, ")")
            }
            Number::Approx(c) if c.im == 0.0 => write!(f, "{}", c.re),
            Number::Approx(c) => write!(f, "({} + {}i)", c.re, c.im),
        }
    }
}
