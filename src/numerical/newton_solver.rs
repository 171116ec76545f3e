//! Newton-Raphson iterations over the complex plane.
//!
//! Numeric fallback of the analytical solver: starting points are laid out on a rectangular grid,
//! each start is iterated independently (in parallel with rayon), converged points with a small
//! residual are kept and deduplicated by proximity.
//!
//! # Example
//! ```
//! use RustedSymSolve::numerical::newton_solver::{NewtonSettings, approximate_roots};
//! use RustedSymSolve::symbolic::symbolic_engine::Expr;
//! let f = Expr::parse_expression("x^3 - 2*x - 5").unwrap();
//! let roots = approximate_roots(&f, "x", &NewtonSettings::default()).unwrap();
//! assert_eq!(roots.len(), 3);
//! ```
use crate::symbolic::symbolic_engine::Expr;
use log::{debug, info};
use num_complex::Complex64;
use rayon::prelude::*;
use std::fmt;

/// Error types for a single Newton run
#[derive(Debug, Clone, PartialEq)]
pub enum RootFindingError {
    MaxIterationsReached,
    DerivativeZero,
    /// the function or its derivative is undefined at the current point
    UndefinedPoint,
    InvalidInput(String),
}

impl fmt::Display for RootFindingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RootFindingError::MaxIterationsReached => write!(f, "Maximum iterations reached"),
            RootFindingError::DerivativeZero => write!(f, "Derivative is zero"),
            RootFindingError::UndefinedPoint => write!(f, "Function is undefined at the iterate"),
            RootFindingError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
        }
    }
}

impl std::error::Error for RootFindingError {}

/// Grid and stopping criteria of the Newton fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct NewtonSettings {
    /// lower-left corner of the grid of starting points
    pub from: Complex64,
    /// upper-right corner of the grid of starting points
    pub to: Complex64,
    /// number of steps along the real and imaginary axes
    pub step_count: (usize, usize),
    /// iterations per starting point
    pub iterations: usize,
    /// residual below which a point counts as a root
    pub tolerance: f64,
}

impl Default for NewtonSettings {
    fn default() -> Self {
        NewtonSettings {
            from: Complex64::new(-10.0, -10.0),
            to: Complex64::new(10.0, 10.0),
            step_count: (10, 10),
            iterations: 30,
            tolerance: 1e-9,
        }
    }
}

impl NewtonSettings {
    fn starting_points(&self) -> Vec<Complex64> {
        let (n_re, n_im) = (self.step_count.0.max(1), self.step_count.1.max(1));
        let d_re = (self.to.re - self.from.re) / n_re as f64;
        let d_im = (self.to.im - self.from.im) / n_im as f64;
        (0..=n_re)
            .flat_map(|i| {
                (0..=n_im).map(move |j| {
                    Complex64::new(
                        self.from.re + d_re * i as f64,
                        self.from.im + d_im * j as f64,
                    )
                })
            })
            .collect()
    }
}

/// One Newton run from `z0`.
///
/// Stops when the residual falls below `tolerance` or the step becomes negligible.
pub fn newton_raphson_complex<F, D>(
    function: &F,
    derivative: &D,
    mut z: Complex64,
    max_iterations: usize,
    tolerance: f64,
) -> Result<Complex64, RootFindingError>
where
    F: Fn(Complex64) -> Option<Complex64>,
    D: Fn(Complex64) -> Option<Complex64>,
{
    for _ in 0..max_iterations {
        let fz = function(z).ok_or(RootFindingError::UndefinedPoint)?;
        if fz.norm() < tolerance {
            return Ok(z);
        }
        let dfz = derivative(z).ok_or(RootFindingError::UndefinedPoint)?;
        if dfz.norm() < 1e-15 {
            return Err(RootFindingError::DerivativeZero);
        }
        let z_new = z - fz / dfz;
        if !(z_new.re.is_finite() && z_new.im.is_finite()) {
            return Err(RootFindingError::UndefinedPoint);
        }
        if (z_new - z).norm() < tolerance * z.norm().max(1.0) {
            return Ok(z_new);
        }
        z = z_new;
    }
    Err(RootFindingError::MaxIterationsReached)
}

/// tiny imaginary or real parts produced by rounding are dropped
fn clean(z: Complex64) -> Complex64 {
    let scale = z.norm().max(1.0);
    let re = if z.re.abs() < 1e-12 * scale { 0.0 } else { z.re };
    let im = if z.im.abs() < 1e-10 * scale { 0.0 } else { z.im };
    Complex64::new(re, im)
}

/// Approximate roots of `expr` in `var` found from the grid of starting points.
///
/// # Returns
/// Distinct roots sorted by real then imaginary part; `InvalidInput` when `expr` has a free
/// variable other than `var`.
pub fn approximate_roots(
    expr: &Expr,
    var: &str,
    settings: &NewtonSettings,
) -> Result<Vec<Complex64>, RootFindingError> {
    let vars = expr.vars();
    if vars.iter().any(|v| v != var) {
        return Err(RootFindingError::InvalidInput(format!(
            "expression has free variables {:?} besides {}",
            vars, var
        )));
    }
    let function = expr.lambdify_complex(var);
    let derivative = expr.diff(var).simplify().lambdify_complex(var);
    let starts = settings.starting_points();
    debug!("newton fallback from {} starting points", starts.len());
    let candidates: Vec<Complex64> = starts
        .par_iter()
        .filter_map(|z0| {
            newton_raphson_complex(
                &function,
                &derivative,
                *z0,
                settings.iterations,
                settings.tolerance,
            )
            .ok()
        })
        .map(clean)
        .filter(|z| function(*z).is_some_and(|fz| fz.norm() < settings.tolerance))
        .collect();
    let mut roots: Vec<Complex64> = Vec::new();
    for z in candidates {
        let close = |r: &Complex64| (r - z).norm() < 1e-6 * z.norm().max(1.0);
        if !roots.iter().any(close) {
            roots.push(z);
        }
    }
    roots.sort_by(|a, b| {
        a.re.partial_cmp(&b.re)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.im.partial_cmp(&b.im).unwrap_or(std::cmp::Ordering::Equal))
    });
    info!("newton fallback found {} roots of {}", roots.len(), expr);
    Ok(roots)
}
