//! numerical fallbacks of the solver
///  Example#
/// ```
/// use RustedSymSolve::numerical::newton_solver::{approximate_roots, NewtonSettings};
/// use RustedSymSolve::symbolic::symbolic_engine::Expr;
/// let f = Expr::parse_expression("x^5 + x + 1").unwrap();
/// let roots = approximate_roots(&f, "x", &NewtonSettings::default()).unwrap();
/// assert!(!roots.is_empty());
/// ```
pub mod newton_solver;
