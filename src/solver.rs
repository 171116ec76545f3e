//! # Equation solver
//! finds the set of values of a variable for which an expression vanishes or a statement holds
///  Example#1
/// ```
/// use RustedSymSolve::symbolic::symbolic_engine::Expr;
/// // roots of a polynomial are exact
/// let f = Expr::parse_expression("x^3 - 7*x + 6").unwrap();
/// let roots = f.solve("x").unwrap();
/// assert_eq!(roots.len(), Some(3));
/// ```
/// Example#2
/// ```
/// use RustedSymSolve::solver::solve_settings::{SolveContext, SolverSettings};
/// use RustedSymSolve::symbolic::symbolic_engine::Expr;
/// // settings come from a task document
/// let settings = SolverSettings::from_document("solver max_depth: 50 allow_newton: false").unwrap();
/// let ctx = SolveContext::new(settings);
/// let f = Expr::parse_expression("2^x - 8").unwrap();
/// let roots = f.solve_with("x", &ctx).unwrap();
/// println!("roots {}, {} nested solves", roots, ctx.calls());
/// ```
pub mod analytical_solver;
/// reduction of `1/f + 1/g + ...` to a single numerator
pub mod common_denominator_solver;
pub mod errors;
/// exponential reductions: `b^(a x + c)` and `x^(p q)`
pub mod exponential_solver;
/// equations with rational powers, raised to the common denominator of the exponents
pub mod fractioned_polynoms;
/// sign chart for `expr > 0`
pub mod inequality_solver;
/// inversion of single expression nodes: `f(a) = v  =>  a = ...`
pub mod invert_node;
/// closed forms up to the fourth degree
pub mod polynomial_solver;
/// solver settings, cancellation token and recursion bookkeeping
pub mod solve_settings;
/// equations, boolean combinations, inequalities and set membership
pub mod statement_solver;
/// Euler substitution `t = e^(i x)`
pub mod trigonometric_solver;

#[cfg(test)]
mod solver_tests;
