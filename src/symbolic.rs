//! # Symbolic engine
//! expression trees, exact numbers, sets, simplification and the parser
///  Example#
/// ```
/// use RustedSymSolve::symbolic::symbolic_engine::Expr;
/// let f = Expr::parse_expression("x^2 + 2*x + 1").unwrap();
/// // differentiate and evaluate
/// let df = f.diff("x").simplify();
/// println!("df/dx = {}", df);
/// let at_one = f.substitute_variable("x", &Expr::int(1)).simplify();
/// assert_eq!(at_one, Expr::int(4));
/// ```
pub mod numbers;
/// a module turns a String expression into a symbolic expression
pub mod parse_expr;
pub mod symbolic_engine;
/// derivatives and numeric evaluation
pub mod symbolic_engine_derivatives;
#[cfg(test)]
mod symbolic_engine_tests;
/// result sets of the solver
pub mod symbolic_sets;
pub mod symbolic_simplify;
/// structural queries over expression trees
pub mod tree_analyzer;
