//! Solving statements: equations, boolean combinations of them, inequalities and set
//! membership, each turned into the set of values of the variable for which it holds.
use crate::solver::analytical_solver::solve;
use crate::solver::errors::SolveResult;
use crate::solver::inequality_solver::solve_inequality;
use crate::solver::solve_settings::SolveContext;
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_sets::{Set, SpecialSet};
use log::{debug, info};

impl Expr {
    /// Values of `var` for which the statement `self` holds, default settings.
    ///
    /// # Examples
    /// ```
    /// use RustedSymSolve::symbolic::symbolic_engine::Expr;
    /// let statement = Expr::parse_expression("x^2 = 4").unwrap();
    /// assert_eq!(statement.solve_statement("x").unwrap().len(), Some(2));
    /// ```
    pub fn solve_statement(&self, var: &str) -> SolveResult<Set> {
        self.solve_statement_with(var, &SolveContext::default())
    }

    pub fn solve_statement_with(&self, var: &str, ctx: &SolveContext) -> SolveResult<Set> {
        info!("solving statement {} for {}", self, var);
        let solution = solve_statement(self, &Expr::var(var), ctx)?;
        info!("statement solution {}", solution);
        Ok(solution)
    }
}

fn complement(set: Set) -> Set {
    Set::Special(SpecialSet::Complexes).minus(set)
}

/// `f(x) = S`: `S` itself when `f` is `x`, otherwise `f` inverted against every element
fn solve_set_equation(side: &Expr, set: &Set, x: &Expr, ctx: &SolveContext) -> SolveResult<Set> {
    if side == x {
        return Ok(set.clone());
    }
    let Some(elements) = set.elements() else {
        debug!("{} = {} has no finite form", side, set);
        return Ok(Set::empty());
    };
    if !side.contains_node(x) {
        return Ok(Set::empty());
    }
    let mut out = Vec::new();
    for element in elements {
        ctx.check_cancelled()?;
        out.extend(side.invert_bounded(element, x, ctx.settings().max_unity_roots)?);
    }
    Ok(Set::finite(out))
}

pub fn solve_statement(expr: &Expr, x: &Expr, ctx: &SolveContext) -> SolveResult<Set> {
    let _guard = ctx.enter()?;
    let solution = match expr {
        Expr::Equals(a, b) => match (a.as_ref(), b.as_ref()) {
            (side, Expr::Set(set)) | (Expr::Set(set), side) => {
                solve_set_equation(side, set, x, ctx)?
            }
            (a, b) => solve(&(a.clone() - b.clone()), x, false, ctx)?,
        },
        Expr::And(a, b) => {
            solve_statement(a, x, ctx)?.intersection(solve_statement(b, x, ctx)?)
        }
        Expr::Or(a, b) => solve_statement(a, x, ctx)?.union(solve_statement(b, x, ctx)?),
        Expr::Implies(a, b) => {
            complement(solve_statement(a, x, ctx)?).union(solve_statement(b, x, ctx)?)
        }
        Expr::Not(a) => complement(solve_statement(a, x, ctx)?),
        Expr::Xor(a, b) => {
            let (left, right) = (solve_statement(a, x, ctx)?, solve_statement(b, x, ctx)?);
            left.clone()
                .minus(right.clone())
                .union(right.minus(left))
        }
        Expr::Greater(a, b) => solve_inequality(&(a.as_ref().clone() - b.as_ref().clone()), x, ctx)?,
        Expr::Less(a, b) => solve_inequality(&(b.as_ref().clone() - a.as_ref().clone()), x, ctx)?,
        Expr::GreaterOrEqual(a, b) => {
            let difference = a.as_ref().clone() - b.as_ref().clone();
            solve_inequality(&difference, x, ctx)?.union(solve(&difference, x, false, ctx)?)
        }
        Expr::LessOrEqual(a, b) => {
            let difference = b.as_ref().clone() - a.as_ref().clone();
            solve_inequality(&difference, x, ctx)?.union(solve(&difference, x, false, ctx)?)
        }
        Expr::In(element, set) if **element == *x => set.as_ref().clone(),
        Expr::In(element, set) => match set.elements() {
            Some(values) => {
                let mut out = Set::empty();
                for value in values {
                    out = out.union(solve(&(element.as_ref().clone() - value.clone()), x, false, ctx)?);
                }
                out
            }
            None => Set::empty(),
        },
        _ if expr == x => Set::singleton(Expr::Bool(true)),
        _ => Set::empty(),
    };
    Ok(solution.simplify())
}
