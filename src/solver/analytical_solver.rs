//! # Analytical equation solver
//!
//! Entry point of the solver: finds the set of values of a variable for which an expression
//! equals zero.
//!
//! ## Algorithm
//! 1. trivial cases: the expression is the variable itself, or does not contain it
//! 2. shape dispatch: products split into factors, quotients subtract the roots of the
//!    denominator, powers reduce to their base, an isolated `f(x) - c` is inverted node by node
//!    (only when compensating, see below), functions are inverted against zero
//! 3. the polynomial finder
//! 4. substitution search (not compensating): the smallest subtree covering every occurrence
//!    of the variable is replaced by a fresh variable, the simpler equation is solved and its
//!    roots are pushed back through `subtree - root = 0`
//! 5. reduction strategies (compensating): trigonometric, exponential, common denominator,
//!    fractional polynomial
//! 6. Newton fallback for equations in one variable
//!
//! The compensation flag marks calls that solve an already isolated sub-equation; those never
//! re-enter the substitution search, which keeps the recursion finite. The recursion depth is
//! still counted by the `SolveContext` and bounded by `SolverSettings::max_depth`.
//!
//! Finite results are simplified, downcast to exact numbers where the equation allows it and
//! filtered by the domain of the equation.
use crate::numerical::newton_solver::approximate_roots;
use crate::solver::common_denominator_solver::solve_common_denominator;
use crate::solver::errors::SolveResult;
use crate::solver::exponential_solver::{
    solve_exponential_linear, solve_exponential_multiplicative,
};
use crate::solver::fractioned_polynoms::solve_fractioned_polynomial;
use crate::solver::polynomial_solver::solve_polynomial;
use crate::solver::solve_settings::{SolveContext, SolverSettings};
use crate::solver::trigonometric_solver::solve_trigonometric;
use crate::symbolic::numbers::Number;
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_sets::Set;
use crate::symbolic::tree_analyzer::{alternate_forms, minimum_subtree};
use log::{debug, info, trace, warn};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

/// Reducers tried in compensating mode, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, Display)]
pub enum ReductionStrategy {
    Trigonometric,
    ExponentialMultiplicative,
    ExponentialLinear,
    CommonDenominator,
    FractionalPolynomial,
}

impl ReductionStrategy {
    pub fn apply(&self, expr: &Expr, x: &Expr, ctx: &SolveContext) -> SolveResult<Option<Set>> {
        match self {
            ReductionStrategy::Trigonometric => solve_trigonometric(expr, x, ctx),
            ReductionStrategy::ExponentialMultiplicative => {
                solve_exponential_multiplicative(expr, x, ctx)
            }
            ReductionStrategy::ExponentialLinear => solve_exponential_linear(expr, x, ctx),
            ReductionStrategy::CommonDenominator => solve_common_denominator(expr, x, ctx),
            ReductionStrategy::FractionalPolynomial => solve_fractioned_polynomial(expr, x, ctx),
        }
    }

    /// roots of these reductions may not satisfy the original equation (powers were raised)
    pub fn verifies_roots(&self) -> bool {
        matches!(
            self,
            ReductionStrategy::ExponentialMultiplicative | ReductionStrategy::FractionalPolynomial
        )
    }
}

impl Expr {
    /// Solves `self = 0` for the variable `var` with default settings.
    ///
    /// # Examples
    /// ```
    /// use RustedSymSolve::symbolic::symbolic_engine::Expr;
    /// let f = Expr::parse_expression("x^2 - 1").unwrap();
    /// let roots = f.solve("x").unwrap();
    /// assert_eq!(roots.len(), Some(2));
    /// ```
    pub fn solve(&self, var: &str) -> SolveResult<Set> {
        self.solve_with(var, &SolveContext::default())
    }

    /// Solves `self = 0` for `var` in the given context.
    pub fn solve_with(&self, var: &str, ctx: &SolveContext) -> SolveResult<Set> {
        info!("solving {} = 0 for {}", self, var);
        let x = Expr::var(var);
        let roots = solve(self, &x, false, ctx)?;
        info!(
            "solution set {} ({} nested solves, depth {})",
            roots,
            ctx.calls(),
            ctx.max_depth_seen()
        );
        Ok(roots)
    }
}

/// The recursive solver: roots of `expr = 0` in the sub-expression `x`.
pub fn solve(expr: &Expr, x: &Expr, compensate: bool, ctx: &SolveContext) -> SolveResult<Set> {
    let _guard = ctx.enter()?;
    trace!("solve {} for {} (compensate = {})", expr, x, compensate);
    let (roots, verify) = dispatch(expr, x, compensate, ctx)?;
    Ok(post_process(expr, x, roots, verify, ctx.settings()))
}

/// raw result and whether its roots need checking against `expr`
fn dispatch(
    expr: &Expr,
    x: &Expr,
    compensate: bool,
    ctx: &SolveContext,
) -> SolveResult<(Set, bool)> {
    if expr == x {
        return Ok((Set::singleton(Expr::int(0)), false));
    }
    if !expr.contains_node(x) {
        return Ok((Set::empty(), false));
    }
    if let Some(roots) = solve_by_shape(expr, x, compensate, ctx)? {
        return Ok((roots, false));
    }
    if let Some(roots) = solve_polynomial(expr, x, ctx)? {
        return Ok((roots, false));
    }
    if !compensate {
        if let Some(roots) = solve_by_substitution(expr, x, ctx)? {
            return Ok((roots, false));
        }
    } else {
        for strategy in ReductionStrategy::iter() {
            ctx.check_cancelled()?;
            trace!("trying {} reduction on {}", strategy, expr);
            match strategy.apply(expr, x, ctx)? {
                Some(roots) if !roots.is_empty() => {
                    debug!("{} reduction solved {}: {}", strategy, expr, roots);
                    return Ok((roots, strategy.verifies_roots()));
                }
                _ => {}
            }
        }
    }
    if let Some(roots) = solve_numerically(expr, x, ctx) {
        return Ok((roots, false));
    }
    Ok((Set::empty(), false))
}

/// pushes every root `r` of a substituted equation back through `sub - r = 0`
pub(crate) fn solve_substituted(
    roots: &Set,
    sub: &Expr,
    x: &Expr,
    ctx: &SolveContext,
) -> SolveResult<Option<Set>> {
    let Some(elements) = roots.elements() else {
        return Ok(None);
    };
    if elements.is_empty() {
        return Ok(None);
    }
    let mut out = Set::empty();
    for root in elements {
        out = out.union(solve(&(sub.clone() - root.clone()), x, true, ctx)?);
    }
    Ok(Some(out.simplify()))
}

/// x-values for which `sub` takes one of the `roots`, by direct inversion
pub(crate) fn invert_substituted(
    roots: &Set,
    sub: &Expr,
    x: &Expr,
    ctx: &SolveContext,
) -> SolveResult<Option<Set>> {
    let Some(elements) = roots.elements() else {
        return Ok(None);
    };
    if elements.is_empty() {
        return Ok(None);
    }
    let mut out = Vec::new();
    for root in elements {
        ctx.check_cancelled()?;
        out.extend(sub.invert_bounded(root, x, ctx.settings().max_unity_roots)?);
    }
    Ok(Some(Set::finite(out).simplify()))
}

fn solve_by_shape(
    expr: &Expr,
    x: &Expr,
    compensate: bool,
    ctx: &SolveContext,
) -> SolveResult<Option<Set>> {
    match expr {
        Expr::Mul(a, b) => Ok(Some(
            solve(a, x, false, ctx)?.union(solve(b, x, false, ctx)?),
        )),
        Expr::Div(a, b) => Ok(Some(
            solve(a, x, false, ctx)?.minus(solve(b, x, false, ctx)?),
        )),
        // b^0 = 1 never vanishes
        Expr::Pow(_, exp) if exp.is_zero() => Ok(Some(Set::empty())),
        Expr::Pow(base, _) => Ok(Some(solve(base, x, false, ctx)?)),
        Expr::Sub(sub, min) if compensate && !min.contains_node(x) => {
            if **sub == *x {
                return Ok(Some(Set::singleton(min.as_ref().clone())));
            }
            if let Expr::Piecewise(pieces) = sub.as_ref() {
                return solve_piecewise(pieces, min, x, ctx).map(Some);
            }
            invert_through_child(sub, min, x, ctx)
        }
        _ if expr.is_function_node() => invert_through_child(expr, &Expr::int(0), x, ctx),
        _ => Ok(None),
    }
}

/// `node = value` with `x` inside exactly one child: invert for that child and recurse
fn invert_through_child(
    node: &Expr,
    value: &Expr,
    x: &Expr,
    ctx: &SolveContext,
) -> SolveResult<Option<Set>> {
    let carriers: Vec<&Expr> = node
        .children()
        .into_iter()
        .filter(|c| c.contains_node(x))
        .collect();
    let [child] = carriers.as_slice() else {
        return Ok(None);
    };
    let child = (*child).clone();
    let candidates = node.invert_bounded(value, &child, ctx.settings().max_unity_roots)?;
    trace!("{} = {} gives {} candidates for {}", node, value, candidates.len(), child);
    let mut out = Set::empty();
    for candidate in candidates {
        out = out.union(solve(&(child.clone() - candidate), x, true, ctx)?);
    }
    Ok(Some(out))
}

/// every piece solved against `value` under its own condition and the negation of the ones
/// before it
fn solve_piecewise(
    pieces: &[(Expr, Expr)],
    value: &Expr,
    x: &Expr,
    ctx: &SolveContext,
) -> SolveResult<Set> {
    let mut before = Expr::Bool(true);
    let mut out = Set::empty();
    for (piece, condition) in pieces {
        let guard = Expr::And(condition.clone().boxed(), before.clone().boxed()).simplify();
        let roots = solve(&(piece.clone() - value.clone()), x, true, ctx)?;
        out = out.union(restrict(roots, x, &guard));
        before = Expr::And(before.boxed(), Expr::Not(condition.clone().boxed()).boxed()).simplify();
    }
    Ok(out)
}

/// keeps the roots for which `guard` holds; undecided ones are kept under a `Provided`
fn restrict(roots: Set, x: &Expr, guard: &Expr) -> Set {
    match roots {
        Set::Finite(elements) => Set::finite(
            elements
                .into_iter()
                .filter_map(|r| match guard.substitute(x, &r).simplify() {
                    Expr::Bool(true) => Some(r),
                    Expr::Bool(false) => None,
                    other => Some(r.provided(other)),
                })
                .collect(),
        ),
        other => match x {
            Expr::Var(name) => other.intersection(Set::conditional(name, guard.clone())),
            _ => other,
        },
    }
}

fn solve_by_substitution(expr: &Expr, x: &Expr, ctx: &SolveContext) -> SolveResult<Option<Set>> {
    for alt in alternate_forms(expr, ctx.settings().max_alternates) {
        ctx.check_cancelled()?;
        if !alt.contains_node(x) {
            // either no roots or every value is a root
            debug!("{} does not depend on {}", alt, x);
            return Ok(Some(Set::empty()));
        }
        let sub = minimum_subtree(&alt, x);
        if sub == *x {
            continue;
        }
        let t = alt.fresh_var("t", &[x]);
        let replaced = alt.substitute(&sub, &t);
        trace!("substituting {} = {} into {}", t, sub, alt);
        let t_roots = solve(&replaced, &t, false, ctx)?.simplify();
        if let Some(roots) = solve_substituted(&t_roots, &sub, x, ctx)? {
            if !roots.is_empty() {
                debug!("substitution {} = {} gave {}", t, sub, roots);
                return Ok(Some(roots));
            }
        }
    }
    Ok(None)
}

fn solve_numerically(expr: &Expr, x: &Expr, ctx: &SolveContext) -> Option<Set> {
    let settings = ctx.settings();
    let Expr::Var(name) = x else {
        return None;
    };
    if !settings.allow_newton || expr.vars().len() != 1 || !expr.params().is_empty() {
        return None;
    }
    match approximate_roots(expr, name, &settings.newton) {
        Ok(roots) if !roots.is_empty() => {
            debug!("newton fallback for {}: {} roots", expr, roots.len());
            Some(Set::finite(
                roots
                    .into_iter()
                    .map(|z| Expr::Const(Number::approx(z)))
                    .collect(),
            ))
        }
        Ok(_) => None,
        Err(e) => {
            warn!("newton fallback failed on {}: {}", expr, e);
            None
        }
    }
}

/// |expr(root)|, `None` when it cannot be evaluated
fn residual(expr: &Expr, x: &Expr, root: &Expr) -> Option<f64> {
    expr.substitute(x, root).eval_complex().map(|z| z.norm())
}

/// exact rational (or Gaussian rational) replacing an evaluable root when the equation still
/// vanishes there
fn downcast_root(expr: &Expr, x: &Expr, root: Expr, settings: &SolverSettings) -> Expr {
    if matches!(root, Expr::Const(Number::Exact(_))) || !root.is_numeric() {
        return root;
    }
    let Some(value) = root.eval_complex() else {
        return root;
    };
    let Some(exact) = Number::downcast(
        value,
        settings.downcast_max_denominator,
        settings.downcast_iterations,
        settings.downcast_tolerance,
    ) else {
        return root;
    };
    let candidate = Expr::Const(exact);
    match residual(expr, x, &candidate) {
        Some(r) if r < settings.zero_tolerance => {
            trace!("downcast {} to {}", root, candidate);
            candidate
        }
        _ => root,
    }
}

/// false when the equation is numeric at the root but undefined there
fn in_domain(expr: &Expr, x: &Expr, root: &Expr) -> bool {
    let at_root = expr.substitute(x, root);
    !(at_root.is_numeric() && at_root.eval_complex().is_none())
}

fn post_process(expr: &Expr, x: &Expr, roots: Set, verify: bool, settings: &SolverSettings) -> Set {
    let Set::Finite(elements) = roots else {
        return roots;
    };
    let kept = elements
        .into_iter()
        .map(|r| downcast_root(expr, x, r.simplify(), settings))
        .filter(|r| r.is_defined() && in_domain(expr, x, r))
        .filter(|r| {
            !verify
                || residual(expr, x, r).is_none_or(|value| value < settings.zero_tolerance)
        })
        .collect();
    Set::finite(kept)
}
