//! # Symbolic Engine Module
//!
//! This module provides the expression tree the solver works on: an immutable abstract syntax
//! tree with exact numeric leaves, elementary functions, calculus nodes, sets, boolean and
//! relational nodes and conditional wrappers.
//!
//! ## Purpose
//!
//! The symbolic engine allows users to:
//! - Build symbolic expressions with natural operator syntax (`x.clone() * x - Expr::int(1)`)
//! - Walk the tree (children, pre-order nodes, occurrence counting)
//! - Substitute sub-expressions and variables without mutating the input
//! - Generate fresh variable and parameter names that do not clash with the tree
//!
//! ## Main Structures and Methods
//!
//! ### `Expr` Enum
//! - **Leaves**: `Var(String)`, `Param(String)`, `Const(Number)`, `Pi`, `E`, `Bool(bool)`
//! - **Operations**: `Add`, `Sub`, `Mul`, `Div`, `Pow`, `Log`
//! - **Functions**: `sin`, `cos`, `tg`, `ctg`, `sec`, `cosec`, their inverses, `signum`, `abs`,
//!   `factorial`
//! - **Calculus**: `Derivative`, `Integral`, `Limit`
//! - **Logic and relations**: `Not`, `And`, `Or`, `Xor`, `Implies`, `Equals`, `Greater`, ...
//! - **Sets**: `Set(Box<Set>)`, membership `In`
//! - **Conditions**: `Provided(expr, predicate)`, `Piecewise(Vec<(expr, predicate)>)`
//!
//! ### Key Methods
//! - `Symbols(symbols: &str)` - Create multiple variables from comma-separated string
//! - `substitute(from, to)` / `substitute_variable(var, expr)` - structural substitution
//! - `count_occurrences(node)` and `nodes()` - used by the substitution search of the solver
//! - `fresh_param(base, others)` - bound parameters for periodic families of roots
//!
//! ## Interesting Code Features
//!
//! 1. **Closed tree**: every operation is an exhaustive `match`, so adding a node kind makes the
//!    compiler point at every place that has to learn about it
//!
//! 2. **Operator Overloading**: std::ops traits (Add, Sub, Mul, Div, Neg) build raw nodes, the
//!    simplifier decides later what to fold
//!
//! 3. **Non-standard Function Names**: mathematical notation (tg, ctg, arctg) as elsewhere in
//!    the framework

#![allow(non_camel_case_types)]

use crate::symbolic::numbers::Number;
use crate::symbolic::symbolic_sets::Set;
use std::collections::BTreeSet;
use std::fmt;

/// Core symbolic expression enum representing mathematical expressions as an abstract syntax tree.
///
/// # Examples
/// ```rust, ignore
/// use RustedSymSolve::symbolic::symbolic_engine::Expr;
/// let x = Expr::Var("x".to_string());
/// let expr = Expr::Add(Box::new(x), Box::new(Expr::int(2)));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Symbolic variable with a name (e.g., "x", "y")
    Var(String),
    /// Bound parameter introduced by the solver (e.g. the `n` of `2πn`)
    Param(String),
    /// Exact or approximate number
    Const(Number),
    /// π
    Pi,
    /// Euler's number
    E,
    /// Addition operation: left + right
    Add(Box<Expr>, Box<Expr>),
    /// Subtraction operation: left - right
    Sub(Box<Expr>, Box<Expr>),
    /// Multiplication operation: left * right
    Mul(Box<Expr>, Box<Expr>),
    /// Division operation: left / right
    Div(Box<Expr>, Box<Expr>),
    /// Power operation: base ^ exponent
    Pow(Box<Expr>, Box<Expr>),
    /// Logarithm: Log(base, argument); the natural logarithm has base `E`
    Log(Box<Expr>, Box<Expr>),
    sin(Box<Expr>),
    cos(Box<Expr>),
    /// Tangent function: tan(x) - uses mathematical notation 'tg'
    tg(Box<Expr>),
    /// Cotangent function: cot(x) - uses mathematical notation 'ctg'
    ctg(Box<Expr>),
    sec(Box<Expr>),
    cosec(Box<Expr>),
    arcsin(Box<Expr>),
    arccos(Box<Expr>),
    arctg(Box<Expr>),
    arcctg(Box<Expr>),
    arcsec(Box<Expr>),
    arccosec(Box<Expr>),
    signum(Box<Expr>),
    abs(Box<Expr>),
    factorial(Box<Expr>),
    /// n-th derivative of an expression with respect to a variable
    Derivative(Box<Expr>, String, usize),
    /// n-th antiderivative of an expression with respect to a variable
    Integral(Box<Expr>, String, usize),
    /// limit of an expression as the variable approaches the destination
    Limit(Box<Expr>, String, Box<Expr>),
    Bool(bool),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Xor(Box<Expr>, Box<Expr>),
    Implies(Box<Expr>, Box<Expr>),
    Equals(Box<Expr>, Box<Expr>),
    Greater(Box<Expr>, Box<Expr>),
    GreaterOrEqual(Box<Expr>, Box<Expr>),
    Less(Box<Expr>, Box<Expr>),
    LessOrEqual(Box<Expr>, Box<Expr>),
    /// set membership: element in set
    In(Box<Expr>, Box<Set>),
    Set(Box<Set>),
    /// expression valid only where the predicate holds
    Provided(Box<Expr>, Box<Expr>),
    /// list of (expression, condition) pieces, the first piece whose condition holds applies
    Piecewise(Vec<(Expr, Expr)>),
}

/// Display implementation for pretty printing symbolic expressions.
///
/// Binary nodes are fully parenthesized, functions use their mathematical names.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Var(name) | Expr::Param(name) => write!(f, "{}", name),
            Expr::Const(val) => write!(f, "{}", val),
            Expr::Pi => write!(f, "pi"),
            Expr::E => write!(f, "e"),
            Expr::Add(lhs, rhs) => write!(f, "({} + {})", lhs, rhs),
            Expr::Sub(lhs, rhs) => write!(f, "({} - {})", lhs, rhs),
            Expr::Mul(lhs, rhs) => write!(f, "({} * {})", lhs, rhs),
            Expr::Div(lhs, rhs) => write!(f, "({} / {})", lhs, rhs),
            Expr::Pow(base, exp) => write!(f, "({} ^ {})", base, exp),
            Expr::Log(base, arg) if **base == Expr::E => write!(f, "ln({})", arg),
            Expr::Log(base, arg) => write!(f, "log({}, {})", base, arg),
            Expr::sin(expr) => write!(f, "sin({})", expr),
            Expr::cos(expr) => write!(f, "cos({})", expr),
            Expr::tg(expr) => write!(f, "tg({})", expr),
            Expr::ctg(expr) => write!(f, "ctg({})", expr),
            Expr::sec(expr) => write!(f, "sec({})", expr),
            Expr::cosec(expr) => write!(f, "cosec({})", expr),
            Expr::arcsin(expr) => write!(f, "arcsin({})", expr),
            Expr::arccos(expr) => write!(f, "arccos({})", expr),
            Expr::arctg(expr) => write!(f, "arctg({})", expr),
            Expr::arcctg(expr) => write!(f, "arcctg({})", expr),
            Expr::arcsec(expr) => write!(f, "arcsec({})", expr),
            Expr::arccosec(expr) => write!(f, "arccosec({})", expr),
            Expr::signum(expr) => write!(f, "signum({})", expr),
            Expr::abs(expr) => write!(f, "abs({})", expr),
            Expr::factorial(expr) => write!(f, "({})!", expr),
            Expr::Derivative(expr, var, n) => write!(f, "derivative({}, {}, {})", expr, var, n),
            Expr::Integral(expr, var, n) => write!(f, "integral({}, {}, {})", expr, var, n),
            Expr::Limit(expr, var, dest) => write!(f, "limit({}, {}, {})", expr, var, dest),
            Expr::Bool(b) => write!(f, "{}", b),
            Expr::Not(expr) => write!(f, "not({})", expr),
            Expr::And(lhs, rhs) => write!(f, "({} and {})", lhs, rhs),
            Expr::Or(lhs, rhs) => write!(f, "({} or {})", lhs, rhs),
            Expr::Xor(lhs, rhs) => write!(f, "({} xor {})", lhs, rhs),
            Expr::Implies(lhs, rhs) => write!(f, "({} implies {})", lhs, rhs),
            Expr::Equals(lhs, rhs) => write!(f, "({} = {})", lhs, rhs),
            Expr::Greater(lhs, rhs) => write!(f, "({} > {})", lhs, rhs),
            Expr::GreaterOrEqual(lhs, rhs) => write!(f, "({} >= {})", lhs, rhs),
            Expr::Less(lhs, rhs) => write!(f, "({} < {})", lhs, rhs),
            Expr::LessOrEqual(lhs, rhs) => write!(f, "({} <= {})", lhs, rhs),
            Expr::In(elem, set) => write!(f, "({} in {})", elem, set),
            Expr::Set(set) => write!(f, "{}", set),
            Expr::Provided(expr, pred) => write!(f, "({} provided {})", expr, pred),
            Expr::Piecewise(pieces) => {
                write!(f, "piecewise(")?;
                for (i, (expr, cond)) in pieces.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "({}, {})", expr, cond)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl std::ops::Add for Expr {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Expr::Add(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Sub for Expr {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Expr::Sub(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Mul for Expr {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Expr::Mul(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Div for Expr {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        Expr::Div(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Neg for Expr {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Expr::Mul(Expr::int(-1).boxed(), self.boxed())
    }
}

impl From<i64> for Expr {
    fn from(v: i64) -> Self {
        Expr::int(v)
    }
}

impl From<Number> for Expr {
    fn from(v: Number) -> Self {
        Expr::Const(v)
    }
}

/// first name built from `base` that is not taken: `base`, `base_1`, `base_2`, ...
pub fn fresh_name(base: &str, taken: &BTreeSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    let mut i = 1usize;
    loop {
        let candidate = format!("{}_{}", base, i);
        if !taken.contains(&candidate) {
            return candidate;
        }
        i += 1;
    }
}

impl Expr {
    /// Creates a vector of symbolic variables from a comma-separated string.
    ///
    /// # Arguments
    /// * `symbols` - Comma-separated string of variable names (e.g., "x, y, z")
    ///
    /// # Returns
    /// Vector of Expr::Var instances for each variable name
    pub fn Symbols(symbols: &str) -> Vec<Expr> {
        symbols
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| Expr::Var(s.to_string()))
            .collect()
    }

    pub fn var(name: &str) -> Expr {
        Expr::Var(name.to_string())
    }

    pub fn int(v: i64) -> Expr {
        Expr::Const(Number::int(v))
    }

    /// exact n/d, d must not be zero
    pub fn rational(n: i64, d: i64) -> Expr {
        Expr::Const(Number::rational(n, d))
    }

    /// imaginary unit
    pub fn i() -> Expr {
        Expr::Const(Number::imaginary_unit())
    }

    /// Convenience method to wrap expression in Box for recursive structures.
    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    /// Creates power expression self^rhs.
    pub fn pow(self, rhs: Expr) -> Expr {
        Expr::Pow(self.boxed(), rhs.boxed())
    }

    /// Creates e^(self).
    pub fn exp(self) -> Expr {
        Expr::Pow(Expr::E.boxed(), self.boxed())
    }

    /// Creates natural logarithm ln(self).
    pub fn ln(self) -> Expr {
        Expr::Log(Expr::E.boxed(), self.boxed())
    }

    pub fn log(self, base: Expr) -> Expr {
        Expr::Log(base.boxed(), self.boxed())
    }

    pub fn sqrt(self) -> Expr {
        self.pow(Expr::rational(1, 2))
    }

    /// wraps the expression into a guard
    pub fn provided(self, predicate: Expr) -> Expr {
        Expr::Provided(self.boxed(), predicate.boxed())
    }

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Expr::Const(n) => Some(n),
            _ => None,
        }
    }

    /// Checks if expression is exactly the number zero.
    pub fn is_zero(&self) -> bool {
        matches!(self, Expr::Const(n) if n.is_zero())
    }

    pub fn is_one(&self) -> bool {
        matches!(self, Expr::Const(n) if n.is_one())
    }

    /// true for nodes the solver treats as functions: everything except leaves and arithmetic
    pub fn is_function_node(&self) -> bool {
        !matches!(
            self,
            Expr::Var(_)
                | Expr::Param(_)
                | Expr::Const(_)
                | Expr::Pi
                | Expr::E
                | Expr::Add(..)
                | Expr::Sub(..)
                | Expr::Mul(..)
                | Expr::Div(..)
                | Expr::Pow(..)
        )
    }

    /// Direct children of the node, left to right.
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Var(_)
            | Expr::Param(_)
            | Expr::Const(_)
            | Expr::Pi
            | Expr::E
            | Expr::Bool(_) => vec![],
            Expr::Add(a, b)
            | Expr::Sub(a, b)
            | Expr::Mul(a, b)
            | Expr::Div(a, b)
            | Expr::Pow(a, b)
            | Expr::Log(a, b)
            | Expr::And(a, b)
            | Expr::Or(a, b)
            | Expr::Xor(a, b)
            | Expr::Implies(a, b)
            | Expr::Equals(a, b)
            | Expr::Greater(a, b)
            | Expr::GreaterOrEqual(a, b)
            | Expr::Less(a, b)
            | Expr::LessOrEqual(a, b)
            | Expr::Provided(a, b)
            | Expr::Limit(a, _, b) => vec![&**a, &**b],
            Expr::sin(a)
            | Expr::cos(a)
            | Expr::tg(a)
            | Expr::ctg(a)
            | Expr::sec(a)
            | Expr::cosec(a)
            | Expr::arcsin(a)
            | Expr::arccos(a)
            | Expr::arctg(a)
            | Expr::arcctg(a)
            | Expr::arcsec(a)
            | Expr::arccosec(a)
            | Expr::signum(a)
            | Expr::abs(a)
            | Expr::factorial(a)
            | Expr::Not(a)
            | Expr::Derivative(a, _, _)
            | Expr::Integral(a, _, _) => vec![&**a],
            Expr::In(elem, set) => {
                let mut children = vec![elem.as_ref()];
                children.extend(set.exprs());
                children
            }
            Expr::Set(set) => set.exprs(),
            Expr::Piecewise(pieces) => pieces.iter().flat_map(|(e, c)| [e, c]).collect(),
        }
    }

    /// Rebuilds the node with every direct child mapped through `f`.
    pub fn map_children(&self, f: &mut dyn FnMut(&Expr) -> Expr) -> Expr {
        let mut un = |a: &Expr| f(a).boxed();
        match self {
            Expr::Var(_)
            | Expr::Param(_)
            | Expr::Const(_)
            | Expr::Pi
            | Expr::E
            | Expr::Bool(_) => self.clone(),
            Expr::Add(a, b) => Expr::Add(un(a), un(b)),
            Expr::Sub(a, b) => Expr::Sub(un(a), un(b)),
            Expr::Mul(a, b) => Expr::Mul(un(a), un(b)),
            Expr::Div(a, b) => Expr::Div(un(a), un(b)),
            Expr::Pow(a, b) => Expr::Pow(un(a), un(b)),
            Expr::Log(a, b) => Expr::Log(un(a), un(b)),
            Expr::And(a, b) => Expr::And(un(a), un(b)),
            Expr::Or(a, b) => Expr::Or(un(a), un(b)),
            Expr::Xor(a, b) => Expr::Xor(un(a), un(b)),
            Expr::Implies(a, b) => Expr::Implies(un(a), un(b)),
            Expr::Equals(a, b) => Expr::Equals(un(a), un(b)),
            Expr::Greater(a, b) => Expr::Greater(un(a), un(b)),
            Expr::GreaterOrEqual(a, b) => Expr::GreaterOrEqual(un(a), un(b)),
            Expr::Less(a, b) => Expr::Less(un(a), un(b)),
            Expr::LessOrEqual(a, b) => Expr::LessOrEqual(un(a), un(b)),
            Expr::Provided(a, b) => Expr::Provided(un(a), un(b)),
            Expr::Limit(a, var, b) => Expr::Limit(un(a), var.clone(), un(b)),
            Expr::sin(a) => Expr::sin(un(a)),
            Expr::cos(a) => Expr::cos(un(a)),
            Expr::tg(a) => Expr::tg(un(a)),
            Expr::ctg(a) => Expr::ctg(un(a)),
            Expr::sec(a) => Expr::sec(un(a)),
            Expr::cosec(a) => Expr::cosec(un(a)),
            Expr::arcsin(a) => Expr::arcsin(un(a)),
            Expr::arccos(a) => Expr::arccos(un(a)),
            Expr::arctg(a) => Expr::arctg(un(a)),
            Expr::arcctg(a) => Expr::arcctg(un(a)),
            Expr::arcsec(a) => Expr::arcsec(un(a)),
            Expr::arccosec(a) => Expr::arccosec(un(a)),
            Expr::signum(a) => Expr::signum(un(a)),
            Expr::abs(a) => Expr::abs(un(a)),
            Expr::factorial(a) => Expr::factorial(un(a)),
            Expr::Not(a) => Expr::Not(un(a)),
            Expr::Derivative(a, var, n) => Expr::Derivative(un(a), var.clone(), *n),
            Expr::Integral(a, var, n) => Expr::Integral(un(a), var.clone(), *n),
            Expr::In(elem, set) => {
                let elem = f(elem).boxed();
                Expr::In(elem, set.map_exprs(f).boxed())
            }
            Expr::Set(set) => Expr::Set(set.map_exprs(f).boxed()),
            Expr::Piecewise(pieces) => {
                Expr::Piecewise(pieces.iter().map(|(e, c)| (f(e), f(c))).collect())
            }
        }
    }

    /// Replaces every occurrence of `from` by `to`; the input is left untouched.
    pub fn substitute(&self, from: &Expr, to: &Expr) -> Expr {
        if self == from {
            return to.clone();
        }
        self.map_children(&mut |child| child.substitute(from, to))
    }

    /// substitute a variable with an expression
    pub fn substitute_variable(&self, var: &str, expr: &Expr) -> Expr {
        self.substitute(&Expr::Var(var.to_string()), expr)
    }

    /// Applies `f` to every node bottom-up, children first.
    pub fn replace_bottom_up(&self, f: &dyn Fn(&Expr) -> Option<Expr>) -> Expr {
        let rebuilt = self.map_children(&mut |child| child.replace_bottom_up(f));
        f(&rebuilt).unwrap_or(rebuilt)
    }

    /// does `node` occur anywhere in the tree
    pub fn contains_node(&self, node: &Expr) -> bool {
        self == node || self.children().into_iter().any(|c| c.contains_node(node))
    }

    /// check if the expression contains a variable
    pub fn contains_variable(&self, var_name: &str) -> bool {
        match self {
            Expr::Var(name) => name == var_name,
            _ => self
                .children()
                .into_iter()
                .any(|c| c.contains_variable(var_name)),
        }
    }

    /// Number of non-overlapping occurrences of `node`.
    pub fn count_occurrences(&self, node: &Expr) -> usize {
        if self == node {
            return 1;
        }
        self.children()
            .into_iter()
            .map(|c| c.count_occurrences(node))
            .sum()
    }

    /// Pre-order list of all nodes.
    pub fn nodes(&self) -> Vec<&Expr> {
        let mut out = Vec::new();
        self.collect_nodes(&mut out);
        out
    }

    fn collect_nodes<'a>(&'a self, out: &mut Vec<&'a Expr>) {
        out.push(self);
        for child in self.children() {
            child.collect_nodes(out);
        }
    }

    pub fn node_count(&self) -> usize {
        1 + self
            .children()
            .into_iter()
            .map(|c| c.node_count())
            .sum::<usize>()
    }

    /// names of free variables
    pub fn vars(&self) -> BTreeSet<String> {
        self.nodes()
            .into_iter()
            .filter_map(|n| match n {
                Expr::Var(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    /// names of bound parameters
    pub fn params(&self) -> BTreeSet<String> {
        self.nodes()
            .into_iter()
            .filter_map(|n| match n {
                Expr::Param(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    fn taken_names(&self, others: &[&Expr]) -> BTreeSet<String> {
        let mut taken = self.vars();
        taken.extend(self.params());
        for other in others {
            taken.extend(other.vars());
            taken.extend(other.params());
        }
        taken
    }

    /// Bound parameter named after `base` that occurs neither here nor in `others`.
    pub fn fresh_param(&self, base: &str, others: &[&Expr]) -> Expr {
        Expr::Param(fresh_name(base, &self.taken_names(others)))
    }

    /// Temporary variable named after `base` that occurs neither here nor in `others`.
    pub fn fresh_var(&self, base: &str, others: &[&Expr]) -> Expr {
        Expr::Var(fresh_name(base, &self.taken_names(others)))
    }

    /// true when the tree is built from numbers, constants and numeric functions only
    pub fn is_numeric(&self) -> bool {
        match self {
            Expr::Const(_) | Expr::Pi | Expr::E => true,
            Expr::Add(..)
            | Expr::Sub(..)
            | Expr::Mul(..)
            | Expr::Div(..)
            | Expr::Pow(..)
            | Expr::Log(..)
            | Expr::sin(_)
            | Expr::cos(_)
            | Expr::tg(_)
            | Expr::ctg(_)
            | Expr::sec(_)
            | Expr::cosec(_)
            | Expr::arcsin(_)
            | Expr::arccos(_)
            | Expr::arctg(_)
            | Expr::arcctg(_)
            | Expr::arcsec(_)
            | Expr::arccosec(_)
            | Expr::signum(_)
            | Expr::abs(_)
            | Expr::factorial(_) => self.children().into_iter().all(|c| c.is_numeric()),
            _ => false,
        }
    }
}

/// Macro to create symbolic variables from a comma-separated list
/// Usage: symbols!(x, y, z) -> creates variables x, y, z
#[macro_export]
macro_rules! symbols {
    ($($var:ident),+ $(,)?) => {
        (
            $(
                $crate::symbolic::symbolic_engine::Expr::Var(stringify!($var).to_string())
            ),+
        )
    };
}
