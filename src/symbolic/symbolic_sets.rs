//! # Sets
//!
//! Result container of the solver. Finite sets fold duplicates by structural equality, the
//! other variants stay symbolic unless membership can be decided, in which case the smart
//! constructors (`union`, `intersection`, `minus`) reduce them to finite sets.
//!
//! Membership is three-valued: `Some(true)`, `Some(false)` or `None` when it cannot be decided
//! (symbolic elements, conditional sets with undecidable predicates).
use crate::symbolic::symbolic_engine::Expr;
use num_complex::Complex64;
use std::fmt;
use strum_macros::{Display, EnumIter};

/// closeness of two numerically evaluated elements
const MEMBERSHIP_TOLERANCE: f64 = 1e-12;

/// Named number sets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, Display)]
pub enum SpecialSet {
    Booleans,
    Integers,
    Rationals,
    Reals,
    Complexes,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Set {
    /// explicit elements, no two structurally equal
    Finite(Vec<Expr>),
    Interval {
        left: Expr,
        right: Expr,
        left_closed: bool,
        right_closed: bool,
    },
    Special(SpecialSet),
    Union(Box<Set>, Box<Set>),
    Intersection(Box<Set>, Box<Set>),
    /// elements of the first set that are not in the second
    Minus(Box<Set>, Box<Set>),
    /// { var | predicate }
    Conditional { var: String, predicate: Box<Expr> },
}

fn close(a: Complex64, b: Complex64) -> bool {
    (a - b).norm() <= MEMBERSHIP_TOLERANCE * a.norm().max(b.norm()).max(1.0)
}

fn and3(a: Option<bool>, b: Option<bool>) -> Option<bool> {
    match (a, b) {
        (Some(false), _) | (_, Some(false)) => Some(false),
        (Some(true), Some(true)) => Some(true),
        _ => None,
    }
}

fn or3(a: Option<bool>, b: Option<bool>) -> Option<bool> {
    match (a, b) {
        (Some(true), _) | (_, Some(true)) => Some(true),
        (Some(false), Some(false)) => Some(false),
        _ => None,
    }
}

impl Set {
    pub fn empty() -> Set {
        Set::Finite(Vec::new())
    }

    /// finite set, structural duplicates removed, order of first appearance kept
    pub fn finite(elements: Vec<Expr>) -> Set {
        let mut unique: Vec<Expr> = Vec::with_capacity(elements.len());
        for e in elements {
            if !unique.contains(&e) {
                unique.push(e);
            }
        }
        Set::Finite(unique)
    }

    pub fn singleton(element: Expr) -> Set {
        Set::Finite(vec![element])
    }

    pub fn interval(left: Expr, right: Expr, left_closed: bool, right_closed: bool) -> Set {
        Set::Interval {
            left,
            right,
            left_closed,
            right_closed,
        }
    }

    pub fn conditional(var: &str, predicate: Expr) -> Set {
        Set::Conditional {
            var: var.to_string(),
            predicate: predicate.boxed(),
        }
    }

    pub fn boxed(self) -> Box<Set> {
        Box::new(self)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Set::Finite(elements) if elements.is_empty())
    }

    pub fn elements(&self) -> Option<&[Expr]> {
        match self {
            Set::Finite(elements) => Some(elements),
            _ => None,
        }
    }

    pub fn len(&self) -> Option<usize> {
        self.elements().map(|e| e.len())
    }

    /// expressions stored directly in the set
    pub fn exprs(&self) -> Vec<&Expr> {
        match self {
            Set::Finite(elements) => elements.iter().collect(),
            Set::Interval { left, right, .. } => vec![left, right],
            Set::Special(_) => vec![],
            Set::Union(a, b) | Set::Intersection(a, b) | Set::Minus(a, b) => {
                let mut out = a.exprs();
                out.extend(b.exprs());
                out
            }
            Set::Conditional { predicate, .. } => vec![predicate],
        }
    }

    pub fn map_exprs(&self, f: &mut dyn FnMut(&Expr) -> Expr) -> Set {
        match self {
            Set::Finite(elements) => Set::finite(elements.iter().map(|e| f(e)).collect()),
            Set::Interval {
                left,
                right,
                left_closed,
                right_closed,
            } => Set::Interval {
                left: f(left),
                right: f(right),
                left_closed: *left_closed,
                right_closed: *right_closed,
            },
            Set::Special(s) => Set::Special(*s),
            Set::Union(a, b) => Set::Union(a.map_exprs(f).boxed(), b.map_exprs(f).boxed()),
            Set::Intersection(a, b) => {
                Set::Intersection(a.map_exprs(f).boxed(), b.map_exprs(f).boxed())
            }
            Set::Minus(a, b) => Set::Minus(a.map_exprs(f).boxed(), b.map_exprs(f).boxed()),
            Set::Conditional { var, predicate } => Set::Conditional {
                var: var.clone(),
                predicate: f(predicate).boxed(),
            },
        }
    }

    /// union of all the sets of an iterator
    pub fn unite_all<I: IntoIterator<Item = Set>>(sets: I) -> Set {
        sets.into_iter().fold(Set::empty(), |acc, s| acc.union(s))
    }

    pub fn union(self, other: Set) -> Set {
        match (self, other) {
            (a, b) if a.is_empty() => b,
            (a, b) if b.is_empty() => a,
            (Set::Finite(mut a), Set::Finite(b)) => {
                a.extend(b);
                Set::finite(a)
            }
            (a, b) if a == b => a,
            (a, b) => Set::Union(a.boxed(), b.boxed()),
        }
    }

    pub fn intersection(self, other: Set) -> Set {
        if self.is_empty() || other.is_empty() {
            return Set::empty();
        }
        if self == other {
            return self;
        }
        match (self, other) {
            (Set::Finite(a), b) => Set::filter_finite(a, &b, true, Set::Intersection),
            (a, Set::Finite(b)) => Set::filter_finite(b, &a, true, Set::Intersection),
            (a, b) => Set::Intersection(a.boxed(), b.boxed()),
        }
    }

    pub fn minus(self, other: Set) -> Set {
        if self.is_empty() {
            return Set::empty();
        }
        if other.is_empty() {
            return self;
        }
        if self == other {
            return Set::empty();
        }
        match self {
            Set::Finite(a) => Set::filter_finite(a, &other, false, Set::Minus),
            a => Set::Minus(a.boxed(), other.boxed()),
        }
    }

    /// keeps the elements whose membership in `other` equals `keep_members`; elements with an
    /// undecidable membership stay under the symbolic node built by `rebuild`
    fn filter_finite(
        elements: Vec<Expr>,
        other: &Set,
        keep_members: bool,
        rebuild: fn(Box<Set>, Box<Set>) -> Set,
    ) -> Set {
        let mut known = Vec::new();
        let mut unknown = Vec::new();
        for e in elements {
            match other.contains(&e) {
                Some(member) if member == keep_members => known.push(e),
                Some(_) => {}
                None => unknown.push(e),
            }
        }
        let known = Set::finite(known);
        if unknown.is_empty() {
            known
        } else {
            known.union(rebuild(Set::finite(unknown).boxed(), other.clone().boxed()))
        }
    }

    /// three-valued membership test
    pub fn contains(&self, e: &Expr) -> Option<bool> {
        match self {
            Set::Finite(elements) => {
                if elements.contains(e) {
                    return Some(true);
                }
                let value = e.eval_complex()?;
                let mut decided = true;
                for element in elements {
                    match element.eval_complex() {
                        Some(v) if close(v, value) => return Some(true),
                        Some(_) => {}
                        None => decided = false,
                    }
                }
                if decided { Some(false) } else { None }
            }
            Set::Interval {
                left,
                right,
                left_closed,
                right_closed,
            } => {
                let value = e.eval_complex()?;
                if value.im.abs() > MEMBERSHIP_TOLERANCE {
                    return Some(false);
                }
                let l = left.eval_complex()?.re;
                let r = right.eval_complex()?.re;
                let above = if *left_closed { value.re >= l } else { value.re > l };
                let below = if *right_closed { value.re <= r } else { value.re < r };
                Some(above && below)
            }
            Set::Special(kind) => match kind {
                SpecialSet::Booleans => Some(matches!(e, Expr::Bool(_))),
                SpecialSet::Complexes => e.eval_complex().map(|_| true),
                SpecialSet::Reals => e
                    .eval_complex()
                    .map(|v| v.im.abs() <= MEMBERSHIP_TOLERANCE * v.re.abs().max(1.0)),
                SpecialSet::Integers => match e {
                    Expr::Const(n) if n.is_exact() => Some(n.is_integer()),
                    _ => None,
                },
                SpecialSet::Rationals => match e {
                    Expr::Const(n) if n.is_exact() => Some(n.as_rational().is_some()),
                    _ => None,
                },
            },
            Set::Union(a, b) => or3(a.contains(e), b.contains(e)),
            Set::Intersection(a, b) => and3(a.contains(e), b.contains(e)),
            Set::Minus(a, b) => and3(a.contains(e), b.contains(e).map(|m| !m)),
            Set::Conditional { var, predicate } => {
                match predicate.substitute_variable(var, e).simplify() {
                    Expr::Bool(b) => Some(b),
                    _ => None,
                }
            }
        }
    }

    /// simplifies every stored expression and re-applies the set algebra
    pub fn simplify(&self) -> Set {
        match self {
            Set::Finite(elements) => Set::finite(elements.iter().map(|e| e.simplify()).collect()),
            Set::Union(a, b) => a.simplify().union(b.simplify()),
            Set::Intersection(a, b) => a.simplify().intersection(b.simplify()),
            Set::Minus(a, b) => a.simplify().minus(b.simplify()),
            other => other.map_exprs(&mut |e| e.simplify()),
        }
    }
}

impl fmt::Display for Set {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Set::Finite(elements) => {
                write!(f, "{{")?;
                for (i, e) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", e)?;
                }
                write!(f, "}}")
            }
            Set::Interval {
                left,
                right,
                left_closed,
                right_closed,
            } => write!(
                f,
                "{}{}; {}{}",
                if *left_closed { "[" } else { "(" },
                left,
                right,
                if *right_closed { "]" } else { ")" }
            ),
            Set::Special(s) => write!(f, "{}", s),
            Set::Union(a, b) => write!(f, "({} ∪ {})", a, b),
            Set::Intersection(a, b) => write!(f, "({} ∩ {})", a, b),
            Set::Minus(a, b) => write!(f, "({} \\ {})", a, b),
            Set::Conditional { var, predicate } => write!(f, "{{ {} | {} }}", var, predicate),
        }
    }
}
