//! Settings of the analytical solver and the explicit context a solve runs in.
//!
//! `SolverSettings` holds every tunable bound (recursion ceiling, expansion size, number of
//! alternate forms, downcasting precision, Newton grid). It can be filled from a settings
//! document:
//!
//! ```text
//! solver
//!     max_depth: 200
//!     allow_newton: true
//!     loglevel: info
//! newton
//!     from: -10, -10
//!     to: 10, 10
//!     step_count: 10, 10
//!     iterations: 30
//! ```
//!
//! `SolveContext` carries the settings, a shared cancellation token and the recursion counters
//! through one solve. Nested solves with other settings use `SolveContext::scoped`.
use crate::Utils::logger::parse_level;
use crate::Utils::task_parser::{SettingsDocument, Value};
use crate::numerical::newton_solver::NewtonSettings;
use crate::solver::errors::{SolveError, SolveResult};
use crate::solver::invert_node::DEFAULT_UNITY_ROOTS;
use log::{LevelFilter, warn};
use num_complex::Complex64;
use std::cell::Cell;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

const SOLVER_KEYS: [&str; 10] = [
    "max_depth",
    "max_expansion_terms",
    "max_alternates",
    "max_unity_roots",
    "allow_newton",
    "downcast_max_denominator",
    "downcast_iterations",
    "downcast_tolerance",
    "zero_tolerance",
    "loglevel",
];

const NEWTON_KEYS: [&str; 5] = ["from", "to", "step_count", "iterations", "tolerance"];

#[derive(Debug, Clone, PartialEq)]
pub struct SolverSettings {
    /// ceiling of nested orchestrator calls
    pub max_depth: usize,
    /// largest number of additive terms the polynomial finder expands to
    pub max_expansion_terms: usize,
    /// number of alternate forms tried by the substitution search
    pub max_alternates: usize,
    /// largest root-of-unity count listed branch by branch; above it the branches form one
    /// family over an integer parameter
    pub max_unity_roots: u32,
    /// enables the Newton fallback
    pub allow_newton: bool,
    pub downcast_max_denominator: i64,
    pub downcast_iterations: usize,
    pub downcast_tolerance: f64,
    /// |f(root)| below this counts as zero
    pub zero_tolerance: f64,
    pub newton: NewtonSettings,
    /// "off" | "none" | "error" | "warn" | "info" | "debug" | "trace"
    pub loglevel: Option<String>,
}

impl Default for SolverSettings {
    fn default() -> Self {
        SolverSettings {
            max_depth: 200,
            max_expansion_terms: 50,
            max_alternates: 4,
            max_unity_roots: DEFAULT_UNITY_ROOTS,
            allow_newton: true,
            downcast_max_denominator: 10000,
            downcast_iterations: 30,
            downcast_tolerance: 1e-9,
            zero_tolerance: 1e-9,
            newton: NewtonSettings::default(),
            loglevel: Some("warn".to_string()),
        }
    }
}

fn complex_pair(doc: &SettingsDocument, key: &str) -> Result<Option<Complex64>, String> {
    let values = match doc.sections.get("newton").and_then(|s| s.get(key)) {
        None => return Ok(None),
        Some(values) => values,
    };
    let parts: Vec<f64> = values.iter().filter_map(Value::as_float).collect();
    match parts.as_slice() {
        [re, im] if values.len() == 2 => Ok(Some(Complex64::new(*re, *im))),
        [re] if values.len() == 1 => Ok(Some(Complex64::new(*re, 0.0))),
        _ => Err(format!("newton.{} must be one or two numbers", key)),
    }
}

impl SolverSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth;
    }

    pub fn set_allow_newton(&mut self, allow_newton: bool) {
        self.allow_newton = allow_newton;
    }

    pub fn set_loglevel(&mut self, loglevel: Option<String>) {
        self.loglevel = loglevel;
    }

    /// log filter of the textual level; unknown names fall back to `Info`
    pub fn log_filter(&self) -> LevelFilter {
        match &self.loglevel {
            None => LevelFilter::Info,
            Some(level) => parse_level(level).unwrap_or_else(|| {
                warn!("unknown loglevel '{}', using info", level);
                LevelFilter::Info
            }),
        }
    }

    /// Reads the `solver` and `newton` sections of a settings document on top of the defaults.
    pub fn from_document(text: &str) -> Result<SolverSettings, String> {
        let doc = SettingsDocument::parse(text)?;
        for (section, known) in [("solver", &SOLVER_KEYS[..]), ("newton", &NEWTON_KEYS[..])] {
            let unknown = doc.unknown_keys(section, known);
            if !unknown.is_empty() {
                return Err(format!("unknown keys in section {}: {:?}", section, unknown));
            }
        }
        let mut s = SolverSettings::default();
        if let Some(v) = doc.get_usize("solver", "max_depth")? {
            s.max_depth = v;
        }
        if let Some(v) = doc.get_usize("solver", "max_expansion_terms")? {
            s.max_expansion_terms = v;
        }
        if let Some(v) = doc.get_usize("solver", "max_alternates")? {
            s.max_alternates = v;
        }
        if let Some(v) = doc.get_usize("solver", "max_unity_roots")? {
            s.max_unity_roots = u32::try_from(v).map_err(|e| e.to_string())?;
        }
        if let Some(v) = doc.get_bool("solver", "allow_newton")? {
            s.allow_newton = v;
        }
        if let Some(v) = doc.get_i64("solver", "downcast_max_denominator")? {
            s.downcast_max_denominator = v;
        }
        if let Some(v) = doc.get_usize("solver", "downcast_iterations")? {
            s.downcast_iterations = v;
        }
        if let Some(v) = doc.get_f64("solver", "downcast_tolerance")? {
            s.downcast_tolerance = v;
        }
        if let Some(v) = doc.get_f64("solver", "zero_tolerance")? {
            s.zero_tolerance = v;
        }
        if let Some(level) = doc.get_string("solver", "loglevel") {
            if parse_level(&level).is_none() {
                return Err(format!(
                    "loglevel must be off, none, error, warn, info, debug or trace, found '{}'",
                    level
                ));
            }
            s.loglevel = Some(level);
        }
        if let Some(v) = complex_pair(&doc, "from")? {
            s.newton.from = v;
        }
        if let Some(v) = complex_pair(&doc, "to")? {
            s.newton.to = v;
        }
        if let Some(values) = doc.sections.get("newton").and_then(|n| n.get("step_count")) {
            let steps: Vec<usize> = values
                .iter()
                .filter_map(|v| v.as_integer().and_then(|i| usize::try_from(i).ok()))
                .collect();
            s.newton.step_count = match steps.as_slice() {
                [n] if values.len() == 1 => (*n, *n),
                [n_re, n_im] if values.len() == 2 => (*n_re, *n_im),
                _ => return Err("newton.step_count must be one or two integers".to_string()),
            };
        }
        if let Some(v) = doc.get_usize("newton", "iterations")? {
            s.newton.iterations = v;
        }
        if let Some(v) = doc.get_f64("newton", "tolerance")? {
            s.newton.tolerance = v;
        }
        Ok(s)
    }
}

/// Cooperative cancellation flag shared between a caller and running solves.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Settings, cancellation token and recursion counters of one solve.
#[derive(Debug)]
pub struct SolveContext {
    settings: SolverSettings,
    token: CancellationToken,
    depth: Cell<usize>,
    max_depth_seen: Cell<usize>,
    calls: Cell<usize>,
}

impl Default for SolveContext {
    fn default() -> Self {
        SolveContext::new(SolverSettings::default())
    }
}

/// Decrements the depth counter when a nested solve returns.
pub struct DepthGuard<'a> {
    ctx: &'a SolveContext,
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.ctx.depth.set(self.ctx.depth.get().saturating_sub(1));
    }
}

impl SolveContext {
    pub fn new(settings: SolverSettings) -> Self {
        SolveContext::with_token(settings, CancellationToken::new())
    }

    pub fn with_token(settings: SolverSettings, token: CancellationToken) -> Self {
        SolveContext {
            settings,
            token,
            depth: Cell::new(0),
            max_depth_seen: Cell::new(0),
            calls: Cell::new(0),
        }
    }

    /// Child context with other settings; it shares the token and starts at the current depth.
    pub fn scoped(&self, settings: SolverSettings) -> SolveContext {
        let child = SolveContext::with_token(settings, self.token.clone());
        child.depth.set(self.depth.get());
        child
    }

    pub fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn check_cancelled(&self) -> SolveResult<()> {
        if self.token.is_cancelled() {
            warn!("solve cancelled");
            return Err(SolveError::Cancelled);
        }
        Ok(())
    }

    /// Enters one nested solve: checks cancellation and the recursion ceiling.
    pub fn enter(&self) -> SolveResult<DepthGuard<'_>> {
        self.check_cancelled()?;
        let depth = self.depth.get() + 1;
        if depth > self.settings.max_depth {
            warn!("recursion limit {} reached", self.settings.max_depth);
            return Err(SolveError::RecursionLimit(self.settings.max_depth));
        }
        self.depth.set(depth);
        self.max_depth_seen.set(self.max_depth_seen.get().max(depth));
        self.calls.set(self.calls.get() + 1);
        Ok(DepthGuard { ctx: self })
    }

    /// number of orchestrator entries so far
    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    /// deepest nesting reached so far
    pub fn max_depth_seen(&self) -> usize {
        self.max_depth_seen.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = SolverSettings::default();
        assert_eq!(s.max_alternates, 4);
        assert_eq!(s.downcast_max_denominator, 10000);
        assert_eq!(s.newton.iterations, 30);
        assert_eq!(s.log_filter(), LevelFilter::Warn);
    }

    #[test]
    fn test_from_document() {
        let text = "
        solver
            max_depth: 50
            allow_newton: false
            zero_tolerance: 1e-7
            loglevel: debug
        newton
            from: -5, -2
            to: 5, 2
            step_count: 4
            iterations: 12
        ";
        let s = SolverSettings::from_document(text).unwrap();
        assert_eq!(s.max_depth, 50);
        assert!(!s.allow_newton);
        assert_eq!(s.zero_tolerance, 1e-7);
        assert_eq!(s.log_filter(), LevelFilter::Debug);
        assert_eq!(s.newton.from, Complex64::new(-5.0, -2.0));
        assert_eq!(s.newton.to, Complex64::new(5.0, 2.0));
        assert_eq!(s.newton.step_count, (4, 4));
        assert_eq!(s.newton.iterations, 12);
        assert_eq!(s.max_alternates, 4);
    }

    #[test]
    fn test_from_document_errors() {
        assert!(SolverSettings::from_document("solver max_depth: -1").is_err());
        assert!(SolverSettings::from_document("solver loglevel: loud").is_err());
        assert!(SolverSettings::from_document("solver speed: 3").is_err());
        assert!(SolverSettings::from_document("newton from: 1, 2, 3").is_err());
    }

    #[test]
    fn test_depth_guard_and_limit() {
        let mut settings = SolverSettings::default();
        settings.set_max_depth(2);
        let ctx = SolveContext::new(settings);
        {
            let _a = ctx.enter().unwrap();
            let _b = ctx.enter().unwrap();
            assert_eq!(ctx.enter().err(), Some(SolveError::RecursionLimit(2)));
        }
        assert!(ctx.enter().is_ok());
        assert_eq!(ctx.max_depth_seen(), 2);
        assert_eq!(ctx.calls(), 3);
    }

    #[test]
    fn test_cancellation_is_shared_with_scoped_context() {
        let ctx = SolveContext::default();
        let child = ctx.scoped(SolverSettings {
            zero_tolerance: 1e-3,
            ..SolverSettings::default()
        });
        assert_eq!(child.settings().zero_tolerance, 1e-3);
        assert_eq!(ctx.settings().zero_tolerance, 1e-9);
        ctx.token().cancel();
        assert_eq!(child.enter().err(), Some(SolveError::Cancelled));
    }
}
