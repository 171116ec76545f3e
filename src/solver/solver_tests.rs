use crate::solver::analytical_solver::{ReductionStrategy, solve};
use crate::solver::errors::SolveError;
use crate::solver::solve_settings::{CancellationToken, SolveContext, SolverSettings};
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_sets::Set;
//___________________________________TESTS____________________________________

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use num_complex::Complex64;
    use std::f64::consts::PI;
    use strum::IntoEnumIterator;

    fn x() -> Expr {
        Expr::var("x")
    }

    fn parse(text: &str) -> Expr {
        Expr::parse_expression(text).unwrap()
    }

    /// every root turns the expression (with parameters at zero) into zero
    fn assert_roots_vanish(expr: &Expr, roots: &Set, tolerance: f64) {
        for root in roots.elements().unwrap() {
            let params: Vec<(String, Complex64)> = root
                .params()
                .into_iter()
                .map(|p| (p, Complex64::new(0.0, 0.0)))
                .collect();
            let bindings: Vec<(&str, Complex64)> =
                params.iter().map(|(p, v)| (p.as_str(), *v)).collect();
            let value = expr
                .substitute(&x(), root)
                .eval_complex_with(&bindings)
                .unwrap();
            assert!(
                value.norm() < tolerance,
                "{} at {} gives {}",
                expr,
                root,
                value
            );
        }
    }

    fn real_values(roots: &Set) -> Vec<f64> {
        let mut values: Vec<f64> = roots
            .elements()
            .unwrap()
            .iter()
            .map(|r| r.eval_complex().unwrap().re)
            .collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap());
        values
    }

    #[test]
    fn test_square_difference() {
        let roots = (x().pow(Expr::int(2)) - Expr::int(1)).solve("x").unwrap();
        assert_eq!(roots.len(), Some(2));
        assert!(roots.elements().unwrap().contains(&Expr::int(1)));
        assert!(roots.elements().unwrap().contains(&Expr::int(-1)));
    }

    #[test]
    fn test_cube_roots_of_one() {
        let f = x().pow(Expr::int(3)) - Expr::int(1);
        let roots = f.solve("x").unwrap();
        assert_eq!(roots.len(), Some(3));
        assert!(roots.elements().unwrap().contains(&Expr::int(1)));
        assert_roots_vanish(&f, &roots, 1e-9);
    }

    #[test]
    fn test_imaginary_roots() {
        let roots = (x().pow(Expr::int(2)) + Expr::int(1)).solve("x").unwrap();
        assert_eq!(roots.len(), Some(2));
        assert_eq!(roots.contains(&Expr::i()), Some(true));
        assert_eq!(roots.contains(&(-Expr::i())), Some(true));
    }

    #[test]
    fn test_exponential_through_substitution() {
        let roots = parse("2^x - 8").solve("x").unwrap();
        assert_eq!(roots, Set::singleton(Expr::int(3)));
    }

    #[test]
    fn test_exponential_with_two_bases() {
        let f = parse("4^x - 3*2^x + 2");
        let roots = f.solve("x").unwrap();
        let values = real_values(&roots);
        assert_eq!(values.len(), 2);
        assert_relative_eq!(values[0], 0.0, epsilon = 1e-9);
        assert_relative_eq!(values[1], 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_periodic_sine() {
        let f = parse("sin(x) - 1");
        let roots = f.solve("x").unwrap();
        let elements = roots.elements().unwrap();
        assert!(!elements.is_empty());
        for root in elements {
            assert_eq!(root.params().len(), 1);
            let at_zero = root
                .eval_complex_with(&[("n", Complex64::new(0.0, 0.0))])
                .unwrap();
            assert_relative_eq!(at_zero.re, PI / 2.0, epsilon = 1e-9);
            let at_one = root
                .eval_complex_with(&[("n", Complex64::new(1.0, 0.0))])
                .unwrap();
            assert_relative_eq!(at_one.re, PI / 2.0 + 2.0 * PI, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_trigonometric_reduction() {
        let f = parse("sin(x) + cos(x) - 1");
        let roots = f.solve("x").unwrap();
        assert!(!roots.is_empty());
        assert_roots_vanish(&f, &roots, 1e-9);
        for root in roots.elements().unwrap() {
            assert_eq!(root.params().len(), 1, "{} is not a periodic family", root);
        }
    }

    #[test]
    fn test_logarithm_of_negative_unit_folds() {
        let roots = parse("exp(x) + 1").solve("x").unwrap();
        let [root] = roots.elements().unwrap() else {
            panic!("one root expected, got {}", roots);
        };
        assert!(!root.nodes().iter().any(|n| matches!(n, Expr::Log(..))), "{}", root);
        let z = root.eval_complex().unwrap();
        assert_relative_eq!(z.re, 0.0, epsilon = 1e-12);
        assert_relative_eq!(z.im, PI, epsilon = 1e-12);
    }

    #[test]
    fn test_high_degree_binomial_is_complete() {
        let f = parse("x^100 - 1");
        let roots = f.solve("x").unwrap();
        assert_eq!(roots.len(), Some(100));
        assert_roots_vanish(&f, &roots, 1e-8);
    }

    #[test]
    fn test_tiny_leading_coefficient_keeps_degree() {
        let f = parse("x^2/10000000000000 + x - 1");
        let roots = f.solve("x").unwrap();
        assert_eq!(roots.len(), Some(2));
        let values = real_values(&roots);
        assert_relative_eq!(values[0], -1e13, max_relative = 1e-9);
    }

    #[test]
    fn test_quotient_drops_pole() {
        let roots = parse("(x - 1)/(x + 1)").solve("x").unwrap();
        assert_eq!(roots, Set::singleton(Expr::int(1)));
        // x^2 - 1 over x - 1 keeps only -1
        let roots = parse("(x^2 - 1)/(x - 1)").solve("x").unwrap();
        assert_eq!(roots, Set::singleton(Expr::int(-1)));
    }

    #[test]
    fn test_common_denominator_reduction() {
        let f = parse("1/x + 1/(x + 1) - 1");
        let roots = f.solve("x").unwrap();
        let values = real_values(&roots);
        let sqrt5 = 5f64.sqrt();
        assert_eq!(values.len(), 2);
        assert_relative_eq!(values[0], (1.0 - sqrt5) / 2.0, epsilon = 1e-9);
        assert_relative_eq!(values[1], (1.0 + sqrt5) / 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_radical_drops_extraneous_root() {
        let roots = parse("x + sqrt(x + 1) - 5").solve("x").unwrap();
        assert_eq!(roots, Set::singleton(Expr::int(3)));
    }

    #[test]
    fn test_roots_satisfy_equation() {
        for text in [
            "x^2 - 5*x + 6",
            "x^3 - 7*x + 6",
            "x^4 - 5*x^2 + 4",
            "2^(x + 1) - 16",
            "ln(x) - 2",
            "(x - 2)*(x + 3)*(x - 7)",
            "x^6 - 64",
        ] {
            let f = parse(text);
            let roots = f.solve("x").unwrap();
            assert!(!roots.is_empty(), "no roots for {}", text);
            assert_roots_vanish(&f, &roots, 1e-8);
        }
    }

    #[test]
    fn test_shifted_variable_is_idempotent() {
        let ctx = SolveContext::default();
        for r in [Expr::int(5), Expr::rational(-2, 3)] {
            let roots = solve(&(x() - r.clone()), &x(), false, &ctx).unwrap();
            assert_eq!(roots, Set::singleton(r));
        }
        let shifted = Expr::var("a") + Expr::int(1);
        let roots = solve(&(x() - shifted), &x(), false, &ctx).unwrap();
        let [root] = roots.elements().unwrap() else {
            panic!("one root expected, got {}", roots);
        };
        let v = root
            .eval_complex_with(&[("a", Complex64::new(2.0, 0.0))])
            .unwrap();
        assert_relative_eq!(v.re, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_variable_free_expression() {
        assert!(parse("y + 2").solve("x").unwrap().is_empty());
        assert_eq!(x().solve("x").unwrap(), Set::singleton(Expr::int(0)));
    }

    #[test]
    fn test_unsolvable_mix_terminates() {
        let mut settings = SolverSettings::default();
        settings.set_allow_newton(false);
        let ctx = SolveContext::new(settings);
        let f = parse("x^x + sin(x)*exp(x) - 2");
        // finishes without hitting the recursion limit
        assert!(f.solve_with("x", &ctx).is_ok());
        assert!(ctx.calls() > 0);
    }

    #[test]
    fn test_calls_stay_proportional_to_size() {
        const CALLS_PER_NODE: usize = 50;
        for text in [
            "x^2 - 5*x + 6",
            "x^3 - 7*x + 6",
            "sin(x) + cos(x) - 1",
            "sin(x) - 1",
            "2^x - 8",
            "4^x - 3*2^x + 2",
            "x + sqrt(x + 1) - 5",
            "(x - 1)/(x + 1)",
            "1/x + 1/(x + 1) - 1",
        ] {
            let f = parse(text);
            let ctx = SolveContext::default();
            f.solve_with("x", &ctx).unwrap();
            let nodes = f.node_count();
            assert!(
                ctx.calls() <= CALLS_PER_NODE * nodes,
                "{} took {} calls for {} nodes",
                text,
                ctx.calls(),
                nodes
            );
        }
    }

    #[test]
    fn test_recursion_limit() {
        let mut settings = SolverSettings::default();
        settings.set_max_depth(1);
        let ctx = SolveContext::new(settings);
        let result = parse("2^x - 8").solve_with("x", &ctx);
        assert_eq!(result, Err(SolveError::RecursionLimit(1)));
    }

    #[test]
    fn test_cancelled_before_start() {
        let token = CancellationToken::new();
        token.cancel();
        let ctx = SolveContext::with_token(SolverSettings::default(), token);
        let result = parse("x^2 - 1").solve_with("x", &ctx);
        assert_eq!(result, Err(SolveError::Cancelled));
    }

    #[test]
    fn test_scoped_settings() {
        let f = parse("x^5 + x + 1");
        let parent = SolveContext::default();
        let mut quiet = SolverSettings::default();
        quiet.set_allow_newton(false);
        let child = parent.scoped(quiet);
        assert!(!child.settings().allow_newton);
        assert!(parent.settings().allow_newton);
        assert!(f.solve_with("x", &child).unwrap().is_empty());
        // the child shares the parent's token
        parent.token().cancel();
        assert_eq!(f.solve_with("x", &child), Err(SolveError::Cancelled));
    }

    #[test]
    fn test_newton_fallback() {
        let f = parse("x^5 + x + 1");
        let roots = f.solve("x").unwrap();
        let elements = roots.elements().unwrap();
        assert!(!elements.is_empty());
        assert!(elements.len() <= 5);
        assert_roots_vanish(&f, &roots, 1e-6);
    }

    #[test]
    fn test_strategy_order() {
        let order: Vec<ReductionStrategy> = ReductionStrategy::iter().collect();
        assert_eq!(
            order,
            vec![
                ReductionStrategy::Trigonometric,
                ReductionStrategy::ExponentialMultiplicative,
                ReductionStrategy::ExponentialLinear,
                ReductionStrategy::CommonDenominator,
                ReductionStrategy::FractionalPolynomial,
            ]
        );
        let verified: Vec<ReductionStrategy> = ReductionStrategy::iter()
            .filter(|s| s.verifies_roots())
            .collect();
        assert_eq!(
            verified,
            vec![
                ReductionStrategy::ExponentialMultiplicative,
                ReductionStrategy::FractionalPolynomial
            ]
        );
    }

    #[test]
    fn test_statement_through_parser() {
        let set = parse("x^2 = 9").solve_statement("x").unwrap();
        assert_eq!(set.len(), Some(2));
        let set = parse("x^2 - 4 > 0").solve_statement("x").unwrap();
        assert_eq!(set.contains(&Expr::int(3)), Some(true));
        assert_eq!(set.contains(&Expr::int(0)), Some(false));
    }

    #[test]
    fn test_symbolic_parameter_quadratic() {
        // x^2 - a^2 has the roots a and -a
        let a = Expr::var("a");
        let f = x().pow(Expr::int(2)) - a.clone().pow(Expr::int(2));
        let roots = f.solve("x").unwrap();
        assert_eq!(roots.len(), Some(2));
        for root in roots.elements().unwrap() {
            let v = root
                .eval_complex_with(&[("a", Complex64::new(3.0, 0.0))])
                .unwrap();
            assert_relative_eq!(v.re.abs(), 3.0, epsilon = 1e-9);
        }
    }
}
