use crate::symbolic::numbers::Number;
use crate::symbolic::symbolic_engine::Expr;
use crate::symbols;
use num::{BigInt, BigRational};
//___________________________________TESTS____________________________________

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use num_complex::Complex64;

    #[test]
    fn test_operators_build_raw_nodes() {
        let (x, y) = symbols!(x, y);
        let expr = x.clone() + y.clone();
        assert_eq!(expr, Expr::Add(x.clone().boxed(), y.clone().boxed()));
        let neg = -x.clone();
        assert_eq!(neg, Expr::Mul(Expr::int(-1).boxed(), x.boxed()));
    }

    #[test]
    fn test_display() {
        let x = Expr::var("x");
        assert_eq!(format!("{}", x.clone() + Expr::int(2)), "(x + 2)");
        assert_eq!(format!("{}", x.clone().ln()), "ln(x)");
        assert_eq!(format!("{}", Expr::rational(1, 2)), "1/2");
        assert_eq!(format!("{}", Expr::i()), "i");
    }

    #[test]
    fn test_tree_queries() {
        let (x, y) = symbols!(x, y);
        let expr = Expr::sin(x.clone().boxed()) * x.clone() + y.clone();
        assert!(expr.contains_node(&x));
        assert_eq!(expr.count_occurrences(&x), 2);
        assert_eq!(expr.vars().len(), 2);
        assert!(expr.params().is_empty());
        let replaced = expr.substitute(&x, &Expr::int(0));
        assert!(!replaced.contains_variable("x"));
        assert_eq!(replaced.simplify(), y);
    }

    #[test]
    fn test_fresh_names_avoid_collisions() {
        let (t, x) = symbols!(t, x);
        let expr = t.clone() + x.clone();
        let fresh = expr.fresh_var("t", &[]);
        assert_ne!(fresh, t);
        assert!(!expr.contains_node(&fresh));
        let param = expr.fresh_param("n", &[&fresh]);
        assert_eq!(param, Expr::Param("n".to_string()));
    }

    #[test]
    fn test_exact_arithmetic() {
        let sum = (Expr::rational(1, 3) + Expr::rational(1, 6)).simplify();
        assert_eq!(sum, Expr::rational(1, 2));
        let product = (Expr::i() * Expr::i()).simplify();
        assert_eq!(product, Expr::int(-1));
        let root = Expr::int(8).pow(Expr::rational(1, 3)).simplify();
        assert_eq!(root, Expr::int(2));
        let log = Expr::int(8).log(Expr::int(2)).simplify();
        assert_eq!(log, Expr::int(3));
    }

    #[test]
    fn test_cancellation_to_zero() {
        let x = Expr::var("x");
        assert!((x.clone() - x.clone()).simplify().is_zero());
        assert!((x.clone() * Expr::int(0)).simplify().is_zero());
        assert!((x.clone().pow(Expr::int(0))).simplify().is_one());
    }

    #[test]
    fn test_trigonometric_table() {
        let sixth = Expr::Mul(Expr::rational(1, 6).boxed(), Expr::Pi.boxed());
        assert_eq!(Expr::sin(sixth.boxed()).simplify(), Expr::rational(1, 2));
        assert_eq!(Expr::cos(Expr::Pi.boxed()).simplify(), Expr::int(-1));
        assert_eq!(
            Expr::arcsin(Expr::int(1).boxed()).simplify(),
            Expr::Mul(Expr::rational(1, 2).boxed(), Expr::Pi.boxed())
        );
    }

    #[test]
    fn test_logarithm_of_units() {
        assert!(Expr::int(1).ln().simplify().is_zero());
        assert_eq!(
            Expr::int(-1).ln().simplify(),
            Expr::Mul(Expr::i().boxed(), Expr::Pi.boxed())
        );
        let half_i = Expr::Const(Number::complex(
            BigRational::new(BigInt::from(0), BigInt::from(1)),
            BigRational::new(BigInt::from(1), BigInt::from(2)),
        ));
        assert_eq!(
            Expr::i().ln().simplify(),
            Expr::Mul(half_i.boxed(), Expr::Pi.boxed())
        );
        let quarter_turn = (Expr::int(-1) * Expr::i() * Expr::i().ln()).simplify();
        assert!(!quarter_turn.nodes().iter().any(|n| matches!(n, Expr::Log(..))));
        assert_relative_eq!(
            quarter_turn.eval_complex().unwrap().re,
            std::f64::consts::FRAC_PI_2,
            epsilon = 1e-12
        );
        let minus_i = (Expr::int(-1) * Expr::i()).simplify().ln().simplify();
        assert_relative_eq!(
            minus_i.eval_complex().unwrap().im,
            -std::f64::consts::FRAC_PI_2,
            epsilon = 1e-12
        );
        // other arguments stay symbolic
        assert!(matches!(Expr::int(-2).ln().simplify(), Expr::Log(..)));
    }

    #[test]
    fn test_logic_folding() {
        let t = Expr::Bool(true);
        let f = Expr::Bool(false);
        assert_eq!(Expr::And(t.clone().boxed(), f.clone().boxed()).simplify(), f);
        assert_eq!(Expr::Or(t.clone().boxed(), f.clone().boxed()).simplify(), t);
        assert_eq!(
            Expr::Greater(Expr::int(3).boxed(), Expr::int(2).boxed()).simplify(),
            Expr::Bool(true)
        );
    }

    #[test]
    fn test_expand_matches_product() {
        let x = Expr::var("x");
        let product = (x.clone() + Expr::int(1)) * (x.clone() - Expr::int(2));
        let expanded = product.expand().simplify();
        for v in [-1.5, 0.0, 3.0] {
            let at = [("x", Complex64::new(v, 0.0))];
            assert_relative_eq!(
                expanded.eval_complex_with(&at).unwrap().re,
                (v + 1.0) * (v - 2.0),
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_undefined_values() {
        assert!(!(Expr::int(1) / Expr::int(0)).is_defined());
        assert!(!Expr::int(0).ln().is_defined());
        assert!(Expr::var("x").ln().is_defined());
        let guarded = Expr::int(1).provided(Expr::Bool(false));
        assert!(!guarded.is_defined());
    }

    #[test]
    fn test_number_rationalize() {
        let third = Number::rationalize(1.0 / 3.0, 10000, 30, 1e-12).unwrap();
        assert_eq!(third, BigRational::new(BigInt::from(1), BigInt::from(3)));
        assert!(Number::rationalize(std::f64::consts::PI, 100, 30, 1e-12).is_none());
        assert!(Number::rationalize(f64::NAN, 100, 30, 1e-12).is_none());
    }

    #[test]
    fn test_number_downcast() {
        let z = Number::downcast(Complex64::new(0.5, -0.25), 10000, 30, 1e-12).unwrap();
        assert_eq!(
            z,
            Number::complex(
                BigRational::new(BigInt::from(1), BigInt::from(2)),
                BigRational::new(BigInt::from(-1), BigInt::from(4)),
            )
        );
        let real = Number::downcast(Complex64::new(2.0, 1e-15), 10000, 30, 1e-12).unwrap();
        assert!(real.is_real());
    }

    #[test]
    fn test_number_roots_and_powers() {
        assert_eq!(Number::int(27).exact_root(3), Some(Number::int(3)));
        assert_eq!(Number::int(-8).exact_root(3), Some(Number::int(-2)));
        assert_eq!(Number::int(-4).exact_root(2), None);
        assert_eq!(Number::int(2).exact_root(2), None);
        assert_eq!(
            Number::extract_root(&BigInt::from(72), 2),
            (BigInt::from(6), BigInt::from(2))
        );
        assert_eq!(
            Number::int(2).pow_int(&BigInt::from(-2)),
            Some(Number::rational(1, 4))
        );
        assert_eq!(Number::int(0).pow_int(&BigInt::from(-1)), None);
        assert_eq!(Number::int(1).checked_div(&Number::int(0)), None);
    }

    #[test]
    fn test_mixed_precision_is_approximate() {
        let exact = Number::int(1);
        let approx = Number::approx(Complex64::new(0.5, 0.0));
        let sum = &exact + &approx;
        assert!(!sum.is_exact());
        assert_relative_eq!(sum.to_complex64().re, 1.5);
    }
}
