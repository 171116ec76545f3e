#![allow(non_snake_case)]
use RustedSymSolve::Utils::logger::{default_log_file_name, init_logger};
use RustedSymSolve::solver::solve_settings::{SolveContext, SolverSettings};
use RustedSymSolve::symbolic::symbolic_engine::Expr;
use std::env;
use std::fs;
use std::process::ExitCode;

/// usage: RustedSymSolve [expression] [variable] [settings file]
/// without arguments a few demo equations are solved
fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    let settings = match args.get(2) {
        Some(path) => match fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|text| SolverSettings::from_document(&text))
        {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("cannot read settings from {}: {}", path, e);
                return ExitCode::FAILURE;
            }
        },
        None => SolverSettings::default(),
    };
    init_logger(settings.log_filter(), Some(&default_log_file_name()));
    let ctx = SolveContext::new(settings);
    let var = args.get(1).map(String::as_str).unwrap_or("x");

    let inputs: Vec<String> = match args.first() {
        Some(input) => vec![input.clone()],
        None => {
            let example = 0;
            match example {
                0 => vec![
                    // polynomial with exact roots
                    "x^3 - 7*x + 6",
                    // exponential, reduced to a quadratic in 2^x
                    "4^x - 3*2^x + 2",
                    // trigonometric, periodic solution with a parameter
                    "sin(x) - 1/2",
                    // radical, the extraneous root of the squared equation is dropped
                    "x + sqrt(x + 1) - 5",
                    // statement: inequality
                    "x^2 - 4 > 0",
                ],
                _ => vec!["x^5 + x + 1"],
            }
            .into_iter()
            .map(String::from)
            .collect()
        }
    };

    for input in inputs {
        let expr = match Expr::parse_expression(&input) {
            Ok(expr) => expr,
            Err(e) => {
                eprintln!("cannot parse {}: {}", input, e);
                return ExitCode::FAILURE;
            }
        };
        let relational = matches!(
            expr,
            Expr::Equals(..)
                | Expr::Greater(..)
                | Expr::GreaterOrEqual(..)
                | Expr::Less(..)
                | Expr::LessOrEqual(..)
        );
        let solution = if relational {
            expr.solve_statement_with(var, &ctx)
        } else {
            expr.solve_with(var, &ctx)
        };
        match solution {
            Ok(set) => println!("{}  =>  {} = {}", input, var, set),
            Err(e) => {
                eprintln!("{}: {}", input, e);
                return ExitCode::FAILURE;
            }
        }
    }
    ExitCode::SUCCESS
}
