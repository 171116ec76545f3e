/// a module turns a String expression into a symbolic expression
///# Example
/// ```
/// use RustedSymSolve::symbolic::symbolic_engine::Expr;
/// let input = "x^2 - 1 = 0";
/// let parsed_expression = Expr::parse_expression(input).unwrap();
/// println!(" parsed_expression {}", parsed_expression);
/// ```
//                  precedence ladder
//                relation   a = b, a > b, a >= b ...
//                sum        a + b - c
//                product    a * b / c
//                unary      -a
//                power      a ^ b    (right associative, exponent may be negated)
//                atom       number | call(args) | identifier | (relation)
use crate::symbolic::numbers::Number;
use crate::symbolic::symbolic_engine::Expr;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, digit1, multispace0, one_of},
    combinator::{map, map_res, opt, recognize},
    multi::{many0, separated_list1},
    sequence::{delimited, pair, preceded},
};
use num::{BigInt, BigRational, One};

/// skips whitespace around a parser
fn ws<'a, O, P>(inner: P) -> impl Parser<&'a str, Output = O, Error = nom::error::Error<&'a str>>
where
    P: Parser<&'a str, Output = O, Error = nom::error::Error<&'a str>>,
{
    delimited(multispace0, inner, multispace0)
}

/// exact value of a decimal literal: "12" -> 12, "0.25" -> 1/4
fn decimal_to_number(text: &str) -> Result<Expr, String> {
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, f),
        None => (text, ""),
    };
    let digits = format!("{}{}", int_part, frac_part);
    let numer = BigInt::parse_bytes(digits.as_bytes(), 10)
        .ok_or_else(|| format!("invalid number literal '{}'", text))?;
    let mut denom = BigInt::one();
    for _ in 0..frac_part.len() {
        denom *= 10;
    }
    Ok(Expr::Const(Number::from_rational(BigRational::new(numer, denom))))
}

fn parse_number(input: &str) -> IResult<&str, Expr> {
    let literal = recognize(pair(digit1, opt(pair(char('.'), digit1))));
    map_res(literal, decimal_to_number).parse(input)
}

fn parse_identifier(input: &str) -> IResult<&str, String> {
    let parser = recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ));
    map(parser, String::from).parse(input)
}

/// named constant or variable
fn parse_symbol(input: &str) -> IResult<&str, Expr> {
    map(parse_identifier, |name| match name.as_str() {
        "pi" => Expr::Pi,
        "e" => Expr::E,
        "i" => Expr::i(),
        "true" => Expr::Bool(true),
        "false" => Expr::Bool(false),
        _ => Expr::Var(name),
    })
    .parse(input)
}

/// builds the node of a function call
fn build_call(name: &str, mut args: Vec<Expr>) -> Result<Expr, String> {
    if name == "log" && args.len() == 2 {
        let arg = args.pop().unwrap_or_else(|| Expr::int(1));
        let base = args.pop().unwrap_or(Expr::E);
        return Ok(Expr::Log(base.boxed(), arg.boxed()));
    }
    if args.len() != 1 {
        return Err(format!(
            "function '{}' takes one argument, {} given",
            name,
            args.len()
        ));
    }
    let a = args.remove(0).boxed();
    let node = match name {
        "sin" => Expr::sin(a),
        "cos" => Expr::cos(a),
        "tan" | "tg" => Expr::tg(a),
        "cot" | "ctg" => Expr::ctg(a),
        "sec" => Expr::sec(a),
        "csc" | "cosec" => Expr::cosec(a),
        "arcsin" => Expr::arcsin(a),
        "arccos" => Expr::arccos(a),
        "arctan" | "arctg" => Expr::arctg(a),
        "arccot" | "arcctg" => Expr::arcctg(a),
        "arcsec" => Expr::arcsec(a),
        "arccsc" | "arccosec" => Expr::arccosec(a),
        "ln" | "log" => Expr::Log(Expr::E.boxed(), a),
        "sqrt" => Expr::Pow(a, Expr::rational(1, 2).boxed()),
        "exp" => Expr::Pow(Expr::E.boxed(), a),
        "abs" => Expr::abs(a),
        "sign" | "signum" => Expr::signum(a),
        "factorial" => Expr::factorial(a),
        _ => return Err(format!("unknown function '{}'", name)),
    };
    Ok(node)
}

fn parse_call(input: &str) -> IResult<&str, Expr> {
    let args = delimited(
        ws(char('(')),
        separated_list1(ws(char(',')), parse_relation),
        ws(char(')')),
    );
    map_res((parse_identifier, args), |(name, args)| build_call(&name, args)).parse(input)
}

fn parse_parens(input: &str) -> IResult<&str, Expr> {
    delimited(ws(char('(')), parse_relation, ws(char(')'))).parse(input)
}

fn parse_atom(input: &str) -> IResult<&str, Expr> {
    ws(alt((parse_number, parse_call, parse_symbol, parse_parens))).parse(input)
}

fn parse_power(input: &str) -> IResult<&str, Expr> {
    let (input, base) = parse_atom(input)?;
    let (input, exponent) = opt(preceded(ws(char('^')), parse_unary)).parse(input)?;
    Ok(match exponent {
        Some(exp) => (input, Expr::Pow(base.boxed(), exp.boxed())),
        None => (input, base),
    })
}

fn parse_unary(input: &str) -> IResult<&str, Expr> {
    let negated = map(preceded(ws(char('-')), parse_unary), |e| match e {
        Expr::Const(n) if !n.is_zero() => Expr::Const(-n),
        other => Expr::Mul(Expr::int(-1).boxed(), other.boxed()),
    });
    alt((negated, preceded(opt(ws(char('+'))), parse_power))).parse(input)
}

fn parse_product(input: &str) -> IResult<&str, Expr> {
    let (input, first) = parse_unary(input)?;
    let (input, rest) = many0(pair(ws(one_of("*/")), parse_unary)).parse(input)?;
    let expr = rest.into_iter().fold(first, |acc, (op, rhs)| match op {
        '*' => Expr::Mul(acc.boxed(), rhs.boxed()),
        _ => Expr::Div(acc.boxed(), rhs.boxed()),
    });
    Ok((input, expr))
}

fn parse_sum(input: &str) -> IResult<&str, Expr> {
    let (input, first) = parse_product(input)?;
    let (input, rest) = many0(pair(ws(one_of("+-")), parse_product)).parse(input)?;
    let expr = rest.into_iter().fold(first, |acc, (op, rhs)| match op {
        '+' => Expr::Add(acc.boxed(), rhs.boxed()),
        _ => Expr::Sub(acc.boxed(), rhs.boxed()),
    });
    Ok((input, expr))
}

fn parse_relation(input: &str) -> IResult<&str, Expr> {
    let (input, lhs) = parse_sum(input)?;
    let operator = ws(alt((tag(">="), tag("<="), tag("="), tag(">"), tag("<"))));
    let (input, rhs) = opt(pair(operator, parse_sum)).parse(input)?;
    let expr = match rhs {
        None => lhs,
        Some((op, rhs)) => {
            let (l, r) = (lhs.boxed(), rhs.boxed());
            match op {
                ">=" => Expr::GreaterOrEqual(l, r),
                "<=" => Expr::LessOrEqual(l, r),
                ">" => Expr::Greater(l, r),
                "<" => Expr::Less(l, r),
                _ => Expr::Equals(l, r),
            }
        }
    };
    Ok((input, expr))
}

impl Expr {
    /// Parses a mathematical expression from string representation.
    ///
    /// # Supported Syntax
    /// - Variables: x, y, var_name
    /// - Numbers: 3, 2.5 (decimals are read as exact rationals)
    /// - Constants: pi, e, i
    /// - Operators: +, -, *, /, ^ and one top-level relation =, >, >=, <, <=
    /// - Functions: sin, cos, tg, ctg, sec, cosec, their inverses, ln, log(base, arg), sqrt,
    ///   exp, abs, signum
    pub fn parse_expression(input: &str) -> Result<Expr, String> {
        match parse_relation(input) {
            Ok((remaining, expr)) => {
                if !remaining.trim().is_empty() {
                    return Err(format!(
                        "Failed to parse entire expression. Remaining: '{}'",
                        remaining
                    ));
                }
                Ok(expr)
            }
            Err(e) => Err(format!("Parsing error: {:?}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number() {
        assert_eq!(Expr::parse_expression("42").unwrap(), Expr::int(42));
        assert_eq!(Expr::parse_expression("0.25").unwrap(), Expr::rational(1, 4));
        assert_eq!(Expr::parse_expression("-3").unwrap(), Expr::int(-3));
    }

    #[test]
    fn test_parse_precedence() {
        let x = Expr::var("x");
        let parsed = Expr::parse_expression("x^2 - 2*x + 1").unwrap();
        let expected = x.clone().pow(Expr::int(2)) - Expr::int(2) * x.clone() + Expr::int(1);
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_parse_power_right_associative() {
        let parsed = Expr::parse_expression("2^3^2").unwrap();
        let expected = Expr::int(2).pow(Expr::int(3).pow(Expr::int(2)));
        assert_eq!(parsed, expected);
        let negative = Expr::parse_expression("-x^2").unwrap();
        assert_eq!(negative, Expr::int(-1) * Expr::var("x").pow(Expr::int(2)));
    }

    #[test]
    fn test_parse_functions_and_constants() {
        let x = Expr::var("x");
        let parsed = Expr::parse_expression("sin(x) + log(2, x) - exp(pi*i)").unwrap();
        let expected = Expr::sin(x.clone().boxed()) + Expr::Log(Expr::int(2).boxed(), x.boxed())
            - (Expr::Pi * Expr::i()).exp();
        assert_eq!(parsed, expected);
        assert_eq!(
            Expr::parse_expression("sqrt(4)").unwrap(),
            Expr::int(4).pow(Expr::rational(1, 2))
        );
    }

    #[test]
    fn test_parse_relations() {
        let parsed = Expr::parse_expression("x >= 1").unwrap();
        assert_eq!(
            parsed,
            Expr::GreaterOrEqual(Expr::var("x").boxed(), Expr::int(1).boxed())
        );
        let eq = Expr::parse_expression("  x = 2 ").unwrap();
        assert_eq!(eq, Expr::Equals(Expr::var("x").boxed(), Expr::int(2).boxed()));
    }

    #[test]
    fn test_parse_errors() {
        assert!(Expr::parse_expression("x +").is_err());
        assert!(Expr::parse_expression("foo(x)").is_err());
        assert!(Expr::parse_expression("sin(x, y)").is_err());
        assert!(Expr::parse_expression("(x").is_err());
    }
}
