use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, multispace0},
    combinator::{all_consuming, map, map_res, not, recognize, value},
    multi::{fold_many0, many0, separated_list0},
    sequence::{delimited, pair, preceded, terminated},
};

use std::str::FromStr;

use crate::equation::{Expression, NumericConstant, evaluator::EvaluationError, numeric::unsigned_literal};

/// Parse whitespace (spaces, tabs, newlines)
fn ws<'a, P, O>(inner: P) -> impl Parser<&'a str, Output = O, Error = nom::error::Error<&'a str>>
where
    P: Parser<&'a str, Output = O, Error = nom::error::Error<&'a str>>,
{
    delimited(multispace0, inner, multispace0)
}

/// Parse a name (variable or function)
pub fn name(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))
    .parse(input)
}

/// Parse a numeric constant (integer or float, unsigned)
fn numeric_constant(input: &str) -> IResult<&str, NumericConstant> {
    map_res(unsigned_literal, NumericConstant::from_str).parse(input)
}

/// Parse a parenthesised expression
fn parentheses(input: &str) -> IResult<&str, Expression> {
    map(
        delimited(ws(char('(')), expression, ws(char(')'))),
        Expression::parentheses,
    )
    .parse(input)
}

/// Parse function parameters
fn function_parameters(input: &str) -> IResult<&str, Vec<Expression>> {
    delimited(
        ws(char('(')),
        separated_list0(ws(char(',')), expression),
        ws(char(')')),
    )
    .parse(input)
}

/// Parse a function call
fn function_call(input: &str) -> IResult<&str, Expression> {
    map(pair(name, function_parameters), |(name, params)| {
        Expression::function_call(name, params)
    })
    .parse(input)
}

/// Parse primary expressions (atoms)
fn primary(input: &str) -> IResult<&str, Expression> {
    ws(alt((
        map(numeric_constant, Expression::Constant),
        function_call,
        map(name, Expression::variable),
        parentheses,
    )))
    .parse(input)
}

/// Parse exponentiation (right-associative, binds tighter than unary minus)
fn exponentiation(input: &str) -> IResult<&str, Expression> {
    let (input, base) = primary(input)?;

    if let Ok((input, _)) = ws(tag("**")).parse(input) {
        let (input, exponent) = unary(input)?;
        Ok((input, Expression::exponentiation(base, exponent)))
    } else {
        Ok((input, base))
    }
}

/// Parse unary expressions (unary operators)
fn unary(input: &str) -> IResult<&str, Expression> {
    alt((
        map(preceded(ws(char('+')), unary), Expression::unary_plus),
        map(preceded(ws(char('-')), unary), Expression::unary_minus),
        exponentiation,
    ))
    .parse(input)
}

type Combine = fn(Expression, Expression) -> Expression;

/// Folds `operand (op operand)*` left to right.
fn left_assoc<'a>(
    input: &'a str,
    operand: fn(&'a str) -> IResult<&'a str, Expression>,
    operators: impl Parser<&'a str, Output = Combine, Error = nom::error::Error<&'a str>>,
) -> IResult<&'a str, Expression> {
    let (input, first) = operand(input)?;
    fold_many0(
        pair(operators, operand),
        move || first.clone(),
        |left, (combine, right)| combine(left, right),
    )
    .parse(input)
}

/// Parse multiplication, division, and modulo
fn multiplicative(input: &str) -> IResult<&str, Expression> {
    left_assoc(
        input,
        unary,
        alt((
            value(Expression::multiply as Combine, ws(terminated(char('*'), not(char('*'))))),
            value(Expression::divide as Combine, ws(char('/'))),
            value(Expression::modulo as Combine, ws(char('%'))),
        )),
    )
}

/// Parse addition and subtraction
fn additive(input: &str) -> IResult<&str, Expression> {
    left_assoc(
        input,
        multiplicative,
        alt((
            value(Expression::add as Combine, ws(char('+'))),
            value(Expression::subtract as Combine, ws(char('-'))),
        )),
    )
}

/// Parse a complete expression
pub fn expression(input: &str) -> IResult<&str, Expression> {
    ws(additive).parse(input)
}

/// Parses `input` as one expression, rejecting trailing text.
///
/// Exponentiation must already be written as `**`; see
/// [`normalize_exponents`](crate::equation::evaluator::normalize_exponents).
pub fn parse_expression(input: &str) -> Result<Expression, EvaluationError> {
    all_consuming(expression)
        .parse(input)
        .map(|(_, expr)| expr)
        .map_err(|err| EvaluationError::Parse {
            expression: input.to_string(),
            message: err.to_string(),
        })
}
