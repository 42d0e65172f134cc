//! A `nom`-based parser for the path query language.

use super::ast::*;
use crate::error::XPathError;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit0, digit1, multispace0},
    combinator::{map, map_res, not, opt, peek, recognize},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded, terminated},
};

pub fn parse_expression(input: &str) -> Result<Expression, XPathError> {
    match expression(input.trim()) {
        Ok(("", expr)) => Ok(expr),
        Ok((rem, _)) => Err(XPathError::XPathParse(
            input.to_string(),
            format!("unexpected trailing input '{}'", rem),
        )),
        Err(e) => Err(XPathError::XPathParse(input.to_string(), e.to_string())),
    }
}

// --- Combinators & Helpers ---

fn ws<'a, F, O, E>(inner: F) -> impl Parser<&'a str, Output = O, Error = E>
where
    F: Parser<&'a str, Output = O, Error = E>,
    E: nom::error::ParseError<&'a str>,
{
    delimited(multispace0, inner, multispace0)
}

/// Left-associative chain of `sub op sub op sub ...`.
fn binary_chain<'a, F, G>(
    operand: F,
    operator: G,
) -> impl FnMut(&'a str) -> IResult<&'a str, Expression>
where
    F: Parser<&'a str, Output = Expression, Error = nom::error::Error<&'a str>> + Clone,
    G: Parser<&'a str, Output = BinaryOperator, Error = nom::error::Error<&'a str>> + Clone,
{
    move |input: &str| {
        let (input, first) = operand.clone().parse(input)?;
        let (input, rest) = many0(pair(ws(operator.clone()), operand.clone())).parse(input)?;

        let expr = rest.into_iter().fold(first, |left, (op, right)| Expression::BinaryOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        });
        Ok((input, expr))
    }
}

/// Keyword operators must not run into a following name character (`order` is not `or`).
fn keyword<'a>(word: &'static str) -> impl Parser<&'a str, Output = &'a str, Error = nom::error::Error<&'a str>> {
    terminated(tag(word), not(peek(take_while1(is_name_char))))
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '.'
}

// --- Expression Parsers (lowest precedence first) ---

fn expression(input: &str) -> IResult<&str, Expression> {
    binary_chain(and_expr, or_op)(input)
}

fn and_expr(input: &str) -> IResult<&str, Expression> {
    binary_chain(equality_expr, and_op)(input)
}

fn or_op(input: &str) -> IResult<&str, BinaryOperator> {
    map(keyword("or"), |_| BinaryOperator::Or).parse(input)
}

fn and_op(input: &str) -> IResult<&str, BinaryOperator> {
    map(keyword("and"), |_| BinaryOperator::And).parse(input)
}

fn union_op(input: &str) -> IResult<&str, BinaryOperator> {
    map(char('|'), |_| BinaryOperator::Union).parse(input)
}

fn equality_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        map(tag("!="), |_| BinaryOperator::NotEquals),
        map(tag("="), |_| BinaryOperator::Equals),
    ))
    .parse(input)
}

fn relational_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        map(tag("<="), |_| BinaryOperator::LessThanOrEqual),
        map(tag(">="), |_| BinaryOperator::GreaterThanOrEqual),
        map(tag("<"), |_| BinaryOperator::LessThan),
        map(tag(">"), |_| BinaryOperator::GreaterThan),
    ))
    .parse(input)
}

fn additive_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        map(char('+'), |_| BinaryOperator::Plus),
        map(char('-'), |_| BinaryOperator::Minus),
    ))
    .parse(input)
}

fn multiplicative_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        map(char('*'), |_| BinaryOperator::Multiply),
        map(keyword("div"), |_| BinaryOperator::Divide),
        map(keyword("mod"), |_| BinaryOperator::Modulo),
    ))
    .parse(input)
}

fn equality_expr(input: &str) -> IResult<&str, Expression> {
    binary_chain(relational_expr, equality_op)(input)
}

fn relational_expr(input: &str) -> IResult<&str, Expression> {
    binary_chain(additive_expr, relational_op)(input)
}

fn additive_expr(input: &str) -> IResult<&str, Expression> {
    binary_chain(multiplicative_expr, additive_op)(input)
}

fn multiplicative_expr(input: &str) -> IResult<&str, Expression> {
    binary_chain(unary_expr, multiplicative_op)(input)
}

fn unary_expr(input: &str) -> IResult<&str, Expression> {
    let (i, negated) = opt(ws(char('-'))).parse(input)?;
    let (i, expr) = union_expr(i)?;
    match negated {
        Some(_) => Ok((i, Expression::Negate(Box::new(expr)))),
        None => Ok((i, expr)),
    }
}

fn union_expr(input: &str) -> IResult<&str, Expression> {
    binary_chain(path_expr, union_op)(input)
}

/// A primary expression optionally continued by further steps, or a plain
/// location path. Primary expressions are tried first so `last()` is read as
/// a function call rather than a step named `last`.
fn path_expr(input: &str) -> IResult<&str, Expression> {
    let (i, start) = alt((primary_expr, map(ws(location_path), Expression::LocationPath))).parse(input)?;
    let (i, more) = many0(pair(alt((tag("//"), tag("/"))), step)).parse(i)?;

    if more.is_empty() {
        return Ok((i, start));
    }

    let (start_point, is_absolute, mut steps) = match start {
        Expression::LocationPath(lp) => (lp.start_point, lp.is_absolute, lp.steps),
        other => (Some(Box::new(other)), false, vec![]),
    };
    push_steps(&mut steps, more);

    Ok((
        i,
        Expression::LocationPath(LocationPath {
            start_point,
            is_absolute,
            steps,
        }),
    ))
}

fn push_steps(steps: &mut Vec<Step>, separated: Vec<(&str, Step)>) {
    for (sep, next) in separated {
        if sep == "//" {
            steps.push(Step::any_descendant_or_self());
        }
        steps.push(next);
    }
}

fn primary_expr(input: &str) -> IResult<&str, Expression> {
    ws(alt((
        map(number, Expression::Number),
        map(string_literal, Expression::Literal),
        function_call,
        delimited(ws(char('(')), expression, ws(char(')'))),
    )))
    .parse(input)
}

// --- Literals ---

fn number(input: &str) -> IResult<&str, f64> {
    map_res(
        recognize(alt((
            recognize(pair(digit1, opt(pair(char('.'), digit0)))),
            recognize(pair(char('.'), digit1)),
        ))),
        str::parse::<f64>,
    )
    .parse(input)
}

fn string_literal(input: &str) -> IResult<&str, String> {
    map(
        alt((
            delimited(char('\''), take_while(|c| c != '\''), char('\'')),
            delimited(char('"'), take_while(|c| c != '"'), char('"')),
        )),
        str::to_string,
    )
    .parse(input)
}

// --- Names and node tests ---

fn nc_name(input: &str) -> IResult<&str, &str> {
    recognize(pair(take_while1(is_name_start), take_while(is_name_char))).parse(input)
}

fn q_name(input: &str) -> IResult<&str, (Option<&str>, &str)> {
    alt((
        map(
            (nc_name, char(':'), nc_name),
            |(prefix, _, local)| (Some(prefix), local),
        ),
        map(nc_name, |local| (None, local)),
    ))
    .parse(input)
}

fn node_type_test(input: &str) -> IResult<&str, NodeTest> {
    map(
        terminated(
            alt((
                tag("text"),
                tag("node"),
                tag("comment"),
                tag("processing-instruction"),
            )),
            pair(ws(char('(')), char(')')),
        ),
        |kind: &str| {
            NodeTest::NodeType(match kind {
                "text" => NodeTypeTest::Text,
                "comment" => NodeTypeTest::Comment,
                "processing-instruction" => NodeTypeTest::ProcessingInstruction,
                _ => NodeTypeTest::Node,
            })
        },
    )
    .parse(input)
}

pub fn node_test(input: &str) -> IResult<&str, NodeTest> {
    alt((
        map(char('*'), |_| NodeTest::Wildcard),
        node_type_test,
        map(terminated(nc_name, tag(":*")), |prefix| {
            NodeTest::NamespaceWildcard(prefix.to_string())
        }),
        map(q_name, |(prefix, local)| NodeTest::name(prefix, local)),
    ))
    .parse(input)
}

// --- Paths ---

fn axis(input: &str) -> IResult<&str, Axis> {
    terminated(
        alt((
            map(tag("child"), |_| Axis::Child),
            map(tag("descendant-or-self"), |_| Axis::DescendantOrSelf),
            map(tag("descendant"), |_| Axis::Descendant),
            map(tag("attribute"), |_| Axis::Attribute),
            map(tag("parent"), |_| Axis::Parent),
            map(tag("ancestor-or-self"), |_| Axis::AncestorOrSelf),
            map(tag("ancestor"), |_| Axis::Ancestor),
            map(tag("self"), |_| Axis::SelfAxis),
            map(tag("following-sibling"), |_| Axis::FollowingSibling),
            map(tag("preceding-sibling"), |_| Axis::PrecedingSibling),
        )),
        tag("::"),
    )
    .parse(input)
}

fn predicate(input: &str) -> IResult<&str, Expression> {
    delimited(ws(char('[')), expression, ws(char(']'))).parse(input)
}

fn step(input: &str) -> IResult<&str, Step> {
    let any_node = || NodeTest::NodeType(NodeTypeTest::Node);
    let (i, (axis, node_test)) = alt((
        map(tag(".."), |_| (Axis::Parent, any_node())),
        map(char('.'), |_| (Axis::SelfAxis, any_node())),
        map(preceded(char('@'), node_test), |nt| (Axis::Attribute, nt)),
        map(pair(opt(axis), node_test), |(ax, nt)| (ax.unwrap_or(Axis::Child), nt)),
    ))
    .parse(input)?;
    let (i, predicates) = many0(predicate).parse(i)?;
    Ok((
        i,
        Step {
            axis,
            node_test,
            predicates,
        },
    ))
}

fn location_path(input: &str) -> IResult<&str, LocationPath> {
    let (i, (is_absolute, mut steps)) = if let Some(rem) = input.strip_prefix("//") {
        let (rem, first) = step(rem)?;
        (rem, (true, vec![Step::any_descendant_or_self(), first]))
    } else if let Some(rem) = input.strip_prefix('/') {
        match step(rem) {
            Ok((rem, first)) => (rem, (true, vec![first])),
            // A lone "/" selects the scope root.
            Err(_) => (rem, (true, vec![])),
        }
    } else {
        let (rem, first) = step(input)?;
        (rem, (false, vec![first]))
    };

    let (i, more) = many0(pair(alt((tag("//"), tag("/"))), step)).parse(i)?;
    push_steps(&mut steps, more);

    Ok((
        i,
        LocationPath {
            start_point: None,
            is_absolute,
            steps,
        },
    ))
}

fn function_call(input: &str) -> IResult<&str, Expression> {
    // Requiring the '(' lookahead keeps `foo` in `foo/bar` a step name.
    let (i, (prefix, local)) = q_name(input)?;
    let (i, _) = peek(ws(char('('))).parse(i)?;

    if matches!(local, "text" | "node" | "comment" | "processing-instruction") && prefix.is_none() {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Verify,
        )));
    }

    let name = match prefix {
        Some(p) => format!("{}:{}", p, local),
        None => local.to_string(),
    };

    let (i, _) = multispace0(i)?;
    let (i, args) = delimited(
        char('('),
        separated_list0(ws(char(',')), expression),
        ws(char(')')),
    )
    .parse(i)?;

    Ok((i, Expression::FunctionCall { name, args }))
}
