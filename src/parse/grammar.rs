use winnow::ascii::till_line_ending;
use winnow::combinator::{alt, cut_err, opt, preceded, repeat};
use winnow::error::{ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{any, take_while};

use crate::{Clause, ExpressionNode, Operator};

// -- Whitespace & comments --------------------------------------------------

fn ws(input: &mut &str) -> ModalResult<()> {
    let _: () = repeat(
        0..,
        alt((
            take_while(1.., |c: char| c.is_ascii_whitespace()).void(),
            ('#', till_line_ending).void(),
        )),
    )
    .parse_next(input)?;
    Ok(())
}

// -- Names ------------------------------------------------------------------

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':')
}

fn quoted_name(input: &mut &str) -> ModalResult<String> {
    '"'.parse_next(input)?;
    let mut s = String::new();
    loop {
        match any.parse_next(input)? {
            '"' => return Ok(s),
            '\\' => match any.parse_next(input)? {
                '"' => s.push('"'),
                '\\' => s.push('\\'),
                other => {
                    s.push('\\');
                    s.push(other);
                }
            },
            c => s.push(c),
        }
    }
}

fn name(input: &mut &str) -> ModalResult<String> {
    alt((
        quoted_name,
        take_while(1.., is_name_char).map(str::to_owned),
    ))
    .context(StrContext::Expected(StrContextValue::Description("name")))
    .parse_next(input)
}

fn keyword<'i>(input: &mut &'i str, word: &str) -> ModalResult<&'i str> {
    take_while(1.., is_name_char)
        .verify(|s: &str| s.eq_ignore_ascii_case(word))
        .parse_next(input)
}

fn and_keyword<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    keyword(input, "and")
}

fn or_keyword<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    keyword(input, "or")
}

// -- Expressions (precedence: OR < AND < primary) ---------------------------

fn clause(input: &mut &str) -> ModalResult<ExpressionNode> {
    let device_id = name(input)?;
    cut_err('@')
        .context(StrContext::Expected(StrContextValue::CharLiteral('@')))
        .parse_next(input)?;
    let anchor_id = cut_err(name).parse_next(input)?;
    Ok(ExpressionNode::Clause(Clause {
        device_id,
        anchor_id,
    }))
}

fn group(input: &mut &str) -> ModalResult<ExpressionNode> {
    '('.parse_next(input)?;
    ws.parse_next(input)?;
    if opt(')').parse_next(input)?.is_some() {
        return Ok(ExpressionNode::Group {
            operator: Operator::And,
            children: Vec::new(),
        });
    }
    let inner = cut_err(or_expr).parse_next(input)?;
    ws.parse_next(input)?;
    cut_err(')')
        .context(StrContext::Expected(StrContextValue::CharLiteral(')')))
        .parse_next(input)?;
    Ok(inner)
}

fn primary(input: &mut &str) -> ModalResult<ExpressionNode> {
    ws.parse_next(input)?;
    alt((group, clause))
        .context(StrContext::Expected(StrContextValue::Description(
            "expression",
        )))
        .parse_next(input)
}

/// Collapse a chain of operands joined by one operator into a single group.
fn chain(first: ExpressionNode, rest: Vec<ExpressionNode>, operator: Operator) -> ExpressionNode {
    if rest.is_empty() {
        return first;
    }
    let mut children = Vec::with_capacity(rest.len() + 1);
    children.push(first);
    children.extend(rest);
    ExpressionNode::Group { operator, children }
}

fn and_expr(input: &mut &str) -> ModalResult<ExpressionNode> {
    let first = primary(input)?;
    let rest: Vec<ExpressionNode> =
        repeat(0.., preceded((ws, and_keyword), cut_err(primary))).parse_next(input)?;
    Ok(chain(first, rest, Operator::And))
}

fn or_expr(input: &mut &str) -> ModalResult<ExpressionNode> {
    let first = and_expr(input)?;
    let rest: Vec<ExpressionNode> =
        repeat(0.., preceded((ws, or_keyword), cut_err(and_expr))).parse_next(input)?;
    Ok(chain(first, rest, Operator::Or))
}

// -- Top-level parser -------------------------------------------------------

pub fn parse_root(input: &mut &str) -> ModalResult<ExpressionNode> {
    let expr = or_expr(input)?;
    ws.parse_next(input)?;
    Ok(expr)
}
