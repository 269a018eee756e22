//! A small statement language.
//!
//! ```text
//! SCRIPT      := STATEMENT* WHITESPACE EOF
//! STATEMENT   := WHITESPACE (ASSIGNMENT | CALL) WHITESPACE STATEMENT_END
//! ASSIGNMENT  := VARIABLE WHITESPACE "=" WHITESPACE EXPRESSION
//! VARIABLE    := "$" IDENT
//! EXPRESSION  := TERM (WHITESPACE OPERATOR WHITESPACE TERM)*
//! TERM        := PERCENTAGE | NUMBER | STRING_LIT | COLOR_HASH | CALL | VARIABLE | GROUP
//! PERCENTAGE  := NUMBER "%"
//! GROUP       := "(" WHITESPACE EXPRESSION WHITESPACE ")"
//! CALL        := IDENT "(" WHITESPACE ARGUMENTS? WHITESPACE ")"
//! ARGUMENTS   := EXPRESSION (WHITESPACE "," WHITESPACE EXPRESSION)*
//! OPERATOR    := "+" | "-" | "*" | "/"
//! STATEMENT_END := ";"
//! ```
//!
//! The repeated tails of `EXPRESSION` and `ARGUMENTS` are named grammars, so
//! they leave no node of their own in the normalized tree.

use crate::{Grammar, Language, Matcher, RuleSet, literal, many, named_grammar, optional, reference};
use once_cell::sync::Lazy;

/// Language identifier forwarded to compilers.
pub const NAME: &str = "demo";

static RULES: Lazy<RuleSet> = Lazy::new(|| {
    let rules: [(&'static str, Grammar); 14] = [
        ("SCRIPT", script),
        ("STATEMENT", statement),
        ("ASSIGNMENT", assignment),
        ("VARIABLE", variable),
        ("EXPRESSION", expression),
        ("EXPRESSION_TAIL", expression_tail),
        ("TERM", term),
        ("PERCENTAGE", percentage),
        ("GROUP", group),
        ("CALL", call),
        ("ARGUMENTS", arguments),
        ("ARGUMENTS_TAIL", arguments_tail),
        ("OPERATOR", operator),
        ("STATEMENT_END", statement_end),
    ];
    rules.into_iter().collect()
});

/// The demo language on top of the built-in primitives.
pub fn language() -> Language {
    Language::new(NAME, RULES.clone())
}

fn script(m: &mut Matcher<'_, '_>) -> bool {
    m.sequence(&[many(reference("STATEMENT")), reference("WHITESPACE"), reference("EOF")])
}

fn statement(m: &mut Matcher<'_, '_>) -> bool {
    m.sequence(&[
        reference("WHITESPACE"),
        alt![reference("ASSIGNMENT"), reference("CALL")],
        reference("WHITESPACE"),
        reference("STATEMENT_END"),
    ])
}

fn assignment(m: &mut Matcher<'_, '_>) -> bool {
    m.sequence(&[
        reference("VARIABLE"),
        reference("WHITESPACE"),
        literal("="),
        reference("WHITESPACE"),
        reference("EXPRESSION"),
    ])
}

fn variable(m: &mut Matcher<'_, '_>) -> bool {
    m.sequence(&[literal("$"), reference("IDENT")])
}

fn expression(m: &mut Matcher<'_, '_>) -> bool {
    m.sequence(&[reference("TERM"), many(named_grammar("EXPRESSION_TAIL", "OPERATOR TERM"))])
}

fn expression_tail(m: &mut Matcher<'_, '_>) -> bool {
    m.sequence(&[reference("WHITESPACE"), reference("OPERATOR"), reference("WHITESPACE"), reference("TERM")])
}

fn term(m: &mut Matcher<'_, '_>) -> bool {
    m.alternation(&[
        reference("PERCENTAGE"),
        reference("NUMBER"),
        reference("STRING_LIT"),
        reference("COLOR_HASH"),
        reference("CALL"),
        reference("VARIABLE"),
        reference("GROUP"),
    ])
}

fn percentage(m: &mut Matcher<'_, '_>) -> bool {
    m.sequence(&[reference("NUMBER"), literal("%")])
}

fn group(m: &mut Matcher<'_, '_>) -> bool {
    m.sequence(&[
        literal("("),
        reference("WHITESPACE"),
        reference("EXPRESSION"),
        reference("WHITESPACE"),
        literal(")"),
    ])
}

fn call(m: &mut Matcher<'_, '_>) -> bool {
    m.sequence(&[
        reference("IDENT"),
        literal("("),
        reference("WHITESPACE"),
        optional(reference("ARGUMENTS")),
        reference("WHITESPACE"),
        literal(")"),
    ])
}

fn arguments(m: &mut Matcher<'_, '_>) -> bool {
    m.sequence(&[reference("EXPRESSION"), many(named_grammar("ARGUMENTS_TAIL", "\",\" EXPRESSION"))])
}

fn arguments_tail(m: &mut Matcher<'_, '_>) -> bool {
    m.sequence(&[reference("WHITESPACE"), literal(","), reference("WHITESPACE"), reference("EXPRESSION")])
}

fn operator(m: &mut Matcher<'_, '_>) -> bool {
    [b'+', b'-', b'*', b'/'].into_iter().any(|op| m.try_char(op))
}

fn statement_end(m: &mut Matcher<'_, '_>) -> bool {
    m.try_char(b';')
}
