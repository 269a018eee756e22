//! The built-in primitive tier.
//!
//! Primitives are leaf grammars: they consume input through the terminal
//! helpers on [`Matcher`] and never create child nodes. Every language
//! resolves through this tier unless a per-script override shadows a name.

use crate::{BLANK, LITERAL, Matcher, RuleSet};
use once_cell::sync::Lazy;

static PRIMITIVES: Lazy<RuleSet> = Lazy::new(|| {
    RuleSet::new()
        .with(BLANK, blank)
        .with(LITERAL, literal)
        .with("EOF", eof)
        .with("EOL", eol)
        .with("SPACE", space)
        .with("WHITESPACE", whitespace)
        .with("DIGIT", digit)
        .with("LETTER", letter)
        .with("IDENT", ident)
        .with("NUMBER", number)
        .with("STRING_LIT", string_lit)
        .with("COLOR_HASH", color_hash)
        .with("COMMENT", comment)
});

/// The primitive tier, built once.
pub fn rule_set() -> &'static RuleSet {
    &PRIMITIVES
}

/// Empty match. Always succeeds without consuming; weighs nothing.
fn blank(_: &mut Matcher<'_, '_>) -> bool {
    true
}

/// The text attached to a literal wrapper, matched exactly.
fn literal(m: &mut Matcher<'_, '_>) -> bool {
    match m.syntax() {
        Some(text) if !text.is_empty() => m.try_string(text),
        _ => false,
    }
}

fn eof(m: &mut Matcher<'_, '_>) -> bool {
    m.at_end()
}

fn eol(m: &mut Matcher<'_, '_>) -> bool {
    m.try_string("\r\n") || m.try_char(b'\n')
}

/// One or more blanks (space or tab) on the current line.
fn space(m: &mut Matcher<'_, '_>) -> bool {
    m.take_while(|b| b == b' ' || b == b'\t') > 0
}

/// Zero or more whitespace bytes, newlines included.
fn whitespace(m: &mut Matcher<'_, '_>) -> bool {
    m.take_while(|b| b.is_ascii_whitespace());
    true
}

fn digit(m: &mut Matcher<'_, '_>) -> bool {
    m.try_char_range(b'0', b'9')
}

fn letter(m: &mut Matcher<'_, '_>) -> bool {
    m.try_char_range(b'a', b'z') || m.try_char_range(b'A', b'Z')
}

fn ident(m: &mut Matcher<'_, '_>) -> bool {
    m.try_regex(regex!(r"^[A-Za-z_][A-Za-z0-9_]*"))
}

/// Integer or decimal, with or without a leading digit (`12`, `1.5`, `.5`).
fn number(m: &mut Matcher<'_, '_>) -> bool {
    m.try_regex(regex!(r"^(?:[0-9]+(?:\.[0-9]+)?|\.[0-9]+)"))
}

/// Double-quoted string with backslash escapes, on a single line.
fn string_lit(m: &mut Matcher<'_, '_>) -> bool {
    m.try_regex(regex!(r#"^"(?:[^"\\\n]|\\.)*""#))
}

/// `#rgb`, `#rgba`, `#rrggbb` or `#rrggbbaa`.
fn color_hash(m: &mut Matcher<'_, '_>) -> bool {
    m.try_regex(regex!(r"^#(?:[0-9a-fA-F]{8}|[0-9a-fA-F]{6}|[0-9a-fA-F]{3,4})\b"))
}

/// `//` to the end of the line.
fn comment(m: &mut Matcher<'_, '_>) -> bool {
    m.try_regex(regex!(r"^//[^\n]*"))
}
