//! Scope-aware parser for the restricted scheme grammar.
//!
//! The parser consumes the grouped token tree and classifies each top-level
//! construct as an at-rule or a ruleset, recursing into ruleset bodies for
//! declarations and nested at-rules. It is error tolerant: a malformed
//! construct is recorded as a [`ParseError`] and skipped, so a single run
//! reports as many independent problems as possible.

mod declaration;

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ParseError;
use crate::rules::{AtRule, Declaration, Rule, RuleSet, Stylesheet};
use crate::tokens::{self, Token, TokenKind};

/// The scope a construct appears in; some productions are scope-dependent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Stylesheet,
    Ruleset,
}

impl Scope {
    fn name(self) -> &'static str {
        match self {
            Scope::Stylesheet => "stylesheet",
            Scope::Ruleset => "ruleset",
        }
    }
}

static UUID4: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[a-f0-9]{8}-[a-f0-9]{4}-4[a-f0-9]{3}-[89ab][a-f0-9]{3}-[a-f0-9]{12}$")
        .expect("uuid4 pattern compiles")
});

fn is_uuid(value: &str) -> bool {
    UUID4.is_match(value)
}

/// Parse scheme source text into a rule tree plus collected errors.
pub fn parse_stylesheet(source: &str) -> Stylesheet {
    let tokens = tokens::tokenize(source);
    let mut rules: Vec<Rule> = Vec::new();
    let mut errors = Vec::new();
    let mut iter = tokens.into_iter();

    while let Some(token) = iter.next() {
        match token.kind {
            TokenKind::Whitespace | TokenKind::Cdo | TokenKind::Cdc => {}
            TokenKind::AtKeyword => {
                let raw = read_at_rule(token, &mut iter);
                match parse_at_rule(
                    raw,
                    rules.iter().filter_map(Rule::as_at_rule),
                    Scope::Stylesheet,
                ) {
                    Ok(rule) => rules.push(Rule::At(rule)),
                    Err(error) => {
                        tracing::warn!("recovered from parse error: {error}");
                        errors.push(error);
                    }
                }
            }
            _ => match parse_ruleset(token, &mut iter) {
                Ok((ruleset, mut nested)) => {
                    errors.append(&mut nested);
                    rules.push(Rule::Set(ruleset));
                }
                Err(error) => {
                    tracing::warn!("recovered from parse error: {error}");
                    errors.push(error);
                }
            },
        }
    }

    Stylesheet { rules, errors }
}

/// An at-rule as read off the token stream, before validation.
struct RawAtRule {
    keyword: String,
    head: Vec<Token>,
    body: Option<Token>,
    line: u32,
    column: u32,
}

/// Collect an at-rule's head up to `;`, a block, or end of scope.
fn read_at_rule(at_token: Token, iter: &mut impl Iterator<Item = Token>) -> RawAtRule {
    let keyword = at_token.str_value().unwrap_or_default().to_owned();
    let mut head = Vec::new();
    let mut body = None;
    for token in iter.by_ref() {
        match token.kind {
            TokenKind::Semicolon => break,
            TokenKind::CurlyBlock => {
                body = Some(token);
                break;
            }
            _ => head.push(token),
        }
    }
    RawAtRule {
        keyword,
        head: tokens::trim_whitespace(head),
        body,
        line: at_token.line,
        column: at_token.column,
    }
}

/// Validate an at-rule's shape, cardinality and context.
///
/// Every at-rule takes exactly one head token and no block, and each
/// keyword may occur at most once per scope. `@uuid` is only legal at
/// stylesheet root.
fn parse_at_rule<'a>(
    rule: RawAtRule,
    previous: impl IntoIterator<Item = &'a AtRule>,
    scope: Scope,
) -> Result<AtRule, ParseError> {
    for prev in previous {
        if prev.at_keyword == rule.keyword {
            return Err(ParseError::new(
                format!(
                    "{} only allowed once, previously line {}",
                    rule.keyword, prev.line
                ),
                prev.line,
                prev.column,
            ));
        }
    }

    if scope != Scope::Stylesheet && rule.keyword == "@uuid" {
        return Err(ParseError::new(
            format!("{} not allowed in {}", rule.keyword, scope.name()),
            rule.line,
            rule.column,
        ));
    }

    if rule.body.is_some() {
        let (line, column) = rule
            .head
            .last()
            .map(|t| (t.line, t.column))
            .unwrap_or((rule.line, rule.column));
        return Err(ParseError::new("expected ';', got a block", line, column));
    }

    if rule.head.is_empty() {
        return Err(ParseError::new(
            format!("expected value for {} rule", rule.keyword),
            rule.line,
            rule.column,
        ));
    }
    if rule.head.len() > 1 {
        let second = &rule.head[1];
        return Err(ParseError::new(
            format!(
                "expected 1 token for {} rule, got {}",
                rule.keyword,
                rule.head.len()
            ),
            second.line,
            second.column,
        ));
    }

    let mut head = rule.head;
    let value = head.remove(0);
    let valid = matches!(
        value.kind,
        TokenKind::String | TokenKind::Ident | TokenKind::Hash
    ) || (value.kind == TokenKind::Dimension && is_uuid(&value.rendered_value()));
    if !valid {
        return Err(ParseError::new(
            format!(
                "expected STRING, IDENT or HASH token or a valid uuid4 for {} rule, got {}",
                rule.keyword, value.kind
            ),
            rule.line,
            rule.column,
        ));
    }

    Ok(AtRule::new(rule.keyword, value, rule.line, rule.column))
}

/// Parse a ruleset: selector tokens up to a block, then the block body.
///
/// Consumes through the block even when the selector turns out invalid, so
/// the caller can carry on with the next construct.
fn parse_ruleset(
    first: Token,
    iter: &mut impl Iterator<Item = Token>,
) -> Result<(RuleSet, Vec<ParseError>), ParseError> {
    let (line, column) = (first.line, first.column);
    let mut last_position = (first.line, first.column);
    let mut selector = Vec::new();
    let mut pending = Some(first);

    loop {
        let Some(token) = pending.take().or_else(|| iter.next()) else {
            return Err(ParseError::new(
                "no declaration block found for ruleset",
                last_position.0,
                last_position.1,
            ));
        };
        last_position = (token.line, token.column);

        if token.kind != TokenKind::CurlyBlock {
            selector.push(token);
            continue;
        }

        let selector = tokens::trim_whitespace(selector);
        if selector.is_empty() {
            return Err(ParseError::new("empty selector", line, column));
        }
        for selector_token in &selector {
            tokens::validate_any(selector_token, "selector")?;
        }

        let (declarations, at_rules, errors) =
            parse_declarations_and_at_rules(token.content, Scope::Ruleset);
        return Ok((
            RuleSet::new(selector, declarations, at_rules, line, column),
            errors,
        ));
    }
}

/// Parse a block body into declarations and nested at-rules.
///
/// Declarations are unique per block: a repeated name is recorded as an
/// error and dropped, first occurrence wins.
fn parse_declarations_and_at_rules(
    body: Vec<Token>,
    scope: Scope,
) -> (Vec<Declaration>, Vec<AtRule>, Vec<ParseError>) {
    let mut declarations: Vec<Declaration> = Vec::new();
    let mut at_rules: Vec<AtRule> = Vec::new();
    let mut errors = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut iter = body.into_iter();

    while let Some(token) = iter.next() {
        match token.kind {
            TokenKind::Whitespace | TokenKind::Semicolon => {}
            TokenKind::AtKeyword => {
                let raw = read_at_rule(token, &mut iter);
                match parse_at_rule(raw, at_rules.iter(), scope) {
                    Ok(rule) => at_rules.push(rule),
                    Err(error) => errors.push(error),
                }
            }
            _ => {
                let mut segment = vec![token];
                for next in iter.by_ref() {
                    if next.kind == TokenKind::Semicolon {
                        break;
                    }
                    segment.push(next);
                }
                match declaration::parse_declaration(segment) {
                    Ok(decl) => {
                        if seen.contains(&decl.name) {
                            errors.push(ParseError::new(
                                format!("property {} only allowed once", decl.name),
                                decl.line,
                                decl.column,
                            ));
                        } else {
                            seen.insert(decl.name.clone());
                            declarations.push(decl);
                        }
                    }
                    Err(error) => errors.push(error),
                }
            }
        }
    }

    (declarations, at_rules, errors)
}
