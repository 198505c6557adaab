//! The `name : value` declaration production.

use crate::error::ParseError;
use crate::rules::Declaration;
use crate::tokens::{self, Token, TokenKind};

/// Parse one declaration segment (everything between `;` separators).
///
/// Property names are case-sensitive idents. The value grammar is
/// deliberately narrow: whitespace, idents, strings, hashes and function
/// calls only. Function arguments additionally admit delimiters and
/// numeric tokens, and nested functions inherit that relaxed grammar.
pub(crate) fn parse_declaration(segment: Vec<Token>) -> Result<Declaration, ParseError> {
    let mut iter = segment.into_iter();
    let Some(name_token) = iter.next() else {
        return Err(ParseError::new("expected a property name", 0, 0));
    };
    if name_token.kind != TokenKind::Ident {
        return Err(ParseError::new(
            format!("expected a property name, got {}", name_token.kind),
            name_token.line,
            name_token.column,
        ));
    }
    let name = name_token.str_value().unwrap_or_default().to_owned();

    let mut found_colon = false;
    for token in iter.by_ref() {
        match token.kind {
            TokenKind::Colon => {
                found_colon = true;
                break;
            }
            TokenKind::Whitespace => {}
            other => {
                return Err(ParseError::new(
                    format!("expected ':', got {other}"),
                    token.line,
                    token.column,
                ));
            }
        }
    }
    if !found_colon {
        return Err(ParseError::new(
            "expected ':'",
            name_token.line,
            name_token.column,
        ));
    }

    let mut value = tokens::trim_whitespace(iter.collect());
    strip_priority(&mut value);
    if value.is_empty() {
        return Err(ParseError::new(
            format!("expected a property value for property {name}"),
            name_token.line,
            name_token.column,
        ));
    }

    check_value_tokens(&value, None, &name)?;

    Ok(Declaration::new(
        name,
        value,
        name_token.line,
        name_token.column,
    ))
}

/// Drop a trailing `!important`-shaped priority marker; it carries no
/// meaning in this dialect.
fn strip_priority(value: &mut Vec<Token>) {
    let important = value.last().is_some_and(|t| {
        t.kind == TokenKind::Ident
            && t.str_value()
                .is_some_and(|s| s.eq_ignore_ascii_case("important"))
    });
    if !important {
        return;
    }
    let mut bang = value.len() - 1;
    while bang > 0 && value[bang - 1].kind == TokenKind::Whitespace {
        bang -= 1;
    }
    if bang > 0 && value[bang - 1].is_delim("!") {
        value.truncate(bang - 1);
        while value
            .last()
            .is_some_and(|t| t.kind == TokenKind::Whitespace)
        {
            value.pop();
        }
    }
}

fn check_value_tokens(
    value: &[Token],
    function: Option<&str>,
    property: &str,
) -> Result<(), ParseError> {
    for token in value {
        let mut allowed = matches!(
            token.kind,
            TokenKind::Whitespace
                | TokenKind::Ident
                | TokenKind::String
                | TokenKind::Hash
                | TokenKind::Function
        );
        if !allowed && function.is_some() {
            allowed = matches!(
                token.kind,
                TokenKind::Delim | TokenKind::Integer | TokenKind::Number | TokenKind::Percentage
            );
        }
        if !allowed {
            let match_kind = if token.kind.is_unmatched_close() {
                "unmatched"
            } else {
                "unexpected"
            };
            let context = function
                .map(|name| format!(" in function '{name}()'"))
                .unwrap_or_default();
            return Err(ParseError::new(
                format!(
                    "{match_kind} {} token for property {property}{context}",
                    token.kind
                ),
                token.line,
                token.column,
            ));
        }
        if token.kind == TokenKind::Function {
            let name = token.function_name.as_deref().unwrap_or_default();
            check_value_tokens(&token.content, Some(name), property)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::tokenize;

    fn declaration(source: &str) -> Result<Declaration, ParseError> {
        parse_declaration(tokenize(source))
    }

    #[test]
    fn simple_declaration() {
        let decl = declaration("foreground: #123456").unwrap();
        assert_eq!(decl.name, "foreground");
        assert_eq!(decl.value.len(), 1);
        assert_eq!(decl.value[0].kind, TokenKind::Hash);
    }

    #[test]
    fn mixed_ident_and_string_list() {
        let decl = declaration("list: mixed ident and \"string list\"").unwrap();
        let kinds: Vec<_> = decl.value.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            [
                TokenKind::Ident,
                TokenKind::Whitespace,
                TokenKind::Ident,
                TokenKind::Whitespace,
                TokenKind::Ident,
                TokenKind::Whitespace,
                TokenKind::String,
            ]
        );
    }

    #[test]
    fn name_must_be_ident() {
        let err = declaration("\"decl\": a").unwrap_err();
        assert_eq!(err.reason, "expected a property name, got STRING");
    }

    #[test]
    fn missing_colon() {
        let err = declaration("decl2 a").unwrap_err();
        assert_eq!(err.reason, "expected ':', got IDENT");

        let err = declaration("decl ").unwrap_err();
        assert_eq!(err.reason, "expected ':'");
    }

    #[test]
    fn missing_value() {
        let err = declaration("decl3: ").unwrap_err();
        assert_eq!(err.reason, "expected a property value for property decl3");
    }

    #[test]
    fn integer_rejected_at_top_level() {
        let err = declaration("decl: 1").unwrap_err();
        assert_eq!(err.reason, "unexpected INTEGER token for property decl");
    }

    #[test]
    fn stray_close_is_unmatched() {
        let err = declaration("decl3: some ]").unwrap_err();
        assert_eq!(err.reason, "unmatched ] token for property decl3");
    }

    #[test]
    fn numbers_allowed_inside_functions() {
        let decl = declaration("decl: fade(0, 1% 0.2)").unwrap();
        assert_eq!(decl.value[0].kind, TokenKind::Function);
    }

    #[test]
    fn nested_functions_inherit_relaxed_grammar() {
        let decl = declaration("decl: outer(inner(1, 2), 3)").unwrap();
        assert_eq!(decl.value[0].function_name.as_deref(), Some("outer"));
    }

    #[test]
    fn unmatched_close_inside_function_names_it() {
        let err = declaration("decl: broken(param1}").unwrap_err();
        assert_eq!(
            err.reason,
            "unmatched } token for property decl in function 'broken()'"
        );
    }

    #[test]
    fn priority_marker_is_ignored() {
        let decl = declaration("foreground: red !important").unwrap();
        assert_eq!(decl.value.len(), 1);
        assert_eq!(decl.value[0].str_value(), Some("red"));
    }
}
