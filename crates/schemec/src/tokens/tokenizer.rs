//! Grouped tokenization on top of the `cssparser` tokenizer.
//!
//! `cssparser` owns the actual CSS token grammar; this module drives it and
//! reshapes its stream into the [`Token`] tree the parser consumes, keeping
//! whitespace, exact raw text and 1-based source positions, and recursing
//! into blocks and function arguments so the result is pre-grouped.

use cssparser::{ParseError as CssParseError, Parser, ParserInput, Token as CssToken};

use super::{Token, TokenKind, TokenValue};

/// Tokenize a source string into a grouped token tree.
///
/// Comments are dropped. Everything else survives, including whitespace
/// tokens and stray closing delimiters, which the grammar layers above
/// report with their own error messages.
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut input = ParserInput::new(source);
    let mut parser = Parser::new(&mut input);
    collect_tokens(&mut parser)
}

fn collect_tokens<'i>(parser: &mut Parser<'i, '_>) -> Vec<Token> {
    let mut tokens = Vec::new();
    loop {
        let location = parser.current_source_location();
        let start = parser.position();
        let css_token = match parser.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };
        // cssparser lines are 0-based; this engine reports 1-based.
        let line = location.line + 1;
        let column = location.column;

        match css_token {
            CssToken::Comment(_) => {}
            CssToken::Function(name) => {
                let content = nested_tokens(parser);
                let raw = parser.slice_from(start).to_owned();
                tokens.push(Token::function(name.as_ref(), content, raw, line, column));
            }
            CssToken::ParenthesisBlock => {
                let content = nested_tokens(parser);
                let raw = parser.slice_from(start).to_owned();
                tokens.push(Token::container(TokenKind::ParenBlock, content, raw, line, column));
            }
            CssToken::SquareBracketBlock => {
                let content = nested_tokens(parser);
                let raw = parser.slice_from(start).to_owned();
                tokens.push(Token::container(TokenKind::SquareBlock, content, raw, line, column));
            }
            CssToken::CurlyBracketBlock => {
                let content = nested_tokens(parser);
                let raw = parser.slice_from(start).to_owned();
                tokens.push(Token::container(TokenKind::CurlyBlock, content, raw, line, column));
            }
            other => {
                let raw = parser.slice_from(start).to_owned();
                tokens.push(scalar_token(other, raw, line, column));
            }
        }
    }
    tokens
}

fn nested_tokens<'i>(parser: &mut Parser<'i, '_>) -> Vec<Token> {
    parser
        .parse_nested_block(|block| Ok::<_, CssParseError<'i, ()>>(collect_tokens(block)))
        .unwrap_or_default()
}

fn scalar_token(css_token: CssToken<'_>, raw: String, line: u32, column: u32) -> Token {
    let (kind, value, unit) = match css_token {
        CssToken::Ident(name) => (TokenKind::Ident, TokenValue::Str(name.to_string()), None),
        CssToken::AtKeyword(name) => (
            TokenKind::AtKeyword,
            TokenValue::Str(format!("@{name}")),
            None,
        ),
        CssToken::Hash(name) | CssToken::IDHash(name) => {
            (TokenKind::Hash, TokenValue::Str(format!("#{name}")), None)
        }
        CssToken::QuotedString(text) => (TokenKind::String, TokenValue::Str(text.to_string()), None),
        CssToken::BadString(text) => (TokenKind::BadString, TokenValue::Str(text.to_string()), None),
        CssToken::UnquotedUrl(url) => (TokenKind::Url, TokenValue::Str(url.to_string()), None),
        CssToken::BadUrl(url) => (TokenKind::BadUrl, TokenValue::Str(url.to_string()), None),
        CssToken::Delim(c) => (TokenKind::Delim, TokenValue::Str(c.to_string()), None),
        CssToken::Comma => (TokenKind::Delim, TokenValue::Str(",".into()), None),
        CssToken::Number {
            int_value: Some(int),
            ..
        } => (TokenKind::Integer, TokenValue::Int(int), None),
        CssToken::Number { value, .. } => (TokenKind::Number, TokenValue::Num(value), None),
        CssToken::Percentage {
            int_value: Some(int),
            ..
        } => (TokenKind::Percentage, TokenValue::Int(int), Some("%".into())),
        CssToken::Percentage { unit_value, .. } => (
            TokenKind::Percentage,
            TokenValue::Num(unit_value * 100.0),
            Some("%".into()),
        ),
        CssToken::Dimension {
            int_value: Some(int),
            unit,
            ..
        } => (
            TokenKind::Dimension,
            TokenValue::Int(int),
            Some(unit.to_string()),
        ),
        CssToken::Dimension { value, unit, .. } => (
            TokenKind::Dimension,
            TokenValue::Num(value),
            Some(unit.to_string()),
        ),
        CssToken::WhiteSpace(text) => (TokenKind::Whitespace, TokenValue::Str(text.to_string()), None),
        CssToken::Colon => (TokenKind::Colon, TokenValue::Str(":".into()), None),
        CssToken::Semicolon => (TokenKind::Semicolon, TokenValue::Str(";".into()), None),
        CssToken::CloseParenthesis => (TokenKind::CloseParen, TokenValue::Str(")".into()), None),
        CssToken::CloseSquareBracket => (TokenKind::CloseSquare, TokenValue::Str("]".into()), None),
        CssToken::CloseCurlyBracket => (TokenKind::CloseCurly, TokenValue::Str("}".into()), None),
        CssToken::IncludeMatch => (TokenKind::Delim, TokenValue::Str("~=".into()), None),
        CssToken::DashMatch => (TokenKind::Delim, TokenValue::Str("|=".into()), None),
        CssToken::PrefixMatch => (TokenKind::Delim, TokenValue::Str("^=".into()), None),
        CssToken::SuffixMatch => (TokenKind::Delim, TokenValue::Str("$=".into()), None),
        CssToken::SubstringMatch => (TokenKind::Delim, TokenValue::Str("*=".into()), None),
        CssToken::CDO => (TokenKind::Cdo, TokenValue::Str("<!--".into()), None),
        CssToken::CDC => (TokenKind::Cdc, TokenValue::Str("-->".into()), None),
        // Containers and comments are handled by the caller.
        _ => (TokenKind::Delim, TokenValue::Str(raw.clone()), None),
    };

    match unit {
        Some(unit) => Token::with_unit(kind, value, unit, raw, line, column),
        None => Token::new(kind, value, raw, line, column),
    }
}
