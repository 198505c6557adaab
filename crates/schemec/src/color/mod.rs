//! Color translation: turn a value token into a canonical hex hash.
//!
//! This is a pure function library. A color value may arrive as a color
//! keyword, a `#hex`-shaped string, a hash token or an `rgb`/`rgba`/`hsl`/
//! `hsla` function call; all of them reduce to an uppercase-normalized
//! `HASH` token with 6 or 8 hex digits (3-digit hashes expand by doubling
//! each digit). All clamping and conversion formulas live here so the
//! result is bit-reproducible.

mod named;

pub use named::named_color;

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{DumpError, Result};
use crate::tokens::{self, Token, TokenKind, TokenValue};

static HEX_STRING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^#[0-9a-f]+$").expect("hex pattern compiles"));

/// Translate one color-typed value token into canonical form.
///
/// Returns `Ok(Some(token))` with the replacement `HASH` token when the
/// canonical value differs from the input, `Ok(None)` when the token is
/// already canonical. The replacement keeps the input token's raw css text
/// and source position.
pub fn translate_color(token: &Token, property: &str, selector: &str) -> Result<Option<Token>> {
    let hex = match token.kind {
        TokenKind::Ident => lookup_named(token, property, selector)?,
        TokenKind::String => {
            let value = token.str_value().unwrap_or_default();
            if HEX_STRING.is_match(value) {
                value.to_owned()
            } else {
                lookup_named(token, property, selector)?
            }
        }
        TokenKind::Hash => token.str_value().unwrap_or_default().to_owned(),
        TokenKind::Function => function_color(token, property, selector)?,
        other => {
            return Err(DumpError::new(
                format!("unexpected {other} value for property {property}"),
                token.line,
                token.column,
            )
            .with_location(format!("{selector}; {property}")));
        }
    };

    let digits = hex.len().saturating_sub(1);
    if !matches!(digits, 3 | 6 | 8) {
        return Err(DumpError::new(
            format!("unexpected length of {digits} of color hash for property {property}"),
            token.line,
            token.column,
        )
        .with_location(format!("{selector}; {property}")));
    }
    // Three-digit hashes expand by doubling each digit, uppercased so the
    // canonical form matches what the color functions compose.
    let hex = if digits == 3 {
        let mut expanded = String::with_capacity(7);
        expanded.push('#');
        for c in hex.chars().skip(1) {
            let c = c.to_ascii_uppercase();
            expanded.push(c);
            expanded.push(c);
        }
        expanded
    } else {
        hex
    };

    if token.kind == TokenKind::Hash && token.str_value() == Some(hex.as_str()) {
        return Ok(None);
    }
    Ok(Some(Token::new(
        TokenKind::Hash,
        TokenValue::Str(hex),
        token.raw.clone(),
        token.line,
        token.column,
    )))
}

fn lookup_named(token: &Token, property: &str, selector: &str) -> Result<String> {
    let name = token.str_value().unwrap_or_default();
    match named_color(name) {
        Some(hex) => Ok(hex.to_owned()),
        None => Err(DumpError::new(
            format!("unknown color name '{name}' for property {property}"),
            token.line,
            token.column,
        )
        .with_location(selector)),
    }
}

/// Evaluate an `rgb`/`rgba`/`hsl`/`hsla` call to a hex string.
///
/// The function name doubles as the parameter spec: its length is the
/// arity and each letter states what the parameter at that position
/// accepts.
fn function_color(token: &Token, property: &str, selector: &str) -> Result<String> {
    let name = token.function_name.as_deref().unwrap_or_default();
    if !matches!(name, "rgb" | "rgba" | "hsl" | "hsla") {
        return Err(DumpError::new(
            format!("unknown function '{name}()' for property {property}"),
            token.line,
            token.column,
        )
        .with_location(selector));
    }

    let groups: Vec<&[Token]> = tokens::split_on_comma(&token.content)
        .into_iter()
        .map(tokens::strip_whitespace)
        .collect();
    // A single empty group means an empty argument list.
    let groups: Vec<&[Token]> = if groups.len() == 1 && groups[0].is_empty() {
        Vec::new()
    } else {
        groups
    };
    if groups.len() != name.len() {
        return Err(DumpError::new(
            format!(
                "expected {} parameters for function '{name}()', got {}",
                name.len(),
                groups.len()
            ),
            token.line,
            token.column,
        )
        .with_location(format!("{selector}; {property}")));
    }

    let mut params = Vec::with_capacity(groups.len());
    for (index, group) in groups.iter().enumerate() {
        let number = index + 1;
        if group.len() != 1 {
            let subject = group.get(1).unwrap_or(token);
            return Err(DumpError::new(
                format!(
                    "expected 1 token for parameter {number} in function '{name}()', got {}",
                    group.len()
                ),
                subject.line,
                subject.column,
            )
            .with_location(format!("{selector}; {property}")));
        }
        let param = &group[0];
        let value = param.numeric_value().unwrap_or_default();
        let unexpected = || {
            DumpError::new(
                format!(
                    "unexpected {} value for parameter {number} in function '{name}()'",
                    param.kind
                ),
                param.line,
                param.column,
            )
            .with_location(format!("{selector}; {property}"))
        };

        // The letter at this position in the function name tells the
        // parameter's role: r/g/b channel, alpha, hue, saturation, lightness.
        let resolved = match name.as_bytes()[index] {
            b'r' | b'g' | b'b' => match param.kind {
                TokenKind::Integer => value.clamp(0.0, 255.0) / 255.0,
                TokenKind::Percentage => value.clamp(0.0, 100.0) / 100.0,
                _ => return Err(unexpected()),
            },
            b'a' => match param.kind {
                TokenKind::Integer | TokenKind::Number => value.clamp(0.0, 1.0),
                _ => return Err(unexpected()),
            },
            b'h' => match param.kind {
                TokenKind::Integer | TokenKind::Number => value.rem_euclid(360.0) / 360.0,
                _ => return Err(unexpected()),
            },
            // 's' and 'l' both take percentages only.
            _ => match param.kind {
                TokenKind::Percentage => value.clamp(0.0, 100.0) / 100.0,
                _ => return Err(unexpected()),
            },
        };
        params.push(resolved);
    }

    if name.starts_with("hsl") {
        let (r, g, b) = hsl_to_rgb(params[0], params[1], params[2]);
        params[0] = r;
        params[1] = g;
        params[2] = b;
    }

    let mut hex = String::with_capacity(1 + params.len() * 2);
    hex.push('#');
    for channel in params {
        hex.push_str(&format!("{:02X}", (channel * 255.0).round() as u8));
    }
    Ok(hex)
}

/// Convert hue/saturation/lightness (all in [0, 1]) to r/g/b.
///
/// Lightness-middle formulation; the parameters are threaded by name so the
/// saturation/lightness positions cannot be swapped by accident.
fn hsl_to_rgb(hue: f64, saturation: f64, lightness: f64) -> (f64, f64, f64) {
    if saturation == 0.0 {
        return (lightness, lightness, lightness);
    }
    let m2 = if lightness <= 0.5 {
        lightness * (1.0 + saturation)
    } else {
        lightness + saturation - lightness * saturation
    };
    let m1 = 2.0 * lightness - m2;
    (
        hue_channel(m1, m2, hue + 1.0 / 3.0),
        hue_channel(m1, m2, hue),
        hue_channel(m1, m2, hue - 1.0 / 3.0),
    )
}

fn hue_channel(m1: f64, m2: f64, hue: f64) -> f64 {
    let hue = hue.rem_euclid(1.0);
    if hue < 1.0 / 6.0 {
        m1 + (m2 - m1) * hue * 6.0
    } else if hue < 0.5 {
        m2
    } else if hue < 2.0 / 3.0 {
        m1 + (m2 - m1) * (2.0 / 3.0 - hue) * 6.0
    } else {
        m1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::tokenize;

    fn value_token(source: &str) -> Token {
        tokenize(source).into_iter().next().unwrap()
    }

    fn translated(source: &str) -> Result<Option<Token>> {
        translate_color(&value_token(source), "foreground", "*")
    }

    fn hex_of(source: &str) -> String {
        translated(source)
            .unwrap()
            .expect("token should be rewritten")
            .str_value()
            .unwrap()
            .to_owned()
    }

    #[test]
    fn named_color_becomes_hash() {
        assert_eq!(hex_of("red"), "#FF0000");
        assert_eq!(hex_of("rebeccapurple"), "#663399");
    }

    #[test]
    fn unknown_name_is_an_error() {
        let err = translated("notacolor").unwrap_err();
        assert_eq!(
            err.reason,
            "unknown color name 'notacolor' for property foreground"
        );
        assert_eq!(err.location.as_deref(), Some("*"));
    }

    #[test]
    fn canonical_hash_passes_through_untouched() {
        assert!(translated("#123456").unwrap().is_none());
    }

    #[test]
    fn short_hash_expands_uppercase() {
        assert_eq!(hex_of("#abc"), "#AABBCC");
        assert_eq!(hex_of("#f00"), "#FF0000");
    }

    #[test]
    fn hex_string_becomes_hash() {
        assert_eq!(hex_of("\"#f00\""), "#FF0000");
        assert_eq!(hex_of("\"#123456\""), "#123456");
    }

    #[test]
    fn bad_hash_length_is_an_error() {
        let err = translated("#ab12").unwrap_err();
        assert_eq!(
            err.reason,
            "unexpected length of 4 of color hash for property foreground"
        );
    }

    #[test]
    fn rgb_composes_uppercase_hex() {
        assert_eq!(hex_of("rgb(255, 0, 0)"), "#FF0000");
        assert_eq!(hex_of("rgb(0, 128, 255)"), "#0080FF");
    }

    #[test]
    fn rgb_channels_clamp_and_accept_percentages() {
        assert_eq!(hex_of("rgb(300, -5, 50%)"), "#FF0080");
        assert_eq!(hex_of("rgb(100%, 0%, 200%)"), "#FF00FF");
    }

    #[test]
    fn rgba_appends_alpha_channel() {
        assert_eq!(hex_of("rgba(255, 0, 0, 1)"), "#FF0000FF");
        assert_eq!(hex_of("rgba(255, 0, 0, 0.25)"), "#FF000040");
        assert_eq!(hex_of("rgba(255, 0, 0, 7)"), "#FF0000FF");
    }

    #[test]
    fn hsl_conversion_is_pinned() {
        assert_eq!(hex_of("hsl(0, 50%, 50%)"), "#BF4040");
        assert_eq!(hex_of("hsl(120, 100%, 25%)"), "#008000");
        assert_eq!(hex_of("hsl(0, 0%, 100%)"), "#FFFFFF");
    }

    #[test]
    fn hue_wraps_modulo_360() {
        assert_eq!(hex_of("hsl(360, 50%, 50%)"), hex_of("hsl(0, 50%, 50%)"));
        assert_eq!(hex_of("hsl(-240, 50%, 50%)"), hex_of("hsl(120, 50%, 50%)"));
    }

    #[test]
    fn hsla_appends_alpha() {
        assert_eq!(hex_of("hsla(0, 50%, 50%, 0.5)"), "#BF404080");
    }

    #[test]
    fn wrong_parameter_count() {
        let err = translated("rgb(1, 2)").unwrap_err();
        assert_eq!(
            err.reason,
            "expected 3 parameters for function 'rgb()', got 2"
        );
        assert_eq!(err.location.as_deref(), Some("*; foreground"));
    }

    #[test]
    fn empty_argument_list_counts_zero_parameters() {
        let err = translated("rgb()").unwrap_err();
        assert_eq!(
            err.reason,
            "expected 3 parameters for function 'rgb()', got 0"
        );
    }

    #[test]
    fn wrong_parameter_kind() {
        let err = translated("rgb(1, 2, blue)").unwrap_err();
        assert_eq!(
            err.reason,
            "unexpected IDENT value for parameter 3 in function 'rgb()'"
        );

        let err = translated("hsl(0, 1, 50%)").unwrap_err();
        assert_eq!(
            err.reason,
            "unexpected INTEGER value for parameter 2 in function 'hsl()'"
        );

        let err = translated("rgba(0, 0, 0, 50%)").unwrap_err();
        assert_eq!(
            err.reason,
            "unexpected PERCENTAGE value for parameter 4 in function 'rgba()'"
        );
    }

    #[test]
    fn multi_token_parameter_is_an_error() {
        let err = translated("rgb(1 2, 3, 4)").unwrap_err();
        assert_eq!(
            err.reason,
            "expected 1 token for parameter 1 in function 'rgb()', got 3"
        );
    }

    #[test]
    fn unknown_function_name() {
        let err = translated("colorize(1)").unwrap_err();
        assert_eq!(
            err.reason,
            "unknown function 'colorize()' for property foreground"
        );
    }

    #[test]
    fn replacement_keeps_source_raw_and_position() {
        let token = value_token("rgb(255, 0, 0)");
        let replacement = translate_color(&token, "foreground", "*")
            .unwrap()
            .unwrap();
        assert_eq!(replacement.kind, TokenKind::Hash);
        assert_eq!(replacement.raw, "rgb(255, 0, 0)");
        assert_eq!((replacement.line, replacement.column), (1, 1));
    }
}
