//! Dump a parsed, error-free stylesheet into the ordered output document.
//!
//! The dump pass is fail-fast: the first invariant or value violation
//! aborts the whole build with a [`DumpError`] and no partial document is
//! returned. The parsed tree is never mutated; validators that rewrite
//! value tokens (color translation, `none` styles) return a new token
//! sequence instead.

use indexmap::IndexMap;

use crate::color;
use crate::error::{DumpError, Result};
use crate::rules::{AtRule, Declaration, Rule, RuleSet, Stylesheet};
use crate::tokens::{self, Token, TokenKind, TokenValue};

/// An ordered string-keyed mapping, the building block of the document.
pub type Dict = IndexMap<String, Value>;

/// The dump output: an ordered mapping ready for property-list
/// serialization. `name` is always the first key; `settings` holds one
/// sub-mapping per ruleset, universal ruleset first.
pub type Document = Dict;

/// A value in the output document.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Array(Vec<Value>),
    Dict(Dict),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Value::Dict(dict) => Some(dict),
            _ => None,
        }
    }
}

/// Validation category of a property, resolved once per declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Color,
    Integer,
    StyleList,
    OptionsList,
    Unvalidated,
}

/// Classify a property name into its validation category.
///
/// Unknown properties are passed through unvalidated; the dialect stays
/// open for downstream consumers with extra keys.
pub fn property_kind(name: &str) -> PropertyKind {
    match name {
        "foreground" | "background" | "caret" | "invisibles" | "lineHighlight" | "selection"
        | "selectionForeground" | "selectionBorder" | "inactiveSelection" | "gutter"
        | "gutterForeground" | "guide" | "activeGuide" | "stackGuide" | "highlight"
        | "findHighlight" | "findHighlightForeground" | "bracketsForeground"
        | "bracketContentsForeground" | "tagsForeground" | "shadow" => PropertyKind::Color,
        "shadowWidth" => PropertyKind::Integer,
        "fontStyle" => PropertyKind::StyleList,
        "bracketsOptions" | "bracketContentsOptions" | "tagsOptions" => PropertyKind::OptionsList,
        _ => PropertyKind::Unvalidated,
    }
}

const FONT_STYLES: &[&str] = &["bold", "italic", "underline", "none"];
const LIST_OPTIONS: &[&str] = &[
    "foreground",
    "underline",
    "stippled_underline",
    "squiggly_underline",
];

/// Build the output document from a parsed stylesheet.
///
/// The stylesheet must contain a `@name` at-rule and exactly one ruleset
/// with the universal `*` selector; the universal ruleset is dumped first
/// regardless of where it appears in the source.
pub fn datafy_stylesheet(stylesheet: &Stylesheet) -> Result<Document> {
    let mut at_rules: IndexMap<&str, &AtRule> = IndexMap::new();
    let mut rulesets: Vec<&RuleSet> = Vec::new();
    let mut universal: Option<&RuleSet> = None;

    for rule in &stylesheet.rules {
        match rule {
            Rule::At(at_rule) => {
                at_rules.insert(at_rule.bare_keyword(), at_rule);
            }
            Rule::Set(ruleset) => {
                if ruleset.selector_css() == "*" {
                    if universal.is_some() {
                        return Err(DumpError::new(
                            "Only one *-rule allowed",
                            ruleset.line,
                            ruleset.column,
                        ));
                    }
                    universal = Some(ruleset);
                } else {
                    rulesets.push(ruleset);
                }
            }
        }
    }

    let mut data = Document::new();

    // The name goes first.
    let Some(name_rule) = at_rules.shift_remove("name") else {
        return Err(DumpError::new("Must contain 'name' at-rule", 0, 0));
    };
    data.insert("name".to_owned(), Value::String(name_rule.value.rendered_value()));

    for (key, rule) in &at_rules {
        if *key == "settings" {
            return Err(DumpError::new(
                "Can not override 'settings' key using at-rules.",
                rule.line,
                rule.column,
            )
            .with_location(format!("@{key}")));
        }
        data.insert((*key).to_owned(), Value::String(rule.value.rendered_value()));
    }

    let Some(universal) = universal else {
        return Err(DumpError::new("Must contain '*' ruleset", 0, 0));
    };
    let mut settings = Vec::with_capacity(rulesets.len() + 1);
    settings.push(Value::Dict(datafy_ruleset(universal)?));
    for ruleset in rulesets {
        settings.push(Value::Dict(datafy_ruleset(ruleset)?));
    }
    data.insert("settings".to_owned(), Value::Array(settings));

    Ok(data)
}

/// Dump one ruleset into its settings sub-mapping.
pub fn datafy_ruleset(ruleset: &RuleSet) -> Result<Dict> {
    let mut dict = Dict::new();
    let selector = ruleset.selector_css();
    if selector != "*" {
        dict.insert("scope".to_owned(), Value::String(normalize_scope(&selector)));
    }

    for at_rule in &ruleset.at_rules {
        if matches!(at_rule.at_keyword.as_str(), "@scope" | "@settings") {
            return Err(DumpError::new(
                format!(
                    "You can not override the '{}' key using at-rules",
                    at_rule.bare_keyword()
                ),
                at_rule.line,
                at_rule.column,
            )
            .with_location(format!("{selector}; {}", at_rule.at_keyword)));
        }
        dict.insert(
            at_rule.bare_keyword().to_owned(),
            Value::String(at_rule.value.rendered_value()),
        );
    }

    let mut settings = Dict::new();
    for declaration in &ruleset.declarations {
        let value = validify_declaration(declaration, &selector)?;
        settings.insert(
            declaration.name.clone(),
            Value::String(tokens::render_values(&value)),
        );
    }
    dict.insert("settings".to_owned(), Value::Dict(settings));

    Ok(dict)
}

/// Normalize a selector for use as a scope string: drop the backslash
/// escapes preprocessors need, and collapse whitespace runs (newlines
/// included) to single spaces.
fn normalize_scope(selector: &str) -> String {
    let unescaped = selector.replace('\\', "");
    unescaped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Validate one declaration against its property category and return the
/// (possibly rewritten) value tokens to render.
fn validify_declaration(declaration: &Declaration, selector: &str) -> Result<Vec<Token>> {
    let name = declaration.name.as_str();
    match property_kind(name) {
        PropertyKind::Color => {
            expect_single_token(declaration, selector)?;
            match color::translate_color(&declaration.value[0], name, selector)? {
                Some(replacement) => Ok(vec![replacement]),
                None => Ok(declaration.value.clone()),
            }
        }
        PropertyKind::Integer => {
            expect_single_token(declaration, selector)?;
            let token = &declaration.value[0];
            match token.kind {
                TokenKind::Integer => Ok(declaration.value.clone()),
                TokenKind::String => {
                    let text = token.str_value().unwrap_or_default();
                    if text.trim().parse::<i64>().is_ok() {
                        Ok(declaration.value.clone())
                    } else {
                        Err(DumpError::new(
                            format!("expected number in string for property {name}, got {text:?}"),
                            token.line,
                            token.column,
                        )
                        .with_location(selector))
                    }
                }
                other => Err(DumpError::new(
                    format!("unexpected {other} token for property {name}"),
                    token.line,
                    token.column,
                )
                .with_location(selector)),
            }
        }
        PropertyKind::StyleList => {
            validate_ident_list(declaration, selector, FONT_STYLES, "style")?;
            let styles: Vec<&Token> = declaration
                .value
                .iter()
                .filter(|t| t.kind != TokenKind::Whitespace)
                .collect();
            if let Some(none) = styles
                .iter()
                .find(|t| t.str_value() == Some("none"))
            {
                if styles.len() > 1 {
                    return Err(DumpError::new(
                        "'none' may not be used together with other styles",
                        none.line,
                        none.column,
                    )
                    .with_location(selector));
                }
                // A lone `none` renders as the empty string.
                let mut cleared = (*none).clone();
                cleared.value = TokenValue::Str(String::new());
                return Ok(vec![cleared]);
            }
            Ok(declaration.value.clone())
        }
        PropertyKind::OptionsList => {
            validate_ident_list(declaration, selector, LIST_OPTIONS, "options")?;
            Ok(declaration.value.clone())
        }
        PropertyKind::Unvalidated => {
            tracing::debug!("property {name} has no validation category");
            Ok(declaration.value.clone())
        }
    }
}

fn expect_single_token(declaration: &Declaration, selector: &str) -> Result<()> {
    if declaration.value.len() > 1 {
        let second = &declaration.value[1];
        return Err(DumpError::new(
            format!(
                "expected 1 token for property {}, got {}",
                declaration.name,
                declaration.value.len()
            ),
            second.line,
            second.column,
        )
        .with_location(selector));
    }
    Ok(())
}

fn validate_ident_list(
    declaration: &Declaration,
    selector: &str,
    allowed: &[&str],
    category: &str,
) -> Result<()> {
    let name = &declaration.name;
    for token in &declaration.value {
        if token.kind == TokenKind::Whitespace {
            continue;
        }
        if token.kind != TokenKind::Ident {
            return Err(DumpError::new(
                format!("unexpected {} token for property {name}", token.kind),
                token.line,
                token.column,
            )
            .with_location(selector));
        }
        let value = token.str_value().unwrap_or_default();
        if !allowed.contains(&value) {
            return Err(DumpError::new(
                format!("invalid value '{value}' for {category} property {name}"),
                token.line,
                token.column,
            )
            .with_location(selector));
        }
    }
    Ok(())
}
