//! Placeholder substitution for prompt templates.
//!
//! Templates use `{name}` placeholders. `{{` and `}}` produce literal braces.
//! Every placeholder must resolve; a leftover `{name}` is an error, never
//! passed through to the model.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::GenerationConfig;
use crate::error::{Result, SeoWriterError};

/// Variable holding the reduced summary of all fetched pages.
pub const COMBINED_SUMMARY_VAR: &str = "combined_content_summary";

/// Every variable name a prompt template may reference.
pub const KNOWN_VARIABLES: &[&str] = &[
    "language",
    "expertise_field",
    "keyphrase",
    "product_name",
    "product_description",
    "product_url",
    COMBINED_SUMMARY_VAR,
];

/// Matches escapes, placeholders, and stray braces, in that priority order.
static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{|\}\}|\{([^{}]*)\}|[{}]").unwrap());

static IDENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Flat placeholder-name → value mapping applied to every prompt of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateContext {
    values: BTreeMap<String, String>,
}

impl TemplateContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the context for one generation run: the article parameters plus
    /// the combined summary.
    pub fn for_article(article: &GenerationConfig, combined_summary: &str) -> Self {
        let mut ctx = Self::new();
        ctx.insert("language", &article.language);
        ctx.insert("expertise_field", &article.expertise_field);
        ctx.insert("keyphrase", &article.keyphrase);
        ctx.insert("product_name", &article.product_name);
        ctx.insert("product_description", &article.product_description);
        ctx.insert("product_url", &article.product_url);
        ctx.insert(COMBINED_SUMMARY_VAR, combined_summary);
        ctx
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

/// A lexical piece of a template.
enum Token<'a> {
    Literal(&'a str),
    Placeholder(&'a str),
}

/// Split a template into literal text and placeholder names.
fn tokenize(template: &str) -> Result<Vec<Token<'_>>> {
    let mut tokens = Vec::new();
    let mut last = 0;

    for caps in TOKEN_RE.captures_iter(template) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > last {
            tokens.push(Token::Literal(&template[last..whole.start()]));
        }
        last = whole.end();

        match whole.as_str() {
            "{{" => tokens.push(Token::Literal("{")),
            "}}" => tokens.push(Token::Literal("}")),
            "{" | "}" => {
                return Err(SeoWriterError::template(format!(
                    "unbalanced '{}' at byte {}",
                    whole.as_str(),
                    whole.start()
                )));
            }
            _ => {
                let name = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
                if !IDENT_RE.is_match(name) {
                    return Err(SeoWriterError::template(format!(
                        "malformed placeholder '{}'",
                        whole.as_str()
                    )));
                }
                tokens.push(Token::Placeholder(name));
            }
        }
    }

    if last < template.len() {
        tokens.push(Token::Literal(&template[last..]));
    }

    Ok(tokens)
}

/// List the placeholder names referenced by a template, in order of appearance.
pub fn placeholders(template: &str) -> Result<Vec<String>> {
    Ok(tokenize(template)?
        .into_iter()
        .filter_map(|t| match t {
            Token::Placeholder(name) => Some(name.to_string()),
            Token::Literal(_) => None,
        })
        .collect())
}

/// Substitute every placeholder in `template` from `ctx`.
pub fn render(template: &str, ctx: &TemplateContext) -> Result<String> {
    let mut out = String::with_capacity(template.len());

    for token in tokenize(template)? {
        match token {
            Token::Literal(text) => out.push_str(text),
            Token::Placeholder(name) => match ctx.get(name) {
                Some(value) => out.push_str(value),
                None => {
                    return Err(SeoWriterError::template(format!(
                        "unresolved placeholder '{{{name}}}'"
                    )));
                }
            },
        }
    }

    Ok(out)
}
