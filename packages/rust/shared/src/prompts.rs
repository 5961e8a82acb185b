//! Prompt catalog: named article types mapped to a system prompt and an
//! ordered list of generation steps.
//!
//! The catalog is a JSON document. Prompt text may be a plain string or an
//! array of lines (joined with `\n`). Everything is validated on load, so
//! generation never encounters an unknown placeholder or an empty step list.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, SeoWriterError};
use crate::template::{self, KNOWN_VARIABLES};

/// Catalog compiled into the binary, used when no catalog path is configured.
pub const BUILTIN_CATALOG_JSON: &str = include_str!("../prompts/default_prompts.json");

// ---------------------------------------------------------------------------
// Validated types
// ---------------------------------------------------------------------------

/// One prompt/response unit of an article template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Prompt text with `{placeholder}` variables.
    pub prompt_template: String,
    /// Whether the model's reply becomes part of the final article.
    pub include_in_output: bool,
}

/// System prompt plus ordered steps for one article type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    pub system_prompt: String,
    pub steps: Vec<Step>,
}

/// Read-only catalog of article templates keyed by article type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptCatalog {
    templates: BTreeMap<String, PromptTemplate>,
}

// ---------------------------------------------------------------------------
// Raw (on-disk) shape
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PromptText {
    Single(String),
    Lines(Vec<String>),
}

impl From<PromptText> for String {
    fn from(text: PromptText) -> Self {
        match text {
            PromptText::Single(s) => s,
            PromptText::Lines(lines) => lines.join("\n"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawStep {
    prompt: PromptText,
    #[serde(default = "default_include", alias = "enhanced")]
    include_in_output: bool,
}

fn default_include() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct RawTemplate {
    system_prompt: PromptText,
    steps: Vec<RawStep>,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl PromptCatalog {
    /// Parse and validate a catalog from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: BTreeMap<String, RawTemplate> = serde_json::from_str(json)
            .map_err(|e| SeoWriterError::config(format!("invalid prompt catalog: {e}")))?;

        let templates = raw
            .into_iter()
            .map(|(name, t)| {
                let template = PromptTemplate {
                    system_prompt: t.system_prompt.into(),
                    steps: t
                        .steps
                        .into_iter()
                        .map(|s| Step {
                            prompt_template: s.prompt.into(),
                            include_in_output: s.include_in_output,
                        })
                        .collect(),
                };
                (name, template)
            })
            .collect();

        let catalog = Self { templates };
        catalog.validate()?;
        Ok(catalog)
    }

    /// The catalog shipped with the binary.
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_CATALOG_JSON)
    }

    /// Look up the template for an article type.
    pub fn get(&self, article_type: &str) -> Result<&PromptTemplate> {
        self.templates.get(article_type).ok_or_else(|| {
            SeoWriterError::config(format!(
                "unknown article type '{article_type}' (available: {})",
                self.templates.keys().cloned().collect::<Vec<_>>().join(", ")
            ))
        })
    }

    /// Iterate article types in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PromptTemplate)> {
        self.templates.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn validate(&self) -> Result<()> {
        if self.templates.is_empty() {
            return Err(SeoWriterError::validation(
                "prompt catalog defines no article types",
            ));
        }

        for (name, t) in &self.templates {
            if t.steps.is_empty() {
                return Err(SeoWriterError::validation(format!(
                    "article type '{name}' has no steps"
                )));
            }

            check_placeholders(&t.system_prompt)
                .map_err(|e| SeoWriterError::template(format!("{name}.system_prompt: {e}")))?;

            for (i, step) in t.steps.iter().enumerate() {
                check_placeholders(&step.prompt_template)
                    .map_err(|e| SeoWriterError::template(format!("{name}.steps[{i}]: {e}")))?;
            }
        }

        Ok(())
    }
}

/// Ensure a template parses and references only known variables.
fn check_placeholders(text: &str) -> std::result::Result<(), String> {
    let names = template::placeholders(text).map_err(|e| e.to_string())?;
    match names.iter().find(|n| !KNOWN_VARIABLES.contains(&n.as_str())) {
        Some(unknown) => Err(format!("unknown placeholder '{{{unknown}}}'")),
        None => Ok(()),
    }
}

/// Load a catalog from a JSON file on disk.
pub fn load_catalog_from(path: &Path) -> Result<PromptCatalog> {
    let content = std::fs::read_to_string(path).map_err(|e| SeoWriterError::io(path, e))?;
    PromptCatalog::from_json(&content).map_err(|e| match e {
        SeoWriterError::Config { message } => {
            SeoWriterError::config(format!("{}: {message}", path.display()))
        }
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_is_valid() {
        let catalog = PromptCatalog::builtin().expect("builtin catalog");
        let guide = catalog.get("guide").expect("guide type");
        assert!(!guide.steps.is_empty());
        assert!(guide.system_prompt.contains("{combined_content_summary}"));
    }

    #[test]
    fn joins_line_arrays_and_accepts_legacy_flag() {
        let json = r#"{
            "guide": {
                "system_prompt": ["You write in {language}.", "Be concise."],
                "steps": [
                    { "prompt": ["Outline", "{keyphrase}"], "enhanced": false },
                    { "prompt": "Write it", "include_in_output": true }
                ]
            }
        }"#;
        let catalog = PromptCatalog::from_json(json).unwrap();
        let guide = catalog.get("guide").unwrap();
        assert_eq!(guide.system_prompt, "You write in {language}.\nBe concise.");
        assert_eq!(guide.steps[0].prompt_template, "Outline\n{keyphrase}");
        assert!(!guide.steps[0].include_in_output);
        assert!(guide.steps[1].include_in_output);
    }

    #[test]
    fn rejects_unknown_placeholder_at_load() {
        let json = r#"{"guide": {"system_prompt": "x", "steps": [{"prompt": "{keyword}"}]}}"#;
        let err = PromptCatalog::from_json(json).unwrap_err();
        assert!(matches!(err, SeoWriterError::Template { .. }));
        assert!(err.to_string().contains("guide.steps[0]"));
    }

    #[test]
    fn rejects_empty_step_list() {
        let json = r#"{"guide": {"system_prompt": "x", "steps": []}}"#;
        assert!(PromptCatalog::from_json(json).is_err());
    }

    #[test]
    fn rejects_empty_catalog() {
        assert!(PromptCatalog::from_json("{}").is_err());
    }

    #[test]
    fn unknown_article_type_lists_available() {
        let catalog = PromptCatalog::builtin().unwrap();
        let err = catalog.get("listicle").unwrap_err();
        assert!(err.to_string().contains("guide"));
    }
}
