//! Prompt templates with declared variables.
//!
//! Templates use handlebars syntax (`{{name}}`) with HTML escaping disabled
//! and strict mode enabled. Every declared variable must be supplied before
//! rendering; a missing one is reported as [`TemplateError::MissingVariable`].

use handlebars::Handlebars;
use serde_json::{Map, Value};

/// Errors from compiling or rendering a prompt template.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("prompt template {template:?} failed to compile: {reason}")]
    Compile { template: String, reason: String },

    #[error("prompt template {template:?} requires variable {variable:?}")]
    MissingVariable { template: String, variable: String },

    #[error("prompt template {template:?} failed to render: {reason}")]
    Render { template: String, reason: String },
}

/// Substitution variables: string or number values keyed by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Variables(Map<String, Value>);

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.0.insert(name.to_owned(), Value::String(value.into()));
        self
    }

    pub fn number(mut self, name: &str, value: impl Into<serde_json::Number>) -> Self {
        self.0.insert(name.to_owned(), Value::Number(value.into()));
        self
    }

    /// Insert a float. Non-finite values render as `null`.
    pub fn float(mut self, name: &str, value: f64) -> Self {
        self.0.insert(name.to_owned(), Value::from(value));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }
}

/// A compiled prompt template and the variables it declares.
pub struct PromptTemplate {
    name: &'static str,
    variables: &'static [&'static str],
    registry: Handlebars<'static>,
}

impl std::fmt::Debug for PromptTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptTemplate")
            .field("name", &self.name)
            .field("variables", &self.variables)
            .finish()
    }
}

impl PromptTemplate {
    /// Compile `source` under `name`. `variables` lists every placeholder
    /// the caller must supply.
    pub fn new(
        name: &'static str,
        source: &str,
        variables: &'static [&'static str],
    ) -> Result<Self, TemplateError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.register_escape_fn(handlebars::no_escape);
        registry
            .register_template_string(name, source)
            .map_err(|e| TemplateError::Compile {
                template: name.to_owned(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            name,
            variables,
            registry,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn render(&self, variables: &Variables) -> Result<String, TemplateError> {
        if let Some(missing) = self.variables.iter().find(|v| !variables.contains(v)) {
            return Err(TemplateError::MissingVariable {
                template: self.name.to_owned(),
                variable: (*missing).to_owned(),
            });
        }

        self.registry
            .render(self.name, &variables.0)
            .map_err(|e| TemplateError::Render {
                template: self.name.to_owned(),
                reason: e.to_string(),
            })
    }
}
